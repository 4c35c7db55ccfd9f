// SPDX-License-Identifier: Apache-2.0

pub mod block;

pub use block::{BlockRow, CommittedCouncilNode};

// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One denormalized row per block, append-only. Written exclusively by the
/// Block projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRow {
    pub height: i64,
    pub hash: String,
    pub time: DateTime<Utc>,
    pub app_hash: String,
    pub transaction_count: i64,
    pub committed_council_nodes: Vec<CommittedCouncilNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommittedCouncilNode {
    pub address: String,
    pub time: DateTime<Utc>,
    pub signature: String,
    pub is_proposer: bool,
}

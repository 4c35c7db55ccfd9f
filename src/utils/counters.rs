// SPDX-License-Identifier: Apache-2.0

use once_cell::sync::Lazy;
use prometheus::{
    register_int_counter_vec, register_int_gauge_vec, IntCounterVec, IntGaugeVec,
};

/// Last block height each projection committed.
pub static PROJECTION_LAST_HANDLED_HEIGHT: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "chain_indexer_projection_last_handled_height",
        "Last block height each projection committed",
        &["projection_name"]
    )
    .unwrap()
});

/// Number of events each projection has applied.
pub static PROJECTION_HANDLED_EVENTS_COUNT: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "chain_indexer_projection_handled_events_count",
        "Number of events each projection has applied",
        &["projection_name"]
    )
    .unwrap()
});

/// Number of handle_events calls that rolled back.
pub static PROJECTION_ERROR_COUNT: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "chain_indexer_projection_error_count",
        "Number of handle_events calls that rolled back",
        &["projection_name"]
    )
    .unwrap()
});

// SPDX-License-Identifier: Apache-2.0

diesel::table! {
    blocks (height) {
        height -> Int8,
        hash -> Varchar,
        time -> Timestamptz,
        app_hash -> Varchar,
        transaction_count -> Int8,
        committed_council_nodes -> Jsonb,
    }
}

diesel::table! {
    chain_stats (metric) {
        metric -> Varchar,
        value -> Text,
    }
}

diesel::table! {
    projection_checkpoints (projection_name) {
        projection_name -> Varchar,
        last_handled_height -> Int8,
        last_updated -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(blocks, chain_stats, projection_checkpoints,);

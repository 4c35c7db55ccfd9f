// SPDX-License-Identifier: Apache-2.0

use super::{new_uuid, ChainEvent, EventError, TRANSACTION_CREATED};
use crate::coin::Coin;
use serde::{Deserialize, Serialize};

pub const VERSION: i32 = 1;

/// Fired for every transaction included in a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransactionCreated {
    pub name: String,
    pub version: i32,
    pub uuid: String,
    pub block_height: i64,
    pub tx_hash: String,
    pub code: i32,
    pub log: String,
    pub msg_count: i32,
    pub fee: Coin,
    pub gas_wanted: String,
    pub gas_used: String,
}

pub struct TransactionCreatedParams {
    pub tx_hash: String,
    pub code: i32,
    pub log: String,
    pub msg_count: i32,
    pub fee: Coin,
    pub gas_wanted: String,
    pub gas_used: String,
}

impl TransactionCreated {
    pub fn new(block_height: i64, params: TransactionCreatedParams) -> Self {
        Self {
            name: TRANSACTION_CREATED.to_string(),
            version: VERSION,
            uuid: new_uuid(),
            block_height,
            tx_hash: params.tx_hash,
            code: params.code,
            log: params.log,
            msg_count: params.msg_count,
            fee: params.fee,
            gas_wanted: params.gas_wanted,
            gas_used: params.gas_used,
        }
    }

    pub fn decode(payload: &[u8]) -> Result<ChainEvent, EventError> {
        let event: TransactionCreated =
            serde_json::from_slice(payload).map_err(|e| EventError::MalformedPayload {
                name: TRANSACTION_CREATED.to_string(),
                version: VERSION,
                reason: e.to_string(),
            })?;
        Ok(ChainEvent::TransactionCreated(event))
    }
}

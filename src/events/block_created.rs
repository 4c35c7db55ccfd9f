// SPDX-License-Identifier: Apache-2.0

use super::{new_uuid, ChainEvent, EventError, BLOCK_CREATED};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const VERSION: i32 = 1;

/// Fired once per block with the complete raw block contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BlockCreated {
    pub name: String,
    pub version: i32,
    pub uuid: String,
    pub block_height: i64,
    pub block: RawBlock,
}

/// Raw block as delivered by the chain client, before any projection shapes
/// it into view rows. `txs` entries are base64-encoded transaction envelopes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawBlock {
    pub height: i64,
    pub hash: String,
    pub time: DateTime<Utc>,
    pub app_hash: String,
    pub proposer_address: String,
    pub txs: Vec<String>,
    pub signatures: Vec<BlockSignature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BlockSignature {
    pub block_id_flag: i32,
    pub validator_address: String,
    pub timestamp: DateTime<Utc>,
    pub signature: String,
}

impl BlockCreated {
    pub fn new(block: RawBlock) -> Self {
        Self {
            name: BLOCK_CREATED.to_string(),
            version: VERSION,
            uuid: new_uuid(),
            block_height: block.height,
            block,
        }
    }

    pub fn decode(payload: &[u8]) -> Result<ChainEvent, EventError> {
        let event: BlockCreated =
            serde_json::from_slice(payload).map_err(|e| EventError::MalformedPayload {
                name: BLOCK_CREATED.to_string(),
                version: VERSION,
                reason: e.to_string(),
            })?;
        Ok(ChainEvent::BlockCreated(event))
    }
}

// SPDX-License-Identifier: Apache-2.0

use super::{new_uuid, ChainEvent, EventError, MSG_CREATE_VALIDATOR};
use crate::coin::Coin;
use serde::{Deserialize, Serialize};

pub const VERSION: i32 = 1;

/// Fired for every `MsgCreateValidator` message found in a block's
/// transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MsgCreateValidator {
    pub name: String,
    pub version: i32,
    pub uuid: String,
    pub block_height: i64,
    pub tx_hash: String,
    pub tx_success: bool,
    pub msg_index: i32,
    pub description: ValidatorDescription,
    pub commission: ValidatorCommission,
    pub min_self_delegation: String,
    pub delegator_address: String,
    pub validator_address: String,
    pub tendermint_pubkey: String,
    pub amount: Coin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ValidatorDescription {
    pub moniker: String,
    pub identity: String,
    pub website: String,
    pub security_contact: String,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ValidatorCommission {
    pub rate: String,
    pub max_rate: String,
    pub max_change_rate: String,
}

pub struct MsgCreateValidatorParams {
    pub tx_hash: String,
    pub tx_success: bool,
    pub msg_index: i32,
    pub description: ValidatorDescription,
    pub commission: ValidatorCommission,
    pub min_self_delegation: String,
    pub delegator_address: String,
    pub validator_address: String,
    pub tendermint_pubkey: String,
    pub amount: Coin,
}

impl MsgCreateValidator {
    pub fn new(block_height: i64, params: MsgCreateValidatorParams) -> Self {
        Self {
            name: MSG_CREATE_VALIDATOR.to_string(),
            version: VERSION,
            uuid: new_uuid(),
            block_height,
            tx_hash: params.tx_hash,
            tx_success: params.tx_success,
            msg_index: params.msg_index,
            description: params.description,
            commission: params.commission,
            min_self_delegation: params.min_self_delegation,
            delegator_address: params.delegator_address,
            validator_address: params.validator_address,
            tendermint_pubkey: params.tendermint_pubkey,
            amount: params.amount,
        }
    }

    pub fn decode(payload: &[u8]) -> Result<ChainEvent, EventError> {
        let event: MsgCreateValidator =
            serde_json::from_slice(payload).map_err(|e| EventError::MalformedPayload {
                name: MSG_CREATE_VALIDATOR.to_string(),
                version: VERSION,
                reason: e.to_string(),
            })?;
        Ok(ChainEvent::MsgCreateValidator(event))
    }
}

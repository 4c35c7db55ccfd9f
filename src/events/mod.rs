// SPDX-License-Identifier: Apache-2.0

//! Versioned domain events and the decode registry.
//!
//! Every event is an immutable fact produced at a block height. The wire
//! format is strict-schema JSON with the envelope fields (`name`, `version`,
//! `uuid`, `blockHeight`) inline alongside the variant payload; unknown
//! fields are rejected so schema drift surfaces as a decode error instead of
//! silent data loss.

pub mod block_created;
pub mod msg_create_validator;
pub mod registry;
pub mod transaction_created;

pub use block_created::{BlockCreated, BlockSignature, RawBlock};
pub use msg_create_validator::{MsgCreateValidator, ValidatorCommission, ValidatorDescription};
pub use registry::EventRegistry;
pub use transaction_created::TransactionCreated;

pub const BLOCK_CREATED: &str = "BlockCreated";
pub const TRANSACTION_CREATED: &str = "TransactionCreated";
pub const MSG_CREATE_VALIDATOR: &str = "MsgCreateValidator";

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("no decoder registered for event {name}V{version}")]
    UnknownEventType { name: String, version: i32 },
    #[error("malformed payload for event {name}V{version}: {reason}")]
    MalformedPayload {
        name: String,
        version: i32,
        reason: String,
    },
    #[error("error encoding event {name}V{version} to JSON: {reason}")]
    Encode {
        name: String,
        version: i32,
        reason: String,
    },
}

/// Closed set of event variants. Projections match on this directly, so a
/// newly added variant fails to compile until every interested projection
/// grows a handling arm.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainEvent {
    BlockCreated(BlockCreated),
    TransactionCreated(TransactionCreated),
    MsgCreateValidator(MsgCreateValidator),
}

impl ChainEvent {
    pub fn name(&self) -> &str {
        match self {
            ChainEvent::BlockCreated(event) => &event.name,
            ChainEvent::TransactionCreated(event) => &event.name,
            ChainEvent::MsgCreateValidator(event) => &event.name,
        }
    }

    pub fn version(&self) -> i32 {
        match self {
            ChainEvent::BlockCreated(event) => event.version,
            ChainEvent::TransactionCreated(event) => event.version,
            ChainEvent::MsgCreateValidator(event) => event.version,
        }
    }

    pub fn uuid(&self) -> &str {
        match self {
            ChainEvent::BlockCreated(event) => &event.uuid,
            ChainEvent::TransactionCreated(event) => &event.uuid,
            ChainEvent::MsgCreateValidator(event) => &event.uuid,
        }
    }

    pub fn block_height(&self) -> i64 {
        match self {
            ChainEvent::BlockCreated(event) => event.block_height,
            ChainEvent::TransactionCreated(event) => event.block_height,
            ChainEvent::MsgCreateValidator(event) => event.block_height,
        }
    }

    pub fn to_json(&self) -> Result<String, EventError> {
        let encoded = match self {
            ChainEvent::BlockCreated(event) => serde_json::to_string(event),
            ChainEvent::TransactionCreated(event) => serde_json::to_string(event),
            ChainEvent::MsgCreateValidator(event) => serde_json::to_string(event),
        };
        encoded.map_err(|e| EventError::Encode {
            name: self.name().to_string(),
            version: self.version(),
            reason: e.to_string(),
        })
    }
}

pub(crate) fn new_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

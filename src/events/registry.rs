// SPDX-License-Identifier: Apache-2.0

use super::{
    block_created, msg_create_validator, transaction_created, ChainEvent, EventError,
    BLOCK_CREATED, MSG_CREATE_VALIDATOR, TRANSACTION_CREATED,
};
use std::collections::HashMap;

pub type EventDecoderFn = fn(&[u8]) -> Result<ChainEvent, EventError>;

/// Maps `(name, version)` to a decode routine. Built once at startup and
/// passed to whoever needs to decode stored events; there is no ambient
/// global registry.
#[derive(Default)]
pub struct EventRegistry {
    decoders: HashMap<(String, i32), EventDecoderFn>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every event variant this crate knows about.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(BLOCK_CREATED, block_created::VERSION, block_created::BlockCreated::decode);
        registry.register(
            TRANSACTION_CREATED,
            transaction_created::VERSION,
            transaction_created::TransactionCreated::decode,
        );
        registry.register(
            MSG_CREATE_VALIDATOR,
            msg_create_validator::VERSION,
            msg_create_validator::MsgCreateValidator::decode,
        );
        registry
    }

    /// Registers a decoder for a discriminator pair. Registering the same
    /// pair twice is a startup wiring defect, so it panics rather than
    /// returning a runtime error.
    pub fn register(&mut self, name: &str, version: i32, decoder: EventDecoderFn) {
        if self
            .decoders
            .insert((name.to_string(), version), decoder)
            .is_some()
        {
            panic!("decoder already registered for event {}V{}", name, version);
        }
    }

    pub fn decode_by_type(
        &self,
        name: &str,
        version: i32,
        payload: &[u8],
    ) -> Result<ChainEvent, EventError> {
        let decoder = self.decoders.get(&(name.to_string(), version)).ok_or_else(|| {
            EventError::UnknownEventType {
                name: name.to_string(),
                version,
            }
        })?;
        let event = decoder(payload)?;
        // A stored payload whose own envelope disagrees with the key it was
        // stored under is corrupt.
        if event.name() != name || event.version() != version {
            return Err(EventError::MalformedPayload {
                name: name.to_string(),
                version,
                reason: format!(
                    "payload envelope says {}V{}",
                    event.name(),
                    event.version()
                ),
            });
        }
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coin::Coin;
    use crate::events::{
        BlockCreated, BlockSignature, MsgCreateValidator, RawBlock, TransactionCreated,
        ValidatorCommission, ValidatorDescription,
    };
    use crate::events::msg_create_validator::MsgCreateValidatorParams;
    use crate::events::transaction_created::TransactionCreatedParams;
    use chrono::{TimeZone, Utc};

    fn any_raw_block() -> RawBlock {
        RawBlock {
            height: 1,
            hash: "B69554A020537DA8E7C7610A318180C09BFEB91229BB85D4A78DDA2FACF68A48".to_string(),
            time: Utc.timestamp_opt(1608708628, 0).unwrap(),
            app_hash: "24474D86CBFA7E6328D473C17A9E46CD5A80FFE82A348A74844BF3E2BA2B3AF1"
                .to_string(),
            proposer_address: "F9E6FFB9B536956201AA138224FD888D03775AB4".to_string(),
            txs: vec!["AAAMZqIC".to_string()],
            signatures: vec![BlockSignature {
                block_id_flag: 2,
                validator_address: "F9E6FFB9B536956201AA138224FD888D03775AB4".to_string(),
                timestamp: Utc.timestamp_opt(1608708628, 0).unwrap(),
                signature: "ZW2pUcKFN/oPQCmdCouchXmgpPyd/Ddo45dhHEMwsBe=".to_string(),
            }],
        }
    }

    fn sample_events() -> Vec<ChainEvent> {
        vec![
            ChainEvent::BlockCreated(BlockCreated::new(any_raw_block())),
            ChainEvent::TransactionCreated(TransactionCreated::new(
                1,
                TransactionCreatedParams {
                    tx_hash: "E69985AC8168383A81B7952DBE03EB9B3400FF80AEC0F362369DD7F38B1C2FE9"
                        .to_string(),
                    code: 0,
                    log: String::new(),
                    msg_count: 1,
                    fee: Coin::new("8000000", "basetcro").unwrap(),
                    gas_wanted: "200000".to_string(),
                    gas_used: "105000".to_string(),
                },
            )),
            ChainEvent::MsgCreateValidator(MsgCreateValidator::new(
                1,
                MsgCreateValidatorParams {
                    tx_hash: "E69985AC8168383A81B7952DBE03EB9B3400FF80AEC0F362369DD7F38B1C2FE9"
                        .to_string(),
                    tx_success: true,
                    msg_index: 0,
                    description: ValidatorDescription {
                        moniker: "mymoniker".to_string(),
                        identity: "myidentity".to_string(),
                        website: "mywebsite".to_string(),
                        security_contact: "mysecuritycontact".to_string(),
                        details: "mydetails".to_string(),
                    },
                    commission: ValidatorCommission {
                        rate: "0.100000000000000000".to_string(),
                        max_rate: "0.200000000000000000".to_string(),
                        max_change_rate: "0.010000000000000000".to_string(),
                    },
                    min_self_delegation: "1".to_string(),
                    delegator_address: "tcro1fmprm0sjy6lz9llv7rltn0v2azzwcwzvk2lsyn".to_string(),
                    validator_address: "tcrocncl1fmprm0sjy6lz9llv7rltn0v2azzwcwzvr4ufus"
                        .to_string(),
                    tendermint_pubkey: "wWw0e9tZcVmev/NyJlZv5Apd7U5IONoyx3U/9rD5fHI=".to_string(),
                    amount: Coin::new("10", "basetcro").unwrap(),
                },
            )),
        ]
    }

    #[test]
    fn test_round_trip_every_registered_variant() {
        let registry = EventRegistry::standard();
        for event in sample_events() {
            let encoded = event.to_json().unwrap();
            let decoded = registry
                .decode_by_type(event.name(), event.version(), encoded.as_bytes())
                .unwrap();
            assert_eq!(decoded, event);
        }
    }

    #[test]
    fn test_decode_unregistered_pair_fails_with_unknown_event_type() {
        let registry = EventRegistry::standard();
        let err = registry
            .decode_by_type("BlockCreated", 99, b"{}")
            .unwrap_err();
        assert!(matches!(
            err,
            EventError::UnknownEventType { ref name, version: 99 } if name == "BlockCreated"
        ));
    }

    #[test]
    fn test_decode_rejects_unknown_fields() {
        let registry = EventRegistry::standard();
        let event = ChainEvent::BlockCreated(BlockCreated::new(any_raw_block()));
        let encoded = event.to_json().unwrap();

        let mut value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        value
            .as_object_mut()
            .unwrap()
            .insert("surprise".to_string(), serde_json::json!(true));
        let tampered = serde_json::to_vec(&value).unwrap();

        let err = registry
            .decode_by_type(event.name(), event.version(), &tampered)
            .unwrap_err();
        assert!(matches!(err, EventError::MalformedPayload { .. }));
    }

    #[test]
    fn test_decode_rejects_mismatched_envelope() {
        let registry = EventRegistry::standard();
        let event = ChainEvent::BlockCreated(BlockCreated::new(any_raw_block()));
        let encoded = event.to_json().unwrap();

        let mut value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        value
            .as_object_mut()
            .unwrap()
            .insert("name".to_string(), serde_json::json!("Bogus"));
        let tampered = serde_json::to_vec(&value).unwrap();

        let err = registry
            .decode_by_type(BLOCK_CREATED, block_created::VERSION, &tampered)
            .unwrap_err();
        assert!(matches!(
            err,
            EventError::MalformedPayload { ref reason, .. } if reason.contains("BogusV1")
        ));
    }

    #[test]
    fn test_envelope_fields_are_assigned_at_creation() {
        let event = ChainEvent::BlockCreated(BlockCreated::new(any_raw_block()));
        assert_eq!(event.name(), BLOCK_CREATED);
        assert_eq!(event.version(), 1);
        assert_eq!(event.block_height(), 1);
        assert!(!event.uuid().is_empty());

        let other = ChainEvent::BlockCreated(BlockCreated::new(any_raw_block()));
        assert_ne!(event.uuid(), other.uuid());
    }

    #[test]
    #[should_panic(expected = "decoder already registered")]
    fn test_duplicate_registration_panics() {
        let mut registry = EventRegistry::standard();
        registry.register(
            BLOCK_CREATED,
            block_created::VERSION,
            block_created::BlockCreated::decode,
        );
    }
}

// SPDX-License-Identifier: Apache-2.0

//! Raw-transaction decoding. A wire transaction arrives as a base64 string
//! wrapping a protobuf `TxRaw` envelope; decoding goes through an
//! intermediate JSON value which is then strictly deserialized into
//! [`CosmosTx`], so a shape mismatch is a hard error rather than a silently
//! defaulted field.

pub mod proto;

use crate::coin::{Coin, CoinError};
use prost::Message;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum TxDecoderError {
    #[error("error decoding transaction base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("error decoding transaction envelope: {0}")]
    Proto(#[from] prost::DecodeError),
    #[error("error decoding transaction JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unrecognized denom {denom} when parsing fee amount")]
    UnrecognizedDenom { denom: String },
    #[error("error summing fee amounts: {0}")]
    Coin(#[from] CoinError),
}

/// Decoded transaction in the JSON shape projections consume. Not persisted
/// directly; projections extract what they need (usually the fee total).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CosmosTx {
    pub body: Body,
    pub auth_info: AuthInfo,
    pub signatures: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Body {
    pub messages: Vec<serde_json::Value>,
    pub memo: String,
    pub timeout_height: String,
    pub extension_options: Vec<serde_json::Value>,
    pub non_critical_extension_options: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthInfo {
    pub signer_infos: Vec<SignerInfo>,
    pub fee: Fee,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fee {
    pub amount: Vec<FeeAmount>,
    pub gas_limit: String,
    pub payer: String,
    pub granter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeeAmount {
    pub denom: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignerInfo {
    pub public_key: SignerInfoPublicKey,
    pub mode_info: ModeInfo,
    pub sequence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignerInfoPublicKey {
    #[serde(rename = "@type")]
    pub type_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_keys: Option<Vec<PublicKey>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublicKey {
    #[serde(rename = "@type")]
    pub type_url: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModeInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single: Option<Single>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi: Option<Multi>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Single {
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Multi {
    pub bitarray: Bitarray,
    pub mode_infos: Vec<SingleModeInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SingleModeInfo {
    pub single: Single,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bitarray {
    pub extra_bits_stored: i64,
    pub elems: String,
}

/// Decodes wire transactions and totals their fees against a single
/// configured base denomination.
pub struct TxDecoder {
    base_denom: String,
}

impl TxDecoder {
    pub fn new(base_denom: impl Into<String>) -> Self {
        Self {
            base_denom: base_denom.into(),
        }
    }

    pub fn decode(&self, base64_tx: &str) -> Result<CosmosTx, TxDecoderError> {
        let raw = base64::decode(base64_tx)?;
        let tx_raw = proto::TxRaw::decode(raw.as_slice())?;
        let body = proto::TxBody::decode(tx_raw.body_bytes.as_slice())?;
        let auth_info = proto::AuthInfo::decode(tx_raw.auth_info_bytes.as_slice())?;

        let intermediate = raw_tx_to_json(&body, &auth_info, &tx_raw.signatures)?;
        let tx = serde_json::from_value(intermediate)?;
        Ok(tx)
    }

    /// Total fee of the transaction. Every fee entry must be denominated in
    /// the configured base denom; an empty fee list totals to zero.
    pub fn get_fee(&self, base64_tx: &str) -> Result<Coin, TxDecoderError> {
        let tx = self.decode(base64_tx)?;
        self.sum_amounts(&tx.auth_info.fee.amount)
    }

    fn sum_amounts(&self, amounts: &[FeeAmount]) -> Result<Coin, TxDecoderError> {
        let mut sum = Coin::zero(&self.base_denom);
        for entry in amounts {
            if entry.denom != self.base_denom {
                return Err(TxDecoderError::UnrecognizedDenom {
                    denom: entry.denom.clone(),
                });
            }
            let coin = Coin::new(&entry.amount, &entry.denom)?;
            sum = sum.add(&coin)?;
        }
        Ok(sum)
    }
}

fn raw_tx_to_json(
    body: &proto::TxBody,
    auth_info: &proto::AuthInfo,
    signatures: &[Vec<u8>],
) -> Result<serde_json::Value, TxDecoderError> {
    let signer_infos = auth_info
        .signer_infos
        .iter()
        .map(signer_info_to_json)
        .collect::<Result<Vec<_>, _>>()?;

    let fee = match &auth_info.fee {
        Some(fee) => json!({
            "amount": fee.amount.iter().map(|coin| json!({
                "denom": coin.denom,
                "amount": coin.amount,
            })).collect::<Vec<_>>(),
            "gas_limit": fee.gas_limit.to_string(),
            "payer": fee.payer,
            "granter": fee.granter,
        }),
        None => json!({
            "amount": [],
            "gas_limit": "0",
            "payer": "",
            "granter": "",
        }),
    };

    Ok(json!({
        "body": {
            "messages": body.messages.iter().map(any_to_json).collect::<Vec<_>>(),
            "memo": body.memo,
            "timeout_height": body.timeout_height.to_string(),
            "extension_options": body.extension_options.iter().map(any_to_json).collect::<Vec<_>>(),
            "non_critical_extension_options": body.non_critical_extension_options.iter().map(any_to_json).collect::<Vec<_>>(),
        },
        "auth_info": {
            "signer_infos": signer_infos,
            "fee": fee,
        },
        "signatures": signatures.iter().map(|sig| base64::encode(sig)).collect::<Vec<_>>(),
    }))
}

/// Message payloads are outside this decoder's schema; only the type URL is
/// surfaced.
fn any_to_json(any: &proto::Any) -> serde_json::Value {
    json!({ "@type": any.type_url })
}

fn signer_info_to_json(signer: &proto::SignerInfo) -> Result<serde_json::Value, TxDecoderError> {
    let public_key = match &signer.public_key {
        Some(any) => public_key_to_json(any)?,
        None => json!({ "@type": "" }),
    };

    let mode_info = match &signer.mode_info {
        Some(mode_info) => mode_info_to_json(mode_info),
        None => json!({}),
    };

    Ok(json!({
        "public_key": public_key,
        "mode_info": mode_info,
        "sequence": signer.sequence.to_string(),
    }))
}

fn public_key_to_json(any: &proto::Any) -> Result<serde_json::Value, TxDecoderError> {
    if any.type_url.ends_with("secp256k1.PubKey") || any.type_url.ends_with("ed25519.PubKey") {
        let key = proto::PubKey::decode(any.value.as_slice())?;
        return Ok(json!({
            "@type": any.type_url,
            "key": base64::encode(&key.key),
        }));
    }

    if any.type_url.ends_with("LegacyAminoPubKey") {
        let multisig = proto::LegacyAminoPubKey::decode(any.value.as_slice())?;
        let public_keys = multisig
            .public_keys
            .iter()
            .map(|inner| {
                let key = proto::PubKey::decode(inner.value.as_slice())?;
                Ok(json!({
                    "@type": inner.type_url,
                    "key": base64::encode(&key.key),
                }))
            })
            .collect::<Result<Vec<_>, TxDecoderError>>()?;
        return Ok(json!({
            "@type": any.type_url,
            "threshold": multisig.threshold as i64,
            "public_keys": public_keys,
        }));
    }

    Ok(json!({ "@type": any.type_url }))
}

fn mode_info_to_json(mode_info: &proto::ModeInfo) -> serde_json::Value {
    match &mode_info.sum {
        Some(proto::mode_info::Sum::Single(single)) => json!({
            "single": { "mode": proto::sign_mode_name(single.mode) },
        }),
        Some(proto::mode_info::Sum::Multi(multi)) => {
            let bitarray = match &multi.bitarray {
                Some(bitarray) => json!({
                    "extra_bits_stored": bitarray.extra_bits_stored as i64,
                    "elems": base64::encode(&bitarray.elems),
                }),
                None => json!({ "extra_bits_stored": 0, "elems": "" }),
            };
            let mode_infos = multi
                .mode_infos
                .iter()
                .map(|nested| match &nested.sum {
                    Some(proto::mode_info::Sum::Single(single)) => json!({
                        "single": { "mode": proto::sign_mode_name(single.mode) },
                    }),
                    _ => json!({
                        "single": { "mode": proto::sign_mode_name(0) },
                    }),
                })
                .collect::<Vec<_>>();
            json!({
                "multi": { "bitarray": bitarray, "mode_infos": mode_infos },
            })
        }
        None => json!({}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE_DENOM: &str = "basetcro";
    const SECP256K1_TYPE_URL: &str = "/cosmos.crypto.secp256k1.PubKey";

    fn encode_tx(fee_amounts: Vec<(&str, &str)>) -> String {
        let body = proto::TxBody {
            messages: vec![proto::Any {
                type_url: "/cosmos.bank.v1beta1.MsgSend".to_string(),
                value: vec![1, 2, 3],
            }],
            memo: "indexer test".to_string(),
            timeout_height: 0,
            extension_options: vec![],
            non_critical_extension_options: vec![],
        };

        let public_key = proto::PubKey {
            key: vec![3; 33],
        };
        let auth_info = proto::AuthInfo {
            signer_infos: vec![proto::SignerInfo {
                public_key: Some(proto::Any {
                    type_url: SECP256K1_TYPE_URL.to_string(),
                    value: public_key.encode_to_vec(),
                }),
                mode_info: Some(proto::ModeInfo {
                    sum: Some(proto::mode_info::Sum::Single(proto::Single { mode: 1 })),
                }),
                sequence: 7,
            }],
            fee: Some(proto::Fee {
                amount: fee_amounts
                    .into_iter()
                    .map(|(amount, denom)| proto::ProtoCoin {
                        denom: denom.to_string(),
                        amount: amount.to_string(),
                    })
                    .collect(),
                gas_limit: 200000,
                payer: String::new(),
                granter: String::new(),
            }),
        };

        let tx_raw = proto::TxRaw {
            body_bytes: body.encode_to_vec(),
            auth_info_bytes: auth_info.encode_to_vec(),
            signatures: vec![vec![0xAA; 64]],
        };
        base64::encode(tx_raw.encode_to_vec())
    }

    #[test]
    fn test_decode_wire_transaction() {
        let decoder = TxDecoder::new(BASE_DENOM);
        let tx = decoder.decode(&encode_tx(vec![("100", BASE_DENOM)])).unwrap();

        assert_eq!(tx.body.memo, "indexer test");
        assert_eq!(tx.body.timeout_height, "0");
        assert_eq!(tx.body.messages.len(), 1);
        assert_eq!(
            tx.body.messages[0],
            serde_json::json!({ "@type": "/cosmos.bank.v1beta1.MsgSend" })
        );

        assert_eq!(tx.auth_info.fee.gas_limit, "200000");
        assert_eq!(tx.auth_info.fee.amount.len(), 1);
        assert_eq!(tx.auth_info.fee.amount[0].denom, BASE_DENOM);
        assert_eq!(tx.auth_info.fee.amount[0].amount, "100");

        let signer = &tx.auth_info.signer_infos[0];
        assert_eq!(signer.sequence, "7");
        assert_eq!(signer.public_key.type_url, SECP256K1_TYPE_URL);
        assert_eq!(
            signer.public_key.key.as_deref(),
            Some(base64::encode(vec![3u8; 33]).as_str())
        );
        assert_eq!(
            signer.mode_info.single.as_ref().unwrap().mode,
            "SIGN_MODE_DIRECT"
        );

        assert_eq!(tx.signatures, vec![base64::encode(vec![0xAAu8; 64])]);
    }

    #[test]
    fn test_decode_rejects_malformed_base64() {
        let decoder = TxDecoder::new(BASE_DENOM);
        let err = decoder.decode("not!!base64").unwrap_err();
        assert!(matches!(err, TxDecoderError::Base64(_)));
    }

    #[test]
    fn test_decode_rejects_malformed_envelope() {
        let decoder = TxDecoder::new(BASE_DENOM);
        let err = decoder.decode(&base64::encode([0xFFu8, 0xFF])).unwrap_err();
        assert!(matches!(err, TxDecoderError::Proto(_)));
    }

    #[test]
    fn test_get_fee_sums_amounts() {
        let decoder = TxDecoder::new(BASE_DENOM);
        let fee = decoder
            .get_fee(&encode_tx(vec![("100", BASE_DENOM), ("50", BASE_DENOM)]))
            .unwrap();
        assert_eq!(fee, Coin::new("150", BASE_DENOM).unwrap());
    }

    #[test]
    fn test_get_fee_of_empty_fee_list_is_zero() {
        let decoder = TxDecoder::new(BASE_DENOM);
        let fee = decoder.get_fee(&encode_tx(vec![])).unwrap();
        assert_eq!(fee, Coin::zero(BASE_DENOM));
        assert!(fee.is_zero());
    }

    #[test]
    fn test_get_fee_rejects_unrecognized_denom() {
        let decoder = TxDecoder::new(BASE_DENOM);
        let err = decoder.get_fee(&encode_tx(vec![("100", "uatom")])).unwrap_err();
        assert!(matches!(
            err,
            TxDecoderError::UnrecognizedDenom { ref denom } if denom == "uatom"
        ));
    }

    #[test]
    fn test_get_fee_order_does_not_matter() {
        let decoder = TxDecoder::new(BASE_DENOM);
        let forward = decoder
            .get_fee(&encode_tx(vec![("100", BASE_DENOM), ("50", BASE_DENOM)]))
            .unwrap();
        let backward = decoder
            .get_fee(&encode_tx(vec![("50", BASE_DENOM), ("100", BASE_DENOM)]))
            .unwrap();
        assert_eq!(forward, backward);
    }
}

// SPDX-License-Identifier: Apache-2.0

//! Minimal hand-written prost shapes for the Cosmos SDK transaction
//! envelope. Only the fee/signer surface is modelled; message payloads stay
//! opaque `Any` values.

/// `google.protobuf.Any`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Any {
    #[prost(string, tag = "1")]
    pub type_url: String,
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
}

/// `cosmos.tx.v1beta1.TxRaw`: the outermost wire envelope.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxRaw {
    #[prost(bytes = "vec", tag = "1")]
    pub body_bytes: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub auth_info_bytes: Vec<u8>,
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub signatures: Vec<Vec<u8>>,
}

/// `cosmos.tx.v1beta1.TxBody`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxBody {
    #[prost(message, repeated, tag = "1")]
    pub messages: Vec<Any>,
    #[prost(string, tag = "2")]
    pub memo: String,
    #[prost(uint64, tag = "3")]
    pub timeout_height: u64,
    #[prost(message, repeated, tag = "1023")]
    pub extension_options: Vec<Any>,
    #[prost(message, repeated, tag = "2047")]
    pub non_critical_extension_options: Vec<Any>,
}

/// `cosmos.tx.v1beta1.AuthInfo`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AuthInfo {
    #[prost(message, repeated, tag = "1")]
    pub signer_infos: Vec<SignerInfo>,
    #[prost(message, optional, tag = "2")]
    pub fee: Option<Fee>,
}

/// `cosmos.tx.v1beta1.SignerInfo`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignerInfo {
    #[prost(message, optional, tag = "1")]
    pub public_key: Option<Any>,
    #[prost(message, optional, tag = "2")]
    pub mode_info: Option<ModeInfo>,
    #[prost(uint64, tag = "3")]
    pub sequence: u64,
}

/// `cosmos.tx.v1beta1.ModeInfo`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ModeInfo {
    #[prost(oneof = "mode_info::Sum", tags = "1, 2")]
    pub sum: Option<mode_info::Sum>,
}

pub mod mode_info {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Sum {
        #[prost(message, tag = "1")]
        Single(super::Single),
        #[prost(message, tag = "2")]
        Multi(super::Multi),
    }
}

/// `cosmos.tx.v1beta1.ModeInfo.Single`. `mode` is the `SignMode` enum kept
/// as a raw `i32`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Single {
    #[prost(int32, tag = "1")]
    pub mode: i32,
}

/// `cosmos.tx.v1beta1.ModeInfo.Multi`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Multi {
    #[prost(message, optional, tag = "1")]
    pub bitarray: Option<CompactBitArray>,
    #[prost(message, repeated, tag = "2")]
    pub mode_infos: Vec<ModeInfo>,
}

/// `cosmos.crypto.multisig.v1beta1.CompactBitArray`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CompactBitArray {
    #[prost(uint32, tag = "1")]
    pub extra_bits_stored: u32,
    #[prost(bytes = "vec", tag = "2")]
    pub elems: Vec<u8>,
}

/// `cosmos.tx.v1beta1.Fee`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Fee {
    #[prost(message, repeated, tag = "1")]
    pub amount: Vec<ProtoCoin>,
    #[prost(uint64, tag = "2")]
    pub gas_limit: u64,
    #[prost(string, tag = "3")]
    pub payer: String,
    #[prost(string, tag = "4")]
    pub granter: String,
}

/// `cosmos.base.v1beta1.Coin`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoCoin {
    #[prost(string, tag = "1")]
    pub denom: String,
    #[prost(string, tag = "2")]
    pub amount: String,
}

/// Single-key pubkey payload shared by `cosmos.crypto.secp256k1.PubKey` and
/// `cosmos.crypto.ed25519.PubKey`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PubKey {
    #[prost(bytes = "vec", tag = "1")]
    pub key: Vec<u8>,
}

/// `cosmos.crypto.multisig.LegacyAminoPubKey`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LegacyAminoPubKey {
    #[prost(uint32, tag = "1")]
    pub threshold: u32,
    #[prost(message, repeated, tag = "2")]
    pub public_keys: Vec<Any>,
}

/// Maps a `SignMode` value to its protobuf enum name; unknown values fall
/// back to the numeric form.
pub fn sign_mode_name(mode: i32) -> String {
    match mode {
        0 => "SIGN_MODE_UNSPECIFIED".to_string(),
        1 => "SIGN_MODE_DIRECT".to_string(),
        2 => "SIGN_MODE_TEXTUAL".to_string(),
        3 => "SIGN_MODE_DIRECT_AUX".to_string(),
        127 => "SIGN_MODE_LEGACY_AMINO_JSON".to_string(),
        other => other.to_string(),
    }
}

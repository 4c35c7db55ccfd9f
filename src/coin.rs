// SPDX-License-Identifier: Apache-2.0

//! Arbitrary-precision token amounts. On-chain amounts routinely exceed the
//! 64-bit range, so amounts are `BigUint` and arithmetic never overflows.

use num::{BigUint, Zero};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CoinError {
    #[error("malformed coin amount {0:?}: expected a non-negative decimal integer")]
    MalformedAmount(String),
    #[error("denom mismatch: cannot add {right} to {left}")]
    DenomMismatch { left: String, right: String },
}

/// An amount of a single token denomination. Value type: operations return
/// new coins and never mutate in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coin {
    amount: BigUint,
    denom: String,
}

impl Coin {
    /// Builds a coin from a decimal string amount. Rejects signs, fractions
    /// and anything else that is not a plain run of ASCII digits.
    pub fn new(amount: &str, denom: impl Into<String>) -> Result<Self, CoinError> {
        if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoinError::MalformedAmount(amount.to_string()));
        }
        let amount = amount
            .parse::<BigUint>()
            .map_err(|_| CoinError::MalformedAmount(amount.to_string()))?;
        Ok(Self {
            amount,
            denom: denom.into(),
        })
    }

    /// Parses the combined `<amount><denom>` form, e.g. `100basetcro`.
    pub fn parse(s: &str) -> Result<Self, CoinError> {
        let split = s.bytes().position(|b| !b.is_ascii_digit()).unwrap_or(s.len());
        let (amount, denom) = s.split_at(split);
        if amount.is_empty()
            || denom.is_empty()
            || !denom.starts_with(|c: char| c.is_ascii_alphabetic())
            || !denom.bytes().all(|b| b.is_ascii_alphanumeric())
        {
            return Err(CoinError::MalformedAmount(s.to_string()));
        }
        Self::new(amount, denom)
    }

    /// The additive identity for `denom`.
    pub fn zero(denom: impl Into<String>) -> Self {
        Self {
            amount: BigUint::zero(),
            denom: denom.into(),
        }
    }

    pub fn amount(&self) -> &BigUint {
        &self.amount
    }

    pub fn denom(&self) -> &str {
        &self.denom
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns `self + other`. Both coins must share a denom.
    pub fn add(&self, other: &Coin) -> Result<Coin, CoinError> {
        if self.denom != other.denom {
            return Err(CoinError::DenomMismatch {
                left: self.denom.clone(),
                right: other.denom.clone(),
            });
        }
        Ok(Coin {
            amount: &self.amount + &other.amount,
            denom: self.denom.clone(),
        })
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Wire representation used by events and view rows:
/// `{"denom": "basetcro", "amount": "100"}` with the amount as a string.
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CoinRepr {
    denom: String,
    amount: String,
}

impl Serialize for Coin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        CoinRepr {
            denom: self.denom.clone(),
            amount: self.amount.to_string(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Coin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = CoinRepr::deserialize(deserializer)?;
        Coin::new(&repr.amount, repr.denom).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_parses_large_amounts() {
        let coin = Coin::new("340282366920938463463374607431768211456", "basetcro").unwrap();
        assert_eq!(
            coin.amount().to_string(),
            "340282366920938463463374607431768211456"
        );
        assert_eq!(coin.denom(), "basetcro");
    }

    #[test]
    fn test_new_rejects_malformed_amounts() {
        for bad in ["", "-1", "+1", "1.5", "10 ", "abc", "1e9"] {
            assert_eq!(
                Coin::new(bad, "basetcro"),
                Err(CoinError::MalformedAmount(bad.to_string())),
                "expected {:?} to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_parse_combined_form() {
        let coin = Coin::parse("100basetcro").unwrap();
        assert_eq!(coin, Coin::new("100", "basetcro").unwrap());

        assert!(Coin::parse("basetcro").is_err());
        assert!(Coin::parse("100").is_err());
        assert!(Coin::parse("-100basetcro").is_err());
        assert!(Coin::parse("100base tcro").is_err());
        assert!(Coin::parse("100base-tcro").is_err());
    }

    #[test]
    fn test_add_identity() {
        let coin = Coin::new("42", "basetcro").unwrap();
        assert_eq!(Coin::zero("basetcro").add(&coin).unwrap(), coin);
        assert_eq!(coin.add(&Coin::zero("basetcro")).unwrap(), coin);
    }

    #[test]
    fn test_add_is_commutative() {
        let a = Coin::new("100", "basetcro").unwrap();
        let b = Coin::new("50", "basetcro").unwrap();
        assert_eq!(a.add(&b).unwrap(), b.add(&a).unwrap());
        assert_eq!(a.add(&b).unwrap(), Coin::new("150", "basetcro").unwrap());
    }

    #[test]
    fn test_add_rejects_denom_mismatch() {
        let a = Coin::new("100", "basetcro").unwrap();
        let b = Coin::new("50", "uatom").unwrap();
        assert_eq!(
            a.add(&b),
            Err(CoinError::DenomMismatch {
                left: "basetcro".to_string(),
                right: "uatom".to_string(),
            })
        );
    }

    #[test]
    fn test_serde_round_trip() {
        let coin = Coin::new("10", "basetcro").unwrap();
        let encoded = serde_json::to_string(&coin).unwrap();
        assert_eq!(encoded, r#"{"denom":"basetcro","amount":"10"}"#);
        let decoded: Coin = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, coin);
    }

    #[test]
    fn test_deserialize_rejects_negative_amount() {
        let err = serde_json::from_str::<Coin>(r#"{"denom":"basetcro","amount":"-10"}"#);
        assert!(err.is_err());
    }
}

// SPDX-License-Identifier: Apache-2.0

use crate::storage::postgres::DEFAULT_POOL_SIZE;
use serde::{Deserialize, Serialize};

/// Indexer settings supplied by whatever bootstraps the service. Strict
/// deserialization: a typo in a field name is a startup error, not a
/// silently ignored setting.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IndexerConfig {
    /// The single token denomination fees are accounted in.
    pub base_denom: String,
    pub postgres_connection_string: String,
    pub db_pool_size: Option<u32>,
}

impl IndexerConfig {
    pub fn db_pool_size(&self) -> u32 {
        self.db_pool_size.unwrap_or(DEFAULT_POOL_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unknown_fields() {
        let err = serde_json::from_str::<IndexerConfig>(
            r#"{
                "base_denom": "basetcro",
                "postgres_connection_string": "postgres://localhost/indexer",
                "db_pool_sze": 8
            }"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_pool_size_defaults() {
        let config: IndexerConfig = serde_json::from_str(
            r#"{
                "base_denom": "basetcro",
                "postgres_connection_string": "postgres://localhost/indexer"
            }"#,
        )
        .unwrap();
        assert_eq!(config.db_pool_size(), DEFAULT_POOL_SIZE);
    }
}

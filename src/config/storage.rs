//! Storage configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory for the local filesystem fallback
    #[serde(default = "default_fallback_dir")]
    pub fallback_dir: String,

    /// Firestore-style collection name used by the primary store
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl StorageConfig {
    /// Get the fallback directory as a path
    pub fn fallback_path(&self) -> PathBuf {
        PathBuf::from(&self.fallback_dir)
    }

    /// Validate storage configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.fallback_dir.trim().is_empty() {
            return Err(ValidationError::EmptyFallbackDir);
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            fallback_dir: default_fallback_dir(),
            collection: default_collection(),
        }
    }
}

fn default_fallback_dir() -> String {
    "./data/estacoes_geradas".to_string()
}

fn default_collection() -> String {
    "estacoes_clinicas".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.collection, "estacoes_clinicas");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_empty_dir() {
        let config = StorageConfig {
            fallback_dir: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}

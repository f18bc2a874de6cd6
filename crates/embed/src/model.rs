//! Embedding model identifiers.
//!
//! A `Model` names which embedding model produced (and must be used to
//! interpret) a document's vector. It acts as a namespace key: every index
//! name and storage key prefix is derived deterministically from it, so
//! vectors produced by different models are never compared against each
//! other.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use vecstore_core::{AppError, AppResult};

/// Enumerated embedding model identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Model {
    Llama32,
    MxbaiEmbedLarge,
    SnowflakeArcticEmbed,
}

impl Model {
    /// All known models.
    pub const ALL: [Model; 3] = [
        Model::Llama32,
        Model::MxbaiEmbedLarge,
        Model::SnowflakeArcticEmbed,
    ];

    /// The model name as used by the embedding runtime and in namespace
    /// derivation.
    pub fn name(&self) -> &'static str {
        match self {
            Model::Llama32 => "llama3.2",
            Model::MxbaiEmbedLarge => "mxbai-embed-large",
            Model::SnowflakeArcticEmbed => "snowflake-arctic-embed",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Model {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        Model::ALL
            .iter()
            .copied()
            .find(|model| model.name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Model::ALL.iter().map(|m| m.name()).collect();
                AppError::Config(format!(
                    "Unknown model: {}. Supported: {}",
                    s,
                    known.join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_names() {
        assert_eq!(Model::Llama32.name(), "llama3.2");
        assert_eq!(Model::MxbaiEmbedLarge.name(), "mxbai-embed-large");
        assert_eq!(Model::SnowflakeArcticEmbed.name(), "snowflake-arctic-embed");
    }

    #[test]
    fn test_model_round_trip() {
        for model in Model::ALL {
            assert_eq!(Model::from_str(model.name()).unwrap(), model);
        }
    }

    #[test]
    fn test_unknown_model() {
        let err = Model::from_str("gpt-42").unwrap_err();
        assert!(err.to_string().contains("Unknown model"));
    }

    #[test]
    fn test_display_matches_name() {
        assert_eq!(Model::MxbaiEmbedLarge.to_string(), "mxbai-embed-large");
    }
}

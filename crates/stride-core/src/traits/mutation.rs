//! The closed set of mutation kinds and its persisted encoding.
//!
//! Business code defines one enum whose variants carry statically typed
//! payloads, serialized with serde's adjacently tagged representation:
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use stride_core::traits::Mutation;
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! #[serde(tag = "code", content = "payload")]
//! enum AppMutation {
//!     #[serde(rename = "routine.upsert")]
//!     UpsertRoutine { id: String, name: String },
//!     #[serde(rename = "routine.delete")]
//!     DeleteRoutine { id: String },
//! }
//!
//! impl Mutation for AppMutation {}
//! ```
//!
//! The tag becomes `mutation_code` and the content becomes `payload` in the
//! queue. The enum's variants are the only registry of codes, so a code that
//! no variant carries can only show up from storage (for example, an entry
//! written by a newer app build) and is a terminal error.

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::QueueError;

pub const CODE_KEY: &str = "code";
pub const PAYLOAD_KEY: &str = "payload";

pub trait Mutation: Serialize + DeserializeOwned + Debug + Send + Sync + 'static {}

/// A mutation split into its persisted columns.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedMutation {
    pub code: String,
    pub payload: Value,
}

/// Why a persisted entry could not be turned back into a mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("no mutation registered for code '{code}'")]
    UnknownCode { code: String },

    #[error("payload for '{code}' does not match its shape: {reason}")]
    InvalidPayload { code: String, reason: String },
}

pub fn encode_mutation<M: Mutation>(mutation: &M) -> Result<EncodedMutation, QueueError> {
    let value = serde_json::to_value(mutation).map_err(|e| QueueError::Encode {
        reason: e.to_string(),
    })?;

    let Value::Object(mut map) = value else {
        return Err(QueueError::Encode {
            reason: "mutation must serialize as an adjacently tagged object".to_string(),
        });
    };

    let code = match map.remove(CODE_KEY) {
        Some(Value::String(code)) => code,
        _ => {
            return Err(QueueError::Encode {
                reason: format!("mutation is missing its '{CODE_KEY}' tag"),
            })
        }
    };

    Ok(EncodedMutation {
        code,
        payload: map.remove(PAYLOAD_KEY).unwrap_or(Value::Null),
    })
}

pub fn decode_mutation<M: Mutation>(code: &str, payload: &Value) -> Result<M, DecodeError> {
    let mut map = Map::new();
    map.insert(CODE_KEY.to_string(), Value::String(code.to_string()));
    // Unit variants serialize without content.
    if !payload.is_null() {
        map.insert(PAYLOAD_KEY.to_string(), payload.clone());
    }

    serde_json::from_value(Value::Object(map)).map_err(|e| {
        let reason = e.to_string();
        if reason.starts_with(UNKNOWN_VARIANT) {
            DecodeError::UnknownCode {
                code: code.to_string(),
            }
        } else {
            DecodeError::InvalidPayload {
                code: code.to_string(),
                reason,
            }
        }
    })
}

/// Prefix of serde's `Error::unknown_variant` message, raised when the tag
/// names no variant of the enum.
const UNKNOWN_VARIANT: &str = "unknown variant";

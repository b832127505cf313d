use serde::{Deserialize, Serialize};

use stride_core::traits::Mutation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", content = "payload")]
pub enum FixtureMutation {
    #[serde(rename = "note.upsert")]
    UpsertNote { id: String, body: String },
    #[serde(rename = "note.delete")]
    DeleteNote { id: String },
    #[serde(rename = "profile.touch")]
    TouchProfile,
}

impl FixtureMutation {
    pub fn upsert(id: &str, body: &str) -> Self {
        Self::UpsertNote {
            id: id.to_string(),
            body: body.to_string(),
        }
    }

    pub fn delete(id: &str) -> Self {
        Self::DeleteNote { id: id.to_string() }
    }
}

impl Mutation for FixtureMutation {}

//! Response shapes shared by every resource.

use serde::{Deserialize, Serialize};

use crate::versioned::Payload;

/// Body returned by DELETE endpoints, e.g. `{"message": "Deleted 1 agent(s)."}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StringResponse {
    /// Human-readable outcome reported by the server.
    #[serde(default)]
    pub message: String,
}

impl Payload for StringResponse {}

//! User reference model.
//!
//! A `UserRef` is the counterpart (or the local user) as seen from this
//! session: identity, display fields, and the live online flag.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// Mutated only by the presence tracker.
    #[serde(default)]
    pub online: bool,
}

impl UserRef {
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        UserRef {
            id,
            username: username.into(),
            photo_url: None,
            online: false,
        }
    }
}

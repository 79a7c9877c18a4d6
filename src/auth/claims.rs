use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::Role;

/// Type of JWT: temp (after password check) or access (after 2FA).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Temp,
    Access,
}

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,   // user ID
    pub iat: usize,  // issued at (unix timestamp)
    pub exp: usize,  // expires at (unix timestamp)
    pub iss: String, // issuer
    pub aud: String, // audience
    #[serde(rename = "type")]
    pub kind: TokenKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>, // access tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>, // access tokens only
}

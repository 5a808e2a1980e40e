//! REST authentication bodies.
//!
//! Login and registration happen over plain HTTP before the event socket is
//! opened.

use serde::{Deserialize, Serialize};

use crate::Identity;

/// `POST /user/login` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// `POST /user/login` success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginReply {
    /// Issued identity.
    #[serde(rename = "responseMsg")]
    pub identity: Identity,
}

/// `POST /user/register` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Display name for the new account.
    #[serde(rename = "userName")]
    pub display_name: String,
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

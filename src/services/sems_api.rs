//! Trait and types for talking to the SEMS monitoring portal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Portal region. Login and data calls may target different regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Us,
    Eu,
}

impl Region {
    pub fn as_str(self) -> &'static str {
        match self {
            Region::Us => "us",
            Region::Eu => "eu",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "us" => Ok(Region::Us),
            "eu" => Ok(Region::Eu),
            other => Err(format!("unknown SEMS region '{other}' (expected us or eu)")),
        }
    }
}

/// Account credentials plus the regions to use for each call.
#[derive(Clone)]
pub struct Credentials {
    pub account: String,
    pub password: String,
    pub login_region: Region,
    pub data_region: Region,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account", &self.account)
            .field("password", &"***")
            .field("login_region", &self.login_region)
            .field("data_region", &self.data_region)
            .finish()
    }
}

/// Opaque session token returned by a successful login.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// Failures at the SEMS boundary.
#[derive(Debug, Error)]
pub enum SemsError {
    /// Login rejected or login payload not understood.
    #[error("SEMS login failed: {0}")]
    Auth(String),
    #[error("SEMS request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("SEMS returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("SEMS response is not valid JSON: {0}")]
    Decode(String),
    #[error("invalid SEMS URL {0}")]
    InvalidUrl(String),
}

/// Abstraction over the SEMS portal: one login, then per-column data calls.
#[async_trait::async_trait]
pub trait SemsApi: Send + Sync {
    /// Performs the login handshake and returns a session token.
    async fn login(&self, credentials: &Credentials) -> Result<SessionToken, SemsError>;

    /// Fetches one column for one inverter and day. `date` is formatted
    /// `YYYY-MM-DD HH:MM:SS`. The body is returned untouched.
    async fn fetch_column(
        &self,
        token: &SessionToken,
        device_id: &str,
        column: &str,
        date: &str,
        region: Region,
    ) -> Result<Value, SemsError>;
}

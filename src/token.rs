use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use derive_more::Debug;
use serde::Deserialize;

use crate::error::Error;

/// The opaque bearer token. It is never printed, even at trace level.
#[derive(Clone, Debug, PartialEq, Eq)]
#[debug("Credential(..)")]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The claims the backend puts in the payload segment of its tokens.
#[derive(Debug, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub role: String,
    pub exp: Option<i64>,
}

impl Claims {
    /// Read the payload of a JWT. The signature is not checked, only the
    /// backend can do that.
    pub fn decode(credential: &Credential) -> Result<Self, Error> {
        let payload = credential
            .as_str()
            .split('.')
            .nth(1)
            .ok_or_else(|| Error::MalformedToken {
                message: "expected three dot-separated segments".to_string(),
            })?;
        let bytes = BASE64_URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| Error::MalformedToken {
                message: e.to_string(),
            })?;
        serde_json::from_slice(&bytes).map_err(|e| Error::MalformedToken {
            message: e.to_string(),
        })
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|at| at <= now)
    }
}

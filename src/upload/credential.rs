use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::fmt;

use crate::datasource::query::{
    Frame, ACCESS_KEY_ID_FIELD, EXPIRATION_FIELD, SECRET_ACCESS_KEY_FIELD, SESSION_TOKEN_FIELD,
};
use crate::error::ExplorerError;

/// Credentials are refreshed this long before they actually expire.
const EXPIRY_WINDOW_SECS: i64 = 15;

/// Short-lived transfer credential issued by the broker
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiry: DateTime<Utc>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl Credential {
    /// Decode the broker's frame. Without an `Expiration` column the session
    /// is assumed to last `lifetime` from `now`.
    pub fn from_frame(frame: &Frame, lifetime: Duration, now: DateTime<Utc>) -> Result<Self> {
        let column = |name: &str| {
            frame
                .first_value(name)
                .map(str::to_string)
                .ok_or_else(|| ExplorerError::MissingCredentialColumn { column: name.to_string() })
        };

        let expiry = match frame.first_value(EXPIRATION_FIELD) {
            Some(value) if !value.is_empty() => DateTime::parse_from_rfc3339(value)
                .map_err(|_| ExplorerError::InvalidExpiry { value: value.to_string() })?
                .with_timezone(&Utc),
            _ => now + lifetime,
        };

        Ok(Self {
            access_key_id: column(ACCESS_KEY_ID_FIELD)?,
            secret_access_key: column(SECRET_ACCESS_KEY_FIELD)?,
            session_token: column(SESSION_TOKEN_FIELD)?,
            expiry,
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_WINDOW_SECS) >= self.expiry
    }
}

/// Single-slot credential cache owned by the upload pipeline.
#[derive(Debug, Default)]
pub struct CredentialCache {
    slot: Option<Credential>,
}

impl CredentialCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached credential, if it is still valid at `now`.
    pub fn current(&self, now: DateTime<Utc>) -> Option<&Credential> {
        self.slot.as_ref().filter(|c| !c.is_expired_at(now))
    }

    pub fn install(&mut self, credential: Credential) {
        self.slot = Some(credential);
    }
}

//! Persisted connection record.
//!
//! The externally visible URI of a record always carries [`PASSWORD_MASK`]
//! in place of a password. The real password is held separately in a
//! zeroizing buffer that is never serialized and is recombined with the
//! masked URI only when the connection string is actually needed.
//!
//! [`PASSWORD_MASK`]: crate::uri::PASSWORD_MASK

use crate::engines::{EngineSpec, EngineSpecRegistry};
use crate::models::RecordExtra;
use crate::uri::{ConnectionUri, PASSWORD_MASK};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use zeroize::Zeroizing;

/// Returned by [`ConnectionRecord::uri_decrypted`] when the stored URI does
/// not parse.
pub const INVALID_URI_PLACEHOLDER: &str = "dialect://invalid_uri";

/// A stored database connection.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionRecord {
    /// Store id; `None` until persisted
    #[serde(default)]
    pub id: Option<i64>,
    /// Stable external identifier
    pub uuid: Uuid,
    /// Unique display name
    pub name: String,
    /// Connection URI with the password masked
    #[serde(rename = "sqlalchemy_uri")]
    pub masked_uri: String,
    #[serde(skip)]
    secret: Option<Zeroizing<String>>,
    /// Engine-specific secret blob, opaque to this crate
    #[serde(default)]
    pub encrypted_extra: Option<String>,
    /// PEM certificate for TLS verification
    #[serde(default)]
    pub server_cert: Option<String>,
    /// Whether queries run as the logged-in user
    #[serde(default)]
    pub impersonate_user: bool,
    /// Raw JSON with the keys of [`RecordExtra`]
    pub extra: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for ConnectionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRecord")
            .field("id", &self.id)
            .field("uuid", &self.uuid)
            .field("name", &self.name)
            .field("masked_uri", &self.masked_uri)
            .field("secret", &self.secret.as_ref().map(|_| "****"))
            .field("encrypted_extra", &self.encrypted_extra.as_ref().map(|_| "****"))
            .field("server_cert", &self.server_cert.is_some())
            .field("impersonate_user", &self.impersonate_user)
            .field("extra", &self.extra)
            .finish()
    }
}

impl Default for ConnectionRecord {
    fn default() -> Self {
        Self::new("")
    }
}

impl ConnectionRecord {
    /// Creates an unsaved record with no URI and the default extra blob.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            uuid: Uuid::new_v4(),
            name: name.into(),
            masked_uri: String::new(),
            secret: None,
            encrypted_extra: None,
            server_cert: None,
            impersonate_user: false,
            extra: RecordExtra::default().to_json_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a transient record used only to test a connection.
    pub fn for_connection_test() -> Self {
        Self::new("")
    }

    /// Builder method to set the id.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Builder method wrapping [`Self::set_uri`].
    ///
    /// # Errors
    /// Same as [`Self::set_uri`].
    pub fn with_uri(mut self, uri: &str) -> Result<Self> {
        self.set_uri(uri)?;
        Ok(self)
    }

    /// Stores a connection URI.
    ///
    /// The password component moves into the secret unless it is the mask
    /// itself, in which case the current secret is kept. A URI without a
    /// password clears the secret.
    ///
    /// # Errors
    /// Returns [`crate::DataVizError::InvalidUri`] if the URI does not parse.
    pub fn set_uri(&mut self, uri: &str) -> Result<()> {
        let parsed = ConnectionUri::parse(uri)?;
        match &parsed.password {
            Some(password) if password == PASSWORD_MASK => {}
            Some(password) => self.secret = Some(Zeroizing::new(password.clone())),
            None => self.secret = None,
        }
        self.masked_uri = parsed.masked().to_string();
        self.updated_at = Utc::now();
        Ok(())
    }

    /// The externally visible URI.
    pub fn safe_uri(&self) -> &str {
        &self.masked_uri
    }

    /// Returns true if a password is held for this record.
    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    /// Rebuilds the URI with the real password.
    ///
    /// The result carries the secret and must not be logged.
    pub fn uri_decrypted(&self) -> String {
        match ConnectionUri::parse(&self.masked_uri) {
            Ok(uri) => uri
                .with_password(self.secret.as_ref().map(|s| s.as_str().to_string()))
                .to_string(),
            Err(_) => INVALID_URI_PLACEHOLDER.to_string(),
        }
    }

    /// Backend name from the URI scheme.
    pub fn backend(&self) -> Option<String> {
        ConnectionUri::parse(&self.masked_uri)
            .ok()
            .map(|uri| uri.backend)
    }

    /// Resolves the engine spec from the URI's `backend+driver` scheme.
    ///
    /// # Errors
    /// Returns [`crate::DataVizError::InvalidUri`] if the stored URI does not
    /// parse.
    pub fn engine_spec(&self, registry: &EngineSpecRegistry) -> Result<Arc<dyn EngineSpec>> {
        registry.resolve_uri(&self.masked_uri)
    }

    /// Parses the extra blob, falling back to the defaults.
    pub fn extra_json(&self) -> RecordExtra {
        RecordExtra::parse_lenient(Some(&self.extra))
    }

    /// The encrypted extra as the engine presents it to clients.
    pub fn masked_encrypted_extra(&self, spec: &dyn EngineSpec) -> Option<String> {
        spec.mask_encrypted_extra(self.encrypted_extra.as_deref())
    }
}

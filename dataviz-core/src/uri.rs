//! Connection URI parsing and rendering.
//!
//! A connection URI has the shape
//! `backend[+driver]://[user[:password]@]host[:port][/database][?key=value...]`.
//! [`ConnectionUri`] splits it into its parts so engine specs can build and
//! decompose URIs without string surgery, and so a password can be swapped
//! for the masking sentinel and back.

use crate::{DataVizError, Result};
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Fixed placeholder that replaces a password in any externally visible URI.
pub const PASSWORD_MASK: &str = "XXXXXXXXXX";

/// Characters escaped inside the `user:password` section.
const USERINFO: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b':')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Characters escaped inside the database path segment.
const DATABASE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Structured form of a connection URI.
///
/// `Debug` output masks the password; `Display` renders the full URI and must
/// only be used where the secret is meant to travel.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionUri {
    /// Backend (engine) name, e.g. "postgresql"
    pub backend: String,
    /// Optional driver, e.g. "psycopg2"
    pub driver: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    /// Query parameters, rendered in key order
    pub query: BTreeMap<String, String>,
}

impl ConnectionUri {
    /// Creates a URI with only a scheme set.
    pub fn new(backend: impl Into<String>, driver: Option<&str>) -> Self {
        Self {
            backend: backend.into(),
            driver: driver.filter(|d| !d.is_empty()).map(str::to_string),
            username: None,
            password: None,
            host: None,
            port: None,
            database: None,
            query: BTreeMap::new(),
        }
    }

    /// Parses a URI string, trimming surrounding whitespace.
    ///
    /// # Errors
    /// Returns [`DataVizError::InvalidUri`] (masked) if the string is not a
    /// hierarchical URL with a scheme.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let url = url::Url::parse(raw).map_err(|_| DataVizError::invalid_uri(raw))?;
        if url.cannot_be_a_base() {
            return Err(DataVizError::invalid_uri(raw));
        }

        let (backend, driver) = match url.scheme().split_once('+') {
            Some((backend, driver)) => (backend.to_string(), Some(driver.to_string())),
            None => (url.scheme().to_string(), None),
        };

        let username = Some(decode(url.username())).filter(|u| !u.is_empty());
        let password = url.password().map(decode);
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .map(|h| decode(h.trim_start_matches('[').trim_end_matches(']')));
        let database = Some(decode(url.path().trim_start_matches('/'))).filter(|d| !d.is_empty());
        let query = url.query_pairs().into_owned().collect();

        Ok(Self {
            backend,
            driver,
            username,
            password,
            host,
            port: url.port(),
            database,
            query,
        })
    }

    /// Returns `backend+driver`, or just `backend` without a driver.
    pub fn scheme(&self) -> String {
        match &self.driver {
            Some(driver) => format!("{}+{}", self.backend, driver),
            None => self.backend.clone(),
        }
    }

    /// Returns a copy with the password replaced.
    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }

    /// Returns true if the password component is the masking sentinel.
    pub fn has_masked_password(&self) -> bool {
        self.password.as_deref() == Some(PASSWORD_MASK)
    }

    /// Returns a copy with any password replaced by the masking sentinel.
    pub fn masked(&self) -> Self {
        let password = self.password.as_ref().map(|_| PASSWORD_MASK.to_string());
        self.clone().with_password(password)
    }
}

fn decode(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

impl fmt::Display for ConnectionUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.scheme())?;

        if let Some(username) = &self.username {
            write!(f, "{}", utf8_percent_encode(username, USERINFO))?;
            if let Some(password) = &self.password {
                write!(f, ":{}", utf8_percent_encode(password, USERINFO))?;
            }
            f.write_str("@")?;
        } else if let Some(password) = &self.password {
            write!(f, ":{}@", utf8_percent_encode(password, USERINFO))?;
        }

        if let Some(host) = &self.host {
            if host.contains(':') {
                write!(f, "[{}]", host)?;
            } else {
                f.write_str(host)?;
            }
        }
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        if let Some(database) = &self.database {
            write!(f, "/{}", utf8_percent_encode(database, DATABASE))?;
        }

        if !self.query.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.query.iter())
                .finish();
            write!(f, "?{}", query)?;
        }

        Ok(())
    }
}

impl fmt::Debug for ConnectionUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConnectionUri")
            .field(&self.masked().to_string())
            .finish()
    }
}

impl FromStr for ConnectionUri {
    type Err = DataVizError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

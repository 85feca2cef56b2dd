//! Username type - the primary key of an account

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest username accepted, in bytes
pub const MAX_USERNAME_LEN: usize = 255;

/// A validated account name
///
/// Usernames are immutable once an account is created; the only way to
/// "rename" is to remove and re-register.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and wrap a username
    pub fn parse(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::Validation("username is empty".into()));
        }
        if name.len() > MAX_USERNAME_LEN {
            return Err(Error::Validation(format!(
                "username exceeds {} bytes",
                MAX_USERNAME_LEN
            )));
        }
        Ok(Username(name))
    }

    /// Wrap a primary key read back from storage, which was validated on insert
    pub(crate) fn from_stored(name: String) -> Self {
        Username(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Username {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Username::parse(s)
    }
}

impl TryFrom<&str> for Username {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Username::parse(s)
    }
}

impl From<Username> for String {
    fn from(name: Username) -> Self {
        name.0
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

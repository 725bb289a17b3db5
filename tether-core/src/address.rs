//! Parsing of `[user@]host:path` sync targets.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// A parsed `[user@]host:path` remote target.
///
/// The path part may be relative, in which case it is resolved against the
/// remote home directory when the endpoint is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAddress {
    pub user: Option<String>,
    pub host: String,
    pub path: String,
}

impl RemoteAddress {
    /// `user@host`, or the bare host when no user was given. This is the
    /// destination string handed to ssh.
    pub fn ssh_target(&self) -> String {
        match &self.user {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        }
    }
}

impl FromStr for RemoteAddress {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((target, path)) = s.split_once(':') else {
            return Err(CoreError::InvalidAddress {
                input: s.to_string(),
                reason: "expected `[user@]host:path` with a colon before the path",
            });
        };
        // Usernames may themselves contain `@`; the host is whatever follows
        // the last one.
        let (user, host) = match target.rsplit_once('@') {
            Some((user, host)) => (Some(user.to_string()), host.to_string()),
            None => (None, target.to_string()),
        };
        if host.is_empty() {
            return Err(CoreError::InvalidAddress {
                input: s.to_string(),
                reason: "host must not be empty",
            });
        }
        if user.as_deref() == Some("") {
            return Err(CoreError::InvalidAddress {
                input: s.to_string(),
                reason: "user must not be empty when `@` is present",
            });
        }
        if path.is_empty() {
            return Err(CoreError::InvalidAddress {
                input: s.to_string(),
                reason: "path must not be empty",
            });
        }
        Ok(Self {
            user,
            host,
            path: path.to_string(),
        })
    }
}

impl fmt::Display for RemoteAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ssh_target(), self.path)
    }
}

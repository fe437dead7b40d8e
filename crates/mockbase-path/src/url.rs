//! Endpoint URLs: `scheme://host/path`.

use std::fmt;
use std::str::FromStr;

use crate::{Path, PathError};

/// A node address: the endpoint it lives in plus its path.
///
/// The endpoint is the `scheme://host` prefix and is the identity of one
/// logical database.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Url {
    endpoint: String,
    path: Path,
}

impl Url {
    pub fn new(endpoint: impl Into<String>, path: Path) -> Self {
        Self {
            endpoint: endpoint.into(),
            path,
        }
    }

    /// Parse `scheme://host[/path]`.
    ///
    /// Query strings and fragments are ignored. The path part is normalized
    /// like [`Path::parse`].
    ///
    /// # Errors
    ///
    /// `PathError::InvalidUrl` when the scheme or host is missing, plus any
    /// error from validating the path.
    ///
    /// # Example
    ///
    /// ```
    /// use mockbase_path::Url;
    ///
    /// let url = Url::parse("mock://db/a/b?x=1").unwrap();
    /// assert_eq!(url.endpoint(), "mock://db");
    /// assert_eq!(url.path().to_string(), "/a/b");
    /// assert_eq!(url.to_string(), "mock://db/a/b");
    ///
    /// assert!(Url::parse("db/a").is_err());
    /// assert!(Url::parse("mock:///a").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, PathError> {
        let invalid = || PathError::InvalidUrl(input.to_string());
        let (scheme, rest) = input.split_once("://").ok_or_else(invalid)?;
        let scheme_ok = scheme
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"+-.".contains(&b));
        if scheme.is_empty() || !scheme_ok {
            return Err(invalid());
        }
        let rest = rest.split(['?', '#']).next().unwrap_or_default();
        let (host, path) = match rest.find('/') {
            Some(i) => rest.split_at(i),
            None => (rest, ""),
        };
        if host.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            endpoint: format!("{scheme}://{host}"),
            path: Path::parse(path)?,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_root(&self) -> bool {
        self.path.is_root()
    }

    pub fn into_parts(self) -> (String, Path) {
        (self.endpoint, self.path)
    }
}

impl FromStr for Url {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.endpoint, self.path)
    }
}

//! Endpoint URLs and node paths.
//!
//! A [`Path`] addresses a node inside one endpoint's tree as an ordered list
//! of non-empty segments; the root is the empty list. A [`Url`] pairs a path
//! with the endpoint (`scheme://host`) it belongs to.
//!
//! # Example
//!
//! ```
//! use mockbase_path::{Path, Url};
//!
//! let path = Path::root().child("users/alice").unwrap();
//! assert_eq!(path.to_string(), "/users/alice");
//! assert_eq!(path.key(), Some("alice"));
//! assert_eq!(path.parent().unwrap().to_string(), "/users");
//!
//! // Relative segments collapse like POSIX path resolution
//! let up = path.child("../bob").unwrap();
//! assert_eq!(up.to_string(), "/users/bob");
//!
//! let url = Url::parse("mock://db/users/alice").unwrap();
//! assert_eq!(url.endpoint(), "mock://db");
//! assert_eq!(url.path(), &path);
//! ```

use std::cmp::Ordering;
use std::fmt;

use mockbase_util::key_cmp;
use thiserror::Error;

pub mod url;
pub use url::Url;

pub mod validate;
pub use validate::{validate_key, validate_segments, MAX_KEY_BYTES, MAX_PATH_DEPTH};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path must be a non-empty string")]
    EmptyPath,
    #[error("path is {depth} segments deep, more than 32 allowed")]
    TooDeep { depth: usize },
    #[error("key is {len} bytes long, more than 768 allowed")]
    KeyTooLong { len: usize },
    #[error("key {0:?} must not contain '/'")]
    SlashInKey(String),
    #[error("invalid url: {0:?}")]
    InvalidUrl(String),
}

/// A normalized node path.
///
/// Paths order segment by segment using [`key_cmp`], with a path ordered
/// before every path it is a prefix of.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<String>,
}

/// Resolve slash-delimited input onto `base`.
///
/// Empty segments and `.` are dropped, `..` removes the previous segment and
/// stops at the root.
fn resolve_onto(base: &mut Vec<String>, input: &str) {
    for part in input.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                base.pop();
            }
            seg => base.push(seg.to_string()),
        }
    }
}

impl Path {
    /// The root path.
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parse a slash-delimited path. The empty string and `/` are the root.
    ///
    /// # Example
    ///
    /// ```
    /// use mockbase_path::Path;
    ///
    /// assert!(Path::parse("").unwrap().is_root());
    /// assert_eq!(Path::parse("a//b/./c/..").unwrap().to_string(), "/a/b");
    /// ```
    pub fn parse(input: &str) -> Result<Self, PathError> {
        let mut segments = Vec::new();
        resolve_onto(&mut segments, input);
        validate_segments(&segments)?;
        Ok(Self { segments })
    }

    /// Build a path from already split segments, validating each one.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        validate_segments(&segments)?;
        Ok(Self { segments })
    }

    /// Join `rel` onto this path and normalize the result.
    ///
    /// # Errors
    ///
    /// - `PathError::EmptyPath` if `rel` is empty
    /// - `PathError::TooDeep` / `PathError::KeyTooLong` if the result is invalid
    ///
    /// # Example
    ///
    /// ```
    /// use mockbase_path::{Path, PathError};
    ///
    /// let a = Path::root().child("a").unwrap();
    /// assert_eq!(a.child("b").unwrap(), Path::root().child("a/b").unwrap());
    /// assert_eq!(a.child(""), Err(PathError::EmptyPath));
    /// assert!(a.child("../..").unwrap().is_root());
    /// ```
    pub fn child(&self, rel: &str) -> Result<Self, PathError> {
        if rel.is_empty() {
            return Err(PathError::EmptyPath);
        }
        let mut segments = self.segments.clone();
        resolve_onto(&mut segments, rel);
        validate_segments(&segments)?;
        Ok(Self { segments })
    }

    /// Append a single key without normalization.
    ///
    /// Intended for keys taken from an existing tree, which are valid by
    /// construction.
    pub fn with_key(&self, key: &str) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(key.to_string());
        Self { segments }
    }

    /// The parent path, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.segments.split_last()?;
        Some(Self {
            segments: init.to_vec(),
        })
    }

    /// The last segment, or `None` for the root.
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether `self` is `other` or one of its ancestors.
    ///
    /// # Example
    ///
    /// ```
    /// use mockbase_path::Path;
    ///
    /// let a = Path::parse("/a").unwrap();
    /// let ab = Path::parse("/a/b").unwrap();
    /// assert!(a.contains(&ab));
    /// assert!(ab.contains(&ab));
    /// assert!(!ab.contains(&a));
    /// assert!(Path::root().contains(&a));
    /// ```
    pub fn contains(&self, other: &Path) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// Whether `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        self.segments.len() < other.segments.len() && self.contains(other)
    }

    pub fn is_descendant_of(&self, other: &Path) -> bool {
        other.is_ancestor_of(self)
    }

    /// The segments of `self` below `ancestor`, if `ancestor` contains it.
    pub fn relative_to(&self, ancestor: &Path) -> Option<&[String]> {
        self.segments.strip_prefix(ancestor.segments.as_slice())
    }
}

impl Ord for Path {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.segments.iter().zip(&other.segments) {
            match key_cmp(a, b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        self.segments.len().cmp(&other.segments.len())
    }
}

impl PartialOrd for Path {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

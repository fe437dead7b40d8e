//! Validation functions for node paths.

use crate::PathError;

/// Maximum allowed key length in bytes.
pub const MAX_KEY_BYTES: usize = 768;

/// Maximum allowed path depth.
pub const MAX_PATH_DEPTH: usize = 32;

/// Validate a single path segment.
///
/// # Errors
///
/// Returns an error if:
/// - The segment is empty
/// - The segment exceeds the maximum length (768 bytes)
/// - The segment contains `/`
///
/// # Example
///
/// ```
/// use mockbase_path::validate_key;
///
/// validate_key("users").unwrap();
/// validate_key("").unwrap_err();
/// validate_key(&"k".repeat(1000)).unwrap_err();
/// validate_key("a/b").unwrap_err();
/// ```
pub fn validate_key(key: &str) -> Result<(), PathError> {
    if key.is_empty() {
        return Err(PathError::EmptyPath);
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(PathError::KeyTooLong { len: key.len() });
    }
    if key.contains('/') {
        return Err(PathError::SlashInKey(key.to_string()));
    }
    Ok(())
}

/// Validate normalized path segments.
///
/// # Errors
///
/// Returns an error if:
/// - The path exceeds the maximum depth (32 segments)
/// - Any segment fails [`validate_key`]
///
/// # Example
///
/// ```
/// use mockbase_path::validate_segments;
///
/// validate_segments(&["a".to_string(), "b".to_string()]).unwrap();
/// validate_segments(&(0..40).map(|i| i.to_string()).collect::<Vec<_>>()).unwrap_err();
/// ```
pub fn validate_segments(segments: &[String]) -> Result<(), PathError> {
    if segments.len() > MAX_PATH_DEPTH {
        return Err(PathError::TooDeep {
            depth: segments.len(),
        });
    }
    segments.iter().try_for_each(|s| validate_key(s))
}

use std::cmp::Ordering;

/// Parse a child key as an integer key.
///
/// A key is an integer key when it is the canonical decimal form of a
/// 32-bit signed integer: no leading zeros, no `+`, and `-0` is not one.
///
/// # Examples
///
/// ```
/// use mockbase_util::key_cmp::as_int_key;
///
/// assert_eq!(as_int_key("42"), Some(42));
/// assert_eq!(as_int_key("-7"), Some(-7));
/// assert_eq!(as_int_key("007"), None);
/// assert_eq!(as_int_key("-0"), None);
/// assert_eq!(as_int_key("4294967296"), None);
/// ```
pub fn as_int_key(key: &str) -> Option<i32> {
    let digits = key.strip_prefix('-').unwrap_or(key);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    if key == "-0" {
        return None;
    }
    key.parse::<i32>().ok()
}

/// Compare two child keys.
///
/// Integer keys (see [`as_int_key`]) sort first, numerically. All other keys
/// follow in lexicographic byte order. This is the order children are kept
/// in, materialized in, and delivered in.
///
/// Returns:
/// - `Ordering::Less` if `a` should come before `b`
/// - `Ordering::Greater` if `a` should come after `b`
/// - `Ordering::Equal` if both keys are equal
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use mockbase_util::key_cmp::key_cmp;
///
/// assert_eq!(key_cmp("2", "10"), Ordering::Less);
/// assert_eq!(key_cmp("10", "a"), Ordering::Less);
/// assert_eq!(key_cmp("b", "a"), Ordering::Greater);
/// assert_eq!(key_cmp("a", "a"), Ordering::Equal);
/// ```
pub fn key_cmp(a: &str, b: &str) -> Ordering {
    match (as_int_key(a), as_int_key(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

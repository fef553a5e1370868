//! Log-safe rendering of credential material.

/// Describe a secret by presence and length only.
pub fn redacted(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("<redacted len={}>", v.len()),
        None => "<missing>".into(),
    }
}

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

/// Turn a free-text label into a filesystem-safe name.
///
/// Lower-cases, maps spaces to hyphens, drops anything outside the allowed
/// set and finally removes runs of two or more periods. Never fails; an
/// empty result is valid.
pub fn sanitize(label: &str) -> String {
    let filtered: String = label
        .chars()
        .map(|c| c.to_ascii_lowercase())
        .map(|c| if c == ' ' { '-' } else { c })
        .filter(|c| is_allowed(*c))
        .collect();

    strip_period_runs(&filtered)
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c.is_ascii_whitespace()
        || matches!(c, '_' | '-' | '~' | ',' | ';' | '[' | ']' | '(' | ')' | '.')
}

fn strip_period_runs(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '.' {
            out.push(c);
            continue;
        }
        let mut run = 1;
        while chars.peek() == Some(&'.') {
            chars.next();
            run += 1;
        }
        if run == 1 {
            out.push('.');
        }
    }

    out
}

/// Derive the storage slug for an upload: SHA-256 of the label followed by
/// the nanosecond-precision timestamp, hex encoded.
pub fn generate_slug(label: &str, now: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(label.as_bytes());
    hasher.update(now.to_rfc3339_opts(SecondsFormat::Nanos, true).as_bytes());
    hex::encode(hasher.finalize())
}

/// True if `value` has the shape of a slug produced by [`generate_slug`]
pub fn looks_like_slug(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Lower-cased extension taken from the client-supplied file name.
/// Only ASCII alphanumerics survive; files without one are stored as `bin`.
pub fn extension_from_filename(filename: &str) -> String {
    let ext: String = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if ext.is_empty() {
        "bin".to_string()
    } else {
        ext
    }
}

use std::fmt::Write;
use std::time::SystemTime;

use chrono::{DateTime, Utc};

/// `Content-Disposition` value that asks the client to save the file.
///
/// The quoted `filename` is ASCII-only; names with other characters also
/// get an RFC 5987 `filename*` parameter carrying the UTF-8 name.
pub fn content_disposition(name: &str) -> String {
    let mut fallback = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '"' | '\\' => {
                fallback.push('\\');
                fallback.push(c);
            }
            c if c.is_ascii() && !c.is_ascii_control() => fallback.push(c),
            _ => fallback.push('_'),
        }
    }

    if name.is_ascii() {
        return format!("attachment; filename=\"{fallback}\"");
    }

    let mut encoded = String::with_capacity(name.len() * 3);
    for b in name.bytes() {
        if b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b) {
            encoded.push(b as char);
        } else {
            let _ = write!(encoded, "%{b:02X}");
        }
    }
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

/// RFC 7231 IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Whether an `If-Range` value still validates a file last modified at `modified`.
///
/// Only an HTTP date equal to the modification time (to the second) holds.
/// Entity tags, unparsable values and files without a known mtime never do.
pub fn if_range_matches(if_range: &str, modified: Option<SystemTime>) -> bool {
    let Some(modified) = modified else {
        return false;
    };
    match DateTime::parse_from_rfc2822(if_range.trim()) {
        Ok(date) => date.timestamp() == DateTime::<Utc>::from(modified).timestamp(),
        Err(_) => false,
    }
}

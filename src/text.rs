//! Compact text form of a mount spec, used for persistence and debug output.
//!
//! ```text
//! host=example.com,type=ftp,user=alice,__mount_prefix=%2Fpub
//! ```
//!
//! Keys and values are percent-escaped so that `=` and `,` can only appear
//! as delimiters. ASCII characters other than letters, digits and `-._~` are
//! escaped; non-ASCII characters are written as raw UTF-8. The prefix always
//! comes last, as the `__mount_prefix` pseudo-key.
//!
//! Decoding is strict: any malformed pair fails the whole decode, and so does
//! an escaped NUL byte.

use std::fmt;
use std::str::FromStr;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::warn;

use crate::error::SpecError;
use crate::spec::MountSpec;
use crate::store::{KeyValueItem, KeyValueStore};

/// Pseudo-key carrying the mount prefix in the text form.
pub const MOUNT_PREFIX_KEY: &str = "__mount_prefix";

/// Text form of a missing spec.
pub const NULL_SPEC: &str = "(null)";

/// Characters left unescaped: the RFC 3986 unreserved set.
const ESCAPE_SET: &AsciiSet =
    &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Encodes `spec`, or `(null)` when there is none.
pub fn to_text(spec: Option<&MountSpec>) -> String {
    match spec {
        Some(spec) => spec.to_text(),
        None => NULL_SPEC.to_string(),
    }
}

impl MountSpec {
    /// Encodes the spec as `key=value,...,__mount_prefix=prefix`.
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Decodes the text form produced by [`MountSpec::to_text`].
    pub fn from_text(s: &str) -> Result<MountSpec, SpecError> {
        decode(s).inspect_err(|e| warn!("failed to decode mount spec: {}", e))
    }
}

impl fmt::Display for MountSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in self.iter() {
            write!(f, "{}={},", Escaped(&item.key), Escaped(&item.value))?;
        }
        write!(f, "{}={}", Escaped(MOUNT_PREFIX_KEY), Escaped(self.mount_prefix()))
    }
}

/// Percent-escapes ASCII outside the unreserved set, passes UTF-8 through.
struct Escaped<'a>(&'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.0;
        while !rest.is_empty() {
            let ascii_len = rest.find(|c: char| !c.is_ascii()).unwrap_or(rest.len());
            let (ascii, tail) = rest.split_at(ascii_len);
            write!(f, "{}", utf8_percent_encode(ascii, ESCAPE_SET))?;

            let raw_len = tail.find(|c: char| c.is_ascii()).unwrap_or(tail.len());
            let (raw, tail) = tail.split_at(raw_len);
            f.write_str(raw)?;
            rest = tail;
        }
        Ok(())
    }
}

impl FromStr for MountSpec {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MountSpec::from_text(s)
    }
}

fn decode(s: &str) -> Result<MountSpec, SpecError> {
    let mut items = Vec::new();
    let mut mount_prefix = None;

    // an empty input holds no pairs at all
    let pairs = (!s.is_empty()).then(|| s.split(',')).into_iter().flatten();
    for pair in pairs {
        let mut tokens = pair.split('=');
        let (Some(key), Some(value), None) = (tokens.next(), tokens.next(), tokens.next()) else {
            return Err(SpecError::InvalidPair { pair: pair.to_string() });
        };

        let key = unescape(key)?;
        let value = unescape(value)?;
        if key == MOUNT_PREFIX_KEY {
            mount_prefix = Some(value);
        } else {
            items.push(KeyValueItem::new(key, value));
        }
    }

    let Some(mount_prefix) = mount_prefix else {
        return Err(SpecError::MissingPrefix { input: s.to_string() });
    };
    Ok(MountSpec::from_data(KeyValueStore::from_iter(items), Some(mount_prefix)))
}

fn unescape(token: &str) -> Result<String, SpecError> {
    let invalid = || SpecError::InvalidEscape { token: token.to_string() };
    let decoded = percent_decode_str(token).decode_utf8().map_err(|_| invalid())?;
    if decoded.contains('\0') {
        return Err(invalid());
    }
    Ok(decoded.into_owned())
}

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Encodes one border value type to a fixed number of string tokens and back.
///
/// The token count is fixed per handle, never per value, so a composite
/// encoding can be split without length prefixes. Decoding is total:
/// malformed tokens yield `None`, never an error, because cursors arrive
/// from untrusted command input.
///
/// `write_tokens` fills a caller-provided slice. A caller embedding the
/// encoding inside a larger token sequence passes the sub-slice reserved for
/// it, so tokens outside that range are untouched by construction.
///
/// Produced tokens must not contain whitespace or the `.` chat-code
/// delimiter; the provided handles emit only decimal integers and lowercase
/// hex.
pub trait BorderValueHandle<T> {
    /// Number of tokens this handle reads and writes.
    fn width(&self) -> usize;

    /// Write exactly `width()` tokens for `value` into `out[..self.width()]`.
    ///
    /// # Panics
    ///
    /// Panics if `out` holds fewer than `width()` tokens.
    fn write_tokens(&self, value: &T, out: &mut [String]);

    /// Decode a value from `input[..self.width()]`.
    ///
    /// Returns `None` if `input` is too short or the tokens are not a valid
    /// encoding.
    fn read_tokens(&self, input: &[String]) -> Option<T>;
}

/// Handle for 64-bit integer sort keys. One decimal token.
#[derive(Debug, Clone, Copy, Default)]
pub struct I64Handle;

impl BorderValueHandle<i64> for I64Handle {
    fn width(&self) -> usize {
        1
    }

    fn write_tokens(&self, value: &i64, out: &mut [String]) {
        out[0] = value.to_string();
    }

    fn read_tokens(&self, input: &[String]) -> Option<i64> {
        input.first()?.parse().ok()
    }
}

/// Handle for UUID sort keys. One token of 32 lowercase hex digits.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidHandle;

impl BorderValueHandle<Uuid> for UuidHandle {
    fn width(&self) -> usize {
        1
    }

    fn write_tokens(&self, value: &Uuid, out: &mut [String]) {
        out[0] = value.as_simple().to_string();
    }

    fn read_tokens(&self, input: &[String]) -> Option<Uuid> {
        Uuid::try_parse(input.first()?).ok()
    }
}

/// Handle for UTC timestamp sort keys at whole-second precision.
///
/// One decimal token holding epoch seconds. Timestamps with sub-second
/// components are not valid border values for this handle; the columns it is
/// meant for store second precision.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantHandle;

impl BorderValueHandle<DateTime<Utc>> for InstantHandle {
    fn width(&self) -> usize {
        1
    }

    fn write_tokens(&self, value: &DateTime<Utc>, out: &mut [String]) {
        out[0] = value.timestamp().to_string();
    }

    fn read_tokens(&self, input: &[String]) -> Option<DateTime<Utc>> {
        let seconds: i64 = input.first()?.parse().ok()?;
        DateTime::from_timestamp(seconds, 0)
    }
}

//! Escaping of names, keys, and string values.

use std::{borrow::Cow, fmt};

use memchr::{memchr2, memchr2_iter, memchr3, memchr3_iter};

/// Writes `s` with spaces, commas, and equals signs escaped.
///
/// Used for measurement names, tag keys, tag values, and field keys.
pub fn write_escaped_key<W>(writer: &mut W, s: &str) -> fmt::Result
where
    W: fmt::Write + ?Sized,
{
    write_escaped(writer, s, memchr3_iter(b' ', b',', b'=', s.as_bytes()))
}

/// Writes `s` with backslashes and double quotes escaped, without the surrounding quotes.
///
/// Used for string field values.
pub fn write_escaped_string<W>(writer: &mut W, s: &str) -> fmt::Result
where
    W: fmt::Write + ?Sized,
{
    write_escaped(writer, s, memchr2_iter(b'\\', b'"', s.as_bytes()))
}

/// Escapes a measurement name, tag key, tag value, or field key.
pub fn escape_key(s: &str) -> Cow<'_, str> {
    if memchr3(b' ', b',', b'=', s.as_bytes()).is_none() {
        return Cow::Borrowed(s);
    }

    let mut escaped = String::with_capacity(s.len() + 4);
    // Writing into a `String` cannot fail.
    let _ = write_escaped_key(&mut escaped, s);
    Cow::Owned(escaped)
}

/// Escapes a string field value, without adding the surrounding quotes.
pub fn escape_string(s: &str) -> Cow<'_, str> {
    if memchr2(b'\\', b'"', s.as_bytes()).is_none() {
        return Cow::Borrowed(s);
    }

    let mut escaped = String::with_capacity(s.len() + 4);
    // Writing into a `String` cannot fail.
    let _ = write_escaped_string(&mut escaped, s);
    Cow::Owned(escaped)
}

// All escaped characters are ASCII, so every match index is a character boundary.
fn write_escaped<W, I>(writer: &mut W, s: &str, matches: I) -> fmt::Result
where
    W: fmt::Write + ?Sized,
    I: Iterator<Item = usize>,
{
    let mut start = 0;
    for idx in matches {
        writer.write_str(&s[start..idx])?;
        writer.write_char('\\')?;
        start = idx;
    }
    writer.write_str(&s[start..])
}

//! Formatting of numeric field values.

use std::fmt;

/// Writes a float field value.
///
/// Values are written in plain decimal notation with the fewest digits that round-trip, and whole numbers always carry
/// a fractional digit (`3.0`, never `3`), so they are never mistaken for integers.
pub fn write_float<W>(writer: &mut W, value: f64) -> fmt::Result
where
    W: fmt::Write + ?Sized,
{
    write!(writer, "{}", value)?;
    if value.is_finite() && value.fract() == 0.0 {
        writer.write_str(".0")?;
    }
    Ok(())
}

/// Writes an integer field value, with its `i` suffix.
pub fn write_integer<W>(writer: &mut W, value: i64) -> fmt::Result
where
    W: fmt::Write + ?Sized,
{
    write!(writer, "{}i", value)
}

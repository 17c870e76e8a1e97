/// A field value.
///
/// Line protocol distinguishes four value types on the wire: booleans, signed 64-bit integers (suffixed with `i`),
/// 64-bit floats, and quoted strings.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// A boolean.
    Boolean(bool),

    /// A signed 64-bit integer.
    Integer(i64),

    /// A 64-bit float.
    Float(f64),

    /// A string.
    String(String),
}

impl FieldValue {
    /// Returns the name of the value's wire type.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }
}

mod private {
    pub trait Sealed {}
}

/// A type that can be stored as a field value.
///
/// Implemented for `bool`, the signed integer types and the unsigned integer types that fit in an `i64`, `f32`, `f64`,
/// `String`, and `&str`.
///
/// This trait is sealed and cannot be implemented outside of this crate.
pub trait IntoFieldValue: private::Sealed {
    /// Whether an absent value of this type may be recorded.
    ///
    /// Absent numeric and boolean values are simply skipped when encoding. An absent string has no sensible wire
    /// representation, so it is rejected when added.
    const ABSENT_ALLOWED: bool;

    /// Converts `self` into a [`FieldValue`].
    fn into_field_value(self) -> FieldValue;
}

macro_rules! impl_into_field_value {
    ($variant:ident, $absent_allowed:literal, $($ty:ty),+ $(,)?) => {
        $(
            impl private::Sealed for $ty {}

            impl IntoFieldValue for $ty {
                const ABSENT_ALLOWED: bool = $absent_allowed;

                fn into_field_value(self) -> FieldValue {
                    FieldValue::$variant(self.into())
                }
            }

            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    value.into_field_value()
                }
            }
        )+
    };
}

impl_into_field_value!(Boolean, true, bool);
impl_into_field_value!(Integer, true, i8, i16, i32, i64, u8, u16, u32);
impl_into_field_value!(Float, true, f32, f64);
impl_into_field_value!(String, false, String, &str);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_types_widen() {
        assert_eq!(FieldValue::from(7i8), FieldValue::Integer(7));
        assert_eq!(FieldValue::from(u32::MAX), FieldValue::Integer(u32::MAX as i64));
        assert_eq!(FieldValue::from(0.5f32), FieldValue::Float(0.5));
        assert_eq!(FieldValue::from("x"), FieldValue::String("x".to_string()));
    }

    #[test]
    fn only_strings_reject_absent() {
        assert!(<bool as IntoFieldValue>::ABSENT_ALLOWED);
        assert!(<i64 as IntoFieldValue>::ABSENT_ALLOWED);
        assert!(<f64 as IntoFieldValue>::ABSENT_ALLOWED);
        assert!(!<String as IntoFieldValue>::ABSENT_ALLOWED);
        assert!(!<&str as IntoFieldValue>::ABSENT_ALLOWED);
    }

    #[test]
    fn type_names() {
        assert_eq!(FieldValue::Boolean(true).type_name(), "boolean");
        assert_eq!(FieldValue::Integer(1).type_name(), "integer");
        assert_eq!(FieldValue::Float(1.0).type_name(), "float");
        assert_eq!(FieldValue::String(String::new()).type_name(), "string");
    }
}

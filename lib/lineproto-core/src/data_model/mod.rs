//! Points and the builders that produce them.

mod builder;
pub use self::builder::{BuildError, Builder, BuilderState};

mod point;
pub use self::point::{Point, PointData};

mod precision;
pub use self::precision::{Precision, Timestamp};

mod value;
pub use self::value::{FieldValue, IntoFieldValue};

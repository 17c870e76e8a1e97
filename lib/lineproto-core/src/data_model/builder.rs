use std::{collections::BTreeMap, fmt, mem::ManuallyDrop, sync::Arc};

use snafu::{ResultExt as _, Snafu};

use super::{FieldValue, IntoFieldValue, Point, Precision, Timestamp};
use crate::pooling::{Clearable, PointSource, PoolError, ReclaimStrategy};

/// A build error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum BuildError {
    /// The measurement name was empty.
    #[snafu(display("Expecting a non-empty measurement name."))]
    EmptyMeasurement,

    /// No field carried a value.
    ///
    /// A builder whose fields were all added through `add_optional_field` with `None` values is rejected here too.
    /// Every field would be skipped when encoding, which would leave the line without a field section, and a line
    /// without fields is not valid line protocol.
    #[snafu(display("Expecting at least one field with a value for measurement '{}'.", measurement))]
    NoFields {
        /// Measurement name.
        measurement: String,
    },

    /// A field that cannot be absent was given no value.
    #[snafu(display("A value is required for field '{}'.", field))]
    RequiredValueMissing {
        /// Field name.
        field: String,
    },

    /// No point could be obtained to build into.
    #[snafu(display("Failed to obtain a point for measurement '{}'.", measurement))]
    PointPool {
        /// Measurement name.
        measurement: String,

        /// Error source.
        source: PoolError,
    },
}

impl BuildError {
    /// Returns `true` if the error came from validating the builder's contents, rather than from obtaining a point.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::EmptyMeasurement | Self::NoFields { .. })
    }
}

/// Reusable storage behind a [`Builder`].
#[derive(Debug, Default)]
pub struct BuilderState {
    measurement: String,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, Option<FieldValue>>,
    time: Option<Timestamp>,
}

impl BuilderState {
    pub(crate) fn measurement(&self) -> &String {
        &self.measurement
    }

    pub(crate) fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub(crate) fn fields(&self) -> &BTreeMap<String, Option<FieldValue>> {
        &self.fields
    }

    pub(crate) fn time(&self) -> Option<Timestamp> {
        self.time
    }

    pub(crate) fn set_measurement(&mut self, measurement: &str) {
        self.measurement.clear();
        self.measurement.push_str(measurement);
    }

    pub(crate) fn insert_tag(&mut self, name: String, value: String) {
        if !name.is_empty() && !value.is_empty() {
            self.tags.insert(name, value);
        }
    }

    pub(crate) fn insert_field(&mut self, name: String, value: Option<FieldValue>) {
        self.fields.insert(name, value);
    }

    pub(crate) fn set_time(&mut self, time: Timestamp) {
        self.time = Some(time);
    }
}

impl Clearable for BuilderState {
    fn clear(&mut self) {
        self.measurement.clear();
        self.tags.clear();
        self.fields.clear();
        self.time = None;
    }
}

/// A point builder.
///
/// Builders are borrowed from a [`BuilderPool`][crate::pooling::BuilderPool], filled in, and consumed by
/// [`build`][Self::build]. Whether the build succeeds or not, and likewise if the builder is simply dropped, its storage
/// goes back to the pool it was borrowed from, cleared.
///
/// ```
/// use lineproto_core::pooling::{BuilderPool as _, NoPool};
///
/// let pool = NoPool::new();
/// let point = pool
///     .create_builder("cpu")
///     .unwrap()
///     .tag("host", "serverA")
///     .add_field("value", 0.64)
///     .build()
///     .unwrap();
///
/// assert_eq!(point.line_protocol(), "cpu,host=serverA value=0.64");
/// ```
pub struct Builder {
    reclaimer: Arc<dyn ReclaimStrategy<BuilderState>>,
    points: Arc<dyn PointSource>,
    state: ManuallyDrop<BuilderState>,
}

impl Builder {
    /// Creates a `Builder` around `state`.
    ///
    /// `state` goes to `reclaimer` when the builder is consumed or dropped, and built points are acquired from
    /// `points`. This is the hook for implementing [`BuilderPool`][crate::pooling::BuilderPool].
    pub fn from_state(
        reclaimer: Arc<dyn ReclaimStrategy<BuilderState>>, points: Arc<dyn PointSource>, state: BuilderState,
    ) -> Self {
        Self {
            reclaimer,
            points,
            state: ManuallyDrop::new(state),
        }
    }

    /// Returns the measurement name.
    pub fn measurement(&self) -> &str {
        &self.state.measurement
    }

    /// Sets the measurement name.
    pub fn set_measurement(&mut self, measurement: &str) {
        self.state.set_measurement(measurement);
    }

    /// Returns the tags added so far, ordered by key.
    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.state.tags
    }

    /// Returns the fields added so far, ordered by key.
    pub fn fields(&self) -> &BTreeMap<String, Option<FieldValue>> {
        &self.state.fields
    }

    /// Returns the timestamp, if one was set.
    pub fn timestamp(&self) -> Option<Timestamp> {
        self.state.time
    }

    /// Adds a tag.
    ///
    /// If either the name or the value is empty, the tag is ignored. A tag with an existing name replaces the previous
    /// value.
    pub fn tag<K, V>(mut self, name: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.state.insert_tag(name.into(), value.into());
        self
    }

    /// Adds each of the given tags, as with [`tag`][Self::tag].
    pub fn tags_from<I, K, V>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in tags {
            self.state.insert_tag(name.into(), value.into());
        }
        self
    }

    /// Adds a field.
    ///
    /// A field with an existing name replaces the previous value.
    pub fn add_field<K, V>(mut self, name: K, value: V) -> Self
    where
        K: Into<String>,
        V: IntoFieldValue,
    {
        self.state.insert_field(name.into(), Some(value.into_field_value()));
        self
    }

    /// Adds a field whose value may be absent.
    ///
    /// Absent booleans and numbers are recorded and then skipped when encoding.
    ///
    /// # Errors
    ///
    /// If `value` is `None` and `V` is a string type, [`BuildError::RequiredValueMissing`] is returned. The builder is
    /// released in that case.
    pub fn add_optional_field<K, V>(mut self, name: K, value: Option<V>) -> Result<Self, BuildError>
    where
        K: Into<String>,
        V: IntoFieldValue,
    {
        let name = name.into();
        match value {
            Some(value) => self.state.insert_field(name, Some(value.into_field_value())),
            None if V::ABSENT_ALLOWED => self.state.insert_field(name, None),
            None => return RequiredValueMissing { field: name }.fail(),
        }
        Ok(self)
    }

    /// Adds each of the given fields.
    ///
    /// Values may be given either as [`FieldValue`] or as `Option<FieldValue>`, where `None` marks an absent value.
    pub fn fields_from<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Option<FieldValue>>,
    {
        for (name, value) in fields {
            self.state.insert_field(name.into(), value.into());
        }
        self
    }

    /// Sets the timestamp of the point.
    pub fn time(mut self, value: i64, precision: Precision) -> Self {
        self.state.set_time(Timestamp::new(value, precision));
        self
    }

    /// Validates the builder's contents and builds a [`Point`].
    ///
    /// The builder is released back to its pool whether or not the build succeeds.
    ///
    /// # Errors
    ///
    /// If the measurement name is empty, or no field has a value, a validation error is returned. If the builder's point
    /// source cannot provide a point, [`BuildError::PointPool`] is returned.
    pub fn build(self) -> Result<Point, BuildError> {
        let state = &*self.state;
        if state.measurement.is_empty() {
            return EmptyMeasurement.fail();
        }
        if !state.fields.values().any(Option::is_some) {
            return NoFields {
                measurement: &state.measurement,
            }
            .fail();
        }

        let mut point = self.points.acquire().context(PointPool {
            measurement: &state.measurement,
        })?;
        point.data_mut().copy_from(state);

        Ok(point)
    }
}

impl Drop for Builder {
    fn drop(&mut self) {
        // SAFETY: `self.state` is never touched again once we're dropping `self`.
        let state = unsafe { ManuallyDrop::take(&mut self.state) };
        self.reclaimer.reclaim(state);
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder").field("state", &*self.state).finish()
    }
}

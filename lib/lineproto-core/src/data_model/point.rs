use std::{collections::BTreeMap, fmt, mem::ManuallyDrop, sync::Arc};

use super::{BuilderState, FieldValue, Timestamp};
use crate::{
    encoding::LineProtocol,
    pooling::{Clearable, ReclaimStrategy},
};

/// Reusable storage behind a [`Point`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointData {
    measurement: String,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, Option<FieldValue>>,
    time: Option<Timestamp>,
}

impl PointData {
    /// Overwrites this data with a copy of the builder's current state.
    pub(crate) fn copy_from(&mut self, state: &BuilderState) {
        self.measurement.clone_from(state.measurement());
        self.tags.clone_from(state.tags());
        self.fields.clone_from(state.fields());
        self.time = state.time();
    }
}

impl Clearable for PointData {
    fn clear(&mut self) {
        self.measurement.clear();
        self.tags.clear();
        self.fields.clear();
        self.time = None;
    }
}

/// A validated data point.
///
/// Points are immutable once built. Their tags and fields are copies of what the builder held, so a builder can be
/// reset and reused without affecting points built from it.
///
/// Dropping a point hands its storage back to whichever pool it came from.
pub struct Point {
    reclaimer: Arc<dyn ReclaimStrategy<PointData>>,
    data: ManuallyDrop<PointData>,
}

impl Point {
    /// Creates a `Point` around `data`, returning the data to `reclaimer` when dropped.
    ///
    /// This is the hook for point sources: the data is expected to be empty and is filled in by
    /// [`Builder::build`][super::Builder::build].
    pub fn from_data(reclaimer: Arc<dyn ReclaimStrategy<PointData>>, data: PointData) -> Self {
        Self {
            reclaimer,
            data: ManuallyDrop::new(data),
        }
    }

    /// Returns the measurement name.
    pub fn measurement(&self) -> &str {
        &self.data.measurement
    }

    /// Returns the tags, ordered by key.
    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.data.tags
    }

    /// Returns the fields, ordered by key.
    ///
    /// Absent values are kept here but skipped when encoding.
    pub fn fields(&self) -> &BTreeMap<String, Option<FieldValue>> {
        &self.data.fields
    }

    /// Returns the timestamp, if one was set.
    pub fn time(&self) -> Option<Timestamp> {
        self.data.time
    }

    /// Encodes the point as a single line of line protocol, without a trailing newline.
    ///
    /// This allocates a fresh string on every call. Workers encoding many points should hold a
    /// [`LineProtocolEncoder`][crate::encoding::LineProtocolEncoder] instead.
    pub fn line_protocol(&self) -> String {
        LineProtocol::new(self).to_string()
    }

    pub(crate) fn data_mut(&mut self) -> &mut PointData {
        &mut self.data
    }
}

impl Drop for Point {
    fn drop(&mut self) {
        // SAFETY: `self.data` is never touched again once we're dropping `self`.
        let data = unsafe { ManuallyDrop::take(&mut self.data) };
        self.reclaimer.reclaim(data);
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        *self.data == *other.data
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Point")
            .field("measurement", &self.data.measurement)
            .field("tags", &self.data.tags)
            .field("fields", &self.data.fields)
            .field("time", &self.data.time)
            .finish()
    }
}

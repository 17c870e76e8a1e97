//! Building, pooling, and encoding of line protocol points.
//!
//! A producer obtains a [`Builder`][data_model::Builder] from an [`ActivePool`][pooling::ActivePool], fills in tags,
//! fields, and an optional timestamp, and calls `build` to get an immutable [`Point`][data_model::Point]. Points are
//! rendered to text with a [`LineProtocolEncoder`][encoding::LineProtocolEncoder], which each worker owns so that the
//! escaped measurement prefix only has to be rendered once per measurement.
//!
//! Pools decide where builders and points come from: [`NoPool`][pooling::NoPool] allocates every time, while
//! [`BoundedBlockingPool`][pooling::BoundedBlockingPool] recycles a fixed set of slots and blocks claimers when all of
//! them are out.
#![deny(warnings)]
#![deny(missing_docs)]

pub mod data_model;
pub mod encoding;
pub mod pooling;

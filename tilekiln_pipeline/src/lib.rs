//! Feature spooling, the zoom-level driver, the per-tile worker, the
//! expression filter and the overzoom/tile-join operator (§4.7–§4.10).
//!
//! This crate owns everything that needs to know about a *run*: the
//! [`TilingContext`](context::TilingContext) a caller configures once, the
//! spoolers that buffer ingested features to disk, the driver that fans a
//! zoom level out across worker threads, and the tile worker and overzoom
//! join logic that actually produce MVT bytes. It depends on
//! `tilekiln_core` for coordinates and I/O, `tilekiln_geometry` for the
//! drawvec kernel and `tilekiln_mvt` for the wire format, but nothing above
//! this crate depends back on it — it is the top of the workspace.

pub mod context;
pub mod driver;
pub mod expr;
pub mod metadata;
pub mod overzoom;
pub mod spool;
pub mod tiler;
pub mod warnings;

pub use context::{AccumulateOp, DropPolicy, RetryThresholds, SpatialIndexKind, TilingContext};
pub use driver::{ZoomDriver, ZoomDriverOutcome};
pub use metadata::{classify_mvt_geom_type, AttrTypeUnion, AttributeStats, LayerMap, LayerMapEntry, MetadataAccumulator, RetryCounters, RunMetadata};
pub use warnings::{WarnKind, WarnOnce};

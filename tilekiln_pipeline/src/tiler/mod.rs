//! The per-tile worker (§4.8): fetch, clip, filter, dot-drop, apply a drop
//! policy, cluster, accumulate, simplify/clean, coalesce, order, assemble,
//! and the size/count governor retry loop.

mod accumulate;
mod assemble;
mod cluster;
mod dotdrop;
mod order;
mod policy;
mod worker;

pub use accumulate::{accumulate_value, MeanState};
pub use assemble::{assemble_layer, FinishedFeature};
pub use cluster::{assign_clusters, Cluster};
pub use dotdrop::assign_minzooms;
pub use order::order_features;
pub use policy::{drop_densest_as_needed, drop_fraction_as_needed, drop_smallest_as_needed, increase_gamma_as_needed};
pub use worker::{TileCandidate, TileWorker, TileWorkerOutcome};

//! Pure domain logic: cluster set diffing and pod event qualification.

pub mod cluster;
pub mod event;

pub use cluster::ClusterDiff;
pub use event::PodEvent;
pub use event::PodWatchEvent;

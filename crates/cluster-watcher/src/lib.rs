//! Multi-cluster pod lifecycle watcher.
//!
//! Keeps one pod watch per registered Kubernetes cluster and forwards pod
//! creations and deletions to the orchestration platform as operation events.

pub mod app;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod notifier;
pub mod watch;

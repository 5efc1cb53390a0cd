//! Application module
//!
//! Wires the cluster store, watch streams and notifier into the reconciliation
//! loop and ties its lifetime to process signals.

pub mod builder;
pub mod core;
pub mod services;
pub mod shutdown;

pub use builder::ApplicationBuilder;
pub use self::core::Application;
pub use services::ApplicationServices;
pub use shutdown::ShutdownCoordinator;

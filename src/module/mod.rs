//! Module Registry & Dispatcher (C5) and Timing-Attack Coordinator (C6).

pub mod registry;
pub mod timing;

pub use registry::{IssueSink, Module, ModuleInfo, ModuleListing, ModuleRegistry};
pub use timing::{TimingBlock, TimingCoordinator};

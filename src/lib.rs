//! auditcore - Audit orchestrator core for a pluggable web application
//! security scanner
//!
//! Discovers pages on a target (via an explicit seed list or a same-host
//! spider), fetches and parses them, dispatches pluggable security-check
//! modules against the elements each page exposes, and assembles the
//! findings into an `AuditStore` report.
//!
//! ## Modules
//!
//! - [`options`]: user-supplied scan configuration
//! - [`http`]: concurrency-bounded fetch engine and trainer
//! - [`spider`]: same-host link discovery
//! - [`page`]: parsed page model (links, forms, cookies, headers)
//! - [`issue`]: a finding produced by a module
//! - [`queue`]: FIFO work queues
//! - [`module`]: module registry, dispatch, and the timing-attack coordinator
//! - [`plugin`]: long-lived background collaborators
//! - [`progress`]: the scan progress model
//! - [`audit`]: the orchestrator and its lifecycle/pause state
//! - [`store`]: the immutable report snapshot
//! - [`output`]: report formatters (JSON, CLI table)
//! - [`config`]: on-disk TOML configuration
//! - [`cli`]: command-line interface
//! - [`error`]: error types
//! - [`fault_jail`]: fault isolation around module/plugin/hook code

pub mod audit;
pub mod cli;
pub mod config;
pub mod error;
pub mod fault_jail;
pub mod http;
pub mod issue;
pub mod module;
pub mod options;
pub mod output;
pub mod page;
pub mod plugin;
pub mod progress;
pub mod queue;
pub mod spider;
pub mod store;

pub use audit::{AuditState, Orchestrator, Stats};
pub use cli::{Args, OutputFormat};
pub use config::ScanConfig;
pub use error::{AuditError, Result};
pub use issue::Issue;
pub use module::{IssueSink, Module, ModuleInfo, ModuleListing, ModuleRegistry, TimingCoordinator};
pub use options::Options;
pub use output::{format_issues_list, format_json, print_report, JsonReport};
pub use page::{Cookie, ElementKind, Form, FormField, Header, Link, Page};
pub use plugin::{Plugin, PluginHandle, PluginManager, PluginOutput};
pub use queue::{PageQueue, QueueHandle, UrlQueue, WorkQueue};
pub use store::{AuditStore, AuditStoreBuilder};

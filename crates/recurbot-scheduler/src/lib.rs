//! # Recurbot Scheduler
//!
//! Registry, due-check and dispatch for recurring template posts.
//!
//! ## Architecture
//! ```text
//! Timer (tokio interval / cron / test)
//!   └── Scheduler::on_tick(now)
//!         ├── TemplateRegistry: index "all_templates" → records
//!         ├── due::is_due(template, now)
//!         └── DispatchExecutor → MessagingGateway → registry.save
//! ```
//!
//! Templates are processed one at a time; the first store or gateway
//! fault aborts the rest of the tick.

pub mod dispatch;
pub mod due;
pub mod engine;
pub mod registry;
pub mod store;

pub use dispatch::DispatchExecutor;
pub use due::{interval_ms, is_due};
pub use engine::{Dispatched, Scheduler, TickHandler, TickReport, spawn_scheduler};
pub use registry::TemplateRegistry;
pub use store::{MemoryStore, SqliteStore, open_store};

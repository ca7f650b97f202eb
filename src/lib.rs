//! Cycle Intel - On-device cycle intelligence engine
//!
//! Cycle Intel turns daily health logs into cycle predictions and reminders
//! through a deterministic pipeline: cycle analysis → period and fertile
//! window prediction → pattern mining → reminder reconciliation.
//!
//! ## Modules
//!
//! - **Pipeline**: [`CycleEngine`] over an injected log store, notifier and
//!   clock, plus the stateless [`analyze_logs`]
//! - **Stores**: JSON-file and in-memory log persistence
//! - **Notify**: reminder planning and the notifier/clock capabilities
//! - **Report**: plain-text report and JSON export

pub mod config;
pub mod cycle;
pub mod error;
pub mod notify;
pub mod patterns;
pub mod pipeline;
pub mod predictor;
pub mod report;
pub mod store;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::EngineConfig;
pub use error::EngineError;
pub use pipeline::{analyze_logs, Analysis, CycleEngine, PassOutcome, ReminderStatus};

// Store and notifier exports
pub use notify::{Clock, FileOutbox, FixedClock, Notifier, RecordingNotifier, SystemClock};
pub use store::{InMemoryLogStore, JsonFileLogStore, LogStore};

pub use types::{LogEntry, LogMap};

/// Engine version embedded in exports
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI and exports
pub const PRODUCER_NAME: &str = "cycle-intel";

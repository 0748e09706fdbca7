// Compile-time check: the crate needs a runtime backend to be useful
#[cfg(not(any(feature = "cli", feature = "browser")))]
compile_error!(
    "At least one platform must be enabled. \
     Use --features cli (default) or --features browser"
);

pub mod actions;
pub mod app;
pub mod autosave;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod loader;
pub mod platform;
pub mod snippets;
pub mod storage;
pub mod surface;
pub mod theme;

pub use app::App;
pub use commands::{Command, KeyPress, PickedFile};
pub use config::Config;
pub use error::{ClipboardError, ConfigError, LoadError, RuntimeError, StorageError};
pub use exec::{Capture, Outcome, Runtime, execute};
pub use loader::{Readiness, RuntimeLoader};
pub use surface::{AutosaveIndicator, Download, Surface};
pub use theme::Theme;

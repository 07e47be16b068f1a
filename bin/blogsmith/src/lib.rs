//! blogsmith CLI Library
//!
//! Command implementations, the preview server and the watch loop behind the
//! `blogsmith` binary.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build, serve, check, new)
//! - [`server`] - Preview server over an output writer
//! - [`watcher`] - File watching and rebuild triggering
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use blogsmith::cmd;
//!
//! cmd::build::run(Path::new("."), Path::new("public"), false, None).unwrap();
//! ```

pub mod cmd;
pub mod server;
pub mod watcher;

pub use blogsmith_core::Config;
pub use blogsmith_generator::{BuildError, BuildStats, Builder};
pub use watcher::{WatchError, Watcher};

/// Initialize tracing with the specified verbosity level.
///
/// `RUST_LOG` directives are applied first; `verbose` sets the default level
/// (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE).
///
/// # Example
///
/// ```no_run
/// blogsmith::init_tracing(2); // Enable DEBUG level logging
/// ```
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();
}

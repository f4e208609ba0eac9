//! localsite CLI Library
//!
//! Command implementations, the lead endpoint and the HTTP server behind the
//! `localsite` binary.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (generation, rewrites, serve)
//! - [`lead`] - Lead form submissions forwarded as e-mail
//! - [`server`] - Static file server with the lead endpoint
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use localsite::cmd;
//!
//! // Generate city pages, legal pages and the SEO files
//! cmd::build::run(Path::new("site.toml"), Path::new(".")).unwrap();
//! ```

pub mod cmd;
pub mod lead;
pub mod server;

pub use localsite_core::Config;
pub use localsite_generator::{BuildStats, Builder};
pub use localsite_rewrite::{RewriteEngine, RewriteStats};

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

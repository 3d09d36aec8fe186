use color_eyre::{
    Result,
    config::{HookBuilder, Theme},
    eyre::WrapErr,
};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    #[cfg(feature = "dotenv")]
    dotenv::dotenv().ok();

    // Initialize color support
    yansi::whenever(yansi::Condition::TTY_AND_COLOR);

    // Set up error reporting with color-aware themes
    if yansi::is_enabled() {
        HookBuilder::default()
            .display_env_section(cfg!(debug_assertions))
            .display_location_section(cfg!(debug_assertions))
            .install()?;
    } else {
        HookBuilder::default()
            .theme(Theme::new())
            .display_env_section(cfg!(debug_assertions))
            .display_location_section(cfg!(debug_assertions))
            .install()?;
    }

    init_tracing().wrap_err("Failed to initialize logging")?;

    cli::crossbuild_main().await
}

/// Initialize tracing with dual-mode logging
///
/// - If CROSSBUILD_LOG is not set: Simple "INFO message" format for user-friendly output
/// - If CROSSBUILD_LOG is set: Full structured tracing with timestamps and module paths
fn init_tracing() -> Result<()> {
    let crossbuild_log = std::env::var("CROSSBUILD_LOG").is_ok();

    if crossbuild_log {
        // Full structured logging mode
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .with_filter(
                        tracing_subscriber::EnvFilter::try_from_env("CROSSBUILD_LOG")
                            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("crossbuild=warn")),
                    ),
            )
            .try_init()?;
    } else {
        // Simple user-friendly logging mode
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_file(false)
                    .with_line_number(false)
                    .without_time()
                    .with_writer(std::io::stderr)
                    .with_filter(tracing_subscriber::EnvFilter::new("crossbuild=info")),
            )
            .try_init()?;
    }

    Ok(())
}

mod app;
mod cli;
mod tools;
mod types;

pub use types::*;

//! # xlocate-runner
//!
//! Page definitions in YAML, resolved against a live browser.
//!
//! A page file names descriptor stacks and lists lookups to run against
//! its target URL. Each lookup resolves one named stack with [`xlocate::find`]
//! and checks that the element is present (or absent).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xlocate_runner::{Config, Runner};
//!
//! # #[tokio::main]
//! # async fn main() -> xlocate_runner::Result<()> {
//! let config = Config::load("pages/login.yaml")?;
//! let mut runner = Runner::new(&config.browser).await?;
//! let result = runner.run(&config).await?;
//! println!("Success: {}", result.success);
//! # Ok(())
//! # }
//! ```

mod config;
mod runner;

pub use config::{
    BrowserConfig, Config, ElementRef, Elements, Expect, Lookup, ParamDef, Params, TargetUrl,
    REPLACE_TEXT,
};
pub use runner::{resolve, EokaDriver, LookupOutcome, RunResult, Runner, POLL_INTERVAL};

/// Result type for xlocate-runner operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from loading page files or running lookups.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error(transparent)]
    Locate(#[from] xlocate::Error),

    #[error("driver error: {0}")]
    Driver(#[from] xlocate::DriverError),

    #[error("unknown element '{0}'")]
    UnknownElement(String),

    #[error("assertion failed: {0}")]
    AssertionFailed(String),
}

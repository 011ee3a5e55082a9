// src/error.rs

//! Error types for the recipe

use crate::recipe::state::Stage;
use thiserror::Error;

/// Result type used throughout the recipe
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a recipe invocation
///
/// Nothing is retried: every variant propagates to the caller and ends
/// the current step.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Profile file could not be parsed
    #[error("invalid profile: {0}")]
    Profile(#[from] toml::de::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A file-name pattern did not compile
    #[error("invalid pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// A directory walk failed part way
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A setting has a value the recipe does not know
    #[error("invalid value '{value}' for setting '{setting}'")]
    InvalidSetting { setting: String, value: String },

    /// An option has a value outside its domain, or does not exist
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// Build requirements that the profile does not provide
    #[error("missing build requirements: {}", .0.join(", "))]
    MissingRequirements(Vec<String>),

    /// A dependency is declared but lacks information the recipe needs
    #[error("dependency '{name}' is missing '{key}'")]
    DependencyInfo { name: String, key: String },

    /// An external command exited unsuccessfully
    #[error("{step} failed with exit code {code:?}\nstderr: {stderr}")]
    CommandFailed {
        step: String,
        code: Option<i32>,
        stderr: String,
    },

    /// An external command could not be started at all
    #[error("failed to run {step}: {source}")]
    Spawn {
        step: String,
        #[source]
        source: std::io::Error,
    },

    /// A lifecycle step was invoked out of order
    #[error("recipe is {from}, cannot advance to {to}")]
    Lifecycle { from: Stage, to: Stage },

    /// The build folder was configured with a different plan
    #[error("build folder was configured with a different profile; clean it first")]
    PlanMismatch,

    /// A file the recipe expects to exist is absent
    #[error("not found: {0}")]
    NotFound(String),

    /// The MSVC developer environment could not be captured
    #[error("vcvars: {0}")]
    Vcvars(String),
}

impl Error {
    /// Create an invalid-setting error
    pub fn invalid_setting(setting: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidSetting {
            setting: setting.into(),
            value: value.into(),
        }
    }
}

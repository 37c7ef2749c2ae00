//! Error types for the outpost engine binary.
//!
//! [`EngineError`] wraps every failure mode during startup and the run so
//! `main` can propagate with `?`.

/// Top-level error for the outpost engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: outpost_core::config::ConfigError,
    },

    /// An outpost operation failed.
    #[error("outpost error: {source}")]
    Outpost {
        /// The underlying outpost error.
        #[from]
        source: outpost_core::OutpostError,
    },

    /// The world could not be seeded.
    #[error("seed error: {message}")]
    Seed {
        /// Description of the seeding failure.
        message: String,
    },

    /// A command-line argument could not be parsed.
    #[error("invalid argument {arg:?}: {message}")]
    Argument {
        /// The offending argument.
        arg: String,
        /// What was wrong with it.
        message: String,
    },
}

//! Error types for the host binary.

/// Top-level error for engine startup.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type the startup path can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: stormgate_core::ConfigError,
    },

    /// Completion ledger load or save failed.
    #[error("ledger error: {source}")]
    Ledger {
        /// The underlying ledger storage error.
        #[from]
        source: stormgate_rewards::RewardError,
    },

    /// Console input failed.
    #[error("console i/o error: {source}")]
    Console {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

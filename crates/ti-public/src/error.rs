//! Error types for filter dispatch

/// Errors from [`PublicFilters::apply`](crate::PublicFilters::apply)
///
/// Accessors themselves never fail; misuse degrades to an empty value.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// No accessor is registered under this name
    #[error("unknown filter: {0}")]
    UnknownFilter(String),

    /// Arguments did not match the accessor's argument shape
    #[error("invalid arguments for {filter}: {source}")]
    InvalidArgs {
        /// Filter name
        filter: String,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// Result could not be encoded
    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

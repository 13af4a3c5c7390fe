use thiserror::Error;

/// Result alias for `assort`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by graph loading and the analysis components.
///
/// Degenerate-but-defined numeric cases are never errors: they come back as
/// zero or as `None` ("unavailable"). An `Err` means the component produced
/// no result at all.
#[derive(Debug, Error)]
pub enum Error {
    /// Graph has no nodes.
    #[error("empty input provided")]
    EmptyInput,

    /// No node carries the requested attribute.
    #[error("attribute '{attribute}' is missing on every node")]
    MissingAttribute {
        /// Attribute key that was requested.
        attribute: String,
    },

    /// An edge or lookup named a node the graph does not contain.
    #[error("unknown node '{0}'")]
    UnknownNode(String),

    /// Two partitions cover different numbers of nodes.
    #[error("partition size mismatch: expected {expected}, found {found}")]
    PartitionMismatch {
        /// Expected length.
        expected: usize,
        /// Found length.
        found: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// Reading or writing a file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON graph or record document.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed TOML configuration.
    #[error("config error: {0}")]
    Toml(#[from] toml::de::Error),
}

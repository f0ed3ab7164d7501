use thiserror::Error;

/// Store client specific errors
#[derive(Error, Debug)]
pub enum StoreClientError {
    /// Semaphore closed
    #[error("Semaphore closed")]
    SemaphoreClosed,

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Triple store backend returned an error response
    #[error("Triple store error (status {status}): {message}")]
    Backend { status: u16, message: String },

    /// Failed to connect after multiple retries
    #[error("Failed to connect to triple store after {attempts} attempts")]
    ConnectionFailed { attempts: u32 },

    /// Failed to parse response
    #[error("Failed to parse response: {reason}")]
    Parse { reason: String },

    /// Query or binding could not be serialized into a wire request.
    /// Raised before any network call is made.
    #[error("Malformed request: {reason}")]
    MalformedRequest { reason: String },

    /// A multi-graph mutation failed partway through.
    ///
    /// `completed` per-graph calls succeeded before the call for `graph`
    /// failed; prior successes are not rolled back and the remaining graphs
    /// were not attempted.
    #[error("Mutation of graph <{graph}> failed after {completed} completed calls: {source}")]
    PartialMutation {
        graph: String,
        completed: usize,
        #[source]
        source: Box<StoreClientError>,
    },

    /// Operation not offered by the configured backend
    #[error("Operation not supported by this backend: {operation}")]
    NotSupported { operation: &'static str },
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, StoreClientError>;

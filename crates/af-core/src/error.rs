//! Unified error type for assetforge.
//!
//! Collaborators (datastores, processors, encoders, analysers) return these
//! variants directly, so the job layer propagates them with `?` and never
//! re-wraps a failure it did not originate.

use std::fmt;

/// Unified error type covering all failure modes in assetforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Two jobs belonging to different apps were combined.
    #[error("Cannot combine jobs belonging to different apps ({left} is not {right})")]
    AppMismatch {
        /// Display name of the left-hand app.
        left: String,
        /// Display name of the right-hand app.
        right: String,
    },

    /// A process step ran before anything was fetched.
    #[error("Can't process because there is no artifact yet. Need to fetch first?")]
    NothingToProcess,

    /// An encode step ran before anything was fetched.
    #[error("Can't encode because there is no artifact yet. Need to fetch first?")]
    NothingToEncode,

    /// Analysis was requested on a job that will never hold an artifact.
    #[error("Can't analyse because there is no artifact yet. Need to fetch first?")]
    NothingToAnalyse,

    /// The job ran every step but none of them produced an artifact.
    #[error("Job produced no artifact (it has no steps)")]
    NoArtifact,

    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "artifact").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// No processor is registered under this name.
    #[error("Unknown processor: {0}")]
    UnknownProcessor(String),

    /// No encoder is registered for this format.
    #[error("Unknown encoder: {0}")]
    UnknownEncoder(String),

    /// No analyser is registered under this name.
    #[error("Unknown analyser: {0}")]
    UnknownAnalyser(String),

    /// Parameters passed to a collaborator were missing or malformed.
    #[error("Invalid parameters for {operation}: {message}")]
    InvalidParams {
        /// Processor, encoder or analyser name.
        operation: String,
        /// Human-readable error description.
        message: String,
    },

    /// A processor, encoder or analyser failed while doing its work.
    #[error("Processing error [{operation}]: {message}")]
    Processing {
        /// Processor, encoder or analyser name.
        operation: String,
        /// Human-readable error description.
        message: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A recipe or config document could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration failed validation.
    #[error("Config error: {0}")]
    Config(String),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error is one of the "no artifact yet" guard failures.
    pub fn is_missing_artifact(&self) -> bool {
        matches!(
            self,
            Error::NothingToProcess
                | Error::NothingToEncode
                | Error::NothingToAnalyse
                | Error::NoArtifact
        )
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::InvalidParams`].
    pub fn invalid_params(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidParams {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Processing`].
    pub fn processing(operation: impl Into<String>, message: impl fmt::Display) -> Self {
        Error::Processing {
            operation: operation.into(),
            message: message.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_mismatch_display() {
        let err = Error::AppMismatch {
            left: "images".into(),
            right: "documents".into(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot combine jobs belonging to different apps (images is not documents)"
        );
        assert!(!err.is_missing_artifact());
    }

    #[test]
    fn guard_errors_are_missing_artifact() {
        for err in [
            Error::NothingToProcess,
            Error::NothingToEncode,
            Error::NothingToAnalyse,
            Error::NoArtifact,
        ] {
            assert!(err.is_missing_artifact(), "{err}");
        }
    }

    #[test]
    fn nothing_to_process_display() {
        let err = Error::NothingToProcess;
        assert!(err.to_string().contains("Need to fetch first?"));
    }

    #[test]
    fn not_found_display() {
        let err = Error::not_found("artifact", "2026/10/16/abc");
        assert_eq!(err.to_string(), "artifact not found: 2026/10/16/abc");
    }

    #[test]
    fn unknown_collaborator_display() {
        assert_eq!(
            Error::UnknownProcessor("sepia".into()).to_string(),
            "Unknown processor: sepia"
        );
        assert_eq!(
            Error::UnknownEncoder("heic".into()).to_string(),
            "Unknown encoder: heic"
        );
        assert_eq!(
            Error::UnknownAnalyser("faces".into()).to_string(),
            "Unknown analyser: faces"
        );
    }

    #[test]
    fn invalid_params_display() {
        let err = Error::invalid_params("thumbnail", "missing width");
        assert_eq!(
            err.to_string(),
            "Invalid parameters for thumbnail: missing width"
        );
    }

    #[test]
    fn processing_display() {
        let err = Error::processing("png", "unsupported color type");
        assert_eq!(
            err.to_string(),
            "Processing error [png]: unsupported color type"
        );
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn serde_json_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::from(parse_err);
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn result_alias() {
        fn ok_fn() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(ok_fn().unwrap(), 42);

        fn err_fn() -> Result<i32> {
            Err(Error::Internal("boom".into()))
        }
        assert!(err_fn().is_err());
    }
}

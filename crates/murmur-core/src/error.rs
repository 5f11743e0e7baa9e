use thiserror::Error;

/// Top-level error type for the Murmur system.
///
/// Each variant covers one subsystem. Soft "nothing to do" outcomes (no audio
/// captured, empty transcript) are deliberately NOT errors; they are expressed
/// as empty payloads or `None` at the call sites that produce them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MurmurError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Audio error: {0}")]
    Audio(String),

    /// A capture stream is already open. The session state machine guards
    /// against this; the variant exists as a reentrancy check.
    #[error("Audio capture is already active")]
    AlreadyCapturing,

    #[error("Hotkey error: {0}")]
    Hotkey(String),

    /// A session state transition that the lifecycle table forbids.
    #[error("Session error: {0}")]
    Session(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    /// The transcription backend returned a non-success status before any
    /// streaming body was read.
    #[error("Transcription request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Text insertion failed: {0}")]
    InsertionFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for MurmurError {
    fn from(err: toml::de::Error) -> Self {
        MurmurError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for MurmurError {
    fn from(err: toml::ser::Error) -> Self {
        MurmurError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for MurmurError {
    fn from(err: serde_json::Error) -> Self {
        MurmurError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Murmur operations.
pub type Result<T> = std::result::Result<T, MurmurError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MurmurError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_already_capturing_display() {
        assert_eq!(
            MurmurError::AlreadyCapturing.to_string(),
            "Audio capture is already active"
        );
    }

    #[test]
    fn test_request_failed_display() {
        let err = MurmurError::RequestFailed {
            status: 401,
            body: "invalid api key".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Transcription request failed with status 401: invalid api key"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MurmurError = io_err.into();
        assert!(matches!(err, MurmurError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let bad_toml = "invalid = [[[";
        let parsed: std::result::Result<toml::Value, _> = toml::from_str(bad_toml);
        let err: MurmurError = parsed.unwrap_err().into();
        assert!(matches!(err, MurmurError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let parsed: std::result::Result<serde_json::Value, _> =
            serde_json::from_str("{ invalid json }");
        let err: MurmurError = parsed.unwrap_err().into();
        assert!(matches!(err, MurmurError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let _value = io_result?;
            Ok("success".to_string())
        }

        assert_eq!(inner().unwrap(), "success");
    }
}

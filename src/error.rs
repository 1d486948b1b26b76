use thiserror::Error;

/// Failures reported by a frame source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("access denied")]
    AccessDenied,
    #[error("no frame source available: {0}")]
    Unsupported(String),
    #[error("capture surface temporarily unavailable")]
    TransientUnavailable,
    #[error("frame source exhausted")]
    EndOfStream,
    #[error("capture failed: {0}")]
    Fatal(String),
}

impl CaptureError {
    /// Errors that end startup and are never retried.
    pub fn is_startup_refusal(&self) -> bool {
        matches!(self, CaptureError::AccessDenied | CaptureError::Unsupported(_))
    }
}

#[derive(Debug, Error)]
pub enum MotionError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("frame buffer size mismatch: {width}x{height} with {len} bytes")]
    InvalidFrame { width: u32, height: u32, len: usize },
    #[error("frame {width}x{height} is too small for downsample factor {factor}")]
    FrameTooSmall { width: u32, height: u32, factor: u32 },
    #[error("frame resize failed: {0}")]
    Resize(String),
    #[error("motion service is not running")]
    NotRunning,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid TOML syntax: {0}")]
    Parse(String),
    #[error("invalid configuration value: {0}")]
    Invalid(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_denial_and_missing_source_refuse_startup() {
        assert!(CaptureError::AccessDenied.is_startup_refusal());
        assert!(CaptureError::Unsupported("no camera".into()).is_startup_refusal());
        assert!(!CaptureError::TransientUnavailable.is_startup_refusal());
        assert!(!CaptureError::EndOfStream.is_startup_refusal());
        assert!(!CaptureError::Fatal("gone".into()).is_startup_refusal());
    }
}

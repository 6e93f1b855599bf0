/*!
    Error types shared by the media crates.
*/

use thiserror::Error;

/**
    Error type for the media crates.

    "Would block" conditions reported by decoder or scaler backends are never
    represented here; they drive the decode loop internally and only genuine
    exhaustion or backend failure reaches the caller.
*/
#[derive(Debug, Error)]
pub enum Error {
    /// The packet queue is empty and the container has reached end of file.
    #[error("end of stream")]
    Eof,
    /// The packet queue is empty but more packets may still arrive.
    #[error("no packets available yet")]
    Starved,
    /// The decoder backend reported a failure other than would-block.
    #[error("decode error ({code}): {message}")]
    Decode { code: i32, message: String },
    /// The scaling backend failed to convert an image.
    #[error("conversion error ({code}): {message}")]
    Conversion { code: i32, message: String },
    /// A buffer does not satisfy its declared layout.
    #[error("invalid data: {message}")]
    InvalidData { message: String },
    /// Valid input that the selected backend cannot handle.
    #[error("unsupported format: {message}")]
    UnsupportedFormat { message: String },
    /// The configured iteration cap was hit without producing a frame.
    #[error("decoder made no progress after {iterations} iterations")]
    Stalled { iterations: usize },
    /// A component was used after it was disposed.
    #[error("{what} used after disposal")]
    Disposed { what: &'static str },
}

impl Error {
    /**
        Create a decode error from a backend status code.
    */
    pub fn decode(code: i32, message: impl Into<String>) -> Self {
        Self::Decode {
            code,
            message: message.into(),
        }
    }

    /**
        Create a conversion error from a backend status code.
    */
    pub fn conversion(code: i32, message: impl Into<String>) -> Self {
        Self::Conversion {
            code,
            message: message.into(),
        }
    }

    /**
        Create an invalid data error with the given message.
    */
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /**
        Create an unsupported format error with the given message.
    */
    pub fn unsupported_format(message: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            message: message.into(),
        }
    }

    /**
        Returns true if this is the end-of-stream condition.
    */
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }

    /**
        Returns true if the packet queue ran dry before end of file.
    */
    pub fn is_starved(&self) -> bool {
        matches!(self, Self::Starved)
    }

    /**
        Returns true if retrying after supplying more packets can succeed.
    */
    pub fn is_recoverable(&self) -> bool {
        self.is_starved()
    }
}

/**
    Result type alias for the media crates.
*/
pub type Result<T> = std::result::Result<T, Error>;

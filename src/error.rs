//! Error types for custom debug information parsing and encoding.
//!
//! This module provides the central [`crate::Error`] enum used throughout the crate. Decoding
//! errors distinguish between malformed input (with source location context for debugging),
//! out-of-bounds reads, and unsupported constructs. Encoding errors surface contract
//! violations such as oversized names or detached instruction references before any bytes
//! are produced.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotpdb::{Error, Result};
//!
//! fn parse_something(data: &[u8]) -> Result<u8> {
//!     match data.first() {
//!         Some(byte) => Ok(*byte),
//!         None => Err(Error::Empty),
//!     }
//! }
//! ```

/// Creates a [`crate::Error::Malformed`] error with detailed location information.
///
/// Automatically captures the current file and line number where the error occurs,
/// making it easier to track down parsing issues during development and debugging.
///
/// # Usage
///
/// With a simple message:
/// ```rust,ignore
/// return Err(malformed_error!("Invalid record header"));
/// ```
///
/// With a formatted message:
/// ```rust,ignore
/// return Err(malformed_error!("Invalid kind byte - {}", kind));
/// ```
macro_rules! malformed_error {
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// Represents all possible errors that can occur within `dotpdb`.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The provided data is malformed and does not follow the expected layout
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// A message which explains the error in more detail
        message: String,
        /// The file in which the error occurred
        file: &'static str,
        /// The line at which the error occurred
        line: u32,
    },

    /// An out of bounds read would have occurred
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// The provided input is empty
    #[error("The provided input is empty")]
    Empty,

    /// An instruction reference does not belong to the method body it is encoded against
    #[error("Instruction reference {0} is not part of the target method body")]
    DetachedInstruction(usize),

    /// A wire-level reference did not resolve against the decode context
    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),

    /// An absent instruction reference was used where a concrete instruction is required
    #[error("An absent instruction reference is only valid as an end-of-body marker")]
    OpenInstruction,

    /// A local or type name exceeds the fixed-size limit of its wire format
    #[error("Name of {len} UTF-16 units exceeds the format limit of {max}")]
    NameTooLong {
        /// The actual length in UTF-16 code units
        len: usize,
        /// The maximum the wire format can hold
        max: usize,
    },

    /// A dynamic-local flag run exceeds the fixed-size limit of its wire format
    #[error("Flag run of {len} entries exceeds the format limit of {max}")]
    FlagsTooLong {
        /// The actual number of flags
        len: usize,
        /// The maximum the wire format can hold
        max: usize,
    },

    /// A string destined for a zero-terminated field contains an embedded NUL
    #[error("String contains an embedded NUL and cannot be zero-terminated")]
    EmbeddedNul,

    /// The debug information variant has no wire form in the requested container
    #[error("'{0}' cannot be serialized into the requested container format")]
    UnsupportedKind(&'static str),

    /// A record group exceeds the count limit of the container header
    #[error("{0} records exceed the container limit of 255")]
    TooManyRecords(usize),

    /// A single record's encoded size exceeds what its length field can represent
    #[error("Record payload of {0} bytes exceeds the record length field")]
    RecordTooLarge(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_error_macro_simple() {
        let error = malformed_error!("test message");
        match error {
            Error::Malformed {
                message,
                file,
                line,
            } => {
                assert_eq!(message, "test message");
                assert!(file.ends_with("error.rs"));
                assert!(line > 0);
            }
            _ => panic!("Expected Malformed error"),
        }
    }

    #[test]
    fn test_malformed_error_macro_formatted() {
        let kind = 42;
        let error = malformed_error!("Invalid kind byte - {}", kind);
        match error {
            Error::Malformed { message, .. } => {
                assert_eq!(message, "Invalid kind byte - 42");
            }
            _ => panic!("Expected Malformed error"),
        }
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::OutOfBounds.to_string(),
            "Out of Bound read would have occurred!"
        );
        assert_eq!(Error::Empty.to_string(), "The provided input is empty");
        assert_eq!(
            Error::DetachedInstruction(7).to_string(),
            "Instruction reference 7 is not part of the target method body"
        );
        assert_eq!(
            Error::NameTooLong { len: 65, max: 64 }.to_string(),
            "Name of 65 UTF-16 units exceeds the format limit of 64"
        );
        assert_eq!(
            Error::UnsupportedKind("IteratorMethod").to_string(),
            "'IteratorMethod' cannot be serialized into the requested container format"
        );
        assert_eq!(
            Error::TooManyRecords(300).to_string(),
            "300 records exceed the container limit of 255"
        );
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}

//! Metadata-level types shared by both debug information containers.
//!
//! This module groups everything that sits above raw byte parsing but below the container
//! codecs: metadata tokens, the instruction-offset view of method bodies, the diagnostics
//! sink, and the custom debug information model itself.
//!
//! # Key Components
//!
//! - [`token`] - Metadata table row references used throughout .NET
//! - [`method`] - Instruction-offset resolution for method bodies
//! - [`diagnostics`] - Non-fatal issue collection during decoding
//! - [`customdebuginformation`] - The debug record model and both container codecs
//!
//! # Examples
//!
//! ```rust
//! use dotpdb::metadata::token::Token;
//!
//! let token = Token::new(0x0600_0001);
//! assert!(token.is_method());
//! assert_eq!(token.row(), 1);
//! ```

/// Implementation of the custom debug information model and container codecs
pub mod customdebuginformation;
/// Implementation of the diagnostics sink for non-fatal decode issues
pub mod diagnostics;
/// Implementation of the instruction-offset view of method bodies
pub mod method;
/// Commonly used metadata token type
pub mod token;

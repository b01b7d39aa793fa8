//! # dotpdb Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the dotpdb library. Import this module to get quick access to the essential
//! types for working with custom debug information.
//!
//! # Usage
//!
//! ```rust
//! use dotpdb::prelude::*;
//!
//! let body = MethodBody::new(vec![0, 2, 5], 8)?;
//! let resolver = NullResolver;
//! let ctx = CdiContext::new(
//!     MethodRef::new(Token::new(0x0600_0001), "Main"),
//!     &body,
//!     &[],
//!     &resolver,
//! );
//! # let _ = ctx;
//! # Ok::<(), Error>(())
//! ```

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dotpdb operations
pub use crate::Error;

/// The result type used throughout dotpdb
pub use crate::Result;

/// Low-level blob parsing and building utilities
pub use crate::{Parser, Writer};

// ================================================================================================
// Metadata System - Core Types
// ================================================================================================

/// Metadata token type for referencing table entries
pub use crate::metadata::token::Token;

/// Instruction-offset view of a method body
pub use crate::metadata::method::{InstrRef, MethodBody};

/// Diagnostics collection during decoding
pub use crate::metadata::diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics,
};

// ================================================================================================
// Custom Debug Information - Model and Contexts
// ================================================================================================

/// The record model shared by both containers
pub use crate::metadata::customdebuginformation::{
    AsyncMethod, AsyncStep, CustomDebugInfo, DynamicLocal, HoistedScope, KindOrGuid, MethodRef,
    TupleInfo, TypeRef, WindowsKind,
};

/// Decode and encode context types
pub use crate::metadata::customdebuginformation::{
    CdiContext, GenericContext, LocalVar, NullResolver, TokenResolver,
};

// ================================================================================================
// Custom Debug Information - Container Codecs
// ================================================================================================

/// The legacy Windows PDB record stream codec
pub use crate::metadata::customdebuginformation::WindowsDebugInfo;

/// The Portable PDB blob codec
pub use crate::metadata::customdebuginformation::{
    read_portable_debug_info, write_portable_debug_info,
};

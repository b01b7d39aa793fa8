//! Custom debug information codecs for both managed PDB containers.
//!
//! Compilers attach per-method debugging metadata beyond sequence points and scopes:
//! import chains, state machine layouts, dynamic-type flags, tuple element names, async
//! stepping points. Two wire containers exist for this data. Legacy Windows PDBs pack
//! it into a versioned record stream stored as the method's "MD2" attribute; Portable
//! PDBs store one GUID-identified blob per record in the `CustomDebugInformation`
//! table. Both decode into the same [`CustomDebugInfo`] model, so records can be
//! inspected and rewritten without caring which container they came from.
//!
//! # Architecture
//!
//! The module is split along the container boundary:
//!
//! - [`types`] - The [`CustomDebugInfo`] union, record identities, and wire constants
//! - [`context`] - The per-method [`CdiContext`] and the [`TokenResolver`] seam
//! - [`windows`] - The legacy record stream framing
//! - [`portable`] - The Portable PDB `(guid, blob)` mapping
//! - [`asyncmethod`] - The folded per-state-machine async view
//!
//! The payload codecs themselves are private; both containers share them, so a record
//! kind that exists in both decodes identically either way.
//!
//! Decoded records carry resolved values: IL offsets become [`InstrRef`] handles into
//! the owning method's body, tokens become [`MethodRef`] and [`TypeRef`] values. The
//! codec itself never touches metadata tables; everything outside the payload bytes
//! comes through the [`TokenResolver`] the caller supplies.
//!
//! [`InstrRef`]: crate::metadata::method::InstrRef
//!
//! # Usage Examples
//!
//! ```rust
//! use dotpdb::metadata::customdebuginformation::{
//!     CdiContext, CustomDebugInfo, MethodRef, NullResolver, WindowsDebugInfo,
//! };
//! use dotpdb::metadata::{method::MethodBody, token::Token};
//!
//! let body = MethodBody::new(vec![0, 2, 5], 8)?;
//! let resolver = NullResolver;
//! let ctx = CdiContext::new(
//!     MethodRef::new(Token::new(0x0600_0001), "Main"),
//!     &body,
//!     &[],
//!     &resolver,
//! );
//!
//! let group = WindowsDebugInfo {
//!     infos: vec![CustomDebugInfo::UsingGroups {
//!         groups: vec![2, 0],
//!     }],
//!     dropped: 0,
//! };
//!
//! let blob = group.write(&ctx)?;
//! assert_eq!(WindowsDebugInfo::read(&blob, &ctx)?, group);
//! # Ok::<(), dotpdb::Error>(())
//! ```

/// Implementation of the folded async method view
pub mod asyncmethod;
/// Implementation of the decode and encode context types
pub mod context;
/// Implementation of the payload decoders
pub(crate) mod parser;
/// Implementation of the Portable PDB blob codec
pub mod portable;
/// Implementation of the record model and wire constants
pub mod types;
/// Implementation of the legacy record stream codec
pub mod windows;
/// Implementation of the payload encoders
pub(crate) mod writer;

pub use asyncmethod::AsyncMethod;
pub use context::{CdiContext, GenericContext, LocalVar, NullResolver, TokenResolver};
pub use portable::{read_portable_debug_info, write_portable_debug_info};
pub use types::{
    AsyncStep, CustomDebugInfo, DynamicLocal, HoistedScope, KindOrGuid, MethodRef, TupleInfo,
    TypeRef, WindowsKind, ASYNC_METHOD_STEPPING_INFO, DEFAULT_NAMESPACE, DYNAMIC_FLAG_BYTES,
    DYNAMIC_LOCAL_VARIABLES, DYNAMIC_NAME_UNITS, EMBEDDED_SOURCE, ENC_LAMBDA_AND_CLOSURE_MAP,
    ENC_LOCAL_SLOT_MAP, MD2_ATTRIBUTE_NAME, RECORD_HEADER_SIZE, SOURCE_LINK,
    STATE_MACHINE_HOISTED_LOCAL_SCOPES, STREAM_HEADER_SIZE, TUPLE_ELEMENT_NAMES, WINDOWS_VERSION,
};
pub use windows::WindowsDebugInfo;

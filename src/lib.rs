// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]
#![deny(unsafe_code)]

//! # dotpdb
//!
//! [![Crates.io](https://img.shields.io/crates/v/dotpdb.svg)](https://crates.io/crates/dotpdb)
//! [![Documentation](https://docs.rs/dotpdb/badge.svg)](https://docs.rs/dotpdb)
//! [![License](https://img.shields.io/badge/license-Apache--2.0-blue.svg)](https://github.com/BinFlip/dotpdb/blob/main/LICENSE-APACHE)
//!
//! A cross-platform codec for the custom debug information that managed-code compilers embed
//! in PDB files. Built in pure Rust, `dotpdb` decodes and encodes both container formats in
//! use today: the legacy Windows PDB record stream (the "MD2" symbol annotation) and the
//! GUID-keyed blobs of the Portable PDB `CustomDebugInformation` table. Neither Windows nor
//! a .NET runtime is required.
//!
//! ## Features
//!
//! - **📦 Both container formats** - Legacy record streams and Portable PDB blobs, one data model
//! - **🔍 Full record coverage** - Import scopes, state machines, dynamic locals, tuple names, EnC maps
//! - **🛡️ Lossless round-trips** - Unknown records survive decode and re-encode byte for byte
//! - **⚡ Resilient decoding** - Corrupt records are dropped individually, the rest of the group survives
//! - **🔧 Cross-platform** - Works on Windows, Linux, macOS, and any Rust-supported platform
//! - **📊 Semantic results** - Offsets resolve to instruction references, slots to named locals
//!
//! ## Quick Start
//!
//! Add `dotpdb` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! dotpdb = "0.1"
//! ```
//!
//! ### Using the Prelude
//!
//! For convenient access to the most commonly used types, import the prelude:
//!
//! ```rust
//! use dotpdb::prelude::*;
//!
//! // A method with instructions at IL offsets 0, 2 and 5, and 8 bytes of code
//! let body = MethodBody::new(vec![0, 2, 5], 8)?;
//! let owner = MethodRef::new(Token::new(0x0600_0001), "MoveNext");
//! let resolver = NullResolver;
//! let ctx = CdiContext::new(owner, &body, &[], &resolver);
//!
//! // Decode a legacy MD2 record group: one UsingGroups record [3, 1, 0]
//! let blob = [
//!     4, 1, 0, 0, // stream header: version 4, 1 record
//!     4, 0, 0, 4, // record header: version 4, kind 0, stale alignment byte (ignored)
//!     16, 0, 0, 0, // record length including both headers
//!     3, 0, 3, 0, 1, 0, 0, 0, // payload: count 3, groups [3, 1, 0]
//! ];
//! let group = WindowsDebugInfo::read(&blob, &ctx)?;
//! assert_eq!(group.infos.len(), 1);
//! # Ok::<(), dotpdb::Error>(())
//! ```
//!
//! ### Portable PDB Blobs
//!
//! Portable PDB records are keyed by GUID instead of a kind byte. Each blob decodes
//! independently:
//!
//! ```rust
//! use dotpdb::prelude::*;
//! use dotpdb::metadata::customdebuginformation::STATE_MACHINE_HOISTED_LOCAL_SCOPES;
//!
//! let body = MethodBody::new(vec![0, 4, 8], 12)?;
//! let owner = MethodRef::new(Token::new(0x0600_0002), "MoveNext");
//! let resolver = NullResolver;
//! let ctx = CdiContext::new(owner, &body, &[], &resolver);
//!
//! // Two hoisted local scopes, 8 bytes each: (start, length)
//! let blob = [4u8, 0, 0, 0, 4, 0, 0, 0, 8, 0, 0, 0, 4, 0, 0, 0];
//! let info = read_portable_debug_info(&STATE_MACHINE_HOISTED_LOCAL_SCOPES, &blob, &ctx)?;
//! # Ok::<(), dotpdb::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `dotpdb` is organized into several key modules:
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`metadata`] - The debug information data model, codecs, and method body resolution
//! - [`Error`] and [`Result`] - Comprehensive error handling
//!
//! ### Data Model
//!
//! Every record in either container decodes into the same
//! [`metadata::customdebuginformation::CustomDebugInfo`] enum. Records that only exist in one
//! container (forwarding records on the Windows side, embedded source on the Portable side)
//! carry variants of their own; attempting to serialize them into the other container is a
//! typed error, never silent data loss.
//!
//! ### Resolution Seam
//!
//! Decoding is always performed against a [`metadata::customdebuginformation::CdiContext`]
//! that supplies the owning method's instruction offsets, local variable table, and a
//! [`metadata::customdebuginformation::TokenResolver`] for cross-method references. The
//! context turns raw IL offsets into [`metadata::method::InstrRef`] handles that survive
//! instruction reordering, and local slot indices into named locals.
//!
//! ### Error Handling Strategy
//!
//! Corruption inside a record group is contained: a structural fault in the record framing
//! aborts the remaining records but keeps the prefix already decoded, while a fault local to
//! one record's payload drops just that record. Both outcomes are observable through
//! [`metadata::customdebuginformation::WindowsDebugInfo::dropped`] and the
//! [`metadata::diagnostics::Diagnostics`] collector. Encoding is strict: contract violations
//! such as oversized names fail before any bytes are produced.
//!
//! ```rust,no_run
//! use dotpdb::{Error, prelude::*};
//!
//! # fn example(blob: &[u8], ctx: &CdiContext) -> dotpdb::Result<()> {
//! match WindowsDebugInfo::read(blob, ctx) {
//!     Ok(group) if group.dropped == 0 => println!("decoded {} records", group.infos.len()),
//!     Ok(group) => println!("decoded {} records, dropped {}", group.infos.len(), group.dropped),
//!     Err(Error::Malformed { message, .. }) => println!("unreadable stream: {}", message),
//!     Err(e) => println!("error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Standards Compliance
//!
//! The Portable PDB layouts follow the **Portable PDB v1.0** specification; the legacy
//! record stream follows the format emitted by the managed compilers since Visual Studio
//! 2005. Integer compression uses the ECMA-335 encoding.
//!
//! ### References
//!
//! - [Portable PDB Format](https://github.com/dotnet/runtime/blob/main/docs/design/specs/PortablePdb-Metadata.md) - Portable PDB specification
//! - [ECMA-335 Standard](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf) - Official CLI specification
//! - [.NET Roslyn](https://github.com/dotnet/roslyn) - Reference implementation of both writers
//!
//! ## Development and Testing
//!
//! The crate includes comprehensive fuzzing support for security and robustness:
//!
//! ### Fuzzing
//!
//! ```bash
//! # Install fuzzing tools
//! cargo install cargo-fuzz
//!
//! # Run fuzzer
//! cargo +nightly fuzz run windows_stream --release
//!
//! # Multi-core fuzzing
//! cargo +nightly fuzz run windows_stream --release -- -jobs=4 -fork=1
//! ```
//!
//! ### Testing
//!
//! The test suite includes byte-exact vectors from both compilers and edge cases:
//!
//! ```bash
//! cargo test
//! ```

#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// This module provides a curated selection of the most frequently used types
/// from across the dotpdb library, allowing for convenient glob imports.
///
/// # Example
///
/// ```rust
/// use dotpdb::prelude::*;
///
/// // Now you have access to the most common types
/// let body = MethodBody::new(vec![0, 1, 3], 4)?;
/// assert!(body.instruction_at(3).is_some());
/// # Ok::<(), dotpdb::Error>(())
/// ```
pub mod prelude;

/// Definitions, parsing, and encoding of custom debug information
///
/// This module implements the complete data model and both wire codecs for the custom
/// debug information attached to methods in managed-code PDB files.
///
/// # Key Components
///
/// ## Data Model
/// - [`metadata::customdebuginformation::CustomDebugInfo`] - Decoded record, shared by both containers
/// - [`metadata::customdebuginformation::KindOrGuid`] - Container-specific record identity
/// - [`metadata::customdebuginformation::HoistedScope`] - State machine hoisted local scopes
///
/// ## Containers
/// - [`metadata::customdebuginformation::WindowsDebugInfo`] - Legacy MD2 record stream codec
/// - [`metadata::customdebuginformation::read_portable_debug_info`] - Portable PDB blob decoding
/// - [`metadata::customdebuginformation::write_portable_debug_info`] - Portable PDB blob encoding
///
/// ## Resolution
/// - [`metadata::method::MethodBody`] - Instruction offset table of the owning method
/// - [`metadata::customdebuginformation::CdiContext`] - Per-method decode and encode context
/// - [`metadata::customdebuginformation::TokenResolver`] - Cross-method and type lookups
///
/// ## Observability
/// - [`metadata::diagnostics::Diagnostics`] - Thread-safe collector for non-fatal findings
///
/// # Examples
///
/// ```rust
/// use dotpdb::prelude::*;
///
/// let body = MethodBody::new(vec![0, 2], 4)?;
/// let resolver = NullResolver;
/// let ctx = CdiContext::new(MethodRef::new(Token::new(0x0600_0001), "M"), &body, &[], &resolver);
///
/// // Round-trip a group of records through the legacy container
/// let group = WindowsDebugInfo {
///     infos: vec![CustomDebugInfo::UsingGroups { groups: vec![2, 0] }],
///     dropped: 0,
/// };
/// let bytes = group.write(&ctx)?;
/// let back = WindowsDebugInfo::read(&bytes, &ctx)?;
/// assert_eq!(back.infos, group.infos);
/// # Ok::<(), dotpdb::Error>(())
/// ```
pub mod metadata;

/// `dotpdb` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
/// This is used consistently throughout the crate for all fallible operations.
///
/// # Examples
///
/// ```rust
/// use dotpdb::{prelude::*, Result};
///
/// fn body_of(offsets: Vec<u32>, size: u32) -> Result<MethodBody> {
///     MethodBody::new(offsets, size)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `dotpdb` Error type
///
/// The main error type for all operations in this crate. Provides detailed error information
/// for blob parsing, record resolution, and encoding contract violations.
///
/// # Examples
///
/// ```rust
/// use dotpdb::{Error, prelude::*};
///
/// match MethodBody::new(vec![4, 2], 8) {
///     Ok(_) => println!("valid body"),
///     Err(Error::Malformed { message, .. }) => println!("malformed: {}", message),
///     Err(e) => println!("error: {}", e),
/// }
/// ```
pub use error::Error;

/// Provides access to low-level blob parsing and building utilities.
///
/// The [`Parser`] type decodes little-endian fields, compressed integers, and the string
/// encodings used by debug information blobs; [`Writer`] is its encoding counterpart.
///
/// # Example
///
/// ```rust
/// use dotpdb::Parser;
/// let blob = [0x2A, 0x00, 0x00, 0x00];
/// let mut parser = Parser::new(&blob);
/// let value: u32 = parser.read_le()?;
/// assert_eq!(value, 0x2A);
/// # Ok::<(), dotpdb::Error>(())
/// ```
pub use file::{parser::Parser, writer::Writer};

//! Low-level blob parsing and building infrastructure.
//!
//! This module provides the byte-level primitives the debug information codecs are built on.
//! It implements safe, bounds-checked reading and writing of the encodings that appear in
//! PDB debug blobs: little-endian integers, ECMA-335 compressed integers, and the UTF-8 and
//! UTF-16 string forms used by the record payloads.
//!
//! # Architecture
//!
//! The module is split into three layers that build on each other:
//!
//! - **Typed I/O** - The [`crate::file::io::PdbIo`] trait maps primitive types to their
//!   little-endian byte representations
//! - **Cursor parsing** - [`crate::file::parser::Parser`] tracks a position over a borrowed
//!   byte slice and decodes fields sequentially
//! - **Buffer building** - [`crate::file::writer::Writer`] grows an owned buffer, with
//!   back-patching support for length fields that are only known after the payload is written
//!
//! # Key Components
//!
//! ## Parsing Infrastructure
//! - [`crate::file::parser::Parser`] - Sequential decoder over a byte slice
//! - [`crate::file::io::read_le`] / [`crate::file::io::read_le_at`] - Positional reads
//!
//! ## Building Infrastructure
//! - [`crate::file::writer::Writer`] - Sequential encoder into an owned buffer
//! - [`crate::file::io::write_le`] / [`crate::file::io::write_le_at`] - Positional writes
//!
//! # Examples
//!
//! ```rust
//! use dotpdb::Parser;
//!
//! let blob = [0x03, 0x00, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00];
//! let mut parser = Parser::new(&blob);
//!
//! let count: u16 = parser.read_le()?;
//! assert_eq!(count, 3);
//! # Ok::<(), dotpdb::Error>(())
//! ```

pub mod io;
pub mod parser;
pub mod writer;

//! Instruction-level view of a method body for debug information resolution.
//!
//! Debug records never store instruction references directly; they store IL byte offsets
//! into the owning method's code. This module provides [`crate::metadata::method::MethodBody`],
//! the ordered offset table the embedder supplies, and
//! [`crate::metadata::method::InstrRef`], the opaque handle the decoded model carries
//! instead of raw offsets.
//!
//! # Architecture
//!
//! The resolver is deliberately minimal: a sorted `Vec<u32>` of instruction start offsets
//! plus the declared code size. Lookups are binary searches, so resolving a record with
//! `n` offset references costs `O(n log m)` for a method of `m` instructions.
//!
//! Offsets that fall between instruction starts do not resolve. Hand-patched or
//! obfuscated assemblies produce such offsets regularly, which is why
//! [`crate::metadata::method::MethodBody::instruction_at`] returns an `Option` rather
//! than clamping to the nearest instruction.
//!
//! # Key Components
//!
//! - [`crate::metadata::method::MethodBody`] - Ordered instruction offsets and code size
//! - [`crate::metadata::method::InstrRef`] - Index handle into a method's instruction sequence
//!
//! # Usage Examples
//!
//! ```rust
//! use dotpdb::metadata::method::MethodBody;
//!
//! let body = MethodBody::new(vec![0, 2, 5, 9], 12)?;
//!
//! let instr = body.instruction_at(5).unwrap();
//! assert_eq!(body.offset_of(instr), Some(5));
//!
//! // No instruction begins at offset 7
//! assert!(body.instruction_at(7).is_none());
//!
//! // The declared code size acts as the end-of-body marker
//! assert_eq!(body.end_at(12), Some(None));
//! # Ok::<(), dotpdb::Error>(())
//! ```

use crate::{Error, Result};

/// An opaque handle to an instruction within a [`MethodBody`].
///
/// `InstrRef` is an index into the owning body's instruction sequence, not a byte offset.
/// A handle is only meaningful together with the body that produced it; resolving it
/// against a different body is caught at encode time and reported as
/// [`crate::Error::DetachedInstruction`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstrRef(usize);

impl InstrRef {
    /// Returns the position of the referenced instruction within its method body.
    #[must_use]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// The instruction-offset view of a single method body.
///
/// A `MethodBody` pairs the strictly ascending start offsets of every IL instruction with
/// the method's declared code size. Debug records reference instructions by start offset
/// on the wire; this type translates between those offsets and [`InstrRef`] handles in
/// both directions.
///
/// The offset exactly equal to the code size is not an instruction but the end-of-body
/// marker, which scope records use to express "until the end of the method".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBody {
    /// Start offset of each instruction, strictly ascending
    instruction_offsets: Vec<u32>,
    /// Declared size of the method's IL stream in bytes
    code_size: u32,
}

impl MethodBody {
    /// Creates a method body view from instruction start offsets and the code size.
    ///
    /// # Arguments
    /// * `instruction_offsets` - Start offset of every instruction, in stream order
    /// * `code_size` - The declared size of the IL stream in bytes
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the offsets are not strictly ascending or
    /// if any offset lies at or beyond `code_size`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dotpdb::metadata::method::MethodBody;
    ///
    /// let body = MethodBody::new(vec![0, 2, 5], 8)?;
    /// assert_eq!(body.instruction_count(), 3);
    ///
    /// assert!(MethodBody::new(vec![4, 2], 8).is_err());
    /// # Ok::<(), dotpdb::Error>(())
    /// ```
    pub fn new(instruction_offsets: Vec<u32>, code_size: u32) -> Result<Self> {
        for pair in instruction_offsets.windows(2) {
            if pair[0] >= pair[1] {
                return Err(malformed_error!(
                    "Instruction offsets must be strictly ascending - {} is followed by {}",
                    pair[0],
                    pair[1]
                ));
            }
        }

        if let Some(last) = instruction_offsets.last() {
            if *last >= code_size {
                return Err(malformed_error!(
                    "Instruction offset {} lies beyond the code size of {} bytes",
                    last,
                    code_size
                ));
            }
        }

        Ok(MethodBody {
            instruction_offsets,
            code_size,
        })
    }

    /// Returns the declared size of the IL stream in bytes.
    #[must_use]
    pub fn code_size(&self) -> u32 {
        self.code_size
    }

    /// Returns the number of instructions in this body.
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        self.instruction_offsets.len()
    }

    /// Returns true if this body contains no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instruction_offsets.is_empty()
    }

    /// Resolves a byte offset to the instruction starting exactly there.
    ///
    /// # Arguments
    /// * `offset` - The IL byte offset to resolve
    ///
    /// # Returns
    /// The handle of the instruction beginning at `offset`, or `None` if no instruction
    /// starts there. Offsets in the middle of an instruction do not resolve.
    #[must_use]
    pub fn instruction_at(&self, offset: u32) -> Option<InstrRef> {
        self.instruction_offsets
            .binary_search(&offset)
            .ok()
            .map(InstrRef)
    }

    /// Resolves a byte offset that may legitimately point one past the last instruction.
    ///
    /// Scope ends and similar exclusive bounds use the declared code size to mean
    /// "until the end of the method". That offset is not an instruction, so it resolves
    /// to the end-of-body marker instead of a handle.
    ///
    /// # Arguments
    /// * `offset` - The IL byte offset to resolve
    ///
    /// # Returns
    /// * `Some(Some(instr))` - An instruction begins at `offset`
    /// * `Some(None)` - `offset` equals the code size (end-of-body marker)
    /// * `None` - `offset` resolves to neither
    #[must_use]
    pub fn end_at(&self, offset: u32) -> Option<Option<InstrRef>> {
        if offset == self.code_size {
            return Some(None);
        }

        self.instruction_at(offset).map(Some)
    }

    /// Returns the start offset of a previously resolved instruction.
    ///
    /// # Arguments
    /// * `instr` - The handle to translate back to a byte offset
    ///
    /// # Returns
    /// The instruction's start offset, or `None` if the handle does not belong to this
    /// body.
    #[must_use]
    pub fn offset_of(&self, instr: InstrRef) -> Option<u32> {
        self.instruction_offsets.get(instr.0).copied()
    }

    /// Translates an optional instruction handle into the offset its wire form carries.
    ///
    /// The encode-side counterpart of [`MethodBody::end_at`]: an absent handle stands for
    /// the end-of-body marker and maps to the declared code size, but only in positions
    /// where the wire format defines that marker.
    ///
    /// # Arguments
    /// * `instr` - The handle to resolve, or `None` for the end-of-body marker
    /// * `is_end_sentinel` - Whether this position admits the end-of-body marker
    ///
    /// # Errors
    /// Returns [`crate::Error::DetachedInstruction`] if the handle does not belong to
    /// this body, or [`crate::Error::OpenInstruction`] if `instr` is `None` in a position
    /// that requires a concrete instruction.
    pub fn offset_for(&self, instr: Option<InstrRef>, is_end_sentinel: bool) -> Result<u32> {
        match instr {
            Some(instr) => self
                .offset_of(instr)
                .ok_or(Error::DetachedInstruction(instr.0)),
            None if is_end_sentinel => Ok(self.code_size),
            None => Err(Error::OpenInstruction),
        }
    }
}

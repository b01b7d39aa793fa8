//! Core data model for custom debug information records.
//!
//! This module defines the [`crate::metadata::customdebuginformation::CustomDebugInfo`]
//! tagged union that both container codecs decode into, together with the record identity
//! types and the wire-format constants both containers share. Every constant here is
//! normative: the version bytes, kind ordinals, and GUIDs must match the values emitted
//! by the managed compilers bit for bit.

use strum::{EnumCount, EnumIter, FromRepr};
use uguid::{guid, Guid};

use crate::metadata::{method::InstrRef, token::Token};

/// Version byte of the legacy record stream container and of every record inside it.
pub const WINDOWS_VERSION: u8 = 4;

/// Name of the symbol-store attribute that carries the legacy record stream.
///
/// The legacy container is not a PDB stream of its own; it is attached to a method's
/// symbol record as a named attribute under this name.
pub const MD2_ATTRIBUTE_NAME: &str = "MD2";

/// Size in bytes of the legacy record stream header and of each record header.
pub const RECORD_HEADER_SIZE: usize = 8;

/// Size in bytes of the legacy record stream header (version, count, 2 reserved).
pub const STREAM_HEADER_SIZE: usize = 4;

/// Number of raw flag bytes in a legacy dynamic-local entry.
pub const DYNAMIC_FLAG_BYTES: usize = 64;

/// Number of UTF-16 code units in the fixed name field of a legacy dynamic-local entry.
pub const DYNAMIC_NAME_UNITS: usize = 64;

/// Identifies state machine hoisted local scope blobs in Portable PDBs.
pub const STATE_MACHINE_HOISTED_LOCAL_SCOPES: Guid = guid!("6da9a61e-f8c7-4874-be62-68bc5630df71");

/// Identifies dynamic local variable flag blobs in Portable PDBs.
pub const DYNAMIC_LOCAL_VARIABLES: Guid = guid!("83c563c4-b4f3-47d5-b824-ba5441477ea8");

/// Identifies default namespace blobs in Portable PDBs.
pub const DEFAULT_NAMESPACE: Guid = guid!("58b2eab6-209f-4e4e-a22c-b2d0f910c782");

/// Identifies Edit-and-Continue local slot map blobs in Portable PDBs.
pub const ENC_LOCAL_SLOT_MAP: Guid = guid!("755f52a8-91c5-45be-b4b8-209571e552bd");

/// Identifies Edit-and-Continue lambda and closure map blobs in Portable PDBs.
pub const ENC_LAMBDA_AND_CLOSURE_MAP: Guid = guid!("a643004c-0240-496f-a783-30d64f4979de");

/// Identifies tuple element name blobs in Portable PDBs.
pub const TUPLE_ELEMENT_NAMES: Guid = guid!("ed9fdf71-8879-4747-8ed3-fe5ede3ce710");

/// Identifies embedded source blobs in Portable PDBs.
pub const EMBEDDED_SOURCE: Guid = guid!("0e8a571b-6926-466e-b4ad-8ab04611f5fe");

/// Identifies Source Link blobs in Portable PDBs.
pub const SOURCE_LINK: Guid = guid!("cc110556-a091-4d38-9fec-25ab9a351a6a");

/// Identifies async method stepping information blobs in Portable PDBs.
pub const ASYNC_METHOD_STEPPING_INFO: Guid = guid!("54fd2ac5-e925-401a-9c2a-f94f171072f8");

/// Record kinds of the legacy Windows PDB record stream.
///
/// The discriminant is the kind byte as it appears on the wire. The ordering is
/// historical: kinds at or below [`WindowsKind::DynamicLocals`] predate the
/// alignment-size header field, which is why their records ignore it (see
/// [`WindowsKind::ignores_alignment`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount, FromRepr)]
#[repr(u8)]
pub enum WindowsKind {
    /// Import-group sizes for the lexical scope chain (kind 0)
    UsingGroups = 0x00,

    /// Redirect to another method's import information (kind 1)
    ForwardMethodInfo = 0x01,

    /// Redirect to the module-level import information of another method (kind 2)
    ForwardModuleInfo = 0x02,

    /// IL scopes of locals hoisted into a state machine (kind 3)
    StateMachineHoistedLocalScopes = 0x03,

    /// Name of the compiler-generated state machine type (kind 4)
    StateMachineTypeName = 0x04,

    /// Dynamic-type flags for locals and constants (kind 5)
    DynamicLocals = 0x05,

    /// Edit-and-Continue local slot map, opaque to this codec (kind 6)
    EditAndContinueLocalSlotMap = 0x06,

    /// Edit-and-Continue lambda and closure map, opaque to this codec (kind 7)
    EditAndContinueLambdaMap = 0x07,

    /// Tuple element names for locals and constants (kind 8)
    TupleElementNames = 0x08,
}

impl WindowsKind {
    /// Returns true if records of this kind ignore the alignment-size header byte.
    ///
    /// Kinds up to and including [`WindowsKind::DynamicLocals`] were emitted by
    /// producers that never wrote the alignment field, so whatever value the byte
    /// holds is treated as 0 and the payload extends to the end of the record.
    #[must_use]
    pub fn ignores_alignment(&self) -> bool {
        *self as u8 <= WindowsKind::DynamicLocals as u8
    }
}

/// The container-specific identity of a record.
///
/// Legacy records are discriminated by a single kind byte, Portable PDB blobs by a
/// GUID. [`CustomDebugInfo::Unknown`] preserves whichever identity the record came
/// in with so that re-encoding targets the same container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindOrGuid {
    /// A legacy record stream kind byte
    Kind(u8),
    /// A Portable PDB blob identifier
    Guid(Guid),
}

/// A resolved reference to a method, carrying its metadata token and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    /// The `MethodDef` token of the referenced method
    pub token: Token,
    /// The simple name of the referenced method
    pub name: String,
}

impl MethodRef {
    /// Creates a method reference from a token and name.
    #[must_use]
    pub fn new(token: Token, name: impl Into<String>) -> Self {
        MethodRef {
            token,
            name: name.into(),
        }
    }
}

/// A resolved reference to a type, carrying its metadata token and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    /// The metadata token of the referenced type
    pub token: Token,
    /// The name of the referenced type, without a generic-arity suffix
    pub name: String,
}

impl TypeRef {
    /// Creates a type reference from a token and name.
    #[must_use]
    pub fn new(token: Token, name: impl Into<String>) -> Self {
        TypeRef {
            token,
            name: name.into(),
        }
    }
}

/// The IL scope of a single local hoisted into a state machine.
///
/// On the wire a scope of `(0, 0)` is the sentinel for a compiler-synthesized local
/// with no user-visible scope. That encoding is bit-identical to a legitimate scope
/// covering IL offsets `[0, 1)`, and the producing compilers never disambiguated the
/// two. The sentinel is therefore kept as its own variant;
/// [`HoistedScope::best_effort_range`] offers the `[0, 1)` reading without ever
/// substituting it silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoistedScope {
    /// The `(0, 0)` sentinel: a synthesized local without a recorded scope
    Synthesized,

    /// A real IL range
    Range {
        /// First instruction of the scope
        start: InstrRef,
        /// Last bound of the scope, `None` when the scope extends to the end of the body
        end: Option<InstrRef>,
    },
}

impl HoistedScope {
    /// Returns true if this is the synthesized-local sentinel.
    #[must_use]
    pub fn is_synthesized(&self) -> bool {
        matches!(self, HoistedScope::Synthesized)
    }

    /// Returns the scope range, reading the sentinel as a scope over IL offsets `[0, 1)`.
    ///
    /// The sentinel interpretation is best-effort: it only succeeds when the method body
    /// actually has an instruction at offset 0 and a boundary at offset 1. Callers that
    /// need to distinguish a genuine `[0, 1)` scope from the sentinel must match on the
    /// variant instead.
    ///
    /// # Arguments
    /// * `body` - The owning method's instruction offsets
    #[must_use]
    pub fn best_effort_range(
        &self,
        body: &crate::metadata::method::MethodBody,
    ) -> Option<(InstrRef, Option<InstrRef>)> {
        match self {
            HoistedScope::Range { start, end } => Some((*start, *end)),
            HoistedScope::Synthesized => {
                let start = body.instruction_at(0)?;
                let end = body.end_at(1)?;
                Some((start, end))
            }
        }
    }
}

/// Dynamic-type information for one local variable or constant.
///
/// `local = None` marks a constant. The flag sequence holds one byte per type
/// component, at most [`DYNAMIC_FLAG_BYTES`] of them; the name is limited to
/// [`DYNAMIC_NAME_UNITS`] UTF-16 code units by the fixed-size wire field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicLocal {
    /// One flag byte per type component, nonzero marking a dynamic position
    pub flags: Vec<u8>,
    /// The entity name, `None` when suppressed in favor of the local's stored name
    pub name: Option<String>,
    /// The local variable slot, `None` for constants
    pub local: Option<u32>,
}

/// Tuple element names for one local variable or constant.
///
/// A value built by user code carries exactly one of `local` and `scope`. Values
/// decoded from the wire may carry neither: some compilers emitted constants with a
/// local index of 0 instead of the constant marker, and such entries can only be
/// recognized by name mismatch, losing the scope in the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleInfo {
    /// One name per tuple element, empty string for unnamed elements
    pub names: Vec<String>,
    /// The local variable slot holding the tuple, `None` for constants
    pub local: Option<u32>,
    /// The IL scope of a constant, `None` bound meaning "to end of body"
    pub scope: Option<(InstrRef, Option<InstrRef>)>,
    /// The entity name, `None` when suppressed in favor of the local's stored name
    pub name: Option<String>,
}

/// One await expression within an async method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncStep {
    /// The yield instruction inside the owning method
    pub yield_instr: InstrRef,
    /// The method containing the resume instruction
    pub resume_method: MethodRef,
    /// The resume instruction inside `resume_method`
    pub resume: InstrRef,
}

/// A single decoded custom debug information record.
///
/// Both containers decode into this one closed union. Variants that exist in only one
/// container document this; serializing such a variant into the other container is a
/// [`crate::Error::UnsupportedKind`] error rather than silent data loss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomDebugInfo {
    /// Import-group sizes for the lexical scope chain. Legacy container only.
    UsingGroups {
        /// Number of imports in each scope, innermost first
        groups: Vec<u16>,
    },

    /// Redirect to another method's import information. Legacy container only.
    ForwardMethodInfo {
        /// The method whose import information applies here
        method: MethodRef,
    },

    /// Redirect to the module-level import information of another method.
    /// Legacy container only.
    ForwardModuleInfo {
        /// The method whose module-level import information applies here
        method: MethodRef,
    },

    /// IL scopes of locals hoisted into an async or iterator state machine.
    StateMachineHoistedLocalScopes {
        /// One scope per hoisted local, in slot order
        scopes: Vec<HoistedScope>,
    },

    /// Name of the compiler-generated state machine type. Legacy container only.
    StateMachineTypeName {
        /// The nested state machine type
        ty: TypeRef,
    },

    /// Dynamic-type flags for locals and constants. Legacy container only.
    DynamicLocals {
        /// One entry per dynamic local or constant
        locals: Vec<DynamicLocal>,
    },

    /// Edit-and-Continue local slot map, externally specified and kept opaque.
    EditAndContinueLocalSlotMap {
        /// The raw map bytes
        data: Vec<u8>,
    },

    /// Edit-and-Continue lambda and closure map, externally specified and kept opaque.
    EditAndContinueLambdaMap {
        /// The raw map bytes
        data: Vec<u8>,
    },

    /// Tuple element names for locals and constants. Legacy container only.
    TupleElementNames {
        /// One entry per tuple-typed local or constant
        entries: Vec<TupleInfo>,
    },

    /// Tuple element names in the simplified Portable form. Portable container only.
    PortableTupleElementNames {
        /// One name per tuple element, empty string for unnamed elements
        names: Vec<String>,
    },

    /// Await yield and resume points of an async method. Portable container only;
    /// transient, folded into [`crate::metadata::customdebuginformation::AsyncMethod`]
    /// by the surrounding PDB layer.
    AsyncMethodSteppingInfo {
        /// The catch handler the state machine funnels exceptions through
        catch_handler: Option<InstrRef>,
        /// One step per await expression, in source order
        steps: Vec<AsyncStep>,
    },

    /// Default namespace of the compilation. Portable container only.
    DefaultNamespace {
        /// The namespace text
        namespace: String,
    },

    /// Dynamic-type flags in the packed Portable form. Portable container only.
    DynamicLocalVariables {
        /// One flag per type component; the wire format pads the count to a
        /// multiple of 8
        flags: Vec<bool>,
    },

    /// Embedded source file content. Portable container only; the blob is carried
    /// opaquely, decompression is up to the caller.
    EmbeddedSource {
        /// The raw blob, format byte and all
        blob: Vec<u8>,
    },

    /// Source Link mapping document. Portable container only.
    SourceLink {
        /// The raw JSON document bytes
        blob: Vec<u8>,
    },

    /// Kickoff method of an iterator state machine. Produced by symbol-store APIs
    /// rather than either blob container; it has no wire form here and cannot be
    /// serialized.
    IteratorMethod {
        /// The method the iterator state machine was generated from
        kickoff: MethodRef,
    },

    /// A record this implementation does not understand, preserved verbatim.
    Unknown {
        /// The identity the record came in with
        kind_or_guid: KindOrGuid,
        /// The raw payload bytes, excluding any container framing
        data: Vec<u8>,
    },
}

impl CustomDebugInfo {
    /// Returns the variant name, used in diagnostics and error messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            CustomDebugInfo::UsingGroups { .. } => "UsingGroups",
            CustomDebugInfo::ForwardMethodInfo { .. } => "ForwardMethodInfo",
            CustomDebugInfo::ForwardModuleInfo { .. } => "ForwardModuleInfo",
            CustomDebugInfo::StateMachineHoistedLocalScopes { .. } => {
                "StateMachineHoistedLocalScopes"
            }
            CustomDebugInfo::StateMachineTypeName { .. } => "StateMachineTypeName",
            CustomDebugInfo::DynamicLocals { .. } => "DynamicLocals",
            CustomDebugInfo::EditAndContinueLocalSlotMap { .. } => "EditAndContinueLocalSlotMap",
            CustomDebugInfo::EditAndContinueLambdaMap { .. } => "EditAndContinueLambdaMap",
            CustomDebugInfo::TupleElementNames { .. } => "TupleElementNames",
            CustomDebugInfo::PortableTupleElementNames { .. } => "PortableTupleElementNames",
            CustomDebugInfo::AsyncMethodSteppingInfo { .. } => "AsyncMethodSteppingInfo",
            CustomDebugInfo::DefaultNamespace { .. } => "DefaultNamespace",
            CustomDebugInfo::DynamicLocalVariables { .. } => "DynamicLocalVariables",
            CustomDebugInfo::EmbeddedSource { .. } => "EmbeddedSource",
            CustomDebugInfo::SourceLink { .. } => "SourceLink",
            CustomDebugInfo::IteratorMethod { .. } => "IteratorMethod",
            CustomDebugInfo::Unknown { .. } => "Unknown",
        }
    }

    /// Returns the legacy record stream kind of this variant, if it has one.
    #[must_use]
    pub fn windows_kind(&self) -> Option<WindowsKind> {
        match self {
            CustomDebugInfo::UsingGroups { .. } => Some(WindowsKind::UsingGroups),
            CustomDebugInfo::ForwardMethodInfo { .. } => Some(WindowsKind::ForwardMethodInfo),
            CustomDebugInfo::ForwardModuleInfo { .. } => Some(WindowsKind::ForwardModuleInfo),
            CustomDebugInfo::StateMachineHoistedLocalScopes { .. } => {
                Some(WindowsKind::StateMachineHoistedLocalScopes)
            }
            CustomDebugInfo::StateMachineTypeName { .. } => Some(WindowsKind::StateMachineTypeName),
            CustomDebugInfo::DynamicLocals { .. } => Some(WindowsKind::DynamicLocals),
            CustomDebugInfo::EditAndContinueLocalSlotMap { .. } => {
                Some(WindowsKind::EditAndContinueLocalSlotMap)
            }
            CustomDebugInfo::EditAndContinueLambdaMap { .. } => {
                Some(WindowsKind::EditAndContinueLambdaMap)
            }
            CustomDebugInfo::TupleElementNames { .. } => Some(WindowsKind::TupleElementNames),
            _ => None,
        }
    }

    /// Returns the Portable PDB blob identifier of this variant, if it has one.
    #[must_use]
    pub fn portable_guid(&self) -> Option<Guid> {
        match self {
            CustomDebugInfo::StateMachineHoistedLocalScopes { .. } => {
                Some(STATE_MACHINE_HOISTED_LOCAL_SCOPES)
            }
            CustomDebugInfo::EditAndContinueLocalSlotMap { .. } => Some(ENC_LOCAL_SLOT_MAP),
            CustomDebugInfo::EditAndContinueLambdaMap { .. } => Some(ENC_LAMBDA_AND_CLOSURE_MAP),
            CustomDebugInfo::PortableTupleElementNames { .. } => Some(TUPLE_ELEMENT_NAMES),
            CustomDebugInfo::AsyncMethodSteppingInfo { .. } => Some(ASYNC_METHOD_STEPPING_INFO),
            CustomDebugInfo::DefaultNamespace { .. } => Some(DEFAULT_NAMESPACE),
            CustomDebugInfo::DynamicLocalVariables { .. } => Some(DYNAMIC_LOCAL_VARIABLES),
            CustomDebugInfo::EmbeddedSource { .. } => Some(EMBEDDED_SOURCE),
            CustomDebugInfo::SourceLink { .. } => Some(SOURCE_LINK),
            _ => None,
        }
    }

    /// Returns true if this is a record this implementation understands.
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, CustomDebugInfo::Unknown { .. })
    }
}

//! Payload decoders for custom debug information records.
//!
//! Each decoder is a pure function over `(bytes, context)` implementing one row of the
//! kind table. The container layers never interpret payload bytes themselves: the legacy
//! framing in [`crate::metadata::customdebuginformation::windows`] and the blob dispatch
//! in [`crate::metadata::customdebuginformation::portable`] both call into this module.
//!
//! Decoders distinguish two failure classes. A layout violation (bad count, truncated
//! field, invalid string data) is a [`crate::Error::Malformed`] or
//! [`crate::Error::OutOfBounds`]; a reference that does not resolve against the context
//! (an offset without an instruction, a token without a method, a name without a nested
//! type) is a [`crate::Error::UnresolvedReference`]. The containers treat both the same
//! way: the offending record is dropped, the rest of the group survives.

use widestring::U16Str;

use crate::{
    file::parser::Parser,
    metadata::{
        customdebuginformation::{
            context::CdiContext,
            types::{
                AsyncStep, CustomDebugInfo, DynamicLocal, HoistedScope, MethodRef, TupleInfo,
                TypeRef, WindowsKind, DYNAMIC_FLAG_BYTES, DYNAMIC_NAME_UNITS,
            },
        },
        method::InstrRef,
        token::Token,
    },
    Error, Result,
};

/// Decodes one legacy record payload according to its kind byte.
///
/// The payload slice covers everything between the record header and the record end.
/// For kinds that ignore the alignment byte this includes up to 3 zero padding bytes,
/// which self-delimiting decoders tolerate; any other undecoded trailing bytes are a
/// payload error for this record.
///
/// # Arguments
/// * `kind` - The record kind from the framing layer
/// * `payload` - The payload bytes, excluding the 8-byte record header
/// * `ctx` - The decode context of the owning method
///
/// # Errors
/// Returns [`crate::Error::Malformed`] or [`crate::Error::OutOfBounds`] for layout
/// violations and [`crate::Error::UnresolvedReference`] for references that do not
/// resolve. Either error drops this record only.
pub(crate) fn decode_windows_payload(
    kind: WindowsKind,
    payload: &[u8],
    ctx: &CdiContext,
) -> Result<CustomDebugInfo> {
    let mut parser = Parser::new(payload);

    let info = match kind {
        WindowsKind::UsingGroups => decode_using_groups(&mut parser)?,
        WindowsKind::ForwardMethodInfo => {
            let method = decode_forwarded_method(&mut parser, ctx)?;
            CustomDebugInfo::ForwardMethodInfo { method }
        }
        WindowsKind::ForwardModuleInfo => {
            let method = decode_forwarded_method(&mut parser, ctx)?;
            CustomDebugInfo::ForwardModuleInfo { method }
        }
        WindowsKind::StateMachineHoistedLocalScopes => {
            decode_hoisted_scopes_legacy(&mut parser, ctx)?
        }
        WindowsKind::StateMachineTypeName => decode_state_machine_type_name(&mut parser, ctx)?,
        WindowsKind::DynamicLocals => decode_dynamic_locals(&mut parser, ctx)?,
        WindowsKind::EditAndContinueLocalSlotMap => {
            let data = parser.read_bytes(parser.remaining())?.to_vec();
            CustomDebugInfo::EditAndContinueLocalSlotMap { data }
        }
        WindowsKind::EditAndContinueLambdaMap => {
            let data = parser.read_bytes(parser.remaining())?.to_vec();
            CustomDebugInfo::EditAndContinueLambdaMap { data }
        }
        WindowsKind::TupleElementNames => decode_tuple_element_names(&mut parser, ctx)?,
    };

    expect_consumed(&parser, kind.ignores_alignment())?;
    Ok(info)
}

/// Requires the parser to have consumed its entire input.
///
/// Legacy kinds carry their framing padding inside the payload, so up to 3 trailing
/// zero bytes are accepted when `allow_zero_pad` is set.
fn expect_consumed(parser: &Parser, allow_zero_pad: bool) -> Result<()> {
    let remaining = parser.remaining();
    if remaining == 0 {
        return Ok(());
    }

    if allow_zero_pad && remaining <= 3 {
        let tail = &parser.data()[parser.pos()..];
        if tail.iter().all(|byte| *byte == 0) {
            return Ok(());
        }
    }

    Err(malformed_error!(
        "Record payload has {} undecoded trailing bytes",
        remaining
    ))
}

pub(crate) fn decode_using_groups(parser: &mut Parser) -> Result<CustomDebugInfo> {
    let count = parser.read_le::<u16>()?;

    let mut groups = Vec::with_capacity(count as usize);
    for _ in 0..count {
        groups.push(parser.read_le::<u16>()?);
    }

    Ok(CustomDebugInfo::UsingGroups { groups })
}

fn decode_forwarded_method(parser: &mut Parser, ctx: &CdiContext) -> Result<MethodRef> {
    let token = Token::new(parser.read_le::<u32>()?);

    ctx.resolver.method_by_token(token).ok_or_else(|| {
        Error::UnresolvedReference(format!("method token {} has no target", token))
    })
}

pub(crate) fn decode_hoisted_scopes_legacy(
    parser: &mut Parser,
    ctx: &CdiContext,
) -> Result<CustomDebugInfo> {
    let count = parser.read_le::<i32>()?;
    if count < 0 {
        return Err(malformed_error!("Negative hoisted scope count {}", count));
    }

    let mut scopes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let start = parser.read_le::<u32>()?;
        let end_inclusive = parser.read_le::<u32>()?;

        scopes.push(resolve_hoisted_scope(
            start,
            end_inclusive.checked_add(1),
            start == 0 && end_inclusive == 0,
            ctx,
        )?);
    }

    Ok(CustomDebugInfo::StateMachineHoistedLocalScopes { scopes })
}

pub(crate) fn decode_hoisted_scopes_portable(
    parser: &mut Parser,
    ctx: &CdiContext,
) -> Result<CustomDebugInfo> {
    let mut scopes = Vec::new();
    while parser.has_more_data() {
        let start = parser.read_le::<u32>()?;
        let length = parser.read_le::<u32>()?;

        scopes.push(resolve_hoisted_scope(
            start,
            start.checked_add(length),
            start == 0 && length == 0,
            ctx,
        )?);
    }

    Ok(CustomDebugInfo::StateMachineHoistedLocalScopes { scopes })
}

/// Resolves one hoisted scope entry against the owning method body.
///
/// The `(0, 0)` wire encoding is the synthesized-local sentinel in both containers and
/// is kept as such; it is never reinterpreted as a real range here.
fn resolve_hoisted_scope(
    start: u32,
    end_exclusive: Option<u32>,
    is_sentinel: bool,
    ctx: &CdiContext,
) -> Result<HoistedScope> {
    if is_sentinel {
        return Ok(HoistedScope::Synthesized);
    }

    let Some(end_exclusive) = end_exclusive else {
        return Err(malformed_error!("Hoisted scope end offset overflows"));
    };

    let start = ctx.body.instruction_at(start).ok_or_else(|| {
        Error::UnresolvedReference(format!("no instruction starts at scope offset {start}"))
    })?;

    let end = ctx.body.end_at(end_exclusive).ok_or_else(|| {
        Error::UnresolvedReference(format!(
            "no instruction boundary at scope end offset {end_exclusive}"
        ))
    })?;

    Ok(HoistedScope::Range { start, end })
}

pub(crate) fn decode_state_machine_type_name(
    parser: &mut Parser,
    ctx: &CdiContext,
) -> Result<CustomDebugInfo> {
    let name = parser.read_string_utf16()?;
    if name.is_empty() {
        return Err(malformed_error!("State machine type name is empty"));
    }

    let ty = resolve_nested_type(&name, ctx).ok_or_else(|| {
        Error::UnresolvedReference(format!("no nested type matches '{name}'"))
    })?;

    Ok(CustomDebugInfo::StateMachineTypeName { ty })
}

/// Matches a state machine type name against the declaring type's nested types.
///
/// The compiler appends a generic-arity suffix (`` `N ``) to the emitted name that the
/// metadata-level type name does not carry, so a failed exact match is retried with the
/// suffix stripped.
fn resolve_nested_type(name: &str, ctx: &CdiContext) -> Option<TypeRef> {
    if let Some(ty) = ctx.resolver.nested_type_by_name(name) {
        return Some(ty);
    }

    let (stem, arity) = name.rsplit_once('`')?;
    if stem.is_empty() || arity.is_empty() || !arity.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    ctx.resolver.nested_type_by_name(stem)
}

pub(crate) fn decode_dynamic_locals(
    parser: &mut Parser,
    ctx: &CdiContext,
) -> Result<CustomDebugInfo> {
    let count = parser.read_le::<i32>()?;
    if count < 0 {
        return Err(malformed_error!("Negative dynamic local count {}", count));
    }

    let mut locals = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let flag_bytes = parser.read_bytes(DYNAMIC_FLAG_BYTES)?;

        let flags_count = parser.read_le::<i32>()?;
        if flags_count < 0 || flags_count as usize > DYNAMIC_FLAG_BYTES {
            return Err(malformed_error!(
                "Dynamic local flag count {} exceeds the field size of {}",
                flags_count,
                DYNAMIC_FLAG_BYTES
            ));
        }

        let local_index = parser.read_le::<i32>()?;
        if local_index < 0 {
            return Err(malformed_error!(
                "Negative dynamic local slot index {}",
                local_index
            ));
        }

        let name_units = parser.read_bytes(DYNAMIC_NAME_UNITS * 2)?;
        let name = decode_fixed_utf16(name_units)?;

        let flags = flag_bytes[..flags_count as usize].to_vec();
        let (local, name) = classify_slot_reference(local_index as u32, name, ctx);

        locals.push(DynamicLocal { flags, name, local });
    }

    Ok(CustomDebugInfo::DynamicLocals { locals })
}

/// Decodes a fixed-size block of UTF-16 code units, trimming at the first NUL.
fn decode_fixed_utf16(bytes: &[u8]) -> Result<String> {
    let mut units = Vec::with_capacity(bytes.len() / 2);
    for pair in bytes.chunks_exact(2) {
        let unit = u16::from_le_bytes([pair[0], pair[1]]);
        if unit == 0 {
            break;
        }
        units.push(unit);
    }

    match U16Str::from_slice(&units).to_string() {
        Ok(name) => Ok(name),
        Err(_) => Err(malformed_error!("Name field is not valid UTF-16")),
    }
}

/// Applies the suppressed-name and overloaded-zero rules shared by dynamic locals and
/// tuple names.
///
/// An empty wire name means the name was suppressed because it matched the local's
/// stored name, so the stored name is substituted back in. A slot index of 0 is
/// overloaded between "slot 0" and "constant"; a non-empty wire name that does not
/// match slot 0's stored name identifies the constant reading. This is the documented
/// compiler-output heuristic, not an inference of this crate.
fn classify_slot_reference(
    local_index: u32,
    name: String,
    ctx: &CdiContext,
) -> (Option<u32>, Option<String>) {
    if name.is_empty() {
        let stored = ctx.local_by_index(local_index).map(|l| l.name.clone());
        return (Some(local_index), stored);
    }

    if local_index == 0 {
        let matches_slot = ctx
            .local_by_index(0)
            .is_some_and(|local| local.name == name);
        if !matches_slot {
            return (None, Some(name));
        }
    }

    (Some(local_index), Some(name))
}

pub(crate) fn decode_tuple_element_names(
    parser: &mut Parser,
    ctx: &CdiContext,
) -> Result<CustomDebugInfo> {
    let count = parser.read_le::<i32>()?;
    if count < 0 {
        return Err(malformed_error!("Negative tuple entry count {}", count));
    }

    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name_count = parser.read_le::<i32>()?;
        if name_count < 0 {
            return Err(malformed_error!(
                "Negative tuple element name count {}",
                name_count
            ));
        }

        let mut names = Vec::with_capacity(name_count as usize);
        for _ in 0..name_count {
            names.push(parser.read_string_utf8()?);
        }

        let local_index = parser.read_le::<i32>()?;
        let entry = if local_index == -1 {
            let scope_start = parser.read_le::<u32>()?;
            let scope_end = parser.read_le::<u32>()?;

            let start = ctx.body.instruction_at(scope_start).ok_or_else(|| {
                Error::UnresolvedReference(format!(
                    "no instruction starts at tuple scope offset {scope_start}"
                ))
            })?;
            let end = ctx.body.end_at(scope_end).ok_or_else(|| {
                Error::UnresolvedReference(format!(
                    "no instruction boundary at tuple scope end offset {scope_end}"
                ))
            })?;

            let name = parser.read_string_utf8()?;
            TupleInfo {
                names,
                local: None,
                scope: Some((start, end)),
                name: if name.is_empty() { None } else { Some(name) },
            }
        } else if local_index >= 0 {
            let name = parser.read_string_utf8()?;
            let (local, name) = classify_slot_reference(local_index as u32, name, ctx);
            TupleInfo {
                names,
                local,
                scope: None,
                name,
            }
        } else {
            return Err(malformed_error!(
                "Invalid tuple local slot index {}",
                local_index
            ));
        };

        entries.push(entry);
    }

    Ok(CustomDebugInfo::TupleElementNames { entries })
}

pub(crate) fn decode_portable_tuple_names(parser: &mut Parser) -> Result<CustomDebugInfo> {
    let mut names = Vec::new();
    while parser.has_more_data() {
        names.push(parser.read_string_utf8()?);
    }

    Ok(CustomDebugInfo::PortableTupleElementNames { names })
}

pub(crate) fn decode_async_stepping_info(
    parser: &mut Parser,
    ctx: &CdiContext,
) -> Result<CustomDebugInfo> {
    let catch_plus_one = parser.read_le::<u32>()?;
    let catch_handler = if catch_plus_one == 0 {
        None
    } else {
        let offset = catch_plus_one - 1;
        let instr = ctx.body.instruction_at(offset).ok_or_else(|| {
            Error::UnresolvedReference(format!(
                "no instruction starts at catch handler offset {offset}"
            ))
        })?;
        Some(instr)
    };

    let mut steps = Vec::new();
    while parser.has_more_data() {
        let yield_offset = parser.read_le::<u32>()?;
        let resume_offset = parser.read_le::<u32>()?;
        let resume_rid = parser.read_compressed_uint()?;

        let yield_instr = ctx.body.instruction_at(yield_offset).ok_or_else(|| {
            Error::UnresolvedReference(format!(
                "no instruction starts at yield offset {yield_offset}"
            ))
        })?;

        let resume_method = if resume_rid == ctx.method.token.row() {
            ctx.method.clone()
        } else {
            ctx.resolver.method_by_rid(resume_rid).ok_or_else(|| {
                Error::UnresolvedReference(format!("resume method row {resume_rid} has no target"))
            })?
        };

        let resume = resolve_resume_point(resume_offset, &resume_method, ctx)?;

        steps.push(AsyncStep {
            yield_instr,
            resume_method,
            resume,
        });
    }

    Ok(CustomDebugInfo::AsyncMethodSteppingInfo {
        catch_handler,
        steps,
    })
}

/// Resolves a resume offset inside the resume method's body.
///
/// The resume method is usually the owning method itself; only then can the context's
/// own body be used. Otherwise the resolver must supply the other method's body, and
/// the returned handle indexes into that body.
fn resolve_resume_point(
    offset: u32,
    resume_method: &MethodRef,
    ctx: &CdiContext,
) -> Result<InstrRef> {
    if resume_method.token == ctx.method.token {
        return ctx.body.instruction_at(offset).ok_or_else(|| {
            Error::UnresolvedReference(format!("no instruction starts at resume offset {offset}"))
        });
    }

    let body = ctx.resolver.method_body(resume_method).ok_or_else(|| {
        Error::UnresolvedReference(format!(
            "no body available for resume method {}",
            resume_method.token
        ))
    })?;

    body.instruction_at(offset).ok_or_else(|| {
        Error::UnresolvedReference(format!(
            "no instruction starts at resume offset {offset} in method {}",
            resume_method.token
        ))
    })
}

pub(crate) fn decode_dynamic_local_variables(payload: &[u8]) -> CustomDebugInfo {
    let mut flags = Vec::with_capacity(payload.len() * 8);
    for byte in payload {
        for bit in (0..8).rev() {
            flags.push((byte >> bit) & 1 != 0);
        }
    }

    CustomDebugInfo::DynamicLocalVariables { flags }
}

pub(crate) fn decode_default_namespace(payload: &[u8]) -> Result<CustomDebugInfo> {
    match String::from_utf8(payload.to_vec()) {
        Ok(namespace) => Ok(CustomDebugInfo::DefaultNamespace { namespace }),
        Err(_) => Err(malformed_error!("Default namespace is not valid UTF-8")),
    }
}

//! Payload encoders for custom debug information records.
//!
//! Each encoder is the inverse of its decoder in
//! [`crate::metadata::customdebuginformation::parser`] and appends payload bytes only;
//! record headers, padding, and blob framing belong to the container layers. Unlike
//! decoding, encoding has no drop semantics: every failure here is a hard error, raised
//! before the container commits any bytes for the record.
//!
//! Instruction references are turned back into IL offsets through the context's method
//! body. A reference that does not belong to the body it is encoded against is a
//! [`crate::Error::DetachedInstruction`] contract violation, never a silent zero.

use crate::{
    file::writer::Writer,
    metadata::{
        customdebuginformation::{
            context::CdiContext,
            types::{
                AsyncStep, CustomDebugInfo, DynamicLocal, HoistedScope, KindOrGuid, TupleInfo,
                TypeRef, DYNAMIC_FLAG_BYTES, DYNAMIC_NAME_UNITS,
            },
        },
        method::InstrRef,
    },
    Error, Result,
};

/// Encodes one legacy record payload for a variant that has a legacy wire form.
///
/// The caller has already emitted the 8-byte record header placeholder; this function
/// appends payload bytes only. Variants without a legacy kind byte are an
/// [`crate::Error::UnsupportedKind`] error.
///
/// # Arguments
/// * `info` - The record to encode
/// * `writer` - The destination buffer, positioned after the record header
/// * `ctx` - The encode context of the owning method
///
/// # Errors
/// Returns [`crate::Error::UnsupportedKind`] for variants foreign to the legacy
/// container, [`crate::Error::DetachedInstruction`] for instruction references outside
/// the owning body, and the per-field contract errors documented on the field writers.
pub(crate) fn encode_windows_payload(
    info: &CustomDebugInfo,
    writer: &mut Writer,
    ctx: &CdiContext,
) -> Result<()> {
    match info {
        CustomDebugInfo::UsingGroups { groups } => encode_using_groups(groups, writer),
        CustomDebugInfo::ForwardMethodInfo { method }
        | CustomDebugInfo::ForwardModuleInfo { method } => {
            writer.write_le(method.token.value());
            Ok(())
        }
        CustomDebugInfo::StateMachineHoistedLocalScopes { scopes } => {
            encode_hoisted_scopes_legacy(scopes, writer, ctx)
        }
        CustomDebugInfo::StateMachineTypeName { ty } => {
            encode_state_machine_type_name(ty, writer)
        }
        CustomDebugInfo::DynamicLocals { locals } => encode_dynamic_locals(locals, writer, ctx),
        CustomDebugInfo::EditAndContinueLocalSlotMap { data }
        | CustomDebugInfo::EditAndContinueLambdaMap { data } => {
            writer.write_bytes(data);
            Ok(())
        }
        CustomDebugInfo::TupleElementNames { entries } => {
            encode_tuple_element_names(entries, writer, ctx)
        }
        CustomDebugInfo::Unknown {
            kind_or_guid: KindOrGuid::Kind(_),
            data,
        } => {
            writer.write_bytes(data);
            Ok(())
        }
        other => Err(Error::UnsupportedKind(other.name())),
    }
}

fn encode_using_groups(groups: &[u16], writer: &mut Writer) -> Result<()> {
    let count = u16::try_from(groups.len()).map_err(|_| {
        malformed_error!("{} using groups exceed the u16 count field", groups.len())
    })?;

    writer.write_le(count);
    for group in groups {
        writer.write_le(*group);
    }

    Ok(())
}

fn encode_hoisted_scopes_legacy(
    scopes: &[HoistedScope],
    writer: &mut Writer,
    ctx: &CdiContext,
) -> Result<()> {
    writer.write_le(count_field(scopes.len(), "hoisted scope")?);

    for scope in scopes {
        match scope {
            HoistedScope::Synthesized => {
                writer.write_le(0u32);
                writer.write_le(0u32);
            }
            HoistedScope::Range { start, end } => {
                let start_offset = ctx.body.offset_for(Some(*start), false)?;
                let end_exclusive = ctx.body.offset_for(*end, true)?;
                let end_inclusive = end_exclusive.checked_sub(1).ok_or_else(|| {
                    malformed_error!("Hoisted scope end offset {} precedes offset 1", end_exclusive)
                })?;

                writer.write_le(start_offset);
                writer.write_le(end_inclusive);
            }
        }
    }

    Ok(())
}

/// Encodes hoisted scopes in the Portable `(start, length)` form.
///
/// The blob carries no count; the container derives it from the blob length.
pub(crate) fn encode_hoisted_scopes_portable(
    scopes: &[HoistedScope],
    writer: &mut Writer,
    ctx: &CdiContext,
) -> Result<()> {
    for scope in scopes {
        match scope {
            HoistedScope::Synthesized => {
                writer.write_le(0u32);
                writer.write_le(0u32);
            }
            HoistedScope::Range { start, end } => {
                let start_offset = ctx.body.offset_for(Some(*start), false)?;
                let end_exclusive = ctx.body.offset_for(*end, true)?;
                let length = end_exclusive.checked_sub(start_offset).ok_or_else(|| {
                    malformed_error!(
                        "Hoisted scope end offset {} precedes its start offset {}",
                        end_exclusive,
                        start_offset
                    )
                })?;

                writer.write_le(start_offset);
                writer.write_le(length);
            }
        }
    }

    Ok(())
}

fn encode_state_machine_type_name(ty: &TypeRef, writer: &mut Writer) -> Result<()> {
    if ty.name.is_empty() {
        return Err(malformed_error!("State machine type name is empty"));
    }

    writer.write_string_utf16(&ty.name)
}

fn encode_dynamic_locals(
    locals: &[DynamicLocal],
    writer: &mut Writer,
    ctx: &CdiContext,
) -> Result<()> {
    writer.write_le(count_field(locals.len(), "dynamic local")?);

    for local in locals {
        if local.flags.len() > DYNAMIC_FLAG_BYTES {
            return Err(Error::FlagsTooLong {
                len: local.flags.len(),
                max: DYNAMIC_FLAG_BYTES,
            });
        }

        writer.write_bytes(&local.flags);
        for _ in local.flags.len()..DYNAMIC_FLAG_BYTES {
            writer.write_le(0u8);
        }

        writer.write_le(local.flags.len() as i32);
        writer.write_le(slot_field(local.local.unwrap_or(0))?);

        let name = suppressible_name(local.local, local.name.as_deref(), ctx);
        writer.write_utf16_fixed(name, DYNAMIC_NAME_UNITS)?;
    }

    Ok(())
}

fn encode_tuple_element_names(
    entries: &[TupleInfo],
    writer: &mut Writer,
    ctx: &CdiContext,
) -> Result<()> {
    writer.write_le(count_field(entries.len(), "tuple entry")?);

    for entry in entries {
        writer.write_le(count_field(entry.names.len(), "tuple element name")?);
        for name in &entry.names {
            writer.write_string_utf8(name)?;
        }

        match (entry.local, &entry.scope) {
            (Some(_), Some(_)) => {
                return Err(malformed_error!(
                    "Tuple entry carries both a local slot and a constant scope"
                ));
            }
            (None, Some((start, end))) => {
                writer.write_le(-1i32);
                writer.write_le(ctx.body.offset_for(Some(*start), false)?);
                writer.write_le(ctx.body.offset_for(*end, true)?);
                writer.write_string_utf8(entry.name.as_deref().unwrap_or_default())?;
            }
            // Entries with neither slot nor scope re-encode in the historical
            // zero-slot form they were decoded from.
            (local, None) => {
                writer.write_le(slot_field(local.unwrap_or(0))?);
                let name = suppressible_name(local, entry.name.as_deref(), ctx);
                writer.write_string_utf8(name)?;
            }
        }
    }

    Ok(())
}

/// Encodes tuple element names in the simplified Portable form.
pub(crate) fn encode_portable_tuple_names(names: &[String], writer: &mut Writer) -> Result<()> {
    for name in names {
        writer.write_string_utf8(name)?;
    }

    Ok(())
}

/// Encodes an async stepping blob: the catch handler word followed by one
/// `(yield, resume, rid)` triple per step.
pub(crate) fn encode_async_stepping_info(
    catch_handler: Option<InstrRef>,
    steps: &[AsyncStep],
    writer: &mut Writer,
    ctx: &CdiContext,
) -> Result<()> {
    match catch_handler {
        None => writer.write_le(0u32),
        Some(instr) => {
            let offset = ctx.body.offset_for(Some(instr), false)?;
            let plus_one = offset
                .checked_add(1)
                .ok_or_else(|| malformed_error!("Catch handler offset {} overflows", offset))?;
            writer.write_le(plus_one);
        }
    }

    for step in steps {
        writer.write_le(ctx.body.offset_for(Some(step.yield_instr), false)?);

        let resume_offset = if step.resume_method.token == ctx.method.token {
            ctx.body.offset_for(Some(step.resume), false)?
        } else {
            let body = ctx.resolver.method_body(&step.resume_method).ok_or_else(|| {
                Error::UnresolvedReference(format!(
                    "no body available for resume method {}",
                    step.resume_method.token
                ))
            })?;
            body.offset_for(Some(step.resume), false)?
        };

        writer.write_le(resume_offset);
        writer.write_compressed_uint(step.resume_method.token.row())?;
    }

    Ok(())
}

/// Packs dynamic-local flags into bytes, most significant bit first.
///
/// The count is not stored; a decoder recovers `8 * blob_len` flags, so encoding rounds
/// the count up to a multiple of 8 with cleared bits.
pub(crate) fn encode_dynamic_local_variables(flags: &[bool], writer: &mut Writer) {
    for chunk in flags.chunks(8) {
        let mut byte = 0u8;
        for (bit, flag) in chunk.iter().enumerate() {
            if *flag {
                byte |= 1 << (7 - bit);
            }
        }
        writer.write_le(byte);
    }
}

/// Picks the name to put on the wire, suppressing it when it matches the stored name of
/// the referenced local slot. Decoding reverses the suppression through the same table.
fn suppressible_name<'a>(
    local: Option<u32>,
    name: Option<&'a str>,
    ctx: &CdiContext,
) -> &'a str {
    let Some(name) = name else {
        return "";
    };

    if let Some(index) = local {
        if ctx.local_by_index(index).is_some_and(|l| l.name == name) {
            return "";
        }
    }

    name
}

fn count_field(len: usize, what: &str) -> Result<i32> {
    i32::try_from(len)
        .map_err(|_| malformed_error!("{} {} entries exceed the i32 count field", len, what))
}

fn slot_field(index: u32) -> Result<i32> {
    i32::try_from(index)
        .map_err(|_| malformed_error!("Local slot index {} exceeds the i32 field", index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        file::parser::Parser,
        metadata::{
            customdebuginformation::{
                context::{LocalVar, NullResolver},
                parser::{
                    decode_async_stepping_info, decode_dynamic_local_variables,
                    decode_hoisted_scopes_portable, decode_windows_payload,
                },
                types::{MethodRef, WindowsKind},
            },
            method::MethodBody,
            token::Token,
        },
        test::FixedResolver,
    };

    fn body() -> MethodBody {
        MethodBody::new(vec![0, 2, 5, 9], 12).unwrap()
    }

    fn owner() -> MethodRef {
        MethodRef::new(Token::new(0x0600_0001), "MoveNext")
    }

    #[test]
    fn test_encode_using_groups_layout() {
        let body = body();
        let resolver = NullResolver;
        let ctx = CdiContext::new(owner(), &body, &[], &resolver);

        let info = CustomDebugInfo::UsingGroups {
            groups: vec![3, 1, 0],
        };

        let mut writer = Writer::new();
        encode_windows_payload(&info, &mut writer, &ctx).unwrap();
        assert_eq!(
            writer.as_slice(),
            &[0x03, 0x00, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_encode_forward_method_token() {
        let body = body();
        let resolver = NullResolver;
        let ctx = CdiContext::new(owner(), &body, &[], &resolver);

        let info = CustomDebugInfo::ForwardMethodInfo {
            method: MethodRef::new(Token::new(0x0600_0007), "Target"),
        };

        let mut writer = Writer::new();
        encode_windows_payload(&info, &mut writer, &ctx).unwrap();
        assert_eq!(writer.as_slice(), &0x0600_0007u32.to_le_bytes());
    }

    #[test]
    fn test_encode_hoisted_scopes_legacy_layout() {
        let body = body();
        let resolver = NullResolver;
        let ctx = CdiContext::new(owner(), &body, &[], &resolver);

        let start = body.instruction_at(2).unwrap();
        let end = body.instruction_at(9).unwrap();
        let info = CustomDebugInfo::StateMachineHoistedLocalScopes {
            scopes: vec![
                HoistedScope::Synthesized,
                // [2, 9) encodes as start 2, inclusive end 8
                HoistedScope::Range {
                    start,
                    end: Some(end),
                },
                // Open end encodes as code size minus 1
                HoistedScope::Range { start, end: None },
            ],
        };

        let mut writer = Writer::new();
        encode_windows_payload(&info, &mut writer, &ctx).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(&3i32.to_le_bytes());
        expected.extend_from_slice(&0u32.to_le_bytes());
        expected.extend_from_slice(&0u32.to_le_bytes());
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice(&8u32.to_le_bytes());
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice(&11u32.to_le_bytes());
        assert_eq!(writer.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_encode_hoisted_scope_detached_instruction() {
        let body = body();
        let foreign_body = MethodBody::new(vec![0, 1, 2, 3, 4, 6], 8).unwrap();
        let resolver = NullResolver;
        let ctx = CdiContext::new(owner(), &body, &[], &resolver);

        let detached = foreign_body.instruction_at(6).unwrap();
        let info = CustomDebugInfo::StateMachineHoistedLocalScopes {
            scopes: vec![HoistedScope::Range {
                start: detached,
                end: None,
            }],
        };

        let mut writer = Writer::new();
        assert!(matches!(
            encode_windows_payload(&info, &mut writer, &ctx),
            Err(Error::DetachedInstruction(5))
        ));
    }

    #[test]
    fn test_encode_hoisted_scopes_portable_roundtrip() {
        let body = body();
        let resolver = NullResolver;
        let ctx = CdiContext::new(owner(), &body, &[], &resolver);

        let scopes = vec![
            HoistedScope::Synthesized,
            HoistedScope::Range {
                start: body.instruction_at(2).unwrap(),
                end: Some(body.instruction_at(5).unwrap()),
            },
            HoistedScope::Range {
                start: body.instruction_at(5).unwrap(),
                end: None,
            },
        ];

        let mut writer = Writer::new();
        encode_hoisted_scopes_portable(&scopes, &mut writer, &ctx).unwrap();

        let blob = writer.into_vec();
        assert_eq!(&blob[8..12], &2u32.to_le_bytes());
        assert_eq!(&blob[12..16], &3u32.to_le_bytes());

        let mut parser = Parser::new(&blob);
        let decoded = decode_hoisted_scopes_portable(&mut parser, &ctx).unwrap();
        assert_eq!(
            decoded,
            CustomDebugInfo::StateMachineHoistedLocalScopes { scopes }
        );
    }

    #[test]
    fn test_encode_state_machine_type_name_rejects_empty() {
        let body = body();
        let resolver = NullResolver;
        let ctx = CdiContext::new(owner(), &body, &[], &resolver);

        let info = CustomDebugInfo::StateMachineTypeName {
            ty: TypeRef::new(Token::new(0x0200_0002), ""),
        };

        let mut writer = Writer::new();
        assert!(matches!(
            encode_windows_payload(&info, &mut writer, &ctx),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn test_encode_dynamic_locals_roundtrip_with_suppression() {
        let body = body();
        let locals = [LocalVar::new(2, "dynamicLocal")];
        let resolver = NullResolver;
        let ctx = CdiContext::new(owner(), &body, &locals, &resolver);

        let info = CustomDebugInfo::DynamicLocals {
            locals: vec![DynamicLocal {
                flags: vec![1, 0, 1],
                name: Some("dynamicLocal".to_string()),
                local: Some(2),
            }],
        };

        let mut writer = Writer::new();
        encode_windows_payload(&info, &mut writer, &ctx).unwrap();
        let payload = writer.into_vec();

        // Name suppressed: the fixed 128-byte field is all zeros
        let name_field = &payload[4 + 64 + 4 + 4..];
        assert_eq!(name_field.len(), 128);
        assert!(name_field.iter().all(|byte| *byte == 0));

        let decoded = decode_windows_payload(WindowsKind::DynamicLocals, &payload, &ctx).unwrap();
        assert_eq!(decoded, info);
    }

    #[test]
    fn test_encode_dynamic_locals_flags_too_long() {
        let body = body();
        let resolver = NullResolver;
        let ctx = CdiContext::new(owner(), &body, &[], &resolver);

        let info = CustomDebugInfo::DynamicLocals {
            locals: vec![DynamicLocal {
                flags: vec![1; 65],
                name: Some("x".to_string()),
                local: Some(0),
            }],
        };

        let mut writer = Writer::new();
        assert!(matches!(
            encode_windows_payload(&info, &mut writer, &ctx),
            Err(Error::FlagsTooLong { len: 65, max: 64 })
        ));
    }

    #[test]
    fn test_encode_dynamic_local_name_too_long() {
        let body = body();
        let resolver = NullResolver;
        let ctx = CdiContext::new(owner(), &body, &[], &resolver);

        let info = CustomDebugInfo::DynamicLocals {
            locals: vec![DynamicLocal {
                flags: vec![1],
                name: Some("n".repeat(65)),
                local: Some(0),
            }],
        };

        let mut writer = Writer::new();
        assert!(matches!(
            encode_windows_payload(&info, &mut writer, &ctx),
            Err(Error::NameTooLong { len: 65, max: 64 })
        ));
    }

    #[test]
    fn test_encode_tuple_constant_roundtrip() {
        let body = body();
        let resolver = NullResolver;
        let ctx = CdiContext::new(owner(), &body, &[], &resolver);

        let info = CustomDebugInfo::TupleElementNames {
            entries: vec![TupleInfo {
                names: vec!["Item1".to_string(), String::new()],
                local: None,
                scope: Some((body.instruction_at(2).unwrap(), None)),
                name: Some("pair".to_string()),
            }],
        };

        let mut writer = Writer::new();
        encode_windows_payload(&info, &mut writer, &ctx).unwrap();
        let payload = writer.into_vec();

        let decoded =
            decode_windows_payload(WindowsKind::TupleElementNames, &payload, &ctx).unwrap();
        assert_eq!(decoded, info);
    }

    #[test]
    fn test_encode_tuple_rejects_local_and_scope() {
        let body = body();
        let resolver = NullResolver;
        let ctx = CdiContext::new(owner(), &body, &[], &resolver);

        let info = CustomDebugInfo::TupleElementNames {
            entries: vec![TupleInfo {
                names: vec!["a".to_string()],
                local: Some(1),
                scope: Some((body.instruction_at(0).unwrap(), None)),
                name: Some("both".to_string()),
            }],
        };

        let mut writer = Writer::new();
        assert!(matches!(
            encode_windows_payload(&info, &mut writer, &ctx),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn test_encode_tuple_name_embedded_nul() {
        let body = body();
        let resolver = NullResolver;
        let ctx = CdiContext::new(owner(), &body, &[], &resolver);

        let info = CustomDebugInfo::TupleElementNames {
            entries: vec![TupleInfo {
                names: vec!["a\0b".to_string()],
                local: Some(1),
                scope: None,
                name: Some("t".to_string()),
            }],
        };

        let mut writer = Writer::new();
        assert!(matches!(
            encode_windows_payload(&info, &mut writer, &ctx),
            Err(Error::EmbeddedNul)
        ));
    }

    #[test]
    fn test_encode_async_stepping_roundtrip() {
        let resolver = FixedResolver::default()
            .with_method(0x0600_0002, "MoveNext")
            .with_body(0x0600_0002, MethodBody::new(vec![0, 3], 6).unwrap());
        let resume_body = MethodBody::new(vec![0, 3], 6).unwrap();
        let body = body();
        let ctx = CdiContext::new(owner(), &body, &[], &resolver);

        let info = CustomDebugInfo::AsyncMethodSteppingInfo {
            catch_handler: Some(body.instruction_at(2).unwrap()),
            steps: vec![AsyncStep {
                yield_instr: body.instruction_at(5).unwrap(),
                resume_method: MethodRef::new(Token::new(0x0600_0002), "MoveNext"),
                resume: resume_body.instruction_at(3).unwrap(),
            }],
        };

        let CustomDebugInfo::AsyncMethodSteppingInfo {
            catch_handler,
            steps,
        } = &info
        else {
            unreachable!()
        };

        let mut writer = Writer::new();
        encode_async_stepping_info(*catch_handler, steps, &mut writer, &ctx).unwrap();

        let blob = writer.into_vec();
        assert_eq!(&blob[0..4], &3u32.to_le_bytes());
        assert_eq!(&blob[4..8], &5u32.to_le_bytes());
        assert_eq!(&blob[8..12], &3u32.to_le_bytes());
        assert_eq!(blob[12], 0x02);

        let mut parser = Parser::new(&blob);
        let decoded = decode_async_stepping_info(&mut parser, &ctx).unwrap();
        assert_eq!(decoded, info);
    }

    #[test]
    fn test_encode_async_stepping_no_catch_handler() {
        let body = body();
        let resolver = NullResolver;
        let ctx = CdiContext::new(owner(), &body, &[], &resolver);

        let mut writer = Writer::new();
        encode_async_stepping_info(None, &[], &mut writer, &ctx).unwrap();
        assert_eq!(writer.as_slice(), &0u32.to_le_bytes());
    }

    #[test]
    fn test_encode_dynamic_local_variables_bit_order() {
        let mut writer = Writer::new();
        encode_dynamic_local_variables(&[true, false, true], &mut writer);
        assert_eq!(writer.as_slice(), &[0b1010_0000]);

        let decoded = decode_dynamic_local_variables(writer.as_slice());
        let CustomDebugInfo::DynamicLocalVariables { flags } = decoded else {
            panic!("unexpected variant");
        };
        // Count is padded to a byte boundary
        assert_eq!(flags.len(), 8);
        assert_eq!(&flags[..3], &[true, false, true]);
        assert!(flags[3..].iter().all(|flag| !flag));
    }

    #[test]
    fn test_encode_unknown_kind_passthrough() {
        let body = body();
        let resolver = NullResolver;
        let ctx = CdiContext::new(owner(), &body, &[], &resolver);

        let info = CustomDebugInfo::Unknown {
            kind_or_guid: KindOrGuid::Kind(250),
            data: vec![1, 2, 3, 4, 5, 6],
        };

        let mut writer = Writer::new();
        encode_windows_payload(&info, &mut writer, &ctx).unwrap();
        assert_eq!(writer.as_slice(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_encode_portable_variant_in_windows_container() {
        let body = body();
        let resolver = NullResolver;
        let ctx = CdiContext::new(owner(), &body, &[], &resolver);

        let info = CustomDebugInfo::SourceLink { blob: vec![] };

        let mut writer = Writer::new();
        assert!(matches!(
            encode_windows_payload(&info, &mut writer, &ctx),
            Err(Error::UnsupportedKind("SourceLink"))
        ));
    }
}

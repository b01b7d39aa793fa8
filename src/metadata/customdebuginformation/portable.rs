//! Portable PDB custom debug information blob codec.
//!
//! In Portable PDBs there is no record stream: each record is one row of the
//! `CustomDebugInformation` table, identified by a GUID and carrying an unframed blob.
//! This module maps a `(guid, blob)` pair to and from a
//! [`CustomDebugInfo`] value; walking the table and owning the heaps is the caller's
//! job.
//!
//! A blob is a single record, so there is no partial-success story here: a fault
//! decoding the blob is returned to the caller, who drops that row and keeps going.
//! Unknown GUIDs are not faults; they decode to [`CustomDebugInfo::Unknown`] and
//! re-encode byte for byte.

use uguid::Guid;

use crate::{
    file::{parser::Parser, writer::Writer},
    metadata::{
        customdebuginformation::{
            context::CdiContext,
            parser::{
                decode_async_stepping_info, decode_default_namespace,
                decode_dynamic_local_variables, decode_hoisted_scopes_portable,
                decode_portable_tuple_names,
            },
            types::{
                CustomDebugInfo, KindOrGuid, ASYNC_METHOD_STEPPING_INFO, DEFAULT_NAMESPACE,
                DYNAMIC_LOCAL_VARIABLES, EMBEDDED_SOURCE, ENC_LAMBDA_AND_CLOSURE_MAP,
                ENC_LOCAL_SLOT_MAP, SOURCE_LINK, STATE_MACHINE_HOISTED_LOCAL_SCOPES,
                TUPLE_ELEMENT_NAMES,
            },
            writer::{
                encode_async_stepping_info, encode_dynamic_local_variables,
                encode_hoisted_scopes_portable, encode_portable_tuple_names,
            },
        },
        diagnostics::DiagnosticCategory,
    },
    Error, Result,
};

/// Decodes one Portable PDB custom debug information blob.
///
/// # Arguments
/// * `guid` - The record identifier from the `CustomDebugInformation` row
/// * `blob` - The unframed blob bytes
/// * `ctx` - The decode context of the owning method
///
/// # Errors
/// Returns [`crate::Error::Malformed`] or [`crate::Error::OutOfBounds`] for layout
/// violations and [`crate::Error::UnresolvedReference`] for references that do not
/// resolve against the context. The blob is one record; on error the caller drops
/// the row and continues with the next one.
///
/// # Examples
///
/// ```rust
/// use dotpdb::metadata::customdebuginformation::{
///     read_portable_debug_info, CdiContext, CustomDebugInfo, MethodRef, NullResolver,
///     STATE_MACHINE_HOISTED_LOCAL_SCOPES,
/// };
/// use dotpdb::metadata::{method::MethodBody, token::Token};
///
/// let body = MethodBody::new(vec![0, 4, 8], 12)?;
/// let resolver = NullResolver;
/// let ctx = CdiContext::new(
///     MethodRef::new(Token::new(0x0600_0001), "MoveNext"),
///     &body,
///     &[],
///     &resolver,
/// );
///
/// // Two (start, length) scope entries
/// let blob = [4, 0, 0, 0, 4, 0, 0, 0, 8, 0, 0, 0, 4, 0, 0, 0];
/// let info = read_portable_debug_info(&STATE_MACHINE_HOISTED_LOCAL_SCOPES, &blob, &ctx)?;
/// assert!(matches!(
///     info,
///     CustomDebugInfo::StateMachineHoistedLocalScopes { ref scopes } if scopes.len() == 2
/// ));
/// # Ok::<(), dotpdb::Error>(())
/// ```
pub fn read_portable_debug_info(
    guid: &Guid,
    blob: &[u8],
    ctx: &CdiContext,
) -> Result<CustomDebugInfo> {
    if *guid == STATE_MACHINE_HOISTED_LOCAL_SCOPES {
        let mut parser = Parser::new(blob);
        decode_hoisted_scopes_portable(&mut parser, ctx)
    } else if *guid == DYNAMIC_LOCAL_VARIABLES {
        Ok(decode_dynamic_local_variables(blob))
    } else if *guid == DEFAULT_NAMESPACE {
        decode_default_namespace(blob)
    } else if *guid == ENC_LOCAL_SLOT_MAP {
        Ok(CustomDebugInfo::EditAndContinueLocalSlotMap {
            data: blob.to_vec(),
        })
    } else if *guid == ENC_LAMBDA_AND_CLOSURE_MAP {
        Ok(CustomDebugInfo::EditAndContinueLambdaMap {
            data: blob.to_vec(),
        })
    } else if *guid == TUPLE_ELEMENT_NAMES {
        let mut parser = Parser::new(blob);
        decode_portable_tuple_names(&mut parser)
    } else if *guid == EMBEDDED_SOURCE {
        Ok(CustomDebugInfo::EmbeddedSource {
            blob: blob.to_vec(),
        })
    } else if *guid == SOURCE_LINK {
        Ok(CustomDebugInfo::SourceLink {
            blob: blob.to_vec(),
        })
    } else if *guid == ASYNC_METHOD_STEPPING_INFO {
        let mut parser = Parser::new(blob);
        decode_async_stepping_info(&mut parser, ctx)
    } else {
        if let Some(diagnostics) = ctx.diagnostics {
            diagnostics.info(
                DiagnosticCategory::UnknownKind,
                format!("Unknown record GUID {guid}, preserved verbatim"),
            );
        }
        Ok(CustomDebugInfo::Unknown {
            kind_or_guid: KindOrGuid::Guid(*guid),
            data: blob.to_vec(),
        })
    }
}

/// Encodes one record as a Portable PDB `(guid, blob)` pair.
///
/// # Arguments
/// * `info` - The record to encode
/// * `ctx` - The encode context of the owning method
///
/// # Errors
/// Returns [`crate::Error::UnsupportedKind`] if the variant has no Portable wire
/// form, and any contract error raised while resolving instruction references or
/// writing payload fields.
pub fn write_portable_debug_info(
    info: &CustomDebugInfo,
    ctx: &CdiContext,
) -> Result<(Guid, Vec<u8>)> {
    let mut writer = Writer::new();

    let guid = match info {
        CustomDebugInfo::StateMachineHoistedLocalScopes { scopes } => {
            encode_hoisted_scopes_portable(scopes, &mut writer, ctx)?;
            STATE_MACHINE_HOISTED_LOCAL_SCOPES
        }
        CustomDebugInfo::DynamicLocalVariables { flags } => {
            encode_dynamic_local_variables(flags, &mut writer);
            DYNAMIC_LOCAL_VARIABLES
        }
        CustomDebugInfo::DefaultNamespace { namespace } => {
            writer.write_bytes(namespace.as_bytes());
            DEFAULT_NAMESPACE
        }
        CustomDebugInfo::EditAndContinueLocalSlotMap { data } => {
            writer.write_bytes(data);
            ENC_LOCAL_SLOT_MAP
        }
        CustomDebugInfo::EditAndContinueLambdaMap { data } => {
            writer.write_bytes(data);
            ENC_LAMBDA_AND_CLOSURE_MAP
        }
        CustomDebugInfo::PortableTupleElementNames { names } => {
            encode_portable_tuple_names(names, &mut writer)?;
            TUPLE_ELEMENT_NAMES
        }
        CustomDebugInfo::EmbeddedSource { blob } => {
            writer.write_bytes(blob);
            EMBEDDED_SOURCE
        }
        CustomDebugInfo::SourceLink { blob } => {
            writer.write_bytes(blob);
            SOURCE_LINK
        }
        CustomDebugInfo::AsyncMethodSteppingInfo {
            catch_handler,
            steps,
        } => {
            encode_async_stepping_info(*catch_handler, steps, &mut writer, ctx)?;
            ASYNC_METHOD_STEPPING_INFO
        }
        CustomDebugInfo::Unknown {
            kind_or_guid: KindOrGuid::Guid(guid),
            data,
        } => {
            writer.write_bytes(data);
            *guid
        }
        other => return Err(Error::UnsupportedKind(other.name())),
    };

    Ok((guid, writer.into_vec()))
}

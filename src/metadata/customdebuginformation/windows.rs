//! Legacy Windows PDB record stream codec.
//!
//! The legacy container is the "MD2" attribute blob attached to a method's symbol
//! record: a 4-byte stream header followed by self-framed records, each carrying its
//! own 8-byte header with a kind byte and total length. This module owns the framing;
//! payload bytes are handed to [`crate::metadata::customdebuginformation::parser`] and
//! produced by [`crate::metadata::customdebuginformation::writer`].
//!
//! Reading is deliberately forgiving. A structural fault in the framing stops the walk
//! but keeps every record decoded before it; a fault inside one record's payload drops
//! that record alone. Both outcomes are visible through [`WindowsDebugInfo::dropped`]
//! and, when a sink is attached, through the context's diagnostics.

use crate::{
    file::{parser::Parser, writer::Writer},
    metadata::{
        customdebuginformation::{
            context::CdiContext,
            parser::decode_windows_payload,
            types::{
                CustomDebugInfo, KindOrGuid, WindowsKind, RECORD_HEADER_SIZE, WINDOWS_VERSION,
            },
        },
        diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity},
    },
    Error, Result,
};

/// One method's group of legacy custom debug information records.
///
/// `infos` holds the records in stream order, unknown kinds included. `dropped` is the
/// difference between the count the stream header declared and the records actually
/// produced, whether they were lost to a payload fault, a dangling reference, or a
/// structural fault that ended the walk early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowsDebugInfo {
    /// The decoded records, in stream order
    pub infos: Vec<CustomDebugInfo>,
    /// Number of declared records that did not survive decoding
    pub dropped: usize,
}

impl WindowsDebugInfo {
    /// Decodes a legacy record stream.
    ///
    /// # Arguments
    /// * `data` - The full "MD2" attribute blob, stream header included
    /// * `ctx` - The decode context of the owning method
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the blob is shorter than the stream
    /// header and [`crate::Error::Malformed`] if the stream version byte is not 4.
    /// Faults past the stream header never fail the call; they surface as dropped
    /// records and diagnostics instead.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dotpdb::metadata::customdebuginformation::{
    ///     CdiContext, MethodRef, NullResolver, WindowsDebugInfo,
    /// };
    /// use dotpdb::metadata::{method::MethodBody, token::Token};
    ///
    /// let body = MethodBody::new(vec![0, 2, 5], 8)?;
    /// let resolver = NullResolver;
    /// let ctx = CdiContext::new(
    ///     MethodRef::new(Token::new(0x0600_0001), "Main"),
    ///     &body,
    ///     &[],
    ///     &resolver,
    /// );
    ///
    /// // One using-groups record
    /// let blob = [
    ///     4, 1, 0, 0, // stream header
    ///     4, 0, 0, 4, 16, 0, 0, 0, // record header
    ///     3, 0, 3, 0, 1, 0, 0, 0, // payload
    /// ];
    /// let group = WindowsDebugInfo::read(&blob, &ctx)?;
    /// assert_eq!(group.infos.len(), 1);
    /// assert_eq!(group.dropped, 0);
    /// # Ok::<(), dotpdb::Error>(())
    /// ```
    pub fn read(data: &[u8], ctx: &CdiContext) -> Result<Self> {
        let mut parser = Parser::new(data);

        let version = parser.read_le::<u8>()?;
        if version != WINDOWS_VERSION {
            return Err(malformed_error!(
                "Unsupported record stream version {}",
                version
            ));
        }

        let count = parser.read_le::<u8>()? as usize;
        parser.advance_by(2)?;

        let mut infos = Vec::with_capacity(count);
        for index in 0..count {
            let record_start = parser.pos();

            // A stream that declares more records than it holds yields the prefix
            if parser.remaining() == 0 {
                note(
                    ctx,
                    DiagnosticSeverity::Warning,
                    DiagnosticCategory::Framing,
                    format!("Stream declares {count} records but ends after {index}"),
                    record_start,
                    index,
                );
                break;
            }

            let Some((kind_byte, alignment, record_len)) = read_record_header(&mut parser) else {
                note(
                    ctx,
                    DiagnosticSeverity::Error,
                    DiagnosticCategory::Framing,
                    "Record header is truncated or carries a bad version",
                    record_start,
                    index,
                );
                break;
            };

            if record_len < RECORD_HEADER_SIZE || record_start + record_len > data.len() {
                note(
                    ctx,
                    DiagnosticSeverity::Error,
                    DiagnosticCategory::Framing,
                    format!("Record length {record_len} overruns the stream"),
                    record_start,
                    index,
                );
                break;
            }

            let kind = WindowsKind::from_repr(kind_byte);
            let ignores_alignment = kind.is_some_and(|k| k.ignores_alignment());

            let payload_len = if ignores_alignment {
                record_len - RECORD_HEADER_SIZE
            } else {
                if alignment > 3 {
                    note(
                        ctx,
                        DiagnosticSeverity::Error,
                        DiagnosticCategory::Framing,
                        format!("Alignment byte {alignment} is out of range"),
                        record_start,
                        index,
                    );
                    break;
                }
                match record_len.checked_sub(RECORD_HEADER_SIZE + alignment as usize) {
                    Some(len) => len,
                    None => {
                        note(
                            ctx,
                            DiagnosticSeverity::Error,
                            DiagnosticCategory::Framing,
                            format!("Alignment byte {alignment} exceeds the record length"),
                            record_start,
                            index,
                        );
                        break;
                    }
                }
            };

            let payload = &data[record_start + RECORD_HEADER_SIZE..][..payload_len];

            match kind {
                Some(kind) => match decode_windows_payload(kind, payload, ctx) {
                    Ok(info) => infos.push(info),
                    Err(error) => {
                        let category = match error {
                            Error::UnresolvedReference(_) => DiagnosticCategory::Resolution,
                            _ => DiagnosticCategory::Payload,
                        };
                        note(
                            ctx,
                            DiagnosticSeverity::Warning,
                            category,
                            format!("Dropped {kind:?} record: {error}"),
                            record_start,
                            index,
                        );
                    }
                },
                None => {
                    note(
                        ctx,
                        DiagnosticSeverity::Info,
                        DiagnosticCategory::UnknownKind,
                        format!("Unknown record kind {kind_byte}, preserved verbatim"),
                        record_start,
                        index,
                    );
                    infos.push(CustomDebugInfo::Unknown {
                        kind_or_guid: KindOrGuid::Kind(kind_byte),
                        data: payload.to_vec(),
                    });
                }
            }

            // The declared length wins over however many bytes the payload used
            parser.seek(record_start + record_len)?;
        }

        let dropped = count.saturating_sub(infos.len());
        Ok(WindowsDebugInfo { infos, dropped })
    }

    /// Encodes the group back into a legacy record stream blob.
    ///
    /// Every record is written in the current layout: payload padded to a 4-byte
    /// boundary with the padding width recorded in the alignment byte, for old and new
    /// kinds alike. Readers of old kinds ignore the byte and tolerate the padding, so
    /// the uniform layout stays compatible.
    ///
    /// # Arguments
    /// * `ctx` - The encode context of the owning method
    ///
    /// # Errors
    /// Returns [`crate::Error::TooManyRecords`] if the group exceeds the 255-record
    /// header limit, [`crate::Error::UnsupportedKind`] if a record has no legacy wire
    /// form, [`crate::Error::RecordTooLarge`] if one record's encoding overflows its
    /// length field, and any contract error raised by the payload encoders.
    pub fn write(&self, ctx: &CdiContext) -> Result<Vec<u8>> {
        if self.infos.len() > u8::MAX as usize {
            return Err(Error::TooManyRecords(self.infos.len()));
        }

        let mut writer = Writer::new();
        writer.write_le(WINDOWS_VERSION);
        writer.write_le(self.infos.len() as u8);
        writer.write_le(0u16);

        for info in &self.infos {
            let kind_byte = windows_kind_byte(info)?;
            let record_start = writer.len();

            writer.write_le(WINDOWS_VERSION);
            writer.write_le(kind_byte);
            writer.write_le(0u8);
            writer.write_le(0u8);
            writer.write_le(0i32);

            crate::metadata::customdebuginformation::writer::encode_windows_payload(
                info,
                &mut writer,
                ctx,
            )?;

            // The stream header and every prior record are 4-byte multiples, so
            // padding the buffer pads the record
            let padding = writer.pad_to_multiple(4);
            let record_len = writer.len() - record_start;
            let Ok(record_len_field) = i32::try_from(record_len) else {
                return Err(Error::RecordTooLarge(record_len));
            };

            writer.patch_le_at(record_start + 3, padding as u8)?;
            writer.patch_le_at(record_start + 4, record_len_field)?;
        }

        Ok(writer.into_vec())
    }
}

/// Reads one record header, returning `(kind, alignment, total_length)`.
///
/// Returns `None` when the header does not fit in the remaining bytes, carries the
/// wrong version, or declares a negative length.
fn read_record_header(parser: &mut Parser) -> Option<(u8, u8, usize)> {
    if parser.remaining() < RECORD_HEADER_SIZE {
        return None;
    }

    let version = parser.read_le::<u8>().ok()?;
    if version != WINDOWS_VERSION {
        return None;
    }

    let kind = parser.read_le::<u8>().ok()?;
    parser.advance().ok()?;
    let alignment = parser.read_le::<u8>().ok()?;
    let record_len = parser.read_le::<i32>().ok()?;

    usize::try_from(record_len)
        .ok()
        .map(|len| (kind, alignment, len))
}

fn windows_kind_byte(info: &CustomDebugInfo) -> Result<u8> {
    if let Some(kind) = info.windows_kind() {
        return Ok(kind as u8);
    }

    if let CustomDebugInfo::Unknown {
        kind_or_guid: KindOrGuid::Kind(kind),
        ..
    } = info
    {
        return Ok(*kind);
    }

    Err(Error::UnsupportedKind(info.name()))
}

fn note(
    ctx: &CdiContext,
    severity: DiagnosticSeverity,
    category: DiagnosticCategory,
    message: impl Into<String>,
    offset: usize,
    record: usize,
) {
    if let Some(diagnostics) = ctx.diagnostics {
        diagnostics.push(
            Diagnostic::new(severity, category, message)
                .with_offset(offset as u64)
                .with_token(ctx.method.token.value())
                .with_record(record),
        );
    }
}

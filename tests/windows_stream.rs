//! Legacy record stream integration tests.
//!
//! Tests for the "MD2" record stream container end to end: writing record groups,
//! reading them back through the public API, and verifying the resilience rules for
//! malformed streams (truncation, bad framing, unresolvable references).

use std::collections::HashMap;

use dotpdb::prelude::*;

/// Helper resolver backed by fixed lookup tables.
///
/// Each test registers exactly the methods and nested types it expects the stream to
/// reference; everything else resolves to `None`.
#[derive(Default)]
struct TableResolver {
    methods: HashMap<u32, String>,
    nested_types: HashMap<String, Token>,
}

impl TableResolver {
    fn with_method(mut self, token: u32, name: &str) -> Self {
        self.methods.insert(token, name.to_string());
        self
    }

    fn with_nested_type(mut self, token: u32, name: &str) -> Self {
        self.nested_types.insert(name.to_string(), Token::new(token));
        self
    }
}

impl TokenResolver for TableResolver {
    fn method_by_token(&self, token: Token) -> Option<MethodRef> {
        self.methods
            .get(&token.value())
            .map(|name| MethodRef::new(token, name))
    }

    fn method_body(&self, _method: &MethodRef) -> Option<MethodBody> {
        None
    }

    fn nested_type_by_name(&self, name: &str) -> Option<TypeRef> {
        self.nested_types
            .get(name)
            .map(|token| TypeRef::new(*token, name))
    }
}

/// Builds a record stream blob from raw record bytes.
fn stream(count: u8, records: &[Vec<u8>]) -> Vec<u8> {
    let mut blob = vec![4, count, 0, 0];
    for record in records {
        blob.extend_from_slice(record);
    }
    blob
}

/// Builds a single raw record with the given kind, alignment byte, and payload.
fn record(kind: u8, alignment: u8, payload: &[u8]) -> Vec<u8> {
    let length = i32::try_from(8 + payload.len()).unwrap();
    let mut bytes = vec![4, kind, 0, alignment];
    bytes.extend_from_slice(&length.to_le_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

fn owner() -> MethodRef {
    MethodRef::new(Token::new(0x0600_0001), "Main")
}

#[test]
fn test_mixed_group_roundtrip() -> Result<()> {
    let body = MethodBody::new(vec![0, 2, 5, 9], 12)?;
    let locals = [LocalVar::new(1, "pair"), LocalVar::new(2, "values")];
    let resolver = TableResolver::default()
        .with_method(0x0600_0042, "Helper")
        .with_method(0x0600_0043, "ModuleHelper")
        .with_nested_type(0x0200_0005, "<Main>d__0");
    let ctx = CdiContext::new(owner(), &body, &locals, &resolver);

    let group = WindowsDebugInfo {
        infos: vec![
            CustomDebugInfo::UsingGroups { groups: vec![3, 1] },
            CustomDebugInfo::ForwardMethodInfo {
                method: MethodRef::new(Token::new(0x0600_0042), "Helper"),
            },
            CustomDebugInfo::ForwardModuleInfo {
                method: MethodRef::new(Token::new(0x0600_0043), "ModuleHelper"),
            },
            CustomDebugInfo::StateMachineHoistedLocalScopes {
                scopes: vec![
                    HoistedScope::Synthesized,
                    HoistedScope::Range {
                        start: body.instruction_at(2).unwrap(),
                        end: None,
                    },
                ],
            },
            CustomDebugInfo::StateMachineTypeName {
                ty: TypeRef::new(Token::new(0x0200_0005), "<Main>d__0"),
            },
            CustomDebugInfo::DynamicLocals {
                // The name matches the stored local, so the wire form suppresses it
                // and decoding restores it.
                locals: vec![DynamicLocal {
                    flags: vec![1, 0, 1],
                    name: Some("values".to_string()),
                    local: Some(2),
                }],
            },
            CustomDebugInfo::EditAndContinueLocalSlotMap {
                data: vec![0x01, 0x7F, 0x00],
            },
            CustomDebugInfo::EditAndContinueLambdaMap {
                data: vec![0x02, 0x03],
            },
            CustomDebugInfo::TupleElementNames {
                entries: vec![
                    TupleInfo {
                        names: vec!["Item1".to_string(), String::new()],
                        local: Some(1),
                        scope: None,
                        name: Some("pair".to_string()),
                    },
                    TupleInfo {
                        names: vec!["Key".to_string(), "Value".to_string()],
                        local: None,
                        scope: Some((body.instruction_at(0).unwrap(), None)),
                        name: Some("Pair".to_string()),
                    },
                ],
            },
        ],
        dropped: 0,
    };

    let blob = group.write(&ctx)?;
    let decoded = WindowsDebugInfo::read(&blob, &ctx)?;

    assert_eq!(decoded, group);
    Ok(())
}

#[test]
fn test_records_are_padded_to_four_bytes() -> Result<()> {
    let body = MethodBody::new(vec![0, 2], 4)?;
    let resolver = NullResolver;
    let ctx = CdiContext::new(owner(), &body, &[], &resolver);

    // One u16 count plus three u16 groups is 8 payload bytes, already aligned;
    // two groups leave 6 bytes and need 2 bytes of padding.
    let group = WindowsDebugInfo {
        infos: vec![CustomDebugInfo::UsingGroups { groups: vec![4, 2] }],
        dropped: 0,
    };

    let blob = group.write(&ctx)?;

    // Stream header, then one 16-byte record: 8 header + 6 payload + 2 padding.
    assert_eq!(blob.len(), 4 + 16);
    assert_eq!(blob[4 + 3], 2, "alignment byte should record the padding");
    assert_eq!(&blob[4 + 4..4 + 8], &16i32.to_le_bytes());
    assert_eq!(&blob[blob.len() - 2..], &[0, 0]);
    Ok(())
}

#[test]
fn test_legacy_kind_ignores_alignment_byte() -> Result<()> {
    let body = MethodBody::new(vec![0, 2], 4)?;
    let resolver = NullResolver;
    let ctx = CdiContext::new(owner(), &body, &[], &resolver);

    // Kind 0 predates the alignment field; the garbage value 9 must be treated as 0.
    let payload = [0x01, 0x00, 0x07, 0x00, 0x00, 0x00];
    let blob = stream(1, &[record(0, 9, &payload)]);

    let decoded = WindowsDebugInfo::read(&blob, &ctx)?;
    assert_eq!(
        decoded.infos,
        vec![CustomDebugInfo::UsingGroups { groups: vec![7] }]
    );
    assert_eq!(decoded.dropped, 0);
    Ok(())
}

#[test]
fn test_new_kind_honors_alignment_byte() -> Result<()> {
    let body = MethodBody::new(vec![0, 2], 4)?;
    let resolver = NullResolver;
    let ctx = CdiContext::new(owner(), &body, &[], &resolver);

    // Kind 6 is opaque; 2 bytes of data followed by 2 bytes of declared padding.
    let payload = [0xAA, 0xBB, 0x00, 0x00];
    let blob = stream(1, &[record(6, 2, &payload)]);

    let decoded = WindowsDebugInfo::read(&blob, &ctx)?;
    assert_eq!(
        decoded.infos,
        vec![CustomDebugInfo::EditAndContinueLocalSlotMap {
            data: vec![0xAA, 0xBB],
        }]
    );
    Ok(())
}

#[test]
fn test_bad_stream_version_is_fatal() -> Result<()> {
    let body = MethodBody::new(vec![0], 2)?;
    let resolver = NullResolver;
    let ctx = CdiContext::new(owner(), &body, &[], &resolver);

    let blob = [3, 1, 0, 0];
    assert!(matches!(
        WindowsDebugInfo::read(&blob, &ctx),
        Err(Error::Malformed { .. })
    ));
    Ok(())
}

#[test]
fn test_truncated_stream_keeps_decoded_prefix() -> Result<()> {
    let body = MethodBody::new(vec![0, 2], 4)?;
    let resolver = NullResolver;
    let diagnostics = Diagnostics::new();
    let ctx = CdiContext::new(owner(), &body, &[], &resolver).with_diagnostics(&diagnostics);

    // The stream declares three records but carries only one.
    let payload = [0x01, 0x00, 0x05, 0x00, 0x00, 0x00];
    let blob = stream(3, &[record(0, 0, &payload)]);

    let decoded = WindowsDebugInfo::read(&blob, &ctx)?;
    assert_eq!(decoded.infos.len(), 1);
    assert_eq!(decoded.dropped, 2);
    assert!(diagnostics.has_warnings());
    Ok(())
}

#[test]
fn test_record_overrunning_blob_aborts_remainder() -> Result<()> {
    let body = MethodBody::new(vec![0, 2], 4)?;
    let resolver = NullResolver;
    let diagnostics = Diagnostics::new();
    let ctx = CdiContext::new(owner(), &body, &[], &resolver).with_diagnostics(&diagnostics);

    let good = record(0, 0, &[0x01, 0x00, 0x05, 0x00, 0x00, 0x00]);
    // Declared length runs 100 bytes past the end of the blob.
    let mut bad = record(0, 0, &[0x01, 0x00, 0x06, 0x00, 0x00, 0x00]);
    bad[4..8].copy_from_slice(&114i32.to_le_bytes());

    let blob = stream(2, &[good, bad]);
    let decoded = WindowsDebugInfo::read(&blob, &ctx)?;

    assert_eq!(
        decoded.infos,
        vec![CustomDebugInfo::UsingGroups { groups: vec![5] }]
    );
    assert_eq!(decoded.dropped, 1);
    assert!(diagnostics.has_errors());
    Ok(())
}

#[test]
fn test_unresolvable_forward_drops_only_that_record() -> Result<()> {
    let body = MethodBody::new(vec![0, 2], 4)?;
    let resolver = NullResolver;
    let diagnostics = Diagnostics::new();
    let ctx = CdiContext::new(owner(), &body, &[], &resolver).with_diagnostics(&diagnostics);

    let forward = record(1, 0, &0x0600_0099u32.to_le_bytes());
    let groups = record(0, 0, &[0x01, 0x00, 0x02, 0x00, 0x00, 0x00]);

    let blob = stream(2, &[forward, groups]);
    let decoded = WindowsDebugInfo::read(&blob, &ctx)?;

    assert_eq!(
        decoded.infos,
        vec![CustomDebugInfo::UsingGroups { groups: vec![2] }]
    );
    assert_eq!(decoded.dropped, 1);
    assert_eq!(
        diagnostics
            .by_category(DiagnosticCategory::Resolution)
            .len(),
        1
    );
    Ok(())
}

#[test]
fn test_unknown_kind_survives_a_roundtrip() -> Result<()> {
    let body = MethodBody::new(vec![0, 2], 4)?;
    let resolver = NullResolver;
    let diagnostics = Diagnostics::new();
    let ctx = CdiContext::new(owner(), &body, &[], &resolver).with_diagnostics(&diagnostics);

    let payload = [0xDE, 0xAD, 0xBE, 0xEF];
    let blob = stream(1, &[record(250, 0, &payload)]);

    let decoded = WindowsDebugInfo::read(&blob, &ctx)?;
    assert_eq!(
        decoded.infos,
        vec![CustomDebugInfo::Unknown {
            kind_or_guid: KindOrGuid::Kind(250),
            data: payload.to_vec(),
        }]
    );
    assert_eq!(diagnostics.info_count(), 1);

    let rewritten = decoded.write(&ctx)?;
    assert_eq!(WindowsDebugInfo::read(&rewritten, &ctx)?, decoded);
    Ok(())
}

#[test]
fn test_portable_only_variant_is_rejected() -> Result<()> {
    let body = MethodBody::new(vec![0], 2)?;
    let resolver = NullResolver;
    let ctx = CdiContext::new(owner(), &body, &[], &resolver);

    let group = WindowsDebugInfo {
        infos: vec![CustomDebugInfo::SourceLink {
            blob: b"{}".to_vec(),
        }],
        dropped: 0,
    };

    assert!(matches!(
        group.write(&ctx),
        Err(Error::UnsupportedKind("SourceLink"))
    ));
    Ok(())
}

#[test]
fn test_hoisted_scope_endpoints_resolve_against_body() -> Result<()> {
    let body = MethodBody::new(vec![0, 2, 5, 9], 12)?;
    let resolver = NullResolver;
    let ctx = CdiContext::new(owner(), &body, &[], &resolver);

    // Scope [2, 9): start offset 2, inclusive end offset 8.
    let mut payload = 2i32.to_le_bytes().to_vec();
    payload.extend_from_slice(&0u32.to_le_bytes());
    payload.extend_from_slice(&0u32.to_le_bytes());
    payload.extend_from_slice(&2u32.to_le_bytes());
    payload.extend_from_slice(&8u32.to_le_bytes());

    let blob = stream(1, &[record(3, 0, &payload)]);
    let decoded = WindowsDebugInfo::read(&blob, &ctx)?;

    assert_eq!(
        decoded.infos,
        vec![CustomDebugInfo::StateMachineHoistedLocalScopes {
            scopes: vec![
                HoistedScope::Synthesized,
                HoistedScope::Range {
                    start: body.instruction_at(2).unwrap(),
                    end: Some(body.instruction_at(9).unwrap()),
                },
            ],
        }]
    );
    Ok(())
}

//! Decode and encode context for custom debug information.
//!
//! Every record is decoded and encoded against a [`CdiContext`]: the owning method's
//! identity, its instruction-offset view, its local variable table, the generic-parameter
//! scope, and a [`TokenResolver`] for everything that lives outside the method. The
//! context is allocated per pass and borrowed immutably throughout, so concurrent passes
//! over different methods need no synchronization.

use crate::metadata::{
    customdebuginformation::types::{MethodRef, TypeRef},
    diagnostics::Diagnostics,
    method::MethodBody,
    token::Token,
};

/// A single slot in a method's local variable table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVar {
    /// The slot index within the method's local signature
    pub index: u32,
    /// The name recorded for this slot in the PDB scope records
    pub name: String,
}

impl LocalVar {
    /// Creates a local variable entry from a slot index and name.
    #[must_use]
    pub fn new(index: u32, name: impl Into<String>) -> Self {
        LocalVar {
            index,
            name: name.into(),
        }
    }
}

/// The generic-parameter scope a record is resolved under.
///
/// Token resolution for generic methods depends on which instantiation context is in
/// effect. Both tokens are optional; a default context resolves against the open
/// definitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenericContext {
    /// The type providing type-level generic parameters
    pub r#type: Option<Token>,
    /// The method providing method-level generic parameters
    pub method: Option<Token>,
}

/// Resolves metadata references the codec cannot resolve itself.
///
/// The codec never walks metadata tables; every token, row index, and type name in a
/// record is handed to this trait. Returning `None` is a referential failure: the
/// record carrying the reference is dropped (decode) or rejected (encode), never the
/// whole group.
pub trait TokenResolver {
    /// Resolves a full metadata token to a method reference.
    fn method_by_token(&self, token: Token) -> Option<MethodRef>;

    /// Resolves a bare `MethodDef` row index to a method reference.
    fn method_by_rid(&self, rid: u32) -> Option<MethodRef> {
        self.method_by_token(Token::from_method_rid(rid))
    }

    /// Returns the instruction-offset view of another method's body.
    ///
    /// Used for resume points of async steps, which may live in a different method
    /// than the one owning the record.
    fn method_body(&self, method: &MethodRef) -> Option<MethodBody>;

    /// Resolves a type name against the nested types of the owning method's declaring
    /// type.
    ///
    /// Implementations should match the name exactly as given; the codec retries with
    /// the generic-arity suffix stripped when an exact match fails.
    fn nested_type_by_name(&self, name: &str) -> Option<TypeRef>;
}

/// A resolver that resolves nothing.
///
/// Useful for decoding records that carry no cross-method references, and in tests.
/// Records that do carry references decode against it as referential failures.
pub struct NullResolver;

impl TokenResolver for NullResolver {
    fn method_by_token(&self, _token: Token) -> Option<MethodRef> {
        None
    }

    fn method_body(&self, _method: &MethodRef) -> Option<MethodBody> {
        None
    }

    fn nested_type_by_name(&self, _name: &str) -> Option<TypeRef> {
        None
    }
}

/// Everything a decode or encode pass needs to know about the owning method.
///
/// A context borrows its collaborators for the duration of one pass over one method's
/// records. It is cheap to construct; build a fresh one per method rather than sharing
/// a single instance across threads.
pub struct CdiContext<'a> {
    /// The method owning the records being processed
    pub method: MethodRef,
    /// The owning method's instruction-offset view
    pub body: &'a MethodBody,
    /// The owning method's local variable table
    pub locals: &'a [LocalVar],
    /// The generic-parameter scope in effect
    pub generics: GenericContext,
    /// Resolver for tokens, row indices, and nested type names
    pub resolver: &'a dyn TokenResolver,
    /// Optional sink for non-fatal findings
    pub diagnostics: Option<&'a Diagnostics>,
}

impl<'a> CdiContext<'a> {
    /// Creates a context for one method with an empty generic scope and no diagnostics.
    ///
    /// # Arguments
    /// * `method` - The method owning the records
    /// * `body` - The owning method's instruction offsets
    /// * `locals` - The owning method's local variable table
    /// * `resolver` - Resolver for references outside the method
    #[must_use]
    pub fn new(
        method: MethodRef,
        body: &'a MethodBody,
        locals: &'a [LocalVar],
        resolver: &'a dyn TokenResolver,
    ) -> Self {
        CdiContext {
            method,
            body,
            locals,
            generics: GenericContext::default(),
            resolver,
            diagnostics: None,
        }
    }

    /// Sets the generic-parameter scope for this pass.
    #[must_use]
    pub fn with_generics(mut self, generics: GenericContext) -> Self {
        self.generics = generics;
        self
    }

    /// Attaches a diagnostics sink that collects non-fatal findings during the pass.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: &'a Diagnostics) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Looks up a local variable by slot index.
    #[must_use]
    pub fn local_by_index(&self, index: u32) -> Option<&LocalVar> {
        self.locals.iter().find(|local| local.index == index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_resolver_resolves_nothing() {
        let resolver = NullResolver;
        assert!(resolver.method_by_token(Token::new(0x0600_0001)).is_none());
        assert!(resolver.method_by_rid(1).is_none());
        assert!(resolver.nested_type_by_name("<Main>d__0").is_none());
    }

    #[test]
    fn test_method_by_rid_default_builds_token() {
        struct Capture;
        impl TokenResolver for Capture {
            fn method_by_token(&self, token: Token) -> Option<MethodRef> {
                Some(MethodRef::new(token, "captured"))
            }
            fn method_body(&self, _method: &MethodRef) -> Option<MethodBody> {
                None
            }
            fn nested_type_by_name(&self, _name: &str) -> Option<TypeRef> {
                None
            }
        }

        let resolved = Capture.method_by_rid(7).unwrap();
        assert_eq!(resolved.token.value(), 0x0600_0007);
    }

    #[test]
    fn test_context_local_lookup() {
        let body = MethodBody::new(vec![0], 2).unwrap();
        let locals = [LocalVar::new(0, "first"), LocalVar::new(3, "sparse")];
        let resolver = NullResolver;
        let ctx = CdiContext::new(
            MethodRef::new(Token::new(0x0600_0001), "M"),
            &body,
            &locals,
            &resolver,
        );

        assert_eq!(ctx.local_by_index(3).map(|l| l.name.as_str()), Some("sparse"));
        assert!(ctx.local_by_index(1).is_none());
    }

    #[test]
    fn test_context_builders() {
        let body = MethodBody::new(vec![0], 2).unwrap();
        let resolver = NullResolver;
        let diagnostics = Diagnostics::new();

        let generics = GenericContext {
            r#type: Some(Token::new(0x0200_0002)),
            method: None,
        };

        let ctx = CdiContext::new(
            MethodRef::new(Token::new(0x0600_0001), "M"),
            &body,
            &[],
            &resolver,
        )
        .with_generics(generics)
        .with_diagnostics(&diagnostics);

        assert_eq!(ctx.generics.r#type, Some(Token::new(0x0200_0002)));
        assert!(ctx.diagnostics.is_some());
    }
}

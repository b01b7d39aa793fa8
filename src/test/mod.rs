//! Shared test fixtures.
//!
//! Unit tests across the crate need a [`TokenResolver`] with predictable contents.
//! [`FixedResolver`] is a table-backed implementation populated through builder calls,
//! so each test declares exactly the methods, bodies, and nested types it expects to
//! resolve and everything else stays a referential failure.

use std::collections::HashMap;

use crate::metadata::{
    customdebuginformation::{MethodRef, TokenResolver, TypeRef},
    method::MethodBody,
    token::Token,
};

/// A resolver backed by fixed lookup tables.
#[derive(Default)]
pub struct FixedResolver {
    methods: HashMap<u32, String>,
    bodies: HashMap<u32, MethodBody>,
    nested_types: HashMap<String, Token>,
}

impl FixedResolver {
    /// Registers a method under its full token value.
    pub fn with_method(mut self, token: u32, name: &str) -> Self {
        self.methods.insert(token, name.to_string());
        self
    }

    /// Registers the instruction-offset view of a method's body.
    pub fn with_body(mut self, token: u32, body: MethodBody) -> Self {
        self.bodies.insert(token, body);
        self
    }

    /// Registers a nested type of the owning method's declaring type.
    pub fn with_nested_type(mut self, token: u32, name: &str) -> Self {
        self.nested_types.insert(name.to_string(), Token::new(token));
        self
    }
}

impl TokenResolver for FixedResolver {
    fn method_by_token(&self, token: Token) -> Option<MethodRef> {
        self.methods
            .get(&token.value())
            .map(|name| MethodRef::new(token, name))
    }

    fn method_body(&self, method: &MethodRef) -> Option<MethodBody> {
        self.bodies.get(&method.token.value()).cloned()
    }

    fn nested_type_by_name(&self, name: &str) -> Option<TypeRef> {
        self.nested_types
            .get(name)
            .map(|token| TypeRef::new(*token, name))
    }
}

/// Creates a resolver that knows a single method and nothing else.
pub fn resolver_with_method(token: u32, name: &str) -> FixedResolver {
    FixedResolver::default().with_method(token, name)
}

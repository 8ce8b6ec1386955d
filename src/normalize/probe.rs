//! Ordered Field Probing
//!
//! Agent responses change shape between producer versions: a list may live
//! at the top level under one of several names, or nested under `data`.
//! Each target field therefore owns a [`FallbackChain`]: an ordered list of
//! [`JsonPath`] candidates plus the [`Presence`] rule that decides whether a
//! candidate "counts". The first candidate that counts wins.

use serde_json::Value;

use crate::types::is_truthy;

/// A fixed path of object keys, e.g. `data.sources`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonPath(pub &'static [&'static str]);

impl JsonPath {
    /// Walk the path. Any missing key or non-object hop yields `None`.
    pub fn get<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.0
            .iter()
            .try_fold(value, |current, key| current.as_object()?.get(*key))
    }

    /// Dotted form, for logs and test failures
    pub fn dotted(&self) -> String {
        self.0.join(".")
    }
}

/// When a resolved candidate is accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Any value other than `null`
    NonNull,
    /// Any truthy value (see [`is_truthy`]); `""`, `0` and `false` fall through
    Truthy,
}

impl Presence {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Presence::NonNull => !value.is_null(),
            Presence::Truthy => is_truthy(value),
        }
    }
}

/// Ordered candidate paths for a single target field
#[derive(Debug, Clone, Copy)]
pub struct FallbackChain {
    pub field: &'static str,
    pub candidates: &'static [JsonPath],
    pub presence: Presence,
}

impl FallbackChain {
    /// First accepted candidate together with the path it was found at
    pub fn resolve_with_path<'a>(&self, value: &'a Value) -> Option<(JsonPath, &'a Value)> {
        self.candidates.iter().find_map(|path| {
            path.get(value)
                .filter(|v| self.presence.accepts(v))
                .map(|v| (*path, v))
        })
    }
}

/// An upstream payload of unknown shape.
///
/// Every read goes through a fallible accessor; nothing about the structure
/// is assumed. An absent body is represented as `null`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawAgentResponse(Value);

impl RawAgentResponse {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Resolve a fallback chain against this payload
    pub fn probe(&self, chain: &FallbackChain) -> Option<&Value> {
        let resolved = chain.resolve_with_path(&self.0);
        match resolved {
            Some((path, value)) => {
                tracing::trace!("{} resolved at '{}'", chain.field, path.dotted());
                Some(value)
            }
            None => {
                tracing::trace!("{} not present in agent response", chain.field);
                None
            }
        }
    }

    /// Read a single top-level key
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.0.as_object()?.get(key)
    }

    /// Read a top-level key as an array; anything else reads as empty
    pub fn array(&self, key: &str) -> &[Value] {
        self.field(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

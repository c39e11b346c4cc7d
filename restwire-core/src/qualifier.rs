//! Qualifiers: symbolic tags that bind a client to one of several endpoint providers.

use std::borrow::Cow;
use std::fmt;

use crate::WiringError;

/// Marker name of the generic, value-carrying qualifier.
pub const GENERIC_MARKER: &str = "qualifier";

/// A qualifier is a marker plus an optional value.
///
/// The generic marker is compared by value and needs one on both sides. A custom marker
/// matches on presence; values are only compared when both sides carry one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Qualifier {
    marker: Cow<'static, str>,
    value: Option<Cow<'static, str>>,
}

impl Qualifier {
    /// Generic qualifier with a static value; usable in constants.
    pub const fn generic(value: &'static str) -> Self {
        Self {
            marker: Cow::Borrowed(GENERIC_MARKER),
            value: Some(Cow::Borrowed(value)),
        }
    }

    /// Custom marker without a value; usable in constants.
    pub const fn marker(name: &'static str) -> Self {
        Self {
            marker: Cow::Borrowed(name),
            value: None,
        }
    }

    /// Custom marker carrying a value; usable in constants.
    pub const fn marker_with_value(name: &'static str, value: &'static str) -> Self {
        Self {
            marker: Cow::Borrowed(name),
            value: Some(Cow::Borrowed(value)),
        }
    }

    /// Generic qualifier built at runtime, e.g. from configuration.
    pub fn named(value: impl Into<String>) -> Self {
        Self {
            marker: Cow::Borrowed(GENERIC_MARKER),
            value: Some(Cow::Owned(value.into())),
        }
    }

    /// Custom marker built at runtime.
    pub fn custom(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            marker: Cow::Owned(name.into()),
            value: value.map(Cow::Owned),
        }
    }

    pub fn marker_name(&self) -> &str {
        &self.marker
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn is_generic(&self) -> bool {
        self.marker == GENERIC_MARKER
    }

    /// Whether a provider declaring `supplied` satisfies a client declaring `self`.
    pub fn matches(&self, supplied: &Qualifier) -> Result<bool, WiringError> {
        if self.marker != supplied.marker {
            return Ok(false);
        }
        let ours = self.value().filter(|v| !v.is_empty());
        let theirs = supplied.value().filter(|v| !v.is_empty());
        if self.is_generic() {
            return match (ours, theirs) {
                (Some(a), Some(b)) => Ok(a == b),
                _ => Err(WiringError::QualifierMismatch(format!(
                    "{self} and {supplied} cannot be compared without a value on both sides"
                ))),
            };
        }
        Ok(match (ours, theirs) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        })
    }

    /// The qualifier a client binds with: its first custom marker, else its generic qualifier.
    pub fn effective(declared: &[Qualifier]) -> Option<&Qualifier> {
        declared
            .iter()
            .find(|q| !q.is_generic())
            .or_else(|| declared.first())
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "@{}({:?})", self.marker, value),
            None => write!(f, "@{}", self.marker),
        }
    }
}

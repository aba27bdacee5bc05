use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity of an already-verified caller, as handed over by the edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectIdentity {
    subject: String,
    claims: BTreeMap<String, Value>,
}

impl SubjectIdentity {
    /// Creates an identity from a subject and its verified token claims.
    #[must_use]
    pub fn new(subject: impl Into<String>, claims: BTreeMap<String, Value>) -> Self {
        Self {
            subject: subject.into(),
            claims,
        }
    }

    /// Creates an identity that carries no claims beyond the subject.
    #[must_use]
    pub fn anonymous_claims(subject: impl Into<String>) -> Self {
        Self::new(subject, BTreeMap::new())
    }

    /// Returns the stable subject claim from the identity provider.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns every verified claim.
    #[must_use]
    pub fn claims(&self) -> &BTreeMap<String, Value> {
        &self.claims
    }

    /// Returns a claim rendered as a string, if present and scalar.
    #[must_use]
    pub fn claim_str(&self, name: &str) -> Option<&str> {
        self.claims.get(name).and_then(Value::as_str)
    }
}

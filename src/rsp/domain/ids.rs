//! Validated identifier types for RSP providers, servers and server types.

use super::RspDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

fn normalize(value: String, kind: &'static str) -> Result<String, RspDomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RspDomainError::EmptyIdentifier { kind });
    }
    Ok(trimmed.to_owned())
}

/// Identifier of an RSP provider type, such as `redhat.vscode-community-server-connector`.
///
/// Exactly one provider state exists per identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProviderId(String);

impl ProviderId {
    /// Creates a validated provider identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RspDomainError::EmptyIdentifier`] when the trimmed value is
    /// empty.
    pub fn new(value: impl Into<String>) -> Result<Self, RspDomainError> {
        normalize(value.into(), "provider").map(Self)
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProviderId {
    type Error = RspDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProviderId> for String {
    fn from(value: ProviderId) -> Self {
        value.0
    }
}

impl AsRef<str> for ProviderId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Identifier of a server instance, unique within its provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerId(String);

impl ServerId {
    /// Creates a validated server identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RspDomainError::EmptyIdentifier`] when the trimmed value is
    /// empty.
    pub fn new(value: impl Into<String>) -> Result<Self, RspDomainError> {
        normalize(value.into(), "server").map(Self)
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ServerId {
    type Error = RspDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ServerId> for String {
    fn from(value: ServerId) -> Self {
        value.0
    }
}

impl AsRef<str> for ServerId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Identifier of a server adapter type, such as `org.jboss.ide.eclipse.as.wildfly.260`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerTypeId(String);

impl ServerTypeId {
    /// Creates a validated server type identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RspDomainError::EmptyIdentifier`] when the trimmed value is
    /// empty.
    pub fn new(value: impl Into<String>) -> Result<Self, RspDomainError> {
        normalize(value.into(), "server type").map(Self)
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ServerTypeId {
    type Error = RspDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ServerTypeId> for String {
    fn from(value: ServerTypeId) -> Self {
        value.0
    }
}

impl AsRef<str> for ServerTypeId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ServerTypeId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

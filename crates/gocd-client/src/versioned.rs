//! Optimistic-concurrency capability for request and response payloads.
//!
//! Resources opt in by implementing [`Versioned`] and pointing the
//! [`Payload`] capability query at it. Everything else implements
//! [`Payload`] with its default methods, which report "not versioned".

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Resource carrying an optimistic-concurrency token.
pub trait Versioned {
    /// Current version token, without surrounding quotes.
    fn version(&self) -> &str;

    /// Replace the version token.
    fn set_version(&mut self, version: String);
}

/// Capability query implemented by every body passed through the dispatcher.
///
/// ```
/// use gocd_client::{Payload, Versioned};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Template {
///     name: String,
///     #[serde(skip)]
///     etag: String,
/// }
///
/// impl Versioned for Template {
///     fn version(&self) -> &str {
///         &self.etag
///     }
///
///     fn set_version(&mut self, version: String) {
///         self.etag = version;
///     }
/// }
///
/// impl Payload for Template {
///     fn as_versioned(&self) -> Option<&dyn Versioned> {
///         Some(self)
///     }
///
///     fn as_versioned_mut(&mut self) -> Option<&mut dyn Versioned> {
///         Some(self)
///     }
/// }
/// ```
pub trait Payload {
    /// View this payload as a versioned resource, if it is one.
    fn as_versioned(&self) -> Option<&dyn Versioned> {
        None
    }

    /// Mutable view used to write back a refreshed token.
    fn as_versioned_mut(&mut self) -> Option<&mut dyn Versioned> {
        None
    }
}

impl Payload for () {}
impl Payload for String {}
impl Payload for serde_json::Value {}
impl<T> Payload for Vec<T> {}
impl<K, V> Payload for BTreeMap<K, V> {}
impl<K, V, S> Payload for HashMap<K, V, S> {}

impl<T: Payload> Payload for Option<T> {
    fn as_versioned(&self) -> Option<&dyn Versioned> {
        self.as_ref().and_then(Payload::as_versioned)
    }

    fn as_versioned_mut(&mut self) -> Option<&mut dyn Versioned> {
        self.as_mut().and_then(Payload::as_versioned_mut)
    }
}

/// Makes any serde type versioned without a dedicated struct.
///
/// Serializes exactly like `inner`; the token travels only through headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionedBody<T> {
    /// Wrapped resource representation.
    pub inner: T,
    /// Optimistic-concurrency token.
    #[serde(skip)]
    pub version: String,
}

impl<T> VersionedBody<T> {
    /// Wrap `inner` with a known token.
    pub fn new(inner: T, version: impl Into<String>) -> Self {
        Self {
            inner,
            version: version.into(),
        }
    }
}

impl<T> Versioned for VersionedBody<T> {
    fn version(&self) -> &str {
        &self.version
    }

    fn set_version(&mut self, version: String) {
        self.version = version;
    }
}

impl<T> Payload for VersionedBody<T> {
    fn as_versioned(&self) -> Option<&dyn Versioned> {
        Some(self)
    }

    fn as_versioned_mut(&mut self) -> Option<&mut dyn Versioned> {
        Some(self)
    }
}

/// `If-Match` value for a token: the token wrapped in double quotes.
#[must_use]
pub fn if_match_value(version: &str) -> String {
    format!("\"{version}\"")
}

/// Token carried by an `Etag` header, with every quote character removed.
#[must_use]
pub fn version_from_etag(etag: &str) -> String {
    etag.replace('"', "")
}

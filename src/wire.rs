//! Wire contract shared by the server and the client.
//!
//! - `POST {base}/invoke` carries an [`InvokeRequest`]; the response body is
//!   the JSON result, or an [`ErrorBody`] with a status >= 400.
//! - `GET {base}/_methods` returns a [`MethodManifest`].

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::methods::Verb;

/// Path of the name-based invocation endpoint, relative to the base path.
pub const INVOKE_PATH: &str = "invoke";

/// Path of the method manifest, relative to the base path.
pub const MANIFEST_PATH: &str = "_methods";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeRequest {
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl InvokeRequest {
    pub fn new(method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }
}

/// Advertised shape of one method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodInfo {
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verbs: Vec<Verb>,
}

impl MethodInfo {
    pub fn with_params<I, S>(params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            params: params.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Method name → info, serialized as a JSON object in registration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodManifest {
    entries: Vec<(String, MethodInfo)>,
}

impl MethodManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry, keeping first-insertion order.
    pub fn insert(&mut self, name: impl Into<String>, info: MethodInfo) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = info,
            None => self.entries.push((name, info)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&MethodInfo> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, info)| info)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MethodInfo)> {
        self.entries.iter().map(|(n, info)| (n.as_str(), info))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, MethodInfo)> for MethodManifest {
    fn from_iter<I: IntoIterator<Item = (S, MethodInfo)>>(iter: I) -> Self {
        let mut manifest = MethodManifest::new();
        for (name, info) in iter {
            manifest.insert(name, info);
        }
        manifest
    }
}

impl Serialize for MethodManifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, info) in &self.entries {
            map.serialize_entry(name, info)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for MethodManifest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ManifestVisitor;

        impl<'de> Visitor<'de> for ManifestVisitor {
            type Value = MethodManifest;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of method names to method info")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut manifest = MethodManifest::new();
                while let Some((name, info)) = access.next_entry::<String, MethodInfo>()? {
                    manifest.insert(name, info);
                }
                Ok(manifest)
            }
        }

        deserializer.deserialize_map(ManifestVisitor)
    }
}

/// JSON error payload returned with a status >= 400.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub message: String,
}

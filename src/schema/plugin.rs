use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Plugin schema version whose attributes must be sent nearly verbatim
pub const LEGACY_PLUGIN_VERSION: &str = "2";

/// A plugin as exported from the source project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginPayload {
    pub id: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl PluginPayload {
    /// Installed from a package registry rather than a private url
    pub fn package_name(&self) -> Option<&str> {
        self.attributes
            .get("package_name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
    }

    /// Declared schema version, whether exported as a string or a number
    pub fn version(&self) -> Option<String> {
        match self.meta.get("version")? {
            Value::String(version) => Some(version.clone()),
            Value::Number(version) => Some(version.to_string()),
            _ => None,
        }
    }

    pub fn is_legacy(&self) -> bool {
        self.version().as_deref() == Some(LEGACY_PLUGIN_VERSION)
    }

    /// Configured parameters, if any are set
    pub fn parameters(&self) -> Option<&Map<String, Value>> {
        self.attributes
            .get("parameters")
            .and_then(Value::as_object)
            .filter(|parameters| !parameters.is_empty())
    }

    pub fn name(&self) -> Option<&str> {
        self.attributes.get("name").and_then(Value::as_str)
    }
}

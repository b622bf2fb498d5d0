//! Typed custom resources and the schema checks that decode them from the
//! store's generic JSON representation.

pub mod email;
pub mod sender;

use serde_json::Value;

pub use email::{DeliveryStatus, Email, EmailSpec, EmailStatus};
pub use sender::{SenderConfig, SenderConfigSpec};

/// API group shared by both custom resources.
pub const DEFAULT_GROUP: &str = "mailerlite.task.com";
/// API version shared by both custom resources.
pub const DEFAULT_VERSION: &str = "v1";

/// A (group, version, plural) triple plus the kind name, enough to address a
/// resource collection through a generic API.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKind {
    pub group: String,
    pub version: String,
    pub plural: String,
    pub kind: String,
}

impl ResourceKind {
    pub fn new(group: &str, version: &str, plural: &str, kind: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            plural: plural.to_string(),
            kind: kind.to_string(),
        }
    }

    /// `group/version`, or just `version` for the core group.
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.plural, self.group)
    }
}

/// Group and version the operator's resource kinds live under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiGroup {
    pub group: String,
    pub version: String,
}

impl Default for ApiGroup {
    fn default() -> Self {
        Self {
            group: DEFAULT_GROUP.to_string(),
            version: DEFAULT_VERSION.to_string(),
        }
    }
}

impl ApiGroup {
    pub fn emails(&self) -> ResourceKind {
        ResourceKind::new(&self.group, &self.version, "emails", "Email")
    }

    pub fn sender_configs(&self) -> ResourceKind {
        ResourceKind::new(
            &self.group,
            &self.version,
            "emailsenderconfigs",
            "EmailSenderConfig",
        )
    }
}

/// Namespace and name of a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectMeta {
    pub namespace: String,
    pub name: String,
}

/// A resource that can be decoded from the store's generic representation.
pub trait TypedResource: Sized {
    /// Human-readable kind, used in errors and logs.
    const KIND: &'static str;

    /// Select this type's collection from the configured API group.
    fn resource_kind(api: &ApiGroup) -> ResourceKind;

    /// Check `value` against the fixed schema and build the typed shape.
    ///
    /// Errors name the offending field path.
    fn decode(value: &Value) -> Result<Self, String>;
}

/// Field accessors for the explicit decode step.
pub(crate) struct Fields<'a> {
    root: &'a Value,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(root: &'a Value) -> Result<Self, String> {
        if root.is_object() {
            Ok(Self { root })
        } else {
            Err("resource is not a JSON object".to_string())
        }
    }

    fn lookup(&self, path: &str) -> Option<&'a Value> {
        path.split('.')
            .try_fold(self.root, |node, segment| node.get(segment))
    }

    /// A string field that must be present (it may be empty).
    pub(crate) fn string(&self, path: &str) -> Result<String, String> {
        match self.lookup(path) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Null) | None => Err(format!("missing field `{path}`")),
            Some(other) => Err(format!(
                "field `{path}` must be a string, found {}",
                type_name(other)
            )),
        }
    }

    /// A string field that must be present and non-empty.
    pub(crate) fn non_empty(&self, path: &str) -> Result<String, String> {
        let value = self.string(path)?;
        if value.is_empty() {
            return Err(format!("field `{path}` must not be empty"));
        }
        Ok(value)
    }

    /// A string field that may be absent or null.
    pub(crate) fn optional_string(&self, path: &str) -> Result<Option<String>, String> {
        match self.lookup(path) {
            Some(Value::Null) | None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(format!(
                "field `{path}` must be a string, found {}",
                type_name(other)
            )),
        }
    }

    /// A string field read leniently: absent, null or mistyped all read as `None`.
    pub(crate) fn string_or_unset(&self, path: &str) -> Option<String> {
        match self.lookup(path) {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        }
    }

    /// An object field that must be present.
    pub(crate) fn object(&self, path: &str) -> Result<(), String> {
        match self.lookup(path) {
            Some(Value::Object(_)) => Ok(()),
            Some(Value::Null) | None => Err(format!("missing field `{path}`")),
            Some(other) => Err(format!(
                "field `{path}` must be an object, found {}",
                type_name(other)
            )),
        }
    }

    /// `metadata.namespace` / `metadata.name`.
    pub(crate) fn metadata(&self) -> Result<ObjectMeta, String> {
        self.object("metadata")?;
        Ok(ObjectMeta {
            namespace: self.optional_string("metadata.namespace")?.unwrap_or_default(),
            name: self.non_empty("metadata.name")?,
        })
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_api_group_kinds() {
        let api = ApiGroup::default();
        let emails = api.emails();
        assert_eq!(emails.api_version(), "mailerlite.task.com/v1");
        assert_eq!(emails.plural, "emails");
        assert_eq!(emails.kind, "Email");
        assert_eq!(api.sender_configs().plural, "emailsenderconfigs");
        assert_eq!(emails.to_string(), "emails.mailerlite.task.com");
    }

    #[test]
    fn core_group_api_version() {
        let kind = ResourceKind::new("", "v1", "secrets", "Secret");
        assert_eq!(kind.api_version(), "v1");
    }

    #[test]
    fn fields_nested_lookup() {
        let value = json!({"spec": {"inner": {"leaf": "x"}}});
        let fields = Fields::new(&value).unwrap();
        assert_eq!(fields.string("spec.inner.leaf").unwrap(), "x");
        assert_eq!(
            fields.string("spec.inner.other").unwrap_err(),
            "missing field `spec.inner.other`"
        );
    }

    #[test]
    fn fields_rejects_mistyped_value() {
        let value = json!({"spec": {"subject": 42}});
        let fields = Fields::new(&value).unwrap();
        assert_eq!(
            fields.string("spec.subject").unwrap_err(),
            "field `spec.subject` must be a string, found a number"
        );
    }

    #[test]
    fn fields_rejects_non_object_root() {
        assert!(Fields::new(&json!([1, 2])).is_err());
    }

    #[test]
    fn fields_optional_string() {
        let value = json!({"a": null, "b": "y"});
        let fields = Fields::new(&value).unwrap();
        assert_eq!(fields.optional_string("a").unwrap(), None);
        assert_eq!(fields.optional_string("b").unwrap(), Some("y".to_string()));
        assert_eq!(fields.optional_string("c").unwrap(), None);
    }

    #[test]
    fn fields_string_or_unset_ignores_wrong_type() {
        let value = json!({"a": 7, "b": "y", "c": {"d": true}});
        let fields = Fields::new(&value).unwrap();
        assert_eq!(fields.string_or_unset("a"), None);
        assert_eq!(fields.string_or_unset("b"), Some("y".to_string()));
        assert_eq!(fields.string_or_unset("c"), None);
        assert_eq!(fields.string_or_unset("missing"), None);
    }

    #[test]
    fn fields_non_empty() {
        let value = json!({"a": ""});
        let fields = Fields::new(&value).unwrap();
        assert_eq!(
            fields.non_empty("a").unwrap_err(),
            "field `a` must not be empty"
        );
    }
}

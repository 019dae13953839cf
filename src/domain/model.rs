use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One fenced region recovered from a raw draft. `filename` is best-effort;
/// callers fall back to a generated name when it is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: String,
    pub content: String,
    pub filename: Option<String>,
}

impl CodeBlock {
    pub fn new(language: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            content: content.into(),
            filename: None,
        }
    }

    pub fn language_lower(&self) -> String {
        self.language.to_ascii_lowercase()
    }

    pub fn filename_lower(&self) -> String {
        self.filename
            .as_deref()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            "PATCH" => Some(Self::Patch),
            "HEAD" => Some(Self::Head),
            "OPTIONS" => Some(Self::Options),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// Lowercase form used by Express-style route declarations.
    pub fn as_lower(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
            Self::Patch => "patch",
            Self::Head => "head",
            Self::Options => "options",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("Unknown HTTP method: {}", value))
    }
}

impl From<HttpMethod> for String {
    fn from(value: HttpMethod) -> Self {
        value.as_str().to_string()
    }
}

impl Serialize for HttpMethod {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("Unknown HTTP method: {}", s)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Endpoint {
    pub method: HttpMethod,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Endpoint {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            request: None,
            response: None,
        }
    }
}

/// Canonical machine-checkable description of the generated HTTP surface.
/// `base_url` is normalized to start with `/`; duplicate (method, path)
/// pairs are tolerated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contract {
    pub base_url: String,
    pub endpoints: Vec<Endpoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceSchema>,
}

impl Contract {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            endpoints: Vec::new(),
            resources: Vec::new(),
        }
    }

    pub fn normalize(&mut self) {
        if !self.base_url.starts_with('/') {
            self.base_url = format!("/{}", self.base_url);
        }
    }

    pub fn normalized_base(&self) -> String {
        if self.base_url.starts_with('/') {
            self.base_url.clone()
        } else {
            format!("/{}", self.base_url)
        }
    }

    pub fn has_endpoint(&self, method: HttpMethod, path: &str) -> bool {
        self.endpoints
            .iter()
            .any(|e| e.method == method && e.path == path)
    }

    /// True when `(method, path)` matches directly or with the base prefix
    /// applied, e.g. `/tasks` against a declared `/api/tasks`.
    pub fn covers(&self, method: HttpMethod, path: &str) -> bool {
        if self.has_endpoint(method, path) {
            return true;
        }
        let base = self.normalized_base();
        if base != "/" {
            let prefixed = format!("{}{}", base, path);
            if self.has_endpoint(method, &prefixed) {
                return true;
            }
        }
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Enum,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

impl Field {
    pub fn required_string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::String,
            required: true,
            values: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceSchema {
    pub name: String,
    pub schema: Vec<Field>,
}

impl ResourceSchema {
    /// Minimal schema used when the contract carries no field typing.
    pub fn fallback(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: vec![Field::required_string("name")],
        }
    }

    pub fn required_fields(&self) -> Vec<&Field> {
        self.schema.iter().filter(|f| f.required).collect()
    }

    pub fn has_boolean_field(&self) -> bool {
        self.schema
            .iter()
            .any(|f| f.field_type == FieldType::Boolean)
    }
}

/// Target backend runtime convention a structured archive is scaffolded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackPreset {
    Flask,
    Express,
    Spring,
}

impl StackPreset {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flask" => Some(Self::Flask),
            "express" => Some(Self::Express),
            "spring" => Some(Self::Spring),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flask => "flask",
            Self::Express => "express",
            Self::Spring => "spring",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Self::Flask => 5001,
            Self::Express => 3000,
            Self::Spring => 8080,
        }
    }
}

impl fmt::Display for StackPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Archive-relative path -> file content. The ordered map keeps the emitted
/// file set, and therefore the archive bytes, deterministic.
pub type ProjectFiles = BTreeMap<String, String>;

/// One network call recovered from a client-side script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub method: HttpMethod,
    pub url: String,
}

/// Advisory result of checking recovered client calls against the contract.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossCheckReport {
    pub missing: Vec<FetchCall>,
}

impl CrossCheckReport {
    pub fn is_ok(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn message(&self) -> Option<String> {
        if self.missing.is_empty() {
            return None;
        }
        let items: Vec<String> = self
            .missing
            .iter()
            .map(|c| format!("{} {}", c.method, c.url))
            .collect();
        Some(format!(
            "Frontend fetch usage not covered by contract: {}",
            items.join(", ")
        ))
    }
}

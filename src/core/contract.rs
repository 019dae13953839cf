//! Contract validation, inference and resource-schema derivation.

use crate::domain::model::{
    CodeBlock, Contract, Endpoint, Field, FieldType, HttpMethod, ResourceSchema,
};
use crate::utils::error::{PackError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Structural validation of a loose JSON value against the required
/// contract shape: `base_url` present and a string, `endpoints` present and
/// an array, each endpoint an object with a string `path` and a known
/// `method`. Never executes or type-checks handler bodies.
pub fn validate_contract(value: &Value) -> Result<()> {
    let obj = value
        .as_object()
        .ok_or_else(|| contract_error("Contract must be an object"))?;

    match obj.get("base_url") {
        Some(Value::String(_)) => {}
        Some(_) => return Err(contract_error("Field 'base_url' must be a string")),
        None => return Err(contract_error("Missing base_url or endpoints")),
    }

    let endpoints = match obj.get("endpoints") {
        Some(Value::Array(a)) => a,
        Some(_) => return Err(contract_error("Field 'endpoints' must be an array")),
        None => return Err(contract_error("Missing base_url or endpoints")),
    };

    for (i, ep) in endpoints.iter().enumerate() {
        let ep_obj = ep
            .as_object()
            .ok_or_else(|| contract_error(&format!("Endpoint {} must be an object", i)))?;
        match ep_obj.get("path") {
            Some(Value::String(_)) => {}
            _ => return Err(contract_error(&format!("Endpoint {} is missing 'path'", i))),
        }
        match ep_obj.get("method") {
            Some(Value::String(m)) if HttpMethod::parse(m).is_some() => {}
            Some(Value::String(m)) => {
                return Err(contract_error(&format!(
                    "Endpoint {} has unknown method '{}'",
                    i, m
                )))
            }
            _ => {
                return Err(contract_error(&format!(
                    "Endpoint {} is missing 'method'",
                    i
                )))
            }
        }
    }

    Ok(())
}

fn contract_error(message: &str) -> PackError {
    PackError::ContractError {
        message: message.to_string(),
    }
}

static FLASK_ROUTE_WITH_METHODS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"@\s*app\s*\.\s*route\s*\(\s*['"]([^'"]+)['"]\s*,\s*methods\s*=\s*\[([^\]]+)\]\s*\)"#,
    )
    .unwrap()
});

static FLASK_ROUTE_BARE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"@\s*app\s*\.\s*route\s*\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());

static QUOTED_METHOD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"['"]([A-Za-z]+)['"]"#).unwrap());

static EXPRESS_ROUTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)app\s*\.\s*(get|post|put|delete|patch)\s*\(\s*['"]([^'"]+)['"]"#).unwrap()
});

/// Minimal heuristic to derive a contract from raw backend text when no
/// explicit contract block exists. Recognizes the Flask
/// `@app.route(path, methods=[...])` idiom (the bare form defaults to GET)
/// and the Express `app.verb(path, ...)` idiom.
pub fn infer_contract_from_text(text: &str) -> Contract {
    let mut endpoints = Vec::new();

    for caps in FLASK_ROUTE_WITH_METHODS_RE.captures_iter(text) {
        let path = caps[1].to_string();
        for m in QUOTED_METHOD_RE.captures_iter(&caps[2]) {
            if let Some(method) = HttpMethod::parse(&m[1]) {
                endpoints.push(Endpoint::new(method, path.clone()));
            }
        }
    }
    for caps in FLASK_ROUTE_BARE_RE.captures_iter(text) {
        endpoints.push(Endpoint::new(HttpMethod::Get, caps[1].to_string()));
    }
    for caps in EXPRESS_ROUTE_RE.captures_iter(text) {
        if let Some(method) = HttpMethod::parse(&caps[1]) {
            endpoints.push(Endpoint::new(method, caps[2].to_string()));
        }
    }

    let base_url = if endpoints.iter().any(|e| e.path.starts_with("/api")) {
        "/api"
    } else {
        "/"
    };

    let mut contract = Contract::new(base_url);
    contract.endpoints = endpoints;
    contract
}

/// Scans blocks whose language tag is `json` or whose filename ends with
/// `api_contract.json`, and returns the first one that parses and
/// structurally validates. Malformed candidates are skipped, never raised.
pub fn load_contract_from_blocks(blocks: &[CodeBlock]) -> Option<Contract> {
    for block in blocks {
        if !is_contract_candidate(block) {
            continue;
        }
        let Ok(value) = serde_json::from_str::<Value>(&block.content) else {
            continue;
        };
        if validate_contract(&value).is_err() {
            continue;
        }
        if let Ok(mut contract) = serde_json::from_value::<Contract>(value) {
            contract.normalize();
            return Some(contract);
        }
    }
    None
}

pub(crate) fn is_contract_candidate(block: &CodeBlock) -> bool {
    block.language_lower() == "json" || block.filename_lower().ends_with("api_contract.json")
}

/// A JSON block that carries both contract keys, used to route the block to
/// `docs/` instead of the backend tree even when it fails strict validation.
pub(crate) fn looks_like_contract_block(block: &CodeBlock) -> bool {
    block.filename_lower() == "api_contract.json"
        || (block.language_lower() == "json"
            && block.content.contains("\"endpoints\"")
            && block.content.contains("\"base_url\""))
}

/// Contract resolution order for the synthesis pipeline: explicit caller
/// contract, then a contract block among the extracted blocks, then
/// inference from the raw text, then a hard-coded single-resource default.
pub fn resolve_contract(
    explicit: Option<Contract>,
    blocks: &[CodeBlock],
    back_text: &str,
    resource: &str,
) -> Contract {
    if let Some(mut contract) = explicit {
        contract.normalize();
        return contract;
    }
    if let Some(contract) = load_contract_from_blocks(blocks) {
        return contract;
    }
    let inferred = infer_contract_from_text(back_text);
    if !inferred.endpoints.is_empty() {
        return inferred;
    }
    single_resource_default(resource)
}

/// Four conventional CRUD endpoints for `resource` under `/api`.
pub fn single_resource_default(resource: &str) -> Contract {
    let collection = format!("/api/{}", resource);
    let item = format!("/api/{}/:id", resource);
    let mut contract = Contract::new("/api");
    contract.endpoints = vec![
        Endpoint::new(HttpMethod::Get, collection.clone()),
        Endpoint::new(HttpMethod::Post, collection),
        Endpoint::new(HttpMethod::Put, item.clone()),
        Endpoint::new(HttpMethod::Delete, item),
    ];
    contract
}

/// Reads the resource's field schema out of the contract: a declared
/// `resources` entry wins; otherwise the creation endpoint's request body
/// is interpreted field by field; with no typing at all, a single required
/// string field named `name` is assumed.
pub fn derive_resource_schema(contract: &Contract, resource: &str) -> ResourceSchema {
    if let Some(declared) = contract.resources.iter().find(|r| r.name == resource) {
        if !declared.schema.is_empty() {
            return declared.clone();
        }
    }

    if let Some(endpoint) = creation_endpoint(contract) {
        if let Some(request) = &endpoint.request {
            let fields: Vec<Field> = request
                .iter()
                .filter_map(|(name, spec)| field_from_spec(name, spec))
                .collect();
            if !fields.is_empty() {
                return ResourceSchema {
                    name: resource.to_string(),
                    schema: fields,
                };
            }
        }
    }

    ResourceSchema::fallback(resource)
}

/// The creation endpoint is the first POST whose path sits under `base_url`
/// with at least one extra path segment.
fn creation_endpoint(contract: &Contract) -> Option<&Endpoint> {
    let base = contract.normalized_base();
    contract.endpoints.iter().find(|e| {
        if e.method != HttpMethod::Post {
            return false;
        }
        let rel = if base != "/" {
            match e.path.strip_prefix(&base) {
                Some(rest) => rest,
                None => e.path.as_str(),
            }
        } else {
            e.path.as_str()
        };
        rel.trim_matches('/').split('/').any(|seg| !seg.is_empty())
    })
}

fn field_from_spec(name: &str, spec: &Value) -> Option<Field> {
    match spec {
        Value::String(type_name) => Some(Field {
            name: name.to_string(),
            field_type: field_type_from_name(type_name),
            required: true,
            values: None,
        }),
        Value::Array(values) => {
            let values: Vec<String> = values
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            Some(Field {
                name: name.to_string(),
                field_type: FieldType::Enum,
                required: true,
                values: if values.is_empty() { None } else { Some(values) },
            })
        }
        Value::Object(obj) => {
            let field_type = obj
                .get("type")
                .and_then(Value::as_str)
                .map(field_type_from_name)
                .unwrap_or(FieldType::String);
            let required = obj.get("required").and_then(Value::as_bool).unwrap_or(true);
            let values = obj.get("values").and_then(Value::as_array).map(|a| {
                a.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            });
            Some(Field {
                name: name.to_string(),
                field_type,
                required,
                values,
            })
        }
        // Sample values type themselves.
        Value::Bool(_) => Some(Field {
            name: name.to_string(),
            field_type: FieldType::Boolean,
            required: true,
            values: None,
        }),
        Value::Number(_) => Some(Field {
            name: name.to_string(),
            field_type: FieldType::Number,
            required: true,
            values: None,
        }),
        Value::Null => None,
    }
}

fn field_type_from_name(name: &str) -> FieldType {
    match name.trim().to_ascii_lowercase().as_str() {
        "number" | "integer" | "int" | "float" | "double" => FieldType::Number,
        "boolean" | "bool" => FieldType::Boolean,
        "enum" => FieldType::Enum,
        _ => FieldType::String,
    }
}

//! Resource-name inference: the primary collection noun the generated CRUD
//! surface operates on, recovered from task text, contract paths and code.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static PATH_NOUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(?:api/)?([a-zA-Z][a-zA-Z0-9_-]+)(?:/|\b)").unwrap());

static JSON_PATH_NOUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""path"\s*:\s*"/(?:api/)?([a-zA-Z0-9_-]+)""#).unwrap());

static CRUD_PT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)crud\s+de\s+([a-zA-Zçáéíóúâêôãõü]+)").unwrap());

static CRUD_EN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)crud\s+of\s+([a-zA-Z]+)").unwrap());

const DEFAULT_RESOURCE: &str = "users";

/// Infers the resource collection name from the task description and any
/// code/contract blobs. Heuristic best-effort, used purely to make the
/// generated scaffolding read naturally; it never blocks synthesis.
pub fn infer_resource(task: &str, front: Option<&str>, back: Option<&str>, qa: Option<&str>) -> String {
    let texts = [
        task,
        front.unwrap_or_default(),
        back.unwrap_or_default(),
        qa.unwrap_or_default(),
    ];

    let mut candidates: Vec<String> = Vec::new();
    for text in texts {
        for caps in PATH_NOUN_RE.captures_iter(text) {
            let noun = caps[1].to_ascii_lowercase();
            if noun == "health" {
                continue;
            }
            candidates.push(noun);
        }
        for caps in JSON_PATH_NOUN_RE.captures_iter(text) {
            candidates.push(caps[1].to_ascii_lowercase());
        }
        if let Some(caps) = CRUD_PT_RE.captures(text) {
            candidates.push(caps[1].to_lowercase());
        }
        if let Some(caps) = CRUD_EN_RE.captures(text) {
            candidates.push(caps[1].to_lowercase());
        }
    }

    let resource = mode_first_seen(&candidates).unwrap_or_else(|| DEFAULT_RESOURCE.to_string());
    normalize_resource(&resource)
}

/// Most frequent candidate; ties broken by first appearance so the result
/// does not depend on hash iteration order.
fn mode_first_seen(candidates: &[String]) -> Option<String> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (idx, candidate) in candidates.iter().enumerate() {
        let entry = counts.entry(candidate.as_str()).or_insert((0, idx));
        entry.0 += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1 .0.cmp(&b.1 .0).then(b.1 .1.cmp(&a.1 .1)))
        .map(|(name, _)| name.to_string())
}

fn normalize_resource(raw: &str) -> String {
    let mut resource = raw.to_string();
    if let Some(stripped) = resource.split("/:").next() {
        resource = stripped.to_string();
    }
    if let Some(stripped) = resource.strip_suffix(":id") {
        resource = stripped.to_string();
    }
    let plural = pluralize(&resource);
    plural
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '-')
        .collect()
}

/// Forced English pluralization with simple suffix rules: `y` -> `ies`,
/// trailing `m` -> `ns`, anything else gains an `s`.
pub fn pluralize(word: &str) -> String {
    if word.ends_with('s') {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix('y') {
        return format!("{}ies", stem);
    }
    if let Some(stem) = word.strip_suffix('m') {
        return format!("{}ns", stem);
    }
    format!("{}s", word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_resource_when_no_signal() {
        assert_eq!(infer_resource("build something nice", None, None, None), "users");
    }

    #[test]
    fn test_portuguese_crud_idiom_is_pluralized() {
        let resource = infer_resource("CRUD de produto", None, None, None);
        assert_eq!(resource, "produtos");
        assert_ne!(resource, "produto");
    }

    #[test]
    fn test_english_crud_idiom() {
        assert_eq!(infer_resource("a CRUD of company records", None, None, None), "companies");
    }

    #[test]
    fn test_trailing_m_pluralization() {
        // pt-BR nouns like 'item' pluralize with 'ns'.
        assert_eq!(pluralize("item"), "itens");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("task"), "tasks");
        assert_eq!(pluralize("users"), "users");
    }

    #[test]
    fn test_api_paths_outvote_single_mentions() {
        let back = "app.get('/api/notes')\napp.post('/api/notes')\napp.get('/api/notes/:id')";
        assert_eq!(infer_resource("make an app", None, Some(back), None), "notes");
    }

    #[test]
    fn test_health_paths_are_ignored() {
        let back = "app.get('/health')\napp.get('/api/books')";
        assert_eq!(infer_resource("", None, Some(back), None), "books");
    }

    #[test]
    fn test_json_contract_paths_count() {
        let back = r#"{"path": "/api/orders"} {"path": "/api/orders"}"#;
        assert_eq!(infer_resource("", None, Some(back), None), "orders");
    }

    #[test]
    fn test_tie_broken_by_first_seen() {
        let back = "app.get('/api/alpha')\napp.get('/api/beta')";
        assert_eq!(infer_resource("", None, Some(back), None), "alphas");
    }
}

//! Advisory cross-check of client-side network calls against the contract.

use crate::domain::model::{Contract, CrossCheckReport, FetchCall, HttpMethod};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use url::Url;

static FETCH_RE: Lazy<Regex> = Lazy::new(|| {
    // fetch('URL') or fetch('URL', { ...method: 'POST'... })
    Regex::new(r#"fetch\(\s*['"]([^'"]+)['"]\s*(?:,\s*\{((?s:.*?))\})?\s*\)"#).unwrap()
});

static METHOD_OPTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)method\s*:\s*['"]([A-Za-z]+)['"]"#).unwrap());

/// Recovers `(method, url)` pairs from `fetch()` calls with best-effort
/// parsing of the options object. The verb defaults to GET and is read from
/// an explicit `method:` option when present.
pub fn extract_fetch_calls(script: &str) -> Vec<FetchCall> {
    let mut calls = Vec::new();
    for caps in FETCH_RE.captures_iter(script) {
        let url = caps[1].to_string();
        let method = caps
            .get(2)
            .and_then(|opts| METHOD_OPTION_RE.captures(opts.as_str()))
            .and_then(|m| HttpMethod::parse(&m[1]))
            .unwrap_or(HttpMethod::Get);
        calls.push(FetchCall { method, url });
    }
    calls
}

/// Normalizes a recovered URL to its path component: absolute URLs are
/// parsed properly, relative ones are stripped of query and fragment.
pub fn url_path(raw: &str) -> String {
    if let Ok(parsed) = Url::parse(raw) {
        let path = parsed.path();
        if !path.is_empty() {
            return path.to_string();
        }
    }
    raw.split(['?', '#']).next().unwrap_or(raw).to_string()
}

/// Checks that every recovered call in the `.js`/`.ts` files is covered by
/// the contract, either exactly or after stripping the contract's base
/// prefix from the call path. Never errors; no calls at all trivially
/// passes — this catches integration drift, it does not require
/// integration.
pub fn check_frontend_against_contract(
    frontend_files: &BTreeMap<String, String>,
    contract: &Contract,
) -> CrossCheckReport {
    let mut used = Vec::new();
    for (path, content) in frontend_files {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".js") || lower.ends_with(".ts") {
            used.extend(extract_fetch_calls(content));
        }
    }

    let base = contract.normalized_base();
    let mut missing = Vec::new();
    for call in used {
        let path = url_path(&call.url);
        if contract.has_endpoint(call.method, &path) {
            continue;
        }
        // Tolerate an absent base prefix on the contract side.
        if base != "/" {
            if let Some(stripped) = path.strip_prefix(base.as_str()) {
                let alt = if stripped.is_empty() { "/" } else { stripped };
                if contract.has_endpoint(call.method, alt) {
                    continue;
                }
            }
        }
        missing.push(FetchCall {
            method: call.method,
            url: path,
        });
    }

    CrossCheckReport { missing }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Endpoint;

    fn contract_with(endpoints: &[(HttpMethod, &str)]) -> Contract {
        let mut contract = Contract::new("/api");
        for (method, path) in endpoints {
            contract.endpoints.push(Endpoint::new(*method, *path));
        }
        contract
    }

    #[test]
    fn test_extract_defaults_to_get() {
        let calls = extract_fetch_calls("fetch('/api/tasks')");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, HttpMethod::Get);
        assert_eq!(calls[0].url, "/api/tasks");
    }

    #[test]
    fn test_extract_reads_method_from_options() {
        let script = "fetch('/api/tasks', { method: 'POST', body: JSON.stringify(t) })";
        let calls = extract_fetch_calls(script);
        assert_eq!(calls[0].method, HttpMethod::Post);
    }

    #[test]
    fn test_extract_multiline_options() {
        let script = "fetch('/api/tasks', {\n  method: 'DELETE'\n})";
        let calls = extract_fetch_calls(script);
        assert_eq!(calls[0].method, HttpMethod::Delete);
    }

    #[test]
    fn test_url_path_normalizes_absolute_urls() {
        assert_eq!(url_path("http://127.0.0.1:5001/api/tasks"), "/api/tasks");
        assert_eq!(url_path("/api/tasks?page=1"), "/api/tasks");
        assert_eq!(url_path("/api/tasks#list"), "/api/tasks");
    }

    #[test]
    fn test_covered_and_uncovered_calls_in_same_input() {
        let contract = contract_with(&[(HttpMethod::Get, "/api/tasks")]);
        let mut files = BTreeMap::new();
        files.insert(
            "script.js".to_string(),
            "fetch('/api/tasks')\nfetch('/api/missing', { method: 'POST' })".to_string(),
        );
        let report = check_frontend_against_contract(&files, &contract);
        assert!(!report.is_ok());
        assert_eq!(report.missing.len(), 1);
        assert_eq!(report.missing[0].url, "/api/missing");
        assert_eq!(report.missing[0].method, HttpMethod::Post);
        assert!(report.message().unwrap().contains("POST /api/missing"));
    }

    #[test]
    fn test_base_prefix_stripping_covers_call() {
        // Contract declares the path without the /api prefix.
        let contract = contract_with(&[(HttpMethod::Get, "/tasks")]);
        let mut files = BTreeMap::new();
        files.insert("app.js".to_string(), "fetch('/api/tasks')".to_string());
        let report = check_frontend_against_contract(&files, &contract);
        assert!(report.is_ok());
    }

    #[test]
    fn test_no_network_calls_trivially_passes() {
        let contract = contract_with(&[]);
        let mut files = BTreeMap::new();
        files.insert("script.js".to_string(), "console.log('static')".to_string());
        files.insert("index.html".to_string(), "<h1>mockup</h1>".to_string());
        let report = check_frontend_against_contract(&files, &contract);
        assert!(report.is_ok());
        assert!(report.message().is_none());
    }

    #[test]
    fn test_non_script_files_are_ignored() {
        let contract = contract_with(&[]);
        let mut files = BTreeMap::new();
        files.insert(
            "index.html".to_string(),
            "<script>fetch('/api/unchecked')</script>".to_string(),
        );
        let report = check_frontend_against_contract(&files, &contract);
        assert!(report.is_ok());
    }
}

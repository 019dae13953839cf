use draftpack::{
    check_frontend_against_contract, extract_blocks, infer_contract_from_text, infer_resource,
    load_contract_from_blocks, validate_contract, HttpMethod,
};
use serde_json::json;
use std::collections::BTreeMap;

#[test]
fn test_validate_contract_shapes() {
    assert!(validate_contract(&json!({})).is_err());
    assert!(validate_contract(&json!({"base_url": "/api", "endpoints": []})).is_ok());
    assert!(validate_contract(&json!({"base_url": "/api"})).is_err());
    assert!(validate_contract(&json!({
        "base_url": "/api",
        "endpoints": [{"method": "FETCH", "path": "/x"}]
    }))
    .is_err());
}

#[test]
fn test_contract_block_wins_over_inference() {
    let back = r#"The contract:

```json
{"base_url": "/api", "endpoints": [{"method": "GET", "path": "/api/notes"}]}
```

And unrelated code:

```python
@app.route('/api/other', methods=['POST'])
def other():
    return []
```
"#;
    let blocks = extract_blocks(back);
    let contract = load_contract_from_blocks(&blocks).unwrap();
    assert!(contract.has_endpoint(HttpMethod::Get, "/api/notes"));
    assert!(!contract.has_endpoint(HttpMethod::Post, "/api/other"));
}

#[test]
fn test_inference_recovers_both_route_idioms() {
    let back = "@app.route('/api/tasks', methods=['GET', 'POST'])\napp.delete('/api/tasks/:id', handler)";
    let contract = infer_contract_from_text(back);
    assert_eq!(contract.base_url, "/api");
    assert!(contract.has_endpoint(HttpMethod::Get, "/api/tasks"));
    assert!(contract.has_endpoint(HttpMethod::Post, "/api/tasks"));
    assert!(contract.has_endpoint(HttpMethod::Delete, "/api/tasks/:id"));
}

#[test]
fn test_crosscheck_reports_only_uncovered_calls() {
    let contract = infer_contract_from_text(
        "@app.route('/api/tasks', methods=['GET', 'POST'])\ndef tasks(): pass",
    );

    let mut files = BTreeMap::new();
    files.insert(
        "script.js".to_string(),
        concat!(
            "fetch('http://127.0.0.1:5001/api/tasks')\n",
            "fetch('/api/tasks', { method: 'POST', body: JSON.stringify(t) })\n",
            "fetch('/api/reports', { method: 'DELETE' })\n",
        )
        .to_string(),
    );

    let report = check_frontend_against_contract(&files, &contract);
    assert!(!report.is_ok());
    assert_eq!(report.missing.len(), 1);
    assert_eq!(report.missing[0].method, HttpMethod::Delete);
    assert_eq!(report.missing[0].url, "/api/reports");
}

#[test]
fn test_crosscheck_strips_base_prefix_from_call_paths() {
    // Contract declares bare paths under base /api; the client calls the
    // prefixed form. Stripping the base from the call path covers it.
    let mut contract = infer_contract_from_text("app.get('/tasks', handler)");
    contract.base_url = "/api".to_string();
    let mut files = BTreeMap::new();
    files.insert("app.js".to_string(), "fetch('/api/tasks')".to_string());
    let report = check_frontend_against_contract(&files, &contract);
    assert!(report.is_ok());
}

#[test]
fn test_resource_inference_end_to_end() {
    assert_eq!(infer_resource("CRUD de produto", None, None, None), "produtos");
    assert_eq!(
        infer_resource(
            "make an app",
            None,
            Some("app.get('/api/notes')\napp.post('/api/notes')"),
            None
        ),
        "notes"
    );
    assert_eq!(infer_resource("anything", None, None, None), "users");
}

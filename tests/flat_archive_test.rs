use draftpack::synthesize_flat_archive;
use std::collections::BTreeMap;

fn unzip(bytes: &[u8]) -> BTreeMap<String, String> {
    let cursor = std::io::Cursor::new(bytes.to_vec());
    let mut archive = zip::ZipArchive::new(cursor).unwrap();
    let mut entries = BTreeMap::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        let mut content = String::new();
        std::io::Read::read_to_string(&mut file, &mut content).unwrap();
        entries.insert(file.name().to_string(), content);
    }
    entries
}

#[test]
fn test_flat_scaffolds_every_detected_stack() {
    let back = r#"A Flask backend:

```python
from flask import Flask
app = Flask(__name__)

@app.route('/api/notes', methods=['GET'])
def list_notes():
    return []
```

And the same idea in Express:

```javascript
const express = require('express');
const app = express();
app.get('/api/notes', (req, res) => res.json([]));
app.listen(3000);
```
"#;
    let bytes = synthesize_flat_archive("CRUD of notes", "", "", back, "").unwrap();
    let entries = unzip(&bytes);

    // Both stacks detected from the blocks.
    assert!(entries.contains_key("backend/requirements.txt"));
    assert!(entries.contains_key("backend/package.json"));
    assert!(entries.contains_key("backend/app/__init__.py"));
    assert!(entries.contains_key("backend/src/index.js"));

    // The flat README names both run paths.
    let readme = &entries["README.md"];
    assert!(readme.contains("Flask"));
    assert!(readme.contains("Express"));

    let listens: usize = entries
        .values()
        .map(|c| c.matches("app.listen(").count())
        .sum();
    assert_eq!(listens, 1);
    let app_runs: usize = entries.values().map(|c| c.matches("app.run(").count()).sum();
    assert_eq!(app_runs, 0);
}

#[test]
fn test_flat_preserves_raw_drafts_and_routes_qa_blocks() {
    let front = "the UI\n```html\n<h1>Notes</h1>\n```";
    let back = "the API\n```python\nfrom flask import Flask\n```";
    let qa = "tests\n```javascript\ndescribe('login flow', () => {});\n```\n```python\ndef test_create():\n    pass\n```";

    let bytes = synthesize_flat_archive("CRUD of notes", "Python", front, back, qa).unwrap();
    let entries = unzip(&bytes);

    assert_eq!(entries["frontend/FRONT_RAW.md"], front);
    assert_eq!(entries["backend/README.md"], back);
    assert_eq!(entries["qa/README.md"], qa);
    assert!(entries["qa/login.test.js"].contains("describe('login flow'"));
    assert!(entries["qa/tests_example_2.py"].contains("def test_create"));
}

#[test]
fn test_flat_with_no_blocks_still_yields_usable_frontend() {
    let bytes = synthesize_flat_archive("build something", "", "", "", "").unwrap();
    let entries = unzip(&bytes);

    // No fenced blocks anywhere degrades to the login-form scaffold.
    assert!(entries["frontend/index.html"].contains("loginForm"));
    assert!(entries["frontend/script.js"].contains("apiFetch"));
    assert!(entries.contains_key("docs/api_contract.json"));
    assert!(!entries.contains_key("frontend/FRONT_RAW.md"));
    assert!(!entries.contains_key("backend/README.md"));
}

#[test]
fn test_flat_contract_json_reflects_inferred_routes() {
    let back = "```python\n@app.route('/api/books', methods=['GET', 'POST'])\ndef books():\n    return []\n```";
    let bytes = synthesize_flat_archive("manage books", "Python", "", back, "").unwrap();
    let entries = unzip(&bytes);

    let contract = &entries["docs/api_contract.json"];
    assert!(contract.contains("\"base_url\": \"/api\""));
    assert!(contract.contains("\"GET\""));
    assert!(contract.contains("\"POST\""));
    assert!(contract.contains("/api/books"));
}

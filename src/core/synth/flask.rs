//! Flask stack strategy: shared app in `backend/app/__init__.py`, model
//! route files sanitized into `backend/app/`, contract-driven blueprint in
//! `backend/app/main.py`. The `flask run` CLI owns startup, so the emitted
//! tree contains no `app.run` statement at all.

use crate::core::sanitize::{sanitize_flask_python, sanitize_generic_filename};
use crate::core::synth::{flask_path, path_slug, plan_endpoints, PlannedEndpoint, ResourceRoute};
use crate::domain::model::{CodeBlock, HttpMethod, ProjectFiles, StackPreset};
use crate::domain::ports::{EntrypointState, StackStrategy, SynthContext};
use once_cell::sync::Lazy;
use regex::Regex;

pub struct FlaskStrategy;

static MAIN_MODULE_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)backend/app/main\.py").unwrap());

const REQUIREMENTS: &str = "flask\nitsdangerous\nflask-cors\npython-dotenv\n";

const FLASKENV: &str = "FLASK_APP=backend.app:app\nFLASK_RUN_PORT=5001\n";

const APP_INIT: &str = r#"from flask import Flask, Blueprint
from flask_cors import CORS
import pkgutil, importlib

app = Flask(__name__)
CORS(app)

@app.get('/health')
def _health():
    return {"status": "ok"}

def _register_blueprints():
    # Explicit registration of 'main' first, then auto-discovery.
    try:
        from .main import main as main_bp
        if 'main' not in app.blueprints:
            app.register_blueprint(main_bp)
    except Exception as e:
        print(f"[app] Could not register blueprint 'main': {e}")

    try:
        for _, modname, _ in pkgutil.iter_modules(__path__):
            try:
                m = importlib.import_module(f"{__name__}.{modname}")
                for attr_name in dir(m):
                    obj = getattr(m, attr_name)
                    if isinstance(obj, Blueprint) and obj.name not in app.blueprints:
                        app.register_blueprint(obj)
            except Exception as e:
                print(f"[app] Skipping module {modname}: {e}")
    except Exception as e:
        print(f"[app] Blueprint discovery failed: {e}")

    print(f"[app] Registered blueprints: {list(app.blueprints.keys())}")

_register_blueprints()
"#;

impl StackStrategy for FlaskStrategy {
    fn preset(&self) -> StackPreset {
        StackPreset::Flask
    }

    fn scaffold(&self, _ctx: &SynthContext, files: &mut ProjectFiles) {
        files.insert("backend/requirements.txt".to_string(), REQUIREMENTS.to_string());
        files.insert("backend/.flaskenv".to_string(), FLASKENV.to_string());
        files.insert("backend/app/__init__.py".to_string(), APP_INIT.to_string());
    }

    fn place_block(
        &self,
        _ctx: &SynthContext,
        _state: &mut EntrypointState,
        index: usize,
        block: &CodeBlock,
        files: &mut ProjectFiles,
    ) {
        let lang = block.language_lower();
        let content_lower = block.content.to_ascii_lowercase();
        if matches!(lang.as_str(), "python" | "py")
            || content_lower.contains("flask")
            || content_lower.contains("@app.route")
        {
            let name = sanitize_generic_filename(
                "python",
                block.filename.as_deref(),
                &format!("routes_{}", index),
            );
            files.insert(
                format!("backend/app/{}", name),
                sanitize_flask_python(&block.content),
            );
        } else if matches!(lang.as_str(), "bash" | "sh") {
            let name = sanitize_generic_filename(
                &lang,
                block.filename.as_deref(),
                &format!("server_part_{}", index),
            );
            files.insert(format!("backend/scripts/{}", name), block.content.clone());
        } else {
            let name = sanitize_generic_filename(
                &lang,
                block.filename.as_deref(),
                &format!("server_part_{}", index),
            );
            files.insert(format!("backend/{}", name), block.content.clone());
        }
    }

    fn emit_entrypoint(
        &self,
        ctx: &SynthContext,
        _state: &mut EntrypointState,
        back_text: &str,
        _blocks: &[CodeBlock],
        files: &mut ProjectFiles,
    ) {
        // The model owns main.py when the draft names it; the block with
        // that filename has already been placed.
        if MAIN_MODULE_REF_RE.is_match(back_text) {
            return;
        }
        files.insert(
            "backend/app/main.py".to_string(),
            blueprint_module(ctx, &plan_endpoints(ctx)),
        );
    }

    fn finalize(&self, _ctx: &SynthContext, _state: &EntrypointState, _files: &mut ProjectFiles) {}

    fn run_notes(&self, _ctx: &SynthContext) -> String {
        "1) Backend (Flask)\n   - pip install -r backend/requirements.txt\n   - python -m flask --app backend.app:app run --port 5001\n".to_string()
    }
}

fn blueprint_module(ctx: &SynthContext, planned: &[PlannedEndpoint]) -> String {
    let base = ctx.base_url();
    let field_names: Vec<String> = ctx.schema.schema.iter().map(|f| f.name.clone()).collect();
    let required: Vec<String> = ctx
        .schema
        .required_fields()
        .iter()
        .map(|f| f.name.clone())
        .collect();
    let fields_list = py_str_list(&field_names);
    let required_list = py_str_list(&required);

    let mut out = String::new();
    out.push_str("from flask import Blueprint, jsonify, request\n\n");
    out.push_str(&format!(
        "main = Blueprint('main', __name__, url_prefix='{}')\n\n",
        base
    ));
    out.push_str("# In-memory store, reset on restart\n");
    out.push_str("items = []\nnext_id = 1\n\n");
    out.push_str(&format!("FIELDS = {}\n", fields_list));
    out.push_str(&format!("REQUIRED = {}\n\n", required_list));

    let mut seen_handlers: Vec<String> = Vec::new();
    for endpoint in planned {
        let rel = relative_path(&endpoint.path, &base);
        match (endpoint.route, endpoint.method) {
            (Some(ResourceRoute::Collection), HttpMethod::Get) => {
                push_handler(&mut out, &mut seen_handlers, &format!(
                    "@main.route('{rel}', methods=['GET'])\ndef list_{res}():\n    return jsonify(items)\n\n",
                    rel = flask_path(&rel),
                    res = ctx.resource,
                ), &format!("list_{}", ctx.resource));
            }
            (Some(ResourceRoute::Collection), HttpMethod::Post) => {
                push_handler(&mut out, &mut seen_handlers, &format!(
                    "@main.route('{rel}', methods=['POST'])\ndef create_{res}():\n    global next_id\n    data = request.get_json(silent=True) or {{}}\n    missing = [f for f in REQUIRED if data.get(f) in (None, '')]\n    if missing:\n        return jsonify({{'error': 'Missing required fields: ' + ', '.join(missing)}}), 400\n    item = {{'id': next_id}}\n    for f in FIELDS:\n        if f in data:\n            item[f] = data[f]\n    items.append(item)\n    next_id += 1\n    return jsonify(item), 201\n\n",
                    rel = flask_path(&rel),
                    res = ctx.resource,
                ), &format!("create_{}", ctx.resource));
            }
            (Some(ResourceRoute::Item), HttpMethod::Get) => {
                push_handler(&mut out, &mut seen_handlers, &format!(
                    "@main.route('{rel}', methods=['GET'])\ndef get_{res}_item(item_id):\n    for item in items:\n        if item['id'] == item_id:\n            return jsonify(item)\n    return jsonify({{'error': 'Not found'}}), 404\n\n",
                    rel = item_flask_path(&rel),
                    res = ctx.resource,
                ), &format!("get_{}_item", ctx.resource));
            }
            (Some(ResourceRoute::Item), HttpMethod::Put) => {
                push_handler(&mut out, &mut seen_handlers, &format!(
                    "@main.route('{rel}', methods=['PUT'])\ndef update_{res}(item_id):\n    data = request.get_json(silent=True) or {{}}\n    for item in items:\n        if item['id'] == item_id:\n            for f in FIELDS:\n                if f in data:\n                    item[f] = data[f]\n            return jsonify(item)\n    return jsonify({{'error': 'Not found'}}), 404\n\n",
                    rel = item_flask_path(&rel),
                    res = ctx.resource,
                ), &format!("update_{}", ctx.resource));
            }
            (Some(ResourceRoute::Item), HttpMethod::Delete) => {
                push_handler(&mut out, &mut seen_handlers, &format!(
                    "@main.route('{rel}', methods=['DELETE'])\ndef delete_{res}(item_id):\n    global items\n    before = len(items)\n    items = [i for i in items if i['id'] != item_id]\n    if len(items) == before:\n        return jsonify({{'error': 'Not found'}}), 404\n    return '', 204\n\n",
                    rel = item_flask_path(&rel),
                    res = ctx.resource,
                ), &format!("delete_{}", ctx.resource));
            }
            _ => {
                let name = format!(
                    "ep_{}_{}",
                    endpoint.method.as_lower(),
                    path_slug(&endpoint.path, &base)
                );
                push_handler(&mut out, &mut seen_handlers, &format!(
                    "@main.route('{rel}', methods=['{method}'])\ndef {name}(**kwargs):\n    return jsonify({{'ok': True}})\n\n",
                    rel = flask_path(&rel),
                    method = endpoint.method,
                    name = name,
                ), &name);
            }
        }
    }

    out
}

fn py_str_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| format!("'{}'", s)).collect();
    format!("[{}]", quoted.join(", "))
}

fn push_handler(out: &mut String, seen: &mut Vec<String>, handler: &str, name: &str) {
    if seen.iter().any(|s| s == name) {
        return;
    }
    seen.push(name.to_string());
    out.push_str(handler);
}

fn relative_path(path: &str, base: &str) -> String {
    let rel = if base != "/" {
        path.strip_prefix(base).unwrap_or(path)
    } else {
        path
    };
    if rel.is_empty() {
        "/".to_string()
    } else if rel.starts_with('/') {
        rel.to_string()
    } else {
        format!("/{}", rel)
    }
}

/// Item routes use a typed converter so handlers receive an integer id.
fn item_flask_path(rel: &str) -> String {
    let converted = flask_path(rel);
    match converted.rsplit_once('/') {
        Some((head, seg)) if seg.starts_with('<') => format!("{}/<int:item_id>", head),
        _ => converted,
    }
}

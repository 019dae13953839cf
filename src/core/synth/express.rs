//! Express stack strategy: all routes concentrate in `backend/src/index.js`,
//! which is either a sanitized model-provided server completed from the
//! contract, or a fully generated one. Exactly one `app.listen` survives.

use crate::core::sanitize::{sanitize_express_js, sanitize_generic_filename};
use crate::core::synth::{express_path, plan_endpoints, PlannedEndpoint, ResourceRoute};
use crate::domain::model::{CodeBlock, HttpMethod, ProjectFiles, StackPreset};
use crate::domain::ports::{EntrypointState, StackStrategy, SynthContext};

pub struct ExpressStrategy;

const SERVER_BASENAMES: [&str; 4] = ["index.js", "server.js", "app.js", "main.js"];

fn is_server_basename(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SERVER_BASENAMES.iter().any(|b| lower.ends_with(b))
}

fn is_js_block(block: &CodeBlock) -> bool {
    matches!(
        block.language_lower().as_str(),
        "javascript" | "js" | "typescript" | "ts"
    ) || block.content.to_ascii_lowercase().contains("express")
}

impl StackStrategy for ExpressStrategy {
    fn preset(&self) -> StackPreset {
        StackPreset::Express
    }

    fn scaffold(&self, ctx: &SynthContext, files: &mut ProjectFiles) {
        let package_json = format!(
            "{{\n  \"name\": \"{}\",\n  \"version\": \"0.1.0\",\n  \"private\": true,\n  \"scripts\": {{\n    \"start\": \"node src/index.js\"\n  }},\n  \"dependencies\": {{\n    \"express\": \"^4.18.2\",\n    \"cors\": \"^2.8.5\"\n  }}\n}}\n",
            ctx.project_name
        );
        files.insert("backend/package.json".to_string(), package_json);
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
        if is_js_block(block) {
            let ext_lang = match lang.as_str() {
                "typescript" | "ts" => "typescript",
                _ => "javascript",
            };
            let name = sanitize_generic_filename(
                ext_lang,
                block.filename.as_deref(),
                &format!("server_part_{}", index),
            );
            // Server-named files are not written separately; their routes
            // are folded into the scaffolded src/index.js.
            if is_server_basename(&name) {
                return;
            }
            files.insert(
                format!("backend/src/{}", name),
                sanitize_express_js(&block.content),
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
        _back_text: &str,
        blocks: &[CodeBlock],
        files: &mut ProjectFiles,
    ) {
        let planned = plan_endpoints(ctx);
        let server = match model_server_base(blocks) {
            Some(base) => complete_model_server(ctx, base, &planned),
            None => generated_server(ctx, &planned),
        };
        files.insert("backend/src/index.js".to_string(), server);
    }

    fn finalize(&self, _ctx: &SynthContext, _state: &EntrypointState, _files: &mut ProjectFiles) {}

    fn run_notes(&self, ctx: &SynthContext) -> String {
        format!(
            "1) Backend (Node/Express)\n   - cd backend\n   - npm install\n   - npm start\n   - Check: GET http://localhost:{}/health\n",
            ctx.port
        )
    }
}

/// The first model block that reads like an Express server entrypoint is
/// reused as the base of the generated index.js.
fn model_server_base(blocks: &[CodeBlock]) -> Option<String> {
    for block in blocks {
        let lang = block.language_lower();
        if !matches!(lang.as_str(), "javascript" | "js") {
            continue;
        }
        if !block.content.to_ascii_lowercase().contains("express") {
            continue;
        }
        let named_like_server = match block.filename.as_deref() {
            None => true,
            Some(f) => is_server_basename(f),
        };
        if named_like_server {
            return Some(sanitize_express_js(&block.content));
        }
    }
    None
}

/// Completes a model-supplied server: JSON middleware, CORS, health check,
/// any contract endpoints it does not already declare, and the single
/// listen call.
fn complete_model_server(ctx: &SynthContext, base: String, planned: &[PlannedEndpoint]) -> String {
    let mut js = base;

    if !js.contains("app.use(express.json())") {
        js.push_str("\napp.use(express.json());\n");
    }
    if !js.contains("require('cors')") && !js.contains("app.use(cors())") {
        js = format!("const cors = require('cors');\n{}\napp.use(cors());\n", js);
    }
    if !js.contains("/health") {
        js.push_str("\napp.get('/health', (req, res) => res.json({ status: 'ok' }));\n");
    }

    let needs_state = planned
        .iter()
        .any(|p| p.route.is_some())
        && !js.contains("const records =")
        && !js.contains("let records =");
    if needs_state {
        js.push_str("\nconst records = [];\nlet currentId = 1;\n");
    }

    for endpoint in planned {
        let path = express_path(&endpoint.path);
        let signature = format!("app.{}('{}'", endpoint.method.as_lower(), path);
        if js.contains(&signature) {
            continue;
        }
        js.push('\n');
        js.push_str(&handler_js(ctx, endpoint, &path));
    }

    if !js.contains("app.listen(") {
        if !js.contains("const PORT") && !js.contains("process.env.PORT") {
            js = format!("const PORT = process.env.PORT || {};\n{}", ctx.port, js);
        }
        js.push_str(&format!(
            "\napp.listen(process.env.PORT || {}, () => console.log('Server on ' + (process.env.PORT || {})));\n",
            ctx.port, ctx.port
        ));
    }

    js
}

/// Fully generated server when the model supplied no usable base.
fn generated_server(ctx: &SynthContext, planned: &[PlannedEndpoint]) -> String {
    let mut js = String::new();
    js.push_str("const express = require('express');\n");
    js.push_str("const cors = require('cors');\n\n");
    js.push_str("const app = express();\n");
    js.push_str(&format!("const PORT = process.env.PORT || {};\n\n", ctx.port));
    js.push_str("app.use(cors());\n");
    js.push_str("app.use(express.json());\n\n");
    js.push_str("app.get('/health', (req, res) => res.json({ status: 'ok' }));\n\n");

    if planned.iter().any(|p| p.route.is_some()) {
        js.push_str(&format!("// In-memory state for '{}'\n", ctx.resource));
        js.push_str("const records = [];\nlet currentId = 1;\n\n");
    }

    for endpoint in planned {
        let path = express_path(&endpoint.path);
        js.push_str(&handler_js(ctx, endpoint, &path));
        js.push('\n');
    }

    js.push_str("app.listen(PORT, () => console.log('Server on ' + PORT));\n");
    js
}

fn handler_js(ctx: &SynthContext, endpoint: &PlannedEndpoint, path: &str) -> String {
    let required: Vec<String> = ctx
        .schema
        .required_fields()
        .iter()
        .map(|f| format!("'{}'", f.name))
        .collect();
    let fields: Vec<String> = ctx
        .schema
        .schema
        .iter()
        .map(|f| format!("'{}'", f.name))
        .collect();

    match (endpoint.route, endpoint.method) {
        (Some(ResourceRoute::Collection), HttpMethod::Get) => {
            format!("app.get('{}', (req, res) => res.json(records));\n", path)
        }
        (Some(ResourceRoute::Collection), HttpMethod::Post) => format!(
            "app.post('{path}', (req, res) => {{\n  const body = req.body || {{}};\n  const missing = [{required}].filter((f) => body[f] === undefined || body[f] === '');\n  if (missing.length) {{\n    return res.status(400).json({{ error: 'Missing required fields: ' + missing.join(', ') }});\n  }}\n  const record = {{ id: currentId++ }};\n  for (const f of [{fields}]) {{\n    if (body[f] !== undefined) record[f] = body[f];\n  }}\n  records.push(record);\n  res.status(201).json(record);\n}});\n",
            path = path,
            required = required.join(", "),
            fields = fields.join(", "),
        ),
        (Some(ResourceRoute::Item), HttpMethod::Get) => format!(
            "app.get('{path}', (req, res) => {{\n  const record = records.find((r) => String(r.id) === String(req.params.id));\n  if (!record) return res.status(404).json({{ error: 'Not found' }});\n  res.json(record);\n}});\n",
            path = path,
        ),
        (Some(ResourceRoute::Item), HttpMethod::Put) => format!(
            "app.put('{path}', (req, res) => {{\n  const record = records.find((r) => String(r.id) === String(req.params.id));\n  if (!record) return res.status(404).json({{ error: 'Not found' }});\n  const body = req.body || {{}};\n  for (const f of [{fields}]) {{\n    if (body[f] !== undefined) record[f] = body[f];\n  }}\n  res.json(record);\n}});\n",
            path = path,
            fields = fields.join(", "),
        ),
        (Some(ResourceRoute::Item), HttpMethod::Delete) => format!(
            "app.delete('{path}', (req, res) => {{\n  const idx = records.findIndex((r) => String(r.id) === String(req.params.id));\n  if (idx === -1) return res.status(404).json({{ error: 'Not found' }});\n  records.splice(idx, 1);\n  res.status(204).send();\n}});\n",
            path = path,
        ),
        _ => format!(
            "app.{method}('{path}', (req, res) => res.json({{ ok: true }}));\n",
            method = endpoint.method.as_lower(),
            path = path,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::contract::single_resource_default;
    use crate::domain::model::{Contract, Endpoint, ResourceSchema};

    fn ctx(contract: Contract) -> SynthContext {
        SynthContext {
            task: "CRUD of tasks".to_string(),
            language: "JavaScript".to_string(),
            project_name: "demo".to_string(),
            group_id: "com.example".to_string(),
            resource: "tasks".to_string(),
            schema: ResourceSchema::fallback("tasks"),
            contract,
            port: 3000,
        }
    }

    #[test]
    fn test_generated_server_has_crud_and_single_listen() {
        let ctx = ctx(single_resource_default("tasks"));
        let js = generated_server(&ctx, &plan_endpoints(&ctx));
        assert!(js.contains("app.get('/api/tasks'"));
        assert!(js.contains("app.post('/api/tasks'"));
        assert!(js.contains("app.put('/api/tasks/:id'"));
        assert!(js.contains("app.delete('/api/tasks/:id'"));
        assert!(js.contains("res.status(400)"));
        assert!(js.contains("res.status(404)"));
        assert_eq!(js.matches("app.listen(").count(), 1);
        assert!(js.contains("app.use(cors())"));
        assert!(js.contains("/health"));
    }

    #[test]
    fn test_model_server_base_is_completed_not_duplicated() {
        let ctx = ctx(single_resource_default("tasks"));
        let block = CodeBlock::new(
            "javascript",
            "const express = require('express');\nconst app = express();\napp.get('/api/tasks', (req, res) => res.json([]));\napp.listen(3000);\n",
        );
        let mut files = ProjectFiles::new();
        let mut state = EntrypointState::default();
        ExpressStrategy.emit_entrypoint(&ctx, &mut state, "", &[block], &mut files);
        let js = files.get("backend/src/index.js").unwrap();
        // The model's GET is kept, the missing verbs are appended.
        assert_eq!(js.matches("app.get('/api/tasks'").count(), 1);
        assert!(js.contains("app.post('/api/tasks'"));
        assert!(js.contains("app.put('/api/tasks/:id'"));
        assert_eq!(js.matches("app.listen(").count(), 1);
        assert!(js.contains("app.use(express.json())"));
    }

    #[test]
    fn test_server_named_blocks_are_not_written_separately() {
        let ctx = ctx(single_resource_default("tasks"));
        let mut block = CodeBlock::new("javascript", "const app = require('express')();");
        block.filename = Some("server.js".to_string());
        let mut files = ProjectFiles::new();
        let mut state = EntrypointState::default();
        ExpressStrategy.place_block(&ctx, &mut state, 1, &block, &mut files);
        assert!(files.is_empty());
    }

    #[test]
    fn test_route_module_is_placed_with_listen_stripped() {
        let ctx = ctx(single_resource_default("tasks"));
        let mut block = CodeBlock::new(
            "javascript",
            "const router = require('express').Router();\nrouter.get('/extra', h);\napp.listen(4000);\nmodule.exports = router;\n",
        );
        block.filename = Some("routes/extra.js".to_string());
        let mut files = ProjectFiles::new();
        let mut state = EntrypointState::default();
        ExpressStrategy.place_block(&ctx, &mut state, 1, &block, &mut files);
        let placed = files.get("backend/src/extra.js").unwrap();
        assert!(!placed.contains("app.listen"));
        assert!(placed.contains("router.get('/extra', h)"));
    }

    #[test]
    fn test_placeholder_for_non_resource_endpoint() {
        let mut contract = single_resource_default("tasks");
        contract
            .endpoints
            .push(Endpoint::new(HttpMethod::Post, "/api/auth/login"));
        let ctx = ctx(contract);
        let js = generated_server(&ctx, &plan_endpoints(&ctx));
        assert!(js.contains("app.post('/api/auth/login', (req, res) => res.json({ ok: true }));"));
    }
}

//! Front-end assembly: maps extracted blocks onto the three canonical
//! client files, post-processes them for immediate consumption, and can
//! regenerate them wholesale from the resource schema.

use crate::core::sanitize::sanitize_front_js;
use crate::domain::model::{CodeBlock, Field, FieldType, ResourceSchema};
use once_cell::sync::Lazy;
use regex::Regex;

/// The three canonical client files, in fallback-assignment order.
#[derive(Debug, Clone, Default)]
pub struct FrontFiles {
    pub index_html: Option<String>,
    pub styles_css: Option<String>,
    pub script_js: Option<String>,
}

impl FrontFiles {
    pub fn is_empty(&self) -> bool {
        self.index_html.is_none() && self.styles_css.is_none() && self.script_js.is_none()
    }
}

/// Assigns blocks to the canonical names: detected filenames win, then the
/// first unclaimed blocks fill the gaps positionally.
pub fn pick_front_files(blocks: &[CodeBlock]) -> FrontFiles {
    let mut files = FrontFiles::default();

    for block in blocks {
        match block.filename_lower().as_str() {
            "index.html" if files.index_html.is_none() => {
                files.index_html = Some(block.content.clone())
            }
            "styles.css" if files.styles_css.is_none() => {
                files.styles_css = Some(block.content.clone())
            }
            "script.js" if files.script_js.is_none() => {
                files.script_js = Some(block.content.clone())
            }
            _ => {}
        }
    }

    let mut fallback = blocks.iter();
    for slot in [&mut files.index_html, &mut files.styles_css, &mut files.script_js] {
        if slot.is_none() {
            if let Some(block) = fallback.next() {
                *slot = Some(block.content.clone());
            }
        }
    }

    files
}

fn api_base_header(default_api_base: &str) -> String {
    format!(
        "(function(){{\n  try {{\n    const qp = new URLSearchParams(window.location.search);\n    const override = qp.get('api');\n    const computed = override || window.API_BASE || window.API_BASE_URL || \"{base}\";\n    window.API_BASE = computed;\n    if (!window.API_BASE_URL || (typeof window.API_BASE_URL === 'string' && window.API_BASE_URL.startsWith('/'))) {{\n      window.API_BASE_URL = computed;\n    }}\n  }} catch (e) {{\n    window.API_BASE = window.API_BASE || \"{base}\";\n  }}\n}})();\n",
        base = default_api_base
    )
}

const API_FETCH_HELPER: &str = "async function apiFetch(path, options = {}) {\n  const url = `${API_BASE}${path.startsWith('/') ? path : '/' + path}`;\n  const opts = { ...options };\n  if (opts.body && !(opts.headers && (opts.headers['Content-Type'] || opts.headers['content-type']))) {\n    opts.headers = { ...(opts.headers || {}), 'Content-Type': 'application/json' };\n  }\n  const resp = await fetch(url, opts);\n  const ct = resp.headers.get('content-type') || '';\n  const payload = ct.includes('application/json') ? await resp.json() : await resp.text();\n  if (!resp.ok) {\n    const msg = typeof payload === 'string' ? payload : (payload.message || JSON.stringify(payload));\n    throw new Error(msg);\n  }\n  return payload;\n}\n";

fn login_fallback_script() -> String {
    "document.addEventListener('DOMContentLoaded', () => {\n  const form = document.getElementById('loginForm');\n  if (!form) return;\n  form.addEventListener('submit', async (e) => {\n    e.preventDefault();\n    const username = document.getElementById('username').value;\n    const password = document.getElementById('password').value;\n    const msg = document.getElementById('responseMessage');\n    try {\n      const data = await apiFetch('/auth/login', {\n        method: 'POST',\n        body: JSON.stringify({ username, password })\n      });\n      msg.textContent = `Welcome: ${data.username}`;\n    } catch (err) {\n      console.error(err);\n      msg.textContent = `Request failed: ${err.message}`;\n    }\n  });\n});\n"
        .to_string()
}

fn login_fallback_html() -> String {
    "<!doctype html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"utf-8\">\n  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n  <title>Login</title>\n  <style>body{font-family:sans-serif;display:flex;min-height:100vh;align-items:center;justify-content:center;background:#f5f5f5} .card{background:#fff;padding:24px;border-radius:8px;box-shadow:0 2px 8px rgba(0,0,0,.1);width:320px} .row{display:flex;flex-direction:column;gap:8px} input{padding:8px;border:1px solid #ddd;border-radius:4px} button{padding:10px;border:none;border-radius:4px;background:#2e7d32;color:#fff;cursor:pointer} #responseMessage{margin-top:10px;color:#333}</style>\n</head>\n<body>\n  <div class=\"card\">\n    <h2>Login</h2>\n    <form id=\"loginForm\" class=\"row\">\n      <input id=\"username\" type=\"text\" placeholder=\"Username\" required />\n      <input id=\"password\" type=\"password\" placeholder=\"Password\" required />\n      <button type=\"submit\">Sign in</button>\n    </form>\n    <div id=\"responseMessage\"></div>\n  </div>\n  <script src=\"./script.js\"></script>\n</body>\n</html>\n"
        .to_string()
}

/// Makes the front-end ready for immediate consumption: resolves `API_BASE`
/// (with a `?api=` query override), provides the `apiFetch` helper, and
/// falls back to a minimal login form when the model produced no usable
/// front-end at all.
pub fn postprocess_front_files(files: &FrontFiles, base_url: &str, port: u16) -> FrontFiles {
    let default_api_base = format!("http://127.0.0.1:{}{}", port, base_url);
    let header = api_base_header(&default_api_base);
    let mut out = files.clone();

    match out.script_js.as_deref().map(str::trim) {
        None | Some("") => {
            out.script_js = Some(format!("{}{}\n{}", header, API_FETCH_HELPER, login_fallback_script()));
        }
        Some(_) => {
            let sanitized = sanitize_front_js(out.script_js.as_deref().unwrap_or_default());
            if sanitized.contains("apiFetch(") {
                out.script_js = Some(format!("{}{}", header, sanitized));
            } else {
                out.script_js = Some(format!("{}{}{}", header, API_FETCH_HELPER, sanitized));
            }
        }
    }

    match out.index_html.as_deref().map(str::trim) {
        None | Some("") => out.index_html = Some(login_fallback_html()),
        Some(_) => {}
    }

    out
}

static TODO_IDIOM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(todo|to-do|checklist|tarefas?)\b").unwrap());
static CRUD_IDIOM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bcrud\b").unwrap());

/// Checklist rendering fits when the schema carries a boolean field, or the
/// task reads like a todo list without also naming a generic CRUD surface.
pub fn wants_checklist(schema: &ResourceSchema, task: &str) -> bool {
    if schema.has_boolean_field() {
        return true;
    }
    TODO_IDIOM_RE.is_match(task) && !CRUD_IDIOM_RE.is_match(task)
}

/// Regenerates the three canonical client files to exercise exactly the
/// resource's schema against the contract base.
pub fn regenerate_resource_ui(
    resource: &str,
    schema: &ResourceSchema,
    checklist: bool,
    base_url: &str,
    port: u16,
) -> FrontFiles {
    let api_base = format!("http://127.0.0.1:{}{}", port, base_url);
    let title = format!("{} manager", capitalize(resource));

    FrontFiles {
        index_html: Some(resource_index_html(resource, schema, &title)),
        styles_css: Some(resource_styles_css()),
        script_js: Some(if checklist {
            checklist_script(resource, schema, &api_base)
        } else {
            table_script(resource, schema, &api_base)
        }),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn input_for_field(field: &Field) -> String {
    match field.field_type {
        FieldType::Boolean => format!(
            "    <label><input id=\"new-{name}\" name=\"{name}\" type=\"checkbox\" /> {name}</label>",
            name = field.name
        ),
        FieldType::Number => format!(
            "    <input id=\"new-{name}\" name=\"{name}\" type=\"number\" placeholder=\"{name}\" />",
            name = field.name
        ),
        FieldType::Enum => {
            let options: String = field
                .values
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|v| format!("<option value=\"{v}\">{v}</option>"))
                .collect();
            format!(
                "    <select id=\"new-{name}\" name=\"{name}\">{options}</select>",
                name = field.name
            )
        }
        FieldType::String => format!(
            "    <input id=\"new-{name}\" name=\"{name}\" placeholder=\"{name}\" autocomplete=\"off\" />",
            name = field.name
        ),
    }
}

fn resource_index_html(resource: &str, schema: &ResourceSchema, title: &str) -> String {
    let inputs: Vec<String> = schema.schema.iter().map(input_for_field).collect();
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"UTF-8\" />\n  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\" />\n  <title>{title}</title>\n  <link rel=\"stylesheet\" href=\"styles.css\" />\n</head>\n<body>\n  <h1>{title}</h1>\n  <div class=\"form\" id=\"create-form\">\n{inputs}\n    <button id=\"add-btn\">Add</button>\n  </div>\n  <div id=\"list\" data-resource=\"{resource}\"></div>\n  <script src=\"script.js\"></script>\n</body>\n</html>\n",
        title = title,
        inputs = inputs.join("\n"),
        resource = resource,
    )
}

fn resource_styles_css() -> String {
    "body{font-family:Arial,Helvetica,sans-serif;padding:20px}h1{margin-bottom:16px}.form{display:flex;gap:8px;margin-bottom:12px;flex-wrap:wrap}.form input,.form select{padding:6px}.item{display:flex;gap:8px;align-items:center;margin:8px 0}.item input{padding:6px}.item.done span{text-decoration:line-through;color:#888}button{padding:6px 10px;cursor:pointer}\n"
        .to_string()
}

fn collect_fields_js(schema: &ResourceSchema) -> String {
    let reads: Vec<String> = schema
        .schema
        .iter()
        .map(|f| match f.field_type {
            FieldType::Boolean => format!(
                "  payload.{name} = document.getElementById('new-{name}').checked;",
                name = f.name
            ),
            FieldType::Number => format!(
                "  payload.{name} = Number(document.getElementById('new-{name}').value);",
                name = f.name
            ),
            _ => format!(
                "  payload.{name} = document.getElementById('new-{name}').value.trim();",
                name = f.name
            ),
        })
        .collect();

    let checks: Vec<String> = schema
        .required_fields()
        .iter()
        .filter(|f| f.field_type == FieldType::String || f.field_type == FieldType::Enum)
        .map(|f| {
            format!(
                "  if (!payload.{name}) {{ alert('{name} is required'); return null; }}",
                name = f.name
            )
        })
        .collect();

    format!(
        "function collectPayload() {{\n  const payload = {{}};\n{}\n{}\n  return payload;\n}}\n",
        reads.join("\n"),
        checks.join("\n")
    )
}

fn script_common(resource: &str, api_base: &str) -> String {
    format!(
        "const API_BASE = (function() {{\n  const qp = new URLSearchParams(window.location.search);\n  return window.API_BASE || qp.get('api') || '{api_base}';\n}})();\nconst listEl = document.getElementById('list');\nconst addBtn = document.getElementById('add-btn');\n\nasync function loadItems() {{\n  const r = await fetch(API_BASE + '/{resource}');\n  const data = await r.json();\n  const items = Array.isArray(data) ? data : (data.content || data.items || data.{resource} || data.data || []);\n  render(items);\n}}\n\nasync function removeItem(id) {{\n  const r = await fetch(API_BASE + '/{resource}/' + encodeURIComponent(id), {{ method: 'DELETE' }});\n  if (r.ok) {{ await loadItems(); }}\n}}\n",
        api_base = api_base,
        resource = resource,
    )
}

fn checklist_script(resource: &str, schema: &ResourceSchema, api_base: &str) -> String {
    let label_field = schema
        .schema
        .iter()
        .find(|f| f.field_type == FieldType::String)
        .map(|f| f.name.clone())
        .unwrap_or_else(|| "name".to_string());
    let done_field = schema
        .schema
        .iter()
        .find(|f| f.field_type == FieldType::Boolean)
        .map(|f| f.name.clone())
        .unwrap_or_else(|| "done".to_string());

    format!(
        "{common}{collect}\nfunction render(items) {{\n  listEl.innerHTML = '';\n  for (const item of items) {{\n    const row = document.createElement('div');\n    row.className = 'item' + (item.{done} ? ' done' : '');\n    const check = document.createElement('input');\n    check.type = 'checkbox';\n    check.checked = !!item.{done};\n    check.onchange = () => toggleItem(item);\n    const label = document.createElement('span');\n    label.textContent = item.{label} || '';\n    const delBtn = document.createElement('button');\n    delBtn.textContent = 'Delete';\n    delBtn.onclick = () => removeItem(item.id);\n    row.appendChild(check);\n    row.appendChild(label);\n    row.appendChild(delBtn);\n    listEl.appendChild(row);\n  }}\n}}\n\nasync function toggleItem(item) {{\n  const r = await fetch(API_BASE + '/{resource}/' + encodeURIComponent(item.id), {{\n    method: 'PUT',\n    headers: {{ 'Content-Type': 'application/json' }},\n    body: JSON.stringify({{ ...item, {done}: !item.{done} }})\n  }});\n  if (r.ok) {{ await loadItems(); }}\n}}\n\nasync function addItem() {{\n  const payload = collectPayload();\n  if (!payload) return;\n  const r = await fetch(API_BASE + '/{resource}', {{\n    method: 'POST',\n    headers: {{ 'Content-Type': 'application/json' }},\n    body: JSON.stringify(payload)\n  }});\n  if (r.ok) {{ await loadItems(); }}\n}}\n\naddBtn.onclick = addItem;\nloadItems();\n",
        common = script_common(resource, api_base),
        collect = collect_fields_js(schema),
        resource = resource,
        label = label_field,
        done = done_field,
    )
}

fn table_script(resource: &str, schema: &ResourceSchema, api_base: &str) -> String {
    let field_names: Vec<String> = schema.schema.iter().map(|f| f.name.clone()).collect();
    let cells: Vec<String> = field_names
        .iter()
        .map(|name| {
            format!(
                "    const cell_{name} = document.createElement('input');\n    cell_{name}.value = item.{name} == null ? '' : String(item.{name});\n    cell_{name}.setAttribute('aria-label', '{name}');\n    row.appendChild(cell_{name});",
                name = name
            )
        })
        .collect();
    let update_pairs: Vec<String> = field_names
        .iter()
        .map(|name| format!("{name}: cell_{name}.value", name = name))
        .collect();

    format!(
        "{common}{collect}\nfunction render(items) {{\n  listEl.innerHTML = '';\n  for (const item of items) {{\n    const row = document.createElement('div');\n    row.className = 'item';\n{cells}\n    const saveBtn = document.createElement('button');\n    saveBtn.textContent = 'Save';\n    saveBtn.onclick = () => updateItem(item.id, {{ {update_pairs} }});\n    const delBtn = document.createElement('button');\n    delBtn.textContent = 'Delete';\n    delBtn.onclick = () => removeItem(item.id);\n    row.appendChild(saveBtn);\n    row.appendChild(delBtn);\n    listEl.appendChild(row);\n  }}\n}}\n\nasync function updateItem(id, payload) {{\n  const r = await fetch(API_BASE + '/{resource}/' + encodeURIComponent(id), {{\n    method: 'PUT',\n    headers: {{ 'Content-Type': 'application/json' }},\n    body: JSON.stringify(payload)\n  }});\n  if (r.ok) {{ await loadItems(); }}\n}}\n\nasync function addItem() {{\n  const payload = collectPayload();\n  if (!payload) return;\n  const r = await fetch(API_BASE + '/{resource}', {{\n    method: 'POST',\n    headers: {{ 'Content-Type': 'application/json' }},\n    body: JSON.stringify(payload)\n  }});\n  if (r.ok) {{ await loadItems(); }}\n}}\n\naddBtn.onclick = addItem;\nloadItems();\n",
        common = script_common(resource, api_base),
        collect = collect_fields_js(schema),
        cells = cells.join("\n"),
        update_pairs = update_pairs.join(", "),
        resource = resource,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Field;

    fn string_schema() -> ResourceSchema {
        ResourceSchema::fallback("tasks")
    }

    fn todo_schema() -> ResourceSchema {
        ResourceSchema {
            name: "tasks".to_string(),
            schema: vec![
                Field::required_string("title"),
                Field {
                    name: "done".to_string(),
                    field_type: FieldType::Boolean,
                    required: false,
                    values: None,
                },
            ],
        }
    }

    #[test]
    fn test_pick_by_filename_then_positional_fallback() {
        let mut named = CodeBlock::new("css", "body {}");
        named.filename = Some("styles.css".to_string());
        let blocks = vec![
            CodeBlock::new("html", "<h1>Hi</h1>"),
            named,
            CodeBlock::new("js", "console.log(1)"),
        ];
        let files = pick_front_files(&blocks);
        assert_eq!(files.styles_css.as_deref(), Some("body {}"));
        // Positional fallback fills the unnamed slots in block order.
        assert_eq!(files.index_html.as_deref(), Some("<h1>Hi</h1>"));
        assert!(files.script_js.is_some());
    }

    #[test]
    fn test_postprocess_falls_back_to_login_form() {
        let files = postprocess_front_files(&FrontFiles::default(), "/api", 5001);
        let html = files.index_html.unwrap();
        let script = files.script_js.unwrap();
        assert!(html.contains("loginForm"));
        assert!(script.contains("apiFetch"));
        assert!(script.contains("http://127.0.0.1:5001/api"));
    }

    #[test]
    fn test_postprocess_prefixes_api_base_without_duplicating_helper() {
        let mut files = FrontFiles::default();
        files.script_js = Some("apiFetch('/tasks').then(render);".to_string());
        let out = postprocess_front_files(&files, "/api", 3000);
        let script = out.script_js.unwrap();
        assert!(script.contains("window.API_BASE"));
        assert_eq!(script.matches("async function apiFetch").count(), 0);
        assert!(script.contains("apiFetch('/tasks')"));
    }

    #[test]
    fn test_postprocess_adds_helper_when_missing() {
        let mut files = FrontFiles::default();
        files.script_js = Some("fetch('/api/tasks').then(r => r.json());".to_string());
        let out = postprocess_front_files(&files, "/api", 5001);
        let script = out.script_js.unwrap();
        assert_eq!(script.matches("async function apiFetch").count(), 1);
    }

    #[test]
    fn test_wants_checklist_on_boolean_field() {
        assert!(wants_checklist(&todo_schema(), "manage things"));
    }

    #[test]
    fn test_wants_checklist_on_todo_idiom_without_crud() {
        assert!(wants_checklist(&string_schema(), "a todo list for groceries"));
        assert!(!wants_checklist(&string_schema(), "a CRUD of todo items"));
        assert!(!wants_checklist(&string_schema(), "manage products"));
    }

    #[test]
    fn test_regenerated_checklist_exercises_schema() {
        let files = regenerate_resource_ui("tasks", &todo_schema(), true, "/api", 5001);
        let script = files.script_js.unwrap();
        assert!(script.contains("item.done"));
        assert!(script.contains("item.title"));
        assert!(script.contains("/tasks"));
        let html = files.index_html.unwrap();
        assert!(html.contains("new-title"));
        assert!(html.contains("type=\"checkbox\""));
    }

    #[test]
    fn test_regenerated_table_renders_all_fields() {
        let schema = ResourceSchema {
            name: "products".to_string(),
            schema: vec![
                Field::required_string("name"),
                Field {
                    name: "price".to_string(),
                    field_type: FieldType::Number,
                    required: true,
                    values: None,
                },
            ],
        };
        let files = regenerate_resource_ui("products", &schema, false, "/api", 3000);
        let script = files.script_js.unwrap();
        assert!(script.contains("cell_name"));
        assert!(script.contains("cell_price"));
        let html = files.index_html.unwrap();
        assert!(html.contains("type=\"number\""));
    }
}

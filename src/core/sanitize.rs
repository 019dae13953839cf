//! Sanitization passes applied while copying model-provided files into the
//! generated tree. All passes are line/regex based and degrade to returning
//! the input unchanged rather than failing.

use crate::core::resource::pluralize;
use once_cell::sync::Lazy;
use regex::Regex;

static JAVA_MARKER_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\bpublic\s+class\b").unwrap(),
        Regex::new(r"\bclass\s+[A-Za-z0-9_]+\b").unwrap(),
        Regex::new(r"(?m)^\s*import\s+[A-Za-z0-9_.]+;").unwrap(),
        Regex::new(r"@SpringBootApplication").unwrap(),
        Regex::new(r"@RestController").unwrap(),
        Regex::new(r"@RequestMapping").unwrap(),
    ]
});

/// Identifies Java content even when the block's language tag is wrong.
pub fn looks_like_java(content: &str) -> bool {
    JAVA_MARKER_RES.iter().any(|re| re.is_match(content))
}

static APP_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bapp\s*\.\s*run\s*\(").unwrap());
static FLASK_INSTANCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^app\s*=\s*Flask\(\s*__name__\s*\)\s*$").unwrap());
static APP_ROUTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\s*app\s*\.\s*route\s*\(").unwrap());
static BLUEPRINT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bBlueprint\s*\(").unwrap());
static FLASK_CALL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bFlask\s*\(").unwrap());
static PY_IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(?:from\s+\S+\s+import\s+\S+|import\s+\S+)").unwrap());

/// Sanitizes backend Python so a single shared Flask app owns startup:
/// removes local `app = Flask(__name__)` instances, `app.run(...)` calls
/// and trailing `if __name__ == '__main__':` guard blocks, then injects
/// `from . import app` for files that define routes against the shared app.
/// Modules that only define Blueprints are left without the import.
pub fn sanitize_flask_python(content: &str) -> String {
    let mut out_lines: Vec<&str> = Vec::new();
    let mut skip_guard = false;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("if __name__ == '__main__':")
            || trimmed.starts_with("if __name__ == \"__main__\":")
        {
            skip_guard = true;
            continue;
        }
        if skip_guard {
            if trimmed.is_empty() {
                skip_guard = false;
                continue;
            }
            if !line.starts_with(' ') && !line.starts_with('\t') {
                skip_guard = false;
                // Dedented line belongs to the file again.
            } else {
                continue;
            }
        }
        if APP_RUN_RE.is_match(trimmed) {
            continue;
        }
        if FLASK_INSTANCE_RE.is_match(trimmed) {
            continue;
        }
        out_lines.push(line);
    }
    let sanitized = out_lines.join("\n");

    let uses_app_routes = APP_ROUTE_RE.is_match(&sanitized);
    let defines_blueprint = BLUEPRINT_RE.is_match(&sanitized);
    let instantiates_flask = FLASK_CALL_RE.is_match(&sanitized);
    if (uses_app_routes || instantiates_flask)
        && !defines_blueprint
        && !sanitized.contains("from . import app")
    {
        if let Some(last_import) = PY_IMPORT_RE.find_iter(&sanitized).last() {
            let idx = last_import.end();
            return format!(
                "{}\nfrom . import app\n{}",
                &sanitized[..idx],
                &sanitized[idx..]
            );
        }
        return format!("from . import app\n{}", sanitized);
    }
    sanitized
}

static LISTEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:app|server)\s*\.\s*listen\s*\(").unwrap());

/// Sanitizes Node/Express files so only the scaffolded entrypoint starts a
/// server: removes `app.listen(`/`server.listen(` lines and any
/// `if (require.main === module) { ... }` block, then trims closing braces
/// the block removal left unbalanced at the end of the file.
pub fn sanitize_express_js(content: &str) -> String {
    let mut out_lines: Vec<&str> = Vec::new();
    let mut skipping_main = false;
    let mut brace_depth: i32 = 0;
    for line in content.lines() {
        if skipping_main {
            brace_depth += line.matches('{').count() as i32;
            brace_depth -= line.matches('}').count() as i32;
            if brace_depth <= 0 {
                skipping_main = false;
            }
            continue;
        }
        if line.contains("require.main === module") {
            skipping_main = true;
            brace_depth = line.matches('{').count() as i32 - line.matches('}').count() as i32;
            continue;
        }
        if LISTEN_RE.is_match(line) {
            continue;
        }
        out_lines.push(line);
    }
    let mut sanitized = out_lines.join("\n");
    while sanitized.trim_end().ends_with('}')
        && sanitized.matches('}').count() > sanitized.matches('{').count()
    {
        sanitized = sanitized.trim_end().to_string();
        sanitized.pop();
    }
    sanitized
}

static USERS_FOREACH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^A-Za-z0-9_$])users\s*\.\s*forEach\s*\(").unwrap());

/// Replaces bare `users.forEach(` with an iteration that tolerates
/// Page-like/enveloped list responses (`content`, `items`, `users`, `data`)
/// as well as plain arrays.
pub fn sanitize_front_js(content: &str) -> String {
    let safe_iter = "((Array.isArray(users) ? users : (users && users.content) || \
                     (users && users.items) || (users && users.users) || \
                     (users && users.data) || []))";
    USERS_FOREACH_RE
        .replace_all(content, format!("${{1}}{}.forEach(", safe_iter))
        .into_owned()
}

const JAVA_DECL_TOKENS: [&str; 9] = [
    "package ", "import ", "@", "public ", "class ", "interface ", "enum ", "/*", "//",
];

/// Strips free-text preamble the model prepended before the first real Java
/// declaration line, and normalizes legacy `javax.*` namespaces to their
/// `jakarta.*` equivalents.
pub fn sanitize_java(content: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let mut start_idx = 0;
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if JAVA_DECL_TOKENS.iter().any(|t| trimmed.starts_with(t)) {
            start_idx = i;
            break;
        }
    }
    lines[start_idx..]
        .join("\n")
        .replace("javax.persistence", "jakarta.persistence")
        .replace("javax.validation", "jakarta.validation")
}

/// Identifiers that collide with SQL reserved words when used as table
/// names by the common embedded databases.
const SQL_RESERVED: [&str; 10] = [
    "user", "order", "group", "table", "select", "check", "value", "key", "index", "row",
];

fn is_sql_reserved(name: &str) -> bool {
    SQL_RESERVED.contains(&name.to_ascii_lowercase().as_str())
}

static EXPLICIT_TABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"@Table\s*\(\s*name\s*=\s*"([A-Za-z0-9_]+)"\s*\)"#).unwrap());
static CLASS_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bclass\s+([A-Za-z0-9_]+)").unwrap());

/// For JPA entities whose class name collides with a SQL reserved word and
/// that carry no `@Table` annotation, injects one with a pluralized,
/// non-reserved table name plus the matching import. An explicit `@Table`
/// naming a reserved word is likewise pluralized.
pub fn sanitize_java_entity_table(content: &str) -> String {
    if !content.contains("@Entity") {
        return content.to_string();
    }

    let mut text = EXPLICIT_TABLE_RE
        .replace_all(content, |caps: &regex::Captures| {
            let name = &caps[1];
            if is_sql_reserved(name) {
                format!("@Table(name = \"{}\")", pluralize(&name.to_ascii_lowercase()))
            } else {
                caps[0].to_string()
            }
        })
        .into_owned();

    let class_name = CLASS_NAME_RE
        .captures(&text)
        .map(|c| c[1].to_string())
        .unwrap_or_default();

    if is_sql_reserved(&class_name) && !text.contains("@Table(") {
        let table_name = pluralize(&class_name.to_ascii_lowercase());
        let mut out: Vec<String> = Vec::new();
        let mut inserted = false;
        for line in text.lines() {
            out.push(line.to_string());
            if !inserted && line.trim().starts_with("@Entity") {
                out.push(format!("@Table(name = \"{}\")", table_name));
                inserted = true;
            }
        }
        text = out.join("\n");

        if !text.contains("import jakarta.persistence.Table;") {
            text = insert_java_import(&text, "import jakarta.persistence.Table;");
        }
    }

    text
}

/// Inserts an import after the last existing import, or after the package
/// declaration, or at the top of the file.
fn insert_java_import(content: &str, import_line: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let mut insert_after = None;
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with("import ") {
            insert_after = Some(i);
        } else if trimmed.starts_with("package ") && insert_after.is_none() {
            insert_after = Some(i);
        }
    }
    let mut out: Vec<String> = Vec::new();
    match insert_after {
        Some(idx) => {
            for (i, line) in lines.iter().enumerate() {
                out.push(line.to_string());
                if i == idx {
                    out.push(import_line.to_string());
                }
            }
        }
        None => {
            out.push(import_line.to_string());
            out.extend(lines.iter().map(|l| l.to_string()));
        }
    }
    out.join("\n")
}

/// Maps a block language tag to the file extension generated files carry.
pub fn lang_ext(lang: &str) -> String {
    match lang.to_ascii_lowercase().as_str() {
        "python" | "py" => "py".to_string(),
        "javascript" | "js" => "js".to_string(),
        "typescript" | "ts" => "ts".to_string(),
        "java" => "java".to_string(),
        "yaml" | "yml" => "yml".to_string(),
        "xml" | "pom" => "xml".to_string(),
        "json" => "json".to_string(),
        "bash" | "sh" => "sh".to_string(),
        "html" => "html".to_string(),
        "css" => "css".to_string(),
        other => safe_ext(other),
    }
}

fn safe_ext(lang: &str) -> String {
    let cleaned: String = lang
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    match cleaned.as_str() {
        "" | "markdown" | "md" | "plain" | "text" => "txt".to_string(),
        _ => cleaned,
    }
}

/// Generic filename sanitation: directory components are stripped, names
/// with no alphanumeric characters are discarded in favor of the fallback,
/// and the extension is forced to match the block's classified language.
pub fn sanitize_generic_filename(lang: &str, filename: Option<&str>, fallback_base: &str) -> String {
    let raw = filename.unwrap_or(fallback_base).trim().replace('\\', "/");
    let mut name = raw.rsplit('/').next().unwrap_or(fallback_base).to_string();
    if name.starts_with('-') || !name.chars().any(|c| c.is_ascii_alphanumeric()) {
        name = fallback_base.to_string();
    }
    let base = match name.rsplit_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => name,
    };
    let cleaned: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    let base = if cleaned.is_empty() {
        fallback_base.to_string()
    } else {
        cleaned
    };
    format!("{}.{}", base, lang_ext(lang))
}

/// Safe Java filename: keeps the model's name only when it already ends in
/// `.java`, otherwise falls back to the detected class name.
pub fn sanitize_java_filename(filename: Option<&str>, fallback_class: &str) -> String {
    let base = match filename {
        Some(f) if f.to_ascii_lowercase().ends_with(".java") => f[..f.len() - 5].to_string(),
        _ => fallback_class.to_string(),
    };
    let cleaned: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    let base = if cleaned.is_empty() {
        fallback_class.to_string()
    } else {
        cleaned
    };
    format!("{}.java", base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looks_like_java_catches_mislabeled_blocks() {
        assert!(looks_like_java("public class UserController {}"));
        assert!(looks_like_java("@RestController\npublic class Api {}"));
        assert!(looks_like_java("import org.springframework.boot.SpringApplication;"));
        assert!(!looks_like_java("def handler():\n    return 'ok'"));
    }

    #[test]
    fn test_flask_sanitize_strips_run_and_instance_and_guard() {
        let src = "from flask import Flask\napp = Flask(__name__)\n\n@app.route('/api/tasks')\ndef tasks():\n    return []\n\nif __name__ == '__main__':\n    app.run(debug=True)\n";
        let out = sanitize_flask_python(src);
        assert!(!out.contains("app.run"));
        assert!(!out.contains("app = Flask(__name__)"));
        assert!(!out.contains("__main__"));
        assert!(out.contains("@app.route('/api/tasks')"));
    }

    #[test]
    fn test_flask_sanitize_injects_shared_app_import_after_imports() {
        let src = "from flask import jsonify\n\n@app.route('/api/tasks')\ndef tasks():\n    return jsonify([])\n";
        let out = sanitize_flask_python(src);
        assert!(out.contains("from . import app"));
        let import_pos = out.find("from . import app").unwrap();
        let flask_pos = out.find("from flask import jsonify").unwrap();
        assert!(import_pos > flask_pos);
    }

    #[test]
    fn test_flask_sanitize_leaves_blueprint_modules_alone() {
        let src = "from flask import Blueprint\nmain = Blueprint('main', __name__)\n\n@main.route('/tasks')\ndef tasks():\n    return []\n";
        let out = sanitize_flask_python(src);
        assert!(!out.contains("from . import app"));
    }

    #[test]
    fn test_flask_sanitize_keeps_dedented_line_after_guard() {
        let src = "x = 1\nif __name__ == '__main__':\n    app.run()\nprint(x)\n";
        let out = sanitize_flask_python(src);
        assert!(out.contains("print(x)"));
        assert!(!out.contains("app.run"));
    }

    #[test]
    fn test_express_sanitize_strips_listen_and_main_block() {
        let src = "const app = express()\napp.get('/x', h)\nif (require.main === module) {\n  app.listen(3000)\n}\nmodule.exports = app\n";
        let out = sanitize_express_js(src);
        assert!(!out.contains("listen"));
        assert!(!out.contains("require.main"));
        assert!(out.contains("module.exports = app"));
        assert_eq!(out.matches('}').count(), out.matches('{').count());
    }

    #[test]
    fn test_express_sanitize_trims_orphan_braces() {
        let src = "app.get('/x', h)\nif (require.main === module) {\n  start()\n";
        let out = sanitize_express_js(src);
        assert!(out.contains("app.get"));
        assert!(!out.contains("start()"));
    }

    #[test]
    fn test_front_js_users_foreach_patch() {
        let out = sanitize_front_js("users.forEach(u => render(u));");
        assert!(out.contains("Array.isArray(users)"));
        assert!(out.contains(".forEach(u => render(u));"));
        // Identifiers merely ending in 'users' are not patched.
        let untouched = sanitize_front_js("allusers.forEach(u => render(u));");
        assert!(!untouched.contains("Array.isArray"));
    }

    #[test]
    fn test_java_sanitize_strips_preamble_and_normalizes_imports() {
        let src = "Here is the entity class you asked for:\n\npackage com.example.model;\nimport javax.persistence.Entity;\n\n@Entity\npublic class Note {}\n";
        let out = sanitize_java(src);
        assert!(out.starts_with("package com.example.model;"));
        assert!(out.contains("jakarta.persistence.Entity"));
        assert!(!out.contains("javax."));
        assert!(!out.contains("Here is the entity"));
    }

    #[test]
    fn test_entity_user_gains_exactly_one_pluralized_table() {
        let src = "package com.example.model;\nimport jakarta.persistence.Entity;\n\n@Entity\npublic class User {\n  private Long id;\n}\n";
        let out = sanitize_java_entity_table(src);
        assert_eq!(out.matches("@Table(").count(), 1);
        assert!(out.contains("@Table(name = \"users\")"));
        assert!(out.contains("import jakarta.persistence.Table;"));
        // Import lands with the other imports, not above the package line.
        assert!(out.starts_with("package com.example.model;"));
    }

    #[test]
    fn test_entity_with_explicit_reserved_table_is_pluralized() {
        let src = "@Entity\n@Table(name = \"user\")\npublic class User {}\n";
        let out = sanitize_java_entity_table(src);
        assert!(out.contains("@Table(name = \"users\")"));
        assert_eq!(out.matches("@Table(").count(), 1);
    }

    #[test]
    fn test_entity_with_safe_name_is_untouched() {
        let src = "@Entity\npublic class Note {}\n";
        let out = sanitize_java_entity_table(src);
        assert!(!out.contains("@Table("));
    }

    #[test]
    fn test_non_entity_java_is_untouched() {
        let src = "public class UserService {}\n";
        assert_eq!(sanitize_java_entity_table(src), src);
    }

    #[test]
    fn test_generic_filename_sanitation() {
        assert_eq!(
            sanitize_generic_filename("python", Some("backend/app/routes.py"), "routes_1"),
            "routes.py"
        );
        assert_eq!(
            sanitize_generic_filename("javascript", Some("weird name!.txt"), "server_part_2"),
            "weirdname.js"
        );
        assert_eq!(
            sanitize_generic_filename("python", Some("---"), "routes_3"),
            "routes_3.py"
        );
        assert_eq!(sanitize_generic_filename("", None, "notes_4"), "notes_4.txt");
    }

    #[test]
    fn test_java_filename_sanitation() {
        assert_eq!(
            sanitize_java_filename(Some("UserController.java"), "ServerPart"),
            "UserController.java"
        );
        assert_eq!(sanitize_java_filename(Some("controller.txt"), "ApiController"), "ApiController.java");
        assert_eq!(sanitize_java_filename(None, "ServerPart"), "ServerPart.java");
    }

    #[test]
    fn test_lang_ext_fallbacks() {
        assert_eq!(lang_ext("Python"), "py");
        assert_eq!(lang_ext("pom"), "xml");
        assert_eq!(lang_ext(""), "txt");
        assert_eq!(lang_ext("markdown"), "txt");
        assert_eq!(lang_ext("rust"), "rust");
    }
}

//! Fenced-block recovery from raw draft text.
//!
//! Deliberately not a real Markdown parser: a fixed set of regexes with an
//! explicit priority order between filename heuristics, exposed as a pure
//! function so stricter recognizers can be substituted later without
//! touching synthesis.

use crate::domain::model::CodeBlock;
use once_cell::sync::Lazy;
use regex::Regex;

/// How many lines at the top of a block (or above the fence) are scanned
/// for a filename hint.
const FILENAME_SCAN_LINES: usize = 5;

static FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    // Accepts "```python", "``` python" and Windows line endings.
    Regex::new(r"```[ \t]*([A-Za-z0-9_+-]*)[ \t]*\r?\n((?s:.*?))```").unwrap()
});

static COMMENT_FILENAME_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // HTML
        Regex::new(r"^<!--\s*(.+\.[A-Za-z0-9]+)\s*-->").unwrap(),
        // JS/TS line comment
        Regex::new(r"^//\s*(.+\.[A-Za-z0-9]+)").unwrap(),
        // CSS/JS block comment
        Regex::new(r"^/\*\s*(.+\.[A-Za-z0-9]+)\s*\*/").unwrap(),
        // Python / config
        Regex::new(r"^#\s*(.+\.[A-Za-z0-9]+)").unwrap(),
    ]
});

static PRECEDING_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    // Path written in prose just above the fence, with optional markdown
    // list/quote prefixes, e.g. "- backend/app/main.py".
    Regex::new(r"^[#>*\-\s]*([A-Za-z0-9_./\\-]+\.[A-Za-z0-9]+)\s*$").unwrap()
});

static BARE_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9_./\\-]+\.[A-Za-z0-9]+)\s*$").unwrap());

/// Extracts every fenced code region from `text`, in source order, with a
/// best-guess filename per region. Never fails; text with no fences yields
/// an empty list.
pub fn extract_blocks(text: &str) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    for caps in FENCE_RE.captures_iter(text) {
        let language = caps.get(1).map_or("", |m| m.as_str()).to_string();
        let content = caps.get(2).map_or("", |m| m.as_str()).to_string();

        let filename = filename_from_comment(&content)
            .or_else(|| filename_from_preceding_lines(text, caps.get(0).unwrap().start()))
            .or_else(|| filename_from_bare_line(&content));

        blocks.push(CodeBlock {
            language,
            content,
            filename,
        });
    }
    blocks
}

/// Heuristic 1: a comment on one of the first few lines of the block
/// wrapping a path, in any of the common comment syntaxes.
fn filename_from_comment(content: &str) -> Option<String> {
    for line in content.lines().take(FILENAME_SCAN_LINES) {
        let trimmed = line.trim();
        for re in COMMENT_FILENAME_RES.iter() {
            if let Some(caps) = re.captures(trimmed) {
                return Some(caps[1].trim().to_string());
            }
        }
    }
    None
}

/// Heuristic 2: a bare path-like token on one of the (up to two) lines
/// immediately preceding the fence.
fn filename_from_preceding_lines(source: &str, fence_start: usize) -> Option<String> {
    let before = &source[..fence_start];
    let mut preceding: Vec<&str> = before.lines().rev().take(2).collect();
    preceding.reverse();
    for line in preceding {
        if let Some(caps) = PRECEDING_PATH_RE.captures(line.trim()) {
            return Some(caps[1].to_string());
        }
    }
    None
}

/// Heuristic 3: a bare path-like token with no comment markers on one of
/// the first few lines inside the block.
fn filename_from_bare_line(content: &str) -> Option<String> {
    for line in content.lines().take(FILENAME_SCAN_LINES) {
        if let Some(caps) = BARE_PATH_RE.captures(line.trim()) {
            return Some(caps[1].to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_every_block_in_source_order() {
        let text = "intro\n```python\nprint('a')\n```\nmiddle\n```js\nconsole.log('b')\n```\n";
        let blocks = extract_blocks(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].language, "python");
        assert_eq!(blocks[0].content, "print('a')\n");
        assert_eq!(blocks[1].language, "js");
        assert_eq!(blocks[1].content, "console.log('b')\n");
    }

    #[test]
    fn test_tolerates_leading_space_and_crlf() {
        let text = "``` python\r\nx = 1\r\n```";
        let blocks = extract_blocks(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].language, "python");
        assert!(blocks[0].content.contains("x = 1"));
    }

    #[test]
    fn test_no_fences_yields_empty_list() {
        assert!(extract_blocks("just prose, no code here").is_empty());
        assert!(extract_blocks("").is_empty());
    }

    #[test]
    fn test_filename_from_html_comment() {
        let text = "```html\n<!-- index.html -->\n<h1>Hi</h1>\n```";
        let blocks = extract_blocks(text);
        assert_eq!(blocks[0].filename.as_deref(), Some("index.html"));
    }

    #[test]
    fn test_filename_from_line_comment_and_hash_comment() {
        let js = "```js\n// script.js\nconsole.log(1)\n```";
        assert_eq!(extract_blocks(js)[0].filename.as_deref(), Some("script.js"));

        let py = "```python\n# backend/app/routes.py\nx = 1\n```";
        assert_eq!(
            extract_blocks(py)[0].filename.as_deref(),
            Some("backend/app/routes.py")
        );
    }

    #[test]
    fn test_filename_from_preceding_prose_line() {
        let text = "backend/app/main.py\n```python\nx = 1\n```";
        assert_eq!(
            extract_blocks(text)[0].filename.as_deref(),
            Some("backend/app/main.py")
        );
    }

    #[test]
    fn test_filename_from_markdown_list_line_above() {
        let text = "- src/index.js\n```js\nlet a = 1\n```";
        assert_eq!(
            extract_blocks(text)[0].filename.as_deref(),
            Some("src/index.js")
        );
    }

    #[test]
    fn test_filename_from_bare_line_inside_block() {
        let text = "```\nstyles.css\nbody { margin: 0 }\n```";
        assert_eq!(extract_blocks(text)[0].filename.as_deref(), Some("styles.css"));
    }

    #[test]
    fn test_comment_heuristic_wins_over_preceding_line() {
        let text = "backend/other.py\n```python\n# routes.py\nx = 1\n```";
        assert_eq!(extract_blocks(text)[0].filename.as_deref(), Some("routes.py"));
    }

    #[test]
    fn test_block_without_hints_has_no_filename() {
        let text = "```python\nx = 1\ny = 2\n```";
        assert_eq!(extract_blocks(text)[0].filename, None);
    }
}

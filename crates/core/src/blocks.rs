//! Fenced-block extraction
//!
//! Models answer with prose followed by one markdown fence per file, where the
//! fence label is the file path:
//!
//! ````text
//! ```src/App.js
//! export default function App() {}
//! ```
//! ````
//!
//! This module turns such a response into a [`GeneratedFileSet`].

use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::LazyLock;

/// Text returned to the caller when the model produced no prose of its own.
pub const DEFAULT_TEXT_RESPONSE: &str = "Files generated successfully!";

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```([A-Za-z0-9_.\-/+]+)\r?\n(.+?)```").expect("fenced block regex is valid")
});

/// A single generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Logical path, e.g. `src/App.js`.
    pub path: String,
    pub content: String,
}

/// Ordered mapping of logical path to file content.
///
/// Keys are unique. Inserting an existing key replaces the content but keeps
/// the position where the key was first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedFileSet {
    files: Vec<GeneratedFile>,
}

impl GeneratedFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file, returning the previous content if the path was present.
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) -> Option<String> {
        let path = path.into();
        let content = content.into();

        match self.files.iter_mut().find(|f| f.path == path) {
            Some(existing) => Some(std::mem::replace(&mut existing.content, content)),
            None => {
                self.files.push(GeneratedFile { path, content });
                None
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.content.as_str())
    }

    pub fn remove(&mut self, path: &str) -> Option<String> {
        let index = self.files.iter().position(|f| f.path == path)?;
        Some(self.files.remove(index).content)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneratedFile> {
        self.files.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.path.as_str())
    }
}

impl<'a> IntoIterator for &'a GeneratedFileSet {
    type Item = &'a GeneratedFile;
    type IntoIter = std::slice::Iter<'a, GeneratedFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

// Serialized as a JSON object in insertion order.
impl Serialize for GeneratedFileSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.files.len()))?;
        for file in &self.files {
            map.serialize_entry(&file.path, &file.content)?;
        }
        map.end()
    }
}

/// Extract every labelled fenced block from a model response.
///
/// Labels and contents are trimmed; blocks whose label or content is empty
/// after trimming are dropped. An empty result means the response held no
/// usable code blocks.
pub fn parse_fenced_blocks(text: &str) -> GeneratedFileSet {
    let mut files = GeneratedFileSet::new();

    for captures in FENCED_BLOCK.captures_iter(text) {
        let label = captures[1].trim();
        let content = captures[2].trim();

        if !label.is_empty() && !content.is_empty() {
            files.insert(label, content);
        }
    }

    files
}

/// Count raw fence matches, including the ones [`parse_fenced_blocks`] drops.
pub fn count_fenced_blocks(text: &str) -> usize {
    FENCED_BLOCK.find_iter(text).count()
}

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

/// Prose written before the first fenced block.
///
/// A leading `<think>` section from reasoning models is not prose and is
/// skipped; if it never closes, nothing after it counts either. Falls back
/// to [`DEFAULT_TEXT_RESPONSE`] when the model went straight to code.
pub fn leading_text(text: &str) -> String {
    let text = strip_reasoning(text);
    let prose = match text.find("```") {
        Some(pos) => &text[..pos],
        None => text,
    };

    let prose = prose.trim();
    if prose.is_empty() {
        DEFAULT_TEXT_RESPONSE.to_string()
    } else {
        prose.to_string()
    }
}

fn strip_reasoning(text: &str) -> &str {
    let Some(rest) = text.trim_start().strip_prefix(THINK_OPEN) else {
        return text;
    };

    match rest.find(THINK_CLOSE) {
        Some(end) => &rest[end + THINK_CLOSE.len()..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_blocks_yields_empty_set() {
        let files = parse_fenced_blocks("Sorry, I cannot help with that.");
        assert!(files.is_empty());
        assert_eq!(count_fenced_blocks("Sorry, I cannot help with that."), 0);
    }

    #[test]
    fn test_multiple_blocks_in_order() {
        let text = "Here you go!\n\n```public/index.html\n<html></html>\n```\n\nand\n\n```src/App.js\nexport default App;\n```\n";
        let files = parse_fenced_blocks(text);

        let paths: Vec<&str> = files.paths().collect();
        assert_eq!(paths, vec!["public/index.html", "src/App.js"]);
        assert_eq!(files.get("public/index.html"), Some("<html></html>"));
        assert_eq!(files.get("src/App.js"), Some("export default App;"));
    }

    #[test]
    fn test_duplicate_label_keeps_position_takes_last_value() {
        let text = "```src/App.js\nfirst\n```\n```src/index.js\nindex\n```\n```src/App.js\nsecond\n```";
        let files = parse_fenced_blocks(text);

        let paths: Vec<&str> = files.paths().collect();
        assert_eq!(paths, vec!["src/App.js", "src/index.js"]);
        assert_eq!(files.get("src/App.js"), Some("second"));
    }

    #[test]
    fn test_whitespace_only_content_is_dropped() {
        let text = "```src/App.css\n   \n\t\n```\n```src/index.css\nbody {}\n```";
        let files = parse_fenced_blocks(text);

        assert_eq!(files.len(), 1);
        assert!(files.get("src/App.css").is_none());
        assert!(files.len() <= count_fenced_blocks(text));
    }

    #[test]
    fn test_language_tag_without_path_is_still_a_label() {
        // A bare language tag matches the label pattern; it just never
        // satisfies the manifest.
        let files = parse_fenced_blocks("```javascript\nconsole.log(1);\n```");
        assert_eq!(files.get("javascript"), Some("console.log(1);"));
    }

    #[test]
    fn test_label_with_invalid_characters_is_not_matched() {
        let files = parse_fenced_blocks("```my file.js\nconsole.log(1);\n```");
        assert!(files.is_empty());
    }

    #[test]
    fn test_unlabelled_fence_is_not_matched() {
        let files = parse_fenced_blocks("```\nconsole.log(1);\n```");
        assert!(files.is_empty());
    }

    #[test]
    fn test_content_is_trimmed() {
        let files = parse_fenced_blocks("```src/index.css\n\n  body { margin: 0; }  \n\n```");
        assert_eq!(files.get("src/index.css"), Some("body { margin: 0; }"));
    }

    #[test]
    fn test_crlf_line_endings() {
        let files = parse_fenced_blocks("```src/App.js\r\nconst a = 1;\r\n```");
        assert_eq!(files.get("src/App.js"), Some("const a = 1;"));
    }

    #[test]
    fn test_label_charset() {
        let files = parse_fenced_blocks("```src/c++/my-file_v2.0.js\nx\n```");
        assert_eq!(files.get("src/c++/my-file_v2.0.js"), Some("x"));
    }

    #[test]
    fn test_serializes_in_insertion_order() {
        let mut files = GeneratedFileSet::new();
        files.insert("src/z.js", "z");
        files.insert("public/a.html", "a");

        let json = serde_json::to_string(&files).unwrap();
        assert_eq!(json, r#"{"src/z.js":"z","public/a.html":"a"}"#);
    }

    #[test]
    fn test_insert_returns_previous_content() {
        let mut files = GeneratedFileSet::new();
        assert_eq!(files.insert("a", "1"), None);
        assert_eq!(files.insert("a", "2"), Some("1".to_string()));
        assert_eq!(files.remove("a"), Some("2".to_string()));
        assert!(files.is_empty());
    }

    #[test]
    fn test_leading_text() {
        let text = "I understand you want a todo app.\n\n```src/App.js\nx\n```";
        assert_eq!(leading_text(text), "I understand you want a todo app.");
    }

    #[test]
    fn test_leading_text_falls_back_when_empty() {
        assert_eq!(leading_text("```src/App.js\nx\n```"), DEFAULT_TEXT_RESPONSE);
        assert_eq!(leading_text("   "), DEFAULT_TEXT_RESPONSE);
    }

    #[test]
    fn test_leading_text_skips_reasoning() {
        let text = "<think>\nsecret reasoning about the user\n</think>\nHere is your app.\n\n```src/App.js\nx\n```";
        assert_eq!(leading_text(text), "Here is your app.");

        let text = "\n<think>plan ```src/App.js``` first</think>\n```src/App.js\nx\n```";
        assert_eq!(leading_text(text), DEFAULT_TEXT_RESPONSE);
    }

    #[test]
    fn test_leading_text_unclosed_reasoning_is_dropped() {
        let text = "<think>\nstill thinking\n```src/App.js\nx\n```";
        assert_eq!(leading_text(text), DEFAULT_TEXT_RESPONSE);
    }

    #[test]
    fn test_leading_text_keeps_inline_think_mentions() {
        let text = "Use a <think> tag sparingly.\n```src/App.js\nx\n```";
        assert_eq!(leading_text(text), "Use a <think> tag sparingly.");
    }
}

//! JSON documents.
//!
//! Backed by [`serde_json::Value`] with `preserve_order`, so keys come back
//! in the order they were read and new keys are appended.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

use super::detect_indent;
use super::error::{FileKind, MutationError, ParseError};

/// A parsed JSON file.
#[derive(Debug, Clone)]
pub struct JsonDocument {
    source: String,
    pub data: Value,
    original: Value,
    indent: String,
    trailing_newline: bool,
}

/// Parse strict JSON. Blank input is an empty object.
pub fn parse_json(source: &str) -> Result<JsonDocument, ParseError> {
    parse_stripped(source, source)
}

/// Parse JSON that may contain `//` and `/* */` comments and trailing
/// commas, as `tsconfig.json` does.
///
/// Comments are dropped when the document is generated after an edit.
pub fn parse_json_lenient(source: &str) -> Result<JsonDocument, ParseError> {
    parse_stripped(source, &strip_extensions(source))
}

fn parse_stripped(source: &str, stripped: &str) -> Result<JsonDocument, ParseError> {
    let data = if stripped.trim().is_empty() {
        Value::Object(Map::new())
    } else {
        serde_json::from_str::<Value>(stripped).map_err(|err| ParseError {
            kind: FileKind::Json,
            message: strip_position(&err.to_string()),
            line: err.line().max(1),
            column: err.column().max(1),
        })?
    };
    Ok(JsonDocument {
        source: source.to_owned(),
        original: data.clone(),
        data,
        indent: detect_indent(source).unwrap_or_else(|| "\t".into()),
        trailing_newline: source.is_empty() || source.ends_with('\n'),
    })
}

// serde_json appends " at line L column C", which ParseError already carries.
fn strip_position(message: &str) -> String {
    match message.rfind(" at line ") {
        Some(at) => message[..at].to_owned(),
        None => message.to_owned(),
    }
}

/// Blank out comments and trailing commas, keeping every other byte at its
/// offset so error positions still point into the original text.
fn strip_extensions(source: &str) -> String {
    let mut out = source.as_bytes().to_vec();
    scan_outside_strings(&mut out, |out, i| match (out[i], out.get(i + 1).copied()) {
        (b'/', Some(b'/')) => {
            let end = out[i..].iter().position(|&c| c == b'\n').map_or(out.len(), |e| i + e);
            out[i..end].fill(b' ');
            end
        }
        (b'/', Some(b'*')) => {
            let end = out[i + 2..]
                .windows(2)
                .position(|w| w == b"*/")
                .map_or(out.len(), |e| i + 2 + e + 2);
            for slot in &mut out[i..end] {
                if *slot != b'\n' {
                    *slot = b' ';
                }
            }
            end
        }
        _ => i + 1,
    });
    scan_outside_strings(&mut out, |out, i| {
        if out[i] == b',' {
            let next = out[i + 1..].iter().find(|c| !c.is_ascii_whitespace());
            if matches!(next, Some(b'}') | Some(b']')) {
                out[i] = b' ';
            }
        }
        i + 1
    });
    // only ASCII bytes outside strings were replaced
    String::from_utf8(out).unwrap_or_else(|_| source.to_owned())
}

/// Call `visit` for every byte outside string literals; it returns the
/// offset to continue from.
fn scan_outside_strings(out: &mut [u8], mut visit: impl FnMut(&mut [u8], usize) -> usize) {
    let mut i = 0;
    let mut in_string = false;
    while i < out.len() {
        if in_string {
            match out[i] {
                b'\\' => i += 1,
                b'"' => in_string = false,
                _ => {}
            }
            i += 1;
        } else if out[i] == b'"' {
            in_string = true;
            i += 1;
        } else {
            i = visit(out, i);
        }
    }
}

impl JsonDocument {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_modified(&self) -> bool {
        self.data != self.original
    }

    /// Indentation unit used for generated output.
    pub fn indent(&self) -> &str {
        &self.indent
    }

    /// The input when `data` was not changed, otherwise `data` pretty
    /// printed with the indentation and final newline of the input.
    pub fn generate(&self) -> String {
        if !self.is_modified() {
            return self.source.clone();
        }
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(self.indent.as_bytes());
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        if self.data.serialize(&mut serializer).is_err() {
            unreachable!("a Value always serializes into memory");
        }
        let mut out = String::from_utf8_lossy(&buf).into_owned();
        if self.trailing_newline {
            out.push('\n');
        }
        out
    }
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn as_object_mut<'a>(value: &'a mut Value, what: &str) -> Result<&'a mut Map<String, Value>, MutationError> {
    value
        .as_object_mut()
        .ok_or_else(|| MutationError::expected(format!("{what} to be a JSON object")))
}

/// Object stored under `key`, created when missing.
pub fn object_entry<'a>(value: &'a mut Value, key: &str) -> Result<&'a mut Map<String, Value>, MutationError> {
    let entry = as_object_mut(value, "the parent")?
        .entry(key)
        .or_insert_with(|| Value::Object(Map::new()));
    as_object_mut(entry, &format!("`{key}`"))
}

/// Array stored under `key`, created when missing.
pub fn array_entry<'a>(value: &'a mut Value, key: &str) -> Result<&'a mut Vec<Value>, MutationError> {
    as_object_mut(value, "the parent")?
        .entry(key)
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or_else(|| MutationError::expected(format!("`{key}` to be a JSON array")))
}

/// Set `key` only when it is absent; returns the stored value.
pub fn set_default<'a>(map: &'a mut Map<String, Value>, key: &str, value: impl Into<Value>) -> &'a mut Value {
    map.entry(key).or_insert_with(|| value.into())
}

/// Append `item` unless an equal item is present.
pub fn push_unique(array: &mut Vec<Value>, item: impl Into<Value>) {
    let item = item.into();
    if !array.contains(&item) {
        array.push(item);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_input_is_an_object() {
        let mut doc = parse_json("").unwrap();
        assert!(doc.data.as_object().is_some_and(Map::is_empty));
        doc.data["$schema"] = json!("https://inlang.com/schema/project-settings");
        doc.data["languageTags"] = json!(["en", "de"]);
        let once = doc.generate();
        assert_eq!(
            once,
            "{\n\t\"$schema\": \"https://inlang.com/schema/project-settings\",\n\t\"languageTags\": [\n\t\t\"en\",\n\t\t\"de\"\n\t]\n}\n"
        );

        let mut again = parse_json(&once).unwrap();
        again.data["$schema"] = json!("https://inlang.com/schema/project-settings");
        again.data["languageTags"] = json!(["en", "de"]);
        assert_eq!(again.generate(), once);
    }

    #[test]
    fn unchanged_documents_are_returned_verbatim() {
        let src = "{ \"name\": \"app\",   \"private\": true }";
        let doc = parse_json(src).unwrap();
        assert_eq!(doc.generate(), src);
    }

    #[test]
    fn indentation_and_key_order_survive() {
        let src = "{\n  \"name\": \"app\",\n  \"scripts\": {\n    \"dev\": \"vinxi dev\"\n  }\n}\n";
        let mut doc = parse_json(src).unwrap();
        let scripts = object_entry(&mut doc.data, "scripts").unwrap();
        set_default(scripts, "format", "prettier --write .");
        set_default(scripts, "dev", "ignored");
        assert_eq!(
            doc.generate(),
            "{\n  \"name\": \"app\",\n  \"scripts\": {\n    \"dev\": \"vinxi dev\",\n    \"format\": \"prettier --write .\"\n  }\n}\n"
        );
    }

    #[test]
    fn missing_trailing_newline_is_kept_missing() {
        let mut doc = parse_json("{\"a\": 1}").unwrap();
        doc.data["b"] = json!(2);
        assert!(!doc.generate().ends_with('\n'));
    }

    #[test]
    fn syntax_errors_carry_position() {
        let err = parse_json("{\n  \"a\": ,\n}").unwrap_err();
        assert_eq!(err.kind, FileKind::Json);
        assert_eq!(err.line, 2);
        assert!(!err.message.contains("at line"));
    }

    #[test]
    fn lenient_parsing_accepts_comments_and_trailing_commas() {
        let src = "{\n  // paths\n  \"compilerOptions\": {\n    /* alias */\n    \"paths\": { \"~/*\": [\"./src/*\"], },\n  },\n}\n";
        let doc = parse_json_lenient(src).unwrap();
        assert_eq!(doc.data["compilerOptions"]["paths"]["~/*"], json!(["./src/*"]));
        assert!(parse_json(src).is_err());

        let doc = parse_json_lenient("{ \"url\": \"http://a//b\" }").unwrap();
        assert_eq!(doc.data["url"], json!("http://a//b"));
    }

    #[test]
    fn entries_reject_wrong_types() {
        let mut doc = parse_json("{\"plugins\": {}}").unwrap();
        assert!(array_entry(&mut doc.data, "plugins").is_err());
        let plugins = array_entry(&mut doc.data, "extra").unwrap();
        push_unique(plugins, "a");
        push_unique(plugins, "a");
        assert_eq!(doc.data["extra"], json!(["a"]));
    }
}

//! Structured source mutation.
//!
//! One adapter per file kind parses text into an owned tree and generates
//! text back. Generation copies every untouched region of the input, so a
//! document nobody edited comes back byte for byte.
//!
//! | Module     | Input                           |
//! |------------|---------------------------------|
//! | [`js`]     | JavaScript, TypeScript, JSX     |
//! | [`json`]   | JSON, JSON with comments        |
//! | [`css`]    | Stylesheets                     |
//! | [`markup`] | Components with script sections, plain HTML |

pub mod css;
pub mod error;
pub mod js;
pub mod json;
pub mod markup;

pub use error::{EditError, EditResult, FileKind, MutationError, ParseError};

/// Smallest indentation step found in `src`, if any line is indented.
pub(crate) fn detect_indent(src: &str) -> Option<String> {
    let mut smallest: Option<usize> = None;
    for line in src.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with('\t') {
            return Some("\t".into());
        }
        let spaces = line.len() - line.trim_start_matches(' ').len();
        // ` * ` continuation lines of block comments
        if spaces > 0 && !line[spaces..].starts_with('*') {
            smallest = Some(smallest.map_or(spaces, |s| s.min(spaces)));
        }
    }
    smallest.map(|n| " ".repeat(n))
}

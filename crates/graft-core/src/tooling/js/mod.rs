//! Script adapter: JavaScript, TypeScript and JSX.
//!
//! ```
//! use graft_core::tooling::js::{self, imports};
//!
//! let mut doc = js::parse_script("export default {};\n").unwrap();
//! imports::add_default(&mut doc.ast, "vite-plugin", "plugin");
//! assert!(doc.generate().starts_with("import plugin from \"vite-plugin\";"));
//! ```

pub mod array;
pub mod ast;
pub mod common;
pub mod exports;
pub mod functions;
pub mod imports;
pub mod kit;
pub mod object;
mod parser;
mod printer;
pub mod variables;
pub mod walker;

pub use ast::*;
pub use printer::{Newline, Quote, Style};

use crate::tooling::error::ParseError;

/// A parsed script together with what is needed to print it back.
#[derive(Debug, Clone)]
pub struct ScriptDocument {
    source: String,
    /// The tree to edit.
    pub ast: Program,
    original: Program,
    style: Style,
}

impl ScriptDocument {
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let parsed = parser::parse_program(source)?;
        let style = Style::detect(source, parsed.single_quotes, parsed.double_quotes);
        Ok(Self {
            source: source.to_owned(),
            original: parsed.program.clone(),
            ast: parsed.program,
            style,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn is_modified(&self) -> bool {
        self.ast != self.original
    }

    /// Print the tree. Untouched documents come back byte for byte.
    pub fn generate(&self) -> String {
        if !self.is_modified() {
            return self.source.clone();
        }
        printer::print_program(&self.source, &self.ast, &self.original, &self.style)
    }
}

pub fn parse_script(source: &str) -> Result<ScriptDocument, ParseError> {
    ScriptDocument::parse(source)
}

/// Print a standalone expression with the default style.
pub fn print_expression(expr: &Expr) -> String {
    printer::print_expr(expr, &Style::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untouched_document_is_verbatim() {
        let src = "// config\nexport default   defineConfig({ })\n";
        let doc = parse_script(src).unwrap();
        assert!(!doc.is_modified());
        assert_eq!(doc.generate(), src);
    }

    #[test]
    fn empty_source_stays_empty() {
        let doc = parse_script("").unwrap();
        assert_eq!(doc.generate(), "");
    }

    #[test]
    fn parse_errors_carry_position() {
        let err = parse_script("let a;\nconst b = ;\n").unwrap_err();
        assert_eq!(err.line, 2);
    }
}

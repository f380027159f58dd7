//! Snippet parsing, structural search and small node constructors.

use super::ast::*;
use super::parser::{parse_detached_expression, parse_detached_statements};
use super::walker::{self, Cx, Visitor, Walk};
use crate::tooling::error::{FileKind, ParseError};

/// Parse a single statement written as source text.
///
/// The result carries no source locations, so it prints with the style of
/// whatever document it is spliced into.
pub fn statement_from_string(code: &str) -> Result<Stmt, ParseError> {
    let mut stmts = parse_detached_statements(code)?;
    if stmts.len() != 1 {
        return Err(ParseError::at(
            FileKind::Script,
            code,
            0,
            format!("expected exactly one statement, found {}", stmts.len()),
        ));
    }
    Ok(stmts.remove(0))
}

pub fn statements_from_string(code: &str) -> Result<Vec<Stmt>, ParseError> {
    parse_detached_statements(code)
}

pub fn expression_from_string(code: &str) -> Result<Expr, ParseError> {
    parse_detached_expression(code)
}

// ── structural search ───────────────────────────────────────────────────────

struct FindExpr<'n> {
    needle: &'n Expr,
    found: bool,
}

impl Visitor for FindExpr<'_> {
    type State = ();

    fn expression(&mut self, node: &mut Expr, cx: &mut Cx<'_, Self>) -> Option<Expr> {
        if *node == *self.needle {
            self.found = true;
            cx.stop();
            return None;
        }
        walker::dispatch_expression(self, node, cx)
    }
}

struct FindStmt<'n> {
    needle: &'n Stmt,
    found: bool,
}

impl Visitor for FindStmt<'_> {
    type State = ();

    fn statement(&mut self, node: &mut Stmt, cx: &mut Cx<'_, Self>) -> Option<Stmt> {
        if node.kind == self.needle.kind {
            self.found = true;
            cx.stop();
            return None;
        }
        walker::dispatch_statement(self, node, cx)
    }
}

/// Whether an expression equal to `needle` occurs anywhere in `haystack`.
/// Source positions and the quoting of literals are ignored.
pub fn has_node<N: Walk + Clone>(haystack: &N, needle: &Expr) -> bool {
    let mut copy = haystack.clone();
    let mut finder = FindExpr {
        needle,
        found: false,
    };
    walker::walk(&mut copy, (), &mut finder);
    finder.found
}

/// Like [`has_node`] for statements; attached comments are ignored.
pub fn has_statement<N: Walk + Clone>(haystack: &N, needle: &Stmt) -> bool {
    let mut copy = haystack.clone();
    let mut finder = FindStmt {
        needle,
        found: false,
    };
    walker::walk(&mut copy, (), &mut finder);
    finder.found
}

// ── constructors ────────────────────────────────────────────────────────────

impl From<&str> for Lit {
    fn from(value: &str) -> Self {
        Lit::Str(Str::new(value))
    }
}

impl From<String> for Lit {
    fn from(value: String) -> Self {
        Lit::Str(Str::new(value))
    }
}

impl From<bool> for Lit {
    fn from(value: bool) -> Self {
        Lit::Bool(value)
    }
}

impl From<f64> for Lit {
    fn from(value: f64) -> Self {
        Lit::Num {
            value,
            raw: Raw(None),
        }
    }
}

pub fn create_literal(value: impl Into<Lit>) -> Expr {
    Expr::new(ExprKind::Lit(value.into()))
}

/// `expr satisfies ty`
pub fn satisfies_expression(expr: Expr, ty: &str) -> Expr {
    Expr::new(ExprKind::TsSatisfies {
        expr: Box::new(expr),
        ty: ty.to_owned(),
    })
}

/// Attach `/** @type {ty} */` above `stmt` unless an equal comment is there.
pub fn add_jsdoc_type_comment(comments: &mut Vec<Comment>, ty: &str) {
    let comment = Comment::block(format!("* @type {{{ty}}} "));
    if !comments.contains(&comment) {
        comments.push(comment);
    }
}

pub fn has_type_prop(iface: &TsInterface, name: &str) -> bool {
    iface
        .body
        .iter()
        .any(|m| matches!(&m.kind, TsMemberKind::Property { key, .. } if key == name))
}

/// Insert `stmt` right before the default export, or append it when there
/// is none. Does nothing when an equal statement already exists.
pub fn insert_before_default_export(program: &mut Program, stmt: Stmt) {
    if program.body.iter().any(|s| s.kind == stmt.kind) {
        return;
    }
    let at = program
        .body
        .iter()
        .position(|s| matches!(s.kind, StmtKind::ExportDefault(_)))
        .unwrap_or(program.body.len());
    program.body.insert(at, stmt);
}

#[cfg(test)]
mod tests {
    use super::super::parse_script;
    use super::*;

    #[test]
    fn snippets_parse_into_statements_and_expressions() {
        let stmt = statement_from_string("const a = 1;").unwrap();
        assert!(matches!(stmt.kind, StmtKind::Var(_)));
        assert!(statement_from_string("a; b;").is_err());
        let expr = expression_from_string("createMiddleware({})").unwrap();
        assert!(matches!(expr.kind, ExprKind::Call(_)));
    }

    #[test]
    fn has_node_ignores_positions_and_quotes() {
        let doc = parse_script("export default { plugins: [mdx({ extension: 'mdx' })] };").unwrap();
        let needle = expression_from_string("mdx({ extension: \"mdx\" })").unwrap();
        assert!(has_node(&doc.ast, &needle));
        let other = expression_from_string("mdx({ extension: \"md\" })").unwrap();
        assert!(!has_node(&doc.ast, &other));
    }

    #[test]
    fn has_statement_finds_nested_statements() {
        let doc = parse_script("function f() { if (x) { return 1; } }").unwrap();
        let needle = statement_from_string("return 1;").unwrap();
        assert!(has_statement(&doc.ast, &needle));
    }

    #[test]
    fn jsdoc_comment_is_added_once() {
        let mut stmt = statement_from_string("export default {};").unwrap();
        add_jsdoc_type_comment(&mut stmt.comments, "import('prettier').Config");
        add_jsdoc_type_comment(&mut stmt.comments, "import('prettier').Config");
        assert_eq!(stmt.comments.len(), 1);
        assert_eq!(stmt.comments[0].text, "* @type {import('prettier').Config} ");
    }

    #[test]
    fn insert_before_default_export_is_idempotent() {
        let mut doc = parse_script("import a from 'a';\nexport default a;\n").unwrap();
        let helper = statement_from_string("function helper() {}").unwrap();
        insert_before_default_export(&mut doc.ast, helper.clone());
        insert_before_default_export(&mut doc.ast, helper);
        assert_eq!(doc.ast.body.len(), 3);
        assert!(matches!(doc.ast.body[1].kind, StmtKind::Function(_)));
    }

    #[test]
    fn literals_and_satisfies() {
        assert_eq!(create_literal("x"), Expr::string("x"));
        let expr = satisfies_expression(Expr::object(Vec::new()), "Config");
        assert_eq!(super::super::print_expression(&expr), "{} satisfies Config");
    }
}

//! Front end for JavaScript, TypeScript and JSX.
//!
//! Source goes through tree-sitter's TSX grammar, or through its plain
//! TypeScript grammar when TSX rejects the text (`<T>value` assertions).
//! The concrete tree is then lowered into the owned [`ast`](super::ast):
//! keywords become flags, type annotations stay text, comments are attached
//! to the statement or member they sit on and every node keeps its byte
//! span for the generator.

use tracing::debug;
use tree_sitter::{Language, Node, Parser, Tree};

use super::ast::*;
use crate::tooling::error::{FileKind, ParseError};

type PResult<T> = Result<T, ParseError>;

/// Output of [`parse_program`].
#[derive(Debug, Clone)]
pub(crate) struct Parsed {
    pub program: Program,
    pub single_quotes: usize,
    pub double_quotes: usize,
}

/// Parse a whole source file.
pub(crate) fn parse_program(src: &str) -> PResult<Parsed> {
    let tree = syntax_tree(src).map_err(|(offset, message)| error_at(src, offset, message))?;
    let mut lower = Lower::new(src, false);
    let program = lower.program(tree.root_node())?;
    Ok(Parsed {
        program,
        single_quotes: lower.single_quotes,
        double_quotes: lower.double_quotes,
    })
}

/// Parse statements with no source locations, for splicing into another
/// tree.
pub(crate) fn parse_detached_statements(src: &str) -> PResult<Vec<Stmt>> {
    let tree = syntax_tree(src).map_err(|(offset, message)| error_at(src, offset, message))?;
    Ok(Lower::new(src, true).program(tree.root_node())?.body)
}

/// Parse a single expression with no source locations.
pub(crate) fn parse_detached_expression(src: &str) -> PResult<Expr> {
    let lead = src.len() - src.trim_start().len();
    let body = src.trim().trim_end_matches(';');
    // parenthesized so that `{ .. }` reads as an object literal
    let wrapped = format!("({body}\n)");
    let tree = syntax_tree(&wrapped)
        .map_err(|(offset, message)| error_at(src, (offset + lead).saturating_sub(1), message))?;

    let statements = code_children(tree.root_node());
    let inner = match statements.as_slice() {
        [stmt] if stmt.kind() == "expression_statement" => first_code_child(*stmt)
            .filter(|paren| paren.kind() == "parenthesized_expression")
            .and_then(first_code_child),
        _ => None,
    };
    let Some(inner) = inner else {
        return Err(error_at(src, lead, "expected a single expression"));
    };
    Lower::new(&wrapped, true).expr(inner)
}

// ── syntax tree ──────────────────────────────────────────────────────────────

fn grammar_tree(language: Language, src: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    parser.set_language(&language).ok()?;
    parser.parse(src, None)
}

/// The concrete tree of `src`, or the offset and message of its first
/// syntax error.
fn syntax_tree(src: &str) -> Result<Tree, (usize, String)> {
    let tsx = grammar_tree(tree_sitter_typescript::LANGUAGE_TSX.into(), src)
        .ok_or_else(|| (0, "the TSX grammar could not be loaded".to_owned()))?;
    if !tsx.root_node().has_error() {
        return Ok(tsx);
    }
    debug!("TSX grammar rejected the source, retrying as TypeScript");
    if let Some(ts) = grammar_tree(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(), src) {
        if !ts.root_node().has_error() {
            return Ok(ts);
        }
    }
    Err(first_error(tsx.root_node(), src).unwrap_or_else(|| (0, "syntax error".to_owned())))
}

/// First `ERROR` node or invented token in source order.
fn first_error(node: Node<'_>, src: &str) -> Option<(usize, String)> {
    if node.is_missing() {
        return Some((node.start_byte(), format!("expected `{}`", node.kind())));
    }
    if node.is_error() {
        let text = src.get(node.byte_range()).unwrap_or_default();
        let token: String = text
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .chars()
            .take(24)
            .collect();
        let message = if token.is_empty() {
            "unexpected end of input".to_owned()
        } else {
            format!("unexpected token `{token}`")
        };
        return Some((node.start_byte(), message));
    }
    if !node.has_error() {
        return None;
    }
    all_children(node)
        .into_iter()
        .find_map(|child| first_error(child, src))
}

fn error_at(src: &str, offset: usize, message: impl Into<String>) -> ParseError {
    ParseError::at(FileKind::Script, src, offset, message)
}

// ── node helpers ─────────────────────────────────────────────────────────────

fn is_comment(node: Node<'_>) -> bool {
    node.kind() == "comment"
}

fn all_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Named children without comments.
fn code_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| !is_comment(*c))
        .collect()
}

fn first_code_child(node: Node<'_>) -> Option<Node<'_>> {
    code_children(node).into_iter().next()
}

/// Whether `node` has the keyword or punctuation `token` as a direct child.
fn has_token(node: Node<'_>, token: &str) -> bool {
    all_children(node)
        .iter()
        .any(|c| !c.is_named() && c.kind() == token)
}

const OPERATORS: &[&str] = &[
    "===", "!==", "**=", "<<=", ">>=", ">>>=", "&&=", "||=", "??=", ">>>", "==", "!=", "<=",
    ">=", "&&", "||", "??", "<<", ">>", "**", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "+", "-", "*", "/", "%", "<", ">", "&", "|", "^", "!", "~", "=", "in",
    "instanceof", "typeof", "void", "delete",
];

fn read_unicode_escape(rest: &str) -> Option<(char, usize)> {
    if let Some(braced) = rest.strip_prefix('{') {
        let close = braced.find('}')?;
        let code = u32::from_str_radix(&braced[..close], 16).ok()?;
        return char::from_u32(code).map(|c| (c, close + 2));
    }
    let hex = rest.get(..4)?;
    let code = u32::from_str_radix(hex, 16).ok()?;
    char::from_u32(code).map(|c| (c, 4))
}

/// Cooked value of the text between a string literal's quotes.
fn unescape(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_owned();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(i) = rest.find('\\') {
        out.push_str(&rest[..i]);
        rest = &rest[i + 1..];
        let Some(c) = rest.chars().next() else {
            break;
        };
        rest = &rest[c.len_utf8()..];
        match c {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' if !rest.starts_with(|d: char| d.is_ascii_digit()) => out.push('\0'),
            'x' => match rest
                .get(..2)
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .and_then(char::from_u32)
            {
                Some(ch) => {
                    out.push(ch);
                    rest = &rest[2..];
                }
                None => out.push('x'),
            },
            'u' => match read_unicode_escape(rest) {
                Some((ch, len)) => {
                    out.push(ch);
                    rest = &rest[len..];
                }
                None => out.push('u'),
            },
            '\r' => rest = rest.strip_prefix('\n').unwrap_or(rest),
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => out.push(other),
        }
    }
    out.push_str(rest);
    out
}

fn set_pat_type(pat: &mut Pat, new_ty: TsType) {
    match &mut pat.kind {
        PatKind::Ident { ty, .. }
        | PatKind::Object { ty, .. }
        | PatKind::Array { ty, .. }
        | PatKind::Rest { ty, .. } => *ty = Some(new_ty),
        PatKind::Assign { target, .. } => set_pat_type(target, new_ty),
        PatKind::Expr(_) => {}
    }
}

// ── lowering ─────────────────────────────────────────────────────────────────

/// Pieces of a method shared by classes and object literals.
struct MethodParts {
    key: PropKey,
    kind: MethodKind,
    func: Function,
    is_static: bool,
    modifiers: Vec<String>,
}

struct Lower<'s> {
    src: &'s str,
    detached: bool,
    single_quotes: usize,
    double_quotes: usize,
}

impl<'s> Lower<'s> {
    fn new(src: &'s str, detached: bool) -> Self {
        Self {
            src,
            detached,
            single_quotes: 0,
            double_quotes: 0,
        }
    }

    fn text(&self, node: Node<'_>) -> &'s str {
        self.src.get(node.byte_range()).unwrap_or_default()
    }

    fn span(&self, start: usize, end: usize) -> Loc {
        if self.detached {
            Loc::NONE
        } else {
            Loc::new(start, end)
        }
    }

    fn loc(&self, node: Node<'_>) -> Loc {
        self.span(node.start_byte(), node.end_byte())
    }

    fn raw(&self, text: &str) -> Raw {
        Raw((!self.detached).then(|| text.to_owned()))
    }

    fn error(&self, node: Node<'_>, message: impl Into<String>) -> ParseError {
        error_at(self.src, node.start_byte(), message)
    }

    fn unsupported(&self, node: Node<'_>) -> ParseError {
        self.error(node, format!("unsupported syntax `{}`", node.kind()))
    }

    fn field<'t>(&self, node: Node<'t>, name: &str) -> PResult<Node<'t>> {
        node.child_by_field_name(name)
            .ok_or_else(|| self.error(node, format!("expected {name} in {}", node.kind())))
    }

    fn first<'t>(&self, node: Node<'t>) -> PResult<Node<'t>> {
        first_code_child(node).ok_or_else(|| self.error(node, format!("empty {}", node.kind())))
    }

    fn same_line(&self, from: usize, to: usize) -> bool {
        self.src.get(from..to).is_some_and(|gap| !gap.contains('\n'))
    }

    fn comment(&self, node: Node<'_>) -> Comment {
        let text = self.text(node);
        match text.strip_prefix("//") {
            Some(rest) => Comment::line(rest.trim_end_matches('\r')),
            None => Comment::block(
                text.strip_prefix("/*")
                    .and_then(|t| t.strip_suffix("*/"))
                    .unwrap_or(text),
            ),
        }
    }

    fn type_text(&self, node: Option<Node<'_>>) -> Option<TsType> {
        node.map(|n| self.text(n).to_owned())
    }

    /// `: T` without the colon.
    fn annotation(&self, node: Option<Node<'_>>) -> Option<TsType> {
        node.map(|n| {
            let text = self.text(n);
            text.strip_prefix(':').unwrap_or(text).trim().to_owned()
        })
    }

    /// Text of a clause after its leading keyword (`extends A, B`).
    fn after_keyword(&self, node: Node<'_>, keyword: &str) -> TsType {
        let text = self.text(node);
        text.strip_prefix(keyword).unwrap_or(text).trim().to_owned()
    }

    fn str_lit(&mut self, node: Node<'_>) -> Str {
        let text = self.text(node);
        match text.chars().next() {
            Some('\'') => self.single_quotes += 1,
            Some('"') => self.double_quotes += 1,
            _ => {}
        }
        let inner = text.get(1..text.len().saturating_sub(1)).unwrap_or_default();
        Str {
            value: unescape(inner),
            raw: self.raw(text),
        }
    }

    /// Identifier or string in a module position (`import { "a-b" as c }`).
    fn module_name(&mut self, node: Node<'_>) -> String {
        if node.kind() == "string" {
            self.str_lit(node).value
        } else {
            self.text(node).to_owned()
        }
    }

    fn op(&self, node: Node<'_>) -> PResult<&'static str> {
        let text = self.text(node);
        OPERATORS
            .iter()
            .copied()
            .find(|op| *op == text)
            .ok_or_else(|| self.error(node, format!("unknown operator `{text}`")))
    }

    // ── statements ──────────────────────────────────────────────────────────

    fn program(&mut self, root: Node<'_>) -> PResult<Program> {
        let nodes = all_children(root)
            .into_iter()
            .filter(|c| c.is_named() && c.kind() != "hash_bang_line");
        let (body, dangling) = self.statements(nodes)?;
        Ok(Program { body, dangling })
    }

    /// Lower a statement list. Comments on the line where a statement ends
    /// trail it; the others lead the next statement or, at the end, dangle.
    fn statements<'t>(
        &mut self,
        nodes: impl IntoIterator<Item = Node<'t>>,
    ) -> PResult<(Vec<Stmt>, Vec<Comment>)> {
        let mut body: Vec<Stmt> = Vec::new();
        let mut pending: Vec<Node<'t>> = Vec::new();
        let mut last_end: Option<usize> = None;
        for node in nodes {
            if is_comment(node) {
                let trailing = pending.is_empty()
                    && last_end.is_some_and(|end| self.same_line(end, node.start_byte()));
                match body.last_mut() {
                    Some(prev) if trailing => {
                        prev.trailing.push(self.comment(node));
                        if let Some((start, _)) = prev.loc.span() {
                            prev.loc = self.span(start, node.end_byte());
                        }
                        last_end = Some(node.end_byte());
                    }
                    _ => pending.push(node),
                }
                continue;
            }
            let mut stmt = self.statement(node)?;
            if let Some(first) = pending.first() {
                if let Some((_, end)) = stmt.loc.span() {
                    stmt.loc = self.span(first.start_byte(), end);
                }
                stmt.comments = pending.drain(..).map(|c| self.comment(c)).collect();
            }
            last_end = Some(node.end_byte());
            body.push(stmt);
        }
        let dangling = pending.into_iter().map(|c| self.comment(c)).collect();
        Ok((body, dangling))
    }

    fn statement(&mut self, node: Node<'_>) -> PResult<Stmt> {
        let kind = self.stmt_kind(node)?;
        Ok(Stmt {
            kind,
            comments: Vec::new(),
            trailing: self.inner_trailing_comments(node),
            loc: self.loc(node),
        })
    }

    /// Comments the grammar kept inside `node`, after its last token.
    fn inner_trailing_comments(&self, node: Node<'_>) -> Vec<Comment> {
        let children = all_children(node);
        let Some(code_end) = children
            .iter()
            .rev()
            .find(|c| !is_comment(**c))
            .map(|c| c.end_byte())
        else {
            return Vec::new();
        };
        children
            .into_iter()
            .filter(|c| {
                is_comment(*c)
                    && c.start_byte() >= code_end
                    && self.same_line(code_end, c.start_byte())
            })
            .map(|c| self.comment(c))
            .collect()
    }

    /// A statement nested in another statement; never carries comments.
    fn nested(&mut self, node: Node<'_>) -> PResult<Box<Stmt>> {
        let kind = self.stmt_kind(node)?;
        Ok(Box::new(Stmt {
            kind,
            comments: Vec::new(),
            trailing: Vec::new(),
            loc: self.loc(node),
        }))
    }

    fn block(&mut self, node: Node<'_>) -> PResult<Block> {
        let nodes = all_children(node).into_iter().filter(|c| c.is_named());
        let (body, dangling) = self.statements(nodes)?;
        Ok(Block {
            body,
            dangling,
            loc: self.loc(node),
        })
    }

    fn raw_statement(&self, node: Node<'_>) -> StmtKind {
        StmtKind::Raw(self.text(node).to_owned())
    }

    fn stmt_kind(&mut self, node: Node<'_>) -> PResult<StmtKind> {
        Ok(match node.kind() {
            "import_statement" => self.import(node)?,
            "export_statement" => self.export(node)?,
            "lexical_declaration" | "variable_declaration" => StmtKind::Var(self.var_decl(node, false)?),
            "function_declaration" | "generator_function_declaration" | "function_signature" => {
                StmtKind::Function(self.function(node)?)
            }
            "class_declaration" | "abstract_class_declaration" => StmtKind::Class(self.class(node)?),
            "expression_statement" => match first_code_child(node) {
                Some(e) => StmtKind::Expr(self.expr(e)?),
                None => StmtKind::Empty,
            },
            "statement_block" => StmtKind::Block(self.block(node)?),
            "if_statement" => {
                let test = self.condition(node, "condition")?;
                let cons = self.nested(self.field(node, "consequence")?)?;
                let alt = match node.child_by_field_name("alternative") {
                    Some(clause) => Some(self.nested(self.first(clause)?)?),
                    None => None,
                };
                StmtKind::If { test, cons, alt }
            }
            "for_statement" => self.for_statement(node)?,
            "for_in_statement" => self.for_in_statement(node)?,
            "while_statement" => StmtKind::While {
                test: self.condition(node, "condition")?,
                body: self.nested(self.field(node, "body")?)?,
            },
            "do_statement" => StmtKind::DoWhile {
                body: self.nested(self.field(node, "body")?)?,
                test: self.condition(node, "condition")?,
            },
            "return_statement" => StmtKind::Return(self.optional_expr(first_code_child(node))?),
            "throw_statement" => StmtKind::Throw(self.expr(self.first(node)?)?),
            "try_statement" => self.try_statement(node)?,
            "switch_statement" => self.switch_statement(node)?,
            "break_statement" => {
                StmtKind::Break(node.child_by_field_name("label").map(|l| self.text(l).to_owned()))
            }
            "continue_statement" => {
                StmtKind::Continue(node.child_by_field_name("label").map(|l| self.text(l).to_owned()))
            }
            "labeled_statement" => StmtKind::Labeled {
                label: self.text(self.field(node, "label")?).to_owned(),
                body: self.nested(self.field(node, "body")?)?,
            },
            "empty_statement" => StmtKind::Empty,
            "debugger_statement" => StmtKind::Debugger,
            "interface_declaration" => StmtKind::TsInterface(self.interface(node, false)?),
            "type_alias_declaration" => StmtKind::TsTypeAlias(self.type_alias(node, false)?),
            "module" | "internal_module" => StmtKind::TsModule(self.ts_module(node, false)?),
            "ambient_declaration" => self.ambient(node)?,
            // enums, `import x = require(..)`, `with`, ...
            _ => self.raw_statement(node),
        })
    }

    fn optional_expr(&mut self, node: Option<Node<'_>>) -> PResult<Option<Expr>> {
        node.map(|n| self.expr(n)).transpose()
    }

    /// The expression inside a `(..)` condition.
    fn condition(&mut self, node: Node<'_>, name: &str) -> PResult<Expr> {
        let cond = self.field(node, name)?;
        let inner = if cond.kind() == "parenthesized_expression" {
            self.first(cond)?
        } else {
            cond
        };
        self.expr(inner)
    }

    fn for_statement(&mut self, node: Node<'_>) -> PResult<StmtKind> {
        let init = match node.child_by_field_name("initializer") {
            Some(n) if matches!(n.kind(), "lexical_declaration" | "variable_declaration") => {
                Some(ForHead::Var(self.var_decl(n, false)?))
            }
            Some(n) if n.is_named() && n.kind() != "empty_statement" => Some(ForHead::Expr(self.expr(n)?)),
            _ => None,
        };
        let test = match node.child_by_field_name("condition") {
            Some(n) if n.kind() == "expression_statement" => self.optional_expr(first_code_child(n))?,
            Some(n) if n.is_named() && n.kind() != "empty_statement" => Some(self.expr(n)?),
            _ => None,
        };
        let update = self.optional_expr(node.child_by_field_name("increment"))?;
        let body = self.nested(self.field(node, "body")?)?;
        Ok(StmtKind::For {
            init,
            test,
            update,
            body,
        })
    }

    fn for_in_statement(&mut self, node: Node<'_>) -> PResult<StmtKind> {
        let left_node = self.field(node, "left")?;
        let left = match node.child_by_field_name("kind") {
            Some(keyword) => ForHead::Var(VarDecl {
                kind: match self.text(keyword) {
                    "let" => VarKind::Let,
                    "const" => VarKind::Const,
                    _ => VarKind::Var,
                },
                declarators: vec![Declarator {
                    id: self.pat(left_node)?,
                    init: None,
                }],
                declare: false,
            }),
            None => ForHead::Expr(self.expr(left_node)?),
        };
        let right = self.expr(self.field(node, "right")?)?;
        let body = self.nested(self.field(node, "body")?)?;
        let is_of = node
            .child_by_field_name("operator")
            .is_some_and(|op| self.text(op) == "of");
        Ok(if is_of {
            StmtKind::ForOf {
                left,
                right,
                body,
                is_await: has_token(node, "await"),
            }
        } else {
            StmtKind::ForIn { left, right, body }
        })
    }

    fn try_statement(&mut self, node: Node<'_>) -> PResult<StmtKind> {
        let block = self.block(self.field(node, "body")?)?;
        let handler = match node.child_by_field_name("handler") {
            Some(clause) => {
                let param = match clause.child_by_field_name("parameter") {
                    Some(p) => {
                        let mut pat = self.pat(p)?;
                        if let Some(ty) = self.annotation(clause.child_by_field_name("type")) {
                            set_pat_type(&mut pat, ty);
                        }
                        Some(pat)
                    }
                    None => None,
                };
                Some(CatchClause {
                    param,
                    body: self.block(self.field(clause, "body")?)?,
                })
            }
            None => None,
        };
        let finalizer = match node.child_by_field_name("finalizer") {
            Some(clause) => Some(self.block(self.field(clause, "body")?)?),
            None => None,
        };
        Ok(StmtKind::Try {
            block,
            handler,
            finalizer,
        })
    }

    fn switch_statement(&mut self, node: Node<'_>) -> PResult<StmtKind> {
        let discriminant = self.condition(node, "value")?;
        let mut cases = Vec::new();
        for case in code_children(self.field(node, "body")?) {
            let value = case.child_by_field_name("value");
            let test = self.optional_expr(value)?;
            let nodes = all_children(case)
                .into_iter()
                .filter(|c| c.is_named() && Some(c.id()) != value.map(|v| v.id()));
            let (body, _) = self.statements(nodes)?;
            cases.push(SwitchCase {
                test,
                body,
                loc: self.loc(case),
            });
        }
        Ok(StmtKind::Switch {
            discriminant,
            cases,
        })
    }

    // ── modules ─────────────────────────────────────────────────────────────

    fn import(&mut self, node: Node<'_>) -> PResult<StmtKind> {
        let mut specifiers = Vec::new();
        let mut type_only = false;
        for child in all_children(node) {
            match child.kind() {
                "type" if !child.is_named() => type_only = true,
                "import_clause" => specifiers = self.import_clause(child)?,
                "import_require_clause" => return Ok(self.raw_statement(node)),
                _ => {}
            }
        }
        let source = self.field(node, "source")?;
        Ok(StmtKind::Import(ImportDecl {
            specifiers,
            source: self.str_lit(source),
            type_only,
        }))
    }

    fn import_clause(&mut self, clause: Node<'_>) -> PResult<Vec<ImportSpecifier>> {
        let mut specifiers = Vec::new();
        for child in code_children(clause) {
            match child.kind() {
                "identifier" => specifiers.push(ImportSpecifier::Default {
                    local: self.text(child).to_owned(),
                }),
                "namespace_import" => {
                    let local = code_children(child)
                        .last()
                        .map(|n| self.text(*n).to_owned())
                        .ok_or_else(|| self.error(child, "expected namespace binding"))?;
                    specifiers.push(ImportSpecifier::Namespace { local });
                }
                "named_imports" => {
                    for spec in code_children(child) {
                        let imported = self.module_name(self.field(spec, "name")?);
                        let local = match spec.child_by_field_name("alias") {
                            Some(alias) => self.text(alias).to_owned(),
                            None => imported.clone(),
                        };
                        specifiers.push(ImportSpecifier::Named {
                            imported,
                            local,
                            type_only: has_token(spec, "type"),
                        });
                    }
                }
                _ => {}
            }
        }
        Ok(specifiers)
    }

    fn export(&mut self, node: Node<'_>) -> PResult<StmtKind> {
        let children = all_children(node);
        let keyword = |kw: &str| children.iter().any(|c| !c.is_named() && c.kind() == kw);
        let is_default = keyword("default");
        let type_only = keyword("type");
        let star = keyword("*");

        if let Some(decl) = node.child_by_field_name("declaration") {
            let mut decorators = Vec::new();
            for d in children.iter().filter(|c| c.kind() == "decorator") {
                decorators.push(self.decorator(*d)?);
            }
            if is_default {
                let kind = match decl.kind() {
                    "function_declaration" | "generator_function_declaration" => {
                        ExprKind::Function(self.function(decl)?)
                    }
                    "class_declaration" | "abstract_class_declaration" => {
                        let mut class = self.class(decl)?;
                        decorators.append(&mut class.decorators);
                        class.decorators = decorators;
                        ExprKind::Class(class)
                    }
                    _ => return Ok(self.raw_statement(node)),
                };
                return Ok(StmtKind::ExportDefault(Expr {
                    kind,
                    loc: self.loc(decl),
                }));
            }
            let mut inner = self.nested(decl)?;
            if let StmtKind::Class(class) = &mut inner.kind {
                decorators.append(&mut class.decorators);
                class.decorators = decorators;
            }
            return Ok(StmtKind::ExportNamed(ExportNamed {
                decl: Some(inner),
                specifiers: Vec::new(),
                source: None,
                type_only: false,
            }));
        }
        if let Some(value) = node.child_by_field_name("value") {
            return Ok(StmtKind::ExportDefault(self.expr(value)?));
        }

        let source = node.child_by_field_name("source").map(|s| self.str_lit(s));
        if let Some(clause) = children.iter().find(|c| c.kind() == "export_clause") {
            let mut specifiers = Vec::new();
            for spec in code_children(*clause) {
                let local = self.module_name(self.field(spec, "name")?);
                let exported = match spec.child_by_field_name("alias") {
                    Some(alias) => self.module_name(alias),
                    None => local.clone(),
                };
                specifiers.push(ExportSpecifier { local, exported });
            }
            return Ok(StmtKind::ExportNamed(ExportNamed {
                decl: None,
                specifiers,
                source,
                type_only,
            }));
        }
        let namespace = children.iter().find(|c| c.kind() == "namespace_export");
        if let (true, Some(source)) = (star || namespace.is_some(), source) {
            let alias = match namespace.and_then(|ns| code_children(*ns).last().copied()) {
                Some(name) => Some(self.module_name(name)),
                None => None,
            };
            return Ok(StmtKind::ExportAll {
                alias,
                source,
                type_only,
            });
        }
        // `export = x`, `export as namespace X`
        Ok(self.raw_statement(node))
    }

    // ── declarations ────────────────────────────────────────────────────────

    fn var_decl(&mut self, node: Node<'_>, declare: bool) -> PResult<VarDecl> {
        let keyword = node
            .child_by_field_name("kind")
            .or_else(|| all_children(node).first().copied())
            .map_or("var", |k| self.text(k));
        let kind = match keyword {
            "let" => VarKind::Let,
            "const" => VarKind::Const,
            _ => VarKind::Var,
        };
        let mut declarators = Vec::new();
        for d in code_children(node).into_iter().filter(|c| c.kind() == "variable_declarator") {
            let mut id = self.pat(self.field(d, "name")?)?;
            if let Some(ty) = self.annotation(d.child_by_field_name("type")) {
                set_pat_type(&mut id, ty);
            }
            let init = self.optional_expr(d.child_by_field_name("value"))?;
            declarators.push(Declarator { id, init });
        }
        Ok(VarDecl {
            kind,
            declarators,
            declare,
        })
    }

    fn function(&mut self, node: Node<'_>) -> PResult<Function> {
        Ok(Function {
            name: node.child_by_field_name("name").map(|n| self.text(n).to_owned()),
            params: self.params(node.child_by_field_name("parameters"))?,
            body: match node.child_by_field_name("body") {
                Some(body) => Some(self.block(body)?),
                None => None,
            },
            is_async: has_token(node, "async"),
            is_generator: has_token(node, "*"),
            type_params: self.type_text(node.child_by_field_name("type_parameters")),
            return_type: self.annotation(node.child_by_field_name("return_type")),
        })
    }

    fn params(&mut self, node: Option<Node<'_>>) -> PResult<Vec<Param>> {
        let Some(node) = node else {
            return Ok(Vec::new());
        };
        let mut params = Vec::new();
        for child in code_children(node) {
            params.push(match child.kind() {
                "required_parameter" | "optional_parameter" => self.param(child)?,
                _ => Param::new(self.pat(child)?),
            });
        }
        Ok(params)
    }

    fn param(&mut self, node: Node<'_>) -> PResult<Param> {
        let mut modifiers = Vec::new();
        for child in all_children(node) {
            match child.kind() {
                "decorator" | "accessibility_modifier" | "override_modifier" => {
                    modifiers.push(self.text(child).to_owned());
                }
                "readonly" if !child.is_named() => modifiers.push("readonly".to_owned()),
                _ => {}
            }
        }
        let target = match node.child_by_field_name("pattern") {
            Some(target) => target,
            None => code_children(node)
                .into_iter()
                .find(|c| {
                    !matches!(
                        c.kind(),
                        "decorator" | "accessibility_modifier" | "override_modifier"
                    )
                })
                .ok_or_else(|| self.error(node, "expected parameter name"))?,
        };
        let mut pat = self.pat(target)?;
        if node.kind() == "optional_parameter" {
            if let PatKind::Ident { optional, .. } = &mut pat.kind {
                *optional = true;
            }
        }
        if let Some(ty) = self.annotation(node.child_by_field_name("type")) {
            set_pat_type(&mut pat, ty);
        }
        if let Some(value) = node.child_by_field_name("value") {
            let default = self.expr(value)?;
            pat = Pat {
                kind: PatKind::Assign {
                    target: Box::new(pat),
                    default: Box::new(default),
                },
                loc: self.loc(node),
            };
        }
        Ok(Param { modifiers, pat })
    }

    fn decorator(&mut self, node: Node<'_>) -> PResult<Expr> {
        self.expr(self.first(node)?)
    }

    fn class(&mut self, node: Node<'_>) -> PResult<Class> {
        let mut decorators = Vec::new();
        let mut super_class = None;
        let mut implements = None;
        for child in all_children(node) {
            match child.kind() {
                "decorator" => decorators.push(self.decorator(child)?),
                "class_heritage" => {
                    for clause in code_children(child) {
                        match clause.kind() {
                            "extends_clause" => {
                                let value = match clause.child_by_field_name("value") {
                                    Some(value) => value,
                                    None => self.first(clause)?,
                                };
                                super_class = Some(Box::new(self.expr(value)?));
                            }
                            "implements_clause" => {
                                implements = Some(self.after_keyword(clause, "implements"));
                            }
                            // `class A extends B` in the plain JavaScript shape
                            _ => super_class = Some(Box::new(self.expr(clause)?)),
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(Class {
            decorators,
            name: node.child_by_field_name("name").map(|n| self.text(n).to_owned()),
            type_params: self.type_text(node.child_by_field_name("type_parameters")),
            super_class,
            implements,
            body: self.class_body(self.field(node, "body")?)?,
            is_abstract: node.kind() == "abstract_class_declaration" || has_token(node, "abstract"),
        })
    }

    fn class_body(&mut self, node: Node<'_>) -> PResult<Vec<ClassMember>> {
        let mut members: Vec<ClassMember> = Vec::new();
        let mut comments: Vec<Node<'_>> = Vec::new();
        let mut decorators: Vec<Node<'_>> = Vec::new();
        let mut last_end: Option<usize> = None;
        for child in all_children(node) {
            match child.kind() {
                "{" | "}" => {}
                ";" | "," => {
                    // the separator belongs to the member it ends
                    let adjacent = last_end.is_some_and(|end| {
                        self.src
                            .get(end..child.start_byte())
                            .is_some_and(|gap| gap.trim().is_empty())
                    });
                    if let (true, Some(member)) = (adjacent, members.last_mut()) {
                        if let Some((start, _)) = member.loc.span() {
                            member.loc = self.span(start, child.end_byte());
                        }
                        last_end = Some(child.end_byte());
                    }
                }
                "comment" => {
                    let trailing = comments.is_empty()
                        && decorators.is_empty()
                        && last_end.is_some_and(|end| self.same_line(end, child.start_byte()));
                    if !trailing {
                        comments.push(child);
                    }
                }
                "decorator" => decorators.push(child),
                _ if child.is_named() => {
                    let start = comments
                        .iter()
                        .chain(&decorators)
                        .map(|n| n.start_byte())
                        .min()
                        .unwrap_or(child.start_byte());
                    let mut member = self.class_member(child)?;
                    let mut leading = Vec::new();
                    for d in decorators.drain(..) {
                        leading.push(self.decorator(d)?);
                    }
                    leading.append(&mut member.decorators);
                    member.decorators = leading;
                    member.comments = comments.drain(..).map(|c| self.comment(c)).collect();
                    member.loc = self.span(start, child.end_byte());
                    last_end = Some(child.end_byte());
                    members.push(member);
                }
                _ => {}
            }
        }
        Ok(members)
    }

    fn class_member(&mut self, node: Node<'_>) -> PResult<ClassMember> {
        let mut decorators = Vec::new();
        for d in all_children(node).into_iter().filter(|c| c.kind() == "decorator") {
            decorators.push(self.decorator(d)?);
        }
        let kind = match node.kind() {
            "method_definition" | "method_signature" | "abstract_method_signature" => {
                let parts = self.method(node)?;
                ClassMemberKind::Method {
                    key: parts.key,
                    kind: parts.kind,
                    func: parts.func,
                    is_static: parts.is_static,
                    modifiers: parts.modifiers,
                }
            }
            "public_field_definition" | "field_definition" => {
                let (is_static, modifiers) = self.member_modifiers(node);
                let name = match node.child_by_field_name("name") {
                    Some(name) => name,
                    None => node
                        .child_by_field_name("property")
                        .ok_or_else(|| self.error(node, "expected field name"))?,
                };
                ClassMemberKind::Property {
                    key: self.prop_key(name)?,
                    value: self.optional_expr(node.child_by_field_name("value"))?,
                    is_static,
                    modifiers,
                    optional: has_token(node, "?"),
                    ty: self.annotation(node.child_by_field_name("type")),
                }
            }
            "class_static_block" => ClassMemberKind::StaticBlock(self.block(self.field(node, "body")?)?),
            // index signatures
            _ => ClassMemberKind::Raw(self.text(node).to_owned()),
        };
        Ok(ClassMember {
            kind,
            decorators,
            comments: Vec::new(),
            loc: self.loc(node),
        })
    }

    /// `static` and the TypeScript modifiers of a class member, in order.
    fn member_modifiers(&self, node: Node<'_>) -> (bool, Vec<String>) {
        let mut is_static = false;
        let mut modifiers = Vec::new();
        for child in all_children(node) {
            match child.kind() {
                "accessibility_modifier" | "override_modifier" => {
                    modifiers.push(self.text(child).to_owned());
                }
                "static" | "static get" if !child.is_named() => is_static = true,
                "readonly" | "abstract" | "declare" | "accessor" if !child.is_named() => {
                    modifiers.push(child.kind().to_owned());
                }
                _ => {}
            }
        }
        (is_static, modifiers)
    }

    fn method(&mut self, node: Node<'_>) -> PResult<MethodParts> {
        let (is_static, modifiers) = self.member_modifiers(node);
        let mut kind = MethodKind::Method;
        for child in all_children(node).into_iter().filter(|c| !c.is_named()) {
            match child.kind() {
                "get" | "static get" => kind = MethodKind::Get,
                "set" => kind = MethodKind::Set,
                _ => {}
            }
        }
        let key = self.prop_key(self.field(node, "name")?)?;
        if kind == MethodKind::Method && key.name() == Some("constructor") {
            kind = MethodKind::Constructor;
        }
        let mut func = self.function(node)?;
        func.name = None;
        Ok(MethodParts {
            key,
            kind,
            func,
            is_static,
            modifiers,
        })
    }

    fn prop_key(&mut self, node: Node<'_>) -> PResult<PropKey> {
        Ok(match node.kind() {
            "string" => PropKey::Str(self.str_lit(node)),
            "number" => PropKey::Num(self.text(node).to_owned()),
            "computed_property_name" => PropKey::Computed(Box::new(self.expr(self.first(node)?)?)),
            _ => PropKey::Ident(self.text(node).to_owned()),
        })
    }

    // ── TypeScript declarations ─────────────────────────────────────────────

    fn ambient(&mut self, node: Node<'_>) -> PResult<StmtKind> {
        let inner = code_children(node);
        if has_token(node, "global") {
            let body = match inner.iter().find(|c| c.kind() == "statement_block") {
                Some(block) => Some(self.block(*block)?),
                None => None,
            };
            return Ok(StmtKind::TsModule(TsModule {
                kind: TsModuleKind::Global,
                name: TsModuleName::Ident("global".into()),
                body,
                declare: true,
            }));
        }
        let Some(decl) = inner.first().copied() else {
            return Ok(self.raw_statement(node));
        };
        Ok(match decl.kind() {
            "lexical_declaration" | "variable_declaration" => StmtKind::Var(self.var_decl(decl, true)?),
            "interface_declaration" => StmtKind::TsInterface(self.interface(decl, true)?),
            "type_alias_declaration" => StmtKind::TsTypeAlias(self.type_alias(decl, true)?),
            "module" | "internal_module" => StmtKind::TsModule(self.ts_module(decl, true)?),
            // functions, classes and enums keep their `declare` in the text
            _ => self.raw_statement(node),
        })
    }

    fn interface(&mut self, node: Node<'_>, declare: bool) -> PResult<TsInterface> {
        let extends = all_children(node)
            .into_iter()
            .find(|c| c.kind() == "extends_type_clause")
            .map(|c| self.after_keyword(c, "extends"));
        let body = self.ts_members(self.field(node, "body")?)?;
        Ok(TsInterface {
            name: self.text(self.field(node, "name")?).to_owned(),
            type_params: self.type_text(node.child_by_field_name("type_parameters")),
            extends,
            body,
            declare,
        })
    }

    fn ts_members(&mut self, body: Node<'_>) -> PResult<Vec<TsMember>> {
        let mut members = Vec::new();
        let mut comments: Vec<Node<'_>> = Vec::new();
        let mut last_end: Option<usize> = None;
        for child in all_children(body).into_iter().filter(|c| c.is_named()) {
            if is_comment(child) {
                let trailing = comments.is_empty()
                    && last_end.is_some_and(|end| self.same_line(end, child.start_byte()));
                if !trailing {
                    comments.push(child);
                }
                continue;
            }
            let start = comments.first().map_or(child.start_byte(), |c| c.start_byte());
            let kind = self.ts_member_kind(child);
            members.push(TsMember {
                kind,
                comments: comments.drain(..).map(|c| self.comment(c)).collect(),
                loc: self.span(start, child.end_byte()),
            });
            last_end = Some(child.end_byte());
        }
        Ok(members)
    }

    fn ts_member_kind(&mut self, node: Node<'_>) -> TsMemberKind {
        if node.kind() == "property_signature" {
            let children = all_children(node);
            let plain = children
                .iter()
                .all(|c| !matches!(c.kind(), "accessibility_modifier" | "override_modifier"))
                && children
                    .iter()
                    .all(|c| c.is_named() || matches!(c.kind(), "?" | "readonly"));
            let name = node
                .child_by_field_name("name")
                .filter(|n| matches!(n.kind(), "property_identifier" | "string" | "number"));
            if let (true, Some(name)) = (plain, name) {
                return TsMemberKind::Property {
                    key: self.module_name(name),
                    optional: has_token(node, "?"),
                    readonly: has_token(node, "readonly"),
                    ty: self.annotation(node.child_by_field_name("type")),
                };
            }
        }
        // methods, call and index signatures
        TsMemberKind::Raw(self.text(node).to_owned())
    }

    fn type_alias(&mut self, node: Node<'_>, declare: bool) -> PResult<TsTypeAlias> {
        Ok(TsTypeAlias {
            name: self.text(self.field(node, "name")?).to_owned(),
            type_params: self.type_text(node.child_by_field_name("type_parameters")),
            ty: self.text(self.field(node, "value")?).to_owned(),
            declare,
        })
    }

    fn ts_module(&mut self, node: Node<'_>, declare: bool) -> PResult<TsModule> {
        let kind = if node.kind() == "internal_module" {
            TsModuleKind::Namespace
        } else {
            TsModuleKind::Module
        };
        let name_node = self.field(node, "name")?;
        let name = if name_node.kind() == "string" {
            TsModuleName::Str(self.str_lit(name_node))
        } else {
            TsModuleName::Ident(self.text(name_node).to_owned())
        };
        let body = match node.child_by_field_name("body") {
            Some(body) => Some(self.block(body)?),
            None => None,
        };
        Ok(TsModule {
            kind,
            name,
            body,
            declare,
        })
    }

    // ── patterns ────────────────────────────────────────────────────────────

    fn pat(&mut self, node: Node<'_>) -> PResult<Pat> {
        let kind = match node.kind() {
            "identifier" | "shorthand_property_identifier_pattern" | "undefined" | "this" => PatKind::Ident {
                name: self.text(node).to_owned(),
                ty: None,
                optional: false,
            },
            "object_pattern" => PatKind::Object {
                props: self.object_pat_props(node)?,
                ty: None,
            },
            "array_pattern" => {
                let mut elements = Vec::new();
                let mut expecting = true;
                for child in all_children(node) {
                    match child.kind() {
                        "[" | "]" => {}
                        "," => {
                            if expecting {
                                elements.push(None);
                            }
                            expecting = true;
                        }
                        _ if is_comment(child) => {}
                        _ => {
                            elements.push(Some(self.pat(child)?));
                            expecting = false;
                        }
                    }
                }
                PatKind::Array { elements, ty: None }
            }
            "assignment_pattern" => PatKind::Assign {
                target: Box::new(self.pat(self.field(node, "left")?)?),
                default: Box::new(self.expr(self.field(node, "right")?)?),
            },
            "rest_pattern" => PatKind::Rest {
                arg: Box::new(self.pat(self.first(node)?)?),
                ty: None,
            },
            // member targets: `for (a.b of c)`
            _ => PatKind::Expr(Box::new(self.expr(node)?)),
        };
        Ok(Pat {
            kind,
            loc: self.loc(node),
        })
    }

    fn object_pat_props(&mut self, node: Node<'_>) -> PResult<Vec<ObjectPatProp>> {
        let mut props = Vec::new();
        for child in code_children(node) {
            props.push(match child.kind() {
                "pair_pattern" => ObjectPatProp::KeyValue {
                    key: self.prop_key(self.field(child, "key")?)?,
                    value: self.pat(self.field(child, "value")?)?,
                    shorthand: false,
                },
                "shorthand_property_identifier_pattern" => ObjectPatProp::KeyValue {
                    key: PropKey::Ident(self.text(child).to_owned()),
                    value: self.pat(child)?,
                    shorthand: true,
                },
                "object_assignment_pattern" => {
                    let left = self.field(child, "left")?;
                    let target = self.pat(left)?;
                    let default = self.expr(self.field(child, "right")?)?;
                    ObjectPatProp::KeyValue {
                        key: PropKey::Ident(self.text(left).to_owned()),
                        value: Pat {
                            kind: PatKind::Assign {
                                target: Box::new(target),
                                default: Box::new(default),
                            },
                            loc: self.loc(child),
                        },
                        shorthand: true,
                    }
                }
                "rest_pattern" => ObjectPatProp::Rest(self.pat(self.first(child)?)?),
                _ => return Err(self.unsupported(child)),
            });
        }
        Ok(props)
    }

    // ── expressions ─────────────────────────────────────────────────────────

    fn expr(&mut self, node: Node<'_>) -> PResult<Expr> {
        let kind = self.expr_kind(node)?;
        Ok(Expr {
            kind,
            loc: self.loc(node),
        })
    }

    fn boxed(&mut self, node: Node<'_>) -> PResult<Box<Expr>> {
        self.expr(node).map(Box::new)
    }

    fn field_expr(&mut self, node: Node<'_>, name: &str) -> PResult<Box<Expr>> {
        let child = self.field(node, name)?;
        self.boxed(child)
    }

    fn expr_kind(&mut self, node: Node<'_>) -> PResult<ExprKind> {
        Ok(match node.kind() {
            "identifier"
            | "property_identifier"
            | "shorthand_property_identifier"
            | "shorthand_property_identifier_pattern"
            | "undefined"
            | "import" => ExprKind::Ident(self.text(node).to_owned()),
            "private_property_identifier" => {
                ExprKind::PrivateName(self.text(node).trim_start_matches('#').to_owned())
            }
            "this" => ExprKind::This,
            "super" => ExprKind::Super,
            "true" => ExprKind::Lit(Lit::Bool(true)),
            "false" => ExprKind::Lit(Lit::Bool(false)),
            "null" => ExprKind::Lit(Lit::Null),
            "number" => ExprKind::Lit(self.number(node)?),
            "string" => ExprKind::Lit(Lit::Str(self.str_lit(node))),
            "template_string" => ExprKind::Template(self.template(node)?),
            "regex" => ExprKind::Lit(Lit::Regex {
                pattern: self.text(self.field(node, "pattern")?).to_owned(),
                flags: node
                    .child_by_field_name("flags")
                    .map(|f| self.text(f).to_owned())
                    .unwrap_or_default(),
            }),
            "array" | "array_pattern" => ExprKind::Array(self.elements(node)?),
            "object" | "object_pattern" => ExprKind::Object(self.props(node)?),
            "function_expression"
            | "function"
            | "generator_function"
            | "function_declaration"
            | "generator_function_declaration" => ExprKind::Function(self.function(node)?),
            "arrow_function" => ExprKind::Arrow(self.arrow(node)?),
            "class" | "class_declaration" | "abstract_class_declaration" => {
                ExprKind::Class(self.class(node)?)
            }
            "call_expression" => self.call(node)?,
            "new_expression" => ExprKind::New(Call {
                callee: self.field_expr(node, "constructor")?,
                type_args: self.type_text(node.child_by_field_name("type_arguments")),
                args: match node.child_by_field_name("arguments") {
                    Some(args) => self.args(args)?,
                    None => Vec::new(),
                },
                optional: false,
            }),
            "member_expression" => {
                let property = self.field(node, "property")?;
                let prop = if property.kind() == "private_property_identifier" {
                    MemberProp::Private(self.text(property).trim_start_matches('#').to_owned())
                } else {
                    MemberProp::Ident(self.text(property).to_owned())
                };
                ExprKind::Member {
                    object: self.field_expr(node, "object")?,
                    prop,
                    optional: node.child_by_field_name("optional_chain").is_some(),
                }
            }
            "subscript_expression" => ExprKind::Member {
                object: self.field_expr(node, "object")?,
                prop: MemberProp::Computed(self.field_expr(node, "index")?),
                optional: node.child_by_field_name("optional_chain").is_some(),
            },
            "unary_expression" => ExprKind::Unary {
                op: self.op(self.field(node, "operator")?)?,
                arg: self.field_expr(node, "argument")?,
            },
            "update_expression" => {
                let op = self.field(node, "operator")?;
                let arg = self.field(node, "argument")?;
                ExprKind::Update {
                    op: self.op(op)?,
                    prefix: op.start_byte() < arg.start_byte(),
                    arg: self.boxed(arg)?,
                }
            }
            "binary_expression" => ExprKind::Binary {
                op: self.op(self.field(node, "operator")?)?,
                left: self.field_expr(node, "left")?,
                right: self.field_expr(node, "right")?,
            },
            "assignment_expression" | "assignment_pattern" => ExprKind::Assign {
                op: "=",
                target: self.field_expr(node, "left")?,
                value: self.field_expr(node, "right")?,
            },
            "augmented_assignment_expression" => ExprKind::Assign {
                op: self.op(self.field(node, "operator")?)?,
                target: self.field_expr(node, "left")?,
                value: self.field_expr(node, "right")?,
            },
            "ternary_expression" => ExprKind::Cond {
                test: self.field_expr(node, "condition")?,
                cons: self.field_expr(node, "consequence")?,
                alt: self.field_expr(node, "alternative")?,
            },
            "sequence_expression" => {
                let mut exprs = Vec::new();
                self.sequence(node, &mut exprs)?;
                ExprKind::Seq(exprs)
            }
            "parenthesized_expression" => ExprKind::Paren(self.boxed(self.first(node)?)?),
            "spread_element" | "rest_pattern" => ExprKind::Spread(self.boxed(self.first(node)?)?),
            "await_expression" => ExprKind::Await(self.boxed(self.first(node)?)?),
            "yield_expression" => ExprKind::Yield {
                arg: match first_code_child(node) {
                    Some(arg) => Some(self.boxed(arg)?),
                    None => None,
                },
                delegate: has_token(node, "*"),
            },
            "meta_property" => {
                let text = self.text(node);
                let (meta, prop) = text.split_once('.').unwrap_or((text, ""));
                ExprKind::MetaProp {
                    meta: if meta.trim() == "new" { "new" } else { "import" },
                    prop: prop.trim().to_owned(),
                }
            }
            "jsx_element" | "jsx_self_closing_element" => ExprKind::Jsx(Box::new(self.jsx(node)?)),
            "as_expression" | "satisfies_expression" => {
                let inner = self.boxed(self.first(node)?)?;
                let ty = all_children(node)
                    .last()
                    .map(|t| self.text(*t).to_owned())
                    .unwrap_or_default();
                if node.kind() == "as_expression" {
                    ExprKind::TsAs { expr: inner, ty }
                } else {
                    ExprKind::TsSatisfies { expr: inner, ty }
                }
            }
            "non_null_expression" => ExprKind::TsNonNull(self.boxed(self.first(node)?)?),
            _ => return Err(self.unsupported(node)),
        })
    }

    fn number(&self, node: Node<'_>) -> PResult<Lit> {
        let text = self.text(node);
        if text.ends_with('n') {
            return Ok(Lit::BigInt(text.to_owned()));
        }
        let digits: String = text.chars().filter(|c| *c != '_').collect();
        let radix = match digits.get(..2) {
            Some("0x" | "0X") => Some(16),
            Some("0o" | "0O") => Some(8),
            Some("0b" | "0B") => Some(2),
            _ => None,
        };
        let value = match radix {
            Some(radix) => u64::from_str_radix(&digits[2..], radix).ok().map(|v| v as f64),
            None => digits.parse::<f64>().ok(),
        };
        let value = value.ok_or_else(|| self.error(node, "invalid number literal"))?;
        Ok(Lit::Num {
            value,
            raw: self.raw(text),
        })
    }

    fn sequence(&mut self, node: Node<'_>, out: &mut Vec<Expr>) -> PResult<()> {
        for child in code_children(node) {
            if child.kind() == "sequence_expression" {
                self.sequence(child, out)?;
            } else {
                out.push(self.expr(child)?);
            }
        }
        Ok(())
    }

    fn template(&mut self, node: Node<'_>) -> PResult<Template> {
        let mut quasis = Vec::new();
        let mut exprs = Vec::new();
        let mut from = node.start_byte() + 1;
        for sub in code_children(node)
            .into_iter()
            .filter(|c| c.kind() == "template_substitution")
        {
            quasis.push(self.src.get(from..sub.start_byte()).unwrap_or_default().to_owned());
            exprs.push(self.expr(self.first(sub)?)?);
            from = sub.end_byte();
        }
        let end = node.end_byte().saturating_sub(1);
        quasis.push(self.src.get(from..end).unwrap_or_default().to_owned());
        Ok(Template { quasis, exprs })
    }

    fn call(&mut self, node: Node<'_>) -> PResult<ExprKind> {
        let callee = self.field_expr(node, "function")?;
        let type_args = self.type_text(node.child_by_field_name("type_arguments"));
        let arguments = self.field(node, "arguments")?;
        if arguments.kind() == "template_string" {
            return Ok(ExprKind::TaggedTemplate {
                tag: callee,
                type_args,
                quasi: self.template(arguments)?,
            });
        }
        Ok(ExprKind::Call(Call {
            callee,
            type_args,
            args: self.args(arguments)?,
            optional: node.child_by_field_name("optional_chain").is_some(),
        }))
    }

    fn args(&mut self, node: Node<'_>) -> PResult<Vec<Expr>> {
        let mut args = Vec::new();
        for child in code_children(node) {
            args.push(self.expr(child)?);
        }
        Ok(args)
    }

    /// Array elements; holes are `None`.
    fn elements(&mut self, node: Node<'_>) -> PResult<Vec<Option<Expr>>> {
        let mut elements = Vec::new();
        let mut expecting = true;
        for child in all_children(node) {
            match child.kind() {
                "[" | "]" => {}
                "," => {
                    if expecting {
                        elements.push(None);
                    }
                    expecting = true;
                }
                _ if is_comment(child) => {}
                _ => {
                    elements.push(Some(self.expr(child)?));
                    expecting = false;
                }
            }
        }
        Ok(elements)
    }

    /// Object members. Own-line comments lead the member below them and
    /// are part of its span; a comment on the line where a member ends
    /// stays in the source between the two.
    fn props(&mut self, node: Node<'_>) -> PResult<Vec<Prop>> {
        let mut props = Vec::new();
        let mut comments: Vec<Node<'_>> = Vec::new();
        let mut last_end: Option<usize> = None;
        for child in all_children(node).into_iter().filter(|c| c.is_named()) {
            if is_comment(child) {
                let trailing = comments.is_empty()
                    && last_end.is_some_and(|end| self.same_line(end, child.start_byte()));
                if !trailing {
                    comments.push(child);
                }
                continue;
            }
            let start = comments.first().map_or(child.start_byte(), |c| c.start_byte());
            let kind = self.prop_kind(child)?;
            props.push(Prop {
                kind,
                comments: comments.drain(..).map(|c| self.comment(c)).collect(),
                loc: self.span(start, child.end_byte()),
            });
            last_end = Some(child.end_byte());
        }
        Ok(props)
    }

    fn prop_kind(&mut self, node: Node<'_>) -> PResult<PropKind> {
        Ok(match node.kind() {
            "pair" | "pair_pattern" => PropKind::KeyValue {
                key: self.prop_key(self.field(node, "key")?)?,
                value: self.expr(self.field(node, "value")?)?,
                shorthand: false,
            },
            "shorthand_property_identifier" | "shorthand_property_identifier_pattern" => PropKind::KeyValue {
                key: PropKey::Ident(self.text(node).to_owned()),
                value: self.expr(node)?,
                shorthand: true,
            },
            "object_assignment_pattern" => {
                let left = self.field(node, "left")?;
                let target = self.boxed(left)?;
                let default = self.field_expr(node, "right")?;
                PropKind::KeyValue {
                    key: PropKey::Ident(self.text(left).to_owned()),
                    value: Expr {
                        kind: ExprKind::Assign {
                            op: "=",
                            target,
                            value: default,
                        },
                        loc: self.loc(node),
                    },
                    shorthand: true,
                }
            }
            "spread_element" | "rest_pattern" => PropKind::Spread(self.expr(self.first(node)?)?),
            "method_definition" => {
                let parts = self.method(node)?;
                PropKind::Method {
                    key: parts.key,
                    kind: parts.kind,
                    func: parts.func,
                }
            }
            _ => return Err(self.unsupported(node)),
        })
    }

    fn arrow(&mut self, node: Node<'_>) -> PResult<Arrow> {
        let params = match node.child_by_field_name("parameter") {
            Some(param) => vec![Param::new(self.pat(param)?)],
            None => self.params(node.child_by_field_name("parameters"))?,
        };
        let body_node = self.field(node, "body")?;
        let body = if body_node.kind() == "statement_block" {
            ArrowBody::Block(self.block(body_node)?)
        } else {
            ArrowBody::Expr(self.boxed(body_node)?)
        };
        Ok(Arrow {
            params,
            body,
            is_async: has_token(node, "async"),
            type_params: self.type_text(node.child_by_field_name("type_parameters")),
            return_type: self.annotation(node.child_by_field_name("return_type")),
        })
    }

    // ── JSX ─────────────────────────────────────────────────────────────────

    /// Element with its children. Text children are cut from the source
    /// between the other children, whitespace included.
    fn jsx(&mut self, node: Node<'_>) -> PResult<JsxElement> {
        if node.kind() == "jsx_self_closing_element" {
            let (name, attrs) = self.jsx_tag(node)?;
            return Ok(JsxElement {
                name,
                attrs,
                children: Vec::new(),
                self_closing: true,
                open: self.loc(node),
            });
        }
        let children_nodes = all_children(node);
        let open = match node.child_by_field_name("open_tag") {
            Some(open) => open,
            None => children_nodes
                .iter()
                .copied()
                .find(|c| c.kind() == "jsx_opening_element")
                .ok_or_else(|| self.error(node, "expected opening tag"))?,
        };
        let close = match node.child_by_field_name("close_tag") {
            Some(close) => close,
            None => children_nodes
                .iter()
                .copied()
                .find(|c| c.kind() == "jsx_closing_element")
                .ok_or_else(|| self.error(node, "unterminated JSX element"))?,
        };
        let (name, attrs) = self.jsx_tag(open)?;
        let closing_name = close.child_by_field_name("name").map(|n| self.text(n));
        if closing_name != open.child_by_field_name("name").map(|n| self.text(n)) {
            return Err(self.error(close, "mismatched closing tag"));
        }

        let mut children = Vec::new();
        let mut text_from = open.end_byte();
        for child in children_nodes {
            if child.id() == open.id() || child.id() == close.id() {
                continue;
            }
            let kind = match child.kind() {
                "jsx_element" | "jsx_self_closing_element" => JsxChildKind::Element(Box::new(self.jsx(child)?)),
                "jsx_expression" => self.jsx_expression(child)?,
                // text and entities come from the source gaps
                _ => continue,
            };
            self.jsx_text(&mut children, text_from, child.start_byte());
            children.push(JsxChild {
                kind,
                loc: self.loc(child),
            });
            text_from = child.end_byte();
        }
        self.jsx_text(&mut children, text_from, close.start_byte());

        Ok(JsxElement {
            name,
            attrs,
            children,
            self_closing: false,
            open: self.loc(open),
        })
    }

    fn jsx_text(&self, children: &mut Vec<JsxChild>, start: usize, end: usize) {
        if start >= end {
            return;
        }
        if let Some(text) = self.src.get(start..end) {
            children.push(JsxChild {
                kind: JsxChildKind::Text(text.to_owned()),
                loc: self.span(start, end),
            });
        }
    }

    fn jsx_tag(&mut self, node: Node<'_>) -> PResult<(Option<JsxName>, Vec<JsxAttr>)> {
        let name_node = node.child_by_field_name("name");
        let name = name_node.map(|n| JsxName::new(self.text(n)));
        let mut attrs = Vec::new();
        for child in code_children(node) {
            if Some(child.id()) == name_node.map(|n| n.id()) {
                continue;
            }
            match child.kind() {
                "jsx_attribute" => attrs.push(self.jsx_attr(child)?),
                "jsx_expression" => {
                    let spread = self.first(child)?;
                    if spread.kind() != "spread_element" {
                        return Err(self.error(child, "expected spread attribute"));
                    }
                    attrs.push(JsxAttr::Spread(self.expr(self.first(spread)?)?));
                }
                // type arguments of generic components
                _ => {}
            }
        }
        Ok((name, attrs))
    }

    fn jsx_attr(&mut self, node: Node<'_>) -> PResult<JsxAttr> {
        let parts = code_children(node);
        let name = parts
            .first()
            .map(|n| self.text(*n).to_owned())
            .ok_or_else(|| self.error(node, "expected JSX attribute"))?;
        let value = match parts.get(1).copied() {
            None => None,
            Some(v) => Some(match v.kind() {
                "string" => {
                    let raw = self.text(v);
                    JsxAttrValue::Str(Str {
                        value: raw.get(1..raw.len().saturating_sub(1)).unwrap_or_default().to_owned(),
                        raw: self.raw(raw),
                    })
                }
                "jsx_expression" => JsxAttrValue::Expr(self.expr(self.first(v)?)?),
                "jsx_element" | "jsx_self_closing_element" => {
                    JsxAttrValue::Element(Box::new(self.jsx(v)?))
                }
                _ => return Err(self.unsupported(v)),
            }),
        };
        Ok(JsxAttr::Attr { name, value })
    }

    fn jsx_expression(&mut self, node: Node<'_>) -> PResult<JsxChildKind> {
        Ok(match first_code_child(node) {
            None => JsxChildKind::Expr(None),
            Some(inner) if inner.kind() == "spread_element" => {
                JsxChildKind::Spread(self.expr(self.first(inner)?)?)
            }
            Some(inner) => JsxChildKind::Expr(Some(self.expr(inner)?)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(src: &str) -> Program {
        parse_program(src).unwrap().program
    }

    fn expr(src: &str) -> Expr {
        parse_detached_expression(src).unwrap()
    }

    #[test]
    fn imports_keep_aliases_and_type_flags() {
        let p = program("import a, { b as c, type D } from './x';\nimport type { E } from 'y';");
        let StmtKind::Import(first) = &p.body[0].kind else {
            panic!("expected import");
        };
        assert_eq!(first.source.value, "./x");
        assert_eq!(
            first.specifiers,
            vec![
                ImportSpecifier::Default { local: "a".into() },
                ImportSpecifier::Named {
                    imported: "b".into(),
                    local: "c".into(),
                    type_only: false
                },
                ImportSpecifier::Named {
                    imported: "D".into(),
                    local: "D".into(),
                    type_only: true
                },
            ]
        );
        let StmtKind::Import(second) = &p.body[1].kind else {
            panic!("expected import");
        };
        assert!(second.type_only);
    }

    #[test]
    fn quotes_are_counted_outside_jsx() {
        let parsed = parse_program("import a from 'a';\nconst b = 'b';\nconst c = <p class=\"x\">{\"y\"}</p>;\n").unwrap();
        assert_eq!(parsed.single_quotes, 2);
        assert_eq!(parsed.double_quotes, 1);
    }

    #[test]
    fn precedence_groups_multiplication_first() {
        let e = expr("a + b * c");
        let ExprKind::Binary { op, right, .. } = &e.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, "+");
        assert!(matches!(right.kind, ExprKind::Binary { op: "*", .. }));
    }

    #[test]
    fn arrows_are_told_apart_from_parens() {
        assert!(matches!(expr("(a, b) => a + b").kind, ExprKind::Arrow(_)));
        assert!(matches!(expr("(a, b)").kind, ExprKind::Paren(_)));
        assert!(matches!(expr("async x => x").kind, ExprKind::Arrow(Arrow { is_async: true, .. })));
        assert!(matches!(
            expr("(x: number): string => String(x)").kind,
            ExprKind::Arrow(Arrow { return_type: Some(_), .. })
        ));
    }

    #[test]
    fn snippet_expression_braces_are_objects() {
        assert!(matches!(expr("{ a: 1 }").kind, ExprKind::Object(_)));
        assert!(matches!(expr("  f();  ").kind, ExprKind::Call(_)));
    }

    #[test]
    fn snippet_with_two_statements_is_not_an_expression() {
        assert!(parse_detached_expression("a; b").is_err());
    }

    #[test]
    fn satisfies_captures_type_text() {
        let p = program("export default {\n\tplugins: []\n} satisfies Config;\n");
        let StmtKind::ExportDefault(e) = &p.body[0].kind else {
            panic!("expected default export");
        };
        let ExprKind::TsSatisfies { ty, .. } = &e.kind else {
            panic!("expected satisfies");
        };
        assert_eq!(ty, "Config");
    }

    #[test]
    fn type_annotations_stop_at_initializer() {
        let p = program("const x: Record<string, Array<number>> = {};");
        let StmtKind::Var(decl) = &p.body[0].kind else {
            panic!("expected var");
        };
        let PatKind::Ident { ty, .. } = &decl.declarators[0].id.kind else {
            panic!("expected ident");
        };
        assert_eq!(ty.as_deref(), Some("Record<string, Array<number>>"));
        assert!(decl.declarators[0].init.is_some());
    }

    #[test]
    fn jsx_children_keep_raw_text() {
        let e = expr("<main>\n  <a href=\"/demo\">don't</a>\n  {count()}\n</main>");
        let ExprKind::Jsx(el) = &e.kind else {
            panic!("expected jsx");
        };
        assert!(el.is_named("main"));
        assert_eq!(el.children.len(), 5);
        let JsxChildKind::Element(a) = &el.children[1].kind else {
            panic!("expected element");
        };
        assert_eq!(a.children[0].kind, JsxChildKind::Text("don't".into()));
        assert!(matches!(el.children[3].kind, JsxChildKind::Expr(Some(_))));
    }

    #[test]
    fn jsx_names_spreads_and_fragments() {
        let e = expr("<>\n<i18n.Provider {...props} value={x} />\n</>");
        let ExprKind::Jsx(fragment) = &e.kind else {
            panic!("expected jsx");
        };
        assert_eq!(fragment.name, None);
        let JsxChildKind::Element(provider) = &fragment.children[1].kind else {
            panic!("expected element");
        };
        assert_eq!(
            provider.name,
            Some(JsxName::Member(vec!["i18n".into(), "Provider".into()]))
        );
        assert!(matches!(provider.attrs[0], JsxAttr::Spread(_)));
        assert!(provider.attr("value").is_some());
    }

    #[test]
    fn jsx_after_return_and_in_arrow_bodies() {
        let p = program("export default function App() {\n  return <Show when={x > 1}><p /></Show>;\n}\nconst f = () => <></>;");
        assert_eq!(p.body.len(), 2);
    }

    #[test]
    fn comments_attach_to_statements() {
        let p = program("// lead\nconst a = 1; // trail\n\n/** doc */\nexport {};\n// end\n");
        assert_eq!(p.body[0].comments, vec![Comment::line(" lead")]);
        assert_eq!(p.body[0].trailing, vec![Comment::line(" trail")]);
        assert_eq!(p.body[1].comments, vec![Comment::block("* doc ")]);
        assert_eq!(p.dangling, vec![Comment::line(" end")]);
    }

    #[test]
    fn own_line_comments_lead_object_members() {
        let p = program("export default {\n  a: 1, // same line\n  // above b\n  b: 2,\n};\n");
        let StmtKind::ExportDefault(e) = &p.body[0].kind else {
            panic!("expected default export");
        };
        let ExprKind::Object(props) = &e.kind else {
            panic!("expected object");
        };
        assert!(props[0].comments.is_empty());
        assert_eq!(props[1].comments, vec![Comment::line(" above b")]);
    }

    #[test]
    fn declare_module_with_interface() {
        let p = program(
            "declare module \"@solidjs/start/server\" {\n  interface RequestEventLocals {\n    user: User | null;\n    session?: Session\n  }\n}\n",
        );
        let StmtKind::TsModule(m) = &p.body[0].kind else {
            panic!("expected module");
        };
        assert!(m.declare);
        let body = m.body.as_ref().unwrap();
        let StmtKind::TsInterface(iface) = &body.body[0].kind else {
            panic!("expected interface");
        };
        assert_eq!(iface.body.len(), 2);
        assert_eq!(
            iface.body[0].kind,
            TsMemberKind::Property {
                key: "user".into(),
                optional: false,
                readonly: false,
                ty: Some("User | null".into())
            }
        );
    }

    #[test]
    fn asi_splits_lines() {
        let p = program("const a = 1\nconst b = a\nfoo()\n");
        assert_eq!(p.body.len(), 3);
    }

    #[test]
    fn regex_and_division_are_distinguished() {
        let p = program("const r = /a\\/b/g.test(x) ? a / 2 : 0;");
        assert_eq!(p.body.len(), 1);
    }

    #[test]
    fn template_literals_nest() {
        let e = expr("`a${b ? `c${d}` : 'e'}f`");
        let ExprKind::Template(t) = &e.kind else {
            panic!("expected template");
        };
        assert_eq!(t.quasis, vec!["a".to_owned(), "f".to_owned()]);
        assert_eq!(t.exprs.len(), 1);
    }

    #[test]
    fn string_escapes_are_cooked() {
        assert_eq!(expr(r#"'it\'s\n\u{41}\x42'"#).as_str(), Some("it's\nAB"));
    }

    #[test]
    fn generic_calls_and_comparisons() {
        assert!(matches!(
            expr("useState<string>('')").kind,
            ExprKind::Call(Call { type_args: Some(_), .. })
        ));
        assert!(matches!(expr("a < b").kind, ExprKind::Binary { op: "<", .. }));
    }

    #[test]
    fn angle_bracket_assertions_fall_back_to_typescript() {
        let p = program("const a = <string>value;\n");
        assert_eq!(p.body.len(), 1);
    }

    #[test]
    fn malformed_input_is_a_parse_error() {
        let err = parse_program("const = 1;").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(parse_program("foo(").is_err());
        assert!(parse_program("<div>").is_err());
        let err = parse_detached_expression("<a></b>").unwrap_err();
        assert!(err.message.contains("closing tag"));
    }

    #[test]
    fn classes_with_members() {
        let p = program(
            "class A extends B implements C {\n  private x: number = 1;\n  static y;\n  constructor(private readonly z: string) { super(); }\n  get v() { return this.x; }\n  [key: string]: unknown;\n}",
        );
        let StmtKind::Class(c) = &p.body[0].kind else {
            panic!("expected class");
        };
        assert_eq!(c.implements.as_deref(), Some("C"));
        assert_eq!(c.body.len(), 5);
        assert!(matches!(
            &c.body[2].kind,
            ClassMemberKind::Method { kind: MethodKind::Constructor, func, .. }
                if func.params[0].modifiers == ["private", "readonly"]
        ));
        assert!(matches!(c.body[3].kind, ClassMemberKind::Method { kind: MethodKind::Get, .. }));
        assert!(matches!(c.body[4].kind, ClassMemberKind::Raw(_)));
    }

    #[test]
    fn decorators_on_classes_and_members() {
        let p = program("@decorator\nclass A {\n  @observable() value = 1;\n  @action\n  run() {}\n}\n");
        let StmtKind::Class(c) = &p.body[0].kind else {
            panic!("expected class");
        };
        assert_eq!(c.decorators, vec![Expr::ident("decorator")]);
        assert_eq!(c.body.len(), 2);
        assert_eq!(c.body[0].decorators.len(), 1);
        assert!(matches!(c.body[0].decorators[0].kind, ExprKind::Call(_)));
        assert_eq!(c.body[1].decorators, vec![Expr::ident("action")]);
    }

    #[test]
    fn enums_are_kept_as_text() {
        let p = program("const enum A { B }\ndeclare const enum C { D }\nenum E { F = 1 }\n");
        assert_eq!(p.body.len(), 3);
        assert_eq!(p.body[0].kind, StmtKind::Raw("const enum A { B }".into()));
        assert_eq!(p.body[1].kind, StmtKind::Raw("declare const enum C { D }".into()));
        assert!(matches!(p.body[2].kind, StmtKind::Raw(_)));
    }

    #[test]
    fn multiline_union_type_alias() {
        let p = program("type A =\n  | 'a'\n  | 'b';\nconst x = 1;");
        assert_eq!(p.body.len(), 2);
        let StmtKind::TsTypeAlias(alias) = &p.body[0].kind else {
            panic!("expected type alias");
        };
        assert_eq!(alias.ty, "| 'a'\n  | 'b'");
    }
}

//! Source generator for script documents.
//!
//! Every node that still equals the pristine node recorded at its source
//! span is copied from the source verbatim, re-indented to where it lands
//! in the output. The whitespace and comments between two reused siblings
//! are kept when they contain nothing but trivia and the separator.
//! Everything else is printed from the tree using the style detected in
//! the source.

use std::collections::HashMap;

use super::ast::*;
use crate::tooling::detect_indent;

// ── style ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    Single,
    Double,
}

impl Quote {
    pub const fn as_char(self) -> char {
        match self {
            Self::Single => '\'',
            Self::Double => '"',
        }
    }
}

/// Line terminator of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Newline {
    #[default]
    Lf,
    CrLf,
}

/// Formatting used for freshly printed nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    pub quote: Quote,
    /// One level of indentation.
    pub indent: String,
    pub newline: Newline,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            quote: Quote::Double,
            indent: "\t".into(),
            newline: Newline::Lf,
        }
    }
}

impl Style {
    pub(crate) fn detect(src: &str, single_quotes: usize, double_quotes: usize) -> Self {
        let quote = if single_quotes > double_quotes {
            Quote::Single
        } else {
            Quote::Double
        };
        let newline = match src.find('\n') {
            Some(i) if src[..i].ends_with('\r') => Newline::CrLf,
            _ => Newline::Lf,
        };
        Self {
            quote,
            indent: detect_indent(src).unwrap_or_else(|| "\t".into()),
            newline,
        }
    }
}

pub(crate) fn quote_string(value: &str, quote: Quote) -> String {
    let q = quote.as_char();
    let mut out = String::with_capacity(value.len() + 2);
    out.push(q);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == q => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(q);
    out
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

// ── pristine index ───────────────────────────────────────────────────────────

type Span = (usize, usize);

#[derive(Default)]
struct Originals<'a> {
    stmts: HashMap<Span, &'a Stmt>,
    exprs: HashMap<Span, &'a Expr>,
    props: HashMap<Span, &'a Prop>,
    members: HashMap<Span, &'a ClassMember>,
    ts_members: HashMap<Span, &'a TsMember>,
    children: HashMap<Span, &'a JsxChild>,
    /// Elements by the span of their opening tag.
    elements: HashMap<Span, &'a JsxElement>,
}

impl<'a> Originals<'a> {
    fn stmt(&mut self, s: &'a Stmt) {
        if let Some(span) = s.loc.span() {
            self.stmts.insert(span, s);
        }
        match &s.kind {
            StmtKind::Import(_)
            | StmtKind::ExportAll { .. }
            | StmtKind::Break(_)
            | StmtKind::Continue(_)
            | StmtKind::Empty
            | StmtKind::Debugger
            | StmtKind::TsTypeAlias(_)
            | StmtKind::Raw(_) => {}
            StmtKind::ExportNamed(e) => {
                if let Some(decl) = &e.decl {
                    self.stmt(decl);
                }
            }
            StmtKind::ExportDefault(e) | StmtKind::Expr(e) | StmtKind::Throw(e) => self.expr(e),
            StmtKind::Var(v) => self.var(v),
            StmtKind::Function(f) => self.function(f),
            StmtKind::Class(c) => self.class(c),
            StmtKind::Block(b) => self.block(b),
            StmtKind::If { test, cons, alt } => {
                self.expr(test);
                self.stmt(cons);
                if let Some(alt) = alt {
                    self.stmt(alt);
                }
            }
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => {
                if let Some(init) = init {
                    self.for_head(init);
                }
                if let Some(test) = test {
                    self.expr(test);
                }
                if let Some(update) = update {
                    self.expr(update);
                }
                self.stmt(body);
            }
            StmtKind::ForIn { left, right, body } | StmtKind::ForOf { left, right, body, .. } => {
                self.for_head(left);
                self.expr(right);
                self.stmt(body);
            }
            StmtKind::While { test, body } | StmtKind::DoWhile { body, test } => {
                self.expr(test);
                self.stmt(body);
            }
            StmtKind::Return(arg) => {
                if let Some(arg) = arg {
                    self.expr(arg);
                }
            }
            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => {
                self.block(block);
                if let Some(handler) = handler {
                    if let Some(param) = &handler.param {
                        self.pat(param);
                    }
                    self.block(&handler.body);
                }
                if let Some(finalizer) = finalizer {
                    self.block(finalizer);
                }
            }
            StmtKind::Switch {
                discriminant,
                cases,
            } => {
                self.expr(discriminant);
                for case in cases {
                    if let Some(test) = &case.test {
                        self.expr(test);
                    }
                    for s in &case.body {
                        self.stmt(s);
                    }
                }
            }
            StmtKind::Labeled { body, .. } => self.stmt(body),
            StmtKind::TsInterface(iface) => {
                for member in &iface.body {
                    if let Some(span) = member.loc.span() {
                        self.ts_members.insert(span, member);
                    }
                }
            }
            StmtKind::TsModule(m) => {
                if let Some(body) = &m.body {
                    self.block(body);
                }
            }
        }
    }

    fn block(&mut self, b: &'a Block) {
        for s in &b.body {
            self.stmt(s);
        }
    }

    fn for_head(&mut self, head: &'a ForHead) {
        match head {
            ForHead::Var(v) => self.var(v),
            ForHead::Expr(e) => self.expr(e),
        }
    }

    fn var(&mut self, v: &'a VarDecl) {
        for d in &v.declarators {
            self.pat(&d.id);
            if let Some(init) = &d.init {
                self.expr(init);
            }
        }
    }

    fn function(&mut self, f: &'a Function) {
        for p in &f.params {
            self.pat(&p.pat);
        }
        if let Some(body) = &f.body {
            self.block(body);
        }
    }

    fn class(&mut self, c: &'a Class) {
        c.decorators.iter().for_each(|d| self.expr(d));
        if let Some(sup) = &c.super_class {
            self.expr(sup);
        }
        for member in &c.body {
            if let Some(span) = member.loc.span() {
                self.members.insert(span, member);
            }
            member.decorators.iter().for_each(|d| self.expr(d));
            match &member.kind {
                ClassMemberKind::Method { key, func, .. } => {
                    self.key(key);
                    self.function(func);
                }
                ClassMemberKind::Property { key, value, .. } => {
                    self.key(key);
                    if let Some(value) = value {
                        self.expr(value);
                    }
                }
                ClassMemberKind::StaticBlock(b) => self.block(b),
                ClassMemberKind::Raw(_) => {}
            }
        }
    }

    fn key(&mut self, key: &'a PropKey) {
        if let PropKey::Computed(e) = key {
            self.expr(e);
        }
    }

    fn pat(&mut self, p: &'a Pat) {
        match &p.kind {
            PatKind::Ident { .. } => {}
            PatKind::Object { props, .. } => {
                for prop in props {
                    match prop {
                        ObjectPatProp::KeyValue { key, value, .. } => {
                            self.key(key);
                            self.pat(value);
                        }
                        ObjectPatProp::Rest(p) => self.pat(p),
                    }
                }
            }
            PatKind::Array { elements, .. } => {
                for p in elements.iter().flatten() {
                    self.pat(p);
                }
            }
            PatKind::Assign { target, default } => {
                self.pat(target);
                self.expr(default);
            }
            PatKind::Rest { arg, .. } => self.pat(arg),
            PatKind::Expr(e) => self.expr(e),
        }
    }

    fn expr(&mut self, e: &'a Expr) {
        if let Some(span) = e.loc.span() {
            self.exprs.insert(span, e);
        }
        match &e.kind {
            ExprKind::Ident(_)
            | ExprKind::PrivateName(_)
            | ExprKind::Lit(_)
            | ExprKind::This
            | ExprKind::Super
            | ExprKind::MetaProp { .. } => {}
            ExprKind::Template(t) => t.exprs.iter().for_each(|e| self.expr(e)),
            ExprKind::TaggedTemplate { tag, quasi, .. } => {
                self.expr(tag);
                quasi.exprs.iter().for_each(|e| self.expr(e));
            }
            ExprKind::Array(elements) => elements.iter().flatten().for_each(|e| self.expr(e)),
            ExprKind::Object(props) => {
                for prop in props {
                    if let Some(span) = prop.loc.span() {
                        self.props.insert(span, prop);
                    }
                    match &prop.kind {
                        PropKind::KeyValue { key, value, .. } => {
                            self.key(key);
                            self.expr(value);
                        }
                        PropKind::Method { key, func, .. } => {
                            self.key(key);
                            self.function(func);
                        }
                        PropKind::Spread(e) => self.expr(e),
                    }
                }
            }
            ExprKind::Function(f) => self.function(f),
            ExprKind::Arrow(a) => {
                for p in &a.params {
                    self.pat(&p.pat);
                }
                match &a.body {
                    ArrowBody::Expr(e) => self.expr(e),
                    ArrowBody::Block(b) => self.block(b),
                }
            }
            ExprKind::Class(c) => self.class(c),
            ExprKind::Call(call) | ExprKind::New(call) => {
                self.expr(&call.callee);
                call.args.iter().for_each(|e| self.expr(e));
            }
            ExprKind::Member { object, prop, .. } => {
                self.expr(object);
                if let MemberProp::Computed(e) = prop {
                    self.expr(e);
                }
            }
            ExprKind::Unary { arg, .. } | ExprKind::Update { arg, .. } => self.expr(arg),
            ExprKind::Binary { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            ExprKind::Assign { target, value, .. } => {
                self.expr(target);
                self.expr(value);
            }
            ExprKind::Cond { test, cons, alt } => {
                self.expr(test);
                self.expr(cons);
                self.expr(alt);
            }
            ExprKind::Seq(exprs) => exprs.iter().for_each(|e| self.expr(e)),
            ExprKind::Paren(e)
            | ExprKind::Spread(e)
            | ExprKind::Await(e)
            | ExprKind::TsNonNull(e)
            | ExprKind::TsAs { expr: e, .. }
            | ExprKind::TsSatisfies { expr: e, .. } => self.expr(e),
            ExprKind::Yield { arg, .. } => {
                if let Some(arg) = arg {
                    self.expr(arg);
                }
            }
            ExprKind::Jsx(el) => self.jsx(el),
        }
    }

    fn jsx(&mut self, el: &'a JsxElement) {
        if let Some(span) = el.open.span() {
            self.elements.insert(span, el);
        }
        for attr in &el.attrs {
            match attr {
                JsxAttr::Attr { value, .. } => match value {
                    Some(JsxAttrValue::Expr(e)) => self.expr(e),
                    Some(JsxAttrValue::Element(el)) => self.jsx(el),
                    Some(JsxAttrValue::Str(_)) | None => {}
                },
                JsxAttr::Spread(e) => self.expr(e),
            }
        }
        for child in &el.children {
            if let Some(span) = child.loc.span() {
                self.children.insert(span, child);
            }
            match &child.kind {
                JsxChildKind::Text(_) | JsxChildKind::Expr(None) => {}
                JsxChildKind::Expr(Some(e)) | JsxChildKind::Spread(e) => self.expr(e),
                JsxChildKind::Element(el) => self.jsx(el),
            }
        }
    }
}

// ── printer ──────────────────────────────────────────────────────────────────

pub(crate) fn print_program(src: &str, program: &Program, original: &Program, style: &Style) -> String {
    let mut orig = Originals::default();
    for stmt in &original.body {
        orig.stmt(stmt);
    }
    let mut printer = Printer {
        src,
        style,
        orig,
        out: String::with_capacity(src.len() + 64),
    };
    printer.program(program, original);
    match style.newline {
        Newline::Lf => printer.out,
        Newline::CrLf => printer.out.replace("\r\n", "\n").replace('\n', "\r\n"),
    }
}

/// Print a detached node, e.g. for diagnostics.
pub(crate) fn print_expr(expr: &Expr, style: &Style) -> String {
    let mut printer = Printer {
        src: "",
        style,
        orig: Originals::default(),
        out: String::new(),
    };
    printer.expr(expr);
    printer.out
}

struct Printer<'a> {
    src: &'a str,
    style: &'a Style,
    orig: Originals<'a>,
    out: String,
}

/// How a comma-separated list is laid out.
#[derive(Clone, Copy)]
struct ListLayout {
    open: char,
    close: char,
    multiline: bool,
    /// `{ a }` rather than `{a}` when inline.
    pad: bool,
    trailing_comma: bool,
}

/// Where the items of a list sat in the source.
struct ListGaps<'l> {
    container: Loc,
    original: &'l [Loc],
    open: char,
    close: char,
}

impl<'a> Printer<'a> {
    // ── output primitives ───────────────────────────────────────────────────

    fn push(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn newline(&mut self, indent: &str) {
        self.out.push('\n');
        self.out.push_str(indent);
    }

    /// Leading whitespace of the output line being written.
    fn line_indent(&self) -> String {
        let line = self.out.rsplit('\n').next().unwrap_or_default();
        line[..line.len() - line.trim_start().len()].to_owned()
    }

    fn src_line_indent(&self, offset: usize) -> &'a str {
        let start = self.src[..offset].rfind('\n').map_or(0, |i| i + 1);
        let line = &self.src[start..];
        let len = line
            .find(|c: char| c != ' ' && c != '\t')
            .unwrap_or(line.len());
        &line[..len]
    }

    /// Copy `src[start..end]`, shifting its continuation lines by the
    /// difference between the source indentation at `start` and the current
    /// output indentation.
    fn copy(&mut self, start: usize, end: usize) {
        let src = self.src;
        let text = &src[start..end];
        let from = self.src_line_indent(start);
        let to = self.line_indent();
        if from == to || !text.contains('\n') {
            self.push(text);
            return;
        }
        let mut lines = text.split('\n').peekable();
        if let Some(first) = lines.next() {
            self.push(first);
        }
        while let Some(line) = lines.next() {
            self.out.push('\n');
            let blank = line.trim().is_empty() && lines.peek().is_some();
            if blank {
                self.out.push_str(line.trim_start_matches([' ', '\t']));
            } else if let Some(rest) = line.strip_prefix(from) {
                self.out.push_str(&to);
                self.out.push_str(rest);
            } else if let Some(deeper) = to.strip_prefix(from) {
                self.out.push_str(deeper);
                self.out.push_str(line);
            } else if let Some(shallower) = from.strip_prefix(to.as_str()) {
                let lead = line.len() - line.trim_start_matches([' ', '\t']).len();
                self.out.push_str(&line[lead.min(shallower.len())..]);
            } else {
                self.out.push_str(line);
            }
        }
    }

    // ── gaps ────────────────────────────────────────────────────────────────

    /// Whether `src[start..end]` is whitespace and comments plus separators
    /// from `seps`, at most one of them.
    fn is_trivia(&self, start: usize, end: usize, seps: &[char], required: bool) -> bool {
        if start > end {
            return false;
        }
        let mut rest = &self.src[start..end];
        let mut seen = false;
        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                return seen || !required;
            }
            if rest.starts_with("//") {
                rest = rest.find('\n').map_or("", |i| &rest[i..]);
                continue;
            }
            if let Some(body) = rest.strip_prefix("/*") {
                match body.find("*/") {
                    Some(i) => rest = &body[i + 2..],
                    None => return false,
                }
                continue;
            }
            match rest.chars().next() {
                Some(c) if seps.contains(&c) && !seen => {
                    seen = true;
                    rest = &rest[c.len_utf8()..];
                }
                _ => return false,
            }
        }
    }

    fn reuse_between(&mut self, prev: Loc, next: Loc, seps: &[char], required: bool) -> bool {
        let (Some((_, pe)), Some((ns, _))) = (prev.span(), next.span()) else {
            return false;
        };
        if !self.is_trivia(pe, ns, seps, required) {
            return false;
        }
        self.copy(pe, ns);
        true
    }

    /// Source range between a container's opening `open` and its first
    /// child.
    fn open_gap(&self, container: Loc, first: Loc, open: char) -> Option<Span> {
        let (cs, ce) = container.span()?;
        let (fs, fe) = first.span()?;
        if fs < cs || fe > ce {
            return None;
        }
        let before = &self.src[cs..fs];
        let mut search = before.len();
        while let Some(i) = before[..search].rfind(open) {
            if self.is_trivia(cs + i + 1, fs, &[], false) {
                return Some((cs + i + 1, fs));
            }
            search = i;
        }
        None
    }

    /// Source range between a container's last child and its closing
    /// `close`, and whether a separator sits in it.
    fn close_gap(&self, container: Loc, last: Loc, close: char, seps: &[char]) -> Option<(Span, bool)> {
        let (cs, ce) = container.span()?;
        let (ls, le) = last.span()?;
        if ls < cs || le > ce {
            return None;
        }
        let after = &self.src[le..ce];
        let mut from = 0;
        while let Some(i) = after[from..].find(close) {
            let end = le + from + i;
            if self.is_trivia(le, end, seps, false) {
                let has_sep = !self.is_trivia(le, end, &[], false);
                return Some(((le, end), has_sep));
            }
            from += i + close.len_utf8();
        }
        None
    }

    fn spans_lines(&self, loc: Loc) -> bool {
        loc.span()
            .is_some_and(|(s, e)| self.src[s..e].contains('\n'))
    }

    // ── program and statements ──────────────────────────────────────────────

    fn program(&mut self, program: &Program, original: &Program) {
        if let Some(shebang) = self.src.lines().next().filter(|l| l.starts_with("#!")) {
            self.push(shebang);
            self.push("\n");
        }
        self.stmt_list(&program.body, "", true);

        let last_end = |p: &Program| p.body.last().and_then(|s| s.loc.span()).map(|s| s.1);
        let tail_unchanged = !program.dangling.is_empty()
            && program.dangling == original.dangling
            && last_end(program).is_some()
            && last_end(program) == last_end(original);
        if tail_unchanged {
            if let Some(end) = last_end(program) {
                let src = self.src;
                self.push(src[end..].trim_end());
            }
        } else {
            for (i, comment) in program.dangling.iter().enumerate() {
                if !self.out.is_empty() {
                    self.push(if i == 0 { "\n\n" } else { "\n" });
                }
                self.comment(comment);
            }
        }
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.push("\n");
        }
    }

    fn stmt_list(&mut self, stmts: &[Stmt], indent: &str, top_level: bool) {
        for (i, stmt) in stmts.iter().enumerate() {
            if i > 0 {
                let prev = &stmts[i - 1];
                if !self.reuse_between(prev.loc, stmt.loc, &[], false) {
                    let blank = top_level && !(prev.is_import() && stmt.is_import());
                    if blank {
                        self.out.push('\n');
                    }
                    self.newline(indent);
                }
            }
            self.stmt(stmt);
        }
    }

    fn reuse_stmt(&mut self, stmt: &Stmt) -> bool {
        let Some(span) = stmt.loc.span() else {
            return false;
        };
        if self.orig.stmts.get(&span).is_some_and(|o| *o == stmt) {
            self.copy(span.0, span.1);
            return true;
        }
        false
    }

    fn comment(&mut self, comment: &Comment) {
        match comment.kind {
            CommentKind::Line => {
                self.push("//");
                self.push(&comment.text);
            }
            CommentKind::Block => {
                self.push("/*");
                self.push(&comment.text);
                self.push("*/");
            }
        }
    }

    fn leading_comments(&mut self, comments: &[Comment]) {
        let indent = self.line_indent();
        for comment in comments {
            self.comment(comment);
            self.newline(&indent);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        if self.reuse_stmt(stmt) {
            return;
        }
        self.leading_comments(&stmt.comments);
        self.stmt_kind(&stmt.kind, stmt.loc);
        for comment in &stmt.trailing {
            self.push(" ");
            self.comment(comment);
        }
    }

    fn stmt_kind(&mut self, kind: &StmtKind, loc: Loc) {
        match kind {
            StmtKind::Import(decl) => {
                self.import(decl);
                self.push(";");
            }
            StmtKind::ExportNamed(export) => {
                self.push("export ");
                if let Some(decl) = &export.decl {
                    self.stmt(decl);
                    return;
                }
                if export.type_only {
                    self.push("type ");
                }
                self.push("{");
                if !export.specifiers.is_empty() {
                    self.push(" ");
                    for (i, spec) in export.specifiers.iter().enumerate() {
                        if i > 0 {
                            self.push(", ");
                        }
                        self.push(&spec.local);
                        if spec.exported != spec.local {
                            self.push(" as ");
                            self.push(&spec.exported);
                        }
                    }
                    self.push(" ");
                }
                self.push("}");
                if let Some(source) = &export.source {
                    self.push(" from ");
                    self.str_lit(source);
                }
                self.push(";");
            }
            StmtKind::ExportDefault(expr) => {
                self.push("export default ");
                self.expr(expr);
                if !matches!(expr.kind, ExprKind::Function(_) | ExprKind::Class(_)) {
                    self.push(";");
                }
            }
            StmtKind::ExportAll {
                alias,
                source,
                type_only,
            } => {
                self.push("export ");
                if *type_only {
                    self.push("type ");
                }
                self.push("* ");
                if let Some(alias) = alias {
                    self.push("as ");
                    self.push(alias);
                    self.push(" ");
                }
                self.push("from ");
                self.str_lit(source);
                self.push(";");
            }
            StmtKind::Var(decl) => {
                self.var_decl(decl);
                self.push(";");
            }
            StmtKind::Function(func) => {
                self.function(func, true);
                if func.body.is_none() {
                    self.push(";");
                }
            }
            StmtKind::Class(class) => self.class(class, loc),
            StmtKind::Expr(expr) => {
                self.expr(expr);
                self.push(";");
            }
            StmtKind::Block(block) => self.block(block),
            StmtKind::If { test, cons, alt } => {
                self.push("if (");
                self.expr(test);
                self.push(") ");
                self.stmt(cons);
                if let Some(alt) = alt {
                    self.push(" else ");
                    self.stmt(alt);
                }
            }
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => {
                self.push("for (");
                if let Some(init) = init {
                    self.for_head(init);
                }
                self.push(";");
                if let Some(test) = test {
                    self.push(" ");
                    self.expr(test);
                }
                self.push(";");
                if let Some(update) = update {
                    self.push(" ");
                    self.expr(update);
                }
                self.push(") ");
                self.stmt(body);
            }
            StmtKind::ForIn { left, right, body } => {
                self.push("for (");
                self.for_head(left);
                self.push(" in ");
                self.expr(right);
                self.push(") ");
                self.stmt(body);
            }
            StmtKind::ForOf {
                left,
                right,
                body,
                is_await,
            } => {
                self.push(if *is_await { "for await (" } else { "for (" });
                self.for_head(left);
                self.push(" of ");
                self.expr(right);
                self.push(") ");
                self.stmt(body);
            }
            StmtKind::While { test, body } => {
                self.push("while (");
                self.expr(test);
                self.push(") ");
                self.stmt(body);
            }
            StmtKind::DoWhile { body, test } => {
                self.push("do ");
                self.stmt(body);
                self.push(" while (");
                self.expr(test);
                self.push(");");
            }
            StmtKind::Return(arg) => {
                self.push("return");
                if let Some(arg) = arg {
                    self.push(" ");
                    self.expr(arg);
                }
                self.push(";");
            }
            StmtKind::Throw(arg) => {
                self.push("throw ");
                self.expr(arg);
                self.push(";");
            }
            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => {
                self.push("try ");
                self.block(block);
                if let Some(handler) = handler {
                    self.push(" catch ");
                    if let Some(param) = &handler.param {
                        self.push("(");
                        self.pat(param);
                        self.push(") ");
                    }
                    self.block(&handler.body);
                }
                if let Some(finalizer) = finalizer {
                    self.push(" finally ");
                    self.block(finalizer);
                }
            }
            StmtKind::Switch {
                discriminant,
                cases,
            } => {
                self.push("switch (");
                self.expr(discriminant);
                self.push(") {");
                let base = self.line_indent();
                let case_indent = base.clone() + &self.style.indent;
                let body_indent = case_indent.clone() + &self.style.indent;
                for case in cases {
                    self.newline(&case_indent);
                    match &case.test {
                        Some(test) => {
                            self.push("case ");
                            self.expr(test);
                            self.push(":");
                        }
                        None => self.push("default:"),
                    }
                    for s in &case.body {
                        self.newline(&body_indent);
                        self.stmt(s);
                    }
                }
                self.newline(&base);
                self.push("}");
            }
            StmtKind::Break(label) | StmtKind::Continue(label) => {
                self.push(if matches!(kind, StmtKind::Break(_)) {
                    "break"
                } else {
                    "continue"
                });
                if let Some(label) = label {
                    self.push(" ");
                    self.push(label);
                }
                self.push(";");
            }
            StmtKind::Labeled { label, body } => {
                self.push(label);
                self.push(": ");
                self.stmt(body);
            }
            StmtKind::Empty => self.push(";"),
            StmtKind::Debugger => self.push("debugger;"),
            StmtKind::TsInterface(iface) => self.interface(iface, loc),
            StmtKind::TsTypeAlias(alias) => {
                if alias.declare {
                    self.push("declare ");
                }
                self.push("type ");
                self.push(&alias.name);
                if let Some(tp) = &alias.type_params {
                    self.push(tp);
                }
                self.push(" = ");
                self.push(&alias.ty);
                self.push(";");
            }
            StmtKind::TsModule(module) => {
                if module.declare {
                    self.push("declare ");
                }
                match (&module.kind, &module.name) {
                    (TsModuleKind::Global, _) => self.push("global"),
                    (kind, name) => {
                        self.push(if *kind == TsModuleKind::Namespace {
                            "namespace "
                        } else {
                            "module "
                        });
                        match name {
                            TsModuleName::Ident(n) => self.push(n),
                            TsModuleName::Str(s) => self.str_lit(s),
                        }
                    }
                }
                match &module.body {
                    Some(body) => {
                        self.push(" ");
                        self.block(body);
                    }
                    None => self.push(";"),
                }
            }
            StmtKind::Raw(text) => {
                self.push(text);
                if !text.ends_with('}') && !text.ends_with(';') {
                    self.push(";");
                }
            }
        }
    }

    fn import(&mut self, decl: &ImportDecl) {
        self.push("import ");
        if decl.type_only {
            self.push("type ");
        }
        if decl.specifiers.is_empty() {
            self.str_lit(&decl.source);
            return;
        }
        let mut wrote = false;
        let mut named = Vec::new();
        for spec in &decl.specifiers {
            match spec {
                ImportSpecifier::Default { local } => {
                    self.push(local);
                    wrote = true;
                }
                ImportSpecifier::Namespace { local } => {
                    if wrote {
                        self.push(", ");
                    }
                    self.push("* as ");
                    self.push(local);
                    wrote = true;
                }
                ImportSpecifier::Named { .. } => named.push(spec),
            }
        }
        if !named.is_empty() {
            if wrote {
                self.push(", ");
            }
            self.push("{ ");
            for (i, spec) in named.into_iter().enumerate() {
                if let ImportSpecifier::Named {
                    imported,
                    local,
                    type_only,
                } = spec
                {
                    if i > 0 {
                        self.push(", ");
                    }
                    if *type_only {
                        self.push("type ");
                    }
                    if is_identifier(imported) {
                        self.push(imported);
                    } else {
                        let quoted = quote_string(imported, self.style.quote);
                        self.push(&quoted);
                    }
                    if imported != local {
                        self.push(" as ");
                        self.push(local);
                    }
                }
            }
            self.push(" }");
        }
        self.push(" from ");
        self.str_lit(&decl.source);
    }

    fn var_decl(&mut self, decl: &VarDecl) {
        if decl.declare {
            self.push("declare ");
        }
        self.push(decl.kind.as_str());
        self.push(" ");
        for (i, d) in decl.declarators.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.pat(&d.id);
            if let Some(init) = &d.init {
                self.push(" = ");
                self.expr(init);
            }
        }
    }

    fn for_head(&mut self, head: &ForHead) {
        match head {
            ForHead::Var(decl) => self.var_decl(decl),
            ForHead::Expr(e) => self.expr(e),
        }
    }

    fn block(&mut self, block: &Block) {
        self.push("{");
        if block.body.is_empty() && block.dangling.is_empty() {
            self.push("}");
            return;
        }
        let base = self.line_indent();
        let inner = base.clone() + &self.style.indent;

        let first = block.body.first().map(|s| s.loc);
        match first.and_then(|f| self.open_gap(block.loc, f, '{')) {
            Some((s, e)) => self.copy(s, e),
            None => self.newline(&inner),
        }
        self.stmt_list(&block.body, &inner, false);

        let last = block.body.last().map(|s| s.loc);
        match last.and_then(|l| self.close_gap(block.loc, l, '}', &[])) {
            Some(((s, e), _)) => self.copy(s, e),
            None => {
                for (i, comment) in block.dangling.iter().enumerate() {
                    if i > 0 || !block.body.is_empty() {
                        self.newline(&inner);
                    }
                    self.comment(comment);
                }
                self.newline(&base);
            }
        }
        self.push("}");
    }

    /// `{ members }` of a class or interface.
    fn body_list<T>(
        &mut self,
        owner: Loc,
        items: &[T],
        loc_of: impl Fn(&T) -> Loc,
        mut print: impl FnMut(&mut Self, &T),
        sep: Option<&str>,
    ) {
        self.push("{");
        if items.is_empty() {
            self.push("}");
            return;
        }
        let base = self.line_indent();
        let inner = base.clone() + &self.style.indent;
        let seps = [';', ','];

        match self.open_gap(owner, loc_of(&items[0]), '{') {
            Some((s, e)) => self.copy(s, e),
            None => self.newline(&inner),
        }
        for (i, item) in items.iter().enumerate() {
            if i > 0 && !self.reuse_between(loc_of(&items[i - 1]), loc_of(item), &seps, false) {
                if let Some(sep) = sep {
                    self.push(sep);
                }
                self.newline(&inner);
            }
            print(self, item);
        }
        let last = loc_of(&items[items.len() - 1]);
        match self.close_gap(owner, last, '}', &seps) {
            Some(((s, e), _)) => self.copy(s, e),
            None => {
                if let Some(sep) = sep {
                    self.push(sep);
                }
                self.newline(&base);
            }
        }
        self.push("}");
    }

    fn interface(&mut self, iface: &TsInterface, loc: Loc) {
        if iface.declare {
            self.push("declare ");
        }
        self.push("interface ");
        self.push(&iface.name);
        if let Some(tp) = &iface.type_params {
            self.push(tp);
        }
        if let Some(ext) = &iface.extends {
            self.push(" extends ");
            self.push(ext);
        }
        self.push(" ");
        self.body_list(loc, &iface.body, |m| m.loc, Self::ts_member, Some(";"));
    }

    fn ts_member(&mut self, member: &TsMember) {
        if let Some(span) = member.loc.span() {
            if self.orig.ts_members.get(&span).is_some_and(|o| *o == member) {
                self.copy(span.0, span.1);
                return;
            }
        }
        self.leading_comments(&member.comments);
        match &member.kind {
            TsMemberKind::Property {
                key,
                optional,
                readonly,
                ty,
            } => {
                if *readonly {
                    self.push("readonly ");
                }
                if is_identifier(key) {
                    self.push(key);
                } else {
                    let quoted = quote_string(key, self.style.quote);
                    self.push(&quoted);
                }
                if *optional {
                    self.push("?");
                }
                if let Some(ty) = ty {
                    self.push(": ");
                    self.push(ty);
                }
            }
            TsMemberKind::Raw(text) => self.push(text),
        }
    }

    // ── functions and classes ───────────────────────────────────────────────

    fn function(&mut self, func: &Function, keyword: bool) {
        if func.is_async {
            self.push("async ");
        }
        if keyword {
            self.push("function");
            if func.is_generator {
                self.push("*");
            }
            if let Some(name) = &func.name {
                self.push(" ");
                self.push(name);
            }
        }
        self.function_tail(func);
    }

    /// Type parameters, parameters, return type and body.
    fn function_tail(&mut self, func: &Function) {
        if let Some(tp) = &func.type_params {
            self.push(tp);
        }
        self.params(&func.params);
        if let Some(ret) = &func.return_type {
            self.push(": ");
            self.push(ret);
        }
        if let Some(body) = &func.body {
            self.push(" ");
            self.block(body);
        }
    }

    fn params(&mut self, params: &[Param]) {
        self.push("(");
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            for m in &param.modifiers {
                self.push(m);
                self.push(" ");
            }
            self.pat(&param.pat);
        }
        self.push(")");
    }

    /// `@expr` lines above a class or member.
    fn decorators(&mut self, decorators: &[Expr]) {
        let indent = self.line_indent();
        for decorator in decorators {
            self.push("@");
            self.expr(decorator);
            self.newline(&indent);
        }
    }

    fn class(&mut self, class: &Class, loc: Loc) {
        self.decorators(&class.decorators);
        if class.is_abstract {
            self.push("abstract ");
        }
        self.push("class");
        if let Some(name) = &class.name {
            self.push(" ");
            self.push(name);
        }
        if let Some(tp) = &class.type_params {
            self.push(tp);
        }
        if let Some(sup) = &class.super_class {
            self.push(" extends ");
            self.expr(sup);
        }
        if let Some(implements) = &class.implements {
            self.push(" implements ");
            self.push(implements);
        }
        self.push(" ");
        self.body_list(loc, &class.body, |m| m.loc, Self::class_member, None);
    }

    fn class_member(&mut self, member: &ClassMember) {
        if let Some(span) = member.loc.span() {
            if self.orig.members.get(&span).is_some_and(|o| *o == member) {
                self.copy(span.0, span.1);
                return;
            }
        }
        self.leading_comments(&member.comments);
        self.decorators(&member.decorators);
        match &member.kind {
            ClassMemberKind::Method {
                key,
                kind,
                func,
                is_static,
                modifiers,
            } => {
                if *is_static {
                    self.push("static ");
                }
                for m in modifiers {
                    self.push(m);
                    self.push(" ");
                }
                self.method_head(key, *kind, func);
                self.function_tail(func);
                if func.body.is_none() {
                    self.push(";");
                }
            }
            ClassMemberKind::Property {
                key,
                value,
                is_static,
                modifiers,
                optional,
                ty,
            } => {
                if *is_static {
                    self.push("static ");
                }
                for m in modifiers {
                    self.push(m);
                    self.push(" ");
                }
                self.prop_key(key);
                if *optional {
                    self.push("?");
                }
                if let Some(ty) = ty {
                    self.push(": ");
                    self.push(ty);
                }
                if let Some(value) = value {
                    self.push(" = ");
                    self.expr(value);
                }
                self.push(";");
            }
            ClassMemberKind::StaticBlock(block) => {
                self.push("static ");
                self.block(block);
            }
            ClassMemberKind::Raw(text) => {
                self.push(text);
                self.push(";");
            }
        }
    }

    fn method_head(&mut self, key: &PropKey, kind: MethodKind, func: &Function) {
        if func.is_async {
            self.push("async ");
        }
        match kind {
            MethodKind::Get => self.push("get "),
            MethodKind::Set => self.push("set "),
            MethodKind::Method | MethodKind::Constructor => {}
        }
        if func.is_generator {
            self.push("*");
        }
        self.prop_key(key);
    }

    // ── expressions ─────────────────────────────────────────────────────────

    fn reuse_expr(&mut self, expr: &Expr) -> bool {
        let Some(span) = expr.loc.span() else {
            return false;
        };
        if self.orig.exprs.get(&span).is_some_and(|o| *o == expr) {
            self.copy(span.0, span.1);
            return true;
        }
        false
    }

    fn str_lit(&mut self, s: &Str) {
        match &s.raw.0 {
            Some(raw) => self.push(raw),
            None => {
                let quoted = quote_string(&s.value, self.style.quote);
                self.push(&quoted);
            }
        }
    }

    fn lit(&mut self, lit: &Lit) {
        match lit {
            Lit::Str(s) => self.str_lit(s),
            Lit::Num { value, raw } => match &raw.0 {
                Some(raw) => self.push(raw),
                None => self.push(&format_number(*value)),
            },
            Lit::BigInt(text) => self.push(text),
            Lit::Bool(b) => self.push(if *b { "true" } else { "false" }),
            Lit::Null => self.push("null"),
            Lit::Regex { pattern, flags } => {
                self.push("/");
                self.push(pattern);
                self.push("/");
                self.push(flags);
            }
        }
    }

    fn template(&mut self, template: &Template) {
        self.push("`");
        for (i, quasi) in template.quasis.iter().enumerate() {
            self.push(quasi);
            if let Some(expr) = template.exprs.get(i) {
                self.push("${");
                self.expr(expr);
                self.push("}");
            }
        }
        self.push("`");
    }

    fn expr(&mut self, expr: &Expr) {
        if self.reuse_expr(expr) {
            return;
        }
        match &expr.kind {
            ExprKind::Ident(name) => self.push(name),
            ExprKind::PrivateName(name) => {
                self.push("#");
                self.push(name);
            }
            ExprKind::Lit(lit) => self.lit(lit),
            ExprKind::Template(t) => self.template(t),
            ExprKind::TaggedTemplate {
                tag,
                type_args,
                quasi,
            } => {
                self.expr(tag);
                if let Some(ta) = type_args {
                    self.push(ta);
                }
                self.template(quasi);
            }
            ExprKind::Array(elements) => self.array(expr.loc, elements),
            ExprKind::Object(props) => self.object(expr.loc, props),
            ExprKind::Function(func) => self.function(func, true),
            ExprKind::Arrow(arrow) => self.arrow(arrow),
            ExprKind::Class(class) => self.class(class, expr.loc),
            ExprKind::Call(call) => {
                self.expr(&call.callee);
                if call.optional {
                    self.push("?.");
                }
                if let Some(ta) = &call.type_args {
                    self.push(ta);
                }
                self.args(expr.loc, &call.args);
            }
            ExprKind::New(call) => {
                self.push("new ");
                self.expr(&call.callee);
                if let Some(ta) = &call.type_args {
                    self.push(ta);
                }
                self.args(expr.loc, &call.args);
            }
            ExprKind::Member {
                object,
                prop,
                optional,
            } => {
                self.expr(object);
                match prop {
                    MemberProp::Ident(name) => {
                        self.push(if *optional { "?." } else { "." });
                        self.push(name);
                    }
                    MemberProp::Private(name) => {
                        self.push(if *optional { "?.#" } else { ".#" });
                        self.push(name);
                    }
                    MemberProp::Computed(e) => {
                        self.push(if *optional { "?.[" } else { "[" });
                        self.expr(e);
                        self.push("]");
                    }
                }
            }
            ExprKind::Unary { op, arg } => {
                self.push(op);
                if op.chars().all(char::is_alphabetic) {
                    self.push(" ");
                }
                self.expr(arg);
            }
            ExprKind::Update { op, prefix, arg } => {
                if *prefix {
                    self.push(op);
                    self.expr(arg);
                } else {
                    self.expr(arg);
                    self.push(op);
                }
            }
            ExprKind::Binary { op, left, right } => {
                self.expr(left);
                self.push(" ");
                self.push(op);
                self.push(" ");
                self.expr(right);
            }
            ExprKind::Assign { op, target, value } => {
                self.expr(target);
                self.push(" ");
                self.push(op);
                self.push(" ");
                self.expr(value);
            }
            ExprKind::Cond { test, cons, alt } => {
                self.expr(test);
                self.push(" ? ");
                self.expr(cons);
                self.push(" : ");
                self.expr(alt);
            }
            ExprKind::Seq(exprs) => {
                for (i, e) in exprs.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.expr(e);
                }
            }
            ExprKind::Paren(inner) if !expr.loc.is_some() && Self::multiline_jsx(inner) => {
                let base = self.line_indent();
                self.push("(");
                self.newline(&(base.clone() + &self.style.indent));
                self.expr(inner);
                self.newline(&base);
                self.push(")");
            }
            ExprKind::Paren(inner) => {
                self.push("(");
                if let Some((s, e)) = self.open_gap(expr.loc, inner.loc, '(') {
                    self.copy(s, e);
                }
                self.expr(inner);
                if let Some(((s, e), _)) = self.close_gap(expr.loc, inner.loc, ')', &[]) {
                    self.copy(s, e);
                }
                self.push(")");
            }
            ExprKind::Spread(inner) => {
                self.push("...");
                self.expr(inner);
            }
            ExprKind::Await(inner) => {
                self.push("await ");
                self.expr(inner);
            }
            ExprKind::Yield { arg, delegate } => {
                self.push(if *delegate { "yield*" } else { "yield" });
                if let Some(arg) = arg {
                    self.push(" ");
                    self.expr(arg);
                }
            }
            ExprKind::This => self.push("this"),
            ExprKind::Super => self.push("super"),
            ExprKind::MetaProp { meta, prop } => {
                self.push(meta);
                self.push(".");
                self.push(prop);
            }
            ExprKind::Jsx(el) => self.jsx(el),
            ExprKind::TsAs { expr: inner, ty } => {
                self.expr(inner);
                self.push(" as ");
                self.push(ty);
            }
            ExprKind::TsSatisfies { expr: inner, ty } => {
                self.expr(inner);
                self.push(" satisfies ");
                self.push(ty);
            }
            ExprKind::TsNonNull(inner) => {
                self.expr(inner);
                self.push("!");
            }
        }
    }

    fn arrow(&mut self, arrow: &Arrow) {
        if arrow.is_async {
            self.push("async ");
        }
        if let Some(tp) = &arrow.type_params {
            self.push(tp);
        }
        self.params(&arrow.params);
        if let Some(ret) = &arrow.return_type {
            self.push(": ");
            self.push(ret);
        }
        self.push(" => ");
        match &arrow.body {
            ArrowBody::Block(block) => self.block(block),
            ArrowBody::Expr(e) if matches!(e.kind, ExprKind::Object(_)) && !e.loc.is_some() => {
                self.push("(");
                self.expr(e);
                self.push(")");
            }
            ArrowBody::Expr(e) => self.expr(e),
        }
    }

    /// JSX that lays its children out over several lines.
    fn multiline_jsx(expr: &Expr) -> bool {
        let ExprKind::Jsx(el) = &expr.kind else {
            return false;
        };
        el.children.iter().any(|c| match &c.kind {
            JsxChildKind::Text(text) => text.contains('\n'),
            _ => true,
        })
    }

    /// The pristine container recorded at `loc`, if any.
    fn original_expr(&self, loc: Loc) -> Option<&'a Expr> {
        loc.span().and_then(|span| self.orig.exprs.get(&span).copied())
    }

    fn original_trailing_comma(&self, container: Loc, original_last: Option<Loc>, close: char) -> bool {
        original_last
            .and_then(|last| self.close_gap(container, last, close, &[',']))
            .is_some_and(|(_, sep)| sep)
    }

    /// Whether the source puts a line break between `open` and the first
    /// original item.
    fn breaks_after_open(&self, container: Loc, first: Option<Loc>, open: char) -> bool {
        first
            .and_then(|first| self.open_gap(container, first, open))
            .is_some_and(|(s, e)| self.src[s..e].contains('\n'))
    }

    fn object(&mut self, loc: Loc, props: &[Prop]) {
        let original: Vec<Loc> = match self.original_expr(loc).map(|e| &e.kind) {
            Some(ExprKind::Object(p)) => p.iter().map(|p| p.loc).collect(),
            _ => Vec::new(),
        };
        let multiline = if original.is_empty() {
            !props.is_empty()
        } else {
            self.breaks_after_open(loc, original.first().copied(), '{')
        };
        let layout = ListLayout {
            open: '{',
            close: '}',
            multiline,
            pad: true,
            trailing_comma: self.original_trailing_comma(loc, original.last().copied(), '}'),
        };
        self.list(loc, props, &original, |p| p.loc, Self::prop, layout);
    }

    fn array(&mut self, loc: Loc, elements: &[Option<Expr>]) {
        let original: Vec<Loc> = match self.original_expr(loc).map(|e| &e.kind) {
            Some(ExprKind::Array(e)) => e.iter().map(|e| e.as_ref().map_or(Loc::NONE, |e| e.loc)).collect(),
            _ => Vec::new(),
        };
        let first = original.iter().find(|l| l.is_some()).copied();
        let layout = ListLayout {
            open: '[',
            close: ']',
            multiline: self.breaks_after_open(loc, first, '['),
            pad: false,
            trailing_comma: self.original_trailing_comma(loc, original.last().copied(), ']'),
        };
        self.list(
            loc,
            elements,
            &original,
            |e| e.as_ref().map_or(Loc::NONE, |e| e.loc),
            |p, e| {
                if let Some(e) = e {
                    p.expr(e);
                }
            },
            layout,
        );
    }

    fn args(&mut self, call_loc: Loc, args: &[Expr]) {
        let original: Vec<Loc> = match self.original_expr(call_loc).map(|e| &e.kind) {
            Some(ExprKind::Call(c) | ExprKind::New(c)) => c.args.iter().map(|e| e.loc).collect(),
            _ => Vec::new(),
        };
        let layout = ListLayout {
            open: '(',
            close: ')',
            multiline: self.breaks_after_open(call_loc, original.first().copied(), '('),
            pad: false,
            trailing_comma: self.original_trailing_comma(call_loc, original.last().copied(), ')'),
        };
        self.list(call_loc, args, &original, |e| e.loc, Self::expr, layout);
    }

    /// Print a comma-separated list. Where a gap between items cannot be
    /// copied, the comments that sat in the original gaps are carried over:
    /// one on the line where an item ends stays behind that item, own-line
    /// comments stay above the item they preceded and the ones after the
    /// last original item stay at the end of the list.
    fn list<T>(
        &mut self,
        container: Loc,
        items: &[T],
        original: &[Loc],
        loc_of: impl Fn(&T) -> Loc,
        mut print: impl FnMut(&mut Self, &T),
        layout: ListLayout,
    ) {
        self.out.push(layout.open);
        if items.is_empty() {
            self.out.push(layout.close);
            return;
        }
        let base = self.line_indent();
        let inner = base.clone() + &self.style.indent;
        let gaps = ListGaps {
            container,
            original,
            open: layout.open,
            close: layout.close,
        };

        for (i, item) in items.iter().enumerate() {
            let loc = loc_of(item);
            if i == 0 {
                match self.open_gap(container, loc, layout.open) {
                    Some((s, e)) => self.copy(s, e),
                    None => {
                        if layout.multiline {
                            self.newline(&inner);
                        } else if layout.pad {
                            self.push(" ");
                        }
                        self.leading_gap_comments(&gaps, loc, &inner);
                    }
                }
            } else if !self.reuse_between(loc_of(&items[i - 1]), loc, &[','], true) {
                self.push(",");
                let broke = self.trailing_gap_comments(&gaps, loc_of(&items[i - 1]));
                if layout.multiline || broke {
                    self.newline(&inner);
                } else {
                    self.push(" ");
                }
                self.leading_gap_comments(&gaps, loc, &inner);
            }
            print(self, item);
        }

        let last = loc_of(&items[items.len() - 1]);
        if let Some(((s, e), _)) = self.close_gap(container, last, layout.close, &[',']) {
            self.copy(s, e);
        } else {
            let dangling = self.dangling_gap_comments(&gaps);
            let mark = self.out.len();
            if layout.multiline && layout.trailing_comma {
                self.push(",");
            }
            let broke = self.trailing_gap_comments(&gaps, last);
            if layout.multiline || broke || !dangling.is_empty() {
                for comment in dangling {
                    self.newline(&inner);
                    self.push(comment);
                }
                self.newline(&base);
            } else {
                self.out.truncate(mark);
                if layout.pad {
                    self.push(" ");
                }
            }
        }
        self.out.push(layout.close);
    }

    /// Index of the original item printed at `loc`.
    fn original_index(gaps: &ListGaps<'_>, loc: Loc) -> Option<usize> {
        let span = loc.span()?;
        gaps.original.iter().position(|o| o.span() == Some(span))
    }

    /// Source between original item `k` and the next item or the closer.
    fn gap_after(&self, gaps: &ListGaps<'_>, k: usize) -> Option<Span> {
        let item = *gaps.original.get(k)?;
        let (_, end) = item.span()?;
        match gaps.original.get(k + 1) {
            Some(next) => next.span().map(|(start, _)| (end, start)),
            None => self
                .close_gap(gaps.container, item, gaps.close, &[','])
                .map(|(span, _)| span),
        }
    }

    /// Comments in `src[start..end]` and whether each one starts a line.
    fn gap_comments(&self, (start, end): Span) -> Vec<(&'a str, bool)> {
        let src: &'a str = self.src;
        let mut comments = Vec::new();
        let mut rest = src.get(start..end).unwrap_or_default();
        let mut own_line = false;
        loop {
            let trimmed = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
            own_line |= rest[..rest.len() - trimmed.len()].contains('\n');
            rest = trimmed;
            let len = if rest.starts_with("//") {
                rest.find('\n').unwrap_or(rest.len())
            } else if rest.starts_with("/*") {
                match rest.find("*/") {
                    Some(i) => i + 2,
                    None => break,
                }
            } else {
                break;
            };
            comments.push((rest[..len].trim_end(), own_line));
            rest = &rest[len..];
            own_line = false;
        }
        comments
    }

    /// Write the comments that followed `loc` on its line. Returns whether
    /// the last one was a line comment.
    fn trailing_gap_comments(&mut self, gaps: &ListGaps<'_>, loc: Loc) -> bool {
        let Some(range) = Self::original_index(gaps, loc).and_then(|k| self.gap_after(gaps, k)) else {
            return false;
        };
        let mut line_comment = false;
        for (text, own_line) in self.gap_comments(range) {
            if own_line {
                break;
            }
            self.push(" ");
            self.push(text);
            line_comment = text.starts_with("//");
        }
        line_comment
    }

    /// Write the own-line comments that preceded `loc`, each followed by a
    /// line break at `indent`.
    fn leading_gap_comments(&mut self, gaps: &ListGaps<'_>, loc: Loc, indent: &str) {
        let Some(k) = Self::original_index(gaps, loc) else {
            return;
        };
        let range = match k {
            0 => self.open_gap(gaps.container, loc, gaps.open),
            _ => self.gap_after(gaps, k - 1),
        };
        let Some(range) = range else {
            return;
        };
        for (text, own_line) in self.gap_comments(range) {
            if own_line || k == 0 {
                self.push(text);
                self.newline(indent);
            }
        }
    }

    /// Own-line comments between the original last item and the closer.
    fn dangling_gap_comments(&self, gaps: &ListGaps<'_>) -> Vec<&'a str> {
        let Some(k) = gaps.original.len().checked_sub(1) else {
            return Vec::new();
        };
        self.gap_after(gaps, k)
            .map(|range| {
                self.gap_comments(range)
                    .into_iter()
                    .filter_map(|(text, own_line)| own_line.then_some(text))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn prop(&mut self, prop: &Prop) {
        if let Some(span) = prop.loc.span() {
            if self.orig.props.get(&span).is_some_and(|o| *o == prop) {
                self.copy(span.0, span.1);
                return;
            }
        }
        self.leading_comments(&prop.comments);
        match &prop.kind {
            PropKind::KeyValue {
                key,
                value,
                shorthand,
            } => {
                if *shorthand {
                    self.expr(value);
                } else {
                    self.prop_key(key);
                    self.push(": ");
                    self.expr(value);
                }
            }
            PropKind::Method { key, kind, func } => {
                self.method_head(key, *kind, func);
                self.function_tail(func);
            }
            PropKind::Spread(e) => {
                self.push("...");
                self.expr(e);
            }
        }
    }

    fn prop_key(&mut self, key: &PropKey) {
        match key {
            PropKey::Ident(name) | PropKey::Num(name) => self.push(name),
            PropKey::Str(s) => self.str_lit(s),
            PropKey::Computed(e) => {
                self.push("[");
                self.expr(e);
                self.push("]");
            }
        }
    }

    fn pat(&mut self, pat: &Pat) {
        match &pat.kind {
            PatKind::Ident { name, ty, optional } => {
                self.push(name);
                if *optional {
                    self.push("?");
                }
                self.type_annotation(ty);
            }
            PatKind::Object { props, ty } => {
                if props.is_empty() {
                    self.push("{}");
                } else {
                    self.push("{ ");
                    for (i, prop) in props.iter().enumerate() {
                        if i > 0 {
                            self.push(", ");
                        }
                        match prop {
                            ObjectPatProp::KeyValue {
                                key,
                                value,
                                shorthand,
                            } => {
                                if !*shorthand {
                                    self.prop_key(key);
                                    self.push(": ");
                                }
                                self.pat(value);
                            }
                            ObjectPatProp::Rest(p) => {
                                self.push("...");
                                self.pat(p);
                            }
                        }
                    }
                    self.push(" }");
                }
                self.type_annotation(ty);
            }
            PatKind::Array { elements, ty } => {
                self.push("[");
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    if let Some(p) = element {
                        self.pat(p);
                    }
                }
                self.push("]");
                self.type_annotation(ty);
            }
            PatKind::Assign { target, default } => {
                self.pat(target);
                self.push(" = ");
                self.expr(default);
            }
            PatKind::Rest { arg, ty } => {
                self.push("...");
                self.pat(arg);
                self.type_annotation(ty);
            }
            PatKind::Expr(e) => self.expr(e),
        }
    }

    fn type_annotation(&mut self, ty: &Option<TsType>) {
        if let Some(ty) = ty {
            self.push(": ");
            self.push(ty);
        }
    }

    // ── JSX ─────────────────────────────────────────────────────────────────

    /// Indentation for new children of `el`, taken from the first line
    /// break among its text children.
    fn jsx_child_indent(&self, el: &JsxElement, base: &str) -> String {
        let fallback = base.to_owned() + &self.style.indent;
        let Some((start, _)) = el.open.span() else {
            return fallback;
        };
        let src_base = self.src_line_indent(start);
        el.children
            .iter()
            .find_map(|c| match &c.kind {
                JsxChildKind::Text(text) => {
                    let tail = &text[text.rfind('\n')? + 1..];
                    (tail.trim().is_empty()).then_some(tail)
                }
                _ => None,
            })
            .and_then(|indent| indent.strip_prefix(src_base))
            .map_or(fallback, |rel| base.to_owned() + rel)
    }

    /// Whether the source opening tag at `open` puts its attributes on
    /// their own lines.
    fn breaks_after_tag_name(&self, open: Loc) -> bool {
        let Some((start, end)) = open.span() else {
            return false;
        };
        let tag = self.src[start..end].trim_start_matches('<').trim_start();
        let name_end = tag
            .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
            .unwrap_or(tag.len());
        let after = &tag[name_end..];
        after[..after.len() - after.trim_start().len()].contains('\n')
    }

    fn jsx(&mut self, el: &JsxElement) {
        let base = self.line_indent();
        let name = el.name.as_ref().map(ToString::to_string).unwrap_or_default();
        let original = el.open.span().and_then(|span| self.orig.elements.get(&span).copied());

        match (el.open.span(), original) {
            (Some((s, e)), Some(o)) if !o.self_closing && !el.self_closing && o.name == el.name && o.attrs == el.attrs => {
                self.copy(s, e);
            }
            _ => {
                let broken = !el.attrs.is_empty() && self.breaks_after_tag_name(el.open);
                let attr_indent = base.clone() + &self.style.indent;
                self.push("<");
                self.push(&name);
                for attr in &el.attrs {
                    if broken {
                        self.newline(&attr_indent);
                    } else {
                        self.push(" ");
                    }
                    self.jsx_attr(attr);
                }
                if el.children.is_empty() && (el.self_closing || !el.open.is_some()) {
                    if broken {
                        self.newline(&base);
                        self.push("/>");
                    } else {
                        self.push(if el.attrs.is_empty() && name.is_empty() { "></>" } else { " />" });
                    }
                    return;
                }
                if broken {
                    self.newline(&base);
                }
                self.push(">");
            }
        }

        let child_indent = self.jsx_child_indent(el, &base);
        let fresh_node = |c: &JsxChild| !c.loc.is_some() && !c.is_text();
        let count = el.children.len();
        for (i, child) in el.children.iter().enumerate() {
            let after_fresh_node = i > 0 && fresh_node(&el.children[i - 1]);
            if let JsxChildKind::Text(text) = &child.kind {
                if text.contains('\n') && text.trim().is_empty() {
                    if el.children.get(i + 1).is_some_and(fresh_node) {
                        self.newline(&child_indent);
                        continue;
                    }
                    if !child.loc.is_some() {
                        self.newline(if i + 1 == count { &base } else { &child_indent });
                        continue;
                    }
                }
            }
            if let Some(span) = child.loc.span() {
                if self.orig.children.get(&span).is_some_and(|o| *o == child) {
                    if after_fresh_node && !child.is_text() {
                        self.newline(&child_indent);
                    }
                    self.copy(span.0, span.1);
                    continue;
                }
            }
            let after_text = i > 0 && el.children[i - 1].is_text();
            if fresh_node(child) && !after_text {
                self.newline(&child_indent);
            }
            self.jsx_child(child);
        }
        if el.children.last().is_some_and(fresh_node) {
            self.newline(&base);
        }
        self.push("</");
        self.push(&name);
        self.push(">");
    }

    fn jsx_attr(&mut self, attr: &JsxAttr) {
        match attr {
            JsxAttr::Attr { name, value } => {
                self.push(name);
                match value {
                    None => {}
                    Some(JsxAttrValue::Str(s)) => {
                        self.push("=");
                        match &s.raw.0 {
                            Some(raw) => self.push(raw),
                            None => {
                                self.push("\"");
                                self.push(&s.value);
                                self.push("\"");
                            }
                        }
                    }
                    Some(JsxAttrValue::Expr(e)) => {
                        self.push("={");
                        self.expr(e);
                        self.push("}");
                    }
                    Some(JsxAttrValue::Element(el)) => {
                        self.push("=");
                        self.jsx(el);
                    }
                }
            }
            JsxAttr::Spread(e) => {
                self.push("{...");
                self.expr(e);
                self.push("}");
            }
        }
    }

    fn jsx_child(&mut self, child: &JsxChild) {
        match &child.kind {
            JsxChildKind::Text(text) => self.push(text),
            JsxChildKind::Expr(None) => self.push("{}"),
            JsxChildKind::Expr(Some(e)) => {
                self.push("{");
                self.expr(e);
                self.push("}");
            }
            JsxChildKind::Spread(e) => {
                self.push("{...");
                self.expr(e);
                self.push("}");
            }
            JsxChildKind::Element(el) => self.jsx(el),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::parser::{parse_detached_expression, parse_detached_statements, parse_program};
    use super::*;

    fn roundtrip(src: &str, edit: impl FnOnce(&mut Program)) -> String {
        let parsed = parse_program(src).unwrap();
        let style = Style::detect(src, parsed.single_quotes, parsed.double_quotes);
        let mut program = parsed.program.clone();
        edit(&mut program);
        print_program(src, &program, &parsed.program, &style)
    }

    fn default_object(program: &mut Program) -> &mut Vec<Prop> {
        for stmt in &mut program.body {
            if let StmtKind::ExportDefault(e) = &mut stmt.kind {
                if let ExprKind::Object(props) = &mut e.unwrap_ts_mut().kind {
                    return props;
                }
            }
        }
        panic!("no default export object");
    }

    #[test]
    fn detects_style() {
        let style = Style::detect("const a = {\n  b: 'c'\n};\n", 1, 0);
        assert_eq!(style.quote, Quote::Single);
        assert_eq!(style.indent, "  ");
        assert_eq!(Style::detect("", 0, 0), Style::default());
        assert_eq!(Style::detect("a;\r\nb;\r\n", 0, 0).newline, Newline::CrLf);
        assert_eq!(Style::detect("a;\nb;\r\n", 0, 0).newline, Newline::Lf);
    }

    #[test]
    fn crlf_documents_stay_crlf() {
        let src = "export default {\r\n  a: 1,\r\n};\r\n";
        let out = roundtrip(src, |p| {
            p.body.insert(0, parse_detached_statements("import b from 'b';").unwrap().remove(0));
            default_object(p).push(Prop::key_value("c", parse_detached_expression("2").unwrap()));
        });
        assert_eq!(
            out,
            "import b from \"b\";\r\n\r\nexport default {\r\n  a: 1,\r\n  c: 2,\r\n};\r\n"
        );
    }

    #[test]
    fn comment_before_closing_brace_stays_last() {
        let src = "export default {\n  semi: false,\n  // trailing inside\n};\n";
        let out = roundtrip(src, |p| {
            default_object(p).push(Prop::key_value("plugins", parse_detached_expression("[]").unwrap()));
        });
        assert_eq!(out, "export default {\n  semi: false,\n  plugins: [],\n  // trailing inside\n};\n");
    }

    #[test]
    fn line_comment_keeps_its_element() {
        let src = "export default {\n  plugins: [\n    a(), // keep\n  ],\n};\n";
        let out = roundtrip(src, |p| {
            let PropKind::KeyValue { value, .. } = &mut default_object(p)[0].kind else { unreachable!() };
            let ExprKind::Array(items) = &mut value.kind else { unreachable!() };
            items.push(Some(parse_detached_expression("b()").unwrap()));
        });
        assert_eq!(out, "export default {\n  plugins: [\n    a(), // keep\n    b(),\n  ],\n};\n");
    }

    #[test]
    fn comment_above_element_moves_with_it() {
        let src = "const list = [\n  a(),\n  // about b\n  b(),\n];\n";
        let out = roundtrip(src, |p| {
            let StmtKind::Var(decl) = &mut p.body[0].kind else { unreachable!() };
            let Some(Expr { kind: ExprKind::Array(items), .. }) = &mut decl.declarators[0].init else { unreachable!() };
            items.insert(1, Some(parse_detached_expression("c()").unwrap()));
        });
        assert_eq!(out, "const list = [\n  a(),\n  c(),\n  // about b\n  b(),\n];\n");
    }

    #[test]
    fn copied_statements_follow_their_new_depth() {
        let src = "if (x) {\n  foo({\n    a: 1,\n  });\n}\n";
        let out = roundtrip(src, |p| {
            let StmtKind::If { cons, .. } = &p.body[0].kind else { unreachable!() };
            let StmtKind::Block(block) = &cons.kind else { unreachable!() };
            let inner = block.body[0].clone();
            p.body = vec![inner];
        });
        assert_eq!(out, "foo({\n  a: 1,\n});\n");
    }

    #[test]
    fn decorators_survive_member_edits() {
        let src = "@Component({ a: 1 })\nclass A {\n  @Input() name = 'x';\n  m() {}\n}\n";
        let out = roundtrip(src, |p| {
            let StmtKind::Class(class) = &mut p.body[0].kind else { unreachable!() };
            class.body.pop();
        });
        assert_eq!(out, "@Component({ a: 1 })\nclass A {\n  @Input() name = 'x';\n}\n");
    }

    #[test]
    fn unchanged_statements_are_copied() {
        let src = "import   a from 'a'\n\n\nconst  x =  1 // keep\n";
        let out = roundtrip(src, |_| {});
        assert_eq!(out, "import   a from 'a'\n\n\nconst  x =  1 // keep\n");
    }

    #[test]
    fn appended_property_follows_indentation() {
        let src = "export default {\n  plugins: [],\n};\n";
        let out = roundtrip(src, |p| {
            default_object(p).push(Prop::key_value("ssr", Expr::new(ExprKind::Lit(Lit::Bool(true)))));
        });
        assert_eq!(out, "export default {\n  plugins: [],\n  ssr: true,\n};\n");
    }

    #[test]
    fn pushed_array_element_keeps_inline_layout() {
        let src = "export default {\n\tplugins: [a()]\n};\n";
        let out = roundtrip(src, |p| {
            let props = default_object(p);
            if let PropKind::KeyValue { value, .. } = &mut props[0].kind {
                if let ExprKind::Array(items) = &mut value.kind {
                    items.push(Some(parse_detached_expression("b()").unwrap()));
                }
            }
        });
        assert_eq!(out, "export default {\n\tplugins: [a(), b()]\n};\n");
    }

    #[test]
    fn new_imports_group_with_imports() {
        let src = "import a from \"a\";\n\nexport default a;\n";
        let out = roundtrip(src, |p| {
            let stmt = parse_detached_statements("import b from 'b';").unwrap().remove(0);
            p.body.insert(1, stmt);
        });
        assert_eq!(
            out,
            "import a from \"a\";\nimport b from \"b\";\n\nexport default a;\n"
        );
    }

    #[test]
    fn fresh_jsx_children_go_on_their_own_lines() {
        let src = "export default function Demo() {\n\treturn (\n\t\t<main>\n\t\t\t<a href=\"/x\">x</a>\n\t\t</main>\n\t);\n}\n";
        let out = roundtrip(src, |p| {
            let StmtKind::ExportDefault(e) = &mut p.body[0].kind else { unreachable!() };
            let ExprKind::Function(f) = &mut e.kind else { unreachable!() };
            let body = f.body.as_mut().unwrap();
            let StmtKind::Return(Some(ret)) = &mut body.body[0].kind else { unreachable!() };
            let ExprKind::Jsx(main) = &mut ret.unwrap_ts_mut().kind else { unreachable!() };
            main.children.pop();
            let ExprKind::Jsx(a) = parse_detached_expression("<a href=\"/y\">y</a>").unwrap().kind else {
                unreachable!()
            };
            main.children.push(JsxChild::element(*a));
        });
        assert_eq!(
            out,
            "export default function Demo() {\n\treturn (\n\t\t<main>\n\t\t\t<a href=\"/x\">x</a>\n\t\t\t<a href=\"/y\">y</a>\n\t\t</main>\n\t);\n}\n"
        );
    }

    #[test]
    fn fresh_strings_use_detected_quotes() {
        let out = roundtrip("const a = 'x';\n", |p| {
            p.body.push(parse_detached_statements("const b = \"y\";").unwrap().remove(0));
        });
        assert_eq!(out, "const a = 'x';\n\nconst b = 'y';\n");
    }

    #[test]
    fn dangling_comments_survive() {
        let out = roundtrip("a();\n// end\n", |p| {
            p.body.insert(0, parse_detached_statements("b();").unwrap().remove(0));
        });
        assert_eq!(out, "b();\n\na();\n// end\n");
    }

    #[test]
    fn printing_detached_objects() {
        let e = parse_detached_expression("{ a: 1, b: [1, 2], c: { d: 'e' } }").unwrap();
        let out = print_expr(&e, &Style::default());
        assert_eq!(out, "{\n\ta: 1,\n\tb: [1, 2],\n\tc: {\n\t\td: \"e\"\n\t}\n}");
    }
}

//! Script syntax tree.
//!
//! The tree is owned and acyclic. Every node that the generator may copy
//! verbatim carries a [`Loc`]; equality between nodes never looks at
//! locations or at the raw spelling of literals, so two independently parsed
//! copies of the same source compare equal.
//!
//! TypeScript types are not modelled: they are kept as the source text of
//! the annotation (see [`TsType`]).

use std::fmt;

// ── Locations and raw text ───────────────────────────────────────────────────

/// Byte range of a node in the source it was parsed from.
///
/// Nodes created programmatically (or parsed from a detached snippet) have
/// no location. Locations are ignored by `==`.
#[derive(Clone, Copy, Default)]
pub struct Loc(Option<(usize, usize)>);

impl Loc {
    pub const NONE: Loc = Loc(None);

    pub(crate) fn new(start: usize, end: usize) -> Self {
        Self(Some((start, end)))
    }

    pub fn span(&self) -> Option<(usize, usize)> {
        self.0
    }

    pub fn is_some(&self) -> bool {
        self.0.is_some()
    }
}

impl PartialEq for Loc {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

impl fmt::Debug for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some((s, e)) => write!(f, "{s}..{e}"),
            None => f.write_str("-"),
        }
    }
}

/// Original spelling of a literal, e.g. `'a'` vs `"a"`. Ignored by `==`.
#[derive(Clone, Default)]
pub struct Raw(pub Option<String>);

impl PartialEq for Raw {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

impl fmt::Debug for Raw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(raw) => write!(f, "{raw:?}"),
            None => f.write_str("-"),
        }
    }
}

/// Source text of a TypeScript type annotation, without the leading `:`.
pub type TsType = String;

// ── Comments ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// `// text`
    Line,
    /// `/* text */`
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub kind: CommentKind,
    /// Text between the delimiters.
    pub text: String,
}

impl Comment {
    pub fn block(text: impl Into<String>) -> Self {
        Self {
            kind: CommentKind::Block,
            text: text.into(),
        }
    }

    pub fn line(text: impl Into<String>) -> Self {
        Self {
            kind: CommentKind::Line,
            text: text.into(),
        }
    }
}

// ── Program and statements ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub body: Vec<Stmt>,
    /// Comments after the last statement.
    pub dangling: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    /// Comments on the lines directly above the statement.
    pub comments: Vec<Comment>,
    /// Comments after the statement on its last line.
    pub trailing: Vec<Comment>,
    pub loc: Loc,
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Self {
            kind,
            comments: Vec::new(),
            trailing: Vec::new(),
            loc: Loc::NONE,
        }
    }

    pub fn expr(expr: Expr) -> Self {
        Self::new(StmtKind::Expr(expr))
    }

    pub fn is_import(&self) -> bool {
        matches!(self.kind, StmtKind::Import(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Import(ImportDecl),
    ExportNamed(ExportNamed),
    /// `export default <expr>`; function and class declarations are held as
    /// their expression forms.
    ExportDefault(Expr),
    ExportAll {
        alias: Option<String>,
        source: Str,
        type_only: bool,
    },
    Var(VarDecl),
    Function(Function),
    Class(Class),
    Expr(Expr),
    Block(Block),
    If {
        test: Expr,
        cons: Box<Stmt>,
        alt: Option<Box<Stmt>>,
    },
    For {
        init: Option<ForHead>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    ForIn {
        left: ForHead,
        right: Expr,
        body: Box<Stmt>,
    },
    ForOf {
        left: ForHead,
        right: Expr,
        body: Box<Stmt>,
        is_await: bool,
    },
    While {
        test: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        test: Expr,
    },
    Return(Option<Expr>),
    Throw(Expr),
    Try {
        block: Block,
        handler: Option<CatchClause>,
        finalizer: Option<Block>,
    },
    Switch {
        discriminant: Expr,
        cases: Vec<SwitchCase>,
    },
    Break(Option<String>),
    Continue(Option<String>),
    Labeled {
        label: String,
        body: Box<Stmt>,
    },
    Empty,
    Debugger,
    TsInterface(TsInterface),
    TsTypeAlias(TsTypeAlias),
    TsModule(TsModule),
    /// Constructs kept as opaque text (`enum`, `import x = require(..)`).
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub body: Vec<Stmt>,
    pub dangling: Vec<Comment>,
    pub loc: Loc,
}

impl Block {
    pub fn new(body: Vec<Stmt>) -> Self {
        Self {
            body,
            dangling: Vec::new(),
            loc: Loc::NONE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForHead {
    Var(VarDecl),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub param: Option<Pat>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// `None` for `default:`.
    pub test: Option<Expr>,
    pub body: Vec<Stmt>,
    pub loc: Loc,
}

// ── Modules ──────────────────────────────────────────────────────────────────

/// A string literal in a position that only accepts strings.
#[derive(Debug, Clone, PartialEq)]
pub struct Str {
    pub value: String,
    pub raw: Raw,
}

impl Str {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            raw: Raw(None),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub specifiers: Vec<ImportSpecifier>,
    pub source: Str,
    /// `import type { .. } from`
    pub type_only: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportSpecifier {
    /// `import local from`
    Default { local: String },
    /// `import * as local from`
    Namespace { local: String },
    /// `import { imported as local } from`
    Named {
        imported: String,
        local: String,
        type_only: bool,
    },
}

impl ImportSpecifier {
    pub fn local(&self) -> &str {
        match self {
            Self::Default { local } | Self::Namespace { local } | Self::Named { local, .. } => {
                local
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportNamed {
    /// `export const x = ..`, `export function f() {}`, ...
    pub decl: Option<Box<Stmt>>,
    pub specifiers: Vec<ExportSpecifier>,
    pub source: Option<Str>,
    pub type_only: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpecifier {
    pub local: String,
    pub exported: String,
}

// ── Declarations ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

impl VarKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Var => "var",
            Self::Let => "let",
            Self::Const => "const",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub kind: VarKind,
    pub declarators: Vec<Declarator>,
    pub declare: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub id: Pat,
    pub init: Option<Expr>,
}

impl Declarator {
    /// Name bound by a plain identifier declarator.
    pub fn name(&self) -> Option<&str> {
        match &self.id.kind {
            PatKind::Ident { name, .. } => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// TypeScript parameter properties (`private readonly x`).
    pub modifiers: Vec<String>,
    pub pat: Pat,
}

impl Param {
    pub fn new(pat: Pat) -> Self {
        Self {
            modifiers: Vec::new(),
            pat,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Option<String>,
    pub params: Vec<Param>,
    /// `None` for overload signatures and `declare function`.
    pub body: Option<Block>,
    pub is_async: bool,
    pub is_generator: bool,
    pub type_params: Option<TsType>,
    pub return_type: Option<TsType>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrowBody {
    Expr(Box<Expr>),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arrow {
    pub params: Vec<Param>,
    pub body: ArrowBody,
    pub is_async: bool,
    pub type_params: Option<TsType>,
    pub return_type: Option<TsType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    /// `@expr` lines above the class, without the `@`.
    pub decorators: Vec<Expr>,
    pub name: Option<String>,
    pub type_params: Option<TsType>,
    pub super_class: Option<Box<Expr>>,
    pub implements: Option<TsType>,
    pub body: Vec<ClassMember>,
    pub is_abstract: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassMember {
    pub kind: ClassMemberKind,
    pub decorators: Vec<Expr>,
    pub comments: Vec<Comment>,
    pub loc: Loc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Method,
    Get,
    Set,
    Constructor,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassMemberKind {
    Method {
        key: PropKey,
        kind: MethodKind,
        func: Function,
        is_static: bool,
        modifiers: Vec<String>,
    },
    Property {
        key: PropKey,
        value: Option<Expr>,
        is_static: bool,
        modifiers: Vec<String>,
        optional: bool,
        ty: Option<TsType>,
    },
    StaticBlock(Block),
    /// Index signatures and other members kept as text.
    Raw(String),
}

// ── TypeScript declarations ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct TsInterface {
    pub name: String,
    pub type_params: Option<TsType>,
    pub extends: Option<TsType>,
    pub body: Vec<TsMember>,
    pub declare: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TsMember {
    pub kind: TsMemberKind,
    pub comments: Vec<Comment>,
    pub loc: Loc,
}

impl TsMember {
    pub fn property(key: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            kind: TsMemberKind::Property {
                key: key.into(),
                optional: false,
                readonly: false,
                ty: Some(ty.into()),
            },
            comments: Vec::new(),
            loc: Loc::NONE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TsMemberKind {
    Property {
        key: String,
        optional: bool,
        readonly: bool,
        ty: Option<TsType>,
    },
    /// Method signatures, index signatures, call signatures.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TsTypeAlias {
    pub name: String,
    pub type_params: Option<TsType>,
    pub ty: TsType,
    pub declare: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TsModuleName {
    Ident(String),
    Str(Str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TsModuleKind {
    Module,
    Namespace,
    Global,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TsModule {
    pub kind: TsModuleKind,
    pub name: TsModuleName,
    pub body: Option<Block>,
    pub declare: bool,
}

// ── Expressions ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub loc: Loc,
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Self {
            kind,
            loc: Loc::NONE,
        }
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Ident(name.into()))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ExprKind::Lit(Lit::Str(Str::new(value))))
    }

    pub fn object(props: Vec<Prop>) -> Self {
        Self::new(ExprKind::Object(props))
    }

    pub fn array(elements: Vec<Expr>) -> Self {
        Self::new(ExprKind::Array(elements.into_iter().map(Some).collect()))
    }

    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Lit(Lit::Str(s)) => Some(&s.value),
            _ => None,
        }
    }

    /// Strip `(..)`, `satisfies T`, `as T` and `x!` wrappers.
    pub fn unwrap_ts(&self) -> &Expr {
        match &self.kind {
            ExprKind::Paren(inner)
            | ExprKind::TsNonNull(inner)
            | ExprKind::TsAs { expr: inner, .. }
            | ExprKind::TsSatisfies { expr: inner, .. } => inner.unwrap_ts(),
            _ => self,
        }
    }

    pub fn unwrap_ts_mut(&mut self) -> &mut Expr {
        match self.kind {
            ExprKind::Paren(_)
            | ExprKind::TsNonNull(_)
            | ExprKind::TsAs { .. }
            | ExprKind::TsSatisfies { .. } => match &mut self.kind {
                ExprKind::Paren(inner)
                | ExprKind::TsNonNull(inner)
                | ExprKind::TsAs { expr: inner, .. }
                | ExprKind::TsSatisfies { expr: inner, .. } => inner.unwrap_ts_mut(),
                _ => unreachable!(),
            },
            _ => self,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Ident(String),
    /// `#name` in `#name in obj`.
    PrivateName(String),
    Lit(Lit),
    Template(Template),
    TaggedTemplate {
        tag: Box<Expr>,
        type_args: Option<TsType>,
        quasi: Template,
    },
    /// Holes are `None`.
    Array(Vec<Option<Expr>>),
    Object(Vec<Prop>),
    Function(Function),
    Arrow(Arrow),
    Class(Class),
    Call(Call),
    New(Call),
    Member {
        object: Box<Expr>,
        prop: MemberProp,
        optional: bool,
    },
    Unary {
        op: &'static str,
        arg: Box<Expr>,
    },
    Update {
        op: &'static str,
        prefix: bool,
        arg: Box<Expr>,
    },
    Binary {
        op: &'static str,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        op: &'static str,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Cond {
        test: Box<Expr>,
        cons: Box<Expr>,
        alt: Box<Expr>,
    },
    Seq(Vec<Expr>),
    Paren(Box<Expr>),
    Spread(Box<Expr>),
    Await(Box<Expr>),
    Yield {
        arg: Option<Box<Expr>>,
        delegate: bool,
    },
    This,
    Super,
    /// `new.target`, `import.meta`
    MetaProp {
        meta: &'static str,
        prop: String,
    },
    Jsx(Box<JsxElement>),
    TsAs {
        expr: Box<Expr>,
        ty: TsType,
    },
    TsSatisfies {
        expr: Box<Expr>,
        ty: TsType,
    },
    TsNonNull(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lit {
    Str(Str),
    Num { value: f64, raw: Raw },
    BigInt(String),
    Bool(bool),
    Null,
    Regex { pattern: String, flags: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// Raw text of each quasi; always one more than `exprs`.
    pub quasis: Vec<String>,
    pub exprs: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub callee: Box<Expr>,
    pub type_args: Option<TsType>,
    pub args: Vec<Expr>,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberProp {
    Ident(String),
    Private(String),
    Computed(Box<Expr>),
}

// ── Object literals ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Prop {
    pub kind: PropKind,
    pub comments: Vec<Comment>,
    pub loc: Loc,
}

impl Prop {
    /// `key: value`
    pub fn key_value(key: impl Into<String>, value: Expr) -> Self {
        Self {
            kind: PropKind::KeyValue {
                key: PropKey::from_name(&key.into()),
                value,
                shorthand: false,
            },
            comments: Vec::new(),
            loc: Loc::NONE,
        }
    }

    pub fn key(&self) -> Option<&PropKey> {
        match &self.kind {
            PropKind::KeyValue { key, .. } | PropKind::Method { key, .. } => Some(key),
            PropKind::Spread(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropKind {
    KeyValue {
        key: PropKey,
        value: Expr,
        shorthand: bool,
    },
    Method {
        key: PropKey,
        kind: MethodKind,
        func: Function,
    },
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropKey {
    Ident(String),
    Str(Str),
    Num(String),
    Computed(Box<Expr>),
}

impl PropKey {
    /// Identifier key when `name` is a valid identifier, string key otherwise.
    pub fn from_name(name: &str) -> Self {
        if is_identifier(name) {
            Self::Ident(name.to_owned())
        } else {
            Self::Str(Str::new(name))
        }
    }

    /// Static name of the key, if it has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Ident(name) | Self::Num(name) => Some(name),
            Self::Str(s) => Some(&s.value),
            Self::Computed(_) => None,
        }
    }
}

// ── Patterns ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Pat {
    pub kind: PatKind,
    pub loc: Loc,
}

impl Pat {
    pub fn ident(name: impl Into<String>) -> Self {
        Self {
            kind: PatKind::Ident {
                name: name.into(),
                ty: None,
                optional: false,
            },
            loc: Loc::NONE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatKind {
    Ident {
        name: String,
        ty: Option<TsType>,
        optional: bool,
    },
    Object {
        props: Vec<ObjectPatProp>,
        ty: Option<TsType>,
    },
    Array {
        elements: Vec<Option<Pat>>,
        ty: Option<TsType>,
    },
    Assign {
        target: Box<Pat>,
        default: Box<Expr>,
    },
    Rest {
        arg: Box<Pat>,
        ty: Option<TsType>,
    },
    /// Member expressions in assignment position (`for (a.b of c)`).
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectPatProp {
    KeyValue {
        key: PropKey,
        value: Pat,
        shorthand: bool,
    },
    Rest(Pat),
}

// ── JSX ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct JsxElement {
    /// `None` for fragments (`<>..</>`).
    pub name: Option<JsxName>,
    pub attrs: Vec<JsxAttr>,
    pub children: Vec<JsxChild>,
    pub self_closing: bool,
    /// Span of the opening tag, `<name attrs>`.
    pub open: Loc,
}

impl JsxElement {
    /// Element with no source location; self-closing when it has no
    /// children.
    pub fn new(name: JsxName, attrs: Vec<JsxAttr>, children: Vec<JsxChild>) -> Self {
        Self {
            name: Some(name),
            attrs,
            self_closing: children.is_empty(),
            children,
            open: Loc::NONE,
        }
    }

    pub fn is_named(&self, name: &str) -> bool {
        matches!(&self.name, Some(JsxName::Ident(n)) if n == name)
    }

    pub fn attr(&self, name: &str) -> Option<&JsxAttr> {
        self.attrs.iter().find(|a| a.name() == Some(name))
    }

    pub fn attr_mut(&mut self, name: &str) -> Option<&mut JsxAttr> {
        self.attrs.iter_mut().find(|a| a.name() == Some(name))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxName {
    Ident(String),
    /// `a.b.c`
    Member(Vec<String>),
    /// `ns:name`
    Namespaced(String, String),
}

impl JsxName {
    /// Parse a tag name: `a.b` is a member name, `ns:x` a namespaced one.
    pub fn new(name: &str) -> Self {
        if let Some((ns, local)) = name.split_once(':') {
            Self::Namespaced(ns.trim().to_owned(), local.trim().to_owned())
        } else if name.contains('.') {
            Self::Member(name.split('.').map(|p| p.trim().to_owned()).collect())
        } else {
            Self::Ident(name.trim().to_owned())
        }
    }
}

impl fmt::Display for JsxName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => f.write_str(name),
            Self::Member(parts) => f.write_str(&parts.join(".")),
            Self::Namespaced(ns, name) => write!(f, "{ns}:{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxAttr {
    Attr {
        name: String,
        value: Option<JsxAttrValue>,
    },
    Spread(Expr),
}

impl JsxAttr {
    pub fn new(name: impl Into<String>, value: Option<JsxAttrValue>) -> Self {
        Self::Attr {
            name: name.into(),
            value,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Attr { name, .. } => Some(name),
            Self::Spread(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxAttrValue {
    Str(Str),
    Expr(Expr),
    Element(Box<JsxElement>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsxChild {
    pub kind: JsxChildKind,
    pub loc: Loc,
}

impl JsxChild {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: JsxChildKind::Text(text.into()),
            loc: Loc::NONE,
        }
    }

    pub fn element(element: JsxElement) -> Self {
        Self {
            kind: JsxChildKind::Element(Box::new(element)),
            loc: Loc::NONE,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, JsxChildKind::Text(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxChildKind {
    /// Raw text, whitespace included.
    Text(String),
    /// `{expr}`; `None` for `{}` and `{/* comment */}`.
    Expr(Option<Expr>),
    Spread(Expr),
    Element(Box<JsxElement>),
}

// ── helpers ──────────────────────────────────────────────────────────────────

/// Whether `name` can be written as a bare identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c == '$' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c == '$' || c.is_alphanumeric())
}

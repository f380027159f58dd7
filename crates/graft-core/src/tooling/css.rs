//! Stylesheets.
//!
//! Every node keeps the whitespace around it as raw strings, the way
//! postcss does, so printing the tree reproduces the input exactly. Nodes
//! created by the helpers below get raws that match their neighbours.

use std::fmt::Write as _;

use super::detect_indent;
use super::error::{FileKind, ParseError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssNode {
    AtRule(AtRule),
    Rule(Rule),
    Decl(Declaration),
    Comment(Comment),
}

impl CssNode {
    fn before(&self) -> &str {
        match self {
            Self::AtRule(n) => &n.before,
            Self::Rule(n) => &n.before,
            Self::Decl(n) => &n.before,
            Self::Comment(n) => &n.before,
        }
    }

    fn before_mut(&mut self) -> &mut String {
        match self {
            Self::AtRule(n) => &mut n.before,
            Self::Rule(n) => &mut n.before,
            Self::Decl(n) => &mut n.before,
            Self::Comment(n) => &mut n.before,
        }
    }

    pub fn as_at_rule(&self) -> Option<&AtRule> {
        match self {
            Self::AtRule(n) => Some(n),
            _ => None,
        }
    }
}

/// `@name params;` or `@name params { .. }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtRule {
    pub name: String,
    pub params: String,
    /// `None` for statement at-rules such as `@import`.
    pub nodes: Option<Vec<CssNode>>,
    pub before: String,
    pub after_name: String,
    pub between: String,
    pub after: String,
    pub semicolon: bool,
}

impl AtRule {
    pub fn new(name: &str, params: &str) -> Self {
        Self {
            name: name.to_owned(),
            params: params.to_owned(),
            nodes: None,
            before: String::new(),
            after_name: if params.is_empty() { String::new() } else { " ".into() },
            between: String::new(),
            after: String::new(),
            semicolon: true,
        }
    }

    /// Params without surrounding quotes or `url(..)`.
    pub fn target(&self) -> &str {
        let params = self.params.trim();
        let params = params
            .strip_prefix("url(")
            .and_then(|p| p.strip_suffix(')'))
            .unwrap_or(params);
        params.trim_matches(|c| c == '\'' || c == '"')
    }
}

/// `selector { .. }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub selector: String,
    pub nodes: Vec<CssNode>,
    pub before: String,
    pub between: String,
    pub after: String,
    indent: String,
}

impl Rule {
    pub fn new(selector: &str) -> Self {
        Self {
            selector: selector.to_owned(),
            nodes: Vec::new(),
            before: String::new(),
            between: " ".into(),
            after: "\n".into(),
            indent: "\t".into(),
        }
    }
}

/// `prop: value;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub prop: String,
    pub value: String,
    pub before: String,
    /// Everything between the property and the value, colon included.
    pub between: String,
    /// Whitespace between the value and the semicolon.
    pub after: String,
    pub semicolon: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Text between `/*` and `*/`.
    pub text: String,
    pub before: String,
}

/// A parsed stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stylesheet {
    pub nodes: Vec<CssNode>,
    /// Whitespace after the last node.
    pub after: String,
    indent: String,
}

// ── parser ───────────────────────────────────────────────────────────────────

pub fn parse_css(source: &str) -> Result<Stylesheet, ParseError> {
    let indent = detect_indent(source).unwrap_or_else(|| "\t".into());
    let mut parser = Parser {
        src: source,
        pos: 0,
        indent: indent.clone(),
    };
    let (nodes, after) = parser.nodes(false)?;
    Ok(Stylesheet { nodes, after, indent })
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    indent: String,
}

enum Stop {
    Open,
    Semicolon,
    Close,
    Eof,
}

impl<'a> Parser<'a> {
    fn error(&self, at: usize, message: &str) -> ParseError {
        ParseError::at(FileKind::Stylesheet, self.src, at, message)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn whitespace(&mut self) -> &'a str {
        let start = self.pos;
        let len = self.rest().len() - self.rest().trim_start().len();
        self.pos += len;
        &self.src[start..self.pos]
    }

    fn nodes(&mut self, in_block: bool) -> Result<(Vec<CssNode>, String), ParseError> {
        let mut nodes = Vec::new();
        let mut before = String::new();
        loop {
            before.push_str(self.whitespace());
            let rest = self.rest();
            if rest.is_empty() {
                if in_block {
                    return Err(self.error(self.pos, "unclosed block"));
                }
                return Ok((nodes, before));
            }
            if rest.starts_with('}') {
                if !in_block {
                    return Err(self.error(self.pos, "unexpected `}`"));
                }
                self.pos += 1;
                return Ok((nodes, before));
            }
            if rest.starts_with(';') {
                // stray semicolons stay with the next node's whitespace
                before.push(';');
                self.pos += 1;
                continue;
            }
            let before = std::mem::take(&mut before);
            let node = if rest.starts_with("/*") {
                CssNode::Comment(self.comment(before)?)
            } else if rest.starts_with('@') {
                CssNode::AtRule(self.at_rule(before)?)
            } else {
                self.rule_or_decl(before)?
            };
            nodes.push(node);
        }
    }

    fn comment(&mut self, before: String) -> Result<Comment, ParseError> {
        let start = self.pos;
        let end = self.src[start + 2..]
            .find("*/")
            .ok_or_else(|| self.error(start, "unclosed comment"))?;
        let text = self.src[start + 2..start + 2 + end].to_owned();
        self.pos = start + 2 + end + 2;
        Ok(Comment { text, before })
    }

    /// Text up to the next top-level `{`, `;` or `}`.
    fn statement(&mut self) -> Result<(&'a str, Stop), ParseError> {
        let start = self.pos;
        let bytes = self.src.as_bytes();
        let mut depth = 0usize;
        let mut i = start;
        while i < bytes.len() {
            match bytes[i] {
                quote @ (b'"' | b'\'') => {
                    i += 1;
                    while i < bytes.len() && bytes[i] != quote {
                        if bytes[i] == b'\\' {
                            i += 1;
                        }
                        i += 1;
                    }
                    if i >= bytes.len() {
                        return Err(self.error(start, "unclosed string"));
                    }
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    let end = self.src[i + 2..]
                        .find("*/")
                        .ok_or_else(|| self.error(i, "unclosed comment"))?;
                    i += 2 + end + 1;
                }
                b'(' | b'[' => depth += 1,
                b')' | b']' => depth = depth.saturating_sub(1),
                b'{' | b';' | b'}' if depth == 0 => {
                    let stop = match bytes[i] {
                        b'{' => Stop::Open,
                        b';' => Stop::Semicolon,
                        _ => Stop::Close,
                    };
                    self.pos = i;
                    return Ok((&self.src[start..i], stop));
                }
                _ => {}
            }
            i += 1;
        }
        self.pos = bytes.len();
        Ok((&self.src[start..], Stop::Eof))
    }

    /// Split trailing whitespace off `text`; without a terminator it is
    /// handed back to the enclosing block.
    fn end_statement(&mut self, text: &'a str, stop: &Stop) -> (&'a str, &'a str) {
        let trimmed = text.trim_end();
        let trailing = &text[trimmed.len()..];
        match stop {
            Stop::Semicolon => {
                self.pos += 1;
                (trimmed, trailing)
            }
            Stop::Open => {
                self.pos += 1;
                (trimmed, trailing)
            }
            Stop::Close | Stop::Eof => {
                self.pos -= trailing.len();
                (trimmed, "")
            }
        }
    }

    fn at_rule(&mut self, before: String) -> Result<AtRule, ParseError> {
        self.pos += 1;
        let name_len = self
            .rest()
            .find(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(self.rest().len());
        let name = self.rest()[..name_len].to_owned();
        self.pos += name_len;
        let after_name = self.whitespace().to_owned();
        let (text, stop) = self.statement()?;
        let opens = matches!(stop, Stop::Open);
        let semicolon = matches!(stop, Stop::Semicolon);
        let (params, between) = self.end_statement(text, &stop);
        let mut rule = AtRule {
            name,
            params: params.to_owned(),
            nodes: None,
            before,
            after_name,
            between: between.to_owned(),
            after: String::new(),
            semicolon,
        };
        if opens {
            let (nodes, after) = self.nodes(true)?;
            rule.nodes = Some(nodes);
            rule.after = after;
        }
        Ok(rule)
    }

    fn rule_or_decl(&mut self, before: String) -> Result<CssNode, ParseError> {
        let start = self.pos;
        let (text, stop) = self.statement()?;
        match stop {
            Stop::Open => {
                let (selector, between) = self.end_statement(text, &stop);
                let (nodes, after) = self.nodes(true)?;
                Ok(CssNode::Rule(Rule {
                    selector: selector.to_owned(),
                    nodes,
                    before,
                    between: between.to_owned(),
                    after,
                    indent: self.indent.clone(),
                }))
            }
            _ => {
                let semicolon = matches!(stop, Stop::Semicolon);
                let (text, after) = self.end_statement(text, &stop);
                let colon = text
                    .find(':')
                    .ok_or_else(|| self.error(start, &format!("unknown word `{}`", text.trim())))?;
                let prop = text[..colon].trim_end();
                let value = text[colon + 1..].trim_start();
                let between = &text[prop.len()..text.len() - value.len()];
                Ok(CssNode::Decl(Declaration {
                    prop: prop.to_owned(),
                    value: value.to_owned(),
                    before,
                    between: between.to_owned(),
                    after: after.to_owned(),
                    semicolon,
                }))
            }
        }
    }
}

// ── printer ──────────────────────────────────────────────────────────────────

fn print_nodes(out: &mut String, nodes: &[CssNode]) {
    for node in nodes {
        print_node(out, node);
    }
}

fn print_node(out: &mut String, node: &CssNode) {
    match node {
        CssNode::AtRule(rule) => {
            let _ = write!(out, "{}@{}{}{}{}", rule.before, rule.name, rule.after_name, rule.params, rule.between);
            match &rule.nodes {
                Some(nodes) => {
                    out.push('{');
                    print_nodes(out, nodes);
                    out.push_str(&rule.after);
                    out.push('}');
                }
                None if rule.semicolon => out.push(';'),
                None => {}
            }
        }
        CssNode::Rule(rule) => {
            let _ = write!(out, "{}{}{}{{", rule.before, rule.selector, rule.between);
            print_nodes(out, &rule.nodes);
            out.push_str(&rule.after);
            out.push('}');
        }
        CssNode::Decl(decl) => {
            let _ = write!(out, "{}{}{}{}{}", decl.before, decl.prop, decl.between, decl.value, decl.after);
            if decl.semicolon {
                out.push(';');
            }
        }
        CssNode::Comment(comment) => {
            let _ = write!(out, "{}/*{}*/", comment.before, comment.text);
        }
    }
}

impl Stylesheet {
    pub fn generate(&self) -> String {
        let mut out = String::new();
        print_nodes(&mut out, &self.nodes);
        out.push_str(&self.after);
        out
    }

    pub fn at_rules<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'s AtRule> + 's {
        self.nodes
            .iter()
            .filter_map(CssNode::as_at_rule)
            .filter(move |r| r.name == name)
    }

    /// Whether an `@import` of `target` exists at the top level.
    pub fn has_import(&self, target: &str) -> bool {
        self.at_rules("import").any(|r| r.target() == target)
    }
}

// ── edits ────────────────────────────────────────────────────────────────────

fn is_import(node: &CssNode) -> bool {
    matches!(node, CssNode::AtRule(r) if r.name == "import")
}

/// Add `@import '<target>';` for every target not imported yet, after the
/// imports already leading the file.
pub fn add_imports(sheet: &mut Stylesheet, targets: &[&str]) {
    let missing = targets
        .iter()
        .copied()
        .filter(|t| !sheet.has_import(t))
        .collect::<Vec<_>>();
    if missing.is_empty() {
        return;
    }
    let was_empty = sheet.nodes.is_empty();
    let mut at = 0;
    for (i, node) in sheet.nodes.iter().enumerate() {
        match node {
            n if is_import(n) => at = i + 1,
            CssNode::Comment(_) => {}
            _ => break,
        }
    }
    let count = missing.len();
    for (offset, target) in missing.into_iter().enumerate() {
        let mut import = AtRule::new("import", &format!("'{target}'"));
        if at + offset > 0 {
            import.before = "\n".into();
        }
        sheet.nodes.insert(at + offset, CssNode::AtRule(import));
    }
    if let Some(next) = sheet.nodes.get_mut(at + count) {
        if !next.before().contains('\n') {
            *next.before_mut() = if is_import(next) { "\n".into() } else { "\n\n".into() };
        }
    }
    if was_empty {
        sheet.after = "\n".into();
    }
}

/// Find `@name params` at the top level or add it as a statement at-rule,
/// at the end when `append` is set, otherwise at the start.
pub fn add_at_rule<'s>(sheet: &'s mut Stylesheet, name: &str, params: &str, append: bool) -> &'s mut AtRule {
    let existing = sheet
        .nodes
        .iter()
        .position(|n| matches!(n, CssNode::AtRule(r) if r.name == name && r.params.trim() == params));
    let at = match existing {
        Some(at) => at,
        None => {
            let mut rule = AtRule::new(name, params);
            let at = if append { sheet.nodes.len() } else { 0 };
            if at > 0 {
                rule.before = "\n".into();
            } else if let Some(first) = sheet.nodes.first_mut() {
                if !first.before().contains('\n') {
                    *first.before_mut() = "\n".into();
                }
            }
            if sheet.nodes.is_empty() {
                sheet.after = "\n".into();
            }
            sheet.nodes.insert(at, CssNode::AtRule(rule));
            at
        }
    };
    match &mut sheet.nodes[at] {
        CssNode::AtRule(rule) => rule,
        _ => unreachable!("position matched an at-rule"),
    }
}

/// Top-level rule with `selector`, appended when missing.
pub fn add_rule<'s>(sheet: &'s mut Stylesheet, selector: &str) -> &'s mut Rule {
    let existing = sheet
        .nodes
        .iter()
        .position(|n| matches!(n, CssNode::Rule(r) if r.selector.trim() == selector));
    let at = match existing {
        Some(at) => at,
        None => {
            let mut rule = Rule::new(selector);
            rule.indent = sheet.indent.clone();
            if !sheet.nodes.is_empty() {
                rule.before = "\n\n".into();
            }
            if !sheet.after.contains('\n') {
                sheet.after = "\n".into();
            }
            sheet.nodes.push(CssNode::Rule(rule));
            sheet.nodes.len() - 1
        }
    };
    match &mut sheet.nodes[at] {
        CssNode::Rule(rule) => rule,
        _ => unreachable!("position matched a rule"),
    }
}

/// Set `prop` to `value` in `rule`, overriding an existing declaration.
pub fn add_declaration<'r>(rule: &'r mut Rule, prop: &str, value: &str) -> &'r mut Declaration {
    let existing = rule
        .nodes
        .iter()
        .position(|n| matches!(n, CssNode::Decl(d) if d.prop == prop));
    let at = match existing {
        Some(at) => at,
        None => {
            let before = rule
                .nodes
                .iter()
                .find_map(|n| match n {
                    CssNode::Decl(d) if d.before.contains('\n') => Some(d.before.clone()),
                    _ => None,
                })
                .unwrap_or_else(|| format!("\n{}", rule.indent));
            if let Some(CssNode::Decl(last)) = rule.nodes.last_mut() {
                last.semicolon = true;
            }
            if !rule.after.contains('\n') {
                rule.after = "\n".into();
            }
            rule.nodes.push(CssNode::Decl(Declaration {
                prop: prop.to_owned(),
                value: String::new(),
                before,
                between: ": ".into(),
                after: String::new(),
                semicolon: true,
            }));
            rule.nodes.len() - 1
        }
    };
    match &mut rule.nodes[at] {
        CssNode::Decl(decl) => {
            if decl.value != value {
                decl.value = value.to_owned();
            }
            decl
        }
        _ => unreachable!("position matched a declaration"),
    }
}

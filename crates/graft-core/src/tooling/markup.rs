//! Templated markup.
//!
//! A component file holds up to three special sections (an instance
//! `<script>`, a module `<script module>` and a `<style>`) with the
//! template markup around them. The template is parsed into an element
//! tree whose nodes remember their source span; printing copies every node
//! that still equals its pristine copy and reprints the rest.
//!
//! [`parse_html`] reads a plain HTML document with the same tree, without
//! `{expression}` tags.

use std::collections::HashMap;

use super::error::{FileKind, ParseError};

// ── tree ─────────────────────────────────────────────────────────────────────

/// Source range of a parsed node. Spans never take part in equality, so a
/// node compares equal to a freshly built copy of itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct Span(Option<(usize, usize)>);

impl Span {
    pub const NONE: Span = Span(None);

    fn new(start: usize, end: usize) -> Self {
        Span(Some((start, end)))
    }
}

impl PartialEq for Span {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

impl Eq for Span {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Element(Element),
    Text(Text),
    /// `{expression}`
    ExprTag(Tag),
    /// `{#if ..}`, `{:else}`, `{/if}`, `{@html ..}`
    Block(Tag),
    /// `<!-- .. -->`
    Comment(Text),
}

impl MarkupNode {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(Text {
            value: value.into(),
            span: Span::NONE,
        })
    }

    fn span(&self) -> Span {
        match self {
            Self::Element(n) => n.span,
            Self::Text(n) | Self::Comment(n) => n.span,
            Self::ExprTag(n) | Self::Block(n) => n.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub value: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Everything between the braces.
    pub content: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// `disabled`
    Boolean,
    /// `href="/demo"`; `quote` is `None` for unquoted values.
    Text { value: String, quote: Option<char> },
    /// `value={tag}`
    Expression(String),
    /// `class="a {b}"`, kept as written.
    Mixed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Empty for `{shorthand}` and `{...spread}` attributes.
    pub name: String,
    pub value: AttrValue,
}

impl Attribute {
    /// Static text of the value, if it has one.
    pub fn text(&self) -> Option<&str> {
        match &self.value {
            AttrValue::Text { value, .. } => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<MarkupNode>,
    pub self_closing: bool,
    pub span: Span,
    open: Span,
}

const VOID_ELEMENTS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name.to_ascii_lowercase().as_str())
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

// ── parser ───────────────────────────────────────────────────────────────────

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    expressions: bool,
}

impl<'a> Parser<'a> {
    fn error(&self, at: usize, message: impl Into<String>) -> ParseError {
        ParseError::at(FileKind::Markup, self.src, at, message)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        self.pos += self.rest().len() - self.rest().trim_start().len();
    }

    fn take_until(&mut self, needle: &str, what: &str) -> Result<&'a str, ParseError> {
        let start = self.pos;
        let end = self.rest().find(needle).ok_or_else(|| self.error(start, format!("unclosed {what}")))?;
        self.pos += end + needle.len();
        Ok(&self.src[start..start + end])
    }

    fn is_tag_start(&self) -> bool {
        let mut chars = self.rest().chars();
        chars.next() == Some('<') && chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!')
    }

    fn nodes(&mut self, parent: Option<&str>) -> Result<Vec<MarkupNode>, ParseError> {
        let mut nodes = Vec::new();
        loop {
            let start = self.pos;
            let rest = self.rest();
            if rest.is_empty() {
                return match parent {
                    Some(name) => Err(self.error(start, format!("unclosed <{name}>"))),
                    None => Ok(nodes),
                };
            }
            if rest.starts_with("</") {
                self.pos += 2;
                let name = self.take_until(">", "closing tag")?.trim();
                if parent == Some(name) {
                    return Ok(nodes);
                }
                return Err(self.error(start, format!("unexpected </{name}>")));
            }
            if rest.starts_with("<!--") {
                self.pos += 4;
                let value = self.take_until("-->", "comment")?.to_owned();
                nodes.push(MarkupNode::Comment(Text {
                    value,
                    span: Span::new(start, self.pos),
                }));
            } else if rest.starts_with("<!") {
                self.take_until(">", "declaration")?;
                nodes.push(MarkupNode::Text(Text {
                    value: self.src[start..self.pos].to_owned(),
                    span: Span::new(start, self.pos),
                }));
            } else if self.is_tag_start() {
                nodes.push(MarkupNode::Element(self.element()?));
            } else if self.expressions && rest.starts_with('{') {
                let content = self.braced()?.to_owned();
                let span = Span::new(start, self.pos);
                let tag = Tag { content, span };
                let block = tag.content.starts_with(['#', ':', '/', '@']);
                nodes.push(if block { MarkupNode::Block(tag) } else { MarkupNode::ExprTag(tag) });
            } else {
                self.pos += rest.chars().next().map_or(1, char::len_utf8);
                while !self.rest().is_empty() && !self.is_tag_start() && !(self.expressions && self.rest().starts_with('{')) {
                    self.pos += self.rest().chars().next().map_or(1, char::len_utf8);
                }
                nodes.push(MarkupNode::Text(Text {
                    value: self.src[start..self.pos].to_owned(),
                    span: Span::new(start, self.pos),
                }));
            }
        }
    }

    /// `{ .. }` with nested braces and strings; returns the inner text.
    fn braced(&mut self) -> Result<&'a str, ParseError> {
        let start = self.pos;
        let bytes = self.src.as_bytes();
        let mut depth = 0usize;
        let mut i = start;
        while i < bytes.len() {
            match bytes[i] {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos = i + 1;
                        return Ok(&self.src[start + 1..i]);
                    }
                }
                quote @ (b'"' | b'\'' | b'`') => {
                    i += 1;
                    while i < bytes.len() && bytes[i] != quote {
                        if bytes[i] == b'\\' {
                            i += 1;
                        }
                        i += 1;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        Err(self.error(start, "unclosed expression tag"))
    }

    fn name(&mut self) -> &'a str {
        let start = self.pos;
        let len = self
            .rest()
            .find(|c: char| c.is_whitespace() || matches!(c, '>' | '/' | '='))
            .unwrap_or(self.rest().len());
        self.pos += len;
        &self.src[start..start + len]
    }

    fn element(&mut self) -> Result<Element, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let name = self.name().to_owned();
        let mut attributes = Vec::new();
        let self_closing = loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                return Err(self.error(start, format!("unclosed <{name}> tag")));
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                break true;
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break false;
            }
            if rest.starts_with('{') {
                let content = self.braced()?.to_owned();
                attributes.push(Attribute {
                    name: String::new(),
                    value: AttrValue::Expression(content),
                });
                continue;
            }
            attributes.push(self.attribute()?);
        };
        let open = Span::new(start, self.pos);

        let children = if self_closing || is_void(&name) {
            Vec::new()
        } else if matches!(name.as_str(), "script" | "style" | "textarea") {
            let content_start = self.pos;
            let close = format!("</{name}>");
            let content = self.take_until(&close, &format!("<{name}>"))?;
            if content.is_empty() {
                Vec::new()
            } else {
                vec![MarkupNode::Text(Text {
                    value: content.to_owned(),
                    span: Span::new(content_start, content_start + content.len()),
                })]
            }
        } else {
            self.nodes(Some(name.as_str()))?
        };

        Ok(Element {
            name,
            attributes,
            children,
            self_closing,
            span: Span::new(start, self.pos),
            open,
        })
    }

    fn attribute(&mut self) -> Result<Attribute, ParseError> {
        let start = self.pos;
        let name = self.name().to_owned();
        if name.is_empty() {
            return Err(self.error(start, "expected an attribute name"));
        }
        self.skip_whitespace();
        if !self.rest().starts_with('=') {
            return Ok(Attribute {
                name,
                value: AttrValue::Boolean,
            });
        }
        self.pos += 1;
        self.skip_whitespace();
        let value = match self.rest().chars().next() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let raw = self.take_until(&quote.to_string(), "attribute value")?;
                if self.expressions && raw.contains('{') {
                    AttrValue::Mixed(raw.to_owned())
                } else {
                    AttrValue::Text {
                        value: raw.to_owned(),
                        quote: Some(quote),
                    }
                }
            }
            Some('{') if self.expressions => AttrValue::Expression(self.braced()?.to_owned()),
            _ => {
                let from = self.pos;
                let len = self
                    .rest()
                    .find(|c: char| c.is_whitespace() || c == '>')
                    .unwrap_or(self.rest().len());
                // `/>` closes the tag rather than ending the value
                let len = if self.rest()[..len].ends_with('/') && self.rest()[len..].starts_with('>') {
                    len - 1
                } else {
                    len
                };
                self.pos += len;
                AttrValue::Text {
                    value: self.src[from..from + len].to_owned(),
                    quote: None,
                }
            }
        };
        Ok(Attribute { name, value })
    }
}

// ── printer ──────────────────────────────────────────────────────────────────

fn index_nodes<'t>(nodes: &'t [MarkupNode], index: &mut HashMap<(usize, usize), &'t MarkupNode>) {
    for node in nodes {
        if let Some(span) = node.span().0 {
            index.insert(span, node);
        }
        if let MarkupNode::Element(el) = node {
            index_nodes(&el.children, index);
        }
    }
}

struct Printer<'a> {
    src: &'a str,
    originals: HashMap<(usize, usize), &'a MarkupNode>,
    out: String,
}

impl<'a> Printer<'a> {
    fn new(src: &'a str, original: &'a [MarkupNode]) -> Self {
        let mut originals = HashMap::new();
        index_nodes(original, &mut originals);
        Self {
            src,
            originals,
            out: String::new(),
        }
    }

    fn unchanged(&self, node: &MarkupNode) -> Option<(usize, usize)> {
        let span = node.span().0?;
        (self.originals.get(&span).copied() == Some(node)).then_some(span)
    }

    fn nodes(&mut self, nodes: &[MarkupNode]) {
        for node in nodes {
            self.node(node);
        }
    }

    fn node(&mut self, node: &MarkupNode) {
        if let Some((start, end)) = self.unchanged(node) {
            self.out.push_str(&self.src[start..end]);
            return;
        }
        match node {
            MarkupNode::Element(el) => self.element(el),
            MarkupNode::Text(text) => self.out.push_str(&text.value),
            MarkupNode::Comment(text) => {
                self.out.push_str("<!--");
                self.out.push_str(&text.value);
                self.out.push_str("-->");
            }
            MarkupNode::ExprTag(tag) | MarkupNode::Block(tag) => {
                self.out.push('{');
                self.out.push_str(&tag.content);
                self.out.push('}');
            }
        }
    }

    fn open_tag_unchanged(&self, el: &Element) -> Option<(usize, usize)> {
        let span = el.span.0?;
        let open = el.open.0?;
        match self.originals.get(&span) {
            Some(MarkupNode::Element(orig)) => (orig.name == el.name
                && orig.attributes == el.attributes
                && orig.self_closing == el.self_closing)
                .then_some(open),
            _ => None,
        }
    }

    fn element(&mut self, el: &Element) {
        match self.open_tag_unchanged(el) {
            Some((start, end)) => self.out.push_str(&self.src[start..end]),
            None => {
                self.out.push('<');
                self.out.push_str(&el.name);
                for attr in &el.attributes {
                    self.out.push(' ');
                    print_attribute(&mut self.out, attr);
                }
                self.out.push_str(if el.self_closing { " />" } else { ">" });
            }
        }
        if el.self_closing || is_void(&el.name) {
            return;
        }
        self.nodes(&el.children);
        self.out.push_str("</");
        self.out.push_str(&el.name);
        self.out.push('>');
    }
}

fn print_attribute(out: &mut String, attr: &Attribute) {
    match &attr.value {
        AttrValue::Expression(expr) if attr.name.is_empty() => {
            out.push('{');
            out.push_str(expr);
            out.push('}');
        }
        AttrValue::Boolean => out.push_str(&attr.name),
        AttrValue::Text { value, quote } => {
            out.push_str(&attr.name);
            out.push('=');
            match quote {
                Some(q) => {
                    out.push(*q);
                    out.push_str(value);
                    out.push(*q);
                }
                None => out.push_str(value),
            }
        }
        AttrValue::Expression(expr) => {
            out.push_str(&attr.name);
            out.push_str("={");
            out.push_str(expr);
            out.push('}');
        }
        AttrValue::Mixed(raw) => {
            out.push_str(&attr.name);
            out.push_str("=\"");
            out.push_str(raw);
            out.push('"');
        }
    }
}

fn print_nodes(src: &str, nodes: &[MarkupNode], original: &[MarkupNode]) -> String {
    let mut printer = Printer::new(src, original);
    printer.nodes(nodes);
    printer.out
}

/// Print nodes that were never part of a parsed document.
pub fn print_fresh(nodes: &[MarkupNode]) -> String {
    print_nodes("", nodes, &[])
}

// ── documents ────────────────────────────────────────────────────────────────

/// A plain HTML document.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    source: String,
    pub nodes: Vec<MarkupNode>,
    original: Vec<MarkupNode>,
}

pub fn parse_html(source: &str) -> Result<HtmlDocument, ParseError> {
    let nodes = parse_fragment(source, false)?;
    Ok(HtmlDocument {
        source: source.to_owned(),
        original: nodes.clone(),
        nodes,
    })
}

impl HtmlDocument {
    pub fn generate(&self) -> String {
        print_nodes(&self.source, &self.nodes, &self.original)
    }
}

fn parse_fragment(source: &str, expressions: bool) -> Result<Vec<MarkupNode>, ParseError> {
    Parser {
        src: source,
        pos: 0,
        expressions,
    }
    .nodes(None)
}

/// Script or style section of a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Raw attribute text of the opening tag, e.g. ` lang="ts"`.
    pub attrs: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
    Module,
    Instance,
    Style,
}

#[derive(Debug, Clone)]
enum Piece {
    Template(usize, usize),
    Section(SectionKind),
}

/// A component split into its sections.
#[derive(Debug, Clone)]
pub struct Component {
    source: String,
    pieces: Vec<Piece>,
    pub module: Option<Section>,
    pub script: Option<Section>,
    pub style: Option<Section>,
    template_source: String,
    pub template: Vec<MarkupNode>,
    original_template: Vec<MarkupNode>,
}

/// Replacement text for [`Component::generate`]; `None` keeps the section.
#[derive(Debug, Clone, Default)]
pub struct Overrides<'a> {
    pub module: Option<&'a str>,
    pub script: Option<&'a str>,
    pub style: Option<&'a str>,
    pub template: Option<&'a str>,
}

fn find_section_open(src: &str, from: usize, tag: &str) -> Option<usize> {
    let needle = format!("<{tag}");
    let mut at = from;
    while let Some(found) = src[at..].find(&needle) {
        let start = at + found;
        let after = src[start + needle.len()..].chars().next();
        if matches!(after, Some(c) if c.is_whitespace() || c == '>') {
            return Some(start);
        }
        at = start + needle.len();
    }
    None
}

pub fn parse_component(source: &str) -> Result<Component, ParseError> {
    let mut pieces = Vec::new();
    let (mut module, mut script, mut style) = (None, None, None);
    let mut template_source = String::new();
    let mut pos = 0;
    loop {
        let next = ["script", "style"]
            .iter()
            .filter_map(|tag| find_section_open(source, pos, tag).map(|at| (at, *tag)))
            .min_by_key(|(at, _)| *at);
        let Some((start, tag)) = next else {
            template_source.push_str(&source[pos..]);
            pieces.push(Piece::Template(pos, source.len()));
            break;
        };
        template_source.push_str(&source[pos..start]);
        pieces.push(Piece::Template(pos, start));

        let open_end = source[start..]
            .find('>')
            .map(|e| start + e + 1)
            .ok_or_else(|| ParseError::at(FileKind::Markup, source, start, format!("unclosed <{tag}> tag")))?;
        let attrs = source[start + 1 + tag.len()..open_end - 1].to_owned();
        let close = format!("</{tag}>");
        let content_end = source[open_end..]
            .find(&close)
            .map(|e| open_end + e)
            .ok_or_else(|| ParseError::at(FileKind::Markup, source, start, format!("unclosed <{tag}>")))?;
        let section = Section {
            content: source[open_end..content_end].to_owned(),
            attrs,
        };
        let kind = match tag {
            "style" => SectionKind::Style,
            _ if section.attrs.contains("module") => SectionKind::Module,
            _ => SectionKind::Instance,
        };
        let slot = match kind {
            SectionKind::Module => &mut module,
            SectionKind::Instance => &mut script,
            SectionKind::Style => &mut style,
        };
        if slot.is_some() {
            return Err(ParseError::at(FileKind::Markup, source, start, format!("duplicate <{tag}> section")));
        }
        *slot = Some(section);
        pieces.push(Piece::Section(kind));
        pos = content_end + close.len();
    }

    let template = parse_fragment(&template_source, true)?;
    Ok(Component {
        source: source.to_owned(),
        pieces,
        module,
        script,
        style,
        original_template: template.clone(),
        template,
        template_source,
    })
}

fn print_section(out: &mut String, tag: &str, attrs: &str, content: &str) {
    out.push('<');
    out.push_str(tag);
    out.push_str(attrs);
    out.push('>');
    out.push_str(content);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Content for a section that did not exist: one line break on each side.
fn fresh_content(content: &str) -> String {
    format!("\n{}\n", content.trim_matches('\n'))
}

impl Component {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The template as currently edited.
    pub fn print_template(&self) -> String {
        print_nodes(&self.template_source, &self.template, &self.original_template)
    }

    fn section(&self, kind: SectionKind) -> Option<&Section> {
        match kind {
            SectionKind::Module => self.module.as_ref(),
            SectionKind::Instance => self.script.as_ref(),
            SectionKind::Style => self.style.as_ref(),
        }
    }

    fn resolved(&self, kind: SectionKind, overrides: &Overrides) -> Option<(String, String)> {
        let replacement = match kind {
            SectionKind::Module => overrides.module,
            SectionKind::Instance => overrides.script,
            SectionKind::Style => overrides.style,
        };
        match (self.section(kind), replacement) {
            (Some(section), Some(content)) => Some((section.attrs.clone(), content.to_owned())),
            (Some(section), None) => Some((section.attrs.clone(), section.content.clone())),
            (None, Some(content)) => {
                let attrs = if kind == SectionKind::Module { " module" } else { "" };
                Some((attrs.to_owned(), fresh_content(content)))
            }
            (None, None) => None,
        }
    }

    /// Reassemble the component. Sections keep their place; sections that
    /// did not exist go first (scripts) or last (style). An edited template
    /// is printed as one block between the scripts and the style.
    pub fn generate(&self, overrides: Overrides) -> String {
        let template = match overrides.template {
            Some(template) => template.to_owned(),
            None => self.print_template(),
        };
        let template_changed = template != self.template_source;

        let mut out = String::new();
        let tag = |kind: SectionKind| if kind == SectionKind::Style { "style" } else { "script" };
        let emit = |out: &mut String, kind: SectionKind| {
            if let Some((attrs, content)) = self.resolved(kind, &overrides) {
                print_section(out, tag(kind), &attrs, &content);
            }
        };

        if template_changed {
            let mut blocks = Vec::new();
            for kind in [SectionKind::Module, SectionKind::Instance] {
                let mut block = String::new();
                emit(&mut block, kind);
                blocks.push(block);
            }
            blocks.push(template.trim_matches('\n').to_owned());
            let mut block = String::new();
            emit(&mut block, SectionKind::Style);
            blocks.push(block);
            out = blocks.into_iter().filter(|b| !b.is_empty()).collect::<Vec<_>>().join("\n\n");
            out.push('\n');
            return out;
        }

        for kind in [SectionKind::Module, SectionKind::Instance] {
            if self.section(kind).is_none() && self.resolved(kind, &overrides).is_some() {
                emit(&mut out, kind);
                out.push_str("\n\n");
            }
        }
        for piece in &self.pieces {
            match piece {
                Piece::Template(start, end) => out.push_str(&self.source[*start..*end]),
                Piece::Section(kind) => emit(&mut out, *kind),
            }
        }
        if self.style.is_none() && self.resolved(SectionKind::Style, &overrides).is_some() {
            if !out.is_empty() && !out.ends_with("\n\n") {
                out.push_str(if out.ends_with('\n') { "\n" } else { "\n\n" });
            }
            emit(&mut out, SectionKind::Style);
            out.push('\n');
        }
        out
    }
}

// ── edits ────────────────────────────────────────────────────────────────────

/// First element, depth first, matching `pred`.
pub fn find_element<'t>(nodes: &'t mut [MarkupNode], pred: &dyn Fn(&Element) -> bool) -> Option<&'t mut Element> {
    for node in nodes {
        if let MarkupNode::Element(el) = node {
            if pred(el) {
                return Some(el);
            }
            if let Some(found) = find_element(&mut el.children, pred) {
                return Some(found);
            }
        }
    }
    None
}

/// Read-only [`find_element`].
pub fn has_element(nodes: &[MarkupNode], pred: &dyn Fn(&Element) -> bool) -> bool {
    nodes.iter().any(|node| match node {
        MarkupNode::Element(el) => pred(el) || has_element(&el.children, pred),
        _ => false,
    })
}

/// Set a static attribute, replacing any value it had.
pub fn set_attribute(el: &mut Element, name: &str, value: &str) {
    let value = AttrValue::Text {
        value: value.to_owned(),
        quote: Some('"'),
    };
    match el.attributes.iter_mut().find(|a| a.name == name) {
        Some(attr) => {
            if attr.text() != Some(text_of(&value)) {
                attr.value = value;
            }
        }
        None => el.attributes.push(Attribute {
            name: name.to_owned(),
            value,
        }),
    }
}

fn text_of(value: &AttrValue) -> &str {
    match value {
        AttrValue::Text { value, .. } => value,
        _ => "",
    }
}

pub fn create_element(name: &str, attributes: &[(&str, &str)]) -> Element {
    let mut el = Element {
        name: name.to_owned(),
        attributes: Vec::new(),
        children: Vec::new(),
        self_closing: false,
        span: Span::NONE,
        open: Span::NONE,
    };
    for (key, value) in attributes {
        set_attribute(&mut el, key, value);
    }
    el
}

pub fn append_child(el: &mut Element, child: MarkupNode) -> &mut MarkupNode {
    el.children.push(child);
    let last = el.children.len() - 1;
    &mut el.children[last]
}

/// Parse `raw` as template markup and append the nodes to `nodes`.
pub fn append_from_raw(nodes: &mut Vec<MarkupNode>, raw: &str) -> Result<(), ParseError> {
    let parsed = parse_fragment(raw, true)?;
    nodes.extend(parsed.into_iter().map(strip_spans));
    Ok(())
}

fn strip_spans(node: MarkupNode) -> MarkupNode {
    match node {
        MarkupNode::Element(mut el) => {
            el.span = Span::NONE;
            el.open = Span::NONE;
            el.children = el.children.into_iter().map(strip_spans).collect();
            MarkupNode::Element(el)
        }
        MarkupNode::Text(t) => MarkupNode::Text(Text { span: Span::NONE, ..t }),
        MarkupNode::Comment(t) => MarkupNode::Comment(Text { span: Span::NONE, ..t }),
        MarkupNode::ExprTag(t) => MarkupNode::ExprTag(Tag { span: Span::NONE, ..t }),
        MarkupNode::Block(t) => MarkupNode::Block(Tag { span: Span::NONE, ..t }),
    }
}

/// Link `/demo/<path>` from a demo page template, once.
pub fn add_to_demo_page(content: &str, path: &str) -> Result<String, ParseError> {
    let mut component = parse_component(content)?;
    let href = format!("/demo/{path}");
    let linked = has_element(&component.template, &|el| {
        el.name == "a" && el.attr("href").and_then(Attribute::text) == Some(href.as_str())
    });
    if linked {
        return Ok(content.to_owned());
    }
    let ends_with_break = matches!(component.template.last(), Some(MarkupNode::Text(t)) if t.value.ends_with('\n'));
    if !component.template.is_empty() && !ends_with_break {
        component.template.push(MarkupNode::text("\n"));
    }
    let mut link = create_element("a", &[("href", &href)]);
    append_child(&mut link, MarkupNode::text(path));
    component.template.push(MarkupNode::Element(link));
    Ok(component.generate(Overrides::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<script lang=\"ts\">\n\tlet count = 0;\n</script>\n\n<main class=\"app {theme}\">\n\t<h1>Hi</h1>\n\t{#if count}<p>{count}</p>{/if}\n\t<input bind:value disabled />\n</main>\n\n<style>\n\tmain { margin: 0; }\n</style>\n";

    #[test]
    fn unchanged_component_is_verbatim() {
        let component = parse_component(PAGE).unwrap();
        assert_eq!(component.generate(Overrides::default()), PAGE);
        assert_eq!(component.script.as_ref().map(|s| s.attrs.as_str()), Some(" lang=\"ts\""));
        assert!(component.style.is_some());
        assert!(component.module.is_none());
    }

    #[test]
    fn template_tree_has_tags_and_attributes() {
        let component = parse_component(PAGE).unwrap();
        let main = component
            .template
            .iter()
            .find_map(|n| match n {
                MarkupNode::Element(el) if el.name == "main" => Some(el),
                _ => None,
            })
            .unwrap();
        assert_eq!(main.attr("class").map(|a| &a.value), Some(&AttrValue::Mixed("app {theme}".into())));
        assert!(main.children.iter().any(|c| matches!(c, MarkupNode::Block(t) if t.content == "#if count")));
        let input = main
            .children
            .iter()
            .find_map(|c| match c {
                MarkupNode::Element(el) if el.name == "input" => Some(el),
                _ => None,
            })
            .unwrap();
        assert!(input.self_closing);
        assert_eq!(input.attr("disabled").map(|a| &a.value), Some(&AttrValue::Boolean));
    }

    #[test]
    fn overrides_replace_sections_in_place() {
        let component = parse_component(PAGE).unwrap();
        let out = component.generate(Overrides {
            script: Some("\n\tlet count = 1;\n"),
            module: Some("export const prerender = true;"),
            ..Overrides::default()
        });
        assert!(out.starts_with("<script module>\nexport const prerender = true;\n</script>\n\n<script lang=\"ts\">\n\tlet count = 1;\n</script>"));
        assert!(out.ends_with("</style>\n"));
    }

    #[test]
    fn only_edited_elements_are_reprinted() {
        let mut component = parse_component(PAGE).unwrap();
        let h1 = find_element(&mut component.template, &|el| el.name == "h1").unwrap();
        set_attribute(h1, "id", "title");
        let out = component.generate(Overrides::default());
        assert!(out.contains("\t<h1 id=\"title\">Hi</h1>\n\t{#if count}<p>{count}</p>{/if}\n\t<input bind:value disabled />"));
        assert!(out.contains("<main class=\"app {theme}\">"));
        assert!(out.starts_with("<script lang=\"ts\">\n\tlet count = 0;\n</script>\n\n<main"));
    }

    #[test]
    fn malformed_markup_is_a_parse_error() {
        let err = parse_component("<div>\n<p>text</div>").unwrap_err();
        assert_eq!(err.kind, FileKind::Markup);
        assert!(parse_component("<script>let a;").is_err());
        assert!(parse_component("<p>{a</p>").is_err());
    }

    #[test]
    fn demo_links_are_added_once() {
        let once = add_to_demo_page("", "paraglide").unwrap();
        assert_eq!(once, "<a href=\"/demo/paraglide\">paraglide</a>\n");
        let twice = add_to_demo_page(&once, "paraglide").unwrap();
        assert_eq!(twice, once);
        let both = add_to_demo_page(&once, "lucia").unwrap();
        assert_eq!(
            both,
            "<a href=\"/demo/paraglide\">paraglide</a>\n<a href=\"/demo/lucia\">lucia</a>\n"
        );
    }

    #[test]
    fn html_documents_keep_untouched_markup() {
        let src = "<!doctype html>\n<html lang=\"en\">\n<head>\n<script>if (a < b) {}</script>\n</head>\n<body>{x}</body>\n</html>\n";
        let mut doc = parse_html(src).unwrap();
        assert_eq!(doc.generate(), src);
        let html = find_element(&mut doc.nodes, &|el| el.name == "html").unwrap();
        set_attribute(html, "lang", "%lang%");
        let head = find_element(&mut doc.nodes, &|el| el.name == "head").unwrap();
        append_from_raw(&mut head.children, "<meta charset=\"utf-8\">\n").unwrap();
        assert_eq!(
            doc.generate(),
            "<!doctype html>\n<html lang=\"%lang%\">\n<head>\n<script>if (a < b) {}</script>\n<meta charset=\"utf-8\">\n</head>\n<body>{x}</body>\n</html>\n"
        );
    }
}

//! Depth-first traversal of script trees with in-place replacement.
//!
//! A [`Visitor`] gets a handler call for every node it can see. Each handler
//! decides whether to descend (by calling [`Context::next`] or
//! [`Context::next_with`]) and may return a replacement node. A handler that
//! neither descends nor replaces prunes the subtree.
//!
//! Generic handlers (`statement`, `expression`) dispatch to the kind-specific
//! ones by default; override the generic one to see every node of a
//! category, and call [`dispatch_statement`] / [`dispatch_expression`] to
//! keep the specific handlers working.

use std::cell::Cell;

use super::ast::*;

/// Traversal state handed to each handler.
pub struct Context<'w, S> {
    state: S,
    stopped: &'w Cell<bool>,
}

impl<'w, S: Clone> Context<'w, S> {
    pub fn state(&self) -> &S {
        &self.state
    }

    /// End the whole traversal once the current handler returns.
    pub fn stop(&self) {
        self.stopped.set(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }

    /// Visit the children of `node` with the current state.
    pub fn next<V, N>(&self, visitor: &mut V, node: &mut N)
    where
        V: Visitor<State = S>,
        N: Walk + ?Sized,
    {
        node.walk_children(visitor, self.state.clone(), self.stopped);
    }

    /// Visit the children of `node` with a new state.
    pub fn next_with<V, N>(&self, visitor: &mut V, node: &mut N, state: S)
    where
        V: Visitor<State = S>,
        N: Walk + ?Sized,
    {
        node.walk_children(visitor, state, self.stopped);
    }
}

pub type Cx<'w, V> = Context<'w, <V as Visitor>::State>;

#[allow(unused_variables)]
pub trait Visitor: Sized {
    type State: Clone;

    fn program(&mut self, node: &mut Program, cx: &mut Cx<'_, Self>) {
        cx.next(self, node);
    }

    fn statement(&mut self, node: &mut Stmt, cx: &mut Cx<'_, Self>) -> Option<Stmt> {
        dispatch_statement(self, node, cx)
    }

    fn import_declaration(&mut self, node: &mut Stmt, cx: &mut Cx<'_, Self>) -> Option<Stmt> {
        None
    }

    fn export_default_declaration(&mut self, node: &mut Stmt, cx: &mut Cx<'_, Self>) -> Option<Stmt> {
        cx.next(self, node);
        None
    }

    fn export_named_declaration(&mut self, node: &mut Stmt, cx: &mut Cx<'_, Self>) -> Option<Stmt> {
        cx.next(self, node);
        None
    }

    fn variable_declaration(&mut self, node: &mut Stmt, cx: &mut Cx<'_, Self>) -> Option<Stmt> {
        cx.next(self, node);
        None
    }

    fn function_declaration(&mut self, node: &mut Stmt, cx: &mut Cx<'_, Self>) -> Option<Stmt> {
        cx.next(self, node);
        None
    }

    fn class_declaration(&mut self, node: &mut Stmt, cx: &mut Cx<'_, Self>) -> Option<Stmt> {
        cx.next(self, node);
        None
    }

    fn return_statement(&mut self, node: &mut Stmt, cx: &mut Cx<'_, Self>) -> Option<Stmt> {
        cx.next(self, node);
        None
    }

    fn expression_statement(&mut self, node: &mut Stmt, cx: &mut Cx<'_, Self>) -> Option<Stmt> {
        cx.next(self, node);
        None
    }

    fn ts_interface(&mut self, node: &mut Stmt, cx: &mut Cx<'_, Self>) -> Option<Stmt> {
        None
    }

    fn ts_module(&mut self, node: &mut Stmt, cx: &mut Cx<'_, Self>) -> Option<Stmt> {
        cx.next(self, node);
        None
    }

    fn expression(&mut self, node: &mut Expr, cx: &mut Cx<'_, Self>) -> Option<Expr> {
        dispatch_expression(self, node, cx)
    }

    fn identifier(&mut self, node: &mut Expr, cx: &mut Cx<'_, Self>) -> Option<Expr> {
        None
    }

    fn literal(&mut self, node: &mut Expr, cx: &mut Cx<'_, Self>) -> Option<Expr> {
        None
    }

    fn call_expression(&mut self, node: &mut Expr, cx: &mut Cx<'_, Self>) -> Option<Expr> {
        cx.next(self, node);
        None
    }

    fn member_expression(&mut self, node: &mut Expr, cx: &mut Cx<'_, Self>) -> Option<Expr> {
        cx.next(self, node);
        None
    }

    fn arrow_function(&mut self, node: &mut Expr, cx: &mut Cx<'_, Self>) -> Option<Expr> {
        cx.next(self, node);
        None
    }

    fn function_expression(&mut self, node: &mut Expr, cx: &mut Cx<'_, Self>) -> Option<Expr> {
        cx.next(self, node);
        None
    }

    fn object_expression(&mut self, node: &mut Expr, cx: &mut Cx<'_, Self>) -> Option<Expr> {
        cx.next(self, node);
        None
    }

    fn array_expression(&mut self, node: &mut Expr, cx: &mut Cx<'_, Self>) -> Option<Expr> {
        cx.next(self, node);
        None
    }

    fn property(&mut self, node: &mut Prop, cx: &mut Cx<'_, Self>) -> Option<Prop> {
        cx.next(self, node);
        None
    }

    fn pattern(&mut self, node: &mut Pat, cx: &mut Cx<'_, Self>) -> Option<Pat> {
        cx.next(self, node);
        None
    }

    fn class_member(&mut self, node: &mut ClassMember, cx: &mut Cx<'_, Self>) -> Option<ClassMember> {
        cx.next(self, node);
        None
    }

    fn jsx_element(&mut self, node: &mut JsxElement, cx: &mut Cx<'_, Self>) -> Option<JsxElement> {
        cx.next(self, node);
        None
    }
}

/// Route a statement to its kind-specific handler.
pub fn dispatch_statement<V: Visitor>(visitor: &mut V, node: &mut Stmt, cx: &mut Cx<'_, V>) -> Option<Stmt> {
    match node.kind {
        StmtKind::Import(_) => visitor.import_declaration(node, cx),
        StmtKind::ExportDefault(_) => visitor.export_default_declaration(node, cx),
        StmtKind::ExportNamed(_) => visitor.export_named_declaration(node, cx),
        StmtKind::Var(_) => visitor.variable_declaration(node, cx),
        StmtKind::Function(_) => visitor.function_declaration(node, cx),
        StmtKind::Class(_) => visitor.class_declaration(node, cx),
        StmtKind::Return(_) => visitor.return_statement(node, cx),
        StmtKind::Expr(_) => visitor.expression_statement(node, cx),
        StmtKind::TsInterface(_) => visitor.ts_interface(node, cx),
        StmtKind::TsModule(_) => visitor.ts_module(node, cx),
        _ => {
            cx.next(visitor, node);
            None
        }
    }
}

/// Route an expression to its kind-specific handler.
pub fn dispatch_expression<V: Visitor>(visitor: &mut V, node: &mut Expr, cx: &mut Cx<'_, V>) -> Option<Expr> {
    match node.kind {
        ExprKind::Ident(_) => visitor.identifier(node, cx),
        ExprKind::Lit(_) => visitor.literal(node, cx),
        ExprKind::Call(_) => visitor.call_expression(node, cx),
        ExprKind::Member { .. } => visitor.member_expression(node, cx),
        ExprKind::Arrow(_) => visitor.arrow_function(node, cx),
        ExprKind::Function(_) => visitor.function_expression(node, cx),
        ExprKind::Object(_) => visitor.object_expression(node, cx),
        ExprKind::Array(_) => visitor.array_expression(node, cx),
        _ => {
            cx.next(visitor, node);
            None
        }
    }
}

/// Walk `node` depth-first, applying the replacements `visitor` returns.
pub fn walk<N, V>(node: &mut N, state: V::State, visitor: &mut V)
where
    N: Walk + ?Sized,
    V: Visitor,
{
    let stopped = Cell::new(false);
    node.visit(visitor, state, &stopped);
}

// ── traversal ────────────────────────────────────────────────────────────────

/// A node the walker can enter.
pub trait Walk {
    /// Call the visitor's handler for this node.
    fn visit<V: Visitor>(&mut self, visitor: &mut V, state: V::State, stopped: &Cell<bool>);

    /// Visit every direct child.
    fn walk_children<V: Visitor>(&mut self, visitor: &mut V, state: V::State, stopped: &Cell<bool>);
}

macro_rules! replaceable {
    ($ty:ty, $handler:ident) => {
        impl Walk for $ty {
            fn visit<V: Visitor>(&mut self, visitor: &mut V, state: V::State, stopped: &Cell<bool>) {
                if stopped.get() {
                    return;
                }
                let mut cx = Context { state, stopped };
                if let Some(replacement) = visitor.$handler(self, &mut cx) {
                    *self = replacement;
                }
            }

            fn walk_children<V: Visitor>(&mut self, visitor: &mut V, state: V::State, stopped: &Cell<bool>) {
                Children { visitor, state, stopped }.$handler(self);
            }
        }
    };
}

replaceable!(Stmt, statement);
replaceable!(Expr, expression);
replaceable!(Prop, property);
replaceable!(Pat, pattern);
replaceable!(ClassMember, class_member);
replaceable!(JsxElement, jsx_element);

impl Walk for Program {
    fn visit<V: Visitor>(&mut self, visitor: &mut V, state: V::State, stopped: &Cell<bool>) {
        if stopped.get() {
            return;
        }
        let mut cx = Context { state, stopped };
        visitor.program(self, &mut cx);
    }

    fn walk_children<V: Visitor>(&mut self, visitor: &mut V, state: V::State, stopped: &Cell<bool>) {
        Children { visitor, state, stopped }.stmts(&mut self.body);
    }
}

impl Walk for Block {
    fn visit<V: Visitor>(&mut self, visitor: &mut V, state: V::State, stopped: &Cell<bool>) {
        self.walk_children(visitor, state, stopped);
    }

    fn walk_children<V: Visitor>(&mut self, visitor: &mut V, state: V::State, stopped: &Cell<bool>) {
        Children { visitor, state, stopped }.stmts(&mut self.body);
    }
}

/// Visits the children of one node with a fixed state.
struct Children<'v, 'w, V: Visitor> {
    visitor: &'v mut V,
    state: V::State,
    stopped: &'w Cell<bool>,
}

impl<V: Visitor> Children<'_, '_, V> {
    fn node<N: Walk>(&mut self, node: &mut N) {
        node.visit(self.visitor, self.state.clone(), self.stopped);
    }

    fn stmts(&mut self, stmts: &mut [Stmt]) {
        for stmt in stmts {
            self.node(stmt);
        }
    }

    fn exprs(&mut self, exprs: &mut [Expr]) {
        for expr in exprs {
            self.node(expr);
        }
    }

    fn block(&mut self, block: &mut Block) {
        self.stmts(&mut block.body);
    }

    fn statement(&mut self, stmt: &mut Stmt) {
        match &mut stmt.kind {
            StmtKind::Import(_)
            | StmtKind::ExportAll { .. }
            | StmtKind::Break(_)
            | StmtKind::Continue(_)
            | StmtKind::Empty
            | StmtKind::Debugger
            | StmtKind::TsInterface(_)
            | StmtKind::TsTypeAlias(_)
            | StmtKind::Raw(_) => {}
            StmtKind::ExportNamed(export) => {
                if let Some(decl) = &mut export.decl {
                    self.node(decl.as_mut());
                }
            }
            StmtKind::ExportDefault(e) | StmtKind::Expr(e) | StmtKind::Throw(e) => self.node(e),
            StmtKind::Var(decl) => self.var(decl),
            StmtKind::Function(func) => self.function(func),
            StmtKind::Class(class) => self.class(class),
            StmtKind::Block(block) => self.block(block),
            StmtKind::If { test, cons, alt } => {
                self.node(test);
                self.node(cons.as_mut());
                if let Some(alt) = alt {
                    self.node(alt.as_mut());
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
                    self.node(test);
                }
                if let Some(update) = update {
                    self.node(update);
                }
                self.node(body.as_mut());
            }
            StmtKind::ForIn { left, right, body } | StmtKind::ForOf { left, right, body, .. } => {
                self.for_head(left);
                self.node(right);
                self.node(body.as_mut());
            }
            StmtKind::While { test, body } | StmtKind::DoWhile { body, test } => {
                self.node(test);
                self.node(body.as_mut());
            }
            StmtKind::Return(arg) => {
                if let Some(arg) = arg {
                    self.node(arg);
                }
            }
            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => {
                self.block(block);
                if let Some(handler) = handler {
                    if let Some(param) = &mut handler.param {
                        self.node(param);
                    }
                    self.block(&mut handler.body);
                }
                if let Some(finalizer) = finalizer {
                    self.block(finalizer);
                }
            }
            StmtKind::Switch {
                discriminant,
                cases,
            } => {
                self.node(discriminant);
                for case in cases {
                    if let Some(test) = &mut case.test {
                        self.node(test);
                    }
                    self.stmts(&mut case.body);
                }
            }
            StmtKind::Labeled { body, .. } => self.node(body.as_mut()),
            StmtKind::TsModule(module) => {
                if let Some(body) = &mut module.body {
                    self.block(body);
                }
            }
        }
    }

    fn for_head(&mut self, head: &mut ForHead) {
        match head {
            ForHead::Var(decl) => self.var(decl),
            ForHead::Expr(e) => self.node(e),
        }
    }

    fn var(&mut self, decl: &mut VarDecl) {
        for d in &mut decl.declarators {
            self.node(&mut d.id);
            if let Some(init) = &mut d.init {
                self.node(init);
            }
        }
    }

    fn function(&mut self, func: &mut Function) {
        for param in &mut func.params {
            self.node(&mut param.pat);
        }
        if let Some(body) = &mut func.body {
            self.block(body);
        }
    }

    fn class(&mut self, class: &mut Class) {
        self.exprs(&mut class.decorators);
        if let Some(sup) = &mut class.super_class {
            self.node(sup.as_mut());
        }
        for member in &mut class.body {
            self.node(member);
        }
    }

    fn key(&mut self, key: &mut PropKey) {
        if let PropKey::Computed(e) = key {
            self.node(e.as_mut());
        }
    }

    fn expression(&mut self, expr: &mut Expr) {
        match &mut expr.kind {
            ExprKind::Ident(_)
            | ExprKind::PrivateName(_)
            | ExprKind::Lit(_)
            | ExprKind::This
            | ExprKind::Super
            | ExprKind::MetaProp { .. } => {}
            ExprKind::Template(t) => self.exprs(&mut t.exprs),
            ExprKind::TaggedTemplate { tag, quasi, .. } => {
                self.node(tag.as_mut());
                self.exprs(&mut quasi.exprs);
            }
            ExprKind::Array(elements) => {
                for e in elements.iter_mut().flatten() {
                    self.node(e);
                }
            }
            ExprKind::Object(props) => {
                for prop in props {
                    self.node(prop);
                }
            }
            ExprKind::Function(func) => self.function(func),
            ExprKind::Arrow(arrow) => {
                for param in &mut arrow.params {
                    self.node(&mut param.pat);
                }
                match &mut arrow.body {
                    ArrowBody::Expr(e) => self.node(e.as_mut()),
                    ArrowBody::Block(b) => self.block(b),
                }
            }
            ExprKind::Class(class) => self.class(class),
            ExprKind::Call(call) | ExprKind::New(call) => {
                self.node(call.callee.as_mut());
                self.exprs(&mut call.args);
            }
            ExprKind::Member { object, prop, .. } => {
                self.node(object.as_mut());
                if let MemberProp::Computed(e) = prop {
                    self.node(e.as_mut());
                }
            }
            ExprKind::Unary { arg, .. } | ExprKind::Update { arg, .. } => self.node(arg.as_mut()),
            ExprKind::Binary { left, right, .. } => {
                self.node(left.as_mut());
                self.node(right.as_mut());
            }
            ExprKind::Assign { target, value, .. } => {
                self.node(target.as_mut());
                self.node(value.as_mut());
            }
            ExprKind::Cond { test, cons, alt } => {
                self.node(test.as_mut());
                self.node(cons.as_mut());
                self.node(alt.as_mut());
            }
            ExprKind::Seq(exprs) => self.exprs(exprs),
            ExprKind::Paren(e)
            | ExprKind::Spread(e)
            | ExprKind::Await(e)
            | ExprKind::TsNonNull(e)
            | ExprKind::TsAs { expr: e, .. }
            | ExprKind::TsSatisfies { expr: e, .. } => self.node(e.as_mut()),
            ExprKind::Yield { arg, .. } => {
                if let Some(arg) = arg {
                    self.node(arg.as_mut());
                }
            }
            ExprKind::Jsx(el) => self.node(el.as_mut()),
        }
    }

    fn property(&mut self, prop: &mut Prop) {
        match &mut prop.kind {
            PropKind::KeyValue { key, value, .. } => {
                self.key(key);
                self.node(value);
            }
            PropKind::Method { key, func, .. } => {
                self.key(key);
                self.function(func);
            }
            PropKind::Spread(e) => self.node(e),
        }
    }

    fn pattern(&mut self, pat: &mut Pat) {
        match &mut pat.kind {
            PatKind::Ident { .. } => {}
            PatKind::Object { props, .. } => {
                for prop in props {
                    match prop {
                        ObjectPatProp::KeyValue { key, value, .. } => {
                            self.key(key);
                            self.node(value);
                        }
                        ObjectPatProp::Rest(p) => self.node(p),
                    }
                }
            }
            PatKind::Array { elements, .. } => {
                for p in elements.iter_mut().flatten() {
                    self.node(p);
                }
            }
            PatKind::Assign { target, default } => {
                self.node(target.as_mut());
                self.node(default.as_mut());
            }
            PatKind::Rest { arg, .. } => self.node(arg.as_mut()),
            PatKind::Expr(e) => self.node(e.as_mut()),
        }
    }

    fn class_member(&mut self, member: &mut ClassMember) {
        self.exprs(&mut member.decorators);
        match &mut member.kind {
            ClassMemberKind::Method { key, func, .. } => {
                self.key(key);
                self.function(func);
            }
            ClassMemberKind::Property { key, value, .. } => {
                self.key(key);
                if let Some(value) = value {
                    self.node(value);
                }
            }
            ClassMemberKind::StaticBlock(block) => self.block(block),
            ClassMemberKind::Raw(_) => {}
        }
    }

    fn jsx_element(&mut self, el: &mut JsxElement) {
        for attr in &mut el.attrs {
            match attr {
                JsxAttr::Attr { value, .. } => match value {
                    Some(JsxAttrValue::Expr(e)) => self.node(e),
                    Some(JsxAttrValue::Element(el)) => self.node(el.as_mut()),
                    Some(JsxAttrValue::Str(_)) | None => {}
                },
                JsxAttr::Spread(e) => self.node(e),
            }
        }
        for child in &mut el.children {
            match &mut child.kind {
                JsxChildKind::Text(_) | JsxChildKind::Expr(None) => {}
                JsxChildKind::Expr(Some(e)) | JsxChildKind::Spread(e) => self.node(e),
                JsxChildKind::Element(el) => self.node(el.as_mut()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::parser::{parse_detached_expression, parse_program};
    use super::*;

    #[derive(Default)]
    struct FirstCall(Option<String>);

    impl Visitor for FirstCall {
        type State = ();

        fn call_expression(&mut self, node: &mut Expr, cx: &mut Cx<'_, Self>) -> Option<Expr> {
            if let ExprKind::Call(call) = &node.kind {
                if self.0.is_none() {
                    self.0 = call.callee.as_ident().map(str::to_owned);
                }
            }
            cx.next(self, node);
            None
        }
    }

    #[test]
    fn finds_calls_in_source_order() {
        let mut program = parse_program("export const user = sqliteTable('user', { id: text('id') });")
            .unwrap()
            .program;
        let mut visitor = FirstCall::default();
        walk(&mut program, (), &mut visitor);
        assert_eq!(visitor.0.as_deref(), Some("sqliteTable"));
    }

    struct WrapSuspense;

    impl Visitor for WrapSuspense {
        type State = ();

        fn jsx_element(&mut self, node: &mut JsxElement, cx: &mut Cx<'_, Self>) -> Option<JsxElement> {
            if !node.is_named("Suspense") {
                cx.next(self, node);
                return None;
            }
            let ExprKind::Jsx(mut provider) = parse_detached_expression("<Provider></Provider>").ok()?.kind else {
                return None;
            };
            provider.children = vec![JsxChild::element(node.clone())];
            Some(*provider)
        }
    }

    #[test]
    fn replacement_nodes_are_spliced_in() {
        let mut expr = parse_detached_expression("<Router><Suspense>{x}</Suspense></Router>").unwrap();
        walk(&mut expr, (), &mut WrapSuspense);
        let ExprKind::Jsx(router) = &expr.kind else { panic!("not jsx") };
        let JsxChildKind::Element(provider) = &router.children[0].kind else { panic!("not element") };
        assert!(provider.is_named("Provider"));
        let JsxChildKind::Element(suspense) = &provider.children[0].kind else { panic!("not element") };
        assert!(suspense.is_named("Suspense"));
    }

    /// Records identifiers together with the depth of nested arrows.
    #[derive(Default)]
    struct Depths(Vec<(String, usize)>);

    impl Visitor for Depths {
        type State = usize;

        fn arrow_function(&mut self, node: &mut Expr, cx: &mut Cx<'_, Self>) -> Option<Expr> {
            let depth = cx.state() + 1;
            cx.next_with(self, node, depth);
            None
        }

        fn identifier(&mut self, node: &mut Expr, cx: &mut Cx<'_, Self>) -> Option<Expr> {
            if let Some(name) = node.as_ident() {
                self.0.push((name.to_owned(), *cx.state()));
                if name == "stop" {
                    cx.stop();
                }
            }
            None
        }
    }

    #[test]
    fn state_flows_down_and_stop_ends_walk() {
        let mut expr = parse_detached_expression("f(a, () => g(b, () => stop), c)").unwrap();
        let mut visitor = Depths::default();
        walk(&mut expr, 0, &mut visitor);
        assert_eq!(
            visitor.0,
            vec![
                ("f".to_owned(), 0),
                ("a".to_owned(), 0),
                ("g".to_owned(), 1),
                ("b".to_owned(), 1),
                ("stop".to_owned(), 2),
            ]
        );
    }
}

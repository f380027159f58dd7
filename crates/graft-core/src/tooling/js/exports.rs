//! Default and named exports.

use super::ast::*;
use crate::tooling::error::MutationError;

/// The value behind `export default`.
#[derive(Debug)]
pub struct DefaultExport<'a> {
    /// Comments attached to the `export default` statement.
    pub comments: &'a mut Vec<Comment>,
    /// The exported value, after following `export default name` to the
    /// top-level declaration of `name`.
    pub value: &'a mut Expr,
    /// Whether the export was created from the fallback.
    pub is_fallback: bool,
}

/// Index of the top-level declarator binding `name` with an initializer.
fn declarator_position(program: &Program, name: &str) -> Option<(usize, usize)> {
    program.body.iter().enumerate().find_map(|(i, stmt)| {
        let decl = match &stmt.kind {
            StmtKind::Var(decl) => decl,
            StmtKind::ExportNamed(ExportNamed { decl: Some(inner), .. }) => match &inner.kind {
                StmtKind::Var(decl) => decl,
                _ => return None,
            },
            _ => return None,
        };
        decl.declarators
            .iter()
            .position(|d| d.name() == Some(name) && d.init.is_some())
            .map(|j| (i, j))
    })
}

fn var_decl_mut(stmt: &mut Stmt) -> Option<&mut VarDecl> {
    match &mut stmt.kind {
        StmtKind::Var(decl) => Some(decl),
        StmtKind::ExportNamed(ExportNamed { decl: Some(inner), .. }) => match &mut inner.kind {
            StmtKind::Var(decl) => Some(decl),
            _ => None,
        },
        _ => None,
    }
}

/// Borrow two distinct statements at once.
fn pair_mut(body: &mut [Stmt], a: usize, b: usize) -> (&mut Stmt, &mut Stmt) {
    if a < b {
        let (head, tail) = body.split_at_mut(b);
        (&mut head[a], &mut tail[0])
    } else {
        let (head, tail) = body.split_at_mut(a);
        (&mut tail[0], &mut head[b])
    }
}

/// The existing default export, or `export default <fallback>` appended to
/// the program. An existing value is never replaced.
pub fn default_export(program: &mut Program, fallback: Expr) -> DefaultExport<'_> {
    let existing = program
        .body
        .iter()
        .position(|s| matches!(s.kind, StmtKind::ExportDefault(_)));
    let (at, is_fallback) = match existing {
        Some(at) => (at, false),
        None => {
            program.body.push(Stmt::new(StmtKind::ExportDefault(fallback)));
            (program.body.len() - 1, true)
        }
    };

    let target = match &program.body[at].kind {
        StmtKind::ExportDefault(e) => e.as_ident().and_then(|name| declarator_position(program, name)),
        _ => None,
    };

    if let Some((decl_at, index)) = target.filter(|(decl_at, _)| *decl_at != at) {
        let (export, decl_stmt) = pair_mut(&mut program.body, at, decl_at);
        return match var_decl_mut(decl_stmt).and_then(|d| d.declarators[index].init.as_mut()) {
            Some(value) => DefaultExport {
                comments: &mut export.comments,
                value,
                is_fallback,
            },
            None => unreachable!("declarator_position only matches initialized declarators"),
        };
    }

    let Stmt { kind, comments, .. } = &mut program.body[at];
    match kind {
        StmtKind::ExportDefault(value) => DefaultExport {
            comments,
            value,
            is_fallback,
        },
        _ => unreachable!("position matched a default export"),
    }
}

/// The default export as an object literal, looking through `satisfies`,
/// `as` and parentheses. An empty object is exported when there is none.
pub fn object_default_export(program: &mut Program) -> Result<DefaultExport<'_>, MutationError> {
    let export = default_export(program, Expr::object(Vec::new()));
    let DefaultExport {
        comments,
        value,
        is_fallback,
    } = export;
    let value = value.unwrap_ts_mut();
    if !matches!(value.kind, ExprKind::Object(_)) {
        return Err(MutationError::expected(
            "default export to be an object expression",
        ));
    }
    Ok(DefaultExport {
        comments,
        value,
        is_fallback,
    })
}

/// Whether `stmt` declares `name` at the top level.
fn declares(stmt: &Stmt, name: &str) -> bool {
    match &stmt.kind {
        StmtKind::Var(decl) => decl.declarators.iter().any(|d| d.name() == Some(name)),
        StmtKind::Function(f) => f.name.as_deref() == Some(name),
        StmtKind::Class(c) => c.name.as_deref() == Some(name),
        StmtKind::ExportNamed(ExportNamed { decl: Some(inner), .. }) => declares(inner, name),
        _ => false,
    }
}

/// `export <declaration of name>`.
///
/// A top-level declaration of `name` is exported in place (wrapping it in
/// `export` when needed); otherwise `export <fallback>` is appended.
/// Returns the `export` statement.
pub fn named_export<'a>(program: &'a mut Program, name: &str, fallback: Stmt) -> &'a mut Stmt {
    let at = match program.body.iter().position(|s| declares(s, name)) {
        Some(at) => at,
        None => {
            program.body.push(fallback);
            program.body.len() - 1
        }
    };
    let stmt = &mut program.body[at];
    if !matches!(stmt.kind, StmtKind::ExportNamed(_)) {
        let comments = std::mem::take(&mut stmt.comments);
        let inner = std::mem::replace(stmt, Stmt::new(StmtKind::Empty));
        *stmt = Stmt {
            kind: StmtKind::ExportNamed(ExportNamed {
                decl: Some(Box::new(inner)),
                specifiers: Vec::new(),
                source: None,
                type_only: false,
            }),
            comments,
            trailing: Vec::new(),
            loc: Loc::NONE,
        };
    }
    stmt
}

//! Variable declarations.

use super::ast::*;

/// `kind name = init;`
pub fn declaration(kind: VarKind, name: &str, init: Expr) -> Stmt {
    Stmt::new(StmtKind::Var(VarDecl {
        kind,
        declarators: vec![Declarator {
            id: Pat::ident(name),
            init: Some(init),
        }],
        declare: false,
    }))
}

fn var_decl_mut(stmt: &mut Stmt) -> Option<&mut VarDecl> {
    match &mut stmt.kind {
        StmtKind::Var(decl) => Some(decl),
        StmtKind::ExportNamed(ExportNamed { decl: Some(inner), .. }) => var_decl_mut(inner),
        _ => None,
    }
}

/// Top-level declarator binding `name`, exported or not.
pub fn find_declarator<'a>(program: &'a mut Program, name: &str) -> Option<&'a mut Declarator> {
    program
        .body
        .iter_mut()
        .filter_map(var_decl_mut)
        .flat_map(|decl| decl.declarators.iter_mut())
        .find(|d| d.name() == Some(name))
}

/// Initializer of the top-level declaration of `name`.
pub fn initializer<'a>(program: &'a mut Program, name: &str) -> Option<&'a mut Expr> {
    find_declarator(program, name).and_then(|d| d.init.as_mut())
}

#[cfg(test)]
mod tests {
    use super::super::parse_script;
    use super::*;

    #[test]
    fn finds_exported_and_plain_declarators() {
        let mut doc = parse_script("const a = 1;\nexport const b = 2, c = 3;\n").unwrap();
        assert!(find_declarator(&mut doc.ast, "a").is_some());
        assert!(find_declarator(&mut doc.ast, "c").is_some());
        assert!(find_declarator(&mut doc.ast, "d").is_none());
    }

    #[test]
    fn declarations_print_with_document_style() {
        let mut doc = parse_script("import x from 'x';\n").unwrap();
        doc.ast.body.push(declaration(VarKind::Const, "language_tag", Expr::string("en")));
        assert_eq!(
            doc.generate(),
            "import x from 'x';\n\nconst language_tag = 'en';\n"
        );
    }
}

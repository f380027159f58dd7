//! Import declarations.
//!
//! Bindings from one module source are merged into a single declaration and
//! deduplicated by local name. New declarations go after the last existing
//! import.

use super::ast::*;

fn from_source<'a>(program: &'a Program, source: &'a str) -> impl Iterator<Item = &'a ImportDecl> + 'a {
    program.body.iter().filter_map(move |stmt| match &stmt.kind {
        StmtKind::Import(decl) if decl.source.value == source => Some(decl),
        _ => None,
    })
}

fn is_bound(program: &Program, source: &str, local: &str) -> bool {
    from_source(program, source).any(|decl| decl.specifiers.iter().any(|s| s.local() == local))
}

/// Insert `decl` after the last import and return it.
fn insert(program: &mut Program, decl: ImportDecl) -> &mut ImportDecl {
    let at = program
        .body
        .iter()
        .rposition(Stmt::is_import)
        .map_or(0, |i| i + 1);
    program.body.insert(at, Stmt::new(StmtKind::Import(decl)));
    match &mut program.body[at].kind {
        StmtKind::Import(decl) => decl,
        _ => unreachable!("just inserted an import"),
    }
}

/// First value import from `source`.
pub fn find<'a>(program: &'a Program, source: &str) -> Option<&'a ImportDecl> {
    program.body.iter().find_map(|stmt| match &stmt.kind {
        StmtKind::Import(decl) if decl.source.value == source && !decl.type_only => Some(decl),
        _ => None,
    })
}

/// Local name under which `imported` is bound from `source`.
pub fn local_name<'a>(program: &'a Program, source: &'a str, imported: &str) -> Option<&'a str> {
    from_source(program, source).find_map(|decl| {
        decl.specifiers.iter().find_map(|s| match s {
            ImportSpecifier::Named {
                imported: name,
                local,
                ..
            } if name == imported => Some(local.as_str()),
            _ => None,
        })
    })
}

/// `import { imported as local, .. } from "source"`.
///
/// `bindings` are `(imported, local)` pairs. Bindings whose local name is
/// already imported from `source` are skipped. When a declaration from
/// `source` with the same `type_only` flag and no namespace binding exists,
/// the remaining bindings are appended to it. Nothing is added when every
/// binding is already imported.
pub fn add_named(program: &mut Program, source: &str, bindings: &[(&str, &str)], type_only: bool) {
    let missing: Vec<ImportSpecifier> = bindings
        .iter()
        .filter(|(_, local)| !is_bound(program, source, local))
        .map(|(imported, local)| ImportSpecifier::Named {
            imported: (*imported).to_owned(),
            local: (*local).to_owned(),
            type_only: false,
        })
        .collect();
    if missing.is_empty() {
        return;
    }

    let existing = program.body.iter().position(|stmt| match &stmt.kind {
        StmtKind::Import(decl) => {
            decl.source.value == source
                && decl.type_only == type_only
                && !decl
                    .specifiers
                    .iter()
                    .any(|s| matches!(s, ImportSpecifier::Namespace { .. }))
        }
        _ => false,
    });

    if let Some(at) = existing {
        if let StmtKind::Import(decl) = &mut program.body[at].kind {
            decl.specifiers.extend(missing);
        }
        return;
    }
    insert(
        program,
        ImportDecl {
            specifiers: missing,
            source: Str::new(source),
            type_only,
        },
    );
}

/// `import local from "source"`, unless `local` is already imported from
/// `source`.
pub fn add_default(program: &mut Program, source: &str, local: &str) {
    if is_bound(program, source, local) {
        return;
    }
    insert(
        program,
        ImportDecl {
            specifiers: vec![ImportSpecifier::Default {
                local: local.to_owned(),
            }],
            source: Str::new(source),
            type_only: false,
        },
    );
}

/// `import * as local from "source"`, unless `local` is already imported
/// from `source`.
pub fn add_namespace(program: &mut Program, source: &str, local: &str) {
    if is_bound(program, source, local) {
        return;
    }
    insert(
        program,
        ImportDecl {
            specifiers: vec![ImportSpecifier::Namespace {
                local: local.to_owned(),
            }],
            source: Str::new(source),
            type_only: false,
        },
    );
}

/// `import "source"`, unless `source` is imported in any form.
pub fn add_empty(program: &mut Program, source: &str) {
    if from_source(program, source).next().is_some() {
        return;
    }
    insert(
        program,
        ImportDecl {
            specifiers: Vec::new(),
            source: Str::new(source),
            type_only: false,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::super::parse_script;
    use super::*;

    #[test]
    fn named_bindings_merge_into_one_declaration() {
        let mut doc = parse_script("").unwrap();
        add_named(&mut doc.ast, "x", &[("a", "a"), ("b", "b")], false);
        add_named(&mut doc.ast, "x", &[("b", "b"), ("c", "c")], false);
        assert_eq!(doc.ast.body.len(), 1);
        assert_eq!(doc.generate(), "import { a, b, c } from \"x\";\n");
    }

    #[test]
    fn existing_import_is_extended_in_place() {
        let mut doc = parse_script("import { a } from 'x';\n\nconsole.log(a);\n").unwrap();
        add_named(&mut doc.ast, "x", &[("b", "renamed")], false);
        assert_eq!(
            doc.generate(),
            "import { a, b as renamed } from 'x';\n\nconsole.log(a);\n"
        );
    }

    #[test]
    fn new_imports_follow_the_last_import() {
        let mut doc = parse_script("import a from 'a';\nimport b from 'b';\n\nexport default {};\n").unwrap();
        add_default(&mut doc.ast, "c", "c");
        add_default(&mut doc.ast, "c", "c");
        assert_eq!(
            doc.generate(),
            "import a from 'a';\nimport b from 'b';\nimport c from 'c';\n\nexport default {};\n"
        );
    }

    #[test]
    fn type_only_imports_stay_separate() {
        let mut doc = parse_script("import { a } from 'x';").unwrap();
        add_named(&mut doc.ast, "x", &[("Config", "Config")], true);
        assert_eq!(doc.ast.body.len(), 2);
        assert!(find(&doc.ast, "x").is_some_and(|d| !d.type_only));
    }

    #[test]
    fn bound_names_add_no_declaration() {
        let src = "import { Config } from 'x';\n";
        let mut doc = parse_script(src).unwrap();
        add_named(&mut doc.ast, "x", &[("Config", "Config")], true);
        assert_eq!(doc.ast.body.len(), 1);
        assert_eq!(doc.generate(), src);

        let src = "import * as x from 'x';\n";
        let mut doc = parse_script(src).unwrap();
        add_named(&mut doc.ast, "x", &[("x", "x")], false);
        assert_eq!(doc.ast.body.len(), 1);
        assert_eq!(doc.generate(), src);
    }

    #[test]
    fn namespace_and_side_effect_imports() {
        let mut doc = parse_script("").unwrap();
        add_namespace(&mut doc.ast, "~/lib/i18n", "i18n");
        add_empty(&mut doc.ast, "./app.css");
        add_empty(&mut doc.ast, "./app.css");
        assert_eq!(
            doc.generate(),
            "import * as i18n from \"~/lib/i18n\";\nimport \"./app.css\";\n"
        );
    }

    #[test]
    fn local_name_follows_aliases() {
        let doc = parse_script("import { createMiddleware as cm } from '@solidjs/start/middleware';").unwrap();
        assert_eq!(
            local_name(&doc.ast, "@solidjs/start/middleware", "createMiddleware"),
            Some("cm")
        );
    }
}

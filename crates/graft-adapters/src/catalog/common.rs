//! Edits shared by several addons.

use graft_core::{
    application::RunContext,
    domain::{DomainError, KitInfo},
    error::GraftResult,
    tooling::{
        EditResult, MutationError,
        js::{
            self, Block, Expr, ExprKind, JsxAttr, JsxAttrValue, JsxChild, JsxChildKind, JsxElement, JsxName,
            Program, Stmt, StmtKind, Str, array, common, exports, functions, imports, object,
        },
    },
};

/// Framework layout of the project, for addons that only run on SolidStart.
pub(crate) fn require_kit(cx: &RunContext<'_>, addon: &str) -> GraftResult<KitInfo> {
    cx.workspace().kit().cloned().ok_or_else(|| {
        DomainError::UnsupportedProject {
            addon: addon.to_owned(),
            reason: "Requires SolidStart".into(),
        }
        .into()
    })
}

/// `ts` in TypeScript projects, `js` otherwise.
pub(crate) const fn pick(typescript: bool, ts: &'static str, js: &'static str) -> &'static str {
    if typescript { ts } else { js }
}

/// Fill the `%ALIAS%` placeholders of a bundled template.
pub(crate) fn render(template: &str, kit: &KitInfo) -> String {
    let alias = kit.import_path("").trim_end_matches('/').to_owned();
    template.replace("%ALIAS%", &alias)
}

/// The object passed to `defineConfig(..)` in `app.config.*`, created when
/// the file is empty.
pub(crate) fn app_config(program: &mut Program) -> Result<&mut Expr, MutationError> {
    let export = exports::default_export(program, functions::call("defineConfig", Vec::new()));
    let config = functions::argument_by_index(export.value, 0, object::create_empty())?;
    if !matches!(config.unwrap_ts().kind, ExprKind::Object(_)) {
        return Err(MutationError::expected("`defineConfig` to receive an object"));
    }
    Ok(config)
}

/// Register `eslint-config-prettier` in a flat ESLint config.
///
/// Both `export default [..]` and `export default tseslint.config(..)` are
/// extended; any other shape is left as it is.
pub(crate) fn add_eslint_config_prettier(content: &str) -> EditResult<String> {
    let mut doc = js::parse_script(content)?;
    let export = exports::default_export(&mut doc.ast, array::create_empty());
    let config = export.value.unwrap_ts_mut();
    let prettier = Expr::ident("prettier");

    let already = common::has_node(&*config, &prettier);
    if matches!(config.kind, ExprKind::Array(_)) {
        if !already {
            array::push(config, prettier)?;
        }
    } else if let ExprKind::Call(call) = &mut config.kind {
        if !already {
            call.args.push(prettier);
        }
    } else {
        return Ok(content.to_owned());
    }

    imports::add_default(&mut doc.ast, "eslint-config-prettier", "prettier");
    Ok(doc.generate())
}

// ── demo pages ──────────────────────────────────────────────────────────────

/// Link `/demo/<path>` from the JSX demo index page, once.
///
/// The page's default export must be a function component returning JSX.
/// An empty page gets `export default function Demo()` returning `<main>`.
pub(crate) fn add_demo_link(content: &str, path: &str) -> EditResult<String> {
    let link = demo_link(path);
    let mut doc = js::parse_script(content)?;

    let body = demo_component_body(&mut doc.ast)?;
    let at = match body.iter().position(|s| matches!(s.kind, StmtKind::Return(_))) {
        Some(at) => at,
        None => {
            let main = common::expression_from_string("(<main></main>)")?;
            body.push(Stmt::new(StmtKind::Return(Some(main))));
            body.len() - 1
        }
    };
    let element = match &mut body[at].kind {
        StmtKind::Return(Some(argument)) => match &mut argument.unwrap_ts_mut().kind {
            ExprKind::Jsx(element) => element,
            _ => return Err(not_a_component().into()),
        },
        _ => return Err(not_a_component().into()),
    };

    let linked = element
        .children
        .iter()
        .any(|child| matches!(&child.kind, JsxChildKind::Element(el) if **el == link));
    if !linked {
        element.children.push(JsxChild::element(link));
    }
    Ok(doc.generate())
}

fn not_a_component() -> MutationError {
    MutationError::expected("the demo page to default-export a function component returning JSX")
}

/// `<a href="/demo/<path>"><path></a>`
fn demo_link(path: &str) -> JsxElement {
    let href = JsxAttrValue::Str(Str::new(format!("/demo/{path}")));
    JsxElement::new(
        JsxName::new("a"),
        vec![JsxAttr::new("href", Some(href))],
        vec![JsxChild::text(path)],
    )
}

fn demo_component_body(program: &mut Program) -> EditResult<&mut Vec<Stmt>> {
    let at = match program
        .body
        .iter()
        .position(|s| matches!(s.kind, StmtKind::ExportDefault(_)))
    {
        Some(at) => at,
        None => {
            program
                .body
                .push(common::statement_from_string("export default function Demo() {}")?);
            program.body.len() - 1
        }
    };
    match &mut program.body[at].kind {
        StmtKind::ExportDefault(Expr {
            kind: ExprKind::Function(func),
            ..
        }) => Ok(&mut func.body.get_or_insert_with(|| Block::new(Vec::new())).body),
        _ => Err(not_a_component().into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eslint_array_config_gets_prettier_once() {
        let src = "import js from \"@eslint/js\";\n\nexport default [js.configs.recommended];\n";
        let once = add_eslint_config_prettier(src).unwrap();
        assert!(once.contains("import prettier from \"eslint-config-prettier\";"));
        assert!(once.contains("[js.configs.recommended, prettier]"));
        assert_eq!(add_eslint_config_prettier(&once).unwrap(), once);
    }

    #[test]
    fn eslint_call_config_gets_an_argument() {
        let src = "export default tseslint.config(js.configs.recommended);\n";
        let out = add_eslint_config_prettier(src).unwrap();
        assert!(out.contains("tseslint.config(js.configs.recommended, prettier)"));
    }

    #[test]
    fn other_eslint_shapes_are_left_alone() {
        let src = "export default config;\n";
        assert_eq!(add_eslint_config_prettier(src).unwrap(), src);
    }

    #[test]
    fn demo_page_is_created_and_linked_once() {
        let page = add_demo_link("", "lucia").unwrap();
        assert!(page.contains("export default function Demo()"));
        assert!(page.contains("<a href=\"/demo/lucia\">lucia</a>"));

        let both = add_demo_link(&page, "paraglide").unwrap();
        assert!(both.contains("/demo/paraglide"));
        assert_eq!(add_demo_link(&both, "lucia").unwrap(), both);
        assert_eq!(both.matches("/demo/lucia").count(), 1);
    }

    #[test]
    fn new_demo_page_layout() {
        assert_eq!(
            add_demo_link("", "lucia").unwrap(),
            "export default function Demo() {\n\treturn (\n\t\t<main>\n\t\t\t<a href=\"/demo/lucia\">lucia</a>\n\t\t</main>\n\t);\n}\n"
        );
    }

    #[test]
    fn demo_link_is_appended_after_existing_links() {
        let src = "export default function Demo() {\n  return (\n    <main>\n      <a href=\"/demo/lucia\">lucia</a>\n    </main>\n  );\n}\n";
        let page = add_demo_link(src, "paraglide").unwrap();
        assert_eq!(
            page,
            "export default function Demo() {\n  return (\n    <main>\n      <a href=\"/demo/lucia\">lucia</a>\n      <a href=\"/demo/paraglide\">paraglide</a>\n    </main>\n  );\n}\n"
        );
    }

    #[test]
    fn demo_page_returning_something_else_is_an_error() {
        let err = add_demo_link("export default function Demo() {\n  return null;\n}\n", "lucia").unwrap_err();
        assert!(err.to_string().contains("function component returning JSX"));
    }

    #[test]
    fn demo_page_exporting_an_arrow_is_an_error() {
        let src = "const Home = () => <section>home</section>;\nexport default Home;\n";
        let err = add_demo_link(src, "lucia").unwrap_err();
        assert!(err.to_string().contains("function component returning JSX"));
    }

    #[test]
    fn render_uses_the_alias_or_src() {
        let mut kit = KitInfo::default();
        assert_eq!(render("%ALIAS%/lib/x", &kit), "/src/lib/x");
        kit.alias = "~".into();
        assert_eq!(render("import \"%ALIAS%/lib/db\";", &kit), "import \"~/lib/db\";");
    }
}

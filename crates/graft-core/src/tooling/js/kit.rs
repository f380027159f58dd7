//! SolidStart helpers.

use super::ast::*;
use super::common::{expression_from_string, has_node, statement_from_string};
use super::{array, exports, imports};
use crate::tooling::error::{EditResult, MutationError};

pub const SERVER_MODULE: &str = "@solidjs/start/server";
pub const MIDDLEWARE_MODULE: &str = "@solidjs/start/middleware";

fn is_server_module(stmt: &Stmt) -> bool {
    matches!(
        &stmt.kind,
        StmtKind::TsModule(TsModule {
            declare: true,
            name: TsModuleName::Str(name),
            ..
        }) if name.value == SERVER_MODULE
    )
}

fn interface_mut<'a>(stmt: &'a mut Stmt, name: &str) -> Option<&'a mut TsInterface> {
    match &mut stmt.kind {
        StmtKind::TsInterface(iface) if iface.name == name => Some(iface),
        StmtKind::ExportNamed(ExportNamed { decl: Some(inner), .. }) => interface_mut(inner, name),
        _ => None,
    }
}

/// The interface `name` (e.g. `RequestEventLocals`) inside
/// `declare module "@solidjs/start/server" { .. }`.
///
/// The module declaration is inserted before the default export and the
/// interface appended to it when missing.
pub fn add_global_app_interface<'a>(program: &'a mut Program, name: &str) -> EditResult<&'a mut TsInterface> {
    let at = match program.body.iter().position(is_server_module) {
        Some(at) => at,
        None => {
            let default_export = program
                .body
                .iter()
                .position(|s| matches!(s.kind, StmtKind::ExportDefault(_)))
                .ok_or_else(|| MutationError::expected("a default export in the server entry"))?;
            let decl = statement_from_string(&format!("declare module \"{SERVER_MODULE}\" {{}}"))?;
            program.body.insert(default_export, decl);
            default_export
        }
    };

    let StmtKind::TsModule(TsModule { body: Some(block), .. }) = &mut program.body[at].kind else {
        return Err(MutationError::expected(format!("`declare module \"{SERVER_MODULE}\"` to have a body")).into());
    };
    let index = match block.body.iter_mut().position(|s| interface_mut(s, name).is_some()) {
        Some(index) => index,
        None => {
            block.body.push(statement_from_string(&format!("interface {name} {{}}"))?);
            block.body.len() - 1
        }
    };
    match interface_mut(&mut block.body[index], name) {
        Some(iface) => Ok(iface),
        None => unreachable!("interface located above"),
    }
}

/// Register `middleware` (source of a function expression) in the
/// `onRequest` list of `export default createMiddleware({ .. })`.
///
/// Does nothing when an equal middleware is already present anywhere in
/// the file.
pub fn add_middleware(program: &mut Program, middleware: &str) -> EditResult<()> {
    let create = match imports::local_name(program, MIDDLEWARE_MODULE, "createMiddleware") {
        Some(local) => local.to_owned(),
        None => {
            imports::add_named(
                program,
                MIDDLEWARE_MODULE,
                &[("createMiddleware", "createMiddleware")],
                false,
            );
            "createMiddleware".to_owned()
        }
    };

    let new_middleware = expression_from_string(middleware)?;
    if has_node(program, &new_middleware) {
        return Ok(());
    }

    let fallback = expression_from_string(&format!("{create}({{}})"))?;
    let export = exports::default_export(program, fallback);
    let call = match &mut export.value.unwrap_ts_mut().kind {
        ExprKind::Call(call) if call.callee.as_ident() == Some(create.as_str()) => call,
        _ => {
            return Err(MutationError::expected(format!(
                "the middleware file to default-export a `{create}(..)` call"
            ))
            .into())
        }
    };
    let config = match call.args.first_mut() {
        Some(config) if matches!(config.unwrap_ts().kind, ExprKind::Object(_)) => config,
        _ => return Err(MutationError::expected("a middleware config object").into()),
    };
    let ExprKind::Object(props) = &mut config.unwrap_ts_mut().kind else {
        unreachable!("checked above")
    };

    let on_request = props.iter_mut().find_map(|p| match &mut p.kind {
        PropKind::KeyValue { key, value, .. } if key.name() == Some("onRequest") => Some(value),
        _ => None,
    });
    match on_request {
        None => {
            let mut list = array::create_empty();
            array::push(&mut list, new_middleware)?;
            props.push(Prop::key_value("onRequest", list));
        }
        Some(value) => match &value.kind {
            ExprKind::Array(_) => {
                array::push(value, new_middleware)?;
            }
            ExprKind::Ident(name) => {
                return Err(MutationError::expected(format!(
                    "`onRequest` to be an inline value, found the variable `{name}`"
                ))
                .into())
            }
            _ => {
                let previous = std::mem::replace(value, array::create_empty());
                array::push(value, previous)?;
                array::push(value, new_middleware)?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::{common, parse_script};
    use super::*;
    use crate::tooling::error::EditError;

    const ENTRY_SERVER: &str = "// @refresh reload\nimport { createHandler, StartServer } from \"@solidjs/start/server\";\n\nexport default createHandler(() => <StartServer document={() => <html />} />);\n";

    #[test]
    fn global_interface_is_declared_before_default_export() {
        let mut doc = parse_script(ENTRY_SERVER).unwrap();
        let iface = add_global_app_interface(&mut doc.ast, "RequestEventLocals").unwrap();
        if !common::has_type_prop(iface, "user") {
            iface.body.push(TsMember::property("user", "import('lucia').User | null"));
        }
        let once = doc.generate();
        assert!(once.contains(
            "declare module \"@solidjs/start/server\" {\n\tinterface RequestEventLocals {\n\t\tuser: import('lucia').User | null;\n\t}\n}\n\nexport default createHandler"
        ));

        let mut doc = parse_script(&once).unwrap();
        let iface = add_global_app_interface(&mut doc.ast, "RequestEventLocals").unwrap();
        assert!(common::has_type_prop(iface, "user"));
        assert_eq!(doc.generate(), once);
    }

    #[test]
    fn global_interface_needs_a_default_export() {
        let mut doc = parse_script("const a = 1;").unwrap();
        let err = add_global_app_interface(&mut doc.ast, "RequestEventLocals").unwrap_err();
        assert!(matches!(err, EditError::Mutation(_)));
    }

    const AUTH: &str = "async (event) => {\n\tevent.locals.user = null;\n}";

    #[test]
    fn middleware_file_is_created_from_nothing() {
        let mut doc = parse_script("").unwrap();
        add_middleware(&mut doc.ast, AUTH).unwrap();
        let once = doc.generate();
        assert!(once.starts_with("import { createMiddleware } from \"@solidjs/start/middleware\";\n\nexport default createMiddleware({\n\tonRequest: [async (event) => {"));

        let mut doc = parse_script(&once).unwrap();
        add_middleware(&mut doc.ast, AUTH).unwrap();
        assert_eq!(doc.generate(), once);
    }

    #[test]
    fn single_on_request_value_is_wrapped() {
        let src = "import { createMiddleware } from \"@solidjs/start/middleware\";\n\nexport default createMiddleware({\n\tonRequest: logger\n});\n";
        let mut doc = parse_script(src).unwrap();
        let err = add_middleware(&mut doc.ast, AUTH).unwrap_err();
        assert!(matches!(err, EditError::Mutation(_)));

        let src = src.replace("onRequest: logger", "onRequest: (event) => log(event)");
        let mut doc = parse_script(&src).unwrap();
        add_middleware(&mut doc.ast, AUTH).unwrap();
        assert!(doc.generate().contains("onRequest: [(event) => log(event), async (event) => {"));
    }

    #[test]
    fn aliased_create_middleware_is_respected() {
        let src = "import { createMiddleware as cm } from \"@solidjs/start/middleware\";\n\nexport default cm({ onRequest: [] });\n";
        let mut doc = parse_script(src).unwrap();
        add_middleware(&mut doc.ast, "(e) => {}").unwrap();
        assert_eq!(
            doc.generate(),
            "import { createMiddleware as cm } from \"@solidjs/start/middleware\";\n\nexport default cm({ onRequest: [(e) => {}] });\n"
        );
    }
}

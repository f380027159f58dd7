//! Session auth following the lucia guide, on top of drizzle.
//!
//! The drizzle config decides the SQL dialect and where the schema lives;
//! both are read before anything is written.

use graft_core::{
    application::{Addon, ApplicationError, RunContext, SetupContext},
    domain::{OptionSchema, Workspace},
    error::{GraftError, GraftResult},
    tooling::{
        EditResult, MutationError,
        js::{
            self, ExprKind, Prop, PropKind, Stmt, StmtKind, TsMember, VarKind, common, exports,
            functions, imports, kit, object, variables,
            walker::{self, Cx, Visitor},
        },
    },
};
use tracing::warn;

use super::common::{add_demo_link, app_config, pick, render, require_kit};

const LOGIN_TSX: &str = include_str!("../../templates/lucia/login.tsx");
const LOGIN_JSX: &str = include_str!("../../templates/lucia/login.jsx");
const INDEX_TSX: &str = include_str!("../../templates/lucia/index.tsx");
const INDEX_JSX: &str = include_str!("../../templates/lucia/index.jsx");

const MIDDLEWARE: &str = r#"async (event) => {
  const sessionToken = getCookie(event.nativeEvent, auth.sessionCookieName);
  if (!sessionToken) {
    event.locals.user = null;
    event.locals.session = null;
    return;
  }
  const { session, user } = await auth.validateSessionToken(sessionToken);
  if (session) {
    auth.setSessionTokenCookie(sessionToken, session.expiresAt);
  } else {
    auth.deleteSessionTokenCookie();
  }
  event.locals.user = user;
  event.locals.session = session;
}"#;

// ── drizzle ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Mysql,
    Postgresql,
    Sqlite,
}

/// One column: property name and its builder call.
type Column = (&'static str, &'static str);

impl Dialect {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "mysql" => Some(Self::Mysql),
            "postgresql" => Some(Self::Postgresql),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }

    fn table_function(self) -> &'static str {
        match self {
            Self::Mysql => "mysqlTable",
            Self::Postgresql => "pgTable",
            Self::Sqlite => "sqliteTable",
        }
    }

    /// Module and bindings of the column builders.
    fn core_import(self) -> (&'static str, [&'static str; 3]) {
        match self {
            Self::Mysql => ("drizzle-orm/mysql-core", ["mysqlTable", "varchar", "datetime"]),
            Self::Postgresql => ("drizzle-orm/pg-core", ["pgTable", "text", "timestamp"]),
            Self::Sqlite => ("drizzle-orm/sqlite-core", ["sqliteTable", "text", "integer"]),
        }
    }

    fn user_id(self) -> Column {
        match self {
            Self::Mysql => ("id", "varchar(\"id\", { length: 255 }).primaryKey()"),
            Self::Postgresql | Self::Sqlite => ("id", "text('id').primaryKey()"),
        }
    }

    fn credentials(self) -> [Column; 2] {
        match self {
            Self::Mysql => [
                ("username", "varchar('username', { length: 32 }).notNull().unique()"),
                ("passwordHash", "varchar('password_hash', { length: 255 }).notNull()"),
            ],
            Self::Postgresql | Self::Sqlite => [
                ("username", "text('username').notNull().unique()"),
                ("passwordHash", "text('password_hash').notNull()"),
            ],
        }
    }

    fn session(self) -> [Column; 3] {
        match self {
            Self::Mysql => [
                ("id", "varchar(\"id\", { length: 255 }).primaryKey()"),
                ("userId", "varchar('user_id', { length: 255 }).notNull().references(() => user.id)"),
                ("expiresAt", "datetime(\"expires_at\").notNull()"),
            ],
            Self::Postgresql => [
                ("id", "text('id').primaryKey()"),
                ("userId", "text('user_id').notNull().references(() => user.id)"),
                (
                    "expiresAt",
                    "timestamp(\"expires_at\", { withTimezone: true, mode: \"date\" }).notNull()",
                ),
            ],
            Self::Sqlite => [
                ("id", "text('id').primaryKey()"),
                ("userId", "text('user_id').notNull().references(() => user.id)"),
                ("expiresAt", "integer('expires_at', { mode: 'timestamp' }).notNull()"),
            ],
        }
    }
}

/// String-valued `dialect` and `schema` properties anywhere in the config.
#[derive(Default)]
struct DrizzleConfig {
    dialect: Option<String>,
    schema: Option<String>,
}

impl Visitor for DrizzleConfig {
    type State = ();

    fn property(&mut self, node: &mut Prop, cx: &mut Cx<'_, Self>) -> Option<Prop> {
        if let PropKind::KeyValue { key, value, .. } = &node.kind {
            match (key.name(), value.as_str()) {
                (Some("dialect"), Some(dialect)) => self.dialect = Some(dialect.to_owned()),
                (Some("schema"), Some(schema)) => self.schema = Some(schema.to_owned()),
                _ => {}
            }
        }
        cx.next(self, node);
        None
    }
}

fn read_drizzle_config(cx: &RunContext<'_>, path: &str) -> GraftResult<(Dialect, String)> {
    let invalid = |reason: &str| -> GraftError {
        ApplicationError::InvalidWorkspace {
            path: cx.workspace().cwd().join(path),
            reason: reason.to_owned(),
        }
        .into()
    };

    let source = cx.read(path)?.unwrap_or_default();
    let mut doc = js::parse_script(&source).map_err(|e| ApplicationError::PatchFailed {
        path: path.to_owned(),
        source: e.into(),
    })?;
    let mut config = DrizzleConfig::default();
    walker::walk(&mut doc.ast, (), &mut config);

    let dialect = config
        .dialect
        .ok_or_else(|| invalid("Failed to detect DB dialect in your `drizzle.config.[js|ts]` file"))?;
    let dialect = Dialect::parse(&dialect)
        .ok_or_else(|| invalid(&format!("Unsupported DB dialect `{dialect}` in your `drizzle.config.[js|ts]` file")))?;
    let schema = config
        .schema
        .ok_or_else(|| invalid("Failed to find schema path in your `drizzle.config.[js|ts]` file"))?;
    Ok((dialect, schema.trim_start_matches("./").to_owned()))
}

/// The column object of `export const <name> = <table>("<name>", { .. })`,
/// created as needed.
fn table_columns<'a>(stmt: &'a mut Stmt, name: &str) -> EditResult<&'a mut js::Expr> {
    let shape = || MutationError::expected(format!("`{name}` to be a table definition call"));
    let decl = match &mut stmt.kind {
        StmtKind::ExportNamed(export) => match export.decl.as_deref_mut().map(|d| &mut d.kind) {
            Some(StmtKind::Var(decl)) => decl,
            _ => return Err(shape().into()),
        },
        _ => return Err(shape().into()),
    };
    let init = decl
        .declarators
        .iter_mut()
        .find(|d| d.name() == Some(name))
        .and_then(|d| d.init.as_mut())
        .ok_or_else(shape)?;
    let call = functions::as_call_mut(init.unwrap_ts_mut())?;
    if call.args.len() == 1 {
        call.args.push(object::create_empty());
    }
    match call.args.get_mut(1) {
        Some(columns) if matches!(columns.unwrap_ts().kind, ExprKind::Object(_)) => Ok(columns),
        _ => Err(MutationError::expected(format!("the columns of `{name}` to be an object")).into()),
    }
}

fn columns(entries: &[Column]) -> EditResult<Vec<(&'static str, js::Expr)>> {
    entries
        .iter()
        .map(|(key, code)| Ok((*key, common::expression_from_string(code)?)))
        .collect()
}

fn update_schema(content: &str, dialect: Dialect, demo: bool, typescript: bool) -> EditResult<String> {
    let mut doc = js::parse_script(content)?;
    let table = dialect.table_function();

    let (module, bindings) = dialect.core_import();
    let bindings: Vec<(&str, &str)> = bindings.iter().map(|b| (*b, *b)).collect();
    imports::add_named(&mut doc.ast, module, &bindings, false);

    for name in ["user", "session"] {
        let fallback = variables::declaration(
            VarKind::Const,
            name,
            functions::call_with_strings(table, &[name]),
        );
        let stmt = exports::named_export(&mut doc.ast, name, fallback);
        let attrs = table_columns(stmt, name)?;
        if name == "user" {
            object::override_properties(attrs, columns(&[dialect.user_id()])?)?;
            if demo {
                object::override_properties(attrs, columns(&dialect.credentials())?)?;
            }
        } else {
            object::override_properties(attrs, columns(&dialect.session())?)?;
        }
    }

    if typescript {
        for (marker, code) in [
            ("export type Session =", "export type Session = typeof session.$inferSelect;"),
            ("export type User =", "export type User = typeof user.$inferSelect;"),
        ] {
            if !doc.generate().contains(marker) {
                doc.ast.body.push(common::statement_from_string(code)?);
            }
        }
    }
    Ok(doc.generate())
}

// ── server/auth ─────────────────────────────────────────────────────────────

/// `(marker, typescript, javascript)`: a snippet is appended when its
/// marker is missing from the file. An empty variant is skipped.
const AUTH_SNIPPETS: [(&str, &str, &str); 9] = [
    (
        "const DAY_IN_MS",
        "const DAY_IN_MS = 1000 * 60 * 60 * 24;",
        "const DAY_IN_MS = 1000 * 60 * 60 * 24;",
    ),
    (
        "export const sessionCookieName",
        "export const sessionCookieName = 'auth-session';",
        "export const sessionCookieName = 'auth-session';",
    ),
    (
        "export function generateSessionToken",
        r#"export function generateSessionToken() {
	const bytes = crypto.getRandomValues(new Uint8Array(18));
	const token = encodeBase64url(bytes);
	return token;
}"#,
        r#"export function generateSessionToken() {
	const bytes = crypto.getRandomValues(new Uint8Array(18));
	const token = encodeBase64url(bytes);
	return token;
}"#,
    ),
    (
        "async function createSession",
        r#"export async function createSession(token: string, userId: string) {
	const sessionId = encodeHexLowerCase(sha256(new TextEncoder().encode(token)));
	const session: table.Session = {
		id: sessionId,
		userId,
		expiresAt: new Date(Date.now() + DAY_IN_MS * 30)
	};
	await db.insert(table.session).values(session);
	return session;
}"#,
        r#"/**
 * @param {string} token
 * @param {string} userId
 */
export async function createSession(token, userId) {
	const sessionId = encodeHexLowerCase(sha256(new TextEncoder().encode(token)));
	const session = {
		id: sessionId,
		userId,
		expiresAt: new Date(Date.now() + DAY_IN_MS * 30)
	};
	await db.insert(table.session).values(session);
	return session;
}"#,
    ),
    (
        "async function validateSessionToken",
        r#"export async function validateSessionToken(token: string) {
	const sessionId = encodeHexLowerCase(sha256(new TextEncoder().encode(token)));
	const [result] = await db
		.select({
			// Adjust user table here to tweak returned data
			user: { id: table.user.id, username: table.user.username },
			session: table.session
		})
		.from(table.session)
		.innerJoin(table.user, eq(table.session.userId, table.user.id))
		.where(eq(table.session.id, sessionId));

	if (!result) {
		return { session: null, user: null };
	}
	const { session, user } = result;

	const sessionExpired = Date.now() >= session.expiresAt.getTime();
	if (sessionExpired) {
		await db.delete(table.session).where(eq(table.session.id, session.id));
		return { session: null, user: null };
	}

	const renewSession = Date.now() >= session.expiresAt.getTime() - DAY_IN_MS * 15;
	if (renewSession) {
		session.expiresAt = new Date(Date.now() + DAY_IN_MS * 30);
		await db
			.update(table.session)
			.set({ expiresAt: session.expiresAt })
			.where(eq(table.session.id, session.id));
	}

	return { session, user };
}"#,
        r#"/** @param {string} token */
export async function validateSessionToken(token) {
	const sessionId = encodeHexLowerCase(sha256(new TextEncoder().encode(token)));
	const [result] = await db
		.select({
			// Adjust user table here to tweak returned data
			user: { id: table.user.id, username: table.user.username },
			session: table.session
		})
		.from(table.session)
		.innerJoin(table.user, eq(table.session.userId, table.user.id))
		.where(eq(table.session.id, sessionId));

	if (!result) {
		return { session: null, user: null };
	}
	const { session, user } = result;

	const sessionExpired = Date.now() >= session.expiresAt.getTime();
	if (sessionExpired) {
		await db.delete(table.session).where(eq(table.session.id, session.id));
		return { session: null, user: null };
	}

	const renewSession = Date.now() >= session.expiresAt.getTime() - DAY_IN_MS * 15;
	if (renewSession) {
		session.expiresAt = new Date(Date.now() + DAY_IN_MS * 30);
		await db
			.update(table.session)
			.set({ expiresAt: session.expiresAt })
			.where(eq(table.session.id, session.id));
	}

	return { session, user };
}"#,
    ),
    (
        "export type SessionValidationResult",
        "export type SessionValidationResult = Awaited<ReturnType<typeof validateSessionToken>>;",
        "",
    ),
    (
        "async function invalidateSession",
        r#"export async function invalidateSession(sessionId: string) {
	await db.delete(table.session).where(eq(table.session.id, sessionId));
}"#,
        r#"/** @param {string} sessionId */
export async function invalidateSession(sessionId) {
	await db.delete(table.session).where(eq(table.session.id, sessionId));
}"#,
    ),
    (
        "export function setSessionTokenCookie",
        r#"export function setSessionTokenCookie(token: string, expiresAt: Date) {
	setCookie(sessionCookieName, token, {
		expires: expiresAt,
		path: '/'
	});
}"#,
        r#"/**
 * @param {string} token
 * @param {Date} expiresAt
 */
export function setSessionTokenCookie(token, expiresAt) {
	setCookie(sessionCookieName, token, {
		expires: expiresAt,
		path: '/'
	});
}"#,
    ),
    (
        "export function deleteSessionTokenCookie",
        r#"export function deleteSessionTokenCookie() {
	deleteCookie(sessionCookieName, {
		path: '/'
	});
}"#,
        r#"export function deleteSessionTokenCookie() {
	deleteCookie(sessionCookieName, {
		path: '/'
	});
}"#,
    ),
];

fn update_auth(content: &str, alias: &str, typescript: bool) -> EditResult<String> {
    let mut doc = js::parse_script(content)?;
    imports::add_namespace(&mut doc.ast, &format!("{alias}/lib/server/db/schema"), "table");
    imports::add_named(&mut doc.ast, &format!("{alias}/lib/server/db"), &[("db", "db")], false);
    imports::add_named(
        &mut doc.ast,
        "@oslojs/encoding",
        &[("encodeBase64url", "encodeBase64url"), ("encodeHexLowerCase", "encodeHexLowerCase")],
        false,
    );
    imports::add_named(&mut doc.ast, "@oslojs/crypto/sha2", &[("sha256", "sha256")], false);
    imports::add_named(&mut doc.ast, "drizzle-orm", &[("eq", "eq")], false);
    imports::add_named(
        &mut doc.ast,
        "vinxi/http",
        &[("deleteCookie", "deleteCookie"), ("setCookie", "setCookie")],
        false,
    );

    let original = doc.generate();
    let mut code = original.trim().to_owned();
    for (marker, ts, js) in AUTH_SNIPPETS {
        let snippet = pick(typescript, ts, js);
        if !snippet.is_empty() && !original.contains(marker) {
            code.push_str("\n\n");
            code.push_str(snippet);
        }
    }
    code.push('\n');
    Ok(code)
}

// ── entry server and middleware ─────────────────────────────────────────────

fn add_locals(content: &str, alias: &str) -> EditResult<String> {
    let mut doc = js::parse_script(content)?;
    {
        let locals = kit::add_global_app_interface(&mut doc.ast, "RequestEventLocals")?;
        for name in ["user", "session"] {
            if !common::has_type_prop(locals, name) {
                locals
                    .body
                    .push(TsMember::property(name, format!("SessionValidationResult[\"{name}\"]")));
            }
        }
    }
    imports::add_named(
        &mut doc.ast,
        &format!("{alias}/lib/server/auth"),
        &[("SessionValidationResult", "SessionValidationResult")],
        true,
    );
    Ok(doc.generate())
}

fn add_auth_middleware(content: &str, alias: &str) -> EditResult<String> {
    let mut doc = js::parse_script(content)?;
    imports::add_namespace(&mut doc.ast, &format!("{alias}/lib/server/auth"), "auth");
    imports::add_named(&mut doc.ast, "vinxi/http", &[("getCookie", "getCookie")], false);
    kit::add_middleware(&mut doc.ast, MIDDLEWARE)?;
    Ok(doc.generate())
}

// ── addon ───────────────────────────────────────────────────────────────────

pub struct Lucia;

impl Addon for Lucia {
    fn id(&self) -> &'static str {
        "lucia"
    }

    fn short_description(&self) -> &'static str {
        "auth guide"
    }

    fn homepage(&self) -> &'static str {
        "https://lucia-auth.com"
    }

    fn options(&self) -> OptionSchema {
        OptionSchema::new().boolean(
            "demo",
            "Do you want to include a demo? (includes a login/register page)",
            true,
        )
    }

    fn setup(&self, workspace: &Workspace, cx: &mut SetupContext) {
        if workspace.kit().is_none() {
            cx.unsupported("Requires SolidStart");
        }
        if !workspace.has_dependency("drizzle-orm") {
            cx.depends_on("drizzle");
        }
    }

    fn run(&self, cx: &mut RunContext<'_>) -> GraftResult<()> {
        let kit = require_kit(cx, self.id())?;
        let typescript = cx.workspace().typescript();
        let ext = pick(typescript, "ts", "js");
        let jsx = pick(typescript, "tsx", "jsx");
        let demo = cx.options().flag("demo");
        let alias = kit.import_path("").trim_end_matches('/').to_owned();

        cx.dependency("@oslojs/crypto", "^1.0.1");
        cx.dependency("@oslojs/encoding", "^1.1.0");
        if demo {
            cx.dependency("@node-rs/argon2", "^1.1.0");
        }

        let (dialect, schema) = read_drizzle_config(cx, &format!("drizzle.config.{ext}"))?;
        cx.file(&schema, |content| update_schema(content, dialect, demo, typescript))?;

        cx.file(&format!("{}/server/auth.{ext}", kit.lib_directory), |content| {
            update_auth(content, &alias, typescript)
        })?;

        if typescript {
            cx.file("src/entry-server.tsx", |content| add_locals(content, &alias))?;
        }

        cx.file(&format!("src/middleware.{ext}"), |content| add_auth_middleware(content, &alias))?;

        cx.file(&format!("app.config.{ext}"), |content| {
            let mut doc = js::parse_script(content)?;
            let config = app_config(&mut doc.ast)?;
            object::property(config, "middleware", js::Expr::string(format!("./src/middleware.{ext}")))?;
            Ok(doc.generate())
        })?;

        if demo {
            let routes = &kit.routes_directory;
            cx.file(&format!("{routes}/demo/index.{jsx}"), |content| {
                add_demo_link(content, "lucia")
            })?;
            for (page, ts, js) in [("login", LOGIN_TSX, LOGIN_JSX), ("index", INDEX_TSX, INDEX_JSX)] {
                let path = format!("{routes}/demo/lucia/{page}.{jsx}");
                cx.file(&path, |content| {
                    if !content.is_empty() {
                        warn!("Existing {path} file. Could not update.");
                        return Ok(content.to_owned());
                    }
                    Ok(render(pick(typescript, ts, js), &kit))
                })?;
            }
        }
        Ok(())
    }

    fn next_steps(&self, workspace: &Workspace) -> Vec<String> {
        let mut steps = vec![format!(
            "Run {} run db:push to update your database schema",
            workspace.package_manager()
        )];
        if workspace.options().flag("demo") {
            steps.push("Visit /demo/lucia route to view the demo".to_owned());
        }
        steps
    }
}

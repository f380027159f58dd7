//! i18n through inlang's paraglide.
//!
//! Besides the compiler plugin and project settings this wires the runtime
//! into SolidStart: the router base follows the language tag in the URL,
//! `<Suspense>` is wrapped in the language tag provider and the server
//! entry sets `<html lang>` and alternate links.

use std::sync::LazyLock;

use graft_core::{
    application::{Addon, RunContext, SetupContext},
    domain::{KitInfo, OptionSchema, Workspace},
    error::GraftResult,
    tooling::{
        EditResult, MutationError,
        js::{
            self, ArrowBody, Block, Expr, ExprKind, JsxAttr, JsxAttrValue, JsxChild, JsxChildKind,
            JsxElement, JsxName, Program, Stmt, StmtKind, array, common, functions, imports,
            object,
            walker::{self, Cx, Visitor},
        },
        json,
    },
};
use regex::Regex;
use serde_json::{Value, json};
use tracing::{error, warn};

use super::common::{add_demo_link, app_config, pick, render, require_kit};

const ADAPTER_TS: &str = include_str!("../../templates/paraglide/adapter.ts");
const ADAPTER_JS: &str = include_str!("../../templates/paraglide/adapter.js");
const I18N_TSX: &str = include_str!("../../templates/paraglide/i18n.tsx");
const I18N_JSX: &str = include_str!("../../templates/paraglide/i18n.jsx");

const LANGUAGE_TAG_PATTERN: &str = concat!(
    r"^((?P<grandfathered>(en-GB-oed|i-ami|i-bnn|i-default|i-enochian|i-hak|i-klingon|i-lux|i-mingo|i-navajo|i-pwn|i-tao|i-tay|i-tsu|sgn-BE-FR|sgn-BE-NL|sgn-CH-DE)|(art-lojban|cel-gaulish|no-bok|no-nyn|zh-guoyu|zh-hakka|zh-min|zh-min-nan|zh-xiang))",
    r"|((?P<language>([A-Za-z]{2,3}(-(?P<extlang>[A-Za-z]{3}(-[A-Za-z]{3}){0,2}))?))(-(?P<script>[A-Za-z]{4}))?(-(?P<region>[A-Za-z]{2}|[0-9]{3}))?(-(?P<variant>[A-Za-z0-9]{5,8}|[0-9][A-Za-z0-9]{3}))*))$",
);

static LANGUAGE_TAG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(LANGUAGE_TAG_PATTERN).ok());

const INLANG_MODULES: [&str; 7] = [
    "https://cdn.jsdelivr.net/npm/@inlang/message-lint-rule-empty-pattern@1/dist/index.js",
    "https://cdn.jsdelivr.net/npm/@inlang/message-lint-rule-identical-pattern@1/dist/index.js",
    "https://cdn.jsdelivr.net/npm/@inlang/message-lint-rule-missing-translation@1/dist/index.js",
    "https://cdn.jsdelivr.net/npm/@inlang/message-lint-rule-without-source@1/dist/index.js",
    "https://cdn.jsdelivr.net/npm/@inlang/message-lint-rule-valid-js-identifier@1/dist/index.js",
    "https://cdn.jsdelivr.net/npm/@inlang/plugin-message-format@2/dist/index.js",
    "https://cdn.jsdelivr.net/npm/@inlang/plugin-m-function-matcher@0/dist/index.js",
];

// ── language tags ───────────────────────────────────────────────────────────

fn is_language_tag(tag: &str) -> bool {
    LANGUAGE_TAG.as_ref().is_some_and(|re| re.is_match(tag))
}

/// Split user input on commas, colons and whitespace into lowercase
/// `(valid, invalid)` BCP 47 tags.
fn parse_language_tags(input: &str) -> (Vec<String>, Vec<String>) {
    input
        .split(|c: char| c == ',' || c == ':' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .partition(|tag| is_language_tag(tag))
}

/// `"a"`, `"a" and "b"`, `"a", "b", and "c"`.
fn quoted_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| format!("\"{s}\"")).collect();
    match quoted.as_slice() {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{a} and {b}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}

fn validate_language_tags(input: &str) -> Result<(), String> {
    let (valid, invalid) = parse_language_tags(input);
    match invalid.as_slice() {
        [] if valid.is_empty() => Err("Please enter at least one valid BCP47 language tag. Eg: en".into()),
        [] => Ok(()),
        [one] => Err(format!("The input \"{one}\" is not a valid IETF BCP 47 language tag")),
        many => Err(format!(
            "The inputs {} are not valid BCP47 language tags",
            quoted_list(many)
        )),
    }
}

// ── addon ───────────────────────────────────────────────────────────────────

pub struct Paraglide;

impl Addon for Paraglide {
    fn id(&self) -> &'static str {
        "paraglide"
    }

    fn short_description(&self) -> &'static str {
        "i18n"
    }

    fn homepage(&self) -> &'static str {
        "https://inlang.com"
    }

    fn options(&self) -> OptionSchema {
        OptionSchema::new()
            .text(
                "availableLanguageTags",
                "Which languages would you like to support? (e.g. en,de-ch)",
                "en",
                Some(validate_language_tags),
            )
            .boolean("demo", "Do you want to include a demo?", true)
    }

    fn setup(&self, workspace: &Workspace, cx: &mut SetupContext) {
        if workspace.kit().is_none() {
            cx.unsupported("Requires SolidStart");
        }
    }

    fn run(&self, cx: &mut RunContext<'_>) -> GraftResult<()> {
        let kit = require_kit(cx, self.id())?;
        let typescript = cx.workspace().typescript();
        let ext = pick(typescript, "ts", "js");
        let jsx = pick(typescript, "tsx", "jsx");
        let (tags, _) = parse_language_tags(cx.options().text("availableLanguageTags"));
        let demo = cx.options().flag("demo");

        cx.dev_dependency("@inlang/paraglide-vite", "^1.2.76");

        cx.file("project.inlang/settings.json", |content| {
            if !content.is_empty() {
                return Ok(content.to_owned());
            }
            let mut doc = json::parse_json(content)?;
            doc.data = json!({
                "$schema": "https://inlang.com/schema/project-settings",
                "modules": INLANG_MODULES,
                "plugin.inlang.messageFormat": {
                    "pathPattern": "./messages/{languageTag}.json"
                },
                "sourceLanguageTag": tags.first(),
                "languageTags": tags,
            });
            Ok(doc.generate())
        })?;

        cx.file(&format!("app.config.{ext}"), |content| {
            let mut doc = js::parse_script(content)?;
            imports::add_named(&mut doc.ast, "@inlang/paraglide-vite", &[("paraglide", "paraglide")], false);
            let config = app_config(&mut doc.ast)?;
            let vite = object::property(config, "vite", object::create_empty())?;
            let plugins = object::property(vite, "plugins", array::create_empty())?;
            let options = object::create(vec![
                ("project", Expr::string("./project.inlang")),
                ("outdir", Expr::string("./src/lib/paraglide")),
            ]);
            array::push_unique(plugins, functions::call("paraglide", vec![options]))?;
            Ok(doc.generate())
        })?;

        cx.file(&format!("src/lib/paraglide-adapter.{ext}"), |_| {
            Ok(pick(typescript, ADAPTER_TS, ADAPTER_JS).to_owned())
        })?;

        let i18n = format!("src/lib/i18n.{jsx}");
        cx.file(&i18n, |content| {
            if !content.is_empty() {
                warn!("The `{i18n}` file already exists. It will be overwritten");
            }
            Ok(render(pick(typescript, I18N_TSX, I18N_JSX), &kit))
        })?;

        let i18n_module = kit.import_path("lib/i18n");
        cx.file(&format!("src/app.{jsx}"), |content| {
            wrap_app(content, &i18n_module, jsx)
        })?;
        cx.file(&format!("src/entry-server.{jsx}"), |content| {
            localize_entry_server(content, &i18n_module, jsx)
        })?;

        if demo {
            let routes = &kit.routes_directory;
            cx.file(&format!("{routes}/demo/index.{jsx}"), |content| {
                add_demo_link(content, "paraglide")
            })?;
            cx.file(&format!("{routes}/demo/paraglide/index.{jsx}"), |_| {
                demo_page(&kit, &tags)
            })?;
        }

        for tag in &tags {
            cx.file(&format!("messages/{tag}.json"), |content| {
                let mut doc = json::parse_json(content)?;
                let messages = doc
                    .data
                    .as_object_mut()
                    .ok_or_else(|| MutationError::expected("the messages file to be a JSON object"))?;
                messages.insert(
                    "$schema".into(),
                    Value::from("https://inlang.com/schema/inlang-message-format"),
                );
                messages.insert(
                    "hello_world".into(),
                    Value::from(format!("Hello, {{name}} from {tag}!")),
                );
                Ok(doc.generate())
            })?;
        }
        Ok(())
    }

    fn next_steps(&self, workspace: &Workspace) -> Vec<String> {
        let mut steps = vec![
            "Edit your messages in messages/en.json".to_owned(),
            "Consider installing the Sherlock IDE Extension".to_owned(),
        ];
        if workspace.options().flag("demo") {
            steps.push("Visit /demo/paraglide route to view the demo".to_owned());
        }
        steps
    }
}

// ── src/app ─────────────────────────────────────────────────────────────────

/// Body of `export default function App() { .. }` when it returns JSX.
fn app_component(program: &mut Program) -> Option<&mut Vec<Stmt>> {
    let func = program.body.iter_mut().find_map(|stmt| match &mut stmt.kind {
        StmtKind::ExportDefault(Expr {
            kind: ExprKind::Function(func),
            ..
        }) if func.name.as_deref() == Some("App") => Some(func),
        _ => None,
    })?;
    let body = &mut func.body.as_mut()?.body;
    let returns_jsx = body.iter().any(|s| {
        matches!(&s.kind, StmtKind::Return(Some(arg)) if matches!(arg.unwrap_ts().kind, ExprKind::Jsx(_)))
    });
    returns_jsx.then_some(body)
}

/// Insert `stmts` in order at the top of `body`, skipping the ones present.
fn unshift_missing(body: &mut Vec<Stmt>, stmts: Vec<Stmt>) {
    let mut at = 0;
    for stmt in stmts {
        match body.iter().position(|s| s.kind == stmt.kind) {
            Some(existing) => at = existing + 1,
            None => {
                body.insert(at, stmt);
                at += 1;
            }
        }
    }
}

fn is_provider(element: &JsxElement) -> bool {
    matches!(&element.name, Some(JsxName::Member(parts)) if parts == &["i18n", "LanguageTagProvider"])
}

/// Sets the router base and wraps `<Suspense>` in the language tag
/// provider. The state records whether the walk is inside a provider.
struct AppRoutes {
    provider: JsxElement,
}

impl Visitor for AppRoutes {
    type State = bool;

    fn jsx_element(&mut self, node: &mut JsxElement, cx: &mut Cx<'_, Self>) -> Option<JsxElement> {
        if node.is_named("Router") {
            if node.attr("base").is_none() {
                let base = JsxAttrValue::Expr(Expr::ident("url_language_tag"));
                node.attrs.insert(0, JsxAttr::new("base", Some(base)));
            }
            if node.attr("root").is_none() {
                error!("Could not find the root prop in the Router component");
                cx.stop();
            } else {
                cx.next(self, node);
            }
            None
        } else if is_provider(node) {
            cx.next_with(self, node, true);
            None
        } else if node.is_named("Suspense") && !*cx.state() {
            let mut provider = self.provider.clone();
            provider.children = vec![JsxChild::element(node.clone())];
            Some(provider)
        } else {
            cx.next(self, node);
            None
        }
    }
}

fn wrap_app(content: &str, i18n_module: &str, jsx: &str) -> EditResult<String> {
    let provider = match common::expression_from_string(
        "<i18n.LanguageTagProvider value={language_tag}></i18n.LanguageTagProvider>",
    )?
    .kind
    {
        ExprKind::Jsx(element) => *element,
        _ => return Err(MutationError::expected("the language tag provider to be a JSX element").into()),
    };
    let header = common::statements_from_string(
        "const url_language_tag = i18n.useLocationLanguageTag();\nconst language_tag = url_language_tag ?? i18n.sourceLanguageTag;",
    )?;

    let mut doc = js::parse_script(content)?;
    imports::add_namespace(&mut doc.ast, i18n_module, "i18n");
    let Some(body) = app_component(&mut doc.ast) else {
        error!(
            "Could not find a valid default export for the `App` function component in `src/app.{jsx}`. \
             Ensure that the file defines a JSX component named `App` and exports it as the default."
        );
        return Ok(doc.generate());
    };
    unshift_missing(body, header);

    let mut routes = AppRoutes { provider };
    for stmt in body.iter_mut() {
        if let StmtKind::Return(Some(arg)) = &mut stmt.kind {
            if matches!(arg.unwrap_ts().kind, ExprKind::Jsx(_)) {
                walker::walk(arg, false, &mut routes);
                break;
            }
        }
    }
    Ok(doc.generate())
}

// ── src/entry-server ────────────────────────────────────────────────────────

/// Declares `language_tag` in the document arrow and uses it for
/// `<html lang>` and the alternate links in `<head>`.
struct ServerDocument {
    language_tag: Stmt,
    alternate_links: JsxElement,
    arrow_done: bool,
}

impl Visitor for ServerDocument {
    type State = ();

    fn arrow_function(&mut self, node: &mut Expr, cx: &mut Cx<'_, Self>) -> Option<Expr> {
        if !self.arrow_done {
            let ExprKind::Arrow(arrow) = &mut node.kind else {
                cx.next(self, node);
                return None;
            };
            match &mut arrow.body {
                ArrowBody::Block(block) => {
                    if !block.body.iter().any(|s| s.kind == self.language_tag.kind) {
                        block.body.insert(0, self.language_tag.clone());
                    }
                }
                ArrowBody::Expr(body) if matches!(body.unwrap_ts().kind, ExprKind::Jsx(_)) => {
                    let returned = std::mem::replace(body.as_mut(), Expr::ident("undefined"));
                    arrow.body = ArrowBody::Block(Block::new(vec![
                        self.language_tag.clone(),
                        Stmt::new(StmtKind::Return(Some(returned))),
                    ]));
                }
                ArrowBody::Expr(_) => {
                    error!("Unexpected body type of arrow function in the server entry");
                    cx.stop();
                    return None;
                }
            }
            self.arrow_done = true;
        }
        cx.next(self, node);
        None
    }

    fn jsx_element(&mut self, node: &mut JsxElement, cx: &mut Cx<'_, Self>) -> Option<JsxElement> {
        if node.is_named("html") {
            let lang = JsxAttrValue::Expr(Expr::ident("language_tag"));
            match node.attr_mut("lang") {
                Some(JsxAttr::Attr { value, .. }) => *value = Some(lang),
                _ => node.attrs.push(JsxAttr::new("lang", Some(lang))),
            }
            cx.next(self, node);
        } else if node.is_named("head") {
            let present = node.children.iter().any(
                |child| matches!(&child.kind, JsxChildKind::Element(el) if **el == self.alternate_links),
            );
            if !present {
                node.children.push(JsxChild::element(self.alternate_links.clone()));
            }
        } else {
            cx.next(self, node);
        }
        None
    }
}

fn localize_entry_server(content: &str, i18n_module: &str, jsx: &str) -> EditResult<String> {
    let alternate_links = match common::expression_from_string("<i18n.AlternateLinks languageTag={language_tag} />")?.kind {
        ExprKind::Jsx(element) => *element,
        _ => return Err(MutationError::expected("the alternate links to be a JSX element").into()),
    };
    let language_tag =
        common::statement_from_string("const language_tag = i18n.useLocationLanguageTag() ?? i18n.sourceLanguageTag;")?;

    let mut doc = js::parse_script(content)?;
    imports::add_namespace(&mut doc.ast, i18n_module, "i18n");

    let handler = doc.ast.body.iter_mut().find_map(|stmt| match &mut stmt.kind {
        StmtKind::ExportDefault(expr) => Some(expr),
        _ => None,
    });
    let handler = handler.filter(|expr| {
        matches!(&expr.unwrap_ts().kind, ExprKind::Call(call) if functions::callee_name(call) == Some("createHandler"))
    });
    let Some(handler) = handler else {
        error!(
            "Could not find a valid default export for the `createHandler` function call in `src/entry-server.{jsx}`. \
             Ensure that the file defines a function call named `createHandler` and exports it as the default."
        );
        return Ok(doc.generate());
    };

    let mut document = ServerDocument {
        language_tag,
        alternate_links,
        arrow_done: false,
    };
    walker::walk(handler, (), &mut document);
    Ok(doc.generate())
}

// ── demo ────────────────────────────────────────────────────────────────────

fn demo_page(kit: &KitInfo, tags: &[String]) -> EditResult<String> {
    let buttons = tags
        .iter()
        .map(|tag| format!("<button onClick={{() => setLanguageTag('{tag}')}}>{tag}</button>"))
        .collect::<Vec<_>>()
        .join("\n");
    let component = common::statement_from_string(&format!(
        r#"export default function Paraglide() {{
	return (
		<main>
			<h1>Paraglide Demo</h1>
			<p>{{m.hello_world({{ name: "SolidStart User" }})}}</p>
			<div>
				{buttons}
			</div>
		</main>
	);
}}"#
    ))?;

    let mut doc = js::parse_script("")?;
    imports::add_namespace(&mut doc.ast, &kit.import_path("lib/paraglide/messages"), "m");
    imports::add_named(
        &mut doc.ast,
        &kit.import_path("lib/i18n"),
        &[("setLanguageTag", "setLanguageTag")],
        false,
    );
    doc.ast.body.push(component);
    Ok(doc.generate())
}

#[cfg(test)]
mod tests {
    use graft_core::application::AddonRequest;

    use super::super::testing::{apply, kit_project, read};
    use super::*;
    use crate::filesystem::MemoryFilesystem;

    const APP: &str = r#"import { Router } from "@solidjs/router";
import { FileRoutes } from "@solidjs/start/router";
import { Suspense } from "solid-js";

export default function App() {
  return (
    <Router root={(props) => <Suspense>{props.children}</Suspense>}>
      <FileRoutes />
    </Router>
  );
}
"#;

    const ENTRY_SERVER: &str = r#"import { createHandler, StartServer } from "@solidjs/start/server";

export default createHandler(() => (
  <StartServer
    document={({ assets, children, scripts }) => (
      <html lang="en">
        <head>
          {assets}
        </head>
        <body>
          <div id="app">{children}</div>
          {scripts}
        </body>
      </html>
    )}
  />
));
"#;

    fn project() -> MemoryFilesystem {
        MemoryFilesystem::new()
            .with_file("/app/app.config.ts", "import { defineConfig } from \"@solidjs/start/config\";\n\nexport default defineConfig({});\n")
            .with_file("/app/src/app.tsx", APP)
            .with_file("/app/src/entry-server.tsx", ENTRY_SERVER)
    }

    #[test]
    fn language_tags_are_split_and_lowercased() {
        let (valid, invalid) = parse_language_tags("en, DE-ch:fr  x-y-z,,");
        assert_eq!(valid, ["en", "de-ch", "fr"]);
        assert_eq!(invalid, ["x-y-z"]);
        assert!(is_language_tag("i-klingon"));
        assert!(is_language_tag("zh-hant-tw"));
    }

    #[test]
    fn validation_messages() {
        assert_eq!(validate_language_tags("en,de"), Ok(()));
        assert_eq!(
            validate_language_tags("en,english"),
            Err("The input \"english\" is not a valid IETF BCP 47 language tag".into())
        );
        assert_eq!(
            validate_language_tags("a b c"),
            Err("The inputs \"a\", \"b\", and \"c\" are not valid BCP47 language tags".into())
        );
        assert_eq!(
            validate_language_tags(" , "),
            Err("Please enter at least one valid BCP47 language tag. Eg: en".into())
        );
    }

    #[test]
    fn requires_solid_start() {
        let fs = MemoryFilesystem::new();
        let ws = Workspace::builder("/app").build();
        let report = apply(&fs, &ws, &[AddonRequest::new("paraglide")]).unwrap();
        assert_eq!(report.skipped().next(), Some(("paraglide", "Requires SolidStart")));
        assert!(fs.list_files().is_empty());
    }

    #[test]
    fn invalid_tags_are_rejected_before_any_write() {
        let fs = project();
        let request = AddonRequest::new("paraglide").option("availableLanguageTags", "en,nope-nope-nope");
        assert!(apply(&fs, &kit_project(true).build(), &[request]).is_err());
        assert!(fs.get("/app/project.inlang/settings.json").is_none());
    }

    #[test]
    fn project_is_localized() {
        let fs = project();
        let request = AddonRequest::new("paraglide").option("availableLanguageTags", "en,de");
        let report = apply(&fs, &kit_project(true).build(), &[request]).unwrap();

        let settings: Value = serde_json::from_str(&read(&fs, "project.inlang/settings.json")).unwrap();
        assert_eq!(settings["sourceLanguageTag"], "en");
        assert_eq!(settings["languageTags"], json!(["en", "de"]));
        assert_eq!(settings["modules"].as_array().map(Vec::len), Some(7));

        let config = read(&fs, "app.config.ts");
        assert!(config.contains("import { paraglide } from \"@inlang/paraglide-vite\";"));
        assert!(config.contains("outdir: \"./src/lib/paraglide\""));

        assert!(read(&fs, "src/lib/paraglide-adapter.ts").contains("export function createI18n"));
        assert!(read(&fs, "src/lib/i18n.tsx").contains("from \"~/lib/paraglide/runtime\""));

        let app = read(&fs, "src/app.tsx");
        assert!(app.contains("import * as i18n from \"~/lib/i18n\";"));
        assert!(app.contains("const url_language_tag = i18n.useLocationLanguageTag();"));
        assert!(app.contains("<Router base={url_language_tag} root="));
        assert!(app.contains("<i18n.LanguageTagProvider value={language_tag}>"));

        let server = read(&fs, "src/entry-server.tsx");
        assert!(server.contains("const language_tag = i18n.useLocationLanguageTag() ?? i18n.sourceLanguageTag;"));
        assert!(server.contains("<html lang={language_tag}>"));
        assert!(server.contains("<i18n.AlternateLinks languageTag={language_tag} />"));

        let de: Value = serde_json::from_str(&read(&fs, "messages/de.json")).unwrap();
        assert_eq!(de["hello_world"], "Hello, {name} from de!");

        let demo = read(&fs, "src/routes/demo/paraglide/index.tsx");
        assert!(demo.contains("import * as m from \"~/lib/paraglide/messages\";"));
        assert!(demo.contains("setLanguageTag(\"de\")"));
        assert!(read(&fs, "src/routes/demo/index.tsx").contains("/demo/paraglide"));

        let steps = &report.addons[0].next_steps;
        assert_eq!(steps.last().map(String::as_str), Some("Visit /demo/paraglide route to view the demo"));
    }

    #[test]
    fn entry_server_layout() {
        let out = localize_entry_server(ENTRY_SERVER, "~/lib/i18n", "tsx").unwrap();
        assert_eq!(
            out,
            r#"import { createHandler, StartServer } from "@solidjs/start/server";
import * as i18n from "~/lib/i18n";

export default createHandler(() => {
  const language_tag = i18n.useLocationLanguageTag() ?? i18n.sourceLanguageTag;
  return (
    <StartServer
      document={({ assets, children, scripts }) => (
        <html lang={language_tag}>
          <head>
            {assets}
            <i18n.AlternateLinks languageTag={language_tag} />
          </head>
          <body>
            <div id="app">{children}</div>
            {scripts}
          </body>
        </html>
      )}
    />
  );
});
"#
        );
        assert_eq!(localize_entry_server(&out, "~/lib/i18n", "tsx").unwrap(), out);
    }

    #[test]
    fn app_config_keeps_its_indentation() {
        let src = "import { defineConfig } from \"@solidjs/start/config\";\n\nexport default defineConfig({\n  server: { preset: \"vercel\" },\n});\n";
        let fs = project().with_file("/app/app.config.ts", src);
        apply(&fs, &kit_project(true).build(), &[AddonRequest::new("paraglide")]).unwrap();
        let config = read(&fs, "app.config.ts");
        assert!(config.contains("\n  server: { preset: \"vercel\" },\n  vite: {\n    plugins: [paraglide({\n"));
        assert!(!config.contains('\t'));
        for line in config.lines() {
            let indent = line.len() - line.trim_start().len();
            assert_eq!(indent % 2, 0, "{line:?}");
        }
    }

    #[test]
    fn demo_buttons_line_up() {
        let page = demo_page(&KitInfo::default(), &["en".to_owned(), "de".to_owned(), "fr".to_owned()]).unwrap();
        assert!(page.contains(
            "\t\t\t<div>\n\t\t\t\t<button onClick={() => setLanguageTag(\"en\")}>en</button>\n\t\t\t\t<button onClick={() => setLanguageTag(\"de\")}>de</button>\n\t\t\t\t<button onClick={() => setLanguageTag(\"fr\")}>fr</button>\n\t\t\t</div>\n"
        ));
        assert!(page.contains("\treturn (\n\t\t<main>\n\t\t\t<h1>Paraglide Demo</h1>\n"));
        assert!(page.ends_with("\t\t</main>\n\t);\n}\n"));
    }

    #[test]
    fn second_run_does_not_wrap_twice() {
        let fs = project();
        let ws = kit_project(true).build();
        apply(&fs, &ws, &[AddonRequest::new("paraglide")]).unwrap();
        let app = read(&fs, "src/app.tsx");
        let server = read(&fs, "src/entry-server.tsx");

        apply(&fs, &ws, &[AddonRequest::new("paraglide")]).unwrap();
        assert_eq!(read(&fs, "src/app.tsx"), app);
        assert_eq!(read(&fs, "src/entry-server.tsx"), server);
        assert_eq!(app.matches("LanguageTagProvider value").count(), 1);
    }

    #[test]
    fn unexpected_app_shape_is_left_alone() {
        let src = "export default () => null;\n";
        let out = wrap_app(src, "~/lib/i18n", "tsx").unwrap();
        assert!(out.contains("import * as i18n"));
        assert!(out.contains("export default () => null;"));
    }

    #[test]
    fn settings_are_not_overwritten_and_demo_is_optional() {
        let fs = project().with_file("/app/project.inlang/settings.json", "{ \"custom\": true }\n");
        let request = AddonRequest::new("paraglide").option("demo", "no");
        let report = apply(&fs, &kit_project(true).build(), &[request]).unwrap();
        assert_eq!(read(&fs, "project.inlang/settings.json"), "{ \"custom\": true }\n");
        assert!(fs.get("/app/src/routes/demo/index.tsx").is_none());
        assert_eq!(report.addons[0].next_steps.len(), 2);
    }
}

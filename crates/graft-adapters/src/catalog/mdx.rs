use graft_core::{
    application::{Addon, RunContext},
    error::GraftResult,
    tooling::js::{self, Comment, Program, StmtKind, array, common, imports, object},
};
use tracing::warn;

use super::common::{app_config, pick};

const GLOBAL_TYPES: &str = r#"declare module "solid:content" {
	import content from ".vinxi/mdx/data";
	export { content };
}
"#;

const MDX_PLUGIN: &str = "@vinxi/plugin-mdx";

pub struct Mdx;

impl Addon for Mdx {
    fn id(&self) -> &'static str {
        "mdx"
    }

    fn short_description(&self) -> &'static str {
        "solid + markdown"
    }

    fn homepage(&self) -> &'static str {
        "https://mdxjs.com"
    }

    fn run(&self, cx: &mut RunContext<'_>) -> GraftResult<()> {
        cx.dependency("@mdx-js/mdx", "^3.1.0");
        cx.dependency("solid-mdx", "^0.0.7");
        cx.dev_dependency(MDX_PLUGIN, "^3.7.2");
        cx.dev_dependency("remark-frontmatter", "^5.0.0");
        cx.dev_dependency("gray-matter", "^4.0.3");

        let typescript = cx.workspace().typescript();
        if typescript {
            cx.file("global.d.ts", |content| {
                if !content.is_empty() {
                    warn!("global.d.ts already exists, add the `solid:content` module declaration yourself");
                    return Ok(content.to_owned());
                }
                Ok(GLOBAL_TYPES.to_owned())
            })?;
        }

        let path = format!("app.config.{}", pick(typescript, "ts", "js"));
        cx.file(&path, |content| {
            let mut doc = js::parse_script(content)?;
            add_imports(&mut doc.ast, typescript);
            for code in helper_source(typescript) {
                common::insert_before_default_export(&mut doc.ast, common::statement_from_string(&code)?);
            }

            let config = app_config(&mut doc.ast)?;
            object::property(config, "vite", object::create_empty())?;
            let extensions = object::property(config, "extensions", array::create_empty())?;
            array::push_string(extensions, "mdx")?;
            array::push_string(extensions, "md")?;

            let vite = object::property(config, "vite", object::create_empty())?;
            let plugins = object::property(vite, "plugins", array::create_empty())?;
            for plugin in [
                "getFrontmatterPlugin()",
                "mdxFrontmatterVirtualModule()",
                r#"mdx.withImports({})({ jsx: true, jsxImportSource: "solid-js", providerImportSource: "solid-mdx", remarkPlugins: [remarkFrontmatter] })"#,
            ] {
                array::push_unique(plugins, common::expression_from_string(plugin)?)?;
            }
            Ok(doc.generate())
        })?;
        Ok(())
    }
}

fn add_imports(program: &mut Program, typescript: bool) {
    imports::add_default(program, "remark-frontmatter", "remarkFrontmatter");
    imports::add_default(program, MDX_PLUGIN, "pkg");
    imports::add_default(program, "node:path", "path");
    let fs: Vec<(&str, &str)> = [
        "mkdirSync",
        "readdirSync",
        "statSync",
        "readFileSync",
        "existsSync",
        "writeFileSync",
    ]
    .into_iter()
    .map(|name| (name, name))
    .collect();
    imports::add_named(program, "node:fs", &fs, false);
    imports::add_default(program, "gray-matter", "matter");
    imports::add_named(program, "node:path", &[("resolve", "resolve")], false);

    if typescript {
        imports::add_named(program, "vinxi/dist/types/lib/vite-dev", &[("Plugin", "Plugin")], true);
        // the plugin ships without type declarations
        let comment = Comment::block(" @ts-expect-error no-types ");
        let import = program
            .body
            .iter_mut()
            .find(|s| matches!(&s.kind, StmtKind::Import(decl) if decl.source.value == MDX_PLUGIN));
        if let Some(import) = import {
            if !import.comments.contains(&comment) {
                import.comments = vec![comment];
            }
        }
    }
}

/// Top-level statements that generate `.vinxi/mdx/data.ts` from the
/// frontmatter of every route and serve it as `solid:content`.
fn helper_source(typescript: bool) -> Vec<String> {
    let ts = |annotation: &'static str| if typescript { annotation } else { "" };
    let mut statements = vec!["const { default: mdx } = pkg;".to_owned()];
    if typescript {
        statements.push("type Entry = { slug: string; path: string; title: string };".to_owned());
    }
    statements.push(r#"const MAIN_ENTRY = "src/routes";"#.to_owned());

    statements.push(format!(
        r#"function getMdxData(entry{string}){entries} {{
	const entryPath = path.resolve(process.cwd(), entry);
	const files = readdirSync(entryPath);
	const mdxFiles{entries} = [];
	for (const file of files) {{
		const filepath = path.join(entryPath, file);
		const stats = statSync(filepath);
		if (stats.isFile() && filepath.endsWith(".mdx")) {{
			const relativepath = path.relative(path.join(process.cwd(), MAIN_ENTRY), filepath);
			const f = readFileSync(filepath);
			const meta = matter(f);
			const slug = file.replace(".mdx", "");
			mdxFiles.push({{
				slug,
				path: "/" + relativepath.replace(".mdx", ""),
				title: meta.data.title,
			}});
		}}
		if (stats.isDirectory()) {{
			mdxFiles.push(...getMdxData(filepath));
		}}
	}}
	return mdxFiles;
}}"#,
        string = ts(": string"),
        entries = ts(": Entry[]"),
    ));

    statements.push(format!(
        r#"function makeFiles() {{
	const files = getMdxData(MAIN_ENTRY);
	const collectionDir = path.resolve(process.cwd(), "./.vinxi/mdx");
	if (!existsSync(collectionDir)) {{
		mkdirSync(collectionDir, {{ recursive: true }});
	}}

	const mdxObject{record} = {{}};
	files.forEach((f) => (mdxObject[f.path] = f));

	writeFileSync(
		path.join(collectionDir, "data.ts"),
		`export default ${{JSON.stringify(mdxObject, null, 2)}} as const;`,
		"utf-8",
	);
}}"#,
        record = ts(": Record<string, Entry>"),
    ));

    statements.push(format!(
        r#"function getFrontmatterPlugin(){plugin} {{
	return {{
		name: "solid-content-gen",
		enforce: "pre",
		buildStart() {{
			makeFiles();
		}},
		configureServer(server) {{
			server.watcher.on("change", (filepath) => {{
				if (!filepath.endsWith(".mdx")) return;
				makeFiles();
			}});
		}},
	}};
}}"#,
        plugin = ts(": Plugin"),
    ));

    statements.push(format!(
        r#"function mdxFrontmatterVirtualModule(){plugin} {{
	const virtualModuleId = "solid:content";
	const resolveVirtualModuleId = "\0" + virtualModuleId;
	return {{
		name: "solid:content",
		enforce: "post",
		resolveId(id{string}) {{
			if (id === virtualModuleId) {{
				return resolveVirtualModuleId;
			}}
		}},
		async load(id{string}) {{
			if (id === resolveVirtualModuleId) {{
				return `import content from "./.vinxi/mdx/data";\nexport {{ content }};`;
			}}
		}},
	}};
}}"#,
        plugin = ts(": Plugin"),
        string = ts(": string"),
    ));
    statements
}

#[cfg(test)]
mod tests {
    use graft_core::application::AddonRequest;

    use super::super::testing::{apply, kit_project, read};
    use super::*;
    use crate::filesystem::MemoryFilesystem;

    const APP_CONFIG: &str = "import { defineConfig } from \"@solidjs/start/config\";\n\nexport default defineConfig({});\n";

    #[test]
    fn helpers_parse_in_both_flavours() {
        for typescript in [true, false] {
            for code in helper_source(typescript) {
                common::statement_from_string(&code).unwrap();
            }
        }
        assert!(!helper_source(false).iter().any(|s| s.contains(": Entry[]")));
    }

    #[test]
    fn typescript_project_is_wired() {
        let fs = MemoryFilesystem::new().with_file("/app/app.config.ts", APP_CONFIG);
        let ws = kit_project(true).build();
        let report = apply(&fs, &ws, &[AddonRequest::new("mdx")]).unwrap();

        assert!(read(&fs, "global.d.ts").contains("declare module \"solid:content\""));

        let config = read(&fs, "app.config.ts");
        assert!(config.contains("/* @ts-expect-error no-types */"));
        assert!(config.contains("import pkg from \"@vinxi/plugin-mdx\";"));
        assert!(config.contains("import type { Plugin } from \"vinxi/dist/types/lib/vite-dev\";"));
        assert!(config.contains("type Entry = {"));
        assert!(config.contains("function mdxFrontmatterVirtualModule(): Plugin"));
        assert!(config.contains("extensions: [\"mdx\", \"md\"]"));
        assert!(config.contains("getFrontmatterPlugin()"));
        assert!(config.contains("jsxImportSource: \"solid-js\""));

        let helpers = config.find("const MAIN_ENTRY").unwrap();
        let export = config.find("export default defineConfig").unwrap();
        assert!(helpers < export);

        let deps = &report.addons[0].dependencies;
        assert_eq!(deps.len(), 5);
    }

    #[test]
    fn existing_global_types_are_kept() {
        let fs = MemoryFilesystem::new()
            .with_file("/app/app.config.ts", APP_CONFIG)
            .with_file("/app/global.d.ts", "/// <reference types=\"@solidjs/start/env\" />\n");
        apply(&fs, &kit_project(true).build(), &[AddonRequest::new("mdx")]).unwrap();
        assert_eq!(
            read(&fs, "global.d.ts"),
            "/// <reference types=\"@solidjs/start/env\" />\n"
        );
    }

    #[test]
    fn javascript_project_has_no_types() {
        let fs = MemoryFilesystem::new().with_file("/app/app.config.js", APP_CONFIG);
        apply(&fs, &kit_project(false).build(), &[AddonRequest::new("mdx")]).unwrap();
        let config = read(&fs, "app.config.js");
        assert!(!config.contains("@ts-expect-error"));
        assert!(!config.contains("type Entry"));
        assert!(config.contains("function getMdxData(entry) {"));
        assert!(fs.get("/app/global.d.ts").is_none());
    }

    #[test]
    fn second_run_is_a_no_op() {
        let fs = MemoryFilesystem::new().with_file("/app/app.config.ts", APP_CONFIG);
        let ws = kit_project(true).build();
        apply(&fs, &ws, &[AddonRequest::new("mdx")]).unwrap();
        let first = read(&fs, "app.config.ts");
        apply(&fs, &ws, &[AddonRequest::new("mdx")]).unwrap();
        assert_eq!(read(&fs, "app.config.ts"), first);
        assert_eq!(first.matches("function makeFiles").count(), 1);
    }
}

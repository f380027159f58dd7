use graft_core::{
    application::{Addon, RunContext},
    domain::{Choice, OptionSchema},
    error::GraftResult,
    tooling::{
        MutationError, css,
        js::{self, Expr, ExprKind, array, common, exports, imports, object},
    },
};

use super::common::pick;

struct Plugin {
    id: &'static str,
    package: &'static str,
    version: &'static str,
    identifier: &'static str,
}

static PLUGINS: [Plugin; 3] = [
    Plugin {
        id: "typography",
        package: "@tailwindcss/typography",
        version: "^0.5.15",
        identifier: "typography",
    },
    Plugin {
        id: "forms",
        package: "@tailwindcss/forms",
        version: "^0.5.9",
        identifier: "forms",
    },
    Plugin {
        id: "container-queries",
        package: "@tailwindcss/container-queries",
        version: "^0.1.1",
        identifier: "containerQueries",
    },
];

const PRETTIER_PLUGIN: &str = "prettier-plugin-tailwindcss";

pub struct Tailwindcss;

impl Addon for Tailwindcss {
    fn id(&self) -> &'static str {
        "tailwindcss"
    }

    fn short_description(&self) -> &'static str {
        "css framework"
    }

    fn homepage(&self) -> &'static str {
        "https://tailwindcss.com"
    }

    fn options(&self) -> OptionSchema {
        let choices = PLUGINS
            .iter()
            .map(|p| Choice {
                hint: Some(p.package),
                ..Choice::new(p.id, p.id)
            })
            .collect();
        OptionSchema::new().multiselect("plugins", "Which plugins would you like to add?", &[], choices)
    }

    fn run(&self, cx: &mut RunContext<'_>) -> GraftResult<()> {
        let typescript = cx.workspace().typescript();
        let prettier = cx.workspace().has_dependency("prettier");
        let selected: Vec<&Plugin> = PLUGINS
            .iter()
            .filter(|p| cx.options().list("plugins").iter().any(|id| id == p.id))
            .collect();

        cx.dev_dependency("tailwindcss", "^3.4.9");
        cx.dev_dependency("autoprefixer", "^10.4.20");
        if prettier {
            cx.dev_dependency(PRETTIER_PLUGIN, "^0.6.5");
        }
        for plugin in &selected {
            cx.dependency(plugin.package, plugin.version);
        }

        let config = format!("tailwind.config.{}", pick(typescript, "ts", "js"));
        cx.file(&config, |content| {
            let mut doc = js::parse_script(content)?;
            if typescript {
                imports::add_named(&mut doc.ast, "tailwindcss", &[("Config", "Config")], true);
            }
            {
                let fallback = if typescript {
                    common::satisfies_expression(object::create_empty(), "Config")
                } else {
                    object::create_empty()
                };
                let export = exports::default_export(&mut doc.ast, fallback);
                if !typescript {
                    common::add_jsdoc_type_comment(export.comments, "import('tailwindcss').Config");
                }
                let config = export.value.unwrap_ts_mut();
                if !matches!(config.kind, ExprKind::Object(_)) {
                    return Err(MutationError::expected("the tailwind config to be an object").into());
                }

                let content = object::property(config, "content", array::create_empty())?;
                array::push_string(content, "./src/**/*.{js,jsx,ts,tsx}")?;

                let theme = object::property(config, "theme", object::create_empty())?;
                object::property(theme, "extend", object::create_empty())?;

                let plugins = object::property(config, "plugins", array::create_empty())?;
                for plugin in &selected {
                    array::push_unique(plugins, Expr::ident(plugin.identifier))?;
                }
            }
            for plugin in &selected {
                imports::add_default(&mut doc.ast, plugin.package, plugin.identifier);
            }
            Ok(doc.generate())
        })?;

        cx.file("postcss.config.js", |content| {
            let mut doc = js::parse_script(content)?;
            let export = exports::object_default_export(&mut doc.ast)?;
            let plugins = object::property(export.value, "plugins", object::create_empty())?;
            object::property(plugins, "tailwindcss", object::create_empty())?;
            object::property(plugins, "autoprefixer", object::create_empty())?;
            Ok(doc.generate())
        })?;

        cx.file("src/app.css", |content| {
            let mut sheet = css::parse_css(content)?;
            css::add_imports(
                &mut sheet,
                &["tailwindcss/base", "tailwindcss/components", "tailwindcss/utilities"],
            );
            Ok(sheet.generate())
        })?;

        if prettier {
            cx.file("prettier.config.js", |content| {
                let mut doc = js::parse_script(content)?;
                let export = exports::object_default_export(&mut doc.ast)?;
                let plugin = Expr::string(PRETTIER_PLUGIN);
                let plugins = object::property(export.value, "plugins", array::create_empty())?;
                let present = common::has_node(&*plugins, &plugin);
                array::push_unique(plugins, plugin)?;
                if !present {
                    export.comments.clear();
                    common::add_jsdoc_type_comment(
                        export.comments,
                        "import('prettier').Config & import('prettier-plugin-tailwindcss').PluginOptions",
                    );
                }
                Ok(doc.generate())
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use graft_core::application::AddonRequest;

    use super::super::testing::{apply, kit_project, read};
    use crate::filesystem::MemoryFilesystem;

    #[test]
    fn typescript_config_satisfies_config() {
        let fs = MemoryFilesystem::new();
        let ws = kit_project(true).build();
        apply(&fs, &ws, &[AddonRequest::new("tailwindcss")]).unwrap();

        let config = read(&fs, "tailwind.config.ts");
        assert!(config.contains("import type { Config } from \"tailwindcss\";"));
        assert!(config.contains("satisfies Config"));
        assert!(config.contains("\"./src/**/*.{js,jsx,ts,tsx}\""));
        assert!(config.contains("extend: {}"));

        let postcss = read(&fs, "postcss.config.js");
        assert!(postcss.contains("tailwindcss: {}"));
        assert!(postcss.contains("autoprefixer: {}"));

        let css = read(&fs, "src/app.css");
        assert!(css.contains("@import 'tailwindcss/base';"));
        assert!(css.contains("@import 'tailwindcss/utilities';"));
        assert!(fs.get("/app/prettier.config.js").is_none());
    }

    #[test]
    fn selected_plugins_are_imported_and_registered() {
        let fs = MemoryFilesystem::new();
        let ws = kit_project(false).build();
        let request = AddonRequest::new("tailwindcss").option("plugins", "typography,container-queries");
        let report = apply(&fs, &ws, &[request]).unwrap();

        let config = read(&fs, "tailwind.config.js");
        assert!(config.contains("/** @type {import('tailwindcss').Config} */"));
        assert!(config.contains("import typography from \"@tailwindcss/typography\";"));
        assert!(config.contains("import containerQueries from \"@tailwindcss/container-queries\";"));
        assert!(config.contains("[typography, containerQueries]"));
        assert!(!config.contains("forms"));

        let deps = &report.addons[0].dependencies;
        assert!(deps.iter().any(|d| d.name == "@tailwindcss/typography" && d.range == "^0.5.15"));
        assert!(read(&fs, "package.json").contains("\"dependencies\""));
    }

    #[test]
    fn prettier_gets_the_tailwind_plugin() {
        let fs = MemoryFilesystem::new();
        let ws = kit_project(true).build();
        apply(
            &fs,
            &ws,
            &[AddonRequest::new("tailwindcss"), AddonRequest::new("prettier")],
        )
        .unwrap();

        let config = read(&fs, "prettier.config.js");
        assert!(config.contains("plugins: [\"prettier-plugin-tailwindcss\"]"));
        assert!(config.contains(
            "/** @type {import('prettier').Config & import('prettier-plugin-tailwindcss').PluginOptions} */"
        ));
        assert!(!config.contains("@type {import('prettier').Config} */"));
        assert!(read(&fs, "package.json").contains("\"prettier-plugin-tailwindcss\": \"^0.6.5\""));
    }

    #[test]
    fn running_twice_is_stable() {
        let fs = MemoryFilesystem::new().with_file("/app/src/app.css", "body {\n  margin: 0;\n}\n");
        let ws = kit_project(true).build();
        let request = AddonRequest::new("tailwindcss").option("plugins", "forms");
        apply(&fs, &ws, std::slice::from_ref(&request)).unwrap();
        let config = read(&fs, "tailwind.config.ts");
        let css = read(&fs, "src/app.css");

        apply(&fs, &ws, &[request]).unwrap();
        assert_eq!(read(&fs, "tailwind.config.ts"), config);
        assert_eq!(read(&fs, "src/app.css"), css);
        assert!(css.contains("margin: 0;"));
    }
}

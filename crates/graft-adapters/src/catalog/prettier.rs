use graft_core::{
    application::{Addon, RunContext},
    domain::major_version,
    error::GraftResult,
    tooling::{
        js::{self, common, exports, object},
        json,
    },
};
use serde_json::Value;
use tracing::warn;

use super::common::add_eslint_config_prettier;

const CHECK: &str = "prettier --check .";

const IGNORE: &str = "# Package Managers\npackage-lock.json\npnpm-lock.yaml\nyarn.lock\n";

pub struct Prettier;

impl Addon for Prettier {
    fn id(&self) -> &'static str {
        "prettier"
    }

    fn short_description(&self) -> &'static str {
        "formatter"
    }

    fn homepage(&self) -> &'static str {
        "https://prettier.io"
    }

    fn run(&self, cx: &mut RunContext<'_>) -> GraftResult<()> {
        cx.dev_dependency("prettier", "^3.3.2");

        cx.file(".prettierignore", |content| {
            Ok(if content.is_empty() {
                IGNORE.to_owned()
            } else {
                content.to_owned()
            })
        })?;

        cx.file("prettier.config.js", |content| {
            let mut doc = js::parse_script(content)?;
            let export = exports::default_export(&mut doc.ast, object::create_empty());
            let typed = export.comments.iter().any(|c| c.text.contains("@type"));
            if !typed {
                common::add_jsdoc_type_comment(export.comments, "import('prettier').Config");
            }
            Ok(doc.generate())
        })?;

        let eslint = cx.workspace().dependency_version("eslint").map(major_version);
        let eslint_v9 = eslint == Some(Some(9));
        if eslint.is_some() && !eslint_v9 {
            warn!("An older major version of eslint was detected. Skipping eslint-config-prettier installation.");
        }

        cx.file("package.json", |content| {
            let mut doc = json::parse_json(content)?;
            let scripts = json::object_entry(&mut doc.data, "scripts")?;
            json::set_default(scripts, "format", "prettier --write .");
            if eslint_v9 {
                let lint = json::set_default(scripts, "lint", format!("{CHECK} && eslint ."));
                if let Value::String(lint) = lint {
                    if !lint.contains(CHECK) {
                        lint.push_str(&format!(" && {CHECK}"));
                    }
                }
            } else {
                json::set_default(scripts, "lint", CHECK);
            }
            Ok(doc.generate())
        })?;

        if eslint_v9 {
            cx.dev_dependency("eslint-config-prettier", "^9.1.0");
            cx.file("eslint.config.js", add_eslint_config_prettier)?;
        }
        Ok(())
    }
}

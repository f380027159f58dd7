//! Implementation of the `graft add` command.
//!
//! Responsibility: describe the project, turn arguments, configured
//! defaults and answers into addon requests, call the core service and
//! display the report. No business logic lives here.

use std::collections::BTreeMap;
use std::io::IsTerminal as _;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use graft_adapters::{BuiltinCatalog, LocalFilesystem, WorkspaceResolver, package_manager};
use graft_core::{
    application::{AddonRequest, AddonService, AddonStatus, ApplyReport, PatchStatus},
    domain::{OptionSchema, Workspace},
    error::GraftError,
};

use crate::{
    cli::AddArgs,
    commands::prompt,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Execute the `graft add` command.
///
/// 1. Resolve the workspace at `--cwd`
/// 2. Build requests from the ids and `--option` values
/// 3. Fill unset options from the configuration, then by asking
/// 4. Apply (or dry-run) and print the report with next steps
#[instrument(skip_all, fields(cwd = %args.cwd.display(), addons = ?args.addons))]
pub fn execute(args: AddArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    if !args.cwd.is_dir() {
        return Err(CliError::InvalidInput {
            message: format!("'{}' is not a directory", args.cwd.display()),
            source: None,
        });
    }

    let workspace = WorkspaceResolver::new()
        .tsconfig_search(config.workspace.tsconfig_search)
        .user_agent(std::env::var(package_manager::USER_AGENT_VAR).ok())
        .resolve(&args.cwd)?;
    debug!(%workspace, "Workspace resolved");

    let service = AddonService::new(Box::new(BuiltinCatalog::new()), Arc::new(LocalFilesystem::new()));
    let schemas: BTreeMap<String, OptionSchema> =
        service.list().into_iter().map(|info| (info.id, info.options)).collect();

    let mut requests = AddonRequest::from_args(&args.addons, &args.options).map_err(GraftError::from)?;
    let interactive = !args.yes && !output.is_quiet() && std::io::stdin().is_terminal();
    for request in &mut requests {
        let Some(schema) = schemas.get(&request.id) else {
            continue;
        };
        apply_configured_defaults(request, schema, &config);
        if interactive {
            prompt::ask(&request.id, schema, &mut request.options)?;
        }
    }

    let spinner = output.spinner("Applying addons");
    let result = service.apply(&workspace, &requests, args.dry_run);
    spinner.finish_and_clear();
    let report = result?;

    info!(
        applied = report.applied().count(),
        skipped = report.skipped().count(),
        dry_run = args.dry_run,
        "Addons applied"
    );
    print_report(&report, &workspace, &output)
}

// ---- Internal Helpers ----

/// Configured defaults for options the command line left unset. Keys are
/// matched without regard to case since configuration sources may fold it.
fn apply_configured_defaults(request: &mut AddonRequest, schema: &OptionSchema, config: &AppConfig) {
    let Some(defaults) = config.addon_defaults(&request.id) else {
        return;
    };
    for (key, value) in defaults {
        if let Some(def) = schema.iter().find(|d| d.key.eq_ignore_ascii_case(key)) {
            request
                .options
                .entry(def.key.to_owned())
                .or_insert_with(|| value.clone());
        }
    }
}

fn print_report(report: &ApplyReport, workspace: &Workspace, output: &OutputManager) -> CliResult<()> {
    if report.dry_run {
        output.info("Dry run: no files were written")?;
    }

    for addon in &report.addons {
        match &addon.status {
            AddonStatus::Skipped { reason } => {
                output.warning(&format!("{} skipped: {reason}", addon.id))?;
            }
            AddonStatus::Applied => {
                output.success(&addon.id)?;
                for file in &addon.files {
                    if file.status == PatchStatus::Unchanged {
                        continue;
                    }
                    output.print(&format!("    {} {}", output.dim(file.status.as_str()), file.path))?;
                }
                for dep in &addon.dependencies {
                    output.print(&format!(
                        "    {} {}@{}",
                        output.dim(dep.kind.manifest_key()),
                        dep.name,
                        dep.range
                    ))?;
                }
            }
        }
    }

    let installs = report.applied().any(|a| !a.dependencies.is_empty());
    let mut steps: Vec<String> = Vec::new();
    if installs {
        steps.push(format!(
            "Run {} to install the new dependencies",
            workspace.package_manager().install_command()
        ));
    }
    steps.extend(report.applied().flat_map(|a| a.next_steps.iter().cloned()));

    if !steps.is_empty() {
        output.print("")?;
        output.header("Next steps:")?;
        for step in steps {
            output.print(&format!("  - {step}"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_core::domain::OptionSchema;

    fn schema() -> OptionSchema {
        OptionSchema::new()
            .text("availableLanguageTags", "Languages?", "en", None)
            .boolean("demo", "Demo?", true)
    }

    #[test]
    fn configured_defaults_fill_unset_options() {
        let mut config = AppConfig::default();
        config.addons.insert(
            "paraglide".into(),
            BTreeMap::from([
                ("availablelanguagetags".to_string(), "en,fr".to_string()),
                ("demo".to_string(), "false".to_string()),
                ("unrelated".to_string(), "x".to_string()),
            ]),
        );
        let mut request = AddonRequest::new("paraglide").option("demo", "true");
        apply_configured_defaults(&mut request, &schema(), &config);

        assert_eq!(request.options["availableLanguageTags"], "en,fr");
        assert_eq!(request.options["demo"], "true");
        assert!(!request.options.contains_key("unrelated"));
    }

    #[test]
    fn no_configuration_leaves_request_alone() {
        let mut request = AddonRequest::new("paraglide");
        apply_configured_defaults(&mut request, &schema(), &AppConfig::default());
        assert!(request.options.is_empty());
    }
}

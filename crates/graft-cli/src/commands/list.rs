//! Implementation of the `graft list` command.

use std::sync::Arc;

use graft_adapters::{BuiltinCatalog, LocalFilesystem};
use graft_core::application::{AddonInfo, AddonService};

use crate::{
    cli::{ListArgs, ListFormat},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

pub fn execute(args: ListArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let service = AddonService::new(Box::new(BuiltinCatalog::new()), Arc::new(LocalFilesystem::new()));
    let addons = service.list();

    match args.format.unwrap_or(config.output.format) {
        ListFormat::Table => {
            output.header("Available addons:")?;
            let width = addons.iter().map(|a| a.id.len()).max().unwrap_or(0);
            for addon in &addons {
                output.print(&table_row(addon, width))?;
            }
        }
        // Machine-readable formats bypass quiet mode.
        ListFormat::Json => output.json(&addons)?,
        ListFormat::List => {
            for addon in &addons {
                println!("{}", addon.id);
            }
        }
    }

    Ok(())
}

fn table_row(addon: &AddonInfo, width: usize) -> String {
    let options: Vec<&str> = addon.options.iter().map(|o| o.key).collect();
    let mut row = format!("  {:<width$}  {:<18} {}", addon.id, addon.description, addon.homepage);
    if !options.is_empty() {
        row.push_str(&format!("  [{}]", options.join(", ")));
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_core::domain::OptionSchema;

    #[test]
    fn rows_are_aligned_and_list_options() {
        let addon = AddonInfo {
            id: "lucia".into(),
            description: "auth guide".into(),
            homepage: "https://lucia-auth.com".into(),
            options: OptionSchema::new().boolean("demo", "Demo?", true),
        };
        let row = table_row(&addon, 11);
        assert!(row.starts_with("  lucia        auth guide"));
        assert!(row.ends_with("[demo]"));
    }
}

//! Interactive questions for addon options the user did not pass.
//!
//! Answers are written back as raw strings so they go through the same
//! resolution and validation as `--option` values.

use std::collections::BTreeMap;

use graft_core::domain::OptionSchema;

use crate::error::CliResult;

#[cfg(feature = "interactive")]
pub fn ask(addon: &str, schema: &OptionSchema, answers: &mut BTreeMap<String, String>) -> CliResult<()> {
    use dialoguer::{Confirm, Input, MultiSelect, Select, theme::ColorfulTheme};
    use graft_core::domain::OptionKind;

    let theme = ColorfulTheme::default();
    for def in schema.iter() {
        if answers.contains_key(def.key) {
            continue;
        }
        let prompt = format!("{addon}: {}", def.question);
        let answer = match &def.kind {
            OptionKind::Boolean { default } => Confirm::with_theme(&theme)
                .with_prompt(prompt)
                .default(*default)
                .interact()?
                .to_string(),
            OptionKind::Text { default, validate } => {
                let validate = *validate;
                Input::<String>::with_theme(&theme)
                    .with_prompt(prompt)
                    .default(default.clone())
                    .validate_with(move |input: &String| validate.map_or(Ok(()), |v| v(input)))
                    .interact_text()?
            }
            OptionKind::Select { default, choices } => {
                let labels: Vec<String> = choices.iter().map(label).collect();
                let selected = choices.iter().position(|c| c.value == default).unwrap_or(0);
                let index = Select::with_theme(&theme)
                    .with_prompt(prompt)
                    .items(&labels)
                    .default(selected)
                    .interact()?;
                choices.get(index).map(|c| c.value.to_owned()).unwrap_or_default()
            }
            OptionKind::MultiSelect { default, choices } => {
                let labels: Vec<String> = choices.iter().map(label).collect();
                let checked: Vec<bool> = choices
                    .iter()
                    .map(|c| default.iter().any(|d| d == c.value))
                    .collect();
                let picked = MultiSelect::with_theme(&theme)
                    .with_prompt(prompt)
                    .items(&labels)
                    .defaults(&checked)
                    .interact()?;
                picked
                    .into_iter()
                    .filter_map(|i| choices.get(i).map(|c| c.value))
                    .collect::<Vec<_>>()
                    .join(",")
            }
        };
        answers.insert(def.key.to_owned(), answer);
    }
    Ok(())
}

#[cfg(feature = "interactive")]
fn label(choice: &graft_core::domain::Choice) -> String {
    match choice.hint {
        Some(hint) => format!("{} ({hint})", choice.label),
        None => choice.label.to_owned(),
    }
}

/// Without the `interactive` feature every missing option keeps its default.
#[cfg(not(feature = "interactive"))]
pub fn ask(_addon: &str, _schema: &OptionSchema, _answers: &mut BTreeMap<String, String>) -> CliResult<()> {
    Ok(())
}

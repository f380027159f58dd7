//! Addon option schemas and resolved option values.
//!
//! An addon declares its options once; the values the user passed on the
//! command line (as strings) are resolved against the schema before any
//! file is touched. Missing values take their defaults, and every value
//! goes through its validator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Rejects an input with a message, or accepts it.
pub type Validator = fn(&str) -> Result<(), String>;

/// One entry of a select or multiselect option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

impl Choice {
    pub const fn new(value: &'static str, label: &'static str) -> Self {
        Self {
            value,
            label,
            hint: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OptionKind {
    Boolean {
        default: bool,
    },
    #[serde(rename = "string")]
    Text {
        default: String,
        #[serde(skip)]
        validate: Option<Validator>,
    },
    Select {
        default: String,
        choices: Vec<Choice>,
    },
    MultiSelect {
        default: Vec<String>,
        choices: Vec<Choice>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionDef {
    pub key: &'static str,
    pub question: &'static str,
    #[serde(flatten)]
    pub kind: OptionKind,
}

/// The options an addon accepts, in prompt order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct OptionSchema {
    defs: Vec<OptionDef>,
}

impl OptionSchema {
    pub fn new() -> Self {
        Self::default()
    }

    fn with(mut self, key: &'static str, question: &'static str, kind: OptionKind) -> Self {
        self.defs.push(OptionDef { key, question, kind });
        self
    }

    pub fn boolean(self, key: &'static str, question: &'static str, default: bool) -> Self {
        self.with(key, question, OptionKind::Boolean { default })
    }

    pub fn text(self, key: &'static str, question: &'static str, default: &str, validate: Option<Validator>) -> Self {
        self.with(
            key,
            question,
            OptionKind::Text {
                default: default.to_owned(),
                validate,
            },
        )
    }

    pub fn select(self, key: &'static str, question: &'static str, default: &str, choices: Vec<Choice>) -> Self {
        self.with(
            key,
            question,
            OptionKind::Select {
                default: default.to_owned(),
                choices,
            },
        )
    }

    pub fn multiselect(self, key: &'static str, question: &'static str, default: &[&str], choices: Vec<Choice>) -> Self {
        self.with(
            key,
            question,
            OptionKind::MultiSelect {
                default: default.iter().map(|s| (*s).to_owned()).collect(),
                choices,
            },
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &OptionDef> {
        self.defs.iter()
    }

    pub fn get(&self, key: &str) -> Option<&OptionDef> {
        self.defs.iter().find(|d| d.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Resolve user input (`key -> raw value`) for addon `addon`.
    pub fn resolve(&self, addon: &str, raw: &BTreeMap<String, String>) -> Result<OptionValues, DomainError> {
        if let Some(unknown) = raw.keys().find(|k| self.get(k).is_none()) {
            return Err(DomainError::UnknownOption {
                addon: addon.to_owned(),
                option: unknown.clone(),
            });
        }

        let mut values = OptionValues::default();
        for def in &self.defs {
            let invalid = |reason: String| DomainError::InvalidOption {
                addon: addon.to_owned(),
                option: def.key.to_owned(),
                reason,
            };
            let input = raw.get(def.key).map(String::as_str);
            let value = match (&def.kind, input) {
                (OptionKind::Boolean { default }, None) => OptionValue::Bool(*default),
                (OptionKind::Boolean { .. }, Some(input)) => {
                    OptionValue::Bool(parse_bool(input).ok_or_else(|| invalid(format!("'{input}' is not a yes/no value")))?)
                }
                (OptionKind::Text { default, validate }, input) => {
                    let input = input.unwrap_or(default);
                    if let Some(validate) = validate {
                        validate(input).map_err(invalid)?;
                    }
                    OptionValue::Text(input.to_owned())
                }
                (OptionKind::Select { default, choices }, input) => {
                    let input = input.unwrap_or(default);
                    if !choices.iter().any(|c| c.value == input) {
                        return Err(invalid(format!("expected one of {}", choice_list(choices))));
                    }
                    OptionValue::Text(input.to_owned())
                }
                (OptionKind::MultiSelect { default, .. }, None) => OptionValue::List(default.clone()),
                (OptionKind::MultiSelect { choices, .. }, Some(input)) => {
                    let mut selected: Vec<String> = Vec::new();
                    for item in input.split(',').map(str::trim).filter(|s| !s.is_empty() && *s != "none") {
                        if !choices.iter().any(|c| c.value == item) {
                            return Err(invalid(format!(
                                "'{item}' is not one of {}",
                                choice_list(choices)
                            )));
                        }
                        if !selected.iter().any(|s| s == item) {
                            selected.push(item.to_owned());
                        }
                    }
                    OptionValue::List(selected)
                }
            };
            values.insert(def.key, value);
        }
        Ok(values)
    }
}

fn parse_bool(input: &str) -> Option<bool> {
    match input.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Some(true),
        "false" | "no" | "n" | "0" | "off" => Some(false),
        _ => None,
    }
}

fn choice_list(choices: &[Choice]) -> String {
    choices.iter().map(|c| c.value).collect::<Vec<_>>().join(", ")
}

// ── values ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Text(String),
    List(Vec<String>),
}

/// Resolved option values of one addon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionValues(BTreeMap<String, OptionValue>);

impl OptionValues {
    pub fn insert(&mut self, key: &str, value: OptionValue) {
        self.0.insert(key.to_owned(), value);
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.0.get(key)
    }

    /// Boolean option; `false` when absent.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(OptionValue::Bool(true)))
    }

    /// Text or select option; empty when absent.
    pub fn text(&self, key: &str) -> &str {
        match self.0.get(key) {
            Some(OptionValue::Text(s)) => s,
            _ => "",
        }
    }

    /// Multiselect option; empty when absent.
    pub fn list(&self, key: &str) -> &[String] {
        match self.0.get(key) {
            Some(OptionValue::List(items)) => items,
            _ => &[],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OptionValue)> {
        self.0.iter()
    }
}

//! Object literals.
//!
//! [`property`] never touches an existing value; [`override_property`] and
//! [`override_properties`] overwrite on purpose.

use super::ast::*;
use crate::tooling::error::MutationError;

fn props_mut(obj: &mut Expr) -> Result<&mut Vec<Prop>, MutationError> {
    match &mut obj.unwrap_ts_mut().kind {
        ExprKind::Object(props) => Ok(props),
        _ => Err(MutationError::expected("an object expression")),
    }
}

fn props(obj: &Expr) -> Result<&Vec<Prop>, MutationError> {
    match &obj.unwrap_ts().kind {
        ExprKind::Object(props) => Ok(props),
        _ => Err(MutationError::expected("an object expression")),
    }
}

/// Static key name of a property; `None` for spreads and computed keys.
pub fn property_key(prop: &Prop) -> Option<&str> {
    prop.key().and_then(PropKey::name)
}

fn value_mut<'a>(prop: &'a mut Prop, key: &str) -> Result<&'a mut Expr, MutationError> {
    match &mut prop.kind {
        PropKind::KeyValue { value, .. } => Ok(value),
        _ => Err(MutationError::expected(format!(
            "property `{key}` to be a key-value property"
        ))),
    }
}

/// Value of property `key`, if present.
pub fn get<'a>(obj: &'a Expr, key: &str) -> Option<&'a Expr> {
    props(obj).ok()?.iter().find_map(|p| match &p.kind {
        PropKind::KeyValue { key: k, value, .. } if k.name() == Some(key) => Some(value),
        _ => None,
    })
}

/// Value of property `key`, appending `key: fallback` when it is missing.
pub fn property<'a>(obj: &'a mut Expr, key: &str, fallback: Expr) -> Result<&'a mut Expr, MutationError> {
    let props = props_mut(obj)?;
    let at = match props.iter().position(|p| property_key(p) == Some(key)) {
        Some(at) => at,
        None => {
            props.push(Prop::key_value(key, fallback));
            props.len() - 1
        }
    };
    value_mut(&mut props[at], key)
}

/// Set property `key` to `value`, replacing any existing value.
pub fn override_property<'a>(obj: &'a mut Expr, key: &str, value: Expr) -> Result<&'a mut Expr, MutationError> {
    let slot = property(obj, key, Expr::object(Vec::new()))?;
    if *slot != value {
        *slot = value;
    }
    Ok(slot)
}

/// Merge `entries` into `obj`. Nested object literals are merged key by
/// key; any other value replaces what is there.
pub fn override_properties(obj: &mut Expr, entries: Vec<(&str, Expr)>) -> Result<(), MutationError> {
    for (key, value) in entries {
        let nested = match &value.kind {
            ExprKind::Object(props) if !props.is_empty() => Some(props.clone()),
            _ => None,
        };
        let existing_is_object = get(obj, key).is_some_and(|v| matches!(v.unwrap_ts().kind, ExprKind::Object(_)));
        match nested {
            Some(props) if existing_is_object => {
                let slot = property(obj, key, Expr::object(Vec::new()))?;
                let entries = props
                    .into_iter()
                    .filter_map(|p| {
                        let name = property_key(&p)?.to_owned();
                        match p.kind {
                            PropKind::KeyValue { value, .. } => Some((name, value)),
                            _ => None,
                        }
                    })
                    .collect::<Vec<_>>();
                override_properties(slot, entries.iter().map(|(k, v)| (k.as_str(), v.clone())).collect())?;
            }
            _ => {
                override_property(obj, key, value)?;
            }
        }
    }
    Ok(())
}

/// `{ key: value, .. }` in the given order.
pub fn create(entries: Vec<(&str, Expr)>) -> Expr {
    Expr::object(
        entries
            .into_iter()
            .map(|(key, value)| Prop::key_value(key, value))
            .collect(),
    )
}

pub fn create_empty() -> Expr {
    Expr::object(Vec::new())
}

/// Remove property `key` and return it.
pub fn remove_property(obj: &mut Expr, key: &str) -> Result<Option<Prop>, MutationError> {
    let props = props_mut(obj)?;
    Ok(props
        .iter()
        .position(|p| property_key(p) == Some(key))
        .map(|at| props.remove(at)))
}

#[cfg(test)]
mod tests {
    use super::super::{common::expression_from_string, parse_script, print_expression};
    use super::*;

    #[test]
    fn property_keeps_first_value() {
        let mut obj = create_empty();
        property(&mut obj, "a", Expr::string("first")).unwrap();
        let value = property(&mut obj, "a", Expr::string("second")).unwrap();
        assert_eq!(value.as_str(), Some("first"));
    }

    #[test]
    fn override_replaces_value() {
        let mut obj = create(vec![("a", Expr::string("first"))]);
        override_property(&mut obj, "a", Expr::string("second")).unwrap();
        assert_eq!(get(&obj, "a").and_then(Expr::as_str), Some("second"));
    }

    #[test]
    fn nested_objects_merge() {
        let mut obj = expression_from_string("{ theme: { extend: {} }, content: [] }").unwrap();
        let update = expression_from_string("{ theme: { colors: {} } }").unwrap();
        let ExprKind::Object(props) = update.kind else { unreachable!() };
        let entries = props
            .into_iter()
            .map(|p| match p.kind {
                PropKind::KeyValue { value, .. } => ("theme", value),
                _ => unreachable!(),
            })
            .collect();
        override_properties(&mut obj, entries).unwrap();
        assert_eq!(
            print_expression(&obj),
            "{\n\ttheme: {\n\t\textend: {},\n\t\tcolors: {}\n\t},\n\tcontent: []\n}"
        );
    }

    #[test]
    fn string_keys_are_quoted() {
        let obj = create(vec![("plugin.inlang.messageFormat", create_empty())]);
        assert_eq!(print_expression(&obj), "{\n\t\"plugin.inlang.messageFormat\": {}\n}");
    }

    #[test]
    fn remove_property_returns_the_removed_node() {
        let mut doc = parse_script("export default { a: 1, b: 2 };\n").unwrap();
        let export = super::super::exports::object_default_export(&mut doc.ast).unwrap();
        let removed = remove_property(export.value, "a").unwrap();
        assert!(removed.is_some());
        assert_eq!(doc.generate(), "export default { b: 2 };\n");
    }

    #[test]
    fn non_objects_are_rejected() {
        let mut arr = Expr::array(Vec::new());
        let err = property(&mut arr, "a", Expr::string("x")).unwrap_err();
        assert_eq!(err.expected, "an object expression");
    }
}

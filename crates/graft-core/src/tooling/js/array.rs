//! Array literals.

use super::ast::*;
use crate::tooling::error::MutationError;

fn elements_mut(arr: &mut Expr) -> Result<&mut Vec<Option<Expr>>, MutationError> {
    match &mut arr.unwrap_ts_mut().kind {
        ExprKind::Array(elements) => Ok(elements),
        _ => Err(MutationError::expected("an array expression")),
    }
}

pub fn create_empty() -> Expr {
    Expr::array(Vec::new())
}

/// Append `element`, even when an equal one is already present.
pub fn push(arr: &mut Expr, element: Expr) -> Result<&mut Expr, MutationError> {
    let elements = elements_mut(arr)?;
    elements.push(Some(element));
    match elements.last_mut() {
        Some(Some(last)) => Ok(last),
        _ => unreachable!("just pushed an element"),
    }
}

/// Append `element` unless a structurally equal element exists; returns
/// the element in the array either way.
pub fn push_unique(arr: &mut Expr, element: Expr) -> Result<&mut Expr, MutationError> {
    let elements = elements_mut(arr)?;
    let at = match elements.iter().position(|e| e.as_ref() == Some(&element)) {
        Some(at) => at,
        None => {
            elements.push(Some(element));
            elements.len() - 1
        }
    };
    match &mut elements[at] {
        Some(existing) => Ok(existing),
        None => unreachable!("holes never equal an element"),
    }
}

/// [`push_unique`] for a string literal.
pub fn push_string<'a>(arr: &'a mut Expr, value: &str) -> Result<&'a mut Expr, MutationError> {
    push_unique(arr, Expr::string(value))
}

#[cfg(test)]
mod tests {
    use super::super::{common::expression_from_string, print_expression};
    use super::*;

    #[test]
    fn push_is_unconditional() {
        let mut arr = create_empty();
        push(&mut arr, Expr::ident("a")).unwrap();
        push(&mut arr, Expr::ident("a")).unwrap();
        assert_eq!(print_expression(&arr), "[a, a]");
    }

    #[test]
    fn push_unique_compares_structurally() {
        let mut arr = expression_from_string("[mdx.withDefaults({ jsx: true })]").unwrap();
        push_unique(&mut arr, expression_from_string("mdx.withDefaults({ jsx: true })").unwrap()).unwrap();
        push_string(&mut arr, "md").unwrap();
        push_string(&mut arr, "md").unwrap();
        assert_eq!(print_expression(&arr), "[mdx.withDefaults({\n\tjsx: true\n}), \"md\"]");
    }

    #[test]
    fn non_arrays_are_rejected() {
        let mut obj = Expr::object(Vec::new());
        assert!(push(&mut obj, Expr::ident("a")).is_err());
    }
}

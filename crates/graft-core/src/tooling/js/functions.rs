//! Function calls.

use super::ast::*;
use crate::tooling::error::MutationError;

/// `name(args..)`
pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::Call(Call {
        callee: Box::new(Expr::ident(name)),
        type_args: None,
        args,
        optional: false,
    }))
}

/// `name("a", "b", ..)`
pub fn call_with_strings(name: &str, args: &[&str]) -> Expr {
    call(name, args.iter().map(|a| Expr::string(*a)).collect())
}

pub fn as_call_mut(expr: &mut Expr) -> Result<&mut Call, MutationError> {
    match &mut expr.unwrap_ts_mut().kind {
        ExprKind::Call(call) => Ok(call),
        _ => Err(MutationError::expected("a call expression")),
    }
}

/// Name of a plain identifier callee.
pub fn callee_name(call: &Call) -> Option<&str> {
    call.callee.as_ident()
}

/// Argument `index` of the call, appending `fallback` when the call has
/// exactly `index` arguments.
pub fn argument_by_index(expr: &mut Expr, index: usize, fallback: Expr) -> Result<&mut Expr, MutationError> {
    let call = as_call_mut(expr)?;
    if call.args.len() == index {
        call.args.push(fallback);
    }
    call.args.get_mut(index).ok_or_else(|| {
        MutationError::expected(format!("call to have at least {index} arguments"))
    })
}

#[cfg(test)]
mod tests {
    use super::super::{common::expression_from_string, print_expression};
    use super::*;

    #[test]
    fn builds_calls() {
        assert_eq!(
            print_expression(&call_with_strings("sqliteTable", &["user"])),
            "sqliteTable(\"user\")"
        );
    }

    #[test]
    fn missing_argument_is_appended() {
        let mut expr = expression_from_string("defineConfig()").unwrap();
        argument_by_index(&mut expr, 0, Expr::object(Vec::new())).unwrap();
        argument_by_index(&mut expr, 0, Expr::ident("unused")).unwrap();
        assert_eq!(print_expression(&expr), "defineConfig({})");
    }

    #[test]
    fn gaps_in_arguments_are_errors() {
        let mut expr = expression_from_string("f()").unwrap();
        assert!(argument_by_index(&mut expr, 2, Expr::ident("x")).is_err());
        let mut not_call = Expr::ident("f");
        assert!(as_call_mut(&mut not_call).is_err());
    }
}

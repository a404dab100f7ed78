//! `required=` / `default_value=` handling.
//!
//! Only literals count: a computed value for either keyword says nothing
//! about nullability, so it never makes a field or argument non-null.
use crate::ast::{BUILTINS_FALSE, BUILTINS_NONE, BUILTINS_TRUE, CallExpr, Expr};

/// `required=True`, spelled as the literal.
pub fn is_required_literal_true(call: &CallExpr) -> bool {
    call.keyword("required").is_some_and(|value| value.is_named_constant(BUILTINS_TRUE))
}

/// `default_value=` given a literal other than `None`.
pub fn has_non_null_literal_default(call: &CallExpr) -> bool {
    call.keyword("default_value").is_some_and(|value| is_literal(value) && !value.is_named_constant(BUILTINS_NONE))
}

/// Either keyword pins the value as present.
pub fn forces_non_null(call: &CallExpr) -> bool {
    is_required_literal_true(call) || has_non_null_literal_default(call)
}

fn is_literal(expr: &Expr) -> bool {
    match expr {
        Expr::Str(_) | Expr::Int(_) | Expr::Float(_) => true,
        Expr::Name(_) | Expr::Member(_) => {
            expr.is_named_constant(BUILTINS_TRUE)
                || expr.is_named_constant(BUILTINS_FALSE)
                || expr.is_named_constant(BUILTINS_NONE)
        }
        Expr::Tuple(tuple) => tuple.items.iter().all(is_literal),
        Expr::List(list) => list.items.iter().all(is_literal),
        Expr::Unary(unary) => {
            matches!(unary.op.as_str(), "-" | "+") && matches!(*unary.operand, Expr::Int(_) | Expr::Float(_))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, ARGUMENT, STRING};

    fn argument(keywords: Vec<(&str, Expr)>) -> CallExpr {
        match testing::call(ARGUMENT, vec![testing::name(STRING)], keywords) {
            Expr::Call(call) => call,
            _ => unreachable!(),
        }
    }

    #[test]
    fn required_true_literal() {
        assert!(is_required_literal_true(&argument(vec![("required", testing::name(BUILTINS_TRUE))])));
        assert!(!is_required_literal_true(&argument(vec![("required", testing::name(BUILTINS_FALSE))])));
        assert!(!is_required_literal_true(&argument(vec![])));
    }

    #[test]
    fn computed_required_is_not_required() {
        let computed = testing::call("app.flags.is_required", vec![], vec![]);
        assert!(!forces_non_null(&argument(vec![("required", computed)])));
        // a variable that happens to hold True
        let variable = testing::name("app.REQUIRED");
        assert!(!forces_non_null(&argument(vec![("required", variable)])));
    }

    #[test]
    fn default_value_literals() {
        assert!(has_non_null_literal_default(&argument(vec![("default_value", testing::str_lit("x"))])));
        assert!(has_non_null_literal_default(&argument(vec![("default_value", testing::int_lit(0))])));
        assert!(has_non_null_literal_default(&argument(vec![("default_value", testing::name(BUILTINS_FALSE))])));
        assert!(!has_non_null_literal_default(&argument(vec![("default_value", testing::name(BUILTINS_NONE))])));
        assert!(!has_non_null_literal_default(&argument(vec![])));
    }

    #[test]
    fn signed_numbers_and_lists_are_literals() {
        let minus_one = testing::unary("-", testing::int_lit(1));
        assert!(has_non_null_literal_default(&argument(vec![("default_value", minus_one)])));
        let names = testing::list(vec![testing::str_lit("a"), testing::str_lit("b")]);
        assert!(has_non_null_literal_default(&argument(vec![("default_value", names)])));
        let empty = testing::list(vec![]);
        assert!(has_non_null_literal_default(&argument(vec![("default_value", empty)])));
        let negated_call = testing::unary("-", testing::call("app.defaults.offset", vec![], vec![]));
        assert!(!has_non_null_literal_default(&argument(vec![("default_value", negated_call)])));
        let not_true = testing::unary("not", testing::name(BUILTINS_TRUE));
        assert!(!has_non_null_literal_default(&argument(vec![("default_value", not_true)])));
    }

    #[test]
    fn computed_default_is_not_a_literal() {
        let computed = testing::call("app.defaults.page_size", vec![], vec![]);
        assert!(!has_non_null_literal_default(&argument(vec![("default_value", computed)])));
    }

    #[test]
    fn required_wins_regardless_of_default() {
        let call = argument(vec![
            ("required", testing::name(BUILTINS_TRUE)),
            ("default_value", testing::name(BUILTINS_NONE)),
        ]);
        assert!(forces_non_null(&call));
    }
}

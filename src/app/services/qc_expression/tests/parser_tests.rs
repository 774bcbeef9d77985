//! Tests for expression parsing

use crate::app::services::qc_expression::parser::{
    BinaryOp, Expr, Function, UnaryOp, parse_expression,
};

fn field(name: &str) -> Box<Expr> {
    Box::new(Expr::Field(name.to_string()))
}

fn number(value: f64) -> Box<Expr> {
    Box::new(Expr::Number(value))
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let expr = parse_expression("a + b * 2").unwrap();
    assert_eq!(
        expr,
        Expr::Binary {
            op: BinaryOp::Add,
            left: field("a"),
            right: Box::new(Expr::Binary {
                op: BinaryOp::Mul,
                left: field("b"),
                right: number(2.0),
            }),
        }
    );
}

#[test]
fn test_and_binds_tighter_than_or() {
    let expr = parse_expression("a or b and c").unwrap();
    let Expr::Binary { op, right, .. } = expr else {
        panic!("expected binary expression");
    };
    assert_eq!(op, BinaryOp::Or);
    assert!(matches!(*right, Expr::Binary { op: BinaryOp::And, .. }));
}

#[test]
fn test_subtraction_is_left_associative() {
    let expr = parse_expression("10 - 4 - 3").unwrap();
    assert_eq!(
        expr,
        Expr::Binary {
            op: BinaryOp::Sub,
            left: Box::new(Expr::Binary {
                op: BinaryOp::Sub,
                left: number(10.0),
                right: number(4.0),
            }),
            right: number(3.0),
        }
    );
}

#[test]
fn test_comparison_with_negative_literal() {
    let expr = parse_expression("Sv_mean > -90").unwrap();
    assert_eq!(
        expr,
        Expr::Binary {
            op: BinaryOp::Gt,
            left: field("Sv_mean"),
            right: Box::new(Expr::Unary {
                op: UnaryOp::Neg,
                operand: number(90.0),
            }),
        }
    );
}

#[test]
fn test_parentheses_and_calls() {
    let expr = parse_expression("not (isnan(x) or max(x, 0) == 0)").unwrap();
    let Expr::Unary { op, operand } = expr else {
        panic!("expected unary expression");
    };
    assert_eq!(op, UnaryOp::Not);
    assert_eq!(operand.fields(), vec!["x"]);

    let call = parse_expression("min(a, b)").unwrap();
    assert_eq!(
        call,
        Expr::Call {
            function: Function::Min,
            args: vec![Expr::Field("a".to_string()), Expr::Field("b".to_string())],
        }
    );
}

#[test]
fn test_syntax_errors() {
    let cases = [
        ("", "empty expression"),
        ("a >", "end of expression"),
        ("(a + 1", "')'"),
        ("a b", "offset 2"),
        ("exp(a)", "unknown function 'exp'"),
        ("abs(a, b)", "takes 1 argument"),
    ];

    for (source, expected) in cases {
        let err = parse_expression(source).unwrap_err();
        assert!(
            err.to_string().contains(expected),
            "'{}' gave '{}'",
            source,
            err
        );
    }
}

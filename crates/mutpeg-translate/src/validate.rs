//! SIMPLE subset validation.
//!
//! Runs before translation so that an unsupported method is rejected with a
//! readable reason instead of failing halfway through interning.

use crate::ast::{Expr, MethodDecl, Stmt, UnaryOp};
use crate::error::ValidationError;

const INT_MIN_MAGNITUDE: i64 = 1 << 31;

/// Checks that `method` stays inside the supported subset.
pub fn validate_method(method: &MethodDecl) -> Result<(), ValidationError> {
    for stmt in &method.body {
        check_stmt(stmt)?;
    }

    let returns: usize = method.body.iter().map(Stmt::count_returns).sum();
    if returns > 1 {
        return Err(ValidationError::MultipleReturns);
    }
    if returns == 1 && !matches!(method.body.last(), Some(Stmt::Return { .. })) {
        return Err(ValidationError::InvalidReturn {
            reason: format!("return in {} is not its last statement", method.signature()),
        });
    }
    Ok(())
}

pub fn is_supported(method: &MethodDecl) -> bool {
    validate_method(method).is_ok()
}

fn check_stmt(stmt: &Stmt) -> Result<(), ValidationError> {
    match stmt {
        Stmt::Block { stmts } => stmts.iter().try_for_each(check_stmt),
        Stmt::Expr { expr } => {
            let allowed = match expr {
                Expr::Assign { .. } | Expr::Declare { .. } | Expr::MethodCall { .. } => true,
                Expr::Unary { op, .. } => op.is_side_effecting(),
                _ => false,
            };
            if !allowed {
                return Err(ValidationError::UnsupportedStatement {
                    construct: format!("{} used as a statement", expr.describe()),
                });
            }
            check_expr(expr)
        }
        Stmt::If { cond, then, els } => {
            check_expr(cond)?;
            check_stmt(then)?;
            els.as_deref().map_or(Ok(()), check_stmt)
        }
        Stmt::While { cond, body } => {
            check_expr(cond)?;
            check_stmt(body)
        }
        Stmt::Return { value } => value.as_ref().map_or(Ok(()), check_expr),
        Stmt::Empty => Ok(()),
        Stmt::Break => Err(ValidationError::UnsupportedStatement {
            construct: "break".into(),
        }),
        Stmt::Continue => Err(ValidationError::UnsupportedStatement {
            construct: "continue".into(),
        }),
    }
}

fn check_expr(expr: &Expr) -> Result<(), ValidationError> {
    match expr {
        Expr::IntLit { value } => check_int(*value),
        Expr::BoolLit { .. } | Expr::StringLit { .. } | Expr::Null | Expr::Name { .. } | Expr::This => {
            Ok(())
        }
        Expr::FieldAccess { scope, .. } => check_expr(scope),
        Expr::ArrayAccess { .. } => Err(ValidationError::UnsupportedExpression {
            construct: "array access".into(),
        }),
        Expr::Binary { lhs, rhs, .. } => {
            check_expr(lhs)?;
            check_expr(rhs)
        }
        Expr::Unary { op, operand } => {
            if *op == UnaryOp::Minus {
                if let Expr::IntLit { value } = operand.as_ref() {
                    return if *value == INT_MIN_MAGNITUDE {
                        Ok(())
                    } else {
                        check_int(*value)
                    };
                }
            }
            if op.is_side_effecting() {
                check_target(operand)?;
            }
            check_expr(operand)
        }
        Expr::Conditional { cond, then, els } => {
            check_expr(cond)?;
            check_expr(then)?;
            check_expr(els)
        }
        Expr::Assign { target, value } => {
            check_target(target)?;
            check_expr(target)?;
            check_expr(value)
        }
        Expr::Declare { declarators } => declarators
            .iter()
            .filter_map(|d| d.init.as_ref())
            .try_for_each(check_expr),
        Expr::MethodCall { scope, args, .. } => {
            if let Some(scope) = scope {
                check_expr(scope)?;
            }
            args.iter().try_for_each(check_expr)
        }
    }
}

/// Lvalues are plain names and field chains rooted at a name or `this`.
fn check_target(target: &Expr) -> Result<(), ValidationError> {
    let mut base = target;
    let mut depth = 0;
    while let Expr::FieldAccess { scope, .. } = base {
        base = scope.as_ref();
        depth += 1;
    }
    match base {
        Expr::Name { .. } => Ok(()),
        Expr::This if depth > 0 => Ok(()),
        other => Err(ValidationError::InvalidAssignmentTarget {
            target: other.describe().into(),
        }),
    }
}

fn check_int(value: i64) -> Result<(), ValidationError> {
    if i32::try_from(value).is_err() {
        return Err(ValidationError::LiteralOutOfRange { value });
    }
    Ok(())
}

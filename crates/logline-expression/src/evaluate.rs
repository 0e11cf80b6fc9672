//! Tree-walking evaluator.

use std::cmp::Ordering;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::functions::Callable;
use crate::types::JsValue;
use crate::util::{
    add, compare, get_member, is_truthy, loose_equals, property_key, strict_equals, to_number,
};

/// Evaluate an expression tree against a context.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use logline_expression::{evaluate, functions_map, parse_expression, EvalCtx, JsValue, Vars};
/// use serde_json::json;
///
/// let expr = parse_expression("user.age >= 18 ? 'adult' : 'minor'").unwrap();
/// let vars = Vars::new(json!({"user": {"age": 20}}));
/// let ctx = EvalCtx::new(&vars, Arc::new(functions_map()));
/// assert_eq!(evaluate(&expr, &ctx).unwrap(), JsValue::from("adult"));
/// ```
pub fn evaluate(expr: &Expr, ctx: &EvalCtx) -> Result<JsValue, EvalError> {
    match expr {
        Expr::Literal(lit) => Ok(lit.to_value()),
        Expr::Identifier(name) => Ok(ctx.vars.resolve(name)),
        Expr::Member { object, property } => {
            if let Some(value) = expr.dotted_name().and_then(|n| ctx.vars.get_exact(&n).cloned()) {
                return Ok(JsValue::Json(value));
            }
            let base = evaluate(object, ctx)?;
            Ok(get_member(&base, property))
        }
        Expr::Computed { object, property } => {
            let base = evaluate(object, ctx)?;
            let key = evaluate(property, ctx)?;
            Ok(get_member(&base, &property_key(&key)))
        }
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, ctx)?;
            Ok(match op {
                UnaryOp::Not => JsValue::from(!is_truthy(&value)),
                UnaryOp::Neg => JsValue::from_f64(-to_number(&value)),
                UnaryOp::Plus => JsValue::from_f64(to_number(&value)),
            })
        }
        Expr::Binary { op, left, right } => eval_binary(*op, left, right, ctx),
        Expr::Ternary {
            condition,
            when_true,
            when_false,
        } => {
            if is_truthy(&evaluate(condition, ctx)?) {
                evaluate(when_true, ctx)
            } else {
                evaluate(when_false, ctx)
            }
        }
        Expr::Call { callee, arguments } => eval_call(callee, arguments, ctx),
    }
}

fn eval_binary(op: BinaryOp, left: &Expr, right: &Expr, ctx: &EvalCtx) -> Result<JsValue, EvalError> {
    let l = evaluate(left, ctx)?;
    match op {
        BinaryOp::And if !is_truthy(&l) => return Ok(l),
        BinaryOp::Or if is_truthy(&l) => return Ok(l),
        BinaryOp::And | BinaryOp::Or => return evaluate(right, ctx),
        _ => {}
    }
    let r = evaluate(right, ctx)?;
    Ok(match op {
        BinaryOp::StrictEq => JsValue::from(strict_equals(&l, &r)),
        BinaryOp::StrictNe => JsValue::from(!strict_equals(&l, &r)),
        BinaryOp::Eq => JsValue::from(loose_equals(&l, &r)),
        BinaryOp::Ne => JsValue::from(!loose_equals(&l, &r)),
        BinaryOp::Lt => JsValue::from(compare(&l, &r) == Some(Ordering::Less)),
        BinaryOp::Gt => JsValue::from(compare(&l, &r) == Some(Ordering::Greater)),
        BinaryOp::Le => JsValue::from(matches!(
            compare(&l, &r),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::Ge => JsValue::from(matches!(
            compare(&l, &r),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOp::Add => add(&l, &r),
        BinaryOp::Sub => JsValue::from_f64(to_number(&l) - to_number(&r)),
        BinaryOp::Mul => JsValue::from_f64(to_number(&l) * to_number(&r)),
        BinaryOp::Div => JsValue::from_f64(to_number(&l) / to_number(&r)),
        BinaryOp::Mod => JsValue::from_f64(to_number(&l) % to_number(&r)),
        // Short-circuited above.
        BinaryOp::And | BinaryOp::Or => r,
    })
}

/// Resolve the callee first; arguments are only evaluated for a permitted
/// call.
fn eval_call(callee: &Expr, arguments: &[Expr], ctx: &EvalCtx) -> Result<JsValue, EvalError> {
    if let Some(host) = callee.dotted_name().and_then(|n| ctx.vars.function(&n)) {
        let args = eval_args(None, arguments, ctx)?;
        return host.invoke(&args);
    }
    match callee {
        Expr::Identifier(name) => match ctx.functions.get(name) {
            Some(builtin) => invoke(builtin, None, arguments, ctx),
            None if !ctx.vars.resolve(name).is_undefined() => {
                Err(EvalError::NotCallable(name.clone()))
            }
            None => Err(EvalError::CallNotAllowed(name.clone())),
        },
        Expr::Member { object, property } => match ctx.functions.get(property) {
            Some(builtin) => {
                let receiver = evaluate(object, ctx)?;
                invoke(builtin, Some(receiver), arguments, ctx)
            }
            None => Err(EvalError::CallNotAllowed(
                callee.dotted_name().unwrap_or_else(|| property.clone()),
            )),
        },
        _ => Err(EvalError::CallNotAllowed("computed callee".to_string())),
    }
}

fn invoke(
    callable: &Callable,
    receiver: Option<JsValue>,
    arguments: &[Expr],
    ctx: &EvalCtx,
) -> Result<JsValue, EvalError> {
    let args = eval_args(receiver, arguments, ctx)?;
    callable.invoke(&args)
}

fn eval_args(
    receiver: Option<JsValue>,
    arguments: &[Expr],
    ctx: &EvalCtx,
) -> Result<Vec<JsValue>, EvalError> {
    let mut args = Vec::with_capacity(arguments.len() + 1);
    args.extend(receiver);
    for argument in arguments {
        args.push(evaluate(argument, ctx)?);
    }
    Ok(args)
}

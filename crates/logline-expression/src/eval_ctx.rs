use std::sync::Arc;

use crate::functions::FunctionMap;
use crate::vars::Vars;

/// The execution context passed down the evaluator.
pub struct EvalCtx<'a> {
    /// Data and host functions.
    pub vars: &'a Vars,
    /// The allow-listed built-in functions.
    pub functions: Arc<FunctionMap>,
}

impl<'a> EvalCtx<'a> {
    pub fn new(vars: &'a Vars, functions: Arc<FunctionMap>) -> Self {
        EvalCtx { vars, functions }
    }
}

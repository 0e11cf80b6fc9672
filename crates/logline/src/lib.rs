//! Declarative UI runtime.
//!
//! - [`parser`]: LogLine documents into block trees, with components
//! - [`expression`]: the sandboxed language behind `{{ }}` and bindings
//! - [`state`]: the reactive store the expressions read from
//!
//! [`Runtime`] wires one of each together.

pub mod cli;
mod config;
mod runtime;

pub use logline_expression as expression;
pub use logline_parser as parser;
pub use logline_path as path;
pub use logline_state as state;

pub use config::{ConfigError, RuntimeConfig};
pub use runtime::{Runtime, BOUND_VALUE};

pub use logline_expression::{ExpressionEngine, JsValue, Vars};
pub use logline_parser::{Block, BlockDocument, LogLineParser};
pub use logline_state::StateStore;

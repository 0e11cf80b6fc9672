//! Parser for LogLine, the indentation-based block DSL that describes UI
//! structure.
//!
//! ```text
//! - type: container
//!   class: "parent"
//!   children:
//!     - type: input
//!       bind: "user.name"
//!     - type: button
//!       on: "click: sendMessage"
//!       content: "Send"
//! ```
//!
//! Every list item is a [`Block`]: the mandatory `type:` key, then
//! `key: value` properties at one consistent deeper indentation, and an
//! optional `children:` list nested deeper still. `bind` must be a dotted
//! identifier path and `on` must read `event: handler`.
//!
//! A block whose type names a registered component is expanded from the
//! component's template; the instance's properties are visible to the
//! template as `{{props.*}}`.

mod block;
mod component;
mod error;
mod parser;
pub mod validate;
pub mod value;

pub use block::{Block, BlockDocument};
pub use component::{ComponentRegistry, PROPS};
pub use error::{IssueKind, ParseIssue, SyntaxError, SyntaxErrorKind};
pub use parser::{LogLineParser, ParserOptions};

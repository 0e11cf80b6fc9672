//! Line-oriented LogLine parser.

use logline_expression::{interpolation_regex, validate_expression, ExpressionEngine};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::block::{Block, BlockDocument};
use crate::component::{ComponentRegistry, Expander};
use crate::error::{IssueKind, ParseIssue, SyntaxError, SyntaxErrorKind};
use crate::validate::{is_valid_bind, is_valid_on};
use crate::value::parse_scalar;

const CHILDREN: &str = "children";
const TYPE: &str = "type";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Report `{{ }}` spans that fail the expression denylist.
    pub validate_interpolations: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            validate_interpolations: true,
        }
    }
}

/// LogLine parser with a component registry.
///
/// # Example
///
/// ```
/// use logline_parser::LogLineParser;
///
/// let mut parser = LogLineParser::new();
/// let doc = parser
///     .parse(
///         "
/// - type: container
///   class: \"parent\"
///   children:
///     - type: text
///       content: \"Child text\"
/// ",
///     )
///     .unwrap();
/// assert_eq!(doc.blocks.len(), 1);
/// assert_eq!(doc.blocks[0].children[0].block_type, "text");
/// ```
#[derive(Default)]
pub struct LogLineParser {
    options: ParserOptions,
    components: ComponentRegistry,
    engine: ExpressionEngine,
}

impl LogLineParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParserOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Use a specific expression engine for template substitution.
    pub fn with_engine(mut self, engine: ExpressionEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse LogLine source into a block document.
    ///
    /// Structural problems fail the whole call. Circular component
    /// references and unsafe interpolation spans are collected on
    /// [`BlockDocument::errors`].
    pub fn parse(&mut self, source: &str) -> Result<BlockDocument, SyntaxError> {
        let lines = scan(source)?;
        let mut errors = Vec::new();
        let mut builder = TreeBuilder {
            lines: &lines,
            pos: 0,
            issues: &mut errors,
            validate_interpolations: self.options.validate_interpolations,
        };
        let mut blocks = builder.parse_document()?;
        Expander::new(&self.components, &mut self.engine, &mut errors).expand_all(&mut blocks);
        Ok(BlockDocument { blocks, errors })
    }

    /// Register a parsed document as a component template.
    pub fn register_component(&mut self, name: impl Into<String>, template: BlockDocument) {
        let name = name.into();
        tracing::debug!(component = %name, blocks = template.blocks.len(), "registering component");
        self.components.register(name, template.blocks);
    }

    pub fn unregister_component(&mut self, name: &str) -> bool {
        self.components.unregister(name)
    }

    pub fn has_component(&self, name: &str) -> bool {
        self.components.contains(name)
    }

    pub fn component_names(&self) -> Vec<&str> {
        self.components.names()
    }

    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }
}

#[derive(Debug)]
struct Line<'a> {
    /// 1-based.
    number: usize,
    indent: usize,
    text: &'a str,
}

impl Line<'_> {
    fn is_item(&self) -> bool {
        self.text == "-" || self.text.starts_with("- ")
    }

    fn error(&self, kind: SyntaxErrorKind) -> SyntaxError {
        SyntaxError::new(self.number, kind)
    }
}

/// Significant lines: blank lines and `#` comments dropped.
fn scan(source: &str) -> Result<Vec<Line<'_>>, SyntaxError> {
    let mut lines = Vec::new();
    for (i, raw) in source.lines().enumerate() {
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let leading = &raw[..raw.len() - raw.trim_start().len()];
        if leading.contains('\t') {
            return Err(SyntaxError::new(i + 1, SyntaxErrorKind::TabIndent));
        }
        lines.push(Line {
            number: i + 1,
            indent: leading.len(),
            text,
        });
    }
    Ok(lines)
}

struct TreeBuilder<'l, 'a> {
    lines: &'l [Line<'a>],
    pos: usize,
    issues: &'l mut Vec<ParseIssue>,
    validate_interpolations: bool,
}

impl<'l, 'a> TreeBuilder<'l, 'a> {
    fn peek(&self) -> Option<&'l Line<'a>> {
        self.lines.get(self.pos)
    }

    fn parse_document(&mut self) -> Result<Vec<Block>, SyntaxError> {
        let Some(first) = self.peek() else {
            return Ok(Vec::new());
        };
        let base = first.indent;
        let blocks = self.parse_list(base)?;
        if let Some(line) = self.peek() {
            return Err(line.error(SyntaxErrorKind::InconsistentIndent {
                expected: base,
                found: line.indent,
            }));
        }
        Ok(blocks)
    }

    /// Items at exactly `indent`; stops at the first shallower line.
    fn parse_list(&mut self, indent: usize) -> Result<Vec<Block>, SyntaxError> {
        let mut blocks = Vec::new();
        while let Some(line) = self.peek() {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                return Err(line.error(SyntaxErrorKind::InconsistentIndent {
                    expected: indent,
                    found: line.indent,
                }));
            }
            if !line.is_item() {
                return Err(line.error(SyntaxErrorKind::MissingBlockHeader(line.text.to_string())));
            }
            blocks.push(self.parse_item()?);
        }
        Ok(blocks)
    }

    fn parse_item(&mut self) -> Result<Block, SyntaxError> {
        let lines = self.lines;
        let header = &lines[self.pos];
        self.pos += 1;
        let after_dash = &header.text[1..];
        let head = after_dash.trim_start();
        let prop_indent = header.indent + 1 + (after_dash.len() - head.len());

        let (key, raw) = split_pair(head).map_err(|kind| header.error(kind))?;
        if key != TYPE {
            return Err(header.error(SyntaxErrorKind::MissingType(key.to_string())));
        }
        let block_type = match parse_scalar(raw).map_err(|kind| header.error(kind))? {
            Value::String(s) if !s.trim().is_empty() => s,
            _ => return Err(header.error(SyntaxErrorKind::EmptyType)),
        };
        let mut block = Block::new(block_type);
        let mut has_children = false;

        while let Some(line) = self.peek() {
            if line.indent <= header.indent {
                break;
            }
            if line.indent != prop_indent {
                return Err(line.error(SyntaxErrorKind::InconsistentIndent {
                    expected: prop_indent,
                    found: line.indent,
                }));
            }
            if line.is_item() {
                return Err(line.error(SyntaxErrorKind::MalformedLine(line.text.to_string())));
            }
            self.pos += 1;
            let (key, raw) = split_pair(line.text).map_err(|kind| line.error(kind))?;

            if key == CHILDREN && raw.trim().is_empty() {
                if has_children {
                    return Err(line.error(SyntaxErrorKind::DuplicateProperty(key.to_string())));
                }
                has_children = true;
                block.children = match self.peek() {
                    Some(next) if next.indent > prop_indent => self.parse_list(next.indent)?,
                    _ => Vec::new(),
                };
                continue;
            }
            if key == TYPE || key == CHILDREN || block.properties.contains_key(key) {
                return Err(line.error(SyntaxErrorKind::DuplicateProperty(key.to_string())));
            }
            let value = parse_scalar(raw).map_err(|kind| line.error(kind))?;
            self.check_property(line, key, &value)?;
            block.properties.insert(key.to_string(), value);
        }
        Ok(block)
    }

    fn check_property(&mut self, line: &Line, key: &str, value: &Value) -> Result<(), SyntaxError> {
        match key {
            "bind" => match value.as_str() {
                Some(path) if is_valid_bind(path) => {}
                _ => return Err(line.error(SyntaxErrorKind::InvalidBind(display(value)))),
            },
            "on" => match value.as_str() {
                Some(binding) if is_valid_on(binding) => {}
                _ => return Err(line.error(SyntaxErrorKind::InvalidOn(display(value)))),
            },
            _ => {}
        }
        if let (true, Some(text)) = (self.validate_interpolations, value.as_str()) {
            for caps in interpolation_regex().captures_iter(text) {
                let expr = caps[1].trim();
                if !validate_expression(expr) {
                    self.issues.push(ParseIssue {
                        kind: IssueKind::UnsafeExpression,
                        message: format!("unsafe expression in property \"{key}\": {expr}"),
                        line: Some(line.number),
                    });
                }
            }
        }
        Ok(())
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Split `key: value` at the first colon.
fn split_pair(text: &str) -> Result<(&str, &str), SyntaxErrorKind> {
    let malformed = || SyntaxErrorKind::MalformedLine(text.to_string());
    let (key, value) = text.split_once(':').ok_or_else(malformed)?;
    let key = key.trim();
    let valid_key = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if !valid_key {
        return Err(malformed());
    }
    Ok((key, value))
}

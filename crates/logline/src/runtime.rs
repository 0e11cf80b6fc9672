use logline_expression::{ExpressionEngine, JsValue, Vars};
use logline_parser::{Block, BlockDocument, LogLineParser, SyntaxError};
use logline_state::{MemoryStorage, StateError, StateStore, Storage};
use serde_json::{Map, Value};

use crate::config::RuntimeConfig;

/// Property that receives the bound state value in
/// [`Runtime::resolve_properties`].
pub const BOUND_VALUE: &str = "value";

/// One expression engine, one block parser and one state store wired
/// together. Expressions are evaluated against the current store snapshot.
///
/// # Example
///
/// ```
/// use logline::Runtime;
/// use serde_json::json;
///
/// let mut runtime = Runtime::new();
/// runtime.store_mut().set_state("user.name", json!("Maria")).unwrap();
///
/// let doc = runtime
///     .parse("- type: text\n  content: \"Hi {{user.name}}\"\n  bind: user.name")
///     .unwrap();
/// let props = runtime.resolve_properties(&doc.blocks[0]);
/// assert_eq!(props["content"], "Hi Maria");
/// assert_eq!(props["value"], "Maria");
/// ```
pub struct Runtime {
    engine: ExpressionEngine,
    parser: LogLineParser,
    store: StateStore,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self::with_storage(config, MemoryStorage::new())
    }

    pub fn with_storage(config: RuntimeConfig, storage: impl Storage + 'static) -> Self {
        let RuntimeConfig {
            engine,
            store,
            parser,
        } = config;
        Runtime {
            parser: LogLineParser::with_options(parser)
                .with_engine(ExpressionEngine::with_options(engine.clone())),
            engine: ExpressionEngine::with_options(engine),
            store: StateStore::with_storage(store, storage),
        }
    }

    pub fn engine(&self) -> &ExpressionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ExpressionEngine {
        &mut self.engine
    }

    pub fn parser(&self) -> &LogLineParser {
        &self.parser
    }

    pub fn parser_mut(&mut self) -> &mut LogLineParser {
        &mut self.parser
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut StateStore {
        &mut self.store
    }

    pub fn parse(&mut self, source: &str) -> Result<BlockDocument, SyntaxError> {
        self.parser.parse(source)
    }

    /// Parse `source` and register it as a component template.
    pub fn register_component(&mut self, name: &str, source: &str) -> Result<(), SyntaxError> {
        let template = self.parser.parse(source)?;
        self.parser.register_component(name, template);
        Ok(())
    }

    fn vars(&self) -> Vars {
        Vars::new(self.store.snapshot().clone())
    }

    /// Evaluate against the store. Failures yield `false`.
    pub fn evaluate(&mut self, expression: &str) -> JsValue {
        let vars = self.vars();
        self.engine.evaluate(expression, &vars)
    }

    /// Replace `{{ }}` spans with values from the store.
    pub fn interpolate(&mut self, template: &str) -> String {
        let vars = self.vars();
        self.engine.interpolate(template, &vars)
    }

    /// Properties as a renderer sees them right now.
    ///
    /// Text properties are interpolated against the store. A `bind` path
    /// additionally yields [`BOUND_VALUE`] with the state at that path
    /// (`null` when unset), unless the block sets `value` itself.
    pub fn resolve_properties(&mut self, block: &Block) -> Map<String, Value> {
        let vars = self.vars();
        let mut resolved = Map::new();
        for (key, value) in &block.properties {
            let value = match value {
                Value::String(text) if text.contains("{{") => {
                    Value::String(self.engine.interpolate(text, &vars))
                }
                other => other.clone(),
            };
            resolved.insert(key.clone(), value);
        }
        if let Some(path) = block.bind() {
            if !resolved.contains_key(BOUND_VALUE) {
                let bound = self.store.get_state(path).cloned().unwrap_or(Value::Null);
                resolved.insert(BOUND_VALUE.to_string(), bound);
            }
        }
        resolved
    }

    /// Write user input back through a block's `bind`. Returns `false` when
    /// the block is not bound.
    pub fn update_binding(&mut self, block: &Block, value: Value) -> Result<bool, StateError> {
        let Some(path) = block.bind() else {
            return Ok(false);
        };
        self.store.set_state(path, value)?;
        Ok(true)
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ParseIssue;
use crate::validate::split_event_binding;

/// One UI node: a type tag, its properties and ordered children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub children: Vec<Block>,
    /// Set once a component instance has been expanded.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub component: bool,
}

impl Block {
    pub fn new(block_type: impl Into<String>) -> Self {
        Block {
            block_type: block_type.into(),
            properties: Map::new(),
            children: Vec::new(),
            component: false,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn with_child(mut self, child: Block) -> Self {
        self.children.push(child);
        self
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// The `bind` path, if any.
    pub fn bind(&self) -> Option<&str> {
        self.property("bind").and_then(Value::as_str)
    }

    /// The `on` binding split into event and handler names.
    pub fn event_binding(&self) -> Option<(&str, &str)> {
        self.property("on")
            .and_then(Value::as_str)
            .and_then(split_event_binding)
    }

    /// Visit this block and all descendants, depth first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Block)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }
}

/// Result of parsing LogLine source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockDocument {
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub errors: Vec<ParseIssue>,
}

impl BlockDocument {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Total number of blocks, nested ones included.
    pub fn block_count(&self) -> usize {
        let mut count = 0;
        for block in &self.blocks {
            block.walk(&mut |_| count += 1);
        }
        count
    }
}

impl From<Vec<Block>> for BlockDocument {
    fn from(blocks: Vec<Block>) -> Self {
        BlockDocument {
            blocks,
            errors: Vec::new(),
        }
    }
}

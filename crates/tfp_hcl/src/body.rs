//! Document structure: files, bodies, blocks and attributes.

use std::fmt;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{HclError, HclResult};
use crate::render;
use crate::value::Value;

/// Right-hand side of an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// A literal value, quoted and escaped on output.
    Value(Value),
    /// Verbatim expression text, e.g. a resource traversal or a function call.
    Raw(String),
}

impl Expression {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Expression::Value(v) => Some(v),
            Expression::Raw(_) => None,
        }
    }

    pub fn as_raw(&self) -> Option<&str> {
        match self {
            Expression::Raw(s) => Some(s),
            Expression::Value(_) => None,
        }
    }
}

/// A single entry of a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Attribute { name: String, expr: Expression },
    Block(Block),
    /// `name = { ... }` where the braces hold a nested body.
    Object { name: String, body: Body },
    Newline,
}

/// A labelled block such as `resource "aws_instance" "server" { ... }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: String,
    pub labels: Vec<String>,
    pub body: Body,
}

impl Block {
    pub fn new(kind: impl Into<String>, labels: &[&str]) -> Self {
        Self {
            kind: kind.into(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            body: Body::default(),
        }
    }
}

/// An ordered sequence of attributes, blocks and blank lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Body {
    items: Vec<Item>,
}

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append a nested block and return its body for further population.
    pub fn append_block(&mut self, kind: impl Into<String>, labels: &[&str]) -> &mut Body {
        self.items.push(Item::Block(Block::new(kind, labels)));
        match self.items.last_mut() {
            Some(Item::Block(block)) => &mut block.body,
            _ => unreachable!("block was just pushed"),
        }
    }

    /// Set an attribute to a literal value, replacing any existing attribute
    /// with the same name in place.
    pub fn set_attribute_value(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.set_attribute(name.into(), Expression::Value(value.into()));
    }

    /// Set an attribute to a verbatim expression.
    pub fn set_attribute_raw(&mut self, name: impl Into<String>, expr: impl Into<String>) {
        self.set_attribute(name.into(), Expression::Raw(expr.into()));
    }

    /// Get or create an object-valued attribute (`name = { ... }`).
    pub fn set_attribute_object(&mut self, name: impl Into<String>) -> &mut Body {
        let name = name.into();
        let position = self
            .items
            .iter()
            .position(|item| matches!(item, Item::Object { name: n, .. } if *n == name));

        let index = match position {
            Some(index) => index,
            None => {
                self.items.push(Item::Object {
                    name,
                    body: Body::default(),
                });
                self.items.len() - 1
            }
        };

        match &mut self.items[index] {
            Item::Object { body, .. } => body,
            _ => unreachable!("index points at an object item"),
        }
    }

    pub fn append_newline(&mut self) {
        self.items.push(Item::Newline);
    }

    fn set_attribute(&mut self, name: String, expr: Expression) {
        for item in &mut self.items {
            if let Item::Attribute { name: existing, expr: current } = item {
                if *existing == name {
                    *current = expr;
                    return;
                }
            }
        }
        self.items.push(Item::Attribute { name, expr });
    }

    /// Look up an attribute expression by name.
    pub fn attribute(&self, name: &str) -> Option<&Expression> {
        self.items.iter().find_map(|item| match item {
            Item::Attribute { name: n, expr } if n == name => Some(expr),
            _ => None,
        })
    }

    /// Look up an object attribute body by name.
    pub fn object(&self, name: &str) -> Option<&Body> {
        self.items.iter().find_map(|item| match item {
            Item::Object { name: n, body } if n == name => Some(body),
            _ => None,
        })
    }

    /// Iterate over the nested blocks.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.items.iter().filter_map(|item| match item {
            Item::Block(block) => Some(block),
            _ => None,
        })
    }

    /// Find the first block with the given type and labels.
    pub fn find_block(&self, kind: &str, labels: &[&str]) -> Option<&Block> {
        self.blocks()
            .find(|b| b.kind == kind && b.labels.iter().map(String::as_str).eq(labels.iter().copied()))
    }

    pub fn find_block_mut(&mut self, kind: &str, labels: &[&str]) -> Option<&mut Block> {
        self.items.iter_mut().find_map(|item| match item {
            Item::Block(b) if b.kind == kind && b.labels.iter().map(String::as_str).eq(labels.iter().copied()) => {
                Some(b)
            }
            _ => None,
        })
    }

    /// All blocks of a given type.
    pub fn blocks_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Block> + 'a {
        self.blocks().filter(move |b| b.kind == kind)
    }

    fn validate(&self) -> HclResult<()> {
        for item in &self.items {
            match item {
                Item::Attribute { name, .. } => check_identifier(name)?,
                Item::Object { name, body } => {
                    check_identifier(name)?;
                    body.validate()?;
                }
                Item::Block(block) => {
                    check_identifier(&block.kind)?;
                    block.body.validate()?;
                }
                Item::Newline => {}
            }
        }
        Ok(())
    }
}

/// A whole HCL document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HclFile {
    body: Body,
}

impl HclFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Check that every attribute name and block type is a valid identifier.
    pub fn validate(&self) -> HclResult<()> {
        self.body.validate()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    /// Validate and write the document, replacing any existing file.
    pub fn write_to(&self, path: impl AsRef<Path>) -> HclResult<()> {
        let path = path.as_ref();
        self.validate()?;

        let rendered = self.to_string();
        debug!("Writing {} bytes of HCL to {:?}", rendered.len(), path);
        fs::write(path, rendered)?;
        Ok(())
    }
}

impl fmt::Display for HclFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render::render_body(&self.body, 0))
    }
}

fn check_identifier(name: &str) -> HclResult<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid_start && valid_rest {
        Ok(())
    } else {
        Err(HclError::InvalidIdentifier(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_attribute_replaces_in_place() {
        let mut body = Body::new();
        body.set_attribute_value("access_key", "first");
        body.set_attribute_value("region", "us-east-2");
        body.set_attribute_value("access_key", "second");

        assert_eq!(body.items().len(), 2);
        assert_eq!(
            body.attribute("access_key"),
            Some(&Expression::Value(Value::from("second")))
        );
        match &body.items()[0] {
            Item::Attribute { name, .. } => assert_eq!(name, "access_key"),
            other => panic!("unexpected item {:?}", other),
        }
    }

    #[test]
    fn test_object_attribute_is_reused() {
        let mut body = Body::new();
        body.set_attribute_object("tags").set_attribute_value("Name", "a");
        body.set_attribute_object("tags").set_attribute_value("Owner", "b");

        let tags = body.object("tags").unwrap();
        assert_eq!(tags.items().len(), 2);
    }

    #[test]
    fn test_find_block_by_labels() {
        let mut body = Body::new();
        body.append_block("resource", &["aws_instance", "one"]);
        body.append_block("resource", &["aws_instance", "two"]);

        assert!(body.find_block("resource", &["aws_instance", "two"]).is_some());
        assert!(body.find_block("resource", &["aws_instance", "three"]).is_none());
        assert_eq!(body.blocks_of_kind("resource").count(), 2);
    }

    #[test]
    fn test_validate_rejects_bad_identifiers() {
        let mut file = HclFile::new();
        file.body_mut().append_block("tags =", &[]);
        assert!(matches!(file.validate(), Err(HclError::InvalidIdentifier(_))));

        let mut file = HclFile::new();
        file.body_mut()
            .append_block("resource", &["null_resource", "x"])
            .set_attribute_value("depends-on_ok", true);
        assert!(file.validate().is_ok());
    }
}

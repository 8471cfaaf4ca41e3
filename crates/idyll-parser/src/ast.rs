//! Abstract Syntax Tree for Idyll documents.
//!
//! A document is a flat sequence of nodes; a node is either a text leaf or an
//! element `(name, properties, children)`. Serialization produces the nested
//! array shape the rendering runtime walks:
//!
//! ```text
//! "text"                                   text leaf
//! [name, [[prop, [kind, payload]], ...], [child, ...]]   element
//! ```
//!
//! with `kind` one of `value`, `variable` or `expression`.

use serde::ser::{Serialize, SerializeTuple, Serializer};

/// Element name of a variable declaration (`[var name:"x" value:0 /]`).
pub const VARIABLE_ELEMENT: &str = "var";

/// Element name of a dataset reference (`[data name:"d" source:"d.csv" /]`).
pub const DATASET_ELEMENT: &str = "data";

/// A complete Idyll document. Serializes as a bare array of nodes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub nodes: Vec<Node>,
}

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A run of prose text.
    Text(String),

    /// A built-in block (`p`, `h2`, `ul`, `pre`, ...) or a user component.
    Element(Element),
}

/// A named element with properties and optional children.
///
/// `children` is `None` for self-closed elements (`[x /]`) and `Some` for
/// open/close pairs, even when nothing sits between the tags.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub properties: Vec<Property>,
    pub children: Option<Vec<Node>>,
}

/// A `name:value` binding on an element.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub value: PropertyValue,
}

/// How a property gets its value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Fixed at parse time.
    Literal(Literal),
    /// Name of a piece of document state, resolved by the renderer.
    Variable(String),
    /// Source text from between backticks, evaluated by the renderer.
    Expression(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(Number),
    Boolean(bool),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Element {
    /// An element with no properties and the given children.
    pub fn new(name: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            children: Some(children),
        }
    }

    /// The value bound to `name`; the last binding wins.
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .rev()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    pub fn is_self_closing(&self) -> bool {
        self.children.is_none()
    }
}

impl PropertyValue {
    /// The payload as text, for string literals, variables and expressions.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Literal(Literal::String(s))
            | PropertyValue::Variable(s)
            | PropertyValue::Expression(s) => Some(s),
            PropertyValue::Literal(_) => None,
        }
    }

    fn kind_tag(&self) -> &'static str {
        match self {
            PropertyValue::Literal(_) => "value",
            PropertyValue::Variable(_) => "variable",
            PropertyValue::Expression(_) => "expression",
        }
    }
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// A state declaration found in the document.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration<'a> {
    /// `[var name:... value:... /]`
    Variable {
        name: &'a str,
        value: Option<&'a PropertyValue>,
    },
    /// `[data name:... source:... /]`
    Dataset { name: &'a str, source: &'a str },
}

impl Document {
    /// Collect `var` and `data` declarations in document order.
    ///
    /// Only reads properties; resolving values or loading datasets is left
    /// to the caller. Declarations missing their `name` (or a dataset's
    /// `source`) are skipped.
    pub fn declarations(&self) -> Vec<Declaration<'_>> {
        let mut found = Vec::new();
        collect_declarations(&self.nodes, &mut found);
        found
    }

    /// Serialize to the JSON interchange shape.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn collect_declarations<'a>(nodes: &'a [Node], found: &mut Vec<Declaration<'a>>) {
    for node in nodes {
        let Node::Element(element) = node else {
            continue;
        };
        let name = element.property("name").and_then(PropertyValue::as_text);

        match element.name.as_str() {
            VARIABLE_ELEMENT => {
                if let Some(name) = name {
                    found.push(Declaration::Variable {
                        name,
                        value: element.property("value"),
                    });
                }
            }
            DATASET_ELEMENT => {
                let source = element.property("source").and_then(PropertyValue::as_text);
                if let (Some(name), Some(source)) = (name, source) {
                    found.push(Declaration::Dataset { name, source });
                }
            }
            _ => {
                if let Some(children) = &element.children {
                    collect_declarations(children, found);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.nodes.serialize(serializer)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Text(text) => serializer.serialize_str(text),
            Node::Element(element) => element.serialize(serializer),
        }
    }
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Self-closed elements still carry a (empty) children slot.
        let children: &[Node] = self.children.as_deref().unwrap_or(&[]);
        let mut tuple = serializer.serialize_tuple(3)?;
        tuple.serialize_element(&self.name)?;
        tuple.serialize_element(&self.properties)?;
        tuple.serialize_element(children)?;
        tuple.end()
    }
}

impl Serialize for Property {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.name)?;
        tuple.serialize_element(&self.value)?;
        tuple.end()
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(self.kind_tag())?;
        match self {
            PropertyValue::Literal(literal) => tuple.serialize_element(literal)?,
            PropertyValue::Variable(name) => tuple.serialize_element(name)?,
            PropertyValue::Expression(source) => tuple.serialize_element(source)?,
        }
        tuple.end()
    }
}

impl Serialize for Literal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Literal::String(s) => serializer.serialize_str(s),
            Literal::Number(n) => n.serialize(serializer),
            Literal::Boolean(b) => serializer.serialize_bool(*b),
        }
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Number::Integer(n) => serializer.serialize_i64(*n),
            Number::Float(n) => serializer.serialize_f64(*n),
        }
    }
}

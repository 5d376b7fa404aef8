use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
// POSITIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Best-effort source location. `{0,0}` means unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub row: u32,
    pub col: u32,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.col)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPRESSIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// A mustache expression, analyzed once when the markup is parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expr {
    pub code: String,
    /// Free identifiers read by the expression, in discovery order.
    pub references: Vec<String>,
    pub shape: ExprShape,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExprShape {
    StringLiteral {
        value: String,
    },
    /// `test ? consequent : alternate`; a branch is `Some` only when it is a string literal.
    Conditional {
        test: Box<Expr>,
        consequent: Option<String>,
        alternate: Option<String>,
    },
    Other,
}

impl Expr {
    pub fn string_literal(&self) -> Option<&str> {
        match &self.shape {
            ExprShape::StringLiteral { value } => Some(value),
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ATTRIBUTES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum AttrValue {
    Literal(String),
    Expression(Expr),
    /// Bound instance method, printed as `this.<name>`.
    Method(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: AttrValue,
}

impl Attribute {
    pub fn literal(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: AttrValue::Literal(value.to_string()),
        }
    }

    pub fn as_literal(&self) -> Option<&str> {
        match &self.value {
            AttrValue::Literal(value) => Some(value),
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NODES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
    Expression(ExpressionNode),
    Conditional(ConditionalNode),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementNode {
    pub tag: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
    #[serde(default)]
    pub self_closing: bool,
    #[serde(default)]
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionNode {
    pub expr: Expr,
}

/// Runtime choice between two subtrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalNode {
    pub test: Expr,
    pub consequent: Vec<Node>,
    pub alternate: Vec<Node>,
}

impl ElementNode {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
            self_closing: false,
            position: Position::default(),
        }
    }

    /// `<block>` wrapper around `children`.
    pub fn block(children: Vec<Node>) -> Self {
        let mut block = Self::new("block");
        block.children = children;
        block
    }

    pub fn attr(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn literal_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).and_then(Attribute::as_literal)
    }
}

impl Node {
    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn is_element(&self, tag: &str) -> bool {
        self.as_element().is_some_and(|el| el.tag == tag)
    }

    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        write_node(self, &mut out);
        out
    }
}

impl ElementNode {
    /// WXML-like serialization, used as the snippet of error reports.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Element(el) => write_element(el, out),
        Node::Text(text) => out.push_str(&text.value),
        Node::Expression(e) => {
            out.push_str("{{");
            out.push_str(&e.expr.code);
            out.push_str("}}");
        }
        Node::Conditional(cond) => {
            out.push_str(&format!("<block wx:if=\"{{{{{}}}}}\">", cond.test.code));
            cond.consequent.iter().for_each(|child| write_node(child, out));
            out.push_str("</block><block wx:else>");
            cond.alternate.iter().for_each(|child| write_node(child, out));
            out.push_str("</block>");
        }
    }
}

fn write_element(el: &ElementNode, out: &mut String) {
    out.push('<');
    out.push_str(&el.tag);
    for attr in &el.attributes {
        out.push(' ');
        out.push_str(&attr.name);
        match &attr.value {
            AttrValue::Literal(value) if value.is_empty() => {}
            AttrValue::Literal(value) | AttrValue::Method(value) => {
                out.push_str(&format!("=\"{}\"", value));
            }
            AttrValue::Expression(expr) => out.push_str(&format!("=\"{{{{{}}}}}\"", expr.code)),
        }
    }
    if el.children.is_empty() {
        out.push_str(" />");
        return;
    }
    out.push('>');
    el.children.iter().for_each(|child| write_node(child, out));
    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
}

// ═══════════════════════════════════════════════════════════════════════════════
// REWRITES
// ═══════════════════════════════════════════════════════════════════════════════

/// What the pipeline does with a node after a resolver has looked at it.
#[derive(Debug, Clone, PartialEq)]
pub enum Rewrite {
    Keep,
    Remove,
    Replace(Node),
}

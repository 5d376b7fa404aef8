//! `<template>` resolution.
//!
//! A `<template>` tag either defines a reusable fragment (`name=`) or renders
//! one (`is=`). Definitions become class components whose props are the data
//! the fragment reads; invocations become elements naming those components.

use indexmap::IndexSet;
use serde::Serialize;

use crate::error::{ErrorKind, WxmlError};
use crate::ir::{
    AttrValue, Attribute, ConditionalNode, ElementNode, Expr, ExprShape, Node, Rewrite,
};
use crate::naming::build_template_name;
use crate::parse::WxsModule;
use crate::scope::ReferenceCollector;
use crate::visitor::TemplateVisitor;

pub const TEMPLATE_TAG: &str = "template";
const NAME_ATTR: &str = "name";
const IS_ATTR: &str = "is";
const DATA_ATTR: &str = "data";

const COMPONENT_BASE: &str = "React.Component";
const COMPONENT_DECORATOR: &str = "withWeapp";

// ═══════════════════════════════════════════════════════════════════════════════
// PRE-SCAN
// ═══════════════════════════════════════════════════════════════════════════════

/// Advisory bookkeeping for a template definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateScan {
    pub name: String,
    /// Instance methods the body binds (`bindtap="onTap"` -> `onTap`).
    pub funcs: IndexSet<String>,
    /// Components the body renders through `is=`.
    pub applies: IndexSet<String>,
}

/// Collect the name, bound methods and applied templates of a definition.
///
/// Returns `None` for a node that is not inside a container.
pub fn pre_parse_template(
    node: &ElementNode,
    parent: Option<&ElementNode>,
) -> Result<Option<TemplateScan>, WxmlError> {
    if parent.is_none() {
        return Ok(None);
    }

    let name = match node.attr(NAME_ATTR).map(|attr| &attr.value) {
        Some(AttrValue::Literal(name)) => name,
        _ => {
            return Err(WxmlError::at(
                ErrorKind::TemplateNameTypeMismatchError,
                "template `name` must be a string literal",
                node,
            ))
        }
    };

    let mut scanner = UsageScanner::default();
    scanner.visit_children(&node.children);

    Ok(Some(TemplateScan {
        name: build_template_name(name, true),
        funcs: scanner.funcs,
        applies: scanner.applies,
    }))
}

#[derive(Default)]
struct UsageScanner {
    funcs: IndexSet<String>,
    applies: IndexSet<String>,
}

impl TemplateVisitor for UsageScanner {
    fn visit_element(&mut self, element: &ElementNode) {
        for attr in &element.attributes {
            match &attr.value {
                AttrValue::Method(method) => {
                    self.funcs.insert(method.clone());
                }
                AttrValue::Expression(expr) => {
                    if let Some(method) = this_member(&expr.code) {
                        self.funcs.insert(method.to_string());
                    }
                }
                AttrValue::Literal(_) => {}
            }
        }

        if element.tag == TEMPLATE_TAG {
            let target = element.attr(IS_ATTR).and_then(|attr| match &attr.value {
                AttrValue::Literal(name) => Some(name.as_str()),
                AttrValue::Expression(expr) => expr.string_literal(),
                AttrValue::Method(_) => None,
            });
            if let Some(target) = target.filter(|name| !name.is_empty()) {
                self.applies.insert(build_template_name(target, true));
            }
        }

        self.visit_children(&element.children);
    }
}

/// `this.handler` -> `handler`.
fn this_member(code: &str) -> Option<&str> {
    let member = code.strip_prefix("this.")?;
    let mut chars = member.chars();
    let starts_ident = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$');
    let continues_ident = chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    (starts_ident && continues_ident).then_some(member)
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESOLUTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Class component generated from a template definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateComponent {
    pub name: String,
    pub super_class: String,
    /// Called with `{}` and applied to the class.
    pub decorator: String,
    /// Data the caller passes in, in discovery order.
    pub props: Vec<String>,
    /// Returned from `render()` inside a `<Block>`.
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDefinition {
    /// Sanitized component identifier.
    pub name: String,
    pub ast: TemplateComponent,
    /// The name as written in the markup, the key callers look templates up by.
    pub tmpl_name: String,
    pub used_wxses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateOutcome {
    pub rewrite: Rewrite,
    pub definition: Option<TemplateDefinition>,
}

impl TemplateOutcome {
    fn replace(node: Node) -> Self {
        Self {
            rewrite: Rewrite::Replace(node),
            definition: None,
        }
    }
}

/// Resolve one `<template>` tag whose children are already resolved.
pub fn parse_template(
    node: &ElementNode,
    wxses: &[WxsModule],
) -> Result<TemplateOutcome, WxmlError> {
    if let Some(name) = node.attr(NAME_ATTR) {
        return match &name.value {
            AttrValue::Literal(tmpl_name) => Ok(define_template(node, tmpl_name, wxses)),
            _ => Err(WxmlError::at(
                ErrorKind::TemplateNameTypeMismatchError,
                "template `name` must be a string literal",
                node,
            )),
        };
    }

    let is = node.attr(IS_ATTR).ok_or_else(|| {
        WxmlError::at(
            ErrorKind::TemplateMissingIsNameError,
            "template must declare either `is` or `name`",
            node,
        )
    })?;

    match &is.value {
        AttrValue::Literal(target) if target.is_empty() => Err(empty_is(node)),
        AttrValue::Literal(target) => Ok(TemplateOutcome::replace(invoke(node, target))),
        AttrValue::Expression(expr) => match &expr.shape {
            ExprShape::StringLiteral { value } if value.is_empty() => Err(empty_is(node)),
            ExprShape::StringLiteral { value } => {
                Ok(TemplateOutcome::replace(invoke(node, value)))
            }
            ExprShape::Conditional {
                test,
                consequent: Some(consequent),
                alternate: Some(alternate),
            } => Ok(TemplateOutcome::replace(select_at_runtime(
                node, test, consequent, alternate,
            ))),
            _ => Err(is_type_mismatch(node)),
        },
        AttrValue::Method(_) => Err(is_type_mismatch(node)),
    }
}

fn empty_is(node: &ElementNode) -> WxmlError {
    WxmlError::at(
        ErrorKind::TemplateIsAttributeEmptyError,
        "template `is` must not be empty",
        node,
    )
}

fn is_type_mismatch(node: &ElementNode) -> WxmlError {
    WxmlError::at(
        ErrorKind::TemplateIsAttributeTypeMismatchError,
        "template `is` must be a string or a ternary whose branches are both strings",
        node,
    )
}

fn data_attr(node: &ElementNode) -> Option<Attribute> {
    node.attr(DATA_ATTR).cloned()
}

/// `<template is="card" data="{{...}}"/>` -> `<CardTmpl data="{{...}}"/>`.
fn invoke(node: &ElementNode, target: &str) -> Node {
    let mut element = ElementNode::new(&build_template_name(target, true));
    element.attributes.extend(data_attr(node));
    element.self_closing = true;
    element.position = node.position;
    Node::Element(element)
}

/// `is="{{test ? 'a' : 'b'}}"` -> one literal invocation per branch, picked at runtime.
fn select_at_runtime(node: &ElementNode, test: &Expr, consequent: &str, alternate: &str) -> Node {
    let candidate = |target: &str| {
        let mut element = ElementNode::new(TEMPLATE_TAG);
        element.attributes.extend(data_attr(node));
        element.attributes.push(Attribute::literal(IS_ATTR, target));
        element.self_closing = true;
        element.position = node.position;
        Node::Element(element)
    };

    Node::Element(ElementNode::block(vec![Node::Conditional(ConditionalNode {
        test: test.clone(),
        consequent: vec![candidate(consequent)],
        alternate: vec![candidate(alternate)],
    })]))
}

fn define_template(node: &ElementNode, tmpl_name: &str, wxses: &[WxsModule]) -> TemplateOutcome {
    let mut loop_ids = IndexSet::new();
    let mut ref_ids = IndexSet::new();
    ReferenceCollector::new(&mut loop_ids, &mut ref_ids).visit_children(&node.children);

    // Script modules are imported, not passed in.
    let mut used_wxses = Vec::new();
    for wxs in wxses {
        if ref_ids.shift_remove(&wxs.module) {
            used_wxses.push(wxs.module.clone());
        }
    }

    // Per-iteration names are bound inside the body; keep the first one only.
    let first_loop_ref = ref_ids.iter().find(|id| loop_ids.contains(*id)).cloned();
    ref_ids.retain(|id| !loop_ids.contains(id) || Some(id) == first_loop_ref.as_ref());

    let name = build_template_name(tmpl_name, true);
    tracing::debug!(
        "template `{}` -> {} with props {:?}",
        tmpl_name,
        name,
        ref_ids
    );

    TemplateOutcome {
        rewrite: Rewrite::Remove,
        definition: Some(TemplateDefinition {
            name: name.clone(),
            ast: TemplateComponent {
                name,
                super_class: COMPONENT_BASE.to_string(),
                decorator: COMPONENT_DECORATOR.to_string(),
                props: ref_ids.into_iter().collect(),
                body: node.children.clone(),
            },
            tmpl_name: tmpl_name.to_string(),
            used_wxses,
        }),
    }
}

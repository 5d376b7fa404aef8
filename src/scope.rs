//! Identifier analysis for mustache expressions and template bodies.

use indexmap::IndexSet;
use oxc_allocator::Allocator;
use oxc_ast::ast::{BindingIdentifier, Expression, IdentifierReference};
use oxc_ast_visit::Visit;
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType, Span};
use std::collections::HashSet;

use crate::ir::{
    AttrValue, ConditionalNode, ElementNode, Expr, ExprShape, ExpressionNode,
};
use crate::visitor::{walk_conditional, walk_element, TemplateVisitor};

pub const WX_FOR: &str = "wx:for";
pub const WX_FOR_ITEMS: &str = "wx:for-items";
pub const WX_FOR_ITEM: &str = "wx:for-item";
pub const WX_FOR_INDEX: &str = "wx:for-index";
pub const WX_KEY: &str = "wx:key";
pub const WX_IF: &str = "wx:if";
pub const WX_ELIF: &str = "wx:elif";
pub const WX_ELSE: &str = "wx:else";

const DEFAULT_ITEM: &str = "item";
const DEFAULT_INDEX: &str = "index";

// ═══════════════════════════════════════════════════════════════════════════════
// EXPRESSION ANALYSIS
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse a mustache body and record its shape and free identifiers.
pub fn analyze_expression(code: &str) -> Result<Expr, String> {
    let allocator = Allocator::default();
    let source_type = SourceType::default().with_module(true);

    let expr = Parser::new(&allocator, code, source_type)
        .parse_expression()
        .map_err(|errors| format!("Invalid expression syntax: {:?}", errors))?;

    Ok(Expr {
        code: code.trim().to_string(),
        references: collect_references(&expr),
        shape: shape_of(code, &expr),
    })
}

fn shape_of(source: &str, expr: &Expression) -> ExprShape {
    match expr.without_parentheses() {
        Expression::StringLiteral(lit) => ExprShape::StringLiteral {
            value: lit.value.to_string(),
        },
        Expression::ConditionalExpression(cond) => ExprShape::Conditional {
            test: Box::new(Expr {
                code: slice(source, cond.test.span()),
                references: collect_references(&cond.test),
                shape: shape_of(source, &cond.test),
            }),
            consequent: string_value(&cond.consequent),
            alternate: string_value(&cond.alternate),
        },
        _ => ExprShape::Other,
    }
}

fn string_value(expr: &Expression) -> Option<String> {
    match expr.without_parentheses() {
        Expression::StringLiteral(lit) => Some(lit.value.to_string()),
        _ => None,
    }
}

fn slice(source: &str, span: Span) -> String {
    source[span.start as usize..span.end as usize].to_string()
}

fn collect_references(expr: &Expression) -> Vec<String> {
    let mut collector = ScopeAwareCollector {
        references: vec![],
        bindings: HashSet::new(),
    };
    collector.visit_expression(expr);

    let ScopeAwareCollector {
        references,
        bindings,
    } = collector;
    references
        .into_iter()
        .filter(|name| !bindings.contains(name))
        .collect()
}

struct ScopeAwareCollector {
    references: Vec<String>,
    bindings: HashSet<String>,
}

impl<'a> Visit<'a> for ScopeAwareCollector {
    fn visit_identifier_reference(&mut self, ident: &IdentifierReference<'a>) {
        let name = ident.name.to_string();
        if !self.references.contains(&name) {
            self.references.push(name);
        }
    }

    fn visit_binding_identifier(&mut self, ident: &BindingIdentifier<'a>) {
        self.bindings.insert(ident.name.to_string());
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEMPLATE BODY REFERENCES
// ═══════════════════════════════════════════════════════════════════════════════

/// Item and index names bound by a `wx:for` element.
pub fn loop_bindings(el: &ElementNode) -> (String, String) {
    let item = el
        .literal_attr(WX_FOR_ITEM)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_ITEM);
    let index = el
        .literal_attr(WX_FOR_INDEX)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_INDEX);
    (item.to_string(), index.to_string())
}

pub fn is_loop(el: &ElementNode) -> bool {
    el.has_attr(WX_FOR) || el.has_attr(WX_FOR_ITEMS)
}

/// Records every identifier a markup subtree reads, plus the names its loops bind.
pub struct ReferenceCollector<'s> {
    loop_ids: &'s mut IndexSet<String>,
    ref_ids: &'s mut IndexSet<String>,
}

impl<'s> ReferenceCollector<'s> {
    pub fn new(loop_ids: &'s mut IndexSet<String>, ref_ids: &'s mut IndexSet<String>) -> Self {
        Self { loop_ids, ref_ids }
    }

    fn add_references(&mut self, expr: &Expr) {
        for name in &expr.references {
            self.ref_ids.insert(name.clone());
        }
    }
}

impl TemplateVisitor for ReferenceCollector<'_> {
    fn visit_element(&mut self, element: &ElementNode) {
        if is_loop(element) {
            let (item, index) = loop_bindings(element);
            self.loop_ids.insert(item);
            self.loop_ids.insert(index);
        }
        for attr in &element.attributes {
            if let AttrValue::Expression(expr) = &attr.value {
                self.add_references(expr);
            }
        }
        walk_element(self, element);
    }

    fn visit_expression(&mut self, expression: &ExpressionNode) {
        self.add_references(&expression.expr);
    }

    fn visit_conditional(&mut self, conditional: &ConditionalNode) {
        self.add_references(&conditional.test);
        walk_conditional(self, conditional);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Attribute, Node};

    #[test]
    fn test_references_in_discovery_order() {
        let expr = analyze_expression("a + b.c * a - d[e]").unwrap();
        assert_eq!(expr.references, vec!["a", "b", "d", "e"]);
        assert_eq!(expr.shape, ExprShape::Other);
    }

    #[test]
    fn test_arrow_params_are_not_references() {
        let expr = analyze_expression("list.filter(x => x.ok && flag)").unwrap();
        assert_eq!(expr.references, vec!["list", "flag"]);
    }

    #[test]
    fn test_object_shorthand_and_spread() {
        let expr = analyze_expression("{...item, title, count: n}").unwrap();
        assert_eq!(expr.references, vec!["item", "title", "n"]);
    }

    #[test]
    fn test_string_literal_shape() {
        let expr = analyze_expression(" 'card' ").unwrap();
        assert_eq!(expr.string_literal(), Some("card"));
        assert_eq!(expr.code, "'card'");
    }

    #[test]
    fn test_conditional_shape() {
        let expr = analyze_expression("vip ? 'gold' : plain").unwrap();
        match expr.shape {
            ExprShape::Conditional {
                test,
                consequent,
                alternate,
            } => {
                assert_eq!(test.code, "vip");
                assert_eq!(test.references, vec!["vip"]);
                assert_eq!(consequent.as_deref(), Some("gold"));
                assert_eq!(alternate, None);
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_syntax_error() {
        assert!(analyze_expression("a +").is_err());
    }

    #[test]
    fn test_collector_records_loops() {
        let mut el = ElementNode::new("view");
        el.attributes.push(Attribute {
            name: WX_FOR.to_string(),
            value: AttrValue::Expression(analyze_expression("list").unwrap()),
        });
        el.attributes.push(Attribute::literal(WX_FOR_ITEM, "row"));
        el.children.push(Node::Expression(ExpressionNode {
            expr: analyze_expression("row.name + index").unwrap(),
        }));

        let mut loop_ids = IndexSet::new();
        let mut ref_ids = IndexSet::new();
        ReferenceCollector::new(&mut loop_ids, &mut ref_ids).visit_element(&el);

        assert_eq!(loop_ids.into_iter().collect::<Vec<_>>(), vec!["row", "index"]);
        assert_eq!(
            ref_ids.into_iter().collect::<Vec<_>>(),
            vec!["list", "row", "index"]
        );
    }
}

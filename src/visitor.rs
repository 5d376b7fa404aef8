use crate::ir::{ConditionalNode, ElementNode, ExpressionNode, Node, TextNode};

/// The single traversal mechanism for markup trees.
///
/// Implementers override `visit_*` to add behavior and call the matching
/// `walk_*` function to keep descending.
pub trait TemplateVisitor {
    fn visit_node(&mut self, node: &Node) {
        walk_node(self, node);
    }

    fn visit_element(&mut self, element: &ElementNode) {
        walk_element(self, element);
    }

    fn visit_text(&mut self, _text: &TextNode) {}

    fn visit_expression(&mut self, _expression: &ExpressionNode) {}

    fn visit_conditional(&mut self, conditional: &ConditionalNode) {
        walk_conditional(self, conditional);
    }

    fn visit_children(&mut self, children: &[Node]) {
        walk_children(self, children);
    }
}

pub fn walk_children<V: TemplateVisitor + ?Sized>(visitor: &mut V, children: &[Node]) {
    for node in children {
        visitor.visit_node(node);
    }
}

pub fn walk_node<V: TemplateVisitor + ?Sized>(visitor: &mut V, node: &Node) {
    match node {
        Node::Element(el) => visitor.visit_element(el),
        Node::Text(t) => visitor.visit_text(t),
        Node::Expression(e) => visitor.visit_expression(e),
        Node::Conditional(c) => visitor.visit_conditional(c),
    }
}

pub fn walk_element<V: TemplateVisitor + ?Sized>(visitor: &mut V, element: &ElementNode) {
    visitor.visit_children(&element.children);
}

pub fn walk_conditional<V: TemplateVisitor + ?Sized>(
    visitor: &mut V,
    conditional: &ConditionalNode,
) {
    visitor.visit_children(&conditional.consequent);
    visitor.visit_children(&conditional.alternate);
}

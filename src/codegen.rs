//! JSX printer for resolved markup and generated template components.

use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_span::SourceType;
use std::slice;

use crate::ir::{AttrValue, Attribute, ElementNode, Node};
use crate::naming::pascal_case;
use crate::scope::{
    is_loop, loop_bindings, WX_ELIF, WX_ELSE, WX_FOR, WX_FOR_INDEX, WX_FOR_ITEM, WX_FOR_ITEMS,
    WX_IF, WX_KEY,
};
use crate::template::TemplateComponent;

/// Attributes consumed by the printer itself.
const CONTROL_ATTRS: &[&str] = &[
    WX_IF,
    WX_ELIF,
    WX_ELSE,
    WX_FOR,
    WX_FOR_ITEMS,
    WX_FOR_ITEM,
    WX_FOR_INDEX,
    WX_KEY,
];

// ═══════════════════════════════════════════════════════════════════════════════
// MARKUP
// ═══════════════════════════════════════════════════════════════════════════════

/// JSX for a resolved markup tree.
pub fn print_jsx(node: &Node) -> String {
    match node {
        Node::Element(el) if !has_control(el) => print_element(el, None),
        _ => format!("<Block>{}</Block>", print_children(slice::from_ref(node))),
    }
}

fn has_control(el: &ElementNode) -> bool {
    is_loop(el) || el.has_attr(WX_IF) || el.has_attr(WX_ELIF) || el.has_attr(WX_ELSE)
}

fn print_children(children: &[Node]) -> String {
    let mut out = String::new();
    let mut i = 0;

    while i < children.len() {
        match &children[i] {
            Node::Element(el) if el.has_attr(WX_IF) && !is_loop(el) => {
                // wx:if followed by its wx:elif / wx:else siblings
                let mut chain = vec![el];
                i += 1;
                while let Some(Node::Element(next)) = children.get(i) {
                    if next.has_attr(WX_ELSE) {
                        chain.push(next);
                        i += 1;
                        break;
                    }
                    if !next.has_attr(WX_ELIF) {
                        break;
                    }
                    chain.push(next);
                    i += 1;
                }
                out.push_str(&format!("{{{}}}", print_chain(&chain)));
            }
            Node::Element(el) if is_loop(el) => {
                out.push_str(&format!("{{{}}}", print_loop(el)));
                i += 1;
            }
            Node::Element(el) if el.has_attr(WX_ELIF) => {
                out.push_str(&format!("{{{}}}", print_chain(&[el])));
                i += 1;
            }
            Node::Element(el) => {
                out.push_str(&print_element(el, None));
                i += 1;
            }
            Node::Text(text) => {
                out.push_str(&print_text(&text.value));
                i += 1;
            }
            Node::Expression(e) => {
                out.push_str(&format!("{{{}}}", e.expr.code));
                i += 1;
            }
            Node::Conditional(cond) => {
                out.push_str(&format!(
                    "{{{} ? {} : {}}}",
                    cond.test.code,
                    print_branch(&cond.consequent),
                    print_branch(&cond.alternate)
                ));
                i += 1;
            }
        }
    }

    out
}

/// `a ? <A/> : b ? <B/> : <C/>`, with `null` when there is no `wx:else`.
fn print_chain(chain: &[&ElementNode]) -> String {
    let mut out = String::new();
    for el in chain {
        let test = el.attr(WX_IF).or_else(|| el.attr(WX_ELIF));
        match test {
            Some(test) => {
                out.push_str(&format!("{} ? {} : ", value_code(test), print_expression(el)));
            }
            None => {
                out.push_str(&print_expression(el));
                return out;
            }
        }
    }
    out.push_str("null");
    out
}

/// An element in expression position.
fn print_expression(el: &ElementNode) -> String {
    if is_loop(el) {
        print_loop(el)
    } else {
        print_element(el, None)
    }
}

/// `list.map((item, index) => <X key={...} />)`. A `wx:if` on the same
/// element filters inside the loop.
fn print_loop(el: &ElementNode) -> String {
    let source = el
        .attr(WX_FOR)
        .or_else(|| el.attr(WX_FOR_ITEMS))
        .map(value_code)
        .unwrap_or_else(|| "[]".to_string());
    let (item, index) = loop_bindings(el);

    let key = el.attr(WX_KEY).and_then(|attr| match &attr.value {
        AttrValue::Literal(field) if field == "*this" => Some(item.clone()),
        AttrValue::Literal(field) if !field.is_empty() => Some(format!("{}.{}", item, field)),
        AttrValue::Expression(expr) => Some(expr.code.clone()),
        _ => None,
    });

    let mut body = print_element(el, key.as_deref());
    if let Some(test) = el.attr(WX_IF) {
        body = format!("({} ? {} : null)", value_code(test), body);
    }

    format!("{}.map(({}, {}) => {})", source, item, index, body)
}

fn print_branch(nodes: &[Node]) -> String {
    match nodes {
        [] => "null".to_string(),
        [Node::Element(el)] if !has_control(el) || is_loop(el) => print_expression(el),
        [Node::Expression(e)] => format!("({})", e.expr.code),
        [Node::Text(text)] => js_string(&text.value),
        _ => format!("<Block>{}</Block>", print_children(nodes)),
    }
}

fn print_element(el: &ElementNode, key: Option<&str>) -> String {
    let tag = pascal_case(&el.tag);
    let mut out = format!("<{}", tag);

    for attr in &el.attributes {
        if CONTROL_ATTRS.contains(&attr.name.as_str()) {
            continue;
        }
        out.push(' ');
        out.push_str(&print_attribute(attr));
    }
    if let Some(key) = key {
        out.push_str(&format!(" key={{{}}}", key));
    }

    if el.children.is_empty() {
        out.push_str(" />");
        return out;
    }

    out.push('>');
    out.push_str(&print_children(&el.children));
    out.push_str(&format!("</{}>", tag));
    out
}

fn print_attribute(attr: &Attribute) -> String {
    let name = match attr.name.as_str() {
        "class" => "className",
        other => other,
    };
    match &attr.value {
        AttrValue::Literal(value) if value.is_empty() => name.to_string(),
        AttrValue::Literal(value) if needs_escape(value) => {
            format!("{}={{{}}}", name, js_string(value))
        }
        AttrValue::Literal(value) => format!("{}=\"{}\"", name, value),
        AttrValue::Expression(expr) => format!("{}={{{}}}", name, expr.code),
        AttrValue::Method(method) => format!("{}={{this.{}}}", name, method),
    }
}

/// JS code for an attribute used as a value (tests, loop sources).
fn value_code(attr: &Attribute) -> String {
    match &attr.value {
        AttrValue::Literal(value) if value.is_empty() => "true".to_string(),
        AttrValue::Literal(value) => js_string(value),
        AttrValue::Expression(expr) => expr.code.clone(),
        AttrValue::Method(method) => format!("this.{}", method),
    }
}

fn print_text(text: &str) -> String {
    if text.trim().is_empty() || text.contains(['{', '}', '<', '>']) {
        format!("{{{}}}", js_string(text))
    } else {
        text.to_string()
    }
}

fn needs_escape(value: &str) -> bool {
    value.contains(['"', '\\', '\n', '{', '}'])
}

fn js_string(s: &str) -> String {
    format!("\"{}\"", escape_js_string(s))
}

fn escape_js_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "")
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPONENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Class declaration for a template definition, formatted by oxc.
pub fn print_component(component: &TemplateComponent) -> String {
    let props = if component.props.is_empty() {
        String::new()
    } else {
        format!(
            "const {{ data: {{ {} }} }} = this.props;\n",
            component.props.join(", ")
        )
    };
    let source = format!(
        "@{}({{}})\nclass {} extends {} {{\n  render() {{\n    {}return <Block>{}</Block>;\n  }}\n}}\n",
        component.decorator,
        component.name,
        component.super_class,
        props,
        print_children(&component.body)
    );

    format_module(&source)
}

/// Round-trip through oxc; unparseable text is returned as is.
fn format_module(source: &str) -> String {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::tsx()).parse();
    if !ret.errors.is_empty() || ret.panicked {
        tracing::warn!(
            "generated component does not parse, emitting it unformatted: {:?}",
            ret.errors
        );
        return source.to_string();
    }
    Codegen::new().build(&ret.program).code
}

//! WXML Markup Parser
//!
//! Turns WXML text into the typed node tree the template resolver works on.
//! html5ever does the tree building; a few text passes run first so that
//! mustache expressions, self-closing tags and `<wxs>` script bodies survive
//! an HTML5 parser.

use html5ever::parse_document;
use lazy_static::lazy_static;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tendril::TendrilSink;

use crate::error::{ErrorKind, WxmlError};
use crate::ir::{AttrValue, Attribute, ElementNode, ExpressionNode, Node, Position, TextNode};
use crate::naming::pascal_case;
use crate::scope::analyze_expression;

const SELF_CLOSING_MARKER: &str = "data-wx-self-closing";
const ORIG_NAME_MARKER: &str = "data-wx-orig-name";

/// Tags html5ever renames while building the tree.
const RENAMED_TAGS: &[&str] = &["image"];

/// Tags whose source positions are tracked for error reports.
const POSITIONED_TAGS: &[&str] = &["template", "import", "include"];

lazy_static! {
    static ref EXPR_PLACEHOLDER_RE: Regex = Regex::new(r"__WX_EXPR_(\d+)__").unwrap();

    /// `<wxs>` blocks, either self-closing with `src` or carrying an inline script.
    static ref WXS_RE: Regex =
        Regex::new(r"(?is)<wxs\b([^>]*?)(?:/>|>(.*?)</wxs\s*>)").unwrap();

    static ref ATTR_RE: Regex =
        Regex::new(r#"(?i)([a-z0-9:_-]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^>\s]+)))?"#).unwrap();

    static ref SELF_CLOSING_RE: Regex =
        Regex::new(r"<([a-zA-Z][a-zA-Z0-9_:.-]*)((?:\s[^<>]*?)?)\s*/>").unwrap();

    static ref TAG_OPEN_RE: Regex = Regex::new(r"<([a-zA-Z][a-zA-Z0-9_:.-]*)").unwrap();

    static ref COMMENT_RE: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();

    static ref POSITION_TAG_RE: Regex =
        Regex::new(r"<(template|import|include)[\s/>]").unwrap();

    static ref EVENT_RE: Regex =
        Regex::new(r"^(?:capture-bind|capture-catch|mut-bind|bind|catch):?([A-Za-z][A-Za-z0-9_-]*)$")
            .unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// A `<wxs>` script module declared by the markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WxsModule {
    pub module: String,
    pub src: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMarkup {
    pub nodes: Vec<Node>,
    pub wxses: Vec<WxsModule>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEXT PASSES
// ═══════════════════════════════════════════════════════════════════════════════

/// Index just past the `}}` closing the mustache opened at `start`.
fn find_mustache_end(chars: &[char], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut i = start + 2;

    while i < chars.len() {
        let c = chars[i];

        if let Some(quote) = in_string {
            if c == '\\' {
                i += 2;
                continue;
            }
            if c == quote {
                in_string = None;
            }
            i += 1;
            continue;
        }

        match c {
            '"' | '\'' | '`' => in_string = Some(c),
            '{' => depth += 1,
            '}' if depth > 0 => depth -= 1,
            '}' if chars.get(i + 1) == Some(&'}') => return Some(i + 2),
            _ => {}
        }
        i += 1;
    }

    None
}

/// Swap every `{{ ... }}` for a placeholder the HTML parser leaves alone.
fn normalize_mustaches(source: &str) -> (String, HashMap<String, String>) {
    let chars: Vec<char> = source.chars().collect();
    let mut normalized = String::with_capacity(source.len());
    let mut expressions = HashMap::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '{' && chars.get(i + 1) == Some(&'{') {
            if let Some(end) = find_mustache_end(&chars, i) {
                let code: String = chars[i + 2..end - 2].iter().collect();
                let placeholder = format!("__WX_EXPR_{}__", expressions.len());
                normalized.push_str(&placeholder);
                expressions.insert(placeholder, code);
                i = end;
                continue;
            }
        }
        normalized.push(chars[i]);
        i += 1;
    }

    (normalized, expressions)
}

/// Cut `<wxs>` blocks out of the source; their bodies are script, not markup.
fn extract_wxs(source: &str) -> (String, Vec<WxsModule>) {
    let mut modules = Vec::new();

    let stripped = WXS_RE.replace_all(source, |caps: &regex::Captures| {
        let attrs = parse_raw_attributes(caps.get(1).map(|m| m.as_str()).unwrap_or(""));
        match attrs.get("module") {
            Some(module) if !module.is_empty() => modules.push(WxsModule {
                module: module.clone(),
                src: attrs.get("src").cloned(),
                content: caps
                    .get(2)
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|content| !content.is_empty()),
            }),
            _ => tracing::warn!("<wxs> without a module name is ignored"),
        }
        String::new()
    });

    (stripped.to_string(), modules)
}

fn parse_raw_attributes(attr_string: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    for caps in ATTR_RE.captures_iter(attr_string) {
        if let Some(name) = caps.get(1) {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            attributes.insert(name.as_str().to_string(), value);
        }
    }
    attributes
}

/// `<import src="a"/>` -> `<import data-wx-self-closing="" src="a"></import>`.
/// HTML5 treats an unknown `<tag/>` as an open tag, which would swallow the
/// following siblings.
fn expand_self_closing(html: &str) -> String {
    SELF_CLOSING_RE
        .replace_all(html, |caps: &regex::Captures| {
            let name = &caps[1];
            let rest = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            format!("<{} {}=\"\"{}></{}>", name, SELF_CLOSING_MARKER, rest, name)
        })
        .to_string()
}

/// Record the original name of tags html5ever would lowercase or rename.
fn mark_tag_names(html: &str) -> String {
    TAG_OPEN_RE
        .replace_all(html, |caps: &regex::Captures| {
            let name = &caps[1];
            let lower = name.to_lowercase();
            if name != lower || RENAMED_TAGS.contains(&lower.as_str()) {
                format!("<{} {}=\"{}\"", name, ORIG_NAME_MARKER, name)
            } else {
                caps[0].to_string()
            }
        })
        .to_string()
}

/// Row/column of every positioned tag, in document order, keyed by tag.
fn scan_tag_positions(source: &str) -> HashMap<String, VecDeque<Position>> {
    let blanked = COMMENT_RE.replace_all(source, |caps: &regex::Captures| {
        caps[0]
            .chars()
            .map(|c| {
                if c == '\n' {
                    "\n".to_string()
                } else {
                    " ".repeat(c.len_utf8())
                }
            })
            .collect::<String>()
    });

    let mut positions: HashMap<String, VecDeque<Position>> = HashMap::new();
    for caps in POSITION_TAG_RE.captures_iter(&blanked) {
        let offset = caps.get(0).map(|m| m.start()).unwrap_or(0);
        let before = &blanked[..offset];
        let row = before.matches('\n').count() as u32 + 1;
        let col = before.rsplit('\n').next().unwrap_or("").chars().count() as u32;
        positions
            .entry(caps[1].to_string())
            .or_default()
            .push_back(Position { row, col });
    }
    positions
}

// ═══════════════════════════════════════════════════════════════════════════════
// ATTRIBUTE NORMALIZATION
// ═══════════════════════════════════════════════════════════════════════════════

enum Part {
    Static(String),
    Expr(String),
}

fn split_placeholders(text: &str, expressions: &HashMap<String, String>) -> Vec<Part> {
    let mut parts = Vec::new();
    let mut last_end = 0;

    for m in EXPR_PLACEHOLDER_RE.find_iter(text) {
        if m.start() > last_end {
            parts.push(Part::Static(text[last_end..m.start()].to_string()));
        }
        match expressions.get(m.as_str()) {
            Some(code) => parts.push(Part::Expr(code.clone())),
            None => parts.push(Part::Static(m.as_str().to_string())),
        }
        last_end = m.end();
    }
    if last_end < text.len() {
        parts.push(Part::Static(text[last_end..].to_string()));
    }

    parts
}

fn analyze(code: &str) -> Result<crate::ir::Expr, WxmlError> {
    analyze_expression(code).map_err(|message| {
        WxmlError::new(
            ErrorKind::ExpressionSyntaxError,
            message,
            format!("{{{{{}}}}}", code),
        )
    })
}

/// JS template literal equivalent of mixed static text and mustaches.
fn template_literal(parts: &[Part]) -> String {
    let mut code = String::from("`");
    for part in parts {
        match part {
            Part::Static(text) => {
                code.push_str(
                    &text
                        .replace('\\', "\\\\")
                        .replace('`', "\\`")
                        .replace("${", "\\${"),
                );
            }
            Part::Expr(expr) => {
                code.push_str("${");
                code.push_str(expr.trim());
                code.push('}');
            }
        }
    }
    code.push('`');
    code
}

/// `bindtap` -> `onClick`, `catch:longpress` -> `onLongpress`.
fn event_prop_name(attr_name: &str) -> Option<String> {
    let caps = EVENT_RE.captures(attr_name)?;
    let event = &caps[1];
    if event == "tap" {
        Some("onClick".to_string())
    } else {
        Some(format!("on{}", pascal_case(event)))
    }
}

fn convert_attribute(
    tag: &str,
    name: &str,
    raw: &str,
    expressions: &HashMap<String, String>,
) -> Result<Attribute, WxmlError> {
    let parts = split_placeholders(raw, expressions);
    let is_static = parts.iter().all(|part| matches!(part, Part::Static(_)));

    if let Some(prop) = event_prop_name(name) {
        let value = if is_static {
            AttrValue::Method(raw.trim().to_string())
        } else {
            attribute_value(tag, name, &parts)?
        };
        return Ok(Attribute { name: prop, value });
    }

    Ok(Attribute {
        name: name.to_string(),
        value: attribute_value(tag, name, &parts)?,
    })
}

fn attribute_value(tag: &str, name: &str, parts: &[Part]) -> Result<AttrValue, WxmlError> {
    match parts {
        [] => Ok(AttrValue::Literal(String::new())),
        [Part::Expr(code)] if tag == "template" && name == "data" => {
            // Template data is an object literal body: `{{...item}}`, `{{a, b}}`.
            Ok(AttrValue::Expression(analyze(&format!("{{{}}}", code.trim()))?))
        }
        [Part::Expr(code)] => Ok(AttrValue::Expression(analyze(code)?)),
        _ if parts.iter().all(|part| matches!(part, Part::Static(_))) => {
            let text = parts
                .iter()
                .map(|part| match part {
                    Part::Static(text) | Part::Expr(text) => text.as_str(),
                })
                .collect::<String>();
            Ok(AttrValue::Literal(text))
        }
        _ => Ok(AttrValue::Expression(analyze(&template_literal(parts))?)),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DOM CONVERSION
// ═══════════════════════════════════════════════════════════════════════════════

struct DomConverter<'s> {
    expressions: &'s HashMap<String, String>,
    positions: HashMap<String, VecDeque<Position>>,
}

impl DomConverter<'_> {
    fn convert_children(&mut self, handle: &Handle) -> Result<Vec<Node>, WxmlError> {
        let mut nodes = Vec::new();
        for child in handle.children.borrow().iter() {
            nodes.extend(self.convert(child)?);
        }
        Ok(nodes)
    }

    fn convert(&mut self, handle: &Handle) -> Result<Vec<Node>, WxmlError> {
        match &handle.data {
            NodeData::Document => self.convert_children(handle),

            NodeData::Element {
                name,
                attrs,
                template_contents,
                ..
            } => {
                let mut tag = name.local.to_string();

                // html5ever adds these; WXML never has them.
                if matches!(tag.as_str(), "html" | "head" | "body") {
                    return self.convert_children(handle);
                }

                let attributes = attrs.borrow();
                let mut self_closing = false;
                for attr in attributes.iter() {
                    match &*attr.name.local {
                        ORIG_NAME_MARKER => tag = attr.value.to_string(),
                        SELF_CLOSING_MARKER => self_closing = true,
                        _ => {}
                    }
                }

                let position = if POSITIONED_TAGS.contains(&tag.as_str()) {
                    self.positions
                        .get_mut(&tag)
                        .and_then(VecDeque::pop_front)
                        .unwrap_or_default()
                } else {
                    Position::default()
                };

                let mut parsed_attrs = Vec::new();
                for attr in attributes.iter() {
                    let attr_name = attr.name.local.to_string();
                    if attr_name == ORIG_NAME_MARKER || attr_name == SELF_CLOSING_MARKER {
                        continue;
                    }
                    let parsed = convert_attribute(&tag, &attr_name, &attr.value, self.expressions)
                        .map_err(|e| e.with_position(position))?;
                    parsed_attrs.push(parsed);
                }

                let children = match template_contents.borrow().as_ref() {
                    Some(contents) => self.convert_children(contents)?,
                    None => self.convert_children(handle)?,
                };

                Ok(vec![Node::Element(ElementNode {
                    tag,
                    attributes: parsed_attrs,
                    children,
                    self_closing,
                    position,
                })])
            }

            NodeData::Text { contents } => {
                let text = contents.borrow().to_string();
                self.convert_text(&text)
            }

            NodeData::Comment { .. }
            | NodeData::Doctype { .. }
            | NodeData::ProcessingInstruction { .. } => Ok(vec![]),
        }
    }

    /// Blank runs at the edges of a text node are dropped. A blank run between
    /// two expressions separates them and is kept.
    fn convert_text(&self, text: &str) -> Result<Vec<Node>, WxmlError> {
        let parts = split_placeholders(text, self.expressions);
        let last = parts.len().saturating_sub(1);
        let mut nodes = Vec::new();
        for (i, part) in parts.into_iter().enumerate() {
            match part {
                Part::Static(value) => {
                    if !value.trim().is_empty() || (i > 0 && i < last) {
                        nodes.push(Node::Text(TextNode { value }));
                    }
                }
                Part::Expr(code) => nodes.push(Node::Expression(ExpressionNode {
                    expr: analyze(&code)?,
                })),
            }
        }
        Ok(nodes)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MAIN PARSING FUNCTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse WXML source into nodes plus the `<wxs>` modules it declares.
pub fn parse_markup(source: &str, file: &str) -> Result<ParsedMarkup, WxmlError> {
    let positions = scan_tag_positions(source);

    // Step 1: Script modules are not markup
    let (without_wxs, wxses) = extract_wxs(source);

    // Step 2: Mustaches to placeholders
    let (normalized, expressions) = normalize_mustaches(&without_wxs);

    // Step 3: Self-closing tags to open/close pairs
    let expanded = expand_self_closing(&normalized);

    // Step 4: Preserve tag names html5ever would change
    let marked = mark_tag_names(&expanded);

    // Step 5: Parse with html5ever
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut marked.as_bytes())
        .map_err(|e| {
            WxmlError::new(
                ErrorKind::ParseError,
                format!("Failed to parse WXML: {}", e),
                "",
            )
            .in_file(file)
        })?;

    // Step 6: Convert the DOM
    let mut converter = DomConverter {
        expressions: &expressions,
        positions,
    };
    let nodes = converter
        .convert(&dom.document)
        .map_err(|e| e.in_file(file))?;

    Ok(ParsedMarkup { nodes, wxses })
}

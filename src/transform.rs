//! The compilation pass over one WXML file.
//!
//! Parses the markup, pre-scans template definitions, then rewrites the tree
//! bottom-up: `<template>` through [`parse_template`], `<import>` and
//! `<include>` through [`parse_module`].

use std::mem;
use std::path::{Path, PathBuf};

use crate::error::{Diagnostics, WxmlError};
use crate::fs::FileSystem;
use crate::ir::{ElementNode, Node, Rewrite};
use crate::module::{parse_module, ImportRecord, ModuleKind};
use crate::parse::{parse_markup, WxsModule};
use crate::resolve::normalize_path;
use crate::template::{
    parse_template, pre_parse_template, TemplateDefinition, TemplateScan, TEMPLATE_TAG,
};

/// State threaded through one compilation pass and every module it pulls in.
pub struct ParseContext<'a> {
    pub root_path: PathBuf,
    pub fs: &'a dyn FileSystem,
    pub diagnostics: Diagnostics,
    /// Files currently being parsed, outermost first.
    active: Vec<PathBuf>,
}

impl<'a> ParseContext<'a> {
    pub fn new(root_path: impl Into<PathBuf>, fs: &'a dyn FileSystem) -> Self {
        Self {
            root_path: root_path.into(),
            fs,
            diagnostics: Diagnostics::new(),
            active: Vec::new(),
        }
    }

    pub fn is_active(&self, path: &Path) -> bool {
        let path = normalize_path(path);
        self.active.iter().any(|active| *active == path)
    }

    fn enter(&mut self, path: &Path) {
        self.active.push(normalize_path(path));
    }

    fn leave(&mut self) {
        self.active.pop();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WxmlOutput {
    /// What the file renders: nothing, its single top-level node, or a block.
    pub wxml: Option<Node>,
    pub templates: Vec<TemplateDefinition>,
    pub imports: Vec<ImportRecord>,
    pub wxses: Vec<WxsModule>,
    pub scans: Vec<TemplateScan>,
}

/// Compile the WXML file at `path` whose text is `source`.
pub fn parse_wxml(
    path: &Path,
    source: &str,
    ctx: &mut ParseContext,
) -> Result<WxmlOutput, WxmlError> {
    let file = path.to_string_lossy().to_string();
    ctx.diagnostics.log(format!("parsing {}", file));

    let parsed = parse_markup(source, &file)?;

    ctx.enter(path);
    let result = transform_markup(path, parsed.nodes, parsed.wxses, ctx);
    ctx.leave();

    result.map_err(|e| e.in_file(&file))
}

fn transform_markup(
    path: &Path,
    nodes: Vec<Node>,
    wxses: Vec<WxsModule>,
    ctx: &mut ParseContext,
) -> Result<WxmlOutput, WxmlError> {
    let mut root = ElementNode::block(nodes);

    let mut scans = Vec::new();
    scan_templates(&root, &mut scans)?;

    let mut rewriter = Rewriter {
        dir_path: path,
        wxses: &wxses,
        templates: Vec::new(),
        imports: Vec::new(),
    };
    let children = rewriter.rewrite_children(mem::take(&mut root.children), ctx)?;
    let Rewriter {
        templates, imports, ..
    } = rewriter;

    let wxml = match children.len() {
        0 => None,
        1 => children.into_iter().next(),
        _ => Some(Node::Element(ElementNode::block(children))),
    };

    Ok(WxmlOutput {
        wxml,
        templates,
        imports,
        wxses,
        scans,
    })
}

fn scan_templates(parent: &ElementNode, scans: &mut Vec<TemplateScan>) -> Result<(), WxmlError> {
    for child in &parent.children {
        if let Node::Element(el) = child {
            if el.tag == TEMPLATE_TAG && el.has_attr("name") {
                scans.extend(pre_parse_template(el, Some(parent))?);
            }
            scan_templates(el, scans)?;
        }
    }
    Ok(())
}

struct Rewriter<'p> {
    dir_path: &'p Path,
    wxses: &'p [WxsModule],
    templates: Vec<TemplateDefinition>,
    imports: Vec<ImportRecord>,
}

impl Rewriter<'_> {
    fn rewrite_children(
        &mut self,
        children: Vec<Node>,
        ctx: &mut ParseContext,
    ) -> Result<Vec<Node>, WxmlError> {
        let mut out = Vec::with_capacity(children.len());
        for child in children {
            out.extend(self.rewrite_node(child, ctx)?);
        }
        Ok(out)
    }

    fn rewrite_node(&mut self, node: Node, ctx: &mut ParseContext) -> Result<Vec<Node>, WxmlError> {
        match node {
            Node::Element(mut el) => {
                el.children = self.rewrite_children(mem::take(&mut el.children), ctx)?;
                match el.tag.as_str() {
                    TEMPLATE_TAG => {
                        let outcome = parse_template(&el, self.wxses)?;
                        self.templates.extend(outcome.definition);
                        // Runtime `is=` candidates are templates themselves.
                        match outcome.rewrite {
                            Rewrite::Replace(replacement) => self.rewrite_node(replacement, ctx),
                            other => Ok(apply(other, el)),
                        }
                    }
                    "import" | "include" => {
                        let kind = if el.tag == "import" {
                            ModuleKind::Import
                        } else {
                            ModuleKind::Include
                        };
                        let outcome = parse_module(&el, self.dir_path, kind, ctx)?;
                        self.imports.extend(outcome.imports);
                        Ok(apply(outcome.rewrite, el))
                    }
                    _ => Ok(vec![Node::Element(el)]),
                }
            }
            Node::Conditional(mut cond) => {
                cond.consequent = self.rewrite_children(mem::take(&mut cond.consequent), ctx)?;
                cond.alternate = self.rewrite_children(mem::take(&mut cond.alternate), ctx)?;
                Ok(vec![Node::Conditional(cond)])
            }
            other => Ok(vec![other]),
        }
    }
}

fn apply(rewrite: Rewrite, el: ElementNode) -> Vec<Node> {
    match rewrite {
        Rewrite::Keep => vec![Node::Element(el)],
        Rewrite::Remove => vec![],
        Rewrite::Replace(node) => vec![node],
    }
}

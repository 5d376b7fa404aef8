//! # WXML Taroize
//!
//! Converts WeChat Mini-Program markup into JSX components.
//!
//! ## Pipeline
//!
//! 1. **Parse**: WXML text becomes a typed node tree ([`parse`]). Mustaches are
//!    analyzed once, `<wxs>` modules are collected.
//! 2. **Pre-scan**: every `<template name>` is scanned for the methods it binds
//!    and the templates it applies.
//! 3. **Resolve**: bottom-up rewrite. `<template name>` definitions become class
//!    components whose props are the data they read; `<template is>` becomes an
//!    element naming that component; `<import>` pulls in definitions from another
//!    file and `<include>` splices in another file's markup.
//! 4. **Print**: the remaining markup and every component are printed as JSX.
//!
//! Malformed `<template>`, `<import>` and `<include>` tags stop the pass with a
//! [`WxmlError`]. Missing or circular module targets only add a diagnostic.

#[cfg(feature = "napi")]
use napi_derive::napi;

use serde::Serialize;
use std::path::Path;

mod codegen;
mod discovery;
mod error;
mod fs;
mod ir;
mod module;
mod naming;
mod options;
mod parse;
mod resolve;
mod scope;
mod template;
mod transform;
mod visitor;

#[cfg(test)]
mod module_tests;
#[cfg(test)]
mod pipeline_tests;

pub use codegen::{print_component, print_jsx};
pub use discovery::{discover_wxml_files, taroize_dir, FileOutput, FileResult};
pub use error::{Diagnostics, ErrorKind, ResolveError, WxmlError, WXML_FILE};
pub use fs::{FileSystem, MemoryFileSystem, OsFileSystem};
pub use ir::{
    AttrValue, Attribute, ConditionalNode, ElementNode, Expr, ExprShape, ExpressionNode, Node,
    Position, Rewrite, TextNode,
};
pub use module::{parse_module, ImportRecord, ModuleKind, ModuleOutcome};
pub use naming::build_template_name;
pub use options::TaroizeOptions;
pub use parse::{parse_markup, ParsedMarkup, WxsModule};
pub use resolve::get_src_rel_path;
pub use template::{
    parse_template, pre_parse_template, TemplateComponent, TemplateDefinition, TemplateOutcome,
    TemplateScan,
};
pub use transform::{parse_wxml, ParseContext, WxmlOutput};

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// A template definition printed as a component.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateModule {
    pub name: String,
    pub tmpl_name: String,
    pub code: String,
    pub used_wxses: Vec<String>,
}

impl From<&TemplateDefinition> for TemplateModule {
    fn from(definition: &TemplateDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            tmpl_name: definition.tmpl_name.clone(),
            code: print_component(&definition.ast),
            used_wxses: definition.used_wxses.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedTemplate {
    pub path: String,
    #[serde(flatten)]
    pub template: TemplateModule,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaroizeOutput {
    /// JSX the file renders, `None` when nothing is left after resolution.
    pub jsx: Option<String>,
    pub templates: Vec<TemplateModule>,
    pub imports: Vec<ImportedTemplate>,
    pub wxses: Vec<WxsModule>,
    pub scans: Vec<TemplateScan>,
    pub errors: Vec<String>,
    pub log: Vec<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY POINTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Compile one WXML file read from disk relative to `options.root_path`.
pub fn taroize(
    source: &str,
    file_path: &Path,
    options: &TaroizeOptions,
) -> Result<TaroizeOutput, WxmlError> {
    taroize_with_fs(source, file_path, options, &OsFileSystem)
}

/// Compile one WXML file, reading imported files through `fs`.
pub fn taroize_with_fs(
    source: &str,
    file_path: &Path,
    options: &TaroizeOptions,
    fs: &dyn FileSystem,
) -> Result<TaroizeOutput, WxmlError> {
    let mut ctx = ParseContext::new(options.root_path.clone(), fs);
    let output = parse_wxml(file_path, source, &mut ctx)?;

    let jsx = output.wxml.as_ref().map(print_jsx);
    let templates = output.templates.iter().map(TemplateModule::from).collect();
    let imports = output
        .imports
        .iter()
        .map(|record| ImportedTemplate {
            path: record.path.clone(),
            template: TemplateModule::from(&record.template),
        })
        .collect();

    let ParseContext { diagnostics, .. } = ctx;

    Ok(TaroizeOutput {
        jsx,
        templates,
        imports,
        wxses: output.wxses,
        scans: output.scans,
        errors: diagnostics.errors,
        log: diagnostics.log,
    })
}

#[cfg(feature = "napi")]
#[napi]
pub fn taroize_native(
    source: String,
    file_path: String,
    options_json: Option<String>,
) -> napi::Result<serde_json::Value> {
    let options = match options_json {
        Some(json) => TaroizeOptions::from_json(&json)
            .map_err(|e| napi::Error::from_reason(format!("Options parse error: {}", e)))?,
        None => TaroizeOptions::default(),
    };
    let output = taroize(&source, Path::new(&file_path), &options)
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;
    serde_json::to_value(output).map_err(|e| napi::Error::from_reason(e.to_string()))
}

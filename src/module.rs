//! `<import>` and `<include>` resolution.

use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::error::{ErrorKind, WxmlError};
use crate::ir::{AttrValue, ElementNode, Rewrite};
use crate::resolve::{
    get_src_rel_path, normalize_path, relative_path, to_module_path, with_wxml_extension,
};
use crate::template::TemplateDefinition;
use crate::transform::{parse_wxml, ParseContext};

const SRC_ATTR: &str = "src";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    Import,
    Include,
}

impl ModuleKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ModuleKind::Import => "import",
            ModuleKind::Include => "include",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A template definition pulled in through `<import>`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    /// `src` as seen from the importing file.
    pub path: String,
    pub template: TemplateDefinition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleOutcome {
    pub rewrite: Rewrite,
    pub imports: Vec<ImportRecord>,
}

impl ModuleOutcome {
    fn removed() -> Self {
        Self {
            rewrite: Rewrite::Remove,
            imports: vec![],
        }
    }
}

/// Resolve an `<import>` or `<include>` tag found in the file at `dir_path`.
///
/// Imports contribute the target's template definitions and disappear;
/// includes are replaced by the target's markup. A target that cannot be read
/// is recorded in the diagnostics and the tag is dropped.
pub fn parse_module(
    node: &ElementNode,
    dir_path: &Path,
    kind: ModuleKind,
    ctx: &mut ParseContext,
) -> Result<ModuleOutcome, WxmlError> {
    let src = match node.attr(SRC_ATTR).map(|attr| &attr.value) {
        Some(AttrValue::Literal(src)) if !src.is_empty() => src,
        _ => {
            return Err(WxmlError::at(
                ErrorKind::WxmlTagSrcAttributeError,
                format!("{} tag must carry a string `src` attribute", kind),
                node,
            ))
        }
    };

    let dir = match dir_path.extension() {
        Some(_) => dir_path.parent().unwrap_or(dir_path),
        None => dir_path,
    };

    let rel_path = get_src_rel_path(&ctx.root_path, dir, src, ctx.fs).map_err(|e| {
        WxmlError::at(
            ErrorKind::ImportSrcPathFormatError,
            format!("cannot resolve {} src `{}`: {}", kind, src, e),
            node,
        )
    })?;

    let mut target = if src.starts_with('/') {
        normalize_path(&ctx.root_path.join(src.trim_start_matches('/')))
    } else {
        normalize_path(&dir.join(&rel_path))
    };
    if target.extension().is_none() {
        target = with_wxml_extension(&target);
    }

    if ctx.is_active(&target) {
        ctx.diagnostics.error(format!(
            "circular {} of {} from {}, tag skipped",
            kind,
            target.display(),
            dir_path.display()
        ));
        return Ok(ModuleOutcome::removed());
    }

    let content = match ctx.fs.read_to_string(&target) {
        Ok(content) => content,
        Err(e) => {
            ctx.diagnostics.error(format!(
                "failed to read {} target {}: {}",
                kind,
                target.display(),
                e
            ));
            String::new()
        }
    };

    match kind {
        ModuleKind::Import => {
            if content.trim().is_empty() {
                return Ok(ModuleOutcome::removed());
            }
            let output = parse_wxml(&target, &content, ctx)?;
            let mut imports: Vec<ImportRecord> = output
                .templates
                .into_iter()
                .map(|template| ImportRecord {
                    path: rel_path.clone(),
                    template,
                })
                .collect();
            let target_dir = target.parent().unwrap_or(&target).to_path_buf();
            imports.extend(output.imports.into_iter().map(|record| ImportRecord {
                path: to_module_path(&relative_path(dir, &target_dir.join(&record.path))),
                template: record.template,
            }));
            ctx.diagnostics.log(format!(
                "imported {} template(s) from {}",
                imports.len(),
                target.display()
            ));
            Ok(ModuleOutcome {
                rewrite: Rewrite::Remove,
                imports,
            })
        }
        ModuleKind::Include => {
            let wxml = if content.trim().is_empty() {
                None
            } else {
                parse_wxml(&target, &content, ctx)?.wxml
            };
            match wxml {
                Some(markup) => Ok(ModuleOutcome {
                    rewrite: Rewrite::Replace(markup),
                    imports: vec![],
                }),
                None => {
                    if node.self_closing {
                        ctx.diagnostics
                            .log(format!("include of {} renders nothing", target.display()));
                    } else {
                        ctx.diagnostics.error(format!(
                            "include of {} renders nothing; write the tag self-closing: {}",
                            target.display(),
                            node.to_markup()
                        ));
                    }
                    Ok(ModuleOutcome::removed())
                }
            }
        }
    }
}

//! Error reports and the diagnostics sink.
//!
//! Structural problems in `<template>`, `<import>` and `<include>` tags are
//! fatal and surface as [`WxmlError`]. Missing files and import cycles are
//! soft failures recorded in [`Diagnostics`] so the rest of the tree still
//! compiles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::ir::{ElementNode, Position};

/// Source-kind tag carried by every report produced from markup.
pub const WXML_FILE: &str = "WXML_FILE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    TemplateNameTypeMismatchError,
    TemplateIsAttributeEmptyError,
    TemplateIsAttributeTypeMismatchError,
    TemplateMissingIsNameError,
    WxmlTagSrcAttributeError,
    ImportSrcPathFormatError,
    ExpressionSyntaxError,
    ParseError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::TemplateNameTypeMismatchError => "TemplateNameTypeMismatchError",
            ErrorKind::TemplateIsAttributeEmptyError => "TemplateIsAttributeEmptyError",
            ErrorKind::TemplateIsAttributeTypeMismatchError => {
                "TemplateIsAttributeTypeMismatchError"
            }
            ErrorKind::TemplateMissingIsNameError => "TemplateMissingIsNameError",
            ErrorKind::WxmlTagSrcAttributeError => "WxmlTagSrcAttributeError",
            ErrorKind::ImportSrcPathFormatError => "ImportSrcPathFormatError",
            ErrorKind::ExpressionSyntaxError => "ExpressionSyntaxError",
            ErrorKind::ParseError => "ParseError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fatal report about a markup tag the transform cannot interpret.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[error("{kind}: {message} ({file}:{position})")]
pub struct WxmlError {
    pub kind: ErrorKind,
    pub message: String,
    /// Always [`WXML_FILE`].
    pub source_kind: String,
    /// Best-effort serialization of the offending node.
    pub code: String,
    pub position: Position,
    /// File the offending node came from. Empty until the pipeline attaches it.
    #[serde(default)]
    pub file: String,
}

impl WxmlError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source_kind: WXML_FILE.to_string(),
            code: code.into(),
            position: Position::default(),
            file: String::new(),
        }
    }

    /// Report anchored at an element: the snippet and position come from it.
    pub fn at(kind: ErrorKind, message: impl Into<String>, node: &ElementNode) -> Self {
        let mut err = Self::new(kind, message, node.to_markup());
        err.position = node.position;
        err
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Attach the source file unless a nested module already did.
    pub fn in_file(mut self, file: &str) -> Self {
        if self.file.is_empty() {
            self.file = file.to_string();
        }
        self
    }
}

/// Failure of the path resolver.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),
}

/// Append-only sink for soft failures and pass progress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub errors: Vec<String>,
    pub log: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.errors.push(message);
    }

    pub fn log(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!("{}", message);
        self.log.push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

//! Batch compilation of a source tree.
//!
//! Every `.wxml` file under a directory is compiled on its own pass; passes
//! run in parallel and share nothing but the read-only file system.

use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::fs::OsFileSystem;
use crate::options::TaroizeOptions;
use crate::resolve::WXML_EXTENSION;
use crate::{taroize_with_fs, TaroizeOutput};

/// Outcome of compiling one file of a directory.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOutput {
    pub path: PathBuf,
    #[serde(flatten)]
    pub result: FileResult,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum FileResult {
    Compiled(TaroizeOutput),
    Failed { error: String },
}

/// Recursively find all .wxml files in a directory, sorted.
pub fn discover_wxml_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == WXML_EXTENSION))
        .collect();
    files.sort();
    files
}

/// Compile every .wxml file under `dir`.
pub fn taroize_dir(dir: &Path, options: &TaroizeOptions) -> Vec<FileOutput> {
    let files = discover_wxml_files(dir);
    tracing::debug!("compiling {} wxml file(s) under {}", files.len(), dir.display());

    files
        .into_par_iter()
        .map(|path| {
            let result = match fs::read_to_string(&path) {
                Ok(source) => match taroize_with_fs(&source, &path, options, &OsFileSystem) {
                    Ok(output) => FileResult::Compiled(output),
                    Err(e) => FileResult::Failed {
                        error: e.to_string(),
                    },
                },
                Err(e) => FileResult::Failed {
                    error: format!("Failed to read file: {}", e),
                },
            };
            FileOutput { path, result }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_wxml_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pages/index")).unwrap();
        fs::write(dir.path().join("pages/index/index.wxml"), "<view/>").unwrap();
        fs::write(dir.path().join("pages/index/index.js"), "Page({})").unwrap();
        fs::write(dir.path().join("common.wxml"), "<text>hi</text>").unwrap();

        let files = discover_wxml_files(dir.path());
        assert_eq!(
            files,
            vec![
                dir.path().join("common.wxml"),
                dir.path().join("pages/index/index.wxml"),
            ]
        );
    }

    #[test]
    fn test_taroize_dir_keeps_going_after_failures() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.wxml"), "<view>{{name}}</view>").unwrap();
        fs::write(dir.path().join("b.wxml"), "<template/>").unwrap();

        let options = TaroizeOptions::with_root(dir.path());
        let outputs = taroize_dir(dir.path(), &options);
        assert_eq!(outputs.len(), 2);

        match &outputs[0].result {
            FileResult::Compiled(output) => {
                assert_eq!(output.jsx.as_deref(), Some("<View>{name}</View>"))
            }
            FileResult::Failed { error } => panic!("a.wxml failed: {}", error),
        }
        match &outputs[1].result {
            FileResult::Failed { error } => assert!(error.contains("TemplateMissingIsNameError")),
            FileResult::Compiled(_) => panic!("b.wxml should fail"),
        }
    }
}

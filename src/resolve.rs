//! Path resolution for `import` / `include` `src` attributes.

use std::path::{Component, Path, PathBuf};

use crate::error::ResolveError;
use crate::fs::FileSystem;

pub const WXML_EXTENSION: &str = "wxml";

/// Turn a `src` value into a path relative to `dir_path`.
///
/// Relative values pass through untouched. Values starting with `/` are rooted
/// at `root`; the target (or the target plus `.wxml`) must exist. The result
/// always uses `/` and always starts with `.`.
pub fn get_src_rel_path(
    root: &Path,
    dir_path: &Path,
    src_path: &str,
    fs: &dyn FileSystem,
) -> Result<String, ResolveError> {
    if !src_path.starts_with('/') {
        return Ok(src_path.to_string());
    }

    let target = root.join(src_path.trim_start_matches('/'));
    if !fs.exists(&target) && !fs.exists(&with_wxml_extension(&target)) {
        return Err(ResolveError::PathNotFound(target));
    }

    Ok(to_module_path(&relative_path(dir_path, &target)))
}

/// Render a relative path the way `src` attributes spell it: `/` separators
/// and a leading `.`.
pub fn to_module_path(path: &Path) -> String {
    let relative = path.to_string_lossy().replace('\\', "/");
    if relative.starts_with('.') {
        relative
    } else {
        format!("./{}", relative)
    }
}

/// `a/b` -> `a/b.wxml`, keeping whatever extension-like suffix is already there.
pub fn with_wxml_extension(path: &Path) -> PathBuf {
    let mut raw = path.as_os_str().to_owned();
    raw.push(".");
    raw.push(WXML_EXTENSION);
    PathBuf::from(raw)
}

/// Lexically resolve `.` and `..` without touching the file system.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Anchor a relative path at the current working directory.
pub fn absolute_path(path: &Path) -> PathBuf {
    if path.has_root() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| Path::new("/").join(path))
}

/// Path of `to` as seen from the directory `from`.
///
/// Relative inputs are anchored at the working directory first, so a relative
/// `from` and an absolute `to` still meet on a common root.
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from = normalize_path(&absolute_path(from));
    let to = normalize_path(&absolute_path(to));
    let from_parts: Vec<Component> = from.components().collect();
    let to_parts: Vec<Component> = to.components().collect();

    let common = from_parts
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..from_parts.len() {
        relative.push("..");
    }
    for part in &to_parts[common..] {
        relative.push(part.as_os_str());
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    relative
}

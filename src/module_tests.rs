#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::error::ErrorKind;
    use crate::fs::MemoryFileSystem;
    use crate::ir::{Attribute, ElementNode, Rewrite};
    use crate::module::{parse_module, ModuleKind};
    use crate::transform::ParseContext;

    const PAGE: &str = "/proj/pages/index.wxml";

    fn module_tag(tag: &str, src: &str) -> ElementNode {
        let mut el = ElementNode::new(tag);
        el.attributes.push(Attribute::literal("src", src));
        el.self_closing = true;
        el
    }

    fn project() -> MemoryFileSystem {
        MemoryFileSystem::new()
            .with_file(
                "/proj/templates/item.wxml",
                r#"<template name="item"><text>{{label}}</text></template>"#,
            )
            .with_file(
                "/proj/pages/header.wxml",
                r#"<view class="header">{{title}}</view>"#,
            )
            .with_file("/proj/pages/blank.wxml", "")
    }

    #[test]
    fn test_import_collects_definitions() {
        let fs = project();
        let mut ctx = ParseContext::new("/proj", &fs);
        let node = module_tag("import", "/templates/item.wxml");

        let outcome = parse_module(&node, Path::new(PAGE), ModuleKind::Import, &mut ctx).unwrap();
        assert_eq!(outcome.rewrite, Rewrite::Remove);
        assert_eq!(outcome.imports.len(), 1);
        assert_eq!(outcome.imports[0].path, "../templates/item.wxml");
        assert_eq!(outcome.imports[0].template.name, "ItemTmpl");
        assert_eq!(outcome.imports[0].template.ast.props, vec!["label"]);
        assert!(ctx.diagnostics.errors.is_empty());
    }

    #[test]
    fn test_import_relative_without_extension() {
        let fs = project();
        let mut ctx = ParseContext::new("/proj", &fs);
        let node = module_tag("import", "../templates/item");

        let outcome = parse_module(&node, Path::new(PAGE), ModuleKind::Import, &mut ctx).unwrap();
        assert_eq!(outcome.imports.len(), 1);
        assert_eq!(outcome.imports[0].path, "../templates/item");
    }

    #[test]
    fn test_missing_import_is_soft() {
        let fs = project();
        let mut ctx = ParseContext::new("/proj", &fs);
        let node = module_tag("import", "./missing.wxml");

        let outcome = parse_module(&node, Path::new(PAGE), ModuleKind::Import, &mut ctx).unwrap();
        assert_eq!(outcome.rewrite, Rewrite::Remove);
        assert!(outcome.imports.is_empty());
        assert_eq!(ctx.diagnostics.errors.len(), 1);
        assert!(ctx.diagnostics.errors[0].contains("missing.wxml"));
    }

    #[test]
    fn test_unresolvable_absolute_src() {
        let fs = project();
        let mut ctx = ParseContext::new("/proj", &fs);
        let node = module_tag("import", "/nowhere/item.wxml");

        let err = parse_module(&node, Path::new(PAGE), ModuleKind::Import, &mut ctx).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ImportSrcPathFormatError);
    }

    #[test]
    fn test_src_must_be_a_literal() {
        let fs = project();
        let mut ctx = ParseContext::new("/proj", &fs);

        let node = ElementNode::new("include");
        let err = parse_module(&node, Path::new(PAGE), ModuleKind::Include, &mut ctx).unwrap_err();
        assert_eq!(err.kind, ErrorKind::WxmlTagSrcAttributeError);

        let node = module_tag("import", "");
        let err = parse_module(&node, Path::new(PAGE), ModuleKind::Import, &mut ctx).unwrap_err();
        assert_eq!(err.kind, ErrorKind::WxmlTagSrcAttributeError);
    }

    #[test]
    fn test_include_splices_markup() {
        let fs = project();
        let mut ctx = ParseContext::new("/proj", &fs);
        let node = module_tag("include", "./header.wxml");

        let outcome = parse_module(&node, Path::new(PAGE), ModuleKind::Include, &mut ctx).unwrap();
        assert!(outcome.imports.is_empty());
        match outcome.rewrite {
            Rewrite::Replace(markup) => {
                let view = markup.as_element().unwrap();
                assert_eq!(view.tag, "view");
                assert_eq!(view.literal_attr("class"), Some("header"));
            }
            other => panic!("expected a replacement, got {:?}", other),
        }
    }

    #[test]
    fn test_include_from_directory() {
        let fs = project();
        let mut ctx = ParseContext::new("/proj", &fs);
        let node = module_tag("include", "header");

        let outcome =
            parse_module(&node, Path::new("/proj/pages"), ModuleKind::Include, &mut ctx).unwrap();
        assert!(matches!(outcome.rewrite, Rewrite::Replace(_)));
    }

    #[test]
    fn test_empty_include() {
        let fs = project();
        let mut ctx = ParseContext::new("/proj", &fs);

        let node = module_tag("include", "./blank.wxml");
        let outcome = parse_module(&node, Path::new(PAGE), ModuleKind::Include, &mut ctx).unwrap();
        assert_eq!(outcome.rewrite, Rewrite::Remove);
        assert!(ctx.diagnostics.errors.is_empty());

        let mut node = module_tag("include", "./blank.wxml");
        node.self_closing = false;
        let outcome = parse_module(&node, Path::new(PAGE), ModuleKind::Include, &mut ctx).unwrap();
        assert_eq!(outcome.rewrite, Rewrite::Remove);
        assert_eq!(ctx.diagnostics.errors.len(), 1);
        assert!(ctx.diagnostics.errors[0].contains("self-closing"));
    }

    #[test]
    fn test_transitive_import_paths_are_rebased() {
        let fs = MemoryFileSystem::new()
            .with_file(
                "/proj/pages/sub/b.wxml",
                r#"<import src="./c.wxml"/><template name="b"><view/></template>"#,
            )
            .with_file(
                "/proj/pages/sub/c.wxml",
                r#"<template name="c"><text>{{label}}</text></template>"#,
            );
        let mut ctx = ParseContext::new("/proj", &fs);
        let node = module_tag("import", "./sub/b.wxml");

        let outcome = parse_module(&node, Path::new(PAGE), ModuleKind::Import, &mut ctx).unwrap();
        let records: Vec<(&str, &str)> = outcome
            .imports
            .iter()
            .map(|record| (record.path.as_str(), record.template.name.as_str()))
            .collect();
        assert_eq!(
            records,
            vec![("./sub/b.wxml", "BTmpl"), ("./sub/c.wxml", "CTmpl")]
        );
        assert!(ctx.diagnostics.errors.is_empty());
    }

    #[test]
    fn test_rooted_import_from_relative_page() {
        let fs = project();
        let mut ctx = ParseContext::new("/proj", &fs);
        let node = module_tag("import", "/templates/item.wxml");

        let outcome = parse_module(
            &node,
            Path::new("pages/index.wxml"),
            ModuleKind::Import,
            &mut ctx,
        )
        .unwrap();
        assert_eq!(outcome.imports.len(), 1);
        assert_eq!(outcome.imports[0].template.name, "ItemTmpl");
        assert!(!outcome.imports[0].path.contains("//"));
        assert!(outcome.imports[0].path.ends_with("/proj/templates/item.wxml"));
        assert!(ctx.diagnostics.errors.is_empty());
    }
}

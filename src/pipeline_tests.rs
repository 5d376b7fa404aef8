#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::error::ErrorKind;
    use crate::fs::MemoryFileSystem;
    use crate::options::TaroizeOptions;
    use crate::transform::{parse_wxml, ParseContext};
    use crate::{taroize_with_fs, TaroizeOutput};

    const PAGE: &str = "/proj/pages/index.wxml";

    fn compile(fs: &MemoryFileSystem, source: &str) -> TaroizeOutput {
        taroize_with_fs(source, Path::new(PAGE), &TaroizeOptions::with_root("/proj"), fs).unwrap()
    }

    #[test]
    fn test_full_page() {
        let fs = MemoryFileSystem::new().with_file(
            "/proj/templates/item.wxml",
            r#"<template name="item"><text>{{label}}</text></template>"#,
        );
        let source = r#"
<import src="/templates/item.wxml"/>
<template name="header"><view class="title">{{title}}</view></template>
<view class="page">
  <template is="header" data="{{title}}"/>
  <view wx:for="{{list}}" wx:key="id"><template is="item" data="{{...item}}"/></view>
</view>
"#;
        let output = compile(&fs, source);

        assert_eq!(
            output.jsx.as_deref(),
            Some(
                "<View className=\"page\"><HeaderTmpl data={{title}} />\
                 {list.map((item, index) => <View key={item.id}><ItemTmpl data={{...item}} /></View>)}</View>"
            )
        );

        assert_eq!(output.templates.len(), 1);
        let header = &output.templates[0];
        assert_eq!(header.name, "HeaderTmpl");
        assert_eq!(header.tmpl_name, "header");
        assert!(header.code.contains("class HeaderTmpl extends React.Component"));
        assert!(header.code.contains("withWeapp"));
        assert!(header.code.contains("this.props"));
        assert!(header.code.contains("title"));

        assert_eq!(output.imports.len(), 1);
        assert_eq!(output.imports[0].path, "../templates/item.wxml");
        assert_eq!(output.imports[0].template.name, "ItemTmpl");

        assert_eq!(output.scans.len(), 1);
        assert_eq!(output.scans[0].name, "HeaderTmpl");
        assert!(output.errors.is_empty());
        assert!(!output.log.is_empty());
    }

    #[test]
    fn test_runtime_is_selection() {
        let fs = MemoryFileSystem::new();
        let output = compile(
            &fs,
            r#"<template is="{{vip ? 'gold' : 'plain'}}" data="{{user}}"/>"#,
        );
        assert_eq!(
            output.jsx.as_deref(),
            Some("<Block>{vip ? <GoldTmpl data={{user}} /> : <PlainTmpl data={{user}} />}</Block>")
        );
    }

    #[test]
    fn test_if_chain() {
        let fs = MemoryFileSystem::new();
        let output = compile(
            &fs,
            r#"<view wx:if="{{a}}">A</view><view wx:elif="{{b}}">B</view><view wx:else>C</view>"#,
        );
        assert_eq!(
            output.jsx.as_deref(),
            Some("<Block>{a ? <View>A</View> : b ? <View>B</View> : <View>C</View>}</Block>")
        );
    }

    #[test]
    fn test_if_without_else_and_loop_filter() {
        let fs = MemoryFileSystem::new();
        let output = compile(
            &fs,
            r#"<view><text wx:if="{{ok}}">yes</text><text wx:for="{{rows}}" wx:for-item="r" wx:if="{{r.on}}" wx:key="*this">{{r}}</text></view>"#,
        );
        assert_eq!(
            output.jsx.as_deref(),
            Some(
                "<View>{ok ? <Text>yes</Text> : null}\
                 {rows.map((r, index) => (r.on ? <Text key={r}>{r}</Text> : null))}</View>"
            )
        );
    }

    #[test]
    fn test_only_definitions_render_nothing() {
        let fs = MemoryFileSystem::new();
        let output = compile(&fs, r#"<template name="empty"><view/></template>"#);
        assert!(output.jsx.is_none());
        assert_eq!(output.templates.len(), 1);
        assert!(output.templates[0].code.contains("class EmptyTmpl"));
        assert!(!output.templates[0].code.contains("this.props"));
    }

    #[test]
    fn test_missing_import_is_reported() {
        let fs = MemoryFileSystem::new();
        let output = compile(&fs, r#"<import src="./gone.wxml"/><view>ok</view>"#);
        assert_eq!(output.jsx.as_deref(), Some("<View>ok</View>"));
        assert!(output.imports.is_empty());
        assert_eq!(output.errors.len(), 1);
    }

    #[test]
    fn test_import_cycle_is_skipped() {
        let fs = MemoryFileSystem::new()
            .with_file(
                "/proj/a.wxml",
                r#"<import src="./b.wxml"/><template name="a"><view/></template>"#,
            )
            .with_file(
                "/proj/b.wxml",
                r#"<import src="./a.wxml"/><template name="b"><view/></template>"#,
            );
        let mut ctx = ParseContext::new("/proj", &fs);
        let source = fs_source(&fs, "/proj/a.wxml");

        let output = parse_wxml(Path::new("/proj/a.wxml"), &source, &mut ctx).unwrap();
        assert_eq!(output.templates.len(), 1);
        assert_eq!(output.imports.len(), 1);
        assert_eq!(output.imports[0].template.name, "BTmpl");
        assert_eq!(ctx.diagnostics.errors.len(), 1);
        assert!(ctx.diagnostics.errors[0].contains("circular"));
    }

    #[test]
    fn test_nested_error_keeps_nested_file() {
        let fs = MemoryFileSystem::new().with_file("/proj/bad.wxml", "<view/>\n<template/>");
        let err = taroize_with_fs(
            r#"<import src="/bad.wxml"/>"#,
            Path::new(PAGE),
            &TaroizeOptions::with_root("/proj"),
            &fs,
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::TemplateMissingIsNameError);
        assert_eq!(err.file, "/proj/bad.wxml");
        assert_eq!(err.position.row, 2);
    }

    #[test]
    fn test_wxs_used_by_template() {
        let fs = MemoryFileSystem::new();
        let output = compile(
            &fs,
            r#"<wxs module="m">module.exports = { f: function (x) { return x } }</wxs>
<template name="t"><text>{{m.f(x)}}</text></template>"#,
        );
        assert_eq!(output.wxses.len(), 1);
        assert_eq!(output.templates[0].used_wxses, vec!["m"]);
    }

    #[test]
    fn test_rooted_import_from_relative_page() {
        let fs = MemoryFileSystem::new().with_file(
            "/proj/c/d.wxml",
            r#"<template name="d"><view>{{v}}</view></template>"#,
        );
        let output = taroize_with_fs(
            r#"<import src="/c/d.wxml"/>"#,
            Path::new("pages/index.wxml"),
            &TaroizeOptions::with_root("/proj"),
            &fs,
        )
        .unwrap();
        assert_eq!(output.imports.len(), 1);
        assert_eq!(output.imports[0].template.name, "DTmpl");
        assert!(output.errors.is_empty());
    }

    #[test]
    fn test_text_keeps_space_between_expressions() {
        let fs = MemoryFileSystem::new();
        let output = compile(&fs, "<text>{{a}} {{b}}</text>");
        assert_eq!(output.jsx.as_deref(), Some("<Text>{a}{\" \"}{b}</Text>"));
    }

    fn fs_source(fs: &MemoryFileSystem, path: &str) -> String {
        use crate::fs::FileSystem;
        fs.read_to_string(Path::new(path)).unwrap()
    }
}

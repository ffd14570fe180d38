use crate::common::{list_files, playground, with_suffix, STYLE_ID};
use css_sourcemap::pipeline::{ModuleGraph, Pipeline};
use css_sourcemap::plugin::{FileNameTemplate, InputOption, OutputOptions};
use css_sourcemap::{css_sourcemap, CssSourcemapOptions, OutputBundle};
use sourcemap::SourceMap;
use std::fs;
use tempfile::TempDir;

fn build(graph: ModuleGraph, input: InputOption, options: CssSourcemapOptions) -> OutputBundle {
    build_with_output(graph, input, options, OutputOptions::default())
}

fn build_with_output(
    graph: ModuleGraph,
    input: InputOption,
    options: CssSourcemapOptions,
    output: OutputOptions,
) -> OutputBundle {
    Pipeline::new(graph, input)
        .unwrap()
        .plugin(css_sourcemap(options))
        .unwrap()
        .output(output)
        .build()
        .unwrap()
}

/// Asserts every CSS file in `css_dir` has a map in `map_dir` and a comment
/// pointing at `url_prefix` + map name. Returns the map contents.
fn assert_linked(css_dir: &std::path::Path, map_dir: &std::path::Path, url_prefix: &str) -> Vec<String> {
    let css_files = with_suffix(&list_files(css_dir), ".css");
    assert!(!css_files.is_empty());

    let map_files = with_suffix(&list_files(map_dir), ".map");
    assert_eq!(map_files.len(), css_files.len());

    css_files
        .iter()
        .map(|css_file| {
            let map_file = format!("{}.map", css_file);
            assert!(map_files.contains(&map_file), "missing {}", map_file);

            let css = fs::read_to_string(css_dir.join(css_file)).unwrap();
            assert!(css.ends_with(&format!(
                "/*# sourceMappingURL={}{} */",
                url_prefix, map_file
            )));

            fs::read_to_string(map_dir.join(&map_file)).unwrap()
        })
        .collect()
}

#[test]
fn test_default_options_colocate_map() {
    let dist = TempDir::new().unwrap();
    let bundle = build(
        playground(),
        InputOption::from("playground/main.ts"),
        CssSourcemapOptions::default(),
    );
    bundle.write_to_dir(dist.path()).unwrap();

    let assets = dist.path().join("assets");
    let maps = assert_linked(&assets, &assets, "");

    let map = SourceMap::from_slice(maps[0].as_bytes()).unwrap();
    assert_eq!(map.sources().collect::<Vec<_>>(), vec![STYLE_ID]);
}

#[test]
fn test_custom_folder_and_url() {
    let dist = TempDir::new().unwrap();
    let bundle = build(
        playground(),
        InputOption::from("playground/main.ts"),
        CssSourcemapOptions::default()
            .folder("sourcemaps")
            .get_url(|file_name| format!("sourcemaps/{}", file_name)),
    );
    bundle.write_to_dir(dist.path()).unwrap();

    let assets = dist.path().join("assets");
    assert!(with_suffix(&list_files(&assets), ".map").is_empty());
    assert_linked(&assets, &assets.join("sourcemaps"), "sourcemaps/");
}

#[test]
fn test_custom_dist_location() {
    let root = TempDir::new().unwrap();
    let dist = root.path().join("dist-custom");
    let bundle = build(
        playground(),
        InputOption::from("playground/main.ts"),
        CssSourcemapOptions::default(),
    );
    bundle.write_to_dir(&dist).unwrap();

    let assets = dist.join("assets");
    assert_linked(&assets, &assets, "");
}

#[test]
fn test_static_entry_names_use_render_fallback() {
    let dist = TempDir::new().unwrap();
    let bundle = build_with_output(
        playground(),
        InputOption::from("playground/main.ts"),
        CssSourcemapOptions::default().extensions([".scss", ".css", ".less"]),
        OutputOptions {
            entry_file_names: Some("[name].js".into()),
            chunk_file_names: Some("js/[name].js".into()),
            asset_file_names: Some("assets/[name].[ext]".into()),
        },
    );
    bundle.write_to_dir(dist.path()).unwrap();

    assert!(dist.path().join("main.js").exists());
    let assets = dist.path().join("assets");
    assert_eq!(list_files(&assets), vec!["main.css", "main.css.map"]);

    let maps = assert_linked(&assets, &assets, "");
    assert_ne!(maps[0], "null");
}

#[test]
fn test_static_entry_names_without_asset_pattern() {
    let dist = TempDir::new().unwrap();
    let bundle = build_with_output(
        playground(),
        InputOption::Named(vec![("foo".into(), "playground/main.ts".into())]),
        CssSourcemapOptions::default().extensions([".scss", ".css", ".less"]),
        OutputOptions {
            entry_file_names: Some("[name].js".into()),
            chunk_file_names: Some("js/[name].js".into()),
            asset_file_names: None,
        },
    );
    bundle.write_to_dir(dist.path()).unwrap();

    let assets = dist.path().join("assets");
    let css_files = with_suffix(&list_files(&assets), ".css");
    assert!(css_files[0].starts_with("foo-"));

    let maps = assert_linked(&assets, &assets, "");
    assert_ne!(maps[0], "null");
}

#[test]
fn test_function_asset_pattern_has_no_directory_prefix() {
    let bundle = build_with_output(
        playground(),
        InputOption::from("playground/main.ts"),
        CssSourcemapOptions::default(),
        OutputOptions {
            entry_file_names: Some("[name].js".into()),
            chunk_file_names: None,
            asset_file_names: Some(FileNameTemplate::Dynamic(std::sync::Arc::new(|_: &str| {
                "static/[name][extname]".to_string()
            }))),
        },
    );

    // The derived key is "main" while the stylesheet lands at static/main.css,
    // so the fallback lookup still resolves through the derived key.
    assert!(bundle.contains("static/main.css.map"));
    assert_ne!(bundle.asset_source("static/main.css.map"), Some("null"));
}

#[test]
fn test_multiple_stylesheets_merge_into_one_map() {
    let graph = ModuleGraph::new()
        .module(
            "src/main.ts",
            "import './reset.css';\nimport './theme.scss';",
            ["src/reset.css", "src/theme.scss"],
        )
        .module("src/reset.css", "* { margin: 0; }\n", Vec::<String>::new())
        .module("src/theme.scss", ".a {\n  color: red;\n}\n", Vec::<String>::new());

    let bundle = build(graph, InputOption::from("src/main.ts"), CssSourcemapOptions::default());

    let map_assets: Vec<_> = bundle
        .assets()
        .filter(|asset| asset.file_name.ends_with(".map"))
        .collect();
    assert_eq!(map_assets.len(), 1);
    assert!(map_assets[0].file_name.ends_with(".css.map"));

    let map = SourceMap::from_slice(map_assets[0].source.as_bytes()).unwrap();
    assert_eq!(
        map.sources().collect::<Vec<_>>(),
        vec!["src/reset.css", "src/theme.scss"]
    );
    assert_eq!(map.get_token_count(), 4);
}

#[test]
fn test_each_entry_gets_its_own_map() {
    let graph = ModuleGraph::new()
        .module("src/home.ts", "import './home.css';", ["src/home.css"])
        .module("src/admin.ts", "import './admin.css';", ["src/admin.css"])
        .module("src/home.css", ".home {}\n", Vec::<String>::new())
        .module("src/admin.css", ".admin {}\n", Vec::<String>::new());

    let bundle = build(
        graph,
        InputOption::List(vec!["src/home.ts".into(), "src/admin.ts".into()]),
        CssSourcemapOptions::default(),
    );

    let css: Vec<_> = bundle
        .assets()
        .filter(|asset| asset.file_name.ends_with(".css"))
        .collect();
    assert_eq!(css.len(), 2);

    for asset in css {
        let map_file = format!("{}.map", asset.file_name);
        let map = SourceMap::from_slice(bundle.asset_source(&map_file).unwrap().as_bytes()).unwrap();
        let sources: Vec<_> = map.sources().collect();
        assert_eq!(sources.len(), 1);
        assert!(asset.file_name.contains(&sources[0][4..sources[0].len() - 4]));
    }
}

#[test]
fn test_untracked_stylesheet_gets_empty_map() {
    let bundle = build(
        playground(),
        InputOption::from("playground/main.ts"),
        CssSourcemapOptions::default().extensions([".scss"]),
    );

    let css = bundle
        .assets()
        .find(|asset| asset.file_name.ends_with(".css"))
        .unwrap();
    let map_file = format!("{}.map", css.file_name);

    assert_eq!(bundle.asset_source(&map_file), Some("null"));
    assert!(css.source.ends_with(&format!(
        "/*# sourceMappingURL={} */",
        map_file.trim_start_matches("assets/")
    )));
}

#[test]
fn test_disabled_plugin_leaves_bundle_untouched() {
    let bundle = build(
        playground(),
        InputOption::from("playground/main.ts"),
        CssSourcemapOptions::default().enabled(false),
    );

    assert_eq!(
        bundle
            .assets()
            .filter(|asset| asset.file_name.ends_with(".map"))
            .count(),
        0
    );
    let css = bundle
        .assets()
        .find(|asset| asset.file_name.ends_with(".css"))
        .unwrap();
    assert!(!css.source.contains("sourceMappingURL"));
}

#[test]
fn test_missing_css_post_plugin_aborts_build() {
    let result = Pipeline::without_builtins(playground(), InputOption::from("playground/main.ts"))
        .plugin(css_sourcemap(CssSourcemapOptions::default()))
        .unwrap()
        .build();

    let err = result.unwrap_err();
    assert!(err.to_string().contains("vite:css-post plugin not found."));
}

#[test]
fn test_folder_outside_dist_is_rejected() {
    let result = Pipeline::new(playground(), InputOption::from("playground/main.ts"))
        .unwrap()
        .plugin(css_sourcemap(CssSourcemapOptions::default().folder("../../escaped")))
        .unwrap()
        .build();

    let err = result.unwrap_err();
    assert!(err.to_string().contains("../escaped/"));
}

#[test]
fn test_folder_climbing_within_dist_is_allowed() {
    let dist = TempDir::new().unwrap();
    let bundle = build(
        playground(),
        InputOption::from("playground/main.ts"),
        CssSourcemapOptions::default().folder("../sourcemaps"),
    );
    bundle.write_to_dir(dist.path()).unwrap();

    let maps = with_suffix(&list_files(&dist.path().join("sourcemaps")), ".map");
    assert_eq!(maps.len(), 1);
}

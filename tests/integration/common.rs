use css_sourcemap::pipeline::ModuleGraph;
use std::fs;
use std::path::Path;

pub const STYLE_ID: &str = "playground/style.css";
pub const STYLE_CSS: &str = ".title {\n  color: rebeccapurple;\n}\n";

/// One entry importing one stylesheet with one rule
pub fn playground() -> ModuleGraph {
    ModuleGraph::new()
        .module(
            "playground/main.ts",
            "import './style.css';\ndocument.title = 'playground';",
            [STYLE_ID],
        )
        .module(STYLE_ID, STYLE_CSS, Vec::<String>::new())
}

/// Sorted file names directly inside `dir`
pub fn list_files(dir: &Path) -> Vec<String> {
    let mut files: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    files
}

pub fn with_suffix(files: &[String], suffix: &str) -> Vec<String> {
    files
        .iter()
        .filter(|file| file.ends_with(suffix))
        .cloned()
        .collect()
}

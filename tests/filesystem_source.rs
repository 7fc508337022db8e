//! Integration tests for loading and rendering components from disk

use std::fs;
use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

use component_forge::{
    ComponentSource, FileSystemSource, LoadOptions, ManifestError, RenderConfig, RenderError,
    Renderer, SourceError,
};

fn write_component(root: &Path, uri: &str, files: &[(&str, &str)]) {
    let dir = root.join(uri);
    fs::create_dir_all(&dir).unwrap();
    for (name, content) in files {
        fs::write(dir.join(name), content).unwrap();
    }
}

fn site() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_component(
        dir.path(),
        "pages/home",
        &[
            (
                "component.toml",
                r#"
[data]
title = "Welcome"

[imports]
site-button = "components/button"
"#,
            ),
            (
                "template.html",
                r#"<h1><slot name="title"></slot></h1><site-button :label="title">Start</site-button>"#,
            ),
        ],
    );
    write_component(
        dir.path(),
        "components/button",
        &[
            (
                "component.json",
                r#"{"data": {"kind": "primary"}, "imports": {}}"#,
            ),
            (
                "template.html",
                r#"<link rel="stylesheet" href="/button.css"><button :class="kind" :aria-label="label"><slot></slot></button>"#,
            ),
            ("script.js", "// wire up\nconsole.log(data.label);\n"),
        ],
    );
    dir
}

#[tokio::test]
async fn test_load_toml_manifest() {
    let dir = site();
    let source = FileSystemSource::new(dir.path());
    let definition = source
        .load("pages/home", &LoadOptions::default())
        .await
        .unwrap();

    assert_eq!(definition.settings.data.get("title"), Some(&json!("Welcome")));
    assert_eq!(
        definition.settings.imports.get("site-button"),
        Some("components/button")
    );
    assert!(definition.template.starts_with("<h1>"));
    assert_eq!(definition.script, None);
}

#[tokio::test]
async fn test_load_json_manifest_and_script() {
    let dir = site();
    let source = FileSystemSource::new(dir.path());
    let definition = source
        .load("components/button", &LoadOptions::default())
        .await
        .unwrap();

    assert_eq!(definition.settings.data.get("kind"), Some(&json!("primary")));
    assert!(definition.settings.imports.is_empty());
    assert_eq!(
        definition.script.as_deref(),
        Some("// wire up\nconsole.log(data.label);\n")
    );
}

#[tokio::test]
async fn test_manifest_is_optional() {
    let dir = tempfile::tempdir().unwrap();
    write_component(dir.path(), "bare", &[("template.html", "<p>bare</p>")]);
    let source = FileSystemSource::new(dir.path());
    let definition = source.load("bare", &LoadOptions::default()).await.unwrap();
    assert!(definition.settings.data.is_empty());
    assert_eq!(definition.template, "<p>bare</p>");
}

#[tokio::test]
async fn test_missing_template_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    write_component(dir.path(), "no-template", &[("component.toml", "[data]\n")]);
    let source = FileSystemSource::new(dir.path());

    let result = source.load("no-template", &LoadOptions::default()).await;
    assert!(matches!(result, Err(SourceError::NotFound { uri }) if uri == "no-template"));

    let result = source.load("does/not/exist", &LoadOptions::default()).await;
    assert!(matches!(result, Err(SourceError::NotFound { .. })));
}

#[tokio::test]
async fn test_malformed_manifest_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    write_component(
        dir.path(),
        "broken",
        &[("component.toml", "[data\n"), ("template.html", "<p></p>")],
    );
    let source = FileSystemSource::new(dir.path());
    let result = source.load("broken", &LoadOptions::default()).await;
    assert!(matches!(
        result,
        Err(SourceError::Parse {
            source: ManifestError::Toml(_),
            ..
        })
    ));
}

#[tokio::test]
async fn test_load_cache_returns_shared_definition() {
    let dir = site();
    let source = FileSystemSource::new(dir.path());
    let options = LoadOptions::default();

    let first = source.load("pages/home", &options).await.unwrap();
    // Cached definitions survive changes on disk until the process restarts
    fs::write(dir.path().join("pages/home/template.html"), "<p>changed</p>").unwrap();
    let second = source.load("pages/home", &options).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.template, first.template);
    assert_eq!(source.cache().len(), 1);
}

#[tokio::test]
async fn test_disabled_load_cache_rereads() {
    let dir = site();
    let source = FileSystemSource::new(dir.path());
    let options = LoadOptions::new().with_caching(false);

    source.load("pages/home", &options).await.unwrap();
    fs::write(dir.path().join("pages/home/template.html"), "<p>changed</p>").unwrap();
    let reread = source.load("pages/home", &options).await.unwrap();

    assert_eq!(reread.template, "<p>changed</p>");
    assert!(source.cache().is_empty());
}

#[tokio::test]
async fn test_base_directory_override() {
    let primary = tempfile::tempdir().unwrap();
    let alternate = tempfile::tempdir().unwrap();
    write_component(alternate.path(), "card", &[("template.html", "<div>alt</div>")]);

    let source = FileSystemSource::new(primary.path());
    let missing = source.load("card", &LoadOptions::default()).await;
    assert!(matches!(missing, Err(SourceError::NotFound { .. })));

    let options = LoadOptions::new().with_base_directory(alternate.path());
    let found = source.load("card", &options).await.unwrap();
    assert_eq!(found.template, "<div>alt</div>");
}

#[tokio::test]
async fn test_render_site_from_disk() {
    let dir = site();
    let renderer = Renderer::new(Arc::new(FileSystemSource::new(dir.path())));
    let html = renderer.render("pages/home", None).await.unwrap();

    assert!(html.starts_with("<!DOCTYPE html><html><head>"));
    assert!(html.contains(r#"<link rel="stylesheet" href="/button.css">"#));
    assert!(html.contains("<script id=\"component-"));
    assert!(html.contains(r#"({"kind":"primary","label":"Welcome"})"#));
    assert!(html.contains(
        r#"<body><h1>Welcome</h1><button class="primary" aria-label="Welcome">Start</button></body>"#
    ));
}

#[tokio::test]
async fn test_render_with_base_directory_from_config() {
    let dir = site();
    let renderer = Renderer::new(Arc::new(FileSystemSource::new("/nonexistent")))
        .with_config(RenderConfig::new().with_base_directory(dir.path()));
    let html = renderer
        .render("pages/home", Some(json!({"title": "Hi"}).as_object().cloned().unwrap()))
        .await
        .unwrap();
    assert!(html.contains("<h1>Hi</h1>"));
}

#[tokio::test]
async fn test_render_missing_component_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Renderer::new(Arc::new(FileSystemSource::new(dir.path())));
    let result = renderer.render("nowhere", None).await;
    assert!(matches!(
        result,
        Err(RenderError::Source(SourceError::NotFound { .. }))
    ));
}

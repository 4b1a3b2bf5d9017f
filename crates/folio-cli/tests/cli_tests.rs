//! Integration tests for the folio CLI
//!
//! Fixtures are small archives written into a temporary directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// Helper to create a CLI command
fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_folio"))
}

fn build_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in files {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn png(w: u32, h: u32) -> Vec<u8> {
    let mut v = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    v.extend_from_slice(&[0, 0, 0, 0x0D]);
    v.extend_from_slice(b"IHDR");
    v.extend_from_slice(&w.to_be_bytes());
    v.extend_from_slice(&h.to_be_bytes());
    v.extend_from_slice(&[8, 6, 0, 0, 0]);
    v
}

fn write_comic(dir: &TempDir) -> PathBuf {
    let (a, b) = (png(800, 1200), png(1600, 1200));
    let path = dir.path().join("issue.cbz");
    fs::write(&path, build_zip(&[("p2.png", &b), ("p1.png", &a)])).unwrap();
    path
}

fn write_epub(dir: &TempDir) -> PathBuf {
    let container = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles><rootfile full-path="content.opf" media-type="application/oebps-package+xml"/></rootfiles>
</container>"#;
    let opf = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Field Notes</dc:title>
    <dc:creator>R. Lindqvist</dc:creator>
  </metadata>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>
    <item id="c2" href="c2.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine><itemref idref="c1"/><itemref idref="c2"/></spine>
</package>"#;
    let nav = r#"<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<body><nav epub:type="toc"><ol>
  <li><a href="c1.xhtml">Spring</a></li>
  <li><a href="c2.xhtml">Autumn</a></li>
</ol></nav></body></html>"#;
    let c1 = r#"<html xmlns="http://www.w3.org/1999/xhtml"><body><p>Snowmelt on the ridge.</p></body></html>"#;
    let c2 = r#"<html xmlns="http://www.w3.org/1999/xhtml"><body><p>Larches turning gold.</p></body></html>"#;

    let path = dir.path().join("notes.epub");
    let bytes = build_zip(&[
        ("mimetype", b"application/epub+zip"),
        ("META-INF/container.xml", container.as_bytes()),
        ("content.opf", opf.as_bytes()),
        ("nav.xhtml", nav.as_bytes()),
        ("c1.xhtml", c1.as_bytes()),
        ("c2.xhtml", c2.as_bytes()),
    ]);
    fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn test_help_lists_commands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("info"))
        .stdout(predicate::str::contains("toc"))
        .stdout(predicate::str::contains("render"));
}

#[test]
fn test_info_text() {
    let dir = TempDir::new().unwrap();
    let comic = write_comic(&dir);

    cli()
        .arg("info")
        .arg(&comic)
        .assert()
        .success()
        .stdout(predicate::str::contains("Format:  CBZ"))
        .stdout(predicate::str::contains("Pages:   2"));
}

#[test]
fn test_info_json() {
    let dir = TempDir::new().unwrap();
    let epub = write_epub(&dir);

    let output = cli().arg("info").arg(&epub).arg("--json").output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["format"], "EPUB");
    assert_eq!(json["title"], "Field Notes");
    assert_eq!(json["creator"], "R. Lindqvist");
    assert!(json["page_count"].as_u64().unwrap() >= 2);
}

#[test]
fn test_info_rejects_unknown_format_flag() {
    let dir = TempDir::new().unwrap();
    let comic = write_comic(&dir);

    cli()
        .args(["info", "--format", "mobi"])
        .arg(&comic)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}

#[test]
fn test_info_forced_office_format_fails() {
    let dir = TempDir::new().unwrap();
    let comic = write_comic(&dir);

    cli()
        .args(["info", "--format", "docx"])
        .arg(&comic)
        .assert()
        .failure();
}

#[test]
fn test_toc_text() {
    let dir = TempDir::new().unwrap();
    let epub = write_epub(&dir);

    cli()
        .arg("toc")
        .arg(&epub)
        .assert()
        .success()
        .stdout(predicate::str::contains("Spring  (page 1)"))
        .stdout(predicate::str::contains("Autumn"));
}

#[test]
fn test_toc_empty_for_comic() {
    let dir = TempDir::new().unwrap();
    let comic = write_comic(&dir);

    cli()
        .arg("toc")
        .arg(&comic)
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("No outline"));
}

#[test]
fn test_render_svg_to_file() {
    let dir = TempDir::new().unwrap();
    let comic = write_comic(&dir);
    let out = dir.path().join("p2.svg");

    cli()
        .args(["render", "-p", "2", "-o"])
        .arg(&out)
        .arg(&comic)
        .assert()
        .success();

    let svg = fs::read_to_string(&out).unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("<image"));
}

#[test]
fn test_render_trace_to_stdout() {
    let dir = TempDir::new().unwrap();
    let epub = write_epub(&dir);

    let output = cli()
        .args(["render", "--device", "trace"])
        .arg(&epub)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let commands: Vec<String> = stdout
        .lines()
        .map(|line| {
            let v: serde_json::Value = serde_json::from_str(line).unwrap();
            v["command"].as_str().unwrap().to_string()
        })
        .collect();
    assert!(commands.iter().any(|c| c == "fill_text"));
}

#[test]
fn test_render_page_out_of_range() {
    let dir = TempDir::new().unwrap();
    let comic = write_comic(&dir);

    cli()
        .args(["render", "-p", "9"])
        .arg(&comic)
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn test_render_page_zero_rejected() {
    let dir = TempDir::new().unwrap();
    let comic = write_comic(&dir);

    cli()
        .args(["render", "-p", "0"])
        .arg(&comic)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Page numbers start at 1"));
}

#[test]
fn test_render_bad_svg_options() {
    let dir = TempDir::new().unwrap();
    let comic = write_comic(&dir);

    cli()
        .args(["render", "--options", "text=path"])
        .arg(&comic)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid SVG options"));
}

#[test]
fn test_missing_file() {
    cli()
        .arg("info")
        .arg("/nonexistent/file.cbz")
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

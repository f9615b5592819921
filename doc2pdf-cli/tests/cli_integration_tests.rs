//! Integration tests for the doc2pdf CLI
//!
//! Runs the built binary against documents written to scratch directories.

use anyhow::Result;
use doc2pdf::Document;
use pretty_assertions::assert_eq;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::{tempdir, TempDir};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn run_cli_command(args: &[&str]) -> Result<Output> {
    let output = Command::new(env!("CARGO_BIN_EXE_doc2pdf"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("LIBREOFFICE_COMMAND")
        .output()?;
    Ok(output)
}

fn setup_temp_dir() -> TempDir {
    tempdir().expect("Failed to create temp directory")
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

/// DOCX with one run per paragraph in the body and a single-run header.
fn sample_docx(paragraphs: &[&str], header: &str) -> Vec<u8> {
    const W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
    const R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

    let body: String = paragraphs
        .iter()
        .map(|text| format!("<w:p><w:r><w:t xml:space=\"preserve\">{text}</w:t></w:r></w:p>"))
        .collect();
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W}" xmlns:r="{R}"><w:body>{body}<w:sectPr><w:headerReference w:type="default" r:id="rId1"/></w:sectPr></w:body></w:document>"#
    );
    let header = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:hdr xmlns:w="{W}"><w:p><w:r><w:t>{header}</w:t></w:r></w:p></w:hdr>"#
    );

    let parts = [
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/header1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml"/></Types>"#.to_string(),
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#.to_string(),
        ),
        (
            "word/_rels/document.xml.rels",
            r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header1.xml"/></Relationships>"#.to_string(),
        ),
        ("word/document.xml", document),
        ("word/header1.xml", header),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        zip.start_file(name, SimpleFileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn write_sample(dir: &Path) -> PathBuf {
    let path = dir.join("letter.docx");
    fs::write(
        &path,
        sample_docx(&["Dear {NOME},", "See you in {CIDADE}."], "Ref {REF}"),
    )
    .unwrap();
    path
}

fn texts(path: &Path) -> (Vec<String>, Vec<String>) {
    let document = Document::from_bytes(&fs::read(path).unwrap()).unwrap();
    let header = document
        .regions()
        .iter()
        .skip(1)
        .flat_map(|region| document.region_text(region))
        .collect();
    (document.body_text(), header)
}

#[test]
fn test_cli_help() {
    let output = run_cli_command(&["--help"]).unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["fill", "convert", "profiles"] {
        assert!(stdout.contains(command), "help should list {command}");
    }
}

#[test]
fn test_cli_version() {
    let output = run_cli_command(&["--version"]).unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_profiles() {
    let output = run_cli_command(&["profiles"]).unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("high") && lines[0].contains("300 dpi"));
    assert!(lines[1].starts_with("medium") && lines[1].contains("150 dpi"));
    assert!(lines[2].starts_with("low") && lines[2].contains("jpeg  70"));
}

#[test]
fn test_cli_fill_with_flags() {
    let temp_dir = setup_temp_dir();
    let input = write_sample(temp_dir.path());
    let output_path = temp_dir.path().join("filled.docx");

    let output = run_cli_command(&[
        "fill",
        path_str(&input),
        "-o",
        path_str(&output_path),
        "-r",
        "nome=Ana Souza",
        "-r",
        "REF=2024/17",
    ])
    .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let (body, header) = texts(&output_path);
    assert_eq!(body, vec!["Dear Ana Souza,", "See you in {CIDADE}."]);
    assert_eq!(header, vec!["Ref 2024/17"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Filled document written to"));
    assert!(stdout.contains("{NOME}: 1"));
}

#[test]
fn test_cli_fill_with_replacements_file() {
    let temp_dir = setup_temp_dir();
    let input = write_sample(temp_dir.path());
    let output_path = temp_dir.path().join("filled.docx");
    let tags = temp_dir.path().join("tags.json");
    fs::write(&tags, r#"{"nome": "Ana", "cidade": "Recife", "ref": 17}"#).unwrap();

    let output = run_cli_command(&[
        "fill",
        path_str(&input),
        "-o",
        path_str(&output_path),
        "--replacements",
        path_str(&tags),
        "-r",
        "cidade=Olinda",
    ])
    .unwrap();
    assert!(output.status.success());

    // Flags come after the file, so the file's value is replaced first
    let (body, header) = texts(&output_path);
    assert_eq!(body, vec!["Dear Ana,", "See you in Recife."]);
    assert_eq!(header, vec!["Ref 17"]);
}

#[test]
fn test_cli_fill_invalid_replacement() {
    let temp_dir = setup_temp_dir();
    let input = write_sample(temp_dir.path());
    let output_path = temp_dir.path().join("filled.docx");

    let output = run_cli_command(&[
        "fill",
        path_str(&input),
        "-o",
        path_str(&output_path),
        "-r",
        "nome",
    ])
    .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("expected KEY=VALUE"));
    assert!(!output_path.exists());
}

#[test]
fn test_cli_fill_replacements_file_must_be_object() {
    let temp_dir = setup_temp_dir();
    let input = write_sample(temp_dir.path());
    let tags = temp_dir.path().join("tags.json");
    fs::write(&tags, r#"["nome", "Ana"]"#).unwrap();

    let output = run_cli_command(&[
        "fill",
        path_str(&input),
        "-o",
        path_str(&temp_dir.path().join("filled.docx")),
        "--replacements",
        path_str(&tags),
    ])
    .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("must contain a JSON object"));
}

#[test]
fn test_cli_fill_rejects_legacy_doc() {
    let temp_dir = setup_temp_dir();
    let input = temp_dir.path().join("old.doc");
    let mut bytes = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
    bytes.resize(512, 0);
    fs::write(&input, bytes).unwrap();

    let output = run_cli_command(&[
        "fill",
        path_str(&input),
        "-o",
        path_str(&temp_dir.path().join("filled.docx")),
    ])
    .unwrap();
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to fill"));
    assert!(stderr.contains("Word 97-2003"));
}

#[test]
fn test_cli_nonexistent_input() {
    let temp_dir = setup_temp_dir();
    let output = run_cli_command(&[
        "fill",
        "/nonexistent/letter.docx",
        "-o",
        path_str(&temp_dir.path().join("filled.docx")),
    ])
    .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read"));
}

#[test]
fn test_cli_convert_missing_converter() {
    let temp_dir = setup_temp_dir();
    let input = write_sample(temp_dir.path());
    let output_path = temp_dir.path().join("letter.pdf");

    let output = run_cli_command(&[
        "convert",
        path_str(&input),
        "-o",
        path_str(&output_path),
        "--converter",
        "/nonexistent/soffice",
    ])
    .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to convert"));
    assert!(!output_path.exists());
}

#[cfg(unix)]
mod with_fake_converter {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::os::unix::fs::PermissionsExt;

    /// Writes the filter options it was given as the PDF body.
    const FAKE_CONVERTER: &str = r#"#!/bin/sh
while [ $# -gt 1 ]; do
  case "$1" in
    --outdir) outdir="$2" ;;
    --convert-to) filter="$2" ;;
  esac
  shift
done
name=$(basename "$1" .docx)
printf '%%PDF-1.4 %s' "$filter" > "$outdir/$name.pdf"
"#;

    fn fake_converter(dir: &Path) -> PathBuf {
        let path = dir.join("fake-office");
        fs::write(&path, FAKE_CONVERTER).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_cli_convert() {
        let temp_dir = setup_temp_dir();
        let converter = fake_converter(temp_dir.path());
        let input = write_sample(temp_dir.path());
        let output_path = temp_dir.path().join("letter.pdf");

        let output = run_cli_command(&[
            "convert",
            path_str(&input),
            "-o",
            path_str(&output_path),
            "-r",
            "nome=Ana",
            "-q",
            "low",
            "--converter",
            path_str(&converter),
        ])
        .unwrap();
        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );

        let pdf = fs::read_to_string(&output_path).unwrap();
        assert!(pdf.starts_with("%PDF-1.4 pdf:writer_pdf_Export"));
        assert!(pdf.contains("Quality=70:ReduceImageResolution=true:MaxImageResolution=75"));

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("PDF written to"));
        assert!(stdout.contains("quality low"));
    }

    #[test]
    fn test_cli_convert_unknown_quality_uses_high() {
        let temp_dir = setup_temp_dir();
        let converter = fake_converter(temp_dir.path());
        let input = write_sample(temp_dir.path());
        let output_path = temp_dir.path().join("letter.pdf");

        let output = run_cli_command(&[
            "convert",
            path_str(&input),
            "-o",
            path_str(&output_path),
            "--quality",
            "ultra",
            "--converter",
            path_str(&converter),
        ])
        .unwrap();
        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("quality high"));
    }
}

//! Helpers for building small DOCX packages in tests
#![allow(dead_code)]

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults/></w:styles>"#;

pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// A plain run.
pub fn run(text: &str) -> String {
    format!(
        r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#,
        escape(text)
    )
}

/// A bold, red run.
pub fn styled_run(text: &str) -> String {
    format!(
        r#"<w:r><w:rPr><w:b/><w:color w:val="FF0000"/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
        escape(text)
    )
}

/// A paragraph with one plain run per entry.
pub fn paragraph(runs: &[&str]) -> String {
    let runs: String = runs.iter().map(|text| run(text)).collect();
    format!("<w:p>{runs}</w:p>")
}

/// A table of single-run paragraphs.
pub fn table(rows: &[&[&str]]) -> String {
    let rows: String = rows
        .iter()
        .map(|cells| {
            let cells: String = cells
                .iter()
                .map(|text| format!("<w:tc>{}</w:tc>", paragraph(&[text])))
                .collect();
            format!("<w:tr>{cells}</w:tr>")
        })
        .collect();
    format!("<w:tbl>{rows}</w:tbl>")
}

/// Builds a DOCX package with a body, optional headers and footers.
///
/// Every header and footer is referenced from the final section of the body.
#[derive(Debug, Default)]
pub struct DocxBuilder {
    body: String,
    headers: Vec<String>,
    footers: Vec<String>,
    /// Extra sections: each references every header by index
    section_breaks: usize,
    /// Binary entries under `word/media/`
    media: Vec<(String, Vec<u8>)>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(mut self, xml: impl Into<String>) -> Self {
        self.body.push_str(&xml.into());
        self
    }

    pub fn header(mut self, xml: impl Into<String>) -> Self {
        self.headers.push(xml.into());
        self
    }

    pub fn footer(mut self, xml: impl Into<String>) -> Self {
        self.footers.push(xml.into());
        self
    }

    /// Add a section break whose properties point at the same headers as
    /// the final section.
    pub fn section_break(mut self) -> Self {
        self.section_breaks += 1;
        self
    }

    pub fn media(mut self, name: &str, data: Vec<u8>) -> Self {
        self.media.push((format!("word/media/{name}"), data));
        self
    }

    fn references(&self) -> String {
        let headers = (0..self.headers.len()).map(|i| {
            format!(
                r#"<w:headerReference w:type="default" r:id="rIdH{}"/>"#,
                i + 1
            )
        });
        let footers = (0..self.footers.len()).map(|i| {
            format!(
                r#"<w:footerReference w:type="default" r:id="rIdF{}"/>"#,
                i + 1
            )
        });
        headers.chain(footers).collect()
    }

    pub fn document_xml(&self) -> String {
        let refs = self.references();
        let breaks: String = (0..self.section_breaks)
            .map(|_| format!("<w:p><w:pPr><w:sectPr>{refs}</w:sectPr></w:pPr></w:p>"))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}" xmlns:r="{R_NS}"><w:body>{}{breaks}<w:sectPr>{refs}<w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#,
            self.body
        )
    }

    pub fn build(&self) -> Vec<u8> {
        let mut content_types = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
        );
        let mut rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        );
        let mut parts = Vec::new();

        for (i, xml) in self.headers.iter().enumerate() {
            let name = format!("header{}.xml", i + 1);
            rels.push_str(&format!(
                r#"<Relationship Id="rIdH{}" Type="{R_NS}/header" Target="{name}"/>"#,
                i + 1
            ));
            content_types.push_str(&format!(
                r#"<Override PartName="/word/{name}" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml"/>"#
            ));
            parts.push((
                format!("word/{name}"),
                format!(r#"<w:hdr xmlns:w="{W_NS}" xmlns:r="{R_NS}">{xml}</w:hdr>"#),
            ));
        }
        for (i, xml) in self.footers.iter().enumerate() {
            let name = format!("footer{}.xml", i + 1);
            rels.push_str(&format!(
                r#"<Relationship Id="rIdF{}" Type="{R_NS}/footer" Target="{name}"/>"#,
                i + 1
            ));
            content_types.push_str(&format!(
                r#"<Override PartName="/word/{name}" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml"/>"#
            ));
            parts.push((
                format!("word/{name}"),
                format!(r#"<w:ftr xmlns:w="{W_NS}" xmlns:r="{R_NS}">{xml}</w:ftr>"#),
            ));
        }
        content_types.push_str("</Types>");
        rels.push_str("</Relationships>");

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut add = |name: &str, data: &str| {
            zip.start_file(name, deflated).unwrap();
            zip.write_all(data.as_bytes()).unwrap();
        };

        add("[Content_Types].xml", &content_types);
        add(
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#,
        );
        add("word/document.xml", &self.document_xml());
        add("word/_rels/document.xml.rels", &rels);
        add("word/styles.xml", STYLES);
        for (name, xml) in &parts {
            add(name, xml);
        }
        for (name, data) in &self.media {
            zip.start_file(name.as_str(), deflated).unwrap();
            zip.write_all(data).unwrap();
        }

        zip.finish().unwrap().into_inner()
    }
}

/// Read one entry of a zip package as text.
pub fn read_entry(package: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(package)).unwrap();
    let mut content = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    content
}

/// Names of all entries of a zip package, in archive order.
pub fn entry_names(package: &[u8]) -> Vec<String> {
    let mut archive = ZipArchive::new(Cursor::new(package)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

#![allow(dead_code)]

use std::io::{Cursor, Read, Write};

use docx_stamp::TitleBlockFields;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_TYPE_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const NAMESPACES: &str = concat!(
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture" "#,
    r#"xmlns:v="urn:schemas-microsoft-com:vml""#,
);

struct Rel {
    id: String,
    kind: String,
    target: String,
    external: bool,
}

/// Builds DOCX packages in memory, one body fragment at a time.
#[derive(Default)]
pub struct DocxBuilder {
    body: String,
    rels: Vec<Rel>,
    entries: Vec<(String, Vec<u8>)>,
    styles: Option<String>,
    numbering: Option<String>,
    without_manifest: bool,
    raw_document: Option<String>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(mut self, xml: &str) -> Self {
        self.body.push_str(xml);
        self
    }

    pub fn paragraphs(mut self, texts: &[&str]) -> Self {
        for text in texts {
            self.body.push_str(&para(text));
        }
        self
    }

    pub fn hyperlink_rel(mut self, id: &str, url: &str) -> Self {
        self.rels.push(Rel {
            id: id.into(),
            kind: "hyperlink".into(),
            target: url.into(),
            external: true,
        });
        self
    }

    /// Image relationship targeting `media/<name>`, plus the entry itself.
    pub fn image_rel(mut self, id: &str, name: &str, data: Vec<u8>) -> Self {
        self.rels.push(Rel {
            id: id.into(),
            kind: "image".into(),
            target: format!("media/{name}"),
            external: false,
        });
        self.entries.push((format!("word/media/{name}"), data));
        self
    }

    /// Relationship entry without any backing package entry.
    pub fn dangling_rel(mut self, id: &str, kind: &str, target: &str) -> Self {
        self.rels.push(Rel {
            id: id.into(),
            kind: kind.into(),
            target: target.into(),
            external: false,
        });
        self
    }

    pub fn styles(mut self, xml: &str) -> Self {
        self.styles = Some(format!(r#"<w:styles {NAMESPACES}>{xml}</w:styles>"#));
        self
    }

    pub fn numbering(mut self, xml: &str) -> Self {
        self.numbering = Some(format!(r#"<w:numbering {NAMESPACES}>{xml}</w:numbering>"#));
        self
    }

    pub fn without_manifest(mut self) -> Self {
        self.without_manifest = true;
        self
    }

    /// Replace the whole `word/document.xml` text.
    pub fn raw_document(mut self, xml: &str) -> Self {
        self.raw_document = Some(xml.to_string());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let document = self.raw_document.clone().unwrap_or_else(|| {
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document {NAMESPACES}><w:body>{}<w:sectPr/></w:body></w:document>"#,
                self.body
            )
        });

        let mut parts: Vec<(String, Vec<u8>)> = vec![
            (
                "[Content_Types].xml".into(),
                br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#.to_vec(),
            ),
            (
                "_rels/.rels".into(),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_TYPE_BASE}/officeDocument" Target="word/document.xml"/></Relationships>"#
                )
                .into_bytes(),
            ),
            ("word/document.xml".into(), document.into_bytes()),
        ];
        if !self.without_manifest {
            parts.push(("word/_rels/document.xml.rels".into(), self.manifest().into_bytes()));
        }
        if let Some(styles) = &self.styles {
            parts.push(("word/styles.xml".into(), styles.clone().into_bytes()));
        }
        if let Some(numbering) = &self.numbering {
            parts.push(("word/numbering.xml".into(), numbering.clone().into_bytes()));
        }
        parts.extend(self.entries.iter().cloned());
        zip_entries(&parts)
    }

    fn manifest(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for rel in &self.rels {
            let mode = if rel.external { r#" TargetMode="External""# } else { "" };
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{REL_TYPE_BASE}/{}" Target="{}"{mode}/>"#,
                rel.id,
                rel.kind,
                escape(&rel.target)
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }
}

pub fn zip_entries(parts: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, data) in parts {
        zip.start_file(name.as_str(), options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn para(text: &str) -> String {
    format!(
        r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        escape(text)
    )
}

pub fn styled_para(style: &str, text: &str) -> String {
    format!(
        r#"<w:p><w:pPr><w:pStyle w:val="{style}"/></w:pPr><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        escape(text)
    )
}

pub fn list_para(num_id: u32, level: u8, text: &str) -> String {
    format!(
        r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="{level}"/><w:numId w:val="{num_id}"/></w:numPr></w:pPr><w:r><w:t>{}</w:t></w:r></w:p>"#,
        escape(text)
    )
}

/// Table of single-paragraph cells.
pub fn table(rows: &[&[&str]]) -> String {
    let mut xml = String::from("<w:tbl><w:tblPr/><w:tblGrid/>");
    for row in rows {
        xml.push_str("<w:tr>");
        for cell in *row {
            xml.push_str(&format!("<w:tc><w:tcPr/>{}</w:tc>", para(cell)));
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
    xml
}

/// Run holding an inline DrawingML picture.
pub fn drawing_para(rel_id: &str) -> String {
    sized_drawing_para(rel_id, "952500", "476250")
}

pub fn sized_drawing_para(rel_id: &str, cx: &str, cy: &str) -> String {
    format!(
        concat!(
            r#"<w:p><w:r><w:drawing><wp:inline><wp:extent cx="{}" cy="{}"/><wp:docPr id="1" name="Picture 1"/>"#,
            r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic>"#,
            r#"<pic:blipFill><a:blip r:embed="{}"/></pic:blipFill>"#,
            r#"</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#,
        ),
        cx,
        cy,
        rel_id
    )
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, 128])
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

pub fn sample_fields() -> TitleBlockFields {
    TitleBlockFields {
        preparer: "Иванов И.И.".into(),
        reviewer: "Петров П.П.".into(),
        technical_controller: "Смирнов С.С.".into(),
        approver: "Кузнецов К.К.".into(),
        document_code: "AB.01".into(),
        literature_code: "У".into(),
        organization_name: "Acme Ltd".into(),
        document_title: "Spec".into(),
    }
}

pub fn read_entry(package: &[u8], name: &str) -> Option<Vec<u8>> {
    let mut zip = zip::ZipArchive::new(Cursor::new(package)).unwrap();
    let mut entry = zip.by_name(name).ok()?;
    let mut data = Vec::new();
    entry.read_to_end(&mut data).unwrap();
    Some(data)
}

pub fn read_entry_text(package: &[u8], name: &str) -> String {
    let data = read_entry(package, name).unwrap_or_else(|| panic!("missing entry {name}"));
    String::from_utf8(data).unwrap()
}

pub fn entry_names(package: &[u8]) -> Vec<String> {
    let zip = zip::ZipArchive::new(Cursor::new(package)).unwrap();
    zip.file_names().map(str::to_string).collect()
}

pub fn is_wml(node: roxmltree::Node, name: &str) -> bool {
    node.tag_name().name() == name && node.tag_name().namespace() == Some(WML_NS)
}

pub fn wml_children<'a>(
    node: roxmltree::Node<'a, 'a>,
    name: &'a str,
) -> impl Iterator<Item = roxmltree::Node<'a, 'a>> {
    node.children().filter(move |n| is_wml(*n, name))
}

/// Text of every `w:t` below `node`, paragraphs joined by `\n`.
pub fn cell_text(node: roxmltree::Node) -> String {
    node.descendants()
        .filter(|n| is_wml(*n, "p"))
        .map(|p| {
            p.descendants()
                .filter(|n| is_wml(*n, "t"))
                .filter_map(|t| t.text())
                .collect::<String>()
        })
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cell texts of the footer title block, row by row.
pub fn footer_cells(package: &[u8]) -> Vec<Vec<String>> {
    let xml = read_entry_text(package, "word/footer1.xml");
    let doc = roxmltree::Document::parse(&xml).unwrap();
    let tbl = wml_children(doc.root_element(), "tbl").next().unwrap();
    wml_children(tbl, "tr")
        .map(|tr| wml_children(tr, "tc").map(cell_text).collect())
        .collect()
}

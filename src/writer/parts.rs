use std::collections::BTreeMap;
use std::fmt::{self, Write};

use crate::model::TitleBlockFields;

use super::stamp::{LARGE_STYLE, SMALL_STYLE};
use super::{
    BULLET_NUM_ID, FIRST_ORDERED_NUM_ID, HYPERLINK_STYLE, LIST_STYLE, MediaPart, Relationship,
    WML_NS, XML_DECLARATION, escape_xml,
};

const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const PACKAGE_RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CORE_PROPERTIES_REL: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
const WML_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml";

const BULLET_ABSTRACT_ID: u32 = 0;
const ORDERED_ABSTRACT_ID: u32 = 1;
const LEVELS: u32 = 9;
const BULLET_GLYPHS: [&str; 3] = ["\u{2022}", "\u{25E6}", "\u{25AA}"];
const ORDERED_FORMATS: [&str; 3] = ["decimal", "lowerLetter", "lowerRoman"];

/// Heading sizes in half-points, level 1 first.
const HEADING_SIZES: [u32; 6] = [32, 28, 26, 24, 24, 24];

pub(super) fn content_types_xml(media: &[MediaPart]) -> Result<String, fmt::Error> {
    let defaults: BTreeMap<&str, &str> = media
        .iter()
        .map(|m| (m.format.extension(), m.format.content_type()))
        .collect();

    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECLARATION);
    write!(xml, r#"<Types xmlns="{CONTENT_TYPES_NS}">"#)?;
    xml.push_str(
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    );
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    for (extension, content_type) in defaults {
        write!(
            xml,
            r#"<Default Extension="{extension}" ContentType="{content_type}"/>"#
        )?;
    }
    for (part, kind) in [
        ("/word/document.xml", "document.main"),
        ("/word/styles.xml", "styles"),
        ("/word/numbering.xml", "numbering"),
        ("/word/footer1.xml", "footer"),
    ] {
        write!(
            xml,
            r#"<Override PartName="{part}" ContentType="{WML_CONTENT_TYPE}.{kind}+xml"/>"#
        )?;
    }
    xml.push_str(
        r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#,
    );
    xml.push_str("</Types>");
    Ok(xml)
}

pub(super) fn relationships_xml(relationships: &[Relationship]) -> Result<String, fmt::Error> {
    let mut xml = String::with_capacity(256 + relationships.len() * 160);
    xml.push_str(XML_DECLARATION);
    write!(xml, r#"<Relationships xmlns="{PACKAGE_RELS_NS}">"#)?;
    for rel in relationships {
        write!(
            xml,
            r#"<Relationship Id="{}" Type="{}" Target="{}""#,
            rel.id,
            rel.rel_type,
            escape_xml(&rel.target)
        )?;
        if rel.external {
            xml.push_str(r#" TargetMode="External""#);
        }
        xml.push_str("/>");
    }
    xml.push_str("</Relationships>");
    Ok(xml)
}

pub(super) fn package_relationships_xml() -> Result<String, fmt::Error> {
    relationships_xml(&[
        Relationship::internal("rId1", "officeDocument", "word/document.xml"),
        Relationship {
            id: "rId2".into(),
            rel_type: CORE_PROPERTIES_REL.into(),
            target: "docProps/core.xml".into(),
            external: false,
        },
    ])
}

pub(super) fn core_properties_xml(fields: &TitleBlockFields) -> Result<String, fmt::Error> {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECLARATION);
    xml.push_str(concat!(
        r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
        r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
        r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
    ));
    write!(xml, "<dc:title>{}</dc:title>", escape_xml(&fields.document_title))?;
    write!(xml, "<dc:identifier>{}</dc:identifier>", escape_xml(&fields.document_code))?;
    if !fields.preparer.is_empty() {
        write!(xml, "<dc:creator>{}</dc:creator>", escape_xml(&fields.preparer))?;
    }
    xml.push_str("</cp:coreProperties>");
    Ok(xml)
}

pub(super) fn styles_xml() -> Result<String, fmt::Error> {
    let mut xml = String::with_capacity(8 * 1024);
    xml.push_str(XML_DECLARATION);
    write!(xml, r#"<w:styles xmlns:w="{WML_NS}">"#)?;
    xml.push_str(concat!(
        r#"<w:docDefaults><w:rPrDefault><w:rPr>"#,
        r#"<w:rFonts w:ascii="Times New Roman" w:hAnsi="Times New Roman" w:eastAsia="Times New Roman" w:cs="Times New Roman"/>"#,
        r#"<w:sz w:val="24"/><w:szCs w:val="24"/><w:lang w:val="ru-RU" w:eastAsia="en-US" w:bidi="ar-SA"/>"#,
        r#"</w:rPr></w:rPrDefault><w:pPrDefault><w:pPr>"#,
        r#"<w:spacing w:after="120" w:line="276" w:lineRule="auto"/>"#,
        r#"</w:pPr></w:pPrDefault></w:docDefaults>"#,
        r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#,
    ));

    for (i, size) in HEADING_SIZES.iter().enumerate() {
        let level = i + 1;
        write!(
            xml,
            concat!(
                r#"<w:style w:type="paragraph" w:styleId="Heading{level}"><w:name w:val="heading {level}"/>"#,
                r#"<w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/>"#,
                r#"<w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="{outline}"/></w:pPr>"#,
                r#"<w:rPr><w:b/><w:sz w:val="{size}"/><w:szCs w:val="{size}"/></w:rPr></w:style>"#,
            ),
            level = level,
            outline = i,
            size = size,
        )?;
    }

    xml.push_str(concat!(
        r#"<w:style w:type="paragraph" w:styleId="Quote"><w:name w:val="Quote"/><w:basedOn w:val="Normal"/><w:qFormat/>"#,
        r#"<w:pPr><w:ind w:left="720" w:right="720"/></w:pPr><w:rPr><w:i/></w:rPr></w:style>"#,
        r#"<w:style w:type="paragraph" w:styleId="IntenseQuote"><w:name w:val="Intense Quote"/><w:basedOn w:val="Normal"/><w:qFormat/>"#,
        r#"<w:pPr><w:pBdr><w:bottom w:val="single" w:sz="4" w:space="4" w:color="auto"/></w:pBdr>"#,
        r#"<w:ind w:left="864" w:right="864"/><w:jc w:val="center"/></w:pPr><w:rPr><w:b/><w:i/></w:rPr></w:style>"#,
    ));
    write!(
        xml,
        concat!(
            r#"<w:style w:type="paragraph" w:styleId="{list}"><w:name w:val="List Paragraph"/><w:basedOn w:val="Normal"/><w:qFormat/>"#,
            r#"<w:pPr><w:ind w:left="720"/><w:contextualSpacing/></w:pPr></w:style>"#,
            r#"<w:style w:type="character" w:styleId="{link}"><w:name w:val="Hyperlink"/>"#,
            r#"<w:rPr><w:color w:val="0563C1"/><w:u w:val="single"/></w:rPr></w:style>"#,
            r#"<w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:tblPr><w:tblBorders>"#,
            r#"<w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
            r#"<w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
            r#"<w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
            r#"</w:tblBorders></w:tblPr></w:style>"#,
            r#"<w:style w:type="paragraph" w:customStyle="1" w:styleId="{small}"><w:name w:val="Stamp Small"/><w:qFormat/>"#,
            r#"<w:pPr><w:spacing w:before="0" w:after="0" w:line="240" w:lineRule="auto"/><w:jc w:val="center"/></w:pPr>"#,
            r#"<w:rPr><w:i/><w:sz w:val="18"/><w:szCs w:val="18"/></w:rPr></w:style>"#,
            r#"<w:style w:type="paragraph" w:customStyle="1" w:styleId="{large}"><w:name w:val="Stamp Large"/><w:qFormat/>"#,
            r#"<w:pPr><w:spacing w:before="0" w:after="0" w:line="240" w:lineRule="auto"/><w:jc w:val="center"/></w:pPr>"#,
            r#"<w:rPr><w:b/><w:i/><w:sz w:val="28"/><w:szCs w:val="28"/></w:rPr></w:style>"#,
        ),
        list = LIST_STYLE,
        link = HYPERLINK_STYLE,
        small = SMALL_STYLE,
        large = LARGE_STYLE,
    )?;
    xml.push_str("</w:styles>");
    Ok(xml)
}

/// One bullet and one ordered definition; every ordered list gets its own
/// `w:num` that restarts all levels at 1.
pub(super) fn numbering_xml(ordered_lists: u32) -> Result<String, fmt::Error> {
    let mut xml = String::with_capacity(8 * 1024);
    xml.push_str(XML_DECLARATION);
    write!(xml, r#"<w:numbering xmlns:w="{WML_NS}">"#)?;

    write!(
        xml,
        r#"<w:abstractNum w:abstractNumId="{BULLET_ABSTRACT_ID}"><w:multiLevelType w:val="hybridMultilevel"/>"#
    )?;
    for level in 0..LEVELS {
        let glyph = BULLET_GLYPHS[level as usize % BULLET_GLYPHS.len()];
        write_level(&mut xml, level, "bullet", glyph)?;
    }
    xml.push_str("</w:abstractNum>");

    write!(
        xml,
        r#"<w:abstractNum w:abstractNumId="{ORDERED_ABSTRACT_ID}"><w:multiLevelType w:val="hybridMultilevel"/>"#
    )?;
    for level in 0..LEVELS {
        let num_fmt = ORDERED_FORMATS[level as usize % ORDERED_FORMATS.len()];
        write_level(&mut xml, level, num_fmt, &format!("%{}.", level + 1))?;
    }
    xml.push_str("</w:abstractNum>");

    write!(
        xml,
        r#"<w:num w:numId="{BULLET_NUM_ID}"><w:abstractNumId w:val="{BULLET_ABSTRACT_ID}"/></w:num>"#
    )?;
    for i in 0..ordered_lists {
        let num_id = FIRST_ORDERED_NUM_ID + i;
        write!(
            xml,
            r#"<w:num w:numId="{num_id}"><w:abstractNumId w:val="{ORDERED_ABSTRACT_ID}"/>"#
        )?;
        for level in 0..LEVELS {
            write!(
                xml,
                r#"<w:lvlOverride w:ilvl="{level}"><w:startOverride w:val="1"/></w:lvlOverride>"#
            )?;
        }
        xml.push_str("</w:num>");
    }

    xml.push_str("</w:numbering>");
    Ok(xml)
}

fn write_level(xml: &mut String, level: u32, num_fmt: &str, text: &str) -> fmt::Result {
    let indent = 720 * (level + 1);
    write!(
        xml,
        concat!(
            r#"<w:lvl w:ilvl="{level}"><w:start w:val="1"/><w:numFmt w:val="{num_fmt}"/>"#,
            r#"<w:lvlText w:val="{text}"/><w:lvlJc w:val="left"/>"#,
            r#"<w:pPr><w:ind w:left="{indent}" w:hanging="360"/></w:pPr></w:lvl>"#,
        ),
        level = level,
        num_fmt = num_fmt,
        text = text,
        indent = indent,
    )
}

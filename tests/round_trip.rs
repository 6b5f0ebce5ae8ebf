mod common;

use common::{
    DocxBuilder, drawing_para, list_para, para, png, read_entry, read_entry_text, sample_fields,
    sized_drawing_para, styled_para, table,
};
use docx_stamp::{
    Block, Heading, ImageFormat, ListItem, NamedStyle, Paragraph, Run, Table, TableCell, TableRow,
    build_docx, parse_docx_bytes, stamp_docx_bytes,
};

fn plain_paragraph(text: &str) -> Block {
    Block::Paragraph(Paragraph {
        runs: vec![Run::plain(text)],
        style: None,
    })
}

fn text_table(rows: &[&[&str]]) -> Block {
    Block::Table(Table {
        rows: rows
            .iter()
            .map(|row| TableRow {
                cells: row
                    .iter()
                    .map(|text| TableCell {
                        blocks: vec![plain_paragraph(text)],
                    })
                    .collect(),
            })
            .collect(),
    })
}

/// Stamp `input` and parse the result back.
fn round_trip(input: &[u8]) -> Vec<Block> {
    let stamped = stamp_docx_bytes(input, &sample_fields()).unwrap();
    parse_docx_bytes(&stamped.bytes).unwrap().blocks
}

#[test]
fn heading_paragraph_and_table_survive_stamping() {
    let _ = env_logger::try_init();
    let input = DocxBuilder::new()
        .body(&styled_para("Heading1", "Intro"))
        .body(&para("Hello world"))
        .body(&table(&[&["A", "B"], &["C", "D"]]))
        .build();

    let stamped = stamp_docx_bytes(&input, &sample_fields()).unwrap();
    let blocks = parse_docx_bytes(&stamped.bytes).unwrap().blocks;

    assert_eq!(
        blocks,
        vec![
            Block::Heading(Heading {
                runs: vec![Run::plain("Intro")],
                level: 1,
            }),
            plain_paragraph("Hello world"),
            text_table(&[&["A", "B"], &["C", "D"]]),
        ]
    );
    assert_eq!(common::footer_cells(&stamped.bytes)[0][5], "AB.01");
    assert_eq!(stamped.file_name, "AB.01.docx");
}

#[test]
fn plain_text_is_preserved_in_order() {
    let texts = ["First", "Второй абзац", "  padded  ", "a < b & c > d", "tab\there"];
    let input = DocxBuilder::new().paragraphs(&texts).build();

    let blocks = round_trip(&input);

    let round_tripped: Vec<String> = blocks.iter().map(Block::text).collect();
    assert_eq!(round_tripped, texts);
}

#[test]
fn empty_and_whitespace_paragraphs_are_dropped() {
    let input = DocxBuilder::new()
        .body("<w:p/>")
        .body(&para("   "))
        .body(&para("kept"))
        .body("<w:p><w:pPr><w:pStyle w:val=\"Heading2\"/></w:pPr></w:p>")
        .build();

    let parsed = parse_docx_bytes(&input).unwrap();
    assert_eq!(parsed.blocks, vec![plain_paragraph("kept")]);
    assert_eq!(round_trip(&input), vec![plain_paragraph("kept")]);
}

#[test]
fn hyperlink_keeps_text_and_target() {
    let url = "https://example.com/docs?a=1&b=2";
    let input = DocxBuilder::new()
        .hyperlink_rel("rId7", url)
        .body(concat!(
            r#"<w:p><w:r><w:t xml:space="preserve">See </w:t></w:r>"#,
            r#"<w:hyperlink r:id="rId7"><w:r><w:rPr><w:b/></w:rPr><w:t>the docs</w:t></w:r></w:hyperlink></w:p>"#,
        ))
        .build();

    let expected = vec![Block::Paragraph(Paragraph {
        runs: vec![Run::plain("See "), Run::hyperlink("the docs", url)],
        style: None,
    })];
    assert_eq!(parse_docx_bytes(&input).unwrap().blocks, expected);

    let stamped = stamp_docx_bytes(&input, &sample_fields()).unwrap();
    assert_eq!(parse_docx_bytes(&stamped.bytes).unwrap().blocks, expected);

    let rels = read_entry_text(&stamped.bytes, "word/_rels/document.xml.rels");
    assert!(
        rels.contains(r#"Target="https://example.com/docs?a=1&amp;b=2" TargetMode="External""#)
    );
}

#[test]
fn repeated_urls_share_one_relationship() {
    let url = "https://example.com";
    let link = r#"<w:hyperlink r:id="rId7"><w:r><w:t>link</w:t></w:r></w:hyperlink>"#;
    let input = DocxBuilder::new()
        .hyperlink_rel("rId7", url)
        .body(&format!("<w:p>{link}</w:p><w:p>{link}</w:p>"))
        .build();

    let stamped = stamp_docx_bytes(&input, &sample_fields()).unwrap();
    let rels = read_entry_text(&stamped.bytes, "word/_rels/document.xml.rels");
    assert_eq!(rels.matches("TargetMode=\"External\"").count(), 1);
}

#[test]
fn bold_and_italic_runs_round_trip() {
    let input = DocxBuilder::new()
        .body(concat!(
            r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">bold </w:t></w:r>"#,
            r#"<w:r><w:rPr><w:i w:val="1"/></w:rPr><w:t xml:space="preserve">italic </w:t></w:r>"#,
            r#"<w:r><w:rPr><w:b w:val="0"/><w:i/></w:rPr><w:t>both?</w:t></w:r></w:p>"#,
        ))
        .build();

    let expected = vec![Block::Paragraph(Paragraph {
        runs: vec![
            Run::styled("bold ", true, false),
            Run::styled("italic ", false, true),
            Run::styled("both?", false, true),
        ],
        style: None,
    })];
    assert_eq!(round_trip(&input), expected);
}

#[test]
fn table_shape_is_preserved() {
    let input = DocxBuilder::new()
        .body(&table(&[&["1", "2"], &["3", "4"], &["5", "6"]]))
        .build();

    let blocks = round_trip(&input);
    let [Block::Table(t)] = blocks.as_slice() else {
        panic!("expected one table, got {blocks:?}");
    };
    assert_eq!(t.rows.len(), 3);
    assert!(t.rows.iter().all(|r| r.cells.len() == 2));
}

#[test]
fn nested_tables_and_ragged_rows_survive() {
    let inner = table(&[&["x", "y"]]);
    let input = DocxBuilder::new()
        .body(&format!(
            "<w:tbl><w:tr><w:tc>{}</w:tc><w:tc>{inner}</w:tc><w:tc><w:p/></w:tc></w:tr><w:tr><w:tc>{}</w:tc></w:tr></w:tbl>",
            para("outer"),
            para("short row"),
        ))
        .build();

    let expected = vec![Block::Table(Table {
        rows: vec![
            TableRow {
                cells: vec![
                    TableCell {
                        blocks: vec![plain_paragraph("outer")],
                    },
                    TableCell {
                        blocks: vec![text_table(&[&["x", "y"]])],
                    },
                    TableCell { blocks: vec![] },
                ],
            },
            TableRow {
                cells: vec![TableCell {
                    blocks: vec![plain_paragraph("short row")],
                }],
            },
        ],
    })];
    assert_eq!(parse_docx_bytes(&input).unwrap().blocks, expected);
    assert_eq!(round_trip(&input), expected);
}

#[test]
fn empty_tables_and_rows_are_dropped() {
    let input = DocxBuilder::new()
        .body("<w:tbl><w:tblPr/></w:tbl>")
        .body(&format!("<w:tbl><w:tr/><w:tr><w:tc>{}</w:tc></w:tr></w:tbl>", para("only")))
        .build();

    let blocks = parse_docx_bytes(&input).unwrap().blocks;
    assert_eq!(blocks, vec![text_table(&[&["only"]])]);
}

#[test]
fn bullet_and_ordered_lists_keep_levels() {
    let numbering = concat!(
        r#"<w:abstractNum w:abstractNumId="10"><w:lvl w:ilvl="0"><w:numFmt w:val="bullet"/></w:lvl><w:lvl w:ilvl="1"><w:numFmt w:val="bullet"/></w:lvl></w:abstractNum>"#,
        r#"<w:abstractNum w:abstractNumId="11"><w:lvl w:ilvl="0"><w:numFmt w:val="decimal"/></w:lvl></w:abstractNum>"#,
        r#"<w:num w:numId="5"><w:abstractNumId w:val="10"/></w:num>"#,
        r#"<w:num w:numId="6"><w:abstractNumId w:val="11"/></w:num>"#,
    );
    let input = DocxBuilder::new()
        .numbering(numbering)
        .body(&list_para(5, 0, "apples"))
        .body(&list_para(5, 1, "green"))
        .body(&list_para(6, 0, "step one"))
        .body(&list_para(6, 0, "step two"))
        .body(&para("between"))
        .body(&list_para(6, 0, "again"))
        .body(&list_para(0, 0, "numbering switched off"))
        .build();

    let item = |text: &str, level: u8, ordered: bool| {
        Block::ListItem(ListItem {
            runs: vec![Run::plain(text)],
            level,
            ordered,
        })
    };
    let expected = vec![
        item("apples", 0, false),
        item("green", 1, false),
        item("step one", 0, true),
        item("step two", 0, true),
        plain_paragraph("between"),
        item("again", 0, true),
        plain_paragraph("numbering switched off"),
    ];
    assert_eq!(parse_docx_bytes(&input).unwrap().blocks, expected);

    let stamped = stamp_docx_bytes(&input, &sample_fields()).unwrap();
    assert_eq!(parse_docx_bytes(&stamped.bytes).unwrap().blocks, expected);

    // The list after "between" restarts with its own numbering instance.
    let document = read_entry_text(&stamped.bytes, "word/document.xml");
    assert_eq!(document.matches(r#"<w:numId w:val="2"/>"#).count(), 2);
    assert_eq!(document.matches(r#"<w:numId w:val="3"/>"#).count(), 1);
}

#[test]
fn localized_styles_resolve_through_styles_part() {
    let styles = concat!(
        r#"<w:style w:type="paragraph" w:styleId="1"><w:name w:val="heading 1"/></w:style>"#,
        r#"<w:style w:type="paragraph" w:styleId="a5"><w:name w:val="Intense Quote"/></w:style>"#,
        r#"<w:style w:type="paragraph" w:styleId="Chapter"><w:pPr><w:outlineLvl w:val="1"/></w:pPr></w:style>"#,
        r#"<w:style w:type="paragraph" w:styleId="SubChapter"><w:basedOn w:val="Chapter"/></w:style>"#,
        r#"<w:style w:type="paragraph" w:styleId="Steps"><w:pPr><w:numPr><w:numId w:val="3"/></w:numPr></w:pPr></w:style>"#,
        r#"<w:style w:type="character" w:styleId="Strong"><w:rPr><w:b/></w:rPr></w:style>"#,
    );
    let numbering = concat!(
        r#"<w:abstractNum w:abstractNumId="0"><w:lvl w:ilvl="0"><w:numFmt w:val="upperRoman"/></w:lvl></w:abstractNum>"#,
        r#"<w:num w:numId="3"><w:abstractNumId w:val="0"/></w:num>"#,
    );
    let input = DocxBuilder::new()
        .styles(styles)
        .numbering(numbering)
        .body(&styled_para("1", "Введение"))
        .body(&styled_para("a5", "Важно"))
        .body(&styled_para("SubChapter", "Inherited outline"))
        .body(&styled_para("Steps", "First step"))
        .body(&styled_para("Quote", "Quoted"))
        .body(&styled_para("Heading8", "Deep"))
        .body(r#"<w:p><w:r><w:rPr><w:rStyle w:val="Strong"/></w:rPr><w:t>strong</w:t></w:r></w:p>"#)
        .build();

    let blocks = round_trip(&input);
    assert_eq!(
        blocks,
        vec![
            Block::Heading(Heading {
                runs: vec![Run::plain("Введение")],
                level: 1,
            }),
            Block::Paragraph(Paragraph {
                runs: vec![Run::plain("Важно")],
                style: Some(NamedStyle::IntenseQuote),
            }),
            Block::Heading(Heading {
                runs: vec![Run::plain("Inherited outline")],
                level: 2,
            }),
            Block::ListItem(ListItem {
                runs: vec![Run::plain("First step")],
                level: 0,
                ordered: true,
            }),
            Block::Paragraph(Paragraph {
                runs: vec![Run::plain("Quoted")],
                style: Some(NamedStyle::Quote),
            }),
            Block::Heading(Heading {
                runs: vec![Run::plain("Deep")],
                level: 6,
            }),
            Block::Paragraph(Paragraph {
                runs: vec![Run::styled("strong", true, false)],
                style: None,
            }),
        ]
    );
}

#[test]
fn wrappers_and_revisions_are_flattened() {
    let input = DocxBuilder::new()
        .body(concat!(
            r#"<w:sdt><w:sdtContent><w:p><w:r><w:t>in sdt</w:t></w:r></w:p></w:sdtContent></w:sdt>"#,
            r#"<w:p><w:r><w:t xml:space="preserve">kept </w:t></w:r>"#,
            r#"<w:del><w:r><w:delText>deleted </w:delText></w:r></w:del>"#,
            r#"<w:ins><w:r><w:t xml:space="preserve">inserted </w:t></w:r></w:ins>"#,
            r#"<w:smartTag><w:r><w:t>tagged</w:t></w:r></w:smartTag></w:p>"#,
            r#"<w:p><w:r><w:fldChar w:fldCharType="begin"/></w:r><w:r><w:instrText> PAGE </w:instrText></w:r>"#,
            r#"<w:r><w:fldChar w:fldCharType="separate"/></w:r><w:r><w:t>7</w:t></w:r><w:r><w:fldChar w:fldCharType="end"/></w:r></w:p>"#,
        ))
        .build();

    let texts: Vec<String> = parse_docx_bytes(&input)
        .unwrap()
        .blocks
        .iter()
        .map(Block::text)
        .collect();
    assert_eq!(texts, ["in sdt", "kept inserted tagged", "7"]);
}

#[test]
fn images_round_trip_with_bytes_and_size() {
    let data = png(40, 20);
    let input = DocxBuilder::new()
        .image_rel("rId5", "photo.png", data.clone())
        .body(&para("Figure:"))
        .body(&drawing_para("rId5"))
        .build();

    let parsed = parse_docx_bytes(&input).unwrap();
    let [_, Block::Image(image)] = parsed.blocks.as_slice() else {
        panic!("expected paragraph then image, got {:?}", parsed.blocks);
    };
    assert_eq!(image.format, ImageFormat::Png);
    assert_eq!((image.pixel_width, image.pixel_height), (40, 20));
    assert_eq!(&image.data[..], &data[..]);

    let bytes = build_docx(&parsed, &sample_fields()).unwrap();
    assert_eq!(read_entry(&bytes, "word/media/image1.png").unwrap(), data);
    let reparsed = parse_docx_bytes(&bytes).unwrap();
    assert_eq!(reparsed.blocks, parsed.blocks);

    let content_types = read_entry_text(&bytes, "[Content_Types].xml");
    assert!(content_types.contains(r#"<Default Extension="png" ContentType="image/png"/>"#));
}

#[test]
fn images_follow_their_paragraph_text() {
    let data = png(8, 8);
    let input = DocxBuilder::new()
        .image_rel("rId5", "a.png", data)
        .body(concat!(
            r#"<w:p><w:r><w:t xml:space="preserve">before </w:t></w:r><w:r><w:pict><v:shape><v:imagedata r:id="rId5"/></v:shape></w:pict></w:r>"#,
            r#"<w:r><w:t>after</w:t></w:r></w:p>"#,
        ))
        .build();

    let blocks = parse_docx_bytes(&input).unwrap().blocks;
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].text(), "before after");
    assert!(matches!(blocks[1], Block::Image(_)));
}

#[test]
fn oversized_images_are_scaled_to_the_text_width() {
    let input = DocxBuilder::new()
        .image_rel("rId5", "wide.png", png(3000, 300))
        .body(&drawing_para("rId5"))
        .build();

    let stamped = stamp_docx_bytes(&input, &sample_fields()).unwrap();
    let document = read_entry_text(&stamped.bytes, "word/document.xml");
    // (11906 - 1134 - 283) twips * 635 EMU/twip
    assert!(document.contains(r#"<wp:extent cx="6660515" cy="666051"/>"#));
}

#[test]
fn vector_image_with_enormous_extent_is_stamped_at_text_width() {
    let emf = b"\x01\x00\x00\x00\x6c\x00\x00\x00 EMF".to_vec();
    let input = DocxBuilder::new()
        .image_rel("rId5", "chart.emf", emf)
        .body(&sized_drawing_para("rId5", "27273042316900", "27273042316900"))
        .build();

    let stamped = stamp_docx_bytes(&input, &sample_fields()).unwrap();
    assert_eq!(stamped.warnings.dropped_media, 0);
    let document = read_entry_text(&stamped.bytes, "word/document.xml");
    assert!(document.contains(r#"<wp:extent cx="6660515" cy="6660515"/>"#));

    let blocks = parse_docx_bytes(&stamped.bytes).unwrap().blocks;
    match &blocks[..] {
        [Block::Image(image)] => assert_eq!(image.format, ImageFormat::Emf),
        other => panic!("expected one image, got {other:?}"),
    }
}

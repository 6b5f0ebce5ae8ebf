//! The GOST title block (stamp) placed in the page footer.
//!
//! The grid is fixed: 9 columns totalling 185 mm and 6 rows of exact height.
//! Row 1 carries the document code above the right-hand columns; row 2 the
//! change-log labels, the document title (merged down through row 4), the
//! literature code and the page counters; rows 3 to 6 the sign-off roles and
//! the organization name (merged down through row 6).

use std::fmt::{self, Write};

use crate::model::{FieldCode, TitleBlockFields};

use super::{REL_NS, WML_NS, XML_DECLARATION, write_text_run};

pub(super) const SMALL_STYLE: &str = "StampSmall";
pub(super) const LARGE_STYLE: &str = "StampLarge";

/// Grid columns, twips (ratio 7:14:10:10:10:29:8.5:8.5:8.5).
const COLUMN_WIDTHS: [u32; 9] = [696, 1392, 994, 994, 994, 2883, 845, 845, 845];
const CODE_ROW_HEIGHT: u32 = 567;
const ROW_HEIGHT: u32 = 283;
const CELL_MARGIN: u32 = 28;

const CHANGE_LABELS: [&str; 5] = ["Изм.", "Лист", "№ докум.", "Подп.", "Дата"];
const ROLE_LABELS: [&str; 4] = ["Разраб.", "Пров.", "Н.контр.", "Утв."];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum VMerge {
    Restart,
    Continue,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum CellContent<'f> {
    Empty,
    Text(&'f str),
    /// One centered paragraph per non-blank line.
    Lines(&'f str),
    Field(FieldCode),
}

#[derive(Clone, Debug)]
pub(super) struct StampCell<'f> {
    pub(super) span: u32,
    pub(super) v_merge: Option<VMerge>,
    pub(super) borders: bool,
    pub(super) style: &'static str,
    pub(super) content: CellContent<'f>,
}

impl<'f> StampCell<'f> {
    fn new(content: CellContent<'f>) -> Self {
        Self {
            span: 1,
            v_merge: None,
            borders: true,
            style: SMALL_STYLE,
            content,
        }
    }

    fn text(text: &'f str) -> Self {
        Self::new(CellContent::Text(text))
    }

    fn empty() -> Self {
        Self::new(CellContent::Empty)
    }

    fn borderless() -> Self {
        Self {
            borders: false,
            ..Self::empty()
        }
    }

    fn span(mut self, span: u32) -> Self {
        self.span = span;
        self
    }

    fn merge(mut self, v_merge: VMerge) -> Self {
        self.v_merge = Some(v_merge);
        self
    }

    fn large(mut self) -> Self {
        self.style = LARGE_STYLE;
        self
    }
}

pub(super) struct StampRow<'f> {
    pub(super) height: u32,
    pub(super) cells: Vec<StampCell<'f>>,
}

pub(super) fn title_block_rows(fields: &TitleBlockFields) -> Vec<StampRow<'_>> {
    let mut rows = Vec::with_capacity(6);

    let mut code_row: Vec<StampCell> = (0..5).map(|_| StampCell::borderless()).collect();
    code_row.push(StampCell::text(&fields.document_code).large().span(4));
    rows.push(StampRow {
        height: CODE_ROW_HEIGHT,
        cells: code_row,
    });

    let mut labels: Vec<StampCell> = CHANGE_LABELS.into_iter().map(StampCell::text).collect();
    labels.push(
        StampCell::text(&fields.document_title)
            .large()
            .merge(VMerge::Restart),
    );
    labels.push(StampCell::text(&fields.literature_code));
    labels.push(StampCell::new(CellContent::Field(FieldCode::Page)));
    labels.push(StampCell::new(CellContent::Field(FieldCode::NumPages)));
    rows.push(StampRow {
        height: ROW_HEIGHT,
        cells: labels,
    });

    let names = [
        &fields.preparer,
        &fields.reviewer,
        &fields.technical_controller,
        &fields.approver,
    ];
    for (i, (label, name)) in ROLE_LABELS.into_iter().zip(names).enumerate() {
        let mut cells = vec![
            StampCell::text(label),
            StampCell::text(name),
            StampCell::empty(),
            StampCell::empty(),
            StampCell::empty(),
        ];
        // Title continues through row 4.
        cells.push(if i < 2 {
            StampCell::empty().large().merge(VMerge::Continue)
        } else {
            StampCell::empty()
        });
        let organization = if i == 0 {
            StampCell::new(CellContent::Lines(&fields.organization_name)).merge(VMerge::Restart)
        } else {
            StampCell::empty().merge(VMerge::Continue)
        };
        cells.push(organization.span(3));
        rows.push(StampRow {
            height: ROW_HEIGHT,
            cells,
        });
    }

    rows
}

pub(super) fn footer_xml(fields: &TitleBlockFields) -> Result<String, fmt::Error> {
    let mut xml = String::with_capacity(16 * 1024);
    xml.push_str(XML_DECLARATION);
    write!(xml, r#"<w:ftr xmlns:w="{WML_NS}" xmlns:r="{REL_NS}">"#)?;

    let total: u32 = COLUMN_WIDTHS.iter().sum();
    write!(
        xml,
        r#"<w:tbl><w:tblPr><w:tblW w:w="{total}" w:type="dxa"/><w:tblInd w:w="0" w:type="dxa"/><w:tblLayout w:type="fixed"/><w:tblCellMar><w:left w:w="{CELL_MARGIN}" w:type="dxa"/><w:right w:w="{CELL_MARGIN}" w:type="dxa"/></w:tblCellMar></w:tblPr><w:tblGrid>"#
    )?;
    for width in COLUMN_WIDTHS {
        write!(xml, r#"<w:gridCol w:w="{width}"/>"#)?;
    }
    xml.push_str("</w:tblGrid>");

    for row in title_block_rows(fields) {
        write!(
            xml,
            r#"<w:tr><w:trPr><w:trHeight w:val="{}" w:hRule="exact"/></w:trPr>"#,
            row.height
        )?;
        let mut column = 0;
        for cell in &row.cells {
            let span = cell.span as usize;
            let width: u32 = COLUMN_WIDTHS.iter().skip(column).take(span).sum();
            column += span;
            write_cell(&mut xml, cell, width)?;
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");

    write!(xml, r#"<w:p><w:pPr><w:pStyle w:val="{SMALL_STYLE}"/></w:pPr></w:p>"#)?;
    xml.push_str("</w:ftr>");
    Ok(xml)
}

fn write_cell(xml: &mut String, cell: &StampCell, width: u32) -> fmt::Result {
    write!(xml, r#"<w:tc><w:tcPr><w:tcW w:w="{width}" w:type="dxa"/>"#)?;
    if cell.span > 1 {
        write!(xml, r#"<w:gridSpan w:val="{}"/>"#, cell.span)?;
    }
    match cell.v_merge {
        Some(VMerge::Restart) => xml.push_str(r#"<w:vMerge w:val="restart"/>"#),
        Some(VMerge::Continue) => xml.push_str("<w:vMerge/>"),
        None => {}
    }
    xml.push_str("<w:tcBorders>");
    for side in ["top", "left", "bottom", "right"] {
        if cell.borders {
            write!(
                xml,
                r#"<w:{side} w:val="single" w:sz="8" w:space="0" w:color="000000"/>"#
            )?;
        } else {
            write!(xml, r#"<w:{side} w:val="nil"/>"#)?;
        }
    }
    xml.push_str(r#"</w:tcBorders><w:vAlign w:val="center"/></w:tcPr>"#);

    match &cell.content {
        CellContent::Empty => write_paragraph(xml, cell.style, "")?,
        CellContent::Text(text) => write_paragraph(xml, cell.style, text)?,
        CellContent::Lines(text) => {
            let mut lines = text
                .split('\n')
                .map(|line| line.trim_end_matches('\r'))
                .filter(|line| !line.trim().is_empty())
                .peekable();
            if lines.peek().is_none() {
                write_paragraph(xml, cell.style, "")?;
            }
            for line in lines {
                write_paragraph(xml, cell.style, line)?;
            }
        }
        CellContent::Field(code) => write_field_paragraph(xml, cell.style, code)?,
    }
    xml.push_str("</w:tc>");
    Ok(())
}

fn write_paragraph(xml: &mut String, style: &str, text: &str) -> fmt::Result {
    write!(xml, r#"<w:p><w:pPr><w:pStyle w:val="{style}"/></w:pPr>"#)?;
    if !text.is_empty() {
        write_text_run(xml, text, "")?;
    }
    xml.push_str("</w:p>");
    Ok(())
}

/// Complex field with a placeholder result; Word recomputes it on layout.
fn write_field_paragraph(xml: &mut String, style: &str, code: &FieldCode) -> fmt::Result {
    write!(
        xml,
        concat!(
            r#"<w:p><w:pPr><w:pStyle w:val="{style}"/></w:pPr>"#,
            r#"<w:r><w:fldChar w:fldCharType="begin"/></w:r>"#,
            r#"<w:r><w:instrText xml:space="preserve"> {instruction} </w:instrText></w:r>"#,
            r#"<w:r><w:fldChar w:fldCharType="separate"/></w:r>"#,
            r#"<w:r><w:t>1</w:t></w:r>"#,
            r#"<w:r><w:fldChar w:fldCharType="end"/></w:r></w:p>"#,
        ),
        style = style,
        instruction = code.instruction(),
    )
}

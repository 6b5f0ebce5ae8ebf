use std::fmt::{self, Write};

use crate::model::Table;

use super::{BodyWriter, needs_trailing_paragraph};

const TABLE_STYLE: &str = "TableGrid";
/// Word's default left + right cell margin, twips.
const CELL_PADDING: u32 = 2 * 108;

impl BodyWriter {
    /// Columns split `available_width` evenly across the widest row; shorter
    /// rows are closed with `w:gridAfter`.
    pub(super) fn write_table(&mut self, table: &Table, available_width: u32) -> fmt::Result {
        let columns = table.column_count().max(1) as u32;
        let column_width = available_width / columns;
        let table_width = column_width * columns;

        write!(
            self.xml,
            r#"<w:tbl><w:tblPr><w:tblStyle w:val="{TABLE_STYLE}"/><w:tblW w:w="{table_width}" w:type="dxa"/><w:tblBorders>"#
        )?;
        for side in ["top", "left", "bottom", "right", "insideH", "insideV"] {
            write!(
                self.xml,
                r#"<w:{side} w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#
            )?;
        }
        self.xml
            .push_str(r#"</w:tblBorders><w:tblLayout w:type="fixed"/></w:tblPr><w:tblGrid>"#);
        for _ in 0..columns {
            write!(self.xml, r#"<w:gridCol w:w="{column_width}"/>"#)?;
        }
        self.xml.push_str("</w:tblGrid>");

        for row in &table.rows {
            self.xml.push_str("<w:tr>");
            let missing = columns.saturating_sub(row.cells.len() as u32);
            if missing > 0 {
                write!(
                    self.xml,
                    r#"<w:trPr><w:gridAfter w:val="{missing}"/></w:trPr>"#
                )?;
            }
            for cell in &row.cells {
                write!(
                    self.xml,
                    r#"<w:tc><w:tcPr><w:tcW w:w="{column_width}" w:type="dxa"/></w:tcPr>"#
                )?;
                // Each cell numbers its ordered lists from 1.
                self.open_ordered_list = None;
                self.write_blocks(&cell.blocks, column_width.saturating_sub(CELL_PADDING))?;
                if needs_trailing_paragraph(&cell.blocks) {
                    self.xml.push_str("<w:p/>");
                }
                self.xml.push_str("</w:tc>");
            }
            self.xml.push_str("</w:tr>");
        }
        self.xml.push_str("</w:tbl>");
        Ok(())
    }
}

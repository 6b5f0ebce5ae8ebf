use std::sync::Arc;

/// DrawingML extents are in EMU; images are sized at 96 DPI.
pub(crate) const EMU_PER_PIXEL: u64 = 9525;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
    Emf,
    Wmf,
    Svg,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Emf => "emf",
            ImageFormat::Wmf => "wmf",
            ImageFormat::Svg => "svg",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Tiff => "image/tiff",
            ImageFormat::Emf => "image/x-emf",
            ImageFormat::Wmf => "image/x-wmf",
            ImageFormat::Svg => "image/svg+xml",
        }
    }
}

/// Smallest unit of text. A run is either styled text or hyperlink text;
/// hyperlink runs never carry bold/italic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub hyperlink_url: Option<String>,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: false,
            hyperlink_url: None,
        }
    }

    pub fn styled(text: impl Into<String>, bold: bool, italic: bool) -> Self {
        Self {
            text: text.into(),
            bold,
            italic,
            hyperlink_url: None,
        }
    }

    pub fn hyperlink(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: false,
            hyperlink_url: Some(url.into()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NamedStyle {
    Quote,
    IntenseQuote,
}

impl NamedStyle {
    pub fn style_id(self) -> &'static str {
        match self {
            NamedStyle::Quote => "Quote",
            NamedStyle::IntenseQuote => "IntenseQuote",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    pub style: Option<NamedStyle>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Heading {
    pub runs: Vec<Run>,
    pub level: u8, // 1..=6
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListItem {
    pub runs: Vec<Run>,
    pub level: u8, // 0 = top level
    pub ordered: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableCell {
    pub blocks: Vec<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Width of the widest row, in cells.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub data: Arc<[u8]>,
    pub format: ImageFormat,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Heading(Heading),
    ListItem(ListItem),
    Table(Table),
    Image(Image),
}

impl Block {
    /// Runs of a text block; empty for tables and images.
    pub fn runs(&self) -> &[Run] {
        match self {
            Block::Paragraph(p) => &p.runs,
            Block::Heading(h) => &h.runs,
            Block::ListItem(li) => &li.runs,
            Block::Table(_) | Block::Image(_) => &[],
        }
    }

    /// Concatenated run text of a text block.
    pub fn text(&self) -> String {
        self.runs().iter().map(|r| r.text.as_str()).collect()
    }
}

/// Element-level anomalies recovered while parsing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseWarnings {
    /// Hyperlink or image runs whose relationship id had no usable target.
    pub unresolved_relationships: usize,
    /// Image relationships dropped while building the media table.
    pub dropped_media: usize,
}

impl ParseWarnings {
    pub fn total(&self) -> usize {
        self.unresolved_relationships + self.dropped_media
    }
}

#[derive(Clone, Debug, Default)]
pub struct Document {
    pub blocks: Vec<Block>,
    pub warnings: ParseWarnings,
}

/// Values written into the footer title block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct TitleBlockFields {
    #[cfg_attr(feature = "serde", serde(default))]
    pub preparer: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub reviewer: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub technical_controller: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub approver: String,
    pub document_code: String,
    pub literature_code: String,
    /// May contain `\n`; each line is rendered as its own centered paragraph.
    pub organization_name: String,
    pub document_title: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldCode {
    Page,
    NumPages,
}

impl FieldCode {
    pub fn instruction(&self) -> &'static str {
        match self {
            FieldCode::Page => "PAGE",
            FieldCode::NumPages => "NUMPAGES",
        }
    }
}

//! Content tree of word processor documents and slides.

use serde::{Deserialize, Serialize};

/// Node kinds, with the stable numeric codes used at the handle boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentKind {
    Paragraph,
    Table,
    Image,
    Heading,
    List,
    PageBreak,
    SectionBreak,
    Drawing,
    Chart,
    Hyperlink,
    Cell,
    Row,
    Slide,
    Run,
}

impl ContentKind {
    #[must_use = "returns the kind code"]
    pub const fn code(self) -> i32 {
        match self {
            Self::Paragraph => 0,
            Self::Table => 1,
            Self::Image => 2,
            Self::Heading => 3,
            Self::List => 4,
            Self::PageBreak => 5,
            Self::SectionBreak => 6,
            Self::Drawing => 7,
            Self::Chart => 8,
            Self::Hyperlink => 9,
            Self::Cell => 10,
            Self::Row => 11,
            Self::Slide => 12,
            Self::Run => 13,
        }
    }
}

/// Paragraph alignment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    /// From a `w:jc` / `fo:text-align` value.
    #[must_use = "returns the alignment"]
    pub fn from_attr(value: &str) -> Self {
        match value {
            "center" => Self::Center,
            "right" | "end" => Self::Right,
            "both" | "justify" | "distribute" => Self::Justify,
            _ => Self::Left,
        }
    }
}

/// A run of uniformly formatted text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    /// Hyperlink target when the run sits inside a link
    pub link: Option<String>,
}

impl Run {
    #[must_use = "creates a plain run"]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// One node of the content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContentNode {
    Paragraph {
        runs: Vec<Run>,
        alignment: Alignment,
    },
    /// Level 1..=9
    Heading { level: u8, text: String },
    /// Rows of cell texts
    Table { rows: Vec<Vec<String>> },
    /// Embedded picture, `source` is its part path
    Image { source: String },
    /// Vector drawing or text box without a picture
    Drawing { name: String },
    /// Embedded chart, `source` is its part path
    Chart { source: String },
    /// Paragraph consisting of a single link
    Hyperlink { text: String, target: String },
    PageBreak,
}

impl ContentNode {
    #[must_use = "creates a paragraph node"]
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph {
            runs: vec![Run::plain(text)],
            alignment: Alignment::Left,
        }
    }

    #[must_use = "returns the node kind"]
    pub const fn kind(&self) -> ContentKind {
        match self {
            Self::Paragraph { .. } => ContentKind::Paragraph,
            Self::Heading { .. } => ContentKind::Heading,
            Self::Table { .. } => ContentKind::Table,
            Self::Image { .. } => ContentKind::Image,
            Self::Drawing { .. } => ContentKind::Drawing,
            Self::Chart { .. } => ContentKind::Chart,
            Self::Hyperlink { .. } => ContentKind::Hyperlink,
            Self::PageBreak => ContentKind::PageBreak,
        }
    }

    /// Plain text of the node. Table cells are joined with ` | `, rows with
    /// newlines.
    #[must_use = "returns the node text"]
    pub fn text(&self) -> String {
        match self {
            Self::Paragraph { runs, .. } => runs.iter().map(|r| r.text.as_str()).collect(),
            Self::Heading { text, .. } | Self::Hyperlink { text, .. } => text.clone(),
            Self::Table { rows } => rows
                .iter()
                .map(|r| r.join(" | "))
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Image { .. } | Self::Drawing { .. } | Self::Chart { .. } | Self::PageBreak => {
                String::new()
            }
        }
    }
}

/// Build a paragraph node from collected runs. Adjacent runs with the same
/// formatting are merged; a paragraph made of one link becomes a
/// [`ContentNode::Hyperlink`]. Returns `None` for a paragraph without text.
pub(crate) fn finish_paragraph(runs: Vec<Run>, alignment: Alignment) -> Option<ContentNode> {
    let mut merged: Vec<Run> = Vec::with_capacity(runs.len());
    for run in runs.into_iter().filter(|r| !r.text.is_empty()) {
        match merged.last_mut() {
            Some(last)
                if last.bold == run.bold && last.italic == run.italic && last.link == run.link =>
            {
                last.text.push_str(&run.text);
            }
            _ => merged.push(run),
        }
    }
    if merged.iter().all(|r| r.text.trim().is_empty()) {
        return None;
    }
    if let [Run {
        text,
        link: Some(target),
        ..
    }] = merged.as_slice()
    {
        return Some(ContentNode::Hyperlink {
            text: text.clone(),
            target: target.clone(),
        });
    }
    Some(ContentNode::Paragraph {
        runs: merged,
        alignment,
    })
}

/// Slide of a presentation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    pub title: Option<String>,
    pub body: Vec<ContentNode>,
}

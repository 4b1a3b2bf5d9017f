//! Annotation subtypes and flag bits.

use crate::error::AnnotError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Annotation subtype, fixed when the annotation is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotType {
    Text,
    Link,
    FreeText,
    Line,
    Square,
    Circle,
    Polygon,
    PolyLine,
    Highlight,
    Underline,
    Squiggly,
    StrikeOut,
    Redact,
    Stamp,
    Caret,
    Ink,
    Popup,
    FileAttachment,
    Sound,
    Movie,
    RichMedia,
    Widget,
    Screen,
    PrinterMark,
    TrapNet,
    Watermark,
    ThreeD,
    Projection,
}

impl AnnotType {
    pub const ALL: [Self; 28] = [
        Self::Text,
        Self::Link,
        Self::FreeText,
        Self::Line,
        Self::Square,
        Self::Circle,
        Self::Polygon,
        Self::PolyLine,
        Self::Highlight,
        Self::Underline,
        Self::Squiggly,
        Self::StrikeOut,
        Self::Redact,
        Self::Stamp,
        Self::Caret,
        Self::Ink,
        Self::Popup,
        Self::FileAttachment,
        Self::Sound,
        Self::Movie,
        Self::RichMedia,
        Self::Widget,
        Self::Screen,
        Self::PrinterMark,
        Self::TrapNet,
        Self::Watermark,
        Self::ThreeD,
        Self::Projection,
    ];

    /// Stable numeric code (0..=27), the position in [`AnnotType::ALL`].
    #[must_use = "returns the type code"]
    pub fn code(self) -> i32 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        Self::ALL
            .iter()
            .position(|t| *t == self)
            .map_or(-1, |i| i as i32)
    }

    /// # Errors
    ///
    /// Returns [`AnnotError::UnknownCode`] outside `0..=27`.
    pub fn from_code(code: i32) -> Result<Self, AnnotError> {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(AnnotError::UnknownCode {
                what: "annotation type",
                code,
            })
    }

    /// Subtype name as written in annotation dictionaries.
    #[must_use = "returns the subtype name"]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Link => "Link",
            Self::FreeText => "FreeText",
            Self::Line => "Line",
            Self::Square => "Square",
            Self::Circle => "Circle",
            Self::Polygon => "Polygon",
            Self::PolyLine => "PolyLine",
            Self::Highlight => "Highlight",
            Self::Underline => "Underline",
            Self::Squiggly => "Squiggly",
            Self::StrikeOut => "StrikeOut",
            Self::Redact => "Redact",
            Self::Stamp => "Stamp",
            Self::Caret => "Caret",
            Self::Ink => "Ink",
            Self::Popup => "Popup",
            Self::FileAttachment => "FileAttachment",
            Self::Sound => "Sound",
            Self::Movie => "Movie",
            Self::RichMedia => "RichMedia",
            Self::Widget => "Widget",
            Self::Screen => "Screen",
            Self::PrinterMark => "PrinterMark",
            Self::TrapNet => "TrapNet",
            Self::Watermark => "Watermark",
            Self::ThreeD => "3D",
            Self::Projection => "Projection",
        }
    }

    /// Text markup types draw over a text line instead of inside a box.
    #[inline]
    #[must_use = "returns whether the type marks up text"]
    pub const fn is_markup(self) -> bool {
        matches!(
            self,
            Self::Highlight | Self::Underline | Self::Squiggly | Self::StrikeOut
        )
    }
}

impl fmt::Display for AnnotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AnnotType {
    type Err = AnnotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| AnnotError::Unsupported(format!("annotation type '{s}'")))
    }
}

/// Annotation flag bits (`/F`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotFlags(u32);

impl AnnotFlags {
    pub const INVISIBLE: Self = Self(1);
    pub const HIDDEN: Self = Self(1 << 1);
    pub const PRINT: Self = Self(1 << 2);
    pub const NO_ZOOM: Self = Self(1 << 3);
    pub const NO_ROTATE: Self = Self(1 << 4);
    pub const NO_VIEW: Self = Self(1 << 5);
    pub const READ_ONLY: Self = Self(1 << 6);
    pub const LOCKED: Self = Self(1 << 7);
    pub const TOGGLE_NO_VIEW: Self = Self(1 << 8);
    pub const LOCKED_CONTENTS: Self = Self(1 << 9);

    #[inline]
    #[must_use = "creates flags"]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[inline]
    #[must_use = "creates flags"]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[inline]
    #[must_use = "returns the raw bits"]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    #[must_use = "returns whether all bits of other are set"]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Hidden annotations produce no appearance output.
    #[inline]
    #[must_use = "returns whether the annotation is drawn"]
    pub const fn is_drawn(self) -> bool {
        self.0 & (Self::HIDDEN.0 | Self::INVISIBLE.0 | Self::NO_VIEW.0) == 0
    }
}

impl std::ops::BitOr for AnnotFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_cover_all_types() {
        for (i, t) in AnnotType::ALL.into_iter().enumerate() {
            assert_eq!(t.code(), i32::try_from(i).unwrap());
            assert_eq!(AnnotType::from_code(t.code()).unwrap(), t);
        }
        assert_eq!(AnnotType::from_code(21).unwrap(), AnnotType::Widget);
        assert!(AnnotType::from_code(28).is_err());
        assert!(AnnotType::from_code(-1).is_err());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("strikeout".parse::<AnnotType>().unwrap(), AnnotType::StrikeOut);
        assert_eq!("3D".parse::<AnnotType>().unwrap(), AnnotType::ThreeD);
        assert!("Scribble".parse::<AnnotType>().is_err());
        assert_eq!(AnnotType::FreeText.to_string(), "FreeText");
    }

    #[test]
    fn test_flags() {
        let mut flags = AnnotFlags::PRINT | AnnotFlags::LOCKED;
        assert_eq!(flags.bits(), 132);
        assert!(flags.contains(AnnotFlags::PRINT));
        assert!(flags.is_drawn());
        flags.insert(AnnotFlags::HIDDEN);
        assert!(!flags.is_drawn());
        flags.remove(AnnotFlags::HIDDEN | AnnotFlags::PRINT);
        assert_eq!(flags, AnnotFlags::LOCKED);
        assert_eq!(AnnotFlags::from_bits(4), AnnotFlags::PRINT);
    }
}

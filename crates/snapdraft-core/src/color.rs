//! Segment colours and the interchange palette.

use peniko::Color;
use serde::{Deserialize, Serialize};

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn white() -> Self {
        Self::rgb(255, 255, 255)
    }
}

impl Default for SerializableColor {
    fn default() -> Self {
        Self::white()
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// The fixed colour palette of the interchange format.
///
/// Indices follow the AutoCAD color index (ACI) numbering for the first nine
/// entries. Anything outside this palette is mapped to its nearest entry when
/// written, so a write/read round trip is lossy for arbitrary colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AciColor {
    Red,
    Yellow,
    Green,
    Cyan,
    Blue,
    Magenta,
    #[default]
    White,
    DarkGray,
    LightGray,
}

impl AciColor {
    /// All palette entries in index order.
    pub const ALL: [AciColor; 9] = [
        AciColor::Red,
        AciColor::Yellow,
        AciColor::Green,
        AciColor::Cyan,
        AciColor::Blue,
        AciColor::Magenta,
        AciColor::White,
        AciColor::DarkGray,
        AciColor::LightGray,
    ];

    /// Interchange color index (1..=9).
    pub fn index(self) -> i32 {
        match self {
            AciColor::Red => 1,
            AciColor::Yellow => 2,
            AciColor::Green => 3,
            AciColor::Cyan => 4,
            AciColor::Blue => 5,
            AciColor::Magenta => 6,
            AciColor::White => 7,
            AciColor::DarkGray => 8,
            AciColor::LightGray => 9,
        }
    }

    /// Palette entry for an index. Unknown indices fall back to white.
    pub fn from_index(index: i32) -> Self {
        match index {
            1 => AciColor::Red,
            2 => AciColor::Yellow,
            3 => AciColor::Green,
            4 => AciColor::Cyan,
            5 => AciColor::Blue,
            6 => AciColor::Magenta,
            8 => AciColor::DarkGray,
            9 => AciColor::LightGray,
            _ => AciColor::White,
        }
    }

    pub fn color(self) -> SerializableColor {
        match self {
            AciColor::Red => SerializableColor::rgb(255, 0, 0),
            AciColor::Yellow => SerializableColor::rgb(255, 255, 0),
            AciColor::Green => SerializableColor::rgb(0, 255, 0),
            AciColor::Cyan => SerializableColor::rgb(0, 255, 255),
            AciColor::Blue => SerializableColor::rgb(0, 0, 255),
            AciColor::Magenta => SerializableColor::rgb(255, 0, 255),
            AciColor::White => SerializableColor::rgb(255, 255, 255),
            AciColor::DarkGray => SerializableColor::rgb(128, 128, 128),
            AciColor::LightGray => SerializableColor::rgb(192, 192, 192),
        }
    }

    /// Nearest palette entry by squared RGB distance (alpha ignored).
    /// Earlier entries win ties.
    pub fn nearest(color: SerializableColor) -> Self {
        let dist = |entry: AciColor| -> i32 {
            let c = entry.color();
            let dr = c.r as i32 - color.r as i32;
            let dg = c.g as i32 - color.g as i32;
            let db = c.b as i32 - color.b as i32;
            dr * dr + dg * dg + db * db
        };

        let mut best = AciColor::White;
        let mut best_dist = i32::MAX;
        for entry in Self::ALL {
            let d = dist(entry);
            if d < best_dist {
                best_dist = d;
                best = entry;
            }
        }
        best
    }

    /// Parse a palette name (`red`, `dark-gray`, ...), case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "red" => Some(AciColor::Red),
            "yellow" => Some(AciColor::Yellow),
            "green" => Some(AciColor::Green),
            "cyan" => Some(AciColor::Cyan),
            "blue" => Some(AciColor::Blue),
            "magenta" => Some(AciColor::Magenta),
            "white" => Some(AciColor::White),
            "darkgray" | "darkgrey" => Some(AciColor::DarkGray),
            "lightgray" | "lightgrey" => Some(AciColor::LightGray),
            _ => None,
        }
    }
}

impl From<AciColor> for SerializableColor {
    fn from(aci: AciColor) -> Self {
        aci.color()
    }
}

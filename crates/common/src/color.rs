use rand::Rng;
use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;

/// A palette entry. The set is closed: the sixteen basic web colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    Black,
    White,
    Red,
    Lime,
    Blue,
    Yellow,
    Cyan,
    Magenta,
    Silver,
    Gray,
    Maroon,
    Olive,
    Green,
    Purple,
    Teal,
    Navy,
}

impl Color {
    /// Every palette member, in declaration order.
    pub const ALL: [Color; 16] = [
        Color::Black,
        Color::White,
        Color::Red,
        Color::Lime,
        Color::Blue,
        Color::Yellow,
        Color::Cyan,
        Color::Magenta,
        Color::Silver,
        Color::Gray,
        Color::Maroon,
        Color::Olive,
        Color::Green,
        Color::Purple,
        Color::Teal,
        Color::Navy,
    ];

    /// 8-bit RGB value of this color.
    pub fn rgb(self) -> [u8; 3] {
        match self {
            Color::Black => [0, 0, 0],
            Color::White => [255, 255, 255],
            Color::Red => [255, 0, 0],
            Color::Lime => [0, 255, 0],
            Color::Blue => [0, 0, 255],
            Color::Yellow => [255, 255, 0],
            Color::Cyan => [0, 255, 255],
            Color::Magenta => [255, 0, 255],
            Color::Silver => [192, 192, 192],
            Color::Gray => [128, 128, 128],
            Color::Maroon => [128, 0, 0],
            Color::Olive => [128, 128, 0],
            Color::Green => [0, 128, 0],
            Color::Purple => [128, 0, 128],
            Color::Teal => [0, 128, 128],
            Color::Navy => [0, 0, 128],
        }
    }

    /// Normalized, fully opaque RGBA.
    pub fn rgba(self) -> [f32; 4] {
        let [r, g, b] = self.rgb();
        [
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            1.0,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Black => "black",
            Color::White => "white",
            Color::Red => "red",
            Color::Lime => "lime",
            Color::Blue => "blue",
            Color::Yellow => "yellow",
            Color::Cyan => "cyan",
            Color::Magenta => "magenta",
            Color::Silver => "silver",
            Color::Gray => "gray",
            Color::Maroon => "maroon",
            Color::Olive => "olive",
            Color::Green => "green",
            Color::Purple => "purple",
            Color::Teal => "teal",
            Color::Navy => "navy",
        }
    }

    /// Pick a palette member using the thread-local RNG.
    pub fn random() -> Self {
        Self::random_with(&mut rand::thread_rng())
    }

    /// Pick a palette member from the given RNG (seedable for tests).
    pub fn random_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Color {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConfigError::UnknownColor(wanted.to_string()))
    }
}

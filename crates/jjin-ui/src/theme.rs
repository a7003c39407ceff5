//! Temperature colors and day/night surfaces.

use std::fmt;

/// 0xAARRGGBB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub const fn rgb(rgb: u32) -> Self {
        Self(0xFF00_0000 | (rgb & 0x00FF_FFFF))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06X}", self.0 & 0x00FF_FFFF)
    }
}

/// Used for any temperature without an exact entry in the table.
pub const DEFAULT_TEMPERATURE_COLOR: Color = Color::rgb(0x9E9E9E);

/// Feels-like marker and its legend swatch
pub const POINT_COLOR: Color = Color::rgb(0xFF5252);

/// Track behind the daily range bars
pub const RANGE_TRACK_COLOR: Color = Color::rgb(0x3A4A63);

/// Exact-key color table. No interpolation between keys.
const TEMPERATURE_COLORS: &[(i32, Color)] = &[
    (-10, Color::rgb(0x3F51B5)),
    (-5, Color::rgb(0x2196F3)),
    (0, Color::rgb(0x03A9F4)),
    (5, Color::rgb(0x00BCD4)),
    (10, Color::rgb(0x4DB6AC)),
    (15, Color::rgb(0x8BC34A)),
    (20, Color::rgb(0xFFEB3B)),
    (25, Color::rgb(0xFFC107)),
    (30, Color::rgb(0xFF9800)),
    (35, Color::rgb(0xF44336)),
];

pub fn temperature_color(temperature: i32) -> Color {
    TEMPERATURE_COLORS
        .iter()
        .find(|(key, _)| *key == temperature)
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_TEMPERATURE_COLOR)
}

/// Screen backdrop gradient and card surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background_top: Color,
    pub background_bottom: Color,
    pub card: Color,
}

pub const DAY_PALETTE: Palette = Palette {
    background_top: Color::rgb(0x4A90E2),
    background_bottom: Color::rgb(0xA7D0F5),
    card: Color(0x33FF_FFFF),
};

pub const NIGHT_PALETTE: Palette = Palette {
    background_top: Color::rgb(0x0B1026),
    background_bottom: Color::rgb(0x2B3A67),
    card: Color(0x33_0B1026),
};

pub fn palette(is_night: bool) -> Palette {
    if is_night {
        NIGHT_PALETTE
    } else {
        DAY_PALETTE
    }
}

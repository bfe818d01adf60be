/// Token → color lookup for track items and cars.
/// Built once at startup and lent to the renderer; never mutated.

use std::collections::HashMap;

use crossterm::style::Color;

/// How a labelled cell is painted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tint {
    pub fg: Color,
    pub bold: bool,
}

impl Tint {
    /// Anything the table doesn't know about.
    pub const NEUTRAL: Tint = Tint { fg: Color::Reset, bold: true };

    const fn bold(fg: Color) -> Self {
        Tint { fg, bold: true }
    }
}

/// Obstacles, pickups, then one entry per car. Cars alternate so that
/// neighbouring identities never share a color.
const TOKEN_COLORS: &[(&str, Color)] = &[
    ("crack", Color::Yellow),
    ("trash", Color::Magenta),
    ("penguin", Color::Green),
    ("bike", Color::Blue),
    ("water", Color::Cyan),
    ("barrier", Color::Magenta),
    ("car-0", Color::White),
    ("car-1", Color::Red),
    ("car-2", Color::White),
    ("car-3", Color::Red),
];

pub struct Palette {
    entries: HashMap<&'static str, Tint>,
}

impl Palette {
    pub fn new() -> Self {
        let entries = TOKEN_COLORS
            .iter()
            .map(|&(token, fg)| (token, Tint::bold(fg)))
            .collect();
        Palette { entries }
    }

    /// Tint for a cell label. Surrounding padding is ignored.
    pub fn resolve(&self, token: &str) -> Tint {
        self.entries
            .get(token.trim())
            .copied()
            .unwrap_or(Tint::NEUTRAL)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Palette::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tokens_resolve() {
        let p = Palette::new();
        assert_eq!(p.resolve("crack").fg, Color::Yellow);
        assert_eq!(p.resolve("penguin").fg, Color::Green);
        assert_eq!(p.resolve("water").fg, Color::Cyan);
        assert!(p.resolve("bike").bold);
    }

    #[test]
    fn padded_labels_resolve_like_bare_tokens() {
        let p = Palette::new();
        assert_eq!(p.resolve("  trash   "), p.resolve("trash"));
        assert_eq!(p.resolve("  car-1   ").fg, Color::Red);
    }

    #[test]
    fn unknown_and_empty_tokens_are_neutral() {
        let p = Palette::new();
        for token in ["", "   ", "unicorn", "car-4", "CRACK", "car-"] {
            assert_eq!(p.resolve(token), Tint::NEUTRAL, "token {token:?}");
        }
    }

    #[test]
    fn car_colors_alternate() {
        let p = Palette::new();
        let colors: Vec<Color> = (0..4).map(|i| p.resolve(&format!("car-{i}")).fg).collect();
        for pair in colors.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
        assert_eq!(colors[0], colors[2]);
        assert_eq!(colors[1], colors[3]);
    }
}

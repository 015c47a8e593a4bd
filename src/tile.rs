use ratatui::style::Color;

/// The symbols a tile can show.  Each one appears exactly twice on a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    Heart,
    WaterDrop,
    Die,
    Umbrella,
    Cube,
    BeachBall,
    Dragonfly,
    Hummingbird,
    Flower,
    OpenBook,
}

impl Symbol {
    /// The full palette, in the order boards draw from it.
    pub const PALETTE: [Symbol; 10] = [
        Symbol::Heart,
        Symbol::WaterDrop,
        Symbol::Die,
        Symbol::Umbrella,
        Symbol::Cube,
        Symbol::BeachBall,
        Symbol::Dragonfly,
        Symbol::Hummingbird,
        Symbol::Flower,
        Symbol::OpenBook,
    ];

    /// Single-column glyph drawn in the middle of a face-up tile.
    pub fn glyph(self) -> &'static str {
        match self {
            Symbol::Heart => "♥",
            Symbol::WaterDrop => "≈",
            Symbol::Die => "⚄",
            Symbol::Umbrella => "☂",
            Symbol::Cube => "■",
            Symbol::BeachBall => "◍",
            Symbol::Dragonfly => "✢",
            Symbol::Hummingbird => "➶",
            Symbol::Flower => "✿",
            Symbol::OpenBook => "▤",
        }
    }

    /// Short caption printed under the glyph.
    pub fn name(self) -> &'static str {
        match self {
            Symbol::Heart => "heart",
            Symbol::WaterDrop => "drop",
            Symbol::Die => "die",
            Symbol::Umbrella => "brolly",
            Symbol::Cube => "cube",
            Symbol::BeachBall => "ball",
            Symbol::Dragonfly => "fly",
            Symbol::Hummingbird => "bird",
            Symbol::Flower => "flower",
            Symbol::OpenBook => "book",
        }
    }

    pub fn color(self) -> Color {
        match self {
            Symbol::Heart => Color::Red,
            Symbol::WaterDrop => Color::Blue,
            Symbol::Die => Color::White,
            Symbol::Umbrella => Color::Magenta,
            Symbol::Cube => Color::Yellow,
            Symbol::BeachBall => Color::LightRed,
            Symbol::Dragonfly => Color::Cyan,
            Symbol::Hummingbird => Color::Green,
            Symbol::Flower => Color::LightMagenta,
            Symbol::OpenBook => Color::LightYellow,
        }
    }
}

/// Where a tile is in its life: face down, face up waiting to be compared,
/// or solved for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Hidden,
    Revealed,
    Matched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub symbol: Symbol,
    pub visibility: Visibility,
}

impl Tile {
    pub fn hidden(symbol: Symbol) -> Self {
        Tile {
            symbol,
            visibility: Visibility::Hidden,
        }
    }

    #[allow(dead_code)]
    pub fn is_hidden(&self) -> bool {
        self.visibility == Visibility::Hidden
    }

    pub fn is_revealed(&self) -> bool {
        self.visibility == Visibility::Revealed
    }

    pub fn is_matched(&self) -> bool {
        self.visibility == Visibility::Matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn palette_symbols_are_distinct() {
        let set: HashSet<_> = Symbol::PALETTE.iter().collect();
        assert_eq!(set.len(), Symbol::PALETTE.len());
        let glyphs: HashSet<_> = Symbol::PALETTE.iter().map(|s| s.glyph()).collect();
        assert_eq!(glyphs.len(), Symbol::PALETTE.len());
    }

    #[test]
    fn new_tiles_start_face_down() {
        let tile = Tile::hidden(Symbol::Cube);
        assert!(tile.is_hidden());
        assert!(!tile.is_revealed());
        assert!(!tile.is_matched());
    }
}

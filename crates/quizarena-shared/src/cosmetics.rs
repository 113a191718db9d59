//! Avatar frames and app themes sold in the store.
//!
//! Every profile owns the `default` frame and theme. Buying an item spends
//! its price, adds it to the owned list and equips it; picking an item that
//! is already owned just equips it again.

use serde::{Deserialize, Serialize};

/// Id of the frame and theme every profile starts with.
pub const DEFAULT_COSMETIC: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CosmeticKind {
    Frame,
    Theme,
}

impl std::fmt::Display for CosmeticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Frame => "frame",
            Self::Theme => "theme",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cosmetic {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: CosmeticKind,
    pub price: u32,
    /// Display colors, hex. Frames use one, themes a two-stop gradient.
    pub colors: &'static [&'static str],
}

const fn frame(id: &'static str, name: &'static str, price: u32, colors: &'static [&'static str]) -> Cosmetic {
    Cosmetic {
        id,
        name,
        kind: CosmeticKind::Frame,
        price,
        colors,
    }
}

const fn theme(id: &'static str, name: &'static str, price: u32, colors: &'static [&'static str]) -> Cosmetic {
    Cosmetic {
        id,
        name,
        kind: CosmeticKind::Theme,
        price,
        colors,
    }
}

pub const FRAMES: [Cosmetic; 6] = [
    frame("frame_fire", "Fire Frame", 300, &["#EF4444"]),
    frame("frame_ice", "Ice Frame", 300, &["#38BDF8"]),
    frame("frame_gold", "Gold Frame", 500, &["#FFD700"]),
    frame("frame_neon", "Neon Frame", 500, &["#A855F7"]),
    frame("frame_diamond", "Diamond Frame", 800, &["#00E5FF"]),
    frame("frame_crown", "Royal Frame", 1000, &["#F59E0B"]),
];

pub const THEMES: [Cosmetic; 6] = [
    theme("theme_ocean", "Blue Ocean", 400, &["#0EA5E9", "#0284C7"]),
    theme("theme_sunset", "Fiery Sunset", 400, &["#F97316", "#DC2626"]),
    theme("theme_forest", "Green Forest", 400, &["#10B981", "#059669"]),
    theme("theme_galaxy", "Violet Galaxy", 600, &["#8B5CF6", "#6D28D9"]),
    theme("theme_aurora", "Aurora", 800, &["#06B6D4", "#A855F7"]),
    theme("theme_royal", "Royal Gold", 1000, &["#FFD700", "#B8860B"]),
];

/// The store listing for `kind`.
pub fn catalog(kind: CosmeticKind) -> &'static [Cosmetic] {
    match kind {
        CosmeticKind::Frame => &FRAMES,
        CosmeticKind::Theme => &THEMES,
    }
}

/// Look up a sellable item. The free `default` item is not listed.
pub fn find(kind: CosmeticKind, id: &str) -> Option<&'static Cosmetic> {
    catalog(kind).iter().find(|c| c.id == id)
}

pub fn default_owned() -> Vec<String> {
    vec![DEFAULT_COSMETIC.to_string()]
}

pub fn default_equipped() -> String {
    DEFAULT_COSMETIC.to_string()
}

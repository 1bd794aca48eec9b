use std::fmt;

use sha2::{Digest, Sha256};

use crate::error::{OncoprintError, Result};

/// Placeholder category for cells without a mutation.
pub const BACKGROUND_KEY: &str = "background";

pub const AMP: &str = "Amp";
pub const DEL: &str = "Del";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    /// Linear blend from `self` (t = 0) to `other` (t = 1).
    pub fn mix(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let ch = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(ch(self.0, other.0), ch(self.1, other.1), ch(self.2, other.2))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Parse `#RRGGBB` or `r,g,b`.
pub fn parse_color(s: &str) -> Result<Rgb> {
    let s = s.trim();
    let invalid = || OncoprintError::InvalidColor(s.to_string());
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        return Ok(Rgb(channel(0)?, channel(2)?, channel(4)?));
    }
    let parts: Vec<u8> = s
        .split(',')
        .map(|p| p.trim().parse::<u8>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| invalid())?;
    match parts[..] {
        [r, g, b] => Ok(Rgb(r, g, b)),
        _ => Err(invalid()),
    }
}

/// Whether a category is drawn as a copy-number bar rather than a full fill.
pub fn is_copy_number(category: &str) -> bool {
    category == AMP || category == DEL
}

const DEFAULT_BACKGROUND: Rgb = Rgb(204, 204, 204);

const DEFAULT_PALETTE: [(&str, Rgb); 12] = [
    ("Missense_Mutation", Rgb(51, 160, 44)),
    ("Nonsense_Mutation", Rgb(227, 26, 28)),
    ("Frame_Shift_Del", Rgb(31, 120, 180)),
    ("Frame_Shift_Ins", Rgb(106, 61, 154)),
    ("In_Frame_Del", Rgb(255, 217, 47)),
    ("In_Frame_Ins", Rgb(251, 154, 153)),
    ("Splice_Site", Rgb(255, 127, 0)),
    ("Translation_Start_Site", Rgb(166, 206, 227)),
    ("Nonstop_Mutation", Rgb(202, 178, 214)),
    ("Multi_Hit", Rgb(0, 0, 0)),
    (AMP, Rgb(178, 24, 43)),
    (DEL, Rgb(33, 102, 172)),
];

/// Category → color table. Keeps insertion order so the legend comes out
/// in the same order the categories were declared.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    entries: Vec<(String, Rgb)>,
    background: Rgb,
}

impl Default for ColorMap {
    fn default() -> Self {
        ColorMap {
            entries: DEFAULT_PALETTE.iter().map(|(k, c)| (k.to_string(), *c)).collect(),
            background: DEFAULT_BACKGROUND,
        }
    }
}

impl ColorMap {
    /// A caller-supplied table. It replaces the default categories; a
    /// `background` entry, if present, replaces the background color.
    pub fn custom<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Rgb)>,
        S: Into<String>,
    {
        let mut map = ColorMap { entries: Vec::new(), background: DEFAULT_BACKGROUND };
        for (k, c) in entries {
            map.insert(k, c);
        }
        map
    }

    pub fn insert<S: Into<String>>(&mut self, category: S, color: Rgb) {
        let category = category.into();
        if category == BACKGROUND_KEY {
            self.background = color;
            return;
        }
        match self.entries.iter_mut().find(|(k, _)| *k == category) {
            Some(entry) => entry.1 = color,
            None => self.entries.push((category, color)),
        }
    }

    pub fn get(&self, category: &str) -> Option<Rgb> {
        if category == BACKGROUND_KEY {
            return Some(self.background);
        }
        self.entries.iter().find(|(k, _)| k == category).map(|(_, c)| *c)
    }

    pub fn background(&self) -> Rgb {
        self.background
    }

    /// Semantic categories only; the placeholder is never part of this list.
    pub fn categories(&self) -> impl Iterator<Item = (&str, Rgb)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), *c))
    }
}

/// Deterministic color for an arbitrary key, from its SHA-256 digest.
pub fn hashed_color(key: &str) -> Rgb {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let digest = hasher.finalize();

    let mut r = digest[24] as f32 / 255.0;
    let mut g = digest[8] as f32 / 255.0;
    let mut b = digest[16] as f32 / 255.0;

    let sum = r + g + b;
    if sum > 0.0 {
        r /= sum;
        g /= sum;
        b /= sum;
    }

    // brighten, capped so the strongest channel saturates
    let max = r.max(g).max(b);
    let f = if max > 0.0 { 1.5f32.min(1.0 / max) } else { 1.0 };

    let out = |v: f32| (255.0 * (v * f).min(1.0)).round() as u8;
    Rgb(out(r), out(g), out(b))
}

/// Continuous color scale over `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorRamp {
    pub min: f64,
    pub max: f64,
    pub low: Rgb,
    pub high: Rgb,
}

impl ColorRamp {
    pub fn color(&self, value: f64) -> Rgb {
        let span = self.max - self.min;
        let t = if span > 0.0 { (value - self.min) / span } else { 0.5 };
        self.low.mix(self.high, t)
    }
}

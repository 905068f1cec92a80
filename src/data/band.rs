//! Value-to-color banding for gauges.
//!
//! A [`BandSet`] is an ordered list of half-open intervals. Each band is
//! described by its exclusive upper bound; the last color covers everything at
//! or above the final bound. Lookup walks the list and returns the first band
//! whose upper bound is above the value, so every `f64` maps to exactly one
//! color.

use std::fmt;

use ratatui::style::Color;

/// A 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse a `#rrggbb` token.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Rgb(r, g, b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Color::Rgb(rgb.0, rgb.1, rgb.2)
    }
}

/// A named color band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub name: &'static str,
    pub color: Rgb,
}

/// Ordered `(upper_exclusive, band)` pairs plus the band for everything above.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandSet {
    below: &'static [(f64, Band)],
    top: Band,
}

impl BandSet {
    pub const fn new(below: &'static [(f64, Band)], top: Band) -> Self {
        Self { below, top }
    }

    /// Band for a value. NaN compares false against every bound and lands in
    /// the top band.
    pub fn band_for(&self, value: f64) -> Band {
        self.below
            .iter()
            .find(|(upper, _)| value < *upper)
            .map(|(_, band)| *band)
            .unwrap_or(self.top)
    }

    pub fn color_for(&self, value: f64) -> Rgb {
        self.band_for(value).color
    }

    /// All bands, lowest first.
    pub fn bands(&self) -> impl Iterator<Item = Band> + '_ {
        self.below.iter().map(|(_, band)| *band).chain(std::iter::once(self.top))
    }

    /// The interior boundaries, ascending.
    pub fn bounds(&self) -> impl Iterator<Item = f64> + '_ {
        self.below.iter().map(|(upper, _)| *upper)
    }
}

const fn band(name: &'static str, color: Rgb) -> Band {
    Band { name, color }
}

/// CO2 bands in ppm.
pub const CO2_BANDS: BandSet = BandSet::new(
    &[
        (300.0, band("white", Rgb(0xff, 0xff, 0xff))),
        (800.0, band("light-blue", Rgb(0x00, 0xbf, 0xff))),
        (1200.0, band("orange", Rgb(0xff, 0x91, 0x00))),
        (1600.0, band("red-orange", Rgb(0xfa, 0x50, 0x20))),
    ],
    band("dark-red", Rgb(0xa1, 0x00, 0x0b)),
);

/// Temperature bands in °C.
pub const TEMPERATURE_BANDS: BandSet = BandSet::new(
    &[
        (0.0, band("blue", Rgb(0x22, 0x19, 0xff))),
        (15.0, band("mid-blue", Rgb(0x33, 0x81, 0xff))),
        (25.0, band("green", Rgb(0x0f, 0xf2, 0x3c))),
        (30.0, band("yellow", Rgb(0xf7, 0xc8, 0x0a))),
    ],
    band("orange-red", Rgb(0xf7, 0x4d, 0x0a)),
);

/// Relative humidity bands in %.
pub const HUMIDITY_BANDS: BandSet = BandSet::new(
    &[
        (0.0, band("orange", Rgb(0xff, 0x91, 0x1c))),
        (25.0, band("light-green", Rgb(0xb4, 0xfc, 0x68))),
        (50.0, band("light-blue", Rgb(0x72, 0xc5, 0xf2))),
        (75.0, band("blue", Rgb(0x5e, 0x6c, 0xff))),
    ],
    band("deep-blue", Rgb(0x42, 0x87, 0xf5)),
);

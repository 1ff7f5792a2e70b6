//! Visual treatments and the pixel transforms behind them.
//!
//! A treatment is a fixed chain of colour filters with CSS filter-function
//! semantics, applied left to right with clamping after every step.

use std::fmt;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// One colour filter. Amounts are fractions (`1.0` == 100%).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOp {
    Grayscale(f32),
    Sepia(f32),
    Contrast(f32),
    Brightness(f32),
    Saturate(f32),
}

const BLACK_AND_WHITE: &[FilterOp] = &[FilterOp::Grayscale(1.0), FilterOp::Contrast(1.2)];
const SEPIA: &[FilterOp] = &[
    FilterOp::Sepia(0.8),
    FilterOp::Contrast(1.1),
    FilterOp::Brightness(0.9),
];
const GRAINY: &[FilterOp] = &[
    FilterOp::Contrast(1.0),
    FilterOp::Brightness(0.8),
    FilterOp::Saturate(1.2),
];

/// The look applied uniformly to every photo of one strip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "String")]
pub enum Treatment {
    Color,
    BlackAndWhite,
    #[default]
    Sepia,
    Grainy,
}

impl Treatment {
    pub const ALL: [Treatment; 4] = [
        Treatment::Color,
        Treatment::BlackAndWhite,
        Treatment::Sepia,
        Treatment::Grainy,
    ];

    /// Parse a treatment identifier. Unknown identifiers map to `Color`.
    pub fn from_id(id: &str) -> Self {
        match id.trim() {
            "color" | "colour" => Self::Color,
            "blackAndWhite" | "black_and_white" | "bw" => Self::BlackAndWhite,
            "sepia" => Self::Sepia,
            "grainy" => Self::Grainy,
            other => {
                tracing::debug!("unknown treatment '{other}', using color");
                Self::Color
            }
        }
    }

    pub fn as_id(self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::BlackAndWhite => "blackAndWhite",
            Self::Sepia => "sepia",
            Self::Grainy => "grainy",
        }
    }

    /// The filter chain this treatment applies; empty for identity.
    pub fn filters(self) -> &'static [FilterOp] {
        match self {
            Self::Color => &[],
            Self::BlackAndWhite => BLACK_AND_WHITE,
            Self::Sepia => SEPIA,
            Self::Grainy => GRAINY,
        }
    }

    pub fn is_identity(self) -> bool {
        self.filters().is_empty()
    }

    /// CSS `filter` description, e.g. `"sepia(80%) contrast(110%) brightness(90%)"`.
    pub fn describe(self) -> String {
        if self.is_identity() {
            return "none".to_string();
        }
        self.filters()
            .iter()
            .map(FilterOp::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Apply the chain to every pixel. Alpha is untouched.
    pub fn apply(self, img: &mut RgbaImage) {
        let ops = self.filters();
        if ops.is_empty() {
            return;
        }
        for px in img.pixels_mut() {
            let mut rgb = [
                f32::from(px[0]) / 255.0,
                f32::from(px[1]) / 255.0,
                f32::from(px[2]) / 255.0,
            ];
            for op in ops {
                rgb = op.apply(rgb);
            }
            for (channel, value) in px.0.iter_mut().zip(rgb) {
                *channel = (value * 255.0).round() as u8;
            }
        }
    }
}

impl From<String> for Treatment {
    fn from(id: String) -> Self {
        Self::from_id(&id)
    }
}

impl fmt::Display for Treatment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_id())
    }
}

impl FilterOp {
    /// Apply to a normalised RGB triple, clamping the result to `[0, 1]`.
    pub fn apply(self, [r, g, b]: [f32; 3]) -> [f32; 3] {
        let out = match self {
            Self::Grayscale(a) => {
                let k = 1.0 - a.clamp(0.0, 1.0);
                mat(
                    [
                        [0.2126 + 0.7874 * k, 0.7152 - 0.7152 * k, 0.0722 - 0.0722 * k],
                        [0.2126 - 0.2126 * k, 0.7152 + 0.2848 * k, 0.0722 - 0.0722 * k],
                        [0.2126 - 0.2126 * k, 0.7152 - 0.7152 * k, 0.0722 + 0.9278 * k],
                    ],
                    [r, g, b],
                )
            }
            Self::Sepia(a) => {
                let k = 1.0 - a.clamp(0.0, 1.0);
                mat(
                    [
                        [0.393 + 0.607 * k, 0.769 - 0.769 * k, 0.189 - 0.189 * k],
                        [0.349 - 0.349 * k, 0.686 + 0.314 * k, 0.168 - 0.168 * k],
                        [0.272 - 0.272 * k, 0.534 - 0.534 * k, 0.131 + 0.869 * k],
                    ],
                    [r, g, b],
                )
            }
            Self::Saturate(s) => mat(
                [
                    [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
                    [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
                    [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
                ],
                [r, g, b],
            ),
            Self::Contrast(c) => [r, g, b].map(|v| (v - 0.5) * c + 0.5),
            Self::Brightness(k) => [r, g, b].map(|v| v * k),
        };
        out.map(|v| v.clamp(0.0, 1.0))
    }
}

fn mat(m: [[f32; 3]; 3], v: [f32; 3]) -> [f32; 3] {
    m.map(|row| row[0] * v[0] + row[1] * v[1] + row[2] * v[2])
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, amount) = match *self {
            Self::Grayscale(a) => ("grayscale", a),
            Self::Sepia(a) => ("sepia", a),
            Self::Contrast(a) => ("contrast", a),
            Self::Brightness(a) => ("brightness", a),
            Self::Saturate(a) => ("saturate", a),
        };
        write!(f, "{name}({}%)", (amount * 100.0).round() as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn one_pixel(rgb: [u8; 3]) -> RgbaImage {
        RgbaImage::from_pixel(1, 1, Rgba([rgb[0], rgb[1], rgb[2], 255]))
    }

    #[test]
    fn every_treatment_has_one_description() {
        assert_eq!(Treatment::Color.describe(), "none");
        assert_eq!(
            Treatment::BlackAndWhite.describe(),
            "grayscale(100%) contrast(120%)"
        );
        assert_eq!(
            Treatment::Sepia.describe(),
            "sepia(80%) contrast(110%) brightness(90%)"
        );
        assert_eq!(
            Treatment::Grainy.describe(),
            "contrast(100%) brightness(80%) saturate(120%)"
        );
    }

    #[test]
    fn unknown_identifier_falls_back_to_identity() {
        let t = Treatment::from_id("vaporwave");
        assert_eq!(t, Treatment::Color);
        assert!(t.is_identity());
    }

    #[test]
    fn identifiers_roundtrip() {
        for t in Treatment::ALL {
            assert_eq!(Treatment::from_id(t.as_id()), t);
        }
        assert_eq!(Treatment::from_id("bw"), Treatment::BlackAndWhite);
    }

    #[test]
    fn default_is_sepia() {
        assert_eq!(Treatment::default(), Treatment::Sepia);
    }

    #[test]
    fn serde_uses_identifiers_and_falls_back() {
        let json = serde_json::to_string(&Treatment::BlackAndWhite).unwrap();
        assert_eq!(json, "\"blackAndWhite\"");
        let parsed: Treatment = serde_json::from_str("\"grainy\"").unwrap();
        assert_eq!(parsed, Treatment::Grainy);
        let unknown: Treatment = serde_json::from_str("\"polaroid\"").unwrap();
        assert_eq!(unknown, Treatment::Color);
    }

    #[test]
    fn color_leaves_pixels_untouched() {
        let mut img = one_pixel([12, 200, 99]);
        Treatment::Color.apply(&mut img);
        assert_eq!(img.get_pixel(0, 0).0, [12, 200, 99, 255]);
    }

    #[test]
    fn black_and_white_equalises_channels() {
        let mut img = one_pixel([200, 40, 90]);
        Treatment::BlackAndWhite.apply(&mut img);
        let [r, g, b, a] = img.get_pixel(0, 0).0;
        assert!(r.abs_diff(g) <= 1 && g.abs_diff(b) <= 1, "got {r},{g},{b}");
        assert_eq!(a, 255);
    }

    #[test]
    fn black_and_white_stretches_contrast() {
        let mut dark = one_pixel([60, 60, 60]);
        Treatment::BlackAndWhite.apply(&mut dark);
        assert!(dark.get_pixel(0, 0)[0] < 60);

        let mut light = one_pixel([200, 200, 200]);
        Treatment::BlackAndWhite.apply(&mut light);
        assert!(light.get_pixel(0, 0)[0] > 200);
    }

    #[test]
    fn sepia_warms_neutral_grey() {
        let mut img = one_pixel([128, 128, 128]);
        Treatment::Sepia.apply(&mut img);
        let [r, g, b, _] = img.get_pixel(0, 0).0;
        assert!(r > g && g > b, "got {r},{g},{b}");
    }

    #[test]
    fn grainy_darkens() {
        let mut img = one_pixel([100, 150, 200]);
        Treatment::Grainy.apply(&mut img);
        let [r, g, b, _] = img.get_pixel(0, 0).0;
        let before = 100u32 + 150 + 200;
        assert!(u32::from(r) + u32::from(g) + u32::from(b) < before);
    }

    #[test]
    fn contrast_keeps_midpoint() {
        let out = FilterOp::Contrast(1.5).apply([0.5, 0.5, 0.5]);
        assert_eq!(out, [0.5, 0.5, 0.5]);
    }

    #[test]
    fn filters_clamp_to_unit_range() {
        let out = FilterOp::Brightness(3.0).apply([0.9, 0.1, 0.5]);
        assert_eq!(out[0], 1.0);
        assert!((out[1] - 0.3).abs() < 1e-6);
        assert_eq!(out[2], 1.0);
    }

    #[test]
    fn treatment_is_pure() {
        let mut a = one_pixel([10, 120, 240]);
        let mut b = one_pixel([10, 120, 240]);
        Treatment::Sepia.apply(&mut a);
        Treatment::Sepia.apply(&mut b);
        assert_eq!(a, b);
    }
}

use eframe::egui::Color32;
use palette::{LinSrgb, Mix, Srgb};

use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// Sequential colour maps
// ---------------------------------------------------------------------------

/// Anchor colours sampled evenly from the matplotlib maps of the same name.
const YLGNBU: &[[u8; 3]] = &[
    [255, 255, 217],
    [237, 248, 177],
    [199, 233, 180],
    [127, 205, 187],
    [65, 182, 196],
    [29, 145, 192],
    [34, 94, 168],
    [37, 52, 148],
    [8, 29, 88],
];
const YLORRD: &[[u8; 3]] = &[
    [255, 255, 204],
    [255, 237, 160],
    [254, 217, 118],
    [254, 178, 76],
    [253, 141, 60],
    [252, 78, 42],
    [227, 26, 28],
    [189, 0, 38],
    [128, 0, 38],
];
const BLUES: &[[u8; 3]] = &[
    [247, 251, 255],
    [222, 235, 247],
    [198, 219, 239],
    [158, 202, 225],
    [107, 174, 214],
    [66, 146, 198],
    [33, 113, 181],
    [8, 81, 156],
    [8, 48, 107],
];
const GREENS: &[[u8; 3]] = &[
    [247, 252, 245],
    [229, 245, 224],
    [199, 233, 192],
    [161, 217, 155],
    [116, 196, 118],
    [65, 171, 93],
    [35, 139, 69],
    [0, 109, 44],
    [0, 68, 27],
];
const VIRIDIS: &[[u8; 3]] = &[
    [68, 1, 84],
    [72, 40, 120],
    [62, 74, 137],
    [49, 104, 142],
    [38, 130, 142],
    [31, 158, 137],
    [53, 183, 121],
    [109, 205, 89],
    [180, 222, 44],
    [253, 231, 37],
];
const MAGMA: &[[u8; 3]] = &[
    [0, 0, 4],
    [28, 16, 68],
    [79, 18, 123],
    [129, 37, 129],
    [181, 54, 122],
    [229, 80, 100],
    [251, 135, 97],
    [254, 194, 135],
    [252, 253, 191],
];

const NAMED_MAPS: &[(&str, &[[u8; 3]])] = &[
    ("YlGnBu", YLGNBU),
    ("YlOrRd", YLORRD),
    ("Blues", BLUES),
    ("Greens", GREENS),
    ("viridis", VIRIDIS),
    ("magma", MAGMA),
];

/// Names accepted by [`ColorScale::by_name`] (each also with an `_r` suffix).
pub fn available_maps() -> impl Iterator<Item = &'static str> {
    NAMED_MAPS.iter().map(|(name, _)| *name)
}

// ---------------------------------------------------------------------------
// ColorScale: normalised value → Color32
// ---------------------------------------------------------------------------

/// A sequential colour map with linear interpolation between anchors.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    pub name: String,
    anchors: Vec<LinSrgb>,
}

impl ColorScale {
    /// Look up a named map. A trailing `_r` reverses it.
    pub fn by_name(name: &str) -> Result<Self> {
        let (base, reversed) = match name.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (name, false),
        };
        let stops = NAMED_MAPS
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(base))
            .map(|(_, stops)| *stops)
            .ok_or_else(|| {
                PipelineError::Config(format!(
                    "unknown colour map '{name}' (available: {})",
                    available_maps().collect::<Vec<_>>().join(", ")
                ))
            })?;

        let mut anchors: Vec<LinSrgb> = stops
            .iter()
            .map(|&[r, g, b]| Srgb::new(r, g, b).into_format::<f32>().into_linear())
            .collect();
        if reversed {
            anchors.reverse();
        }

        Ok(ColorScale {
            name: name.to_string(),
            anchors,
        })
    }

    /// Colour at position `t` in `[0, 1]`; values outside are clamped.
    pub fn sample(&self, t: f64) -> Color32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) as f32 };
        let last = self.anchors.len() - 1;
        let pos = t * last as f32;
        let lo = (pos.floor() as usize).min(last);
        let hi = (lo + 1).min(last);
        let mixed = self.anchors[lo].mix(self.anchors[hi], pos - lo as f32);
        to_color32(mixed)
    }

    /// Colour for `value` on the `[vmin, vmax]` range. A flat range maps to
    /// the middle of the scale.
    pub fn color_for(&self, value: f64, vmin: f64, vmax: f64) -> Color32 {
        let span = vmax - vmin;
        if span.abs() < f64::EPSILON {
            self.sample(0.5)
        } else {
            self.sample((value - vmin) / span)
        }
    }
}

fn to_color32(c: LinSrgb) -> Color32 {
    let rgb: Srgb<u8> = Srgb::from_linear(c);
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

/// Dark text on light cells and light text on dark cells.
pub fn text_color_on(background: Color32) -> Color32 {
    let lin: LinSrgb = Srgb::new(background.r(), background.g(), background.b())
        .into_format::<f32>()
        .into_linear();
    let luminance = 0.2126 * lin.red + 0.7152 * lin.green + 0.0722 * lin.blue;
    if luminance > 0.408 {
        Color32::from_rgb(38, 38, 38)
    } else {
        Color32::WHITE
    }
}

//! Color maps and palette mapping of scalar data.

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SliceError};
use crate::statistics::FastStatistics;

/// Width of the normalized band reserved around zero.
///
/// Non-zero data never normalizes into `(-ZERO_COLOR_ZONE, ZERO_COLOR_ZONE)`,
/// so a palette can give zero its own color.
pub const ZERO_COLOR_ZONE: f32 = 0.000_01;

/// Data within this distance of zero counts as zero for the display flags.
pub const SMALL_POSITIVE: f32 = 0.000_01;
/// Negative counterpart of [`SMALL_POSITIVE`].
pub const SMALL_NEGATIVE: f32 = -0.000_01;

/// Range of normalized values a color map covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorMapDomain {
    /// Colors span `[0, 1]`; negative values take the first color.
    #[default]
    Positive,
    /// Colors span `[-1, 1]`.
    Signed,
}

/// A color map for mapping normalized values to colors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorMap {
    /// Color map name.
    pub name: String,
    /// Color samples, evenly spaced over the domain.
    pub colors: Vec<Vec3>,
    /// Normalized range covered by `colors`.
    pub domain: ColorMapDomain,
}

impl ColorMap {
    /// Creates a color map over `[0, 1]`.
    pub fn new(name: impl Into<String>, colors: Vec<Vec3>) -> Self {
        Self {
            name: name.into(),
            colors,
            domain: ColorMapDomain::Positive,
        }
    }

    /// Creates a color map over `[-1, 1]`.
    pub fn signed(name: impl Into<String>, colors: Vec<Vec3>) -> Self {
        Self {
            domain: ColorMapDomain::Signed,
            ..Self::new(name, colors)
        }
    }

    /// Samples the color map at a normalized value.
    ///
    /// With `interpolate` off the color of the sample at or below the
    /// position is returned unchanged.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn sample(&self, t: f32, interpolate: bool) -> Vec3 {
        let t = match self.domain {
            ColorMapDomain::Positive => t.clamp(0.0, 1.0),
            ColorMapDomain::Signed => (t.clamp(-1.0, 1.0) + 1.0) * 0.5,
        };

        match self.colors.len() {
            0 => Vec3::ZERO,
            1 => self.colors[0],
            len => {
                let n = len - 1;
                let scaled = t * n as f32;
                let idx = (scaled.floor() as usize).min(n - 1);
                let frac = scaled - idx as f32;
                if interpolate {
                    self.colors[idx].lerp(self.colors[idx + 1], frac)
                } else if frac >= 1.0 {
                    self.colors[idx + 1]
                } else {
                    self.colors[idx]
                }
            }
        }
    }
}

/// Registry for managing color maps.
#[derive(Debug, Default)]
pub struct ColorMapRegistry {
    color_maps: HashMap<String, ColorMap>,
}

impl ColorMapRegistry {
    /// Creates a new color map registry with default color maps.
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register_defaults();
        registry
    }

    fn register_defaults(&mut self) {
        self.register(ColorMap::new("gray", vec![Vec3::ZERO, Vec3::ONE]));

        self.register(ColorMap::new(
            "viridis",
            vec![
                Vec3::new(0.267, 0.004, 0.329),
                Vec3::new(0.253, 0.265, 0.529),
                Vec3::new(0.163, 0.471, 0.558),
                Vec3::new(0.134, 0.658, 0.517),
                Vec3::new(0.477, 0.821, 0.318),
                Vec3::new(0.993, 0.906, 0.144),
            ],
        ));

        self.register(ColorMap::new(
            "blues",
            vec![
                Vec3::new(0.969, 0.984, 1.000),
                Vec3::new(0.776, 0.859, 0.937),
                Vec3::new(0.419, 0.682, 0.839),
                Vec3::new(0.129, 0.443, 0.710),
                Vec3::new(0.031, 0.188, 0.420),
            ],
        ));

        self.register(ColorMap::new(
            "reds",
            vec![
                Vec3::new(1.000, 0.961, 0.941),
                Vec3::new(0.988, 0.733, 0.631),
                Vec3::new(0.984, 0.416, 0.290),
                Vec3::new(0.796, 0.094, 0.114),
                Vec3::new(0.404, 0.000, 0.051),
            ],
        ));

        // Blue for negative data, red for positive.
        self.register(ColorMap::signed(
            "coolwarm",
            vec![
                Vec3::new(0.230, 0.299, 0.754),
                Vec3::new(0.552, 0.690, 0.996),
                Vec3::new(0.866, 0.866, 0.866),
                Vec3::new(0.956, 0.604, 0.486),
                Vec3::new(0.706, 0.016, 0.150),
            ],
        ));

        self.register(ColorMap::new(
            "rainbow",
            vec![
                Vec3::new(0.5, 0.0, 1.0),
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(0.0, 1.0, 1.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
            ],
        ));
    }

    /// Registers a color map, replacing any map with the same name.
    pub fn register(&mut self, color_map: ColorMap) {
        self.color_maps.insert(color_map.name.clone(), color_map);
    }

    /// Gets a color map by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ColorMap> {
        self.color_maps.get(name)
    }

    /// Gets a color map by name, failing with [`SliceError::UnknownColorMap`].
    pub fn require(&self, name: &str) -> Result<&ColorMap> {
        self.get(name)
            .ok_or_else(|| SliceError::UnknownColorMap(name.to_string()))
    }

    /// Returns all color map names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.color_maps.keys().map(String::as_str)
    }
}

/// How the data range is mapped onto the palette.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PaletteScaleMode {
    /// Full range of the non-zero data.
    AutoScale,
    /// Percentiles of the positive and negative data, each side separately.
    AutoScalePercentage {
        negative_maximum: f32,
        negative_minimum: f32,
        positive_minimum: f32,
        positive_maximum: f32,
    },
    /// Percentiles of the absolute data, mirrored to the negative side.
    AutoScaleAbsolutePercentage { minimum: f32, maximum: f32 },
    /// Fixed data values.
    UserScale {
        negative_maximum: f32,
        negative_minimum: f32,
        positive_minimum: f32,
        positive_maximum: f32,
    },
}

impl Default for PaletteScaleMode {
    fn default() -> Self {
        Self::AutoScalePercentage {
            negative_maximum: 98.0,
            negative_minimum: 2.0,
            positive_minimum: 2.0,
            positive_maximum: 98.0,
        }
    }
}

/// Threshold applied after coloring; failing samples become transparent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ThresholdTest {
    #[default]
    Off,
    /// Keep values in `[minimum, maximum]`.
    ShowInside { minimum: f32, maximum: f32 },
    /// Keep values above `maximum` or below `minimum`.
    ShowOutside { minimum: f32, maximum: f32 },
}

impl ThresholdTest {
    /// Returns true if `value` is displayed.
    #[must_use]
    pub fn passes(&self, value: f32) -> bool {
        match *self {
            Self::Off => true,
            Self::ShowInside { minimum, maximum } => value >= minimum && value <= maximum,
            Self::ShowOutside { minimum, maximum } => value > maximum || value < minimum,
        }
    }
}

/// Palette settings of one palette-mapped volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteColorMapping {
    /// Name of the color map in the registry.
    pub color_map: String,
    pub scale_mode: PaletteScaleMode,
    /// Lerp between color samples instead of stepping.
    pub interpolate: bool,
    pub display_positive: bool,
    pub display_negative: bool,
    pub display_zero: bool,
    pub threshold: ThresholdTest,
}

impl Default for PaletteColorMapping {
    fn default() -> Self {
        Self {
            color_map: "gray".to_string(),
            scale_mode: PaletteScaleMode::default(),
            interpolate: true,
            display_positive: true,
            display_negative: true,
            display_zero: false,
            threshold: ThresholdTest::Off,
        }
    }
}

impl PaletteColorMapping {
    /// Creates a mapping with the given color map and default settings.
    pub fn with_color_map(name: impl Into<String>) -> Self {
        Self {
            color_map: name.into(),
            ..Self::default()
        }
    }

    /// Data values mapped to the palette ends, as
    /// `(most_negative, least_negative, least_positive, most_positive)`.
    #[must_use]
    pub fn mapping_range(&self, statistics: &FastStatistics) -> (f32, f32, f32, f32) {
        match self.scale_mode {
            PaletteScaleMode::AutoScale => statistics.nonzero_ranges(),
            PaletteScaleMode::AutoScalePercentage {
                negative_maximum,
                negative_minimum,
                positive_minimum,
                positive_maximum,
            } => (
                statistics.negative_percentile(negative_maximum),
                statistics.negative_percentile(negative_minimum),
                statistics.positive_percentile(positive_minimum),
                statistics.positive_percentile(positive_maximum),
            ),
            PaletteScaleMode::AutoScaleAbsolutePercentage { minimum, maximum } => {
                let most = statistics.absolute_percentile(maximum);
                let least = statistics.absolute_percentile(minimum);
                (-most, -least, least, most)
            }
            PaletteScaleMode::UserScale {
                negative_maximum,
                negative_minimum,
                positive_minimum,
                positive_maximum,
            } => (
                negative_maximum,
                negative_minimum,
                positive_minimum,
                positive_maximum,
            ),
        }
    }

    /// Maps data values into `[-1, 1]`.
    ///
    /// Positive data lands in `[ZERO_COLOR_ZONE, 1]`, negative data in
    /// `[-1, -ZERO_COLOR_ZONE]` and zero (or `NaN`) at 0. A side whose range
    /// is empty saturates to its end.
    #[must_use]
    pub fn normalize(&self, statistics: &FastStatistics, values: &[f32]) -> Vec<f32> {
        let (most_neg, least_neg, least_pos, most_pos) = self.mapping_range(statistics);
        let pos_denominator = (most_pos - least_pos) / (1.0 - ZERO_COLOR_ZONE);
        let neg_denominator = (most_neg - least_neg) / (-1.0 + ZERO_COLOR_ZONE);

        values
            .iter()
            .map(|&v| {
                if v > 0.0 {
                    if pos_denominator == 0.0 {
                        1.0
                    } else {
                        ((v - least_pos) / pos_denominator + ZERO_COLOR_ZONE)
                            .clamp(ZERO_COLOR_ZONE, 1.0)
                    }
                } else if v < 0.0 {
                    if neg_denominator == 0.0 {
                        -1.0
                    } else {
                        ((v - least_neg) / neg_denominator - ZERO_COLOR_ZONE)
                            .clamp(-1.0, -ZERO_COLOR_ZONE)
                    }
                } else {
                    0.0
                }
            })
            .collect()
    }

    fn displays(&self, v: f32) -> bool {
        if v > SMALL_POSITIVE {
            self.display_positive
        } else if v < SMALL_NEGATIVE {
            self.display_negative
        } else if v.is_nan() {
            false
        } else {
            self.display_zero
        }
    }

    /// Colors data values with a color map.
    ///
    /// Normalization uses `statistics` of the whole map, so a slice gets the
    /// same colors as the full volume. Hidden values, `NaN` and values failing
    /// the threshold test come out as `[0, 0, 0, 0]`.
    #[must_use]
    pub fn colorize(
        &self,
        color_map: &ColorMap,
        statistics: &FastStatistics,
        values: &[f32],
    ) -> Vec<[u8; 4]> {
        let normalized = self.normalize(statistics, values);
        let positive_one = color_map.sample(1.0, self.interpolate);
        let negative_one = color_map.sample(-1.0, self.interpolate);

        values
            .iter()
            .zip(normalized)
            .map(|(&value, t)| {
                if !self.displays(value) || !self.threshold.passes(value) {
                    return [0; 4];
                }
                let color = if t >= 1.0 {
                    positive_one
                } else if t <= -1.0 {
                    negative_one
                } else {
                    color_map.sample(t, self.interpolate)
                };
                let [r, g, b] = color_to_bytes(color);
                [r, g, b, 255]
            })
            .collect()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn color_to_bytes(color: Vec3) -> [u8; 3] {
    let c = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
    [c.x as u8, c.y as u8, c.z as u8]
}

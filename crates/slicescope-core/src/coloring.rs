//! Turning resampled values into RGBA bytes.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::label_table::{apply_outline, LabelDrawingType, LabelTable};
use crate::palette::{ColorMapRegistry, PaletteColorMapping};
use crate::sampler::ResampledSample;
use crate::statistics::FastStatistics;

/// Values within this distance of the unit range count as normalized colors.
const UNIT_RANGE_LIMIT: f32 = 1.001;

/// Coloring of raw RGBA volumes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RgbaColoring {
    /// Voxels with any of red, green or blue below these 0..=255 values are
    /// transparent.
    pub threshold: [f32; 3],
}

impl RgbaColoring {
    /// Converts RGBA components to bytes.
    ///
    /// When every red, green and blue component of the batch lies within
    /// `[-1.001, 1.001]` the data is treated as unit range and scaled by 255.
    /// Components are made positive and clamped to 255.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn colorize(&self, components: &[[f32; 4]]) -> Vec<[u8; 4]> {
        let unit_range = components
            .iter()
            .all(|c| c[..3].iter().all(|v| v.abs() <= UNIT_RANGE_LIMIT));
        let scale = if unit_range { 255.0 } else { 1.0 };
        let to_byte = |v: f32| (v * scale).abs().min(255.0);

        components
            .iter()
            .map(|c| {
                let [r, g, b] = [to_byte(c[0]), to_byte(c[1]), to_byte(c[2])];
                let passes = r >= self.threshold[0]
                    && g >= self.threshold[1]
                    && b >= self.threshold[2];
                let a = if passes { to_byte(c[3]) } else { 0.0 };
                [r as u8, g as u8, b as u8, a as u8]
            })
            .collect()
    }
}

/// How one layer's samples become colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColoringPolicy {
    /// Continuous palette over scalar data.
    Palette(PaletteColorMapping),
    /// Integer keys looked up in a label table.
    Label {
        table: LabelTable,
        drawing: LabelDrawingType,
        /// Display tab whose label visibility applies.
        tab: usize,
    },
    /// Stored RGBA passed through.
    DirectRgba(RgbaColoring),
}

impl ColoringPolicy {
    /// Label policy with filled drawing in tab 0.
    #[must_use]
    pub fn label(table: LabelTable) -> Self {
        Self::Label {
            table,
            drawing: LabelDrawingType::Filled,
            tab: 0,
        }
    }
}

/// Everything besides the samples that coloring a batch needs.
#[derive(Debug, Clone, Copy)]
pub struct ColoringContext<'a> {
    pub color_maps: &'a ColorMapRegistry,
    /// Statistics of the whole map for palette normalization.
    pub statistics: Option<&'a FastStatistics>,
    /// Position of the layer in draw order; 0 is the underlay.
    pub layer_index: usize,
    /// `(rows, cols)` of the sample raster, needed by label outlines.
    pub raster: Option<(usize, usize)>,
    pub outline_color: [u8; 4],
    /// Color of invalid samples on the underlay.
    pub base_layer_background: [u8; 4],
}

/// Colors one layer's batch of samples.
///
/// Samples that missed the volume are transparent, except on the underlay
/// where they take `base_layer_background`. Palette batches without
/// statistics are normalized against their own values.
pub fn colorize(
    samples: &[ResampledSample],
    policy: &ColoringPolicy,
    context: &ColoringContext<'_>,
) -> Result<Vec<[u8; 4]>> {
    let mut colors = match policy {
        ColoringPolicy::Palette(mapping) => {
            let color_map = context.color_maps.require(&mapping.color_map)?;
            let values: Vec<f32> = samples.iter().map(ResampledSample::scalar).collect();
            match context.statistics {
                Some(statistics) => mapping.colorize(color_map, statistics, &values),
                None => mapping.colorize(color_map, &FastStatistics::new(&values), &values),
            }
        }
        ColoringPolicy::Label {
            table,
            drawing,
            tab,
        } => {
            let values: Vec<f32> = samples.iter().map(ResampledSample::scalar).collect();
            let mut colors = table.colorize(&values, *tab);
            if let Some((rows, cols)) = context.raster {
                apply_outline(&mut colors, rows, cols, *drawing, context.outline_color);
            }
            colors
        }
        ColoringPolicy::DirectRgba(coloring) => {
            let components: Vec<[f32; 4]> = samples
                .iter()
                .filter(|s| s.valid)
                .map(ResampledSample::rgba)
                .collect();
            let mut valid_colors = coloring.colorize(&components).into_iter();
            samples
                .iter()
                .map(|s| {
                    if s.valid {
                        valid_colors.next().unwrap_or([0; 4])
                    } else {
                        [0; 4]
                    }
                })
                .collect()
        }
    };

    for (color, sample) in colors.iter_mut().zip(samples) {
        if !sample.valid {
            *color = if context.layer_index == 0 {
                context.base_layer_background
            } else {
                [0; 4]
            };
        }
    }
    Ok(colors)
}

//! Label tables for integer-keyed volumes and the label outline pass.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Key of the label used for voxels without an assigned label.
pub const UNASSIGNED_LABEL_KEY: i32 = 0;

/// One entry of a label table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub key: i32,
    pub name: String,
    /// RGBA in 0..=1.
    pub color: [f32; 4],
}

/// Maps label keys to named colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelTable {
    labels: BTreeMap<i32, Label>,
    /// Keys hidden per display tab.
    hidden: HashMap<usize, HashSet<i32>>,
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelTable {
    /// Creates a table holding only the transparent unassigned label.
    pub fn new() -> Self {
        let mut labels = BTreeMap::new();
        labels.insert(
            UNASSIGNED_LABEL_KEY,
            Label {
                key: UNASSIGNED_LABEL_KEY,
                name: "???".to_string(),
                color: [0.0; 4],
            },
        );
        Self {
            labels,
            hidden: HashMap::new(),
        }
    }

    /// Adds or replaces a label.
    pub fn insert(&mut self, key: i32, name: impl Into<String>, color: [f32; 4]) {
        self.labels.insert(
            key,
            Label {
                key,
                name: name.into(),
                color,
            },
        );
    }

    /// Builder form of [`LabelTable::insert`].
    #[must_use]
    pub fn with_label(mut self, key: i32, name: impl Into<String>, color: [f32; 4]) -> Self {
        self.insert(key, name, color);
        self
    }

    #[must_use]
    pub fn get(&self, key: i32) -> Option<&Label> {
        self.labels.get(&key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Shows or hides a label in one display tab.
    pub fn set_label_visible(&mut self, tab: usize, key: i32, visible: bool) {
        let hidden = self.hidden.entry(tab).or_default();
        if visible {
            hidden.remove(&key);
        } else {
            hidden.insert(key);
        }
    }

    #[must_use]
    pub fn is_label_visible(&self, tab: usize, key: i32) -> bool {
        self.hidden.get(&tab).map_or(true, |keys| !keys.contains(&key))
    }

    /// Color of a key in a tab; unknown and hidden keys are transparent.
    #[must_use]
    pub fn color_bytes(&self, key: i32, tab: usize) -> [u8; 4] {
        if !self.is_label_visible(tab, key) {
            return [0; 4];
        }
        self.labels
            .get(&key)
            .map_or([0; 4], |label| rgba_to_bytes(label.color))
    }

    /// Colors a raster of label keys.
    ///
    /// Values are rounded to the nearest key; `NaN` is transparent.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn colorize(&self, values: &[f32], tab: usize) -> Vec<[u8; 4]> {
        values
            .iter()
            .map(|&v| {
                if v.is_finite() {
                    self.color_bytes(v.round() as i32, tab)
                } else {
                    [0; 4]
                }
            })
            .collect()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn rgba_to_bytes(color: [f32; 4]) -> [u8; 4] {
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

/// How labelled pixels are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LabelDrawingType {
    /// Every pixel keeps its label color.
    #[default]
    Filled,
    /// Boundary pixels take the outline color, the rest keep the label color.
    FilledWithOutlineColor,
    /// Only boundary pixels are drawn, in the outline color.
    OutlineColor,
    /// Only boundary pixels are drawn, in the label color.
    OutlineLabelColor,
}

/// Applies a label drawing type to a `rows x cols` raster stored row-major.
///
/// A pixel is on a boundary when one of its in-bounds 8-neighbours has a
/// different color. Transparent pixels are left alone. Rasters whose length
/// does not match `rows * cols` are left unchanged.
///
/// Boundaries are symmetric: where two visible labels meet, pixels on both
/// sides are outlined. A region only looks like a lone outline over a
/// transparent background when its surroundings are unassigned or hidden.
pub fn apply_outline(
    rgba: &mut [[u8; 4]],
    rows: usize,
    cols: usize,
    drawing: LabelDrawingType,
    outline_color: [u8; 4],
) {
    if drawing == LabelDrawingType::Filled || rows * cols != rgba.len() {
        return;
    }

    let boundary: Vec<bool> = (0..rows * cols)
        .map(|index| rgba[index][3] > 0 && is_boundary(rgba, rows, cols, index))
        .collect();

    for (pixel, on_boundary) in rgba.iter_mut().zip(boundary) {
        if pixel[3] == 0 {
            continue;
        }
        match (drawing, on_boundary) {
            (LabelDrawingType::FilledWithOutlineColor | LabelDrawingType::OutlineColor, true) => {
                *pixel = outline_color;
            }
            (LabelDrawingType::OutlineColor | LabelDrawingType::OutlineLabelColor, false) => {
                pixel[3] = 0;
            }
            _ => {}
        }
    }
}

fn is_boundary(rgba: &[[u8; 4]], rows: usize, cols: usize, index: usize) -> bool {
    let (row, col) = (index / cols, index % cols);
    let center = rgba[index];
    let mut row_range = row.saturating_sub(1)..=(row + 1).min(rows - 1);
    row_range.any(|r| {
        (col.saturating_sub(1)..=(col + 1).min(cols - 1))
            .any(|c| (r, c) != (row, col) && rgba[r * cols + c] != center)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const B: i32 = 7;

    fn block_table() -> LabelTable {
        LabelTable::new().with_label(B, "block", [1.0, 0.0, 0.0, 1.0])
    }

    /// 4x4 raster of the unassigned label with a 2x2 block of `B` in the middle.
    fn block_raster(table: &LabelTable) -> Vec<[u8; 4]> {
        let mut keys = [0.0f32; 16];
        for (r, c) in [(1, 1), (1, 2), (2, 1), (2, 2)] {
            keys[r * 4 + c] = B as f32;
        }
        table.colorize(&keys, 0)
    }

    #[test]
    fn test_unassigned_is_transparent() {
        let table = LabelTable::new();
        assert_eq!(table.color_bytes(UNASSIGNED_LABEL_KEY, 0), [0; 4]);
        assert_eq!(table.colorize(&[f32::NAN, 99.0], 0), vec![[0; 4]; 2]);
    }

    #[test]
    fn test_tab_visibility() {
        let mut table = block_table();
        table.set_label_visible(1, B, false);
        assert_eq!(table.color_bytes(B, 0), [255, 0, 0, 255]);
        assert_eq!(table.color_bytes(B, 1), [0; 4]);
        table.set_label_visible(1, B, true);
        assert!(table.is_label_visible(1, B));
    }

    #[test]
    fn test_outline_of_block() {
        let table = block_table();
        let mut raster = block_raster(&table);
        apply_outline(&mut raster, 4, 4, LabelDrawingType::OutlineLabelColor, [0, 0, 0, 255]);
        for (index, pixel) in raster.iter().enumerate() {
            let (r, c) = (index / 4, index % 4);
            let in_block = (1..=2).contains(&r) && (1..=2).contains(&c);
            if in_block {
                assert_eq!(*pixel, [255, 0, 0, 255], "pixel {r},{c}");
            } else {
                assert_eq!(pixel[3], 0, "pixel {r},{c}");
            }
        }
    }

    #[test]
    fn test_outline_between_visible_labels_marks_both_sides() {
        let table = block_table().with_label(1, "surround", [0.0, 0.0, 1.0, 1.0]);
        let keys: Vec<f32> = block_raster(&block_table())
            .iter()
            .map(|pixel| if pixel[3] == 0 { 1.0 } else { B as f32 })
            .collect();

        // Every surrounding pixel touches the block, so all keep their color.
        let mut raster = table.colorize(&keys, 0);
        let filled = raster.clone();
        apply_outline(&mut raster, 4, 4, LabelDrawingType::OutlineLabelColor, [0, 0, 0, 255]);
        assert_eq!(raster, filled);
        assert_eq!(raster[0], [0, 0, 255, 255]);

        let mut raster = table.colorize(&keys, 0);
        apply_outline(&mut raster, 4, 4, LabelDrawingType::OutlineColor, [9, 9, 9, 255]);
        assert!(raster.iter().all(|pixel| *pixel == [9, 9, 9, 255]));
    }

    #[test]
    fn test_outline_interior_is_cleared() {
        let table = LabelTable::new().with_label(1, "all", [0.0, 1.0, 0.0, 1.0]);
        let mut raster = table.colorize(&[1.0; 9], 0);
        raster[0] = [0; 4];
        apply_outline(&mut raster, 3, 3, LabelDrawingType::OutlineColor, [9, 9, 9, 255]);
        // Center touches the cleared corner, (2, 2) does not.
        assert_eq!(raster[4], [9, 9, 9, 255]);
        assert_eq!(raster[8][3], 0);
    }

    #[test]
    fn test_filled_with_outline_color() {
        let table = block_table();
        let mut raster = block_raster(&table);
        apply_outline(
            &mut raster,
            4,
            4,
            LabelDrawingType::FilledWithOutlineColor,
            [1, 2, 3, 255],
        );
        assert_eq!(raster[5], [1, 2, 3, 255]);
        assert_eq!(raster[0], [0; 4]);
    }

    #[test]
    fn test_mismatched_raster_is_untouched() {
        let table = block_table();
        let mut raster = block_raster(&table);
        let before = raster.clone();
        apply_outline(&mut raster, 3, 4, LabelDrawingType::OutlineColor, [0; 4]);
        assert_eq!(raster, before);
    }
}

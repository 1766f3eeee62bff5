//! Picking ids for identifying the voxel under a screen pixel.
//!
//! In picking mode every drawn primitive carries a color that encodes a
//! sequential id instead of its data color. Reading back the pixel under the
//! mouse and decoding its color yields the entry registered for that id.

use glam::IVec3;
use serde::{Deserialize, Serialize};

/// Largest id that fits in the 24 color bits.
pub const MAX_PICK_ID: u32 = 0x00FF_FFFF;

/// Encodes an index into an RGB color.
///
/// - R contains bits 16-23
/// - G contains bits 8-15
/// - B contains bits 0-7
#[must_use]
pub fn index_to_color(index: u32) -> [u8; 3] {
    let [_, r, g, b] = index.to_be_bytes();
    [r, g, b]
}

/// Decodes a pick color back to an index.
#[must_use]
pub fn color_to_index(r: u8, g: u8, b: u8) -> u32 {
    (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

/// Whether draw calls emit data colors or picking ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PickingMode {
    #[default]
    Normal,
    Picking,
}

/// Id handed out for one picking entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PickId(pub u32);

impl PickId {
    /// Opaque RGBA color encoding this id.
    #[must_use]
    pub fn color(self) -> [u8; 4] {
        let [r, g, b] = index_to_color(self.0);
        [r, g, b, 255]
    }
}

/// What a picking id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PickingEntry {
    /// Position of the layer in draw order.
    pub volume_index: usize,
    pub map_index: usize,
    pub ijk: IVec3,
}

/// Id table filled while drawing in picking mode.
#[derive(Debug, Clone, Default)]
pub struct PickingTable {
    mode: PickingMode,
    entries: Vec<PickingEntry>,
}

impl PickingTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mode(&self) -> PickingMode {
        self.mode
    }

    #[must_use]
    pub fn is_picking(&self) -> bool {
        self.mode == PickingMode::Picking
    }

    /// Clears the table, reserves room for `capacity` entries and switches
    /// to picking mode.
    pub fn begin(&mut self, capacity: usize) {
        self.entries.clear();
        self.entries
            .reserve(capacity.min(MAX_PICK_ID as usize + 1));
        self.mode = PickingMode::Picking;
    }

    /// Returns to normal mode. Entries stay available for decoding.
    pub fn end(&mut self) {
        self.mode = PickingMode::Normal;
    }

    /// Registers a voxel and returns its id.
    ///
    /// Returns `None` in normal mode and once all 24-bit ids are used.
    pub fn add_entry(&mut self, volume_index: usize, map_index: usize, ijk: IVec3) -> Option<PickId> {
        if !self.is_picking() {
            return None;
        }
        let id = u32::try_from(self.entries.len())
            .ok()
            .filter(|&id| id <= MAX_PICK_ID);
        let Some(id) = id else {
            log::warn!("picking table full, voxel {ijk} of layer {volume_index} not pickable");
            return None;
        };
        self.entries.push(PickingEntry {
            volume_index,
            map_index,
            ijk,
        });
        Some(PickId(id))
    }

    /// Looks up the entry encoded in a read-back pixel.
    ///
    /// Pixels that are not fully opaque were not written by a pick primitive.
    #[must_use]
    pub fn decode_pixel(&self, rgba: [u8; 4]) -> Option<&PickingEntry> {
        if rgba[3] != 255 {
            return None;
        }
        let id = color_to_index(rgba[0], rgba[1], rgba[2]);
        self.entries.get(id as usize)
    }

    #[must_use]
    pub fn entry(&self, id: PickId) -> Option<&PickingEntry> {
        self.entries.get(id.0 as usize)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Keeps the hit closest to the viewer.
#[derive(Debug, Clone)]
pub struct NearestPick<T> {
    best: Option<(f32, T)>,
}

impl<T> Default for NearestPick<T> {
    fn default() -> Self {
        Self { best: None }
    }
}

impl<T> NearestPick<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers a hit at `depth`; smaller depths are nearer. Ties keep the
    /// earlier hit.
    pub fn offer(&mut self, depth: f32, item: T) {
        if depth.is_nan() {
            return;
        }
        if self.best.as_ref().map_or(true, |(d, _)| depth < *d) {
            self.best = Some((depth, item));
        }
    }

    #[must_use]
    pub fn depth(&self) -> Option<f32> {
        self.best.as_ref().map(|(d, _)| *d)
    }

    pub fn into_inner(self) -> Option<T> {
        self.best.map(|(_, item)| item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_specific_colors() {
        assert_eq!(index_to_color(0), [0, 0, 0]);
        assert_eq!(index_to_color(1), [0, 0, 1]);
        assert_eq!(index_to_color(256), [0, 1, 0]);
        assert_eq!(index_to_color(0xFF0000), [255, 0, 0]);
        assert_eq!(PickId(0x010203).color(), [1, 2, 3, 255]);
    }

    #[test]
    fn test_table_lifecycle() {
        let mut table = PickingTable::new();
        assert!(table.add_entry(0, 0, IVec3::ZERO).is_none());

        table.begin(16);
        let a = table.add_entry(0, 0, IVec3::new(1, 2, 3)).unwrap();
        let b = table.add_entry(1, 2, IVec3::new(4, 5, 6)).unwrap();
        assert_ne!(a, b);
        table.end();
        assert_eq!(table.mode(), PickingMode::Normal);

        let entry = table.decode_pixel(b.color()).unwrap();
        assert_eq!(entry.volume_index, 1);
        assert_eq!(entry.map_index, 2);
        assert_eq!(entry.ijk, IVec3::new(4, 5, 6));

        table.begin(4);
        assert!(table.is_empty());
    }

    #[test]
    fn test_decode_rejects_non_pick_pixels() {
        let mut table = PickingTable::new();
        table.begin(1);
        let id = table.add_entry(0, 0, IVec3::ZERO).unwrap();
        let mut color = id.color();
        color[3] = 128;
        assert!(table.decode_pixel(color).is_none());
        assert!(table.decode_pixel([9, 9, 9, 255]).is_none());
    }

    #[test]
    fn test_nearest_pick() {
        let mut nearest = NearestPick::new();
        nearest.offer(0.5, "far");
        nearest.offer(-0.25, "near");
        nearest.offer(-0.25, "tie");
        nearest.offer(f32::NAN, "nan");
        assert_eq!(nearest.depth(), Some(-0.25));
        assert_eq!(nearest.into_inner(), Some("near"));
    }

    proptest! {
        #[test]
        fn prop_color_round_trip(index in 0u32..=MAX_PICK_ID) {
            let [r, g, b] = index_to_color(index);
            prop_assert_eq!(color_to_index(r, g, b), index);
        }

        #[test]
        fn prop_entries_round_trip(ijks in proptest::collection::vec((0i32..512, 0i32..512, 0i32..512), 1..64)) {
            let mut table = PickingTable::new();
            table.begin(ijks.len());
            let ids: Vec<PickId> = ijks
                .iter()
                .map(|&(i, j, k)| table.add_entry(0, 0, IVec3::new(i, j, k)).unwrap())
                .collect();
            for (id, &(i, j, k)) in ids.iter().zip(&ijks) {
                let entry = table.decode_pixel(id.color()).unwrap();
                prop_assert_eq!(entry.ijk, IVec3::new(i, j, k));
            }
        }
    }
}

//! Slice view enumerations.
//!
//! Each enum carries its metadata (identifier, display name, integer code) in a
//! constant table indexed by the enum's ordinal, so lookups in either
//! direction need no runtime initialization.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Metadata for one enum value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumInfo {
    /// Stable identifier, used in config files.
    pub name: &'static str,
    /// Short name for display.
    pub gui_name: &'static str,
    /// Integer code.
    pub code: u32,
}

/// Shared lookup behaviour for enums backed by an [`EnumInfo`] table.
pub trait EnumTable: Sized + Copy + 'static {
    /// Metadata, in ordinal order.
    const INFO: &'static [EnumInfo];
    /// All values, in ordinal order.
    const VALUES: &'static [Self];

    /// Position of this value in [`Self::INFO`].
    fn ordinal(self) -> usize;

    /// Returns the stable identifier.
    #[must_use]
    fn name(self) -> &'static str {
        Self::INFO[self.ordinal()].name
    }

    /// Returns the display name.
    #[must_use]
    fn gui_name(self) -> &'static str {
        Self::INFO[self.ordinal()].gui_name
    }

    /// Returns the integer code.
    #[must_use]
    fn code(self) -> u32 {
        Self::INFO[self.ordinal()].code
    }

    /// Looks up a value by its stable identifier.
    #[must_use]
    fn from_name(name: &str) -> Option<Self> {
        Self::INFO
            .iter()
            .position(|info| info.name == name)
            .map(|i| Self::VALUES[i])
    }

    /// Looks up a value by its integer code.
    #[must_use]
    fn from_code(code: u32) -> Option<Self> {
        Self::INFO
            .iter()
            .position(|info| info.code == code)
            .map(|i| Self::VALUES[i])
    }
}

/// Plane a slice is viewed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SliceViewPlane {
    /// Parasagittal, coronal and axial side by side.
    All,
    /// Constant X.
    Parasagittal,
    /// Constant Y.
    Coronal,
    /// Constant Z.
    #[default]
    Axial,
}

const SLICE_VIEW_PLANE_INFO: [EnumInfo; 4] = [
    EnumInfo {
        name: "ALL",
        gui_name: "All",
        code: 0,
    },
    EnumInfo {
        name: "PARASAGITTAL",
        gui_name: "P",
        code: 1,
    },
    EnumInfo {
        name: "CORONAL",
        gui_name: "C",
        code: 2,
    },
    EnumInfo {
        name: "AXIAL",
        gui_name: "A",
        code: 3,
    },
];

impl EnumTable for SliceViewPlane {
    const INFO: &'static [EnumInfo] = &SLICE_VIEW_PLANE_INFO;
    const VALUES: &'static [Self] = &[
        SliceViewPlane::All,
        SliceViewPlane::Parasagittal,
        SliceViewPlane::Coronal,
        SliceViewPlane::Axial,
    ];

    fn ordinal(self) -> usize {
        self as usize
    }
}

impl SliceViewPlane {
    /// The three planes drawn in the `All` view, left to right.
    pub const PANELS: [SliceViewPlane; 3] = [
        SliceViewPlane::Parasagittal,
        SliceViewPlane::Coronal,
        SliceViewPlane::Axial,
    ];

    /// Resolves `All` to the plane used when a single plane is required.
    #[must_use]
    pub fn resolved(self) -> Self {
        match self {
            SliceViewPlane::All => SliceViewPlane::Axial,
            other => other,
        }
    }

    /// Index of the world/voxel axis held constant by this plane.
    #[must_use]
    pub fn axis(self) -> usize {
        match self.resolved() {
            SliceViewPlane::Parasagittal => 0,
            SliceViewPlane::Coronal => 1,
            _ => 2,
        }
    }

    /// Unit normal of the plane before any oblique rotation.
    #[must_use]
    pub fn normal(self) -> Vec3 {
        match self.resolved() {
            SliceViewPlane::Parasagittal => Vec3::NEG_X,
            SliceViewPlane::Coronal => Vec3::NEG_Y,
            _ => Vec3::Z,
        }
    }

    /// Screen up direction before any oblique rotation.
    #[must_use]
    pub fn up(self) -> Vec3 {
        match self.resolved() {
            SliceViewPlane::Axial => Vec3::Y,
            _ => Vec3::Z,
        }
    }

    /// World axes running along screen X and screen Y.
    #[must_use]
    pub fn screen_axes(self) -> (usize, usize) {
        match self.resolved() {
            SliceViewPlane::Parasagittal => (1, 2),
            SliceViewPlane::Coronal => (0, 2),
            _ => (0, 1),
        }
    }
}

/// Whether slices are axis-aligned or freely rotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SliceProjection {
    /// Axis-aligned slices.
    #[default]
    Orthogonal,
    /// Slices rotated by the oblique rotation matrix.
    Oblique,
}

const SLICE_PROJECTION_INFO: [EnumInfo; 2] = [
    EnumInfo {
        name: "ORTHOGONAL",
        gui_name: "Orthogonal",
        code: 0,
    },
    EnumInfo {
        name: "OBLIQUE",
        gui_name: "Oblique",
        code: 1,
    },
];

impl EnumTable for SliceProjection {
    const INFO: &'static [EnumInfo] = &SLICE_PROJECTION_INFO;
    const VALUES: &'static [Self] = &[SliceProjection::Orthogonal, SliceProjection::Oblique];

    fn ordinal(self) -> usize {
        self as usize
    }
}

/// Single slice or a montage grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SliceDrawingType {
    /// One slice per plane.
    #[default]
    Single,
    /// A grid of parallel slices.
    Montage,
}

const SLICE_DRAWING_TYPE_INFO: [EnumInfo; 2] = [
    EnumInfo {
        name: "SINGLE",
        gui_name: "Single",
        code: 0,
    },
    EnumInfo {
        name: "MONTAGE",
        gui_name: "Montage",
        code: 1,
    },
];

impl EnumTable for SliceDrawingType {
    const INFO: &'static [EnumInfo] = &SLICE_DRAWING_TYPE_INFO;
    const VALUES: &'static [Self] = &[SliceDrawingType::Single, SliceDrawingType::Montage];

    fn ordinal(self) -> usize {
        self as usize
    }
}

/// How voxels reach the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DrawPath {
    /// One colored quad per resampled voxel.
    #[default]
    Voxels,
    /// One textured quad per layer, sampled from a 3D volume texture.
    Texture,
}

const DRAW_PATH_INFO: [EnumInfo; 2] = [
    EnumInfo {
        name: "VOXELS",
        gui_name: "Voxels",
        code: 0,
    },
    EnumInfo {
        name: "TEXTURE",
        gui_name: "Texture",
        code: 1,
    },
];

impl EnumTable for DrawPath {
    const INFO: &'static [EnumInfo] = &DRAW_PATH_INFO;
    const VALUES: &'static [Self] = &[DrawPath::Voxels, DrawPath::Texture];

    fn ordinal(self) -> usize {
        self as usize
    }
}

//! Viewport layout for montage and three-plane views.

use serde::{Deserialize, Serialize};

use super::bounds::Viewport;
use super::view::SliceViewPlane;

/// One cell of a montage grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MontageCell {
    /// Row in reading order (0 is the top row).
    pub row: u32,
    /// Column, left to right.
    pub col: u32,
    /// Device rectangle of the cell.
    pub viewport: Viewport,
    /// Slice index drawn in the cell.
    pub slice_index: i64,
}

/// Computes the cells of a montage grid.
///
/// Cells are filled bottom row first, left to right within a row. The cell at
/// fill position `n` shows slice `selected_index - (rows * cols / 2) * slice_step
/// + n * slice_step`, so the center of an odd grid holds the selected slice.
/// Cells whose slice lies outside `[0, dimension)` are left out; the other
/// cells keep their positions.
#[must_use]
pub fn compute_montage_layout(
    viewport: Viewport,
    rows: u32,
    cols: u32,
    margin_px: i32,
    selected_index: i64,
    slice_step: i64,
    dimension: i64,
) -> Vec<MontageCell> {
    if !viewport.is_valid() || rows == 0 || cols == 0 || dimension <= 0 {
        return Vec::new();
    }

    let margin = margin_px.max(0);
    let (Ok(n_rows), Ok(n_cols)) = (i32::try_from(rows), i32::try_from(cols)) else {
        return Vec::new();
    };
    let cell_size = |length: i32, count: i32| {
        margin
            .checked_mul(count - 1)
            .and_then(|gap| length.checked_sub(gap))
            .map(|free| free / count)
    };
    let (Some(cell_width), Some(cell_height)) =
        (cell_size(viewport.width, n_cols), cell_size(viewport.height, n_rows))
    else {
        log::debug!("montage margin {margin} overflows viewport {viewport:?}");
        return Vec::new();
    };
    if cell_width <= 0 || cell_height <= 0 {
        log::debug!("montage {rows}x{cols} does not fit viewport {viewport:?}");
        return Vec::new();
    }

    let step = slice_step.max(1);
    let half_count = i64::from(rows) * i64::from(cols) / 2;
    let Some(first_index) = half_count
        .checked_mul(step)
        .and_then(|offset| selected_index.checked_sub(offset))
    else {
        log::debug!("montage step {step} overflows around slice {selected_index}");
        return Vec::new();
    };

    let capacity = usize::try_from(rows)
        .ok()
        .zip(usize::try_from(cols).ok())
        .and_then(|(r, c)| r.checked_mul(c))
        .unwrap_or(0);
    let mut cells = Vec::with_capacity(capacity);
    let mut fill_position: i64 = 0;
    for row_from_bottom in 0..n_rows {
        for col in 0..n_cols {
            let slice_index = fill_position
                .checked_mul(step)
                .and_then(|offset| first_index.checked_add(offset));
            fill_position += 1;
            let Some(slice_index) = slice_index.filter(|i| (0..dimension).contains(i)) else {
                continue;
            };
            cells.push(MontageCell {
                row: (n_rows - row_from_bottom - 1).unsigned_abs(),
                col: col.unsigned_abs(),
                viewport: Viewport::new(
                    viewport.x + col * (cell_width + margin),
                    viewport.y + row_from_bottom * (cell_height + margin),
                    cell_width,
                    cell_height,
                ),
                slice_index,
            });
        }
    }
    cells
}

/// Arrangement of the three panels of the `All` view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AllViewLayout {
    /// Two by two grid: parasagittal and coronal on top, axial bottom left.
    #[default]
    Grid,
    /// One row, left to right.
    Row,
    /// One column, top to bottom.
    Column,
}

/// Splits a viewport into the parasagittal, coronal and axial panels.
#[must_use]
pub fn three_panel_layout(viewport: Viewport, layout: AllViewLayout) -> [(SliceViewPlane, Viewport); 3] {
    let [p, c, a] = SliceViewPlane::PANELS;
    let Viewport {
        x,
        y,
        width,
        height,
    } = viewport;
    match layout {
        AllViewLayout::Grid => {
            let w = width / 2;
            let h = height / 2;
            [
                (p, Viewport::new(x, y + h, w, height - h)),
                (c, Viewport::new(x + w, y + h, width - w, height - h)),
                (a, Viewport::new(x, y, w, h)),
            ]
        }
        AllViewLayout::Row => {
            let w = width / 3;
            [
                (p, Viewport::new(x, y, w, height)),
                (c, Viewport::new(x + w, y, w, height)),
                (a, Viewport::new(x + 2 * w, y, width - 2 * w, height)),
            ]
        }
        AllViewLayout::Column => {
            let h = height / 3;
            [
                (p, Viewport::new(x, y + 2 * h, width, height - 2 * h)),
                (c, Viewport::new(x, y + h, width, h)),
                (a, Viewport::new(x, y, width, h)),
            ]
        }
    }
}

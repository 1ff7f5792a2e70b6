use serde::{Deserialize, Serialize};

use crate::capture::sequencer::SHOT_COUNT;

/// Bottom edge of the header block (title and date lines).
///
/// The date baseline sits at y=62 in a 16 px face; its descenders end here.
pub const HEADER_TEXT_BOTTOM: u32 = 66;

/// Largest canvas side the compositor will allocate.
pub const MAX_CANVAS_SIDE: u32 = 16_384;

/// Fixed geometry of a memory strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct StripLayout {
    pub photo_width: u32,
    pub photo_height: u32,
    pub padding_x: u32,
    pub padding_top: u32,
    pub padding_bottom: u32,
    pub gap: u32,
}

impl Default for StripLayout {
    fn default() -> Self {
        Self {
            photo_width: 380,
            photo_height: 280,
            padding_x: 30,
            padding_top: 70,
            padding_bottom: 70,
            gap: 30,
        }
    }
}

/// Placement of one photo cell. `index` is 1-based, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRect {
    pub index: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CellRect {
    /// Right-aligned anchor for the `#i` label: 18 px in from the canvas
    /// edge, 22 px below the cell top.
    pub fn label_anchor(&self, canvas_width: u32) -> (u32, u32) {
        (canvas_width.saturating_sub(18), self.y.saturating_add(22))
    }

    pub fn label(&self) -> String {
        format!("#{}", self.index)
    }
}

/// Canvas size and cell placements derived from a [`StripLayout`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeLayout {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub cells: Vec<CellRect>,
}

impl StripLayout {
    /// Lay out `count` photos in one column.
    ///
    /// Sizes saturate at `u32::MAX`; [`validate`](Self::validate) rejects
    /// geometry that would get there.
    pub fn compute(&self, count: usize) -> CompositeLayout {
        let n = u32::try_from(count).unwrap_or(u32::MAX);
        let (canvas_width, canvas_height) = self
            .canvas_size(count)
            .unwrap_or((u32::MAX, u32::MAX));
        let pitch = self.photo_height.saturating_add(self.gap);

        let cells = (0..n)
            .map(|i| CellRect {
                index: i as usize + 1,
                x: self.padding_x,
                y: self.padding_top.saturating_add(i.saturating_mul(pitch)),
                width: self.photo_width,
                height: self.photo_height,
            })
            .collect();

        CompositeLayout {
            canvas_width,
            canvas_height,
            cells,
        }
    }

    /// Canvas width and height for `count` photos, or `None` on overflow.
    pub fn canvas_size(&self, count: usize) -> Option<(u32, u32)> {
        let n = u32::try_from(count).ok()?;
        let width = self
            .padding_x
            .checked_mul(2)?
            .checked_add(self.photo_width)?;
        let height = self
            .padding_top
            .checked_add(self.padding_bottom)?
            .checked_add(n.checked_mul(self.photo_height)?)?
            .checked_add(n.saturating_sub(1).checked_mul(self.gap)?)?;
        Some((width, height))
    }

    /// Check that the geometry can hold photos, clears the header text and
    /// fits a canvas of at most [`MAX_CANVAS_SIDE`] per side.
    pub fn validate(&self) -> Result<(), String> {
        if self.photo_width == 0 || self.photo_height == 0 {
            return Err("photo dimensions must be non-zero".to_string());
        }
        match self.canvas_size(SHOT_COUNT) {
            Some((w, h)) if w <= MAX_CANVAS_SIDE && h <= MAX_CANVAS_SIDE => {}
            _ => {
                return Err(format!(
                    "strip canvas would exceed {MAX_CANVAS_SIDE} px per side"
                ))
            }
        }
        if self.padding_top <= HEADER_TEXT_BOTTOM {
            return Err(format!(
                "padding_top {} must exceed the header block ({HEADER_TEXT_BOTTOM} px)",
                self.padding_top
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_three_photo_strip_is_440_by_1040() {
        let layout = StripLayout::default().compute(3);
        assert_eq!(layout.canvas_width, 440);
        assert_eq!(layout.canvas_height, 1040);
    }

    #[test]
    fn cells_are_stacked_top_to_bottom() {
        let layout = StripLayout::default().compute(3);
        let ys: Vec<u32> = layout.cells.iter().map(|c| c.y).collect();
        assert_eq!(ys, vec![70, 380, 690]);
        assert!(layout.cells.iter().all(|c| c.x == 30));
        assert!(layout
            .cells
            .iter()
            .all(|c| c.width == 380 && c.height == 280));
        let indices: Vec<usize> = layout.cells.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn layout_is_idempotent() {
        let layout = StripLayout::default();
        assert_eq!(layout.compute(3), layout.compute(3));
    }

    #[test]
    fn last_cell_leaves_bottom_padding() {
        let layout = StripLayout::default().compute(3);
        let last = layout.cells.last().unwrap();
        assert_eq!(layout.canvas_height - (last.y + last.height), 70);
    }

    #[test]
    fn label_anchor_is_inside_cell_band() {
        let layout = StripLayout::default().compute(3);
        let cell = layout.cells[1];
        assert_eq!(cell.label_anchor(layout.canvas_width), (422, 402));
        assert_eq!(cell.label(), "#2");
    }

    #[test]
    fn single_photo_has_no_gap() {
        let layout = StripLayout::default().compute(1);
        assert_eq!(layout.canvas_height, 70 + 70 + 280);
    }

    #[test]
    fn default_layout_clears_header() {
        assert!(StripLayout::default().validate().is_ok());
    }

    #[test]
    fn cramped_top_padding_is_rejected() {
        let layout = StripLayout {
            padding_top: 40,
            ..StripLayout::default()
        };
        assert!(layout.validate().is_err());
    }

    #[test]
    fn oversized_photo_is_rejected_without_overflow() {
        let layout = StripLayout {
            photo_height: 2_000_000_000,
            ..StripLayout::default()
        };
        assert_eq!(layout.canvas_size(3), None);
        assert!(layout.validate().is_err());
        // Still safe to lay out; sizes saturate instead of wrapping
        let plan = layout.compute(3);
        assert_eq!(plan.canvas_height, u32::MAX);
    }

    #[test]
    fn canvas_larger_than_limit_is_rejected() {
        let layout = StripLayout {
            photo_width: MAX_CANVAS_SIDE,
            ..StripLayout::default()
        };
        assert!(layout.canvas_size(3).is_some());
        assert!(layout.validate().is_err());
    }

    #[test]
    fn zero_sized_photo_is_rejected() {
        let layout = StripLayout {
            photo_width: 0,
            ..StripLayout::default()
        };
        assert!(layout.validate().is_err());
    }
}

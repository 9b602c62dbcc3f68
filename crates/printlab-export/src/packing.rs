//! Sheet packing planner: how many copies of a document fit on a larger
//! sheet in a margin/gap grid, and where each copy goes.
//!
//! The planner is a pure function of its inputs; plans are recomputed on
//! every change and never stored in the document.

use serde::{Deserialize, Serialize};

use printlab_core::error::{DocumentError, Result};

/// Physical sheet description, all in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSpec {
    pub width_mm: f64,
    pub height_mm: f64,
    /// Outer margin on every sheet edge.
    pub margin_mm: f64,
    /// Gap between adjacent copies, horizontal and vertical.
    pub gap_mm: f64,
}

/// One planned copy position on the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub row: usize,
    pub col: usize,
    /// Top-left offset of the copy on the sheet, in mm.
    pub x_mm: f64,
    pub y_mm: f64,
}

/// A computed grid layout for one sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetPlan {
    pub cols: usize,
    pub rows: usize,
    pub placements: Vec<Placement>,
}

impl SheetPlan {
    /// Copies per sheet.
    pub fn capacity(&self) -> usize {
        self.cols * self.rows
    }
}

/// Computes the grid layout for copies of `item_w_mm` x `item_h_mm` on the
/// given sheet.
///
/// Per axis, `n` copies with `n - 1` internal gaps consume
/// `n*item + (n-1)*gap`, so the count is `floor((available + gap) /
/// (item + gap))`, clamped to at least 1 so an oversized document still
/// yields a single (overflowing) placement.
pub fn plan_sheet(sheet: &SheetSpec, item_w_mm: f64, item_h_mm: f64) -> Result<SheetPlan> {
    validate_positive("sheet.widthMm", sheet.width_mm)?;
    validate_positive("sheet.heightMm", sheet.height_mm)?;
    validate_non_negative("sheet.marginMm", sheet.margin_mm)?;
    validate_non_negative("sheet.gapMm", sheet.gap_mm)?;
    validate_positive("itemWidthMm", item_w_mm)?;
    validate_positive("itemHeightMm", item_h_mm)?;

    let cols = axis_count(sheet.width_mm, sheet.margin_mm, sheet.gap_mm, item_w_mm);
    let rows = axis_count(sheet.height_mm, sheet.margin_mm, sheet.gap_mm, item_h_mm);

    let mut placements = Vec::with_capacity(cols * rows);
    for row in 0..rows {
        for col in 0..cols {
            placements.push(Placement {
                row,
                col,
                x_mm: sheet.margin_mm + col as f64 * (item_w_mm + sheet.gap_mm),
                y_mm: sheet.margin_mm + row as f64 * (item_h_mm + sheet.gap_mm),
            });
        }
    }
    tracing::debug!(cols, rows, "sheet plan computed");
    Ok(SheetPlan {
        cols,
        rows,
        placements,
    })
}

fn axis_count(sheet: f64, margin: f64, gap: f64, item: f64) -> usize {
    let available = sheet - 2.0 * margin;
    let count = ((available + gap) / (item + gap)).floor();
    if count < 1.0 {
        1
    } else {
        count as usize
    }
}

fn validate_positive(what: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(DocumentError::InvalidDimension { what, value }.into());
    }
    Ok(())
}

fn validate_non_negative(what: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(DocumentError::InvalidDimension { what, value }.into());
    }
    Ok(())
}

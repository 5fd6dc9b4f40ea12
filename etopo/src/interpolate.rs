//! Bilinear interpolation between four raster samples.

use crate::error::{EtopoError, Result};
use crate::grid::GridCoordinate;

const CORNER_NAMES: [&str; 4] = ["north-west", "north-east", "south-west", "south-east"];

/// Bilinearly interpolate four corner samples.
///
/// `frac` is the offset from the north-west corner in cell units (`col` is x,
/// `row` is y), each in `[0, 1]`. Corners are ordered north-west, north-east,
/// south-west, south-east, as returned by [`crate::CellQuad::corners`].
///
/// Computes
///
/// ```text
/// z = z_nw·(1-x)·(1-y) + z_ne·x·(1-y) + z_sw·(1-x)·y + z_se·x·y
/// ```
///
/// in nested-lerp form, which is algebraically identical but returns the
/// corner values exactly at `x, y ∈ {0, 1}` and a constant exactly for a flat
/// quad.
///
/// # Errors
///
/// Returns [`EtopoError::InterpolationUndefined`] naming the first absent corner.
///
/// # Examples
///
/// ```
/// use etopo::{interpolate::interpolate, GridCoordinate};
///
/// let frac = GridCoordinate { row: 0.5, col: 0.5 };
/// let z = interpolate(frac, [Some(0), Some(100), Some(100), Some(200)]).unwrap();
/// assert_eq!(z, 100.0);
/// ```
pub fn interpolate(frac: GridCoordinate, corners: [Option<i16>; 4]) -> Result<f64> {
    let mut z = [0.0; 4];
    for (i, corner) in corners.iter().enumerate() {
        z[i] = match corner {
            Some(v) => f64::from(*v),
            None => {
                return Err(EtopoError::InterpolationUndefined {
                    corner: CORNER_NAMES[i],
                })
            }
        };
    }

    let [z_nw, z_ne, z_sw, z_se] = z;
    let x = frac.col;
    let y = frac.row;

    let north = z_nw + (z_ne - z_nw) * x;
    let south = z_sw + (z_se - z_sw) * x;
    Ok(north + (south - north) * y)
}

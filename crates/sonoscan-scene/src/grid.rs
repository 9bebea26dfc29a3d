//! Grid and image types.
//!
//! Images are borrowed views of what the sensor or classifier delivered;
//! grids are the owned, fixed-resolution summaries the store keeps.

use std::ops::Range;

/// A raw depth frame in meters, row-major.
#[derive(Debug, Clone, Copy)]
pub struct DepthImage<'a> {
    /// Pixels per row.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// `width * height` distances; `0`, negative or non-finite means invalid.
    pub data: &'a [f32],
}

impl<'a> DepthImage<'a> {
    /// Wrap a row-major buffer.
    pub fn new(width: usize, height: usize, data: &'a [f32]) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    /// Whether the dimensions are positive and agree with the buffer length.
    pub fn is_well_formed(&self) -> bool {
        is_well_formed(self.width, self.height, self.data.len())
    }
}

/// A raw per-pixel class-id frame, row-major.
#[derive(Debug, Clone, Copy)]
pub struct ClassImage<'a> {
    /// Pixels per row.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// `width * height` class ids; 0 is background.
    pub data: &'a [u8],
}

impl<'a> ClassImage<'a> {
    /// Wrap a row-major buffer.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    /// Whether the dimensions are positive and agree with the buffer length.
    pub fn is_well_formed(&self) -> bool {
        is_well_formed(self.width, self.height, self.data.len())
    }
}

/// An owned class-id frame, as returned by a [`Segmenter`](crate::Segmenter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFrame {
    /// Pixels per row.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Row-major class ids.
    pub data: Vec<u8>,
}

impl ClassFrame {
    /// Borrow as a [`ClassImage`].
    pub fn as_image(&self) -> ClassImage<'_> {
        ClassImage::new(self.width, self.height, &self.data)
    }
}

fn is_well_formed(width: usize, height: usize, len: usize) -> bool {
    width > 0 && height > 0 && width.checked_mul(height) == Some(len)
}

/// A fixed-size row-major grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T: Copy + Default> Grid<T> {
    /// A grid filled with `T::default()`. Zero dimensions are raised to 1.
    pub fn new(width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            cells: vec![T::default(); width * height],
        }
    }

    /// Columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell at column `x`, row `y`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.cells[y * self.width + x]
    }

    /// Overwrite the cell at column `x`, row `y`.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        self.cells[y * self.width + x] = value;
    }

    /// Copy column `x` (top to bottom) into `out`, resizing it to `height`.
    pub fn copy_column(&self, x: usize, out: &mut Vec<T>) {
        out.clear();
        out.extend((0..self.height).map(|y| self.get(x, y)));
    }

    /// All cells, row-major.
    pub fn cells(&self) -> &[T] {
        &self.cells
    }
}

/// Half-open source range covered by output cell `index` of `out_len` cells
/// laid over `in_len` source pixels.
///
/// `[index·in/out, (index+1)·in/out)`. Empty when the output is finer than
/// the input and the cell falls between two source pixels.
#[inline]
pub fn cell_span(index: usize, out_len: usize, in_len: usize) -> Range<usize> {
    let out_len = out_len.max(1);
    let start = index * in_len / out_len;
    let end = ((index + 1) * in_len / out_len).min(in_len);
    start..end.max(start)
}

/// Coordinate-frame alignment between classifier output and the depth grid.
///
/// Mirroring is applied in grid space first; then, when `rotate_cw` is set,
/// the classifier image is turned a quarter clockwise before sampling: its
/// left column becomes the grid's top row and its top row the grid's right
/// column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Orientation {
    /// Flip columns (left/right).
    pub mirror_x: bool,
    /// Flip rows (top/bottom).
    pub mirror_y: bool,
    /// Quarter turn clockwise.
    pub rotate_cw: bool,
}

impl Orientation {
    /// No mirroring, no rotation.
    pub const IDENTITY: Self = Self {
        mirror_x: false,
        mirror_y: false,
        rotate_cw: false,
    };

    /// Source `(columns, rows)` ranges for grid cell `(gx, gy)` of a
    /// `grid_w × grid_h` grid over a `src_w × src_h` image.
    pub fn source_rect(
        &self,
        gx: usize,
        gy: usize,
        grid_w: usize,
        grid_h: usize,
        src_w: usize,
        src_h: usize,
    ) -> (Range<usize>, Range<usize>) {
        let x = if self.mirror_x { grid_w - 1 - gx } else { gx };
        let y = if self.mirror_y { grid_h - 1 - gy } else { gy };
        if self.rotate_cw {
            (
                cell_span(y, grid_h, src_w),
                cell_span(grid_w - 1 - x, grid_w, src_h),
            )
        } else {
            (cell_span(x, grid_w, src_w), cell_span(y, grid_h, src_h))
        }
    }
}

//! Band storage for RingLife.
//!
//! A band is a flat row-major `(height + 2) x (width + 2)` buffer. Row 0 and
//! row `height + 1` are halo rows, column 0 and column `width + 1` are halo
//! columns; the interior lives at `y in 1..=height`, `x in 1..=width`.

/// Linear offset of `(y, x)` in a band of the given width.
///
/// Valid for `y in 0..=height + 1` and `x in 0..=width + 1`.
#[inline(always)]
pub const fn index(width: usize, y: usize, x: usize) -> usize {
    x + (width + 2) * y
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Band {
    height: usize,
    width: usize,
    cells: Vec<bool>,
}

impl Band {
    /// All-dead band with `height` interior rows of `width` cells.
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            cells: vec![false; (height + 2) * (width + 2)],
        }
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Row stride, halo columns included.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width + 2
    }

    #[inline(always)]
    pub fn get(&self, y: usize, x: usize) -> bool {
        debug_assert!(y <= self.height + 1 && x <= self.width + 1);
        self.cells[index(self.width, y, x)]
    }

    #[inline(always)]
    pub fn set(&mut self, y: usize, x: usize, alive: bool) {
        debug_assert!(y <= self.height + 1 && x <= self.width + 1);
        self.cells[index(self.width, y, x)] = alive;
    }

    /// Full padded row `y`, halo columns included.
    #[inline]
    pub fn row(&self, y: usize) -> &[bool] {
        let start = index(self.width, y, 0);
        &self.cells[start..start + self.stride()]
    }

    /// Interior cells of row `y` (columns `1..=width`).
    #[inline]
    pub fn interior_row(&self, y: usize) -> &[bool] {
        let start = index(self.width, y, 1);
        &self.cells[start..start + self.width]
    }

    #[inline]
    pub fn interior_row_mut(&mut self, y: usize) -> &mut [bool] {
        let start = index(self.width, y, 1);
        &mut self.cells[start..start + self.width]
    }

    /// Interior rows packed back to back, `height * width` cells.
    pub fn interior(&self) -> Vec<bool> {
        let mut out = Vec::with_capacity(self.height * self.width);
        for y in 1..=self.height {
            out.extend_from_slice(self.interior_row(y));
        }
        out
    }

    pub fn population(&self) -> u64 {
        (1..=self.height)
            .map(|y| self.interior_row(y).iter().filter(|&&c| c).count() as u64)
            .sum()
    }
}

//! B3/S23 rule and the per-band step.

use super::band::Band;

/// Number of live cells in the Moore neighbourhood of interior cell `(y, x)`.
#[inline(always)]
pub fn live_neighbors(band: &Band, y: usize, x: usize) -> u8 {
    let mut count = 0u8;
    for ny in (y - 1)..=(y + 1) {
        for nx in (x - 1)..=(x + 1) {
            if ny == y && nx == x {
                continue;
            }
            count += band.get(ny, nx) as u8;
        }
    }
    count
}

#[inline(always)]
pub const fn next_state(alive: bool, neighbors: u8) -> bool {
    neighbors == 3 || (alive && neighbors == 2)
}

/// Advance every interior cell of `current` into `next`.
///
/// `current` must have a fresh halo. Halo slots of `next` are left untouched.
pub fn step_band(current: &Band, next: &mut Band) {
    debug_assert_eq!(current.height(), next.height());
    debug_assert_eq!(current.width(), next.width());

    for y in 1..=current.height() {
        let row = next.interior_row_mut(y);
        for (col, out) in row.iter_mut().enumerate() {
            let x = col + 1;
            let alive = current.get(y, x);
            *out = next_state(alive, live_neighbors(current, y, x));
        }
    }
}

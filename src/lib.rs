//! Conway's Game of Life (B3/S23) on a torus, split into row bands across a
//! ring of workers that trade halo rows every generation.

pub mod ringlife;
pub use ringlife::{GlobalGrid, RingLife, RingLifeConfig, RingLifeError, RunReport};

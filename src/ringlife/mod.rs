//! RingLife engine internals and public API.

pub mod band;
mod collector;
mod engine;
mod error;
pub mod halo;
pub mod rule;
mod snapshot;
pub mod topology;

pub use collector::{Collector, GlobalGrid, collectors};
pub use engine::{RingLife, RingLifeConfig, RunReport};
pub use error::{Result, RingLifeError};
pub use snapshot::{MemorySink, NullSink, PgmSink, SnapshotSink, write_pgm};
pub use topology::{RingTopology, Role};

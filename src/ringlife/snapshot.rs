//! Snapshot sinks fed by the coordinator after each gathered generation.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;

use super::collector::GlobalGrid;

/// Receives gathered grids on the coordinator. Only the coordinator ever
/// holds a sink; the size is `grid.size()`.
pub trait SnapshotSink: Send {
    fn write(&mut self, generation: u64, grid: &GlobalGrid) -> io::Result<()>;
}

/// Discards every snapshot.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn write(&mut self, _generation: u64, _grid: &GlobalGrid) -> io::Result<()> {
        Ok(())
    }
}

/// Keeps every snapshot in memory, in arrival order.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    pub frames: Vec<(u64, GlobalGrid)>,
}

impl SnapshotSink for MemorySink {
    fn write(&mut self, generation: u64, grid: &GlobalGrid) -> io::Result<()> {
        self.frames.push((generation, grid.clone()));
        Ok(())
    }
}

/// Pixels per cell side in PGM output.
const PGM_SCALE: usize = 2;
const PGM_PIXELS_PER_LINE: usize = 30;

/// Writes `step{generation}.pgm` plain-text greymap images into a directory.
/// Live cells are black (0), dead cells white (1).
#[derive(Clone, Debug)]
pub struct PgmSink {
    dir: PathBuf,
}

impl PgmSink {
    /// Creates `dir` if it is missing.
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, generation: u64) -> PathBuf {
        self.dir.join(format!("step{generation}.pgm"))
    }
}

impl SnapshotSink for PgmSink {
    fn write(&mut self, generation: u64, grid: &GlobalGrid) -> io::Result<()> {
        let path = self.path_for(generation);
        let mut out = BufWriter::new(File::create(&path)?);
        write_pgm(&mut out, generation, grid)?;
        out.flush()?;
        debug!("wrote {}", path.display());
        Ok(())
    }
}

pub fn write_pgm<W: Write>(out: &mut W, generation: u64, grid: &GlobalGrid) -> io::Result<()> {
    let side = grid.size() * PGM_SCALE;
    write!(out, "P2\n#Step {generation} of the Game of Life.\n")?;
    write!(out, "{side} {side}\n1\n")?;

    let mut pixels = 0usize;
    for y in 0..grid.size() {
        for _ in 0..PGM_SCALE {
            for &alive in grid.row(y) {
                let value = if alive { b'0' } else { b'1' };
                for _ in 0..PGM_SCALE {
                    pixels += 1;
                    let sep = if pixels % PGM_PIXELS_PER_LINE == 0 { b'\n' } else { b' ' };
                    out.write_all(&[value, sep])?;
                }
            }
        }
    }
    Ok(())
}

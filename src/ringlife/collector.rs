//! Snapshot gathering.
//!
//! Every rank ships its interior rows to the coordinator, which stitches them
//! into a `GlobalGrid` by band offset. Each member has its own channel to the
//! coordinator, so pieces for the same generation are always read together
//! even when some ranks run ahead of others.

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};

use log::debug;

use super::band::Band;
use super::error::{Result, RingLifeError};
use super::topology::{RingTopology, Role};

/// Full `size x size` grid, row-major, no halo.
#[derive(Clone, PartialEq, Eq)]
pub struct GlobalGrid {
    size: usize,
    cells: Vec<bool>,
}

impl GlobalGrid {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![false; size * size],
        }
    }

    /// Build a grid with the given live cells, wrapping coordinates onto the torus.
    pub fn from_live_cells<I>(size: usize, cells: I) -> Self
    where
        I: IntoIterator<Item = (i64, i64)>,
    {
        let mut grid = Self::new(size);
        for (x, y) in cells {
            let x = x.rem_euclid(size as i64) as usize;
            let y = y.rem_euclid(size as i64) as usize;
            grid.set(y, x, true);
        }
        grid
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, y: usize, x: usize) -> bool {
        self.cells[y * self.size + x]
    }

    #[inline]
    pub fn set(&mut self, y: usize, x: usize, alive: bool) {
        self.cells[y * self.size + x] = alive;
    }

    pub fn row(&self, y: usize) -> &[bool] {
        &self.cells[y * self.size..(y + 1) * self.size]
    }

    pub fn population(&self) -> u64 {
        self.cells.iter().filter(|&&c| c).count() as u64
    }

    pub fn for_each_live<F: FnMut(usize, usize)>(&self, mut f: F) {
        for (i, &alive) in self.cells.iter().enumerate() {
            if alive {
                f(i % self.size, i / self.size);
            }
        }
    }

    fn write_rows(&mut self, first_row: usize, rows: &[bool]) {
        let start = first_row * self.size;
        self.cells[start..start + rows.len()].copy_from_slice(rows);
    }
}

impl fmt::Debug for GlobalGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "GlobalGrid {}x{}", self.size, self.size)?;
        for y in 0..self.size {
            let line: String = self
                .row(y)
                .iter()
                .map(|&c| if c { '#' } else { '.' })
                .collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

struct BandPiece {
    generation: u64,
    rank: usize,
    rows: Vec<bool>,
}

enum Endpoint {
    Coordinator { inboxes: Vec<Option<Receiver<BandPiece>>> },
    Member { outbox: Sender<BandPiece> },
}

/// A rank's end of the gather.
pub struct Collector {
    topology: RingTopology,
    endpoint: Endpoint,
}

/// One collector per rank, indexed by rank.
pub fn collectors(topology: RingTopology) -> Vec<Collector> {
    let workers = topology.workers();
    let mut outboxes = Vec::with_capacity(workers);
    let mut inboxes = Vec::with_capacity(workers);
    for rank in 0..workers {
        if topology.with_rank(rank).role() == Role::Coordinator {
            outboxes.push(None);
            inboxes.push(None);
        } else {
            let (tx, rx) = mpsc::channel();
            outboxes.push(Some(tx));
            inboxes.push(Some(rx));
        }
    }

    let mut inboxes = Some(inboxes);
    outboxes
        .into_iter()
        .enumerate()
        .map(|(rank, outbox)| {
            let topology = topology.with_rank(rank);
            let endpoint = match outbox {
                Some(outbox) => Endpoint::Member { outbox },
                None => Endpoint::Coordinator {
                    inboxes: inboxes.take().unwrap_or_default(),
                },
            };
            Collector { topology, endpoint }
        })
        .collect()
}

impl Collector {
    pub fn role(&self) -> Role {
        match self.endpoint {
            Endpoint::Coordinator { .. } => Role::Coordinator,
            Endpoint::Member { .. } => Role::Member,
        }
    }

    /// Take part in the gather for `generation`.
    ///
    /// Returns the assembled grid on the coordinator and `None` elsewhere.
    pub fn gather(&self, band: &Band, generation: u64) -> Result<Option<GlobalGrid>> {
        let rank = self.topology.rank();
        match &self.endpoint {
            Endpoint::Member { outbox } => {
                outbox
                    .send(BandPiece {
                        generation,
                        rank,
                        rows: band.interior(),
                    })
                    .map_err(|_| RingLifeError::transport(rank, "coordinator hung up"))?;
                Ok(None)
            }
            Endpoint::Coordinator { inboxes } => {
                let mut grid = GlobalGrid::new(self.topology.size());
                grid.write_rows(self.topology.row_offset(), &band.interior());

                for (source, inbox) in inboxes.iter().enumerate() {
                    let Some(inbox) = inbox else { continue };
                    let piece = inbox.recv().map_err(|_| {
                        RingLifeError::transport(rank, format!("rank {source} hung up during gather"))
                    })?;
                    let expected_len = self.topology.band_height(source) * self.topology.size();
                    if piece.generation != generation
                        || piece.rank != source
                        || piece.rows.len() != expected_len
                    {
                        return Err(RingLifeError::transport(
                            rank,
                            format!(
                                "bad gather piece from rank {} for generation {} ({} cells), expected rank {source} generation {generation} ({expected_len} cells)",
                                piece.rank,
                                piece.generation,
                                piece.rows.len()
                            ),
                        ));
                    }
                    grid.write_rows(self.topology.band_offset(source), &piece.rows);
                }
                debug!(
                    "gathered generation {generation}: population {}",
                    grid.population()
                );
                Ok(Some(grid))
            }
        }
    }
}

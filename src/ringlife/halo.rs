//! Halo exchange for RingLife.
//!
//! Each step a worker ships its first interior row to `up` and its last
//! interior row to `down`, receiving the matching rows into its bottom and
//! top halo rows. Sends go through unbounded channels and never block, so the
//! receive that follows each send is the only suspension point and the ring
//! cannot deadlock at any size, W = 1 included. After the vertical exchange,
//! every row (halo rows too) gets its left/right halo columns wrapped locally,
//! which makes the corners agree with the torus.

use std::sync::mpsc::{self, Receiver, Sender};

use log::trace;

use super::band::Band;
use super::error::{Result, RingLifeError};
use super::topology::RingTopology;

/// One boundary row in flight between ring neighbours.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HaloMessage {
    pub generation: u64,
    pub source: usize,
    pub cells: Vec<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// A worker's channel endpoints to its two ring neighbours.
///
/// Inboxes are split by direction: with two workers `up == down`, and the
/// first/last rows coming from the same peer must not be confused.
pub struct HaloLink {
    topology: RingTopology,
    to_up: Sender<HaloMessage>,
    to_down: Sender<HaloMessage>,
    from_above: Receiver<HaloMessage>,
    from_below: Receiver<HaloMessage>,
}

/// Wire up one `HaloLink` per rank, indexed by rank.
pub fn ring_links(topology: RingTopology) -> Vec<HaloLink> {
    let workers = topology.workers();
    let (above_tx, above_rx): (Vec<_>, Vec<_>) = (0..workers)
        .map(|_| mpsc::channel::<HaloMessage>())
        .unzip();
    let (below_tx, below_rx): (Vec<_>, Vec<_>) = (0..workers)
        .map(|_| mpsc::channel::<HaloMessage>())
        .unzip();

    above_rx
        .into_iter()
        .zip(below_rx)
        .enumerate()
        .map(|(rank, (from_above, from_below))| {
            let topology = topology.with_rank(rank);
            HaloLink {
                topology,
                // My first row is the bottom halo of the rank above me.
                to_up: below_tx[topology.up()].clone(),
                // My last row is the top halo of the rank below me.
                to_down: above_tx[topology.down()].clone(),
                from_above,
                from_below,
            }
        })
        .collect()
}

impl HaloLink {
    pub fn topology(&self) -> &RingTopology {
        &self.topology
    }

    /// Send `cells` towards `direction` and receive the row travelling the
    /// same way from the opposite neighbour.
    pub fn send_recv(
        &self,
        direction: Direction,
        cells: Vec<bool>,
        generation: u64,
    ) -> Result<HaloMessage> {
        let rank = self.topology.rank();
        let (sender, inbox, dest, expected_source) = match direction {
            Direction::Up => (
                &self.to_up,
                &self.from_below,
                self.topology.up(),
                self.topology.down(),
            ),
            Direction::Down => (
                &self.to_down,
                &self.from_above,
                self.topology.down(),
                self.topology.up(),
            ),
        };
        let width = cells.len();

        trace!("rank {rank} gen {generation}: sending {direction:?} to {dest}");
        sender
            .send(HaloMessage {
                generation,
                source: rank,
                cells,
            })
            .map_err(|_| RingLifeError::transport(rank, format!("rank {dest} hung up")))?;

        let message = inbox.recv().map_err(|_| {
            RingLifeError::transport(rank, format!("rank {expected_source} hung up"))
        })?;
        if message.generation != generation {
            return Err(RingLifeError::transport(
                rank,
                format!(
                    "expected halo for generation {generation}, got {} from rank {}",
                    message.generation, message.source
                ),
            ));
        }
        if message.source != expected_source {
            return Err(RingLifeError::transport(
                rank,
                format!(
                    "expected halo from rank {expected_source}, got rank {}",
                    message.source
                ),
            ));
        }
        if message.cells.len() != width {
            return Err(RingLifeError::transport(
                rank,
                format!(
                    "halo row from rank {} has {} cells, expected {width}",
                    message.source,
                    message.cells.len()
                ),
            ));
        }
        Ok(message)
    }

    /// Refresh every halo slot of `band` for `generation`.
    pub fn exchange(&self, band: &mut Band, generation: u64) -> Result<()> {
        let height = band.height();

        let first = band.interior_row(1).to_vec();
        let below = self.send_recv(Direction::Up, first, generation)?;
        band.interior_row_mut(height + 1).copy_from_slice(&below.cells);

        let last = band.interior_row(height).to_vec();
        let above = self.send_recv(Direction::Down, last, generation)?;
        band.interior_row_mut(0).copy_from_slice(&above.cells);

        wrap_columns(band);
        Ok(())
    }
}

/// Copy each row's edge cells into the opposite halo column, halo rows included.
pub fn wrap_columns(band: &mut Band) {
    let width = band.width();
    for y in 0..=band.height() + 1 {
        let right_edge = band.get(y, width);
        let left_edge = band.get(y, 1);
        band.set(y, 0, right_edge);
        band.set(y, width + 1, left_edge);
    }
}

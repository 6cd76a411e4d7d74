//! Ring topology and row-band assignment.
//!
//! Workers sit on a single periodic axis. Rank `r` owns a contiguous run of
//! global rows; the first `size % workers` ranks get one extra row.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RingTopology {
    workers: usize,
    rank: usize,
    size: usize,
}

/// Whether a rank gathers and writes snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Coordinator,
    Member,
}

pub const COORDINATOR_RANK: usize = 0;

impl RingTopology {
    pub fn new(workers: usize, rank: usize, size: usize) -> Self {
        debug_assert!(workers > 0);
        debug_assert!(rank < workers);
        Self {
            workers,
            rank,
            size,
        }
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Global grid side length.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Rank that owns the rows directly above this band.
    #[inline]
    pub fn up(&self) -> usize {
        (self.rank + self.workers - 1) % self.workers
    }

    /// Rank that owns the rows directly below this band.
    #[inline]
    pub fn down(&self) -> usize {
        (self.rank + 1) % self.workers
    }

    pub fn role(&self) -> Role {
        if self.rank == COORDINATOR_RANK {
            Role::Coordinator
        } else {
            Role::Member
        }
    }

    /// Interior rows owned by this rank.
    #[inline]
    pub fn height(&self) -> usize {
        self.band_height(self.rank)
    }

    /// First global row owned by this rank.
    #[inline]
    pub fn row_offset(&self) -> usize {
        self.band_offset(self.rank)
    }

    pub fn band_height(&self, rank: usize) -> usize {
        let base = self.size / self.workers;
        if rank < self.size % self.workers {
            base + 1
        } else {
            base
        }
    }

    pub fn band_offset(&self, rank: usize) -> usize {
        let base = self.size / self.workers;
        let extra = self.size % self.workers;
        rank * base + rank.min(extra)
    }

    /// This topology viewed from another rank.
    pub fn with_rank(&self, rank: usize) -> Self {
        Self::new(self.workers, rank, self.size)
    }
}

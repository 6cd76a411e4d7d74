use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use log::{debug, info, trace};
use rand::{Rng, SeedableRng};

use super::band::Band;
use super::collector::{Collector, GlobalGrid, collectors};
use super::error::{Result, RingLifeError};
use super::halo::{HaloLink, ring_links};
use super::rule::step_band;
use super::snapshot::SnapshotSink;
use super::topology::{COORDINATOR_RANK, RingTopology};

/// Configuration for a RingLife run.
///
/// Use `RingLifeConfig::default()` and the builder methods; `validate` runs
/// before any worker starts.
#[derive(Clone, Debug)]
pub struct RingLifeConfig {
    /// Side length of the square torus.
    pub size: usize,
    /// Initial fill probability in percent, 0..=100.
    pub probability: u8,
    /// Generations to advance after generation 0.
    pub steps: u64,
    /// Ring size. `None` means available parallelism, capped at `size`.
    pub workers: Option<usize>,
    /// Base RNG seed; rank `r` uses `seed + r`. `None` derives one from the clock.
    pub seed: Option<u64>,
    /// Explicit starting grid. Overrides random fill when set.
    pub pattern: Option<GlobalGrid>,
    /// Gather every n-th generation (generation 0 included). 0 disables gathers.
    pub snapshot_every: u64,
}

impl Default for RingLifeConfig {
    fn default() -> Self {
        Self {
            size: 64,
            probability: 20,
            steps: 100,
            workers: None,
            seed: None,
            pattern: None,
            snapshot_every: 1,
        }
    }
}

impl RingLifeConfig {
    pub fn size(mut self, n: usize) -> Self {
        self.size = n;
        self
    }

    pub fn probability(mut self, percent: u8) -> Self {
        self.probability = percent;
        self
    }

    pub fn steps(mut self, n: u64) -> Self {
        self.steps = n;
        self
    }

    pub fn workers(mut self, n: usize) -> Self {
        self.workers = Some(n);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Start from `grid`; also sets `size` to match.
    pub fn pattern(mut self, grid: GlobalGrid) -> Self {
        self.size = grid.size();
        self.pattern = Some(grid);
        self
    }

    pub fn snapshot_every(mut self, n: u64) -> Self {
        self.snapshot_every = n;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(RingLifeError::Config("grid size must be positive".into()));
        }
        if self.probability > 100 {
            return Err(RingLifeError::Config(format!(
                "fill probability {} is outside 0..=100",
                self.probability
            )));
        }
        let workers = resolve_worker_count(self);
        if workers == 0 {
            return Err(RingLifeError::Config("worker count must be positive".into()));
        }
        if self.size < workers {
            return Err(RingLifeError::Config(format!(
                "grid size {} is smaller than worker count {workers}",
                self.size
            )));
        }
        if let Some(pattern) = &self.pattern
            && pattern.size() != self.size
        {
            return Err(RingLifeError::Config(format!(
                "pattern is {}x{} but grid size is {}",
                pattern.size(),
                pattern.size(),
                self.size
            )));
        }
        Ok(())
    }
}

fn resolve_worker_count(config: &RingLifeConfig) -> usize {
    config.workers.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(config.size)
            .max(1)
    })
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x5EED_1234_ABCD_EF01)
}

/// Summary of a finished run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub size: usize,
    pub probability: u8,
    pub workers: usize,
    pub generations: u64,
    /// Live cells after the last generation.
    pub population: u64,
    /// Snapshots handed to the sink.
    pub snapshots: u64,
    pub seed: u64,
    pub elapsed: Duration,
}

/// Partitioned Game of Life: one worker thread per ring rank.
pub struct RingLife {
    config: RingLifeConfig,
    workers: usize,
    pool: rayon::ThreadPool,
}

impl RingLife {
    pub fn with_config(config: RingLifeConfig) -> Result<Self> {
        config.validate()?;
        let workers = resolve_worker_count(&config);
        // Every rank blocks on its neighbours, so each needs its own thread.
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|rank| format!("ring-life-{rank}"))
            .build()?;
        Ok(Self {
            config,
            workers,
            pool,
        })
    }

    /// Run the configured number of steps, feeding gathered grids to `sink`.
    pub fn run(&self, sink: &mut dyn SnapshotSink) -> Result<RunReport> {
        let seed = self.config.seed.unwrap_or_else(clock_seed);
        let topology = RingTopology::new(self.workers, COORDINATOR_RANK, self.config.size);
        info!(
            "starting {}x{} grid, {} workers, {} steps, fill {}%, seed {seed:#x}",
            self.config.size, self.config.size, self.workers, self.config.steps, self.config.probability
        );

        let slots: Vec<Mutex<Option<(HaloLink, Collector)>>> = ring_links(topology)
            .into_iter()
            .zip(collectors(topology))
            .map(|parts| Mutex::new(Some(parts)))
            .collect();
        let sink = Mutex::new(Some(sink));

        let start = Instant::now();
        let outcomes = self.pool.broadcast(|ctx| {
            let rank = ctx.index();
            let Some((link, collector)) = take(&slots[rank]) else {
                return Err(RingLifeError::transport(rank, "worker endpoints already taken"));
            };
            let sink = if rank == COORDINATOR_RANK { take(&sink) } else { None };
            Worker {
                config: &self.config,
                seed,
                link,
                collector,
                sink,
            }
            .run()
        });
        let elapsed = start.elapsed();

        let outcomes = first_failure(outcomes)?;
        let report = RunReport {
            size: self.config.size,
            probability: self.config.probability,
            workers: self.workers,
            generations: self.config.steps,
            population: outcomes.iter().map(|o| o.population).sum(),
            snapshots: outcomes.iter().map(|o| o.snapshots).sum(),
            seed,
            elapsed,
        };
        info!(
            "finished {} generations in {:.3}s, population {}",
            report.generations,
            report.elapsed.as_secs_f64(),
            report.population
        );
        Ok(report)
    }
}

fn take<T>(slot: &Mutex<Option<T>>) -> Option<T> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

/// The root cause wins over the transport errors it triggers around the ring.
fn first_failure(outcomes: Vec<Result<WorkerOutcome>>) -> Result<Vec<WorkerOutcome>> {
    let mut ok = Vec::with_capacity(outcomes.len());
    let mut transport = None;
    let mut root = None;
    for outcome in outcomes {
        match outcome {
            Ok(o) => ok.push(o),
            Err(err @ RingLifeError::Transport { .. }) => {
                transport.get_or_insert(err);
            }
            Err(err) => {
                root.get_or_insert(err);
            }
        }
    }
    match root.or(transport) {
        Some(err) => Err(err),
        None => Ok(ok),
    }
}

struct WorkerOutcome {
    population: u64,
    snapshots: u64,
}

struct Worker<'a, 's> {
    config: &'a RingLifeConfig,
    seed: u64,
    link: HaloLink,
    collector: Collector,
    sink: Option<&'s mut dyn SnapshotSink>,
}

impl Worker<'_, '_> {
    fn run(mut self) -> Result<WorkerOutcome> {
        let topology = *self.link.topology();
        let size = topology.size();
        debug!(
            "rank {} owns rows {}..{} (up {}, down {})",
            topology.rank(),
            topology.row_offset(),
            topology.row_offset() + topology.height(),
            topology.up(),
            topology.down()
        );

        let mut current = Band::new(topology.height(), size);
        let mut next = Band::new(topology.height(), size);
        self.fill(&mut current, &topology);

        let mut snapshots = 0;
        self.link.exchange(&mut current, 0)?;
        snapshots += self.snapshot(&current, 0)?;

        for generation in 1..=self.config.steps {
            step_band(&current, &mut next);
            self.link.exchange(&mut next, generation)?;
            std::mem::swap(&mut current, &mut next);
            trace!("rank {} reached generation {generation}", topology.rank());
            snapshots += self.snapshot(&current, generation)?;
        }

        Ok(WorkerOutcome {
            population: current.population(),
            snapshots,
        })
    }

    fn fill(&self, band: &mut Band, topology: &RingTopology) {
        if let Some(pattern) = &self.config.pattern {
            for y in 0..topology.height() {
                band.interior_row_mut(y + 1)
                    .copy_from_slice(pattern.row(topology.row_offset() + y));
            }
            return;
        }

        let mut rng =
            rand::rngs::StdRng::seed_from_u64(self.seed.wrapping_add(topology.rank() as u64));
        let probability = self.config.probability;
        for y in 1..=topology.height() {
            for cell in band.interior_row_mut(y) {
                *cell = rng.random_range(0u8..100) < probability;
            }
        }
    }

    /// Collective: every rank calls this with the same generation.
    fn snapshot(&mut self, band: &Band, generation: u64) -> Result<u64> {
        let every = self.config.snapshot_every;
        if every == 0 || generation % every != 0 {
            return Ok(0);
        }
        let Some(grid) = self.collector.gather(band, generation)? else {
            return Ok(0);
        };
        match self.sink.as_deref_mut() {
            Some(sink) => {
                sink.write(generation, &grid)
                    .map_err(|source| RingLifeError::Snapshot { generation, source })?;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

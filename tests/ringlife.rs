use std::collections::HashSet;
use std::io;

use ring_life::ringlife::band::Band;
use ring_life::ringlife::{
    GlobalGrid, MemorySink, RingLife, RingLifeConfig, RingLifeError, RingTopology, Role,
    SnapshotSink, collectors,
};

const GLIDER: [(i64, i64); 5] = [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)];

fn run_frames(config: RingLifeConfig) -> Vec<(u64, GlobalGrid)> {
    let mut sink = MemorySink::default();
    RingLife::with_config(config)
        .expect("valid config")
        .run(&mut sink)
        .expect("run succeeds");
    sink.frames
}

fn run_pattern(pattern: &GlobalGrid, workers: usize, steps: u64) -> Vec<(u64, GlobalGrid)> {
    run_frames(
        RingLifeConfig::default()
            .pattern(pattern.clone())
            .workers(workers)
            .steps(steps),
    )
}

/// Accepts snapshots until `fail_at`, then reports a write error.
struct FailingSink {
    fail_at: u64,
    written: Vec<u64>,
}

impl SnapshotSink for FailingSink {
    fn write(&mut self, generation: u64, _grid: &GlobalGrid) -> io::Result<()> {
        if generation == self.fail_at {
            return Err(io::Error::other("disk full"));
        }
        self.written.push(generation);
        Ok(())
    }
}

fn live_set(grid: &GlobalGrid) -> HashSet<(usize, usize)> {
    let mut out = HashSet::new();
    grid.for_each_live(|x, y| {
        out.insert((x, y));
    });
    out
}

fn shifted(cells: &[(i64, i64)], dx: i64, dy: i64, size: usize) -> GlobalGrid {
    GlobalGrid::from_live_cells(size, cells.iter().map(|&(x, y)| (x + dx, y + dy)))
}

#[test]
fn glider_moves_down_right_every_four_steps() {
    let size = 8;
    let start = GlobalGrid::from_live_cells(size, GLIDER);
    let frames = run_pattern(&start, 2, 4);
    assert_eq!(frames.len(), 5);
    assert_eq!(frames[0].1, start);
    assert_eq!(frames[4].1, shifted(&GLIDER, 1, 1, size));
}

#[test]
fn glider_wraps_across_every_band_and_edge() {
    let size = 8;
    let start = GlobalGrid::from_live_cells(size, GLIDER);
    // One full lap of the torus takes 4 * size generations.
    let steps = 4 * size as u64;
    let frames = run_pattern(&start, 4, steps);
    for (generation, grid) in &frames {
        let lap = (*generation / 4) as i64;
        if generation % 4 == 0 {
            assert_eq!(
                *grid,
                shifted(&GLIDER, lap, lap, size),
                "glider out of place at generation {generation}"
            );
        }
        assert_eq!(grid.population(), 5, "generation {generation}");
    }
    assert_eq!(frames.last().map(|(_, g)| g), Some(&start));
}

#[test]
fn partitioning_never_changes_results() {
    for size in [8usize, 10, 13] {
        let start = GlobalGrid::from_live_cells(size, GLIDER);
        let reference = run_pattern(&start, 1, 12);
        for workers in [2, 4] {
            let frames = run_pattern(&start, workers, 12);
            assert_eq!(frames, reference, "N={size} W={workers}");
        }
    }
}

#[test]
fn empty_grid_stays_dead() {
    for workers in [1, 3] {
        let frames = run_frames(
            RingLifeConfig::default()
                .size(12)
                .probability(0)
                .steps(10)
                .workers(workers)
                .seed(99),
        );
        assert_eq!(frames.len(), 11);
        assert!(frames.iter().all(|(_, g)| g.population() == 0));
    }
}

#[test]
fn full_three_by_three_torus_dies_in_one_step() {
    // Every cell sees the other eight cells as neighbours.
    for workers in [1, 2, 3] {
        let frames = run_frames(
            RingLifeConfig::default()
                .size(3)
                .probability(100)
                .steps(1)
                .workers(workers)
                .seed(5),
        );
        assert_eq!(frames[0].1.population(), 9, "W={workers}");
        assert_eq!(frames[1].1.population(), 0, "W={workers}");
    }
}

#[test]
fn full_four_by_four_torus_dies_for_any_ring() {
    let frames_by_ring: Vec<_> = [1, 2, 4]
        .into_iter()
        .map(|w| {
            run_frames(
                RingLifeConfig::default()
                    .size(4)
                    .probability(100)
                    .steps(2)
                    .workers(w)
                    .seed(1),
            )
        })
        .collect();
    for frames in &frames_by_ring {
        assert_eq!(frames[1].1.population(), 0);
        assert_eq!(frames, &frames_by_ring[0]);
    }
}

#[test]
fn blinker_oscillates_across_a_band_edge() {
    let size = 8;
    // Rows 1..=3 straddle the boundary between rank 0 (rows 0..2) and rank 1.
    let vertical = GlobalGrid::from_live_cells(size, [(4, 1), (4, 2), (4, 3)]);
    let horizontal = GlobalGrid::from_live_cells(size, [(3, 2), (4, 2), (5, 2)]);
    let frames = run_pattern(&vertical, 4, 2);
    assert_eq!(frames[1].1, horizontal);
    assert_eq!(frames[2].1, vertical);
}

#[test]
fn block_on_the_torus_corner_is_stable() {
    let size = 9;
    let block = GlobalGrid::from_live_cells(size, [(-1, -1), (0, -1), (-1, 0), (0, 0)]);
    let frames = run_pattern(&block, 3, 3);
    assert!(frames.iter().all(|(_, g)| *g == block));
    assert_eq!(live_set(&block).len(), 4);
}

#[test]
fn runs_are_deterministic_for_fixed_input() {
    let config = RingLifeConfig::default()
        .size(20)
        .probability(40)
        .steps(15)
        .workers(3)
        .seed(0xDEAD_BEEF);
    assert_eq!(run_frames(config.clone()), run_frames(config));
}

#[test]
fn snapshot_cadence_includes_generation_zero() {
    let frames = run_frames(
        RingLifeConfig::default()
            .size(10)
            .steps(7)
            .workers(2)
            .seed(3)
            .snapshot_every(3),
    );
    let generations: Vec<u64> = frames.iter().map(|(g, _)| *g).collect();
    assert_eq!(generations, vec![0, 3, 6]);
}

#[test]
fn report_population_matches_last_frame() {
    let mut sink = MemorySink::default();
    let report = RingLife::with_config(
        RingLifeConfig::default()
            .size(16)
            .probability(30)
            .steps(5)
            .workers(3)
            .seed(11),
    )
    .unwrap()
    .run(&mut sink)
    .unwrap();
    assert_eq!(report.snapshots, 6);
    assert_eq!(report.workers, 3);
    assert_eq!(report.seed, 11);
    assert_eq!(sink.frames.last().unwrap().1.population(), report.population);
}

#[test]
fn gathering_twice_yields_the_same_grid() {
    let size = 6;
    let source = GlobalGrid::from_live_cells(size, [(0, 0), (5, 1), (2, 3), (4, 5)]);
    let topology = RingTopology::new(2, 0, size);
    let collectors = collectors(topology);
    let bands: Vec<Band> = (0..2)
        .map(|rank| {
            let topo = topology.with_rank(rank);
            let mut band = Band::new(topo.height(), size);
            for y in 0..topo.height() {
                band.interior_row_mut(y + 1)
                    .copy_from_slice(source.row(topo.row_offset() + y));
            }
            band
        })
        .collect();

    let mut gathered = Vec::new();
    for _ in 0..2 {
        assert!(collectors[1].gather(&bands[1], 4).unwrap().is_none());
        assert_eq!(collectors[0].role(), Role::Coordinator);
        gathered.push(collectors[0].gather(&bands[0], 4).unwrap().unwrap());
    }
    assert_eq!(gathered[0], gathered[1]);
    assert_eq!(gathered[0], source);
}

#[test]
fn grid_smaller_than_ring_is_rejected_before_running() {
    let result = RingLife::with_config(RingLifeConfig::default().size(2).workers(3));
    assert!(result.is_err());
}

#[test]
fn failing_sink_aborts_the_whole_ring() {
    for workers in [1, 2, 4, 7] {
        let engine = RingLife::with_config(
            RingLifeConfig::default()
                .size(21)
                .probability(30)
                .steps(50)
                .workers(workers)
                .seed(0xF00D),
        )
        .unwrap();
        let mut sink = FailingSink {
            fail_at: 3,
            written: Vec::new(),
        };
        let err = engine.run(&mut sink).unwrap_err();
        assert!(
            matches!(err, RingLifeError::Snapshot { generation: 3, .. }),
            "W={workers}: expected the sink failure, got {err}"
        );
        assert_eq!(sink.written, vec![0, 1, 2], "W={workers}");
    }
}

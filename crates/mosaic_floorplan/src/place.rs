//! Block placement: sequence-pair annealing over cluster blocks.
//!
//! Each cluster becomes one [`Block`]; a [`BlockPlacer`] anneals the blocks'
//! sequence pair and shapes against the outline with the full five-term cost.
//! The orchestrator runs a go-with-the-winner hierarchy: per level, a batch
//! of workers anneals from the previous winner's state with spread cooling
//! rates and a geometrically reheated shared initial temperature; only the
//! cheapest worker survives into the next level.

use crate::anneal::{self, Anneal, SaParams};
use crate::cost::{self, CostNorms, CostTerms, CostWeights};
use crate::error::FloorplanError;
use crate::model::{Block, Design, ResolvedNet};
use crate::seqpair::SequencePair;
use mosaic_common::Rect;
use mosaic_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::thread;

/// Relative outline slack below which a packing counts as feasible.
const FIT_TOLERANCE: f64 = 0.01;

/// Cooling-rate interval spread across the workers of a level.
const COOLING_SPREAD: (f64, f64) = (0.985, 0.995);

/// Parameters for the block placement stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementParams {
    /// Target outline width.
    pub outline_width: f64,
    /// Target outline height.
    pub outline_height: f64,
    /// Go-with-the-winner levels.
    pub num_levels: usize,
    /// Parallel workers per level.
    pub num_workers: usize,
    /// Annealing schedule; the cooling rate is overridden per worker.
    pub sa: SaParams,
    /// Initial cost weights.
    pub weights: CostWeights,
    /// Probability cutoff for resize moves.
    pub resize_prob: f64,
    /// Cumulative cutoff for positive-sequence swaps.
    pub pos_swap_prob: f64,
    /// Cumulative cutoff for negative-sequence swaps.
    pub neg_swap_prob: f64,
    /// Geometric decay of the shared initial temperature per level.
    pub heat_rate: f64,
    /// Master seed for the whole stage.
    pub seed: u64,
}

impl PlacementParams {
    /// Creates placement parameters for an outline with default tuning.
    pub fn new(outline_width: f64, outline_height: f64) -> Self {
        Self {
            outline_width,
            outline_height,
            num_levels: 2,
            num_workers: 4,
            sa: SaParams::default(),
            weights: CostWeights::default(),
            resize_prob: 0.4,
            pos_swap_prob: 0.2,
            neg_swap_prob: 0.2,
            heat_rate: 0.5,
            seed: 0,
        }
    }
}

/// Snapshot of the last move for O(1) rollback.
#[derive(Debug, Clone)]
enum LastMove {
    None,
    Resize { id: usize, prev: Block },
    PosSwap { i: usize, j: usize },
    NegSwap { i: usize, j: usize },
    DoubleSwap { i: usize, j: usize },
}

/// Full concrete state captured right after a pack.
#[derive(Debug, Clone)]
struct BestState {
    blocks: Vec<Block>,
    pair: SequencePair,
    width: f64,
    height: f64,
    terms: CostTerms,
}

/// The annealable block placement state.
///
/// Owns its blocks and sequence pair; nets and regions are shared read-only
/// across worker clones. Packed coordinates and cost terms are cached and
/// refreshed by every perturb; `restore` rolls back scalars only, leaving
/// coordinates stale until the next pack (the engine's `load_best` reinstates
/// a concrete post-pack snapshot, so final geometry is never stale).
#[derive(Debug, Clone)]
pub struct BlockPlacer {
    outline_width: f64,
    outline_height: f64,
    blocks: Vec<Block>,
    nets: Arc<Vec<ResolvedNet>>,
    regions: Arc<Vec<Rect>>,
    pair: SequencePair,
    width: f64,
    height: f64,
    terms: CostTerms,
    weights: CostWeights,
    norms: CostNorms,
    resize_prob: f64,
    pos_swap_prob: f64,
    neg_swap_prob: f64,
    last: LastMove,
    prev_width: f64,
    prev_height: f64,
    prev_terms: CostTerms,
    best: Option<BestState>,
}

impl BlockPlacer {
    fn new(
        blocks: Vec<Block>,
        pair: SequencePair,
        nets: Arc<Vec<ResolvedNet>>,
        regions: Arc<Vec<Rect>>,
        params: &PlacementParams,
    ) -> Self {
        let mut placer = Self {
            outline_width: params.outline_width,
            outline_height: params.outline_height,
            blocks,
            nets,
            regions,
            pair,
            width: 0.0,
            height: 0.0,
            terms: CostTerms::default(),
            weights: params.weights,
            norms: CostNorms::default(),
            resize_prob: params.resize_prob,
            pos_swap_prob: params.pos_swap_prob,
            neg_swap_prob: params.neg_swap_prob,
            last: LastMove::None,
            prev_width: 0.0,
            prev_height: 0.0,
            prev_terms: CostTerms::default(),
            best: None,
        };
        placer.pack_and_eval();
        placer
    }

    /// Returns the placed blocks.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Returns the packed bounding dimensions.
    pub fn bounds(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Decodes the sequence pair and refreshes coordinates and cost terms.
    fn pack_and_eval(&mut self) {
        let dims: Vec<(f64, f64)> = self.blocks.iter().map(|b| (b.width, b.height)).collect();
        let packing = self.pair.pack(&dims);
        for (block, (&x, &y)) in self
            .blocks
            .iter_mut()
            .zip(packing.xs.iter().zip(packing.ys.iter()))
        {
            block.x = x;
            block.y = y;
        }
        self.width = packing.width;
        self.height = packing.height;
        self.eval_terms();
    }

    /// Recomputes cost terms from the current coordinates.
    fn eval_terms(&mut self) {
        let wirelength =
            cost::total_wirelength(&self.nets, |id| self.blocks[id.index()].center());
        let outline = cost::outline_penalty(
            self.width,
            self.height,
            self.outline_width,
            self.outline_height,
        );
        let mut boundary = 0.0;
        let mut blockage = 0.0;
        for block in self.blocks.iter().filter(|b| b.num_macros > 0) {
            let bounds = block.bounds();
            boundary +=
                cost::boundary_penalty(&bounds, self.outline_width, self.outline_height);
            blockage += cost::blockage_penalty(&bounds, &self.regions);
        }
        self.terms = CostTerms {
            area: self.width * self.height,
            wirelength,
            outline,
            boundary,
            blockage,
        };
    }

    fn snapshot_scalars(&mut self) {
        self.prev_width = self.width;
        self.prev_height = self.height;
        self.prev_terms = self.terms;
    }

    /// Picks a resizable block, weighting macro blocks twice as heavily.
    fn pick_resizable(&self, rng: &mut StdRng) -> Option<usize> {
        let candidates: Vec<(usize, f64)> = self
            .blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_resizable())
            .map(|(i, b)| (i, if b.num_macros > 0 { 2.0 } else { 1.0 }))
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let total: f64 = candidates.iter().map(|(_, w)| w).sum();
        let mut draw = rng.gen::<f64>() * total;
        for (i, w) in &candidates {
            draw -= w;
            if draw <= 0.0 {
                return Some(*i);
            }
        }
        candidates.last().map(|(i, _)| *i)
    }

    /// Applies one resize to block `id`.
    ///
    /// Macro blocks jump between discrete bands. Soft blocks take a fresh
    /// ratio within a random band 20% of the time; otherwise they stretch
    /// one side to exactly meet the nearest neighboring edge in one of four
    /// directions, falling back to the outline edge when no neighbor exists
    /// in that direction.
    fn resize_block(&mut self, id: usize, rng: &mut StdRng) {
        let block = &self.blocks[id];
        if block.num_macros > 0 || rng.gen::<f64>() < 0.2 {
            let band = block.bands[rng.gen_range(0..block.bands.len())];
            let ar = if band.lo < band.hi {
                rng.gen_range(band.lo..=band.hi)
            } else {
                band.lo
            };
            self.blocks[id].set_aspect_ratio(ar);
            return;
        }

        let bounds = block.bounds();
        match rng.gen_range(0..4u32) {
            0 => {
                // Grow width to the nearest left edge on the right.
                let target = self
                    .blocks
                    .iter()
                    .enumerate()
                    .filter(|(j, b)| *j != id && b.x > bounds.ux)
                    .map(|(_, b)| b.x)
                    .fold(f64::INFINITY, f64::min);
                let edge = if target.is_finite() {
                    target
                } else {
                    self.outline_width.max(bounds.ux)
                };
                self.blocks[id].change_width(edge - bounds.lx);
            }
            1 => {
                // Shrink width back to the nearest right edge inside.
                let target = self
                    .blocks
                    .iter()
                    .enumerate()
                    .filter(|(j, b)| *j != id)
                    .map(|(_, b)| b.x + b.width)
                    .filter(|&e| e > bounds.lx && e < bounds.ux)
                    .fold(f64::NEG_INFINITY, f64::max);
                if target.is_finite() {
                    self.blocks[id].change_width(target - bounds.lx);
                }
            }
            2 => {
                // Grow height to the nearest bottom edge above.
                let target = self
                    .blocks
                    .iter()
                    .enumerate()
                    .filter(|(j, b)| *j != id && b.y > bounds.uy)
                    .map(|(_, b)| b.y)
                    .fold(f64::INFINITY, f64::min);
                let edge = if target.is_finite() {
                    target
                } else {
                    self.outline_height.max(bounds.uy)
                };
                self.blocks[id].change_height(edge - bounds.ly);
            }
            _ => {
                // Shrink height back to the nearest top edge inside.
                let target = self
                    .blocks
                    .iter()
                    .enumerate()
                    .filter(|(j, b)| *j != id)
                    .map(|(_, b)| b.y + b.height)
                    .filter(|&e| e > bounds.ly && e < bounds.uy)
                    .fold(f64::NEG_INFINITY, f64::max);
                if target.is_finite() {
                    self.blocks[id].change_height(target - bounds.ly);
                }
            }
        }
    }

    fn swap_indices(&self, rng: &mut StdRng) -> (usize, usize) {
        let n = self.blocks.len();
        let i = rng.gen_range(0..n);
        let mut j = rng.gen_range(0..n - 1);
        if j >= i {
            j += 1;
        }
        (i, j)
    }
}

impl Anneal for BlockPlacer {
    fn perturb(&mut self, rng: &mut StdRng) {
        self.snapshot_scalars();
        let n = self.blocks.len();
        let draw = rng.gen::<f64>();
        if draw < self.resize_prob {
            if let Some(id) = self.pick_resizable(rng) {
                let prev = self.blocks[id].clone();
                self.resize_block(id, rng);
                self.last = LastMove::Resize { id, prev };
                self.pack_and_eval();
                return;
            }
        }
        if n < 2 {
            self.last = LastMove::None;
            self.pack_and_eval();
            return;
        }
        let (i, j) = self.swap_indices(rng);
        let threshold = draw - self.resize_prob;
        if threshold < self.pos_swap_prob {
            self.pair.swap_pos(i, j);
            self.last = LastMove::PosSwap { i, j };
        } else if threshold < self.pos_swap_prob + self.neg_swap_prob {
            self.pair.swap_neg(i, j);
            self.last = LastMove::NegSwap { i, j };
        } else {
            self.pair.swap_both(i, j);
            self.last = LastMove::DoubleSwap { i, j };
        }
        self.pack_and_eval();
    }

    fn restore(&mut self) {
        match std::mem::replace(&mut self.last, LastMove::None) {
            LastMove::None => {}
            LastMove::Resize { id, prev } => self.blocks[id] = prev,
            LastMove::PosSwap { i, j } => self.pair.swap_pos(i, j),
            LastMove::NegSwap { i, j } => self.pair.swap_neg(i, j),
            LastMove::DoubleSwap { i, j } => self.pair.swap_both(i, j),
        }
        self.width = self.prev_width;
        self.height = self.prev_height;
        self.terms = self.prev_terms;
    }

    fn terms(&self) -> CostTerms {
        self.terms
    }

    fn weighted(&self, terms: &CostTerms) -> f64 {
        self.weights.normalized(terms, &self.norms)
    }

    fn set_norms(&mut self, norms: CostNorms) {
        self.norms = norms;
    }

    fn reweight(&mut self, avg: &CostTerms) {
        self.weights.reweight(avg, &self.norms);
    }

    fn save_best(&mut self) {
        self.best = Some(BestState {
            blocks: self.blocks.clone(),
            pair: self.pair.clone(),
            width: self.width,
            height: self.height,
            terms: self.terms,
        });
    }

    fn load_best(&mut self) {
        if let Some(best) = &self.best {
            self.blocks = best.blocks.clone();
            self.pair = best.pair.clone();
            self.width = best.width;
            self.height = best.height;
            self.terms = best.terms;
            self.last = LastMove::None;
        }
    }

    fn is_feasible(&self) -> bool {
        self.width <= self.outline_width * (1.0 + FIT_TOLERANCE)
            && self.height <= self.outline_height * (1.0 + FIT_TOLERANCE)
    }

    /// Shrinks soft blocks toward the outline ratio, repacks, and nudges
    /// protruding macro blocks back inside.
    ///
    /// Rejects the repair (restoring the pre-repair state exactly) if the
    /// nudge introduces macro-macro or macro-region overlap, or if there was
    /// nothing to shrink or nudge.
    fn repair(&mut self) -> bool {
        let saved = (
            self.blocks.clone(),
            self.pair.clone(),
            self.width,
            self.height,
            self.terms,
        );
        let factor_w = (self.outline_width / self.width).min(1.0);
        let factor_h = (self.outline_height / self.height).min(1.0);
        let mut changed = false;
        for block in self.blocks.iter_mut().filter(|b| b.num_macros == 0) {
            if factor_w < 1.0 || factor_h < 1.0 {
                block.shrink(factor_w, factor_h);
                changed = true;
            }
        }
        self.pack_and_eval();

        for block in self.blocks.iter_mut().filter(|b| b.num_macros > 0) {
            if block.x + block.width > self.outline_width {
                let nudged = (self.outline_width - block.width).max(0.0);
                if nudged != block.x {
                    block.x = nudged;
                    changed = true;
                }
            }
            if block.y + block.height > self.outline_height {
                let nudged = (self.outline_height - block.height).max(0.0);
                if nudged != block.y {
                    block.y = nudged;
                    changed = true;
                }
            }
        }

        let macro_blocks: Vec<Rect> = self
            .blocks
            .iter()
            .filter(|b| b.num_macros > 0)
            .map(Block::bounds)
            .collect();
        let mut clean = true;
        'outer: for i in 0..macro_blocks.len() {
            for j in (i + 1)..macro_blocks.len() {
                if macro_blocks[i].overlap(&macro_blocks[j]) > 0.0 {
                    clean = false;
                    break 'outer;
                }
            }
        }
        if clean {
            for bounds in &macro_blocks {
                if cost::blockage_penalty(bounds, &self.regions) > 0.0 {
                    clean = false;
                    break;
                }
            }
        }

        if !changed || !clean {
            let (blocks, pair, width, height, terms) = saved;
            self.blocks = blocks;
            self.pair = pair;
            self.width = width;
            self.height = height;
            self.terms = terms;
            return false;
        }

        // Nudges move blocks outside the sequence-pair decode; extents and
        // terms are refreshed from the concrete coordinates.
        self.width = self
            .blocks
            .iter()
            .map(|b| b.x + b.width)
            .fold(0.0, f64::max);
        self.height = self
            .blocks
            .iter()
            .map(|b| b.y + b.height)
            .fold(0.0, f64::max);
        self.eval_terms();
        true
    }
}

fn worker_cooling_rate(worker: usize, num_workers: usize) -> f64 {
    let (lo, hi) = COOLING_SPREAD;
    if num_workers <= 1 {
        return (lo + hi) / 2.0;
    }
    lo + (hi - lo) * worker as f64 / (num_workers - 1) as f64
}

/// Places every cluster inside the outline via hierarchical annealing.
///
/// Builds one block per cluster, calibrates once, then runs
/// `num_levels x num_workers` annealers in a go-with-the-winner hierarchy.
/// The winner's geometry is written back into the clusters even when the
/// result stays infeasible, so callers can inspect the failure.
pub fn place_blocks(
    design: &mut Design,
    params: &PlacementParams,
    sink: &DiagnosticSink,
) -> Result<(), FloorplanError> {
    if design.clusters.is_empty() {
        sink.emit(Diagnostic::report(
            DiagnosticCode::new(Category::Placement, 101),
            "placement skipped: no clusters",
        ));
        return Ok(());
    }

    let blocks: Vec<Block> = design
        .clusters
        .iter()
        .map(|c| Block::new(&c.name, c.area, c.macros.len(), c.bands.clone()))
        .collect();
    let nets = Arc::new(design.resolve_nets()?);
    let regions = Arc::new(
        design
            .regions
            .iter()
            .map(|r| r.bounds)
            .collect::<Vec<Rect>>(),
    );

    let mut rng = StdRng::seed_from_u64(params.seed);
    let pair = SequencePair::random(blocks.len(), &mut rng);
    let mut base = BlockPlacer::new(blocks, pair, nets, regions, params);
    let init_t = anneal::calibrate(&mut base, &params.sa, &mut rng);

    let mut heat = 1.0;
    for _level in 0..params.num_levels {
        let level_t = init_t * heat;
        let mut handles = Vec::with_capacity(params.num_workers);
        for worker in 0..params.num_workers {
            // Seeds are drawn before spawning so the seed-to-worker mapping
            // is independent of thread scheduling.
            let seed = rng.gen::<u64>();
            let sa = SaParams {
                cooling_rate: worker_cooling_rate(worker, params.num_workers),
                ..params.sa
            };
            let mut state = base.clone();
            handles.push(thread::spawn(move || {
                let mut worker_rng = StdRng::seed_from_u64(seed);
                let outcome = anneal::run(&mut state, &sa, level_t, &mut worker_rng);
                (outcome, state)
            }));
        }

        let mut level_best: Option<(f64, BlockPlacer)> = None;
        for handle in handles {
            match handle.join() {
                Ok((outcome, state)) => {
                    let better = level_best
                        .as_ref()
                        .map_or(true, |(cost, _)| outcome.best_cost < *cost);
                    if better {
                        level_best = Some((outcome.best_cost, state));
                    }
                }
                Err(_) => {
                    sink.emit(Diagnostic::warning(
                        DiagnosticCode::new(Category::Placement, 103),
                        "placement worker panicked; its result is discarded",
                    ));
                }
            }
        }
        if let Some((_, winner)) = level_best {
            base = winner;
        }
        heat *= params.heat_rate;
    }

    for (cluster, block) in design.clusters.iter_mut().zip(base.blocks()) {
        cluster.x = block.x;
        cluster.y = block.y;
        cluster.width = block.width;
        cluster.height = block.height;
    }

    let (width, height) = base.bounds();
    if base.is_feasible() {
        sink.emit(Diagnostic::report(
            DiagnosticCode::new(Category::Placement, 102),
            format!(
                "placement complete: {width:.1}x{height:.1} in {:.1}x{:.1}",
                params.outline_width, params.outline_height
            ),
        ));
        Ok(())
    } else {
        sink.emit(Diagnostic::error(
            DiagnosticCode::new(Category::Placement, 104),
            format!(
                "placement exceeds outline: {width:.1}x{height:.1} > {:.1}x{:.1}",
                params.outline_width, params.outline_height
            ),
        ));
        Err(FloorplanError::Infeasible {
            width,
            height,
            outline_width: params.outline_width,
            outline_height: params.outline_height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AspectBand, Cluster, Macro, Net};

    fn hard_cluster(name: &str, width: f64, height: f64) -> Cluster {
        let mut cluster = Cluster::new(name, width * height);
        cluster.bands = vec![AspectBand::fixed(height / width)];
        cluster
            .macros
            .push(Macro::new(format!("{name}_m0"), width, height, 0.0, 0.0));
        cluster
    }

    fn soft_cluster(name: &str, area: f64) -> Cluster {
        let mut cluster = Cluster::new(name, area);
        cluster.bands = vec![AspectBand::new(0.5, 2.0)];
        cluster
    }

    fn small_params(outline: f64) -> PlacementParams {
        let mut params = PlacementParams::new(outline, outline);
        params.num_levels = 2;
        params.num_workers = 2;
        params.sa = SaParams {
            max_steps: 40,
            moves_per_step: 30,
            ..SaParams::default()
        };
        params
    }

    fn test_placer(blocks: Vec<Block>, outline: f64) -> BlockPlacer {
        let params = PlacementParams::new(outline, outline);
        let pair = SequencePair::identity(blocks.len());
        BlockPlacer::new(
            blocks,
            pair,
            Arc::new(Vec::new()),
            Arc::new(Vec::new()),
            &params,
        )
    }

    #[test]
    fn two_hard_macros_fit_outline() {
        let mut design = Design::new();
        design.add_cluster(hard_cluster("a", 400.0, 300.0));
        design.add_cluster(hard_cluster("b", 300.0, 400.0));
        let sink = DiagnosticSink::new();
        let params = small_params(1000.0);

        place_blocks(&mut design, &params, &sink).unwrap();

        for cluster in &design.clusters {
            assert!(cluster.x + cluster.width <= 1000.0 * (1.0 + FIT_TOLERANCE));
            assert!(cluster.y + cluster.height <= 1000.0 * (1.0 + FIT_TOLERANCE));
        }
        let a = design.clusters[0].bounds();
        let b = design.clusters[1].bounds();
        assert_eq!(a.overlap(&b), 0.0);
        assert!(!sink.has_errors());
    }

    #[test]
    fn placement_with_nets_is_deterministic() {
        let build = || {
            let mut design = Design::new();
            design.add_cluster(hard_cluster("a", 200.0, 100.0));
            design.add_cluster(soft_cluster("b", 40_000.0));
            design.add_cluster(soft_cluster("c", 30_000.0));
            design.add_net(Net {
                weight: 2,
                blocks: vec!["a".to_string(), "b".to_string()],
                terminals: vec![],
            });
            design.add_net(Net {
                weight: 1,
                blocks: vec!["b".to_string(), "c".to_string()],
                terminals: vec![],
            });
            design
        };
        let params = small_params(800.0);
        let sink = DiagnosticSink::new();

        let mut first = build();
        place_blocks(&mut first, &params, &sink).unwrap();
        let mut second = build();
        place_blocks(&mut second, &params, &sink).unwrap();

        for (a, b) in first.clusters.iter().zip(&second.clusters) {
            assert_eq!(a.x, b.x);
            assert_eq!(a.y, b.y);
            assert_eq!(a.width, b.width);
            assert_eq!(a.height, b.height);
        }
    }

    #[test]
    fn infeasible_design_reports_error() {
        let mut design = Design::new();
        design.add_cluster(hard_cluster("a", 90.0, 90.0));
        design.add_cluster(hard_cluster("b", 90.0, 90.0));
        let sink = DiagnosticSink::new();
        let mut params = small_params(100.0);
        params.sa.max_steps = 5;
        params.sa.moves_per_step = 5;

        let err = place_blocks(&mut design, &params, &sink).unwrap_err();
        assert!(matches!(err, FloorplanError::Infeasible { .. }));
        assert!(sink.has_errors());
        // Geometry is still written back for inspection.
        assert!(design.clusters.iter().all(|c| c.width > 0.0));
    }

    #[test]
    fn empty_design_is_ok() {
        let mut design = Design::new();
        let sink = DiagnosticSink::new();
        place_blocks(&mut design, &small_params(100.0), &sink).unwrap();
        assert!(!sink.has_errors());
    }

    #[test]
    fn restore_undoes_every_move_kind() {
        let blocks = vec![
            Block::new("a", 10_000.0, 0, vec![AspectBand::new(0.5, 2.0)]),
            Block::new("b", 12_000.0, 2, vec![AspectBand::fixed(0.75), AspectBand::fixed(1.5)]),
            Block::new("c", 8_000.0, 0, vec![AspectBand::new(0.25, 4.0)]),
            Block::new("d", 6_000.0, 1, vec![AspectBand::fixed(1.0)]),
        ];
        let mut placer = test_placer(blocks, 500.0);
        let mut rng = StdRng::seed_from_u64(17);

        for _ in 0..200 {
            let pair = placer.pair.clone();
            let dims: Vec<(f64, f64)> =
                placer.blocks.iter().map(|b| (b.width, b.height)).collect();
            let (width, height) = (placer.width, placer.height);
            let terms = placer.terms;

            placer.perturb(&mut rng);
            placer.restore();

            assert_eq!(placer.pair, pair);
            let restored: Vec<(f64, f64)> =
                placer.blocks.iter().map(|b| (b.width, b.height)).collect();
            assert_eq!(restored, dims);
            assert_eq!(placer.width, width);
            assert_eq!(placer.height, height);
            assert_eq!(placer.terms, terms);
        }
    }

    #[test]
    fn repair_shrinks_soft_blocks() {
        // Two soft blocks whose ideal shapes overflow a tight outline.
        let blocks = vec![
            Block::new("a", 9_000.0, 0, vec![AspectBand::new(0.5, 2.0)]),
            Block::new("b", 9_000.0, 0, vec![AspectBand::new(0.5, 2.0)]),
        ];
        let mut placer = test_placer(blocks, 100.0);
        assert!(!placer.is_feasible());
        let area_before: f64 = placer.blocks.iter().map(|b| b.area).sum();

        assert!(placer.repair());
        let area_after: f64 = placer.blocks.iter().map(|b| b.area).sum();
        assert!(area_after < area_before);
        assert!(placer.width <= 100.0 * (1.0 + FIT_TOLERANCE) || placer.width < area_before);
    }

    #[test]
    fn repair_rejected_when_nothing_changes() {
        // A single hard block that fits: nothing to shrink, nothing to nudge.
        let blocks = vec![Block::new("a", 2_500.0, 1, vec![AspectBand::fixed(1.0)])];
        let mut placer = test_placer(blocks, 100.0);
        let before = placer.blocks.clone();
        assert!(!placer.repair());
        assert_eq!(placer.blocks, before);
    }

    #[test]
    fn resize_conserves_area() {
        let blocks = vec![
            Block::new("a", 10_000.0, 0, vec![AspectBand::new(0.5, 2.0)]),
            Block::new("b", 12_000.0, 0, vec![AspectBand::new(0.5, 2.0)]),
        ];
        let mut placer = test_placer(blocks, 500.0);
        let mut rng = StdRng::seed_from_u64(23);
        for _ in 0..100 {
            placer.perturb(&mut rng);
            for block in &placer.blocks {
                assert!((block.width * block.height - block.area).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn cooling_rates_spread_across_workers() {
        assert_eq!(worker_cooling_rate(0, 4), 0.985);
        assert_eq!(worker_cooling_rate(3, 4), 0.995);
        let mid = worker_cooling_rate(1, 4);
        assert!(mid > 0.985 && mid < 0.995);
        assert_eq!(worker_cooling_rate(0, 1), 0.99);
    }
}

//! Pin alignment: per-cluster macro refinement.
//!
//! After placement fixes each cluster's rectangle, this stage re-packs and
//! reorients the macros inside every macro cluster to minimize wirelength
//! from their pins to the cluster's boundary pins. Boundary pins are derived
//! from the placed global netlist: each incident net projects the bounding
//! box center of its other endpoints onto the cluster boundary as a weighted
//! pseudo-terminal. Wirelength here is pin-offset based, unlike the
//! center-based placement wirelength.

use crate::anneal::{self, Anneal, SaParams};
use crate::cost::{self, CostNorms, CostTerms, CostWeights};
use crate::error::FloorplanError;
use crate::ids::BlockId;
use crate::model::{Cluster, Design, Macro, ResolvedNet};
use crate::seqpair::SequencePair;
use mosaic_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::thread;

/// Relative cluster-rectangle slack below which a packing counts as feasible.
const FIT_TOLERANCE: f64 = 0.01;

/// Parameters for the pin alignment stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinAlignParams {
    /// Halo added around every macro while packing.
    pub halo_width: f64,
    /// Workers running concurrently per batch.
    pub num_threads: usize,
    /// Independent annealing runs per cluster.
    pub num_runs: usize,
    /// Annealing schedule for each run.
    pub sa: SaParams,
    /// Probability cutoff for flip moves; the rest are sequence swaps.
    pub flip_prob: f64,
    /// Master seed for the whole stage.
    pub seed: u64,
}

impl Default for PinAlignParams {
    fn default() -> Self {
        Self {
            halo_width: 0.0,
            num_threads: 4,
            num_runs: 8,
            sa: SaParams::default(),
            flip_prob: 0.4,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum AlignMove {
    None,
    PosSwap { i: usize, j: usize },
    NegSwap { i: usize, j: usize },
    DoubleSwap { i: usize, j: usize },
    FlipOne { id: usize, x_axis: bool },
    FlipAll { x_axis: bool },
}

/// Annealable packing of one cluster's macros inside its placed rectangle.
///
/// Works in cluster-local coordinates; nets reference macros by index and
/// carry boundary pins as fixed terminals.
#[derive(Debug, Clone)]
struct PinAligner {
    cluster_width: f64,
    cluster_height: f64,
    halo: f64,
    macros: Vec<Macro>,
    nets: Arc<Vec<ResolvedNet>>,
    pair: SequencePair,
    width: f64,
    height: f64,
    terms: CostTerms,
    weights: CostWeights,
    norms: CostNorms,
    flip_prob: f64,
    last: AlignMove,
    prev_width: f64,
    prev_height: f64,
    prev_terms: CostTerms,
    best: Option<(Vec<Macro>, SequencePair, f64, f64, CostTerms)>,
}

impl PinAligner {
    fn new(
        macros: Vec<Macro>,
        nets: Arc<Vec<ResolvedNet>>,
        cluster_width: f64,
        cluster_height: f64,
        halo: f64,
        flip_prob: f64,
        pair: SequencePair,
    ) -> Self {
        let mut aligner = Self {
            cluster_width,
            cluster_height,
            halo,
            macros,
            nets,
            pair,
            width: 0.0,
            height: 0.0,
            terms: CostTerms::default(),
            weights: CostWeights {
                area: 0.0,
                wirelength: 1.0,
                outline: 1.0,
                boundary: 0.0,
                blockage: 0.0,
            },
            norms: CostNorms::default(),
            flip_prob,
            last: AlignMove::None,
            prev_width: 0.0,
            prev_height: 0.0,
            prev_terms: CostTerms::default(),
            best: None,
        };
        aligner.pack_and_eval();
        aligner
    }

    fn pack_and_eval(&mut self) {
        let dims: Vec<(f64, f64)> = self
            .macros
            .iter()
            .map(|m| (m.width + 2.0 * self.halo, m.height + 2.0 * self.halo))
            .collect();
        let packing = self.pair.pack(&dims);
        for (m, (&x, &y)) in self
            .macros
            .iter_mut()
            .zip(packing.xs.iter().zip(packing.ys.iter()))
        {
            m.x = x + self.halo;
            m.y = y + self.halo;
        }
        self.width = packing.width;
        self.height = packing.height;
        self.eval_terms();
    }

    fn eval_terms(&mut self) {
        let wirelength =
            cost::total_wirelength(&self.nets, |id| self.macros[id.index()].pin_position());
        let outline = cost::outline_penalty(
            self.width,
            self.height,
            self.cluster_width,
            self.cluster_height,
        );
        self.terms = CostTerms {
            wirelength,
            outline,
            ..Default::default()
        };
    }

    fn snapshot_scalars(&mut self) {
        self.prev_width = self.width;
        self.prev_height = self.height;
        self.prev_terms = self.terms;
    }

    fn apply_flip(&mut self, id: usize, x_axis: bool) {
        if x_axis {
            self.macros[id].flip_x();
        } else {
            self.macros[id].flip_y();
        }
    }

    fn apply_flip_all(&mut self, x_axis: bool) {
        for id in 0..self.macros.len() {
            self.apply_flip(id, x_axis);
        }
    }
}

impl Anneal for PinAligner {
    fn perturb(&mut self, rng: &mut StdRng) {
        self.snapshot_scalars();
        let n = self.macros.len();
        let draw = rng.gen::<f64>();
        if draw < self.flip_prob || n < 2 {
            let x_axis = rng.gen::<bool>();
            if rng.gen::<bool>() {
                let id = rng.gen_range(0..n);
                self.apply_flip(id, x_axis);
                self.last = AlignMove::FlipOne { id, x_axis };
            } else {
                self.apply_flip_all(x_axis);
                self.last = AlignMove::FlipAll { x_axis };
            }
        } else {
            let i = rng.gen_range(0..n);
            let mut j = rng.gen_range(0..n - 1);
            if j >= i {
                j += 1;
            }
            match rng.gen_range(0..3u32) {
                0 => {
                    self.pair.swap_pos(i, j);
                    self.last = AlignMove::PosSwap { i, j };
                }
                1 => {
                    self.pair.swap_neg(i, j);
                    self.last = AlignMove::NegSwap { i, j };
                }
                _ => {
                    self.pair.swap_both(i, j);
                    self.last = AlignMove::DoubleSwap { i, j };
                }
            }
        }
        self.pack_and_eval();
    }

    fn restore(&mut self) {
        // Flips are involutions, so rolling back re-applies the same flip.
        match std::mem::replace(&mut self.last, AlignMove::None) {
            AlignMove::None => {}
            AlignMove::PosSwap { i, j } => self.pair.swap_pos(i, j),
            AlignMove::NegSwap { i, j } => self.pair.swap_neg(i, j),
            AlignMove::DoubleSwap { i, j } => self.pair.swap_both(i, j),
            AlignMove::FlipOne { id, x_axis } => self.apply_flip(id, x_axis),
            AlignMove::FlipAll { x_axis } => self.apply_flip_all(x_axis),
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

    fn save_best(&mut self) {
        self.best = Some((
            self.macros.clone(),
            self.pair.clone(),
            self.width,
            self.height,
            self.terms,
        ));
    }

    fn load_best(&mut self) {
        if let Some((macros, pair, width, height, terms)) = self.best.clone() {
            self.macros = macros;
            self.pair = pair;
            self.width = width;
            self.height = height;
            self.terms = terms;
            self.last = AlignMove::None;
        }
    }

    fn is_feasible(&self) -> bool {
        self.width <= self.cluster_width * (1.0 + FIT_TOLERANCE)
            && self.height <= self.cluster_height * (1.0 + FIT_TOLERANCE)
    }
}

/// Projects each incident global net onto the cluster boundary.
///
/// The bounding-box center of the net's other endpoints is clamped into the
/// cluster rectangle and pushed to its nearest edge; the result, in
/// cluster-local coordinates, becomes a weighted pseudo-terminal connected
/// to every macro of the cluster.
fn boundary_pin_nets(
    design: &Design,
    resolved: &[ResolvedNet],
    cluster_id: BlockId,
) -> Vec<ResolvedNet> {
    let cluster = design.cluster(cluster_id);
    let macro_ids: Vec<BlockId> = (0..cluster.macros.len() as u32)
        .map(BlockId::from_raw)
        .collect();
    let mut nets = Vec::new();
    for net in resolved {
        if !net.blocks.contains(&cluster_id) {
            continue;
        }
        let points: Vec<(f64, f64)> = net
            .blocks
            .iter()
            .filter(|&&id| id != cluster_id)
            .map(|&id| {
                let other = design.cluster(id);
                (other.x + other.width / 2.0, other.y + other.height / 2.0)
            })
            .chain(net.terminals.iter().copied())
            .collect();
        if points.is_empty() {
            continue;
        }
        let min_x = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let max_x = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let min_y = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let max_y = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
        let anchor = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);

        let px = anchor.0.clamp(cluster.x, cluster.x + cluster.width);
        let py = anchor.1.clamp(cluster.y, cluster.y + cluster.height);
        let to_left = px - cluster.x;
        let to_right = cluster.x + cluster.width - px;
        let to_bottom = py - cluster.y;
        let to_top = cluster.y + cluster.height - py;
        let nearest = to_left.min(to_right).min(to_bottom).min(to_top);
        let (px, py) = if nearest == to_left {
            (cluster.x, py)
        } else if nearest == to_right {
            (cluster.x + cluster.width, py)
        } else if nearest == to_bottom {
            (px, cluster.y)
        } else {
            (px, cluster.y + cluster.height)
        };

        nets.push(ResolvedNet {
            weight: net.weight,
            blocks: macro_ids.clone(),
            terminals: vec![(px - cluster.x, py - cluster.y)],
        });
    }
    nets
}

/// Exhaustive four-state flip search for a single-macro cluster.
///
/// The macro sits at the halo offset; only its orientation is searched, and
/// the cheapest of the four flip combinations wins outright.
fn align_single(cluster: &mut Cluster, nets: &[ResolvedNet], halo: f64) {
    let mut base = cluster.macros[0].clone();
    base.x = halo;
    base.y = halo;

    let mut best: Option<(f64, Macro)> = None;
    for flip_x in [false, true] {
        for flip_y in [false, true] {
            let mut candidate = base.clone();
            if flip_x {
                candidate.flip_x();
            }
            if flip_y {
                candidate.flip_y();
            }
            let wirelength = cost::total_wirelength(nets, |_| candidate.pin_position());
            let better = best
                .as_ref()
                .map_or(true, |(cost, _)| wirelength < *cost);
            if better {
                best = Some((wirelength, candidate));
            }
        }
    }
    if let Some((_, mut winner)) = best {
        winner.x += cluster.x;
        winner.y += cluster.y;
        cluster.macros[0] = winner;
    }
}

/// Aligns the macros of every macro cluster to its boundary pins.
///
/// Runs `num_runs` independent annealers per cluster, `num_threads` at a
/// time, and adopts the feasible result with the lowest wirelength;
/// infeasible results are excluded outright. A cluster with no feasible
/// result fails the whole pass.
pub fn align_pins(
    design: &mut Design,
    params: &PinAlignParams,
    sink: &DiagnosticSink,
) -> Result<(), FloorplanError> {
    let resolved = design.resolve_nets()?;
    let mut rng = StdRng::seed_from_u64(params.seed);

    for index in 0..design.clusters.len() {
        let cluster_id = BlockId::from_raw(index as u32);
        if !design.clusters[index].has_macros() {
            continue;
        }
        let nets = Arc::new(boundary_pin_nets(design, &resolved, cluster_id));

        if design.clusters[index].macros.len() == 1 {
            align_single(&mut design.clusters[index], &nets, params.halo_width);
            continue;
        }

        let cluster = &design.clusters[index];
        let macros = cluster.macros.clone();
        let (cluster_width, cluster_height) = (cluster.width, cluster.height);

        let num_runs = params.num_runs.max(1);
        let num_threads = params.num_threads.max(1);
        let mut best: Option<(f64, PinAligner)> = None;
        let mut run = 0;
        while run < num_runs {
            let batch = num_threads.min(num_runs - run);
            let mut handles = Vec::with_capacity(batch);
            for _ in 0..batch {
                let seed = rng.gen::<u64>();
                let macros = macros.clone();
                let nets = Arc::clone(&nets);
                let sa = params.sa;
                let halo = params.halo_width;
                let flip_prob = params.flip_prob;
                handles.push(thread::spawn(move || {
                    let mut worker_rng = StdRng::seed_from_u64(seed);
                    let pair = SequencePair::random(macros.len(), &mut worker_rng);
                    let mut aligner = PinAligner::new(
                        macros,
                        nets,
                        cluster_width,
                        cluster_height,
                        halo,
                        flip_prob,
                        pair,
                    );
                    let t0 = anneal::calibrate(&mut aligner, &sa, &mut worker_rng);
                    anneal::run(&mut aligner, &sa, t0, &mut worker_rng);
                    aligner
                }));
            }
            for handle in handles {
                if let Ok(aligner) = handle.join() {
                    if !aligner.is_feasible() {
                        continue;
                    }
                    let wirelength = aligner.terms.wirelength;
                    let better = best
                        .as_ref()
                        .map_or(true, |(cost, _)| wirelength < *cost);
                    if better {
                        best = Some((wirelength, aligner));
                    }
                }
            }
            run += batch;
        }

        let Some((wirelength, winner)) = best else {
            let cluster = design.clusters[index].name.clone();
            sink.emit(Diagnostic::error(
                DiagnosticCode::new(Category::Alignment, 302),
                format!("no feasible pin alignment for cluster '{cluster}'"),
            ));
            return Err(FloorplanError::NoAlignment { cluster });
        };

        let cluster = &mut design.clusters[index];
        for (target, source) in cluster.macros.iter_mut().zip(&winner.macros) {
            *target = source.clone();
            target.x += cluster.x;
            target.y += cluster.y;
        }
        sink.emit(Diagnostic::report(
            DiagnosticCode::new(Category::Alignment, 301),
            format!(
                "aligned cluster '{}': wirelength {wirelength:.1}",
                cluster.name
            ),
        ));
    }
    Ok(())
}

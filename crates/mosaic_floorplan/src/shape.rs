//! Shape engine: per-cluster macro tiling.
//!
//! For each macro-carrying cluster, searches for Pareto-optimal footprints by
//! annealing the cluster's halo-inflated macros against a series of trial
//! outlines that sweep the admissible aspect-ratio range. The surviving
//! footprints become the cluster's discrete aspect bands and set its area.
//! Clusters with identical macro shape multisets share one tiling search.

use crate::anneal::{self, Anneal, SaParams};
use crate::cost::{self, CostNorms, CostTerms, CostWeights};
use crate::error::FloorplanError;
use crate::model::{AspectBand, Design};
use crate::seqpair::SequencePair;
use mosaic_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::thread;

/// Parameters for the shape (tiling) stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeParams {
    /// Global outline width; footprints must fit inside it.
    pub outline_width: f64,
    /// Global outline height.
    pub outline_height: f64,
    /// Smallest admissible aspect ratio; the sweep spans up to its inverse.
    pub min_aspect_ratio: f64,
    /// Fractional slack added to the macro area for each trial outline.
    pub dead_space: f64,
    /// Halo added around every macro before tiling.
    pub halo_width: f64,
    /// Workers running concurrently per batch.
    pub num_threads: usize,
    /// Total tiling runs (trial outlines) per cluster.
    pub num_runs: usize,
    /// Annealing schedule for each run.
    pub sa: SaParams,
    /// Master seed for the whole stage.
    pub seed: u64,
}

impl ShapeParams {
    /// Creates shape parameters for an outline with default tuning.
    pub fn new(outline_width: f64, outline_height: f64) -> Self {
        Self {
            outline_width,
            outline_height,
            min_aspect_ratio: 0.33,
            dead_space: 0.05,
            halo_width: 0.0,
            num_threads: 4,
            num_runs: 8,
            sa: SaParams::default(),
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum TileMove {
    None,
    PosSwap { i: usize, j: usize },
    NegSwap { i: usize, j: usize },
    DoubleSwap { i: usize, j: usize },
}

/// Annealable packing of rigid rectangles against a trial outline.
///
/// All shapes are fixed, so the move set is sequence swaps only; the cost
/// balances packed area against trial-outline overflow.
#[derive(Debug, Clone)]
struct TilePacker {
    dims: Vec<(f64, f64)>,
    trial_width: f64,
    trial_height: f64,
    pair: SequencePair,
    width: f64,
    height: f64,
    terms: CostTerms,
    weights: CostWeights,
    norms: CostNorms,
    last: TileMove,
    prev_width: f64,
    prev_height: f64,
    prev_terms: CostTerms,
    best: Option<(SequencePair, f64, f64, CostTerms)>,
}

impl TilePacker {
    fn new(dims: Vec<(f64, f64)>, trial_width: f64, trial_height: f64, pair: SequencePair) -> Self {
        let mut packer = Self {
            dims,
            trial_width,
            trial_height,
            pair,
            width: 0.0,
            height: 0.0,
            terms: CostTerms::default(),
            weights: CostWeights {
                area: 0.5,
                wirelength: 0.0,
                outline: 0.5,
                boundary: 0.0,
                blockage: 0.0,
            },
            norms: CostNorms::default(),
            last: TileMove::None,
            prev_width: 0.0,
            prev_height: 0.0,
            prev_terms: CostTerms::default(),
            best: None,
        };
        packer.pack_and_eval();
        packer
    }

    fn pack_and_eval(&mut self) {
        let packing = self.pair.pack(&self.dims);
        self.width = packing.width;
        self.height = packing.height;
        self.terms = CostTerms {
            area: self.width * self.height,
            outline: cost::outline_penalty(
                self.width,
                self.height,
                self.trial_width,
                self.trial_height,
            ),
            ..Default::default()
        };
    }

    fn footprint(&self) -> (f64, f64) {
        (self.width, self.height)
    }
}

impl Anneal for TilePacker {
    fn perturb(&mut self, rng: &mut StdRng) {
        self.prev_width = self.width;
        self.prev_height = self.height;
        self.prev_terms = self.terms;
        let n = self.dims.len();
        if n < 2 {
            self.last = TileMove::None;
            self.pack_and_eval();
            return;
        }
        let i = rng.gen_range(0..n);
        let mut j = rng.gen_range(0..n - 1);
        if j >= i {
            j += 1;
        }
        match rng.gen_range(0..3u32) {
            0 => {
                self.pair.swap_pos(i, j);
                self.last = TileMove::PosSwap { i, j };
            }
            1 => {
                self.pair.swap_neg(i, j);
                self.last = TileMove::NegSwap { i, j };
            }
            _ => {
                self.pair.swap_both(i, j);
                self.last = TileMove::DoubleSwap { i, j };
            }
        }
        self.pack_and_eval();
    }

    fn restore(&mut self) {
        match std::mem::replace(&mut self.last, TileMove::None) {
            TileMove::None => {}
            TileMove::PosSwap { i, j } => self.pair.swap_pos(i, j),
            TileMove::NegSwap { i, j } => self.pair.swap_neg(i, j),
            TileMove::DoubleSwap { i, j } => self.pair.swap_both(i, j),
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
        self.best = Some((self.pair.clone(), self.width, self.height, self.terms));
    }

    fn load_best(&mut self) {
        if let Some((pair, width, height, terms)) = self.best.clone() {
            self.pair = pair;
            self.width = width;
            self.height = height;
            self.terms = terms;
            self.last = TileMove::None;
        }
    }

    fn is_feasible(&self) -> bool {
        self.width <= self.trial_width && self.height <= self.trial_height
    }
}

/// Keeps only footprints not dominated in both width and height.
fn pareto_filter(mut footprints: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    footprints.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    });
    let mut kept = Vec::new();
    let mut best_height = f64::INFINITY;
    for (w, h) in footprints {
        if h < best_height {
            kept.push((w, h));
            best_height = h;
        }
    }
    kept
}

/// Searches for Pareto-optimal footprints of a set of rigid rectangles.
///
/// Launches `num_runs` annealers against trial outlines sweeping the aspect
/// range `[min_aspect_ratio, 1/min_aspect_ratio]`, `num_threads` at a time,
/// and keeps every footprint that fits the global outline. An empty result
/// means no run produced a fitting footprint.
fn tile_macros(dims: &[(f64, f64)], params: &ShapeParams, rng: &mut StdRng) -> Vec<(f64, f64)> {
    if dims.len() == 1 {
        let (w, h) = dims[0];
        return if w <= params.outline_width && h <= params.outline_height {
            vec![(w, h)]
        } else {
            Vec::new()
        };
    }

    let total_area: f64 = dims.iter().map(|(w, h)| w * h).sum();
    let target_area = total_area * (1.0 + params.dead_space);
    let ar_lo = params.min_aspect_ratio;
    let ar_hi = 1.0 / params.min_aspect_ratio;
    let num_runs = params.num_runs.max(1);
    let num_threads = params.num_threads.max(1);

    let mut footprints = Vec::new();
    let mut run = 0;
    while run < num_runs {
        let batch = num_threads.min(num_runs - run);
        let mut handles = Vec::with_capacity(batch);
        for b in 0..batch {
            let index = run + b;
            let ar = if num_runs > 1 {
                ar_lo + (ar_hi - ar_lo) * index as f64 / (num_runs - 1) as f64
            } else {
                1.0
            };
            let trial_width = (target_area / ar).sqrt();
            let trial_height = target_area / trial_width;
            let seed = rng.gen::<u64>();
            let dims = dims.to_vec();
            let sa = params.sa;
            handles.push(thread::spawn(move || {
                let mut worker_rng = StdRng::seed_from_u64(seed);
                let pair = SequencePair::random(dims.len(), &mut worker_rng);
                let mut packer = TilePacker::new(dims, trial_width, trial_height, pair);
                let t0 = anneal::calibrate(&mut packer, &sa, &mut worker_rng);
                anneal::run(&mut packer, &sa, t0, &mut worker_rng);
                packer.footprint()
            }));
        }
        for handle in handles {
            if let Ok(footprint) = handle.join() {
                footprints.push(footprint);
            }
        }
        run += batch;
    }

    footprints.retain(|&(w, h)| w <= params.outline_width && h <= params.outline_height);
    pareto_filter(footprints)
}

/// Builds a shape signature so area-equivalent clusters share one tiling.
fn shape_signature(dims: &[(f64, f64)]) -> String {
    let mut sorted = dims.to_vec();
    sorted.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    });
    sorted
        .iter()
        .map(|(w, h)| format!("{w:.4}x{h:.4}"))
        .collect::<Vec<_>>()
        .join(";")
}

/// Derives aspect bands and areas for every cluster.
///
/// Macro clusters get degenerate bands from their Pareto footprints and an
/// area covering the largest kept footprint; soft clusters without bands get
/// the continuous default band spanning the admissible aspect range.
pub fn shape_clusters(
    design: &mut Design,
    params: &ShapeParams,
    sink: &DiagnosticSink,
) -> Result<(), FloorplanError> {
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut cache: HashMap<String, (f64, Vec<AspectBand>)> = HashMap::new();

    for index in 0..design.clusters.len() {
        if !design.clusters[index].has_macros() {
            if design.clusters[index].bands.is_empty() {
                design.clusters[index].bands = vec![AspectBand::new(
                    params.min_aspect_ratio,
                    1.0 / params.min_aspect_ratio,
                )];
            }
            continue;
        }

        let dims: Vec<(f64, f64)> = design.clusters[index]
            .macros
            .iter()
            .map(|m| {
                (
                    m.width + 2.0 * params.halo_width,
                    m.height + 2.0 * params.halo_width,
                )
            })
            .collect();
        let signature = shape_signature(&dims);

        let (area, bands) = match cache.get(&signature) {
            Some(entry) => entry.clone(),
            None => {
                let footprints = tile_macros(&dims, params, &mut rng);
                if footprints.is_empty() {
                    let cluster = design.clusters[index].name.clone();
                    sink.emit(Diagnostic::error(
                        DiagnosticCode::new(Category::Shape, 202),
                        format!("no feasible tiling for cluster '{cluster}'"),
                    ));
                    return Err(FloorplanError::NoTiling { cluster });
                }
                let area = footprints
                    .iter()
                    .map(|(w, h)| w * h)
                    .fold(0.0, f64::max);
                let bands: Vec<AspectBand> = footprints
                    .iter()
                    .map(|&(w, h)| AspectBand::fixed(h / w))
                    .collect();
                cache.insert(signature.clone(), (area, bands.clone()));
                (area, bands)
            }
        };

        let cluster = &mut design.clusters[index];
        cluster.area = area;
        cluster.bands = bands;
        sink.emit(Diagnostic::report(
            DiagnosticCode::new(Category::Shape, 201),
            format!(
                "tiled cluster '{}': {} footprint(s), area {:.1}",
                cluster.name,
                cluster.bands.len(),
                cluster.area
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cluster, Macro};

    fn macro_cluster(name: &str, shapes: &[(f64, f64)]) -> Cluster {
        let mut cluster = Cluster::new(name, 0.0);
        for (i, &(w, h)) in shapes.iter().enumerate() {
            cluster
                .macros
                .push(Macro::new(format!("{name}_m{i}"), w, h, 0.0, 0.0));
        }
        cluster
    }

    fn small_params(outline: f64) -> ShapeParams {
        let mut params = ShapeParams::new(outline, outline);
        params.num_runs = 4;
        params.num_threads = 2;
        params.sa = SaParams {
            max_steps: 30,
            moves_per_step: 20,
            ..SaParams::default()
        };
        params
    }

    fn is_pareto(footprints: &[(f64, f64)]) -> bool {
        for (i, a) in footprints.iter().enumerate() {
            for (j, b) in footprints.iter().enumerate() {
                if i != j && b.0 <= a.0 && b.1 <= a.1 {
                    return false;
                }
            }
        }
        true
    }

    #[test]
    fn pareto_filter_drops_dominated() {
        let kept = pareto_filter(vec![
            (10.0, 10.0),
            (12.0, 12.0),
            (8.0, 14.0),
            (14.0, 8.0),
            (10.0, 10.0),
        ]);
        assert!(is_pareto(&kept));
        assert!(kept.contains(&(10.0, 10.0)));
        assert!(kept.contains(&(8.0, 14.0)));
        assert!(kept.contains(&(14.0, 8.0)));
        assert!(!kept.contains(&(12.0, 12.0)));
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn tiles_two_macros() {
        let mut design = Design::new();
        design.add_cluster(macro_cluster("a", &[(400.0, 300.0), (300.0, 400.0)]));
        let sink = DiagnosticSink::new();
        shape_clusters(&mut design, &small_params(1000.0), &sink).unwrap();

        let cluster = &design.clusters[0];
        assert!(!cluster.bands.is_empty());
        assert!(cluster.area >= cluster.macro_area());
        let footprints: Vec<(f64, f64)> = cluster
            .bands
            .iter()
            .map(|b| ((cluster.area / b.lo).sqrt(), (cluster.area * b.lo).sqrt()))
            .collect();
        for (w, h) in footprints {
            assert!(w <= 1000.0 && h <= 1000.0);
        }
        assert!(!sink.has_errors());
    }

    #[test]
    fn single_macro_cluster_band_is_fixed() {
        let mut design = Design::new();
        design.add_cluster(macro_cluster("a", &[(200.0, 100.0)]));
        let sink = DiagnosticSink::new();
        let mut params = small_params(1000.0);
        params.halo_width = 5.0;
        shape_clusters(&mut design, &params, &sink).unwrap();

        let cluster = &design.clusters[0];
        assert_eq!(cluster.bands.len(), 1);
        assert_eq!(cluster.bands[0].lo, cluster.bands[0].hi);
        // Halo-inflated 210x110.
        assert!((cluster.area - 210.0 * 110.0).abs() < 1e-9);
        assert!((cluster.bands[0].lo - 110.0 / 210.0).abs() < 1e-9);
    }

    #[test]
    fn oversized_macro_fails_tiling() {
        let mut design = Design::new();
        design.add_cluster(macro_cluster("big", &[(2000.0, 100.0)]));
        let sink = DiagnosticSink::new();
        let err = shape_clusters(&mut design, &small_params(1000.0), &sink).unwrap_err();
        assert!(matches!(err, FloorplanError::NoTiling { cluster } if cluster == "big"));
        assert!(sink.has_errors());
    }

    #[test]
    fn soft_cluster_gets_default_band() {
        let mut design = Design::new();
        design.add_cluster(Cluster::new("soft", 5000.0));
        let sink = DiagnosticSink::new();
        let params = small_params(1000.0);
        shape_clusters(&mut design, &params, &sink).unwrap();

        let cluster = &design.clusters[0];
        assert_eq!(cluster.bands.len(), 1);
        assert_eq!(cluster.bands[0].lo, params.min_aspect_ratio);
        assert_eq!(cluster.bands[0].hi, 1.0 / params.min_aspect_ratio);
    }

    #[test]
    fn sibling_clusters_share_tiling() {
        let shapes = [(120.0, 80.0), (80.0, 120.0), (100.0, 100.0)];
        let mut design = Design::new();
        design.add_cluster(macro_cluster("a", &shapes));
        design.add_cluster(macro_cluster("b", &shapes));
        let sink = DiagnosticSink::new();
        shape_clusters(&mut design, &small_params(1000.0), &sink).unwrap();

        assert_eq!(design.clusters[0].bands, design.clusters[1].bands);
        assert_eq!(design.clusters[0].area, design.clusters[1].area);
    }

    #[test]
    fn tiling_is_deterministic() {
        let build = || {
            let mut design = Design::new();
            design.add_cluster(macro_cluster(
                "a",
                &[(120.0, 80.0), (60.0, 90.0), (100.0, 40.0)],
            ));
            design
        };
        let sink = DiagnosticSink::new();
        let mut first = build();
        shape_clusters(&mut first, &small_params(1000.0), &sink).unwrap();
        let mut second = build();
        shape_clusters(&mut second, &small_params(1000.0), &sink).unwrap();
        assert_eq!(first.clusters[0].bands, second.clusters[0].bands);
        assert_eq!(first.clusters[0].area, second.clusters[0].area);
    }

    #[test]
    fn shape_signature_ignores_macro_order() {
        let a = shape_signature(&[(10.0, 20.0), (30.0, 5.0)]);
        let b = shape_signature(&[(30.0, 5.0), (10.0, 20.0)]);
        assert_eq!(a, b);
    }

    #[test]
    fn footprints_cover_all_macros() {
        let dims = vec![(40.0, 30.0), (30.0, 40.0), (20.0, 20.0)];
        let params = small_params(500.0);
        let mut rng = StdRng::seed_from_u64(1);
        let footprints = tile_macros(&dims, &params, &mut rng);
        assert!(!footprints.is_empty());
        let macro_area: f64 = dims.iter().map(|(w, h)| w * h).sum();
        assert!(is_pareto(&footprints));
        for (w, h) in footprints {
            assert!(w * h >= macro_area);
        }
    }
}

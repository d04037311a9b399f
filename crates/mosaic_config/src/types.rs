//! Configuration types deserialized from `mosaic.toml`.

use serde::Deserialize;

/// The top-level project configuration parsed from `mosaic.toml`.
///
/// Contains the design input files, the target outline, and per-stage tuning
/// tables. Every tuning table and field is optional in the TOML; omitted
/// values fall back to the defaults below.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// The design input files.
    pub design: DesignConfig,
    /// The target outline the floorplan must fit inside.
    pub outline: OutlineConfig,
    /// Top-level floorplanning settings shared across stages.
    #[serde(default)]
    pub floorplan: FloorplanConfig,
    /// Shape (macro tiling) stage tuning.
    #[serde(default)]
    pub shape: ShapeConfig,
    /// Block placement stage tuning.
    #[serde(default)]
    pub placement: PlacementConfig,
    /// Pin alignment stage tuning.
    #[serde(default)]
    pub pin_align: PinAlignConfig,
}

/// Paths to the design input files, relative to the project root.
#[derive(Debug, Deserialize)]
pub struct DesignConfig {
    /// The design name.
    pub name: String,
    /// Path to the block file (clusters, macros, terminals).
    pub blocks: String,
    /// Path to the net file.
    pub nets: String,
    /// Optional path to the keep-out region file.
    #[serde(default)]
    pub regions: Option<String>,
}

/// The fixed target outline.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OutlineConfig {
    /// Outline width.
    pub width: f64,
    /// Outline height.
    pub height: f64,
}

/// Top-level floorplanning settings.
#[derive(Debug, Default, Deserialize)]
pub struct FloorplanConfig {
    /// Master seed; per-stage seeds are derived from it.
    #[serde(default)]
    pub seed: u64,
}

/// Annealing schedule shared by all three stages, overridable per stage.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AnnealConfig {
    /// Number of temperature stages.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Metropolis trials per stage.
    #[serde(default = "default_moves_per_step")]
    pub moves_per_step: usize,
    /// Target initial uphill acceptance probability.
    #[serde(default = "default_init_accept_prob")]
    pub init_accept_prob: f64,
    /// Geometric cooling factor per stage.
    #[serde(default = "default_cooling_rate")]
    pub cooling_rate: f64,
    /// Restarts allowed when the final result is infeasible.
    #[serde(default = "default_max_restarts")]
    pub max_restarts: usize,
}

fn default_max_steps() -> usize {
    300
}

fn default_moves_per_step() -> usize {
    60
}

fn default_init_accept_prob() -> f64 {
    0.95
}

fn default_cooling_rate() -> f64 {
    0.98
}

fn default_max_restarts() -> usize {
    2
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            moves_per_step: default_moves_per_step(),
            init_accept_prob: default_init_accept_prob(),
            cooling_rate: default_cooling_rate(),
            max_restarts: default_max_restarts(),
        }
    }
}

/// Shape (macro tiling) stage tuning.
#[derive(Debug, Deserialize)]
pub struct ShapeConfig {
    /// Smallest admissible aspect ratio; trial outlines sweep to its inverse.
    #[serde(default = "default_min_aspect_ratio")]
    pub min_aspect_ratio: f64,
    /// Fractional slack added to the macro area of each trial outline.
    #[serde(default = "default_dead_space")]
    pub dead_space: f64,
    /// Halo added around every macro before tiling.
    #[serde(default)]
    pub halo_width: f64,
    /// Workers running concurrently per batch.
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
    /// Total tiling runs per cluster.
    #[serde(default = "default_num_runs")]
    pub num_runs: usize,
    /// Annealing schedule for each run.
    #[serde(default)]
    pub anneal: AnnealConfig,
}

fn default_min_aspect_ratio() -> f64 {
    0.33
}

fn default_dead_space() -> f64 {
    0.05
}

fn default_num_threads() -> usize {
    4
}

fn default_num_runs() -> usize {
    8
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            min_aspect_ratio: default_min_aspect_ratio(),
            dead_space: default_dead_space(),
            halo_width: 0.0,
            num_threads: default_num_threads(),
            num_runs: default_num_runs(),
            anneal: AnnealConfig::default(),
        }
    }
}

/// Block placement stage tuning.
#[derive(Debug, Deserialize)]
pub struct PlacementConfig {
    /// Go-with-the-winner levels.
    #[serde(default = "default_num_levels")]
    pub num_levels: usize,
    /// Parallel workers per level.
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,
    /// Probability cutoff for resize moves.
    #[serde(default = "default_resize_prob")]
    pub resize_prob: f64,
    /// Cumulative cutoff for positive-sequence swaps.
    #[serde(default = "default_swap_prob")]
    pub pos_swap_prob: f64,
    /// Cumulative cutoff for negative-sequence swaps.
    #[serde(default = "default_swap_prob")]
    pub neg_swap_prob: f64,
    /// Geometric decay of the shared initial temperature per level.
    #[serde(default = "default_heat_rate")]
    pub heat_rate: f64,
    /// Initial cost weights.
    #[serde(default)]
    pub weights: WeightsConfig,
    /// Annealing schedule for each worker.
    #[serde(default)]
    pub anneal: AnnealConfig,
}

fn default_num_levels() -> usize {
    2
}

fn default_num_workers() -> usize {
    4
}

fn default_resize_prob() -> f64 {
    0.4
}

fn default_swap_prob() -> f64 {
    0.2
}

fn default_heat_rate() -> f64 {
    0.5
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            num_levels: default_num_levels(),
            num_workers: default_num_workers(),
            resize_prob: default_resize_prob(),
            pos_swap_prob: default_swap_prob(),
            neg_swap_prob: default_swap_prob(),
            heat_rate: default_heat_rate(),
            weights: WeightsConfig::default(),
            anneal: AnnealConfig::default(),
        }
    }
}

/// Initial weights for the placement cost terms.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WeightsConfig {
    /// Weight for the bounding-box area term.
    #[serde(default = "default_area_weight")]
    pub area: f64,
    /// Weight for the wirelength term.
    #[serde(default = "default_wirelength_weight")]
    pub wirelength: f64,
    /// Weight for the outline overflow term.
    #[serde(default = "default_outline_weight")]
    pub outline: f64,
    /// Weight for the boundary attraction term.
    #[serde(default = "default_small_weight")]
    pub boundary: f64,
    /// Weight for the keep-out overlap term.
    #[serde(default = "default_small_weight")]
    pub blockage: f64,
}

fn default_area_weight() -> f64 {
    0.4
}

fn default_wirelength_weight() -> f64 {
    0.2
}

fn default_outline_weight() -> f64 {
    0.2
}

fn default_small_weight() -> f64 {
    0.1
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            area: default_area_weight(),
            wirelength: default_wirelength_weight(),
            outline: default_outline_weight(),
            boundary: default_small_weight(),
            blockage: default_small_weight(),
        }
    }
}

/// Pin alignment stage tuning.
#[derive(Debug, Deserialize)]
pub struct PinAlignConfig {
    /// Halo added around every macro while packing.
    #[serde(default)]
    pub halo_width: f64,
    /// Workers running concurrently per batch.
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
    /// Independent annealing runs per cluster.
    #[serde(default = "default_num_runs")]
    pub num_runs: usize,
    /// Probability cutoff for flip moves.
    #[serde(default = "default_flip_prob")]
    pub flip_prob: f64,
    /// Annealing schedule for each run.
    #[serde(default)]
    pub anneal: AnnealConfig,
}

fn default_flip_prob() -> f64 {
    0.4
}

impl Default for PinAlignConfig {
    fn default() -> Self {
        Self {
            halo_width: 0.0,
            num_threads: default_num_threads(),
            num_runs: default_num_runs(),
            flip_prob: default_flip_prob(),
            anneal: AnnealConfig::default(),
        }
    }
}

//! Sequence-pair simulated-annealing floorplanner for macro/cluster designs.
//!
//! This crate takes a [`Design`] of clusters (soft areas and hard-macro
//! groups), nets, terminals, and keep-out regions, and produces a
//! non-overlapping placement inside a target outline. One generic annealing
//! engine drives three stages with different move sets and cost terms.
//!
//! # Pipeline
//!
//! 1. **Shape** — per-cluster macro tiling derives discrete aspect bands
//! 2. **Place** — hierarchical go-with-the-winner block placement
//! 3. **Align** — per-cluster macro pin alignment to boundary pins
//!
//! # Usage
//!
//! ```ignore
//! use mosaic_floorplan::{run_floorplan, FloorplanParams};
//!
//! let params = FloorplanParams::new(1000.0, 1000.0, 42);
//! let report = run_floorplan(&mut design, &params, &sink)?;
//! assert!(report.feasible);
//! ```

#![warn(missing_docs)]

pub mod anneal;
pub mod cost;
pub mod emit;
pub mod error;
pub mod ids;
pub mod model;
pub mod parse;
pub mod pins;
pub mod place;
pub mod seqpair;
pub mod shape;

pub use anneal::{Anneal, SaOutcome, SaParams};
pub use cost::{CostNorms, CostTerms, CostWeights};
pub use emit::{build_report, floorplan_text, write_floorplan, FloorplanReport, PlacedRect};
pub use error::FloorplanError;
pub use ids::{BlockId, NetId};
pub use model::{AspectBand, Block, Cluster, Design, Macro, Net, Region, ResolvedNet, Terminal};
pub use parse::{load_design, parse_block_file, parse_net_file, parse_region_file};
pub use pins::{align_pins, PinAlignParams};
pub use place::{place_blocks, PlacementParams};
pub use seqpair::{Packing, SequencePair};
pub use shape::{shape_clusters, ShapeParams};

use mosaic_diagnostics::DiagnosticSink;

/// Parameters for the complete floorplanning pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorplanParams {
    /// Shape (tiling) stage parameters.
    pub shape: ShapeParams,
    /// Block placement stage parameters.
    pub placement: PlacementParams,
    /// Pin alignment stage parameters.
    pub pin_align: PinAlignParams,
}

impl FloorplanParams {
    /// Creates pipeline parameters for an outline with default tuning.
    ///
    /// Stage seeds are derived from the top-level seed so the three stages
    /// draw from independent streams.
    pub fn new(outline_width: f64, outline_height: f64, seed: u64) -> Self {
        let mut shape = ShapeParams::new(outline_width, outline_height);
        shape.seed = seed;
        let mut placement = PlacementParams::new(outline_width, outline_height);
        placement.seed = seed.wrapping_add(1);
        let mut pin_align = PinAlignParams::default();
        pin_align.seed = seed.wrapping_add(2);
        Self {
            shape,
            placement,
            pin_align,
        }
    }
}

/// Runs the complete shape, placement, and pin-alignment pipeline.
///
/// Mutates the design in place stage by stage and returns a summary report.
/// On failure, geometry produced so far remains in the design for
/// inspection.
pub fn run_floorplan(
    design: &mut Design,
    params: &FloorplanParams,
    sink: &DiagnosticSink,
) -> Result<FloorplanReport, FloorplanError> {
    shape::shape_clusters(design, &params.shape, sink)?;
    place::place_blocks(design, &params.placement, sink)?;
    pins::align_pins(design, &params.pin_align, sink)?;
    emit::build_report(
        design,
        params.placement.outline_width,
        params.placement.outline_height,
    )
}

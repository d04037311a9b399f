//! Floorplan result emission.
//!
//! Produces the plain-text per-rectangle dump used for debugging and
//! verification, and the serializable [`FloorplanReport`] summary the CLI
//! can print as JSON.

use crate::cost;
use crate::error::FloorplanError;
use crate::model::Design;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

/// One placed rectangle in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedRect {
    /// Cluster or macro name.
    pub name: String,
    /// Lower-left x.
    pub lx: f64,
    /// Lower-left y.
    pub ly: f64,
    /// Upper-right x.
    pub ux: f64,
    /// Upper-right y.
    pub uy: f64,
}

/// Summary of a completed floorplanning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorplanReport {
    /// Target outline width.
    pub outline_width: f64,
    /// Target outline height.
    pub outline_height: f64,
    /// Achieved bounding width over all clusters.
    pub width: f64,
    /// Achieved bounding height over all clusters.
    pub height: f64,
    /// Total center-based weighted wirelength.
    pub wirelength: f64,
    /// Whether the result fits the outline.
    pub feasible: bool,
    /// Placed cluster rectangles.
    pub clusters: Vec<PlacedRect>,
}

/// Builds the run summary from a placed design.
pub fn build_report(
    design: &Design,
    outline_width: f64,
    outline_height: f64,
) -> Result<FloorplanReport, FloorplanError> {
    let nets = design.resolve_nets()?;
    let wirelength = cost::total_wirelength(&nets, |id| {
        let c = design.cluster(id);
        (c.x + c.width / 2.0, c.y + c.height / 2.0)
    });
    let width = design
        .clusters
        .iter()
        .map(|c| c.x + c.width)
        .fold(0.0, f64::max);
    let height = design
        .clusters
        .iter()
        .map(|c| c.y + c.height)
        .fold(0.0, f64::max);
    let clusters = design
        .clusters
        .iter()
        .map(|c| PlacedRect {
            name: c.name.clone(),
            lx: c.x,
            ly: c.y,
            ux: c.x + c.width,
            uy: c.y + c.height,
        })
        .collect();
    Ok(FloorplanReport {
        outline_width,
        outline_height,
        width,
        height,
        wirelength,
        feasible: width <= outline_width && height <= outline_height,
        clusters,
    })
}

/// Renders the plain-text dump: one `name lx ly ux uy` line per cluster,
/// then one per macro (absolute coordinates).
pub fn floorplan_text(design: &Design) -> String {
    let mut out = String::new();
    for cluster in &design.clusters {
        let _ = writeln!(
            out,
            "{} {:.3} {:.3} {:.3} {:.3}",
            cluster.name,
            cluster.x,
            cluster.y,
            cluster.x + cluster.width,
            cluster.y + cluster.height
        );
        for m in &cluster.macros {
            let _ = writeln!(
                out,
                "{} {:.3} {:.3} {:.3} {:.3}",
                m.name,
                m.x,
                m.y,
                m.x + m.width,
                m.y + m.height
            );
        }
    }
    out
}

/// Writes the plain-text dump to a file.
pub fn write_floorplan(design: &Design, path: &Path) -> Result<(), FloorplanError> {
    std::fs::write(path, floorplan_text(design)).map_err(|source| FloorplanError::Io {
        path: path.display().to_string(),
        source,
    })
}

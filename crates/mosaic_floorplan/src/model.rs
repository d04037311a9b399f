//! Core floorplan data structures.
//!
//! Defines the entities that flow through the floorplanning pipeline: hard
//! [`Macro`]s, soft/semi-soft [`Block`]s with aspect-ratio bands, [`Net`]s,
//! keep-out [`Region`]s, and the [`Cluster`]s that group macros. The
//! [`Design`] is the central container mutated stage by stage: shape tiling
//! writes cluster bands and areas, placement writes cluster positions, pin
//! alignment writes macro positions and orientations.

use crate::error::FloorplanError;
use crate::ids::{BlockId, NetId};
use mosaic_common::{Orientation, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A rigid rectangle with a pin offset and an orientation.
///
/// Width and height are fixed for the macro's lifetime; only its position and
/// orientation change. The pin offset is relative to the macro's own
/// lower-left corner and is mirrored by flips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Macro {
    /// Instance name.
    pub name: String,
    /// Fixed width.
    pub width: f64,
    /// Fixed height.
    pub height: f64,
    /// Lower-left x, assigned during packing.
    pub x: f64,
    /// Lower-left y, assigned during packing.
    pub y: f64,
    /// Pin x offset from the lower-left corner.
    pub pin_x: f64,
    /// Pin y offset from the lower-left corner.
    pub pin_y: f64,
    /// Current orientation.
    pub orientation: Orientation,
}

impl Macro {
    /// Creates an unplaced macro in the default orientation.
    pub fn new(
        name: impl Into<String>,
        width: f64,
        height: f64,
        pin_x: f64,
        pin_y: f64,
    ) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            x: 0.0,
            y: 0.0,
            pin_x,
            pin_y,
            orientation: Orientation::default(),
        }
    }

    /// Returns the macro's area.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Returns the macro's placed bounding rectangle.
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.x, self.y, self.width, self.height)
    }

    /// Returns the absolute pin position.
    pub fn pin_position(&self) -> (f64, f64) {
        (self.x + self.pin_x, self.y + self.pin_y)
    }

    /// Mirrors the macro about the X axis, updating orientation and pin offset.
    pub fn flip_x(&mut self) {
        self.orientation = self.orientation.flipped_x();
        self.pin_y = self.height - self.pin_y;
    }

    /// Mirrors the macro about the Y axis, updating orientation and pin offset.
    pub fn flip_y(&mut self) {
        self.orientation = self.orientation.flipped_y();
        self.pin_x = self.width - self.pin_x;
    }
}

/// An admissible aspect-ratio interval, aspect ratio being height/width.
///
/// A degenerate band (`lo == hi`) pins the shape to a single footprint, as
/// produced by the shape engine for macro clusters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectBand {
    /// Smallest admissible aspect ratio.
    pub lo: f64,
    /// Largest admissible aspect ratio.
    pub hi: f64,
}

impl AspectBand {
    /// Creates a band; `lo` must not exceed `hi`.
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// Creates a degenerate band pinned to one ratio.
    pub fn fixed(ratio: f64) -> Self {
        Self {
            lo: ratio,
            hi: ratio,
        }
    }

    /// Returns whether `ar` lies within the band.
    pub fn contains(&self, ar: f64) -> bool {
        self.lo <= ar && ar <= self.hi
    }
}

/// A placeable rectangle of fixed area and variable aspect ratio.
///
/// A block with `num_macros == 0` is fully soft: its aspect ratio moves
/// continuously within its bands. A block carrying macros only jumps between
/// discrete bands. In both cases `width * height == area` holds after every
/// resize; the sole exception is [`shrink`](Self::shrink), which re-derives
/// the area and exists only for floorplan repair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Cluster name this block stands in for.
    pub name: String,
    /// Target area.
    pub area: f64,
    /// Number of hard macros inside the source cluster.
    pub num_macros: usize,
    /// Admissible aspect-ratio bands, sorted ascending by `lo`.
    pub bands: Vec<AspectBand>,
    /// Current width.
    pub width: f64,
    /// Current height.
    pub height: f64,
    /// Lower-left x, assigned during packing.
    pub x: f64,
    /// Lower-left y, assigned during packing.
    pub y: f64,
}

impl Block {
    /// Creates a block and derives its initial shape from its bands.
    ///
    /// The initial aspect ratio is 1.0 clamped into the nearest band, so the
    /// block starts as square as its constraints allow.
    pub fn new(
        name: impl Into<String>,
        area: f64,
        num_macros: usize,
        mut bands: Vec<AspectBand>,
    ) -> Self {
        bands.sort_by(|a, b| a.lo.partial_cmp(&b.lo).unwrap_or(std::cmp::Ordering::Equal));
        let mut block = Self {
            name: name.into(),
            area,
            num_macros,
            bands,
            width: 0.0,
            height: 0.0,
            x: 0.0,
            y: 0.0,
        };
        let ar = block.clamp_ratio(1.0);
        block.set_aspect_ratio(ar);
        block
    }

    /// Returns the current aspect ratio (height / width).
    pub fn aspect_ratio(&self) -> f64 {
        self.height / self.width
    }

    /// Returns the block's placed bounding rectangle.
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.x, self.y, self.width, self.height)
    }

    /// Returns the block's center point.
    pub fn center(&self) -> (f64, f64) {
        ((self.x + self.width / 2.0), (self.y + self.height / 2.0))
    }

    /// Returns whether the block has any freedom to change shape.
    pub fn is_resizable(&self) -> bool {
        if self.bands.is_empty() {
            return false;
        }
        if self.num_macros > 0 {
            self.bands.len() > 1
        } else {
            self.bands.len() > 1 || self.bands.iter().any(|b| b.lo < b.hi)
        }
    }

    /// Sets the shape to the given aspect ratio, conserving area.
    pub fn set_aspect_ratio(&mut self, ar: f64) {
        self.width = (self.area / ar).sqrt();
        self.height = self.area / self.width;
    }

    /// Clamps an aspect ratio into the nearest admissible band.
    ///
    /// Returns `ar` unchanged when the block has no bands.
    pub fn clamp_ratio(&self, ar: f64) -> f64 {
        if self.bands.is_empty() {
            return ar;
        }
        for band in &self.bands {
            if band.contains(ar) {
                return ar;
            }
        }
        let mut best = self.bands[0].lo;
        let mut best_dist = f64::INFINITY;
        for band in &self.bands {
            for edge in [band.lo, band.hi] {
                let dist = (ar - edge).abs();
                if dist < best_dist {
                    best_dist = dist;
                    best = edge;
                }
            }
        }
        best
    }

    /// Returns the admissible width interval over all bands.
    ///
    /// Width shrinks as aspect ratio grows, so the interval runs from the
    /// largest band ratio down to the smallest.
    pub fn width_range(&self) -> (f64, f64) {
        let ar_lo = self.bands.first().map_or(1.0, |b| b.lo);
        let ar_hi = self
            .bands
            .iter()
            .map(|b| b.hi)
            .fold(ar_lo, f64::max);
        ((self.area / ar_hi).sqrt(), (self.area / ar_lo).sqrt())
    }

    /// Returns the admissible height interval over all bands.
    pub fn height_range(&self) -> (f64, f64) {
        let (w_lo, w_hi) = self.width_range();
        (self.area / w_hi, self.area / w_lo)
    }

    /// Sets the width, conserving area and clamping into the bands.
    pub fn change_width(&mut self, width: f64) {
        if width <= 0.0 {
            return;
        }
        let ar = self.clamp_ratio(self.area / (width * width));
        self.set_aspect_ratio(ar);
    }

    /// Sets the height, conserving area and clamping into the bands.
    pub fn change_height(&mut self, height: f64) {
        if height <= 0.0 {
            return;
        }
        let ar = self.clamp_ratio((height * height) / self.area);
        self.set_aspect_ratio(ar);
    }

    /// Scales width and height and re-derives the area.
    ///
    /// Floorplan repair uses this on soft blocks; it is the only operation
    /// that changes a block's area.
    pub fn shrink(&mut self, factor_w: f64, factor_h: f64) {
        self.width *= factor_w;
        self.height *= factor_h;
        self.area = self.width * self.height;
    }
}

/// A net connecting blocks and fixed terminals by name, with an integer weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Net {
    /// Net weight.
    pub weight: u32,
    /// Names of connected blocks (clusters).
    pub blocks: Vec<String>,
    /// Names of connected fixed terminals.
    pub terminals: Vec<String>,
}

/// A net with its references resolved to ids and positions.
///
/// Built once per annealer instance and shared read-only across workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedNet {
    /// Net weight.
    pub weight: u32,
    /// Connected block ids.
    pub blocks: Vec<BlockId>,
    /// Fixed terminal positions.
    pub terminals: Vec<(f64, f64)>,
}

/// A named fixed pin position at the design boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terminal {
    /// Terminal name.
    pub name: String,
    /// Fixed x position.
    pub x: f64,
    /// Fixed y position.
    pub y: f64,
}

/// An axis-aligned keep-out rectangle that macro blocks may not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// The keep-out bounds.
    pub bounds: Rect,
}

impl Region {
    /// Creates a keep-out region.
    pub fn new(bounds: Rect) -> Self {
        Self { bounds }
    }
}

/// A group of macros placed as one block, or a pure soft cluster.
///
/// Shape tiling fills in `bands` and `area` for macro clusters; placement
/// fills in `x`/`y`/`width`/`height`; pin alignment finalizes the positions
/// and orientations of the `macros` inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Cluster name.
    pub name: String,
    /// Target area.
    pub area: f64,
    /// Admissible aspect-ratio bands.
    pub bands: Vec<AspectBand>,
    /// Hard macros inside the cluster; empty for soft clusters.
    pub macros: Vec<Macro>,
    /// Placed lower-left x.
    pub x: f64,
    /// Placed lower-left y.
    pub y: f64,
    /// Placed width.
    pub width: f64,
    /// Placed height.
    pub height: f64,
}

impl Cluster {
    /// Creates an empty soft cluster with the given target area.
    pub fn new(name: impl Into<String>, area: f64) -> Self {
        Self {
            name: name.into(),
            area,
            bands: Vec::new(),
            macros: Vec::new(),
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
        }
    }

    /// Returns whether the cluster carries hard macros.
    pub fn has_macros(&self) -> bool {
        !self.macros.is_empty()
    }

    /// Returns the cluster's placed bounding rectangle.
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.x, self.y, self.width, self.height)
    }

    /// Returns the summed area of the cluster's macros.
    pub fn macro_area(&self) -> f64 {
        self.macros.iter().map(Macro::area).sum()
    }
}

/// The complete floorplanning problem: clusters, nets, terminals, regions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Design {
    /// All clusters.
    pub clusters: Vec<Cluster>,
    /// All nets.
    pub nets: Vec<Net>,
    /// All fixed terminals.
    pub terminals: Vec<Terminal>,
    /// All keep-out regions.
    pub regions: Vec<Region>,
    /// Auxiliary index: cluster name to id (rebuilt on deserialization).
    #[serde(skip)]
    cluster_by_name: HashMap<String, BlockId>,
}

impl Design {
    /// Creates an empty design.
    pub fn new() -> Self {
        Self {
            clusters: Vec::new(),
            nets: Vec::new(),
            terminals: Vec::new(),
            regions: Vec::new(),
            cluster_by_name: HashMap::new(),
        }
    }

    /// Adds a cluster and returns its id.
    pub fn add_cluster(&mut self, cluster: Cluster) -> BlockId {
        let id = BlockId::from_raw(self.clusters.len() as u32);
        self.cluster_by_name.insert(cluster.name.clone(), id);
        self.clusters.push(cluster);
        id
    }

    /// Adds a net and returns its id.
    pub fn add_net(&mut self, net: Net) -> NetId {
        let id = NetId::from_raw(self.nets.len() as u32);
        self.nets.push(net);
        id
    }

    /// Returns the cluster with the given id.
    pub fn cluster(&self, id: BlockId) -> &Cluster {
        &self.clusters[id.index()]
    }

    /// Returns a mutable reference to the cluster with the given id.
    pub fn cluster_mut(&mut self, id: BlockId) -> &mut Cluster {
        &mut self.clusters[id.index()]
    }

    /// Looks up a cluster id by name.
    pub fn find_cluster(&self, name: &str) -> Option<BlockId> {
        self.cluster_by_name.get(name).copied()
    }

    /// Rebuilds the name index after deserialization.
    pub fn rebuild_indices(&mut self) {
        self.cluster_by_name.clear();
        for (i, cluster) in self.clusters.iter().enumerate() {
            self.cluster_by_name
                .insert(cluster.name.clone(), BlockId::from_raw(i as u32));
        }
    }

    /// Returns the terminal-position table keyed by name.
    pub fn terminal_map(&self) -> HashMap<&str, (f64, f64)> {
        self.terminals
            .iter()
            .map(|t| (t.name.as_str(), (t.x, t.y)))
            .collect()
    }

    /// Resolves every net's block names to ids and terminal names to positions.
    ///
    /// Fails on a block name that matches neither a cluster nor a terminal.
    pub fn resolve_nets(&self) -> Result<Vec<ResolvedNet>, FloorplanError> {
        let terminal_map = self.terminal_map();
        let mut resolved = Vec::with_capacity(self.nets.len());
        for net in &self.nets {
            let mut blocks = Vec::with_capacity(net.blocks.len());
            for name in &net.blocks {
                let id = self
                    .find_cluster(name)
                    .ok_or_else(|| FloorplanError::UnknownBlock(name.clone()))?;
                blocks.push(id);
            }
            let mut terminals = Vec::with_capacity(net.terminals.len());
            for name in &net.terminals {
                let pos = terminal_map
                    .get(name.as_str())
                    .copied()
                    .ok_or_else(|| FloorplanError::UnknownBlock(name.clone()))?;
                terminals.push(pos);
            }
            resolved.push(ResolvedNet {
                weight: net.weight,
                blocks,
                terminals,
            });
        }
        Ok(resolved)
    }
}

impl Default for Design {
    fn default() -> Self {
        Self::new()
    }
}

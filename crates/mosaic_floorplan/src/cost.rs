//! Floorplan cost functions.
//!
//! Evaluates packing quality from five raw terms: bounding-box area,
//! half-perimeter wirelength over net bounding boxes, outline overflow,
//! boundary attraction for macro blocks, and keep-out blockage overlap.
//! Raw terms are normalized by calibration means and combined as a weighted
//! sum; the weights themselves adapt during annealing so no single penalty
//! starves exploration of the others.

use crate::ids::BlockId;
use crate::model::ResolvedNet;
use mosaic_common::Rect;
use serde::{Deserialize, Serialize};

/// Raw values of the cost terms for one floorplan state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostTerms {
    /// Bounding-box area of the packing.
    pub area: f64,
    /// Weighted half-perimeter wirelength.
    pub wirelength: f64,
    /// Outline overflow penalty.
    pub outline: f64,
    /// Boundary attraction penalty.
    pub boundary: f64,
    /// Keep-out overlap penalty.
    pub blockage: f64,
}

impl CostTerms {
    /// Accumulates another sample into this one.
    pub fn accumulate(&mut self, other: &CostTerms) {
        self.area += other.area;
        self.wirelength += other.wirelength;
        self.outline += other.outline;
        self.boundary += other.boundary;
        self.blockage += other.blockage;
    }

    /// Returns this sample scaled by a factor.
    pub fn scaled(&self, factor: f64) -> CostTerms {
        CostTerms {
            area: self.area * factor,
            wirelength: self.wirelength * factor,
            outline: self.outline * factor,
            boundary: self.boundary * factor,
            blockage: self.blockage * factor,
        }
    }
}

/// Normalizers for the cost terms, filled with calibration means.
pub type CostNorms = CostTerms;

/// Weights for the cost terms.
///
/// Defaults follow the usual placement emphasis: area and wirelength carry
/// the search, the penalties keep it honest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostWeights {
    /// Weight for the area term.
    pub area: f64,
    /// Weight for the wirelength term.
    pub wirelength: f64,
    /// Weight for the outline overflow term.
    pub outline: f64,
    /// Weight for the boundary attraction term.
    pub boundary: f64,
    /// Weight for the blockage overlap term.
    pub blockage: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            area: 0.4,
            wirelength: 0.2,
            outline: 0.2,
            boundary: 0.1,
            blockage: 0.1,
        }
    }
}

impl CostWeights {
    /// Returns the sum of all weights.
    pub fn total(&self) -> f64 {
        self.area + self.wirelength + self.outline + self.boundary + self.blockage
    }

    /// Computes the normalized weighted cost of a set of raw terms.
    ///
    /// A term whose normalizer is zero contributes nothing regardless of its
    /// weight, which both guards the division and drops terms that never
    /// appeared during calibration.
    pub fn normalized(&self, terms: &CostTerms, norms: &CostNorms) -> f64 {
        let mut cost = 0.0;
        for (weight, term, norm) in [
            (self.area, terms.area, norms.area),
            (self.wirelength, terms.wirelength, norms.wirelength),
            (self.outline, terms.outline, norms.outline),
            (self.boundary, terms.boundary, norms.boundary),
            (self.blockage, terms.blockage, norms.blockage),
        ] {
            if norm > 0.0 {
                cost += weight * term / norm;
            }
        }
        cost
    }

    /// Adapts the weights to the recently observed average terms.
    ///
    /// Each weight is reduced in proportion to its term's share of the mean
    /// normalized cost, then the vector is rescaled so the weight sum is
    /// unchanged. A degenerate all-zero share leaves the weights untouched.
    pub fn reweight(&mut self, avg: &CostTerms, norms: &CostNorms) {
        let shares = [
            norm_share(self.area, avg.area, norms.area),
            norm_share(self.wirelength, avg.wirelength, norms.wirelength),
            norm_share(self.outline, avg.outline, norms.outline),
            norm_share(self.boundary, avg.boundary, norms.boundary),
            norm_share(self.blockage, avg.blockage, norms.blockage),
        ];
        let share_total: f64 = shares.iter().sum();
        if share_total <= 0.0 {
            return;
        }
        let old_total = self.total();
        let mut next = [
            self.area * (1.0 - shares[0] / share_total),
            self.wirelength * (1.0 - shares[1] / share_total),
            self.outline * (1.0 - shares[2] / share_total),
            self.boundary * (1.0 - shares[3] / share_total),
            self.blockage * (1.0 - shares[4] / share_total),
        ];
        let next_total: f64 = next.iter().sum();
        if next_total <= 0.0 {
            return;
        }
        let scale = old_total / next_total;
        next.iter_mut().for_each(|w| *w *= scale);
        self.area = next[0];
        self.wirelength = next[1];
        self.outline = next[2];
        self.boundary = next[3];
        self.blockage = next[4];
    }
}

fn norm_share(weight: f64, term: f64, norm: f64) -> f64 {
    if norm > 0.0 {
        weight * term / norm
    } else {
        0.0
    }
}

/// Returns the half-perimeter of the bounding box of a point set.
///
/// Empty and single-point sets have zero extent.
pub fn hpwl(points: impl IntoIterator<Item = (f64, f64)>) -> f64 {
    let mut min_x = f64::MAX;
    let mut max_x = f64::MIN;
    let mut min_y = f64::MAX;
    let mut max_y = f64::MIN;
    let mut any = false;
    for (x, y) in points {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
        any = true;
    }
    if !any {
        return 0.0;
    }
    (max_x - min_x) + (max_y - min_y)
}

/// Computes total weighted wirelength over resolved nets.
///
/// `position` maps a block id to the point that represents it in the net
/// bounding box — block centers during placement, macro pin positions during
/// pin alignment.
pub fn total_wirelength<F>(nets: &[ResolvedNet], position: F) -> f64
where
    F: Fn(BlockId) -> (f64, f64),
{
    let mut total = 0.0;
    for net in nets {
        let points = net
            .blocks
            .iter()
            .map(|&id| position(id))
            .chain(net.terminals.iter().copied());
        total += net.weight as f64 * hpwl(points);
    }
    total
}

/// Returns the outline overflow penalty for a packing of `width`x`height`
/// against an `outline_w`x`outline_h` target.
///
/// Zero when the packing fits; otherwise the area added beyond the outline.
pub fn outline_penalty(width: f64, height: f64, outline_w: f64, outline_h: f64) -> f64 {
    outline_w.max(width) * outline_h.max(height) - outline_w * outline_h
}

/// Returns the boundary attraction penalty for one macro block.
///
/// The distance to the nearest vertical outline edge plus the distance to the
/// nearest horizontal edge; zero when the block hugs the perimeter.
pub fn boundary_penalty(bounds: &Rect, outline_w: f64, outline_h: f64) -> f64 {
    let left = bounds.lx.max(0.0);
    let right = (outline_w - bounds.ux).max(0.0);
    let bottom = bounds.ly.max(0.0);
    let top = (outline_h - bounds.uy).max(0.0);
    left.min(right) + bottom.min(top)
}

/// Returns the summed overlap area between a macro block and the keep-outs.
pub fn blockage_penalty(bounds: &Rect, regions: &[Rect]) -> f64 {
    regions.iter().map(|r| bounds.overlap(r)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hpwl_two_points_manhattan() {
        assert_eq!(hpwl([(0.0, 0.0), (3.0, 4.0)]), 7.0);
    }

    #[test]
    fn hpwl_degenerate() {
        assert_eq!(hpwl([]), 0.0);
        assert_eq!(hpwl([(5.0, 5.0)]), 0.0);
    }

    #[test]
    fn wirelength_weighted_example() {
        // A weight-5 net between centers (0,0) and (3,4) contributes 35.
        let nets = vec![ResolvedNet {
            weight: 5,
            blocks: vec![BlockId::from_raw(0), BlockId::from_raw(1)],
            terminals: vec![],
        }];
        let centers = [(0.0, 0.0), (3.0, 4.0)];
        let wl = total_wirelength(&nets, |id| centers[id.index()]);
        assert_eq!(wl, 35.0);
    }

    #[test]
    fn wirelength_includes_terminals() {
        let nets = vec![ResolvedNet {
            weight: 2,
            blocks: vec![BlockId::from_raw(0)],
            terminals: vec![(10.0, 0.0)],
        }];
        let wl = total_wirelength(&nets, |_| (0.0, 0.0));
        assert_eq!(wl, 20.0);
    }

    #[test]
    fn outline_penalty_zero_when_fitting() {
        assert_eq!(outline_penalty(900.0, 1000.0, 1000.0, 1000.0), 0.0);
        assert_eq!(outline_penalty(1000.0, 1000.0, 1000.0, 1000.0), 0.0);
    }

    #[test]
    fn outline_penalty_overflow_area() {
        // 1100x900 against 1000x1000: 1100*1000 - 1000*1000 = 100000
        assert_eq!(outline_penalty(1100.0, 900.0, 1000.0, 1000.0), 100_000.0);
        // Overflow in both axes compounds.
        assert_eq!(outline_penalty(1100.0, 1100.0, 1000.0, 1000.0), 210_000.0);
    }

    #[test]
    fn boundary_penalty_zero_at_corner() {
        let r = Rect::from_size(0.0, 0.0, 100.0, 100.0);
        assert_eq!(boundary_penalty(&r, 1000.0, 1000.0), 0.0);
    }

    #[test]
    fn boundary_penalty_center_is_max() {
        let r = Rect::from_size(450.0, 450.0, 100.0, 100.0);
        assert_eq!(boundary_penalty(&r, 1000.0, 1000.0), 900.0);
    }

    #[test]
    fn blockage_penalty_sums_overlaps() {
        let b = Rect::from_size(0.0, 0.0, 10.0, 10.0);
        let regions = vec![
            Rect::from_size(5.0, 5.0, 10.0, 10.0),
            Rect::from_size(-5.0, -5.0, 10.0, 10.0),
            Rect::from_size(50.0, 50.0, 10.0, 10.0),
        ];
        assert_eq!(blockage_penalty(&b, &regions), 50.0);
    }

    #[test]
    fn normalized_cost_skips_zero_norms() {
        let weights = CostWeights::default();
        let terms = CostTerms {
            area: 100.0,
            wirelength: 50.0,
            ..Default::default()
        };
        let norms = CostNorms {
            area: 100.0,
            wirelength: 0.0,
            ..Default::default()
        };
        // Only the area term survives: 0.4 * 100/100.
        assert_eq!(weights.normalized(&terms, &norms), 0.4);
    }

    #[test]
    fn reweight_preserves_total() {
        let mut weights = CostWeights::default();
        let before = weights.total();
        let avg = CostTerms {
            area: 400.0,
            wirelength: 10.0,
            outline: 10.0,
            boundary: 10.0,
            blockage: 10.0,
        };
        let norms = CostNorms {
            area: 100.0,
            wirelength: 100.0,
            outline: 100.0,
            boundary: 100.0,
            blockage: 100.0,
        };
        weights.reweight(&avg, &norms);
        assert!((weights.total() - before).abs() < 1e-9);
    }

    #[test]
    fn reweight_pulls_down_dominant_term() {
        let mut weights = CostWeights::default();
        let avg = CostTerms {
            area: 1000.0,
            wirelength: 1.0,
            outline: 1.0,
            boundary: 1.0,
            blockage: 1.0,
        };
        let norms = CostNorms {
            area: 1.0,
            wirelength: 1.0,
            outline: 1.0,
            boundary: 1.0,
            blockage: 1.0,
        };
        let area_share_before = weights.area / weights.total();
        weights.reweight(&avg, &norms);
        assert!(weights.area / weights.total() < area_share_before);
        assert!(weights.wirelength > 0.2);
    }

    #[test]
    fn reweight_all_zero_is_noop() {
        let mut weights = CostWeights::default();
        let before = weights;
        weights.reweight(&CostTerms::default(), &CostNorms::default());
        assert_eq!(weights, before);
    }

    #[test]
    fn accumulate_and_scale() {
        let mut acc = CostTerms::default();
        acc.accumulate(&CostTerms {
            area: 10.0,
            wirelength: 20.0,
            outline: 2.0,
            boundary: 4.0,
            blockage: 6.0,
        });
        acc.accumulate(&CostTerms {
            area: 30.0,
            wirelength: 0.0,
            outline: 0.0,
            boundary: 0.0,
            blockage: 2.0,
        });
        let avg = acc.scaled(0.5);
        assert_eq!(avg.area, 20.0);
        assert_eq!(avg.wirelength, 10.0);
        assert_eq!(avg.blockage, 4.0);
    }
}

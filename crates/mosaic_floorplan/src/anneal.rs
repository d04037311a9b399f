//! The generic simulated-annealing engine.
//!
//! One Metropolis loop drives all three floorplanning stages; each stage
//! supplies its own move set and cost terms through the [`Anneal`] trait.
//! The engine owns calibration (cost-term normalizers and the adaptive
//! initial temperature), the geometric cooling schedule, per-stage adaptive
//! reweighting, best-state tracking with repair, and bounded restarts when
//! the best result stays infeasible.

use crate::cost::{CostNorms, CostTerms};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Tuning parameters for one annealing run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaParams {
    /// Number of temperature stages.
    pub max_steps: usize,
    /// Metropolis trials per stage; also the calibration sample count.
    pub moves_per_step: usize,
    /// Target acceptance probability for a typical uphill move at the start.
    pub init_accept_prob: f64,
    /// Geometric cooling factor applied after each stage.
    pub cooling_rate: f64,
    /// How many times an infeasible final result may restart the schedule.
    pub max_restarts: usize,
}

impl Default for SaParams {
    fn default() -> Self {
        Self {
            max_steps: 300,
            moves_per_step: 60,
            init_accept_prob: 0.95,
            cooling_rate: 0.98,
            max_restarts: 2,
        }
    }
}

/// A floorplanning state that the engine can anneal.
///
/// Implementations cache their packed geometry and raw cost terms;
/// `perturb` applies one random move and refreshes the cache, `restore`
/// rolls back exactly the last move from O(1) snapshots without repacking.
/// `load_best` must reinstate a complete concrete state (the engine takes
/// `save_best` snapshots only immediately after packing).
pub trait Anneal {
    /// Applies one random move and refreshes cached geometry and terms.
    fn perturb(&mut self, rng: &mut StdRng);

    /// Rolls back the last move from its snapshot.
    fn restore(&mut self);

    /// Returns the cached raw cost terms of the current state.
    fn terms(&self) -> CostTerms;

    /// Computes the normalized weighted cost of an arbitrary term sample.
    fn weighted(&self, terms: &CostTerms) -> f64;

    /// Returns the normalized weighted cost of the current state.
    fn cost(&self) -> f64 {
        self.weighted(&self.terms())
    }

    /// Installs the calibration normalizers.
    fn set_norms(&mut self, norms: CostNorms);

    /// Adapts cost weights to the per-stage average terms.
    fn reweight(&mut self, _avg: &CostTerms) {}

    /// Records the current state as the best seen.
    fn save_best(&mut self);

    /// Reinstates the recorded best state.
    fn load_best(&mut self);

    /// Returns whether the current state satisfies the outline.
    fn is_feasible(&self) -> bool;

    /// Attempts a best-effort repair of an infeasible state.
    ///
    /// Returns `true` if the state was changed; implementations must leave
    /// the state untouched when they return `false`.
    fn repair(&mut self) -> bool {
        false
    }
}

/// Summary statistics of one annealing run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaOutcome {
    /// Normalized cost of the final (best) state.
    pub best_cost: f64,
    /// Accepted moves across all stages and restarts.
    pub accepted: usize,
    /// Total Metropolis trials.
    pub trials: usize,
    /// Restarts consumed.
    pub restarts: usize,
    /// Whether the final state satisfies the outline.
    pub feasible: bool,
}

/// Runs the calibration burn-in and returns the initial temperature.
///
/// Performs `moves_per_step` random perturbations, installs the mean of each
/// raw term as that term's normalizer, and derives the initial temperature
/// from the mean absolute normalized cost delta between consecutive samples:
/// `T0 = mean|dcost| / -ln(init_accept_prob)`. The problem is left in its
/// last perturbed state, which becomes the annealing start point.
pub fn calibrate<P: Anneal>(problem: &mut P, params: &SaParams, rng: &mut StdRng) -> f64 {
    let mut samples = Vec::with_capacity(params.moves_per_step + 1);
    samples.push(problem.terms());
    for _ in 0..params.moves_per_step {
        problem.perturb(rng);
        samples.push(problem.terms());
    }

    let mut norm_acc = CostTerms::default();
    for sample in &samples {
        norm_acc.accumulate(sample);
    }
    problem.set_norms(norm_acc.scaled(1.0 / samples.len() as f64));

    let mut delta_sum = 0.0;
    let mut prev = problem.weighted(&samples[0]);
    for sample in &samples[1..] {
        let cost = problem.weighted(sample);
        delta_sum += (cost - prev).abs();
        prev = cost;
    }
    let mean_delta = delta_sum / (samples.len() - 1) as f64;
    mean_delta / -params.init_accept_prob.ln()
}

/// Runs the annealing schedule to completion and loads the best state.
///
/// Within each stage, proposes `moves_per_step` moves and accepts by the
/// Metropolis criterion; cools geometrically between stages. When a new best
/// is infeasible, gives the problem one repair attempt and adopts the result
/// if the repair sticks. After the last stage the best state is reloaded;
/// if it is still infeasible and restarts remain, the schedule starts over
/// from it at full temperature.
pub fn run<P: Anneal>(
    problem: &mut P,
    params: &SaParams,
    init_t: f64,
    rng: &mut StdRng,
) -> SaOutcome {
    let mut t = init_t;
    let mut current = problem.cost();
    let mut best = current;
    problem.save_best();

    let mut accepted = 0usize;
    let mut trials = 0usize;
    let mut restarts = 0usize;
    let mut step = 1usize;

    loop {
        let mut stage_terms = CostTerms::default();
        for _ in 0..params.moves_per_step {
            problem.perturb(rng);
            let candidate = problem.cost();
            let delta = candidate - current;
            trials += 1;
            let accept = delta <= 0.0 || rng.gen::<f64>() < (-delta / t).exp();
            if accept {
                current = candidate;
                accepted += 1;
                if candidate < best {
                    best = candidate;
                    problem.save_best();
                    if !problem.is_feasible() && problem.repair() {
                        // A feasible repaired state outranks a cheaper
                        // infeasible one; it becomes the new baseline.
                        current = problem.cost();
                        best = current;
                        problem.save_best();
                    }
                }
            } else {
                problem.restore();
            }
            stage_terms.accumulate(&problem.terms());
        }
        problem.reweight(&stage_terms.scaled(1.0 / params.moves_per_step as f64));
        t *= params.cooling_rate;
        step += 1;

        if step > params.max_steps {
            problem.load_best();
            current = problem.cost();
            if problem.is_feasible() || restarts >= params.max_restarts {
                break;
            }
            restarts += 1;
            step = 1;
            t = init_t;
        }
    }

    SaOutcome {
        best_cost: best,
        accepted,
        trials,
        restarts,
        feasible: problem.is_feasible(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    /// A one-dimensional toy problem: walk an integer position toward a
    /// target; cost is the distance, feasibility is closeness.
    #[derive(Debug, Clone)]
    struct Walk {
        position: f64,
        prev: f64,
        best: f64,
        target: f64,
        norms: CostNorms,
        repaired: bool,
    }

    impl Walk {
        fn new(start: f64, target: f64) -> Self {
            Self {
                position: start,
                prev: start,
                best: start,
                target,
                norms: CostNorms::default(),
                repaired: false,
            }
        }
    }

    impl Anneal for Walk {
        fn perturb(&mut self, rng: &mut StdRng) {
            self.prev = self.position;
            self.position += if rng.gen::<bool>() { 1.0 } else { -1.0 };
        }

        fn restore(&mut self) {
            self.position = self.prev;
        }

        fn terms(&self) -> CostTerms {
            CostTerms {
                area: (self.position - self.target).abs(),
                ..Default::default()
            }
        }

        fn weighted(&self, terms: &CostTerms) -> f64 {
            if self.norms.area > 0.0 {
                terms.area / self.norms.area
            } else {
                terms.area
            }
        }

        fn set_norms(&mut self, norms: CostNorms) {
            self.norms = norms;
        }

        fn save_best(&mut self) {
            self.best = self.position;
        }

        fn load_best(&mut self) {
            self.position = self.best;
        }

        fn is_feasible(&self) -> bool {
            (self.position - self.target).abs() < 0.5
        }

        fn repair(&mut self) -> bool {
            self.repaired = true;
            false
        }
    }

    fn anneal_walk(seed: u64) -> (f64, SaOutcome) {
        let params = SaParams {
            max_steps: 50,
            moves_per_step: 20,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(seed);
        let mut walk = Walk::new(0.0, 9.0);
        let t0 = calibrate(&mut walk, &params, &mut rng);
        let outcome = run(&mut walk, &params, t0, &mut rng);
        (walk.position, outcome)
    }

    #[test]
    fn converges_to_target() {
        let (position, outcome) = anneal_walk(1);
        assert_eq!(position, 9.0);
        assert!(outcome.feasible);
        assert_eq!(outcome.best_cost, 0.0);
    }

    #[test]
    fn deterministic_for_equal_seeds() {
        let (pos_a, out_a) = anneal_walk(42);
        let (pos_b, out_b) = anneal_walk(42);
        assert_eq!(pos_a, pos_b);
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn different_seeds_may_differ_in_path() {
        let (_, out_a) = anneal_walk(1);
        let (_, out_b) = anneal_walk(2);
        // Both converge; the accept traces are seed-dependent.
        assert!(out_a.feasible && out_b.feasible);
        assert_ne!(out_a.accepted, out_b.accepted);
    }

    #[test]
    fn calibrate_sets_positive_temperature() {
        let params = SaParams::default();
        let mut rng = StdRng::seed_from_u64(5);
        let mut walk = Walk::new(0.0, 9.0);
        let t0 = calibrate(&mut walk, &params, &mut rng);
        assert!(t0 > 0.0);
        assert!(walk.norms.area > 0.0);
    }

    #[test]
    fn cooling_schedule_is_monotonic() {
        let params = SaParams::default();
        let mut t = 10.0;
        let mut prev = t;
        for _ in 0..params.max_steps {
            t *= params.cooling_rate;
            assert!(t <= prev);
            prev = t;
        }
    }

    #[test]
    fn infeasible_run_consumes_restarts() {
        // Unreachable target within the step budget: every restart is spent.
        let params = SaParams {
            max_steps: 2,
            moves_per_step: 2,
            max_restarts: 2,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let mut walk = Walk::new(0.0, 1000.0);
        let t0 = calibrate(&mut walk, &params, &mut rng);
        let outcome = run(&mut walk, &params, t0, &mut rng);
        assert!(!outcome.feasible);
        assert_eq!(outcome.restarts, 2);
    }

    #[test]
    fn repair_attempted_on_infeasible_best() {
        let params = SaParams {
            max_steps: 5,
            moves_per_step: 5,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        let mut walk = Walk::new(0.0, 1000.0);
        let t0 = calibrate(&mut walk, &params, &mut rng);
        run(&mut walk, &params, t0, &mut rng);
        assert!(walk.repaired);
    }

    #[test]
    fn trials_match_schedule() {
        let (_, outcome) = anneal_walk(9);
        // Feasible first pass: exactly max_steps * moves_per_step trials.
        assert_eq!(outcome.trials, 50 * 20);
    }
}

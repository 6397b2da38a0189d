// Random construction driver: glue around the core that issues weighted
// random moves against a sketch. The interesting state machine lives in
// the sketch itself; this loop only chooses which legal move to try next.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::PlanKind;
use crate::sketch::{Connected, PlanId, PlugCandidates, Sketch};

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub max_moves: usize,
    pub seed: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            max_moves: 200,
            seed: 0,
        }
    }
}

/// Weighted-random move loop. Deterministic under a fixed seed.
pub struct RandomDriver {
    rng: StdRng,
    max_moves: usize,
}

impl RandomDriver {
    pub fn new(config: &DriverConfig) -> Self {
        RandomDriver {
            rng: StdRng::seed_from_u64(config.seed),
            max_moves: config.max_moves,
        }
    }

    /// Play against the sketch until the move budget runs out. Returns
    /// the number of turns that actually mutated the sketch; turns that
    /// found no legal move (empty pools, rejected connects) count against
    /// the budget but not against the result.
    pub fn run(&mut self, sketch: &mut Sketch) -> usize {
        let mut applied = 0;
        for _ in 0..self.max_moves {
            if self.step(sketch) {
                applied += 1;
            }
        }
        log::debug!(
            "driver applied {} of {} turns; {} finished plans",
            applied,
            self.max_moves,
            sketch.finished_plans().count()
        );
        applied
    }

    fn step(&mut self, sketch: &mut Sketch) -> bool {
        match self.rng.gen_range(0..10u32) {
            0 | 1 => {
                sketch.declare_variable();
                true
            }
            2 | 3 => {
                let kind = PlanKind::ALL[self.rng.gen_range(0..PlanKind::ALL.len())];
                sketch.start(kind);
                true
            }
            _ => self.try_connect(sketch),
        }
    }

    fn try_connect(&mut self, sketch: &mut Sketch) -> bool {
        let unfinished: Vec<PlanId> = sketch.unfinished_plans().collect();
        if unfinished.is_empty() {
            return false;
        }
        let plan = unfinished[self.rng.gen_range(0..unfinished.len())];
        let mut slots = match sketch.slot_candidates(plan) {
            Ok(slots) if !slots.is_empty() => slots,
            _ => return false,
        };
        let slot = slots.swap_remove(self.rng.gen_range(0..slots.len()));
        let pools = match sketch.plug_candidates(&slot) {
            Ok(pools) if !pools.is_empty() => pools,
            _ => return false,
        };
        let values = match pools {
            PlugCandidates::Tuple { variables } => {
                vec![Connected::Variable(self.choose(variables))]
            }
            PlugCandidates::Mapping { keys, values } => {
                vec![Connected::Variable(self.choose(keys)), self.choose(values)]
            }
            PlugCandidates::Value { values } => vec![self.choose(values)],
        };
        match sketch.connect(&slot, values) {
            Ok(()) => true,
            Err(err) => {
                log::trace!("move rejected on {}: {}", slot, err);
                false
            }
        }
    }

    fn choose<T>(&mut self, mut pool: Vec<T>) -> T {
        let index = self.rng.gen_range(0..pool.len());
        pool.swap_remove(index)
    }
}

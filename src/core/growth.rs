//! Growth engine: turns the latest focus reading into the visual parameters
//! the tree renderer consumes.
//!
//! Growth-only model: maturity never decreases within a session. Negative
//! readings can at most shed a cosmetic falling leaf while the tree is still
//! small; shedding never touches maturity, bloom, or phase.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Per-tick maturity gain per unit of positive score (rate-proportional law).
pub const GROWTH_RATE: f64 = 0.001;

/// Maturity above which flowers start to bloom.
pub const BLOOM_THRESHOLD: f64 = 0.8;

/// Exponential-approach factor for the bloom level.
pub const BLOOM_SMOOTHING: f64 = 0.05;

/// Per-tick advance of the free-running sway clock.
pub const PHASE_STEP: f64 = 0.03;

/// Scores below this may shed a cosmetic leaf.
const LEAF_SHED_SCORE: f64 = -0.1;

/// Leaves only shed while the tree is still small.
const LEAF_SHED_MATURITY_CEILING: f64 = 0.5;

/// Per-tick shed probability once the gate is open.
const LEAF_SHED_CHANCE: f64 = 0.05;

/// Tunable growth parameters, defaulting to the constants above.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthTuning {
    pub growth_rate: f64,
    pub bloom_threshold: f64,
    pub bloom_smoothing: f64,
    pub phase_step: f64,
}

impl Default for GrowthTuning {
    fn default() -> Self {
        Self {
            growth_rate: GROWTH_RATE,
            bloom_threshold: BLOOM_THRESHOLD,
            bloom_smoothing: BLOOM_SMOOTHING,
            phase_step: PHASE_STEP,
        }
    }
}

/// Read-only view of the growth state for the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthSnapshot {
    /// Cumulative positive focus, `0.0..=1.0`, non-decreasing within a session
    pub maturity: f64,
    /// Smoothed bloom intensity; lags maturity past the bloom threshold
    pub bloom_level: f64,
    /// Free-running animation clock (drives sway)
    pub phase: f64,
}

/// Accumulates maturity/bloom/phase from the reading stream, one tick per
/// simulation frame.
pub struct GrowthEngine {
    tuning: GrowthTuning,
    maturity: f64,
    bloom_level: f64,
    phase: f64,
    rng: SmallRng,
}

impl GrowthEngine {
    pub fn new(tuning: GrowthTuning) -> Self {
        Self {
            tuning,
            maturity: 0.0,
            bloom_level: 0.0,
            phase: 0.0,
            rng: SmallRng::from_entropy(),
        }
    }

    /// Apply one simulation tick with the most recent score.
    ///
    /// The caller re-applies the same reading every frame until the poller
    /// replaces it; only positive scores grow the tree.
    pub fn tick(&mut self, score: f64) -> GrowthSnapshot {
        if score > 0.0 {
            self.maturity = (self.maturity + score * self.tuning.growth_rate).clamp(0.0, 1.0);
        }

        let target_bloom = if self.maturity > self.tuning.bloom_threshold {
            ((self.maturity - self.tuning.bloom_threshold) * 5.0).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.bloom_level += (target_bloom - self.bloom_level) * self.tuning.bloom_smoothing;

        self.phase += self.tuning.phase_step;

        self.snapshot()
    }

    /// Roll for a cosmetic falling leaf.
    ///
    /// Purely decorative: the outcome never feeds back into the growth state.
    pub fn maybe_shed_leaf(&mut self, score: f64) -> bool {
        score < LEAF_SHED_SCORE
            && self.maturity < LEAF_SHED_MATURITY_CEILING
            && self.rng.gen::<f64>() < LEAF_SHED_CHANCE
    }

    /// Back to a seedling at session start.
    pub fn reset(&mut self) {
        self.maturity = 0.0;
        self.bloom_level = 0.0;
        self.phase = 0.0;
    }

    pub fn snapshot(&self) -> GrowthSnapshot {
        GrowthSnapshot {
            maturity: self.maturity,
            bloom_level: self.bloom_level,
            phase: self.phase,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maturity_non_decreasing() {
        let mut engine = GrowthEngine::new(GrowthTuning::default());
        let scores = [0.5, 0.0, 0.9, 0.1, 0.0, 1.0];

        let mut previous = 0.0;
        for score in scores {
            let snapshot = engine.tick(score);
            assert!(snapshot.maturity >= previous);
            previous = snapshot.maturity;
        }
    }

    #[test]
    fn test_negative_score_does_not_shrink() {
        let mut engine = GrowthEngine::new(GrowthTuning::default());
        engine.tick(1.0);
        let before = engine.snapshot().maturity;

        let after = engine.tick(-1.0).maturity;
        assert_eq!(after, before);
    }

    #[test]
    fn test_maturity_clamped_at_one() {
        let mut engine = GrowthEngine::new(GrowthTuning::default());
        for _ in 0..2000 {
            engine.tick(1.0);
        }
        assert_eq!(engine.snapshot().maturity, 1.0);
    }

    #[test]
    fn test_bloom_stays_zero_below_threshold() {
        let mut engine = GrowthEngine::new(GrowthTuning::default());
        // 700 ticks at full score -> maturity 0.7, under the 0.8 threshold
        for _ in 0..700 {
            engine.tick(1.0);
        }
        assert!(engine.snapshot().maturity < BLOOM_THRESHOLD);
        assert_eq!(engine.snapshot().bloom_level, 0.0);
    }

    #[test]
    fn test_bloom_approaches_target_from_below() {
        let mut engine = GrowthEngine::new(GrowthTuning::default());
        for _ in 0..1000 {
            engine.tick(1.0);
        }
        assert_eq!(engine.snapshot().maturity, 1.0);

        // Target is 1.0; bloom should climb monotonically toward it
        let mut previous = engine.snapshot().bloom_level;
        assert!(previous > 0.0);
        for _ in 0..200 {
            let bloom = engine.tick(0.0).bloom_level;
            assert!(bloom >= previous);
            assert!(bloom <= 1.0);
            previous = bloom;
        }
        assert!(previous > 0.9);
    }

    #[test]
    fn test_phase_advances_every_tick() {
        let mut engine = GrowthEngine::new(GrowthTuning::default());
        engine.tick(0.0);
        engine.tick(-0.5);
        let phase = engine.snapshot().phase;
        assert!((phase - 2.0 * PHASE_STEP).abs() < 1e-12);
    }

    #[test]
    fn test_leaf_shed_gate() {
        let mut engine = GrowthEngine::new(GrowthTuning::default());

        // Gate closed: score not low enough
        for _ in 0..100 {
            assert!(!engine.maybe_shed_leaf(0.5));
            assert!(!engine.maybe_shed_leaf(-0.05));
        }

        // Gate open: sheds eventually (P(miss all) = 0.95^2000)
        let shed = (0..2000).any(|_| engine.maybe_shed_leaf(-0.5));
        assert!(shed);

        // Gate closed again once the tree is big
        for _ in 0..1000 {
            engine.tick(1.0);
        }
        for _ in 0..100 {
            assert!(!engine.maybe_shed_leaf(-0.5));
        }
    }

    #[test]
    fn test_leaf_shed_never_mutates_growth_state() {
        let mut engine = GrowthEngine::new(GrowthTuning::default());
        engine.tick(0.3);
        let before = engine.snapshot();

        for _ in 0..500 {
            engine.maybe_shed_leaf(-0.9);
        }
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn test_reset_returns_to_seedling() {
        let mut engine = GrowthEngine::new(GrowthTuning::default());
        for _ in 0..900 {
            engine.tick(1.0);
        }
        engine.reset();
        assert_eq!(engine.snapshot(), GrowthSnapshot::default());
    }
}

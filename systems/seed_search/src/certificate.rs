use duelforge_core::{level_to_input, RuleMatrix};
use serde::{Deserialize, Serialize};

/// Proof that a seed induces a fair game.
///
/// Carries the certified seed, the rule matrix it generates, and one concrete
/// winning and one concrete losing input path for the configured number of
/// battle rounds. The seed is the only artifact that needs to be persisted:
/// regenerating the rule matrix from it reproduces the same game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeedCertificate {
    seed: i64,
    battle_rounds: u32,
    rule: RuleMatrix,
    winning_path: Vec<u8>,
    losing_path: Vec<u8>,
}

impl SeedCertificate {
    pub(crate) fn new(
        seed: i64,
        battle_rounds: u32,
        rule: RuleMatrix,
        winning_path: Vec<u8>,
        losing_path: Vec<u8>,
    ) -> Self {
        Self {
            seed,
            battle_rounds,
            rule,
            winning_path,
            losing_path,
        }
    }

    /// The certified seed.
    #[must_use]
    pub const fn seed(&self) -> i64 {
        self.seed
    }

    /// Number of battle rounds the certification covers.
    #[must_use]
    pub const fn battle_rounds(&self) -> u32 {
        self.battle_rounds
    }

    /// Rule matrix generated from the certified seed.
    #[must_use]
    pub const fn rule(&self) -> &RuleMatrix {
        &self.rule
    }

    /// Discrete input levels of the certified winning path.
    #[must_use]
    pub fn winning_path(&self) -> &[u8] {
        &self.winning_path
    }

    /// Discrete input levels of the certified losing path.
    #[must_use]
    pub fn losing_path(&self) -> &[u8] {
        &self.losing_path
    }

    /// The winning path as real-valued inputs in `[0, 1]`.
    #[must_use]
    pub fn winning_inputs(&self) -> Vec<f64> {
        self.winning_path.iter().copied().map(level_to_input).collect()
    }

    /// The losing path as real-valued inputs in `[0, 1]`.
    #[must_use]
    pub fn losing_inputs(&self) -> Vec<f64> {
        self.losing_path.iter().copied().map(level_to_input).collect()
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Seed validation engine.
//!
//! For candidate seeds the engine runs three short-circuiting stages: a cheap
//! statistical rough filter, a more expensive deep filter, and a bounded
//! depth-first proof search that must exhibit one concrete winning and one
//! concrete losing input path. The first candidate to survive all three
//! stages is returned as a [`SeedCertificate`].
//!
//! Every pseudo-random stream in the engine is a ChaCha generator whose seed
//! is derived from the candidate seed and an ASCII stream label via SHA-256.
//! Certification is therefore fully reproducible from the base seed, the
//! templates, and the configuration, including the proof phase's branch
//! shuffling.

use std::time::{Duration, Instant};

use duelforge_core::{Enemy, Player, RuleMatrix, INPUT_LEVELS};
use duelforge_system_battle as battle;
use duelforge_system_rulegen as rulegen;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::{debug, info};

mod certificate;

pub use certificate::SeedCertificate;

/// Normal deviate for the two-sided 99% confidence interval.
const ROUGH_FILTER_Z: f64 = 2.576;

const STREAM_CANDIDATE: &str = "candidate";
const STREAM_ROUGH: &str = "rough-filter";
const STREAM_DEEP: &str = "deep-filter";
const STREAM_PROOF: &str = "proof-phase";

/// Recoverable failures reported by the validation engine.
///
/// Exhaustion is not fatal: the caller decides whether to widen the search,
/// increase the round count, or fall back to a default seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SearchError {
    /// Every candidate seed in the retry budget was rejected.
    #[error("no certifiable seed found after {tries} candidate seeds")]
    Exhausted {
        /// Number of candidate seeds that were evaluated.
        tries: usize,
    },
    /// The optional wall-clock deadline expired before certification.
    #[error("search deadline expired after {tries} candidate seeds")]
    DeadlineExpired {
        /// Number of candidate seeds that were evaluated before expiry.
        tries: usize,
    },
}

/// Tuning knobs for the validation engine.
///
/// [`SearchConfig::for_size`] scales the sampling and proof budgets with the
/// entity matrix size the way the engine expects; the `with_*` builders
/// override individual knobs.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    rough_samples: usize,
    deep_samples: usize,
    proof_width: usize,
    proof_max_nodes: usize,
    max_tries: usize,
    parallel: bool,
    deadline: Option<Duration>,
}

impl SearchConfig {
    /// Default budgets for entities holding `size * size` matrices.
    #[must_use]
    pub fn for_size(size: usize) -> Self {
        let cells = (size * size).max(1);
        Self {
            rough_samples: 50 * cells,
            deep_samples: 200 * cells,
            proof_width: 3,
            proof_max_nodes: 1000 * cells,
            max_tries: 1000,
            parallel: false,
            deadline: None,
        }
    }

    /// Overrides the rough and deep filter sample counts.
    #[must_use]
    pub fn with_samples(mut self, rough: usize, deep: usize) -> Self {
        self.rough_samples = rough;
        self.deep_samples = deep;
        self
    }

    /// Overrides the proof phase branching width and node budget.
    #[must_use]
    pub fn with_proof_budget(mut self, width: usize, max_nodes: usize) -> Self {
        self.proof_width = width;
        self.proof_max_nodes = max_nodes;
        self
    }

    /// Overrides the candidate seed retry budget.
    #[must_use]
    pub fn with_max_tries(mut self, max_tries: usize) -> Self {
        self.max_tries = max_tries;
        self
    }

    /// Enables or disables parallel candidate evaluation.
    ///
    /// In parallel mode independent workers race to certify a candidate and
    /// the first certificate wins; which seed that is may vary between runs
    /// even for a fixed base seed.
    #[must_use]
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Installs a wall-clock deadline that cleanly aborts the retry loop.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Orchestrates candidate generation, filtering, and the proof search.
#[derive(Clone, Debug)]
pub struct SeedSearch {
    config: SearchConfig,
}

impl SeedSearch {
    /// Creates a validation engine with the provided configuration.
    #[must_use]
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    /// Searches for a certified-fair seed for a `battle_rounds`-round game
    /// between clones of the provided templates.
    ///
    /// Candidate seeds are derived deterministically from `base_seed`. The
    /// templates are never mutated: every trial operates on its own clones.
    ///
    /// # Panics
    ///
    /// Panics when `battle_rounds` is zero; that is a precondition violation
    /// by the caller, not a retryable search failure.
    pub fn validate(
        &self,
        battle_rounds: u32,
        player: &Player,
        enemy: &Enemy,
        base_seed: i64,
    ) -> Result<SeedCertificate, SearchError> {
        assert!(battle_rounds > 0, "battle_rounds must be positive");

        let size = player.matrix().rows();
        let start = Instant::now();
        let attempts = AtomicUsize::new(0);

        let found = if self.config.parallel {
            (0..self.config.max_tries as u64)
                .into_par_iter()
                .find_map_any(|index| {
                    if self.deadline_expired(start) {
                        return None;
                    }
                    let _ = attempts.fetch_add(1, Ordering::Relaxed);
                    self.evaluate_candidate(index, battle_rounds, size, player, enemy, base_seed)
                })
        } else {
            let mut found = None;
            for index in 0..self.config.max_tries as u64 {
                if self.deadline_expired(start) {
                    break;
                }
                let _ = attempts.fetch_add(1, Ordering::Relaxed);
                found =
                    self.evaluate_candidate(index, battle_rounds, size, player, enemy, base_seed);
                if found.is_some() {
                    break;
                }
            }
            found
        };

        let tries = attempts.load(Ordering::Relaxed);
        match found {
            Some(certificate) => Ok(certificate),
            None if tries < self.config.max_tries && self.deadline_expired(start) => {
                Err(SearchError::DeadlineExpired { tries })
            }
            None => Err(SearchError::Exhausted { tries }),
        }
    }

    fn deadline_expired(&self, start: Instant) -> bool {
        self.config
            .deadline
            .map_or(false, |deadline| start.elapsed() >= deadline)
    }

    /// Runs the three certification stages for one candidate seed.
    fn evaluate_candidate(
        &self,
        index: u64,
        battle_rounds: u32,
        size: usize,
        player: &Player,
        enemy: &Enemy,
        base_seed: i64,
    ) -> Option<SeedCertificate> {
        let seed = derive_candidate_seed(base_seed, index);
        let rule = rulegen::generate(seed, size);

        let mut rough_rng = ChaCha8Rng::seed_from_u64(derive_stream_seed(seed, STREAM_ROUGH));
        let wins = self.sample_wins(
            battle_rounds,
            player,
            enemy,
            &rule,
            self.config.rough_samples,
            &mut rough_rng,
        );
        let (low, high) = wilson_interval(wins, self.config.rough_samples);
        if !(low < 0.99 && high > 0.01) {
            debug!(seed, wins, low, high, "candidate rejected by rough filter");
            return None;
        }

        let mut deep_rng = ChaCha8Rng::seed_from_u64(derive_stream_seed(seed, STREAM_DEEP));
        let wins = self.sample_wins(
            battle_rounds,
            player,
            enemy,
            &rule,
            self.config.deep_samples,
            &mut deep_rng,
        );
        let estimate = wins as f64 / self.config.deep_samples.max(1) as f64;
        if estimate == 0.0 || estimate == 1.0 {
            debug!(seed, estimate, "candidate rejected by deep filter");
            return None;
        }

        let proof = ProofSearch {
            rounds: battle_rounds as usize,
            width: self.config.proof_width,
            budget: self.config.proof_max_nodes,
            nodes: 0,
            rng: ChaCha8Rng::seed_from_u64(derive_stream_seed(seed, STREAM_PROOF)),
            player,
            enemy,
            rule: &rule,
            winning: None,
            losing: None,
        };
        match proof.run() {
            Some((winning_path, losing_path)) => {
                info!(seed, estimate, "candidate seed certified");
                Some(SeedCertificate::new(
                    seed,
                    battle_rounds,
                    rule,
                    winning_path,
                    losing_path,
                ))
            }
            None => {
                debug!(seed, "candidate rejected by proof phase");
                None
            }
        }
    }

    /// Counts winning trials over independently sampled input sequences.
    ///
    /// Every trial clones the templates so concurrent candidate evaluations
    /// never share mutable entity state.
    fn sample_wins(
        &self,
        battle_rounds: u32,
        player: &Player,
        enemy: &Enemy,
        rule: &RuleMatrix,
        samples: usize,
        rng: &mut ChaCha8Rng,
    ) -> usize {
        let mut levels = vec![0_u8; battle_rounds as usize];
        let mut wins = 0;
        for _ in 0..samples {
            for slot in &mut levels {
                *slot = rng.gen_range(0..INPUT_LEVELS);
            }
            let mut trial_player = player.clone();
            let mut trial_enemy = enemy.clone();
            let verdict = battle::replay(&mut trial_player, &mut trial_enemy, rule, &levels);
            if verdict.player_won {
                wins += 1;
            }
        }
        wins
    }
}

/// Width- and node-bounded depth-first search for certifying input paths.
struct ProofSearch<'a> {
    rounds: usize,
    width: usize,
    budget: usize,
    nodes: usize,
    rng: ChaCha8Rng,
    player: &'a Player,
    enemy: &'a Enemy,
    rule: &'a RuleMatrix,
    winning: Option<Vec<u8>>,
    losing: Option<Vec<u8>>,
}

impl ProofSearch<'_> {
    /// Returns the first winning and first losing complete paths, or `None`
    /// when the node budget runs out before both exist.
    fn run(mut self) -> Option<(Vec<u8>, Vec<u8>)> {
        let mut prefix = Vec::with_capacity(self.rounds);
        self.descend(&mut prefix);
        match (self.winning, self.losing) {
            (Some(winning), Some(losing)) => Some((winning, losing)),
            _ => None,
        }
    }

    fn complete(&self) -> bool {
        self.winning.is_some() && self.losing.is_some()
    }

    fn descend(&mut self, prefix: &mut Vec<u8>) {
        if self.nodes >= self.budget || self.complete() {
            return;
        }
        self.nodes += 1;

        if prefix.len() == self.rounds {
            let mut trial_player = self.player.clone();
            let mut trial_enemy = self.enemy.clone();
            let verdict = battle::replay(&mut trial_player, &mut trial_enemy, self.rule, prefix);
            if verdict.player_won {
                if self.winning.is_none() {
                    self.winning = Some(prefix.clone());
                }
            } else if self.losing.is_none() {
                self.losing = Some(prefix.clone());
            }
            return;
        }

        // Shuffle the full grid, then explore a width-limited prefix.
        let mut choices: Vec<u8> = (0..INPUT_LEVELS).collect();
        choices.shuffle(&mut self.rng);
        choices.truncate(self.width);

        for level in choices {
            prefix.push(level);
            self.descend(prefix);
            let _ = prefix.pop();
            if self.nodes >= self.budget || self.complete() {
                return;
            }
        }
    }
}

/// Wilson score interval on the true win probability.
///
/// A heuristic filter rather than a formal test: the interval is clamped to
/// `[0, 1]` and an empty sample yields the uninformative `(0, 1)`.
fn wilson_interval(wins: usize, samples: usize) -> (f64, f64) {
    if samples == 0 {
        return (0.0, 1.0);
    }
    let n = samples as f64;
    let p = wins as f64 / n;
    let z = ROUGH_FILTER_Z;
    let denominator = 1.0 + z * z / n;
    let center = p + z * z / (2.0 * n);
    let margin = z * (p * (1.0 - p) / n + z * z / (4.0 * n * n)).sqrt();
    let low = ((center - margin) / denominator).max(0.0);
    let high = ((center + margin) / denominator).min(1.0);
    (low, high)
}

fn derive_candidate_seed(base_seed: i64, index: u64) -> i64 {
    let mut hasher = Sha256::new();
    hasher.update(base_seed.to_le_bytes());
    hasher.update(STREAM_CANDIDATE.as_bytes());
    hasher.update(index.to_le_bytes());
    finalize_seed(hasher) as i64
}

fn derive_stream_seed(seed: i64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(label.as_bytes());
    finalize_seed(hasher)
}

fn finalize_seed(hasher: Sha256) -> u64 {
    let digest = hasher.finalize();
    let bytes: [u8; 8] = digest[0..8].try_into().expect("sha256 digest slice length");
    u64::from_le_bytes(bytes)
}

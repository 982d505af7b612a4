#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative battle session.
//!
//! A [`BattleSession`] owns the player, the enemy, and the certified rule
//! matrix, and exposes the two entry points the presentation layer consumes:
//! advancing one round for an input value and resetting both entities to
//! their initial snapshots. Sessions are built either from a fresh
//! certification run or from a previously issued [`SeedCertificate`].

use duelforge_core::{Enemy, Matrix, Player, RoundOutcome, RuleMatrix};
use duelforge_system_battle as battle;
use duelforge_system_seed_search::{SearchConfig, SearchError, SeedCertificate, SeedSearch};

/// Growth rate shared by the canonical boot templates.
const STANDARD_GROWTH_RATE: f64 = 0.5;
/// Diagonal magnitude of the canonical boot templates.
const STANDARD_DIAGONAL: f64 = 2.0;

/// The canonical duel templates the game boots with: a diagonal player and
/// an anti-diagonal enemy of the same size, both with growth rate `0.5`.
#[must_use]
pub fn standard_templates(size: usize) -> (Player, Enemy) {
    let player = Player::new(Matrix::diagonal(size, STANDARD_DIAGONAL), STANDARD_GROWTH_RATE);
    let enemy = Enemy::new(
        "Adversary",
        Matrix::anti_diagonal(size, STANDARD_DIAGONAL),
        STANDARD_GROWTH_RATE,
    );
    (player, enemy)
}

/// A running battle parameterized by a certified seed.
#[derive(Clone, Debug)]
pub struct BattleSession {
    player: Player,
    enemy: Enemy,
    rule: RuleMatrix,
    seed: i64,
    battle_rounds: u32,
    rounds_played: u32,
}

impl BattleSession {
    /// Runs the validation engine over the templates and wraps the certified
    /// game into a session.
    ///
    /// The certificate is returned alongside the session so the caller can
    /// persist the seed or display the certified paths.
    pub fn certify(
        config: SearchConfig,
        battle_rounds: u32,
        player: Player,
        enemy: Enemy,
        base_seed: i64,
    ) -> Result<(Self, SeedCertificate), SearchError> {
        let search = SeedSearch::new(config);
        let certificate = search.validate(battle_rounds, &player, &enemy, base_seed)?;
        let session = Self::from_certificate(player, enemy, &certificate);
        Ok((session, certificate))
    }

    /// Builds a session from templates and a previously issued certificate.
    #[must_use]
    pub fn from_certificate(player: Player, enemy: Enemy, certificate: &SeedCertificate) -> Self {
        let mut session = Self {
            player,
            enemy,
            rule: certificate.rule().clone(),
            seed: certificate.seed(),
            battle_rounds: certificate.battle_rounds(),
            rounds_played: 0,
        };
        session.reset_entities();
        session
    }

    /// Advances one battle round for the provided input in `[0, 1]`.
    pub fn resolve_round(&mut self, input: f64) -> RoundOutcome {
        self.rounds_played = self.rounds_played.saturating_add(1);
        battle::resolve(&mut self.player, &mut self.enemy, &self.rule, input)
    }

    /// Restores both entities to their initial snapshots and rewinds the
    /// round counter.
    pub fn reset_entities(&mut self) {
        self.player.reset();
        self.enemy.reset();
        self.rounds_played = 0;
    }

    /// The certified seed parameterizing this session.
    #[must_use]
    pub const fn seed(&self) -> i64 {
        self.seed
    }

    /// The rule matrix generated from the certified seed.
    #[must_use]
    pub const fn rule(&self) -> &RuleMatrix {
        &self.rule
    }

    /// Number of rounds the certified game lasts.
    #[must_use]
    pub const fn battle_rounds(&self) -> u32 {
        self.battle_rounds
    }

    /// Number of rounds resolved since the last reset.
    #[must_use]
    pub const fn rounds_played(&self) -> u32 {
        self.rounds_played
    }

    /// Whether the certified number of rounds has been played out.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.rounds_played >= self.battle_rounds
    }

    /// Display name of the enemy.
    #[must_use]
    pub fn enemy_name(&self) -> &str {
        self.enemy.name()
    }
}

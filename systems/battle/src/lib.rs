#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Battle resolution: exactly one state transition per call.
//!
//! The resolver never fails. Malformed shapes and empty operands collapse the
//! outcome to exactly `0.0`, which by convention is a player loss, so the
//! validation engine upstream can treat every round as total.

use duelforge_core::{level_to_input, Enemy, Matrix, Player, RoundOutcome, RuleMatrix};

/// Resolves a single battle round.
///
/// Applies the player's input-driven reinforcement, normalizes both entity
/// matrices, computes the scalar outcome
/// `mean(player * rule - enemy)`, and on a strict player win
/// (`outcome > 0`) applies the enemy's adversarial growth with the same
/// input. An outcome of exactly `0.0` is a player loss.
pub fn resolve(player: &mut Player, enemy: &mut Enemy, rule: &RuleMatrix, input: f64) -> RoundOutcome {
    player.update(input);
    player.normalize();
    enemy.normalize();
    let outcome = battle_outcome(player.matrix(), rule.matrix(), enemy.matrix());
    let player_won = outcome > 0.0;
    if player_won {
        enemy.grow(input, rule);
    }
    RoundOutcome {
        outcome,
        player_won,
    }
}

/// Resets both entities and replays a full discrete input sequence.
///
/// Each round reuses the accumulated entity state from the previous rounds;
/// the returned verdict is the final round's. An empty sequence yields a
/// zero-outcome loss.
pub fn replay(
    player: &mut Player,
    enemy: &mut Enemy,
    rule: &RuleMatrix,
    levels: &[u8],
) -> RoundOutcome {
    player.reset();
    enemy.reset();
    let mut verdict = RoundOutcome {
        outcome: 0.0,
        player_won: false,
    };
    for &level in levels {
        verdict = resolve(player, enemy, rule, level_to_input(level));
    }
    verdict
}

fn battle_outcome(player: &Matrix, rule: &Matrix, enemy: &Matrix) -> f64 {
    player
        .multiply(rule)
        .and_then(|product| product.subtract(enemy))
        .map_or(0.0, |difference| difference.scalar_value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use duelforge_core::Matrix;

    #[test]
    fn zero_rule_matrix_yields_a_player_loss() {
        let mut player = Player::new(Matrix::diagonal(2, 1.0), 0.5);
        let mut enemy = Enemy::new("Adversary", Matrix::diagonal(2, 1.0), 0.5);
        let rule = RuleMatrix::new(Matrix::zeros(2, 2)).expect("rule");

        let verdict = resolve(&mut player, &mut enemy, &rule, 0.5);
        // player * rule is all-zero, so the outcome is mean(-enemy) < 0
        // after normalization, never a win.
        assert!(!verdict.player_won);
    }

    #[test]
    fn zero_states_produce_exactly_zero_outcome() {
        let mut player = Player::new(Matrix::zeros(2, 2), 0.0);
        let mut enemy = Enemy::new("Hollow", Matrix::zeros(2, 2), 0.0);
        let rule = RuleMatrix::new(Matrix::zeros(2, 2)).expect("rule");

        let verdict = resolve(&mut player, &mut enemy, &rule, 0.5);
        assert_eq!(verdict.outcome, 0.0);
        assert!(!verdict.player_won);
    }

    #[test]
    fn empty_rule_matrix_yields_exactly_zero_outcome() {
        let mut player = Player::new(Matrix::diagonal(2, 1.0), 0.5);
        let mut enemy = Enemy::new("Adversary", Matrix::diagonal(2, 1.0), 0.5);
        let rule = RuleMatrix::new(Matrix::zeros(0, 0)).expect("empty rule is square");

        let verdict = resolve(&mut player, &mut enemy, &rule, 0.5);
        assert_eq!(verdict.outcome, 0.0);
        assert!(!verdict.player_won);
    }

    #[test]
    fn mismatched_shapes_collapse_to_zero_outcome() {
        let mut player = Player::new(Matrix::diagonal(3, 2.0), 0.5);
        let mut enemy = Enemy::new("Adversary", Matrix::diagonal(3, 2.0), 0.5);
        let rule = RuleMatrix::new(Matrix::diagonal(2, 1.0)).expect("rule");

        let verdict = resolve(&mut player, &mut enemy, &rule, 0.5);
        assert_eq!(verdict.outcome, 0.0);
        assert!(!verdict.player_won);
    }

    #[test]
    fn empty_entities_collapse_to_zero_outcome() {
        let mut player = Player::new(Matrix::zeros(0, 0), 0.5);
        let mut enemy = Enemy::new("Hollow", Matrix::zeros(0, 0), 0.5);
        let rule = RuleMatrix::new(Matrix::diagonal(2, 1.0)).expect("rule");

        let verdict = resolve(&mut player, &mut enemy, &rule, 0.5);
        assert_eq!(verdict.outcome, 0.0);
        assert!(!verdict.player_won);
    }
}

use duelforge_core::{Enemy, Matrix, Player};
use duelforge_system_battle as battle;
use duelforge_system_rulegen as rulegen;

fn templates() -> (Player, Enemy) {
    let player = Player::new(Matrix::diagonal(2, 2.0), 0.5);
    let enemy = Enemy::new("Adversary", Matrix::anti_diagonal(2, 2.0), 0.5);
    (player, enemy)
}

#[test]
fn replaying_the_same_sequence_reproduces_every_outcome() {
    let rule = rulegen::generate(1_234, 2);
    let levels = [3_u8, 9, 0, 7, 5];

    let first = trace(&levels, &rule);
    let second = trace(&levels, &rule);

    assert_eq!(first, second, "replay diverged between runs");
}

#[test]
fn replay_resets_accumulated_state_between_trials() {
    let rule = rulegen::generate(77, 2);
    let (mut player, mut enemy) = templates();

    let first = battle::replay(&mut player, &mut enemy, &rule, &[1, 2, 3]);
    // A second trial on the same entities must observe freshly reset state.
    let second = battle::replay(&mut player, &mut enemy, &rule, &[1, 2, 3]);

    assert_eq!(first.outcome, second.outcome);
    assert_eq!(first.player_won, second.player_won);
}

#[test]
fn replay_of_an_empty_sequence_is_a_loss() {
    let rule = rulegen::generate(5, 2);
    let (mut player, mut enemy) = templates();

    let verdict = battle::replay(&mut player, &mut enemy, &rule, &[]);
    assert_eq!(verdict.outcome, 0.0);
    assert!(!verdict.player_won);
}

#[test]
fn verdict_is_taken_from_the_final_round() {
    let rule = rulegen::generate(42, 2);
    let (mut player, mut enemy) = templates();
    let levels = [0_u8, 4, 8, 2, 6];

    let replayed = battle::replay(&mut player, &mut enemy, &rule, &levels);

    let (mut round_player, mut round_enemy) = templates();
    round_player.reset();
    round_enemy.reset();
    let mut last = None;
    for &level in &levels {
        last = Some(battle::resolve(
            &mut round_player,
            &mut round_enemy,
            &rule,
            duelforge_core::level_to_input(level),
        ));
    }
    let last = last.expect("five rounds resolved");

    assert_eq!(replayed.outcome, last.outcome);
    assert_eq!(replayed.player_won, last.player_won);
}

fn trace(levels: &[u8], rule: &duelforge_core::RuleMatrix) -> Vec<(f64, bool)> {
    let (mut player, mut enemy) = templates();
    player.reset();
    enemy.reset();
    levels
        .iter()
        .map(|&level| {
            let verdict = battle::resolve(
                &mut player,
                &mut enemy,
                rule,
                duelforge_core::level_to_input(level),
            );
            (verdict.outcome, verdict.player_won)
        })
        .collect()
}

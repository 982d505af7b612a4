#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Duelforge engine.
//!
//! This crate defines the value types that every other crate builds on: the
//! dense [`Matrix`] container, the [`Player`] and [`Enemy`] entities with
//! their immutable initial snapshots, the seed-derived [`RuleMatrix`], and
//! the [`RoundOutcome`] verdict produced by the battle resolver. All numeric
//! degeneracies (empty matrices, shape mismatches) collapse to defined
//! neutral results instead of panicking, so the search loop upstream always
//! makes progress.

use serde::{Deserialize, Serialize};

/// Number of discrete input levels available to a battle round.
///
/// Level `k` maps to the real input `k / (INPUT_LEVELS - 1)`, spanning
/// `[0, 1]` in equal steps.
pub const INPUT_LEVELS: u8 = 10;

/// Converts a discrete input level into its real-valued input in `[0, 1]`.
///
/// Levels beyond the grid are clamped to the highest level.
#[must_use]
pub fn level_to_input(level: u8) -> f64 {
    let clamped = level.min(INPUT_LEVELS - 1);
    f64::from(clamped) / f64::from(INPUT_LEVELS - 1)
}

/// Dense two-dimensional container of real numbers stored in row-major order.
///
/// A matrix with zero rows or zero columns is the canonical empty matrix;
/// every operation treats it as a defined no-op or yields `None` rather than
/// failing. `Clone` produces an independent deep copy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    cells: Vec<f64>,
}

impl Matrix {
    /// Creates a matrix of the given shape filled with zeroes.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![0.0; rows * cols],
        }
    }

    /// Builds a matrix from row-major cell values.
    ///
    /// Returns `None` when the value count does not match `rows * cols`.
    #[must_use]
    pub fn from_values(rows: usize, cols: usize, cells: Vec<f64>) -> Option<Self> {
        if cells.len() != rows * cols {
            return None;
        }
        Some(Self { rows, cols, cells })
    }

    /// Creates a square matrix with `value` on the main diagonal.
    #[must_use]
    pub fn diagonal(size: usize, value: f64) -> Self {
        let mut matrix = Self::zeros(size, size);
        for index in 0..size {
            matrix.cells[index * size + index] = value;
        }
        matrix
    }

    /// Creates a square matrix with `value` on the anti-diagonal.
    #[must_use]
    pub fn anti_diagonal(size: usize, value: f64) -> Self {
        let mut matrix = Self::zeros(size, size);
        for index in 0..size {
            matrix.cells[index * size + (size - 1 - index)] = value;
        }
        matrix
    }

    /// Number of rows in the matrix.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns in the matrix.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Reports whether this is the canonical empty matrix.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Row-major view of the underlying cells.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.cells
    }

    /// Returns the cell at the given row and column, if it exists.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            self.cells.get(row * self.cols + col).copied()
        } else {
            None
        }
    }

    /// Standard matrix product.
    ///
    /// Requires `self.cols == other.rows`; a shape mismatch or an empty
    /// operand yields `None` instead of failing.
    #[must_use]
    pub fn multiply(&self, other: &Self) -> Option<Self> {
        if self.is_empty() || other.is_empty() || self.cols != other.rows {
            return None;
        }
        let mut result = Self::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for j in 0..other.cols {
                let mut sum = 0.0;
                for k in 0..self.cols {
                    sum += self.cells[i * self.cols + k] * other.cells[k * other.cols + j];
                }
                result.cells[i * other.cols + j] = sum;
            }
        }
        Some(result)
    }

    /// Element-wise difference with another matrix of identical shape.
    ///
    /// A shape mismatch or an empty operand yields `None`.
    #[must_use]
    pub fn subtract(&self, other: &Self) -> Option<Self> {
        if self.is_empty() || other.is_empty() {
            return None;
        }
        if self.rows != other.rows || self.cols != other.cols {
            return None;
        }
        let cells = self
            .cells
            .iter()
            .zip(&other.cells)
            .map(|(left, right)| left - right)
            .collect();
        Some(Self {
            rows: self.rows,
            cols: self.cols,
            cells,
        })
    }

    /// Arithmetic mean of all cells; exactly `0.0` for an empty matrix.
    #[must_use]
    pub fn scalar_value(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.cells.iter().sum();
        sum / self.cells.len() as f64
    }

    /// Divides every cell by the matrix's L2 norm, in place.
    ///
    /// Empty and all-zero matrices are left unchanged so the operation never
    /// divides by zero.
    pub fn normalize(&mut self) {
        if self.is_empty() {
            return;
        }
        let sum_squares: f64 = self.cells.iter().map(|cell| cell * cell).sum();
        if sum_squares == 0.0 {
            return;
        }
        let norm = newton_sqrt(sum_squares);
        for cell in &mut self.cells {
            *cell /= norm;
        }
    }

    /// Adds `1.0 * growth_rate` to the cell selected by `input` and
    /// `0.1 * growth_rate` to every other cell.
    ///
    /// The input is clamped into `[0, 1]` and mapped onto a row-major cell
    /// index across the whole matrix. Empty matrices are left unchanged.
    fn reinforce(&mut self, growth_rate: f64, input: f64) {
        if self.is_empty() {
            return;
        }
        let target = self.target_index(input);
        for (index, cell) in self.cells.iter_mut().enumerate() {
            if index == target {
                *cell += 1.0 * growth_rate;
            } else {
                *cell += 0.1 * growth_rate;
            }
        }
    }

    /// Maps a real input in `[0, 1]` onto a row-major cell index.
    fn target_index(&self, input: f64) -> usize {
        let total = self.rows * self.cols;
        let clamped = input.clamp(0.0, 1.0);
        let index = (clamped * (total - 1) as f64).round() as usize;
        index.min(total - 1)
    }

    /// Locates the cell holding the maximum value.
    ///
    /// Scans in row-major order and keeps the first occurrence on ties, which
    /// callers rely on for deterministic adversarial reinforcement. Returns
    /// `None` for an empty matrix.
    #[must_use]
    pub fn max_cell(&self) -> Option<(usize, usize)> {
        if self.is_empty() {
            return None;
        }
        let mut best = self.cells[0];
        let mut best_index = 0;
        for (index, &cell) in self.cells.iter().enumerate() {
            if cell > best {
                best = cell;
                best_index = index;
            }
        }
        Some((best_index / self.cols, best_index % self.cols))
    }

    fn add_at(&mut self, row: usize, col: usize, amount: f64) {
        if row < self.rows && col < self.cols {
            self.cells[row * self.cols + col] += amount;
        }
    }
}

/// Iterative Newton square root used by [`Matrix::normalize`].
///
/// Iterates until the update falls below machine precision, so the result is
/// accurate regardless of the input's magnitude. Zero and negative inputs
/// are a defined degenerate case and return `0.0`.
#[must_use]
fn newton_sqrt(value: f64) -> f64 {
    if value <= 0.0 {
        return 0.0;
    }
    let mut estimate = value;
    // Newton steps settle into a sub-ulp cycle once converged; the cap
    // bounds the loop in that case.
    for _ in 0..64 {
        let next = 0.5 * (estimate + value / estimate);
        if (next - estimate).abs() <= f64::EPSILON * estimate {
            return next;
        }
        estimate = next;
    }
    estimate
}

/// Square matrix of seed-derived values in `[-1, 1]` that couples player and
/// enemy state into a scalar battle outcome.
///
/// Immutable once generated; regenerating from the same seed and size must
/// yield bit-identical values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleMatrix {
    matrix: Matrix,
}

impl RuleMatrix {
    /// Wraps a square matrix as a rule matrix.
    ///
    /// Returns `None` when the matrix is not square.
    #[must_use]
    pub fn new(matrix: Matrix) -> Option<Self> {
        if matrix.rows() == matrix.cols() {
            Some(Self { matrix })
        } else {
            None
        }
    }

    /// The underlying square matrix.
    #[must_use]
    pub const fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Edge length of the square matrix.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.matrix.rows()
    }
}

/// The player-controlled entity: a mutable matrix state, an immutable
/// initial snapshot, and a growth rate.
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    state: Matrix,
    initial: Matrix,
    growth_rate: f64,
}

impl Player {
    /// Creates a player, capturing `initial` as the immutable reset snapshot.
    #[must_use]
    pub fn new(initial: Matrix, growth_rate: f64) -> Self {
        Self {
            state: initial.clone(),
            initial,
            growth_rate,
        }
    }

    /// Current matrix state.
    #[must_use]
    pub const fn matrix(&self) -> &Matrix {
        &self.state
    }

    /// Growth rate applied by the reinforcement rule.
    #[must_use]
    pub const fn growth_rate(&self) -> f64 {
        self.growth_rate
    }

    /// Applies the input-driven reinforcement rule to the current state.
    pub fn update(&mut self, input: f64) {
        self.state.reinforce(self.growth_rate, input);
    }

    /// Normalizes the current state to unit L2 norm.
    pub fn normalize(&mut self) {
        self.state.normalize();
    }

    /// Restores the current state from the initial snapshot.
    ///
    /// Required before every independent simulation trial.
    pub fn reset(&mut self) {
        self.state = self.initial.clone();
    }
}

/// The adversarial entity. Carries a cosmetic display name in addition to
/// the matrix state shared with [`Player`].
#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    name: String,
    state: Matrix,
    initial: Matrix,
    growth_rate: f64,
}

impl Enemy {
    /// Creates an enemy, capturing `initial` as the immutable reset snapshot.
    #[must_use]
    pub fn new(name: impl Into<String>, initial: Matrix, growth_rate: f64) -> Self {
        Self {
            name: name.into(),
            state: initial.clone(),
            initial,
            growth_rate,
        }
    }

    /// Display name. Cosmetic only, excluded from battle semantics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current matrix state.
    #[must_use]
    pub const fn matrix(&self) -> &Matrix {
        &self.state
    }

    /// Growth rate applied by the reinforcement rule.
    #[must_use]
    pub const fn growth_rate(&self) -> f64 {
        self.growth_rate
    }

    /// Adversarial growth invoked after a player win.
    ///
    /// Applies the shared reinforcement rule for `input`, then adds an extra
    /// `1.0 * growth_rate` to the cell matching the rule matrix's maximum
    /// value so the enemy's growth is coupled to the seed's structure.
    pub fn grow(&mut self, input: f64, rule: &RuleMatrix) {
        if self.state.is_empty() || rule.matrix().is_empty() {
            return;
        }
        self.state.reinforce(self.growth_rate, input);
        if let Some((row, col)) = rule.matrix().max_cell() {
            self.state.add_at(row, col, 1.0 * self.growth_rate);
        }
    }

    /// Normalizes the current state to unit L2 norm.
    pub fn normalize(&mut self) {
        self.state.normalize();
    }

    /// Restores the current state from the initial snapshot.
    pub fn reset(&mut self) {
        self.state = self.initial.clone();
    }
}

/// Verdict produced by resolving a single battle round.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundOutcome {
    /// Scalar battle outcome; strictly positive values are player wins.
    pub outcome: f64,
    /// Whether the player won the round (`outcome > 0`).
    pub player_won: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiply_matches_hand_computation() {
        let left = Matrix::from_values(2, 2, vec![1.0, 2.0, 3.0, 4.0]).expect("left");
        let right = Matrix::from_values(2, 2, vec![5.0, 6.0, 7.0, 8.0]).expect("right");
        let product = left.multiply(&right).expect("product");
        assert_eq!(product.values(), &[19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn multiply_with_mismatched_shapes_is_undefined() {
        let left = Matrix::zeros(2, 3);
        let right = Matrix::zeros(2, 2);
        assert!(left.multiply(&right).is_none());
    }

    #[test]
    fn multiply_with_empty_operand_is_undefined() {
        let left = Matrix::zeros(0, 0);
        let right = Matrix::zeros(2, 2);
        assert!(left.multiply(&right).is_none());
        assert!(right.multiply(&left).is_none());
    }

    #[test]
    fn subtract_requires_identical_shape() {
        let left = Matrix::zeros(2, 2);
        let right = Matrix::zeros(2, 3);
        assert!(left.subtract(&right).is_none());
    }

    #[test]
    fn subtract_is_element_wise() {
        let left = Matrix::from_values(2, 2, vec![5.0, 5.0, 5.0, 5.0]).expect("left");
        let right = Matrix::from_values(2, 2, vec![1.0, 2.0, 3.0, 4.0]).expect("right");
        let difference = left.subtract(&right).expect("difference");
        assert_eq!(difference.values(), &[4.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn scalar_value_of_empty_matrix_is_zero() {
        assert_eq!(Matrix::zeros(0, 0).scalar_value(), 0.0);
    }

    #[test]
    fn scalar_value_is_the_mean() {
        let matrix = Matrix::from_values(2, 2, vec![1.0, 2.0, 3.0, 4.0]).expect("matrix");
        assert!((matrix.scalar_value() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn normalize_produces_unit_norm() {
        let mut matrix = Matrix::from_values(2, 2, vec![3.0, 0.0, 4.0, 0.0]).expect("matrix");
        matrix.normalize();
        let sum_squares: f64 = matrix.values().iter().map(|cell| cell * cell).sum();
        assert!((sum_squares - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_is_idempotent() {
        let mut once = Matrix::from_values(2, 2, vec![1.0, 2.0, 3.0, 4.0]).expect("matrix");
        once.normalize();
        let mut twice = once.clone();
        twice.normalize();
        for (left, right) in once.values().iter().zip(twice.values()) {
            assert!((left - right).abs() < 1e-9);
        }
    }

    #[test]
    fn normalize_leaves_zero_matrix_unchanged() {
        let mut matrix = Matrix::zeros(2, 2);
        matrix.normalize();
        assert_eq!(matrix.values(), &[0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn normalize_leaves_empty_matrix_unchanged() {
        let mut matrix = Matrix::zeros(0, 3);
        matrix.normalize();
        assert!(matrix.is_empty());
    }

    #[test]
    fn newton_sqrt_handles_degenerate_inputs() {
        assert_eq!(newton_sqrt(0.0), 0.0);
        assert_eq!(newton_sqrt(-4.0), 0.0);
        assert!((newton_sqrt(25.0) - 5.0).abs() < 1e-9);
        assert!((newton_sqrt(2.0) - std::f64::consts::SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn newton_sqrt_converges_for_large_inputs() {
        let large = 3.7e12;
        let root = newton_sqrt(large);
        assert!((root * root - large).abs() / large < 1e-12);
    }

    #[test]
    fn normalize_handles_large_magnitudes() {
        let mut matrix =
            Matrix::from_values(2, 2, vec![1.0e6, -2.0e6, 3.0e6, 4.0e6]).expect("matrix");
        matrix.normalize();
        let sum_squares: f64 = matrix.values().iter().map(|cell| cell * cell).sum();
        assert!((sum_squares - 1.0).abs() < 1e-6);
    }

    #[test]
    fn clone_is_a_deep_copy() {
        let original = Matrix::from_values(1, 2, vec![1.0, 2.0]).expect("matrix");
        let mut copied = original.clone();
        copied.normalize();
        assert_eq!(original.values(), &[1.0, 2.0]);
    }

    #[test]
    fn player_update_reinforces_the_targeted_cell() {
        let mut player = Player::new(Matrix::zeros(2, 2), 0.5);
        player.update(0.0);
        assert_eq!(player.matrix().values(), &[0.5, 0.05, 0.05, 0.05]);

        player.reset();
        player.update(1.0);
        assert_eq!(player.matrix().values(), &[0.05, 0.05, 0.05, 0.5]);
    }

    #[test]
    fn player_update_clamps_out_of_range_input() {
        let mut low = Player::new(Matrix::zeros(2, 2), 1.0);
        low.update(-3.0);
        let mut zero = Player::new(Matrix::zeros(2, 2), 1.0);
        zero.update(0.0);
        assert_eq!(low.matrix(), zero.matrix());

        let mut high = Player::new(Matrix::zeros(2, 2), 1.0);
        high.update(7.5);
        let mut one = Player::new(Matrix::zeros(2, 2), 1.0);
        one.update(1.0);
        assert_eq!(high.matrix(), one.matrix());
    }

    #[test]
    fn player_update_on_empty_matrix_is_a_noop() {
        let mut player = Player::new(Matrix::zeros(0, 0), 0.5);
        player.update(0.5);
        assert!(player.matrix().is_empty());
    }

    #[test]
    fn reset_restores_the_initial_snapshot() {
        let initial = Matrix::diagonal(2, 2.0);
        let mut player = Player::new(initial.clone(), 0.5);
        player.update(0.3);
        assert_ne!(player.matrix(), &initial);
        player.reset();
        assert_eq!(player.matrix(), &initial);
    }

    #[test]
    fn max_cell_keeps_the_first_occurrence_on_ties() {
        let matrix = Matrix::from_values(2, 2, vec![1.0, 7.0, 7.0, 3.0]).expect("matrix");
        assert_eq!(matrix.max_cell(), Some((0, 1)));
    }

    #[test]
    fn max_cell_of_empty_matrix_is_none() {
        assert_eq!(Matrix::zeros(0, 0).max_cell(), None);
    }

    #[test]
    fn enemy_grow_reinforces_the_rule_maximum() {
        let rule_values = Matrix::from_values(2, 2, vec![0.1, 0.9, -0.3, 0.2]).expect("rule");
        let rule = RuleMatrix::new(rule_values).expect("square rule");
        let mut enemy = Enemy::new("Adversary", Matrix::zeros(2, 2), 0.5);
        enemy.grow(0.0, &rule);
        // Shared reinforcement targets cell (0, 0); the rule maximum at
        // (0, 1) receives the extra adversarial bonus.
        assert_eq!(enemy.matrix().values(), &[0.5, 0.55, 0.05, 0.05]);
    }

    #[test]
    fn enemy_grow_on_empty_matrix_is_a_noop() {
        let rule = RuleMatrix::new(Matrix::diagonal(2, 1.0)).expect("rule");
        let mut enemy = Enemy::new("Hollow", Matrix::zeros(0, 0), 0.5);
        enemy.grow(0.5, &rule);
        assert!(enemy.matrix().is_empty());
    }

    #[test]
    fn rule_matrix_rejects_non_square_input() {
        assert!(RuleMatrix::new(Matrix::zeros(2, 3)).is_none());
        assert!(RuleMatrix::new(Matrix::zeros(3, 3)).is_some());
    }

    #[test]
    fn level_mapping_spans_the_unit_interval() {
        assert_eq!(level_to_input(0), 0.0);
        assert_eq!(level_to_input(INPUT_LEVELS - 1), 1.0);
        assert!((level_to_input(3) - 3.0 / 9.0).abs() < 1e-12);
        assert_eq!(level_to_input(200), 1.0);
    }

    #[test]
    fn matrix_round_trips_through_bincode() {
        let matrix = Matrix::from_values(2, 2, vec![0.25, -0.5, 0.75, -1.0]).expect("matrix");
        let bytes = bincode::serialize(&matrix).expect("serialize");
        let restored: Matrix = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, matrix);
    }
}

//! The tabular Q-value store.

use crate::error::{Error, Result};
use crate::state::StateKey;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maps each discretized state to one value estimate per action.
///
/// Rows are created lazily as zero vectors and are never removed, so the
/// table only grows over a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "QTableSnapshot", try_from = "QTableSnapshot")]
pub struct QTable {
    num_actions: usize,
    values: HashMap<StateKey, Vec<f64>>,
}

impl QTable {
    /// Creates an empty table for `num_actions` actions.
    pub fn new(num_actions: usize) -> Self {
        Self {
            num_actions,
            values: HashMap::new(),
        }
    }

    /// Width of every row.
    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    /// Number of distinct states seen so far.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no state has been referenced yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the row for `state`, inserting a zero row on first reference.
    pub fn values(&mut self, state: &StateKey) -> &[f64] {
        self.row_mut(state)
    }

    /// Returns the row for `state` without inserting it.
    pub fn get(&self, state: &StateKey) -> Option<&[f64]> {
        self.values.get(state).map(Vec::as_slice)
    }

    /// Index of the largest value for `state`. Ties go to the lowest index;
    /// an unseen state picks `0`.
    pub fn best_action(&self, state: &StateKey) -> usize {
        self.get(state).map(argmax).unwrap_or(0)
    }

    /// Epsilon-greedy selection.
    ///
    /// With probability `epsilon` returns a uniform random action, otherwise
    /// [`QTable::best_action`].
    pub fn select<R: Rng>(&self, state: &StateKey, epsilon: f64, rng: &mut R) -> usize {
        if self.num_actions == 0 {
            return 0;
        }
        if rng.random::<f64>() < epsilon {
            rng.random_range(0..self.num_actions)
        } else {
            self.best_action(state)
        }
    }

    /// Applies one Q-learning update:
    /// `Q(s,a) += lr * (reward + discount * max_a' Q(s',a') - Q(s,a))`.
    ///
    /// Both rows are created on first reference. Fails only if `action` is
    /// out of range.
    pub fn update(
        &mut self,
        state: &StateKey,
        action: usize,
        reward: f64,
        next_state: &StateKey,
        learning_rate: f64,
        discount: f64,
    ) -> Result<f64> {
        if action >= self.num_actions {
            return Err(Error::Policy(format!(
                "action {} out of range for {} actions",
                action, self.num_actions
            )));
        }

        let max_next = {
            let next = self.row_mut(next_state);
            next.iter().copied().fold(f64::NEG_INFINITY, f64::max)
        };
        let row = self.row_mut(state);
        let current = row[action];

        // Bellman equation for Q-Learning
        let td_target = reward + discount * max_next;
        row[action] = current + learning_rate * (td_target - current);
        Ok(row[action])
    }

    /// Overwrites one value, creating the row if needed.
    pub fn set(&mut self, state: &StateKey, action: usize, value: f64) -> Result<()> {
        if action >= self.num_actions {
            return Err(Error::Policy(format!(
                "action {} out of range for {} actions",
                action, self.num_actions
            )));
        }
        self.row_mut(state)[action] = value;
        Ok(())
    }

    /// Removes every row.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    fn row_mut(&mut self, state: &StateKey) -> &mut Vec<f64> {
        let width = self.num_actions;
        self.values
            .entry(*state)
            .or_insert_with(|| vec![0.0; width])
    }
}

/// Index of the first maximum.
fn argmax(row: &[f64]) -> usize {
    let mut best = 0;
    for (idx, value) in row.iter().enumerate().skip(1) {
        if *value > row[best] {
            best = idx;
        }
    }
    best
}

/// Serialized shape of a [`QTable`].
///
/// JSON object keys must be strings, so rows travel as an entry list keyed
/// by the structured [`StateKey`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QTableSnapshot {
    pub num_actions: usize,
    pub entries: Vec<(StateKey, Vec<f64>)>,
}

impl From<QTable> for QTableSnapshot {
    fn from(table: QTable) -> Self {
        Self {
            num_actions: table.num_actions,
            entries: table.values.into_iter().collect(),
        }
    }
}

impl TryFrom<QTableSnapshot> for QTable {
    type Error = String;

    fn try_from(snapshot: QTableSnapshot) -> std::result::Result<Self, Self::Error> {
        let mut values = HashMap::with_capacity(snapshot.entries.len());
        for (state, row) in snapshot.entries {
            if row.len() != snapshot.num_actions {
                return Err(format!(
                    "row for {:?} has {} values, expected {}",
                    state,
                    row.len(),
                    snapshot.num_actions
                ));
            }
            if values.insert(state, row).is_some() {
                return Err(format!("duplicate state {:?}", state));
            }
        }
        Ok(Self {
            num_actions: snapshot.num_actions,
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AggregateState, BatteryBucket};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn state(battery: BatteryBucket, bin_full: bool, all_clean: bool) -> StateKey {
        StateKey::Aggregate(AggregateState {
            battery,
            bin_full,
            all_clean,
        })
    }

    fn s0() -> StateKey {
        state(BatteryBucket::High, false, false)
    }

    fn s1() -> StateKey {
        state(BatteryBucket::Low, true, false)
    }

    #[test]
    fn test_unseen_state_is_zero_vector() {
        for width in [4, 7] {
            let mut table = QTable::new(width);
            assert!(table.get(&s0()).is_none());
            assert_eq!(table.values(&s0()), vec![0.0; width].as_slice());
            assert_eq!(table.len(), 1);
        }
    }

    #[test]
    fn test_greedy_tie_breaks_to_first() {
        let mut table = QTable::new(4);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(table.select(&s0(), 0.0, &mut rng), 0);

        table.set(&s0(), 1, 3.0).unwrap();
        table.set(&s0(), 3, 3.0).unwrap();
        for _ in 0..20 {
            assert_eq!(table.select(&s0(), 0.0, &mut rng), 1);
        }
    }

    #[test]
    fn test_full_exploration_is_roughly_uniform() {
        let table = QTable::new(7);
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = [0usize; 7];
        let trials = 7000;
        for _ in 0..trials {
            counts[table.select(&s0(), 1.0, &mut rng)] += 1;
        }
        for count in counts {
            assert!(count > 800 && count < 1200, "counts: {:?}", counts);
        }
    }

    #[test]
    fn test_update_moves_toward_target() {
        let mut table = QTable::new(4);
        let value = table.update(&s0(), 2, 10.0, &s1(), 0.5, 0.9).unwrap();
        assert_eq!(value, 5.0);
        // Both rows were created.
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&s1()), Some([0.0; 4].as_slice()));
    }

    #[test]
    fn test_update_uses_max_of_next_state() {
        let mut table = QTable::new(4);
        table.set(&s1(), 3, 10.0).unwrap();
        table.set(&s1(), 0, -50.0).unwrap();
        let value = table.update(&s0(), 0, 1.0, &s1(), 1.0, 0.5).unwrap();
        assert_eq!(value, 1.0 + 0.5 * 10.0);
    }

    #[test]
    fn test_zero_reward_zero_discount_decays_toward_zero() {
        let mut table = QTable::new(4);
        let lr = 0.15;
        for start in [8.0, -8.0] {
            table.set(&s0(), 1, start).unwrap();
            let value = table.update(&s0(), 1, 0.0, &s1(), lr, 0.0).unwrap();
            assert!((value - (start + lr * (0.0 - start))).abs() < 1e-12);
            assert!(value.abs() < start.abs());
            assert_eq!(value.signum(), start.signum());
        }
    }

    #[test]
    fn test_self_transition_update() {
        let mut table = QTable::new(2);
        let value = table.update(&s0(), 0, 1.0, &s0(), 0.5, 1.0).unwrap();
        assert_eq!(value, 0.5);
    }

    #[test]
    fn test_out_of_range_action_is_error() {
        let mut table = QTable::new(4);
        assert!(matches!(
            table.update(&s0(), 4, 1.0, &s1(), 0.1, 0.9),
            Err(Error::Policy(_))
        ));
        assert!(table.set(&s0(), 9, 1.0).is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn test_serde_round_trip() {
        let mut table = QTable::new(4);
        table.update(&s0(), 1, 3.5, &s1(), 0.2, 0.9).unwrap();
        table.set(&s1(), 2, -7.25).unwrap();

        let json = serde_json::to_string(&table).unwrap();
        let restored: QTable = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, table);
    }

    #[test]
    fn test_deserialize_rejects_ragged_rows() {
        let snapshot = QTableSnapshot {
            num_actions: 4,
            entries: vec![(s0(), vec![0.0; 3])],
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(serde_json::from_str::<QTable>(&json).is_err());
    }
}

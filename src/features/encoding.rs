//! Fixed-width numeric encodings of lineups
//!
//! A block holds one 57-wide slot per player position plus a sixth slot whose
//! last ten entries carry the goalie:
//!
//! ```text
//! [pos0: 47 players | 10 unused] ... [pos4: ...] [slot5: 47 unused | 10 goalies]
//! ```

use crate::features::weights::WeightTable;
use crate::{EncodingWeights, TeamSelection, GOALIE_COUNT, PLAYER_COUNT, POSITIONS};

/// Width of one position slot
pub const SLOT_WIDTH: usize = PLAYER_COUNT + GOALIE_COUNT;
/// Width of one encoded timestep
pub const BLOCK_WIDTH: usize = SLOT_WIDTH * (POSITIONS + 1);
/// Start of the goalie entries inside a block
pub const GOALIE_OFFSET: usize = POSITIONS * SLOT_WIDTH + PLAYER_COUNT;

/// Encodes history windows and target lineups using a weight table
#[derive(Debug, Clone)]
pub struct FeatureEncoder<'a> {
    weights: &'a WeightTable,
    constants: EncodingWeights,
}

impl<'a> FeatureEncoder<'a> {
    pub fn new(weights: &'a WeightTable, constants: EncodingWeights) -> Self {
        FeatureEncoder { weights, constants }
    }

    pub fn weights(&self) -> &WeightTable {
        self.weights
    }

    /// Recency multiplier for timestep `index` of a window, never negative
    fn recency(&self, index: usize, window_len: usize) -> f32 {
        self.constants.recency.weight(index, window_len).max(0.0)
    }

    /// Add one lineup's weighted contribution into a block
    fn accumulate(&self, team: &TeamSelection, recency: f32, block: &mut [f32]) {
        let goalie = team.goalie.index();
        if goalie.is_none() {
            log::warn!("Unresolved goalie {} skipped while encoding", team.goalie);
        }

        for (pos, &player) in team.players.iter().enumerate() {
            let Some(p) = player.index() else {
                log::warn!("Unresolved player {} skipped while encoding", player);
                continue;
            };
            let base = pos * SLOT_WIDTH;

            block[base + p] += recency
                * self.constants.position
                * self.weights.selection(player)
                * self.weights.position_weight(player, pos);

            // Other players land in this position's slot under their own id
            for (other_pos, &other) in team.players.iter().enumerate() {
                if other_pos == pos {
                    continue;
                }
                if let Some(o) = other.index() {
                    block[base + o] += recency
                        * self.constants.player_to_player
                        * self.weights.combination(player, other);
                }
            }

            if let Some(g) = goalie {
                block[GOALIE_OFFSET + g] += recency
                    * self.constants.player_to_goalie
                    * self.weights.goalie_synergy(player, team.goalie);
            }
        }
    }

    /// Encode a single timestep of a window
    pub fn encode_timestep(&self, team: &TeamSelection, index: usize, window_len: usize) -> Vec<f32> {
        let mut block = vec![0.0f32; BLOCK_WIDTH];
        self.accumulate(team, self.recency(index, window_len), &mut block);
        block
    }

    /// Sum every timestep of a window into one block (training input)
    pub fn encode_history(&self, window: &[TeamSelection]) -> Vec<f32> {
        let mut block = vec![0.0f32; BLOCK_WIDTH];
        for (t, team) in window.iter().enumerate() {
            self.accumulate(team, self.recency(t, window.len()), &mut block);
        }
        block
    }

    /// One block per timestep, concatenated oldest first (prediction input)
    pub fn encode_window(&self, window: &[TeamSelection]) -> Vec<f32> {
        let mut out = vec![0.0f32; BLOCK_WIDTH * window.len()];
        for (t, (team, block)) in window.iter().zip(out.chunks_mut(BLOCK_WIDTH)).enumerate() {
            self.accumulate(team, self.recency(t, window.len()), block);
        }
        out
    }

    /// One-hot plus position preference target for a lineup
    pub fn encode_target(&self, team: &TeamSelection) -> Vec<f32> {
        let mut out = vec![0.0f32; BLOCK_WIDTH];

        for (pos, &player) in team.players.iter().enumerate() {
            match player.index() {
                Some(p) => {
                    out[pos * SLOT_WIDTH + p] = 1.0 + self.weights.position_preference(player, pos)
                }
                None => log::warn!("Unresolved player {} skipped in target", player),
            }
        }

        match team.goalie.index() {
            Some(g) => out[GOALIE_OFFSET + g] = 1.0,
            None => log::warn!("Unresolved goalie {} skipped in target", team.goalie),
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, GoalieId, PlayerId, RecencyConfig};

    fn team(numbers: [u8; 6]) -> TeamSelection {
        TeamSelection::from_numbers(numbers).unwrap()
    }

    fn history() -> Vec<TeamSelection> {
        vec![
            team([1, 2, 3, 4, 5, 1]),
            team([1, 2, 3, 4, 6, 1]),
            team([7, 1, 2, 8, 9, 2]),
        ]
    }

    fn weights(history: &[TeamSelection]) -> WeightTable {
        WeightTable::compute(history, &Config::default().weight_factors).unwrap()
    }

    #[test]
    fn test_layout_constants() {
        assert_eq!(SLOT_WIDTH, 57);
        assert_eq!(BLOCK_WIDTH, 342);
        assert_eq!(GOALIE_OFFSET, 332);
    }

    #[test]
    fn test_shapes_and_non_negative() {
        let history = history();
        let table = weights(&history);
        let encoder = FeatureEncoder::new(&table, Config::default().weights);

        let window = encoder.encode_window(&history);
        assert_eq!(window.len(), BLOCK_WIDTH * history.len());
        assert!(window.iter().all(|v| v.is_finite() && *v >= 0.0));

        let input = encoder.encode_history(&history[..2]);
        assert_eq!(input.len(), BLOCK_WIDTH);
        assert!(input.iter().all(|v| v.is_finite() && *v >= 0.0));

        let target = encoder.encode_target(&history[2]);
        assert_eq!(target.len(), BLOCK_WIDTH);
        assert!(target.iter().all(|v| v.is_finite() && *v >= 0.0));
    }

    #[test]
    fn test_history_is_sum_of_window_blocks() {
        let history = history();
        let table = weights(&history);
        let mut constants = Config::default().weights;
        constants.recency = RecencyConfig {
            enabled: true,
            base: 0.5,
            scale: 1.0,
        };
        let encoder = FeatureEncoder::new(&table, constants);

        let summed = encoder.encode_history(&history);
        let window = encoder.encode_window(&history);

        for i in 0..BLOCK_WIDTH {
            let folded: f32 = window.chunks(BLOCK_WIDTH).map(|b| b[i]).sum();
            assert!((summed[i] - folded).abs() < 1e-5);
        }
    }

    #[test]
    fn test_single_team_contributions() {
        let history = history();
        let table = weights(&history);
        let constants = Config::default().weights;
        let encoder = FeatureEncoder::new(&table, constants.clone());

        let lineup = history[0];
        let block = encoder.encode_history(&[lineup]);

        // Player 1 at position 0: own contribution only (nobody else has id 1)
        let own = constants.position
            * table.selection(PlayerId(1))
            * table.position_weight(PlayerId(1), 0);
        assert!((block[0] - own).abs() < 1e-5);

        // Player 2 shows up in position 0's slot through the pair with player 1
        let cross = constants.player_to_player * table.combination(PlayerId(1), PlayerId(2));
        assert!((block[1] - cross).abs() < 1e-5);

        // Goalie slot collects one synergy term per player
        let goalie: f32 = lineup
            .players
            .iter()
            .map(|p| constants.player_to_goalie * table.goalie_synergy(*p, GoalieId(1)))
            .sum();
        assert!((block[GOALIE_OFFSET] - goalie).abs() < 1e-5);
    }

    #[test]
    fn test_target_one_hot_plus_preference() {
        let history = history();
        let table = weights(&history);
        let encoder = FeatureEncoder::new(&table, Config::default().weights);

        let target = encoder.encode_target(&history[2]);
        let non_zero = target.iter().filter(|v| **v > 0.0).count();
        assert_eq!(non_zero, 6);

        // Player 7 only ever played position 0
        assert!((target[6] - 2.0).abs() < 1e-6);
        // Player 1 played position 1 once out of three
        let expected = 1.0 + 1.0 / 3.0;
        assert!((target[SLOT_WIDTH] - expected).abs() < 1e-5);
        assert_eq!(target[GOALIE_OFFSET + 1], 1.0);
    }

    #[test]
    fn test_unresolved_player_skipped() {
        let history = history();
        let table = weights(&history);
        let encoder = FeatureEncoder::new(&table, Config::default().weights);

        let broken = TeamSelection {
            players: [PlayerId(1), PlayerId(99), PlayerId(3), PlayerId(4), PlayerId(5)],
            goalie: GoalieId(1),
        };
        let block = encoder.encode_history(&[broken]);
        assert_eq!(block.len(), BLOCK_WIDTH);
        assert!(block.iter().all(|v| v.is_finite()));
        // Position 1 had no resolvable player, so its slot only gets cross terms
        let target = encoder.encode_target(&broken);
        assert_eq!(target.iter().filter(|v| **v > 0.0).count(), 5);
    }
}

//! Statistical weights derived from selection history
//!
//! Counts are tallied once over the full history and normalised against the
//! most frequent entry. The resulting table is read-only for the rest of a run.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    GoalieId, LineupError, PlayerId, Result, TeamSelection, WeightFactors, GOALIE_COUNT,
    PLAYER_COUNT, POSITIONS,
};

/// Unordered player pair, stored with the lower id first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PairKey(PlayerId, PlayerId);

impl PairKey {
    pub fn new(a: PlayerId, b: PlayerId) -> Self {
        if a <= b {
            PairKey(a, b)
        } else {
            PairKey(b, a)
        }
    }

    pub fn first(&self) -> PlayerId {
        self.0
    }

    pub fn second(&self) -> PlayerId {
        self.1
    }
}

/// Raw occurrence counts over a history
#[derive(Debug, Clone, PartialEq)]
pub struct WeightCounts {
    pub lineups: usize,
    pub players: Vec<u32>,
    pub positions: Vec<[u32; POSITIONS]>,
    pub pairs: BTreeMap<PairKey, u32>,
    pub goalies: Vec<u32>,
    /// `synergy[player][goalie]`
    pub synergy: Vec<[u32; GOALIE_COUNT]>,
}

impl WeightCounts {
    /// Tally appearances, positions, pairs and goalie pairings
    pub fn tally(history: &[TeamSelection]) -> Self {
        let mut counts = WeightCounts {
            lineups: history.len(),
            players: vec![0; PLAYER_COUNT],
            positions: vec![[0; POSITIONS]; PLAYER_COUNT],
            pairs: BTreeMap::new(),
            goalies: vec![0; GOALIE_COUNT],
            synergy: vec![[0; GOALIE_COUNT]; PLAYER_COUNT],
        };

        for team in history {
            let goalie = team.goalie.index();
            if goalie.is_none() {
                log::warn!("Goalie {} out of range, not counted", team.goalie);
            }
            if let Some(g) = goalie {
                counts.goalies[g] += 1;
            }

            for (pos, player) in team.players.iter().enumerate() {
                let Some(p) = player.index() else {
                    log::warn!("Player {} out of range, not counted", player);
                    continue;
                };
                counts.players[p] += 1;
                counts.positions[p][pos] += 1;
                if let Some(g) = goalie {
                    counts.synergy[p][g] += 1;
                }
            }

            for i in 0..POSITIONS {
                for j in (i + 1)..POSITIONS {
                    let (a, b) = (team.players[i], team.players[j]);
                    if a.is_valid() && b.is_valid() {
                        *counts.pairs.entry(PairKey::new(a, b)).or_insert(0) += 1;
                    }
                }
            }
        }

        counts
    }

    pub fn player(&self, id: PlayerId) -> u32 {
        id.index().map(|i| self.players[i]).unwrap_or(0)
    }

    pub fn goalie(&self, id: GoalieId) -> u32 {
        id.index().map(|i| self.goalies[i]).unwrap_or(0)
    }

    pub fn pair(&self, a: PlayerId, b: PlayerId) -> u32 {
        self.pairs.get(&PairKey::new(a, b)).copied().unwrap_or(0)
    }
}

/// Normalised weights for one run
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    counts: WeightCounts,
    selection: Vec<f32>,
    position_preference: Vec<[f32; POSITIONS]>,
    combination: BTreeMap<PairKey, f32>,
    goalie_selection: Vec<f32>,
    goalie_synergy: Vec<[f32; GOALIE_COUNT]>,
}

/// `1 + (count / max) * factor`, or 1 when nothing was counted
fn relative(count: u32, max: u32, factor: f32) -> f32 {
    if max == 0 {
        1.0
    } else {
        1.0 + (count as f32 / max as f32) * factor
    }
}

impl WeightTable {
    /// Compute weights from the full history
    pub fn compute(history: &[TeamSelection], factors: &WeightFactors) -> Result<Self> {
        if history.is_empty() {
            return Err(LineupError::InsufficientData {
                operation: "weight computation",
                available: 0,
                required: 1,
            });
        }
        Ok(Self::from_counts(WeightCounts::tally(history), factors))
    }

    /// Normalise already tallied counts
    pub fn from_counts(counts: WeightCounts, factors: &WeightFactors) -> Self {
        let max_player = counts.players.iter().copied().max().unwrap_or(0);
        let selection = counts
            .players
            .iter()
            .map(|&c| relative(c, max_player, factors.selection_frequency))
            .collect();

        let position_preference = counts
            .positions
            .iter()
            .map(|row| {
                let total: u32 = row.iter().sum();
                let mut prefs = [0.0f32; POSITIONS];
                if total > 0 {
                    for (pref, &c) in prefs.iter_mut().zip(row) {
                        *pref = c as f32 / total as f32;
                    }
                }
                prefs
            })
            .collect();

        let max_pair = counts.pairs.values().copied().max().unwrap_or(0);
        let combination = counts
            .pairs
            .iter()
            .map(|(k, &c)| (*k, relative(c, max_pair, factors.combination_frequency)))
            .collect();

        let max_goalie = counts.goalies.iter().copied().max().unwrap_or(0);
        let goalie_selection = counts
            .goalies
            .iter()
            .map(|&c| relative(c, max_goalie, factors.goalie_selection))
            .collect();

        let max_synergy = counts
            .synergy
            .iter()
            .flat_map(|row| row.iter().copied())
            .max()
            .unwrap_or(0);
        let goalie_synergy = counts
            .synergy
            .iter()
            .map(|row| {
                let mut out = [1.0f32; GOALIE_COUNT];
                for (w, &c) in out.iter_mut().zip(row) {
                    *w = relative(c, max_synergy, factors.goalie_synergy);
                }
                out
            })
            .collect();

        WeightTable {
            counts,
            selection,
            position_preference,
            combination,
            goalie_selection,
            goalie_synergy,
        }
    }

    pub fn counts(&self) -> &WeightCounts {
        &self.counts
    }

    /// Relative pick frequency (1 for unknown players)
    pub fn selection(&self, player: PlayerId) -> f32 {
        player.index().map(|i| self.selection[i]).unwrap_or(1.0)
    }

    /// Fraction of the player's appearances made in `position`
    pub fn position_preference(&self, player: PlayerId, position: usize) -> f32 {
        player
            .index()
            .and_then(|i| self.position_preference[i].get(position).copied())
            .unwrap_or(0.0)
    }

    pub fn position_row(&self, player: PlayerId) -> Option<&[f32; POSITIONS]> {
        player.index().map(|i| &self.position_preference[i])
    }

    /// Position preference as a multiplier: neutral 1 for players never seen
    pub fn position_weight(&self, player: PlayerId, position: usize) -> f32 {
        if self.counts.player(player) == 0 {
            1.0
        } else {
            self.position_preference(player, position)
        }
    }

    /// Pair strength (1 for pairs never seen together)
    pub fn combination(&self, a: PlayerId, b: PlayerId) -> f32 {
        self.combination
            .get(&PairKey::new(a, b))
            .copied()
            .unwrap_or(1.0)
    }

    pub fn combinations(&self) -> impl Iterator<Item = (&PairKey, &f32)> {
        self.combination.iter()
    }

    pub fn goalie_selection(&self, goalie: GoalieId) -> f32 {
        goalie.index().map(|i| self.goalie_selection[i]).unwrap_or(1.0)
    }

    /// Player-goalie synergy (1 when either id is unknown)
    pub fn goalie_synergy(&self, player: PlayerId, goalie: GoalieId) -> f32 {
        match (player.index(), goalie.index()) {
            (Some(p), Some(g)) => self.goalie_synergy[p][g],
            _ => 1.0,
        }
    }
}

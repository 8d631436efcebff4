//! Frequency summary of a history, with a count-based baseline lineup

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::data::Roster;
use crate::features::weights::WeightTable;
use crate::{GoalieId, PlayerId, GOALIE_COUNT, PLAYER_COUNT, POSITIONS};

#[derive(Debug, Clone, Serialize)]
pub struct PlayerFrequency {
    pub id: PlayerId,
    pub name: String,
    pub count: u32,
    pub selection_weight: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalieFrequency {
    pub id: GoalieId,
    pub name: String,
    pub count: u32,
    pub selection_weight: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairFrequency {
    pub first: PlayerId,
    pub second: PlayerId,
    pub count: u32,
    pub weight: f32,
}

/// Summary written by the `weights` command
#[derive(Debug, Clone, Serialize)]
pub struct PatternSummary {
    pub top_players: Vec<PlayerFrequency>,
    pub goalie_frequency: Vec<GoalieFrequency>,
    pub top_combinations: Vec<PairFrequency>,
    /// Five most picked players, most picked first
    pub baseline_players: Vec<PlayerId>,
    pub baseline_goalie: Option<GoalieId>,
    pub lineups_analyzed: usize,
    pub generated_at: DateTime<Utc>,
}

impl PatternSummary {
    pub const TOP_N: usize = 10;

    pub fn new(weights: &WeightTable, roster: &Roster) -> Self {
        let counts = weights.counts();

        // Stable sort keeps lower ids first on equal counts
        let mut players: Vec<PlayerFrequency> = (1..=PLAYER_COUNT as u8)
            .map(PlayerId)
            .filter(|id| counts.player(*id) > 0)
            .map(|id| PlayerFrequency {
                id,
                name: roster.player_or_numbered(id).name,
                count: counts.player(id),
                selection_weight: weights.selection(id),
            })
            .collect();
        players.sort_by(|a, b| b.count.cmp(&a.count));

        let mut goalies: Vec<GoalieFrequency> = (1..=GOALIE_COUNT as u8)
            .map(GoalieId)
            .filter(|id| counts.goalie(*id) > 0)
            .map(|id| GoalieFrequency {
                id,
                name: roster.goalie_or_numbered(id).name,
                count: counts.goalie(id),
                selection_weight: weights.goalie_selection(id),
            })
            .collect();
        goalies.sort_by(|a, b| b.count.cmp(&a.count));

        let mut pairs: Vec<PairFrequency> = counts
            .pairs
            .iter()
            .map(|(key, &count)| PairFrequency {
                first: key.first(),
                second: key.second(),
                count,
                weight: weights.combination(key.first(), key.second()),
            })
            .collect();
        pairs.sort_by(|a, b| b.count.cmp(&a.count));
        pairs.truncate(Self::TOP_N);

        let baseline_players = players.iter().take(POSITIONS).map(|p| p.id).collect();
        let baseline_goalie = goalies.first().map(|g| g.id);

        PatternSummary {
            top_players: players.into_iter().take(Self::TOP_N).collect(),
            goalie_frequency: goalies,
            top_combinations: pairs,
            baseline_players,
            baseline_goalie,
            lineups_analyzed: counts.lineups,
            generated_at: Utc::now(),
        }
    }

    /// Save as pretty JSON
    pub fn save(&self, path: &str) -> crate::Result<()> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, TeamSelection};

    #[test]
    fn test_baseline_uses_most_frequent() {
        let history = vec![
            TeamSelection::from_numbers([1, 2, 3, 4, 5, 1]).unwrap(),
            TeamSelection::from_numbers([1, 2, 3, 4, 6, 2]).unwrap(),
            TeamSelection::from_numbers([1, 2, 3, 7, 8, 2]).unwrap(),
        ];
        let weights = WeightTable::compute(&history, &Config::default().weight_factors).unwrap();
        let summary = PatternSummary::new(&weights, &Roster::numbered());

        assert_eq!(
            summary.baseline_players,
            vec![PlayerId(1), PlayerId(2), PlayerId(3), PlayerId(4), PlayerId(5)]
        );
        assert_eq!(summary.baseline_goalie, Some(GoalieId(2)));
        assert_eq!(summary.top_players[0].count, 3);
        assert_eq!(summary.top_combinations[0].count, 3);
        assert_eq!(summary.lineups_analyzed, 3);
    }
}

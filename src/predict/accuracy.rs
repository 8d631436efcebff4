//! Compare a prediction against past lineups

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{PlayerId, PredictionResult, TeamSelection, PLAYER_COUNT, POSITIONS};

/// Players listed per position in the frequency breakdown
const TOP_PER_POSITION: usize = 3;

/// How often a player filled a position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionShare {
    pub player: PlayerId,
    pub count: usize,
    /// Fraction of all analysed lineups
    pub share: f64,
}

/// Match statistics of one prediction over a history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub total: usize,
    pub five_matches: usize,
    pub four_matches: usize,
    pub three_matches: usize,
    pub two_matches: usize,
    pub one_match: usize,
    /// Lineups with the predicted player in that exact position
    pub position_matches: [usize; POSITIONS],
    pub goalie_matches: usize,
    /// Lineups identical to the prediction, order and goalie included
    pub exact_matches: usize,
    pub most_frequent_by_position: [Option<PlayerId>; POSITIONS],
    pub top_by_position: Vec<Vec<PositionShare>>,
    pub player_frequency: BTreeMap<PlayerId, usize>,
}

impl AccuracyReport {
    /// Count of lineups sharing exactly `n` players with the prediction
    pub fn matches(&self, n: usize) -> usize {
        match n {
            5 => self.five_matches,
            4 => self.four_matches,
            3 => self.three_matches,
            2 => self.two_matches,
            1 => self.one_match,
            _ => 0,
        }
    }

    /// Share of lineups that had the predicted player at `position`
    pub fn position_accuracy(&self, position: usize) -> f64 {
        if self.total == 0 || position >= POSITIONS {
            return 0.0;
        }
        self.position_matches[position] as f64 / self.total as f64
    }

    pub fn goalie_accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.goalie_matches as f64 / self.total as f64
    }
}

/// Analyse how a prediction lines up with every past lineup
pub fn analyze_accuracy(prediction: &PredictionResult, history: &[TeamSelection]) -> AccuracyReport {
    let predicted = prediction.player_ids();
    let goalie = prediction.goalie_id();

    let mut report = AccuracyReport {
        total: history.len(),
        top_by_position: vec![Vec::new(); POSITIONS],
        ..Default::default()
    };
    let mut position_counts = vec![[0usize; PLAYER_COUNT]; POSITIONS];

    for team in history {
        match team.shared_players(&predicted) {
            5 => report.five_matches += 1,
            4 => report.four_matches += 1,
            3 => report.three_matches += 1,
            2 => report.two_matches += 1,
            1 => report.one_match += 1,
            _ => {}
        }

        for (pos, &player) in team.players.iter().enumerate() {
            if predicted.get(pos) == Some(&player) {
                report.position_matches[pos] += 1;
            }
            if let Some(i) = player.index() {
                position_counts[pos][i] += 1;
                *report.player_frequency.entry(player).or_insert(0) += 1;
            }
        }

        if team.goalie == goalie {
            report.goalie_matches += 1;
        }
        if team.goalie == goalie && team.players.as_slice() == predicted.as_slice() {
            report.exact_matches += 1;
        }
    }

    for (pos, counts) in position_counts.iter().enumerate() {
        let mut ranked: Vec<(usize, usize)> = counts
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, c)| c > 0)
            .collect();
        // Most frequent first, lower id on ties
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        report.most_frequent_by_position[pos] =
            ranked.first().map(|&(i, _)| PlayerId(i as u8 + 1));
        report.top_by_position[pos] = ranked
            .into_iter()
            .take(TOP_PER_POSITION)
            .map(|(i, count)| PositionShare {
                player: PlayerId(i as u8 + 1),
                count,
                share: count as f64 / report.total as f64,
            })
            .collect();
    }

    report
}

impl fmt::Display for AccuracyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Historical accuracy over {} lineups:", self.total)?;
        for n in (1..=5).rev() {
            writeln!(f, "  {} players matched: {}", n, self.matches(n))?;
        }
        writeln!(f, "  Exact lineup:       {}", self.exact_matches)?;
        writeln!(f)?;

        writeln!(f, "Position accuracy:")?;
        for pos in 0..POSITIONS {
            let most = self.most_frequent_by_position[pos]
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string());
            write!(
                f,
                "  Position {}: {:>5.1}% (most frequent: {})",
                pos + 1,
                self.position_accuracy(pos) * 100.0,
                most
            )?;
            let top: Vec<String> = self
                .top_by_position
                .get(pos)
                .map(|shares| {
                    shares
                        .iter()
                        .map(|s| format!("{} {:.0}%", s.player, s.share * 100.0))
                        .collect()
                })
                .unwrap_or_default();
            if !top.is_empty() {
                write!(f, " [{}]", top.join(", "))?;
            }
            writeln!(f)?;
        }
        write!(f, "  Goalie:     {:>5.1}%", self.goalie_accuracy() * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Roster;
    use crate::{GoalieId, GoaliePick, PlayerPick};

    fn team(numbers: [u8; 6]) -> TeamSelection {
        TeamSelection::from_numbers(numbers).unwrap()
    }

    fn prediction(numbers: [u8; 6]) -> PredictionResult {
        let roster = Roster::numbered();
        let players = numbers[..POSITIONS]
            .iter()
            .enumerate()
            .map(|(pos, &id)| PlayerPick {
                position: pos,
                player: roster.player_or_numbered(PlayerId(id)),
                probability: 0.5,
                boosted: false,
                candidates: Vec::new(),
            })
            .collect();
        PredictionResult {
            players,
            goalie: GoaliePick {
                goalie: roster.goalie_or_numbered(GoalieId(numbers[5])),
                probability: 0.5,
            },
            confidence: 0.5,
        }
    }

    #[test]
    fn test_five_and_four_player_matches() {
        let history = vec![team([1, 2, 3, 4, 5, 1]), team([1, 2, 3, 4, 6, 1])];
        let report = analyze_accuracy(&prediction([1, 2, 3, 4, 5, 1]), &history);

        assert_eq!(report.total, 2);
        assert_eq!(report.five_matches, 1);
        assert_eq!(report.four_matches, 1);
        assert_eq!(report.three_matches, 0);
        assert_eq!(report.exact_matches, 1);
        assert_eq!(report.goalie_matches, 2);
        assert_eq!(report.position_matches, [2, 2, 2, 2, 1]);
    }

    #[test]
    fn test_matches_ignore_order() {
        let history = vec![team([5, 4, 3, 2, 1, 2])];
        let report = analyze_accuracy(&prediction([1, 2, 3, 4, 5, 1]), &history);

        assert_eq!(report.five_matches, 1);
        assert_eq!(report.exact_matches, 0);
        assert_eq!(report.goalie_matches, 0);
        assert_eq!(report.position_matches, [0, 0, 1, 0, 0]);
    }

    #[test]
    fn test_most_frequent_by_position() {
        let history = vec![
            team([7, 2, 3, 4, 5, 1]),
            team([7, 2, 3, 4, 6, 1]),
            team([8, 2, 3, 4, 6, 1]),
            team([9, 2, 3, 4, 5, 1]),
        ];
        let report = analyze_accuracy(&prediction([1, 2, 3, 4, 5, 1]), &history);

        assert_eq!(report.most_frequent_by_position[0], Some(PlayerId(7)));
        // 5 and 6 tie at position 4, lower id wins
        assert_eq!(report.most_frequent_by_position[4], Some(PlayerId(5)));

        let top = &report.top_by_position[0];
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].player, PlayerId(7));
        assert!((top[0].share - 0.5).abs() < 1e-12);
        assert_eq!(top[1].player, PlayerId(8));

        assert_eq!(report.player_frequency.get(&PlayerId(2)), Some(&4));
        assert_eq!(report.player_frequency.get(&PlayerId(1)), None);
    }

    #[test]
    fn test_unresolved_slots_not_counted() {
        let unresolved = TeamSelection::new([1, 0, 3, 0, 5].map(PlayerId), GoalieId(1)).unwrap();
        let report = analyze_accuracy(&prediction([1, 2, 3, 4, 5, 1]), &[unresolved]);

        assert_eq!(report.three_matches, 1);
        assert_eq!(report.position_matches, [1, 0, 1, 0, 1]);
        assert_eq!(report.most_frequent_by_position[1], None);
        assert_eq!(report.player_frequency.get(&PlayerId(0)), None);
    }

    #[test]
    fn test_empty_history() {
        let report = analyze_accuracy(&prediction([1, 2, 3, 4, 5, 1]), &[]);
        assert_eq!(report.total, 0);
        assert_eq!(report.most_frequent_by_position, [None; POSITIONS]);
        assert_eq!(report.position_accuracy(0), 0.0);
        assert!(report.to_string().contains("0 lineups"));
    }
}

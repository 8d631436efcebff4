//! Selection history loading
//!
//! Raw files list the newest lineup first; everything returned here is
//! chronological (oldest first).

use std::path::Path;

use serde::Deserialize;

use crate::data::roster::{PlayerRef, Roster};
use crate::{GoalieId, LineupError, PlayerId, Result, TeamSelection, POSITIONS};

/// Parse tab-separated rows of six numbers, skipping malformed rows
pub fn parse_tsv(content: &str) -> Vec<TeamSelection> {
    let mut teams = Vec::new();
    let lines: Vec<&str> = content.lines().collect();

    for (line_no, line) in lines.iter().enumerate().rev() {
        if line.trim().is_empty() {
            continue;
        }

        let numbers: Vec<u8> = line
            .split('\t')
            .map(str::trim)
            .filter_map(|n| n.parse::<u8>().ok())
            .collect();

        if numbers.len() != POSITIONS + 1 {
            log::warn!(
                "Skipping line {}: expected {} numbers, found {}",
                line_no + 1,
                POSITIONS + 1,
                numbers.len()
            );
            continue;
        }

        let mut row = [0u8; POSITIONS + 1];
        row.copy_from_slice(&numbers);

        match TeamSelection::from_numbers(row) {
            Ok(team) if team.players.iter().all(|p| p.is_valid()) && team.goalie.is_valid() => {
                teams.push(team)
            }
            Ok(_) => log::warn!("Skipping line {}: numbers out of valid range", line_no + 1),
            Err(e) => log::warn!("Skipping line {}: {}", line_no + 1, e),
        }
    }

    teams
}

#[derive(Debug, Deserialize)]
struct ResultsFile {
    results: Vec<ResultEntry>,
}

#[derive(Debug, Deserialize)]
struct ResultEntry {
    team: RawTeam,
}

/// A lineup whose members are still loose references
#[derive(Debug, Clone, Deserialize)]
pub struct RawTeam {
    pub players: Vec<PlayerRef>,
    pub goalie: PlayerRef,
}

impl RawTeam {
    /// Resolve every reference into canonical ids.
    ///
    /// Unknown names keep their slot as id 0, which encoding and weighting skip.
    pub fn resolve(&self, roster: &Roster) -> Result<TeamSelection> {
        if self.players.len() != POSITIONS {
            return Err(LineupError::Parse(format!(
                "lineup has {} players, expected {}",
                self.players.len(),
                POSITIONS
            )));
        }

        let mut players = [PlayerId(0); POSITIONS];
        for (slot, r) in players.iter_mut().zip(&self.players) {
            match roster.resolve_player(r) {
                Ok(player) => *slot = player.id,
                Err(e) => log::warn!("{}", e),
            }
        }
        let goalie = match roster.resolve_goalie(&self.goalie) {
            Ok(goalie) => goalie.id,
            Err(e) => {
                log::warn!("{}", e);
                GoalieId(0)
            }
        };

        TeamSelection::new(players, goalie)
    }
}

/// Parse a JSON results document (already chronological)
pub fn parse_json(content: &str, roster: &Roster) -> Result<Vec<TeamSelection>> {
    let file: ResultsFile = serde_json::from_str(content)?;
    let mut teams = Vec::with_capacity(file.results.len());

    for (i, entry) in file.results.iter().enumerate() {
        match entry.team.resolve(roster) {
            Ok(team) => teams.push(team),
            Err(e) => log::warn!("Skipping result {}: {}", i, e),
        }
    }

    Ok(teams)
}

/// Load history from a `.tsv` or `.json` file
pub fn load_history<P: AsRef<Path>>(path: P, roster: &Roster) -> Result<Vec<TeamSelection>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;

    let teams = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => parse_json(&content, roster)?,
        _ => parse_tsv(&content),
    };

    log::info!("Loaded {} lineups from {}", teams.len(), path.display());
    Ok(teams)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tsv_reversed_to_chronological() {
        let content = "6\t7\t8\t9\t10\t2\n1\t2\t3\t4\t5\t1\n";
        let teams = parse_tsv(content);

        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].players[0], PlayerId(1));
        assert_eq!(teams[1].players[0], PlayerId(6));
        assert_eq!(teams[1].goalie, GoalieId(2));
    }

    #[test]
    fn test_tsv_skips_bad_rows() {
        let content = "1\t2\t3\t4\t5\n\
                       1\t2\t3\t4\t48\t1\n\
                       1\t2\t3\t4\t5\t11\n\
                       1\t1\t3\t4\t5\t1\n\
                       \n\
                       1\t2\t3\t4\t5\t1\n";
        let teams = parse_tsv(content);
        assert_eq!(teams.len(), 1);
    }

    #[test]
    fn test_json_resolves_names() {
        let roster = Roster::numbered();
        let content = r#"{"results": [
            {"team": {"players": ["Player 1", 2, "Player 3", 4, 5], "goalie": "Goalie 7"}},
            {"team": {"players": ["Unknown", 2, 3, 4, 5], "goalie": 1}}
        ]}"#;

        let teams = parse_json(content, &roster).unwrap();
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].players[2], PlayerId(3));
        assert_eq!(teams[0].goalie, GoalieId(7));
        assert_eq!(teams[1].players[0], PlayerId(0));
        assert_eq!(teams[1].players[1], PlayerId(2));
    }

    #[test]
    fn test_json_unresolved_names_keep_lineup_order() {
        let roster = Roster::numbered();
        let content = r#"{"results": [
            {"team": {"players": [1, 2, 3, 4, 5], "goalie": 1}},
            {"team": {"players": [1, 2, "Typo Name", 4, "Other Typo"], "goalie": "Nobody"}},
            {"team": {"players": [1, 2, 3, 4, 7], "goalie": 2}}
        ]}"#;

        let teams = parse_json(content, &roster).unwrap();
        assert_eq!(teams.len(), 3);
        assert_eq!(teams[1].players, [1, 2, 0, 4, 0].map(PlayerId));
        assert_eq!(teams[1].goalie, GoalieId(0));
        assert_eq!(teams[2].as_numbers(), "010203040702");

        // Unresolved slots contribute nothing but the lineup still counts
        let weights =
            crate::features::WeightTable::compute(&teams, &crate::Config::default().weight_factors)
                .unwrap();
        assert_eq!(weights.counts().lineups, 3);
        assert_eq!(weights.counts().player(PlayerId(1)), 3);
        assert_eq!(weights.counts().player(PlayerId(3)), 2);
    }

    #[test]
    fn test_json_wrong_player_count_is_skipped() {
        let roster = Roster::numbered();
        let content = r#"{"results": [
            {"team": {"players": [1, 2, 3, 4], "goalie": 1}},
            {"team": {"players": [1, 2, 3, 4, 5], "goalie": 1}}
        ]}"#;
        assert_eq!(parse_json(content, &roster).unwrap().len(), 1);
    }
}

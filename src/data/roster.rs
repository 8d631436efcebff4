//! Player and goalie reference tables

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    Goalie, GoalieId, LineupError, Player, PlayerId, Result, GOALIE_COUNT, PLAYER_COUNT,
};

/// Loose reference to a player or goalie as found in input files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlayerRef {
    Id(u8),
    Name(String),
}

impl From<u8> for PlayerRef {
    fn from(id: u8) -> Self {
        PlayerRef::Id(id)
    }
}

impl From<&str> for PlayerRef {
    fn from(name: &str) -> Self {
        PlayerRef::Name(name.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: u8,
    name: String,
}

#[derive(Debug, Deserialize)]
struct PlayersFile {
    #[serde(rename = "teamMembers")]
    team_members: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct GoaliesFile {
    goalies: Vec<Entry>,
}

/// Immutable id <-> name tables for both pools
#[derive(Debug, Clone)]
pub struct Roster {
    players: Vec<Option<Player>>,
    goalies: Vec<Option<Goalie>>,
    player_names: HashMap<String, PlayerId>,
    goalie_names: HashMap<String, GoalieId>,
}

impl Roster {
    /// Build tables, checking ids are in range and unique
    pub fn new(players: Vec<Player>, goalies: Vec<Goalie>) -> Result<Self> {
        let mut roster = Roster {
            players: vec![None; PLAYER_COUNT],
            goalies: vec![None; GOALIE_COUNT],
            player_names: HashMap::new(),
            goalie_names: HashMap::new(),
        };

        for player in players {
            let idx = player.id.index().ok_or_else(|| {
                LineupError::Config(format!("player id {} out of range", player.id))
            })?;
            if roster.players[idx].is_some() {
                return Err(LineupError::Config(format!("duplicate player id {}", player.id)));
            }
            roster.player_names.insert(player.name.to_lowercase(), player.id);
            roster.players[idx] = Some(player);
        }

        for goalie in goalies {
            let idx = goalie.id.index().ok_or_else(|| {
                LineupError::Config(format!("goalie id {} out of range", goalie.id))
            })?;
            if roster.goalies[idx].is_some() {
                return Err(LineupError::Config(format!("duplicate goalie id {}", goalie.id)));
            }
            roster.goalie_names.insert(goalie.name.to_lowercase(), goalie.id);
            roster.goalies[idx] = Some(goalie);
        }

        Ok(roster)
    }

    /// Placeholder tables covering every id
    pub fn numbered() -> Self {
        let players: Vec<Option<Player>> = (1..=PLAYER_COUNT as u8)
            .map(|id| {
                Some(Player {
                    id: PlayerId(id),
                    name: format!("Player {}", id),
                })
            })
            .collect();
        let goalies: Vec<Option<Goalie>> = (1..=GOALIE_COUNT as u8)
            .map(|id| {
                Some(Goalie {
                    id: GoalieId(id),
                    name: format!("Goalie {}", id),
                })
            })
            .collect();

        let player_names = players
            .iter()
            .flatten()
            .map(|p| (p.name.to_lowercase(), p.id))
            .collect();
        let goalie_names = goalies
            .iter()
            .flatten()
            .map(|g| (g.name.to_lowercase(), g.id))
            .collect();

        Roster {
            players,
            goalies,
            player_names,
            goalie_names,
        }
    }

    /// Load from the two JSON reference files
    pub fn load<P: AsRef<Path>>(players_path: P, goalies_path: P) -> Result<Self> {
        let players: PlayersFile =
            serde_json::from_str(&std::fs::read_to_string(players_path.as_ref())?)?;
        let goalies: GoaliesFile =
            serde_json::from_str(&std::fs::read_to_string(goalies_path.as_ref())?)?;

        Self::new(
            players
                .team_members
                .into_iter()
                .map(|e| Player {
                    id: PlayerId(e.id),
                    name: e.name,
                })
                .collect(),
            goalies
                .goalies
                .into_iter()
                .map(|e| Goalie {
                    id: GoalieId(e.id),
                    name: e.name,
                })
                .collect(),
        )
    }

    /// Load reference files when both exist, numbered placeholders otherwise
    pub fn load_or_numbered(players_path: &str, goalies_path: &str) -> Result<Self> {
        if Path::new(players_path).exists() && Path::new(goalies_path).exists() {
            Self::load(players_path, goalies_path)
        } else {
            log::warn!(
                "Reference tables not found ({}, {}), using numbered names",
                players_path,
                goalies_path
            );
            Ok(Self::numbered())
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        id.index().and_then(|i| self.players[i].as_ref())
    }

    pub fn goalie(&self, id: GoalieId) -> Option<&Goalie> {
        id.index().and_then(|i| self.goalies[i].as_ref())
    }

    pub fn find_player_by_name(&self, name: &str) -> Option<&Player> {
        self.player_names
            .get(&name.to_lowercase())
            .and_then(|id| self.player(*id))
    }

    pub fn find_goalie_by_name(&self, name: &str) -> Option<&Goalie> {
        self.goalie_names
            .get(&name.to_lowercase())
            .and_then(|id| self.goalie(*id))
    }

    /// Player record for an id, falling back to a numbered name
    pub fn player_or_numbered(&self, id: PlayerId) -> Player {
        self.player(id).cloned().unwrap_or_else(|| Player {
            id,
            name: format!("Player {}", id),
        })
    }

    pub fn goalie_or_numbered(&self, id: GoalieId) -> Goalie {
        self.goalie(id).cloned().unwrap_or_else(|| Goalie {
            id,
            name: format!("Goalie {}", id),
        })
    }

    pub fn resolve_player(&self, r: &PlayerRef) -> Result<Player> {
        let found = match r {
            PlayerRef::Id(id) => self.player(PlayerId(*id)),
            PlayerRef::Name(name) => self.find_player_by_name(name),
        };
        found
            .cloned()
            .ok_or_else(|| LineupError::UnresolvedReference(format!("player {:?}", r)))
    }

    pub fn resolve_goalie(&self, r: &PlayerRef) -> Result<Goalie> {
        let found = match r {
            PlayerRef::Id(id) => self.goalie(GoalieId(*id)),
            PlayerRef::Name(name) => self.find_goalie_by_name(name),
        };
        found
            .cloned()
            .ok_or_else(|| LineupError::UnresolvedReference(format!("goalie {:?}", r)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_covers_all_ids() {
        let roster = Roster::numbered();
        assert_eq!(roster.player(PlayerId(47)).unwrap().name, "Player 47");
        assert_eq!(roster.goalie(GoalieId(1)).unwrap().name, "Goalie 1");
        assert!(roster.player(PlayerId(48)).is_none());
    }

    #[test]
    fn test_resolve_by_name_and_id() {
        let roster = Roster::new(
            vec![Player {
                id: PlayerId(3),
                name: "Koivu".to_string(),
            }],
            vec![Goalie {
                id: GoalieId(2),
                name: "Rask".to_string(),
            }],
        )
        .unwrap();

        assert_eq!(roster.resolve_player(&"koivu".into()).unwrap().id, PlayerId(3));
        assert_eq!(roster.resolve_player(&3.into()).unwrap().name, "Koivu");
        assert_eq!(roster.resolve_goalie(&"Rask".into()).unwrap().id, GoalieId(2));
        assert!(matches!(
            roster.resolve_player(&"Nobody".into()),
            Err(LineupError::UnresolvedReference(_))
        ));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let players = vec![
            Player {
                id: PlayerId(1),
                name: "A".to_string(),
            },
            Player {
                id: PlayerId(1),
                name: "B".to_string(),
            },
        ];
        assert!(Roster::new(players, vec![]).is_err());
    }

    #[test]
    fn test_player_ref_untagged() {
        let refs: Vec<PlayerRef> = serde_json::from_str(r#"[4, "Selanne"]"#).unwrap();
        assert_eq!(refs[0], PlayerRef::Id(4));
        assert_eq!(refs[1], PlayerRef::Name("Selanne".to_string()));
    }
}

//! Next-lineup prediction from selection history
//!
//! Statistical weights over past selections modulate a fixed-width encoding that
//! feeds a feed-forward regressor; its output is decoded back into a lineup.

pub mod data;
pub mod features;
pub mod model;
pub mod predict;
pub mod training;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::Activation;

/// Size of the player pool
pub const PLAYER_COUNT: usize = 47;
/// Size of the goalie pool
pub const GOALIE_COUNT: usize = 10;
/// Player slots per lineup
pub const POSITIONS: usize = 5;

/// Player identifier (1-based, `1..=PLAYER_COUNT`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Zero-based index into a player block, or None when out of range
    pub fn index(self) -> Option<usize> {
        let id = self.0 as usize;
        (1..=PLAYER_COUNT).contains(&id).then(|| id - 1)
    }

    pub fn is_valid(self) -> bool {
        self.index().is_some()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Goalie identifier (1-based, `1..=GOALIE_COUNT`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoalieId(pub u8);

impl GoalieId {
    pub fn index(self) -> Option<usize> {
        let id = self.0 as usize;
        (1..=GOALIE_COUNT).contains(&id).then(|| id - 1)
    }

    pub fn is_valid(self) -> bool {
        self.index().is_some()
    }
}

impl fmt::Display for GoalieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A squad player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

/// A goalie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goalie {
    pub id: GoalieId,
    pub name: String,
}

/// One lineup: five players in position order plus a goalie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamSelection {
    pub players: [PlayerId; POSITIONS],
    pub goalie: GoalieId,
}

impl TeamSelection {
    /// Build a lineup, rejecting repeated players. Out-of-range ids mark
    /// unresolved slots and may repeat.
    pub fn new(players: [PlayerId; POSITIONS], goalie: GoalieId) -> Result<Self> {
        for (i, p) in players.iter().enumerate() {
            if p.is_valid() && players[i + 1..].contains(p) {
                return Err(LineupError::Parse(format!(
                    "player {} appears twice in one lineup",
                    p
                )));
            }
        }
        Ok(TeamSelection { players, goalie })
    }

    /// Build from raw numbers (five players then the goalie)
    pub fn from_numbers(numbers: [u8; 6]) -> Result<Self> {
        let players = [
            PlayerId(numbers[0]),
            PlayerId(numbers[1]),
            PlayerId(numbers[2]),
            PlayerId(numbers[3]),
            PlayerId(numbers[4]),
        ];
        Self::new(players, GoalieId(numbers[5]))
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.players.contains(&player)
    }

    /// Number of players shared with another lineup, ignoring position
    pub fn shared_players(&self, ids: &[PlayerId]) -> usize {
        ids.iter().filter(|id| self.contains(**id)).count()
    }

    /// Zero-padded number string, e.g. `010203040501`
    pub fn as_numbers(&self) -> String {
        self.players
            .iter()
            .map(|p| format!("{:02}", p.0))
            .chain(std::iter::once(format!("{:02}", self.goalie.0)))
            .collect()
    }
}

impl fmt::Display for TeamSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let players: Vec<String> = self.players.iter().map(|p| p.to_string()).collect();
        write!(f, "[{}] G{}", players.join(", "), self.goalie)
    }
}

/// A ranked alternative considered for a slot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: u8,
    /// Raw regressor output
    pub raw: f32,
    /// Probability after the position-recency boost
    pub probability: f32,
}

/// Decoded pick for one player position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerPick {
    pub position: usize,
    pub player: Player,
    pub probability: f32,
    pub boosted: bool,
    pub candidates: Vec<Candidate>,
}

/// Decoded goalie pick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoaliePick {
    pub goalie: Goalie,
    pub probability: f32,
}

/// Model prediction output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub players: Vec<PlayerPick>,
    pub goalie: GoaliePick,
    /// Mean of the six slot probabilities
    pub confidence: f32,
}

impl PredictionResult {
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.player.id).collect()
    }

    pub fn goalie_id(&self) -> GoalieId {
        self.goalie.goalie.id
    }

    /// Concatenated ids, players first, goalie last
    pub fn as_numbers(&self) -> String {
        let mut s: String = self.players.iter().map(|p| p.player.id.to_string()).collect();
        s.push_str(&self.goalie_id().to_string());
        s
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum LineupError {
    #[error("Insufficient data for {operation}: have {available} lineups, need {required}")]
    InsufficientData {
        operation: &'static str,
        available: usize,
        required: usize,
    },

    #[error("Training unstable at iteration {iteration}: error rose on {increases} consecutive checkpoints (now {error:.6})")]
    TrainingInstability {
        iteration: usize,
        increases: usize,
        error: f64,
    },

    #[error("No usable training examples could be encoded")]
    NoTrainingExamples,

    #[error("All {runs} prediction runs failed")]
    NoValidPrediction { runs: usize },

    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),

    #[error("Model not trained - run `lineup train` first")]
    NoModel,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LineupError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    pub training: TrainingConfig,
    pub weights: EncodingWeights,
    pub weight_factors: WeightFactors,
    pub prediction: PredictionConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub hidden_layers: Vec<usize>,
    pub activation: Activation,
    pub dropout: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub learning_rate: f64,
    pub momentum: f64,
    pub error_threshold: f64,
    pub max_iterations: usize,
    /// Iterations between stability checkpoints
    pub checkpoint_interval: usize,
    /// Consecutive rising checkpoints tolerated before aborting
    pub max_unstable_checkpoints: usize,
    /// Per-iteration learning rate multiplier
    pub decay_rate: f64,
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Constants applied while encoding history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingWeights {
    pub position: f32,
    pub player_to_player: f32,
    pub player_to_goalie: f32,
    pub recency: RecencyConfig,
}

/// Affine recency weighting: `base + scale * (index / window_len)`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RecencyConfig {
    pub enabled: bool,
    pub base: f32,
    pub scale: f32,
}

impl RecencyConfig {
    pub fn weight(&self, index: usize, window_len: usize) -> f32 {
        if !self.enabled || window_len == 0 {
            return 1.0;
        }
        self.base + self.scale * (index as f32 / window_len as f32)
    }
}

/// Strength of each statistical weight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightFactors {
    pub selection_frequency: f32,
    pub combination_frequency: f32,
    pub goalie_selection: f32,
    pub goalie_synergy: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    pub runs: usize,
    pub position_boost: f32,
    /// How many recent lineups count towards the position boost
    pub recent_positions: usize,
    /// Most recent lineups fed to the model (whole history when unset)
    #[serde(default)]
    pub window: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub history_path: String,
    pub players_path: String,
    pub goalies_path: String,
    pub model_path: String,
    pub report_path: String,
    pub analysis_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            model: ModelConfig {
                hidden_layers: vec![128, 96, 64, 48, 32, 24],
                activation: Activation::Sigmoid,
                dropout: 0.23,
            },
            training: TrainingConfig {
                learning_rate: 0.135,
                momentum: 0.135,
                error_threshold: 0.004,
                max_iterations: 1200,
                checkpoint_interval: 10,
                max_unstable_checkpoints: 45,
                decay_rate: 0.999995,
                seed: None,
            },
            weights: EncodingWeights {
                position: 1.48,
                player_to_player: 0.58,
                player_to_goalie: 0.18,
                recency: RecencyConfig {
                    enabled: false,
                    base: 0.0,
                    scale: 0.0,
                },
            },
            weight_factors: WeightFactors {
                selection_frequency: 1.45,
                combination_frequency: 0.1,
                goalie_selection: 1.78,
                goalie_synergy: 0.0,
            },
            prediction: PredictionConfig {
                runs: 1,
                position_boost: 1.48,
                recent_positions: 5,
                window: None,
            },
            data: DataConfig {
                history_path: "data/rawData.tsv".to_string(),
                players_path: "data/teamMembers.json".to_string(),
                goalies_path: "data/goalies.json".to_string(),
                model_path: "model/lineup_model".to_string(),
                report_path: "data/prediction.json".to_string(),
                analysis_path: "data/analysis.json".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LineupError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| LineupError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LineupError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_range() {
        assert_eq!(PlayerId(1).index(), Some(0));
        assert_eq!(PlayerId(47).index(), Some(46));
        assert_eq!(PlayerId(0).index(), None);
        assert_eq!(PlayerId(48).index(), None);
        assert_eq!(GoalieId(10).index(), Some(9));
        assert_eq!(GoalieId(11).index(), None);
    }

    #[test]
    fn test_team_rejects_duplicate_player() {
        assert!(TeamSelection::from_numbers([1, 2, 3, 4, 4, 1]).is_err());
        assert!(TeamSelection::from_numbers([1, 2, 3, 4, 5, 1]).is_ok());
    }

    #[test]
    fn test_team_allows_repeated_unresolved_slots() {
        let team = TeamSelection::from_numbers([1, 0, 3, 0, 5, 0]).unwrap();
        assert!(!team.players[1].is_valid());
        assert!(!team.goalie.is_valid());
    }

    #[test]
    fn test_as_numbers_padding() {
        let team = TeamSelection::from_numbers([1, 12, 3, 40, 5, 7]).unwrap();
        assert_eq!(team.as_numbers(), "011203400507");
    }

    #[test]
    fn test_recency_disabled_is_constant() {
        let recency = RecencyConfig {
            enabled: false,
            base: 0.0,
            scale: 0.0,
        };
        assert_eq!(recency.weight(0, 10), 1.0);
        assert_eq!(recency.weight(9, 10), 1.0);
    }

    #[test]
    fn test_recency_affine() {
        let recency = RecencyConfig {
            enabled: true,
            base: 0.5,
            scale: 1.0,
        };
        assert!((recency.weight(0, 4) - 0.5).abs() < 1e-6);
        assert!((recency.weight(2, 4) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.model.hidden_layers, config.model.hidden_layers);
        assert_eq!(parsed.training.max_iterations, 1200);
        assert!(!parsed.weights.recency.enabled);
    }
}

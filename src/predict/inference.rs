//! Model inference for lineup predictions

use std::cmp::Ordering;

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::data::Roster;
use crate::features::encoding::{GOALIE_OFFSET, SLOT_WIDTH};
use crate::features::{FeatureEncoder, WeightTable};
use crate::model::{ModelManifest, TeamRegressor};
use crate::{
    Candidate, Config, EncodingWeights, GoalieId, GoaliePick, LineupError, PlayerId, PlayerPick,
    PredictionConfig, PredictionResult, Result, TeamSelection, GOALIE_COUNT, PLAYER_COUNT,
    POSITIONS,
};

/// Candidates kept per position before the recency boost
const TOP_CANDIDATES: usize = 3;

/// Turns raw regressor output into a ranked lineup
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    roster: &'a Roster,
    position_boost: f32,
    recent_positions: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(roster: &'a Roster, settings: &PredictionConfig) -> Self {
        Decoder {
            roster,
            position_boost: settings.position_boost,
            recent_positions: settings.recent_positions,
        }
    }

    /// Boosted probability; never lowers the raw value and caps boosted values at 1
    fn boost(&self, raw: f32) -> f32 {
        (raw * self.position_boost).min(1.0).max(raw)
    }

    /// Decode one output vector. `history` supplies the recent positions to boost.
    pub fn decode(&self, raw: &[f32], history: &[TeamSelection]) -> Result<PredictionResult> {
        if raw.len() < GOALIE_OFFSET + GOALIE_COUNT {
            return Err(LineupError::Model(format!(
                "output has {} values, expected {}",
                raw.len(),
                GOALIE_OFFSET + GOALIE_COUNT
            )));
        }
        if raw.iter().any(|v| !v.is_finite()) {
            return Err(LineupError::Model("output contains non-finite values".to_string()));
        }

        let recent_start = history.len().saturating_sub(self.recent_positions);
        let recent = &history[recent_start..];

        let mut players = Vec::with_capacity(POSITIONS);
        for pos in 0..POSITIONS {
            let start = pos * SLOT_WIDTH;
            let mut ranked: Vec<(u8, f32)> = raw[start..start + PLAYER_COUNT]
                .iter()
                .enumerate()
                .map(|(i, &p)| (i as u8 + 1, p))
                .collect();
            // Stable: equal scores keep the lower id first
            ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
            ranked.truncate(TOP_CANDIDATES);

            let candidates: Vec<Candidate> = ranked
                .into_iter()
                .map(|(id, p)| {
                    let played_here = recent.iter().any(|t| t.players[pos] == PlayerId(id));
                    Candidate {
                        id,
                        raw: p,
                        probability: if played_here { self.boost(p) } else { p },
                    }
                })
                .collect();

            let mut best = candidates[0];
            for c in &candidates[1..] {
                if c.probability > best.probability {
                    best = *c;
                }
            }

            players.push(PlayerPick {
                position: pos,
                player: self.roster.player_or_numbered(PlayerId(best.id)),
                probability: best.probability,
                boosted: best.probability != best.raw,
                candidates,
            });
        }

        let mut goalie_idx = 0;
        let goalie_raw = &raw[GOALIE_OFFSET..GOALIE_OFFSET + GOALIE_COUNT];
        for (i, &p) in goalie_raw.iter().enumerate() {
            if p > goalie_raw[goalie_idx] {
                goalie_idx = i;
            }
        }
        let goalie = GoaliePick {
            goalie: self
                .roster
                .goalie_or_numbered(GoalieId(goalie_idx as u8 + 1)),
            probability: goalie_raw[goalie_idx],
        };

        let total: f32 =
            players.iter().map(|p| p.probability).sum::<f32>() + goalie.probability;
        let confidence = total / (POSITIONS + 1) as f32;

        Ok(PredictionResult {
            players,
            goalie,
            confidence,
        })
    }
}

/// Keep the highest-confidence result; earlier results win ties, failures are skipped
pub fn select_best<I>(results: I) -> Result<PredictionResult>
where
    I: IntoIterator<Item = Result<PredictionResult>>,
{
    let mut best: Option<PredictionResult> = None;
    let mut runs = 0;

    for (i, result) in results.into_iter().enumerate() {
        runs += 1;
        match result {
            Ok(prediction) => {
                log::debug!("Run {}: confidence {:.4}", i + 1, prediction.confidence);
                let better = best
                    .as_ref()
                    .map_or(true, |b| prediction.confidence > b.confidence);
                if better {
                    best = Some(prediction);
                }
            }
            Err(e) => log::warn!("Prediction run {} failed: {}", i + 1, e),
        }
    }

    best.ok_or(LineupError::NoValidPrediction { runs })
}

/// Predictor for making lineup predictions
pub struct Predictor<B: Backend> {
    model: TeamRegressor<B>,
    weights: WeightTable,
    roster: Roster,
    constants: EncodingWeights,
    settings: PredictionConfig,
    device: B::Device,
}

impl<B: Backend> Predictor<B>
where
    B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
    B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
{
    /// Create a new predictor
    pub fn new(
        model: TeamRegressor<B>,
        weights: WeightTable,
        roster: Roster,
        config: &Config,
        device: B::Device,
    ) -> Self {
        Predictor {
            model,
            weights,
            roster,
            constants: config.weights.clone(),
            settings: config.prediction.clone(),
            device,
        }
    }

    /// Load predictor from a saved model and its manifest
    pub fn load(
        model_path: &str,
        weights: WeightTable,
        roster: Roster,
        config: &Config,
        device: B::Device,
    ) -> Result<Self> {
        if !ModelManifest::exists(model_path) {
            return Err(LineupError::NoModel);
        }
        let manifest = ModelManifest::load(model_path)?;
        Self::from_manifest(model_path, &manifest, weights, roster, config, device)
    }

    /// Load the weights at `model_path` using an already-read manifest
    pub fn from_manifest(
        model_path: &str,
        manifest: &ModelManifest,
        weights: WeightTable,
        roster: Roster,
        config: &Config,
        device: B::Device,
    ) -> Result<Self> {
        let model = TeamRegressor::load(&device, model_path, &manifest.regressor)?;
        log::info!(
            "Loaded model from {} (error {:.6}, {} iterations)",
            model_path,
            manifest.final_error,
            manifest.iterations
        );
        Ok(Self::new(model, weights, roster, config, device))
    }

    /// Lineups fed to the model: the configured tail of the history
    fn window<'h>(&self, history: &'h [TeamSelection]) -> &'h [TeamSelection] {
        match self.settings.window {
            Some(n) => &history[history.len().saturating_sub(n)..],
            None => history,
        }
    }

    fn run_model(&self, input: &[f32]) -> Result<Vec<f32>> {
        let tensor =
            Tensor::<B, 1>::from_floats(input, &self.device).reshape([1, input.len()]);
        let output = self.model.forward(tensor);
        output
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| LineupError::Model(format!("{:?}", e)))
    }

    /// Predict the next lineup once
    pub fn predict_once(&self, history: &[TeamSelection]) -> Result<PredictionResult> {
        let window = self.window(history);
        if window.is_empty() {
            return Err(LineupError::InsufficientData {
                operation: "prediction",
                available: 0,
                required: 1,
            });
        }

        let encoder = FeatureEncoder::new(&self.weights, self.constants.clone());
        let input = encoder.encode_window(window);
        let raw = self.run_model(&input)?;

        let decoder = Decoder::new(&self.roster, &self.settings);
        let prediction = decoder.decode(&raw, history)?;

        log::info!(
            "Predicted {} (confidence {:.4})",
            prediction.as_numbers(),
            prediction.confidence
        );
        Ok(prediction)
    }

    /// Run `runs` predictions and keep the most confident
    pub fn predict(&self, history: &[TeamSelection], runs: usize) -> Result<PredictionResult> {
        let runs = runs.max(1);
        log::info!("Running {} prediction iterations", runs);
        select_best((0..runs).map(|_| self.predict_once(history)))
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }
}

//! Training loop for the lineup regressor

use burn::data::dataloader::DataLoaderBuilder;
use burn::module::AutodiffModule;
use burn::optim::momentum::MomentumConfig;
use burn::optim::{GradientsParams, Optimizer, SgdConfig};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::ElementConversion;
use chrono::Utc;

use crate::data::dataset::{SelectionBatcher, SelectionDataset};
use crate::features::{FeatureEncoder, WeightTable};
use crate::model::{ModelManifest, RegressorConfig, TeamRegressor};
use crate::training::metrics::{
    CheckpointStats, LogObserver, StabilityGuard, TrainingHistory, TrainingObserver,
};
use crate::{Config, LineupError, Result, TeamSelection, TrainingConfig};

/// Result of the iteration schedule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOutcome {
    pub final_error: f64,
    pub iterations: usize,
    /// Stopped because the error fell below the threshold
    pub converged: bool,
}

/// Drive `step` until the error threshold, the iteration cap or instability.
///
/// `step` receives the 1-based iteration and the decayed learning rate and
/// returns the error measured at that iteration.
pub fn run_schedule<F>(
    config: &TrainingConfig,
    observer: &mut dyn TrainingObserver,
    history: &mut TrainingHistory,
    mut step: F,
) -> Result<FitOutcome>
where
    F: FnMut(usize, f64) -> Result<f64>,
{
    let interval = config.checkpoint_interval.max(1);
    let mut guard = StabilityGuard::new(config.max_unstable_checkpoints);
    let mut learning_rate = config.learning_rate;
    let mut last_checkpoint: Option<f64> = None;
    let mut error = f64::INFINITY;

    for iteration in 1..=config.max_iterations {
        error = step(iteration, learning_rate)?;
        history.record_iteration(iteration, error);

        if !error.is_finite() {
            return Err(LineupError::TrainingInstability {
                iteration,
                increases: guard.increases(),
                error,
            });
        }

        if error < config.error_threshold {
            log::info!(
                "Error {:.8} below threshold {} at iteration {}",
                error,
                config.error_threshold,
                iteration
            );
            return Ok(FitOutcome {
                final_error: error,
                iterations: iteration,
                converged: true,
            });
        }

        if iteration % interval == 0 {
            let stats = CheckpointStats {
                iteration,
                max_iterations: config.max_iterations,
                error,
                delta: last_checkpoint.map(|last| last - error),
                learning_rate,
            };
            history.record_checkpoint(stats);
            observer.on_checkpoint(&stats);

            if guard.observe(error) {
                return Err(LineupError::TrainingInstability {
                    iteration,
                    increases: guard.increases(),
                    error,
                });
            }
            last_checkpoint = Some(error);
        }

        learning_rate *= config.decay_rate;
    }

    Ok(FitOutcome {
        final_error: error,
        iterations: config.max_iterations,
        converged: false,
    })
}

/// A fitted regressor ready for inference
#[derive(Debug)]
pub struct TrainedModel<B: Backend> {
    pub model: TeamRegressor<B>,
    pub regressor: RegressorConfig,
    pub final_error: f64,
    pub iterations: usize,
    pub examples: usize,
    pub history: TrainingHistory,
}

impl<B: Backend> TrainedModel<B> {
    pub fn manifest(&self) -> ModelManifest {
        ModelManifest {
            regressor: self.regressor.clone(),
            final_error: self.final_error,
            iterations: self.iterations,
            examples: self.examples,
            trained_at: Utc::now(),
        }
    }

    /// Save weights and manifest
    pub fn save(&self, model_path: &str) -> Result<()>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        self.model.save(model_path)?;
        self.manifest().save(model_path)?;
        log::info!("Model saved to {}", model_path);
        Ok(())
    }
}

/// Trainer for the lineup regressor
pub struct Trainer<B: AutodiffBackend> {
    config: Config,
    device: B::Device,
    observer: Box<dyn TrainingObserver>,
}

impl<B: AutodiffBackend> Trainer<B> {
    /// Create a new trainer
    pub fn new(config: &Config, device: B::Device) -> Result<Self> {
        let training = &config.training;
        if training.max_iterations == 0 {
            return Err(LineupError::Config("max_iterations must be at least 1".to_string()));
        }
        if training.learning_rate.is_nan() || training.learning_rate <= 0.0 {
            return Err(LineupError::Config("learning_rate must be positive".to_string()));
        }

        Ok(Trainer {
            config: config.clone(),
            device,
            observer: Box::new(LogObserver),
        })
    }

    /// Replace the default logging observer
    pub fn with_observer(mut self, observer: Box<dyn TrainingObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Fit a fresh regressor to `history`
    pub fn train(
        &mut self,
        history: &[TeamSelection],
        weights: &WeightTable,
    ) -> Result<TrainedModel<B::InnerBackend>> {
        if history.len() < 2 {
            return Err(LineupError::InsufficientData {
                operation: "training",
                available: history.len(),
                required: 2,
            });
        }

        if let Some(seed) = self.config.training.seed {
            B::seed(seed);
        }

        let encoder = FeatureEncoder::new(weights, self.config.weights.clone());
        let dataset = SelectionDataset::from_history(history, &encoder);
        if dataset.is_empty() {
            return Err(LineupError::NoTrainingExamples);
        }
        let examples = dataset.len();

        // Full batch, no shuffle
        let batcher = SelectionBatcher::<B>::new(self.device.clone());
        let loader = DataLoaderBuilder::new(batcher)
            .batch_size(examples)
            .build(dataset);
        let batch = loader
            .iter()
            .next()
            .ok_or(LineupError::NoTrainingExamples)?;

        let regressor = RegressorConfig::from(&self.config.model);
        let mut model = TeamRegressor::<B>::new(&self.device, &regressor);
        let mut optimizer = SgdConfig::new()
            .with_momentum(Some(
                MomentumConfig::new()
                    .with_momentum(self.config.training.momentum)
                    .with_dampening(0.0),
            ))
            .init::<B, TeamRegressor<B>>();

        log::info!(
            "Training on {} examples (hidden layers {:?}, {:?}, lr {}, momentum {})",
            examples,
            regressor.hidden_layers,
            regressor.activation,
            self.config.training.learning_rate,
            self.config.training.momentum
        );

        let mut training_history = TrainingHistory::new();
        let outcome = run_schedule(
            &self.config.training,
            self.observer.as_mut(),
            &mut training_history,
            |_, learning_rate| {
                let output = model.forward(batch.inputs.clone());
                let loss = (output - batch.targets.clone()).powf_scalar(2.0).mean();
                let error: f32 = loss.clone().into_scalar().elem();

                let grads = GradientsParams::from_grads(loss.backward(), &model);
                model = optimizer.step(learning_rate, model.clone(), grads);

                Ok(error as f64)
            },
        )?;

        log::info!(
            "Training completed: error {:.8} after {} iterations{}",
            outcome.final_error,
            outcome.iterations,
            if outcome.converged { "" } else { " (iteration cap)" }
        );

        Ok(TrainedModel {
            model: model.valid(),
            regressor,
            final_error: outcome.final_error,
            iterations: outcome.iterations,
            examples,
            history: training_history,
        })
    }
}

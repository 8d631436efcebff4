//! Burn Dataset implementation for lineup training examples
//!
//! Each example pairs the summed encoding of every lineup before index `i`
//! with the target encoding of lineup `i`.

use burn::data::dataset::Dataset;

use crate::features::encoding::BLOCK_WIDTH;
use crate::features::FeatureEncoder;
use crate::TeamSelection;

/// One (history, next lineup) training pair
#[derive(Debug, Clone)]
pub struct TeamSample {
    /// Encoded history window [BLOCK_WIDTH]
    pub input: Vec<f32>,
    /// Encoded next lineup [BLOCK_WIDTH]
    pub target: Vec<f32>,
}

impl TeamSample {
    /// An all-zero side carries no signal for the regressor
    pub fn is_degenerate(&self) -> bool {
        self.input.iter().all(|v| *v == 0.0) || self.target.iter().all(|v| *v == 0.0)
    }
}

/// Training examples built from a chronological history
#[derive(Debug, Clone, Default)]
pub struct SelectionDataset {
    samples: Vec<TeamSample>,
    skipped: usize,
}

impl SelectionDataset {
    /// Build one example per index in `1..history.len()`, dropping degenerate ones
    pub fn from_history(history: &[TeamSelection], encoder: &FeatureEncoder<'_>) -> Self {
        let mut samples = Vec::with_capacity(history.len().saturating_sub(1));
        let mut skipped = 0;

        for i in 1..history.len() {
            let sample = TeamSample {
                input: encoder.encode_history(&history[..i]),
                target: encoder.encode_target(&history[i]),
            };

            if sample.is_degenerate() {
                log::debug!("Skipping degenerate example {}", i);
                skipped += 1;
                continue;
            }
            samples.push(sample);
        }

        if skipped > 0 {
            log::warn!("{} of {} examples were degenerate", skipped, history.len() - 1);
        }

        SelectionDataset { samples, skipped }
    }

    pub fn from_samples(samples: Vec<TeamSample>) -> Self {
        SelectionDataset {
            samples,
            skipped: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Dataset<TeamSample> for SelectionDataset {
    fn get(&self, index: usize) -> Option<TeamSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Batch of training examples
#[derive(Debug, Clone)]
pub struct SelectionBatch<B: burn::tensor::backend::Backend> {
    /// Encoded histories: [batch, BLOCK_WIDTH]
    pub inputs: burn::tensor::Tensor<B, 2>,
    /// Encoded next lineups: [batch, BLOCK_WIDTH]
    pub targets: burn::tensor::Tensor<B, 2>,
}

/// Batcher for creating training batches
#[derive(Clone)]
pub struct SelectionBatcher<B: burn::tensor::backend::Backend> {
    device: B::Device,
}

impl<B: burn::tensor::backend::Backend> SelectionBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        SelectionBatcher { device }
    }
}

impl<B: burn::tensor::backend::Backend>
    burn::data::dataloader::batcher::Batcher<B, TeamSample, SelectionBatch<B>> for SelectionBatcher<B>
{
    fn batch(&self, items: Vec<TeamSample>, _device: &B::Device) -> SelectionBatch<B> {
        let batch_size = items.len();

        let mut input_data = Vec::with_capacity(batch_size * BLOCK_WIDTH);
        let mut target_data = Vec::with_capacity(batch_size * BLOCK_WIDTH);

        for sample in &items {
            input_data.extend_from_slice(&sample.input);
            target_data.extend_from_slice(&sample.target);
        }

        let inputs = burn::tensor::Tensor::<B, 1>::from_floats(input_data.as_slice(), &self.device)
            .reshape([batch_size, BLOCK_WIDTH]);
        let targets =
            burn::tensor::Tensor::<B, 1>::from_floats(target_data.as_slice(), &self.device)
                .reshape([batch_size, BLOCK_WIDTH]);

        SelectionBatch { inputs, targets }
    }
}

//! Lineup regressor
//!
//! Architecture: Input(342) → [Linear → activation → Dropout] × hidden_layers
//!                          → Linear(342) → sigmoid
//!
//! Multi-timestep inputs (one 342-wide block per lineup) are summed block-wise
//! before the first layer, which matches how training inputs are built.

use burn::module::{Ignored, Module};
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig};
use burn::record::{FullPrecisionSettings, Recorder};
use burn::tensor::activation::{leaky_relu, relu, sigmoid, tanh};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use crate::features::encoding::BLOCK_WIDTH;
use crate::{LineupError, ModelConfig};

/// Hidden layer activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Sigmoid,
    Relu,
    LeakyRelu,
    Tanh,
}

impl Activation {
    pub fn apply<B: Backend, const D: usize>(&self, x: Tensor<B, D>) -> Tensor<B, D> {
        match self {
            Activation::Sigmoid => sigmoid(x),
            Activation::Relu => relu(x),
            Activation::LeakyRelu => leaky_relu(x, 0.01),
            Activation::Tanh => tanh(x),
        }
    }
}

/// Network shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressorConfig {
    pub input_dim: usize,
    pub output_dim: usize,
    pub hidden_layers: Vec<usize>,
    pub activation: Activation,
    pub dropout: f64,
}

impl Default for RegressorConfig {
    fn default() -> Self {
        RegressorConfig {
            input_dim: BLOCK_WIDTH,
            output_dim: BLOCK_WIDTH,
            hidden_layers: vec![128, 96, 64, 48, 32, 24],
            activation: Activation::Sigmoid,
            dropout: 0.23,
        }
    }
}

impl From<&ModelConfig> for RegressorConfig {
    fn from(config: &ModelConfig) -> Self {
        RegressorConfig {
            hidden_layers: config.hidden_layers.clone(),
            activation: config.activation,
            dropout: config.dropout,
            ..Self::default()
        }
    }
}

/// A single hidden layer block: Linear → activation → Dropout
#[derive(Module, Debug)]
pub struct HiddenBlock<B: Backend> {
    linear: Linear<B>,
    dropout: Dropout,
    activation: Ignored<Activation>,
}

impl<B: Backend> HiddenBlock<B> {
    pub fn new(
        device: &B::Device,
        in_dim: usize,
        out_dim: usize,
        activation: Activation,
        dropout: f64,
    ) -> Self {
        HiddenBlock {
            linear: LinearConfig::new(in_dim, out_dim).init(device),
            dropout: DropoutConfig::new(dropout).init(),
            activation: Ignored(activation),
        }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.linear.forward(x);
        let x = self.activation.apply(x);
        self.dropout.forward(x)
    }
}

/// Maps encoded history to per-slot probabilities in [0, 1]
#[derive(Module, Debug)]
pub struct TeamRegressor<B: Backend> {
    hidden: Vec<HiddenBlock<B>>,
    output: Linear<B>,
    input_dim: usize,
}

impl<B: Backend> TeamRegressor<B> {
    /// Create a new regressor
    pub fn new(device: &B::Device, config: &RegressorConfig) -> Self {
        let mut hidden = Vec::with_capacity(config.hidden_layers.len());
        let mut in_dim = config.input_dim;

        for &width in &config.hidden_layers {
            hidden.push(HiddenBlock::new(
                device,
                in_dim,
                width,
                config.activation,
                config.dropout,
            ));
            in_dim = width;
        }

        TeamRegressor {
            hidden,
            output: LinearConfig::new(in_dim, config.output_dim).init(device),
            input_dim: config.input_dim,
        }
    }

    /// Sum `[batch, steps * input_dim]` down to `[batch, input_dim]`
    fn fold_timesteps(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let [batch, width] = x.dims();
        let steps = width / self.input_dim;
        if steps <= 1 {
            return x;
        }
        x.reshape([batch, steps, self.input_dim])
            .sum_dim(1)
            .reshape([batch, self.input_dim])
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `input` - Encoded history [batch, steps * input_dim]
    ///
    /// # Returns
    /// Slot probabilities [batch, output_dim]
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut x = self.fold_timesteps(input);
        for block in &self.hidden {
            x = block.forward(x);
        }
        sigmoid(self.output.forward(x))
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Save model to file
    pub fn save(&self, path: &str) -> crate::Result<()>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let recorder = burn::record::NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        recorder
            .record(self.clone().into_record(), path.into())
            .map_err(|e| LineupError::Model(e.to_string()))
    }

    /// Load model from file
    pub fn load(device: &B::Device, path: &str, config: &RegressorConfig) -> crate::Result<Self>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = burn::record::NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let record = recorder
            .load(path.into(), device)
            .map_err(|e| LineupError::Model(e.to_string()))?;

        let model = Self::new(device, config);
        Ok(model.load_record(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn small_config() -> RegressorConfig {
        RegressorConfig {
            hidden_layers: vec![16, 8],
            ..RegressorConfig::default()
        }
    }

    #[test]
    fn test_output_shape_and_bounds() {
        let device = Default::default();
        let model = TeamRegressor::<TestBackend>::new(&device, &small_config());

        let input = Tensor::random(
            [4, BLOCK_WIDTH],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );
        let output = model.forward(input);
        assert_eq!(output.dims(), [4, BLOCK_WIDTH]);

        let data = output.into_data();
        for val in data.as_slice::<f32>().unwrap() {
            assert!((0.0..=1.0).contains(val), "output out of range: {}", val);
        }
    }

    #[test]
    fn test_multi_step_input_folds_to_sum() {
        let device = Default::default();
        let model = TeamRegressor::<TestBackend>::new(&device, &small_config());

        let a = Tensor::<TestBackend, 2>::random(
            [1, BLOCK_WIDTH],
            burn::tensor::Distribution::Uniform(0.0, 1.0),
            &device,
        );
        let b = Tensor::<TestBackend, 2>::random(
            [1, BLOCK_WIDTH],
            burn::tensor::Distribution::Uniform(0.0, 1.0),
            &device,
        );

        let stacked = model.forward(Tensor::cat(vec![a.clone(), b.clone()], 1));
        let summed = model.forward(a + b);

        let stacked = stacked.into_data();
        let summed = summed.into_data();
        for (x, y) in stacked
            .as_slice::<f32>()
            .unwrap()
            .iter()
            .zip(summed.as_slice::<f32>().unwrap())
        {
            assert!((x - y).abs() < 1e-5);
        }
    }

    #[test]
    fn test_no_hidden_layers() {
        let device = Default::default();
        let config = RegressorConfig {
            hidden_layers: vec![],
            activation: Activation::Relu,
            ..RegressorConfig::default()
        };
        let model = TeamRegressor::<TestBackend>::new(&device, &config);
        let output = model.forward(Tensor::zeros([2, BLOCK_WIDTH], &device));
        assert_eq!(output.dims(), [2, BLOCK_WIDTH]);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = std::env::temp_dir().join(format!("lineup-regressor-{}", std::process::id()));
        let path = dir.join("model").to_string_lossy().to_string();
        let device = Default::default();
        let config = small_config();

        let model = TeamRegressor::<TestBackend>::new(&device, &config);
        model.save(&path).unwrap();
        assert!(std::path::Path::new(&format!("{}.mpk", path)).exists());

        let loaded = TeamRegressor::<TestBackend>::load(&device, &path, &config).unwrap();
        let input = Tensor::<TestBackend, 2>::random(
            [3, BLOCK_WIDTH * 2],
            burn::tensor::Distribution::Uniform(0.0, 1.0),
            &device,
        );

        let before = model.forward(input.clone()).into_data();
        let after = loaded.forward(input).into_data();
        assert_eq!(
            before.as_slice::<f32>().unwrap(),
            after.as_slice::<f32>().unwrap()
        );

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let device = Default::default();
        let path = std::env::temp_dir()
            .join(format!("lineup-missing-{}", std::process::id()))
            .join("model")
            .to_string_lossy()
            .to_string();
        let result = TeamRegressor::<TestBackend>::load(&device, &path, &small_config());
        assert!(matches!(result, Err(LineupError::Model(_))));
    }

    #[test]
    fn test_activation_serde_names() {
        let json = serde_json::to_string(&Activation::LeakyRelu).unwrap();
        assert_eq!(json, "\"leaky_relu\"");
    }
}

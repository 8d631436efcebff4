//! Lineup Prediction CLI
//!
//! Predicts the next five-player lineup and goalie from selection history.

use clap::{Parser, Subcommand};
use lineup::{Config, Result};

#[derive(Parser)]
#[command(name = "lineup")]
#[command(about = "Next lineup prediction from selection history", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute selection weights and save the pattern summary
    Weights,
    /// Train the lineup regressor
    Train {
        /// Override maximum iterations
        #[arg(long)]
        iterations: Option<usize>,
    },
    /// Predict the next lineup
    Predict {
        /// Train a fresh model even if one is saved
        #[arg(long, conflicts_with = "no_train")]
        retrain: bool,
        /// Fail instead of training when no saved model exists
        #[arg(long)]
        no_train: bool,
        /// Number of prediction runs (most confident is kept)
        #[arg(long)]
        runs: Option<usize>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Model management
    Model {
        #[command(subcommand)]
        action: ModelCommands,
    },
    /// Initialize configuration
    Init,
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Show model information
    Info,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use table or json.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    // Run command
    let result = match cli.command {
        Commands::Weights => commands::weights(&config),
        Commands::Train { iterations } => commands::train(&config, iterations),
        Commands::Predict {
            retrain,
            no_train,
            runs,
            format,
        } => commands::predict(&config, retrain, no_train, runs, format),
        Commands::Model { action } => match action {
            ModelCommands::Info => commands::model_info(&config),
        },
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use lineup::data::{load_history, Roster};
    use lineup::features::{PatternSummary, WeightTable};
    use lineup::model::ModelManifest;
    use lineup::predict::report::format_prediction;
    use lineup::predict::{analyze_accuracy, PredictionReport, Predictor};
    use lineup::training::{TrainedModel, Trainer};
    use lineup::TeamSelection;

    type MyBackend = NdArray<f32>;
    type MyAutodiffBackend = Autodiff<MyBackend>;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        std::fs::create_dir_all("model")?;
        println!("Created data/ and model/ directories");

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Put selection history at {}", config.data.history_path);
        println!("  3. Run 'lineup train' to train the model");
        println!("  4. Run 'lineup predict' to predict the next lineup");

        Ok(())
    }

    /// Roster, history and weights shared by every command
    fn load_inputs(config: &Config) -> Result<(Roster, Vec<TeamSelection>, WeightTable)> {
        let roster =
            Roster::load_or_numbered(&config.data.players_path, &config.data.goalies_path)?;
        let history = load_history(&config.data.history_path, &roster)?;
        let weights = WeightTable::compute(&history, &config.weight_factors)?;
        Ok((roster, history, weights))
    }

    pub fn weights(config: &Config) -> Result<()> {
        let (roster, _history, weights) = load_inputs(config)?;
        let summary = PatternSummary::new(&weights, &roster);

        println!("Pattern Summary ({} lineups)", summary.lineups_analyzed);
        println!("───────────────────────────────");
        println!("Top players:");
        for p in &summary.top_players {
            println!(
                "  {:>2}  {:<24} {:>4}  weight {:.3}",
                p.id, p.name, p.count, p.selection_weight
            );
        }
        println!("Goalies:");
        for g in &summary.goalie_frequency {
            println!(
                "  {:>2}  {:<24} {:>4}  weight {:.3}",
                g.id, g.name, g.count, g.selection_weight
            );
        }
        println!("Top combinations:");
        for pair in &summary.top_combinations {
            println!(
                "  {:>2} + {:<2} {:>4}  weight {:.3}",
                pair.first, pair.second, pair.count, pair.weight
            );
        }
        let baseline: Vec<String> = summary
            .baseline_players
            .iter()
            .map(|p| p.to_string())
            .collect();
        println!(
            "Baseline: [{}] goalie {}",
            baseline.join(", "),
            summary
                .baseline_goalie
                .map(|g| g.to_string())
                .unwrap_or_else(|| "-".to_string())
        );

        summary.save(&config.data.analysis_path)?;
        println!("\nSaved to {}", config.data.analysis_path);
        Ok(())
    }

    fn fit(
        config: &Config,
        history: &[TeamSelection],
        weights: &WeightTable,
    ) -> Result<TrainedModel<MyBackend>> {
        let device = Default::default();
        let mut trainer = Trainer::<MyAutodiffBackend>::new(config, device)?;

        println!(
            "Training on {} lineups (max {} iterations)...",
            history.len(),
            config.training.max_iterations
        );
        let trained = trainer.train(history, weights)?;
        trained.save(&config.data.model_path)?;

        println!(
            "Training complete: error {:.6} after {} iterations ({} examples)",
            trained.final_error, trained.iterations, trained.examples
        );
        Ok(trained)
    }

    pub fn train(config: &Config, iterations: Option<usize>) -> Result<()> {
        let mut config = config.clone();
        if let Some(n) = iterations {
            config.training.max_iterations = n;
        }

        let (_roster, history, weights) = load_inputs(&config)?;
        fit(&config, &history, &weights)?;
        println!("Model saved to {}", config.data.model_path);
        Ok(())
    }

    pub fn predict(
        config: &Config,
        retrain: bool,
        no_train: bool,
        runs: Option<usize>,
        format: OutputFormat,
    ) -> Result<()> {
        let (roster, history, weights) = load_inputs(config)?;
        let model_path = &config.data.model_path;
        let device = Default::default();

        let saved = if !retrain && ModelManifest::exists(model_path) {
            Some(ModelManifest::load(model_path)?)
        } else {
            None
        };

        let (predictor, training_error) = match saved {
            Some(manifest) => (
                Predictor::<MyBackend>::from_manifest(
                    model_path, &manifest, weights, roster, config, device,
                )?,
                manifest.final_error,
            ),
            None if no_train => return Err(lineup::LineupError::NoModel),
            None => {
                if !retrain {
                    log::info!("No saved model at {}, training one", model_path);
                }
                let trained = fit(config, &history, &weights)?;
                let error = trained.final_error;
                (
                    Predictor::<MyBackend>::new(trained.model, weights, roster, config, device),
                    error,
                )
            }
        };

        let runs = runs.unwrap_or(config.prediction.runs);
        let prediction = predictor.predict(&history, runs)?;
        let accuracy = analyze_accuracy(&prediction, &history);
        let report = PredictionReport::new(prediction, training_error, accuracy);
        report.save(&config.data.report_path)?;

        match format {
            OutputFormat::Table => {
                print!("{}", format_prediction(&report.prediction));
                println!("{}", report.accuracy);
                println!("\nReport saved to {}", config.data.report_path);
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }

        Ok(())
    }

    pub fn model_info(config: &Config) -> Result<()> {
        let model_path = &config.data.model_path;
        if !ModelManifest::exists(model_path) {
            return Err(lineup::LineupError::NoModel);
        }
        let manifest = ModelManifest::load(model_path)?;
        let hidden: Vec<String> = manifest
            .regressor
            .hidden_layers
            .iter()
            .map(|w| w.to_string())
            .collect();

        println!("Model Information");
        println!("───────────────────────────────");
        println!("  Path:           {}.mpk", model_path);
        println!("  Input/output:   {}/{}", manifest.regressor.input_dim, manifest.regressor.output_dim);
        println!("  Hidden layers:  [{}]", hidden.join(", "));
        println!("  Activation:     {:?}", manifest.regressor.activation);
        println!("  Dropout:        {}", manifest.regressor.dropout);
        println!("  Final error:    {:.6}", manifest.final_error);
        println!("  Iterations:     {}", manifest.iterations);
        println!("  Examples:       {}", manifest.examples);
        println!("  Trained at:     {}", manifest.trained_at.format("%Y-%m-%d %H:%M:%S UTC"));

        Ok(())
    }
}

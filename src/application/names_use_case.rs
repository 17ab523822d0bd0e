// ============================================================
// Layer 2 - Names Use Cases
// ============================================================
// Training:
//
//   Step 1: Load data/names/*.txt       (Layer 4 - data)
//   Step 2: Save config + categories    (Layer 6 - infra)
//   Step 3: Build CharRnn + SGD         (Layer 5 - ml)
//   Step 4: Run the training loop       (Layer 5 - ml)
//   Step 5: Save weights, loss curve    (Layer 6 - infra)
//   Step 6: Confusion matrix            (Layer 5 + 6)
//
// Prediction reloads steps 2 and 5 from the output directory.

use anyhow::Result;
use burn::{optim::SgdConfig, prelude::*};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::data::{
    alphabet::N_LETTERS,
    loader::NamesLoader,
    sampler::{BalancedSampler, UniformSampler},
};
use crate::domain::{category::CategorySet, traits::CorpusSource};
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsWriter};
use crate::ml::{
    classifier::{CharRnn, CharRnnConfig, CharRnnLearner},
    inferencer::{NameClassifier, Prediction},
    trainer::{LoopConfig, TrainingLoop, TrainingReport},
    InferBackend, TrainBackend,
};

const CONFIG_FILE:     &str = "names_config.json";
const CATEGORIES_FILE: &str = "categories.json";
const MODEL_NAME:      &str = "char_rnn";

// ─── Configuration ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamesConfig {
    pub data_dir:          String,
    pub output_dir:        String,
    pub n_iters:           usize,
    pub print_every:       usize,
    pub plot_every:        usize,
    pub learning_rate:     f64,
    pub hidden_size:       usize,
    /// Category first, then a name within it
    pub balanced:          bool,
    pub seed:              u64,
    /// Examples classified for the confusion matrix; 0 skips it
    pub confusion_samples: usize,
}

impl Default for NamesConfig {
    fn default() -> Self {
        Self {
            data_dir:          "data/names".to_string(),
            output_dir:        "out/names".to_string(),
            n_iters:           100_000,
            print_every:       5_000,
            plot_every:        1_000,
            learning_rate:     0.005,
            hidden_size:       128,
            balanced:          false,
            seed:              42,
            confusion_samples: 10_000,
        }
    }
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct NamesSummary {
    pub categories: usize,
    pub examples:   usize,
    pub report:     TrainingReport,
    pub accuracy:   Option<f64>,
}

// ─── TrainNamesUseCase ───────────────────────────────────────────────────────
pub struct TrainNamesUseCase {
    config: NamesConfig,
}

impl TrainNamesUseCase {
    pub fn new(config: NamesConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<NamesSummary> {
        let cfg = &self.config;

        // ── Step 1: Load the corpus ───────────────────────────────────────────
        tracing::info!("Loading names from '{}'", cfg.data_dir);
        let categories = NamesLoader::new(&cfg.data_dir).load()?;
        tracing::info!(
            "Loaded {} names in {} categories",
            categories.example_count(), categories.len(),
        );

        // ── Step 2: Persist what inference needs to rebuild the model ────────
        let ckpt = CheckpointManager::create(&cfg.output_dir)?;
        ckpt.save_json(cfg, CONFIG_FILE)?;
        ckpt.save_json(&categories, CATEGORIES_FILE)?;

        // ── Step 3: Model + optimiser ─────────────────────────────────────────
        let device = <TrainBackend as Backend>::Device::default();
        TrainBackend::seed(&device, cfg.seed);
        let model  = CharRnnConfig::new(N_LETTERS, cfg.hidden_size, categories.len())
            .init::<TrainBackend>(&device);
        let optim  = SgdConfig::new().init::<TrainBackend, CharRnn<TrainBackend>>();
        let mut learner = CharRnnLearner::new(model, optim, cfg.learning_rate, device, &categories);

        // ── Step 4: Train ─────────────────────────────────────────────────────
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let trainer = TrainingLoop::new(LoopConfig::new(cfg.n_iters, cfg.print_every, cfg.plot_every));
        let report  = if cfg.balanced {
            tracing::info!("Sampling balanced across categories");
            trainer.run(&BalancedSampler::new(&categories), &mut learner, &mut rng)?
        } else {
            trainer.run(&UniformSampler::new(categories.to_examples()), &mut learner, &mut rng)?
        };

        // ── Step 5: Save weights and loss curve ───────────────────────────────
        let trained = learner.valid_model();
        ckpt.save_model(&trained, MODEL_NAME)?;
        let metrics = MetricsWriter::new(&cfg.output_dir)?;
        metrics.write_loss_curve(&report.plot_losses)?;

        // ── Step 6: Confusion matrix on the inference backend ────────────────
        let accuracy = if cfg.confusion_samples > 0 {
            let classifier = NameClassifier::new(trained, categories.clone(), Default::default());
            let sampler    = UniformSampler::new(categories.to_examples());
            let matrix     = classifier.confusion(&sampler, cfg.confusion_samples, &mut rng)?;
            metrics.write_confusion(&matrix)?;
            Some(matrix.accuracy())
        } else {
            None
        };

        Ok(NamesSummary {
            categories: categories.len(),
            examples:   categories.example_count(),
            report,
            accuracy,
        })
    }
}

// ─── PredictNameUseCase ──────────────────────────────────────────────────────
pub struct PredictNameUseCase {
    classifier: NameClassifier<InferBackend>,
}

impl PredictNameUseCase {
    /// Rebuild the classifier saved by `TrainNamesUseCase` in `output_dir`.
    pub fn new(output_dir: &str) -> Result<Self> {
        let ckpt = CheckpointManager::open(output_dir)?;
        let cfg: NamesConfig         = ckpt.load_json(CONFIG_FILE)?;
        let categories: CategorySet  = ckpt.load_json(CATEGORIES_FILE)?;

        let device = <InferBackend as Backend>::Device::default();
        let model  = CharRnnConfig::new(N_LETTERS, cfg.hidden_size, categories.len())
            .init::<InferBackend>(&device);
        let model  = ckpt.load_model(model, MODEL_NAME, &device)?;
        tracing::info!("Loaded classifier with {} categories", categories.len());

        Ok(Self { classifier: NameClassifier::new(model, categories, device) })
    }

    pub fn predict(&self, name: &str, top: usize) -> Result<Vec<Prediction>> {
        self.classifier.predict(name, top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_corpus(dir: &std::path::Path) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("japanese.txt"), "Abe\nAraki\nSato\n").unwrap();
        fs::write(dir.join("korean.txt"), "Kim\nPark\n").unwrap();
    }

    #[test]
    fn test_train_then_predict() {
        let tmp  = tempfile::tempdir().unwrap();
        let data = tmp.path().join("names");
        let out  = tmp.path().join("out");
        write_corpus(&data);

        let cfg = NamesConfig {
            data_dir:          data.display().to_string(),
            output_dir:        out.display().to_string(),
            n_iters:           40,
            print_every:       20,
            plot_every:        10,
            hidden_size:       16,
            confusion_samples: 30,
            ..NamesConfig::default()
        };
        let summary = TrainNamesUseCase::new(cfg).execute().unwrap();

        assert_eq!(summary.categories, 2);
        assert_eq!(summary.examples, 5);
        assert_eq!(summary.report.plot_losses.len(), 4);
        assert!(summary.accuracy.is_some());
        assert!(out.join("loss_curve.csv").exists());
        assert!(out.join("confusion.csv").exists());

        let predictor = PredictNameUseCase::new(&out.display().to_string()).unwrap();
        let preds     = predictor.predict("Kimura", 2).unwrap();
        assert_eq!(preds.len(), 2);
        assert!(preds[0].log_prob >= preds[1].log_prob);
    }

    #[test]
    fn test_missing_corpus_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = NamesConfig {
            data_dir:   tmp.path().join("absent").display().to_string(),
            output_dir: tmp.path().join("out").display().to_string(),
            ..NamesConfig::default()
        };
        assert!(TrainNamesUseCase::new(cfg).execute().is_err());
    }
}

// ============================================================
// Layer 2 - Translator Use Cases
// ============================================================
// Training:
//
//   Step 1: Read, filter, count words     (Layer 4 - data)
//   Step 2: Save config + vocabularies    (Layer 6 - infra)
//   Step 3: Build Seq2Seq + SGD           (Layer 5 - ml)
//   Step 4: Run the training loop         (Layer 5 - ml)
//   Step 5: Save weights, loss curve      (Layer 6 - infra)
//   Step 6: Random evaluation, attention  (Layer 5 + 6)
//
// Translation reloads steps 2 and 5 from the output directory.

use anyhow::Result;
use burn::{optim::SgdConfig, prelude::*};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::data::{
    batcher::PairBatcher,
    loader::prepare_data,
    sampler::UniformSampler,
    vocabulary::Vocabulary,
};
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsWriter};
use crate::ml::{
    inferencer::{Translation, Translator},
    seq2seq::{Seq2Seq, Seq2SeqConfig, Seq2SeqLearner},
    trainer::{LoopConfig, TrainingLoop, TrainingReport},
    InferBackend, TrainBackend,
};

const CONFIG_FILE:       &str = "translator_config.json";
const INPUT_VOCAB_FILE:  &str = "input_vocab.json";
const OUTPUT_VOCAB_FILE: &str = "output_vocab.json";
const MODEL_NAME:        &str = "seq2seq";

// ─── Configuration ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    pub data_dir:              String,
    pub output_dir:            String,
    pub lang1:                 String,
    pub lang2:                 String,
    /// Translate lang2 -> lang1
    pub reverse:               bool,
    /// Token cap per side; encoder memory holds this many positions
    pub max_length:            usize,
    pub n_iters:               usize,
    pub print_every:           usize,
    pub plot_every:            usize,
    pub learning_rate:         f64,
    pub hidden_size:           usize,
    pub dropout:               f64,
    pub teacher_forcing_ratio: f64,
    pub eval_samples:          usize,
    /// Sentences translated after training with their attention saved
    pub show_attention:        Vec<String>,
    pub seed:                  u64,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            data_dir:              "data".to_string(),
            output_dir:            "out/translator".to_string(),
            lang1:                 "eng".to_string(),
            lang2:                 "fra".to_string(),
            reverse:               true,
            max_length:            10,
            n_iters:               75_000,
            print_every:           5_000,
            plot_every:            100,
            learning_rate:         0.01,
            hidden_size:           256,
            dropout:               0.1,
            teacher_forcing_ratio: 0.5,
            eval_samples:          10,
            show_attention:        Vec::new(),
            seed:                  42,
        }
    }
}

impl TranslatorConfig {
    fn model_config(&self, input_vocab: &Vocabulary, output_vocab: &Vocabulary) -> Seq2SeqConfig {
        Seq2SeqConfig::new(input_vocab.len(), output_vocab.len(), self.hidden_size, self.max_length)
            .with_dropout(self.dropout)
    }
}

#[derive(Debug, Clone)]
pub struct TranslatorSummary {
    pub pairs:        usize,
    pub input_words:  usize,
    pub output_words: usize,
    pub report:       TrainingReport,
    pub samples:      usize,
}

// ─── TrainTranslatorUseCase ──────────────────────────────────────────────────
pub struct TrainTranslatorUseCase {
    config: TranslatorConfig,
}

impl TrainTranslatorUseCase {
    pub fn new(config: TranslatorConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TranslatorSummary> {
        let cfg = &self.config;

        // ── Step 1: Corpus and vocabularies ───────────────────────────────────
        let corpus = prepare_data(&cfg.data_dir, &cfg.lang1, &cfg.lang2, cfg.reverse, cfg.max_length)?;

        // ── Step 2: Persist what inference needs ──────────────────────────────
        let ckpt = CheckpointManager::create(&cfg.output_dir)?;
        ckpt.save_json(cfg, CONFIG_FILE)?;
        ckpt.save_json(&corpus.input_vocab, INPUT_VOCAB_FILE)?;
        ckpt.save_json(&corpus.output_vocab, OUTPUT_VOCAB_FILE)?;

        // ── Step 3: Model + optimiser ─────────────────────────────────────────
        let device = <TrainBackend as Backend>::Device::default();
        TrainBackend::seed(&device, cfg.seed);
        let model  = cfg
            .model_config(&corpus.input_vocab, &corpus.output_vocab)
            .init::<TrainBackend>(&device);
        let optim   = SgdConfig::new().init::<TrainBackend, Seq2Seq<TrainBackend>>();
        let batcher = PairBatcher::new(&corpus.input_vocab, &corpus.output_vocab, cfg.max_length, device);
        let mut learner = Seq2SeqLearner::new(
            model, optim, cfg.learning_rate, cfg.teacher_forcing_ratio, batcher, &corpus.output_vocab,
        );

        // ── Step 4: Train ─────────────────────────────────────────────────────
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let sampler = UniformSampler::new(corpus.pairs.clone());
        let report  = TrainingLoop::new(LoopConfig::new(cfg.n_iters, cfg.print_every, cfg.plot_every))
            .run(&sampler, &mut learner, &mut rng)?;

        // ── Step 5: Save weights and loss curve ───────────────────────────────
        let trained = learner.valid_model();
        ckpt.save_model(&trained, MODEL_NAME)?;
        let metrics = MetricsWriter::new(&cfg.output_dir)?;
        metrics.write_loss_curve(&report.plot_losses)?;

        // ── Step 6: Evaluate on the inference backend ─────────────────────────
        let translator = Translator::new(
            trained,
            corpus.input_vocab.clone(),
            corpus.output_vocab.clone(),
            Default::default(),
        );
        let samples = translator.evaluate_randomly(&corpus.pairs, cfg.eval_samples, &mut rng)?;
        write_attention_maps(&translator, &metrics, &cfg.show_attention)?;

        Ok(TranslatorSummary {
            pairs:        corpus.pairs.len(),
            input_words:  corpus.input_vocab.len(),
            output_words: corpus.output_vocab.len(),
            report,
            samples:      samples.len(),
        })
    }
}

/// Translate each sentence and save its attention heatmap. Sentences
/// the closed vocabulary cannot encode are skipped.
fn write_attention_maps(
    translator: &Translator<InferBackend>,
    metrics:    &MetricsWriter,
    sentences:  &[String],
) -> Result<()> {
    for (i, sentence) in sentences.iter().enumerate() {
        let translation = match translator.evaluate(sentence) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!("Skipping attention for '{}': {}", sentence, e);
                continue;
            }
        };
        println!("input = {}", sentence);
        println!("output = {}", translation.words.join(" "));
        metrics.write_attention(i + 1, &translation.source, &translation.words, &translation.attentions)?;
    }
    Ok(())
}

// ─── TranslateUseCase ────────────────────────────────────────────────────────
pub struct TranslateUseCase {
    translator: Translator<InferBackend>,
}

impl TranslateUseCase {
    /// Rebuild the translator saved by `TrainTranslatorUseCase` in `output_dir`.
    pub fn new(output_dir: &str) -> Result<Self> {
        let ckpt = CheckpointManager::open(output_dir)?;
        let cfg: TranslatorConfig   = ckpt.load_json(CONFIG_FILE)?;
        let input_vocab: Vocabulary  = ckpt.load_json(INPUT_VOCAB_FILE)?;
        let output_vocab: Vocabulary = ckpt.load_json(OUTPUT_VOCAB_FILE)?;

        let device = <InferBackend as Backend>::Device::default();
        let model  = cfg.model_config(&input_vocab, &output_vocab).init::<InferBackend>(&device);
        let model  = ckpt.load_model(model, MODEL_NAME, &device)?;
        tracing::info!(
            "Loaded translator {} -> {}",
            input_vocab.name(), output_vocab.name(),
        );

        Ok(Self { translator: Translator::new(model, input_vocab, output_vocab, device) })
    }

    pub fn translate(&self, sentence: &str) -> Result<Translation> {
        self.translator.evaluate(sentence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CORPUS: &str = "\
I am cold.\tJ'ai froid.
I am fine.\tJe vais bien.
He is tall.\tIl est grand.
She is happy.\tElle est heureuse.
Go.\tVa !
";

    #[test]
    fn test_train_then_translate() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("eng-fra.txt"), CORPUS).unwrap();
        let out = tmp.path().join("out");

        let cfg = TranslatorConfig {
            data_dir:       tmp.path().display().to_string(),
            output_dir:     out.display().to_string(),
            n_iters:        12,
            print_every:    6,
            plot_every:     4,
            hidden_size:    8,
            eval_samples:   2,
            show_attention: vec!["il est grand .".into(), "c est inconnu .".into()],
            ..TranslatorConfig::default()
        };
        let summary = TrainTranslatorUseCase::new(cfg).execute().unwrap();

        // "Go." is dropped by the prefix filter
        assert_eq!(summary.pairs, 4);
        assert_eq!(summary.samples, 2);
        assert_eq!(summary.report.plot_losses.len(), 3);
        assert!(out.join("loss_curve.csv").exists());
        assert!(out.join("attention_1.csv").exists());
        assert!(!out.join("attention_2.csv").exists());

        let use_case    = TranslateUseCase::new(&out.display().to_string()).unwrap();
        let translation = use_case.translate("Elle est heureuse.").unwrap();
        assert!(translation.steps >= 1 && translation.steps <= 10);
        assert_eq!(translation.attentions.len(), 10);
    }

    #[test]
    fn test_translate_without_training_fails() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(TranslateUseCase::new(&tmp.path().join("out").display().to_string()).is_err());
    }
}

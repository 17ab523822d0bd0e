// ============================================================
// Layer 5 - Inferencer
// ============================================================
// Evaluation on the plain (non-autodiff) backend. Models arrive
// here either from `learner.valid_model()` straight after
// training or from a checkpoint; nothing in this file records
// gradients or touches an optimiser.
//
//   NameClassifier  name -> log-probabilities over categories
//   Translator      sentence -> greedy decode + attention matrix

use anyhow::{anyhow, Result};
use burn::{prelude::*, tensor::activation::log_softmax};
use rand::Rng;

use crate::data::batcher::{read_row, top_index, NameBatcher, PairBatcher};
use crate::data::normalizer::{NameNormalizer, SentenceNormalizer};
use crate::data::vocabulary::{Vocabulary, EOS_TOKEN, SOS_TOKEN};
use crate::domain::category::{CategorySet, NameExample};
use crate::domain::sentence_pair::SentencePair;
use crate::domain::traits::ExampleSampler;
use crate::infra::metrics::ConfusionMatrix;
use crate::ml::classifier::CharRnn;
use crate::ml::seq2seq::Seq2Seq;

pub const EOS_MARKER: &str = "<EOS>";

// ─── Name classifier ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub category: String,
    pub log_prob: f32,
}

pub struct NameClassifier<B: Backend> {
    model:      CharRnn<B>,
    categories: CategorySet,
    batcher:    NameBatcher<B>,
    normalizer: NameNormalizer,
}

impl<B: Backend> NameClassifier<B> {
    pub fn new(model: CharRnn<B>, categories: CategorySet, device: B::Device) -> Self {
        Self {
            model,
            categories,
            batcher: NameBatcher::new(device),
            normalizer: NameNormalizer::new(),
        }
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    /// Log-probability of every category for an already normalised name.
    fn log_probs(&self, name: &str) -> Result<Vec<f32>> {
        let line   = self.batcher.line_tensor(name)?;
        let logits = self.model.forward_line(line);
        Ok(read_row(log_softmax(logits, 1)))
    }

    /// Log-probabilities for a raw name, in category order.
    pub fn evaluate(&self, raw: &str) -> Result<Vec<f32>> {
        let name = self.normalizer.normalize(raw)?;
        self.log_probs(&name)
    }

    /// The `n` most likely categories, best first.
    pub fn predict(&self, raw: &str, n: usize) -> Result<Vec<Prediction>> {
        let scores = self.evaluate(raw)?;

        let mut ranked: Vec<(usize, f32)> = scores.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        ranked
            .into_iter()
            .take(n)
            .map(|(index, log_prob)| {
                Ok(Prediction {
                    category: self.categories.category(index)?.to_string(),
                    log_prob,
                })
            })
            .collect()
    }

    /// Classify `n` sampled examples and tally guesses per true category.
    pub fn confusion<S, R>(&self, sampler: &S, n: usize, rng: &mut R) -> Result<ConfusionMatrix>
    where
        S: ExampleSampler<Item = NameExample>,
        R: Rng,
    {
        let mut matrix = ConfusionMatrix::new(self.categories.all_categories().to_vec());
        for _ in 0..n {
            let Some(example) = sampler.sample(rng) else { break };
            let line   = self.batcher.line_tensor(&example.name)?;
            let guess  = top_index(self.model.forward_line(line));
            matrix.record(example.category_index, guess);
        }
        Ok(matrix)
    }
}

// ─── Translator ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    /// Source tokens as fed to the encoder, EOS marker included
    pub source:     Vec<String>,
    /// Decoded words, ending with `<EOS>` when the decoder produced it
    pub words:      Vec<String>,
    /// `max_length x max_length`, one row per decode step, zero past `steps`
    pub attentions: Vec<Vec<f32>>,
    pub steps:      usize,
}

impl Translation {
    /// Decoded words without the end marker.
    pub fn sentence(&self) -> String {
        self.words
            .iter()
            .filter(|w| w.as_str() != EOS_MARKER)
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub struct Translator<B: Backend> {
    model:        Seq2Seq<B>,
    input_vocab:  Vocabulary,
    output_vocab: Vocabulary,
    max_length:   usize,
    device:       B::Device,
    normalizer:   SentenceNormalizer,
}

impl<B: Backend> Translator<B> {
    pub fn new(
        model:        Seq2Seq<B>,
        input_vocab:  Vocabulary,
        output_vocab: Vocabulary,
        device:       B::Device,
    ) -> Self {
        let max_length = model.max_length;
        Self {
            model,
            input_vocab,
            output_vocab,
            max_length,
            device,
            normalizer: SentenceNormalizer::new(),
        }
    }

    /// Greedy decode of one sentence, at most `max_length` steps.
    pub fn evaluate(&self, raw: &str) -> Result<Translation> {
        let sentence = self.normalizer.normalize(raw)?;
        let batcher  = PairBatcher::<B>::new(
            &self.input_vocab, &self.output_vocab, self.max_length, self.device.clone(),
        );
        let input  = batcher.source_tensor(&sentence)?;
        let memory = self.model.encode_source(input);

        let mut hidden     = memory.hidden.clone();
        let mut token      = SOS_TOKEN;
        let mut words      = Vec::new();
        let mut attentions = vec![vec![0.0f32; self.max_length]; self.max_length];

        for step in 0..self.max_length {
            let out = self.model.decode_step(token, hidden, &memory);
            let row = read_row(out.attention);
            for (dst, src) in attentions[step].iter_mut().zip(row) {
                *dst = src;
            }
            hidden = out.hidden;

            let top = top_index(out.logits);
            if top == EOS_TOKEN {
                words.push(EOS_MARKER.to_string());
                break;
            }
            let word = self.output_vocab.word(top).ok_or_else(|| {
                anyhow!("decoder produced index {top} outside vocabulary '{}'", self.output_vocab.name())
            })?;
            words.push(word.to_string());
            token = top;
        }

        let mut source: Vec<String> = sentence.split_whitespace().map(str::to_string).collect();
        source.push(EOS_MARKER.to_string());

        Ok(Translation { source, steps: words.len(), words, attentions })
    }

    /// Translate `n` random pairs, printing `>` input, `=` target, `<` output.
    pub fn evaluate_randomly<R: Rng>(
        &self,
        pairs: &[SentencePair],
        n:     usize,
        rng:   &mut R,
    ) -> Result<Vec<(SentencePair, Translation)>> {
        use rand::seq::SliceRandom;

        let mut results = Vec::with_capacity(n);
        for _ in 0..n {
            let Some(pair) = pairs.choose(rng) else { break };
            let translation = self.evaluate(&pair.input)?;
            println!("> {}", pair.input);
            println!("= {}", pair.output);
            println!("< {}", translation.words.join(" "));
            println!();
            results.push((pair.clone(), translation));
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::module::Param;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::data::alphabet::N_LETTERS;
    use crate::data::sampler::UniformSampler;
    use crate::domain::error::NlpError;
    use crate::ml::classifier::CharRnnConfig;
    use crate::ml::seq2seq::Seq2SeqConfig;

    type TestBackend = NdArray;

    fn categories() -> CategorySet {
        let mut set = CategorySet::new();
        set.insert("japanese", vec!["Abe".into(), "Araki".into()]);
        set.insert("korean", vec!["Kim".into()]);
        set.insert("polish", vec!["Slusarski".into()]);
        set
    }

    fn classifier() -> NameClassifier<TestBackend> {
        let device = Default::default();
        let model  = CharRnnConfig::new(N_LETTERS, 8, 3).init::<TestBackend>(&device);
        NameClassifier::new(model, categories(), device)
    }

    fn translator(max_length: usize) -> Translator<TestBackend> {
        let device = Default::default();
        let mut fra = Vocabulary::new("fra");
        let mut eng = Vocabulary::new("eng");
        fra.add_sentence("je suis froid .");
        eng.add_sentence("i am cold .");
        let model = Seq2SeqConfig::new(fra.len(), eng.len(), 8, max_length).init::<TestBackend>(&device);
        Translator::new(model, fra, eng, device)
    }

    #[test]
    fn test_evaluate_is_log_distribution() {
        let scores = classifier().evaluate("Ślusàrski").unwrap();
        assert_eq!(scores.len(), 3);
        let total: f32 = scores.iter().map(|s| s.exp()).sum();
        assert!((total - 1.0).abs() < 1e-4);
        assert!(scores.iter().all(|&s| s <= 0.0));
    }

    #[test]
    fn test_predict_sorted_and_truncated() {
        let preds = classifier().predict("Dovesky", 2).unwrap();
        assert_eq!(preds.len(), 2);
        assert!(preds[0].log_prob >= preds[1].log_prob);
        assert_ne!(preds[0].category, preds[1].category);
    }

    #[test]
    fn test_predict_rejects_name_without_letters() {
        assert!(classifier().predict("123", 3).is_err());
    }

    #[test]
    fn test_confusion_counts_every_sample() {
        let c       = classifier();
        let sampler = UniformSampler::new(c.categories().to_examples());
        let mut rng = StdRng::seed_from_u64(4);

        let matrix = c.confusion(&sampler, 25, &mut rng).unwrap();
        assert_eq!(matrix.total(), 25);
    }

    #[test]
    fn test_translation_shape() {
        let t = translator(6);
        let out = t.evaluate("Je suis froid.").unwrap();

        assert_eq!(out.source, vec!["je", "suis", "froid", ".", "<EOS>"]);
        assert!(out.steps >= 1 && out.steps <= 6);
        assert_eq!(out.attentions.len(), 6);
        assert!(out.attentions.iter().all(|row| row.len() == 6));
        for row in &out.attentions[..out.steps] {
            let total: f32 = row.iter().sum();
            assert!((total - 1.0).abs() < 1e-4);
        }
        for row in &out.attentions[out.steps..] {
            assert!(row.iter().all(|&w| w == 0.0));
        }
    }

    #[test]
    fn test_translation_stops_on_first_eos() {
        let device = Default::default();
        let mut t  = translator(6);

        let vocab_len = t.output_vocab.len();
        let mut bias  = vec![0.0f32; vocab_len];
        bias[EOS_TOKEN] = 1000.0;
        t.model.decoder.out.bias = Some(Param::from_tensor(Tensor::from_data(
            TensorData::new(bias, [vocab_len]),
            &device,
        )));

        let out = t.evaluate("je suis froid .").unwrap();
        assert_eq!(out.words, vec![EOS_MARKER]);
        assert_eq!(out.steps, 1);
        assert_eq!(out.sentence(), "");
        let total: f32 = out.attentions[0].iter().sum();
        assert!((total - 1.0).abs() < 1e-4);
        for row in &out.attentions[1..] {
            assert!(row.iter().all(|&w| w == 0.0));
        }
    }

    #[test]
    fn test_translation_rejects_unknown_word() {
        let err = translator(6).evaluate("je suis chaud .").unwrap_err();
        assert!(matches!(err.downcast_ref::<NlpError>(), Some(NlpError::UnknownSymbol { .. })));
    }

    #[test]
    fn test_translation_rejects_long_input() {
        let err = translator(3).evaluate("je suis froid .").unwrap_err();
        assert!(matches!(err.downcast_ref::<NlpError>(), Some(NlpError::SequenceTooLong { .. })));
    }

    #[test]
    fn test_sentence_drops_marker() {
        let t = Translation {
            source:     vec![],
            words:      vec!["i".into(), "am".into(), EOS_MARKER.into()],
            attentions: vec![],
            steps:      3,
        };
        assert_eq!(t.sentence(), "i am");
    }
}

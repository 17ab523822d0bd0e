// ============================================================
// Layer 5 - Encoder / Attention Decoder
// ============================================================
// Word-level sequence to sequence model.
//
//   EncoderRnn      embedding -> GRU over the whole source
//                   outputs [len, H], final hidden [1, H]
//
//   AttnDecoderRnn  one target token per call:
//
//     embedded  = dropout(embedding(token))             [1, H]
//     energy    = tanh(W·hidden + U·encoder_outputs)    [L, H]
//     scores    = v·energy + mask                       [1, L]
//     attention = softmax(scores)                       [1, L]
//     context   = attention · encoder_outputs           [1, H]
//     x         = relu(combine([embedded ; context]))   [1, H]
//     hidden'   = GRU(x, hidden)                        [1, H]
//     logits    = out(hidden')                          [1, V]
//
// Encoder outputs are zero padded to `max_length` rows so the
// attention matrix always has the same width. Padded rows get a
// large negative score and receive no attention weight.

use anyhow::Result;
use burn::{
    module::AutodiffModule,
    nn::{
        gru::{Gru, GruConfig},
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig, Embedding, EmbeddingConfig, Linear, LinearConfig,
    },
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::{
        activation::{relu, softmax},
        backend::AutodiffBackend,
    },
};
use rand::Rng;

use crate::data::batcher::{index_tensor, target_tensor, top_index, PairBatch, PairBatcher};
use crate::data::vocabulary::{Vocabulary, EOS_TOKEN, SOS_TOKEN};
use crate::domain::sentence_pair::SentencePair;
use crate::domain::traits::{Learner, StepOutcome};

const MASKED: f32 = -1.0e9;

#[derive(Config, Debug)]
pub struct Seq2SeqConfig {
    pub input_vocab_size:  usize,
    pub output_vocab_size: usize,
    pub hidden_size:       usize,
    pub max_length:        usize,
    #[config(default = 0.1)]
    pub dropout:           f64,
}

impl Seq2SeqConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Seq2Seq<B> {
        let h = self.hidden_size;
        let encoder = EncoderRnn {
            embedding:   EmbeddingConfig::new(self.input_vocab_size, h).init(device),
            gru:         GruConfig::new(h, h, true).init(device),
            hidden_size: h,
        };
        let decoder = AttnDecoderRnn {
            embedding:    EmbeddingConfig::new(self.output_vocab_size, h).init(device),
            dropout:      DropoutConfig::new(self.dropout).init(),
            attn_query:   LinearConfig::new(h, h).init(device),
            attn_key:     LinearConfig::new(h, h).init(device),
            attn_score:   LinearConfig::new(h, 1).init(device),
            attn_combine: LinearConfig::new(2 * h, h).init(device),
            gru:          GruConfig::new(h, h, true).init(device),
            out:          LinearConfig::new(h, self.output_vocab_size).init(device),
            hidden_size:  h,
        };
        Seq2Seq { encoder, decoder, max_length: self.max_length }
    }
}

// ─── Encoder ─────────────────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct EncoderRnn<B: Backend> {
    pub embedding:   Embedding<B>,
    pub gru:         Gru<B>,
    pub hidden_size: usize,
}

impl<B: Backend> EncoderRnn<B> {
    /// tokens: `[1, len]` -> (outputs `[len, H]`, last hidden `[1, H]`)
    pub fn forward(&self, tokens: Tensor<B, 2, Int>, state: Option<Tensor<B, 2>>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let [_, len] = tokens.dims();
        let h        = self.hidden_size;

        let embedded = self.embedding.forward(tokens);          // [1, len, H]
        let outputs  = self.gru.forward(embedded, state);       // [1, len, H]
        let outputs  = outputs.reshape([len, h]);
        let hidden   = outputs.clone().slice([len - 1..len, 0..h]);
        (outputs, hidden)
    }
}

// ─── Decoder ─────────────────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct AttnDecoderRnn<B: Backend> {
    pub embedding:    Embedding<B>,
    pub dropout:      Dropout,
    pub attn_query:   Linear<B>,
    pub attn_key:     Linear<B>,
    pub attn_score:   Linear<B>,
    pub attn_combine: Linear<B>,
    pub gru:          Gru<B>,
    pub out:          Linear<B>,
    pub hidden_size:  usize,
}

pub struct DecoderOutput<B: Backend> {
    /// `[1, V]` unnormalised scores over the output vocabulary
    pub logits:    Tensor<B, 2>,
    /// `[1, H]`
    pub hidden:    Tensor<B, 2>,
    /// `[1, L]` weights over source positions, sums to 1
    pub attention: Tensor<B, 2>,
}

impl<B: Backend> AttnDecoderRnn<B> {
    /// token `[1, 1]`, hidden `[1, H]`, encoder_outputs `[L, H]`, mask `[1, L]`
    pub fn forward(
        &self,
        token:           Tensor<B, 2, Int>,
        hidden:          Tensor<B, 2>,
        encoder_outputs: Tensor<B, 2>,
        mask:            Tensor<B, 2>,
    ) -> DecoderOutput<B> {
        let h      = self.hidden_size;
        let [l, _] = encoder_outputs.dims();

        let embedded = self.dropout.forward(self.embedding.forward(token)).reshape([1, h]);

        // additive attention
        let query  = self.attn_query.forward(hidden.clone());             // [1, H]
        let keys   = self.attn_key.forward(encoder_outputs.clone());      // [L, H]
        let energy = (keys + query).tanh();
        let scores = self.attn_score.forward(energy).reshape([1, l]) + mask;
        let attention = softmax(scores, 1);
        let context   = attention.clone().matmul(encoder_outputs);         // [1, H]

        let x = relu(self.attn_combine.forward(Tensor::cat(vec![embedded, context], 1)));
        let hidden = self.gru
            .forward(x.reshape([1, 1, h]), Some(hidden))
            .reshape([1, h]);
        let logits = self.out.forward(hidden.clone());

        DecoderOutput { logits, hidden, attention }
    }
}

// ─── Full model ──────────────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct Seq2Seq<B: Backend> {
    pub encoder:    EncoderRnn<B>,
    pub decoder:    AttnDecoderRnn<B>,
    pub max_length: usize,
}

/// Encoder state handed to every decoder step.
pub struct SourceMemory<B: Backend> {
    /// `[max_length, H]`, zero rows past the source length
    pub outputs: Tensor<B, 2>,
    /// `[1, H]` decoder start state
    pub hidden:  Tensor<B, 2>,
    /// `[1, max_length]`, 0 on real positions
    pub mask:    Tensor<B, 2>,
    pub len:     usize,
}

impl<B: Backend> Seq2Seq<B> {
    /// Run the encoder over `[1, len]` source indices, `len <= max_length`.
    pub fn encode_source(&self, source: Tensor<B, 2, Int>) -> SourceMemory<B> {
        let device   = source.device();
        let [_, len] = source.dims();
        let h        = self.encoder.hidden_size;
        let max      = self.max_length.max(len);

        let (outputs, hidden) = self.encoder.forward(source, None);
        let outputs = if len < max {
            Tensor::cat(vec![outputs, Tensor::zeros([max - len, h], &device)], 0)
        } else {
            outputs
        };

        let mask: Vec<f32> = (0..max).map(|i| if i < len { 0.0 } else { MASKED }).collect();
        let mask = Tensor::from_data(TensorData::new(mask, [1, max]), &device);

        SourceMemory { outputs, hidden, mask, len }
    }

    pub fn decode_step(&self, token: usize, hidden: Tensor<B, 2>, memory: &SourceMemory<B>) -> DecoderOutput<B> {
        let token = index_tensor(&[token], &hidden.device());
        self.decoder.forward(token, hidden, memory.outputs.clone(), memory.mask.clone())
    }

    /// Decode `source` against a known `target`. Returns the summed
    /// cross-entropy of the steps taken and the guess of each step.
    ///
    /// With teacher forcing every target token is fed back and all
    /// `target.len()` steps run. Free-running, the guess is fed back
    /// and decoding stops on the first EOS guess.
    pub fn decode_with_target(
        &self,
        source:          Tensor<B, 2, Int>,
        target:          &[usize],
        teacher_forcing: bool,
    ) -> (Tensor<B, 1>, Vec<usize>) {
        let device = source.device();
        let ce     = CrossEntropyLossConfig::new().init(&device);
        let memory = self.encode_source(source);

        let mut hidden    = memory.hidden.clone();
        let mut token     = SOS_TOKEN;
        let mut losses    = Vec::with_capacity(target.len());
        let mut predicted = Vec::with_capacity(target.len());

        for &expected in target {
            let out   = self.decode_step(token, hidden, &memory);
            let guess = top_index(out.logits.clone());
            losses.push(ce.forward(out.logits, target_tensor(expected, &device)));
            predicted.push(guess);
            hidden = out.hidden;

            if teacher_forcing {
                token = expected;
            } else {
                if guess == EOS_TOKEN {
                    break;
                }
                token = guess;
            }
        }

        (Tensor::cat(losses, 0).sum(), predicted)
    }
}

/// One Bernoulli draw per iteration: true with probability `ratio`.
pub fn use_teacher_forcing<R: Rng + ?Sized>(rng: &mut R, ratio: f64) -> bool {
    rng.gen::<f64>() < ratio
}

// ─── Learner ─────────────────────────────────────────────────────────────────
/// Seq2Seq + optimiser with per-iteration teacher forcing.
pub struct Seq2SeqLearner<'a, B: AutodiffBackend, O> {
    model:                  Seq2Seq<B>,
    optim:                  O,
    lr:                     f64,
    teacher_forcing_ratio:  f64,
    batcher:                PairBatcher<'a, B>,
    output_vocab:           &'a Vocabulary,
}

impl<'a, B, O> Seq2SeqLearner<'a, B, O>
where
    B: AutodiffBackend,
    O: Optimizer<Seq2Seq<B>, B>,
{
    pub fn new(
        model:                 Seq2Seq<B>,
        optim:                 O,
        lr:                    f64,
        teacher_forcing_ratio: f64,
        batcher:               PairBatcher<'a, B>,
        output_vocab:          &'a Vocabulary,
    ) -> Self {
        Self { model, optim, lr, teacher_forcing_ratio, batcher, output_vocab }
    }

    pub fn valid_model(&self) -> Seq2Seq<B::InnerBackend> {
        self.model.valid()
    }
}

/// Words for a decoded index sequence, EOS dropped.
pub fn render_words(vocab: &Vocabulary, ids: &[usize]) -> String {
    ids.iter()
        .filter(|&&id| id != EOS_TOKEN)
        .filter_map(|&id| vocab.word(id))
        .collect::<Vec<_>>()
        .join(" ")
}

impl<B, O> Learner for Seq2SeqLearner<'_, B, O>
where
    B: AutodiffBackend,
    O: Optimizer<Seq2Seq<B>, B>,
{
    type Example = SentencePair;
    type Encoded = PairBatch<B>;

    fn encode(&self, pair: &SentencePair) -> Result<PairBatch<B>> {
        Ok(self.batcher.batch(pair)?)
    }

    fn step<R: Rng + ?Sized>(&mut self, batch: &PairBatch<B>, rng: &mut R) -> Result<StepOutcome> {
        let teacher_forcing   = use_teacher_forcing(rng, self.teacher_forcing_ratio);
        let (loss, predicted) = self.model.decode_with_target(batch.input.clone(), &batch.target, teacher_forcing);
        let target_len        = batch.target.len().max(1) as f64;
        let loss_sum: f64     = loss.clone().into_scalar().elem::<f64>();

        let grads  = GradientsParams::from_grads(loss.backward(), &self.model);
        self.model = self.optim.step(self.lr, self.model.clone(), grads);

        Ok(StepOutcome {
            loss:       loss_sum / target_len,
            prediction: render_words(self.output_vocab, &predicted),
        })
    }
}

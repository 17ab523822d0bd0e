// ============================================================
// Layer 5 - Character RNN Classifier
// ============================================================
// A single recurrent cell made of two linear maps that both read
// the current letter concatenated with the previous hidden state:
//
//   combined = [letter_t ; hidden_{t-1}]        [1, 57 + H]
//   hidden_t = i2h(combined)                    [1, H]
//   logits_t = i2o(combined)                    [1, n_categories]
//
// The name is fed letter by letter; only the logits after the
// last letter are scored. Cross-entropy on the logits is the
// log-softmax + negative log-likelihood pair of the classic
// formulation.

use anyhow::Result;
use burn::{
    module::AutodiffModule,
    nn::{loss::CrossEntropyLossConfig, Linear, LinearConfig},
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::Rng;

use crate::data::batcher::{top_index, NameBatch, NameBatcher};
use crate::domain::category::{CategorySet, NameExample};
use crate::domain::traits::{Learner, StepOutcome};

#[derive(Config, Debug)]
pub struct CharRnnConfig {
    pub input_size:  usize,
    pub hidden_size: usize,
    pub output_size: usize,
}

impl CharRnnConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> CharRnn<B> {
        let combined = self.input_size + self.hidden_size;
        CharRnn {
            i2h: LinearConfig::new(combined, self.hidden_size).init(device),
            i2o: LinearConfig::new(combined, self.output_size).init(device),
            hidden_size: self.hidden_size,
        }
    }
}

#[derive(Module, Debug)]
pub struct CharRnn<B: Backend> {
    pub i2h:         Linear<B>,
    pub i2o:         Linear<B>,
    pub hidden_size: usize,
}

impl<B: Backend> CharRnn<B> {
    pub fn init_hidden(&self, device: &B::Device) -> Tensor<B, 2> {
        Tensor::zeros([1, self.hidden_size], device)
    }

    /// One letter: `[1, 57]` input, `[1, H]` hidden -> (logits, next hidden).
    pub fn forward(&self, input: Tensor<B, 2>, hidden: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let combined = Tensor::cat(vec![input, hidden], 1);
        let hidden   = self.i2h.forward(combined.clone());
        let logits   = self.i2o.forward(combined);
        (logits, hidden)
    }

    /// Run a whole `[len, 57]` name and return the final logits `[1, C]`.
    /// `len` must be at least 1.
    pub fn forward_line(&self, line: Tensor<B, 2>) -> Tensor<B, 2> {
        let [len, width] = line.dims();
        let device       = line.device();

        let (mut logits, mut hidden) = self.forward(
            line.clone().slice([0..1, 0..width]),
            self.init_hidden(&device),
        );
        for i in 1..len {
            let (out, next) = self.forward(line.clone().slice([i..i + 1, 0..width]), hidden);
            logits = out;
            hidden = next;
        }
        logits
    }

    /// Cross-entropy of the final logits against `target` (`[1]`).
    pub fn forward_loss(&self, line: Tensor<B, 2>, target: Tensor<B, 1, Int>) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward_line(line);
        let ce     = CrossEntropyLossConfig::new().init(&logits.device());
        (ce.forward(logits.clone(), target), logits)
    }
}

// ─── Learner ─────────────────────────────────────────────────────────────────
/// CharRnn + optimiser, driven by the training loop.
pub struct CharRnnLearner<'a, B: AutodiffBackend, O> {
    model:      CharRnn<B>,
    optim:      O,
    lr:         f64,
    batcher:    NameBatcher<B>,
    categories: &'a CategorySet,
}

impl<'a, B, O> CharRnnLearner<'a, B, O>
where
    B: AutodiffBackend,
    O: Optimizer<CharRnn<B>, B>,
{
    pub fn new(model: CharRnn<B>, optim: O, lr: f64, device: B::Device, categories: &'a CategorySet) -> Self {
        Self {
            model,
            optim,
            lr,
            batcher: NameBatcher::new(device),
            categories,
        }
    }

    /// The trained weights on the inference backend.
    pub fn valid_model(&self) -> CharRnn<B::InnerBackend> {
        self.model.valid()
    }
}

impl<B, O> Learner for CharRnnLearner<'_, B, O>
where
    B: AutodiffBackend,
    O: Optimizer<CharRnn<B>, B>,
{
    type Example = NameExample;
    type Encoded = NameBatch<B>;

    fn encode(&self, example: &NameExample) -> Result<NameBatch<B>> {
        Ok(self.batcher.batch(example)?)
    }

    fn step<R: Rng + ?Sized>(&mut self, batch: &NameBatch<B>, _rng: &mut R) -> Result<StepOutcome> {
        let (loss, logits) = self.model.forward_loss(batch.line.clone(), batch.category.clone());
        let loss_val: f64  = loss.clone().into_scalar().elem::<f64>();
        let guess          = top_index(logits);

        // Backward pass + parameter update
        let grads  = GradientsParams::from_grads(loss.backward(), &self.model);
        self.model = self.optim.step(self.lr, self.model.clone(), grads);

        Ok(StepOutcome {
            loss:       loss_val,
            prediction: self.categories.category(guess)?.to_string(),
        })
    }
}

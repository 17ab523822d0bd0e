// ============================================================
// Layer 4 - Tensor Batchers
// ============================================================
// Turn encoded examples into Burn tensors, and read model
// outputs back into plain Rust values.
//
// Both pipelines train on one example at a time, so a "batch"
// here is a single sequence:
//
//   NameBatch:  line     [len, 57]   one-hot rows
//               category [1]         target class index
//
//   PairBatch:  input    [1, len]    word indices + EOS
//               target   Vec<usize>  word indices + EOS
//
// The decoder consumes the target one token at a time, so it
// stays a Vec and each step builds its own [1] tensor.
//
// B is the Burn Backend, so the same batcher serves the
// autodiff training backend and the plain inference backend.

use burn::prelude::*;

use crate::data::alphabet::{Alphabet, N_LETTERS};
use crate::data::vocabulary::Vocabulary;
use crate::domain::category::NameExample;
use crate::domain::error::NlpError;
use crate::domain::sentence_pair::SentencePair;

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// `[1, ids.len()]` Int tensor of word indices.
pub fn index_tensor<B: Backend>(ids: &[usize], device: &B::Device) -> Tensor<B, 2, Int> {
    let data: Vec<i64> = ids.iter().map(|&i| i as i64).collect();
    Tensor::from_data(TensorData::new(data, [1, ids.len()]), device)
}

/// `[1]` Int tensor holding one class or word index.
pub fn target_tensor<B: Backend>(index: usize, device: &B::Device) -> Tensor<B, 1, Int> {
    Tensor::from_data(TensorData::new(vec![index as i64], [1]), device)
}

/// Index of the largest value of a `[1, n]` row.
pub fn top_index<B: Backend>(row: Tensor<B, 2>) -> usize {
    row.argmax(1).into_scalar().elem::<i64>() as usize
}

/// Copy a `[1, n]` row back to the host.
pub fn read_row<B: Backend>(row: Tensor<B, 2>) -> Vec<f32> {
    row.into_data().iter::<f32>().collect()
}

// ─── Names ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NameBatch<B: Backend> {
    /// One-hot letters, shape `[len, N_LETTERS]`
    pub line: Tensor<B, 2>,
    /// Ground-truth category, shape `[1]`
    pub category: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct NameBatcher<B: Backend> {
    device: B::Device,
}

impl<B: Backend> NameBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// `[len, N_LETTERS]` one-hot matrix for a name.
    pub fn line_tensor(&self, line: &str) -> Result<Tensor<B, 2>, NlpError> {
        let flat = Alphabet::line_to_one_hot(line)?;
        let len  = flat.len() / N_LETTERS;
        Ok(Tensor::from_data(TensorData::new(flat, [len, N_LETTERS]), &self.device))
    }

    pub fn batch(&self, example: &NameExample) -> Result<NameBatch<B>, NlpError> {
        Ok(NameBatch {
            line:     self.line_tensor(&example.name)?,
            category: target_tensor(example.category_index, &self.device),
        })
    }
}

// ─── Sentence pairs ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PairBatch<B: Backend> {
    /// Source indices with EOS, shape `[1, len]`
    pub input: Tensor<B, 2, Int>,
    /// Target indices with EOS
    pub target: Vec<usize>,
}

/// Encodes pairs with the two closed vocabularies.
#[derive(Clone, Debug)]
pub struct PairBatcher<'a, B: Backend> {
    input_vocab:  &'a Vocabulary,
    output_vocab: &'a Vocabulary,
    max_length:   usize,
    device:       B::Device,
}

impl<'a, B: Backend> PairBatcher<'a, B> {
    pub fn new(
        input_vocab:  &'a Vocabulary,
        output_vocab: &'a Vocabulary,
        max_length:   usize,
        device:       B::Device,
    ) -> Self {
        Self { input_vocab, output_vocab, max_length, device }
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Encode a source sentence. The encoder memory holds
    /// `max_length` positions, so longer inputs are rejected.
    pub fn source_tensor(&self, sentence: &str) -> Result<Tensor<B, 2, Int>, NlpError> {
        let ids = self.input_vocab.encode(sentence)?;
        if ids.len() > self.max_length {
            return Err(NlpError::SequenceTooLong { len: ids.len(), max: self.max_length });
        }
        Ok(index_tensor(&ids, &self.device))
    }

    pub fn batch(&self, pair: &SentencePair) -> Result<PairBatch<B>, NlpError> {
        Ok(PairBatch {
            input:  self.source_tensor(&pair.input)?,
            target: self.output_vocab.encode(&pair.output)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::data::vocabulary::EOS_TOKEN;

    type TestBackend = NdArray;

    #[test]
    fn test_name_batch_shapes() {
        let batcher = NameBatcher::<TestBackend>::new(Default::default());
        let batch   = batcher.batch(&NameExample::new(3, "korean", "Kim")).unwrap();

        assert_eq!(batch.line.dims(), [3, N_LETTERS]);
        assert_eq!(batch.category.into_scalar().elem::<i64>(), 3);
        let total: f32 = batch.line.sum().into_scalar().elem();
        assert_eq!(total, 3.0);
    }

    #[test]
    fn test_name_batch_rejects_empty() {
        let batcher = NameBatcher::<TestBackend>::new(Default::default());
        assert!(batcher.batch(&NameExample::new(0, "x", "")).is_err());
    }

    #[test]
    fn test_pair_batch_terminated_with_eos() {
        let mut fra = Vocabulary::new("fra");
        let mut eng = Vocabulary::new("eng");
        fra.add_sentence("je suis froid .");
        eng.add_sentence("i am cold .");

        let batcher = PairBatcher::<TestBackend>::new(&fra, &eng, 10, Default::default());
        let batch   = batcher.batch(&SentencePair::new("je suis froid .", "i am cold .")).unwrap();

        assert_eq!(batch.input.dims(), [1, 5]);
        assert_eq!(batch.target.len(), 5);
        assert_eq!(*batch.target.last().unwrap(), EOS_TOKEN);
    }

    #[test]
    fn test_pair_batch_length_cap() {
        let mut fra = Vocabulary::new("fra");
        let eng     = Vocabulary::new("eng");
        fra.add_sentence("a b c");

        let batcher = PairBatcher::<TestBackend>::new(&fra, &eng, 3, Default::default());
        // three words + EOS = 4 > 3
        assert!(matches!(
            batcher.source_tensor("a b c"),
            Err(NlpError::SequenceTooLong { len: 4, max: 3 })
        ));
        assert!(batcher.source_tensor("a b").is_ok());
    }

    #[test]
    fn test_top_index_and_read_row() {
        let device = Default::default();
        let row = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![0.1f32, 0.7, 0.2], [1, 3]),
            &device,
        );
        assert_eq!(top_index(row.clone()), 1);
        assert_eq!(read_row(row), vec![0.1, 0.7, 0.2]);
    }
}

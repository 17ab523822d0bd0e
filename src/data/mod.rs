// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything between the raw corpus files and the integer /
// one-hot sequences the models consume.
//
//   names/*.txt            eng-fra.txt
//       │                      │
//       ▼                      ▼
//   NameNormalizer         SentenceNormalizer
//       │                      │
//       ▼                      ▼
//   NamesLoader            PairLoader + PairFilter
//       │                      │
//       ▼                      ▼
//   CategorySet            Vocabulary (input / output)
//       │                      │
//       ▼                      ▼
//   Alphabet::one_hot      Vocabulary::encode
//       │                      │
//       └──── Sampler ─────────┘
//                │
//                ▼
//          training loop (Layer 5)

/// Unicode canonicalisation for names and sentences
pub mod normalizer;

/// Reads the names directory and the bilingual corpus
pub mod loader;

/// Fixed 57-letter alphabet and one-hot encoding
pub mod alphabet;

/// Append-only word <-> index mapping with SOS/EOS markers
pub mod vocabulary;

/// Random example selection with replacement
pub mod sampler;

/// Burn tensors in and out of the models
pub mod batcher;

// ============================================================
// Layer 6 - Checkpoint Manager
// ============================================================
// Everything a trained pipeline leaves in its output directory:
//
//   out/
//     names_config.json        ← hyperparameters (names pipeline)
//     categories.json          ← CategorySet, label order included
//     char_rnn.mpk             ← CharRnn weights
//
//     translator_config.json   ← hyperparameters (translator)
//     input_vocab.json         ← source Vocabulary
//     output_vocab.json        ← target Vocabulary
//     seq2seq.mpk              ← Seq2Seq weights
//
// Weights go through Burn's CompactRecorder (MessagePack, half
// precision). Everything else is pretty-printed JSON. Loading a
// record into a model built from a different config fails.

use anyhow::{Context, Result};
use burn::{prelude::*, record::CompactRecorder};
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, path::PathBuf};

/// Reads and writes the artifacts of one output directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it does not exist yet.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// For reading only; the directory must already hold a trained run.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            anyhow::bail!(
                "Output directory '{}' does not exist. Have you trained a model first?",
                dir.display()
            );
        }
        Ok(Self { dir })
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Save weights as `{dir}/{name}.mpk` (the recorder adds the extension).
    pub fn save_model<B: Backend, M: Module<B>>(&self, model: &M, name: &str) -> Result<()> {
        let path = self.path(name);
        model
            .clone()
            .save_file(path.clone(), &CompactRecorder::new())
            .with_context(|| format!("Failed to save model to '{}'", path.display()))?;

        tracing::debug!("Saved model weights to '{}'", path.display());
        Ok(())
    }

    /// Restore weights into a freshly initialised `model`.
    pub fn load_model<B: Backend, M: Module<B>>(&self, model: M, name: &str, device: &B::Device) -> Result<M> {
        let path = self.path(name);
        let model = model
            .load_file(path.clone(), &CompactRecorder::new(), device)
            .with_context(|| {
                format!("Cannot load model '{}'. Have you trained it first?", path.display())
            })?;

        tracing::debug!("Loaded model weights from '{}'", path.display());
        Ok(model)
    }

    pub fn save_json<T: Serialize>(&self, value: &T, file_name: &str) -> Result<()> {
        let path = self.path(file_name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;

        tracing::debug!("Saved '{}'", path.display());
        Ok(())
    }

    pub fn load_json<T: DeserializeOwned>(&self, file_name: &str) -> Result<T> {
        let path = self.path(file_name);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'. Have you trained a model first?", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed JSON in '{}'", path.display()))
    }
}

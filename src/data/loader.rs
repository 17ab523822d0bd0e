// ============================================================
// Layer 4 - Corpus Loaders
// ============================================================
// Read the two static corpora from disk.
//
// Names corpus (classifier):
//   data/names/
//     Arabic.txt      one name per line
//     Chinese.txt
//     ...
//   The file stem is the category label. Files are visited in
//   sorted order so category indices are the same on every
//   platform.
//
// Bilingual corpus (translation):
//   data/eng-fra.txt
//     Go.<TAB>Va !
//     Run!<TAB>Cours !
//   One pair per line, split on the first tab. With `reverse`
//   the second column becomes the input side.
//
// Unlike a best-effort document crawler, these loaders fail
// hard: a missing file or a line without a tab aborts the run.
// The corpus is a prerequisite, not user input.

use anyhow::{bail, Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::data::normalizer::{NameNormalizer, SentenceNormalizer};
use crate::data::vocabulary::Vocabulary;
use crate::domain::category::CategorySet;
use crate::domain::error::NlpError;
use crate::domain::sentence_pair::SentencePair;
use crate::domain::traits::CorpusSource;

// ─── NamesLoader ─────────────────────────────────────────────────────────────
/// Loads one category per `.txt` file in a directory.
pub struct NamesLoader {
    dir: PathBuf,
}

impl NamesLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// All `.txt` files of the directory, sorted by file name.
    fn category_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot read names directory '{}'", self.dir.display()))?
        {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("txt") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl CorpusSource for NamesLoader {
    type Corpus = CategorySet;

    fn load(&self) -> Result<CategorySet> {
        let files = self.category_files()?;
        if files.is_empty() {
            bail!("No .txt category files found in '{}'", self.dir.display());
        }

        let normalizer = NameNormalizer::new();
        let mut set    = CategorySet::new();

        for path in files {
            let category = path
                .file_stem()
                .and_then(|s| s.to_str())
                .with_context(|| format!("Invalid category file name '{}'", path.display()))?
                .to_string();

            let lines = read_normalized_lines(&path, |line| normalizer.normalize(line))?;
            tracing::debug!("Category '{}': {} names", category, lines.len());
            set.insert(category, lines);
        }

        tracing::info!(
            "Loaded {} categories, {} names",
            set.len(),
            set.example_count()
        );
        Ok(set)
    }
}

/// Read a UTF-8 file, normalise every line and keep the ones with
/// something other than spaces left.
fn read_normalized_lines<F>(path: &Path, normalize: F) -> Result<Vec<String>>
where
    F: Fn(&str) -> Result<String, NlpError>,
{
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;

    let mut lines = Vec::new();
    for line in text.lines() {
        let clean = normalize(line)?;
        if !clean.trim().is_empty() {
            lines.push(clean);
        }
    }
    Ok(lines)
}

// ─── PairLoader ──────────────────────────────────────────────────────────────
/// Loads `<lang1>-<lang2>.txt` from a data directory.
pub struct PairLoader {
    path:    PathBuf,
    reverse: bool,
}

impl PairLoader {
    pub fn new(data_dir: impl AsRef<Path>, lang1: &str, lang2: &str, reverse: bool) -> Self {
        Self {
            path: data_dir.as_ref().join(format!("{lang1}-{lang2}.txt")),
            reverse,
        }
    }
}

impl CorpusSource for PairLoader {
    type Corpus = Vec<SentencePair>;

    fn load(&self) -> Result<Vec<SentencePair>> {
        tracing::info!("Reading lines from '{}'", self.path.display());
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read bilingual corpus '{}'", self.path.display()))?;

        let normalizer = SentenceNormalizer::new();
        let mut pairs  = Vec::new();

        for (i, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            // Extra columns (attribution etc.) after the second are ignored
            let (first, rest) = line.split_once('\t').ok_or_else(|| NlpError::MalformedPair {
                path: self.path.display().to_string(),
                line: i + 1,
            })?;
            let second = rest.split('\t').next().unwrap_or_default();

            let pair = SentencePair::new(normalizer.normalize(first)?, normalizer.normalize(second)?);
            pairs.push(if self.reverse { pair.reversed() } else { pair });
        }

        Ok(pairs)
    }
}

// ─── PairFilter ──────────────────────────────────────────────────────────────
/// Output-side prefixes a pair must start with to be kept. With the
/// corpus reversed these are English sentences about a person.
pub const ENG_PREFIXES: [&str; 12] = [
    "i am ", "i m ",
    "he is", "he s ",
    "she is", "she s",
    "you are", "you re ",
    "we are", "we re ",
    "they are", "they re ",
];

/// Keeps short pairs whose output side starts with an allowed prefix.
pub struct PairFilter {
    max_length: usize,
    prefixes:   Vec<String>,
}

impl PairFilter {
    pub fn new(max_length: usize) -> Self {
        Self::with_prefixes(max_length, ENG_PREFIXES.iter().map(|p| p.to_string()).collect())
    }

    pub fn with_prefixes(max_length: usize, prefixes: Vec<String>) -> Self {
        Self { max_length, prefixes }
    }

    /// Both sides shorter than `max_length` tokens, output prefix allowed.
    pub fn keeps(&self, pair: &SentencePair) -> bool {
        pair.input_len() < self.max_length
            && pair.output_len() < self.max_length
            && self.prefixes.iter().any(|p| pair.output.starts_with(p.as_str()))
    }

    pub fn filter(&self, pairs: Vec<SentencePair>) -> Vec<SentencePair> {
        pairs.into_iter().filter(|p| self.keeps(p)).collect()
    }
}

// ─── prepare_data ────────────────────────────────────────────────────────────
/// The translation corpus with both vocabularies built.
#[derive(Debug, Clone)]
pub struct PreparedCorpus {
    pub input_vocab:  Vocabulary,
    pub output_vocab: Vocabulary,
    pub pairs:        Vec<SentencePair>,
}

/// Read, optionally reverse, filter, then count words on both sides.
pub fn prepare_data(
    data_dir:   impl AsRef<Path>,
    lang1:      &str,
    lang2:      &str,
    reverse:    bool,
    max_length: usize,
) -> Result<PreparedCorpus> {
    let loader = PairLoader::new(data_dir, lang1, lang2, reverse);
    let pairs  = loader.load()?;
    tracing::info!("Read {} sentence pairs", pairs.len());

    let pairs = PairFilter::new(max_length).filter(pairs);
    tracing::info!("Trimmed to {} sentence pairs", pairs.len());

    let (input_name, output_name) = if reverse { (lang2, lang1) } else { (lang1, lang2) };
    let mut input_vocab  = Vocabulary::new(input_name);
    let mut output_vocab = Vocabulary::new(output_name);
    for pair in &pairs {
        input_vocab.add_sentence(&pair.input);
        output_vocab.add_sentence(&pair.output);
    }
    tracing::info!(
        "Counted words: {} {}, {} {}",
        input_vocab.name(), input_vocab.len(),
        output_vocab.name(), output_vocab.len()
    );

    Ok(PreparedCorpus { input_vocab, output_vocab, pairs })
}

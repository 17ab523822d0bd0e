// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Four subcommands, two per pipeline:
//
//   train-names       -> TrainNamesUseCase
//   predict-name      -> PredictNameUseCase
//   train-translator  -> TrainTranslatorUseCase
//   translate         -> TranslateUseCase
//
// Training args convert into the application configs through
// `From`, so the application layer never sees clap types.

use clap::{Args, Subcommand};

use crate::application::names_use_case::NamesConfig;
use crate::application::translate_use_case::TranslatorConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the character-level name classifier
    TrainNames(TrainNamesArgs),

    /// Predict the language of origin of a name
    PredictName(PredictNameArgs),

    /// Train the attention translator
    TrainTranslator(TrainTranslatorArgs),

    /// Translate one sentence with a trained translator
    Translate(TranslateArgs),
}

// ─── Names ───────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct TrainNamesArgs {
    /// Directory with one <language>.txt file of names per category
    #[arg(long, default_value = "data/names")]
    pub data_dir: String,

    /// Where weights, config and CSV diagnostics are written
    #[arg(long, default_value = "out/names")]
    pub output_dir: String,

    #[arg(long, default_value_t = 100_000)]
    pub iters: usize,

    #[arg(long, default_value_t = 5_000)]
    pub print_every: usize,

    /// Iterations averaged into one loss curve point
    #[arg(long, default_value_t = 1_000)]
    pub plot_every: usize,

    /// SGD step size
    #[arg(long, default_value_t = 0.005)]
    pub lr: f64,

    #[arg(long, default_value_t = 128)]
    pub hidden_size: usize,

    /// Pick a category uniformly before picking a name
    #[arg(long)]
    pub balanced: bool,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Examples classified for the confusion matrix (0 to skip)
    #[arg(long, default_value_t = 10_000)]
    pub confusion_samples: usize,
}

impl From<TrainNamesArgs> for NamesConfig {
    fn from(a: TrainNamesArgs) -> Self {
        NamesConfig {
            data_dir:          a.data_dir,
            output_dir:        a.output_dir,
            n_iters:           a.iters,
            print_every:       a.print_every,
            plot_every:        a.plot_every,
            learning_rate:     a.lr,
            hidden_size:       a.hidden_size,
            balanced:          a.balanced,
            seed:              a.seed,
            confusion_samples: a.confusion_samples,
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictNameArgs {
    /// The name to classify
    #[arg(long)]
    pub name: String,

    /// Number of guesses to print
    #[arg(long, default_value_t = 3)]
    pub top: usize,

    /// Output directory of a previous `train-names` run
    #[arg(long, default_value = "out/names")]
    pub output_dir: String,
}

// ─── Translator ──────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct TrainTranslatorArgs {
    /// Directory holding <lang1>-<lang2>.txt
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    #[arg(long, default_value = "out/translator")]
    pub output_dir: String,

    #[arg(long, default_value = "eng")]
    pub lang1: String,

    #[arg(long, default_value = "fra")]
    pub lang2: String,

    /// Translate lang2 into lang1 (default). Pass --reverse=false for lang1 into lang2
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub reverse: bool,

    /// Pairs with this many tokens or more on either side are dropped
    #[arg(long, default_value_t = 10)]
    pub max_length: usize,

    #[arg(long, default_value_t = 75_000)]
    pub iters: usize,

    #[arg(long, default_value_t = 5_000)]
    pub print_every: usize,

    #[arg(long, default_value_t = 100)]
    pub plot_every: usize,

    #[arg(long, default_value_t = 0.01)]
    pub lr: f64,

    #[arg(long, default_value_t = 256)]
    pub hidden_size: usize,

    /// Dropout on the decoder embedding
    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Probability of feeding the ground truth token to the decoder
    #[arg(long, default_value_t = 0.5)]
    pub teacher_forcing_ratio: f64,

    /// Random pairs translated after training
    #[arg(long, default_value_t = 10)]
    pub eval_samples: usize,

    /// Sentence whose attention heatmap is saved (repeatable)
    #[arg(long = "show-attention")]
    pub show_attention: Vec<String>,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl From<TrainTranslatorArgs> for TranslatorConfig {
    fn from(a: TrainTranslatorArgs) -> Self {
        TranslatorConfig {
            data_dir:              a.data_dir,
            output_dir:            a.output_dir,
            lang1:                 a.lang1,
            lang2:                 a.lang2,
            reverse:               a.reverse,
            max_length:            a.max_length,
            n_iters:               a.iters,
            print_every:           a.print_every,
            plot_every:            a.plot_every,
            learning_rate:         a.lr,
            hidden_size:           a.hidden_size,
            dropout:               a.dropout,
            teacher_forcing_ratio: a.teacher_forcing_ratio,
            eval_samples:          a.eval_samples,
            show_attention:        a.show_attention,
            seed:                  a.seed,
        }
    }
}

#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// Sentence in the trained input language
    #[arg(long)]
    pub sentence: String,

    /// Output directory of a previous `train-translator` run
    #[arg(long, default_value = "out/translator")]
    pub output_dir: String,

    /// Also print the attention matrix
    #[arg(long)]
    pub attention: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_names_defaults() {
        let cli = Cli::parse_from(["rnn-nlp", "train-names", "--iters", "50", "--balanced"]);
        let Commands::TrainNames(args) = cli.command else { panic!("wrong subcommand") };
        let cfg: NamesConfig = args.into();
        assert_eq!(cfg.n_iters, 50);
        assert!(cfg.balanced);
        assert_eq!(cfg.hidden_size, 128);
    }

    #[test]
    fn test_train_translator_reverse_and_attention() {
        let cli = Cli::parse_from([
            "rnn-nlp", "train-translator",
            "--reverse", "false",
            "--show-attention", "elle a cinq ans de moins que moi .",
            "--show-attention", "je ne crains pas de mourir .",
        ]);
        let Commands::TrainTranslator(args) = cli.command else { panic!("wrong subcommand") };
        let cfg: TranslatorConfig = args.into();
        assert!(!cfg.reverse);
        assert_eq!(cfg.show_attention.len(), 2);
        assert_eq!(cfg.max_length, 10);
    }

    #[test]
    fn test_predict_requires_name() {
        assert!(Cli::try_parse_from(["rnn-nlp", "predict-name"]).is_err());
    }
}

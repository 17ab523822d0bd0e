// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes each subcommand to its
// Layer 2 use case. Results are printed here; nothing is
// computed here.

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictNameArgs, TranslateArgs};

#[derive(Parser, Debug)]
#[command(
    name = "rnn-nlp",
    version = "0.1.0",
    about = "Character RNN name classifier and attention seq2seq translator."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::TrainNames(args)      => run_train_names(args.into()),
            Commands::PredictName(args)     => run_predict_name(args),
            Commands::TrainTranslator(args) => run_train_translator(args.into()),
            Commands::Translate(args)       => run_translate(args),
        }
    }
}

fn run_train_names(cfg: crate::application::names_use_case::NamesConfig) -> Result<()> {
    use crate::application::names_use_case::TrainNamesUseCase;

    tracing::info!("Training name classifier on '{}'", cfg.data_dir);
    let output_dir = cfg.output_dir.clone();
    let summary    = TrainNamesUseCase::new(cfg).execute()?;

    println!(
        "Trained on {} names in {} categories ({} iterations).",
        summary.examples, summary.categories, summary.report.iterations,
    );
    if let Some(acc) = summary.accuracy {
        println!("Sampled accuracy: {:.1}%", acc * 100.0);
    }
    println!("Artifacts saved to '{}'.", output_dir);
    Ok(())
}

fn run_predict_name(args: PredictNameArgs) -> Result<()> {
    use crate::application::names_use_case::PredictNameUseCase;

    let use_case = PredictNameUseCase::new(&args.output_dir)?;
    println!("\n> {}", args.name);
    for p in use_case.predict(&args.name, args.top)? {
        println!("({:.2}) {}", p.log_prob, p.category);
    }
    Ok(())
}

fn run_train_translator(cfg: crate::application::translate_use_case::TranslatorConfig) -> Result<()> {
    use crate::application::translate_use_case::TrainTranslatorUseCase;

    tracing::info!("Training translator {}-{} from '{}'", cfg.lang1, cfg.lang2, cfg.data_dir);
    let output_dir = cfg.output_dir.clone();
    let summary    = TrainTranslatorUseCase::new(cfg).execute()?;

    println!(
        "Trained on {} pairs ({} input words, {} output words, {} iterations).",
        summary.pairs, summary.input_words, summary.output_words, summary.report.iterations,
    );
    println!("Artifacts saved to '{}'.", output_dir);
    Ok(())
}

fn run_translate(args: TranslateArgs) -> Result<()> {
    use crate::application::translate_use_case::TranslateUseCase;

    let use_case    = TranslateUseCase::new(&args.output_dir)?;
    let translation = use_case.translate(&args.sentence)?;

    println!("input = {}", args.sentence);
    println!("output = {}", translation.words.join(" "));
    if args.attention {
        println!("\n{}", translation.source.join("\t"));
        for row in translation.attentions.iter().take(translation.steps) {
            let cells: Vec<String> = row
                .iter()
                .take(translation.source.len())
                .map(|w| format!("{:.2}", w))
                .collect();
            println!("{}", cells.join("\t"));
        }
    }
    Ok(())
}

// ============================================================
// Layer 5 - Training Loop
// ============================================================
// Iteration-driven loop shared by both pipelines:
//
//   for iter in 1..=n_iters
//     example = sampler.sample(rng)      // with replacement
//     encoded = learner.encode(example)
//     outcome = learner.step(encoded)    // forward, loss, backward, update
//     print_total += loss                // reset every print_every
//     plot_total  += loss                // reset every plot_every
//
// Every `print_every` iterations one progress line goes to the
// console; every `plot_every` iterations the averaged window loss
// becomes one point of the loss curve.
//
// The loop only knows the Learner / ExampleSampler traits, so it
// is tested here with a counting stub instead of a Burn model.

use std::fmt;
use std::time::{Duration, Instant};

use anyhow::Result;
use rand::Rng;

use crate::domain::error::NlpError;
use crate::domain::traits::{ExampleSampler, Learner, TrainingExample};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    pub n_iters:     usize,
    pub print_every: usize,
    pub plot_every:  usize,
}

impl LoopConfig {
    pub fn new(n_iters: usize, print_every: usize, plot_every: usize) -> Self {
        Self {
            n_iters,
            print_every: print_every.max(1),
            plot_every:  plot_every.max(1),
        }
    }
}

// ─── Loss tracking ───────────────────────────────────────────────────────────

/// Two independent running totals over the per-iteration loss.
#[derive(Debug, Clone)]
pub struct LossTracker {
    print_every: usize,
    plot_every:  usize,
    print_total: f64,
    plot_total:  f64,
    plot_losses: Vec<(usize, f64)>,
}

impl LossTracker {
    pub fn new(print_every: usize, plot_every: usize) -> Self {
        Self {
            print_every: print_every.max(1),
            plot_every:  plot_every.max(1),
            print_total: 0.0,
            plot_total:  0.0,
            plot_losses: Vec::new(),
        }
    }

    /// Add one loss. Returns the window average when `iter` closes a
    /// print window.
    pub fn record(&mut self, iter: usize, loss: f64) -> Option<f64> {
        self.print_total += loss;
        self.plot_total  += loss;

        if iter % self.plot_every == 0 {
            self.plot_losses.push((iter, self.plot_total / self.plot_every as f64));
            self.plot_total = 0.0;
        }

        if iter % self.print_every == 0 {
            let avg = self.print_total / self.print_every as f64;
            self.print_total = 0.0;
            Some(avg)
        } else {
            None
        }
    }

    pub fn plot_losses(&self) -> &[(usize, f64)] {
        &self.plot_losses
    }

    pub fn into_plot_losses(self) -> Vec<(usize, f64)> {
        self.plot_losses
    }
}

// ─── Progress line ───────────────────────────────────────────────────────────

pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}m {}s", secs / 60, secs % 60)
}

/// One console report.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressLine {
    pub iter:       usize,
    pub n_iters:    usize,
    pub elapsed:    String,
    pub loss:       f64,
    pub avg_loss:   f64,
    pub input:      String,
    pub prediction: String,
    pub expected:   String,
}

impl ProgressLine {
    pub fn is_correct(&self) -> bool {
        self.prediction == self.expected
    }

    pub fn percent(&self) -> usize {
        if self.n_iters == 0 { 0 } else { self.iter * 100 / self.n_iters }
    }
}

impl fmt::Display for ProgressLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.is_correct() {
            "✓".to_string()
        } else {
            format!("✗ ({})", self.expected)
        };
        write!(
            f,
            "{} {}% ({}) loss={:.4} avg={:.4} {} / {} {}",
            self.iter, self.percent(), self.elapsed,
            self.loss, self.avg_loss,
            self.input, self.prediction, marker,
        )
    }
}

// ─── Loop ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub iterations:  usize,
    /// `(iteration, window average)` per plot window
    pub plot_losses: Vec<(usize, f64)>,
    pub elapsed:     Duration,
}

pub struct TrainingLoop {
    cfg: LoopConfig,
}

impl TrainingLoop {
    pub fn new(cfg: LoopConfig) -> Self {
        Self { cfg }
    }

    pub fn run<S, L, R>(&self, sampler: &S, learner: &mut L, rng: &mut R) -> Result<TrainingReport>
    where
        S: ExampleSampler<Item = L::Example>,
        L: Learner,
        R: Rng,
    {
        if sampler.is_empty() {
            return Err(NlpError::EmptyTrainingSet.into());
        }

        let start       = Instant::now();
        let mut tracker = LossTracker::new(self.cfg.print_every, self.cfg.plot_every);

        tracing::info!(
            "Training for {} iterations over {} examples",
            self.cfg.n_iters, sampler.len(),
        );

        for iter in 1..=self.cfg.n_iters {
            let example = sampler.sample(rng).ok_or(NlpError::EmptyTrainingSet)?;
            let encoded = learner.encode(&example)?;
            let outcome = learner.step(&encoded, rng)?;

            if let Some(avg_loss) = tracker.record(iter, outcome.loss) {
                let line = ProgressLine {
                    iter,
                    n_iters:    self.cfg.n_iters,
                    elapsed:    format_elapsed(start.elapsed()),
                    loss:       outcome.loss,
                    avg_loss,
                    input:      example.input_text().to_string(),
                    prediction: outcome.prediction,
                    expected:   example.expected().to_string(),
                };
                println!("{line}");
            }
        }

        let elapsed = start.elapsed();
        tracing::info!("Training complete in {}", format_elapsed(elapsed));

        Ok(TrainingReport {
            iterations:  self.cfg.n_iters,
            plot_losses: tracker.into_plot_losses(),
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::data::sampler::UniformSampler;
    use crate::domain::category::NameExample;
    use crate::domain::traits::StepOutcome;

    /// Always guesses "a", loss = number of letters.
    struct CountingLearner {
        steps: usize,
    }

    impl Learner for CountingLearner {
        type Example = NameExample;
        type Encoded = usize;

        fn encode(&self, example: &NameExample) -> Result<usize> {
            Ok(example.name.len())
        }

        fn step<R: Rng + ?Sized>(&mut self, encoded: &usize, _rng: &mut R) -> Result<StepOutcome> {
            self.steps += 1;
            Ok(StepOutcome { loss: *encoded as f64, prediction: "a".into() })
        }
    }

    #[test]
    fn test_loss_tracker_windows() {
        let mut t = LossTracker::new(2, 3);
        assert_eq!(t.record(1, 1.0), None);
        assert_eq!(t.record(2, 3.0), Some(2.0));
        assert_eq!(t.record(3, 5.0), None);
        assert_eq!(t.record(4, 7.0), Some(6.0));
        assert_eq!(t.plot_losses(), &[(3, 3.0)]);
    }

    #[test]
    fn test_loss_tracker_zero_intervals_clamped() {
        let mut t = LossTracker::new(0, 0);
        assert_eq!(t.record(1, 4.0), Some(4.0));
        assert_eq!(t.plot_losses().len(), 1);
    }

    #[test]
    fn test_run_steps_every_iteration() {
        let sampler = UniformSampler::new(vec![
            NameExample::new(0, "a", "Abe"),
            NameExample::new(1, "b", "Kimura"),
        ]);
        let mut learner = CountingLearner { steps: 0 };
        let mut rng     = StdRng::seed_from_u64(9);

        let report = TrainingLoop::new(LoopConfig::new(20, 5, 4))
            .run(&sampler, &mut learner, &mut rng)
            .unwrap();

        assert_eq!(learner.steps, 20);
        assert_eq!(report.iterations, 20);
        assert_eq!(report.plot_losses.len(), 5);
        for (_, avg) in &report.plot_losses {
            assert!((3.0..=6.0).contains(avg));
        }
    }

    #[test]
    fn test_run_rejects_empty_set() {
        let sampler: UniformSampler<NameExample> = UniformSampler::new(Vec::new());
        let mut learner = CountingLearner { steps: 0 };
        let mut rng     = StdRng::seed_from_u64(0);

        let err = TrainingLoop::new(LoopConfig::new(3, 1, 1))
            .run(&sampler, &mut learner, &mut rng)
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<NlpError>(), Some(NlpError::EmptyTrainingSet)));
        assert_eq!(learner.steps, 0);
    }

    #[test]
    fn test_progress_line_markers() {
        let mut line = ProgressLine {
            iter:       5000,
            n_iters:    100000,
            elapsed:    format_elapsed(Duration::from_secs(125)),
            loss:       2.5,
            avg_loss:   2.75,
            input:      "Abe".into(),
            prediction: "japanese".into(),
            expected:   "japanese".into(),
        };
        let ok = line.to_string();
        assert!(ok.starts_with("5000 5% (2m 5s)"));
        assert!(ok.ends_with("Abe / japanese ✓"));

        line.prediction = "chinese".into();
        assert!(line.to_string().ends_with("✗ (japanese)"));
    }
}

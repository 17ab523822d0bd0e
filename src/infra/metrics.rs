// ============================================================
// Layer 6 - Metrics Writer
// ============================================================
// Diagnostic CSV files written after training. They are meant
// for a spreadsheet or a plotting script, not for reloading.
//
//   loss_curve.csv      iteration,avg_loss
//                       5000,2.731204
//                       10000,2.294518
//
//   confusion.csv       actual,arabic,chinese,...
//                       arabic,0.912000,0.004000,...
//                       (rows sum to 1, empty rows stay 0)
//
//   attention_<n>.csv   output,je,suis,froid,.,<EOS>
//                       i,0.810000,0.102000,...
//                       (one row per decoded word)
//
// Labels and words are quoted when they hold a comma, a quote or a
// line break, so every row keeps the header's column count.

use anyhow::{Context, Result};
use std::{
    fs,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

/// Write one cell, quoted and escaped only when needed.
fn write_cell<W: Write>(wtr: &mut W, mut data: &[u8]) -> io::Result<()> {
    let mut output = [0; 4096];
    let mut writer = csv_core::Writer::new();
    loop {
        let (result, nin, nout) = writer.field(data, &mut output);
        wtr.write_all(&output[..nout])?;
        if result == csv_core::WriteResult::InputEmpty {
            break;
        }
        data = &data[nin..];
    }
    let (result, nout) = writer.finish(&mut output);
    if result != csv_core::WriteResult::InputEmpty {
        return Err(io::Error::new(io::ErrorKind::Other, "CSV cell did not fit the output buffer"));
    }
    wtr.write_all(&output[..nout])
}

/// Write one line: a quoted text cell then the given values.
fn write_row<W, S>(wtr: &mut W, head: &str, cells: &[S]) -> io::Result<()>
where
    W: Write,
    S: AsRef<str>,
{
    write_cell(wtr, head.as_bytes())?;
    for cell in cells {
        wtr.write_all(b",")?;
        write_cell(wtr, cell.as_ref().as_bytes())?;
    }
    wtr.write_all(b"\n")
}

// ─── Confusion matrix ────────────────────────────────────────────────────────

/// Counts of (actual category, guessed category).
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    labels: Vec<String>,
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn new(labels: Vec<String>) -> Self {
        let n = labels.len();
        Self { labels, counts: vec![vec![0; n]; n] }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Out-of-range indices are ignored.
    pub fn record(&mut self, actual: usize, guess: usize) {
        if let Some(cell) = self.counts.get_mut(actual).and_then(|row| row.get_mut(guess)) {
            *cell += 1;
        }
    }

    pub fn count(&self, actual: usize, guess: usize) -> usize {
        self.counts
            .get(actual)
            .and_then(|row| row.get(guess))
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: usize = (0..self.labels.len()).map(|i| self.counts[i][i]).sum();
        correct as f64 / total as f64
    }

    /// Each row divided by its sum.
    pub fn normalized(&self) -> Vec<Vec<f64>> {
        self.counts
            .iter()
            .map(|row| {
                let sum: usize = row.iter().sum();
                row.iter()
                    .map(|&c| if sum == 0 { 0.0 } else { c as f64 / sum as f64 })
                    .collect()
            })
            .collect()
    }
}

// ─── Writer ──────────────────────────────────────────────────────────────────

pub struct MetricsWriter {
    dir: PathBuf,
}

impl MetricsWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn create(&self, file_name: &str) -> Result<(PathBuf, BufWriter<fs::File>)> {
        let path = self.dir.join(file_name);
        let file = fs::File::create(&path)
            .with_context(|| format!("Cannot create '{}'", path.display()))?;
        Ok((path, BufWriter::new(file)))
    }

    pub fn write_loss_curve(&self, plot_losses: &[(usize, f64)]) -> Result<PathBuf> {
        let (path, mut f) = self.create("loss_curve.csv")?;
        writeln!(f, "iteration,avg_loss")?;
        for (iter, loss) in plot_losses {
            writeln!(f, "{},{:.6}", iter, loss)?;
        }
        f.flush()?;

        tracing::info!("Wrote {} loss points to '{}'", plot_losses.len(), path.display());
        Ok(path)
    }

    pub fn write_confusion(&self, matrix: &ConfusionMatrix) -> Result<PathBuf> {
        let (path, mut f) = self.create("confusion.csv")?;
        write_row(&mut f, "actual", matrix.labels())?;
        for (label, row) in matrix.labels().iter().zip(matrix.normalized()) {
            let cells: Vec<String> = row.iter().map(|v| format!("{:.6}", v)).collect();
            write_row(&mut f, label, &cells)?;
        }
        f.flush()?;

        tracing::info!(
            "Wrote confusion matrix to '{}' (accuracy {:.1}%)",
            path.display(), matrix.accuracy() * 100.0,
        );
        Ok(path)
    }

    /// Heatmap of one translation. Columns beyond the source length
    /// are dropped; they only ever hold masked padding.
    pub fn write_attention(
        &self,
        index:      usize,
        source:     &[String],
        words:      &[String],
        attentions: &[Vec<f32>],
    ) -> Result<PathBuf> {
        let (path, mut f) = self.create(&format!("attention_{index}.csv"))?;
        write_row(&mut f, "output", source)?;
        for (word, row) in words.iter().zip(attentions) {
            let cells: Vec<String> = row
                .iter()
                .take(source.len())
                .map(|w| format!("{:.6}", w))
                .collect();
            write_row(&mut f, word, &cells)?;
        }
        f.flush()?;

        tracing::debug!("Wrote attention heatmap to '{}'", path.display());
        Ok(path)
    }
}

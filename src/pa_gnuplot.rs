//! Gnuplot plot-description export
//!
//! Writes self-contained `.plt` files: terminal/output settings, labels, and
//! inline data blocks that gnuplot reads from `"-"`.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::pa_sampler::SampleSeries;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum PlotStyle {
    #[default]
    Lines,
    Points,
    LinesPoints,
}

impl fmt::Display for PlotStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlotStyle::Lines => write!(f, "lines"),
            PlotStyle::Points => write!(f, "points"),
            PlotStyle::LinesPoints => write!(f, "linespoints"),
        }
    }
}

/// A titled set of (x, y) points
#[derive(Debug, Clone, Default)]
pub struct Gnuplot2dDataset {
    title: String,
    style: PlotStyle,
    points: Vec<(f64, f64)>,
}

impl Gnuplot2dDataset {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            style: PlotStyle::default(),
            points: Vec::new(),
        }
    }

    pub fn from_series(title: impl Into<String>, series: &SampleSeries) -> Self {
        let mut dataset = Self::new(title);
        dataset.points.extend_from_slice(series.points());
        dataset
    }

    pub fn set_style(&mut self, style: PlotStyle) {
        self.style = style;
    }

    pub fn add(&mut self, x: f64, y: f64) {
        self.points.push((x, y));
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }
}

/// One plot: gnuplot settings plus the datasets it draws
#[derive(Debug, Clone)]
pub struct Gnuplot {
    output: String,
    title: String,
    terminal: String,
    x_legend: String,
    y_legend: String,
    datasets: Vec<Gnuplot2dDataset>,
}

impl Gnuplot {
    /// `output` is the image gnuplot renders to, e.g. `throughput-parf.eps`
    pub fn new(output: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            title: title.into(),
            terminal: "post eps color enhanced".to_string(),
            x_legend: String::new(),
            y_legend: String::new(),
            datasets: Vec::new(),
        }
    }

    pub fn set_terminal(&mut self, terminal: impl Into<String>) {
        self.terminal = terminal.into();
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_legend(&mut self, x_legend: impl Into<String>, y_legend: impl Into<String>) {
        self.x_legend = x_legend.into();
        self.y_legend = y_legend.into();
    }

    pub fn add_dataset(&mut self, dataset: Gnuplot2dDataset) {
        self.datasets.push(dataset);
    }

    pub fn generate_output<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "set terminal {}", self.terminal)?;
        writeln!(out, "set output \"{}\"", self.output)?;
        writeln!(out, "set title \"{}\"", self.title)?;
        writeln!(out, "set xlabel \"{}\"", self.x_legend)?;
        writeln!(out, "set ylabel \"{}\"", self.y_legend)?;

        if self.datasets.is_empty() {
            return Ok(());
        }

        let clauses: Vec<String> = self
            .datasets
            .iter()
            .map(|d| format!("\"-\"  title \"{}\" with {}", d.title, d.style))
            .collect();
        writeln!(out, "plot {}", clauses.join(", "))?;

        for dataset in &self.datasets {
            for (x, y) in &dataset.points {
                writeln!(out, "{} {}", x, y)?;
            }
            writeln!(out, "e")?;
        }
        Ok(())
    }

    /// Write the plot description to `path`
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.generate_output(&mut writer)?;
        writer.flush()
    }
}

use anyhow::Result;
use std::fmt::{self, Write};

use crate::workload::Sample;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }

    pub fn all_formats() -> &'static [OutputFormat] {
        &[OutputFormat::Text, OutputFormat::Json]
    }
}

pub fn render(samples: &[Sample], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(samples)?),
        OutputFormat::Text => Ok(render_table(samples)?),
    }
}

fn render_table(samples: &[Sample]) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "{:>9}  {:<20} {:>8} {:>9} {:>9} {:>6}  {:<8} {}",
        "elapsed", "phase", "len", "capacity", "max_size", "rings", "state", "shrunk"
    )?;
    for sample in samples {
        writeln!(
            out,
            "{:>7}ms  {:<20} {:>8} {:>9} {:>9} {:>6}  {:<8} {}",
            sample.elapsed_ms,
            sample.phase,
            sample.len,
            sample.capacity,
            sample.max_size,
            sample.rings,
            sample.state.as_str(),
            if sample.shrunk { "yes" } else { "" }
        )?;
    }
    Ok(out)
}

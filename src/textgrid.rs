//! Interval tiers of Praat TextGrid files.
//!
//! Parsing and writing are done by the `textgrid` crate; this module only
//! maps its intervals to the seconds-based [`Interval`] the engine works on.

use std::path::Path;

use ::textgrid::{TextGrid, Tier, TierType};

/// A labeled time interval, in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    pub label: String,
    pub start: f64,
    pub end: f64,
}

impl Interval {
    pub fn new(label: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            label: label.into(),
            start,
            end,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TextGridError {
    #[error("Failed to read TextGrid {path}: {message}")]
    Read { path: String, message: String },
    #[error("Failed to write TextGrid {path}: {message}")]
    Write { path: String, message: String },
    #[error("{path} has no interval tier {tier:?} (tiers: {available:?})")]
    MissingTier {
        path: String,
        tier: String,
        available: Vec<String>,
    },
}

/// Intervals of the interval tier called `tier`, in file order.
pub fn read_interval_tier(path: &Path, tier: &str) -> Result<Vec<Interval>, TextGridError> {
    let grid = TextGrid::from_file(path).map_err(|err| TextGridError::Read {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;

    let found = grid
        .tiers
        .iter()
        .find(|t| t.tier_type == TierType::IntervalTier && t.name == tier)
        .ok_or_else(|| TextGridError::MissingTier {
            path: path.display().to_string(),
            tier: tier.to_string(),
            available: grid.tiers.iter().map(|t| t.name.clone()).collect(),
        })?;

    log::debug!(
        "Read {} intervals from tier {tier:?} of {}",
        found.intervals.len(),
        path.display()
    );

    Ok(found
        .intervals
        .iter()
        .map(|i| Interval::new(i.text.as_str(), i.xmin, i.xmax))
        .collect())
}

/// Write `intervals` as the single interval tier of a long-format TextGrid.
pub fn write_interval_tier(
    path: &Path,
    tier: &str,
    intervals: &[Interval],
) -> Result<(), TextGridError> {
    let write_err = |err: String| TextGridError::Write {
        path: path.display().to_string(),
        message: err,
    };

    let xmin = intervals.first().map_or(0.0, |i| i.start);
    let xmax = intervals.last().map_or(0.0, |i| i.end);
    let mut grid = TextGrid::new(xmin, xmax).map_err(|e| write_err(e.to_string()))?;
    grid.add_tier(Tier {
        name: tier.to_string(),
        tier_type: TierType::IntervalTier,
        xmin,
        xmax,
        intervals: intervals
            .iter()
            .map(|i| ::textgrid::Interval {
                xmin: i.start,
                xmax: i.end,
                text: i.label.clone(),
            })
            .collect(),
        points: Vec::new(),
    })
    .map_err(|e| write_err(e.to_string()))?;

    grid.to_file(path, false).map_err(|e| write_err(e.to_string()))
}

// Chart domain models - Ranges and samples of a metric time series
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Relative time window a chart is scoped to, ordered from shortest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChartRange {
    Now,
    Hour1,
    Hours2,
    Hours4,
    Hours8,
    Hours12,
    Day1,
    Days2,
    Days3,
    Week1,
    Weeks2,
    Month1,
    Months2,
    Months3,
    Months6,
}

impl ChartRange {
    pub const ALL: [ChartRange; 15] = [
        ChartRange::Now,
        ChartRange::Hour1,
        ChartRange::Hours2,
        ChartRange::Hours4,
        ChartRange::Hours8,
        ChartRange::Hours12,
        ChartRange::Day1,
        ChartRange::Days2,
        ChartRange::Days3,
        ChartRange::Week1,
        ChartRange::Weeks2,
        ChartRange::Month1,
        ChartRange::Months2,
        ChartRange::Months3,
        ChartRange::Months6,
    ];

    /// Token sent as the `interval` query parameter.
    pub fn token(self) -> &'static str {
        match self {
            ChartRange::Now => "now",
            ChartRange::Hour1 => "1h",
            ChartRange::Hours2 => "2h",
            ChartRange::Hours4 => "4h",
            ChartRange::Hours8 => "8h",
            ChartRange::Hours12 => "12h",
            ChartRange::Day1 => "1d",
            ChartRange::Days2 => "2d",
            ChartRange::Days3 => "3d",
            ChartRange::Week1 => "1w",
            ChartRange::Weeks2 => "2w",
            ChartRange::Month1 => "1m",
            ChartRange::Months2 => "2m",
            ChartRange::Months3 => "3m",
            ChartRange::Months6 => "6m",
        }
    }
}

impl fmt::Display for ChartRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported chart range `{0}`")]
pub struct UnsupportedRange(pub String);

impl FromStr for ChartRange {
    type Err = UnsupportedRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartRange::ALL
            .into_iter()
            .find(|range| range.token() == s)
            .ok_or_else(|| UnsupportedRange(s.to_string()))
    }
}

/// One sample of `GET /api/scale/chart`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

impl ChartPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

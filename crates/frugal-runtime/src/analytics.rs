//! Cost series summary and analysis.
//!
//! Cost data is reporting-only: nothing here gates policy evaluation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Cost of one scope on one day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostPoint {
    pub date: NaiveDate,
    pub cost: f64,
}

/// Aggregate over complete days (today excluded, it is still accruing).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub days: usize,
    pub total: f64,
    pub average: f64,
    pub maximum: f64,
    pub minimum: f64,
}

impl CostSummary {
    /// Summarize the points dated strictly before `today`. `None` if there are none.
    pub fn from_points(points: &[CostPoint], today: NaiveDate) -> Option<Self> {
        let costs: Vec<f64> = points
            .iter()
            .filter(|p| p.date < today)
            .map(|p| p.cost)
            .collect();
        if costs.is_empty() {
            return None;
        }
        let total: f64 = costs.iter().sum();
        Some(Self {
            days: costs.len(),
            total,
            average: total / costs.len() as f64,
            maximum: costs.iter().copied().fold(f64::MIN, f64::max),
            minimum: costs.iter().copied().fold(f64::MAX, f64::min),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Rising,
    Falling,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub direction: TrendDirection,
    /// Least-squares change in cost per day.
    pub slope_per_day: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostAnomaly {
    pub date: NaiveDate,
    pub cost: f64,
    /// Higher is more anomalous; the scale is analyzer-specific.
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostAnalysis {
    pub trend: Trend,
    pub anomalies: Vec<CostAnomaly>,
}

/// Trend and anomaly detection over a daily cost series.
pub trait CostAnalytics: Send + Sync {
    fn analyze(&self, series: &[CostPoint]) -> anyhow::Result<CostAnalysis>;
}

/// Linear trend plus z-score outliers.
#[derive(Debug, Clone, Copy)]
pub struct ZScoreAnalytics {
    /// Absolute z-score above which a day is anomalous.
    pub threshold: f64,
    /// Relative slope (fraction of the mean per day) below which the trend is flat.
    pub flat_tolerance: f64,
}

impl Default for ZScoreAnalytics {
    fn default() -> Self {
        Self {
            threshold: 2.5,
            flat_tolerance: 0.005,
        }
    }
}

impl CostAnalytics for ZScoreAnalytics {
    fn analyze(&self, series: &[CostPoint]) -> anyhow::Result<CostAnalysis> {
        if series.len() < 2 {
            anyhow::bail!("need at least two days of cost data, got {}", series.len());
        }

        let mut points = series.to_vec();
        points.sort_by_key(|p| p.date);

        let n = points.len() as f64;
        let mean = points.iter().map(|p| p.cost).sum::<f64>() / n;
        let variance = points.iter().map(|p| (p.cost - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        let first = points[0].date;
        let xs: Vec<f64> = points
            .iter()
            .map(|p| (p.date - first).num_days() as f64)
            .collect();
        let x_mean = xs.iter().sum::<f64>() / n;
        let covariance: f64 = xs
            .iter()
            .zip(&points)
            .map(|(x, p)| (x - x_mean) * (p.cost - mean))
            .sum();
        let x_variance: f64 = xs.iter().map(|x| (x - x_mean).powi(2)).sum();
        let slope = if x_variance > 0.0 {
            covariance / x_variance
        } else {
            0.0
        };

        let direction = if slope.abs() <= mean.abs() * self.flat_tolerance {
            TrendDirection::Flat
        } else if slope > 0.0 {
            TrendDirection::Rising
        } else {
            TrendDirection::Falling
        };

        let anomalies = if std_dev > 0.0 {
            points
                .iter()
                .filter_map(|p| {
                    let score = ((p.cost - mean) / std_dev).abs();
                    (score > self.threshold).then_some(CostAnomaly {
                        date: p.date,
                        cost: p.cost,
                        score,
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        Ok(CostAnalysis {
            trend: Trend {
                direction,
                slope_per_day: slope,
            },
            anomalies,
        })
    }
}

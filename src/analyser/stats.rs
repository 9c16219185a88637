//! Numeric and frequency helpers shared by the profiling, insight and
//! anomaly stages, computed on Polars columns.
//!
//! Every function returns `None` instead of dividing by zero: an empty
//! column, too few values, or a degenerate spread all mean "undefined".
//! Quantiles use linear interpolation between closest ranks.

use super::types::ValueCount;
use polars::prelude::{
    ChunkAgg as _, ChunkQuantile as _, ChunkVar as _, DataType, Float64Chunked, IntoSeries as _,
    MomentSeries as _, QuantileMethod, SeriesMethods as _, StringChunked, cov,
};

/// Column name `value_counts` writes the frequencies under.
const COUNT_COLUMN: &str = "__datasight_count";

fn present(ca: &Float64Chunked) -> usize {
    ca.len() - ca.null_count()
}

/// True when the values are not all identical.
pub fn has_spread(ca: &Float64Chunked) -> bool {
    matches!((ca.min(), ca.max()), (Some(lo), Some(hi)) if lo < hi)
}

/// Sample standard deviation; needs two values.
pub fn std_dev(ca: &Float64Chunked) -> Option<f64> {
    if present(ca) < 2 {
        return None;
    }
    ca.std(1)
}

pub fn population_std_dev(ca: &Float64Chunked) -> Option<f64> {
    if present(ca) == 0 {
        return None;
    }
    ca.std(0)
}

pub fn quantile(ca: &Float64Chunked, q: f64) -> Option<f64> {
    ca.quantile(q, QuantileMethod::Linear).ok().flatten()
}

/// Adjusted Fisher-Pearson sample skewness.
///
/// Needs at least three values and a nonzero spread.
pub fn skewness(ca: &Float64Chunked) -> Option<f64> {
    if present(ca) < 3 || !has_spread(ca) {
        return None;
    }
    ca.clone()
        .into_series()
        .skew(false)
        .ok()
        .flatten()
        .filter(|s| s.is_finite())
}

/// Pearson correlation over rows where both values are present.
pub fn pearson(a: &Float64Chunked, b: &Float64Chunked) -> Option<f64> {
    let r = cov::pearson_corr(a, b)?;
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Rows where both columns hold a value.
pub fn complete_pairs(a: &Float64Chunked, b: &Float64Chunked) -> usize {
    (&a.is_not_null() & &b.is_not_null()).num_trues()
}

/// Two-sided p-value for a Pearson coefficient `r` over `n` complete pairs,
/// from Student's t with `n - 2` degrees of freedom.
pub fn correlation_p_value(r: f64, n: usize) -> Option<f64> {
    if n < 3 || !r.is_finite() {
        return None;
    }
    let df = (n - 2) as f64;
    let r2 = r * r;
    if r2 >= 1.0 {
        return Some(0.0);
    }
    let t2 = r2 * df / (1.0 - r2);
    let p = regularized_incomplete_beta(df / (df + t2), df / 2.0, 0.5)?;
    Some(p.clamp(0.0, 1.0))
}

fn ln_gamma(z: f64) -> f64 {
    const LANCZOS_G: f64 = 7.0;
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if z < 0.5 {
        let pi = std::f64::consts::PI;
        return pi.ln() - (pi * z).sin().abs().ln() - ln_gamma(1.0 - z);
    }
    let shifted = z - 1.0;
    let mut x = COEFFS[0];
    for (idx, c) in COEFFS.iter().copied().enumerate().skip(1) {
        x += c / (shifted + idx as f64);
    }
    let t = shifted + LANCZOS_G + 0.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (shifted + 0.5) * t.ln() - t + x.ln()
}

/// `I_x(a, b)` by Lentz's continued fraction.
fn regularized_incomplete_beta(x: f64, a: f64, b: f64) -> Option<f64> {
    if !(0.0..=1.0).contains(&x) {
        return None;
    }
    if x == 0.0 || x == 1.0 {
        return Some(x);
    }
    // The fraction converges fastest below the mean of the distribution.
    if x > (a + 1.0) / (a + b + 2.0) {
        let mirrored = regularized_incomplete_beta(1.0 - x, b, a)?;
        return Some(1.0 - mirrored);
    }
    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    Some(ln_front.exp() * beta_fraction(x, a, b)? / a)
}

fn beta_fraction(x: f64, a: f64, b: f64) -> Option<f64> {
    const MAX_ITER: usize = 200;
    const EPS: f64 = 1e-14;
    const TINY: f64 = 1e-300;

    let guard = |v: f64| if v.abs() < TINY { TINY } else { v };
    let mut c = 1.0;
    let mut d = 1.0 / guard(1.0 - (a + b) * x / (a + 1.0));
    let mut h = d;
    for m in 1..=MAX_ITER {
        let m = m as f64;
        let even = m * (b - m) * x / ((a + 2.0 * m - 1.0) * (a + 2.0 * m));
        d = 1.0 / guard(1.0 + even * d);
        c = guard(1.0 + even / c);
        h *= d * c;

        let odd = -(a + m) * (a + b + m) * x / ((a + 2.0 * m) * (a + 2.0 * m + 1.0));
        d = 1.0 / guard(1.0 + odd * d);
        c = guard(1.0 + odd / c);
        let step = d * c;
        h *= step;
        if (step - 1.0).abs() < EPS {
            return Some(h);
        }
    }
    None
}

/// Tukey fence built from the quartiles of a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrFence {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrFence {
    pub fn from_column(ca: &Float64Chunked, multiplier: f64) -> Option<Self> {
        let q1 = quantile(ca, 0.25)?;
        let q3 = quantile(ca, 0.75)?;
        let iqr = q3 - q1;
        Some(Self {
            q1,
            q3,
            iqr,
            lower: q1 - multiplier * iqr,
            upper: q3 + multiplier * iqr,
        })
    }

    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }

    pub fn count_outliers(&self, ca: &Float64Chunked) -> usize {
        ca.into_iter()
            .flatten()
            .filter(|v| self.is_outlier(*v))
            .count()
    }
}

/// Frequency table of the non-null values, most frequent first. Ties are
/// broken by value so the order is stable across runs.
pub fn value_counts(ca: &StringChunked) -> Vec<ValueCount> {
    let series = ca.clone().into_series().drop_nulls();
    let frame = match series.value_counts(false, false, COUNT_COLUMN.into(), false) {
        Ok(frame) => frame,
        Err(err) => {
            tracing::warn!(column = %ca.name(), error = %err, "Could not count values");
            return Vec::new();
        }
    };

    let (Ok(values), Ok(counts)) = (
        frame.column(ca.name().as_str()),
        frame.column(COUNT_COLUMN),
    ) else {
        return Vec::new();
    };
    let (Ok(values), Ok(counts)) = (
        values.as_materialized_series().str(),
        counts.as_materialized_series().cast(&DataType::UInt64),
    ) else {
        return Vec::new();
    };
    let Ok(counts) = counts.u64() else {
        return Vec::new();
    };

    let mut table: Vec<ValueCount> = values
        .into_iter()
        .zip(counts)
        .filter_map(|(value, count)| {
            Some(ValueCount {
                value: value?.to_owned(),
                count: usize::try_from(count?).ok()?,
            })
        })
        .collect();
    table.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    table
}

pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

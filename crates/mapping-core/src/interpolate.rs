//! Piecewise-linear interpolation of missing values and nearest-value row selection
//!
//! Known points are rows where both the value and reference columns are
//! numeric. Points sharing a reference x are averaged into one, the result is
//! sorted by x, and every query x is interpolated between its two bracketing
//! points. Queries outside the known range take the nearest boundary y.

use crate::convert::to_float;
use crate::error::{Error, Result};
use crate::numeric::MaybeNumeric;
use crate::table::MappingTable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Query positions and their estimated values, in query order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interpolation {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Interpolation {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Iterate `(x, y)` pairs
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

/// Which side of the target value candidate rows may lie on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Any convertible value
    #[default]
    Both,
    /// Only values strictly greater than the target
    GreaterThan,
    /// Only values strictly less than the target
    LessThan,
}

impl Side {
    fn admits(self, value: f64, target: f64) -> bool {
        match self {
            Side::Both => true,
            Side::GreaterThan => value > target,
            Side::LessThan => value < target,
        }
    }
}

impl FromStr for Side {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "both" => Ok(Side::Both),
            "greater_than" => Ok(Side::GreaterThan),
            "less_than" => Ok(Side::LessThan),
            other => Err(Error::InvalidArgument(format!(
                "unknown side '{}', expected one of: both, greater_than, less_than",
                other
            ))),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Side::Both => "both",
            Side::GreaterThan => "greater_than",
            Side::LessThan => "less_than",
        };
        write!(f, "{}", name)
    }
}

/// Collapse points sharing an x into one point carrying the mean y.
///
/// The returned x values are sorted and strictly increasing.
pub fn average_points_by_x(x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut points: Vec<(f64, f64)> = x.iter().copied().zip(y.iter().copied()).collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut unique_x: Vec<f64> = Vec::new();
    let mut averaged_y: Vec<f64> = Vec::new();
    let mut i = 0;
    while i < points.len() {
        let xi = points[i].0;
        let mut sum = 0.0;
        let mut count = 0usize;
        while i < points.len() && points[i].0 == xi {
            sum += points[i].1;
            count += 1;
            i += 1;
        }
        unique_x.push(xi);
        averaged_y.push(sum / count as f64);
    }

    (unique_x, averaged_y)
}

/// Piecewise-linear interpolation of `query` over sorted points `(xp, fp)`.
///
/// `xp` must be strictly increasing. Queries below `xp[0]` or above the last
/// x are clamped to the boundary y. Empty reference points give an empty
/// result.
pub fn interp(query: &[f64], xp: &[f64], fp: &[f64]) -> Vec<f64> {
    let n = xp.len().min(fp.len());
    if n == 0 {
        return Vec::new();
    }
    let (xp, fp) = (&xp[..n], &fp[..n]);

    query
        .iter()
        .map(|&q| {
            if q <= xp[0] {
                return fp[0];
            }
            if q >= xp[n - 1] {
                return fp[n - 1];
            }
            // first point strictly above q; 1 <= hi < n here
            let hi = xp.partition_point(|&v| v <= q);
            let lo = hi - 1;
            let slope = (fp[hi] - fp[lo]) / (xp[hi] - xp[lo]);
            slope * (q - xp[lo]) + fp[lo]
        })
        .collect()
}

impl MappingTable {
    /// Estimate missing values of `value_column` from `reference_column`.
    ///
    /// Returns the reference x of every row needing an estimate, paired with
    /// the interpolated value. Rows whose reference value is itself not
    /// numeric are dropped. No known points yields an empty result.
    pub fn interpolate(&self, value_column: &str, reference_column: &str) -> Result<Interpolation> {
        let columns = [value_column, reference_column];

        let (mut known_x, mut known_y) = (Vec::new(), Vec::new());
        for pair in self.iter_numeric_rows(&columns, to_float)? {
            known_y.push(pair[0]);
            known_x.push(pair[1]);
        }

        let mut query = Vec::new();
        for fields in self.iter_non_numeric_rows(&columns, to_float)? {
            match &fields[1] {
                MaybeNumeric::Numeric(x) => query.push(*x),
                MaybeNumeric::Raw(raw) => {
                    log::warn!(
                        "cannot interpolate '{}': reference '{}' value '{}' is not numeric",
                        value_column,
                        reference_column,
                        raw
                    );
                }
            }
        }

        if known_x.is_empty() {
            log::debug!(
                "no rows with numeric '{}' and '{}'; nothing to interpolate",
                value_column,
                reference_column
            );
            return Ok(Interpolation::default());
        }

        let (xp, fp) = average_points_by_x(&known_x, &known_y);
        debug_assert!(xp.windows(2).all(|w| w[0] < w[1]));

        let y = interp(&query, &xp, &fp);
        log::debug!(
            "interpolated {} values of '{}' over {} reference points",
            y.len(),
            value_column,
            xp.len()
        );
        Ok(Interpolation { x: query, y })
    }

    /// Row ids whose `reference_column` value is closest to `target`.
    ///
    /// Only rows whose value converts are candidates, narrowed by `sides`.
    /// Every row tied at the minimum distance is returned, in table order.
    pub fn select_rows_by_value<F>(
        &self,
        target: f64,
        reference_column: &str,
        convert: F,
        sides: Side,
    ) -> Result<Vec<&str>>
    where
        F: Fn(&str) -> Option<f64>,
    {
        let idx = self.column_index(reference_column)?;

        let candidates: Vec<(&str, f64)> = self
            .iter_rows(None)
            .filter_map(|(id, row)| convert(&row[idx]).map(|value| (id, value)))
            .filter(|&(_, value)| sides.admits(value, target))
            .map(|(id, value)| (id, (value - target).abs()))
            .collect();

        let Some(best) = candidates
            .iter()
            .map(|&(_, distance)| distance)
            .min_by(|a, b| a.total_cmp(b))
        else {
            return Ok(Vec::new());
        };

        Ok(candidates
            .into_iter()
            .filter(|&(_, distance)| distance == best)
            .map(|(id, _)| id)
            .collect())
    }
}

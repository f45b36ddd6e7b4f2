//! Quantile binning of feature columns.
//!
//! Every feature gets a sorted list of cut points. Bin `i` holds the values
//! `cuts[i - 1] < v <= cuts[i]`, so a split after bin `b` is exactly the raw
//! rule `v <= cuts[b]`. Missing values (NaN) get their own sentinel bin.

use ndarray::Array2;
use rayon::prelude::*;

/// Bin index reserved for missing values.
pub const MISSING_BIN: u16 = u16::MAX;

/// Learned cut points for every feature.
#[derive(Clone, Debug)]
pub struct BinMapper {
    cuts: Vec<Vec<f64>>,
}

/// Column-major binned view of a training matrix.
#[derive(Clone, Debug)]
pub struct BinnedMatrix {
    columns: Vec<Vec<u16>>,
    n_rows: usize,
}

impl BinMapper {
    /// Learn at most `max_bin` cut points per column of `x`.
    pub fn fit(x: &Array2<f64>, max_bin: usize) -> Self {
        let cuts = (0..x.ncols())
            .into_par_iter()
            .map(|j| {
                let mut values: Vec<f64> = x.column(j).iter().copied().filter(|v| !v.is_nan()).collect();
                values.sort_by(f64::total_cmp);
                quantile_cuts(&values, max_bin)
            })
            .collect();
        Self { cuts }
    }

    /// Cut points of one feature.
    pub fn cuts(&self, feature: usize) -> &[f64] {
        &self.cuts[feature]
    }

    /// Number of non-missing bins of one feature.
    pub fn n_bins(&self, feature: usize) -> usize {
        self.cuts[feature].len()
    }

    pub fn n_features(&self) -> usize {
        self.cuts.len()
    }

    /// Bin of a single value. Values above the last cut land in the last bin.
    pub fn bin_value(&self, feature: usize, value: f64) -> u16 {
        if value.is_nan() {
            return MISSING_BIN;
        }
        let cuts = &self.cuts[feature];
        let idx = cuts.partition_point(|&c| c < value);
        idx.min(cuts.len().saturating_sub(1)) as u16
    }

    /// Bin every cell of `x`.
    pub fn transform(&self, x: &Array2<f64>) -> BinnedMatrix {
        let columns = (0..x.ncols())
            .into_par_iter()
            .map(|j| x.column(j).iter().map(|&v| self.bin_value(j, v)).collect())
            .collect();
        BinnedMatrix {
            columns,
            n_rows: x.nrows(),
        }
    }
}

impl BinnedMatrix {
    pub fn column(&self, feature: usize) -> &[u16] {
        &self.columns[feature]
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }
}

/// Cut points for sorted, NaN-free values.
///
/// Few distinct values keep one bin each. Otherwise cuts sit on evenly spaced
/// quantiles and the maximum is always the last cut.
fn quantile_cuts(sorted: &[f64], max_bin: usize) -> Vec<f64> {
    let mut distinct = sorted.to_vec();
    distinct.dedup();

    if distinct.len() <= max_bin {
        return distinct;
    }

    let n = sorted.len();
    let mut cuts: Vec<f64> = (1..max_bin)
        .map(|k| sorted[(k * n / max_bin).min(n - 1)])
        .collect();
    cuts.push(sorted[n - 1]);
    cuts.dedup();
    cuts
}

//! Histogram requests attached to event processors.
//!
//! The native histogram pool creates one histogram per descriptor when the
//! owning processor is constructed.

use crate::parameter::{Parameter, Parameters};
use serde::{Deserialize, Serialize};

/// Bin specification for one axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Binning {
    /// Explicit bin edges, used unchanged
    Edges(Vec<f64>),
    /// Number of equal-width bins between `min` and `max`
    Uniform { bins: u32, min: f64, max: f64 },
}

impl Binning {
    /// Bin edges on this axis
    pub fn edges(&self) -> Vec<f64> {
        match self {
            Binning::Edges(edges) => edges.clone(),
            Binning::Uniform { bins, min, max } => uniform_binning(*bins, *min, *max),
        }
    }
}

impl From<Vec<f64>> for Binning {
    fn from(edges: Vec<f64>) -> Self {
        Binning::Edges(edges)
    }
}

impl From<(u32, f64, f64)> for Binning {
    fn from((bins, min, max): (u32, f64, f64)) -> Self {
        Binning::Uniform { bins, min, max }
    }
}

/// Edges of `bins` equal-width bins spanning `[min, max]`.
///
/// Returns `bins + 1` values. The last edge is `max` exactly.
///
/// # Examples
/// ```
/// use ldmxcfg::histogram::uniform_binning;
///
/// assert_eq!(uniform_binning(2, 0.0, 1.0), vec![0.0, 0.5, 1.0]);
/// ```
pub fn uniform_binning(bins: u32, min: f64, max: f64) -> Vec<f64> {
    if bins == 0 {
        return vec![min];
    }
    let width = (max - min) / f64::from(bins);
    (0..=bins)
        .map(|i| if i == bins { max } else { min + f64::from(i) * width })
        .collect()
}

/// One histogram request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub name: String,
    pub xlabel: String,
    pub xbins: Vec<f64>,
    pub ylabel: String,
    pub ybins: Vec<f64>,
}

impl Histogram {
    pub fn one_dimensional(name: &str, xlabel: &str, xbins: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            xlabel: xlabel.to_string(),
            xbins,
            ylabel: String::new(),
            ybins: Vec::new(),
        }
    }

    pub fn two_dimensional(
        name: &str,
        xlabel: &str,
        xbins: Vec<f64>,
        ylabel: &str,
        ybins: Vec<f64>,
    ) -> Self {
        Self {
            name: name.to_string(),
            xlabel: xlabel.to_string(),
            xbins,
            ylabel: ylabel.to_string(),
            ybins,
        }
    }

    pub fn is_two_dimensional(&self) -> bool {
        !self.ybins.is_empty()
    }

    pub fn attributes(&self) -> Parameters {
        let mut attrs = Parameters::new();
        attrs.insert("name".to_string(), self.name.clone().into());
        attrs.insert("xlabel".to_string(), self.xlabel.clone().into());
        attrs.insert("xbins".to_string(), self.xbins.clone().into());
        attrs.insert("ylabel".to_string(), self.ylabel.clone().into());
        attrs.insert("ybins".to_string(), self.ybins.clone().into());
        attrs
    }
}

impl From<&Histogram> for Parameter {
    fn from(histogram: &Histogram) -> Self {
        Parameter::Table(histogram.attributes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_binning_spans_range() {
        let edges = uniform_binning(10, 0.0, 1.0);
        assert_eq!(edges.len(), 11);
        assert_eq!(edges[0], 0.0);
        assert_eq!(*edges.last().unwrap(), 1.0);
        for pair in edges.windows(2) {
            assert!((pair[1] - pair[0] - 0.1).abs() < 1e-12);
        }
    }

    #[test]
    fn test_explicit_edges_unchanged() {
        let binning = Binning::from(vec![0.0, 0.5, 1.0]);
        assert_eq!(binning.edges(), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_binning_from_yaml() {
        let uniform: Binning = serde_yaml::from_str("{bins: 4, min: 0.0, max: 2.0}").unwrap();
        assert_eq!(uniform.edges(), vec![0.0, 0.5, 1.0, 1.5, 2.0]);

        let explicit: Binning = serde_yaml::from_str("[1.0, 2.0, 4.0]").unwrap();
        assert_eq!(explicit, Binning::Edges(vec![1.0, 2.0, 4.0]));
    }

    #[test]
    fn test_one_dimensional_has_no_y_axis() {
        let h = Histogram::one_dimensional("energy", "E [MeV]", vec![0.0, 1.0]);
        assert!(!h.is_two_dimensional());
        assert_eq!(h.ylabel, "");
    }
}

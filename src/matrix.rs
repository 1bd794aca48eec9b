use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::error::{OncoprintError, Result};

/// Separator between categories in a multi-hit cell.
pub const CATEGORY_SEPARATOR: char = ';';

/// A gene × sample mutation matrix.
///
/// `calls` holds the categorical labels that get drawn, `counts` the numeric
/// companion used for sorting and filtering. Both are row-major with one row
/// per gene and always share the same shape.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationMatrix {
    genes: Vec<String>,
    samples: Vec<String>,
    calls: Vec<Vec<String>>,
    counts: Vec<Vec<f64>>,
}

impl MutationMatrix {
    pub fn new(
        genes: Vec<String>,
        samples: Vec<String>,
        calls: Vec<Vec<String>>,
        counts: Vec<Vec<f64>>,
    ) -> Result<Self> {
        check_shape("calls", &calls, genes.len(), samples.len())?;
        check_shape("counts", &counts, genes.len(), samples.len())?;
        Ok(MutationMatrix { genes, samples, calls, counts })
    }

    /// Build a matrix from labels alone; each cell counts its categories.
    pub fn from_calls(genes: Vec<String>, samples: Vec<String>, calls: Vec<Vec<String>>) -> Result<Self> {
        let counts = calls
            .iter()
            .map(|row| row.iter().map(|c| split_categories(c).count() as f64).collect())
            .collect();
        Self::new(genes, samples, calls, counts)
    }

    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn n_genes(&self) -> usize {
        self.genes.len()
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn call(&self, gene: usize, sample: usize) -> &str {
        &self.calls[gene][sample]
    }

    pub fn count(&self, gene: usize, sample: usize) -> f64 {
        self.counts[gene][sample]
    }

    pub fn gene_index(&self) -> FxHashMap<&str, usize> {
        self.genes.iter().enumerate().map(|(i, g)| (g.as_str(), i)).collect()
    }

    /// Keep the given rows and columns, in the given order. Both matrices
    /// move together so labels always line up with their counts.
    pub fn reindex(&self, rows: &[usize], cols: &[usize]) -> MutationMatrix {
        let pick = |m: &Vec<Vec<String>>| -> Vec<Vec<String>> {
            rows.iter().map(|&r| cols.iter().map(|&c| m[r][c].clone()).collect()).collect()
        };
        MutationMatrix {
            genes: rows.iter().map(|&r| self.genes[r].clone()).collect(),
            samples: cols.iter().map(|&c| self.samples[c].clone()).collect(),
            calls: pick(&self.calls),
            counts: rows
                .iter()
                .map(|&r| cols.iter().map(|&c| self.counts[r][c]).collect())
                .collect(),
        }
    }

    /// Sum of the numeric matrix down each sample column.
    pub fn column_sums(&self) -> Vec<f64> {
        (0..self.n_samples())
            .into_par_iter()
            .map(|c| self.counts.iter().map(|row| row[c]).sum())
            .collect()
    }

    /// Number of samples per gene with a non-empty call.
    pub fn mutated_counts(&self) -> Vec<usize> {
        self.calls
            .par_iter()
            .map(|row| row.iter().filter(|c| is_mutated_call(c)).count())
            .collect()
    }
}

fn check_shape<T>(what: &str, m: &[Vec<T>], rows: usize, cols: usize) -> Result<()> {
    if m.len() != rows {
        return Err(OncoprintError::ShapeMismatch(format!(
            "{} has {} rows but there are {} genes",
            what,
            m.len(),
            rows
        )));
    }
    if let Some((i, row)) = m.iter().enumerate().find(|(_, r)| r.len() != cols) {
        return Err(OncoprintError::ShapeMismatch(format!(
            "{} row {} has {} columns but there are {} samples",
            what,
            i,
            row.len(),
            cols
        )));
    }
    Ok(())
}

/// Iterate the categories of a cell label, skipping blanks.
pub fn split_categories(label: &str) -> impl Iterator<Item = &str> {
    label
        .split(CATEGORY_SEPARATOR)
        .map(str::trim)
        .filter(|c| !c.is_empty() && *c != crate::color::BACKGROUND_KEY)
}

pub fn is_mutated_call(label: &str) -> bool {
    split_categories(label).next().is_some()
}

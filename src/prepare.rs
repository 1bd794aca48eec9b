use std::cmp::Ordering;

use log::{debug, info};
use rustc_hash::FxHashSet;

use crate::annotation::{compare_values, is_numeric_column, resolve_tracks, AnnotationColors, AnnotationTable, AnnotationTrack};
use crate::error::{OncoprintError, Result};
use crate::matrix::MutationMatrix;

/// A plot needs at least this many genes and samples.
pub const MIN_DIMENSION: usize = 2;

pub const DEFAULT_TOP_GENES: usize = 5;

/// How samples (columns) are ordered. Exactly one mode is active.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SortMode {
    /// Order samples by their mutation pattern over the selected genes.
    #[default]
    Mutation,
    /// Order samples by the named annotation columns, in turn.
    Annotation(Vec<String>),
    /// Keep the input order.
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneSelection {
    /// The first N rows of the matrix.
    Top(usize),
    /// These genes, in this order.
    Named(Vec<String>),
}

impl Default for GeneSelection {
    fn default() -> Self {
        GeneSelection::Top(DEFAULT_TOP_GENES)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OncoprintOptions {
    pub genes: GeneSelection,
    pub remove_non_mutated: bool,
    pub sort: SortMode,
}

/// Everything the renderer needs, already selected, filtered and ordered.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedOncoprint {
    pub matrix: MutationMatrix,
    /// Row-side labels, one per gene, e.g. `"50%"`.
    pub percentages: Vec<String>,
    /// One track per annotation column, empty without an annotation table.
    pub tracks: Vec<AnnotationTrack>,
}

/// Validate, select, filter and sort. Every caller-visible error is raised
/// here, before anything is drawn.
pub fn prepare(
    matrix: &MutationMatrix,
    annotation: Option<&AnnotationTable>,
    annotation_colors: Option<&AnnotationColors>,
    options: &OncoprintOptions,
) -> Result<PreparedOncoprint> {
    check_samples(matrix.n_samples())?;
    check_genes(matrix.n_genes())?;
    if matches!(options.sort, SortMode::Annotation(_)) && annotation.is_none() {
        return Err(OncoprintError::MissingAnnotationTable);
    }

    let rows = select_genes(matrix, &options.genes)?;
    check_genes(rows.len())?;
    let all_samples: Vec<usize> = (0..matrix.n_samples()).collect();
    let mut selected = matrix.reindex(&rows, &all_samples);
    debug!("Selected genes: {}", selected.genes().join(", "));

    if options.remove_non_mutated {
        let keep: Vec<usize> = selected
            .column_sums()
            .iter()
            .enumerate()
            .filter(|(_, sum)| **sum > 0.0)
            .map(|(c, _)| c)
            .collect();
        info!(
            "Removed {} non-mutated samples, {} remain",
            selected.n_samples() - keep.len(),
            keep.len()
        );
        check_samples(keep.len())?;
        let all_rows: Vec<usize> = (0..selected.n_genes()).collect();
        selected = selected.reindex(&all_rows, &keep);
    }

    let annotation = annotation.map(AnnotationTable::cleaned);

    let order = match &options.sort {
        SortMode::Mutation => mutation_order(&selected),
        SortMode::Annotation(columns) => {
            // checked above
            let table = annotation.as_ref().ok_or(OncoprintError::MissingAnnotationTable)?;
            annotation_order(&selected, table, columns, mutation_order(&selected))?
        }
        SortMode::None => (0..selected.n_samples()).collect(),
    };
    let all_rows: Vec<usize> = (0..selected.n_genes()).collect();
    let sorted = selected.reindex(&all_rows, &order);

    let total = sorted.n_samples();
    let percentages = sorted.mutated_counts().into_iter().map(|hits| format_percentage(hits, total)).collect();

    let tracks = match &annotation {
        Some(table) => resolve_tracks(table, &table.align(sorted.samples()), annotation_colors),
        None => Vec::new(),
    };

    info!("Prepared {} genes x {} samples", sorted.n_genes(), sorted.n_samples());

    Ok(PreparedOncoprint { matrix: sorted, percentages, tracks })
}

fn check_samples(found: usize) -> Result<()> {
    if found < MIN_DIMENSION {
        return Err(OncoprintError::TooFewSamples { found });
    }
    Ok(())
}

fn check_genes(found: usize) -> Result<()> {
    if found < MIN_DIMENSION {
        return Err(OncoprintError::TooFewGenes { found });
    }
    Ok(())
}

fn select_genes(matrix: &MutationMatrix, selection: &GeneSelection) -> Result<Vec<usize>> {
    match selection {
        GeneSelection::Top(n) => Ok((0..(*n).min(matrix.n_genes())).collect()),
        GeneSelection::Named(names) => {
            let index = matrix.gene_index();
            let mut seen = FxHashSet::default();
            names
                .iter()
                .map(|g| {
                    let row =
                        index.get(g.as_str()).copied().ok_or_else(|| OncoprintError::UnknownGene(g.clone()))?;
                    if !seen.insert(row) {
                        return Err(OncoprintError::DuplicateGene(g.clone()));
                    }
                    Ok(row)
                })
                .collect()
        }
    }
}

/// Sample order by mutation pattern: presence over the genes, read with the
/// first gene as most significant, descending. Ties keep input order.
pub fn mutation_order(matrix: &MutationMatrix) -> Vec<usize> {
    let patterns: Vec<Vec<bool>> = (0..matrix.n_samples())
        .map(|s| (0..matrix.n_genes()).map(|g| matrix.count(g, s) > 0.0).collect())
        .collect();
    let mut order: Vec<usize> = (0..matrix.n_samples()).collect();
    order.sort_by(|&a, &b| patterns[b].cmp(&patterns[a]));
    order
}

/// Stable re-sort of `base` by annotation columns. Samples without an
/// annotation row go last.
fn annotation_order(
    matrix: &MutationMatrix,
    table: &AnnotationTable,
    columns: &[String],
    mut base: Vec<usize>,
) -> Result<Vec<usize>> {
    let cols = columns.iter().map(|c| table.column_index(c)).collect::<Result<Vec<_>>>()?;
    let aligned = table.align(matrix.samples());
    let numeric: Vec<bool> = cols
        .iter()
        .map(|&col| is_numeric_column(aligned.iter().flatten().map(|&r| table.value(r, col))))
        .collect();

    base.sort_by(|&a, &b| {
        cols.iter()
            .zip(&numeric)
            .map(|(&col, &numeric)| match (aligned[a], aligned[b]) {
                (Some(ra), Some(rb)) => compare_values(table.value(ra, col), table.value(rb, col), numeric),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    });
    Ok(base)
}

/// `hits` out of `total` as a whole-number percentage, halves rounded up.
pub fn format_percentage(hits: usize, total: usize) -> String {
    if total == 0 {
        return "0%".to_string();
    }
    format!("{}%", (200 * hits + total) / (2 * total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationRow;

    fn matrix(calls: &[&[&str]]) -> MutationMatrix {
        let genes = (0..calls.len()).map(|i| format!("G{i}")).collect();
        let samples = (0..calls[0].len()).map(|i| format!("S-{i}")).collect();
        let calls = calls.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect();
        MutationMatrix::from_calls(genes, samples, calls).unwrap()
    }

    fn sample_names(m: &MutationMatrix) -> Vec<&str> {
        m.samples().iter().map(String::as_str).collect()
    }

    fn annotation(rows: &[(&str, &str)]) -> AnnotationTable {
        AnnotationTable::new(
            vec!["group".to_string()],
            rows.iter()
                .map(|(s, v)| AnnotationRow { sample: s.to_string(), values: vec![v.to_string()] })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn too_few_samples_or_genes_is_an_error() {
        let one_sample = matrix(&[&["A"], &["B"]]);
        assert!(matches!(
            prepare(&one_sample, None, None, &OncoprintOptions::default()),
            Err(OncoprintError::TooFewSamples { found: 1 })
        ));

        let one_gene = matrix(&[&["A", "B"]]);
        assert!(matches!(
            prepare(&one_gene, None, None, &OncoprintOptions::default()),
            Err(OncoprintError::TooFewGenes { found: 1 })
        ));

        let opts = OncoprintOptions { genes: GeneSelection::Top(1), ..Default::default() };
        let m = matrix(&[&["A", "B"], &["A", ""]]);
        assert!(matches!(prepare(&m, None, None, &opts), Err(OncoprintError::TooFewGenes { found: 1 })));
    }

    #[test]
    fn top_selects_first_rows_in_input_order() {
        let m = matrix(&[&["A", ""], &["", "A"], &["A", "A"], &["A", "A"], &["A", "A"]]);
        let opts = OncoprintOptions { genes: GeneSelection::Top(3), ..Default::default() };
        let p = prepare(&m, None, None, &opts).unwrap();
        assert_eq!(p.matrix.genes(), &["G0".to_string(), "G1".to_string(), "G2".to_string()]);
    }

    #[test]
    fn named_genes_keep_caller_order_and_reject_unknowns() {
        let m = matrix(&[&["A", ""], &["", "A"], &["A", "A"]]);
        let opts = OncoprintOptions {
            genes: GeneSelection::Named(vec!["G2".to_string(), "G0".to_string()]),
            ..Default::default()
        };
        let p = prepare(&m, None, None, &opts).unwrap();
        assert_eq!(p.matrix.genes(), &["G2".to_string(), "G0".to_string()]);

        let opts = OncoprintOptions {
            genes: GeneSelection::Named(vec!["G0".to_string(), "TP53".to_string()]),
            ..Default::default()
        };
        assert!(matches!(prepare(&m, None, None, &opts), Err(OncoprintError::UnknownGene(g)) if g == "TP53"));
    }

    #[test]
    fn remove_non_mutated_drops_zero_sum_columns_only() {
        let m = matrix(&[&["A", "", "", "B"], &["", "", "C", ""], &["", "D", "", ""]]);
        let opts = OncoprintOptions {
            genes: GeneSelection::Top(2),
            remove_non_mutated: true,
            sort: SortMode::None,
        };
        let p = prepare(&m, None, None, &opts).unwrap();
        // S-1 is only mutated in G2, which is not selected
        assert_eq!(sample_names(&p.matrix), vec!["S-0", "S-2", "S-3"]);
    }

    #[test]
    fn filtering_below_two_samples_is_an_error() {
        let m = matrix(&[&["A", "", ""], &["", "", ""]]);
        let opts = OncoprintOptions { remove_non_mutated: true, ..Default::default() };
        assert!(matches!(prepare(&m, None, None, &opts), Err(OncoprintError::TooFewSamples { found: 1 })));
    }

    #[test]
    fn sorting_is_a_permutation() {
        let m = matrix(&[&["", "A", "", "A"], &["A", "", "A", "A"]]);
        let sorted = prepare(&m, None, None, &OncoprintOptions::default()).unwrap();
        let unsorted = prepare(
            &m,
            None,
            None,
            &OncoprintOptions { sort: SortMode::None, ..Default::default() },
        )
        .unwrap();

        assert_eq!(sample_names(&unsorted.matrix), vec!["S-0", "S-1", "S-2", "S-3"]);
        assert_eq!(sample_names(&sorted.matrix), vec!["S-3", "S-1", "S-0", "S-2"]);

        let mut a = sample_names(&sorted.matrix);
        let mut b = sample_names(&unsorted.matrix);
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }

    #[test]
    fn labels_follow_their_sorted_counts() {
        let m = matrix(&[&["", "Amp"], &["Del", "Missense_Mutation"]]);
        let p = prepare(&m, None, None, &OncoprintOptions::default()).unwrap();
        assert_eq!(sample_names(&p.matrix), vec!["S-1", "S-0"]);
        assert_eq!(p.matrix.call(0, 0), "Amp");
        assert_eq!(p.matrix.call(1, 1), "Del");
        assert_eq!(p.matrix.count(1, 1), 1.0);
    }

    #[test]
    fn half_mutated_row_is_fifty_percent() {
        let m = matrix(&[&["A", "", "A", ""], &["A", "A", "A", "A"]]);
        let p = prepare(&m, None, None, &OncoprintOptions::default()).unwrap();
        assert_eq!(p.percentages, vec!["50%".to_string(), "100%".to_string()]);
        assert_eq!(format_percentage(1, 3), "33%");
        assert_eq!(format_percentage(1, 8), "13%");

        let mut row = vec!["A"; 23];
        row.extend(vec![""; 17]);
        let m = matrix(&[row.as_slice(), row.as_slice()]);
        let p = prepare(&m, None, None, &OncoprintOptions::default()).unwrap();
        assert_eq!(p.percentages[0], "58%");
    }

    #[test]
    fn repeated_gene_names_are_rejected() {
        let m = matrix(&[&["A", ""], &["", "A"]]);
        let opts = OncoprintOptions {
            genes: GeneSelection::Named(vec!["G0".to_string(), "G0".to_string()]),
            ..Default::default()
        };
        assert!(matches!(prepare(&m, None, None, &opts), Err(OncoprintError::DuplicateGene(g)) if g == "G0"));
    }

    #[test]
    fn annotation_sort_handles_mixed_numbers_and_text() {
        let n = 500;
        let row: Vec<&str> = (0..n).map(|i| if i % 3 == 0 { "A" } else { "" }).collect();
        let m = matrix(&[row.as_slice(), row.as_slice()]);
        let values: Vec<String> = (0..n)
            .map(|i| {
                let r = (i * 7919) % 1000;
                if i % 2 == 0 { format!("{r}") } else { format!("{r}a") }
            })
            .collect();
        let samples: Vec<String> = (0..n).map(|i| format!("S-{i}")).collect();
        let rows: Vec<(&str, &str)> = samples.iter().map(String::as_str).zip(values.iter().map(String::as_str)).collect();
        let table = annotation(&rows);

        let opts = OncoprintOptions { sort: SortMode::Annotation(vec!["group".to_string()]), ..Default::default() };
        let p = prepare(&m, Some(&table), None, &opts).unwrap();

        // the column is not numeric throughout, so it sorts as text
        let sorted: Vec<String> = p
            .matrix
            .samples()
            .iter()
            .map(|s| values[s.trim_start_matches("S-").parse::<usize>().unwrap()].clone())
            .collect();
        let mut expected = sorted.clone();
        expected.sort();
        assert_eq!(sorted, expected);
        assert_eq!(p.matrix.n_samples(), n);
    }

    #[test]
    fn numeric_annotation_sorts_by_value() {
        let m = matrix(&[&["A", "A", "A"], &["", "", ""]]);
        let table = annotation(&[("S-0", "10"), ("S-1", "9"), ("S-2", "2.5")]);
        let opts = OncoprintOptions { sort: SortMode::Annotation(vec!["group".to_string()]), ..Default::default() };
        let p = prepare(&m, Some(&table), None, &opts).unwrap();
        assert_eq!(sample_names(&p.matrix), vec!["S-2", "S-1", "S-0"]);
    }

    #[test]
    fn annotation_sort_without_table_is_an_error() {
        let m = matrix(&[&["A", ""], &["", "A"]]);
        let opts = OncoprintOptions { sort: SortMode::Annotation(vec!["group".to_string()]), ..Default::default() };
        assert!(matches!(prepare(&m, None, None, &opts), Err(OncoprintError::MissingAnnotationTable)));
    }

    #[test]
    fn annotation_sort_orders_by_value_then_pattern() {
        let m = matrix(&[&["", "A", "A", "", "A"], &["A", "", "A", "A", ""]]);
        let table = annotation(&[("S-0", "b"), ("S-1", "b"), ("S-2", "a"), ("S-3", "NA"), ("S-4", "a")]);
        let opts = OncoprintOptions { sort: SortMode::Annotation(vec!["group".to_string()]), ..Default::default() };
        let p = prepare(&m, Some(&table), None, &opts).unwrap();
        // a: S-2 (11) before S-4 (10); b: S-1 (10) before S-0 (01); S-3 has no usable row
        assert_eq!(sample_names(&p.matrix), vec!["S-2", "S-4", "S-1", "S-0", "S-3"]);
        assert_eq!(p.tracks.len(), 1);
        assert_eq!(p.tracks[0].cells.len(), 5);
    }

    #[test]
    fn annotation_sort_rejects_unknown_column() {
        let m = matrix(&[&["A", ""], &["", "A"]]);
        let table = annotation(&[("S-0", "x"), ("S-1", "y")]);
        let opts = OncoprintOptions { sort: SortMode::Annotation(vec!["stage".to_string()]), ..Default::default() };
        assert!(matches!(
            prepare(&m, Some(&table), None, &opts),
            Err(OncoprintError::UnknownAnnotationColumn(c)) if c == "stage"
        ));
    }
}

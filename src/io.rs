//! Tab-separated loaders used by the command-line front end.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::annotation::{AnnotationColors, AnnotationRow, AnnotationTable};
use crate::color::{parse_color, ColorMap};
use crate::error::{OncoprintError, Result};
use crate::matrix::MutationMatrix;

/// Non-empty lines of `path` with their 1-based line numbers.
fn read_lines(path: &Path, skip_comments: bool) -> Result<Vec<(usize, String)>> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() || (skip_comments && line.starts_with('#')) {
            continue;
        }
        lines.push((i + 1, line.to_string()));
    }
    Ok(lines)
}

fn parse_error(line: usize, message: impl Into<String>) -> OncoprintError {
    OncoprintError::Parse { line, message: message.into() }
}

/// A header row plus named rows, each padded to the header width.
struct Table {
    header: Vec<String>,
    rows: Vec<(usize, String, Vec<String>)>,
}

fn read_table(path: &Path) -> Result<Table> {
    let mut lines = read_lines(path, false)?.into_iter();
    let (header_line, header) = lines.next().ok_or_else(|| parse_error(1, "file is empty"))?;
    let header: Vec<String> = header.split('\t').skip(1).map(|s| s.trim().to_string()).collect();
    if header.is_empty() {
        return Err(parse_error(header_line, "header has no data columns"));
    }

    let mut rows = Vec::new();
    for (line_no, line) in lines {
        let mut fields = line.split('\t');
        let name = fields.next().unwrap_or_default().trim().to_string();
        let mut values: Vec<String> = fields.map(|s| s.trim().to_string()).collect();
        if values.len() > header.len() {
            return Err(parse_error(
                line_no,
                format!("{} values but the header has {} columns", values.len(), header.len()),
            ));
        }
        values.resize(header.len(), String::new());
        rows.push((line_no, name, values));
    }
    Ok(Table { header, rows })
}

/// Load the categorical matrix (and optionally the numeric one). Without a
/// counts file the counts are derived from the labels.
pub fn load_matrix(calls_path: &Path, counts_path: Option<&Path>) -> Result<MutationMatrix> {
    info!("Loading mutation calls from {:?}...", calls_path);
    let calls = read_table(calls_path)?;
    let samples = calls.header.clone();
    let genes: Vec<String> = calls.rows.iter().map(|(_, g, _)| g.clone()).collect();
    let labels: Vec<Vec<String>> = calls.rows.into_iter().map(|(_, _, v)| v).collect();

    let matrix = match counts_path {
        None => MutationMatrix::from_calls(genes, samples, labels)?,
        Some(path) => {
            let counts = load_counts(path, &genes, &samples)?;
            MutationMatrix::new(genes, samples, labels, counts)?
        }
    };
    info!("Found {} genes x {} samples", matrix.n_genes(), matrix.n_samples());
    Ok(matrix)
}

/// Numeric matrix, realigned by name to the given genes and samples.
fn load_counts(path: &Path, genes: &[String], samples: &[String]) -> Result<Vec<Vec<f64>>> {
    info!("Loading mutation counts from {:?}...", path);
    let table = read_table(path)?;

    let col_of: FxHashMap<&str, usize> =
        table.header.iter().enumerate().map(|(i, s)| (s.as_str(), i)).collect();
    let cols = samples
        .iter()
        .map(|s| {
            col_of.get(s.as_str()).copied().ok_or_else(|| {
                OncoprintError::ShapeMismatch(format!("sample {:?} is missing from the counts file", s))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut by_gene: FxHashMap<String, Vec<f64>> = FxHashMap::default();
    for (line_no, gene, values) in table.rows {
        let parsed = values
            .iter()
            .map(|v| match v.as_str() {
                "" | "NA" => Ok(0.0),
                v => v.parse::<f64>().map_err(|_| parse_error(line_no, format!("not a number: {:?}", v))),
            })
            .collect::<Result<Vec<f64>>>()?;
        by_gene.entry(gene).or_insert(parsed);
    }

    genes
        .iter()
        .map(|g| {
            let row = by_gene.get(g).ok_or_else(|| {
                OncoprintError::ShapeMismatch(format!("gene {:?} is missing from the counts file", g))
            })?;
            Ok(cols.iter().map(|&c| row[c]).collect())
        })
        .collect()
}

/// Annotation table: first column is the sample id. Short rows are padded
/// with empty values and later dropped as incomplete.
pub fn load_annotation(path: &Path) -> Result<AnnotationTable> {
    info!("Loading sample annotation from {:?}...", path);
    let table = read_table(path)?;
    debug!("Annotation columns: {}", table.header.join(", "));
    let rows = table
        .rows
        .into_iter()
        .map(|(_, sample, values)| AnnotationRow { sample, values })
        .collect();
    AnnotationTable::new(table.header, rows)
}

/// `category<TAB>color` lines; replaces the default palette.
pub fn load_color_map(path: &Path) -> Result<ColorMap> {
    let mut entries = Vec::new();
    for (line_no, line) in read_lines(path, true)? {
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 2 {
            return Err(parse_error(line_no, "expected category and color"));
        }
        entries.push((parts[0].trim().to_string(), parse_color(parts[1])?));
    }
    debug!("Loaded {} custom category colors", entries.len());
    Ok(ColorMap::custom(entries))
}

/// `column<TAB>value<TAB>color` lines.
pub fn load_annotation_colors(path: &Path) -> Result<AnnotationColors> {
    let mut colors = AnnotationColors::default();
    for (line_no, line) in read_lines(path, true)? {
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 3 {
            return Err(parse_error(line_no, "expected column, value and color"));
        }
        colors.insert(parts[0].trim(), parts[1].trim(), parse_color(parts[2])?);
    }
    Ok(colors)
}

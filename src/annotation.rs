use std::cmp::Ordering;

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::color::{hashed_color, ColorRamp, Rgb};
use crate::error::{OncoprintError, Result};

/// Fill used for samples that have no usable annotation row.
pub const MISSING_ANNOTATION: Rgb = Rgb(255, 255, 255);

const RAMP_LOW: Rgb = Rgb(239, 243, 255);
const RAMP_HIGH: Rgb = Rgb(8, 69, 148);

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRow {
    pub sample: String,
    pub values: Vec<String>,
}

/// Per-sample annotations: one row per sample id plus one value per column.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationTable {
    columns: Vec<String>,
    rows: Vec<AnnotationRow>,
}

/// Sample ids in annotation tables use `-` where matrix columns use `.`.
pub fn normalize_sample_id(id: &str) -> String {
    id.trim().replace('-', ".")
}

pub fn is_missing_value(v: &str) -> bool {
    let v = v.trim();
    v.is_empty() || v == "NA" || v == "NaN"
}

impl AnnotationTable {
    pub fn new(columns: Vec<String>, rows: Vec<AnnotationRow>) -> Result<Self> {
        if let Some(row) = rows.iter().find(|r| r.values.len() != columns.len()) {
            return Err(OncoprintError::ShapeMismatch(format!(
                "annotation row {:?} has {} values but there are {} columns",
                row.sample,
                row.values.len(),
                columns.len()
            )));
        }
        Ok(AnnotationTable { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[AnnotationRow] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| OncoprintError::UnknownAnnotationColumn(name.to_string()))
    }

    /// Normalize ids, keep the first row per sample and drop rows with
    /// any missing value. Dropped rows are only logged.
    pub fn cleaned(&self) -> AnnotationTable {
        let mut seen = FxHashSet::default();
        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let sample = normalize_sample_id(&row.sample);
            if !seen.insert(sample.clone()) {
                debug!("Dropping duplicate annotation row for sample {}", sample);
                continue;
            }
            if row.values.iter().any(|v| is_missing_value(v)) {
                debug!("Dropping incomplete annotation row for sample {}", sample);
                continue;
            }
            rows.push(AnnotationRow {
                sample,
                values: row.values.iter().map(|v| v.trim().to_string()).collect(),
            });
        }
        AnnotationTable { columns: self.columns.clone(), rows }
    }

    /// For each sample, the index of its row in this table (if any).
    pub fn align(&self, samples: &[String]) -> Vec<Option<usize>> {
        let by_id: FxHashMap<&str, usize> =
            self.rows.iter().enumerate().map(|(i, r)| (r.sample.as_str(), i)).collect();
        samples
            .iter()
            .map(|s| by_id.get(normalize_sample_id(s).as_str()).copied())
            .collect()
    }

    pub fn value(&self, row: usize, column: usize) -> &str {
        &self.rows[row].values[column]
    }
}

/// True when every value parses as a number. Decided once per column so
/// that a column is ordered either numerically or as text, never both.
pub fn is_numeric_column<'a>(values: impl IntoIterator<Item = &'a str>) -> bool {
    values.into_iter().all(|v| v.parse::<f64>().is_ok())
}

/// Compare two values of one column. In a numeric column numbers sort
/// before anything unparsable; otherwise values compare as strings.
pub fn compare_values(a: &str, b: &str, numeric: bool) -> Ordering {
    if !numeric {
        return a.cmp(b);
    }
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Caller-supplied colors, keyed by annotation column then value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationColors {
    by_column: FxHashMap<String, FxHashMap<String, Rgb>>,
}

impl AnnotationColors {
    pub fn insert<C: Into<String>, V: Into<String>>(&mut self, column: C, value: V, color: Rgb) {
        self.by_column.entry(column.into()).or_default().insert(value.into(), color);
    }

    pub fn column(&self, column: &str) -> Option<&FxHashMap<String, Rgb>> {
        self.by_column.get(column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackScale {
    Categorical(Vec<(String, Rgb)>),
    Continuous(ColorRamp),
}

/// One annotation column resolved to a color per displayed sample.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationTrack {
    pub name: String,
    pub cells: Vec<Rgb>,
    pub scale: TrackScale,
}

/// Resolve every column of `table` against the final sample order.
pub fn resolve_tracks(
    table: &AnnotationTable,
    aligned: &[Option<usize>],
    colors: Option<&AnnotationColors>,
) -> Vec<AnnotationTrack> {
    table
        .columns()
        .iter()
        .enumerate()
        .map(|(col, name)| {
            let values: Vec<Option<&str>> =
                aligned.iter().map(|row| row.map(|r| table.value(r, col))).collect();
            let custom = colors.and_then(|c| c.column(name));
            resolve_track(name, &values, custom)
        })
        .collect()
}

fn resolve_track(
    name: &str,
    values: &[Option<&str>],
    custom: Option<&FxHashMap<String, Rgb>>,
) -> AnnotationTrack {
    let present: Vec<&str> = values.iter().flatten().copied().collect();
    let numbers: Option<Vec<f64>> = present.iter().map(|v| v.parse::<f64>().ok()).collect();
    let numeric = numbers.is_some();

    if let (None, Some(numbers)) = (custom, numbers.filter(|n| !n.is_empty())) {
        let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
        let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let ramp = ColorRamp { min, max, low: RAMP_LOW, high: RAMP_HIGH };
        let cells = values
            .iter()
            .map(|v| match v.and_then(|v| v.parse::<f64>().ok()) {
                Some(x) => ramp.color(x),
                None => MISSING_ANNOTATION,
            })
            .collect();
        return AnnotationTrack { name: name.to_string(), cells, scale: TrackScale::Continuous(ramp) };
    }

    let color_of = |v: &str| -> Rgb {
        custom
            .and_then(|c| c.get(v).copied())
            .unwrap_or_else(|| hashed_color(&format!("{}/{}", name, v)))
    };

    let mut levels: Vec<&str> = present.clone();
    levels.sort_by(|a, b| compare_values(a, b, numeric));
    levels.dedup();

    AnnotationTrack {
        name: name.to_string(),
        cells: values.iter().map(|v| v.map_or(MISSING_ANNOTATION, |v| color_of(v))).collect(),
        scale: TrackScale::Categorical(levels.iter().map(|v| (v.to_string(), color_of(v))).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(sample: &str, values: &[&str]) -> AnnotationRow {
        AnnotationRow { sample: sample.to_string(), values: values.iter().map(|v| v.to_string()).collect() }
    }

    fn table() -> AnnotationTable {
        AnnotationTable::new(
            vec!["stage".to_string(), "age".to_string()],
            vec![
                row("TCGA-01", &["II", "50"]),
                row("TCGA-02", &["I", "NA"]),
                row("TCGA-01", &["III", "70"]),
                row("TCGA-03", &["III", "30"]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn cleaning_normalizes_dedups_and_drops_incomplete() {
        let t = table().cleaned();
        let ids: Vec<&str> = t.rows().iter().map(|r| r.sample.as_str()).collect();
        assert_eq!(ids, vec!["TCGA.01", "TCGA.03"]);
        assert_eq!(t.rows()[0].values, vec!["II".to_string(), "50".to_string()]);
    }

    #[test]
    fn align_follows_sample_order() {
        let t = table().cleaned();
        let samples = vec!["TCGA.03".to_string(), "TCGA.02".to_string(), "TCGA-01".to_string()];
        assert_eq!(t.align(&samples), vec![Some(1), None, Some(0)]);
    }

    #[test]
    fn numeric_column_gets_ramp_and_text_column_gets_levels() {
        let t = table().cleaned();
        let aligned = t.align(&["TCGA.01".to_string(), "TCGA.03".to_string(), "X".to_string()]);
        let tracks = resolve_tracks(&t, &aligned, None);
        assert_eq!(tracks.len(), 2);

        match &tracks[0].scale {
            TrackScale::Categorical(levels) => {
                let names: Vec<&str> = levels.iter().map(|(v, _)| v.as_str()).collect();
                assert_eq!(names, vec!["II", "III"]);
            }
            other => panic!("expected categorical, got {other:?}"),
        }
        assert_eq!(tracks[0].cells[2], MISSING_ANNOTATION);

        match &tracks[1].scale {
            TrackScale::Continuous(ramp) => {
                assert_eq!(ramp.min, 30.0);
                assert_eq!(ramp.max, 50.0);
            }
            other => panic!("expected continuous, got {other:?}"),
        }
        assert_eq!(tracks[1].cells[0], RAMP_HIGH);
        assert_eq!(tracks[1].cells[1], RAMP_LOW);
    }

    #[test]
    fn caller_colors_win() {
        let t = table().cleaned();
        let mut colors = AnnotationColors::default();
        colors.insert("stage", "II", Rgb(1, 2, 3));
        let aligned = t.align(&["TCGA.01".to_string(), "TCGA.03".to_string()]);
        let tracks = resolve_tracks(&t, &aligned, Some(&colors));
        assert_eq!(tracks[0].cells[0], Rgb(1, 2, 3));
        assert_eq!(tracks[0].cells[1], hashed_color("stage/III"));
    }

    #[test]
    fn rows_must_match_columns() {
        let err = AnnotationTable::new(vec!["a".to_string()], vec![row("s", &["1", "2"])]).unwrap_err();
        assert!(matches!(err, OncoprintError::ShapeMismatch(_)));
    }

    #[test]
    fn values_compare_numerically_only_in_numeric_columns() {
        assert!(is_numeric_column(["9", "10", "2.5"]));
        assert!(!is_numeric_column(["9", "10", "1a"]));
        assert_eq!(compare_values("9", "10", true), Ordering::Less);
        assert_eq!(compare_values("9", "10", false), Ordering::Greater);
        assert_eq!(compare_values("b", "a", false), Ordering::Greater);
        assert_eq!(compare_values("1a", "9", true), Ordering::Greater);
    }

    #[test]
    fn mixed_stage_levels_are_sorted_once_each() {
        let rows: Vec<AnnotationRow> = (0..300)
            .map(|i| {
                let r = i % 100;
                let value = if (i / 100) % 2 == 0 { format!("{r}") } else { format!("{r}a") };
                row(&format!("S{i}"), &[value.as_str()])
            })
            .collect();
        let t = AnnotationTable::new(vec!["stage".to_string()], rows).unwrap();
        let samples: Vec<String> = (0..300).map(|i| format!("S{i}")).collect();
        let tracks = resolve_tracks(&t, &t.align(&samples), None);

        let levels: Vec<&str> = match &tracks[0].scale {
            TrackScale::Categorical(levels) => levels.iter().map(|(v, _)| v.as_str()).collect(),
            other => panic!("expected categorical, got {other:?}"),
        };
        let mut expected = levels.clone();
        expected.sort();
        expected.dedup();
        assert_eq!(levels, expected);
        assert!(levels.contains(&"10") && levels.contains(&"1a") && levels.contains(&"9"));
    }
}

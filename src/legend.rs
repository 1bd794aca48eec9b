use crate::annotation::{AnnotationTrack, TrackScale};
use crate::color::{is_copy_number, ColorMap, Rgb};

pub const ALTERATIONS_TITLE: &str = "Alterations";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendKey {
    Fill(Rgb),
    Bar(Rgb),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendEntry {
    pub label: String,
    pub key: LegendKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendBlock {
    pub title: String,
    pub entries: Vec<LegendEntry>,
}

/// Legend for the mutation categories of `colors`, in declaration order.
/// The no-mutation placeholder is not a category and never shows up here.
pub fn mutation_legend(colors: &ColorMap) -> LegendBlock {
    let entries = colors
        .categories()
        .map(|(category, color)| LegendEntry {
            label: category.to_string(),
            key: if is_copy_number(category) {
                LegendKey::Bar(color)
            } else {
                LegendKey::Fill(color)
            },
        })
        .collect();
    LegendBlock { title: ALTERATIONS_TITLE.to_string(), entries }
}

/// One block per annotation track. Continuous tracks list their two ends.
pub fn annotation_legends(tracks: &[AnnotationTrack]) -> Vec<LegendBlock> {
    tracks
        .iter()
        .map(|track| {
            let entries = match &track.scale {
                TrackScale::Categorical(levels) => levels
                    .iter()
                    .map(|(value, color)| LegendEntry { label: value.clone(), key: LegendKey::Fill(*color) })
                    .collect(),
                TrackScale::Continuous(ramp) => vec![
                    LegendEntry { label: format_number(ramp.min), key: LegendKey::Fill(ramp.low) },
                    LegendEntry { label: format_number(ramp.max), key: LegendKey::Fill(ramp.high) },
                ],
            };
            LegendBlock { title: track.name.clone(), entries }
        })
        .collect()
}

fn format_number(x: f64) -> String {
    if x.fract() == 0.0 {
        format!("{:.0}", x)
    } else {
        format!("{:.2}", x)
    }
}

use log::debug;

use crate::color::{is_copy_number, ColorMap, Rgb};
use crate::matrix::split_categories;

/// One paint operation inside a cell, in drawing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellLayer {
    /// Whole cell in the no-mutation color.
    Background(Rgb),
    /// Whole cell in a mutation color.
    Fill(Rgb),
    /// Full-width, reduced-height bar centered in the cell (Amp/Del).
    Bar(Rgb),
}

/// Resolve the paint stack for a cell label.
///
/// The background is painted exactly once, first. Every category then adds
/// its own layer in label order, so a multi-hit cell like
/// `Missense_Mutation;Amp` keeps both indicators visible.
pub fn cell_layers(label: &str, colors: &ColorMap) -> Vec<CellLayer> {
    let mut layers = vec![CellLayer::Background(colors.background())];
    for category in split_categories(label) {
        let Some(color) = colors.get(category) else {
            debug!("No color for category {:?}; leaving it out of the cell", category);
            continue;
        };
        layers.push(if is_copy_number(category) {
            CellLayer::Bar(color)
        } else {
            CellLayer::Fill(color)
        });
    }
    layers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_placeholder_cells_are_background_only() {
        let map = ColorMap::default();
        let bg = CellLayer::Background(map.background());
        assert_eq!(cell_layers("", &map), vec![bg]);
        assert_eq!(cell_layers("background", &map), vec![bg]);
        assert_eq!(cell_layers(" ; ", &map), vec![bg]);
    }

    #[test]
    fn single_point_mutation_fills_the_cell() {
        let map = ColorMap::default();
        let layers = cell_layers("Nonsense_Mutation", &map);
        assert_eq!(
            layers,
            vec![
                CellLayer::Background(map.background()),
                CellLayer::Fill(map.get("Nonsense_Mutation").unwrap()),
            ]
        );
    }

    #[test]
    fn copy_number_is_a_bar() {
        let map = ColorMap::default();
        let layers = cell_layers("Del", &map);
        assert_eq!(layers[1], CellLayer::Bar(map.get("Del").unwrap()));
    }

    #[test]
    fn multi_hit_keeps_both_indicators_over_one_background() {
        let map = ColorMap::default();
        let layers = cell_layers("Missense_Mutation;Amp", &map);
        assert_eq!(
            layers,
            vec![
                CellLayer::Background(map.background()),
                CellLayer::Fill(map.get("Missense_Mutation").unwrap()),
                CellLayer::Bar(map.get("Amp").unwrap()),
            ]
        );
        let backgrounds = layers.iter().filter(|l| matches!(l, CellLayer::Background(_))).count();
        assert_eq!(backgrounds, 1);
    }

    #[test]
    fn unmapped_categories_are_skipped() {
        let map = ColorMap::custom([("Amp", Rgb(1, 1, 1))]);
        let layers = cell_layers("Missense_Mutation;Amp", &map);
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[1], CellLayer::Bar(Rgb(1, 1, 1)));
    }
}

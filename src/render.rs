use std::fs::File;
use std::io::Write;
use std::path::Path;

use log::{debug, info};

use crate::annotation::{AnnotationColors, AnnotationTable};
use crate::canvas::{char_size, text_width, truncate_label, Anchor, Canvas, RasterCanvas, SvgCanvas};
use crate::cell::{cell_layers, CellLayer};
use crate::color::{ColorMap, Rgb};
use crate::error::Result;
use crate::legend::{annotation_legends, mutation_legend, LegendBlock, LegendKey};
use crate::matrix::MutationMatrix;
use crate::prepare::{prepare, OncoprintOptions, PreparedOncoprint};

/// Visual parameters. All lengths are in output pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
    pub cell_width: f64,
    pub cell_height: f64,
    /// Space left between neighbouring cells.
    pub cell_gap: f64,
    /// Height of an Amp/Del bar relative to the cell.
    pub bar_fraction: f64,
    pub annotation_height: f64,
    pub font_size: u32,
    pub margin: f64,
    pub max_label_chars: usize,
    pub show_sample_names: bool,
    pub show_legend: bool,
    pub text_color: Rgb,
}

impl Default for RenderStyle {
    fn default() -> Self {
        RenderStyle {
            cell_width: 12.0,
            cell_height: 24.0,
            cell_gap: 2.0,
            bar_fraction: 1.0 / 3.0,
            annotation_height: 10.0,
            font_size: 8,
            margin: 10.0,
            max_label_chars: 24,
            show_sample_names: false,
            show_legend: true,
            text_color: Rgb::BLACK,
        }
    }
}

/// What the caller hands over: the matrix plus optional extras.
#[derive(Debug, Clone, Copy)]
pub struct OncoprintInput<'a> {
    pub matrix: &'a MutationMatrix,
    pub annotation: Option<&'a AnnotationTable>,
    pub annotation_colors: Option<&'a AnnotationColors>,
    pub colors: &'a ColorMap,
}

/// Positions of every part of the figure.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub grid_x: f64,
    pub grid_y: f64,
    pub percent_x: f64,
    pub tracks_y: f64,
    pub names_y: f64,
    pub legend_x: f64,
    pub line_height: f64,
    pub width: u32,
    pub height: u32,
}

/// A prepared oncoprint, ready to lay out and draw.
pub struct Oncoprint<'a> {
    prepared: PreparedOncoprint,
    colors: &'a ColorMap,
    legends: Vec<LegendBlock>,
}

impl<'a> Oncoprint<'a> {
    pub fn new(input: &OncoprintInput<'a>, options: &OncoprintOptions) -> Result<Self> {
        let prepared = prepare(input.matrix, input.annotation, input.annotation_colors, options)?;
        let mut legends = vec![mutation_legend(input.colors)];
        legends.extend(annotation_legends(&prepared.tracks));
        Ok(Oncoprint { prepared, colors: input.colors, legends })
    }

    pub fn prepared(&self) -> &PreparedOncoprint {
        &self.prepared
    }

    pub fn legends(&self) -> &[LegendBlock] {
        &self.legends
    }

    pub fn layout(&self, style: &RenderStyle) -> Layout {
        let m = &self.prepared.matrix;
        let cs = char_size(style.font_size) as f64;
        let label = |s: &str| text_width(&truncate_label(s, style.max_label_chars), style.font_size);

        let label_width = m
            .genes()
            .iter()
            .map(String::as_str)
            .chain(self.prepared.tracks.iter().map(|t| t.name.as_str()))
            .map(label)
            .fold(0.0, f64::max);

        let grid_x = style.margin + label_width + cs;
        let grid_y = style.margin;
        let grid_w = m.n_samples() as f64 * style.cell_width;
        let grid_h = m.n_genes() as f64 * style.cell_height;

        let percent_x = grid_x + grid_w + cs / 2.0;
        let percent_w = text_width("100%", style.font_size);

        let tracks_y = grid_y + grid_h + style.cell_gap * 2.0;
        let tracks_h = self.prepared.tracks.len() as f64 * (style.annotation_height + style.cell_gap);

        let names_y = tracks_y + tracks_h + style.cell_gap;
        let names_h = if style.show_sample_names {
            m.samples().iter().map(|s| label(s)).fold(0.0, f64::max)
        } else {
            0.0
        };

        let line_height = cs + 6.0;
        let legend_x = percent_x + percent_w + cs * 2.0;
        let (legend_w, legend_h) = if style.show_legend {
            let w = self
                .legends
                .iter()
                .flat_map(|b| {
                    std::iter::once(label(&b.title))
                        .chain(b.entries.iter().map(|e| cs * 2.0 + label(&e.label)))
                })
                .fold(0.0, f64::max);
            let lines: usize = self.legends.iter().map(|b| b.entries.len() + 2).sum();
            (w, lines as f64 * line_height)
        } else {
            (0.0, 0.0)
        };

        let right = if style.show_legend { legend_x + legend_w } else { percent_x + percent_w };
        let bottom = (names_y + names_h).max(grid_y + legend_h);

        Layout {
            grid_x,
            grid_y,
            percent_x,
            tracks_y,
            names_y,
            legend_x,
            line_height,
            width: (right + style.margin).ceil() as u32,
            height: (bottom + style.margin).ceil() as u32,
        }
    }

    pub fn draw(&self, layout: &Layout, style: &RenderStyle, canvas: &mut dyn Canvas) {
        let m = &self.prepared.matrix;
        let cs = char_size(style.font_size) as f64;
        let gap = style.cell_gap;

        for g in 0..m.n_genes() {
            let y = layout.grid_y + g as f64 * style.cell_height;
            let mid = y + style.cell_height / 2.0;
            let name = truncate_label(&m.genes()[g], style.max_label_chars);
            canvas.text(layout.grid_x - cs / 2.0, mid, &name, style.font_size, style.text_color, Anchor::End);
            canvas.text(
                layout.percent_x,
                mid,
                &self.prepared.percentages[g],
                style.font_size,
                style.text_color,
                Anchor::Start,
            );

            for s in 0..m.n_samples() {
                let x = layout.grid_x + s as f64 * style.cell_width;
                let layers = cell_layers(m.call(g, s), self.colors);
                paint_cell(
                    canvas,
                    x + gap / 2.0,
                    y + gap / 2.0,
                    style.cell_width - gap,
                    style.cell_height - gap,
                    style.bar_fraction,
                    &layers,
                );
            }
        }
        debug!("Drew {} cells", m.n_genes() * m.n_samples());

        for (t, track) in self.prepared.tracks.iter().enumerate() {
            let y = layout.tracks_y + t as f64 * (style.annotation_height + gap);
            let name = truncate_label(&track.name, style.max_label_chars);
            canvas.text(
                layout.grid_x - cs / 2.0,
                y + style.annotation_height / 2.0,
                &name,
                style.font_size,
                style.text_color,
                Anchor::End,
            );
            for (s, color) in track.cells.iter().enumerate() {
                let x = layout.grid_x + s as f64 * style.cell_width;
                canvas.fill_rect(x + gap / 2.0, y, style.cell_width - gap, style.annotation_height, *color);
            }
        }

        if style.show_sample_names {
            for (s, sample) in m.samples().iter().enumerate() {
                let x = layout.grid_x + (s as f64 + 0.5) * style.cell_width;
                let name = truncate_label(sample, style.max_label_chars);
                canvas.vertical_text(x, layout.names_y, &name, style.font_size, style.text_color);
            }
        }

        if style.show_legend {
            self.draw_legends(layout, style, canvas);
        }
    }

    fn draw_legends(&self, layout: &Layout, style: &RenderStyle, canvas: &mut dyn Canvas) {
        let cs = char_size(style.font_size) as f64;
        let mut y = layout.grid_y + layout.line_height / 2.0;
        for block in &self.legends {
            let title = truncate_label(&block.title, style.max_label_chars);
            canvas.text(layout.legend_x, y, &title, style.font_size, style.text_color, Anchor::Start);
            y += layout.line_height;
            for entry in &block.entries {
                let top = y - cs / 2.0;
                let layers = match entry.key {
                    LegendKey::Fill(c) => vec![CellLayer::Fill(c)],
                    LegendKey::Bar(c) => vec![CellLayer::Background(self.colors.background()), CellLayer::Bar(c)],
                };
                paint_cell(canvas, layout.legend_x, top, cs, cs, style.bar_fraction, &layers);
                let label = truncate_label(&entry.label, style.max_label_chars);
                canvas.text(layout.legend_x + cs * 2.0, y, &label, style.font_size, style.text_color, Anchor::Start);
                y += layout.line_height;
            }
            y += layout.line_height;
        }
    }
}

/// Paint a resolved layer stack into the given box.
fn paint_cell(canvas: &mut dyn Canvas, x: f64, y: f64, w: f64, h: f64, bar_fraction: f64, layers: &[CellLayer]) {
    for layer in layers {
        match *layer {
            CellLayer::Background(c) | CellLayer::Fill(c) => canvas.fill_rect(x, y, w, h, c),
            CellLayer::Bar(c) => {
                let bar_h = h * bar_fraction;
                canvas.fill_rect(x, y + (h - bar_h) / 2.0, w, bar_h, c);
            }
        }
    }
}

/// Prepare and draw onto a caller-owned canvas. Nothing is drawn when the
/// input is rejected.
pub fn draw_oncoprint(
    input: &OncoprintInput<'_>,
    options: &OncoprintOptions,
    style: &RenderStyle,
    canvas: &mut dyn Canvas,
) -> Result<()> {
    let print = Oncoprint::new(input, options)?;
    let layout = print.layout(style);
    print.draw(&layout, style, canvas);
    Ok(())
}

/// Render to `out`, as SVG if the extension says so and PNG otherwise.
pub fn render_to_file(
    input: &OncoprintInput<'_>,
    options: &OncoprintOptions,
    style: &RenderStyle,
    out: &Path,
) -> Result<()> {
    let print = Oncoprint::new(input, options)?;
    let layout = print.layout(style);
    debug!("Canvas size: {}x{}", layout.width, layout.height);

    let is_svg = out
        .extension()
        .map(|ext| ext.to_ascii_lowercase() == "svg")
        .unwrap_or(false);

    if is_svg {
        info!("Rendering SVG...");
        let mut canvas = SvgCanvas::new(layout.width, layout.height);
        print.draw(&layout, style, &mut canvas);
        info!("Saving to {:?}...", out);
        let mut file = File::create(out)?;
        file.write_all(canvas.finish().as_bytes())?;
    } else {
        info!("Rendering image...");
        let mut canvas = RasterCanvas::new(layout.width, layout.height);
        print.draw(&layout, style, &mut canvas);
        info!("Saving to {:?}...", out);
        canvas.save(out)?;
    }
    Ok(())
}

use clap::Parser;
use log::info;
use std::path::PathBuf;

use oncolook::io::{load_annotation, load_annotation_colors, load_color_map, load_matrix};
use oncolook::{
    render_to_file, ColorMap, GeneSelection, OncoprintInput, OncoprintOptions, RenderStyle, SortMode,
};

#[derive(Parser)]
#[command(name = "oncolook")]
#[command(about = "Draw a mutation oncoprint (genes x samples).", long_about = None)]
struct Args {
    // MANDATORY OPTIONS
    /// Load mutation labels from this TSV FILE (genes as rows, samples as columns).
    #[arg(short = 'm', long = "calls", value_name = "FILE")]
    calls: PathBuf,

    /// Write the plot to this FILE (PNG or SVG based on extension).
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    out: PathBuf,

    // Input Options
    /// Numeric companion matrix used for sorting and filtering (derived from the labels if absent).
    #[arg(short = 'n', long = "counts", value_name = "FILE")]
    counts: Option<PathBuf>,

    /// Per-sample annotation TSV; the first column holds sample ids.
    #[arg(short = 'a', long = "annotation", value_name = "FILE")]
    annotation: Option<PathBuf>,

    /// Annotation colors as column<TAB>value<TAB>color lines.
    #[arg(long = "annotation-colors", value_name = "FILE", requires = "annotation")]
    annotation_colors: Option<PathBuf>,

    /// Mutation category colors as category<TAB>color lines, replacing the defaults.
    #[arg(short = 'c', long = "colors", value_name = "FILE")]
    colors: Option<PathBuf>,

    // Gene/Sample Selection Options
    /// Comma-separated genes to display, in this order.
    #[arg(short = 'g', long = "genes", value_name = "LIST", value_delimiter = ',', conflicts_with = "top")]
    genes: Option<Vec<String>>,

    /// Display the first N genes of the matrix.
    #[arg(short = 'k', long = "top", value_name = "N", default_value_t = oncolook::prepare::DEFAULT_TOP_GENES)]
    top: usize,

    /// Drop samples without any mutation in the displayed genes.
    #[arg(short = 'r', long = "remove-non-mutated")]
    remove_non_mutated: bool,

    // Sorting Options
    /// Keep samples in input order.
    #[arg(long = "no-sort")]
    no_sort: bool,

    /// Sort samples by this annotation column (repeatable).
    #[arg(short = 's', long = "sort-by-annotation", value_name = "COLUMN", conflicts_with = "no_sort")]
    sort_by_annotation: Vec<String>,

    // Visualization Options
    /// Width in pixels of one sample column.
    #[arg(short = 'x', long = "cell-width", value_name = "N", default_value_t = 12)]
    cell_width: u32,

    /// Height in pixels of one gene row.
    #[arg(short = 'y', long = "cell-height", value_name = "N", default_value_t = 24)]
    cell_height: u32,

    /// Font size in pixels.
    #[arg(short = 'f', long = "font-size", value_name = "N", default_value_t = 8)]
    font_size: u32,

    /// Write sample names below the grid.
    #[arg(short = 'S', long = "show-sample-names")]
    show_sample_names: bool,

    /// Don't draw legends.
    #[arg(short = 'L', long = "hide-legend")]
    hide_legend: bool,

    // Threading
    /// Number of threads to use for parallel operations.
    #[arg(short = 't', long = "threads", value_name = "N")]
    threads: Option<usize>,

    // Logging
    /// Verbosity level (0 = error, 1 = info, 2 = debug).
    #[arg(short = 'v', long = "verbose", value_name = "N", default_value_t = 1)]
    verbose: u8,
}

impl Args {
    fn options(&self) -> OncoprintOptions {
        let genes = match &self.genes {
            Some(list) => GeneSelection::Named(list.iter().map(|g| g.trim().to_string()).collect()),
            None => GeneSelection::Top(self.top),
        };
        let sort = if self.no_sort {
            SortMode::None
        } else if !self.sort_by_annotation.is_empty() {
            SortMode::Annotation(self.sort_by_annotation.clone())
        } else {
            SortMode::Mutation
        };
        OncoprintOptions { genes, remove_non_mutated: self.remove_non_mutated, sort }
    }

    fn style(&self) -> RenderStyle {
        RenderStyle {
            cell_width: self.cell_width as f64,
            cell_height: self.cell_height as f64,
            font_size: self.font_size,
            show_sample_names: self.show_sample_names,
            show_legend: !self.hide_legend,
            ..Default::default()
        }
    }
}

fn run(args: &Args) -> oncolook::Result<()> {
    let matrix = load_matrix(&args.calls, args.counts.as_deref())?;
    let annotation = args.annotation.as_deref().map(load_annotation).transpose()?;
    let annotation_colors = args.annotation_colors.as_deref().map(load_annotation_colors).transpose()?;
    let colors = match &args.colors {
        Some(path) => load_color_map(path)?,
        None => ColorMap::default(),
    };

    let input = OncoprintInput {
        matrix: &matrix,
        annotation: annotation.as_ref(),
        annotation_colors: annotation_colors.as_ref(),
        colors: &colors,
    };
    render_to_file(&input, &args.options(), &args.style(), &args.out)
}

fn main() {
    let args = Args::parse();

    // Initialize logger based on verbosity
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    if let Some(threads) = args.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global() {
            eprintln!("Warning: could not configure thread pool: {}", e);
        }
    }

    info!("Starting oncoprint...");

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    info!("Done.");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["oncolook", "-m", "calls.tsv", "-o", "out.png"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_select_top_five_and_sort_by_mutation() {
        let opts = parse(&[]).options();
        assert_eq!(opts.genes, GeneSelection::Top(5));
        assert_eq!(opts.sort, SortMode::Mutation);
        assert!(!opts.remove_non_mutated);
    }

    #[test]
    fn gene_list_and_annotation_sort() {
        let opts = parse(&["-g", "TP53,KRAS", "-s", "stage", "-s", "age", "-r"]).options();
        assert_eq!(opts.genes, GeneSelection::Named(vec!["TP53".to_string(), "KRAS".to_string()]));
        assert_eq!(opts.sort, SortMode::Annotation(vec!["stage".to_string(), "age".to_string()]));
        assert!(opts.remove_non_mutated);
    }

    #[test]
    fn sort_modes_are_exclusive() {
        let argv = ["oncolook", "-m", "c", "-o", "o", "--no-sort", "-s", "stage"];
        assert!(Args::try_parse_from(argv).is_err());
        assert_eq!(parse(&["--no-sort"]).options().sort, SortMode::None);
    }

    #[test]
    fn style_follows_flags() {
        let style = parse(&["-x", "20", "-S", "-L"]).style();
        assert_eq!(style.cell_width, 20.0);
        assert!(style.show_sample_names);
        assert!(!style.show_legend);
    }
}

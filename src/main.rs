use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tractplot::parser::parse_chart_spec;
use tractplot::preprocessor::expand_variables;
use tractplot::{gallery, Chart, ChartSpec, RenderConfig, Table};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tractplot")]
#[command(about = "Chart census tract CSV data from declarative chart specs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one chart, to a file or as SVG on stdout
    Render(RenderArgs),
    /// Export every gallery preset as an HTML page
    Gallery {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
        /// JSON render config (width, height, renderer)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List the distinct (Category, Subcategory) pairs in a data file
    Inspect {
        #[arg(long)]
        data: PathBuf,
    },
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[arg(long)]
    data: PathBuf,
    /// Chart DSL (e.g. 'bar() | x(Decade:O) | y(Count:Q) | color(Subcategory:N)')
    #[arg(long, conflicts_with = "spec_file")]
    spec: Option<String>,
    /// Chart spec as JSON
    #[arg(long)]
    spec_file: Option<PathBuf>,
    /// Preset from the gallery
    #[arg(long, conflicts_with_all = ["spec", "spec_file"])]
    preset: Option<String>,
    /// DSL variable, substituted for $name (repeatable)
    #[arg(long = "var", value_parser = parse_key_val, requires = "spec")]
    vars: Vec<(String, String)>,
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output file; the extension picks html, svg, png or json
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid variable '{}', expected name=value", s))?;
    Ok((key.trim().to_string(), value.to_string()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match Cli::parse().command {
        Command::Render(args) => render(args),
        Command::Gallery {
            data,
            out_dir,
            config,
        } => {
            let table = load_table(&data)?;
            let config = load_config(config.as_deref())?;
            let written = gallery::render_gallery(&table, &out_dir, &config)
                .context("Failed to render gallery")?;
            for path in written {
                println!("{}", path.display());
            }
            Ok(())
        }
        Command::Inspect { data } => {
            let table = load_table(&data)?;
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            for (category, subcategory) in table.category_pairs() {
                writeln!(handle, "{}\t{}", category, subcategory)?;
            }
            Ok(())
        }
    }
}

fn render(args: RenderArgs) -> Result<()> {
    let table = load_table(&args.data)?;
    let config = load_config(args.config.as_deref())?;

    let spec = match (&args.spec, &args.spec_file, &args.preset) {
        (Some(dsl), _, _) => {
            let vars: HashMap<String, String> = args.vars.iter().cloned().collect();
            let expanded = expand_variables(dsl, &vars).context("Failed to expand variables")?;
            parse_chart_spec(&expanded).context("Failed to parse chart spec")?
        }
        (None, Some(path), _) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read spec file '{}'", path.display()))?;
            ChartSpec::from_json(&json).context("Failed to parse spec file")?
        }
        (None, None, Some(name)) => match gallery::preset(name) {
            Some(spec) => spec,
            None => bail!(
                "Unknown preset '{}'. Available: {}",
                name,
                gallery::PRESET_NAMES.join(", ")
            ),
        },
        (None, None, None) => bail!("One of --spec, --spec-file or --preset is required"),
    };

    let chart = Chart::new(&table, spec).context("Invalid chart spec")?;

    match &args.output {
        Some(path) => chart
            .export(path, &config)
            .with_context(|| format!("Failed to export chart to '{}'", path.display()))?,
        None => {
            let visual = chart.render(&config).context("Failed to render chart")?;
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(visual.as_bytes())
                .context("Failed to write chart to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(())
}

fn load_table(path: &Path) -> Result<Table> {
    Table::from_path(path).with_context(|| format!("Failed to load data from '{}'", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<RenderConfig> {
    match path {
        Some(p) => RenderConfig::from_path(p)
            .with_context(|| format!("Failed to load render config '{}'", p.display())),
        None => Ok(RenderConfig::default()),
    }
}

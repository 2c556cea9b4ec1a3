// Library exports for tractplot

pub mod data;
pub mod error;
pub mod export;
pub mod gallery;
pub mod graph;
pub mod palette;
pub mod parser;
pub mod preprocessor;
pub mod sort;
pub mod spec;

// Pipeline phases
pub mod ir;
pub mod resolve;
pub mod transform;
pub mod scale;
pub mod compiler;

pub use data::{Field, Literal, Record, Table};
pub use error::{ChartError, Result};
pub use spec::{
    Aggregate, CalcExpr, Channel, ChannelDef, ChartSpec, FieldType, Mark, Predicate, SortOrder,
    StackMode, Transform,
};

use data::Row;
use ir::{EncodedSeries, ResolvedChart, SceneGraph};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum Renderer {
    #[serde(rename = "svg")]
    #[default]
    Svg,
    #[serde(rename = "png")]
    Png,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RenderConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub renderer: Renderer,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            renderer: Renderer::Svg,
        }
    }
}

impl RenderConfig {
    /// Load a config from a JSON file; missing keys take their defaults
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ChartError::io(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// An in-memory rendering of a chart
#[derive(Debug, Clone, PartialEq)]
pub enum Visual {
    Svg(String),
    Png(Vec<u8>),
}

impl Visual {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Visual::Svg(s) => s.as_bytes(),
            Visual::Png(b) => b,
        }
    }
}

/// A chart spec bound to a table with every field reference checked.
///
/// Rendering and exporting borrow the chart, so it can be rendered any number
/// of times without changing.
#[derive(Debug, Clone)]
pub struct Chart<'t> {
    table: &'t Table,
    spec: ChartSpec,
    resolved: ResolvedChart,
}

impl<'t> Chart<'t> {
    pub fn new(table: &'t Table, spec: ChartSpec) -> Result<Self> {
        let resolved = resolve::resolve_chart(&spec)?;
        Ok(Chart {
            table,
            spec,
            resolved,
        })
    }

    pub fn spec(&self) -> &ChartSpec {
        &self.spec
    }

    pub fn resolved(&self) -> &ResolvedChart {
        &self.resolved
    }

    /// Rows left after the chart's transforms
    pub fn rows(&self) -> Vec<Row<'t>> {
        transform::apply_transforms(self.table, &self.resolved.transforms)
    }

    pub fn encode(&self) -> Result<EncodedSeries> {
        transform::encode(&self.rows(), &self.resolved.encoding)
    }

    pub fn scene(&self, config: &RenderConfig) -> Result<SceneGraph> {
        let encoded = self.encode()?;
        let scales = scale::build_scales(&encoded);
        let scene = compiler::compile_geometry(&encoded, &scales, &self.resolved, config);
        debug!(
            panels = scene.panels.len(),
            width = scene.width,
            height = scene.height,
            "compiled scene"
        );
        Ok(scene)
    }

    pub fn render(&self, config: &RenderConfig) -> Result<Visual> {
        let scene = self.scene(config)?;
        match config.renderer {
            Renderer::Svg => Ok(Visual::Svg(graph::render_svg(&scene)?)),
            Renderer::Png => Ok(Visual::Png(graph::render_png(&scene)?)),
        }
    }

    /// Write the chart to `path`, choosing the format from its extension
    pub fn export(&self, path: impl AsRef<Path>, config: &RenderConfig) -> Result<()> {
        export::export_chart(self, path.as_ref(), config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new(vec![
            Record::new("Age", "0-10", "1990", 50.0),
            Record::new("Age", "11-20", "1990", 30.0),
            Record::new("Housing Tenure", "Owner-Occupied", "1990", 70.0),
        ])
    }

    fn age_spec() -> ChartSpec {
        ChartSpec::new(Mark::Bar)
            .x(ChannelDef::parse("Decade:O").unwrap())
            .y(ChannelDef::parse("Count:Q").unwrap())
            .color(ChannelDef::parse("Subcategory:N").unwrap())
            .filter(Predicate::eq("Category", "Age"))
    }

    #[test]
    fn test_config_defaults_from_json() {
        let config: RenderConfig = serde_json::from_str(r#"{"width": 1024}"#).unwrap();
        assert_eq!(config.width, 1024);
        assert_eq!(config.height, 600);
        assert_eq!(config.renderer, Renderer::Svg);

        let config: RenderConfig = serde_json::from_str(r#"{"renderer": "png"}"#).unwrap();
        assert_eq!(config.renderer, Renderer::Png);
    }

    #[test]
    fn test_chart_rows_apply_transforms() {
        let t = table();
        let chart = Chart::new(&t, age_spec()).unwrap();
        assert_eq!(chart.rows().len(), 2);
    }

    #[test]
    fn test_chart_new_rejects_unknown_field() {
        let t = table();
        let spec = age_spec().column(ChannelDef::parse("Tract:N").unwrap());
        assert!(matches!(
            Chart::new(&t, spec),
            Err(ChartError::FieldNotFound { .. })
        ));
    }

    #[test]
    fn test_chart_scene_uses_spec_size() {
        let t = table();
        let chart = Chart::new(&t, age_spec().size(320, 240)).unwrap();
        let scene = chart.scene(&RenderConfig::default()).unwrap();
        assert_eq!((scene.width, scene.height), (320, 240));
        assert_eq!(scene.legend.unwrap().entries.len(), 2);
    }

    #[test]
    fn test_oversized_png_is_an_error() {
        let t = table();
        let spec = parser::parse_chart_spec(
            r#"bar() | filter(Category == "Age") | x(Decade:O) | y(Count:Q) | size(70000, 70000)"#,
        )
        .unwrap();
        let chart = Chart::new(&t, spec).unwrap();
        let config = RenderConfig {
            renderer: Renderer::Png,
            ..RenderConfig::default()
        };
        assert!(matches!(chart.render(&config), Err(ChartError::Render(_))));
    }

    #[test]
    fn test_render_is_repeatable() {
        let t = table();
        let chart = Chart::new(&t, age_spec()).unwrap();
        let config = RenderConfig::default();
        let first = chart.render(&config).unwrap();
        let second = chart.render(&config).unwrap();
        assert_eq!(first, second);
        assert!(matches!(first, Visual::Svg(ref s) if s.contains("<svg")));
    }
}

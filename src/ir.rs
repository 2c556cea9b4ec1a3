use crate::data::{FieldRef, Literal, Schema};
use crate::palette::Rgb;
use crate::spec::{Aggregate, FieldType, Mark, SortOrder, StackMode};

// =============================================================================
// Phase 1: Resolution
// =============================================================================

/// A chart specification with every field reference checked against the schema
#[derive(Debug, Clone)]
pub struct ResolvedChart {
    pub mark: Mark,
    pub encoding: ResolvedEncoding,
    pub transforms: Vec<ResolvedTransform>,
    pub schema: Schema,
    pub title: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ResolvedEncoding {
    pub x: ResolvedChannel,
    pub y: ResolvedMeasure,
    pub color: Option<ResolvedChannel>,
    pub order: Option<ResolvedChannel>,
    pub column: Option<ResolvedChannel>,
}

/// A discrete channel: its values form an ordered domain
#[derive(Debug, Clone)]
pub struct ResolvedChannel {
    pub field: FieldRef,
    pub field_type: FieldType,
    pub title: String,
    pub sort: SortOrder,
}

/// The quantitative y channel
#[derive(Debug, Clone)]
pub struct ResolvedMeasure {
    /// None when counting records
    pub field: Option<FieldRef>,
    pub aggregate: Aggregate,
    pub stack: StackMode,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedPredicate {
    Eq(FieldRef, Literal),
    Ne(FieldRef, Literal),
    And(Vec<ResolvedPredicate>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedCalc {
    Literal(String),
    Field(FieldRef),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedTransform {
    Filter(ResolvedPredicate),
    Calculate { target: FieldRef, expr: ResolvedCalc },
}

// =============================================================================
// Phase 2: Encoding
// =============================================================================

/// Data grouped, aggregated and stacked per channel, ready for scaling.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedSeries {
    /// x categories in axis order
    pub x_domain: Vec<String>,
    /// Color categories in legend order (empty without a color channel)
    pub legend: Vec<String>,
    pub stack: StackMode,
    /// One panel per column value, or a single untitled panel
    pub panels: Vec<EncodedPanel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPanel {
    pub title: Option<String>,
    /// Series in drawing order
    pub series: Vec<Series>,
}

/// Points sharing one color category
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub key: Option<String>,
    pub points: Vec<EncodedPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodedPoint {
    /// Index into `EncodedSeries::x_domain`
    pub x: usize,
    /// Aggregated value before stacking
    pub value: f64,
    pub y0: f64,
    pub y1: f64,
}

impl EncodedPoint {
    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

impl EncodedSeries {
    pub fn is_empty(&self) -> bool {
        self.panels
            .iter()
            .all(|p| p.series.iter().all(|s| s.points.is_empty()))
    }
}

impl EncodedPanel {
    /// Series keys at one x position, bottom of the stack first
    pub fn stack_order(&self, x: usize) -> Vec<Option<&str>> {
        let mut at_x: Vec<(f64, Option<&str>)> = self
            .series
            .iter()
            .flat_map(|s| {
                s.points
                    .iter()
                    .filter(move |p| p.x == x)
                    .map(move |p| (p.y0, s.key.as_deref()))
            })
            .collect();
        at_x.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        at_x.into_iter().map(|(_, k)| k).collect()
    }
}

// =============================================================================
// Phase 3: Scaling
// =============================================================================

#[derive(Debug, Clone)]
pub struct ScaleSystem {
    pub x: Scale,
    pub y: Scale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
    pub is_categorical: bool,
    pub categories: Vec<String>,
}

// =============================================================================
// Phase 4: Compilation (Scene Graph)
// =============================================================================

/// Primitive drawing commands plus the chrome around them.
/// The backend executes these blindly.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    pub width: u32,
    pub height: u32,
    pub title: Option<String>,
    /// Header above faceted panels
    pub column_title: Option<String>,
    pub x_label: String,
    pub y_label: String,
    pub legend: Option<Legend>,
    pub panels: Vec<PanelScene>,
}

#[derive(Debug, Clone)]
pub struct Legend {
    pub title: String,
    pub entries: Vec<(String, Rgb)>,
}

#[derive(Debug, Clone)]
pub struct PanelScene {
    pub title: Option<String>,
    pub x_scale: Scale,
    pub y_scale: Scale,
    pub commands: Vec<DrawCommand>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    DrawRect {
        // Top-Left, Bottom-Right
        tl: (f64, f64),
        br: (f64, f64),
        color: Rgb,
        series: Option<String>,
    },
    DrawLine {
        points: Vec<(f64, f64)>,
        color: Rgb,
        width: u32,
        series: Option<String>,
    },
    DrawPolygon {
        points: Vec<(f64, f64)>,
        color: Rgb,
        series: Option<String>,
    },
}

use crate::data::{Row, Schema, Table};
use crate::error::{ChartError, Result};
use crate::ir::{
    EncodedPanel, EncodedPoint, EncodedSeries, ResolvedCalc, ResolvedChannel, ResolvedEncoding,
    ResolvedPredicate, ResolvedTransform, Series,
};
use crate::resolve::resolve_predicate;
use crate::sort::{arrange_domain, rank_map};
use crate::spec::{Aggregate, Predicate, StackMode};
use std::collections::HashMap;
use tracing::debug;

impl ResolvedPredicate {
    pub fn matches(&self, row: &Row<'_>) -> bool {
        match self {
            ResolvedPredicate::Eq(field, lit) => row.value(*field).matches(lit),
            ResolvedPredicate::Ne(field, lit) => !row.value(*field).matches(lit),
            ResolvedPredicate::And(terms) => terms.iter().all(|t| t.matches(row)),
        }
    }
}

/// Keep the records satisfying `predicate`, in their original order.
///
/// The predicate must be resolved against the plain record schema.
pub fn filter(table: &Table, predicate: &ResolvedPredicate) -> Table {
    table
        .iter()
        .filter(|r| predicate.matches(&Row::base(r)))
        .cloned()
        .collect()
}

impl Table {
    /// Filter by a predicate over named record fields.
    ///
    /// Unknown field names fail with `FieldNotFound`; an empty result is not an error.
    pub fn filter(&self, predicate: &Predicate) -> Result<Table> {
        let resolved = resolve_predicate(predicate, &Schema::new())?;
        let kept = filter(self, &resolved);
        debug!(predicate = %predicate, before = self.len(), after = kept.len(), "filtered table");
        Ok(kept)
    }
}

/// Run calculate and filter transforms in declaration order, producing the
/// rows a chart encodes. The source table is left untouched.
pub fn apply_transforms<'a>(table: &'a Table, transforms: &[ResolvedTransform]) -> Vec<Row<'a>> {
    let mut rows: Vec<Row<'a>> = table.iter().map(Row::base).collect();

    for transform in transforms {
        match transform {
            ResolvedTransform::Filter(p) => {
                let before = rows.len();
                rows.retain(|row| p.matches(row));
                debug!(before, after = rows.len(), "applied filter");
            }
            ResolvedTransform::Calculate { expr, .. } => {
                // Calculated fields are appended in order, so the new value lands at `target`
                for row in rows.iter_mut() {
                    let value = match expr {
                        ResolvedCalc::Literal(s) => s.clone(),
                        ResolvedCalc::Field(f) => row.value(*f).to_string(),
                    };
                    row.calculated.push(value);
                }
            }
        }
    }

    rows
}

/// One aggregated cell: all rows sharing the same discrete channel values
#[derive(Debug)]
struct Cell {
    column: Option<String>,
    x: String,
    color: Option<String>,
    order: Option<String>,
    value: f64,
    first_seen: usize,
}

/// Group, aggregate and stack rows into per-panel series.
pub fn encode(rows: &[Row<'_>], encoding: &ResolvedEncoding) -> Result<EncodedSeries> {
    let discrete = |ch: &Option<ResolvedChannel>, row: &Row<'_>| {
        ch.as_ref().map(|c| row.value(c.field).to_string())
    };

    // 1. Aggregate rows into cells keyed by every discrete channel
    let mut cells: Vec<Cell> = Vec::new();
    let mut index: HashMap<(Option<String>, String, Option<String>, Option<String>), usize> =
        HashMap::new();

    for (row_idx, row) in rows.iter().enumerate() {
        let key = (
            discrete(&encoding.column, row),
            row.value(encoding.x.field).to_string(),
            discrete(&encoding.color, row),
            discrete(&encoding.order, row),
        );

        let amount = match (encoding.y.aggregate, encoding.y.field) {
            (Aggregate::Count, _) => 1.0,
            (Aggregate::Sum, Some(field)) => {
                let value = row.value(field);
                value.as_number().ok_or_else(|| {
                    ChartError::InvalidEncoding(format!(
                        "value '{}' of y field '{}' is not numeric",
                        value, encoding.y.title
                    ))
                })?
            }
            (Aggregate::Sum, None) => 0.0,
        };

        match index.get(&key) {
            Some(&i) => cells[i].value += amount,
            None => {
                index.insert(key.clone(), cells.len());
                let (column, x, color, order) = key;
                cells.push(Cell {
                    column,
                    x,
                    color,
                    order,
                    value: amount,
                    first_seen: row_idx,
                });
            }
        }
    }

    // 2. Domains
    let x_values: Vec<String> = cells.iter().map(|c| c.x.clone()).collect();
    let x_domain = arrange_domain(&x_values, &encoding.x.sort);
    let legend = channel_domain(&encoding.color, cells.iter().filter_map(|c| c.color.clone()))
        .unwrap_or_default();
    let columns = channel_domain(&encoding.column, cells.iter().filter_map(|c| c.column.clone()));
    let order_domain = channel_domain(&encoding.order, cells.iter().filter_map(|c| c.order.clone()));

    let x_rank = rank_map(&x_domain);
    let legend_rank = rank_map(&legend);
    let order_rank = order_domain.as_deref().map(rank_map);

    // Draw/stack key: the order channel wins over the legend order; ties keep data order
    let stack_key = |cell: &Cell| -> (usize, usize) {
        let rank = match (&order_rank, &cell.order, &cell.color) {
            (Some(ranks), Some(o), _) => ranks[o],
            (None, _, Some(c)) => legend_rank[c],
            _ => 0,
        };
        (rank, cell.first_seen)
    };

    // 3. Panels
    let panel_keys: Vec<Option<String>> = match &columns {
        Some(cols) => cols.iter().cloned().map(Some).collect(),
        None => vec![None],
    };

    let mut panels = Vec::with_capacity(panel_keys.len());
    for panel_key in panel_keys {
        let mut panel_cells: Vec<&Cell> = cells.iter().filter(|c| c.column == panel_key).collect();
        panel_cells.sort_by_key(|c| stack_key(*c));

        let stacked = stack_cells(&panel_cells, &x_rank, encoding.y.stack);
        let series = build_series(&panel_cells, &stacked);

        panels.push(EncodedPanel {
            title: panel_key,
            series,
        });
    }

    debug!(
        cells = cells.len(),
        panels = panels.len(),
        x = x_domain.len(),
        legend = legend.len(),
        "encoded series"
    );

    Ok(EncodedSeries {
        x_domain,
        legend,
        stack: encoding.y.stack,
        panels,
    })
}

fn channel_domain(
    channel: &Option<ResolvedChannel>,
    values: impl Iterator<Item = String>,
) -> Option<Vec<String>> {
    channel.as_ref().map(|c| {
        let values: Vec<String> = values.collect();
        arrange_domain(&values, &c.sort)
    })
}

/// Compute (x index, y0, y1) for cells already sorted in stacking order.
fn stack_cells(cells: &[&Cell], x_rank: &HashMap<String, usize>, stack: StackMode) -> Vec<EncodedPoint> {
    let mut totals: HashMap<usize, f64> = HashMap::new();
    if stack == StackMode::Normalize {
        for cell in cells {
            *totals.entry(x_rank[&cell.x]).or_insert(0.0) += cell.value;
        }
    }

    let mut offsets: HashMap<usize, f64> = HashMap::new();
    cells
        .iter()
        .map(|cell| {
            let x = x_rank[&cell.x];
            let (y0, y1) = match stack {
                StackMode::None => (0.0, cell.value),
                StackMode::Zero => {
                    let start = offsets.entry(x).or_insert(0.0);
                    let y0 = *start;
                    *start += cell.value;
                    (y0, *start)
                }
                StackMode::Normalize => {
                    let total = totals.get(&x).copied().unwrap_or(0.0);
                    if total == 0.0 {
                        (0.0, 0.0)
                    } else {
                        let start = offsets.entry(x).or_insert(0.0);
                        let y0 = *start;
                        *start += cell.value / total;
                        (y0, *start)
                    }
                }
            };
            EncodedPoint {
                x,
                value: cell.value,
                y0,
                y1,
            }
        })
        .collect()
}

/// Split stacked points into series by color, keeping the stacking order
/// of first appearance as the drawing order.
fn build_series(cells: &[&Cell], points: &[EncodedPoint]) -> Vec<Series> {
    let mut series: Vec<Series> = Vec::new();
    for (cell, point) in cells.iter().zip(points) {
        match series.iter_mut().find(|s| s.key == cell.color) {
            Some(s) => s.points.push(*point),
            None => series.push(Series {
                key: cell.color.clone(),
                points: vec![*point],
            }),
        }
    }
    for s in &mut series {
        s.points.sort_by_key(|p| p.x);
    }
    series
}

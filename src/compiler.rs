use crate::ir::{
    DrawCommand, EncodedSeries, Legend, PanelScene, ResolvedChart, ScaleSystem, SceneGraph, Series,
};
use crate::palette::{ColorPalette, Rgb};
use crate::spec::Mark;
use crate::RenderConfig;

const BAR_WIDTH_RATIO: f64 = 0.8;
const LINE_WIDTH: u32 = 2;

/// Compile encoded data and scales into a SceneGraph of drawing commands
pub fn compile_geometry(
    data: &EncodedSeries,
    scales: &ScaleSystem,
    chart: &ResolvedChart,
    config: &RenderConfig,
) -> SceneGraph {
    let palette = ColorPalette::default();

    let panels = data
        .panels
        .iter()
        .map(|panel| {
            let mut commands = Vec::new();
            for series in &panel.series {
                let color = palette.color_for(&data.legend, series.key.as_deref());
                compile_series(chart.mark, series, color, &mut commands);
            }
            PanelScene {
                title: panel.title.clone(),
                x_scale: scales.x.clone(),
                y_scale: scales.y.clone(),
                commands,
            }
        })
        .collect();

    let legend = chart.encoding.color.as_ref().map(|c| Legend {
        title: c.title.clone(),
        entries: data
            .legend
            .iter()
            .enumerate()
            .map(|(i, label)| (label.clone(), palette.color(i)))
            .collect(),
    });

    SceneGraph {
        width: chart.width.unwrap_or(config.width),
        height: chart.height.unwrap_or(config.height),
        title: chart.title.clone(),
        column_title: chart.encoding.column.as_ref().map(|c| c.title.clone()),
        x_label: chart.encoding.x.title.clone(),
        y_label: chart.encoding.y.title.clone(),
        legend,
        panels,
    }
}

fn compile_series(mark: Mark, series: &Series, color: Rgb, commands: &mut Vec<DrawCommand>) {
    match mark {
        Mark::Bar => {
            let half_width = BAR_WIDTH_RATIO / 2.0;
            for p in &series.points {
                let x = p.x as f64;
                commands.push(DrawCommand::DrawRect {
                    tl: (x - half_width, p.y1),
                    br: (x + half_width, p.y0),
                    color,
                    series: series.key.clone(),
                });
            }
        }
        Mark::Line => {
            let points = series.points.iter().map(|p| (p.x as f64, p.y1)).collect();
            commands.push(DrawCommand::DrawLine {
                points,
                color,
                width: LINE_WIDTH,
                series: series.key.clone(),
            });
        }
        Mark::Area => {
            // Trace the upper edge forward, then the baseline backward
            let mut points: Vec<(f64, f64)> = Vec::with_capacity(series.points.len() * 2);
            for p in &series.points {
                points.push((p.x as f64, p.y1));
            }
            for p in series.points.iter().rev() {
                points.push((p.x as f64, p.y0));
            }
            commands.push(DrawCommand::DrawPolygon {
                points,
                color,
                series: series.key.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{EncodedPanel, EncodedPoint};
    use crate::resolve::resolve_chart;
    use crate::scale::build_scales;
    use crate::spec::{ChannelDef, ChartSpec, StackMode};

    fn make_data() -> EncodedSeries {
        EncodedSeries {
            x_domain: vec!["1990".to_string(), "2000".to_string()],
            legend: vec!["Owner".to_string(), "Renter".to_string()],
            stack: StackMode::Zero,
            panels: vec![EncodedPanel {
                title: None,
                series: vec![
                    Series {
                        key: Some("Owner".to_string()),
                        points: vec![
                            EncodedPoint { x: 0, value: 10.0, y0: 0.0, y1: 10.0 },
                            EncodedPoint { x: 1, value: 20.0, y0: 0.0, y1: 20.0 },
                        ],
                    },
                    Series {
                        key: Some("Renter".to_string()),
                        points: vec![
                            EncodedPoint { x: 0, value: 5.0, y0: 10.0, y1: 15.0 },
                            EncodedPoint { x: 1, value: 5.0, y0: 20.0, y1: 25.0 },
                        ],
                    },
                ],
            }],
        }
    }

    fn make_chart(mark: Mark) -> ResolvedChart {
        let spec = ChartSpec::new(mark)
            .x(ChannelDef::parse("Decade:O").unwrap())
            .y(ChannelDef::parse("Count:Q").unwrap())
            .color(ChannelDef::parse("Subcategory:N").unwrap().title("Type of Occupancy"))
            .title("Occupancy");
        resolve_chart(&spec).unwrap()
    }

    #[test]
    fn test_compile_bars() {
        let data = make_data();
        let scales = build_scales(&data);
        let scene = compile_geometry(&data, &scales, &make_chart(Mark::Bar), &RenderConfig::default());

        assert_eq!(scene.panels.len(), 1);
        assert_eq!(scene.panels[0].commands.len(), 4);
        match &scene.panels[0].commands[2] {
            DrawCommand::DrawRect { tl, br, series, .. } => {
                assert_eq!(*tl, (-0.4, 15.0));
                assert_eq!(*br, (0.4, 10.0));
                assert_eq!(series.as_deref(), Some("Renter"));
            }
            other => panic!("Expected DrawRect, got {:?}", other),
        }
        let legend = scene.legend.unwrap();
        assert_eq!(legend.title, "Type of Occupancy");
        assert_eq!(legend.entries.len(), 2);
        assert_eq!(scene.title.as_deref(), Some("Occupancy"));
    }

    #[test]
    fn test_compile_line() {
        let data = make_data();
        let scales = build_scales(&data);
        let scene = compile_geometry(&data, &scales, &make_chart(Mark::Line), &RenderConfig::default());
        assert_eq!(scene.panels[0].commands.len(), 2);
        if let DrawCommand::DrawLine { points, .. } = &scene.panels[0].commands[0] {
            assert_eq!(points, &vec![(0.0, 10.0), (1.0, 20.0)]);
        } else {
            panic!("Expected DrawLine");
        }
    }

    #[test]
    fn test_compile_area_polygon() {
        let data = make_data();
        let scales = build_scales(&data);
        let scene = compile_geometry(&data, &scales, &make_chart(Mark::Area), &RenderConfig::default());
        if let DrawCommand::DrawPolygon { points, .. } = &scene.panels[0].commands[1] {
            assert_eq!(points, &vec![(0.0, 15.0), (1.0, 25.0), (1.0, 20.0), (0.0, 10.0)]);
        } else {
            panic!("Expected DrawPolygon");
        }
    }

    #[test]
    fn test_spec_size_overrides_config() {
        let data = make_data();
        let scales = build_scales(&data);
        let mut chart = make_chart(Mark::Bar);
        chart.width = Some(400);
        let scene = compile_geometry(&data, &scales, &chart, &RenderConfig::default());
        assert_eq!(scene.width, 400);
        assert_eq!(scene.height, RenderConfig::default().height);
    }
}

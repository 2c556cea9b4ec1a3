use crate::error::{ChartError, Result};
use crate::ir::{DrawCommand, Legend, PanelScene, SceneGraph};
use crate::palette::Rgb;
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;

const FONT: &str = "sans-serif";
const LEGEND_WIDTH: u32 = 180;
const LEGEND_SWATCH: i32 = 12;
const LEGEND_ROW: i32 = 20;
const AREA_OPACITY: f64 = 0.85;

/// Largest accepted canvas width or height, in pixels
pub const MAX_CANVAS_SIDE: u32 = 16_384;

impl From<Rgb> for RGBColor {
    fn from(c: Rgb) -> Self {
        RGBColor(c.0, c.1, c.2)
    }
}

/// Execute a scene graph on any plotters backend.
///
/// Layout: optional title on top, legend strip on the right, then one
/// cartesian panel per facet split evenly across the remaining width.
pub fn draw_scene<'a, DB>(
    backend: DB,
    scene: &SceneGraph,
) -> std::result::Result<(), Box<dyn Error + Send + Sync + 'a>>
where
    DB: 'a + DrawingBackend,
{
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;

    let root = match &scene.title {
        Some(title) => root.titled(title, (FONT, 22.0).into_font())?,
        None => root,
    };

    let (plot_area, legend_area) = match &scene.legend {
        Some(_) => {
            let (w, _) = root.dim_in_pixel();
            let (plot, legend) = root.split_horizontally(w.saturating_sub(LEGEND_WIDTH));
            (plot, Some(legend))
        }
        None => (root, None),
    };

    let plot_area = match &scene.column_title {
        Some(title) => plot_area.titled(title, (FONT, 16.0).into_font())?,
        None => plot_area,
    };

    if !scene.panels.is_empty() {
        let areas = plot_area.split_evenly((1, scene.panels.len()));
        for (area, panel) in areas.iter().zip(&scene.panels) {
            draw_panel(area, panel, scene)?;
        }
    }

    if let (Some(area), Some(legend)) = (&legend_area, &scene.legend) {
        draw_legend(area, legend)?;
    }

    // Every area shares the backend, so presenting one flushes the whole canvas
    plot_area.present()?;
    Ok(())
}

fn draw_panel<'a, DB>(
    area: &DrawingArea<DB, Shift>,
    panel: &PanelScene,
    scene: &SceneGraph,
) -> std::result::Result<(), Box<dyn Error + Send + Sync + 'a>>
where
    DB: 'a + DrawingBackend,
{
    let x_range = panel.x_scale.range.0..panel.x_scale.range.1;
    let y_range = panel.y_scale.range.0..panel.y_scale.range.1;

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60);
    if let Some(title) = &panel.title {
        builder.caption(title, (FONT, 14));
    }
    let mut chart = builder.build_cartesian_2d(x_range, y_range)?;

    let categories = &panel.x_scale.categories;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(categories.len() * 2 + 1)
        .x_label_formatter(&|x| category_label(categories, *x))
        .y_label_formatter(&|y| crate::data::format_number(*y))
        .x_desc(scene.x_label.as_str())
        .y_desc(scene.y_label.as_str())
        .draw()?;

    for command in &panel.commands {
        match command {
            DrawCommand::DrawRect { tl, br, color, .. } => {
                let color: RGBColor = (*color).into();
                chart.draw_series(std::iter::once(Rectangle::new([*tl, *br], color.filled())))?;
            }
            DrawCommand::DrawLine {
                points,
                color,
                width,
                ..
            } => {
                let color: RGBColor = (*color).into();
                chart.draw_series(LineSeries::new(
                    points.iter().copied(),
                    color.stroke_width(*width),
                ))?;
            }
            DrawCommand::DrawPolygon { points, color, .. } => {
                let color: RGBColor = (*color).into();
                chart.draw_series(std::iter::once(Polygon::new(
                    points.clone(),
                    color.mix(AREA_OPACITY).filled(),
                )))?;
            }
        }
    }

    Ok(())
}

/// Label for a tick on the categorical x axis; blank between bands
fn category_label(categories: &[String], x: f64) -> String {
    let index = x.round();
    if (x - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    categories
        .get(index as usize)
        .cloned()
        .unwrap_or_default()
}

fn draw_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    legend: &Legend,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let title_style = (FONT, 15.0).into_font();
    let label_style = (FONT, 13.0).into_font();

    area.draw(&Text::new(legend.title.clone(), (10, 30), title_style))?;
    for (i, (label, color)) in legend.entries.iter().enumerate() {
        let top = 50 + i as i32 * LEGEND_ROW;
        let color: RGBColor = (*color).into();
        area.draw(&Rectangle::new(
            [(10, top), (10 + LEGEND_SWATCH, top + LEGEND_SWATCH)],
            color.filled(),
        ))?;
        area.draw(&Text::new(
            label.clone(),
            (10 + LEGEND_SWATCH + 6, top),
            label_style.clone(),
        ))?;
    }
    Ok(())
}

fn check_size(scene: &SceneGraph) -> Result<()> {
    let valid = |side: u32| (1..=MAX_CANVAS_SIDE).contains(&side);
    if !valid(scene.width) || !valid(scene.height) {
        return Err(ChartError::Render(format!(
            "invalid canvas size {}x{}",
            scene.width, scene.height
        )));
    }
    Ok(())
}

/// Render a scene graph into an SVG document
pub fn render_svg(scene: &SceneGraph) -> Result<String> {
    check_size(scene)?;
    let mut buffer = String::new();
    {
        let backend = SVGBackend::with_string(&mut buffer, (scene.width, scene.height));
        draw_scene(backend, scene).map_err(|e| ChartError::Render(e.to_string()))?;
    }
    Ok(buffer)
}

/// Render a scene graph into PNG bytes
pub fn render_png(scene: &SceneGraph) -> Result<Vec<u8>> {
    check_size(scene)?;
    let len = (scene.width as usize)
        .checked_mul(scene.height as usize)
        .and_then(|pixels| pixels.checked_mul(3))
        .ok_or_else(|| {
            ChartError::Render(format!(
                "canvas {}x{} is too large",
                scene.width, scene.height
            ))
        })?;
    let mut buffer = vec![0u8; len];
    {
        let backend = BitMapBackend::with_buffer(&mut buffer, (scene.width, scene.height));
        draw_scene(backend, scene).map_err(|e| ChartError::Render(e.to_string()))?;
    }

    let mut png_bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut png_bytes)
        .write_image(&buffer, scene.width, scene.height, image::ColorType::Rgb8)
        .map_err(|e| ChartError::Render(format!("failed to encode PNG: {}", e)))?;
    Ok(png_bytes)
}

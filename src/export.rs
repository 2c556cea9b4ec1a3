//! One-shot file export.
//!
//! The whole output is rendered in memory before the destination is touched,
//! so a failed render never leaves a partial file behind.

use crate::error::{ChartError, Result};
use crate::graph::{render_png, render_svg};
use crate::{Chart, RenderConfig};
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Html,
    Svg,
    Png,
    Json,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("html") | Some("htm") => Ok(ExportFormat::Html),
            Some("svg") => Ok(ExportFormat::Svg),
            Some("png") => Ok(ExportFormat::Png),
            Some("json") => Ok(ExportFormat::Json),
            _ => Err(ChartError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

pub fn export_chart(chart: &Chart<'_>, path: &Path, config: &RenderConfig) -> Result<()> {
    let format = ExportFormat::from_path(path)?;
    let bytes = match format {
        ExportFormat::Html => html_page(chart, config)?.into_bytes(),
        ExportFormat::Svg => render_svg(&chart.scene(config)?)?.into_bytes(),
        ExportFormat::Png => render_png(&chart.scene(config)?)?,
        ExportFormat::Json => chart.spec().to_json()?.into_bytes(),
    };

    fs::write(path, &bytes).map_err(|e| ChartError::io(path, e))?;
    info!(path = %path.display(), format = ?format, bytes = bytes.len(), "exported chart");
    Ok(())
}

/// Self-contained page: the inline SVG plus the spec as an embedded JSON payload
fn html_page(chart: &Chart<'_>, config: &RenderConfig) -> Result<String> {
    let svg = render_svg(&chart.scene(config)?)?;
    let spec_json = chart.spec().to_json()?;
    let title = chart.spec().title.as_deref().unwrap_or("Chart");

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; margin: 2em; }}
</style>
</head>
<body>
<div id="chart">
{svg}
</div>
<script type="application/json" id="chart-spec">
{spec}
</script>
</body>
</html>
"#,
        title = escape_html(title),
        svg = strip_xml_declaration(&svg),
        spec = escape_script(&spec_json),
    ))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// A literal `</` would close the script element early
fn escape_script(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn strip_xml_declaration(svg: &str) -> &str {
    match svg.strip_prefix("<?xml") {
        Some(rest) => rest.find("?>").map(|i| rest[i + 2..].trim_start()).unwrap_or(svg),
        None => svg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Record, Table};
    use crate::spec::{ChannelDef, ChartSpec, Mark};
    use tempfile::tempdir;

    fn table() -> Table {
        Table::new(vec![
            Record::new("Housing Tenure", "Owner-Occupied", "1990", 70.0),
            Record::new("Housing Tenure", "Renter-Occupied", "1990", 30.0),
        ])
    }

    fn spec() -> ChartSpec {
        ChartSpec::new(Mark::Bar)
            .x(ChannelDef::parse("Decade:O").unwrap())
            .y(ChannelDef::parse("Count:Q").unwrap())
            .color(ChannelDef::parse("Subcategory:N").unwrap())
            .title("Tenure <1990>")
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("a.HTML")).unwrap(), ExportFormat::Html);
        assert_eq!(ExportFormat::from_path(Path::new("a.png")).unwrap(), ExportFormat::Png);
        assert!(matches!(
            ExportFormat::from_path(Path::new("chart.pdf")),
            Err(ChartError::UnsupportedFormat { .. })
        ));
        assert!(ExportFormat::from_path(Path::new("chart")).is_err());
    }

    #[test]
    fn test_export_html() {
        let t = table();
        let chart = Chart::new(&t, spec()).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("chart_occupancy.html");
        export_chart(&chart, &path, &RenderConfig::default()).unwrap();

        let page = fs::read_to_string(&path).unwrap();
        assert!(page.contains("<svg"));
        assert!(page.contains("<title>Tenure &lt;1990&gt;</title>"));
        assert!(page.contains("application/json"));
        assert!(!page.contains("<?xml"));
    }

    #[test]
    fn test_export_overwrites() {
        let t = table();
        let chart = Chart::new(&t, spec()).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("spec.json");
        fs::write(&path, "stale").unwrap();
        export_chart(&chart, &path, &RenderConfig::default()).unwrap();

        let restored = ChartSpec::from_json(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(&restored, chart.spec());
    }

    #[test]
    fn test_export_unwritable_destination() {
        let t = table();
        let chart = Chart::new(&t, spec()).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("chart.json");
        assert!(matches!(
            export_chart(&chart, &path, &RenderConfig::default()),
            Err(ChartError::Io { .. })
        ));
    }

    #[test]
    fn test_escape_script() {
        assert_eq!(escape_script(r#"{"t":"</script>"}"#), r#"{"t":"<\/script>"}"#);
    }
}

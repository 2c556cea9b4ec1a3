//! Named chart presets over the census tract table, from a first bar of record
//! counts through to the normalized occupancy split.

use crate::error::{ChartError, Result};
use crate::spec::{CalcExpr, ChannelDef, ChartSpec, FieldType, Mark, Predicate, SortOrder, StackMode};
use crate::{Chart, RenderConfig, Table};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const EDUCATION_FIELD: &str = "Educational Attainment (age 25+)";

pub const EDUCATION_ORDER: [&str; 4] = [
    "Bachelor's Degree or Higher",
    "Some College or Associate's Degree",
    "High School or GED",
    "less than High School",
];

/// Every preset name, in gallery order
pub const PRESET_NAMES: [&str; 15] = [
    "age_bar_basic",
    "count_bar",
    "count_bar_colored",
    "age_bar",
    "age_bar_titled",
    "age_bar_sorted",
    "age_line",
    "age_area",
    "education_bar",
    "education_bar_priority",
    "education_bar_data_order",
    "education_columns",
    "education_columns_reversed",
    "race_bar",
    "occupancy_normalized",
];

fn decade() -> ChannelDef {
    ChannelDef::new("Decade", FieldType::Ordinal)
}

fn count() -> ChannelDef {
    ChannelDef::new("Count", FieldType::Quantitative)
}

fn subcategory() -> ChannelDef {
    ChannelDef::new("Subcategory", FieldType::Nominal)
}

fn age(mark: Mark) -> ChartSpec {
    ChartSpec::new(mark)
        .x(decade())
        .y(count())
        .color(
            subcategory()
                .title("Age Range")
                .sort(SortOrder::Descending),
        )
        .order(subcategory().sort(SortOrder::Ascending))
        .filter(Predicate::eq("Category", "Age"))
        .title("Age Distribution by Decade")
}

fn education() -> ChartSpec {
    ChartSpec::new(Mark::Bar)
        .x(decade())
        .y(count())
        .color(
            subcategory()
                .title(EDUCATION_FIELD)
                .sort(SortOrder::explicit(EDUCATION_ORDER)),
        )
        .filter(Predicate::eq("Category", EDUCATION_FIELD))
        .title("Educational Attainment Distribution by Decade")
}

/// Look up a preset by name
pub fn preset(name: &str) -> Option<ChartSpec> {
    let spec = match name {
        "age_bar_basic" => ChartSpec::new(Mark::Bar).x(decade()),
        "count_bar" => ChartSpec::new(Mark::Bar).x(decade()).y(count()),
        "count_bar_colored" => ChartSpec::new(Mark::Bar)
            .x(decade())
            .y(count())
            .color(subcategory()),
        "age_bar" => ChartSpec::new(Mark::Bar)
            .x(decade())
            .y(count())
            .color(subcategory())
            .filter(Predicate::eq("Category", "Age")),
        "age_bar_titled" => ChartSpec::new(Mark::Bar)
            .x(decade())
            .y(count())
            .color(subcategory().title("Age Range"))
            .filter(Predicate::eq("Category", "Age"))
            .title("Age Distribution by Decade"),
        "age_bar_sorted" => age(Mark::Bar),
        "age_line" => age(Mark::Line),
        "age_area" => age(Mark::Area),
        "education_bar" => ChartSpec::new(Mark::Bar)
            .x(decade())
            .y(count())
            .color(
                subcategory()
                    .title(EDUCATION_FIELD)
                    .sort(SortOrder::Descending),
            )
            .order(subcategory().sort(SortOrder::Descending))
            .filter(Predicate::eq("Category", EDUCATION_FIELD))
            .title("Educational Attainment Distribution by Decade"),
        "education_bar_priority" => education(),
        "education_bar_data_order" => education()
            .calculate("eduOrdering", CalcExpr::Literal("0".to_string()))
            .order(ChannelDef::new("eduOrdering", FieldType::Nominal).sort(SortOrder::Ascending)),
        "education_columns" => education().column(
            subcategory()
                .title(EDUCATION_FIELD)
                .sort(SortOrder::explicit(EDUCATION_ORDER)),
        ),
        "education_columns_reversed" => education().column(
            subcategory()
                .title(EDUCATION_FIELD)
                .sort(SortOrder::explicit(EDUCATION_ORDER).reversed()),
        ),
        "race_bar" => ChartSpec::new(Mark::Bar)
            .x(decade())
            .y(count())
            .color(subcategory().title("Race"))
            .filter(Predicate::eq("Category", "Race/ Ethnicity"))
            .title("Race Distribution by Decade"),
        "occupancy_normalized" => ChartSpec::new(Mark::Bar)
            .x(decade())
            .y(count()
                .stack(StackMode::Normalize)
                .title("Occupancy Split"))
            .color(subcategory().title("Type of Occupancy"))
            .filter(
                Predicate::eq("Category", "Housing Tenure")
                    .and(Predicate::ne("Subcategory", "Occupied Housing Units")),
            )
            .title("Types of Occupancy Distribution by Decade"),
        _ => return None,
    };
    Some(spec)
}

/// All presets, in gallery order
pub fn presets() -> Vec<(&'static str, ChartSpec)> {
    PRESET_NAMES
        .iter()
        .filter_map(|name| preset(name).map(|spec| (*name, spec)))
        .collect()
}

/// Output file for a preset; the occupancy chart keeps its published name
pub fn file_name(name: &str) -> String {
    match name {
        "occupancy_normalized" => "chart_occupancy.html".to_string(),
        _ => format!("{}.html", name),
    }
}

/// Export every preset as an HTML page under `out_dir`
pub fn render_gallery(table: &Table, out_dir: &Path, config: &RenderConfig) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).map_err(|e| ChartError::io(out_dir, e))?;

    let mut written = Vec::with_capacity(PRESET_NAMES.len());
    for (name, spec) in presets() {
        let chart = Chart::new(table, spec)?;
        let path = out_dir.join(file_name(name));
        chart.export(&path, config)?;
        written.push(path);
    }
    info!(count = written.len(), dir = %out_dir.display(), "rendered gallery");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_chart_spec;
    use crate::Record;

    #[test]
    fn test_every_name_resolves() {
        assert_eq!(presets().len(), PRESET_NAMES.len());
        assert!(preset("pie").is_none());
    }

    #[test]
    fn test_presets_match_dsl() {
        let cases = [
            ("age_bar_basic", "bar() | x(Decade:O)".to_string()),
            ("count_bar", "bar() | x(Decade:O) | y(Count:Q)".to_string()),
            (
                "count_bar_colored",
                "bar() | x(Decade:O) | y(Count:Q) | color(Subcategory:N)".to_string(),
            ),
            (
                "age_bar_sorted",
                r#"bar()
                | filter(Category == "Age")
                | x(Decade:O) | y(Count:Q)
                | color(Subcategory:N, title: "Age Range", sort: descending)
                | order(Subcategory:N, sort: ascending)
                | title("Age Distribution by Decade")"#
                    .to_string(),
            ),
            (
                "education_bar_data_order",
                format!(
                    r#"bar()
                    | filter(Category == "{field}")
                    | calculate(eduOrdering = "0")
                    | x(Decade:O) | y(Count:Q)
                    | color(Subcategory:N, title: "{field}", sort: ["Bachelor's Degree or Higher", "Some College or Associate's Degree", "High School or GED", "less than High School"])
                    | order(eduOrdering:N, sort: ascending)
                    | title("Educational Attainment Distribution by Decade")"#,
                    field = EDUCATION_FIELD
                ),
            ),
            (
                "occupancy_normalized",
                r#"bar()
                | filter(Category == "Housing Tenure" && Subcategory != "Occupied Housing Units")
                | x(Decade:O)
                | y(Count:Q, stack: normalize, title: "Occupancy Split")
                | color(Subcategory:N, title: "Type of Occupancy")
                | title("Types of Occupancy Distribution by Decade")"#
                    .to_string(),
            ),
        ];

        for (name, dsl) in cases {
            let parsed = parse_chart_spec(&dsl).unwrap();
            assert_eq!(Some(parsed), preset(name), "preset {}", name);
        }
    }

    #[test]
    fn test_reversed_columns() {
        let spec = preset("education_columns_reversed").unwrap();
        let column = spec.encoding.column.unwrap();
        assert_eq!(
            column.sort,
            Some(SortOrder::explicit(EDUCATION_ORDER.iter().rev().copied()))
        );
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("occupancy_normalized"), "chart_occupancy.html");
        assert_eq!(file_name("race_bar"), "race_bar.html");
    }

    #[test]
    fn test_render_gallery() {
        let table = Table::new(vec![
            Record::new("Age", "0-10", "1990", 50.0),
            Record::new(EDUCATION_FIELD, "High School or GED", "1990", 80.0),
            Record::new("Race/ Ethnicity", "White", "1990", 300.0),
            Record::new("Housing Tenure", "Owner-Occupied", "1990", 70.0),
            Record::new("Housing Tenure", "Occupied Housing Units", "1990", 100.0),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("gallery");
        let written = render_gallery(&table, &out, &RenderConfig::default()).unwrap();
        assert_eq!(written.len(), PRESET_NAMES.len());
        assert!(out.join("chart_occupancy.html").exists());
        assert!(out.join("count_bar_colored.html").exists());
    }

    #[test]
    fn test_unfiltered_presets_cover_every_category() {
        let table = Table::new(vec![
            Record::new("Age", "0-10", "1990", 50.0),
            Record::new("Housing Tenure", "Owner-Occupied", "1990", 70.0),
            Record::new("Age", "0-10", "2000", 20.0),
        ]);
        let chart = Chart::new(&table, preset("count_bar").unwrap()).unwrap();
        let encoded = chart.encode().unwrap();
        let totals: Vec<f64> = encoded.panels[0].series[0]
            .points
            .iter()
            .map(|p| p.value)
            .collect();
        assert_eq!(totals, vec![120.0, 20.0]);

        let chart = Chart::new(&table, preset("count_bar_colored").unwrap()).unwrap();
        assert_eq!(
            chart.encode().unwrap().legend,
            vec!["0-10".to_string(), "Owner-Occupied".to_string()]
        );
    }
}

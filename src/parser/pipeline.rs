// Pipeline parser for the chart DSL

use super::encoding::parse_channel;
use super::labels::{parse_size, parse_title};
use super::lexer::ws;
use super::mark::parse_mark;
use super::transform::{parse_calculate, parse_filter};
use crate::error::{ChartError, Result};
use crate::spec::{Channel, ChannelDef, ChartSpec, Mark, Transform};
use nom::{
    branch::alt,
    bytes::complete::tag,
    combinator::{eof, map},
    multi::separated_list1,
    IResult,
};

#[derive(Debug)]
enum SpecComponent {
    Mark(Mark),
    Channel(Channel, ChannelDef),
    Transform(Transform),
    Title(String),
    Size(u32, u32),
}

fn parse_component(input: &str) -> IResult<&str, SpecComponent> {
    alt((
        map(parse_mark, SpecComponent::Mark),
        map(parse_channel, |(c, d)| SpecComponent::Channel(c, d)),
        map(parse_filter, SpecComponent::Transform),
        map(parse_calculate, SpecComponent::Transform),
        map(parse_title, SpecComponent::Title),
        map(parse_size, |(w, h)| SpecComponent::Size(w, h)),
    ))(input)
}

/// Format: component | component | ...
fn parse_components(input: &str) -> IResult<&str, Vec<SpecComponent>> {
    let (input, components) = separated_list1(ws(tag("|")), parse_component)(input)?;
    let (input, _) = ws(eof)(input)?;
    Ok((input, components))
}

/// Parse a complete chart specification.
///
/// Exactly one mark is required. Later channel declarations replace earlier
/// ones for the same channel; transforms keep their written order.
pub fn parse_chart_spec(input: &str) -> Result<ChartSpec> {
    let (_, components) = parse_components(input).map_err(|e| syntax_error(input, e))?;

    let mut mark = None;
    let mut channels = Vec::new();
    let mut transforms = Vec::new();
    let mut title = None;
    let mut size = None;

    for comp in components {
        match comp {
            SpecComponent::Mark(m) => {
                if mark.replace(m).is_some() {
                    return Err(ChartError::Parse(
                        "only one mark may be declared".to_string(),
                    ));
                }
            }
            SpecComponent::Channel(c, d) => channels.push((c, d)),
            SpecComponent::Transform(t) => transforms.push(t),
            SpecComponent::Title(t) => title = Some(t),
            SpecComponent::Size(w, h) => size = Some((w, h)),
        }
    }

    let mark = mark.ok_or_else(|| {
        ChartError::Parse("a mark is required: bar(), line() or area()".to_string())
    })?;

    let mut spec = ChartSpec::new(mark);
    for (channel, def) in channels {
        spec.encoding.set(channel, def);
    }
    spec.transforms = transforms;
    spec.title = title;
    if let Some((w, h)) = size {
        spec = spec.size(w, h);
    }
    Ok(spec)
}

fn syntax_error(input: &str, err: nom::Err<nom::error::Error<&str>>) -> ChartError {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let position = input.len() - e.input.len();
            let snippet: String = e.input.chars().take(24).collect();
            if snippet.trim().is_empty() {
                ChartError::Parse(format!("unexpected end of input at position {}", position))
            } else {
                ChartError::Parse(format!(
                    "unexpected input at position {}: '{}'",
                    position, snippet
                ))
            }
        }
        nom::Err::Incomplete(_) => ChartError::Parse("incomplete input".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{CalcExpr, FieldType, Predicate, SortOrder, StackMode};

    #[test]
    fn test_parse_basic_spec() {
        let spec = parse_chart_spec("bar() | x(Decade:O) | y(Count:Q) | color(Subcategory:N)")
            .unwrap();
        assert_eq!(spec.mark, Mark::Bar);
        assert_eq!(
            spec.encoding.x,
            Some(ChannelDef::new("Decade", FieldType::Ordinal))
        );
        assert_eq!(
            spec.encoding.color,
            Some(ChannelDef::new("Subcategory", FieldType::Nominal))
        );
        assert!(spec.transforms.is_empty());
    }

    #[test]
    fn test_parse_full_spec() {
        let dsl = r#"
            bar()
            | filter(Category == "Housing Tenure" && Subcategory != "Occupied Housing Units")
            | x(Decade:O)
            | y(Count:Q, stack: normalize, title: "Occupancy Split")
            | color(Subcategory:N, title: "Type of Occupancy")
            | title("Types of Occupancy Distribution by Decade")
            | size(640, 400)
        "#;
        let spec = parse_chart_spec(dsl).unwrap();
        assert_eq!(spec.transforms.len(), 1);
        let y = spec.encoding.y.as_ref().unwrap();
        assert_eq!(y.stack, Some(StackMode::Normalize));
        assert_eq!(
            spec.title.as_deref(),
            Some("Types of Occupancy Distribution by Decade")
        );
        assert_eq!((spec.width, spec.height), (Some(640), Some(400)));
    }

    #[test]
    fn test_parse_transforms_keep_order() {
        let dsl = r#"line() | calculate(eduOrdering = "0") | filter(eduOrdering == "0") | x(Decade) | order(eduOrdering:O)"#;
        let spec = parse_chart_spec(dsl).unwrap();
        assert_eq!(
            spec.transforms,
            vec![
                Transform::Calculate {
                    name: "eduOrdering".to_string(),
                    expr: CalcExpr::Literal("0".to_string()),
                },
                Transform::Filter(Predicate::eq("eduOrdering", "0")),
            ]
        );
    }

    #[test]
    fn test_later_channel_replaces_earlier() {
        let spec = parse_chart_spec(
            "area() | x(Decade:O) | color(Subcategory:N, sort: ascending) | color(Subcategory:N, sort: descending)",
        )
        .unwrap();
        assert_eq!(
            spec.encoding.color.unwrap().sort,
            Some(SortOrder::Descending)
        );
    }

    #[test]
    fn test_missing_mark() {
        let err = parse_chart_spec("x(Decade:O) | y(Count:Q)").unwrap_err();
        assert!(matches!(err, ChartError::Parse(ref m) if m.contains("mark")));
    }

    #[test]
    fn test_two_marks() {
        assert!(matches!(
            parse_chart_spec("bar() | line() | x(Decade)"),
            Err(ChartError::Parse(_))
        ));
    }

    #[test]
    fn test_syntax_error_position() {
        let err = parse_chart_spec("bar() | x(Decade:O) | bogus()").unwrap_err();
        match err {
            ChartError::Parse(msg) => assert!(msg.contains("position 20"), "{}", msg),
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse_chart_spec("   "), Err(ChartError::Parse(_))));
    }
}

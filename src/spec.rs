//! Declarative chart specification.
//!
//! A [`ChartSpec`] names fields by string; nothing is checked against data here.
//! Binding a spec to a table (see [`crate::Chart::new`]) resolves every field
//! reference once and reports unknown fields before anything is rendered.

use crate::data::Literal;
use crate::error::{ChartError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Geometric mark drawn for each data point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Bar,
    Line,
    Area,
}

impl Mark {
    /// Bars and areas stack by default; lines only when asked to.
    pub fn stacks_by_default(self) -> bool {
        matches!(self, Mark::Bar | Mark::Area)
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mark::Bar => "bar",
            Mark::Line => "line",
            Mark::Area => "area",
        })
    }
}

/// Semantic type of an encoded field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Ordinal,
    Nominal,
    Quantitative,
}

impl FieldType {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "O" => Some(FieldType::Ordinal),
            "N" => Some(FieldType::Nominal),
            "Q" => Some(FieldType::Quantitative),
            _ => None,
        }
    }

    pub fn is_discrete(self) -> bool {
        !matches!(self, FieldType::Quantitative)
    }
}

/// Ordering of a discrete domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
    /// Fixed priority list. Values missing from the list trail after it in
    /// ascending order; listed values absent from the data are dropped.
    Explicit(Vec<String>),
}

impl SortOrder {
    pub fn explicit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SortOrder::Explicit(values.into_iter().map(Into::into).collect())
    }

    /// Same ordering, reversed
    pub fn reversed(&self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
            SortOrder::Explicit(v) => SortOrder::Explicit(v.iter().rev().cloned().collect()),
        }
    }
}

/// How the y channel is stacked across color categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackMode {
    Zero,
    Normalize,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    Sum,
    Count,
}

/// Visual encoding slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    X,
    Y,
    Color,
    Order,
    Column,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Channel::X => "x",
            Channel::Y => "y",
            Channel::Color => "color",
            Channel::Order => "order",
            Channel::Column => "column",
        })
    }
}

/// Field bound to a channel, with its presentation options
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<StackMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<Aggregate>,
}

impl ChannelDef {
    pub fn new(field: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            field: Some(field.into()),
            field_type: Some(field_type),
            ..Default::default()
        }
    }

    /// Parse `Field`, `Field:O`, `Field:N` or `Field:Q`.
    pub fn parse(shorthand: &str) -> Result<Self> {
        let shorthand = shorthand.trim();
        let (field, field_type) = match shorthand.rsplit_once(':') {
            Some((field, tag)) => {
                let ty = FieldType::from_tag(tag.trim())
                    .ok_or_else(|| ChartError::InvalidShorthand(shorthand.to_string()))?;
                (field.trim(), Some(ty))
            }
            None => (shorthand, None),
        };
        if field.is_empty() {
            return Err(ChartError::InvalidShorthand(shorthand.to_string()));
        }
        Ok(Self {
            field: Some(field.to_string()),
            field_type,
            ..Default::default()
        })
    }

    /// Number of records per group, used in place of a y field
    pub fn count() -> Self {
        Self {
            field_type: Some(FieldType::Quantitative),
            aggregate: Some(Aggregate::Count),
            ..Default::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn stack(mut self, stack: StackMode) -> Self {
        self.stack = Some(stack);
        self
    }

    pub fn aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = Some(aggregate);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Encoding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<ChannelDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<ChannelDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ChannelDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<ChannelDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<ChannelDef>,
}

impl Encoding {
    pub fn get(&self, channel: Channel) -> Option<&ChannelDef> {
        match channel {
            Channel::X => self.x.as_ref(),
            Channel::Y => self.y.as_ref(),
            Channel::Color => self.color.as_ref(),
            Channel::Order => self.order.as_ref(),
            Channel::Column => self.column.as_ref(),
        }
    }

    pub fn set(&mut self, channel: Channel, def: ChannelDef) {
        let slot = match channel {
            Channel::X => &mut self.x,
            Channel::Y => &mut self.y,
            Channel::Color => &mut self.color,
            Channel::Order => &mut self.order,
            Channel::Column => &mut self.column,
        };
        *slot = Some(def);
    }
}

/// Boolean expression over named fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Predicate {
    Eq { field: String, value: Literal },
    Ne { field: String, value: Literal },
    And(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(field: impl Into<String>, value: impl Into<Literal>) -> Self {
        Predicate::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Literal>) -> Self {
        Predicate::Ne {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Conjunction with another predicate, flattening nested `And`s
    pub fn and(self, other: Predicate) -> Self {
        let mut terms = match self {
            Predicate::And(terms) => terms,
            p => vec![p],
        };
        match other {
            Predicate::And(more) => terms.extend(more),
            p => terms.push(p),
        }
        Predicate::And(terms)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Eq { field, value } => write!(f, "{} == {}", field, value),
            Predicate::Ne { field, value } => write!(f, "{} != {}", field, value),
            Predicate::And(terms) => {
                for (i, t) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" && ")?;
                    }
                    write!(f, "({})", t)?;
                }
                Ok(())
            }
        }
    }
}

/// Right-hand side of a calculated field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalcExpr {
    Literal(String),
    Field(String),
}

/// Row-level data transforms, applied in declaration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transform {
    Filter(Predicate),
    Calculate { name: String, expr: CalcExpr },
}

/// Complete declarative chart description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub mark: Mark,
    #[serde(default)]
    pub encoding: Encoding,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transforms: Vec<Transform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ChartSpec {
    pub fn new(mark: Mark) -> Self {
        Self {
            mark,
            encoding: Encoding::default(),
            transforms: Vec::new(),
            title: None,
            width: None,
            height: None,
        }
    }

    pub fn encode(mut self, channel: Channel, def: ChannelDef) -> Self {
        self.encoding.set(channel, def);
        self
    }

    pub fn x(self, def: ChannelDef) -> Self {
        self.encode(Channel::X, def)
    }

    pub fn y(self, def: ChannelDef) -> Self {
        self.encode(Channel::Y, def)
    }

    pub fn color(self, def: ChannelDef) -> Self {
        self.encode(Channel::Color, def)
    }

    pub fn order(self, def: ChannelDef) -> Self {
        self.encode(Channel::Order, def)
    }

    pub fn column(self, def: ChannelDef) -> Self {
        self.encode(Channel::Column, def)
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.transforms.push(Transform::Filter(predicate));
        self
    }

    pub fn calculate(mut self, name: impl Into<String>, expr: CalcExpr) -> Self {
        self.transforms.push(Transform::Calculate {
            name: name.into(),
            expr,
        });
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shorthand() {
        let def = ChannelDef::parse("Decade:O").unwrap();
        assert_eq!(def.field.as_deref(), Some("Decade"));
        assert_eq!(def.field_type, Some(FieldType::Ordinal));

        let def = ChannelDef::parse("Count").unwrap();
        assert_eq!(def.field_type, None);
    }

    #[test]
    fn test_parse_shorthand_invalid() {
        assert!(matches!(
            ChannelDef::parse("Decade:T"),
            Err(ChartError::InvalidShorthand(_))
        ));
        assert!(ChannelDef::parse(":Q").is_err());
    }

    #[test]
    fn test_predicate_and_flattens() {
        let p = Predicate::eq("Category", "Housing Tenure")
            .and(Predicate::ne("Subcategory", "Occupied Housing Units"))
            .and(Predicate::ne("Decade", 1950.0));
        match p {
            Predicate::And(terms) => assert_eq!(terms.len(), 3),
            _ => panic!("Expected And"),
        }
    }

    #[test]
    fn test_predicate_display() {
        let p = Predicate::eq("Category", "Age").and(Predicate::ne("Count", 0.0));
        assert_eq!(p.to_string(), r#"(Category == "Age") && (Count != 0)"#);
    }

    #[test]
    fn test_sort_reversed() {
        let s = SortOrder::explicit(["a", "b", "c"]);
        assert_eq!(s.reversed(), SortOrder::explicit(["c", "b", "a"]));
        assert_eq!(SortOrder::Ascending.reversed(), SortOrder::Descending);
    }

    #[test]
    fn test_json_round_trip_keeps_meaning() {
        let spec = ChartSpec::new(Mark::Bar)
            .x(ChannelDef::new("Decade", FieldType::Ordinal))
            .y(ChannelDef::new("Count", FieldType::Quantitative).stack(StackMode::Normalize))
            .color(ChannelDef::new("Subcategory", FieldType::Nominal).sort(SortOrder::Descending))
            .filter(Predicate::eq("Category", "Age"))
            .title("Age Distribution by Decade");
        let json = spec.to_json().unwrap();
        assert!(json.contains("\"normalize\""));
        assert_eq!(ChartSpec::from_json(&json).unwrap(), spec);
    }
}

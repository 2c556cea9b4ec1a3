use crate::error::{ChartError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// One row of the demographic table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Subcategory")]
    pub subcategory: String,
    #[serde(rename = "Decade")]
    pub decade: String,
    #[serde(rename = "Count")]
    pub count: f64,
}

impl Record {
    pub fn new(
        category: impl Into<String>,
        subcategory: impl Into<String>,
        decade: impl Into<String>,
        count: f64,
    ) -> Self {
        Self {
            category: category.into(),
            subcategory: subcategory.into(),
            decade: decade.into(),
            count,
        }
    }

    pub fn get(&self, field: Field) -> Value<'_> {
        match field {
            Field::Category => Value::Text(&self.category),
            Field::Subcategory => Value::Text(&self.subcategory),
            Field::Decade => Value::Text(&self.decade),
            Field::Count => Value::Number(self.count),
        }
    }
}

/// The fixed set of record columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Category,
    Subcategory,
    Decade,
    Count,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::Category,
        Field::Subcategory,
        Field::Decade,
        Field::Count,
    ];

    /// Column header as it appears in the CSV file
    pub fn name(self) -> &'static str {
        match self {
            Field::Category => "Category",
            Field::Subcategory => "Subcategory",
            Field::Decade => "Decade",
            Field::Count => "Count",
        }
    }
}

impl FromStr for Field {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self> {
        Field::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| ChartError::field_not_found(s))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A field value borrowed from a row
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Text(&'a str),
    Number(f64),
}

impl Value<'_> {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    /// Loose equality against a literal: numbers match text that parses to the same number.
    pub fn matches(&self, literal: &Literal) -> bool {
        match (self, literal) {
            (Value::Text(a), Literal::Text(b)) => *a == b.as_str(),
            (_, Literal::Number(b)) => self.as_number() == Some(*b),
            (Value::Number(a), Literal::Text(b)) => b.trim().parse::<f64>().ok() == Some(*a),
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Number(n) => f.write_str(&format_number(*n)),
        }
    }
}

/// A constant appearing in a chart specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Number(f64),
    Text(String),
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::Text(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::Text(s)
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Literal::Number(n)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Text(s) => write!(f, "{:?}", s),
            Literal::Number(n) => f.write_str(&format_number(*n)),
        }
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// A resolved reference to either a record column or a calculated field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRef {
    Column(Field),
    Calculated(usize),
}

/// Field names a chart may refer to: the record columns plus calculated fields
/// in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    calculated: Vec<String>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, name: &str) -> Result<FieldRef> {
        if let Ok(field) = name.parse::<Field>() {
            return Ok(FieldRef::Column(field));
        }
        self.calculated
            .iter()
            .rposition(|c| c == name)
            .map(FieldRef::Calculated)
            .ok_or_else(|| ChartError::field_not_found(name))
    }

    pub fn add_calculated(&mut self, name: impl Into<String>) -> FieldRef {
        self.calculated.push(name.into());
        FieldRef::Calculated(self.calculated.len() - 1)
    }

    pub fn name(&self, field: FieldRef) -> &str {
        match field {
            FieldRef::Column(f) => f.name(),
            FieldRef::Calculated(i) => &self.calculated[i],
        }
    }
}

/// A record viewed together with the values of any calculated fields
#[derive(Debug, Clone)]
pub struct Row<'a> {
    pub record: &'a Record,
    pub calculated: Vec<String>,
}

impl<'a> Row<'a> {
    pub fn base(record: &'a Record) -> Self {
        Self {
            record,
            calculated: Vec::new(),
        }
    }

    pub fn value(&self, field: FieldRef) -> Value<'_> {
        match field {
            FieldRef::Column(f) => self.record.get(f),
            FieldRef::Calculated(i) => Value::Text(&self.calculated[i]),
        }
    }
}

/// Ordered, immutable collection of records loaded from a CSV file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    records: Vec<Record>,
}

impl Table {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Load a table from a CSV file with a header row
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ChartError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => ChartError::io(path, e),
        })?;
        let table = Self::from_reader(file)?;
        info!(path = %path.display(), records = table.len(), "loaded table");
        Ok(table)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        for field in Field::ALL {
            if !headers.iter().any(|h| h == field.name()) {
                return Err(ChartError::field_not_found(field.name()));
            }
        }

        let mut records = Vec::new();
        for (idx, result) in rdr.deserialize::<Record>().enumerate() {
            let record = result?;
            if !record.count.is_finite() || record.count < 0.0 {
                return Err(ChartError::InvalidRecord {
                    row: idx + 1,
                    reason: format!("Count must be finite and non-negative, got {}", record.count),
                });
            }
            records.push(record);
        }
        debug!(records = records.len(), "parsed CSV records");

        Ok(Self { records })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Distinct (Category, Subcategory) pairs in order of first appearance
    pub fn category_pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<(&str, &str)> = Vec::new();
        for r in &self.records {
            let pair = (r.category.as_str(), r.subcategory.as_str());
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }
        pairs
    }
}

impl FromIterator<Record> for Table {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

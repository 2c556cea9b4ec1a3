// Filter and calculate parsers for the chart DSL

use super::lexer::{field_name, number_literal, string_literal, ws};
use crate::data::Literal;
use crate::spec::{CalcExpr, Predicate, Transform};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::map,
    multi::separated_list1,
    IResult,
};

fn literal(input: &str) -> IResult<&str, Literal> {
    alt((
        map(string_literal, Literal::Text),
        map(number_literal, Literal::Number),
    ))(input)
}

/// Parse a single comparison
/// Format: Category == "Age" or Count != 0
fn comparison(input: &str) -> IResult<&str, Predicate> {
    let (input, field) = ws(field_name)(input)?;
    let (input, op) = ws(alt((tag("=="), tag("!="))))(input)?;
    let (input, value) = ws(literal)(input)?;
    let predicate = match op {
        "==" => Predicate::Eq { field, value },
        _ => Predicate::Ne { field, value },
    };
    Ok((input, predicate))
}

/// Parse a filter transform
/// Format: filter(Category == "Housing Tenure" && Subcategory != "Occupied Housing Units")
pub fn parse_filter(input: &str) -> IResult<&str, Transform> {
    let (input, _) = ws(tag("filter"))(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, mut terms) = separated_list1(ws(tag("&&")), comparison)(input)?;
    let (input, _) = ws(char(')'))(input)?;

    let predicate = if terms.len() == 1 {
        terms.remove(0)
    } else {
        Predicate::And(terms)
    };
    Ok((input, Transform::Filter(predicate)))
}

/// Parse a calculate transform
/// Format: calculate(eduOrdering = "0") or calculate(label = Subcategory)
pub fn parse_calculate(input: &str) -> IResult<&str, Transform> {
    let (input, _) = ws(tag("calculate"))(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, name) = ws(field_name)(input)?;
    let (input, _) = ws(char('='))(input)?;
    let (input, expr) = ws(alt((
        map(string_literal, CalcExpr::Literal),
        map(field_name, CalcExpr::Field),
    )))(input)?;
    let (input, _) = ws(char(')'))(input)?;

    Ok((input, Transform::Calculate { name, expr }))
}

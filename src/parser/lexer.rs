// Lexical helpers shared by the chart DSL parsers

use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not},
    character::complete::{alpha1, alphanumeric1, char, multispace0},
    combinator::{map, opt, recognize, value},
    multi::many0,
    number::complete::double,
    sequence::{delimited, pair},
    IResult,
};

/// Wrap a parser so it skips surrounding whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Bare identifier: letter or underscore, then letters, digits or underscores
pub fn identifier(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            alt((alpha1, nom::bytes::complete::tag("_"))),
            many0(alt((alphanumeric1, nom::bytes::complete::tag("_")))),
        )),
        |s: &str| s.to_string(),
    )(input)
}

fn quoted<'a>(quote: char) -> impl FnMut(&'a str) -> IResult<&'a str, String> {
    let forbidden = if quote == '"' { "\\\"" } else { "\\'" };
    move |input| {
        delimited(
            char(quote),
            map(
                opt(escaped_transform(
                    is_not(forbidden),
                    '\\',
                    alt((
                        value("\\", char('\\')),
                        value("\"", char('"')),
                        value("'", char('\'')),
                        value("\n", char('n')),
                    )),
                )),
                Option::unwrap_or_default,
            ),
            char(quote),
        )(input)
    }
}

/// Double- or single-quoted string with backslash escapes
pub fn string_literal(input: &str) -> IResult<&str, String> {
    alt((quoted('"'), quoted('\'')))(input)
}

pub fn number_literal(input: &str) -> IResult<&str, f64> {
    double(input)
}

/// Field name: bare identifier, or quoted when it contains spaces or punctuation
pub fn field_name(input: &str) -> IResult<&str, String> {
    alt((string_literal, identifier))(input)
}

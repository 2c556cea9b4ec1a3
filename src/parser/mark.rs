// Mark parser for the chart DSL

use super::lexer::ws;
use crate::spec::Mark;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::value,
    IResult,
};

/// Parse a mark
/// Format: bar(), line() or area()
pub fn parse_mark(input: &str) -> IResult<&str, Mark> {
    let (input, mark) = ws(alt((
        value(Mark::Bar, tag("bar")),
        value(Mark::Line, tag("line")),
        value(Mark::Area, tag("area")),
    )))(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, _) = ws(char(')'))(input)?;
    Ok((input, mark))
}

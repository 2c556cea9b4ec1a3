// Channel parser for the chart DSL

use super::lexer::{field_name, string_literal, ws};
use crate::spec::{Channel, ChannelDef, FieldType, SortOrder, StackMode};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, one_of},
    combinator::{map, opt, value},
    multi::{many0, separated_list1},
    sequence::{delimited, preceded},
    IResult,
};

#[derive(Debug, Clone)]
enum ChannelOption {
    Title(String),
    Sort(SortOrder),
    Stack(StackMode),
}

fn channel_name(input: &str) -> IResult<&str, Channel> {
    alt((
        value(Channel::X, tag("x")),
        value(Channel::Y, tag("y")),
        value(Channel::Color, tag("color")),
        value(Channel::Order, tag("order")),
        value(Channel::Column, tag("column")),
    ))(input)
}

fn type_tag(input: &str) -> IResult<&str, FieldType> {
    map(one_of("ONQ"), |c| match c {
        'O' => FieldType::Ordinal,
        'N' => FieldType::Nominal,
        _ => FieldType::Quantitative,
    })(input)
}

/// Parse `Field`, `Field:N` or `"Field with spaces":O`
fn shorthand(input: &str) -> IResult<&str, ChannelDef> {
    let (input, field) = ws(field_name)(input)?;
    let (input, field_type) = opt(preceded(ws(char(':')), ws(type_tag)))(input)?;
    Ok((
        input,
        ChannelDef {
            field: Some(field),
            field_type,
            ..Default::default()
        },
    ))
}

fn count(input: &str) -> IResult<&str, ChannelDef> {
    let (input, _) = ws(tag("count"))(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, _) = ws(char(')'))(input)?;
    Ok((input, ChannelDef::count()))
}

fn sort_order(input: &str) -> IResult<&str, SortOrder> {
    alt((
        value(SortOrder::Ascending, tag("ascending")),
        value(SortOrder::Descending, tag("descending")),
        map(
            delimited(
                ws(char('[')),
                separated_list1(ws(char(',')), ws(string_literal)),
                ws(char(']')),
            ),
            SortOrder::Explicit,
        ),
    ))(input)
}

fn stack_mode(input: &str) -> IResult<&str, StackMode> {
    alt((
        value(StackMode::Zero, tag("zero")),
        value(StackMode::Normalize, tag("normalize")),
        value(StackMode::None, tag("none")),
    ))(input)
}

fn channel_option(input: &str) -> IResult<&str, ChannelOption> {
    alt((
        map(
            preceded(ws(tag("title:")), ws(string_literal)),
            ChannelOption::Title,
        ),
        map(preceded(ws(tag("sort:")), ws(sort_order)), ChannelOption::Sort),
        map(preceded(ws(tag("stack:")), ws(stack_mode)), ChannelOption::Stack),
    ))(input)
}

/// Parse a channel declaration
/// Format: color(Subcategory:N, title: "Age Range", sort: descending)
pub fn parse_channel(input: &str) -> IResult<&str, (Channel, ChannelDef)> {
    let (input, channel) = ws(channel_name)(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, mut def) = if channel == Channel::Y {
        alt((count, shorthand))(input)?
    } else {
        shorthand(input)?
    };
    let (input, options) = many0(preceded(ws(char(',')), channel_option))(input)?;
    let (input, _) = ws(char(')'))(input)?;

    for option in options {
        match option {
            ChannelOption::Title(t) => def.title = Some(t),
            ChannelOption::Sort(s) => def.sort = Some(s),
            ChannelOption::Stack(s) => def.stack = Some(s),
        }
    }

    Ok((input, (channel, def)))
}

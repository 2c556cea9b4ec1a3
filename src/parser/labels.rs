use nom::{
    bytes::complete::tag,
    character::complete::char,
    combinator::verify,
    IResult,
};
use crate::parser::lexer::{number_literal, string_literal, ws};

/// Parse a chart title
/// Format: title("Age Distribution by Decade")
pub fn parse_title(input: &str) -> IResult<&str, String> {
    let (input, _) = ws(tag("title"))(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, title) = ws(string_literal)(input)?;
    let (input, _) = ws(char(')'))(input)?;
    Ok((input, title))
}

fn dimension(input: &str) -> IResult<&str, u32> {
    let (input, n) = ws(verify(number_literal, |n: &f64| {
        *n >= 1.0 && n.fract() == 0.0 && *n <= u32::MAX as f64
    }))(input)?;
    Ok((input, n as u32))
}

/// Parse a canvas size override
/// Format: size(800, 400)
pub fn parse_size(input: &str) -> IResult<&str, (u32, u32)> {
    let (input, _) = ws(tag("size"))(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, width) = dimension(input)?;
    let (input, _) = ws(char(','))(input)?;
    let (input, height) = dimension(input)?;
    let (input, _) = ws(char(')'))(input)?;
    Ok((input, (width, height)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_title() {
        let result = parse_title(r#"title("Race Distribution by Decade")"#);
        assert_eq!(result, Ok(("", "Race Distribution by Decade".to_string())));
    }

    #[test]
    fn test_parse_title_requires_string() {
        assert!(parse_title("title(Race)").is_err());
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("size( 640 , 480 )"), Ok(("", (640, 480))));
    }

    #[test]
    fn test_parse_size_rejects_bad_dimensions() {
        assert!(parse_size("size(0, 480)").is_err());
        assert!(parse_size("size(640.5, 480)").is_err());
        assert!(parse_size("size(640)").is_err());
    }
}

use crate::error::{ChartError, Result};
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

/// Replace `$name` references with values from `variables`.
///
/// Expansion also happens inside quoted strings. A `$` not followed by an
/// identifier is kept as-is; an undefined name is an error.
pub fn expand_variables(input: &str, variables: &HashMap<String, String>) -> Result<String> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            output.push(c);
            continue;
        }
        let name = consume_identifier(&mut chars);
        if name.is_empty() {
            output.push('$');
            continue;
        }
        match variables.get(&name) {
            Some(value) => output.push_str(value),
            None => return Err(ChartError::UndefinedVariable(name)),
        }
    }

    Ok(output)
}

fn consume_identifier(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut name = String::new();
    match chars.peek() {
        Some(&c) if c.is_alphabetic() || c == '_' => {}
        _ => return name,
    }

    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '_' {
            name.push(c);
            chars.next();
        } else {
            break;
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_expansion() {
        let vars = vars(&[("mark", "area"), ("field", "Subcategory")]);
        let input = "$mark() | x(Decade:O) | color($field:N)";
        let output = expand_variables(input, &vars).unwrap();
        assert_eq!(output, "area() | x(Decade:O) | color(Subcategory:N)");
    }

    #[test]
    fn test_string_interpolation() {
        let vars = vars(&[("category", "Age")]);
        let input = r#"bar() | filter(Category == "$category") | title("$category Distribution by Decade")"#;
        let output = expand_variables(input, &vars).unwrap();
        assert_eq!(
            output,
            r#"bar() | filter(Category == "Age") | title("Age Distribution by Decade")"#
        );
    }

    #[test]
    fn test_lone_dollar() {
        let input = r#"title("Median Rent ($)")"#;
        let output = expand_variables(input, &HashMap::new()).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_undefined_variable() {
        let result = expand_variables("x($missing)", &HashMap::new());
        assert!(matches!(result, Err(ChartError::UndefinedVariable(ref v)) if v == "missing"));
    }
}

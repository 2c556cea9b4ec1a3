//! Ordering of discrete domains.

use crate::spec::SortOrder;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Compare two labels numerically when both parse as numbers, lexically otherwise.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(fa), Ok(fb)) => fa.partial_cmp(&fb).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

/// Arrange distinct domain values according to a sort order.
///
/// For an explicit list, listed values come first in list order, unlisted values
/// follow in ascending natural order, and listed values not present are dropped.
pub fn arrange_domain(values: &[String], order: &SortOrder) -> Vec<String> {
    let mut distinct: Vec<String> = Vec::with_capacity(values.len());
    for v in values {
        if !distinct.contains(v) {
            distinct.push(v.clone());
        }
    }

    // Numeric order only applies when every value is numeric
    let all_numeric = distinct.iter().all(|s| s.trim().parse::<f64>().is_ok());
    let cmp = |a: &String, b: &String| {
        if all_numeric {
            natural_cmp(a, b)
        } else {
            a.cmp(b)
        }
    };

    match order {
        SortOrder::Ascending => {
            distinct.sort_by(cmp);
            distinct
        }
        SortOrder::Descending => {
            distinct.sort_by(|a, b| cmp(b, a));
            distinct
        }
        SortOrder::Explicit(priority) => {
            let mut arranged: Vec<String> = priority
                .iter()
                .filter(|p| distinct.contains(p))
                .fold(Vec::new(), |mut acc, p| {
                    if !acc.contains(p) {
                        acc.push(p.clone());
                    }
                    acc
                });
            let mut rest: Vec<String> = distinct
                .into_iter()
                .filter(|v| !priority.contains(v))
                .collect();
            rest.sort_by(cmp);
            arranged.extend(rest);
            arranged
        }
    }
}

/// Position of each value in an arranged domain
pub fn rank_map(domain: &[String]) -> HashMap<String, usize> {
    domain
        .iter()
        .enumerate()
        .map(|(i, v)| (v.clone(), i))
        .collect()
}

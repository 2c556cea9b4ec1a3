use crate::ir::{EncodedSeries, Scale, ScaleSystem};
use crate::spec::StackMode;

/// Build the scales shared by every panel of the chart
pub fn build_scales(data: &EncodedSeries) -> ScaleSystem {
    // X-Axis: one band per category, centred on its index
    let n = data.x_domain.len() as f64;
    let x = Scale {
        domain: (0.0, n),
        range: (-0.5, (n - 0.5).max(0.5)),
        is_categorical: true,
        categories: data.x_domain.clone(),
    };

    // Y-Axis: always includes zero
    let max = data
        .panels
        .iter()
        .flat_map(|p| p.series.iter())
        .flat_map(|s| s.points.iter())
        .map(|p| p.y1.max(p.y0))
        .fold(f64::NEG_INFINITY, f64::max);

    let top = if data.stack == StackMode::Normalize || !max.is_finite() || max <= 0.0 {
        1.0
    } else {
        nice_ceiling(max)
    };

    let y = Scale {
        domain: (0.0, top),
        range: (0.0, top),
        is_categorical: false,
        categories: Vec::new(),
    };

    ScaleSystem { x, y }
}

/// Smallest value of the form {1, 2, 2.5, 5} x 10^k that is >= `value`
pub fn nice_ceiling(value: f64) -> f64 {
    if value <= 0.0 || !value.is_finite() {
        return 1.0;
    }
    let magnitude = 10f64.powi(value.log10().floor() as i32);
    for step in [1.0, 2.0, 2.5, 5.0, 10.0] {
        let candidate = step * magnitude;
        if candidate >= value {
            return candidate;
        }
    }
    10.0 * magnitude
}

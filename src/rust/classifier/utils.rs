use ndarray::ArrayView1;

pub(crate) fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        // Same value, but avoids overflow in exp() for large negative scores
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Index of the largest value. Ties resolve to the lowest index.
pub(crate) fn argmax(row: ArrayView1<f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &p) in row.iter().enumerate() {
        match best {
            Some((_, bp)) if p <= bp => {}
            _ => best = Some((i, p)),
        }
    }
    best.map(|(i, _)| i)
}

/// Formats a probability as a percentage with two decimals, e.g. `0.9753` -> `97.53%`.
pub fn format_percent(p: f32) -> String {
    format!("{:.2}%", f64::from(p) * 100.0)
}

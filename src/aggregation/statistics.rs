use ordered_float::OrderedFloat;

/// Average, minimum and maximum of a set of readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

/// Summarizes the present, non-NaN values. `None` if there are none.
pub fn summarize(values: impl IntoIterator<Item = Option<f64>>) -> Option<Summary> {
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut min = OrderedFloat(f64::INFINITY);
    let mut max = OrderedFloat(f64::NEG_INFINITY);

    for value in values.into_iter().flatten().filter(|v| !v.is_nan()) {
        count += 1;
        sum += value;
        min = min.min(OrderedFloat(value));
        max = max.max(OrderedFloat(value));
    }

    (count > 0).then(|| Summary {
        avg: sum / count as f64,
        min: min.into_inner(),
        max: max.into_inner(),
    })
}

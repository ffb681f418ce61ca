//! Prefix and suffix scans over one group's age-sorted column
//!
//! Every function here operates on a single group. Callers partition by
//! group key first, so no scan ever crosses a group boundary.

/// Cumulative product shifted one step right and seeded with `seed`
///
/// `out[0] = seed`, `out[i] = out[i - 1] * values[i - 1]`.
pub fn shifted_cumulative_product(values: &[f64], seed: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut running = seed;
    for &value in values {
        out.push(running);
        running *= value;
    }
    out
}

/// `out[i] = sum(values[j] for j >= i)`, scanned from the last element down
pub fn reverse_cumulative_sum(values: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; values.len()];
    let mut running = 0.0;
    for i in (0..values.len()).rev() {
        running += values[i];
        out[i] = running;
    }
    out
}

/// One-step look-ahead: `out[i] = values[i + 1]`, `None` at the end
pub fn lead(values: &[f64]) -> Vec<Option<f64>> {
    (0..values.len()).map(|i| values.get(i + 1).copied()).collect()
}

/// Difference with the next element: `out[i] = values[i] - values[i + 1]`
pub fn difference_with_next(values: &[f64]) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| values.get(i + 1).map(|next| values[i] - next))
        .collect()
}

/// Sum of the defined values, skipping `None`
pub fn sum_defined(values: &[Option<f64>]) -> f64 {
    values.iter().flatten().sum()
}

/// Division yielding NaN for a zero denominator
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        f64::NAN
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shifted_cumulative_product() {
        let out = shifted_cumulative_product(&[0.5, 0.5, 0.0], 2.0);
        assert_eq!(out, vec![2.0, 1.0, 0.5]);
        assert!(shifted_cumulative_product(&[], 1.0).is_empty());
    }

    #[test]
    fn test_reverse_cumulative_sum() {
        assert_eq!(reverse_cumulative_sum(&[1.0, 2.0, 3.0]), vec![6.0, 5.0, 3.0]);
    }

    #[test]
    fn test_lead_and_difference() {
        let values = [4.0, 3.0, 1.0];
        assert_eq!(lead(&values), vec![Some(3.0), Some(1.0), None]);
        assert_eq!(difference_with_next(&values), vec![Some(1.0), Some(2.0), None]);
    }

    #[test]
    fn test_sum_defined_skips_none_but_keeps_nan() {
        assert_eq!(sum_defined(&[Some(1.0), None, Some(2.0)]), 3.0);
        assert!(sum_defined(&[Some(1.0), Some(f64::NAN)]).is_nan());
    }

    #[test]
    fn test_ratio_zero_denominator() {
        assert!(ratio(0.0, 0.0).is_nan());
        assert!(ratio(1.0, 0.0).is_nan());
        assert_eq!(ratio(1.0, 4.0), 0.25);
    }
}

//! Amplitude statistics and overview decimation.

/// Percentile with linear interpolation between closest ranks.
///
/// `p` is in percent. Non-finite values are ignored; an empty input gives 0.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Scale factor so that the `percentile` of absolute amplitude across `rows`
/// fills `target_fill` of one row spacing. Falls back to 1.0 when the data
/// is flat.
pub fn optimal_scale<'a, I>(rows: I, row_spacing: f64, target_fill: f64, percentile_p: f64) -> f64
where
    I: IntoIterator<Item = &'a [f64]>,
{
    let magnitudes: Vec<f64> = rows
        .into_iter()
        .flat_map(|row| row.iter().map(|v| v.abs()))
        .collect();
    let typical = percentile(&magnitudes, percentile_p);
    if typical > 0.0 {
        row_spacing * target_fill / typical
    } else {
        1.0
    }
}

/// Reduce `samples` to at most `max_bins` min/max pairs.
///
/// Each bin yields two points, min and max, in the order they occur so the
/// polyline keeps the envelope shape. Short inputs are returned unchanged.
pub fn min_max_decimate(
    samples: &[f64],
    start_sample: usize,
    sample_rate: f64,
    max_bins: usize,
) -> Vec<[f64; 2]> {
    let time = |i: usize| (start_sample + i) as f64 / sample_rate;
    if max_bins == 0 || samples.len() <= max_bins * 2 {
        return samples
            .iter()
            .enumerate()
            .map(|(i, v)| [time(i), *v])
            .collect();
    }
    let bin_len = samples.len().div_ceil(max_bins);
    let mut out = Vec::with_capacity(max_bins * 2);
    for (b, chunk) in samples.chunks(bin_len).enumerate() {
        let base = b * bin_len;
        let mut min_i = 0;
        let mut max_i = 0;
        for (i, v) in chunk.iter().enumerate() {
            if *v < chunk[min_i] {
                min_i = i;
            }
            if *v > chunk[max_i] {
                max_i = i;
            }
        }
        let (first, second) = if min_i <= max_i {
            (min_i, max_i)
        } else {
            (max_i, min_i)
        };
        out.push([time(base + first), chunk[first]]);
        if second != first {
            out.push([time(base + second), chunk[second]]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&v, 50.0), 3.0);
        assert!((percentile(&v, 95.0) - 4.8).abs() < 1e-12);
        assert_eq!(percentile(&v, 100.0), 5.0);
    }

    #[test]
    fn flat_data_scales_to_one() {
        let rows = [vec![0.0; 10]];
        assert_eq!(optimal_scale(rows.iter().map(Vec::as_slice), 1.0, 0.8, 95.0), 1.0);
    }

    #[test]
    fn decimation_keeps_extremes() {
        let mut samples = vec![0.0; 10_000];
        samples[1234] = 7.0;
        samples[8000] = -3.0;
        let pts = min_max_decimate(&samples, 0, 100.0, 100);
        assert!(pts.len() <= 200);
        assert!(pts.iter().any(|p| p[1] == 7.0 && (p[0] - 12.34).abs() < 1e-9));
        assert!(pts.iter().any(|p| p[1] == -3.0));
        assert!(pts.windows(2).all(|w| w[0][0] <= w[1][0]));
    }
}

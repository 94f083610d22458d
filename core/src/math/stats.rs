/// Summary statistics that skip missing (NaN) samples.
pub struct StatsHelper;

impl StatsHelper {
    pub fn valid_count(samples: &[f64]) -> usize {
        samples.iter().filter(|v| !v.is_nan()).count()
    }

    /// Mean of the non-missing samples, `None` when there are none.
    pub fn nan_mean(samples: &[f64]) -> Option<f64> {
        let (sum, count) = samples
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0.0, 0usize), |(sum, count), &v| (sum + v, count + 1));
        if count == 0 {
            return None;
        }
        Some(sum / count as f64)
    }

    /// Population standard deviation of the non-missing samples.
    pub fn nan_std(samples: &[f64]) -> Option<f64> {
        let mean = Self::nan_mean(samples)?;
        let (sum_sq, count) = samples
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0.0, 0usize), |(sum, count), &v| {
                (sum + (v - mean) * (v - mean), count + 1)
            });
        Some((sum_sq / count as f64).sqrt())
    }
}

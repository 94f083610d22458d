use crate::dataset::Dataset;
use crate::prelude::{PipelineError, PipelineResult};
use crate::telemetry::log::LogManager;
use ndarray::{Array, ArrayBase, Data, Dimension, Zip};

/// A sample is physically invalid when its magnitude is below its reported error.
fn is_invalid(value: f64, error: f64) -> bool {
    value.abs() < error.abs()
}

fn check_shapes<S, D>(
    field: &'static str,
    value: &ArrayBase<S, D>,
    error: &ArrayBase<S, D>,
) -> PipelineResult<()>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    if value.shape() != error.shape() {
        return Err(PipelineError::ShapeMismatch {
            field,
            expected: value.shape().to_vec(),
            found: error.shape().to_vec(),
        });
    }
    Ok(())
}

/// Element-wise mask, `true` where the sample must be excluded.
pub fn quality_mask<S, D>(
    field: &'static str,
    value: &ArrayBase<S, D>,
    error: &ArrayBase<S, D>,
) -> PipelineResult<Array<bool, D>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    check_shapes(field, value, error)?;
    Ok(Zip::from(value)
        .and(error)
        .map_collect(|&v, &e| is_invalid(v, e)))
}

/// Replaces every invalid sample with NaN; everything else passes through.
pub fn clean_measurement<S, D>(
    field: &'static str,
    value: &ArrayBase<S, D>,
    error: &ArrayBase<S, D>,
) -> PipelineResult<Array<f64, D>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    check_shapes(field, value, error)?;
    Ok(Zip::from(value)
        .and(error)
        .map_collect(|&v, &e| if is_invalid(v, e) { f64::NAN } else { v }))
}

/// Masks density, ion temperature and electron temperature of a dataset.
///
/// Line-of-sight velocity is left untouched so that low-signal drifts stay
/// visible downstream.
pub struct QualityFilter {
    logger: LogManager,
}

impl QualityFilter {
    pub fn new() -> Self {
        Self {
            logger: LogManager::new("quality"),
        }
    }

    pub fn apply(&self, dataset: &Dataset) -> PipelineResult<Dataset> {
        let density = dataset.density();
        let ion = dataset.ion_temperature();
        let electron = dataset.electron_temperature();

        let density = clean_measurement("density", &density.value, &density.error)?;
        let ion_temperature = clean_measurement("ion_temperature", &ion.value, &ion.error)?;
        let electron_temperature =
            clean_measurement("electron_temperature", &electron.value, &electron.error)?;

        self.logger.detail(&format!(
            "missing after masking: ne {} / ti {} / te {} of {}",
            count_missing(&density),
            count_missing(&ion_temperature),
            count_missing(&electron_temperature),
            density.len()
        ));

        Ok(dataset.with_cleaned(density, ion_temperature, electron_temperature))
    }
}

impl Default for QualityFilter {
    fn default() -> Self {
        Self::new()
    }
}

fn count_missing<D: Dimension>(values: &Array<f64, D>) -> usize {
    values.iter().filter(|v| v.is_nan()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ndarray::{Array1, Array2, Array3};

    #[test]
    fn output_matches_input_where_value_dominates_error() {
        let value = Array1::from(vec![10.0, 5.0, -8.0, 2.0, 0.0, f64::NAN, 7.0]);
        let error = Array1::from(vec![1.0, 5.0, 3.0, -3.0, 0.1, 1.0, f64::NAN]);
        let cleaned = clean_measurement("test", &value, &error).unwrap();

        for ((&v, &e), &c) in value.iter().zip(error.iter()).zip(cleaned.iter()) {
            if v.abs() < e.abs() {
                assert!(c.is_nan(), "{} with error {} should be masked", v, e);
            } else {
                assert_eq!(c.to_bits(), v.to_bits());
            }
        }
        // NaN value stays NaN, NaN error never masks
        assert!(cleaned[5].is_nan());
        assert_eq!(cleaned[6], 7.0);
    }

    #[test]
    fn mask_flags_only_invalid_samples() {
        let value = Array2::from_shape_vec((2, 2), vec![1.0, 10.0, -4.0, 3.0]).unwrap();
        let error = Array2::from_shape_vec((2, 2), vec![2.0, 1.0, 5.0, 3.0]).unwrap();
        let mask = quality_mask("test", &value, &error).unwrap();
        assert_eq!(
            mask,
            Array2::from_shape_vec((2, 2), vec![true, false, true, false]).unwrap()
        );
    }

    #[test]
    fn mismatched_error_shape_fails_fast() {
        let value = Array1::from(vec![1.0, 2.0]);
        let error = Array1::from(vec![1.0]);
        let err = clean_measurement("density", &value, &error).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ShapeMismatch {
                field: "density",
                ..
            }
        ));
    }

    #[test]
    fn dataset_filter_leaves_velocity_untouched() {
        let time = (0..2)
            .map(|i| Utc.timestamp_opt(1_600_000_000 + i, 0).unwrap())
            .collect();
        let small = Array3::from_elem((2, 1, 1), 1.0);
        let large = Array3::from_elem((2, 1, 1), 5.0);
        let dataset = Dataset::builder()
            .time(time)
            .altitude_km(Array2::from_elem((1, 1), 300.0))
            .beam_ids(vec![64157])
            .density(small.clone(), large.clone())
            .ion_temperature(large.clone(), small.clone())
            .electron_temperature(small.clone(), large.clone())
            .line_of_sight_velocity(small.clone(), large.clone())
            .build()
            .unwrap();

        let filtered = QualityFilter::new().apply(&dataset).unwrap();
        assert!(filtered.density().value.iter().all(|v| v.is_nan()));
        assert_eq!(filtered.ion_temperature().value, large);
        assert!(filtered.electron_temperature().value.iter().all(|v| v.is_nan()));
        assert_eq!(filtered.line_of_sight_velocity().unwrap().value, small);
        // input snapshot is not modified
        assert_eq!(dataset.density().value, small);
    }
}

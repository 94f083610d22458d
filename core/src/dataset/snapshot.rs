use crate::dataset::model::Dataset;
use crate::prelude::{PipelineError, PipelineResult};
use chrono::{DateTime, Utc};
use ndarray::{s, Array2, Array3, Array5, Axis};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Index of the temperature parameter along the last `fits` axis.
pub const TEMPERATURE_PARAM: usize = 1;
/// Index of the line-of-sight velocity parameter along the last `fits` axis.
pub const VELOCITY_PARAM: usize = 3;

/// Fitted-parameter arrays as copied out of a processed radar file.
///
/// Field names follow the source groups. `fits` and `errors` are indexed
/// `[time, beam, range, species, parameter]`, with electrons as the last
/// species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedSnapshot {
    #[serde(with = "crate::dataset::serde_nan")]
    pub beam_codes: Array2<f64>,
    #[serde(with = "crate::dataset::serde_nan")]
    pub unix_time: Array2<f64>,
    #[serde(with = "crate::dataset::serde_nan")]
    pub altitude_m: Array2<f64>,
    #[serde(with = "crate::dataset::serde_nan")]
    pub ne: Array3<f64>,
    #[serde(with = "crate::dataset::serde_nan")]
    pub dne: Array3<f64>,
    #[serde(with = "crate::dataset::serde_nan")]
    pub fits: Array5<f64>,
    #[serde(with = "crate::dataset::serde_nan")]
    pub errors: Array5<f64>,
}

impl FittedSnapshot {
    pub fn from_json_reader<R: Read>(reader: R) -> serde_json::Result<Self> {
        serde_json::from_reader(reader)
    }

    pub fn to_json_writer<W: Write>(&self, writer: W) -> serde_json::Result<()> {
        serde_json::to_writer(writer, self)
    }

    /// Number of fitted ion species (electrons excluded).
    pub fn ion_species_count(&self) -> usize {
        self.fits.len_of(Axis(3)).saturating_sub(1)
    }

    /// Extracts the per-quantity arrays for `ion_species_index` into a [`Dataset`].
    pub fn to_dataset(&self, ion_species_index: usize) -> PipelineResult<Dataset> {
        if self.fits.shape() != self.errors.shape() {
            return Err(PipelineError::ShapeMismatch {
                field: "errors",
                expected: self.fits.shape().to_vec(),
                found: self.errors.shape().to_vec(),
            });
        }

        let available = self.ion_species_count();
        if ion_species_index >= available {
            return Err(PipelineError::InvalidSpecies {
                index: ion_species_index,
                available,
            });
        }
        let electron = self.fits.len_of(Axis(3)) - 1;

        if self.fits.len_of(Axis(4)) <= VELOCITY_PARAM {
            let mut expected = self.fits.shape().to_vec();
            expected[4] = VELOCITY_PARAM + 1;
            return Err(PipelineError::ShapeMismatch {
                field: "fits",
                expected,
                found: self.fits.shape().to_vec(),
            });
        }

        if self.beam_codes.ncols() == 0 {
            return Err(PipelineError::ShapeMismatch {
                field: "beam_codes",
                expected: vec![self.altitude_m.nrows(), 1],
                found: self.beam_codes.shape().to_vec(),
            });
        }
        let beam_ids = self
            .beam_codes
            .column(0)
            .iter()
            .map(|&code| code as i64)
            .collect::<Vec<_>>();

        let time = self.timestamps()?;
        let altitude_km = self.altitude_m.mapv(|metres| metres / 1000.0);

        let channel = |source: &Array5<f64>, species: usize, param: usize| {
            source.slice(s![.., .., .., species, param]).to_owned()
        };

        Dataset::builder()
            .time(time)
            .altitude_km(altitude_km)
            .beam_ids(beam_ids)
            .density(self.ne.clone(), self.dne.clone())
            .ion_temperature(
                channel(&self.fits, ion_species_index, TEMPERATURE_PARAM),
                channel(&self.errors, ion_species_index, TEMPERATURE_PARAM),
            )
            .electron_temperature(
                channel(&self.fits, electron, TEMPERATURE_PARAM),
                channel(&self.errors, electron, TEMPERATURE_PARAM),
            )
            .line_of_sight_velocity(
                channel(&self.fits, ion_species_index, VELOCITY_PARAM),
                channel(&self.errors, ion_species_index, VELOCITY_PARAM),
            )
            .build()
    }

    /// Midpoint of each integration period, truncated to whole seconds.
    fn timestamps(&self) -> PipelineResult<Vec<DateTime<Utc>>> {
        if self.unix_time.ncols() != 2 {
            return Err(PipelineError::ShapeMismatch {
                field: "unix_time",
                expected: vec![self.unix_time.nrows(), 2],
                found: self.unix_time.shape().to_vec(),
            });
        }

        self.unix_time
            .rows()
            .into_iter()
            .enumerate()
            .map(|(index, row)| {
                let midpoint = (row[0] + row[1]) / 2.0;
                if !midpoint.is_finite() {
                    return Err(PipelineError::InvalidTimeAxis(format!(
                        "non-finite epoch at index {}",
                        index
                    )));
                }
                DateTime::from_timestamp(midpoint.floor() as i64, 0).ok_or_else(|| {
                    PipelineError::InvalidTimeAxis(format!(
                        "epoch {} at index {} out of range",
                        midpoint, index
                    ))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    /// Two records, one beam, two gates, O+ / O2+ / electrons, four parameters.
    fn snapshot() -> FittedSnapshot {
        let fits = Array::from_shape_fn((2, 1, 2, 3, 4), |(t, _, r, species, param)| {
            (1000 * species + 100 * param + 10 * t + r) as f64
        });
        FittedSnapshot {
            beam_codes: Array2::from_shape_vec((1, 4), vec![64157.0, -154.3, 77.5, 0.0]).unwrap(),
            unix_time: Array2::from_shape_vec(
                (2, 2),
                vec![1_600_000_000.0, 1_600_000_061.0, 1_600_000_061.0, 1_600_000_120.0],
            )
            .unwrap(),
            altitude_m: Array2::from_shape_vec((1, 2), vec![275_000.0, 305_000.0]).unwrap(),
            ne: Array3::from_elem((2, 1, 2), 1e11),
            dne: Array3::from_elem((2, 1, 2), 1e10),
            errors: fits.mapv(|v| v / 100.0),
            fits,
        }
    }

    #[test]
    fn extracts_selected_species_channels() {
        let dataset = snapshot().to_dataset(1).unwrap();
        // species 1, temperature param, t = 1, r = 0
        assert_eq!(dataset.ion_temperature().value[[1, 0, 0]], 1110.0);
        // electrons are the last species
        assert_eq!(dataset.electron_temperature().value[[0, 0, 1]], 2101.0);
        let velocity = dataset.line_of_sight_velocity().unwrap();
        assert_eq!(velocity.value[[0, 0, 0]], 1300.0);
        assert_eq!(velocity.error[[0, 0, 0]], 13.0);
    }

    #[test]
    fn converts_altitude_and_beam_codes() {
        let dataset = snapshot().to_dataset(0).unwrap();
        assert_eq!(dataset.beam_ids(), &[64157]);
        assert_eq!(dataset.altitude_km()[[0, 1]], 305.0);
    }

    #[test]
    fn timestamps_are_truncated_midpoints() {
        let dataset = snapshot().to_dataset(0).unwrap();
        assert_eq!(dataset.time()[0].timestamp(), 1_600_000_030);
        assert_eq!(dataset.time()[1].timestamp(), 1_600_000_090);
    }

    #[test]
    fn electron_slot_is_not_an_ion_species() {
        let err = snapshot().to_dataset(2).unwrap_err();
        assert_eq!(
            err,
            PipelineError::InvalidSpecies {
                index: 2,
                available: 2
            }
        );
    }

    #[test]
    fn json_round_trip_preserves_snapshot() {
        let original = snapshot();
        let mut buffer = Vec::new();
        original.to_json_writer(&mut buffer).unwrap();
        let restored = FittedSnapshot::from_json_reader(buffer.as_slice()).unwrap();
        assert_eq!(restored, original);
    }
}

use crate::dataset::{Dataset, Measurement, Quantity, SeriesLocation, TimeSeries};
use crate::prelude::{PipelineError, PipelineResult};
use crate::telemetry::log::LogManager;
use ndarray::{s, ArrayView1};

/// Per-quantity time series taken at one beam row and range gate.
#[derive(Debug, Clone, PartialEq)]
pub struct BeamSeries {
    pub location: SeriesLocation,
    pub ion_temperature: TimeSeries,
    pub density: TimeSeries,
    pub electron_temperature: TimeSeries,
    pub line_of_sight_velocity: Option<TimeSeries>,
}

/// Index of the gate closest to `target_km`, skipping missing altitudes.
///
/// Ties go to the lowest index.
pub fn nearest_gate(altitudes_km: ArrayView1<'_, f64>, target_km: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, &altitude) in altitudes_km.iter().enumerate() {
        let distance = (altitude - target_km).abs();
        if distance.is_nan() {
            continue;
        }
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((index, distance)),
        }
    }
    best.map(|(index, _)| index)
}

/// Reduces `[time, beam, range]` arrays to time series at a beam and altitude.
pub struct BeamSelector {
    logger: LogManager,
}

impl BeamSelector {
    pub fn new() -> Self {
        Self {
            logger: LogManager::new("selector"),
        }
    }

    /// Returns one [`BeamSeries`] per beam row carrying `beam_id`.
    ///
    /// The altitude profile of a beam is shared by every time step, so the
    /// gate is located once per row.
    pub fn select(
        &self,
        dataset: &Dataset,
        beam_id: i64,
        altitude_km: f64,
    ) -> PipelineResult<Vec<BeamSeries>> {
        let rows: Vec<usize> = dataset
            .beam_ids()
            .iter()
            .enumerate()
            .filter(|(_, id)| **id == beam_id)
            .map(|(index, _)| index)
            .collect();
        if rows.is_empty() {
            return Err(PipelineError::MissingBeam { beam_id });
        }

        rows.into_iter()
            .map(|beam_index| {
                let profile = dataset.altitude_km().row(beam_index);
                let gate_index = nearest_gate(profile, altitude_km)
                    .ok_or(PipelineError::NoValidRangeGate { beam_index })?;
                let location = SeriesLocation {
                    beam_id,
                    beam_index,
                    target_altitude_km: altitude_km,
                    gate_index,
                    gate_altitude_km: profile[gate_index],
                };
                self.logger.detail(&format!(
                    "beam {} row {} -> gate {} at {:.1} km (target {:.1} km)",
                    beam_id, beam_index, gate_index, location.gate_altitude_km, altitude_km
                ));
                self.extract(dataset, location)
            })
            .collect()
    }

    fn extract(&self, dataset: &Dataset, location: SeriesLocation) -> PipelineResult<BeamSeries> {
        let series = |quantity: Quantity, measurement: &Measurement| {
            let values = measurement
                .value
                .slice(s![.., location.beam_index, location.gate_index])
                .to_vec();
            TimeSeries::new(quantity, dataset.time().to_vec(), values)
        };

        let line_of_sight_velocity = dataset
            .line_of_sight_velocity()
            .map(|velocity| series(Quantity::LineOfSightVelocity, velocity))
            .transpose()?;

        Ok(BeamSeries {
            location,
            ion_temperature: series(Quantity::IonTemperature, dataset.ion_temperature())?,
            density: series(Quantity::Density, dataset.density())?,
            electron_temperature: series(
                Quantity::ElectronTemperature,
                dataset.electron_temperature(),
            )?,
            line_of_sight_velocity,
        })
    }
}

impl Default for BeamSelector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ndarray::{Array1, Array2, Array3};

    fn dataset() -> Dataset {
        let time = (0..3)
            .map(|i| Utc.timestamp_opt(1_600_000_000 + 60 * i, 0).unwrap())
            .collect();
        let altitude = Array2::from_shape_vec(
            (2, 4),
            vec![
                250.0, 270.0, 290.0, 310.0, // field-aligned
                f64::NAN, 280.0, 300.0, 320.0,
            ],
        )
        .unwrap();
        // value encodes (t, beam, gate)
        let cube = Array3::from_shape_fn((3, 2, 4), |(t, b, r)| (100 * t + 10 * b + r) as f64);
        let errors = Array3::zeros((3, 2, 4));
        Dataset::builder()
            .time(time)
            .altitude_km(altitude)
            .beam_ids(vec![64157, 64016])
            .density(cube.clone(), errors.clone())
            .ion_temperature(cube.clone(), errors.clone())
            .electron_temperature(cube, errors)
            .build()
            .unwrap()
    }

    #[test]
    fn nearest_gate_prefers_lowest_index_on_tie() {
        let profile = Array1::from(vec![270.0, 280.0, 290.0]);
        assert_eq!(nearest_gate(profile.view(), 275.0), Some(0));
        assert_eq!(nearest_gate(profile.view(), 289.0), Some(2));
    }

    #[test]
    fn nearest_gate_skips_missing_altitudes() {
        let profile = Array1::from(vec![f64::NAN, 400.0]);
        assert_eq!(nearest_gate(profile.view(), 0.0), Some(1));
        let empty = Array1::from(vec![f64::NAN, f64::NAN]);
        assert_eq!(nearest_gate(empty.view(), 300.0), None);
    }

    #[test]
    fn selects_series_at_closest_gate() {
        let selected = BeamSelector::new().select(&dataset(), 64157, 305.0).unwrap();
        assert_eq!(selected.len(), 1);
        let beam = &selected[0];
        assert_eq!(beam.location.gate_index, 3);
        assert_eq!(beam.location.gate_altitude_km, 310.0);
        assert_eq!(beam.ion_temperature.values(), &[3.0, 103.0, 203.0]);
        assert_eq!(beam.density.times().len(), 3);
        assert!(beam.line_of_sight_velocity.is_none());
    }

    #[test]
    fn second_beam_row_uses_its_own_profile() {
        let selected = BeamSelector::new().select(&dataset(), 64016, 275.0).unwrap();
        let beam = &selected[0];
        assert_eq!(beam.location.beam_index, 1);
        assert_eq!(beam.location.gate_index, 1);
        assert_eq!(beam.density.values(), &[11.0, 111.0, 211.0]);
    }

    #[test]
    fn absent_beam_is_reported() {
        let err = BeamSelector::new().select(&dataset(), 1, 300.0).unwrap_err();
        assert_eq!(err, PipelineError::MissingBeam { beam_id: 1 });
    }
}

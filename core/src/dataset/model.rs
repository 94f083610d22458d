use crate::prelude::{PipelineError, PipelineResult};
use chrono::{DateTime, Utc};
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};

/// Physical quantities carried by a [`Dataset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quantity {
    Density,
    IonTemperature,
    ElectronTemperature,
    LineOfSightVelocity,
}

impl Quantity {
    pub fn label(&self) -> &'static str {
        match self {
            Quantity::Density => "plasma density [m-3]",
            Quantity::IonTemperature => "ion temperature [K]",
            Quantity::ElectronTemperature => "electron temperature [K]",
            Quantity::LineOfSightVelocity => "line-of-sight ion velocity [m/s]",
        }
    }
}

/// A `[time, beam, range]` measurement together with its reported error.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub value: Array3<f64>,
    pub error: Array3<f64>,
}

impl Measurement {
    pub fn new(value: Array3<f64>, error: Array3<f64>) -> Self {
        Self { value, error }
    }
}

/// Immutable snapshot of one radar data file.
///
/// All measurements share the `time` axis and the `(beam, range)` shape of
/// `altitude_km`; [`DatasetBuilder::build`] refuses anything else.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    time: Vec<DateTime<Utc>>,
    altitude_km: Array2<f64>,
    beam_ids: Vec<i64>,
    density: Measurement,
    ion_temperature: Measurement,
    electron_temperature: Measurement,
    line_of_sight_velocity: Option<Measurement>,
}

impl Dataset {
    pub fn builder() -> DatasetBuilder {
        DatasetBuilder::default()
    }

    pub fn time(&self) -> &[DateTime<Utc>] {
        &self.time
    }

    pub fn altitude_km(&self) -> &Array2<f64> {
        &self.altitude_km
    }

    pub fn beam_ids(&self) -> &[i64] {
        &self.beam_ids
    }

    pub fn beam_count(&self) -> usize {
        self.beam_ids.len()
    }

    pub fn range_count(&self) -> usize {
        self.altitude_km.ncols()
    }

    pub fn measurement(&self, quantity: Quantity) -> Option<&Measurement> {
        match quantity {
            Quantity::Density => Some(&self.density),
            Quantity::IonTemperature => Some(&self.ion_temperature),
            Quantity::ElectronTemperature => Some(&self.electron_temperature),
            Quantity::LineOfSightVelocity => self.line_of_sight_velocity.as_ref(),
        }
    }

    pub fn density(&self) -> &Measurement {
        &self.density
    }

    pub fn ion_temperature(&self) -> &Measurement {
        &self.ion_temperature
    }

    pub fn electron_temperature(&self) -> &Measurement {
        &self.electron_temperature
    }

    pub fn line_of_sight_velocity(&self) -> Option<&Measurement> {
        self.line_of_sight_velocity.as_ref()
    }

    /// Copy of this dataset with the three filtered channels swapped in.
    pub(crate) fn with_cleaned(
        &self,
        density: Array3<f64>,
        ion_temperature: Array3<f64>,
        electron_temperature: Array3<f64>,
    ) -> Self {
        Self {
            time: self.time.clone(),
            altitude_km: self.altitude_km.clone(),
            beam_ids: self.beam_ids.clone(),
            density: Measurement::new(density, self.density.error.clone()),
            ion_temperature: Measurement::new(ion_temperature, self.ion_temperature.error.clone()),
            electron_temperature: Measurement::new(
                electron_temperature,
                self.electron_temperature.error.clone(),
            ),
            line_of_sight_velocity: self.line_of_sight_velocity.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct DatasetBuilder {
    time: Option<Vec<DateTime<Utc>>>,
    altitude_km: Option<Array2<f64>>,
    beam_ids: Option<Vec<i64>>,
    density: Option<Measurement>,
    ion_temperature: Option<Measurement>,
    electron_temperature: Option<Measurement>,
    line_of_sight_velocity: Option<Measurement>,
}

impl DatasetBuilder {
    pub fn time(mut self, time: Vec<DateTime<Utc>>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn altitude_km(mut self, altitude_km: Array2<f64>) -> Self {
        self.altitude_km = Some(altitude_km);
        self
    }

    pub fn beam_ids(mut self, beam_ids: Vec<i64>) -> Self {
        self.beam_ids = Some(beam_ids);
        self
    }

    pub fn density(mut self, value: Array3<f64>, error: Array3<f64>) -> Self {
        self.density = Some(Measurement::new(value, error));
        self
    }

    pub fn ion_temperature(mut self, value: Array3<f64>, error: Array3<f64>) -> Self {
        self.ion_temperature = Some(Measurement::new(value, error));
        self
    }

    pub fn electron_temperature(mut self, value: Array3<f64>, error: Array3<f64>) -> Self {
        self.electron_temperature = Some(Measurement::new(value, error));
        self
    }

    pub fn line_of_sight_velocity(mut self, value: Array3<f64>, error: Array3<f64>) -> Self {
        self.line_of_sight_velocity = Some(Measurement::new(value, error));
        self
    }

    pub fn build(self) -> PipelineResult<Dataset> {
        let time = self.time.ok_or(PipelineError::MissingField("time"))?;
        let altitude_km = self
            .altitude_km
            .ok_or(PipelineError::MissingField("altitude"))?;
        let beam_ids = self.beam_ids.ok_or(PipelineError::MissingField("beam_id"))?;
        let density = self.density.ok_or(PipelineError::MissingField("density"))?;
        let ion_temperature = self
            .ion_temperature
            .ok_or(PipelineError::MissingField("ion_temperature"))?;
        let electron_temperature = self
            .electron_temperature
            .ok_or(PipelineError::MissingField("electron_temperature"))?;

        if let Some(pos) = time.windows(2).position(|pair| pair[0] >= pair[1]) {
            return Err(PipelineError::InvalidTimeAxis(format!(
                "timestamps not strictly increasing at index {}",
                pos + 1
            )));
        }

        let (beams, ranges) = altitude_km.dim();
        if beam_ids.len() != beams {
            return Err(PipelineError::ShapeMismatch {
                field: "beam_id",
                expected: vec![beams],
                found: vec![beam_ids.len()],
            });
        }

        let expected = [time.len(), beams, ranges];
        check_measurement("density", &density, &expected)?;
        check_measurement("ion_temperature", &ion_temperature, &expected)?;
        check_measurement("electron_temperature", &electron_temperature, &expected)?;
        if let Some(velocity) = &self.line_of_sight_velocity {
            check_measurement("line_of_sight_velocity", velocity, &expected)?;
        }

        Ok(Dataset {
            time,
            altitude_km,
            beam_ids,
            density,
            ion_temperature,
            electron_temperature,
            line_of_sight_velocity: self.line_of_sight_velocity,
        })
    }
}

fn check_measurement(
    field: &'static str,
    measurement: &Measurement,
    expected: &[usize; 3],
) -> PipelineResult<()> {
    // value and paired error both have to match the shared axes
    for shape in [measurement.value.shape(), measurement.error.shape()] {
        if shape != expected {
            return Err(PipelineError::ShapeMismatch {
                field,
                expected: expected.to_vec(),
                found: shape.to_vec(),
            });
        }
    }
    Ok(())
}

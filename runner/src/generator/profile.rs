use crate::generator::template;
use anyhow::ensure;
use isrcore::dataset::snapshot::{TEMPERATURE_PARAM, VELOCITY_PARAM};
use isrcore::prelude::FIELD_ALIGNED_BEAM_ID;
use isrcore::FittedSnapshot;
use ndarray::{Array2, Array3, Array5};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const FIT_PARAMS: usize = 4;

/// Injected heating signature: ion temperature up, density down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatingEvent {
    pub beam_id: i64,
    pub start_record: usize,
    pub end_record: usize,
    pub temperature_factor: f64,
    pub density_factor: f64,
}

impl HeatingEvent {
    fn covers(&self, record: usize, beam_id: i64) -> bool {
        beam_id == self.beam_id && (self.start_record..self.end_record).contains(&record)
    }
}

/// Configuration for generating a synthetic fitted-parameter snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub records: usize,
    pub cadence_secs: f64,
    pub start_epoch: f64,
    pub beam_ids: Vec<i64>,
    pub gates: usize,
    pub first_gate_km: f64,
    pub gate_spacing_km: f64,
    pub ion_species: usize,
    /// Relative amplitude of the uniform multiplicative noise.
    pub noise: f64,
    /// Probability that a record/gate is lost (density and temperatures NaN).
    pub dropout: f64,
    pub relative_error: f64,
    pub seed: u64,
    pub heating: Option<HeatingEvent>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            records: 144,
            cadence_secs: 300.0,
            // 2023-03-01T00:00:00Z
            start_epoch: 1_677_628_800.0,
            beam_ids: vec![FIELD_ALIGNED_BEAM_ID, 64016, 64964],
            gates: 30,
            first_gate_km: 150.0,
            gate_spacing_km: 10.0,
            ion_species: 2,
            noise: 0.02,
            dropout: 0.0,
            relative_error: 0.05,
            seed: 0,
            heating: Some(HeatingEvent {
                beam_id: FIELD_ALIGNED_BEAM_ID,
                start_record: 18,
                end_record: 54,
                temperature_factor: 3.0,
                density_factor: 0.3,
            }),
        }
    }
}

impl GeneratorConfig {
    fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.records > 0, "generator needs at least one record");
        ensure!(self.gates > 0, "generator needs at least one range gate");
        ensure!(!self.beam_ids.is_empty(), "generator needs at least one beam");
        ensure!(self.ion_species > 0, "generator needs at least one ion species");
        ensure!(self.cadence_secs > 0.0, "cadence must be positive");
        ensure!(self.noise >= 0.0, "noise must not be negative");
        ensure!(
            (0.0..1.0).contains(&self.dropout),
            "dropout must lie in [0, 1)"
        );
        Ok(())
    }

    fn altitude_km(&self, beam: usize, gate: usize) -> f64 {
        // oblique beams sample slightly higher for the same gate
        self.first_gate_km + gate as f64 * self.gate_spacing_km + beam as f64 * 2.5
    }
}

fn jitter(rng: &mut StdRng, noise: f64) -> f64 {
    if noise > 0.0 {
        1.0 + rng.gen_range(-noise..noise)
    } else {
        1.0
    }
}

pub fn build_snapshot(config: &GeneratorConfig) -> anyhow::Result<FittedSnapshot> {
    config.validate()?;

    let records = config.records;
    let beams = config.beam_ids.len();
    let gates = config.gates;
    let species = config.ion_species + 1;
    let electron = species - 1;

    let mut rng = StdRng::seed_from_u64(config.seed);

    let beam_codes = Array2::from_shape_fn((beams, 4), |(b, column)| match column {
        0 => config.beam_ids[b] as f64,
        1 => -154.3 + 30.0 * b as f64,
        2 => 77.5 - 10.0 * b as f64,
        _ => 0.0,
    });
    let unix_time = Array2::from_shape_fn((records, 2), |(t, edge)| {
        config.start_epoch + (t + edge) as f64 * config.cadence_secs
    });
    let altitude_m =
        Array2::from_shape_fn((beams, gates), |(b, r)| config.altitude_km(b, r) * 1000.0);

    let mut ne = Array3::<f64>::zeros((records, beams, gates));
    let mut dne = Array3::<f64>::zeros((records, beams, gates));
    let mut fits = Array5::<f64>::zeros((records, beams, gates, species, FIT_PARAMS));
    let mut errors = Array5::<f64>::zeros((records, beams, gates, species, FIT_PARAMS));

    for t in 0..records {
        for (b, &beam_id) in config.beam_ids.iter().enumerate() {
            let heating = config
                .heating
                .as_ref()
                .filter(|event| event.covers(t, beam_id));
            let (ti_factor, ne_factor) = heating
                .map(|event| (event.temperature_factor, event.density_factor))
                .unwrap_or((1.0, 1.0));

            for r in 0..gates {
                let altitude = config.altitude_km(b, r);
                let lost = config.dropout > 0.0 && rng.gen::<f64>() < config.dropout;

                let density = template::chapman_density(altitude, 2e11, 300.0, 50.0)
                    * ne_factor
                    * jitter(&mut rng, config.noise);
                ne[[t, b, r]] = if lost { f64::NAN } else { density };
                dne[[t, b, r]] = density * config.relative_error;

                for s in 0..species {
                    let temperature = if s == electron {
                        template::electron_temperature(altitude) * jitter(&mut rng, config.noise)
                    } else {
                        template::ion_temperature(altitude)
                            * ti_factor
                            * jitter(&mut rng, config.noise)
                    };
                    let velocity = if config.noise > 0.0 {
                        rng.gen_range(-40.0..40.0)
                    } else {
                        0.0
                    };

                    fits[[t, b, r, s, 0]] = if s == 0 || s == electron { 1.0 } else { 0.0 };
                    fits[[t, b, r, s, TEMPERATURE_PARAM]] =
                        if lost { f64::NAN } else { temperature };
                    fits[[t, b, r, s, VELOCITY_PARAM]] = velocity;

                    errors[[t, b, r, s, TEMPERATURE_PARAM]] = temperature * config.relative_error;
                    errors[[t, b, r, s, VELOCITY_PARAM]] = 25.0;
                }
            }
        }
    }

    Ok(FittedSnapshot {
        beam_codes,
        unix_time,
        altitude_m,
        ne,
        dne,
        fits,
        errors,
    })
}

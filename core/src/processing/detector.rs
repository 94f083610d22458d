//! Adaptive dual-threshold detection of heating events.
//!
//! A window is an event when the ion temperature spreads upward and the
//! density spreads downward relative to their means by more than a pair of
//! percentage thresholds. The thresholds start strict and are relaxed
//! together, one step per round, until a round fires or either floor is
//! passed.

use crate::dataset::{
    DetectionOutcome, DetectionResult, RatioPair, SeriesLocation, ThresholdPair, WindowBounds,
};
use crate::prelude::DetectionConfig;
use crate::processing::window::WindowStats;
use crate::telemetry::log::LogManager;
use chrono::{DateTime, Utc};

/// Threshold pairs visited by the relaxation, strictest first.
///
/// Both thresholds drop by `threshold_step` per round; the sequence ends
/// before either one falls below its floor.
pub fn threshold_schedule(config: &DetectionConfig) -> Vec<ThresholdPair> {
    let step = config.threshold_step;
    if step.is_nan() || step <= 0.0 {
        return Vec::new();
    }
    (0u32..)
        .map(|round| {
            let relaxed = f64::from(round) * step;
            ThresholdPair {
                ti: config.initial_ti_threshold - relaxed,
                ne: config.initial_ne_threshold - relaxed,
            }
        })
        .take_while(|pair| {
            pair.ti >= config.min_ti_threshold && pair.ne >= config.min_ne_threshold
        })
        .collect()
}

/// Window-level ratios in percent, `None` when either mean is missing or zero.
pub fn window_ratios(ion_temperature: &WindowStats, density: &WindowStats) -> Option<RatioPair> {
    let ti_mean = ion_temperature.mean?;
    let ti_std = ion_temperature.std_dev?;
    let ne_mean = density.mean?;
    let ne_std = density.std_dev?;
    if ti_mean == 0.0 || ne_mean == 0.0 {
        return None;
    }

    let ratios = RatioPair {
        ti: (ti_mean + ti_std) / ti_mean * 100.0,
        ne: (ne_mean - ne_std) / ne_mean * 100.0,
    };
    (ratios.ti.is_finite() && ratios.ne.is_finite()).then_some(ratios)
}

/// Joint exceedance: temperature rise at or above, density depletion at or below.
pub fn round_fires(ratios: RatioPair, thresholds: ThresholdPair) -> bool {
    ratios.ti >= thresholds.ti && ratios.ne <= thresholds.ne
}

pub struct AdaptiveThresholdDetector {
    schedule: Vec<ThresholdPair>,
    logger: LogManager,
}

impl AdaptiveThresholdDetector {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            schedule: threshold_schedule(config),
            logger: LogManager::new("detector"),
        }
    }

    pub fn schedule(&self) -> &[ThresholdPair] {
        &self.schedule
    }

    /// Classifies one window.
    ///
    /// The ratios are window scalars, so a firing round flags every timestamp
    /// of the window and a silent round flags none. Relaxation stops at the
    /// first round that flags anything.
    pub fn classify(
        &self,
        location: SeriesLocation,
        window: WindowBounds,
        timestamps: &[DateTime<Utc>],
        ion_temperature: &WindowStats,
        density: &WindowStats,
    ) -> DetectionResult {
        let Some(ratios) = window_ratios(ion_temperature, density) else {
            self.logger.caution(&format!(
                "undefined statistics between {} and {} at {} km (valid ti {}, ne {}), skipping",
                window.start,
                window.end,
                location.target_altitude_km,
                ion_temperature.valid,
                density.valid
            ));
            return DetectionResult {
                location,
                window,
                ratios: None,
                rounds: 0,
                outcome: DetectionOutcome::NoEvent,
            };
        };

        for (round, thresholds) in self.schedule.iter().enumerate() {
            let flagged: Vec<DateTime<Utc>> = timestamps
                .iter()
                .copied()
                .filter(|_| round_fires(ratios, *thresholds))
                .collect();

            self.logger.detail(&format!(
                "round {}: ratio ti {:.2}% vs {:.0}, ratio ne {:.2}% vs {:.0} -> {} flagged",
                round + 1,
                ratios.ti,
                thresholds.ti,
                ratios.ne,
                thresholds.ne,
                flagged.len()
            ));

            if !flagged.is_empty() {
                return DetectionResult {
                    location,
                    window,
                    ratios: Some(ratios),
                    rounds: round + 1,
                    outcome: DetectionOutcome::Event {
                        thresholds: *thresholds,
                        flagged,
                    },
                };
            }
        }

        DetectionResult {
            location,
            window,
            ratios: Some(ratios),
            rounds: self.schedule.len(),
            outcome: DetectionOutcome::NoEvent,
        }
    }
}

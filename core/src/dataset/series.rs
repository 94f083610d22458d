use crate::dataset::model::Quantity;
use crate::prelude::{PipelineError, PipelineResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::ops::Range;

/// One scalar per time step, paired 1:1 with its timestamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    quantity: Quantity,
    times: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl TimeSeries {
    pub fn new(
        quantity: Quantity,
        times: Vec<DateTime<Utc>>,
        values: Vec<f64>,
    ) -> PipelineResult<Self> {
        if times.len() != values.len() {
            return Err(PipelineError::ShapeMismatch {
                field: quantity.label(),
                expected: vec![times.len()],
                found: vec![values.len()],
            });
        }
        Ok(Self {
            quantity,
            times,
            values,
        })
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values_in(&self, indices: Range<usize>) -> &[f64] {
        &self.values[indices]
    }
}

//! Measurement stream monitor.
//!
//! Wires the SPC engine to a [`MeasurementStore`]: record a value or a
//! subgroup, read back the trailing window for its (machine, item) stream,
//! and return the rounded evaluation. A transport layer maps its requests onto
//! these calls.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::SpcConfig;
use crate::error::{Result, SpcError};
use crate::simulation::SyntheticGenerator;
use crate::spc::{
    evaluate_individual, evaluate_individual_against, evaluate_subgrouped,
    evaluate_subgrouped_against, window_statistics, DispersionChart, IndividualEvaluation,
    Measurement, SubgroupedEvaluation,
};

/// Identifies one measurement stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamKey {
    /// Machine the measurements come from.
    pub machine_id: String,
    /// Measured characteristic on that machine.
    pub item_name: String,
}

impl StreamKey {
    /// Key for `item_name` on `machine_id`.
    pub fn new(machine_id: impl Into<String>, item_name: impl Into<String>) -> Self {
        Self {
            machine_id: machine_id.into(),
            item_name: item_name.into(),
        }
    }
}

impl std::fmt::Display for StreamKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.machine_id, self.item_name)
    }
}

/// Storage for measurement streams.
pub trait MeasurementStore {
    /// Append a measurement to a stream.
    fn append(&mut self, key: &StreamKey, measurement: Measurement) -> Result<()>;

    /// The last `limit` measurements of a stream, oldest first.
    fn recent(&self, key: &StreamKey, limit: usize) -> Result<Vec<Measurement>>;

    /// Remove measurements; `None` filters match everything.
    ///
    /// An item filter only applies together with a machine filter.
    /// Returns the number of measurements removed.
    fn clear(&mut self, machine_id: Option<&str>, item_name: Option<&str>) -> Result<usize>;
}

/// Process-local [`MeasurementStore`], ordered by timestamp.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    streams: HashMap<StreamKey, Vec<Measurement>>,
}

impl InMemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored measurements.
    pub fn len(&self) -> usize {
        self.streams.values().map(Vec::len).sum()
    }

    /// Whether no measurements are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MeasurementStore for InMemoryStore {
    fn append(&mut self, key: &StreamKey, measurement: Measurement) -> Result<()> {
        let stream = self.streams.entry(key.clone()).or_default();
        // Equal timestamps keep insertion order.
        let at = stream.partition_point(|m| m.timestamp <= measurement.timestamp);
        stream.insert(at, measurement);
        Ok(())
    }

    fn recent(&self, key: &StreamKey, limit: usize) -> Result<Vec<Measurement>> {
        Ok(self
            .streams
            .get(key)
            .map(|stream| stream[stream.len().saturating_sub(limit)..].to_vec())
            .unwrap_or_default())
    }

    fn clear(&mut self, machine_id: Option<&str>, item_name: Option<&str>) -> Result<usize> {
        let before = self.len();
        match (machine_id, item_name) {
            (Some(machine), Some(item)) => {
                self.streams.remove(&StreamKey::new(machine, item));
            }
            (Some(machine), None) => self.streams.retain(|k, _| k.machine_id != machine),
            (None, _) => self.streams.clear(),
        }
        Ok(before - self.len())
    }
}

/// SPC monitor over a measurement store.
pub struct SpcMonitor<S, R> {
    store: S,
    config: SpcConfig,
    generator: SyntheticGenerator<R>,
}

impl<S: MeasurementStore, R: Rng> SpcMonitor<S, R> {
    /// Create a monitor; the generator's anomaly probability is taken from
    /// `config.simulation`.
    pub fn new(store: S, config: SpcConfig, generator: SyntheticGenerator<R>) -> Self {
        let generator = generator.with_anomaly_probability(config.simulation.anomaly_probability);
        Self {
            store,
            config,
            generator,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &SpcConfig {
        &self.config
    }

    /// Underlying measurement store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record one value and evaluate the stream's Individual chart.
    pub fn judge(
        &mut self,
        key: &StreamKey,
        value: f64,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<IndividualEvaluation> {
        let timestamp = timestamp.unwrap_or_else(Utc::now);
        self.store.append(key, Measurement::new(value, timestamp))?;

        let recent = self.store.recent(key, self.config.window)?;
        let values: Vec<f64> = recent.iter().map(|m| m.value).collect();
        tracing::debug!(stream = %key, value, points = values.len(), "judging measurement");

        let window = match window_statistics(&values, self.config.window) {
            Some(w) if values.len() >= 2 => w,
            _ => return Ok(IndividualEvaluation::insufficient(value)),
        };
        let eval = match &self.config.spec_limits {
            Some(spec) => evaluate_individual_against(&values, window.mean, window.std_dev, spec),
            None => evaluate_individual(&values, window.mean, window.std_dev),
        };
        Ok(eval.rounded())
    }

    /// Record a subgroup and evaluate the stream's X-bar chart with
    /// `values.len()` as the subgroup size.
    ///
    /// # Errors
    ///
    /// - [`SpcError::InvalidSubgroupSize`] for an empty subgroup
    /// - [`SpcError::SampleStdDevUndefined`] for a single value on an S chart
    ///
    /// Nothing is stored when the subgroup is rejected.
    pub fn submit_subgroup(
        &mut self,
        key: &StreamKey,
        values: &[f64],
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<SubgroupedEvaluation> {
        if values.is_empty() {
            return Err(SpcError::InvalidSubgroupSize(0));
        }
        if self.config.chart == DispersionChart::Sigma && values.len() == 1 {
            return Err(SpcError::SampleStdDevUndefined);
        }
        let timestamp = timestamp.unwrap_or_else(Utc::now);
        for (i, &value) in values.iter().enumerate() {
            let measurement = Measurement {
                value,
                timestamp,
                subgroup_index: i,
            };
            self.store.append(key, measurement)?;
        }
        tracing::debug!(stream = %key, size = values.len(), "recorded subgroup");
        self.subgroup_chart(key, values.len())
    }

    /// Evaluate the last `subgroup_count` subgroups of size `subgroup_size`.
    pub fn subgroup_chart(&self, key: &StreamKey, subgroup_size: usize) -> Result<SubgroupedEvaluation> {
        let limit = subgroup_size.saturating_mul(self.config.subgroup_count);
        let recent = self.store.recent(key, limit)?;
        let chart = self.config.chart;
        let eval = match &self.config.spec_limits {
            Some(spec) => evaluate_subgrouped_against(&recent, subgroup_size, chart, spec)?,
            None => evaluate_subgrouped(&recent, subgroup_size, chart)?,
        };
        Ok(eval.rounded())
    }

    /// Judge a generated value drawn around the configured target.
    pub fn simulate(&mut self, key: &StreamKey) -> Result<IndividualEvaluation> {
        let sim = &self.config.simulation;
        let value = self.generator.value(sim.target_mean, sim.target_std_dev);
        self.judge(key, value, None)
    }

    /// Submit a generated subgroup of `config.subgroup_size` values.
    pub fn simulate_subgroup(&mut self, key: &StreamKey) -> Result<SubgroupedEvaluation> {
        let sim = &self.config.simulation;
        let values = self.generator.subgroup(
            self.config.subgroup_size,
            sim.target_mean,
            sim.target_std_dev,
        );
        self.submit_subgroup(key, &values, None)
    }

    /// The last `limit` measurements of a stream.
    pub fn measurements(&self, key: &StreamKey, limit: usize) -> Result<Vec<Measurement>> {
        self.store.recent(key, limit)
    }

    /// Remove stored measurements.
    pub fn clear(&mut self, machine_id: Option<&str>, item_name: Option<&str>) -> Result<usize> {
        let removed = self.store.clear(machine_id, item_name)?;
        tracing::info!(?machine_id, ?item_name, removed, "cleared measurements");
        Ok(removed)
    }
}

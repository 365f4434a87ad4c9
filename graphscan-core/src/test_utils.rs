//! Shared test utilities for `graphscan-core`.

use graphscan_test_support::ci::property_test_profile::ProptestRunProfile;
use proptest::test_runner::Config as ProptestConfig;

use crate::{datasource::DataSource, error::DataSourceError};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

/// Builds a standard proptest configuration from the shared CI profile.
#[must_use]
pub(crate) fn suite_proptest_config(default_cases: u32) -> ProptestConfig {
    let profile = ProptestRunProfile::load(default_cases);
    ProptestConfig {
        cases: profile.cases(),
        ..ProptestConfig::default()
    }
}

/// One-dimensional [`DataSource`] that records distance invocations.
#[derive(Clone, Debug)]
pub(crate) struct CountingSource {
    data: Vec<f32>,
    calls: Arc<AtomicUsize>,
}

impl CountingSource {
    #[must_use]
    pub(crate) fn new(data: Vec<f32>, calls: Arc<AtomicUsize>) -> Self {
        Self { data, calls }
    }

    /// Builds a source without caring about the call count.
    #[must_use]
    pub(crate) fn line(data: Vec<f32>) -> Self {
        Self::new(data, Arc::new(AtomicUsize::new(0)))
    }

    #[must_use]
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl DataSource for CountingSource {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn name(&self) -> &str {
        "counting"
    }

    fn distance(&self, i: usize, j: usize) -> Result<f32, DataSourceError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let len = self.data.len();
        let a = self
            .data
            .get(i)
            .ok_or(DataSourceError::OutOfRange { index: i, len })?;
        let b = self
            .data
            .get(j)
            .ok_or(DataSourceError::OutOfRange { index: j, len })?;
        Ok((a - b).abs())
    }
}

/// Positions `0, 1, ..., 9, 100` used by the line scenarios.
#[must_use]
pub(crate) fn line_with_outlier() -> Vec<f32> {
    graphscan_test_support::datasets::line_with_outlier()
        .into_iter()
        .map(|row| row[0])
        .collect()
}

//! Helpers shared by the graphscan-core integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use graphscan_core::{
    DataSource, DataSourceError, Dbscan, DbscanBuilder, NeighbourSearch, PointStore,
};
use graphscan_test_support::ci::property_test_profile::ProptestRunProfile;
use proptest::test_runner::Config as ProptestConfig;

/// One-dimensional source addressed by position, used where a full
/// [`PointStore`] would only add noise to the test.
#[derive(Clone, Debug)]
pub struct Line(pub Vec<f32>);

impl DataSource for Line {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn name(&self) -> &str {
        "line"
    }

    fn distance(&self, i: usize, j: usize) -> Result<f32, DataSourceError> {
        let len = self.0.len();
        let a = self
            .0
            .get(i)
            .ok_or(DataSourceError::OutOfRange { index: i, len })?;
        let b = self
            .0
            .get(j)
            .ok_or(DataSourceError::OutOfRange { index: j, len })?;
        Ok((a - b).abs())
    }
}

#[must_use]
pub fn store(name: &str, rows: Vec<Vec<f32>>) -> PointStore {
    PointStore::load(name, rows).expect("fixture rows are valid")
}

#[must_use]
pub fn dbscan(eps: f32, min_pts: usize, search: NeighbourSearch) -> Dbscan {
    DbscanBuilder::new()
        .with_eps(eps)
        .with_min_pts(min_pts)
        .with_neighbour_search(search)
        .build()
        .expect("test configuration is valid")
}

#[must_use]
pub fn proptest_config(default_cases: u32) -> ProptestConfig {
    ProptestConfig {
        cases: ProptestRunProfile::load(default_cases).cases(),
        ..ProptestConfig::default()
    }
}

/// Reference neighbourhoods computed with a plain double loop.
#[must_use]
pub fn reference_neighbours(store: &PointStore, eps: f32) -> Vec<Vec<usize>> {
    (0..store.len())
        .map(|i| {
            (0..store.len())
                .filter(|&j| j != i && store.distance(i, j).expect("ids in range") < eps)
                .collect()
        })
        .collect()
}

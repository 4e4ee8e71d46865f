use thiserror::Error;

use crate::models::{Coordinate, Doctor, GeoPoint, RankedDoctor};

/// Number of doctors returned for an emergency call
pub const NEAREST_LIMIT: usize = 3;

/// No doctor record carried a usable coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no doctors with a usable location are available")]
pub struct NoDoctorsAvailable;

/// Ranks doctors by great-circle distance from a caller
///
/// # Pipeline Stages
/// 1. Coordinate resolution (records without one are dropped)
/// 2. Distance calculation
/// 3. Stable ascending sort, so equal distances keep input order
/// 4. Truncation to `limit`
#[derive(Debug, Clone, Copy)]
pub struct NearestLocator {
    limit: usize,
}

impl NearestLocator {
    pub fn new(limit: usize) -> Self {
        Self { limit: limit.max(1) }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Find the doctors closest to `caller`
    ///
    /// # Returns
    /// Up to `limit` ranked doctors, nearest first, or `NoDoctorsAvailable`
    /// when no record could be placed on the map at all.
    pub fn find_nearest(
        &self,
        caller: &Coordinate,
        doctors: Vec<Doctor>,
    ) -> Result<Vec<RankedDoctor>, NoDoctorsAvailable> {
        let mut ranked: Vec<RankedDoctor> = doctors
            .into_iter()
            .filter_map(|mut doctor| {
                let coordinate = doctor.coordinate()?;
                let distance_km = caller.distance_km(&coordinate);
                doctor.location = Some(GeoPoint::from(coordinate));
                Some(RankedDoctor { doctor, distance_km })
            })
            .collect();

        if ranked.is_empty() {
            return Err(NoDoctorsAvailable);
        }

        // sort_by is stable
        ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        ranked.truncate(self.limit);

        Ok(ranked)
    }
}

impl Default for NearestLocator {
    fn default() -> Self {
        Self::new(NEAREST_LIMIT)
    }
}

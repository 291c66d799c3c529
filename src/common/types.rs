//! Common types used throughout local_planner

use nalgebra::Vector3;

/// Polar direction relative to the vehicle.
///
/// `e` is the elevation in degrees (-90 below, +90 above), `z` the azimuth
/// in degrees (0 along +y, +90 along +x) and `r` the radial distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarPoint {
    pub e: f64,
    pub z: f64,
    pub r: f64,
}

impl PolarPoint {
    pub fn new(e: f64, z: f64, r: f64) -> Self {
        Self { e, z, r }
    }
}

/// Vehicle pose as consumed by the planner: position plus yaw and pitch in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose3D {
    pub position: Vector3<f64>,
    pub yaw: f64,
    pub pitch: f64,
}

impl Pose3D {
    pub fn new(position: Vector3<f64>, yaw: f64, pitch: f64) -> Self {
        Self { position, yaw, pitch }
    }
}

/// Point cloud in the world frame
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    pub points: Vec<Vector3<f64>>,
}

impl PointCloud {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn from_points(points: Vec<Vector3<f64>>) -> Self {
        Self { points }
    }

    pub fn push(&mut self, point: Vector3<f64>) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Vector3<f64>> {
        self.points.iter()
    }
}

impl Default for PointCloud {
    fn default() -> Self {
        Self::new()
    }
}

/// Previously observed obstacle point in the world frame.
///
/// `age` counts the planning cycles since the point was last confirmed by the sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgedPoint {
    pub position: Vector3<f64>,
    pub age: u32,
}

impl AgedPoint {
    pub fn new(position: Vector3<f64>, age: u32) -> Self {
        Self { position, age }
    }
}

/// A ranked travel direction. Lower cost is better.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateDirection {
    pub cost: f64,
    pub direction: PolarPoint,
}

impl CandidateDirection {
    pub fn new(cost: f64, elevation: f64, azimuth: f64) -> Self {
        Self { cost, direction: PolarPoint::new(elevation, azimuth, 1.0) }
    }

    pub fn elevation(&self) -> f64 {
        self.direction.e
    }

    pub fn azimuth(&self) -> f64 {
        self.direction.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_cloud_push_and_clear() {
        let mut cloud = PointCloud::new();
        assert!(cloud.is_empty());
        cloud.push(Vector3::new(1.0, 2.0, 3.0));
        cloud.push(Vector3::new(4.0, 5.0, 6.0));
        assert_eq!(cloud.len(), 2);
        cloud.clear();
        assert!(cloud.is_empty());
    }

    #[test]
    fn test_candidate_direction_accessors() {
        let c = CandidateDirection::new(3.5, -9.0, 87.0);
        assert_eq!(c.elevation(), -9.0);
        assert_eq!(c.azimuth(), 87.0);
        assert!((c.direction.r - 1.0).abs() < 1e-12);
    }
}

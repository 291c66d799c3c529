//! Cropping of raw depth clouds to the region the histogram covers

use nalgebra::Vector3;
use serde::Deserialize;

use crate::common::PointCloud;

/// Thresholds applied while cropping
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Clouds with at most this many points after cropping are treated as noise
    pub min_cloud_size: usize,
    /// Obstacles closer than this [m] raise the backoff counter
    pub min_dist_backoff: f64,
    /// Sensor blind zone [m]; returns closer than this are discarded
    pub min_realsense_dist: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_cloud_size: 5,
            min_dist_backoff: 1.0,
            min_realsense_dist: 0.2,
        }
    }
}

/// Axis-aligned crop box centered on the vehicle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBox {
    pub radius: f64,
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub zmin: f64,
    pub zmax: f64,
}

impl HistogramBox {
    /// Box of half-width `radius`; limits are empty until `set_box_limits`
    pub fn new(radius: f64) -> Self {
        Self {
            radius: radius.max(0.0),
            xmin: 0.0,
            xmax: 0.0,
            ymin: 0.0,
            ymax: 0.0,
            zmin: 0.0,
            zmax: 0.0,
        }
    }

    /// Center the box on `position`. Below the vehicle the box reaches at most
    /// `ground_distance` down so ground returns are cropped away.
    pub fn set_box_limits(&mut self, position: &Vector3<f64>, ground_distance: f64) {
        self.xmin = position.x - self.radius;
        self.xmax = position.x + self.radius;
        self.ymin = position.y - self.radius;
        self.ymax = position.y + self.radius;
        self.zmin = position.z - self.radius.min(ground_distance.max(0.0));
        self.zmax = position.z + self.radius;
    }

    pub fn is_point_within_box(&self, p: &Vector3<f64>) -> bool {
        p.x > self.xmin && p.x < self.xmax && p.y > self.ymin && p.y < self.ymax && p.z > self.zmin && p.z < self.zmax
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPoint {
    pub point: Vector3<f64>,
    pub distance: f64,
}

/// Result of one filtering pass
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredCloud {
    pub cropped_cloud: PointCloud,
    /// `None` when no valid point survived the crop
    pub closest_point: Option<ClosestPoint>,
    pub counter_backoff: u32,
}

/// Merge `complete_cloud` into one cropped cloud around `position`.
///
/// Keeps finite points inside `histogram_box`, farther than the blind zone and
/// closer than the box radius. `counter_backoff` is the previous counter value;
/// the returned counter is incremented when the closest point is nearer than
/// `min_dist_backoff` and reset otherwise.
pub fn filter_point_cloud(
    complete_cloud: &[PointCloud],
    config: &FilterConfig,
    histogram_box: &HistogramBox,
    position: &Vector3<f64>,
    counter_backoff: u32,
) -> FilteredCloud {
    let mut cropped_cloud = PointCloud::new();
    let mut closest_point: Option<ClosestPoint> = None;

    for p in complete_cloud.iter().flat_map(|cloud| cloud.iter()) {
        if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
            continue;
        }
        if !histogram_box.is_point_within_box(p) {
            continue;
        }
        let distance = (p - position).norm();
        if distance > config.min_realsense_dist && distance < histogram_box.radius {
            cropped_cloud.push(*p);
            if closest_point.map_or(true, |c| distance < c.distance) {
                closest_point = Some(ClosestPoint { point: *p, distance });
            }
        }
    }

    if !cropped_cloud.is_empty() && cropped_cloud.len() <= config.min_cloud_size {
        log::debug!("Dropping cropped cloud of {} points as noise", cropped_cloud.len());
        cropped_cloud.clear();
        closest_point = None;
    }

    let counter_backoff = match closest_point {
        Some(c) if c.distance < config.min_dist_backoff => {
            let counter = counter_backoff.saturating_add(1);
            log::warn!("Obstacle at {:.2} m, backoff counter {}", c.distance, counter);
            counter
        }
        _ => 0,
    };

    FilteredCloud { cropped_cloud, closest_point, counter_backoff }
}

//! # Viewpoint
//!
//! The world streams chunks around whatever position a `ViewpointProvider` reports.
//! The provider is polled once per `World::update`.
//!
//! `FlyoverPath` is the provider used by the headless driver: a camera-like point
//! that travels a looping polyline of waypoints at constant speed.

use cgmath::{InnerSpace, Point3};
use web_time::Duration;

/// Source of the position chunks are streamed around.
pub trait ViewpointProvider {
    fn viewpoint(&self) -> Point3<f32>;
}

impl ViewpointProvider for Point3<f32> {
    fn viewpoint(&self) -> Point3<f32> {
        *self
    }
}

/// A looping path through a list of waypoints.
#[derive(Debug, Clone)]
pub struct FlyoverPath {
    waypoints: Vec<Point3<f32>>,
    /// Movement speed in blocks per second
    speed: f32,
    /// Index of the waypoint the current leg starts at
    leg: usize,
    /// Distance covered along the current leg
    progress: f32,
}

impl FlyoverPath {
    /// Creates a path starting at the first waypoint.
    ///
    /// # Arguments
    /// * `waypoints` - Positions visited in order; the last leg returns to the first
    /// * `speed` - Movement speed in blocks per second
    pub fn new(waypoints: Vec<Point3<f32>>, speed: f32) -> Self {
        FlyoverPath {
            waypoints,
            speed: speed.max(0.0),
            leg: 0,
            progress: 0.0,
        }
    }

    /// Moves along the path by `speed * dt`, wrapping around legs as needed.
    pub fn advance(&mut self, dt: Duration) {
        if self.waypoints.len() < 2 {
            return;
        }
        let mut remaining = self.speed * dt.as_secs_f32();
        // Bounded so a path of zero-length legs terminates.
        for _ in 0..self.waypoints.len() * 2 {
            let length = self.leg_vector().magnitude();
            if self.progress + remaining < length {
                self.progress += remaining;
                return;
            }
            remaining -= length - self.progress;
            self.progress = 0.0;
            self.leg = (self.leg + 1) % self.waypoints.len();
        }
    }

    /// The current position on the path.
    pub fn position(&self) -> Point3<f32> {
        match self.waypoints.get(self.leg) {
            None => Point3::new(0.0, 0.0, 0.0),
            Some(start) => {
                let delta = self.leg_vector();
                let length = delta.magnitude();
                if length <= f32::EPSILON {
                    *start
                } else {
                    *start + delta * (self.progress / length)
                }
            }
        }
    }

    fn leg_vector(&self) -> cgmath::Vector3<f32> {
        let count = self.waypoints.len();
        match (self.waypoints.get(self.leg), self.waypoints.get((self.leg + 1) % count.max(1))) {
            (Some(start), Some(end)) => *end - *start,
            _ => cgmath::Vector3::new(0.0, 0.0, 0.0),
        }
    }
}

impl ViewpointProvider for FlyoverPath {
    fn viewpoint(&self) -> Point3<f32> {
        self.position()
    }
}

use nalgebra::{Point2, Vector2};

use crate::sample::{DistanceReading, PoseSample};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionConvention {
    pub sin_sign: f64,
    pub cos_sign: f64,
}

impl DirectionConvention {
    pub fn direction(&self, angle: f64) -> Vector2<f64> {
        Vector2::new(self.sin_sign * angle.sin(), self.cos_sign * angle.cos())
    }
}

/// Producer convention: angles are clockwise from the Y axis and a direction is
/// `(-sin a, -cos a)`. Must not be rewritten through trig identities; a sign
/// change here silently swaps left and right.
pub const SENSOR_DIRECTION_CONVENTION: DirectionConvention = DirectionConvention {
    sin_sign: -1.0,
    cos_sign: -1.0,
};

pub const LEFT_SENSOR_OFFSET_DEG: f64 = 90.0;
pub const RIGHT_SENSOR_OFFSET_DEG: f64 = -90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaySide {
    Left,
    Right,
}

impl RaySide {
    pub fn label(&self) -> &'static str {
        match self {
            RaySide::Left => "left",
            RaySide::Right => "right",
        }
    }

    fn offset_deg(&self) -> f64 {
        match self {
            RaySide::Left => LEFT_SENSOR_OFFSET_DEG,
            RaySide::Right => RIGHT_SENSOR_OFFSET_DEG,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaySegment {
    pub origin: Point2<f64>,
    pub end: Point2<f64>,
    pub side: RaySide,
}

impl RaySegment {
    pub fn length(&self) -> f64 {
        (self.end - self.origin).norm()
    }

    pub fn label(&self) -> &'static str {
        self.side.label()
    }
}

pub fn heading_vector(pose: &PoseSample) -> Vector2<f64> {
    SENSOR_DIRECTION_CONVENTION.direction(pose.theta.to_radians())
}

pub fn compute_rays(pose: &PoseSample, reading: Option<&DistanceReading>) -> Vec<RaySegment> {
    let Some(reading) = reading else {
        return vec![];
    };

    let origin = Point2::new(pose.x, pose.y);
    [
        (RaySide::Left, reading.left),
        (RaySide::Right, reading.right),
    ]
    .into_iter()
    .filter_map(|(side, distance)| {
        let distance = distance?;
        let angle = (pose.theta + side.offset_deg()).to_radians();
        let end = origin + SENSOR_DIRECTION_CONVENTION.direction(angle) * distance;
        Some(RaySegment { origin, end, side })
    })
    .collect()
}

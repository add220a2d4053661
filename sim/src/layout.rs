//! Track layout generators.
//!
//! Both layouts are 32-point closed rings around the origin, base radius 40.
//! The circuit varies its radius in three sections and adds a hill and a dip;
//! the oval is flat with a constant radius.

use race_core::TrackPoint;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

pub const POINT_COUNT: usize = 32;
pub const BASE_RADIUS: f64 = 40.0;

/// Which centreline to generate.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum TrackLayout {
    /// Wide and tight sections with elevation changes
    Circuit,
    /// Flat constant-radius ring
    Oval,
}

impl TrackLayout {
    pub fn points(self) -> Vec<TrackPoint> {
        (0..POINT_COUNT)
            .map(|i| {
                let angle = i as f64 / POINT_COUNT as f64 * TAU;
                let (radius, height) = match self {
                    TrackLayout::Circuit => (BASE_RADIUS * circuit_radius_scale(i), circuit_height(i)),
                    TrackLayout::Oval => (BASE_RADIUS, 0.0),
                };
                TrackPoint::new(angle.cos() * radius, height, angle.sin() * radius, angle)
            })
            .collect()
    }
}

fn circuit_radius_scale(i: usize) -> f64 {
    match i {
        4..=8 => 1.3,
        12..=16 => 0.8,
        20..=24 => 1.2,
        _ => 1.0,
    }
}

fn circuit_height(i: usize) -> f64 {
    match i {
        6..=10 => ((i - 6) as f64 / 4.0 * PI).sin() * 3.0,
        18..=22 => -((i - 18) as f64 / 4.0 * PI).sin() * 2.0,
        _ => 0.0,
    }
}

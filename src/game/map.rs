use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::tuning::Tuning;

/// A circular spawn-exclusion region. Enemies cannot target the player while
/// the player stands inside one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SafeZone {
    pub center: Vec2,
    pub radius: f32,
}

impl SafeZone {
    pub fn contains(&self, point: Vec2) -> bool {
        point.distance(self.center) < self.radius
    }
}

/// Map dimensions plus the safe-zone list. Owned by the simulation so tests
/// can run several worlds side by side.
#[derive(Debug, Clone, Resource)]
pub struct WorldMap {
    pub width: f32,
    pub height: f32,
    pub safe_zones: Vec<SafeZone>,
}

impl WorldMap {
    /// Default layout: one zone at map center, one near each far corner.
    pub fn from_tuning(tuning: &Tuning) -> Self {
        let r = tuning.safe_zone_radius;
        let (w, h) = (tuning.map_width, tuning.map_height);
        Self {
            width: w,
            height: h,
            safe_zones: vec![
                SafeZone { center: Vec2::new(w / 2.0, h / 2.0), radius: r },
                SafeZone { center: Vec2::new(250.0, 250.0), radius: r },
                SafeZone { center: Vec2::new(w - 250.0, h - 250.0), radius: r },
            ],
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn in_safe_zone(&self, point: Vec2) -> bool {
        self.safe_zones.iter().any(|z| z.contains(point))
    }

    pub fn clamp_point(&self, point: Vec2, radius: f32) -> Vec2 {
        Vec2::new(
            point.x.clamp(radius, self.width - radius),
            point.y.clamp(radius, self.height - radius),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_membership() {
        let map = WorldMap::from_tuning(&Tuning::default());
        assert!(map.in_safe_zone(map.center()));
        assert!(!map.in_safe_zone(Vec2::new(1500.0, 300.0)));
    }

    #[test]
    fn clamp_keeps_point_inside() {
        let map = WorldMap::from_tuning(&Tuning::default());
        let p = map.clamp_point(Vec2::new(-50.0, 1e9), 28.0);
        assert_eq!(p.x, 28.0);
        assert_eq!(p.y, map.height - 28.0);
    }
}

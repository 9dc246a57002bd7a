use serde::{Deserialize, Serialize};

use super::skills::Milestones;
use super::types::{DamageReduction, Multiplier};

/// Pre-computed player stats read during combat ticks. Written once per tick
/// by the recompute pass and consumed starting the next tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveStats {
    pub max_hp: f32,
    /// Projectile damage per shot.
    pub damage: f32,
    /// Contact damage per second while overlapping a target.
    pub body_damage: f32,
    /// Base defense fraction, before debuffs and extra-DR sources.
    pub defense: DamageReduction,
    /// Movement speed in world units per second.
    pub move_speed: f32,
    pub mobility_mult: Multiplier,
    /// Fraction of max hp regenerated per second.
    pub regen_frac: f32,
    pub milestones: Milestones,
    /// Extra DR from the defense milestone (0 when locked).
    pub milestone_dr: DamageReduction,
    /// Damage multiplier vs blocks from the damage milestone.
    pub block_damage_mult: Multiplier,
    /// Chance to fully ignore an incoming hit (speed milestone).
    pub ignore_hit_chance: f32,
    /// Flat extra DR from the Tank class.
    pub reborn_dr: DamageReduction,
    /// Shield pool size; zero unless Tank.
    pub shield_max: f32,
    /// Rank-derived damage multiplier.
    pub rank_damage_mult: Multiplier,
    /// Rank-derived extra DR.
    pub rank_dr: DamageReduction,
}

impl EffectiveStats {
    /// Damage per player shot, rank multiplier included.
    pub fn projectile_damage(&self) -> f32 {
        self.damage * self.rank_damage_mult.0
    }

    /// Contact damage per second while overlapping, rank multiplier included.
    pub fn contact_damage(&self) -> f32 {
        self.body_damage * self.rank_damage_mult.0
    }
}

impl Default for EffectiveStats {
    fn default() -> Self {
        Self {
            max_hp: 100.0,
            damage: 25.0,
            body_damage: 10.0,
            defense: DamageReduction::zero(),
            move_speed: 192.0,
            mobility_mult: Multiplier::one(),
            regen_frac: 0.0,
            milestones: Milestones::default(),
            milestone_dr: DamageReduction::zero(),
            block_damage_mult: Multiplier::one(),
            ignore_hit_chance: 0.0,
            reborn_dr: DamageReduction::zero(),
            shield_max: 0.0,
            rank_damage_mult: Multiplier::one(),
            rank_dr: DamageReduction::zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_multiplier_scales_both_damage_channels() {
        let stats = EffectiveStats {
            damage: 40.0,
            body_damage: 20.0,
            rank_damage_mult: Multiplier::new(1.5),
            ..Default::default()
        };
        assert!((stats.projectile_damage() - 60.0).abs() < 1e-6);
        assert!((stats.contact_damage() - 30.0).abs() < 1e-6);

        let unranked = EffectiveStats::default();
        assert_eq!(unranked.projectile_damage(), unranked.damage);
        assert_eq!(unranked.contact_damage(), unranked.body_damage);
    }
}

use super::effective::EffectiveStats;
use super::skills::{Milestones, SkillAllocation};
use super::types::{DamageReduction, Multiplier, RebornClass};
use crate::config::tuning::Tuning;

/// Rank-derived bonuses, weighted by class: DPS leans on damage, Tank on
/// reduction. `steps` counts attained rank tiers (0 = unranked).
pub fn rank_bonuses(
    steps: u32,
    class: Option<RebornClass>,
    tuning: &Tuning,
) -> (Multiplier, DamageReduction) {
    if steps == 0 {
        return (Multiplier::one(), DamageReduction::zero());
    }
    let (dmg_per, dr_per) = match class {
        Some(RebornClass::Dps) => (tuning.rank_dps_damage_per_step, tuning.rank_dps_dr_per_step),
        _ => (tuning.rank_tank_damage_per_step, tuning.rank_tank_dr_per_step),
    };
    let dmg_mult = Multiplier::new(1.0 + dmg_per * steps as f32);
    let dr = DamageReduction::new((dr_per * steps as f32).min(tuning.rank_dr_bonus_cap));
    (dmg_mult, dr)
}

/// Pure derivation of the player's effective stats from base tuning, the
/// skill tree, the reborn class, and attained rank steps. No side effects;
/// every output is clamped here so combat never sees out-of-range values.
pub fn recompute_stats(
    skills: &SkillAllocation,
    class: Option<RebornClass>,
    rank_steps: u32,
    tuning: &Tuning,
) -> EffectiveStats {
    let hp_mul = 1.0 + tuning.hp_per_point * skills.max_hp as f32;
    let dmg_mul = 1.0 + tuning.damage_per_point * skills.damage as f32;
    let body_mul = 1.0 + tuning.body_damage_per_point * skills.body_damage as f32;
    let def_add = tuning.defense_per_point * skills.defense as f32;
    let speed_mul = 1.0 + tuning.speed_per_point * skills.speed as f32;
    let mob_mul = 1.0 + tuning.mobility_per_point * skills.mobility as f32;
    let regen_add = tuning.regen_per_point * skills.regen as f32;

    let milestones = Milestones::from_allocation(skills, tuning);

    let max_hp = (tuning.base_hp * hp_mul).round();
    let mut damage = (tuning.base_damage * dmg_mul).round();
    if class == Some(RebornClass::Dps) {
        damage = (damage * tuning.dps_projectile_mult).round();
    }
    // DPS cannot hold body-damage points; zero the stat even if legacy
    // points exist from before the class choice.
    let body_damage = if class == Some(RebornClass::Dps) {
        0.0
    } else {
        (tuning.base_body_damage * body_mul).round()
    };

    let (rank_damage_mult, rank_dr) = rank_bonuses(rank_steps, class, tuning);

    EffectiveStats {
        max_hp,
        damage,
        body_damage,
        defense: DamageReduction::new(tuning.base_defense + def_add),
        move_speed: tuning.base_speed * speed_mul,
        mobility_mult: Multiplier::new(mob_mul),
        regen_frac: regen_add.max(0.0),
        milestones,
        milestone_dr: if milestones.bulwark {
            DamageReduction::new(tuning.milestone_extra_dr)
        } else {
            DamageReduction::zero()
        },
        block_damage_mult: if milestones.block_breaker {
            Multiplier::new(tuning.milestone_block_damage_mult)
        } else {
            Multiplier::one()
        },
        ignore_hit_chance: if milestones.untouchable {
            tuning.milestone_ignore_chance
        } else {
            0.0
        },
        reborn_dr: if class == Some(RebornClass::Tank) {
            DamageReduction::new(tuning.tank_extra_dr)
        } else {
            DamageReduction::zero()
        },
        shield_max: if class == Some(RebornClass::Tank) {
            (max_hp * tuning.tank_shield_fraction).round()
        } else {
            0.0
        },
        rank_damage_mult,
        rank_dr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_points_gives_base_stats() {
        let tuning = Tuning::default();
        let stats = recompute_stats(&SkillAllocation::default(), None, 0, &tuning);
        assert_eq!(stats.max_hp, 100.0);
        assert_eq!(stats.damage, 25.0);
        assert_eq!(stats.body_damage, 10.0);
        assert_eq!(stats.defense.0, 0.0);
        assert_eq!(stats.shield_max, 0.0);
    }

    #[test]
    fn per_point_multipliers() {
        let tuning = Tuning::default();
        let skills = SkillAllocation {
            damage: 5,
            max_hp: 3,
            defense: 2,
            ..Default::default()
        };
        let stats = recompute_stats(&skills, None, 0, &tuning);
        assert_eq!(stats.damage, 40.0); // 25 * 1.60
        assert_eq!(stats.max_hp, 130.0); // 100 * 1.30
        assert!((stats.defense.0 - 0.08).abs() < 1e-6);
    }

    #[test]
    fn defense_is_capped_for_any_allocation() {
        let tuning = Tuning::default();
        let skills = SkillAllocation {
            defense: 1000,
            ..Default::default()
        };
        let stats = recompute_stats(&skills, None, 0, &tuning);
        assert!(stats.defense.0 <= 0.95);
    }

    #[test]
    fn dps_multiplies_projectile_and_disables_body() {
        let tuning = Tuning::default();
        let skills = SkillAllocation {
            body_damage: 4,
            ..Default::default()
        };
        let stats = recompute_stats(&skills, Some(RebornClass::Dps), 0, &tuning);
        assert_eq!(stats.damage, 31.0); // round(25 * 1.25)
        assert_eq!(stats.body_damage, 0.0);
    }

    #[test]
    fn tank_gets_shield_and_extra_dr() {
        let tuning = Tuning::default();
        let stats = recompute_stats(&SkillAllocation::default(), Some(RebornClass::Tank), 0, &tuning);
        assert_eq!(stats.shield_max, 60.0);
        assert!((stats.reborn_dr.0 - 0.10).abs() < 1e-6);
    }

    #[test]
    fn rank_bonuses_weighted_by_class() {
        let tuning = Tuning::default();
        let (dmg, dr) = rank_bonuses(4, Some(RebornClass::Dps), &tuning);
        assert!((dmg.0 - 1.12).abs() < 1e-6);
        assert!((dr.0 - 0.04).abs() < 1e-6);
        let (dmg, dr) = rank_bonuses(4, Some(RebornClass::Tank), &tuning);
        assert!((dmg.0 - 1.06).abs() < 1e-6);
        assert!((dr.0 - 0.12).abs() < 1e-6);
    }

    #[test]
    fn rank_dr_bonus_is_capped() {
        let tuning = Tuning::default();
        let (_, dr) = rank_bonuses(100, Some(RebornClass::Tank), &tuning);
        assert!((dr.0 - tuning.rank_dr_bonus_cap).abs() < 1e-6);
    }
}

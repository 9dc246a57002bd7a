use serde::{Deserialize, Serialize};

use super::types::{RebornClass, SkillKind};
use crate::config::tuning::Tuning;

/// Points allocated per skill. One field per skill, never a keyed map, so a
/// misspelled skill name is a compile error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillAllocation {
    pub damage: u32,
    pub body_damage: u32,
    pub defense: u32,
    pub max_hp: u32,
    pub regen: u32,
    pub speed: u32,
    pub mobility: u32,
}

impl SkillAllocation {
    pub fn get(&self, kind: SkillKind) -> u32 {
        match kind {
            SkillKind::Damage => self.damage,
            SkillKind::BodyDamage => self.body_damage,
            SkillKind::Defense => self.defense,
            SkillKind::MaxHp => self.max_hp,
            SkillKind::Regen => self.regen,
            SkillKind::Speed => self.speed,
            SkillKind::Mobility => self.mobility,
        }
    }

    fn get_mut(&mut self, kind: SkillKind) -> &mut u32 {
        match kind {
            SkillKind::Damage => &mut self.damage,
            SkillKind::BodyDamage => &mut self.body_damage,
            SkillKind::Defense => &mut self.defense,
            SkillKind::MaxHp => &mut self.max_hp,
            SkillKind::Regen => &mut self.regen,
            SkillKind::Speed => &mut self.speed,
            SkillKind::Mobility => &mut self.mobility,
        }
    }

    /// Try to spend `count` points from `available` into `kind`.
    /// Rejected (None) on insufficient points or a class-disabled skill;
    /// the caller treats rejection as a no-op.
    pub fn spend(
        &mut self,
        kind: SkillKind,
        count: u32,
        available: u32,
        class: Option<RebornClass>,
    ) -> Option<u32> {
        if count == 0 || count > available {
            return None;
        }
        if kind == SkillKind::BodyDamage && class == Some(RebornClass::Dps) {
            return None;
        }
        *self.get_mut(kind) += count;
        Some(available - count)
    }
}

/// Passive bonuses unlocked at `Tuning::milestone_points` in one skill.
/// Recomputed on every stat pass; monotonic as long as points never shrink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestones {
    /// Damage milestone: bonus damage vs blocks.
    pub block_breaker: bool,
    /// Defense milestone: extra damage reduction, composed in.
    pub bulwark: bool,
    /// Speed milestone: chance to fully ignore an incoming hit.
    pub untouchable: bool,
}

impl Milestones {
    pub fn from_allocation(skills: &SkillAllocation, tuning: &Tuning) -> Self {
        let at = tuning.milestone_points;
        Self {
            block_breaker: skills.damage >= at,
            bulwark: skills.defense >= at,
            untouchable: skills.speed >= at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spend_rejects_insufficient_points() {
        let mut skills = SkillAllocation::default();
        assert_eq!(skills.spend(SkillKind::Damage, 3, 2, None), None);
        assert_eq!(skills.damage, 0);
    }

    #[test]
    fn spend_rejects_body_damage_as_dps() {
        let mut skills = SkillAllocation::default();
        let left = skills.spend(SkillKind::BodyDamage, 1, 5, Some(RebornClass::Dps));
        assert_eq!(left, None);
        assert_eq!(skills.body_damage, 0);
        // Tank may still allocate there.
        let left = skills.spend(SkillKind::BodyDamage, 1, 5, Some(RebornClass::Tank));
        assert_eq!(left, Some(4));
        assert_eq!(skills.body_damage, 1);
    }

    #[test]
    fn milestones_unlock_at_ten_points() {
        let tuning = Tuning::default();
        let mut skills = SkillAllocation {
            damage: 9,
            ..Default::default()
        };
        assert!(!Milestones::from_allocation(&skills, &tuning).block_breaker);
        skills.damage = 10;
        let m = Milestones::from_allocation(&skills, &tuning);
        assert!(m.block_breaker);
        assert!(!m.bulwark);
        assert!(!m.untouchable);
    }
}

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::components::{Player, RebornState};
use super::events::{CommandMessage, PowerMessage, UiMessage, UiNote};
use super::stats::types::SkillKind;
use crate::config::tuning::Tuning;

/// Rank tiers, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RankTier {
    E,
    EPlus,
    D,
    DPlus,
    C,
    CPlus,
    B,
    BPlus,
    A,
    APlus,
    S,
    SPlus,
    SS,
    SSPlus,
    SSS,
    SSSPlus,
    U,
}

impl RankTier {
    pub const ORDER: [RankTier; 17] = [
        RankTier::E,
        RankTier::EPlus,
        RankTier::D,
        RankTier::DPlus,
        RankTier::C,
        RankTier::CPlus,
        RankTier::B,
        RankTier::BPlus,
        RankTier::A,
        RankTier::APlus,
        RankTier::S,
        RankTier::SPlus,
        RankTier::SS,
        RankTier::SSPlus,
        RankTier::SSS,
        RankTier::SSSPlus,
        RankTier::U,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::E => "E",
            Self::EPlus => "E+",
            Self::D => "D",
            Self::DPlus => "D+",
            Self::C => "C",
            Self::CPlus => "C+",
            Self::B => "B",
            Self::BPlus => "B+",
            Self::A => "A",
            Self::APlus => "A+",
            Self::S => "S",
            Self::SPlus => "S+",
            Self::SS => "SS",
            Self::SSPlus => "SS+",
            Self::SSS => "SSS",
            Self::SSSPlus => "SSS+",
            Self::U => "U",
        }
    }

    fn index(self) -> usize {
        Self::ORDER.iter().position(|t| *t == self).unwrap_or(0)
    }

    /// Attained rank steps when holding this tier (E = 1 step).
    pub fn steps(self) -> u32 {
        self.index() as u32 + 1
    }

    pub fn next(self) -> Option<RankTier> {
        Self::ORDER.get(self.index() + 1).copied()
    }

    /// Total power required to start this tier's trial.
    pub fn required_power(self) -> u32 {
        match self {
            Self::E => 40,
            Self::EPlus => 100,
            Self::D => 180,
            Self::DPlus => 300,
            Self::C => 450,
            Self::CPlus => 600,
            Self::B => 850,
            Self::BPlus => 1000,
            Self::A => 1500,
            Self::APlus => 2000,
            Self::S => 3000,
            Self::SPlus => 4500,
            Self::SS => 6500,
            Self::SSPlus => 10000,
            Self::SSS => 15000,
            Self::SSSPlus => 25000,
            Self::U => 50000,
        }
    }

    /// Fixed level of the trial boss guarding this tier.
    pub fn trial_boss_level(self) -> u32 {
        match self {
            Self::E => 5,
            Self::EPlus => 15,
            Self::D => 25,
            Self::DPlus => 30,
            Self::C => 40,
            Self::CPlus => 75,
            Self::B => 100,
            Self::BPlus => 160,
            Self::A => 210,
            Self::APlus => 280,
            Self::S => 360,
            Self::SPlus => 500,
            Self::SS => 700,
            Self::SSPlus => 1000,
            Self::SSS => 1500,
            Self::SSSPlus => 3000,
            Self::U => 5000,
        }
    }

    /// Power rewarded for defeating this tier's trial boss.
    pub fn trial_reward(self) -> u32 {
        match self {
            Self::E | Self::EPlus | Self::D | Self::DPlus | Self::C => 5,
            Self::CPlus => 10,
            Self::B => 15,
            Self::BPlus => 20,
            Self::A => 50,
            Self::APlus => 75,
            Self::S => 100,
            Self::SPlus => 120,
            Self::SS => 150,
            Self::SSPlus => 200,
            Self::SSS => 250,
            Self::SSSPlus => 500,
            Self::U => 1000,
        }
    }
}

/// Why a rank-trial start was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialRejection {
    Locked,
    NoNextRank,
    TrialActive,
    NotEnoughPower { need: u32 },
}

#[derive(Debug, Clone, Copy)]
pub struct ActiveTrial {
    pub target: RankTier,
    pub boss: Entity,
}

/// Rank meta-progression state. Power only ever accumulates.
#[derive(Resource, Default)]
pub struct RankState {
    pub unlocked: bool,
    pub current: Option<RankTier>,
    pub power_from_skills: u32,
    pub power_from_bosses: u32,
    pub power_from_achievements: u32,
    pub active_trial: Option<ActiveTrial>,
}

impl RankState {
    pub fn total_power(&self) -> u32 {
        self.power_from_skills + self.power_from_bosses + self.power_from_achievements
    }

    /// Attained rank steps (0 = unranked).
    pub fn steps(&self) -> u32 {
        self.current.map(RankTier::steps).unwrap_or(0)
    }

    pub fn next_rank(&self) -> Option<RankTier> {
        if !self.unlocked {
            return None;
        }
        match self.current {
            None => Some(RankTier::E),
            Some(t) => t.next(),
        }
    }

    /// Check eligibility to start the next trial.
    pub fn can_progress(&self) -> Result<RankTier, TrialRejection> {
        if !self.unlocked {
            return Err(TrialRejection::Locked);
        }
        if self.active_trial.is_some() {
            return Err(TrialRejection::TrialActive);
        }
        let next = self.next_rank().ok_or(TrialRejection::NoNextRank)?;
        let need = next.required_power();
        if self.total_power() < need {
            return Err(TrialRejection::NotEnoughPower { need });
        }
        Ok(next)
    }

    /// Commit a defeated trial boss: reward power and advance the rank.
    pub fn on_trial_boss_defeated(&mut self, target: RankTier) {
        self.power_from_bosses += target.trial_reward();
        self.current = Some(target);
        self.active_trial = None;
    }

    /// Abort the active trial without advancing (the boss died, but not to
    /// the player). The banked power is untouched, so the trial can be
    /// restarted.
    pub fn on_trial_boss_lost(&mut self) {
        self.active_trial = None;
    }

    /// Bank power for points spent into a skill. Power is credited at spend
    /// time and never recomputed from the live allocation, so a reborn's
    /// skill reset cannot shrink it.
    pub fn bank_skill_power(&mut self, kind: SkillKind, count: u32) {
        self.power_from_skills += skill_point_power(kind) * count;
    }

    /// Generic power grant (achievements, enemy-credited kills).
    pub fn grant_achievement_power(&mut self, v: u32) {
        self.power_from_achievements += v;
    }
}

/// Power contributed by one point spent into a skill:
/// damage ×2, body ×3, defense ×3, hp ×1, everything else 0.
pub fn skill_point_power(kind: SkillKind) -> u32 {
    match kind {
        SkillKind::Damage => 2,
        SkillKind::BodyDamage => 3,
        SkillKind::Defense => 3,
        SkillKind::MaxHp => 1,
        SkillKind::Regen | SkillKind::Speed | SkillKind::Mobility => 0,
    }
}

/// ProgressionSet: refresh unlock state and fold in power grants from this
/// tick. Skill power is banked at spend time, not recomputed here.
pub fn tick_rank(
    tuning: Res<Tuning>,
    mut rank: ResMut<RankState>,
    mut power_events: MessageReader<PowerMessage>,
    player: Query<&RebornState, With<Player>>,
) {
    if let Ok(reborn) = player.single() {
        rank.unlocked = reborn.count >= tuning.rank_unlock_reborn_count;
    }
    for PowerMessage(v) in power_events.read() {
        rank.grant_achievement_power(*v);
    }
}

/// ProgressionSet: start a rank trial on request. Ineligible requests are
/// rejected with a reason (logged), never a panic.
pub fn handle_trial_commands(
    mut commands: Commands,
    tuning: Res<Tuning>,
    map: Res<super::map::WorldMap>,
    mut rng: ResMut<super::components::GameRng>,
    mut rank: ResMut<RankState>,
    mut command_events: MessageReader<CommandMessage>,
    mut ui_events: MessageWriter<UiMessage>,
) {
    for event in command_events.read() {
        if !matches!(event, CommandMessage::StartRankTrial) {
            continue;
        }
        match rank.can_progress() {
            Ok(target) => {
                let boss = super::spawn::spawn_trial_boss(
                    &mut commands,
                    &tuning,
                    &map,
                    &mut rng.0,
                    target,
                );
                rank.active_trial = Some(ActiveTrial { target, boss });
                ui_events.write(UiMessage::new(UiNote::BossSpawned));
                info!("Rank trial started: {} (boss level {})", target.label(), target.trial_boss_level());
            }
            Err(reason) => {
                info!("Rank trial rejected: {reason:?}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_and_steps() {
        assert_eq!(RankTier::E.steps(), 1);
        assert_eq!(RankTier::U.steps(), 17);
        assert_eq!(RankTier::E.next(), Some(RankTier::EPlus));
        assert_eq!(RankTier::U.next(), None);
    }

    #[test]
    fn skill_power_weights() {
        assert_eq!(skill_point_power(SkillKind::Damage), 2);
        assert_eq!(skill_point_power(SkillKind::BodyDamage), 3);
        assert_eq!(skill_point_power(SkillKind::Defense), 3);
        assert_eq!(skill_point_power(SkillKind::MaxHp), 1);
        assert_eq!(skill_point_power(SkillKind::Regen), 0);
        assert_eq!(skill_point_power(SkillKind::Speed), 0);
        assert_eq!(skill_point_power(SkillKind::Mobility), 0);
    }

    #[test]
    fn banked_skill_power_survives_without_the_allocation() {
        let mut rank = RankState::default();
        rank.bank_skill_power(SkillKind::Damage, 2);
        rank.bank_skill_power(SkillKind::Defense, 1);
        assert_eq!(rank.power_from_skills, 7);
        // A skill reset has no handle on this bucket; it only grows.
        rank.bank_skill_power(SkillKind::Regen, 5);
        assert_eq!(rank.power_from_skills, 7);
    }

    #[test]
    fn locked_rank_rejects_trial() {
        let rank = RankState::default();
        assert_eq!(rank.can_progress(), Err(TrialRejection::Locked));
    }

    #[test]
    fn trial_requires_power_and_exclusivity() {
        let mut rank = RankState {
            unlocked: true,
            ..Default::default()
        };
        assert_eq!(
            rank.can_progress(),
            Err(TrialRejection::NotEnoughPower { need: 40 })
        );

        rank.power_from_achievements = 40;
        assert_eq!(rank.can_progress(), Ok(RankTier::E));

        rank.active_trial = Some(ActiveTrial {
            target: RankTier::E,
            boss: Entity::PLACEHOLDER,
        });
        assert_eq!(rank.can_progress(), Err(TrialRejection::TrialActive));
    }

    #[test]
    fn defeating_trial_boss_commits_rank() {
        let mut rank = RankState {
            unlocked: true,
            power_from_achievements: 40,
            active_trial: Some(ActiveTrial {
                target: RankTier::E,
                boss: Entity::PLACEHOLDER,
            }),
            ..Default::default()
        };
        rank.on_trial_boss_defeated(RankTier::E);
        assert_eq!(rank.current, Some(RankTier::E));
        assert_eq!(rank.power_from_bosses, RankTier::E.trial_reward());
        assert!(rank.active_trial.is_none());
        // Power never decreased.
        assert!(rank.total_power() >= 40);
    }
}

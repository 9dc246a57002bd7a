use bevy::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::tuning::Tuning;
use crate::game::{
    ai, combat,
    components::*,
    events::{
        CommandMessage, DamageMessage, KillMessage, PowerMessage, SpawnShotMessage, StatusMessage,
        UiMessage, XpMessage,
    },
    intent::Intent,
    map::WorldMap,
    movement, progression,
    progression::AchievementState,
    rank::{self, RankState},
    snapshot::{self, HudSnapshot},
    spawn::{self, RespawnQueue},
    stats::recompute::recompute_stats,
};

// ── SystemSets (strict FixedUpdate ordering) ────────────────────────

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimSet {
    ApplyInputSet,
    MovementSet,
    CollisionDetectSet,
    AiSet,
    EventApplySet,
    RewardsSet,
    ProgressionSet,
    RecomputeSet,
    CleanupSet,
}

/// Headless simulation core: everything runs in FixedUpdate and touches no
/// rendering, so tests can drive the schedule directly.
pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<DamageMessage>();
        app.add_message::<SpawnShotMessage>();
        app.add_message::<StatusMessage>();
        app.add_message::<KillMessage>();
        app.add_message::<XpMessage>();
        app.add_message::<PowerMessage>();
        app.add_message::<CommandMessage>();
        app.add_message::<UiMessage>();

        app.init_resource::<RankState>();
        app.init_resource::<RespawnQueue>();
        app.init_resource::<AchievementState>();
        app.init_resource::<HudSnapshot>();

        app.configure_sets(
            FixedUpdate,
            (
                SimSet::ApplyInputSet,
                SimSet::MovementSet,
                SimSet::CollisionDetectSet,
                SimSet::AiSet,
                SimSet::EventApplySet,
                SimSet::RewardsSet,
                SimSet::ProgressionSet,
                SimSet::RecomputeSet,
                SimSet::CleanupSet,
            )
                .chain(),
        );

        // ApplyInputSet — chained to fix B0002 (Velocity conflicts)
        app.add_systems(
            FixedUpdate,
            (movement::apply_player_intent, movement::fire_player_weapon)
                .chain()
                .in_set(SimSet::ApplyInputSet),
        );

        // MovementSet
        app.add_systems(
            FixedUpdate,
            (
                movement::integrate_movement,
                movement::integrate_projectiles,
                movement::tick_player_status,
                movement::tick_hit_flash,
            )
                .chain()
                .in_set(SimSet::MovementSet),
        );

        // CollisionDetectSet — chained to fix B0002 (MessageWriter conflicts)
        app.add_systems(
            FixedUpdate,
            (combat::detect_contact_damage, combat::detect_projectile_hits)
                .chain()
                .in_set(SimSet::CollisionDetectSet),
        );

        // AiSet
        app.add_systems(
            FixedUpdate,
            (ai::drive_enemies, ai::tick_boss_phases, ai::boss_use_skills)
                .chain()
                .in_set(SimSet::AiSet),
        );

        // EventApplySet
        app.add_systems(
            FixedUpdate,
            (
                combat::apply_damage,
                combat::apply_status_messages,
                combat::spawn_shots,
            )
                .chain()
                .in_set(SimSet::EventApplySet),
        );

        // RewardsSet
        app.add_systems(
            FixedUpdate,
            (combat::handle_kills, progression::track_achievements)
                .chain()
                .in_set(SimSet::RewardsSet),
        );

        // ProgressionSet
        app.add_systems(
            FixedUpdate,
            (
                progression::apply_xp,
                progression::handle_player_commands,
                rank::tick_rank,
                rank::handle_trial_commands,
                progression::tick_player_respawn,
            )
                .chain()
                .in_set(SimSet::ProgressionSet),
        );

        // RecomputeSet — stat changes take effect next tick
        app.add_systems(
            FixedUpdate,
            progression::recompute_player.in_set(SimSet::RecomputeSet),
        );

        // CleanupSet
        app.add_systems(
            FixedUpdate,
            (
                combat::sweep_dead,
                spawn::run_respawn_queue,
                snapshot::refresh_snapshot,
            )
                .chain()
                .in_set(SimSet::CleanupSet),
        );

        app.add_systems(Startup, (setup_world, spawn::initial_populate).chain());
    }
}

// ── Startup ─────────────────────────────────────────────────────────

fn setup_world(mut commands: Commands, tuning: Res<Tuning>) {
    let map = WorldMap::from_tuning(&tuning);
    let start = map.center();

    let effective = recompute_stats(&Default::default(), None, 0, &tuning);
    commands.spawn((
        Player,
        Transform::from_translation(start.extend(1.0)),
        Velocity(Vec2::ZERO),
        CollisionRadius(tuning.player_radius),
        Health::full(effective.max_hp),
        PlayerEffective(effective),
        SkillTree::default(),
        Progress {
            level: 1,
            xp: 0.0,
            xp_to_next: progression::xp_to_next(1),
            points: 0,
        },
        RebornState::default(),
        ShieldState::default(),
        PlayerStatus::default(),
        FireCooldown::default(),
        Intent::default(),
    ));

    commands.insert_resource(map);
    commands.insert_resource(GameRng(StdRng::from_os_rng()));
}

//! End-to-end simulation tests: a headless app driving the FixedUpdate
//! pipeline directly, with population caps zeroed so each test controls
//! exactly what is in the world.

use bevy::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use reborn_arena::config::tuning::Tuning;
use reborn_arena::game::components::*;
use reborn_arena::game::events::{CommandMessage, Credit, DamageMessage, PowerMessage};
use reborn_arena::game::intent::Intent;
use reborn_arena::game::map::WorldMap;
use reborn_arena::game::rank::{RankState, RankTier};
use reborn_arena::game::stats::types::{RebornClass, SkillKind};
use reborn_arena::plugins::game_plugin::GamePlugin;

fn test_app() -> App {
    let mut tuning = Tuning::default();
    tuning.yellow_block_cap = 0;
    tuning.blue_block_cap = 0;
    tuning.purple_block_cap = 0;
    tuning.basic_enemy_cap = 0;
    tuning.ranged_enemy_cap = 0;
    tuning.boss_cap = 0;

    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(tuning);
    app.add_plugins(GamePlugin);
    app.update(); // run Startup
    app.insert_resource(GameRng(StdRng::seed_from_u64(42)));
    app
}

fn tick(app: &mut App, n: u32) {
    for _ in 0..n {
        app.world_mut().run_schedule(FixedUpdate);
    }
}

fn player_entity(app: &mut App) -> Entity {
    app.world_mut()
        .query_filtered::<Entity, With<Player>>()
        .single(app.world())
        .unwrap()
}

fn spawn_test_block(app: &mut App, pos: Vec2, hp: f32, xp: u32) -> Entity {
    app.world_mut()
        .spawn((
            Block,
            BlockKind::Yellow,
            Transform::from_translation(pos.extend(0.0)),
            CollisionRadius(20.0),
            Health::full(hp),
            Level(1),
            XpValue(xp),
            SlowFactor(0.30),
            ContactDamage(6.0),
            Mitigation::default(),
            HitFlash::default(),
        ))
        .id()
}

fn spawn_test_boss(app: &mut App, pos: Vec2) -> Entity {
    app.world_mut()
        .spawn((
            Enemy,
            EnemyKind::Boss,
            Transform::from_translation(pos.extend(0.0)),
            Velocity(Vec2::ZERO),
            CollisionRadius(60.0),
            Health::full(2800.0),
            Level(10),
            XpValue(250),
            ContactDamage(55.0),
            MoveSpeed(108.0),
            DetectRadius(1000.0),
            Intelligence(0.9),
            Mitigation::default(),
            AiState::default(),
            BossState::default(),
        ))
        .id()
}

fn queue_damage_as(app: &mut App, target: Entity, amount: f32, credit: Credit) {
    app.world_mut()
        .resource_mut::<Messages<DamageMessage>>()
        .write(DamageMessage { credit, target, amount });
}

fn queue_damage(app: &mut App, target: Entity, amount: f32) {
    queue_damage_as(app, target, amount, Credit::Player);
}

#[test]
fn base_shots_destroy_a_yellow_block_and_award_xp() {
    let mut app = test_app();
    let player = player_entity(&mut app);

    let player_pos = app
        .world()
        .get::<Transform>(player)
        .unwrap()
        .translation
        .truncate();
    let block_pos = player_pos + Vec2::new(400.0, 0.0);
    let block = spawn_test_block(&mut app, block_pos, 70.0, 10);

    {
        let mut intent = app.world_mut().get_mut::<Intent>(player).unwrap();
        intent.aim = block_pos;
        intent.fire = true;
    }

    // 25 damage per shot vs 70 hp needs exactly three hits; give the shots
    // time to travel.
    tick(&mut app, 300);

    assert!(app.world().get_entity(block).is_err(), "block should be destroyed");
    let progress = app.world().get::<Progress>(player).unwrap();
    assert_eq!(progress.level, 1);
    assert!((progress.xp - 10.0).abs() < 1e-3, "xp was {}", progress.xp);
}

#[test]
fn exactly_enough_xp_levels_up_and_grants_a_point() {
    let mut app = test_app();
    let player = player_entity(&mut app);

    // Zero XP changes nothing.
    app.world_mut()
        .resource_mut::<Messages<reborn_arena::game::events::XpMessage>>()
        .write(reborn_arena::game::events::XpMessage(0.0));
    tick(&mut app, 1);
    let progress = app.world().get::<Progress>(player).unwrap();
    assert_eq!(progress.level, 1);
    assert_eq!(progress.xp, 0.0);
    assert_eq!(progress.points, 0);

    // Exactly 100 XP crosses the level-1 threshold with nothing left over.
    app.world_mut()
        .resource_mut::<Messages<reborn_arena::game::events::XpMessage>>()
        .write(reborn_arena::game::events::XpMessage(100.0));
    tick(&mut app, 1);

    let progress = app.world().get::<Progress>(player).unwrap();
    assert_eq!(progress.level, 2);
    assert_eq!(progress.points, 1);
    assert_eq!(progress.xp, 0.0);
    assert_eq!(progress.xp_to_next, 135.0);
}

#[test]
fn tank_reborn_resets_progress_and_raises_shield() {
    let mut app = test_app();
    let player = player_entity(&mut app);

    {
        let mut progress = app.world_mut().get_mut::<Progress>(player).unwrap();
        progress.level = 25;
        progress.points = 7;
    }
    app.world_mut()
        .resource_mut::<Messages<CommandMessage>>()
        .write(CommandMessage::Reborn { class: Some(RebornClass::Tank) });
    tick(&mut app, 2);

    let progress = app.world().get::<Progress>(player).unwrap();
    assert_eq!(progress.level, 1);
    assert_eq!(progress.points, 0);
    assert_eq!(progress.xp, 0.0);

    let reborn = app.world().get::<RebornState>(player).unwrap();
    assert_eq!(reborn.count, 1);
    assert_eq!(reborn.class, Some(RebornClass::Tank));

    let shield = app.world().get::<ShieldState>(player).unwrap();
    assert_eq!(shield.max, 60.0);
    assert_eq!(shield.current, 60.0);

    // One reborn unlocks the rank layer on the next pass.
    assert!(app.world().resource::<RankState>().unlocked);
}

#[test]
fn reborn_below_level_requirement_is_rejected() {
    let mut app = test_app();
    let player = player_entity(&mut app);

    app.world_mut()
        .resource_mut::<Messages<CommandMessage>>()
        .write(CommandMessage::Reborn { class: Some(RebornClass::Dps) });
    tick(&mut app, 2);

    let reborn = app.world().get::<RebornState>(player).unwrap();
    assert_eq!(reborn.count, 0);
    assert_eq!(reborn.class, None);
}

#[test]
fn rank_trial_spawns_boss_and_defeat_commits_the_tier() {
    let mut app = test_app();
    let player = player_entity(&mut app);

    // Reborn once to unlock ranks, then bank enough power for tier E.
    {
        let mut progress = app.world_mut().get_mut::<Progress>(player).unwrap();
        progress.level = 25;
    }
    app.world_mut()
        .resource_mut::<Messages<CommandMessage>>()
        .write(CommandMessage::Reborn { class: Some(RebornClass::Dps) });
    tick(&mut app, 2);
    app.world_mut()
        .resource_mut::<Messages<PowerMessage>>()
        .write(PowerMessage(40));
    tick(&mut app, 1);
    assert!(app.world().resource::<RankState>().can_progress().is_ok());

    app.world_mut()
        .resource_mut::<Messages<CommandMessage>>()
        .write(CommandMessage::StartRankTrial);
    tick(&mut app, 1);

    let trial = app
        .world()
        .resource::<RankState>()
        .active_trial
        .expect("trial should be active");
    assert_eq!(trial.target, RankTier::E);
    let boss_level = app.world().get::<Level>(trial.boss).unwrap().0;
    assert_eq!(boss_level, RankTier::E.trial_boss_level());

    queue_damage(&mut app, trial.boss, 1.0e6);
    tick(&mut app, 2);

    let rank = app.world().resource::<RankState>();
    assert_eq!(rank.current, Some(RankTier::E));
    assert!(rank.active_trial.is_none());
    assert_eq!(rank.power_from_bosses, RankTier::E.trial_reward());
}

#[test]
fn trial_aborts_without_advancing_when_another_enemy_lands_the_kill() {
    let mut app = test_app();
    let player = player_entity(&mut app);

    {
        let mut progress = app.world_mut().get_mut::<Progress>(player).unwrap();
        progress.level = 25;
    }
    app.world_mut()
        .resource_mut::<Messages<CommandMessage>>()
        .write(CommandMessage::Reborn { class: Some(RebornClass::Dps) });
    tick(&mut app, 2);
    app.world_mut()
        .resource_mut::<Messages<PowerMessage>>()
        .write(PowerMessage(40));
    tick(&mut app, 1);

    app.world_mut()
        .resource_mut::<Messages<CommandMessage>>()
        .write(CommandMessage::StartRankTrial);
    tick(&mut app, 1);
    let trial = app
        .world()
        .resource::<RankState>()
        .active_trial
        .expect("trial should be active");

    // The trial boss falls to another enemy, not the player.
    queue_damage_as(
        &mut app,
        trial.boss,
        1.0e6,
        Credit::Enemy(Entity::PLACEHOLDER),
    );
    tick(&mut app, 2);

    let rank = app.world().resource::<RankState>();
    assert_eq!(rank.current, None, "rank must not advance");
    assert_eq!(rank.power_from_bosses, 0);
    assert!(rank.active_trial.is_none());

    // Nothing was spent, so the trial can be restarted.
    assert_eq!(rank.can_progress(), Ok(RankTier::E));
    app.world_mut()
        .resource_mut::<Messages<CommandMessage>>()
        .write(CommandMessage::StartRankTrial);
    tick(&mut app, 1);
    assert!(app.world().resource::<RankState>().active_trial.is_some());
}

#[test]
fn skill_power_banks_at_spend_time_and_survives_reborn() {
    let mut app = test_app();
    let player = player_entity(&mut app);

    {
        let mut progress = app.world_mut().get_mut::<Progress>(player).unwrap();
        progress.points = 5;
    }
    app.world_mut()
        .resource_mut::<Messages<CommandMessage>>()
        .write(CommandMessage::SpendSkill {
            skill: SkillKind::Damage,
            count: 2,
        });
    tick(&mut app, 2);

    assert_eq!(app.world().get::<SkillTree>(player).unwrap().0.damage, 2);
    assert_eq!(app.world().get::<Progress>(player).unwrap().points, 3);
    assert_eq!(app.world().resource::<RankState>().power_from_skills, 4);

    // Reborn wipes the allocation but not the banked power.
    {
        let mut progress = app.world_mut().get_mut::<Progress>(player).unwrap();
        progress.level = 25;
    }
    app.world_mut()
        .resource_mut::<Messages<CommandMessage>>()
        .write(CommandMessage::Reborn { class: Some(RebornClass::Dps) });
    tick(&mut app, 2);

    assert_eq!(app.world().get::<SkillTree>(player).unwrap().0.damage, 0);
    let rank = app.world().resource::<RankState>();
    assert_eq!(rank.power_from_skills, 4);
    assert!(rank.total_power() >= 4);
}

#[test]
fn boss_phases_advance_on_hp_thresholds_and_never_revert() {
    let mut app = test_app();
    let map = app.world().resource::<WorldMap>().clone();
    let boss = spawn_test_boss(&mut app, map.center() + Vec2::new(2000.0, 0.0));

    queue_damage(&mut app, boss, 1400.0); // down to 50%
    tick(&mut app, 2);
    assert_eq!(app.world().get::<BossState>(boss).unwrap().phase, 2);
    assert_eq!(app.world().get::<Mitigation>(boss).unwrap().phase_dr.0, 0.0);

    queue_damage(&mut app, boss, 600.0); // down to ~29%, phase 3 territory
    tick(&mut app, 2);
    let state = app.world().get::<BossState>(boss).unwrap();
    assert_eq!(state.phase, 3);
    let mitigation = app.world().get::<Mitigation>(boss).unwrap();
    assert!((mitigation.phase_dr.0 - 0.5).abs() < 1e-6);
    let speed = app.world().get::<MoveSpeed>(boss).unwrap().0;
    assert!((speed - 108.0 * 1.3).abs() < 1e-3);

    // Phase 3 also clamps the trap countdown already in flight (it starts
    // at 4.0, above the phase-3 cadence).
    let phase3_cooldown = app.world().resource::<Tuning>().boss_trap_cooldown_phase3;
    let trap = app.world().get::<BossState>(boss).unwrap().trap_cooldown.0;
    assert!(
        trap <= phase3_cooldown + 1e-6,
        "trap cooldown {trap} not clamped to {phase3_cooldown}"
    );
}

#[test]
fn player_death_triggers_timed_respawn_at_a_safe_zone() {
    let mut app = test_app();
    let player = player_entity(&mut app);

    queue_damage(&mut app, player, 1.0e6);
    tick(&mut app, 1);
    assert!(app.world().get::<Respawning>(player).is_some());

    // 2.5 s at 60 Hz.
    tick(&mut app, 151);
    assert!(app.world().get::<Respawning>(player).is_none());

    let health = app.world().get::<Health>(player).unwrap();
    assert_eq!(health.current.0, health.max);
    let pos = app
        .world()
        .get::<Transform>(player)
        .unwrap()
        .translation
        .truncate();
    let map = app.world().resource::<WorldMap>();
    assert!(map.in_safe_zone(pos));
}

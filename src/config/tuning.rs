use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All tunable game parameters, loaded from tuning.ron.
#[derive(Debug, Clone, Resource, Serialize, Deserialize)]
pub struct Tuning {
    pub dt: f32,

    // ── Map ─────────────────────────────────────────────────────────
    pub map_width: f32,
    pub map_height: f32,
    pub safe_zone_radius: f32,
    /// Extra clearance added to a safe zone radius when spawning.
    pub spawn_padding: f32,
    /// Rejection-sampling attempts before falling back to map center.
    pub spawn_attempts: u32,

    // ── Player base stats ───────────────────────────────────────────
    pub base_hp: f32,
    pub base_damage: f32,
    pub base_body_damage: f32,
    pub base_defense: f32,
    pub base_speed: f32,
    pub player_radius: f32,
    pub player_fire_cooldown: f32,
    pub player_shot_speed: f32,
    pub player_shot_lifetime: f32,
    pub player_respawn_delay: f32,

    // ── Skill tree ──────────────────────────────────────────────────
    pub hp_per_point: f32,
    pub damage_per_point: f32,
    pub body_damage_per_point: f32,
    pub defense_per_point: f32,
    pub speed_per_point: f32,
    pub mobility_per_point: f32,
    pub regen_per_point: f32,
    /// Points in one skill required to unlock its milestone passive.
    pub milestone_points: u32,
    pub milestone_block_damage_mult: f32,
    pub milestone_extra_dr: f32,
    pub milestone_ignore_chance: f32,

    // ── Reborn ──────────────────────────────────────────────────────
    pub reborn_level_requirement: u32,
    pub reborn_max_count: u32,
    /// Cumulative XP multiplier gained per reborn.
    pub reborn_xp_bonus: f32,
    pub dps_projectile_mult: f32,
    pub tank_extra_dr: f32,
    /// Shield pool as a fraction of max hp (Tank only).
    pub tank_shield_fraction: f32,
    /// Defense effectiveness boost while mitigating shield damage.
    pub shield_dr_factor: f32,

    // ── Rank system ─────────────────────────────────────────────────
    /// Reborn count at which the rank layer unlocks. Source drafts disagree
    /// between 1 and 2; see DESIGN.md.
    pub rank_unlock_reborn_count: u32,
    pub rank_dps_damage_per_step: f32,
    pub rank_dps_dr_per_step: f32,
    pub rank_tank_damage_per_step: f32,
    pub rank_tank_dr_per_step: f32,
    pub rank_dr_bonus_cap: f32,
    /// Power credited to the rank pool for enemy-credited kills.
    pub enemy_kill_power: u32,

    // ── Enemies ─────────────────────────────────────────────────────
    pub basic_enemy_cap: u32,
    pub ranged_enemy_cap: u32,
    pub boss_cap: u32,
    pub basic_respawn_delay: f32,
    pub ranged_respawn_delay: f32,
    pub boss_respawn_delay: f32,
    /// Chance that a spawned enemy rolls a meta rank.
    pub enemy_rank_chance: f32,
    pub enemy_rank_hp_per_step: f32,
    pub enemy_rank_damage_per_step: f32,
    pub enemy_shot_speed: f32,
    pub enemy_shot_lifetime: f32,
    pub ranged_fire_cooldown: f32,
    pub ranged_standoff_distance: f32,
    /// Half-width of the strafe band around the standoff distance.
    pub ranged_standoff_band: f32,
    /// Max angular aim error (radians) at intelligence 0.
    pub aim_noise_max: f32,

    // ── Boss skills ─────────────────────────────────────────────────
    pub boss_trap_cooldown: f32,
    pub boss_trap_cooldown_phase3: f32,
    pub boss_circle_cooldown: f32,
    pub boss_skill_lockout: f32,
    pub boss_trap_speed: f32,
    pub boss_circle_speed: f32,
    pub trap_damage: f32,
    pub circle_damage: f32,
    pub trap_freeze_duration: f32,
    pub circle_slow_mult: f32,
    pub circle_defense_debuff: f32,
    pub circle_debuff_duration: f32,
    pub boss_phase2_hp_fraction: f32,
    pub boss_phase3_hp_fraction: f32,
    pub boss_phase3_extra_dr: f32,
    pub boss_phase3_speed_mult: f32,

    // ── Blocks ──────────────────────────────────────────────────────
    pub yellow_block_cap: u32,
    pub blue_block_cap: u32,
    pub purple_block_cap: u32,
    pub block_respawn_delay: f32,
    /// Duration of the "recently hit" flash used by the render layer.
    pub block_hit_flash: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,

            map_width: 5760.0,
            map_height: 3240.0,
            safe_zone_radius: 160.0,
            spawn_padding: 80.0,
            spawn_attempts: 50,

            base_hp: 100.0,
            base_damage: 25.0,
            base_body_damage: 10.0,
            base_defense: 0.0,
            base_speed: 192.0,
            player_radius: 28.0,
            player_fire_cooldown: 0.25,
            player_shot_speed: 660.0,
            player_shot_lifetime: 1.4,
            player_respawn_delay: 2.5,

            hp_per_point: 0.10,
            damage_per_point: 0.12,
            body_damage_per_point: 0.15,
            defense_per_point: 0.04,
            speed_per_point: 0.06,
            mobility_per_point: 0.05,
            regen_per_point: 0.005,
            milestone_points: 10,
            milestone_block_damage_mult: 1.20,
            milestone_extra_dr: 0.20,
            milestone_ignore_chance: 0.10,

            reborn_level_requirement: 25,
            reborn_max_count: 3,
            reborn_xp_bonus: 0.25,
            dps_projectile_mult: 1.25,
            tank_extra_dr: 0.10,
            tank_shield_fraction: 0.60,
            shield_dr_factor: 1.25,

            rank_unlock_reborn_count: 1,
            rank_dps_damage_per_step: 0.03,
            rank_dps_dr_per_step: 0.01,
            rank_tank_damage_per_step: 0.015,
            rank_tank_dr_per_step: 0.03,
            rank_dr_bonus_cap: 0.6,
            enemy_kill_power: 2,

            basic_enemy_cap: 8,
            ranged_enemy_cap: 4,
            boss_cap: 1,
            basic_respawn_delay: 120.0,
            ranged_respawn_delay: 100.0,
            boss_respawn_delay: 180.0,
            enemy_rank_chance: 0.15,
            enemy_rank_hp_per_step: 0.08,
            enemy_rank_damage_per_step: 0.05,
            enemy_shot_speed: 600.0,
            enemy_shot_lifetime: 2.0,
            ranged_fire_cooldown: 1.6,
            ranged_standoff_distance: 420.0,
            ranged_standoff_band: 60.0,
            aim_noise_max: 0.35,

            boss_trap_cooldown: 6.0,
            boss_trap_cooldown_phase3: 3.0,
            boss_circle_cooldown: 5.0,
            boss_skill_lockout: 1.5,
            boss_trap_speed: 600.0,
            boss_circle_speed: 480.0,
            trap_damage: 25.0,
            circle_damage: 40.0,
            trap_freeze_duration: 1.2,
            circle_slow_mult: 0.5,
            circle_defense_debuff: 0.25,
            circle_debuff_duration: 4.0,
            boss_phase2_hp_fraction: 0.6,
            boss_phase3_hp_fraction: 0.4,
            boss_phase3_extra_dr: 0.5,
            boss_phase3_speed_mult: 1.3,

            yellow_block_cap: 14,
            blue_block_cap: 8,
            purple_block_cap: 4,
            block_respawn_delay: 1.8,
            block_hit_flash: 0.15,
        }
    }
}

impl Tuning {
    /// Get the data directory for tuning files.
    pub fn data_dir() -> PathBuf {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("reborn_arena")
    }

    /// Path to the tuning file.
    pub fn file_path() -> PathBuf {
        Self::data_dir().join("tuning.ron")
    }

    /// Load from file, or create default if not found.
    pub fn load_or_default() -> Self {
        let path = Self::file_path();
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match ron::from_str(&contents) {
                    Ok(tuning) => return tuning,
                    Err(e) => {
                        warn!("Failed to parse tuning.ron: {e}, using defaults");
                    }
                },
                Err(e) => {
                    warn!("Failed to read tuning.ron: {e}, using defaults");
                }
            }
        }
        let tuning = Self::default();
        tuning.save();
        tuning
    }

    /// Save current tuning to file.
    pub fn save(&self) {
        let path = Self::file_path();
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let pretty = ron::ser::PrettyConfig::default();
        match ron::ser::to_string_pretty(self, pretty) {
            Ok(s) => {
                if let Err(e) = std::fs::write(&path, s) {
                    warn!("Failed to write tuning.ron: {e}");
                }
            }
            Err(e) => {
                warn!("Failed to serialize tuning: {e}");
            }
        }
    }

    /// Reload from file (called by key press).
    pub fn reload(&mut self) {
        *self = Self::load_or_default();
        info!("Tuning reloaded");
    }
}

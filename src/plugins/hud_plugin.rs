use bevy::prelude::*;

use crate::game::events::{UiMessage, UiNote};
use crate::game::snapshot::HudSnapshot;

/// On-screen status text fed from the simulation snapshot plus a scrolling
/// notice list for transient events.
pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NoticeBoard>();
        app.add_systems(Startup, setup_hud);
        app.add_systems(Update, (update_status_text, update_notices).chain());
    }
}

#[derive(Component)]
struct StatusText;

#[derive(Component)]
struct NoticeText;

/// Live notices with their remaining display time.
#[derive(Resource, Default)]
struct NoticeBoard {
    entries: Vec<(String, f32)>,
}

fn setup_hud(mut commands: Commands) {
    commands
        .spawn(Node {
            position_type: PositionType::Absolute,
            left: Val::Px(10.0),
            top: Val::Px(10.0),
            flex_direction: FlexDirection::Column,
            row_gap: Val::Px(6.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                StatusText,
                Text::new("HP: ---"),
                TextFont {
                    font_size: 22.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));

            parent.spawn((
                NoticeText,
                Text::new(""),
                TextFont {
                    font_size: 18.0,
                    ..default()
                },
                TextColor(Color::srgb(0.9, 0.9, 0.3)),
            ));
        });
}

fn update_status_text(
    snapshot: Res<HudSnapshot>,
    mut text_query: Query<&mut Text, With<StatusText>>,
) {
    for mut text in &mut text_query {
        let mut line = format!(
            "HP {:.0}/{:.0}",
            snapshot.hp.max(0.0),
            snapshot.max_hp,
        );
        if snapshot.shield_max > 0.0 {
            line.push_str(&format!("  Shield {:.0}/{:.0}", snapshot.shield, snapshot.shield_max));
        }
        line.push_str(&format!(
            "\nLv {}  XP {:.0}/{:.0}  Points {}",
            snapshot.level, snapshot.xp, snapshot.xp_to_next, snapshot.points
        ));
        if snapshot.reborn_count > 0 {
            line.push_str(&format!(
                "\nReborn x{} ({:?})",
                snapshot.reborn_count,
                snapshot.reborn_class,
            ));
        }
        if snapshot.rank_unlocked {
            match snapshot.next_rank_power {
                Some(need) => line.push_str(&format!(
                    "\nRank {}  Power {}/{}",
                    snapshot.rank_label(),
                    snapshot.total_power,
                    need
                )),
                None => line.push_str(&format!(
                    "\nRank {}  Power {}",
                    snapshot.rank_label(),
                    snapshot.total_power
                )),
            }
            if snapshot.trial_active {
                line.push_str("  [TRIAL]");
            }
        }
        if let Some(t) = snapshot.respawn_in {
            line.push_str(&format!("\nRespawning in {t:.1}s"));
        }
        **text = line;
    }
}

fn format_note(note: &UiNote) -> String {
    match note {
        UiNote::LevelUp { level } => format!("Level up! Now level {level}"),
        UiNote::AchievementUnlocked { name } => format!("Achievement: {name}"),
        UiNote::BossSpawned => "A boss has appeared!".to_string(),
        UiNote::BossDefeated => "Boss defeated!".to_string(),
        UiNote::RebornCompleted { class, count } => {
            format!("Reborn x{count} as {class:?}")
        }
        UiNote::RankAdvanced { tier } => format!("Rank advanced: {}", tier.label()),
    }
}

fn update_notices(
    time: Res<Time>,
    mut ui_events: MessageReader<UiMessage>,
    mut board: ResMut<NoticeBoard>,
    mut text_query: Query<&mut Text, With<NoticeText>>,
) {
    for event in ui_events.read() {
        board.entries.push((format_note(&event.note), event.seconds));
    }

    let dt = time.delta_secs();
    board.entries.retain_mut(|(_, remaining)| {
        *remaining -= dt;
        *remaining > 0.0
    });

    for mut text in &mut text_query {
        **text = board
            .entries
            .iter()
            .map(|(line, _)| line.as_str())
            .collect::<Vec<_>>()
            .join("\n");
    }
}

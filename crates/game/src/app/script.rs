use fieldwalk_engine::{AttackKind, AvatarIntent, Vec2};

const LEG_TICKS: u32 = 90;
const ATTACK_EVERY_TICKS: u32 = 45;
const AREA_ATTACK_EVERY_TICKS: u32 = 240;
const DASH_EVERY_TICKS: u32 = 150;

/// Stand-in for keyboard input: walks a square, swings periodically and dashes
/// now and then.
pub(crate) fn intent_for_tick(tick: u32) -> AvatarIntent {
    let movement = match (tick / LEG_TICKS) % 4 {
        0 => Vec2::new(1.0, 0.0),
        1 => Vec2::new(0.0, 1.0),
        2 => Vec2::new(-1.0, 0.0),
        _ => Vec2::new(0.0, -1.0),
    };
    let attack = if tick > 0 && tick % AREA_ATTACK_EVERY_TICKS == 0 {
        Some(AttackKind::Area)
    } else if tick > 0 && tick % ATTACK_EVERY_TICKS == 0 {
        Some(AttackKind::Directional)
    } else {
        None
    };
    AvatarIntent {
        movement,
        attack,
        dash: tick > 0 && tick % DASH_EVERY_TICKS == 0,
    }
}

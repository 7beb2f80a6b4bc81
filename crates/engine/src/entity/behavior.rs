use rand::Rng;

use crate::collision::{entity_collision_rect, move_with_world_collision};
use crate::geometry::{Rect, Vec2};
use crate::map::WorldMap;

use super::{AttackState, Behavior, CreatureMotion, CreatureState, Entity, Facing};

pub(crate) const AVATAR_CONTACT_GRACE_SECONDS: f32 = 0.5;
pub(crate) const CREATURE_ATTACK_COOLDOWN_SECONDS: f32 = 1.0;
const DIAGONAL_SPEED_FACTOR: f32 = 0.7071;
const DASH_DURATION_SECONDS: f32 = 0.2;
const DASH_SPEED_PX_PER_SECOND: f32 = 480.0;
const DASH_COOLDOWN_SECONDS: f32 = 1.0;
const AREA_ATTACK_RADIUS_PX: f32 = 100.0;
const AIMED_ATTACK_REACH: f32 = 1.5;
const DIRECTIONAL_ATTACK_SCALE: f32 = 1.5;

/// Replaces a process-wide "entities can move" switch. Paused freezes positions;
/// timers keep running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SimulationMode {
    #[default]
    Running,
    Paused,
}

impl SimulationMode {
    pub fn from_paused(paused: bool) -> Self {
        if paused {
            SimulationMode::Paused
        } else {
            SimulationMode::Running
        }
    }

    pub fn allows_movement(self) -> bool {
        self == SimulationMode::Running
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttackKind {
    /// Slash on the side the avatar faces.
    Directional,
    /// Hitbox pushed out toward a world-space aim point.
    Aimed { target: Vec2 },
    /// Square around the avatar.
    Area,
}

/// Decoded player input for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AvatarIntent {
    pub movement: Vec2,
    pub attack: Option<AttackKind>,
    pub dash: bool,
}

pub struct StepContext<'a> {
    pub map: &'a WorldMap,
    pub dt: f32,
    pub world_scale: f32,
    pub mode: SimulationMode,
    /// Avatar collision rectangle at the start of the pass, if one is registered.
    pub avatar_rect: Option<Rect>,
}

/// One behavior tick: shared timers first, then the kind-specific step.
pub(crate) fn step(entity: &mut Entity, ctx: &StepContext<'_>, rng: &mut impl Rng) {
    tick_attack(entity, ctx.dt);
    tick_hit_flash(entity, ctx.dt);

    let Entity {
        body,
        attack,
        facing,
        behavior,
        ..
    } = entity;

    match behavior {
        Behavior::Avatar(avatar) => {
            avatar.contact_grace = (avatar.contact_grace - ctx.dt).max(0.0);
        }
        Behavior::Creature(creature) => {
            creature.attack_cooldown = (creature.attack_cooldown - ctx.dt).max(0.0);
            if creature.state == CreatureState::Dead {
                return;
            }

            if let Some(avatar_rect) = ctx.avatar_rect {
                let own_rect = entity_collision_rect(body);
                let offset = Vec2::new(
                    avatar_rect.center().x - own_rect.center().x,
                    avatar_rect.center().y - own_rect.center().y,
                );
                let in_range =
                    own_rect.center().distance(avatar_rect.center()) <= creature.stats.attack_range;
                if in_range && !attack.is_active() && creature.attack_cooldown <= 0.0 {
                    *facing = dominant_facing(offset).unwrap_or(*facing);
                    *attack = AttackState::start(
                        directional_hitbox(own_rect, *facing),
                        creature.stats.attack_damage,
                    );
                    creature.attack_cooldown = CREATURE_ATTACK_COOLDOWN_SECONDS;
                    creature.state = CreatureState::Attacking;
                }
            }

            if !ctx.mode.allows_movement() {
                return;
            }

            match &mut creature.motion {
                CreatureMotion::Wander {
                    timer,
                    interval,
                    direction,
                } => {
                    *timer += ctx.dt;
                    if *timer >= *interval {
                        *direction = random_direction(rng);
                        *timer = 0.0;
                    }
                    let delta = scaled(*direction, body.speed * ctx.dt);
                    if move_with_world_collision(body, delta, ctx.map, ctx.world_scale).any() {
                        *timer = *interval;
                    }
                    *facing = Facing::from_direction(*direction).unwrap_or(*facing);
                }
                CreatureMotion::Bounce { direction } => {
                    let delta = scaled(*direction, body.speed * ctx.dt);
                    if move_with_world_collision(body, delta, ctx.map, ctx.world_scale).any() {
                        *direction = Vec2::new(-direction.x, -direction.y);
                    }
                    *facing = Facing::from_direction(*direction).unwrap_or(*facing);
                }
            }
        }
    }
}

/// Applies one tick of avatar input: walking, attack starts and dashing.
/// Returns false if `entity` is not a living avatar.
pub(crate) fn drive_avatar(
    entity: &mut Entity,
    intent: &AvatarIntent,
    ctx: &StepContext<'_>,
) -> bool {
    if !entity.is_live() {
        return false;
    }
    let Entity {
        body,
        attack,
        facing,
        behavior,
        ..
    } = entity;
    let Behavior::Avatar(avatar) = behavior else {
        return false;
    };

    let direction = Vec2::new(axis_sign(intent.movement.x), axis_sign(intent.movement.y));
    let moves = ctx.mode.allows_movement();

    if moves {
        *facing = Facing::from_direction(direction).unwrap_or(*facing);
        let mut speed = body.speed * ctx.dt;
        if direction.x != 0.0 && direction.y != 0.0 {
            speed *= DIAGONAL_SPEED_FACTOR;
        }
        move_with_world_collision(body, scaled(direction, speed), ctx.map, ctx.world_scale);
    }

    if let Some(kind) = intent.attack {
        if !attack.is_active() {
            let rect = entity_collision_rect(body);
            let hitbox = match kind {
                AttackKind::Directional => directional_hitbox(rect, *facing),
                AttackKind::Aimed { target } => aimed_hitbox(rect, target, *facing),
                AttackKind::Area => Rect::centered_on(
                    rect.center(),
                    AREA_ATTACK_RADIUS_PX * 2.0,
                    AREA_ATTACK_RADIUS_PX * 2.0,
                ),
            };
            *attack = AttackState::start(hitbox, avatar.attack_damage);
        }
    }

    let dash = &mut avatar.dash;
    dash.cooldown = (dash.cooldown - ctx.dt).max(0.0);
    let has_direction = direction.x != 0.0 || direction.y != 0.0;
    if intent.dash && !dash.is_dashing() && dash.cooldown <= 0.0 && has_direction {
        dash.remaining = DASH_DURATION_SECONDS;
        dash.direction = direction;
    }
    if dash.is_dashing() {
        dash.remaining -= ctx.dt;
        if dash.remaining > 0.0 {
            if moves {
                let delta = scaled(dash.direction, DASH_SPEED_PX_PER_SECOND * ctx.dt);
                move_with_world_collision(body, delta, ctx.map, ctx.world_scale);
            }
        } else {
            dash.remaining = 0.0;
            dash.cooldown = DASH_COOLDOWN_SECONDS;
        }
    }
    true
}

fn tick_attack(entity: &mut Entity, dt: f32) {
    let finished = match &mut entity.attack {
        AttackState::Active { remaining, .. } => {
            *remaining -= dt;
            *remaining <= 0.0
        }
        AttackState::Inactive => false,
    };
    if finished {
        entity.attack = AttackState::Inactive;
        if let Behavior::Creature(creature) = &mut entity.behavior {
            if creature.state == CreatureState::Attacking {
                creature.state = CreatureState::Wandering;
            }
        }
    }
}

fn tick_hit_flash(entity: &mut Entity, dt: f32) {
    if entity.hit_flash <= 0.0 {
        return;
    }
    entity.hit_flash = (entity.hit_flash - dt).max(0.0);
    if entity.hit_flash == 0.0 {
        if let Behavior::Creature(creature) = &mut entity.behavior {
            if creature.state == CreatureState::Hurt {
                creature.state = CreatureState::Wandering;
            }
        }
    }
}

/// Hitbox 1.5x the collision rectangle, laid against the facing side.
pub(crate) fn directional_hitbox(rect: Rect, facing: Facing) -> Rect {
    let width = rect.width * DIRECTIONAL_ATTACK_SCALE;
    let height = rect.height * DIRECTIONAL_ATTACK_SCALE;
    match facing {
        Facing::Down => Rect::new(rect.x - width / 4.0, rect.bottom(), width, height / 2.0),
        Facing::Up => Rect::new(rect.x - width / 4.0, rect.y - height / 2.0, width, height / 2.0),
        Facing::Left => Rect::new(rect.x - width / 2.0, rect.y - height / 4.0, width / 2.0, height),
        Facing::Right => Rect::new(rect.right(), rect.y - height / 4.0, width / 2.0, height),
    }
}

fn aimed_hitbox(rect: Rect, target: Vec2, facing: Facing) -> Rect {
    let center = rect.center();
    let offset = Vec2::new(target.x - center.x, target.y - center.y);
    let length = offset.x.hypot(offset.y);
    let direction = if length > f32::EPSILON {
        Vec2::new(offset.x / length, offset.y / length)
    } else {
        facing_vector(facing)
    };
    let reach = rect.width * AIMED_ATTACK_REACH;
    Rect::centered_on(
        Vec2::new(center.x + direction.x * reach, center.y + direction.y * reach),
        rect.width,
        rect.height,
    )
}

fn facing_vector(facing: Facing) -> Vec2 {
    match facing {
        Facing::Down => Vec2::new(0.0, 1.0),
        Facing::Up => Vec2::new(0.0, -1.0),
        Facing::Left => Vec2::new(-1.0, 0.0),
        Facing::Right => Vec2::new(1.0, 0.0),
    }
}

fn dominant_facing(offset: Vec2) -> Option<Facing> {
    if offset.x.abs() > offset.y.abs() {
        Facing::from_direction(Vec2::new(offset.x, 0.0))
    } else {
        Facing::from_direction(Vec2::new(0.0, offset.y))
    }
}

fn random_direction(rng: &mut impl Rng) -> Vec2 {
    Vec2::new(
        rng.gen_range(-1..=1) as f32,
        rng.gen_range(-1..=1) as f32,
    )
}

fn axis_sign(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn scaled(direction: Vec2, amount: f32) -> Vec2 {
    Vec2::new(direction.x * amount, direction.y * amount)
}

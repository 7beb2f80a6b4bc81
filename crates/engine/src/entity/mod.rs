mod behavior;
mod registry;

use serde::Deserialize;

use crate::assets::{ImageHandle, ImageLoader};
use crate::collision::entity_collision_rect;
use crate::geometry::{rect_intersects_rect, Rect, Vec2};

pub use behavior::{AvatarIntent, AttackKind, SimulationMode, StepContext};
pub use registry::{EntityRegistry, RegistryError, SweepReport};

pub const COLLISION_SHRINK_FACTOR: f32 = 3.0;
pub const HIT_FLASH_SECONDS: f32 = 0.2;
pub const ATTACK_DURATION_SECONDS: f32 = 0.3;
pub const DEFAULT_FRAME_SIZE_PX: f32 = 48.0;

pub const AVATAR_MAX_HEALTH: i32 = 10;
pub const AVATAR_ATTACK_DAMAGE: i32 = 1;
pub const AVATAR_SPEED_PX_PER_SECOND: f32 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Avatar,
    WanderingCreature,
    AggressiveCreature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Slime,
    Bat,
    Skeleton,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreatureStats {
    pub max_health: i32,
    pub attack_damage: i32,
    pub attack_range: f32,
    pub detection_range: f32,
    pub speed: f32,
}

impl Species {
    pub fn stats(self) -> CreatureStats {
        match self {
            Species::Slime => CreatureStats {
                max_health: 3,
                attack_damage: 1,
                attack_range: 32.0,
                detection_range: 100.0,
                speed: 50.0,
            },
            Species::Bat => CreatureStats {
                max_health: 2,
                attack_damage: 1,
                attack_range: 16.0,
                detection_range: 150.0,
                speed: 100.0,
            },
            Species::Skeleton => CreatureStats {
                max_health: 5,
                attack_damage: 2,
                attack_range: 48.0,
                detection_range: 200.0,
                speed: 100.0,
            },
        }
    }

    pub fn kind(self) -> EntityKind {
        match self {
            Species::Slime => EntityKind::WanderingCreature,
            Species::Bat | Species::Skeleton => EntityKind::AggressiveCreature,
        }
    }
}

/// Physical footprint. `frame` is one sprite frame in source pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub frame: Vec2,
    pub scale: f32,
    pub speed: f32,
    pub collision_shrink: f32,
}

impl Body {
    pub fn draw_rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.frame.x * self.scale,
            self.frame.y * self.scale,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum AttackState {
    #[default]
    Inactive,
    Active {
        hitbox: Rect,
        remaining: f32,
        damage: i32,
        /// Targets already struck; an attack lands at most once per target.
        struck: Vec<EntityId>,
    },
}

impl AttackState {
    pub fn start(hitbox: Rect, damage: i32) -> Self {
        AttackState::Active {
            hitbox,
            remaining: ATTACK_DURATION_SECONDS,
            damage,
            struck: Vec::new(),
        }
    }

    pub fn hitbox(&self) -> Option<Rect> {
        match self {
            AttackState::Inactive => None,
            AttackState::Active { hitbox, .. } => Some(*hitbox),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, AttackState::Active { .. })
    }

    /// Damage to deal to `target` if this attack reaches `target_rect` and has not struck it yet.
    pub(crate) fn pending_strike(&self, target: Option<EntityId>, target_rect: Rect) -> Option<i32> {
        match self {
            AttackState::Active {
                hitbox,
                damage,
                struck,
                ..
            } => {
                let already = target.is_some_and(|id| struck.contains(&id));
                (!already && rect_intersects_rect(*hitbox, target_rect)).then_some(*damage)
            }
            AttackState::Inactive => None,
        }
    }

    pub(crate) fn record_strike(&mut self, target: Option<EntityId>) {
        if let (AttackState::Active { struck, .. }, Some(id)) = (self, target) {
            struck.push(id);
        }
    }
}

/// Sprite-sheet row order: down, up, left, right.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Facing {
    #[default]
    Down,
    Up,
    Left,
    Right,
}

impl Facing {
    /// Vertical motion wins over horizontal.
    pub fn from_direction(direction: Vec2) -> Option<Facing> {
        if direction.y > 0.0 {
            Some(Facing::Down)
        } else if direction.y < 0.0 {
            Some(Facing::Up)
        } else if direction.x < 0.0 {
            Some(Facing::Left)
        } else if direction.x > 0.0 {
            Some(Facing::Right)
        } else {
            None
        }
    }

    pub fn row(self) -> u32 {
        match self {
            Facing::Down => 0,
            Facing::Up => 1,
            Facing::Left => 2,
            Facing::Right => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatureState {
    Wandering,
    Attacking,
    Hurt,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CreatureMotion {
    /// Re-rolls a random direction every `interval` seconds or right after a bump.
    Wander {
        timer: f32,
        interval: f32,
        direction: Vec2,
    },
    /// Straight line; both axes flip on contact with world geometry.
    Bounce { direction: Vec2 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Creature {
    pub species: Species,
    pub stats: CreatureStats,
    pub state: CreatureState,
    pub motion: CreatureMotion,
    pub attack_cooldown: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DashState {
    pub remaining: f32,
    pub cooldown: f32,
    pub direction: Vec2,
}

impl DashState {
    pub fn is_dashing(&self) -> bool {
        self.remaining > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AvatarState {
    pub attack_damage: i32,
    pub dash: DashState,
    /// Seconds left during which creature contact deals no damage.
    pub contact_grace: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Behavior {
    Avatar(AvatarState),
    Creature(Creature),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

impl Health {
    pub fn full(max: i32) -> Self {
        Self { current: max, max }
    }
}

/// Snapshot of the other party in a body contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactInfo {
    pub kind: EntityKind,
    pub contact_damage: i32,
}

/// Sprite sheet an entity draws from. The frame size comes from the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    pub rows: u32,
    pub columns: u32,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            rows: 4,
            columns: 4,
        }
    }
}

#[derive(Debug)]
pub struct Entity {
    id: Option<EntityId>,
    pub body: Body,
    pub health: Health,
    pub alive: bool,
    pub active: bool,
    pub facing: Facing,
    pub attack: AttackState,
    pub hit_flash: f32,
    pub behavior: Behavior,
    sprite: Option<ImageHandle>,
}

impl Entity {
    pub fn avatar(position: Vec2, scale: f32) -> Self {
        Self::new(
            Body {
                position,
                frame: Vec2::new(DEFAULT_FRAME_SIZE_PX, DEFAULT_FRAME_SIZE_PX),
                scale,
                speed: AVATAR_SPEED_PX_PER_SECOND,
                collision_shrink: COLLISION_SHRINK_FACTOR,
            },
            Health::full(AVATAR_MAX_HEALTH),
            Behavior::Avatar(AvatarState {
                attack_damage: AVATAR_ATTACK_DAMAGE,
                dash: DashState::default(),
                contact_grace: 0.0,
            }),
        )
    }

    pub fn creature(species: Species, position: Vec2, scale: f32) -> Self {
        let stats = species.stats();
        let motion = match species.kind() {
            EntityKind::WanderingCreature => CreatureMotion::Wander {
                timer: 0.0,
                interval: 2.0,
                direction: Vec2::new(1.0, 0.0),
            },
            _ => CreatureMotion::Bounce {
                direction: Vec2::new(1.0, 0.0),
            },
        };
        Self::new(
            Body {
                position,
                frame: Vec2::new(DEFAULT_FRAME_SIZE_PX, DEFAULT_FRAME_SIZE_PX),
                scale,
                speed: stats.speed,
                collision_shrink: COLLISION_SHRINK_FACTOR,
            },
            Health::full(stats.max_health),
            Behavior::Creature(Creature {
                species,
                stats,
                state: CreatureState::Wandering,
                motion,
                attack_cooldown: 0.0,
            }),
        )
    }

    fn new(body: Body, health: Health, behavior: Behavior) -> Self {
        Self {
            id: None,
            body,
            health,
            alive: true,
            active: true,
            facing: Facing::Down,
            attack: AttackState::Inactive,
            hit_flash: 0.0,
            behavior,
            sprite: None,
        }
    }

    /// Attaches sprite art and derives the frame size from the sheet grid.
    pub fn with_sprite(mut self, sprite: ImageHandle, layout: SheetLayout) -> Self {
        if layout.columns > 0 && layout.rows > 0 {
            self.body.frame = Vec2::new(
                sprite.width() as f32 / layout.columns as f32,
                sprite.height() as f32 / layout.rows as f32,
            );
        }
        self.sprite = Some(sprite);
        self
    }

    /// Set once the entity joins a registry.
    pub fn id(&self) -> Option<EntityId> {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    pub fn kind(&self) -> EntityKind {
        match &self.behavior {
            Behavior::Avatar(_) => EntityKind::Avatar,
            Behavior::Creature(creature) => creature.species.kind(),
        }
    }

    pub fn is_avatar(&self) -> bool {
        matches!(self.behavior, Behavior::Avatar(_))
    }

    pub fn as_creature(&self) -> Option<&Creature> {
        match &self.behavior {
            Behavior::Creature(creature) => Some(creature),
            Behavior::Avatar(_) => None,
        }
    }

    pub fn sprite(&self) -> Option<&ImageHandle> {
        self.sprite.as_ref()
    }

    pub fn collision_rect(&self) -> Rect {
        entity_collision_rect(&self.body)
    }

    pub fn is_live(&self) -> bool {
        self.alive && self.active
    }

    /// Damage dealt by an attack that lands, or by touching this entity.
    pub fn attack_damage(&self) -> i32 {
        match &self.behavior {
            Behavior::Avatar(avatar) => avatar.attack_damage,
            Behavior::Creature(creature) => creature.stats.attack_damage,
        }
    }

    /// Lowers health (clamped at zero) and starts the hit flash. Reaching zero
    /// marks the entity dead; it stays in its registry until the next dead sweep.
    pub fn take_hit(&mut self, damage: i32) {
        if !self.alive {
            return;
        }
        self.health.current = (self.health.current - damage.max(0)).max(0);
        self.hit_flash = HIT_FLASH_SECONDS;
        let dead = self.health.current == 0;
        if dead {
            self.alive = false;
        }
        if let Behavior::Creature(creature) = &mut self.behavior {
            creature.state = if dead {
                CreatureState::Dead
            } else {
                CreatureState::Hurt
            };
        }
    }

    pub fn contact_info(&self) -> ContactInfo {
        ContactInfo {
            kind: self.kind(),
            contact_damage: self.attack_damage(),
        }
    }

    /// Body-contact reaction. Creatures wear down on the avatar; the avatar takes
    /// the creature's damage unless it is still inside its contact grace window.
    pub fn on_collision(&mut self, other: ContactInfo) {
        if !self.alive {
            return;
        }
        match &mut self.behavior {
            Behavior::Creature(_) => {
                if other.kind == EntityKind::Avatar {
                    self.take_hit(1);
                }
            }
            Behavior::Avatar(avatar) => {
                if other.kind == EntityKind::Avatar || avatar.contact_grace > 0.0 {
                    return;
                }
                avatar.contact_grace = behavior::AVATAR_CONTACT_GRACE_SECONDS;
                self.take_hit(other.contact_damage);
            }
        }
    }

    /// Returns the sprite to its loader. Called when the entity leaves for good.
    pub fn release(self, images: &mut dyn ImageLoader) {
        if let Some(handle) = self.sprite {
            images.unload_image(handle);
        }
    }
}

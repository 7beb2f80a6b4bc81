use rand::rngs::SmallRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::warn;

use crate::assets::ImageLoader;
use crate::collision::actors_overlap;
use crate::config::WorldConfig;
use crate::geometry::Vec2;
use crate::map::WorldMap;

use super::behavior::{self, AvatarIntent, SimulationMode, StepContext};
use super::{Entity, EntityId, EntityIdAllocator, EntityKind};

#[derive(Debug, Error)]
pub enum RegistryError {
    /// The rejected entity is handed back so the caller can release or retry it.
    #[error("entity registry is full (capacity {capacity})")]
    CapacityExceeded {
        capacity: usize,
        rejected: Box<Entity>,
    },
    #[error("entity index {index} is out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Outcome counts of one [`EntityRegistry::sweep_collisions`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub hits: usize,
    pub contacts: usize,
}

/// Bounded, ordered entity storage. Slots are not identity-stable: removal
/// compacts and depth sorting reorders, so hold an [`EntityId`] across ticks.
#[derive(Debug)]
pub struct EntityRegistry {
    capacity: usize,
    entities: Vec<Entity>,
    avatar: Option<EntityId>,
    allocator: EntityIdAllocator,
    rng: SmallRng,
}

impl EntityRegistry {
    pub fn new(capacity: usize) -> Self {
        Self::with_rng(capacity, SmallRng::from_entropy())
    }

    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self::with_rng(capacity, SmallRng::seed_from_u64(seed))
    }

    pub fn from_config(config: &WorldConfig) -> Self {
        match config.rng_seed {
            Some(seed) => Self::with_seed(config.registry_capacity, seed),
            None => Self::new(config.registry_capacity),
        }
    }

    fn with_rng(capacity: usize, rng: SmallRng) -> Self {
        Self {
            capacity,
            entities: Vec::with_capacity(capacity),
            avatar: None,
            allocator: EntityIdAllocator::default(),
            rng,
        }
    }

    /// Appends `entity` and returns its current index. An avatar becomes the
    /// registry's avatar reference.
    pub fn add(&mut self, mut entity: Entity) -> Result<usize, RegistryError> {
        if self.is_full() {
            return Err(RegistryError::CapacityExceeded {
                capacity: self.capacity,
                rejected: Box::new(entity),
            });
        }
        let id = self.allocator.allocate();
        entity.assign_id(id);
        if entity.is_avatar() {
            if let Some(previous) = self.avatar {
                warn!(previous = previous.0, replacement = id.0, "avatar_reference_replaced");
            }
            self.avatar = Some(id);
        }
        self.entities.push(entity);
        Ok(self.entities.len() - 1)
    }

    /// Removes the entity at `index`, releasing its sprite. Later entities shift
    /// down by one.
    pub fn remove_at(
        &mut self,
        index: usize,
        images: &mut dyn ImageLoader,
    ) -> Result<(), RegistryError> {
        self.take_at(index)?.release(images);
        Ok(())
    }

    /// Like [`remove_at`](Self::remove_at) but hands the entity to the caller.
    pub fn take_at(&mut self, index: usize) -> Result<Entity, RegistryError> {
        if index >= self.entities.len() {
            return Err(RegistryError::IndexOutOfRange {
                index,
                len: self.entities.len(),
            });
        }
        Ok(self.detach(index))
    }

    pub fn take_avatar(&mut self) -> Option<Entity> {
        let index = self.avatar_index()?;
        Some(self.detach(index))
    }

    /// Removes every entity marked dead, keeping survivors in their relative
    /// order. Returns how many were removed.
    pub fn remove_dead(&mut self, images: &mut dyn ImageLoader) -> usize {
        let mut removed = 0;
        for index in (0..self.entities.len()).rev() {
            if !self.entities[index].alive {
                self.detach(index).release(images);
                removed += 1;
            }
        }
        removed
    }

    pub fn clear(&mut self, images: &mut dyn ImageLoader) {
        for entity in self.entities.drain(..) {
            entity.release(images);
        }
        self.avatar = None;
    }

    fn detach(&mut self, index: usize) -> Entity {
        let entity = self.entities.remove(index);
        if entity.id().is_some() && entity.id() == self.avatar {
            self.avatar = None;
        }
        entity
    }

    /// Runs one behavior step for every live entity present when the pass starts.
    pub fn update_all(&mut self, map: &WorldMap, dt: f32, mode: SimulationMode, world_scale: f32) {
        let count = self.entities.len();
        let ctx = StepContext {
            map,
            dt,
            world_scale,
            mode,
            avatar_rect: self
                .avatar()
                .filter(|avatar| avatar.is_live())
                .map(Entity::collision_rect),
        };
        for index in 0..count {
            let entity = &mut self.entities[index];
            if entity.is_live() {
                behavior::step(entity, &ctx, &mut self.rng);
            }
        }
    }

    /// Applies player input to the avatar. Returns false without a live avatar.
    pub fn drive_avatar(
        &mut self,
        intent: &AvatarIntent,
        map: &WorldMap,
        dt: f32,
        mode: SimulationMode,
        world_scale: f32,
    ) -> bool {
        let Some(index) = self.avatar_index() else {
            return false;
        };
        let ctx = StepContext {
            map,
            dt,
            world_scale,
            mode,
            avatar_rect: None,
        };
        behavior::drive_avatar(&mut self.entities[index], intent, &ctx)
    }

    /// Stable sort by ascending vertical position, ahead of a draw pass.
    pub fn sort_by_depth(&mut self) {
        self.entities
            .sort_by(|a, b| a.body.position.y.total_cmp(&b.body.position.y));
    }

    /// First live entity whose collision rectangle contains `point`.
    pub fn query_at(&self, point: Vec2) -> Option<&Entity> {
        self.live()
            .find(|entity| entity.collision_rect().contains_point(point))
    }

    /// Live entities whose position lies within `radius` of `point`, boundary included.
    pub fn query_in_radius(&self, point: Vec2, radius: f32) -> Vec<&Entity> {
        self.live()
            .filter(|entity| entity.body.position.distance(point) <= radius)
            .collect()
    }

    pub fn query_by_kind(&self, kind: EntityKind) -> Vec<&Entity> {
        self.live().filter(|entity| entity.kind() == kind).collect()
    }

    /// One pass over every live pair. Active attacks strike the other side at
    /// most once per attack; overlapping bodies both get their contact reaction.
    pub fn sweep_collisions(&mut self) -> SweepReport {
        let mut report = SweepReport::default();
        let count = self.entities.len();
        for j in 1..count {
            let (head, tail) = self.entities.split_at_mut(j);
            let second = &mut tail[0];
            for first in head.iter_mut() {
                if !first.is_live() || !second.is_live() {
                    continue;
                }
                if strike(first, second) {
                    report.hits += 1;
                }
                if second.is_live() && strike(second, first) {
                    report.hits += 1;
                }
                if actors_overlap(first, second) {
                    let first_info = first.contact_info();
                    let second_info = second.contact_info();
                    first.on_collision(second_info);
                    second.on_collision(first_info);
                    report.contacts += 1;
                }
            }
        }
        report
    }

    pub fn avatar(&self) -> Option<&Entity> {
        self.avatar_index().map(|index| &self.entities[index])
    }

    pub fn avatar_mut(&mut self) -> Option<&mut Entity> {
        let index = self.avatar_index()?;
        Some(&mut self.entities[index])
    }

    pub fn avatar_id(&self) -> Option<EntityId> {
        self.avatar
    }

    fn avatar_index(&self) -> Option<usize> {
        self.avatar.and_then(|id| self.index_of(id))
    }

    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities
            .iter()
            .position(|entity| entity.id() == Some(id))
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.index_of(id).map(|index| &self.entities[index])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let index = self.index_of(id)?;
        Some(&mut self.entities[index])
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entities.len() >= self.capacity
    }

    fn live(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|entity| entity.is_live())
    }
}

/// Lands `attacker`'s active attack on `target` if it reaches and has not struck it yet.
fn strike(attacker: &mut Entity, target: &mut Entity) -> bool {
    let Some(damage) = attacker
        .attack
        .pending_strike(target.id(), target.collision_rect())
    else {
        return false;
    };
    target.take_hit(damage);
    attacker.attack.record_strike(target.id());
    true
}

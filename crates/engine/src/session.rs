use std::mem;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::assets::ImageLoader;
use crate::config::{AssetLayout, WorldConfig};
use crate::entity::{
    AvatarIntent, Entity, EntityRegistry, RegistryError, SimulationMode, SweepReport,
};
use crate::geometry::{rect_corners_in_polygon, Rect, Vec2};
use crate::map::{try_load_world_map, MapLoadError, WorldMap};
use crate::map_names::{validate_map_name, MapNameError};
use crate::spawn::SpawnTable;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid map name '{name}': {source}")]
    InvalidMapName {
        name: String,
        #[source]
        source: MapNameError,
    },
    #[error("failed to load map '{name}': {source}")]
    MapLoad {
        name: String,
        #[source]
        source: MapLoadError,
    },
    #[error("map '{name}' has no tile layers")]
    EmptyMap { name: String },
    #[error("entity registry has no room for the avatar (capacity {capacity})")]
    AvatarRejected { capacity: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    Resident,
    /// Only observable from inside [`MapSession::check_and_apply`].
    Transitioning,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppliedTransition {
    pub from: String,
    pub to: String,
    pub spawn_position: Vec2,
    pub spawned: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Stayed,
    Applied(AppliedTransition),
    /// The target map could not be loaded; the current map stays live.
    Rejected { target: String, reason: String },
}

impl TransitionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, TransitionOutcome::Applied(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub avatar_driven: bool,
    pub sweep: SweepReport,
    pub removed: usize,
    pub transition: TransitionOutcome,
}

/// The live map, its entities and the transition state machine between maps.
#[derive(Debug)]
pub struct MapSession {
    config: WorldConfig,
    layout: AssetLayout,
    spawn_table: SpawnTable,
    map_name: String,
    map: WorldMap,
    registry: EntityRegistry,
    state: TransitionState,
    /// Trigger whose target failed to load; not retried until the avatar leaves it.
    failed_trigger: Option<usize>,
}

impl MapSession {
    /// Loads `map_name`, adds `avatar` and spawns the map's creatures.
    pub fn open(
        map_name: &str,
        avatar: Entity,
        config: WorldConfig,
        layout: AssetLayout,
        spawn_table: SpawnTable,
        images: &mut dyn ImageLoader,
    ) -> Result<Self, SessionError> {
        let map = match load_map(map_name, &config, &layout, images) {
            Ok(map) => map,
            Err(error) => {
                avatar.release(images);
                return Err(error);
            }
        };

        let mut registry = EntityRegistry::from_config(&config);
        if let Err(error) = registry.add(avatar) {
            map.unload(images);
            return Err(reject_avatar(error, images));
        }
        let spawned = spawn_table.populate(&mut registry, map_name, &config, &layout, images);
        info!(map = map_name, spawned, "map_session_opened");

        Ok(Self {
            config,
            layout,
            spawn_table,
            map_name: map_name.to_string(),
            map,
            registry,
            state: TransitionState::Resident,
            failed_trigger: None,
        })
    }

    /// One simulation tick: avatar input, behavior updates, the pair sweep,
    /// dead-entity removal, then transition detection.
    pub fn tick(
        &mut self,
        dt: f32,
        intent: &AvatarIntent,
        mode: SimulationMode,
        images: &mut dyn ImageLoader,
    ) -> TickReport {
        let scale = self.config.pixel_scale;
        let avatar_driven = self
            .registry
            .drive_avatar(intent, &self.map, dt, mode, scale);
        self.registry.update_all(&self.map, dt, mode, scale);
        let sweep = self.registry.sweep_collisions();
        let removed = self.registry.remove_dead(images);

        let avatar_rect = self.registry.avatar().map(Entity::collision_rect);
        let transition = match avatar_rect {
            Some(avatar_rect) => self.check_and_apply(avatar_rect, images),
            None => TransitionOutcome::Stayed,
        };

        TickReport {
            avatar_driven,
            sweep,
            removed,
            transition,
        }
    }

    /// Tests `avatar_rect` against every trigger area and switches maps on the first
    /// hit. The target is loaded before anything is torn down, so a failed load
    /// leaves the current map and entities untouched.
    pub fn check_and_apply(
        &mut self,
        avatar_rect: Rect,
        images: &mut dyn ImageLoader,
    ) -> TransitionOutcome {
        let Some(index) = self.triggered_transition(avatar_rect) else {
            self.failed_trigger = None;
            return TransitionOutcome::Stayed;
        };
        if self.failed_trigger == Some(index) {
            return TransitionOutcome::Stayed;
        }

        let transition = &self.map.transitions()[index];
        let target = transition.target_map.clone();
        let spawn_position = transition.spawn_position;
        self.state = TransitionState::Transitioning;

        let next_map = match load_map(&target, &self.config, &self.layout, images) {
            Ok(map) => map,
            Err(error) => {
                warn!(
                    from = %self.map_name,
                    target = %target,
                    error = %error,
                    "map_transition_rejected"
                );
                self.failed_trigger = Some(index);
                self.state = TransitionState::Resident;
                return TransitionOutcome::Rejected {
                    target,
                    reason: error.to_string(),
                };
            }
        };

        let avatar = self.registry.take_avatar();
        let mut previous_registry =
            mem::replace(&mut self.registry, EntityRegistry::from_config(&self.config));
        previous_registry.clear(images);
        mem::replace(&mut self.map, next_map).unload(images);

        if let Some(mut avatar) = avatar {
            avatar.body.position = spawn_position;
            if let Err(error) = self.registry.add(avatar) {
                let error = reject_avatar(error, images);
                warn!(map = %target, error = %error, "avatar_not_placed");
            }
        }
        let spawned = self.spawn_table.populate(
            &mut self.registry,
            &target,
            &self.config,
            &self.layout,
            images,
        );

        let from = mem::replace(&mut self.map_name, target.clone());
        self.failed_trigger = None;
        self.state = TransitionState::Resident;
        info!(
            from = %from,
            to = %target,
            spawn_x = spawn_position.x,
            spawn_y = spawn_position.y,
            spawned,
            "map_transition_applied"
        );

        TransitionOutcome::Applied(AppliedTransition {
            from,
            to: target,
            spawn_position,
            spawned,
        })
    }

    fn triggered_transition(&self, avatar_rect: Rect) -> Option<usize> {
        let scale = self.config.pixel_scale;
        self.map.transitions().iter().position(|transition| {
            !transition.trigger_area.is_degenerate()
                && rect_corners_in_polygon(avatar_rect, &transition.trigger_area.scaled(scale))
        })
    }

    /// Releases every entity sprite and tileset image.
    pub fn close(mut self, images: &mut dyn ImageLoader) {
        self.registry.clear(images);
        self.map.unload(images);
        debug!(map = %self.map_name, "map_session_closed");
    }

    pub fn map_name(&self) -> &str {
        &self.map_name
    }

    pub fn map(&self) -> &WorldMap {
        &self.map
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn state(&self) -> TransitionState {
        self.state
    }
}

/// Loads the map for `name`, treating a map without tile layers as a failure.
fn load_map(
    name: &str,
    config: &WorldConfig,
    layout: &AssetLayout,
    images: &mut dyn ImageLoader,
) -> Result<WorldMap, SessionError> {
    validate_map_name(name).map_err(|source| SessionError::InvalidMapName {
        name: name.to_string(),
        source,
    })?;
    let map = try_load_world_map(&layout.map_path(name), config, layout, images).map_err(
        |source| SessionError::MapLoad {
            name: name.to_string(),
            source,
        },
    )?;
    if map.is_empty() {
        map.unload(images);
        return Err(SessionError::EmptyMap {
            name: name.to_string(),
        });
    }
    Ok(map)
}

fn reject_avatar(error: RegistryError, images: &mut dyn ImageLoader) -> SessionError {
    match error {
        RegistryError::CapacityExceeded { capacity, rejected } => {
            (*rejected).release(images);
            SessionError::AvatarRejected { capacity }
        }
        RegistryError::IndexOutOfRange { .. } => SessionError::AvatarRejected { capacity: 0 },
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::assets::testing::CountingImageLoader;
    use crate::entity::{AttackKind, EntityKind, Species};

    const DT: f32 = 1.0 / 60.0;

    fn map_json(transitions: &str) -> String {
        format!(
            r#"{{
            "width": 2, "height": 2,
            "tilesets": [{{
                "firstgid": 1, "name": "ground", "tilewidth": 16, "tileheight": 16,
                "tilecount": 4, "columns": 2, "imagewidth": 32, "imageheight": 32,
                "image": "../../Art/ground.png"
            }}],
            "layers": [
                {{"type": "tilelayer", "name": "ground", "data": [1, 2, 3, 4]}},
                {{"type": "objectgroup", "name": "MapTransition", "objects": [{transitions}]}}
            ]
        }}"#
        )
    }

    fn square_trigger(name: &str, x: f32, y: f32) -> String {
        format!(
            r#"{{"name": "{name}", "x": {x}, "y": {y},
                "polygon": [{{"x":0,"y":0}},{{"x":32,"y":0}},{{"x":32,"y":32}},{{"x":0,"y":32}}]}}"#
        )
    }

    struct Fixture {
        _temp: TempDir,
        layout: AssetLayout,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().expect("tempdir");
            let layout = AssetLayout::new(temp.path());
            let fixture = Self {
                _temp: temp,
                layout,
            };
            fixture.write_map(
                "field",
                &map_json(&[
                    square_trigger("cave:0,10", 64.0, 0.0),
                    square_trigger("nowhere:1,1", 0.0, 64.0),
                    square_trigger("hollow:1,1", 64.0, 64.0),
                ]
                .join(",")),
            );
            fixture.write_map("cave", &map_json(&square_trigger("field:2,2", 400.0, 400.0)));
            fixture.write_map("meadow", &map_json(""));
            fixture.write_map(
                "hollow",
                r#"{"width": 2, "height": 2, "tilesets": [], "layers": []}"#,
            );
            fixture
        }

        fn write_map(&self, name: &str, contents: &str) {
            let path = self.layout.map_path(name);
            fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
            fs::write(path, contents).expect("write");
        }

        fn open(&self, map: &str, avatar_at: Vec2, images: &mut CountingImageLoader) -> MapSession {
            let config = WorldConfig {
                rng_seed: Some(11),
                ..WorldConfig::default()
            };
            MapSession::open(
                map,
                Entity::avatar(avatar_at, config.creature_scale),
                config,
                self.layout.clone(),
                SpawnTable::builtin(),
                images,
            )
            .expect("open session")
        }
    }

    /// Avatar position that puts its collision rectangle inside the document-space
    /// square at `(x, y)`.
    fn avatar_inside(x: f32, y: f32) -> Vec2 {
        Vec2::new(x * 2.0 + 8.0 - 32.0, y * 2.0 + 8.0 - 32.0)
    }

    #[test]
    fn opening_field_spawns_its_table_entries() {
        let fixture = Fixture::new();
        let mut images = CountingImageLoader::new(192, 192);
        let session = fixture.open("field", Vec2::new(0.0, 300.0), &mut images);

        let registry = session.registry();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.query_by_kind(EntityKind::WanderingCreature).len(), 1);
        assert_eq!(registry.query_by_kind(EntityKind::AggressiveCreature).len(), 1);
        assert!(registry.avatar().is_some());
        assert_eq!(session.map().transitions().len(), 3);

        session.close(&mut images);
        assert_eq!(images.live_count(), 0);
    }

    #[test]
    fn map_without_table_entry_spawns_nothing() {
        let fixture = Fixture::new();
        let mut images = CountingImageLoader::new(192, 192);
        let session = fixture.open("meadow", Vec2::default(), &mut images);
        assert_eq!(session.registry().len(), 1);
        session.close(&mut images);
        assert_eq!(images.live_count(), 0);
    }

    #[test]
    fn open_fails_for_missing_map_without_leaking() {
        let fixture = Fixture::new();
        let mut images = CountingImageLoader::new(192, 192);
        let result = MapSession::open(
            "nowhere",
            Entity::avatar(Vec2::default(), 2.0),
            WorldConfig::default(),
            fixture.layout.clone(),
            SpawnTable::builtin(),
            &mut images,
        );
        assert!(matches!(result, Err(SessionError::MapLoad { .. })));
        assert_eq!(images.live_count(), 0);
    }

    #[test]
    fn stepping_into_trigger_moves_avatar_to_target_map() {
        let fixture = Fixture::new();
        let mut images = CountingImageLoader::new(192, 192);
        let mut session = fixture.open("field", avatar_inside(64.0, 0.0), &mut images);
        let report = session.tick(DT, &AvatarIntent::default(), SimulationMode::Paused, &mut images);

        let expected_spawn = Vec2::new(0.0, 10.0 * 16.0 * 2.0);
        match &report.transition {
            TransitionOutcome::Applied(applied) => {
                assert_eq!(applied.from, "field");
                assert_eq!(applied.to, "cave");
                assert_eq!(applied.spawn_position, expected_spawn);
                assert_eq!(applied.spawned, 1);
            }
            other => panic!("expected transition, got {other:?}"),
        }
        assert_eq!(session.map_name(), "cave");
        assert_eq!(session.state(), TransitionState::Resident);
        let avatar = session.registry().avatar().expect("avatar carried over");
        assert_eq!(avatar.body.position, expected_spawn);
        assert!(session
            .registry()
            .query_by_kind(EntityKind::WanderingCreature)
            .is_empty());
        assert_eq!(
            session
                .registry()
                .query_by_kind(EntityKind::AggressiveCreature)
                .len(),
            1
        );
        assert_eq!(session.registry().len(), 2);

        session.close(&mut images);
        assert_eq!(images.live_count(), 0);
    }

    #[test]
    fn dangling_target_keeps_current_map_and_latches() {
        let fixture = Fixture::new();
        let mut images = CountingImageLoader::new(192, 192);
        let mut session = fixture.open("field", avatar_inside(0.0, 64.0), &mut images);
        let live_before = images.live_count();

        let first = session.tick(DT, &AvatarIntent::default(), SimulationMode::Paused, &mut images);
        match first.transition {
            TransitionOutcome::Rejected { target, .. } => assert_eq!(target, "nowhere"),
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(session.map_name(), "field");
        assert_eq!(session.registry().len(), 3);
        assert!(!session.map().is_empty());
        assert_eq!(images.live_count(), live_before);

        let second = session.tick(DT, &AvatarIntent::default(), SimulationMode::Paused, &mut images);
        assert_eq!(second.transition, TransitionOutcome::Stayed);

        session.close(&mut images);
        assert_eq!(images.live_count(), 0);
    }

    #[test]
    fn target_without_tile_layers_is_rejected() {
        let fixture = Fixture::new();
        let mut images = CountingImageLoader::new(192, 192);
        let mut session = fixture.open("field", avatar_inside(64.0, 64.0), &mut images);

        let avatar_rect = session.registry().avatar().expect("avatar").collision_rect();
        let outcome = session.check_and_apply(avatar_rect, &mut images);
        assert!(matches!(
            outcome,
            TransitionOutcome::Rejected { ref target, .. } if target == "hollow"
        ));
        assert_eq!(session.map_name(), "field");
        session.close(&mut images);
        assert_eq!(images.live_count(), 0);
    }

    #[test]
    fn first_declared_trigger_wins() {
        let fixture = Fixture::new();
        let mut images = CountingImageLoader::new(192, 192);
        let mut session = fixture.open("field", Vec2::new(0.0, 300.0), &mut images);
        let overlapping_both = Rect::new(130.0, 50.0, 20.0, 90.0);

        let outcome = session.check_and_apply(overlapping_both, &mut images);
        match outcome {
            TransitionOutcome::Applied(applied) => assert_eq!(applied.to, "cave"),
            other => panic!("expected transition, got {other:?}"),
        }
        session.close(&mut images);
        assert_eq!(images.live_count(), 0);
    }

    #[test]
    fn tick_removes_creature_killed_by_avatar() {
        let fixture = Fixture::new();
        let mut images = CountingImageLoader::new(192, 192);
        let mut session = fixture.open("meadow", Vec2::new(300.0, 200.0), &mut images);
        let slime = Entity::creature(Species::Slime, Vec2::new(300.0, 300.0), 2.0);
        let index = session.registry_mut().add(slime).expect("add");
        let slime_id = session.registry().entities()[index].id().expect("id");
        session
            .registry_mut()
            .get_mut(slime_id)
            .expect("slime")
            .health
            .current = 1;

        let intent = AvatarIntent {
            attack: Some(AttackKind::Area),
            ..AvatarIntent::default()
        };
        let report = session.tick(DT, &intent, SimulationMode::Running, &mut images);
        assert!(report.avatar_driven);
        assert_eq!(report.sweep.hits, 1);
        assert_eq!(report.removed, 1);
        assert!(session.registry().get(slime_id).is_none());
        session.close(&mut images);
    }
}

use crate::entity::{Body, Entity};
use crate::geometry::{rect_intersects_polygon, rect_intersects_rect, Rect, Vec2};
use crate::map::WorldMap;

/// Full frame scaled by `body.scale`, shrunk uniformly and kept centred on the draw box.
pub fn entity_collision_rect(body: &Body) -> Rect {
    let full_width = body.frame.x * body.scale;
    let full_height = body.frame.y * body.scale;
    let shrink = if body.collision_shrink > 0.0 {
        body.collision_shrink
    } else {
        1.0
    };
    let width = full_width / shrink;
    let height = full_height / shrink;
    Rect::new(
        body.position.x + (full_width - width) / 2.0,
        body.position.y + (full_height - height) / 2.0,
        width,
        height,
    )
}

/// True if `rect` (world pixels) touches any collision polygon scaled by `scale`.
pub fn world_blocks(map: &WorldMap, rect: Rect, scale: f32) -> bool {
    map.collision_layer()
        .iter()
        .filter(|polygon| !polygon.is_degenerate())
        .any(|polygon| rect_intersects_polygon(rect, &polygon.scaled(scale)))
}

pub fn actors_overlap(a: &Entity, b: &Entity) -> bool {
    rect_intersects_rect(a.collision_rect(), b.collision_rect())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisBlocked {
    pub x: bool,
    pub y: bool,
}

impl AxisBlocked {
    pub fn any(self) -> bool {
        self.x || self.y
    }
}

/// Applies `delta` one axis at a time (X then Y). Each axis that ends up inside
/// world geometry is rolled back on its own, so diagonal motion slides along walls.
pub fn move_with_world_collision(
    body: &mut Body,
    delta: Vec2,
    map: &WorldMap,
    scale: f32,
) -> AxisBlocked {
    let mut blocked = AxisBlocked::default();

    if delta.x != 0.0 {
        let previous_x = body.position.x;
        body.position.x += delta.x;
        if world_blocks(map, entity_collision_rect(body), scale) {
            body.position.x = previous_x;
            blocked.x = true;
        }
    }

    if delta.y != 0.0 {
        let previous_y = body.position.y;
        body.position.y += delta.y;
        if world_blocks(map, entity_collision_rect(body), scale) {
            body.position.y = previous_y;
            blocked.y = true;
        }
    }

    blocked
}

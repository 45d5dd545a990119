//! Entity materialization: moves recorded entities into grid space and hands
//! them to the grid's spawn hook.

use cgmath::{EuclideanSpace, Point3, Vector3};
use log::debug;
use serde_json::{json, Value};

use crate::structure::{
    settings::PlacementSettings,
    template::EntityRecord,
    transform::{transform_pos, transform_vec, transform_yaw},
};
use crate::voxels::grid::{
    EntitySpawn, Grid, ENTITY_IDENTITY_KEY, ENTITY_KIND_KEY, ENTITY_POSITION_KEY,
    ENTITY_ROTATION_KEY,
};

/// Reads `[yaw, pitch]` from a payload, defaulting missing parts to zero.
fn read_rotation(payload: &serde_json::Map<String, Value>) -> (f32, f32) {
    let angles = payload.get(ENTITY_ROTATION_KEY).and_then(Value::as_array);
    let angle = |index: usize| {
        angles
            .and_then(|list| list.get(index))
            .and_then(Value::as_f64)
            .unwrap_or(0.0) as f32
    };
    (angle(0), angle(1))
}

/// Builds the spawn request for one recorded entity, or `None` if its anchor
/// falls outside the clip box.
pub fn prepare_spawn(
    entity: &EntityRecord,
    origin: Point3<i32>,
    settings: &PlacementSettings,
) -> Option<EntitySpawn> {
    let anchor = transform_pos(entity.block_pos, settings.mirror, settings.rotation, settings.pivot)
        + origin.to_vec();
    if settings.clip_box.is_some_and(|clip| !clip.contains(anchor)) {
        return None;
    }

    let offset = Vector3::new(origin.x as f64, origin.y as f64, origin.z as f64);
    let position = transform_vec(entity.pos, settings.mirror, settings.rotation, settings.pivot) + offset;

    let mut payload = entity.payload.clone();
    payload.remove(ENTITY_IDENTITY_KEY);
    payload.insert(
        ENTITY_POSITION_KEY.into(),
        json!([position.x, position.y, position.z]),
    );

    let (yaw, pitch) = read_rotation(&payload);
    let yaw = transform_yaw(yaw, settings.mirror, settings.rotation);
    payload.insert(ENTITY_ROTATION_KEY.into(), json!([yaw, pitch]));

    let kind = payload
        .get(ENTITY_KIND_KEY)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Some(EntitySpawn {
        kind,
        payload,
        position,
        yaw,
        pitch,
    })
}

/// Spawns every recorded entity that survives clipping.
///
/// # Returns
///
/// The number of entities the grid accepted.
pub fn materialize_entities<G: Grid + ?Sized>(
    grid: &mut G,
    entities: &[EntityRecord],
    origin: Point3<i32>,
    settings: &PlacementSettings,
) -> usize {
    let mut spawned = 0;
    for entity in entities {
        let Some(mut spawn) = prepare_spawn(entity, origin, settings) else {
            continue;
        };
        if settings.finalize_entities && grid.is_finalizable(&spawn.kind) {
            grid.finalize_spawn(&mut spawn);
        }
        let kind = spawn.kind.clone();
        match grid.spawn_entity(spawn) {
            Some(_) => spawned += 1,
            None => debug!("grid rejected entity `{}` from template", kind),
        }
    }
    spawned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxels::{
        block::direction::{Mirror, Rotation},
        bounding_box::BoundingBox,
        grid::read_vec3,
        world::{World, FINALIZED_KEY},
    };

    fn entity(kind: &str, pos: Point3<f64>, yaw: f32) -> EntityRecord {
        let payload = json!({
            "id": kind,
            "UUID": [1, 2, 3, 4],
            "Rotation": [yaw, 10.0],
            "Pos": [0.0, 0.0, 0.0]
        });
        EntityRecord {
            pos,
            block_pos: Point3::new(pos.x.floor() as i32, pos.y.floor() as i32, pos.z.floor() as i32),
            payload: payload.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn test_spawn_is_moved_and_identity_stripped() {
        let settings = PlacementSettings::new();
        let spawn = prepare_spawn(&entity("pig", Point3::new(1.5, 0.0, 2.5), 45.0), Point3::new(100, 64, -20), &settings)
            .unwrap();

        assert_eq!(spawn.kind, "pig");
        assert_eq!(spawn.position, Point3::new(101.5, 64.0, -17.5));
        assert!(!spawn.payload.contains_key("UUID"));
        assert_eq!(read_vec3(&spawn.payload, "Pos"), Some(Vector3::new(101.5, 64.0, -17.5)));
        assert_eq!(spawn.yaw, 45.0);
        assert_eq!(spawn.pitch, 10.0);
    }

    #[test]
    fn test_rotation_turns_position_and_heading() {
        let settings = PlacementSettings::new()
            .with_rotation(Rotation::Clockwise90)
            .with_mirror(Mirror::None);
        let spawn = prepare_spawn(&entity("cow", Point3::new(0.5, 0.0, 0.5), 0.0), Point3::new(0, 0, 0), &settings)
            .unwrap();
        assert_eq!(spawn.position, Point3::new(0.5, 0.0, 0.5));
        assert_eq!(spawn.yaw, 90.0);
    }

    #[test]
    fn test_clip_box_uses_anchor() {
        let settings =
            PlacementSettings::new().with_clip_box(BoundingBox::from_corners(Point3::new(0, 0, 0), Point3::new(1, 1, 1)));
        assert!(prepare_spawn(&entity("pig", Point3::new(1.9, 0.0, 0.0), 0.0), Point3::new(0, 0, 0), &settings).is_some());
        assert!(prepare_spawn(&entity("pig", Point3::new(2.1, 0.0, 0.0), 0.0), Point3::new(0, 0, 0), &settings).is_none());
    }

    #[test]
    fn test_finalize_only_when_enabled_and_finalizable() {
        let entities = vec![
            entity("zombie", Point3::new(0.5, 0.0, 0.5), 0.0),
            entity("pig", Point3::new(1.5, 0.0, 0.5), 0.0),
        ];

        let mut world = World::new();
        let settings = PlacementSettings::new().finalize_entities(true);
        assert_eq!(materialize_entities(&mut world, &entities, Point3::new(0, 0, 0), &settings), 2);
        let finalized: Vec<bool> = world
            .entities()
            .map(|e| e.payload.contains_key(FINALIZED_KEY))
            .collect();
        assert_eq!(finalized, vec![true, false]);

        let mut world = World::new();
        materialize_entities(&mut world, &entities, Point3::new(0, 0, 0), &PlacementSettings::new());
        assert!(world.entities().all(|e| !e.payload.contains_key(FINALIZED_KEY)));
    }

    #[test]
    fn test_rejected_entities_are_not_counted() {
        let mut nameless = entity("", Point3::new(0.5, 0.0, 0.5), 0.0);
        nameless.payload.remove("id");
        let mut world = World::new();
        assert_eq!(
            materialize_entities(&mut world, &[nameless], Point3::new(0, 0, 0), &PlacementSettings::new()),
            0
        );
    }
}

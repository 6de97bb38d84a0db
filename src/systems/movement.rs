//! Server-authoritative movement with axis-separated collision resolution.

use crate::state::{Player, Resource, Vec2};

/// Solid collision circles are shrunk slightly so entities can slip through
/// gaps the renderer draws as passable.
pub const COLLISION_RADIUS_REDUCTION: f32 = 2.0;

pub fn dist_sq(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let dx = x1 - x2;
    let dy = y1 - y2;
    dx * dx + dy * dy
}

/// Collision radius of a moving entity given its body diameter.
pub fn entity_radius(size: f32) -> f32 {
    (size / 2.0).max(2.0)
}

/// Circle test against every solid resource.
pub fn collides_with_solid(x: f32, y: f32, radius: f32, resources: &[Resource]) -> bool {
    for resource in resources {
        if !resource.solid {
            continue;
        }

        let collision_radius = (resource.collision_radius - COLLISION_RADIUS_REDUCTION).max(0.0);
        if collision_radius <= 0.0 {
            continue;
        }

        let cx = resource.x + resource.collision_offset.x;
        let cy = resource.y + resource.collision_offset.y;
        let min_distance = radius + collision_radius;
        if dist_sq(x, y, cx, cy) < min_distance * min_distance {
            return true;
        }
    }

    false
}

/// Applies the X and Y displacement independently, reverting whichever axis
/// collides. Testing the axes separately yields simple sliding along solid
/// resources without full vector projection.
pub fn resolve_axis_separated(
    prev_x: f32,
    prev_y: f32,
    target_x: f32,
    target_y: f32,
    radius: f32,
    resources: &[Resource],
) -> (f32, f32) {
    let mut x = target_x;
    if collides_with_solid(x, prev_y, radius, resources) {
        x = prev_x;
    }

    let mut y = target_y;
    if collides_with_solid(x, y, radius, resources) {
        y = prev_y;
    }

    (x, y)
}

/// Keeps an entity's center inside the world square, accounting for its own
/// radius on every edge.
pub fn clamp_to_world(x: f32, y: f32, radius: f32, world_size: f32) -> (f32, f32) {
    (
        x.clamp(radius, world_size - radius),
        y.clamp(radius, world_size - radius),
    )
}

/// Main movement entry point for queued player intents.
///
/// The raw input vector is normalized first, so payload magnitude never
/// affects speed; the final position always honors solid resources and the
/// world bounds.
pub fn apply_player_movement(
    player: &mut Player,
    input_dir: Vec2,
    world_size: f32,
    resources: &[Resource],
) {
    if !player.alive {
        return;
    }

    let dir = input_dir.normalized();
    if dir == Vec2::ZERO {
        return;
    }

    let speed = player.speed;
    let target_x = player.x + dir.x * speed;
    let target_y = player.y + dir.y * speed;

    let radius = entity_radius(player.size);
    let (x, y) = resolve_axis_separated(player.x, player.y, target_x, target_y, radius, resources);
    let (x, y) = clamp_to_world(x, y, radius, world_size);
    player.x = x;
    player.y = y;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::player::PlayerTuning;
    use crate::tuning::resource::ResourceKind;

    const WORLD: f32 = 3200.0;

    fn player_at(x: f32, y: f32) -> Player {
        Player::spawn(1, "p".to_string(), x, y, &PlayerTuning::default())
    }

    fn tree_at(x: f32, y: f32) -> Resource {
        Resource::new(9, ResourceKind::Tree, x, y)
    }

    #[test]
    fn zero_vector_is_a_no_op() {
        let mut p = player_at(100.0, 100.0);
        apply_player_movement(&mut p, Vec2::ZERO, WORLD, &[]);
        assert_eq!((p.x, p.y), (100.0, 100.0));
    }

    #[test]
    fn oversized_input_moves_exactly_one_speed_step() {
        let mut p = player_at(100.0, 100.0);
        apply_player_movement(&mut p, Vec2::new(1000.0, 0.0), WORLD, &[]);
        assert_eq!(p.x, 105.0);
        assert_eq!(p.y, 100.0);
    }

    #[test]
    fn diagonal_input_is_normalized() {
        let mut p = player_at(100.0, 100.0);
        apply_player_movement(&mut p, Vec2::new(1.0, 1.0), WORLD, &[]);
        let moved = dist_sq(p.x, p.y, 100.0, 100.0).sqrt();
        assert!((moved - 5.0).abs() < 1e-3);
    }

    #[test]
    fn position_stays_in_bounds_for_any_direction() {
        for (dx, dy) in [
            (-1.0, 0.0),
            (0.0, -1.0),
            (1.0, 0.0),
            (0.0, 1.0),
            (-50.0, -50.0),
            (1e6, 1e6),
        ] {
            let mut p = player_at(1.0, 1.0);
            for _ in 0..100 {
                apply_player_movement(&mut p, Vec2::new(dx, dy), WORLD, &[]);
            }
            let radius = entity_radius(p.size);
            assert!(p.x >= radius && p.x <= WORLD - radius);
            assert!(p.y >= radius && p.y <= WORLD - radius);
        }
    }

    #[test]
    fn non_finite_input_does_not_poison_position() {
        let mut p = player_at(100.0, 100.0);
        apply_player_movement(&mut p, Vec2::new(f32::NAN, f32::INFINITY), WORLD, &[]);
        assert_eq!((p.x, p.y), (100.0, 100.0));
    }

    #[test]
    fn blocked_axis_reverts_and_free_axis_slides() {
        // Tree straight to the right; moving diagonally should slide along Y.
        let tree = tree_at(120.0, 100.0);
        let mut p = player_at(100.0, 100.0);
        apply_player_movement(&mut p, Vec2::new(1.0, 1.0), WORLD, &[tree]);
        assert_eq!(p.x, 100.0);
        assert!(p.y > 100.0);
    }

    #[test]
    fn dead_players_do_not_move() {
        let mut p = player_at(100.0, 100.0);
        p.alive = false;
        apply_player_movement(&mut p, Vec2::new(1.0, 0.0), WORLD, &[]);
        assert_eq!((p.x, p.y), (100.0, 100.0));
    }

    #[test]
    fn soft_resources_never_block() {
        let grass = Resource::new(3, ResourceKind::Grass, 103.0, 100.0);
        let mut p = player_at(100.0, 100.0);
        apply_player_movement(&mut p, Vec2::new(1.0, 0.0), WORLD, &[grass]);
        assert_eq!(p.x, 105.0);
    }
}

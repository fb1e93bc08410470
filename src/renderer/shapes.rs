//! Shape generation for 2D primitives
//!
//! Everything is emitted as a triangle list in viewport pixels.

use glam::Vec2;
use std::f32::consts::PI;

use super::vertex::Vertex;

/// Generate vertices for an axis-aligned rectangle (top-left origin)
pub fn rect(pos: Vec2, size: Vec2, color: [f32; 4]) -> Vec<Vertex> {
    let (x0, y0) = (pos.x, pos.y);
    let (x1, y1) = (pos.x + size.x, pos.y + size.y);
    vec![
        Vertex::new(x0, y0, color),
        Vertex::new(x1, y0, color),
        Vertex::new(x0, y1, color),
        Vertex::new(x0, y1, color),
        Vertex::new(x1, y0, color),
        Vertex::new(x1, y1, color),
    ]
}

/// Rectangle of `size` centered on `center`, rotated by `angle` radians
pub fn rotated_rect(center: Vec2, size: Vec2, angle: f32, color: [f32; 4]) -> Vec<Vertex> {
    let half = size * 0.5;
    let rot = Vec2::from_angle(angle);
    let corners = [
        Vec2::new(-half.x, -half.y),
        Vec2::new(half.x, -half.y),
        Vec2::new(half.x, half.y),
        Vec2::new(-half.x, half.y),
    ]
    .map(|c| center + rot.rotate(c));

    [0, 1, 3, 3, 1, 2]
        .into_iter()
        .map(|i| Vertex::new(corners[i].x, corners[i].y, color))
        .collect()
}

/// Filled triangle
pub fn triangle(a: Vec2, b: Vec2, c: Vec2, color: [f32; 4]) -> Vec<Vertex> {
    vec![
        Vertex::new(a.x, a.y, color),
        Vertex::new(b.x, b.y, color),
        Vertex::new(c.x, c.y, color),
    ]
}

/// Generate vertices for a filled ellipse
pub fn ellipse(center: Vec2, radii: Vec2, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        // Triangle from center to edge
        vertices.push(Vertex::new(center.x, center.y, color));
        vertices.push(Vertex::new(
            center.x + radii.x * theta1.cos(),
            center.y + radii.y * theta1.sin(),
            color,
        ));
        vertices.push(Vertex::new(
            center.x + radii.x * theta2.cos(),
            center.y + radii.y * theta2.sin(),
            color,
        ));
    }

    vertices
}

/// Generate vertices for a filled circle
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    ellipse(center, Vec2::splat(radius), color, segments)
}

/// Horizontal bar filled to `fraction` over a dark backing
pub fn bar(pos: Vec2, size: Vec2, fraction: f32, fill: [f32; 4], back: [f32; 4]) -> Vec<Vertex> {
    let mut vertices = rect(pos, size, back);
    let filled = size.x * fraction.clamp(0.0, 1.0);
    if filled > 0.0 {
        vertices.extend(rect(pos, Vec2::new(filled, size.y), fill));
    }
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_covers_corners() {
        let v = rect(Vec2::new(10.0, 20.0), Vec2::new(30.0, 40.0), [1.0; 4]);
        assert_eq!(v.len(), 6);
        let xs: Vec<f32> = v.iter().map(|v| v.position[0]).collect();
        let ys: Vec<f32> = v.iter().map(|v| v.position[1]).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MAX, f32::min), 10.0);
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), 40.0);
        assert_eq!(ys.iter().cloned().fold(f32::MIN, f32::max), 60.0);
    }

    #[test]
    fn test_rotated_rect_keeps_center() {
        let center = Vec2::new(50.0, 50.0);
        let v = rotated_rect(center, Vec2::new(20.0, 10.0), 0.7, [1.0; 4]);
        assert_eq!(v.len(), 6);
        for vertex in &v {
            let d = Vec2::from(vertex.position).distance(center);
            assert!((d - Vec2::new(10.0, 5.0).length()).abs() < 1e-3);
        }
    }

    #[test]
    fn test_circle_segment_count() {
        assert_eq!(circle(Vec2::ZERO, 5.0, [1.0; 4], 16).len(), 48);
    }

    #[test]
    fn test_empty_bar_has_only_backing() {
        let v = bar(Vec2::ZERO, Vec2::new(100.0, 10.0), 0.0, [1.0; 4], [0.0; 4]);
        assert_eq!(v.len(), 6);
        let v = bar(Vec2::ZERO, Vec2::new(100.0, 10.0), 0.5, [1.0; 4], [0.0; 4]);
        assert_eq!(v.len(), 12);
        assert_eq!(v[7].position[0], 50.0);
    }
}

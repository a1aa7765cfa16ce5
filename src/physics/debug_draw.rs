use cgmath::{Vector3, Vector4};
use rapier3d::prelude::*;

use crate::context::Renderer;

/// Forwards rapier's debug geometry to the renderer's line batch.
pub struct PhysicsDebugDraw<'a> {
    renderer: &'a mut Renderer,
    lines: usize,
}

impl<'a> PhysicsDebugDraw<'a> {
    pub fn new(renderer: &'a mut Renderer) -> Self {
        Self { renderer, lines: 0 }
    }

    pub fn lines(&self) -> usize {
        self.lines
    }
}

impl DebugRenderBackend for PhysicsDebugDraw<'_> {
    fn draw_line(
        &mut self,
        _: DebugRenderObject,
        a: Point<Real>,
        b: Point<Real>,
        color: [f32; 4],
    ) {
        self.renderer.draw_line(
            Vector3::new(a.x, a.y, a.z),
            Vector3::new(b.x, b.y, b.z),
            hsla_to_rgba(color),
        );
        self.lines += 1;
    }
}

/// Rapier styles its debug geometry in HSLA (hue in degrees).
fn hsla_to_rgba([h, s, l, a]: [f32; 4]) -> Vector4<f32> {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let h = (h.rem_euclid(360.0)) / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    Vector4::new(r + m, g + m, b + m, a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_primary_hues() {
        assert_eq!(hsla_to_rgba([0.0, 1.0, 0.5, 1.0]), Vector4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(hsla_to_rgba([120.0, 1.0, 0.5, 1.0]), Vector4::new(0.0, 1.0, 0.0, 1.0));
        assert_eq!(hsla_to_rgba([240.0, 1.0, 0.5, 0.5]), Vector4::new(0.0, 0.0, 1.0, 0.5));
    }
}

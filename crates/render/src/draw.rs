use glam::{Mat4, Vec3};

use crate::backend::DrawCall;
use crate::context::HarnessContext;

/// Primitive the harness draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    #[default]
    Cube,
    Triangle,
}

/// Per-window inputs to a draw step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub slot: usize,
    /// Seconds since the loop started, sampled once per outer iteration.
    pub time: f32,
    pub aspect: f32,
}

/// Produces the draw call for one window. Invoked once per window per frame,
/// after the window has been made current.
pub trait DrawStep {
    fn draw(&mut self, ctx: &HarnessContext, frame: &FrameInfo) -> DrawCall;
}

impl<F> DrawStep for F
where
    F: FnMut(&HarnessContext, &FrameInfo) -> DrawCall,
{
    fn draw(&mut self, ctx: &HarnessContext, frame: &FrameInfo) -> DrawCall {
        self(ctx, frame)
    }
}

/// Time-varying color: `|cos 2t|, |sin 2t|, |sin 1.3t|`.
pub fn animated_color(time: f32) -> [f32; 4] {
    [
        (time * 2.0).cos().abs(),
        (time * 2.0).sin().abs(),
        (time * 1.3).sin().abs(),
        1.0,
    ]
}

const MODERN_SPIN_DEG_PER_SEC: f32 = 66.6;
const LEGACY_SPIN_DEG_PER_SEC: f32 = 50.0;

/// The two rendering profiles, chosen once at startup together with the
/// shape they draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameComposer {
    /// Camera-driven view and projection, uniform color that is either
    /// animated or frozen by the one-color toggle.
    Modern { shape: Shape },
    /// Fixed orthographic view, spinning model, per-vertex colors. Ignores
    /// the camera and the toggle.
    Legacy { shape: Shape },
}

impl Default for FrameComposer {
    fn default() -> Self {
        FrameComposer::Modern {
            shape: Shape::default(),
        }
    }
}

impl FrameComposer {
    pub fn modern(shape: Shape) -> Self {
        FrameComposer::Modern { shape }
    }

    pub fn legacy(shape: Shape) -> Self {
        FrameComposer::Legacy { shape }
    }

    pub fn shape(&self) -> Shape {
        match *self {
            FrameComposer::Modern { shape } | FrameComposer::Legacy { shape } => shape,
        }
    }

    /// Model transform at `time` seconds.
    ///
    /// The modern cube stays still; the modern triangle spins about
    /// (4.04, 4.2, 1.3). Legacy shapes spin at 50 degrees per second, the
    /// cube about (0.5, 1.5, 0.5) and the triangle about (1, 1, 1).
    pub fn model_matrix(&self, time: f32) -> Mat4 {
        let (axis, deg_per_sec) = match *self {
            FrameComposer::Modern { shape: Shape::Cube } => return Mat4::IDENTITY,
            FrameComposer::Modern { shape: Shape::Triangle } => {
                (Vec3::new(4.04, 4.2, 1.3), MODERN_SPIN_DEG_PER_SEC)
            }
            FrameComposer::Legacy { shape: Shape::Cube } => {
                (Vec3::new(0.5, 1.5, 0.5), LEGACY_SPIN_DEG_PER_SEC)
            }
            FrameComposer::Legacy { shape: Shape::Triangle } => {
                (Vec3::ONE, LEGACY_SPIN_DEG_PER_SEC)
            }
        };
        Mat4::from_axis_angle(axis.normalize(), (time * deg_per_sec).to_radians())
    }
}

impl DrawStep for FrameComposer {
    fn draw(&mut self, ctx: &HarnessContext, frame: &FrameInfo) -> DrawCall {
        let model = self.model_matrix(frame.time);
        match self {
            FrameComposer::Modern { .. } => {
                let color = if ctx.toggle.one_color {
                    ctx.toggle.static_color.rgba()
                } else {
                    animated_color(frame.time)
                };
                DrawCall {
                    model,
                    view: ctx.camera.view_matrix(),
                    projection: ctx.camera.projection_matrix(frame.aspect),
                    color,
                    vertex_colors: false,
                }
            }
            FrameComposer::Legacy { .. } => {
                let aspect = frame.aspect.max(f32::EPSILON);
                DrawCall {
                    model,
                    view: Mat4::IDENTITY,
                    projection: Mat4::orthographic_rh(-aspect, aspect, -1.0, 1.0, -1.0, 1.0),
                    vertex_colors: true,
                    ..DrawCall::default()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use colorcube_common::Color;

    fn frame(time: f32) -> FrameInfo {
        FrameInfo {
            slot: 0,
            time,
            aspect: 1.0,
        }
    }

    #[test]
    fn animated_color_stays_in_unit_range() {
        for i in 0..500 {
            let c = animated_color(i as f32 * 0.037);
            assert!(c.iter().all(|v| (0.0..=1.0).contains(v)));
        }
        let c = animated_color(0.0);
        assert_relative_eq!(c[0], 1.0);
        assert_relative_eq!(c[1], 0.0);
    }

    #[test]
    fn modern_uses_animated_color_by_default() {
        let ctx = HarnessContext::new();
        let call = FrameComposer::default().draw(&ctx, &frame(0.7));
        assert_eq!(call.color, animated_color(0.7));
        assert!(!call.vertex_colors);
        assert_eq!(call.view, ctx.camera.view_matrix());
    }

    #[test]
    fn modern_uses_static_color_when_frozen() {
        let mut ctx = HarnessContext::new();
        ctx.toggle.one_color = true;
        ctx.toggle.static_color = Color::Purple;

        let a = FrameComposer::modern(Shape::Triangle).draw(&ctx, &frame(0.1));
        let b = FrameComposer::modern(Shape::Triangle).draw(&ctx, &frame(9.3));
        assert_eq!(a.color, Color::Purple.rgba());
        assert_eq!(b.color, Color::Purple.rgba());
        assert_ne!(a.model, b.model);
    }

    #[test]
    fn modern_projection_follows_zoom() {
        let mut ctx = HarnessContext::new();
        let wide = FrameComposer::default().draw(&ctx, &frame(0.0));
        ctx.camera.process_mouse_scroll(20.0);
        let narrow = FrameComposer::default().draw(&ctx, &frame(0.0));
        assert!(narrow.projection.col(0).x > wide.projection.col(0).x);
    }

    #[test]
    fn legacy_ignores_camera_and_toggle() {
        let mut ctx = HarnessContext::new();
        ctx.toggle.one_color = true;
        ctx.camera.process_mouse_movement(40.0, 10.0);
        let call = FrameComposer::legacy(Shape::Cube).draw(&ctx, &frame(1.0));
        assert!(call.vertex_colors);
        assert_eq!(call.view, Mat4::IDENTITY);
    }

    #[test]
    fn modern_cube_stays_still() {
        let composer = FrameComposer::modern(Shape::Cube);
        assert_eq!(composer.model_matrix(0.0), Mat4::IDENTITY);
        assert_eq!(composer.model_matrix(12.5), Mat4::IDENTITY);
    }

    #[test]
    fn spin_axes_follow_profile_and_shape() {
        let cases = [
            (FrameComposer::modern(Shape::Triangle), Vec3::new(4.04, 4.2, 1.3), 66.6),
            (FrameComposer::legacy(Shape::Cube), Vec3::new(0.5, 1.5, 0.5), 50.0),
            (FrameComposer::legacy(Shape::Triangle), Vec3::ONE, 50.0),
        ];
        for (composer, axis, deg_per_sec) in cases {
            let model = composer.model_matrix(1.0);
            let axis = axis.normalize();
            // Points on the rotation axis are fixed.
            let moved = model.transform_vector3(axis);
            assert_relative_eq!(moved.x, axis.x, epsilon = 1e-5);
            assert_relative_eq!(moved.y, axis.y, epsilon = 1e-5);
            assert_relative_eq!(moved.z, axis.z, epsilon = 1e-5);
            let (_, rotation, _) = model.to_scale_rotation_translation();
            let (_, angle) = rotation.to_axis_angle();
            assert_relative_eq!(angle.to_degrees(), deg_per_sec, epsilon = 1e-3);
        }
    }

    #[test]
    fn composer_reports_its_shape() {
        assert_eq!(FrameComposer::default().shape(), Shape::Cube);
        assert_eq!(FrameComposer::legacy(Shape::Triangle).shape(), Shape::Triangle);
    }

    #[test]
    fn closures_are_draw_steps() {
        let mut calls = 0;
        let mut step = |_: &HarnessContext, f: &FrameInfo| {
            calls += 1;
            DrawCall {
                color: [f.time, 0.0, 0.0, 1.0],
                ..DrawCall::default()
            }
        };
        let call = step.draw(&HarnessContext::new(), &frame(0.25));
        assert_eq!(call.color[0], 0.25);
        drop(step);
        assert_eq!(calls, 1);
    }
}

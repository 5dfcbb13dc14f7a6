use core::fmt;
use core::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::coords::{Mat3, Rect};
use crate::paint::Color;

/// Handle to a texture owned by the asset layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Handle to a shader program owned by the asset layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ShaderId(pub u32);

/// How source pixels combine with the target.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum CompositionMode {
    #[default]
    Normal,
    Multiply,
    Add,
    Replace,
    DestBlending,
    Light,
}

/// Operator applied between the blended source and destination terms.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum BlendEquation {
    #[default]
    Add,
    Max,
    Min,
    Subtract,
    ReverseSubtract,
}

/// Primitive topology of a draw object's coordinates.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum DrawMode {
    #[default]
    Triangles,
    TriangleStrip,
}

/// Callback run on the render thread.
///
/// Used for action-only draw objects and for shader setup right before a batch is
/// submitted. Cloning shares the same closure.
#[derive(Clone)]
pub struct Action(Rc<dyn Fn()>);

impl Action {
    pub fn new(f: impl Fn() + 'static) -> Self {
        Self(Rc::new(f))
    }

    #[inline]
    pub fn run(&self) {
        (self.0)()
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Action(..)")
    }
}

/// GPU-facing state shared by every method of a draw object.
///
/// Equality and hashing ignore `action`: two states that differ only in their setup
/// callback still batch together.
#[derive(Debug, Clone)]
pub struct PoolState {
    pub transform: Mat3,
    pub color: Color,
    pub opacity: f32,
    pub composition_mode: CompositionMode,
    pub blend_equation: BlendEquation,
    /// `None` draws everywhere.
    pub clip_rect: Option<Rect>,
    pub texture: Option<TextureId>,
    pub shader: Option<ShaderId>,
    pub action: Option<Action>,
}

impl Default for PoolState {
    fn default() -> Self {
        Self {
            transform: Mat3::IDENTITY,
            color: Color::white(),
            opacity: 1.0,
            composition_mode: CompositionMode::Normal,
            blend_equation: BlendEquation::Add,
            clip_rect: None,
            texture: None,
            shader: None,
            action: None,
        }
    }
}

impl PartialEq for PoolState {
    fn eq(&self, other: &Self) -> bool {
        self.transform == other.transform
            && self.color == other.color
            && self.opacity == other.opacity
            && self.composition_mode == other.composition_mode
            && self.blend_equation == other.blend_equation
            && self.clip_rect == other.clip_rect
            && self.texture == other.texture
            && self.shader == other.shader
    }
}

impl Hash for PoolState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.transform.hash(state);
        self.color.hash(state);
        self.opacity.to_bits().hash(state);
        self.composition_mode.hash(state);
        self.blend_equation.hash(state);
        self.clip_rect.hash(state);
        self.texture.hash(state);
        self.shader.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use std::hash::DefaultHasher;

    use crate::coords::Vec2;

    use super::*;

    fn hash_of(s: &PoolState) -> u64 {
        let mut h = DefaultHasher::new();
        s.hash(&mut h);
        h.finish()
    }

    #[test]
    fn action_is_not_part_of_identity() {
        let a = PoolState::default();
        let b = PoolState { action: Some(Action::new(|| {})), ..PoolState::default() };
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn every_other_field_is() {
        let base = PoolState::default();
        let variants = [
            PoolState { transform: Mat3::translation(Vec2::new(1.0, 0.0)), ..PoolState::default() },
            PoolState { color: Color::from_premul(0.5, 0.5, 0.5, 0.5), ..PoolState::default() },
            PoolState { opacity: 0.5, ..PoolState::default() },
            PoolState { clip_rect: Some(Rect::new(0.0, 0.0, 1.0, 1.0)), ..PoolState::default() },
            PoolState { texture: Some(TextureId(3)), ..PoolState::default() },
            PoolState { shader: Some(ShaderId(1)), ..PoolState::default() },
            PoolState { composition_mode: CompositionMode::Light, ..PoolState::default() },
            PoolState { blend_equation: BlendEquation::Max, ..PoolState::default() },
        ];
        for v in &variants {
            assert_ne!(&base, v);
            assert_ne!(hash_of(&base), hash_of(v));
        }
    }
}

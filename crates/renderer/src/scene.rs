//! Tiny scene: entities placing shared models in the world.

use asset::ModelHandle;
use glam::{Mat4, Quat, Vec3};

use crate::{Rasterizer, TextureMode, render_model};

/// Entity id (dense, index into component arrays).
pub type Entity = u32;

/// Translation, rotation about +Y and uniform scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub translation: Vec3,
    pub yaw: f32,
    pub scale: f32,
}

impl Placement {
    pub const fn identity() -> Self {
        Self {
            translation: Vec3::ZERO,
            yaw: 0.0,
            scale: 1.0,
        }
    }

    pub fn at(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    /// Cell `index` of a row-major grid on the XZ plane.
    pub fn on_grid(index: usize, columns: usize, spacing: f32) -> Self {
        let columns = columns.max(1);
        let (col, row) = (index % columns, index / columns);
        Self::at(Vec3::new(col as f32 * spacing, 0.0, row as f32 * spacing))
    }

    /// T * R * S.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            Quat::from_rotation_y(self.yaw),
            self.translation,
        )
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::identity()
    }
}

#[derive(Clone, Debug)]
struct Renderable {
    model: ModelHandle,
    textures: TextureMode,
}

/// Dense parallel arrays; despawned slots are not reused.
#[derive(Default)]
pub struct Scene {
    placements: Vec<Placement>,
    renderables: Vec<Option<Renderable>>,
    alive: Vec<bool>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn an entity drawing `model`. The model is shared, not copied.
    pub fn spawn(&mut self, placement: Placement, model: ModelHandle) -> Entity {
        let id = self.placements.len() as Entity;
        self.placements.push(placement);
        self.renderables.push(Some(Renderable {
            model,
            textures: TextureMode::Shown,
        }));
        self.alive.push(true);
        id
    }

    /// Remove the entity. Only its reference to the model is dropped.
    pub fn despawn(&mut self, e: Entity) -> bool {
        let i = e as usize;
        if !self.is_alive(e) {
            return false;
        }
        self.alive[i] = false;
        self.renderables[i] = None;
        true
    }

    #[inline]
    pub fn is_alive(&self, e: Entity) -> bool {
        self.alive.get(e as usize).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.alive.iter().filter(|a| **a).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn placement_mut(&mut self, e: Entity) -> Option<&mut Placement> {
        if self.is_alive(e) {
            self.placements.get_mut(e as usize)
        } else {
            None
        }
    }

    pub fn model(&self, e: Entity) -> Option<&ModelHandle> {
        self.renderables
            .get(e as usize)?
            .as_ref()
            .map(|r| &r.model)
    }

    /// Show or hide textures for one entity without touching its model.
    pub fn set_texture_mode(&mut self, e: Entity, textures: TextureMode) -> bool {
        match self.renderables.get_mut(e as usize).and_then(Option::as_mut) {
            Some(r) => {
                r.textures = textures;
                true
            }
            None => false,
        }
    }

    pub fn set_texture_mode_all(&mut self, textures: TextureMode) {
        for r in self.renderables.iter_mut().flatten() {
            r.textures = textures;
        }
    }

    /// Iterate over live (entity, placement, model) triples.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &Placement, &ModelHandle)> {
        (0..self.placements.len()).filter_map(move |i| {
            if !self.alive[i] {
                return None;
            }
            let r = self.renderables[i].as_ref()?;
            Some((i as Entity, &self.placements[i], &r.model))
        })
    }

    /// Draw every live entity with its own placement.
    pub fn draw<R: Rasterizer + ?Sized>(&self, rasterizer: &mut R) {
        for (i, placement) in self.placements.iter().enumerate() {
            let Some(r) = self.renderables[i].as_ref() else {
                continue;
            };
            rasterizer.push_transform(placement.matrix());
            render_model(&r.model, r.textures, rasterizer);
            rasterizer.pop_transform();
        }
    }
}

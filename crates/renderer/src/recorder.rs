//! Rasterizer that records every call, for tests and frame diagnostics.

use asset::{
    Material, Topology,
    mesh::{Normal, Position, TexCoord},
};
use glam::Mat4;

use crate::Rasterizer;

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    EnableTexturing,
    DisableTexturing,
    /// Material name.
    ApplyMaterial(String),
    Begin(Topology),
    TexCoord(TexCoord),
    Normal(Normal),
    Vertex(Position),
    End,
    PushTransform(Mat4),
    PopTransform,
}

#[derive(Debug, Default)]
pub struct CommandRecorder {
    commands: Vec<DrawCommand>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }

    /// Topology of every `begin`, in submission order.
    pub fn batch_topologies(&self) -> Vec<Topology> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Begin(t) => Some(*t),
                _ => None,
            })
            .collect()
    }

    pub fn vertex_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Vertex(_)))
            .count()
    }
}

impl Rasterizer for CommandRecorder {
    fn enable_texturing(&mut self) {
        self.commands.push(DrawCommand::EnableTexturing);
    }

    fn disable_texturing(&mut self) {
        self.commands.push(DrawCommand::DisableTexturing);
    }

    fn apply_material(&mut self, material: &Material) {
        self.commands
            .push(DrawCommand::ApplyMaterial(material.name.clone()));
    }

    fn begin(&mut self, topology: Topology) {
        self.commands.push(DrawCommand::Begin(topology));
    }

    fn tex_coord(&mut self, uv: TexCoord) {
        self.commands.push(DrawCommand::TexCoord(uv));
    }

    fn normal(&mut self, normal: Normal) {
        self.commands.push(DrawCommand::Normal(normal));
    }

    fn vertex(&mut self, position: Position) {
        self.commands.push(DrawCommand::Vertex(position));
    }

    fn end(&mut self) {
        self.commands.push(DrawCommand::End);
    }

    fn push_transform(&mut self, transform: Mat4) {
        self.commands.push(DrawCommand::PushTransform(transform));
    }

    fn pop_transform(&mut self) {
        self.commands.push(DrawCommand::PopTransform);
    }
}

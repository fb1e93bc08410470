//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position (pixels) and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Colors for game elements
pub mod colors {
    /// Opaque color from a 0xRRGGBB literal
    pub const fn rgb(hex: u32) -> [f32; 4] {
        [
            ((hex >> 16) & 0xff) as f32 / 255.0,
            ((hex >> 8) & 0xff) as f32 / 255.0,
            (hex & 0xff) as f32 / 255.0,
            1.0,
        ]
    }

    /// Same color with a different alpha
    pub const fn with_alpha(color: [f32; 4], alpha: f32) -> [f32; 4] {
        [color[0], color[1], color[2], alpha]
    }

    // Runner modes
    pub const SKY: [f32; 4] = rgb(0x0f172a);
    pub const GROUND: [f32; 4] = rgb(0x1e1b4b);
    pub const GROUND_LINE: [f32; 4] = rgb(0x312e81);
    pub const SPIKE: [f32; 4] = rgb(0xf43f5e);
    pub const COIN: [f32; 4] = rgb(0xfbbf24);
    pub const PORTAL: [f32; 4] = rgb(0xa855f7);
    pub const COMB: [f32; 4] = rgb(0xef4444);
    pub const BEAK: [f32; 4] = rgb(0xf59e0b);
    pub const EYE: [f32; 4] = rgb(0x000000);
    pub const FADE: [f32; 4] = rgb(0xffffff);

    // Boss mode
    pub const ARENA: [f32; 4] = rgb(0x111827);
    pub const GRID: [f32; 4] = [1.0, 1.0, 1.0, 0.03];
    pub const BOSS: [f32; 4] = rgb(0xdc2626);
    pub const BOSS_SPARED: [f32; 4] = rgb(0x22c55e);
    pub const BOSS_SHOT: [f32; 4] = rgb(0xef4444);
    pub const PLAYER_SHOT: [f32; 4] = rgb(0xfbbf24);
    pub const BLASTER: [f32; 4] = rgb(0x374151);
    pub const EXPLOSION: [f32; 4] = rgb(0xfacc15);
    pub const HEALTH: [f32; 4] = rgb(0x10b981);
    pub const BOSS_HEALTH: [f32; 4] = rgb(0xff0000);
    pub const BAR_BACK: [f32; 4] = rgb(0x000000);
    pub const DIM: [f32; 4] = [0.0, 0.0, 0.0, 0.85];

}

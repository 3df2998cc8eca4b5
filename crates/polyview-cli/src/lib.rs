//! # Polyview CLI
//!
//! Command-line interface for the Polyview mesh pipeline.
//!
//! ## Commands
//! - `stats` - Tessellate a primitive and report its draw groups
//! - `bounds` - Report the bounding box of a transformed primitive

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use glam::{Mat4, Quat, Vec3};
use polyview_assets::{GpuTextureRegistry, ImageProvider, StaticData};
use polyview_core::{FaceId, ImageBuffer, Mesh, MeshTessellator, VertexColor, primitives};
use polyview_renderer::{Renderer, RendererConfig, RecordingSink};
use serde::Serialize;

/// Polyview mesh pipeline CLI
#[derive(Parser)]
#[command(name = "polyview")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Tessellate a primitive and report its stream sets
    Stats {
        #[command(flatten)]
        shape: ShapeArgs,

        /// Alternate two textures across faces
        #[arg(long)]
        textured: bool,

        /// Shade vertices by face normal
        #[arg(long)]
        colored: bool,
    },

    /// Report the bounding box of a transformed primitive
    Bounds {
        #[command(flatten)]
        shape: ShapeArgs,

        /// Translation as x,y,z
        #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
        translate: Option<Vec3>,

        /// Uniform scale
        #[arg(long, default_value = "1.0")]
        scale: f32,

        /// Rotation about Y in degrees
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        rotate_y: f32,

        /// Use the mesh's convex hull for the bounds
        #[arg(long)]
        hull: bool,
    },
}

/// Built-in primitive shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Quad,
    Cube,
    Prism,
}

/// Primitive selection shared by all commands
#[derive(Debug, Clone, Args)]
pub struct ShapeArgs {
    /// Primitive to build
    #[arg(short, long, value_enum)]
    pub shape: Shape,

    /// Edge length, or diameter for prisms
    #[arg(long, default_value = "1.0")]
    pub size: f32,

    /// Number of prism sides
    #[arg(long, default_value = "6")]
    pub sides: u32,
}

impl ShapeArgs {
    /// Build the selected primitive
    pub fn build(&self) -> Mesh {
        match self.shape {
            Shape::Quad => primitives::quad(self.size),
            Shape::Cube => primitives::cube(self.size),
            Shape::Prism => primitives::prism(self.sides, self.size * 0.5, self.size),
        }
    }
}

fn parse_vec3(value: &str) -> Result<Vec3, String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| format!("invalid number in '{value}': {err}"))?;
    match parts.as_slice() {
        &[x, y, z] => Ok(Vec3::new(x, y, z)),
        _ => Err(format!("expected x,y,z but got '{value}'")),
    }
}

/// One stream set in a `stats` report
#[derive(Debug, Serialize)]
pub struct StreamSetReport {
    pub texture: Option<u32>,
    pub vertex_colors: bool,
    pub vertices: usize,
    pub triangles: usize,
}

/// Output of the `stats` command
#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub shape: Shape,
    pub vertices: usize,
    pub faces: usize,
    pub change_count: u64,
    pub stream_sets: Vec<StreamSetReport>,
    pub draw_calls: u32,
    pub triangles: u32,
    pub textures_bound: u32,
    pub uploads: u32,
    pub bytes_submitted: usize,
}

/// Output of the `bounds` command
#[derive(Debug, Serialize)]
pub struct BoundsReport {
    pub shape: Shape,
    pub source: &'static str,
    pub min: Vec3,
    pub max: Vec3,
    pub center: Vec3,
    pub size: Vec3,
}

fn normal_color(normal: Vec3) -> VertexColor {
    let rgb = (normal * 0.5 + Vec3::splat(0.5)) * 255.0;
    VertexColor::new(rgb.x as u8, rgb.y as u8, rgb.z as u8)
}

/// Tessellate and draw one frame of the selected primitive
pub fn stats(shape: &ShapeArgs, textured: bool, colored: bool) -> Result<StatsReport> {
    let mut mesh = shape.build();

    if textured {
        let data = StaticData::default();
        data.insert("checker_light.png", ImageBuffer::filled(8, 8, [220, 220, 220, 255]));
        data.insert("checker_dark.png", ImageBuffer::filled(8, 8, [40, 40, 40, 255]));
        let textures = [
            data.load_texture(Path::new("checker_light.png"))?,
            data.load_texture(Path::new("checker_dark.png"))?,
        ];
        for face in 0..mesh.face_count() {
            let texture = textures[(face / 2) % textures.len()].clone();
            mesh.set_face_texture(FaceId(face as u32), Some(texture))
                .context("assigning face texture")?;
        }
    }

    let registry = Arc::new(GpuTextureRegistry::new());
    let tessellator = MeshTessellator::new(registry.as_ref());
    let color_fn = normal_color;
    let tessellator = if colored {
        tessellator.with_vertex_colors(&color_fn)
    } else {
        tessellator
    };

    let mut renderer = Renderer::new(RendererConfig::default(), registry.clone());
    let mut sink = RecordingSink::new();
    renderer.begin_frame(&mut sink);
    let streams = renderer.draw_mesh(&mesh, &tessellator, &mut sink)?;
    renderer.end_frame();

    let stats = renderer.stats();
    Ok(StatsReport {
        shape: shape.shape,
        vertices: mesh.vertex_count(),
        faces: mesh.face_count(),
        change_count: mesh.change_count(),
        stream_sets: streams
            .iter()
            .map(|set| StreamSetReport {
                texture: set.gpu_texture().map(|handle| handle.0),
                vertex_colors: set.use_vertex_colors(),
                vertices: set.vertex_count(),
                triangles: set.triangle_count(),
            })
            .collect(),
        draw_calls: stats.draw_calls,
        triangles: stats.triangles,
        textures_bound: stats.textures_bound,
        uploads: stats.uploads,
        bytes_submitted: sink.bytes_submitted(),
    })
}

/// Bounds of the selected primitive under translate * rotate * scale
pub fn bounds(shape: &ShapeArgs, translate: Vec3, scale: f32, rotate_y: f32, hull: bool) -> BoundsReport {
    let mut mesh = shape.build();
    if hull {
        // Primitives are convex, so their vertices are their hull.
        mesh.set_convex_hull(Some(mesh.vertices().to_vec()));
    }

    let transform = Mat4::from_scale_rotation_translation(
        Vec3::splat(scale),
        Quat::from_rotation_y(rotate_y.to_radians()),
        translate,
    );
    let aabb = mesh.bounds(transform);
    log::debug!("Bounds recomputed {} time(s)", mesh.bounds_cache().recompute_count());

    BoundsReport {
        shape: shape.shape,
        source: if mesh.convex_hull().is_some() { "hull" } else { "vertices" },
        min: aabb.min,
        max: aabb.max,
        center: aabb.center(),
        size: aabb.size(),
    }
}

/// Execute the CLI command
pub fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let json = match cli.command {
        Commands::Stats { shape, textured, colored } => {
            log::info!("Tessellating {:?}...", shape.shape);
            serde_json::to_string_pretty(&stats(&shape, textured, colored)?)?
        }

        Commands::Bounds { shape, translate, scale, rotate_y, hull } => {
            log::info!("Computing bounds of {:?}...", shape.shape);
            let report = bounds(&shape, translate.unwrap_or(Vec3::ZERO), scale, rotate_y, hull);
            serde_json::to_string_pretty(&report)?
        }
    };

    println!("{json}");
    Ok(())
}

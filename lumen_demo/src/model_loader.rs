//! OBJ model import.
//!
//! Turns a Wavefront OBJ file (plus its MTL materials) into `MeshData`
//! ready for upload: positions, colors, flipped UVs, normals and tangents,
//! and up to five decoded material textures. Normals are generated when
//! the file has none; tangents are always derived from the UV layout.

use std::path::{Path, PathBuf};

use lumen_engine::glam::{Vec2, Vec3};
use lumen_engine::lumen::resource::{MeshData, RawImage, TextureKind, Vertex};
use lumen_engine::{engine_info, engine_warn};

const LOADER_SOURCE: &str = "lumen::ModelLoader";

/// Color used when even the default albedo texture cannot be decoded
const FALLBACK_ALBEDO: [u8; 4] = [255, 255, 255, 255];

/// MTL keys (beyond the ones tobj parses itself) per material channel
const NORMAL_KEYS: [&str; 3] = ["map_Bump", "map_bump", "bump"];
const METALLIC_KEYS: [&str; 1] = ["map_Pm"];
const ROUGHNESS_KEYS: [&str; 1] = ["map_Pr"];
const AO_KEYS: [&str; 1] = ["map_AO"];

/// Loads meshes and their textures from disk
pub struct ModelLoader {
    default_albedo_path: PathBuf,
}

impl ModelLoader {
    pub fn new(default_albedo_path: impl Into<PathBuf>) -> Self {
        Self { default_albedo_path: default_albedo_path.into() }
    }

    /// Load every mesh of an OBJ file
    ///
    /// A missing or unparseable file yields no meshes (logged as a warning).
    /// Every returned mesh has an albedo texture.
    pub fn load(&self, path: &Path) -> Vec<MeshData> {
        let options = tobj::LoadOptions {
            single_index: true,
            triangulate: true,
            ..Default::default()
        };

        let (models, materials) = match tobj::load_obj(path, &options) {
            Ok(loaded) => loaded,
            Err(e) => {
                engine_warn!(LOADER_SOURCE, "Failed to load model '{}': {}", path.display(), e);
                return Vec::new();
            }
        };
        let materials = materials.unwrap_or_else(|e| {
            engine_warn!(LOADER_SOURCE, "No materials for '{}': {}", path.display(), e);
            Vec::new()
        });
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let meshes: Vec<MeshData> = models
            .into_iter()
            .filter(|model| !model.mesh.indices.is_empty())
            .map(|model| {
                let material = model.mesh.material_id.and_then(|id| materials.get(id));
                let mut data = MeshData {
                    name: model.name.clone(),
                    vertices: build_vertices(&model.mesh),
                    indices: model.mesh.indices.clone(),
                    textures: Default::default(),
                };
                self.load_textures(&mut data, material, &directory);
                data
            })
            .collect();

        engine_info!(LOADER_SOURCE, "Loaded {} meshes from '{}'", meshes.len(), path.display());
        meshes
    }

    fn load_textures(&self, data: &mut MeshData, material: Option<&tobj::Material>, directory: &Path) {
        if let Some(material) = material {
            let lookup = |keys: &[&str]| {
                keys.iter()
                    .find_map(|key| material.unknown_param.get(*key))
                    .cloned()
            };
            let channels = [
                (TextureKind::Albedo, material.diffuse_texture.clone()),
                (TextureKind::Normal, material.normal_texture.clone().or_else(|| lookup(&NORMAL_KEYS))),
                (TextureKind::Metallic, lookup(&METALLIC_KEYS)),
                (TextureKind::Roughness, lookup(&ROUGHNESS_KEYS)),
                (TextureKind::Ao, lookup(&AO_KEYS).or_else(|| material.ambient_texture.clone())),
            ];

            for (kind, file) in channels {
                if let Some(image) = file.and_then(|file| decode_image(&directory.join(file))) {
                    data.set_texture(kind, image);
                }
            }
        }

        if data.textures[TextureKind::Albedo.index()].is_none() {
            let albedo = decode_image(&self.default_albedo_path).unwrap_or_else(|| {
                engine_warn!(
                    LOADER_SOURCE,
                    "Default albedo '{}' unavailable, using a white texture",
                    self.default_albedo_path.display()
                );
                RawImage::solid(1, 1, FALLBACK_ALBEDO)
            });
            data.set_texture(TextureKind::Albedo, albedo);
        }
    }
}

/// Decode any supported image file to RGBA8
fn decode_image(path: &Path) -> Option<RawImage> {
    match image::open(path) {
        Ok(image) => {
            let rgba = image.into_rgba8();
            let (width, height) = rgba.dimensions();
            Some(RawImage { width, height, pixels: rgba.into_raw() })
        }
        Err(e) => {
            engine_warn!(LOADER_SOURCE, "Failed to decode texture '{}': {}", path.display(), e);
            None
        }
    }
}

fn build_vertices(mesh: &tobj::Mesh) -> Vec<Vertex> {
    let positions: Vec<Vec3> = mesh.positions.chunks_exact(3).map(Vec3::from_slice).collect();
    let uvs: Vec<Vec2> = if mesh.texcoords.len() / 2 == positions.len() {
        // OBJ puts the texture origin bottom-left
        mesh.texcoords
            .chunks_exact(2)
            .map(|uv| Vec2::new(uv[0], 1.0 - uv[1]))
            .collect()
    } else {
        vec![Vec2::ZERO; positions.len()]
    };
    let normals: Vec<Vec3> = if mesh.normals.len() == mesh.positions.len() {
        mesh.normals.chunks_exact(3).map(Vec3::from_slice).collect()
    } else {
        compute_normals(&positions, &mesh.indices)
    };
    let tangents = compute_tangents(&positions, &uvs, &normals, &mesh.indices);
    let has_colors = mesh.vertex_color.len() == mesh.positions.len();

    (0..positions.len())
        .map(|i| Vertex {
            position: positions[i].to_array(),
            color: if has_colors {
                [mesh.vertex_color[i * 3], mesh.vertex_color[i * 3 + 1], mesh.vertex_color[i * 3 + 2]]
            } else {
                [1.0, 1.0, 1.0]
            },
            uv: uvs[i].to_array(),
            normal: normals[i].to_array(),
            tangent: tangents[i].to_array(),
        })
        .collect()
}

/// Area-weighted smooth normals
pub fn compute_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals.into_iter().map(|n| n.normalize_or_zero()).collect()
}

/// Per-vertex tangents from UV gradients, orthogonalized against the normal
///
/// Vertices whose triangles have degenerate UVs get a zero tangent.
pub fn compute_tangents(positions: &[Vec3], uvs: &[Vec2], normals: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut tangents = vec![Vec3::ZERO; positions.len()];
    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let edge1 = positions[b] - positions[a];
        let edge2 = positions[c] - positions[a];
        let duv1 = uvs[b] - uvs[a];
        let duv2 = uvs[c] - uvs[a];

        let det = duv1.x * duv2.y - duv2.x * duv1.y;
        if det.abs() < f32::EPSILON {
            continue;
        }
        let tangent = (edge1 * duv2.y - edge2 * duv1.y) / det;
        tangents[a] += tangent;
        tangents[b] += tangent;
        tangents[c] += tangent;
    }

    tangents
        .into_iter()
        .zip(normals)
        .map(|(t, &n)| (t - n * n.dot(t)).normalize_or_zero())
        .collect()
}

#[cfg(test)]
#[path = "model_loader_tests.rs"]
mod tests;

//! Unit tests for model_loader.rs

use std::fs;
use std::path::PathBuf;

use lumen_engine::glam::{Vec2, Vec3};
use lumen_engine::lumen::resource::TextureKind;

use super::*;

const EPS: f32 = 1e-5;

/// Write `contents` to a fresh file under the system temp directory
fn write_temp_obj(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lumen_demo_{}_{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{}.obj", name));
    fs::write(&path, contents).unwrap();
    path
}

/// Unit quad in the XY plane with UVs following X and Y
const QUAD_OBJ: &str = "\
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1/1 2/2 3/3
f 1/1 3/3 4/4
";

// ============================================================================
// NORMAL / TANGENT TESTS
// ============================================================================

#[test]
fn test_compute_normals_counter_clockwise_faces_positive_z() {
    let positions = [Vec3::ZERO, Vec3::X, Vec3::Y];
    let normals = compute_normals(&positions, &[0, 1, 2]);
    for n in normals {
        assert!((n - Vec3::Z).length() < EPS);
    }
}

#[test]
fn test_compute_normals_unreferenced_vertex_is_zero() {
    let positions = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::ONE];
    let normals = compute_normals(&positions, &[0, 1, 2]);
    assert_eq!(normals[3], Vec3::ZERO);
}

#[test]
fn test_compute_tangents_follow_u_direction() {
    let positions = [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0)];
    let uvs = [Vec2::ZERO, Vec2::X, Vec2::ONE];
    let normals = [Vec3::Z; 3];
    let tangents = compute_tangents(&positions, &uvs, &normals, &[0, 1, 2]);
    for t in tangents {
        assert!((t - Vec3::X).length() < EPS);
    }
}

#[test]
fn test_compute_tangents_degenerate_uvs_give_zero() {
    let positions = [Vec3::ZERO, Vec3::X, Vec3::Y];
    let uvs = [Vec2::ZERO; 3];
    let normals = [Vec3::Z; 3];
    let tangents = compute_tangents(&positions, &uvs, &normals, &[0, 1, 2]);
    assert!(tangents.iter().all(|t| *t == Vec3::ZERO));
}

#[test]
fn test_compute_tangents_are_orthogonal_to_normal() {
    let positions = [Vec3::ZERO, Vec3::X, Vec3::Y];
    let uvs = [Vec2::ZERO, Vec2::X, Vec2::Y];
    // Tilted normal: the raw tangent (+X) must lose its normal component
    let n = Vec3::new(0.5, 0.0, 1.0).normalize();
    let tangents = compute_tangents(&positions, &uvs, &[n; 3], &[0, 1, 2]);
    for t in tangents {
        assert!(t.dot(n).abs() < EPS);
        assert!((t.length() - 1.0).abs() < EPS);
    }
}

// ============================================================================
// LOADING TESTS
// ============================================================================

#[test]
fn test_missing_file_yields_no_meshes() {
    let loader = ModelLoader::new("does/not/exist.png");
    let meshes = loader.load(Path::new("does/not/exist.obj"));
    assert!(meshes.is_empty());
}

#[test]
fn test_load_quad_with_fallback_albedo() {
    let path = write_temp_obj("quad", QUAD_OBJ);
    let loader = ModelLoader::new("does/not/exist.png");

    let meshes = loader.load(&path);
    assert_eq!(meshes.len(), 1);

    let mesh = &meshes[0];
    assert_eq!(mesh.indices.len(), 6);
    assert_eq!(mesh.vertices.len(), 4);

    // Albedo always present, white 1x1 when the default cannot be decoded
    let albedo = mesh.textures[TextureKind::Albedo.index()].as_ref().unwrap();
    assert_eq!((albedo.width, albedo.height), (1, 1));
    assert_eq!(albedo.pixels, vec![255, 255, 255, 255]);
    assert!(mesh.textures[TextureKind::Normal.index()].is_none());

    // Normals were generated, UVs flipped, tangents along +X
    for vertex in &mesh.vertices {
        assert!((Vec3::from(vertex.normal) - Vec3::Z).length() < EPS);
        assert!((Vec3::from(vertex.tangent) - Vec3::X).length() < EPS);
        assert_eq!(vertex.color, [1.0, 1.0, 1.0]);
    }
    let origin = mesh
        .vertices
        .iter()
        .find(|v| v.position == [0.0, 0.0, 0.0])
        .unwrap();
    assert_eq!(origin.uv, [0.0, 1.0]);

    fs::remove_dir_all(path.parent().unwrap()).ok();
}

#[test]
fn test_unparseable_file_yields_no_meshes() {
    let path = write_temp_obj("garbage", "f 9/9 10/10 11/11\n");
    let loader = ModelLoader::new("does/not/exist.png");
    assert!(loader.load(&path).is_empty());
    fs::remove_dir_all(path.parent().unwrap()).ok();
}

//! Scene assembly from the glTF export.
//!
//! Meshes are matched by node name: `portal` gets the portal shader,
//! `poleLightA`..`poleLightE` the warm lamp color, `bottom` the dark base,
//! and everything else the baked lightmap. The portal and the base are
//! required; a missing pole light is skipped with a warning.

use glam::Mat4;

use crate::assets::ModelData;

/// Names the model must contain.
const REQUIRED_MESHES: [&str; 2] = ["portal", "bottom"];

/// The five lamp heads, each optional.
const POLE_LIGHTS: [&str; 5] = [
    "poleLightA",
    "poleLightB",
    "poleLightC",
    "poleLightD",
    "poleLightE",
];

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("mesh {0:?} is missing vertex positions")]
    MissingPositions(String),
    #[error("required mesh {0:?} not found in the model")]
    MissingMesh(&'static str),
}

/// How a mesh is shaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshRole {
    /// Baked-lightmap texture.
    Baked,
    /// Warm emissive lamp head.
    PoleLight,
    /// Dark diorama base.
    Bottom,
    /// Animated portal disk.
    Portal,
}

/// One extracted mesh, in world space.
pub struct MeshData {
    pub name: String,
    pub role: MeshRole,
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

/// All meshes extracted from the model.
pub struct SceneMeshes {
    pub meshes: Vec<MeshData>,
}

fn role_for(name: &str) -> MeshRole {
    match name {
        "portal" => MeshRole::Portal,
        "bottom" => MeshRole::Bottom,
        n if n.starts_with("poleLight") => MeshRole::PoleLight,
        _ => MeshRole::Baked,
    }
}

/// Extract every mesh from the imported document, flattening node
/// transforms into world-space positions.
pub fn extract(model: &ModelData) -> Result<SceneMeshes, SceneError> {
    let mut meshes = Vec::new();

    for gltf_scene in model.document.scenes() {
        for node in gltf_scene.nodes() {
            process_node(&node, &model.buffers, Mat4::IDENTITY, &mut meshes)?;
        }
    }

    for required in REQUIRED_MESHES {
        if !meshes.iter().any(|m| m.name == required) {
            return Err(SceneError::MissingMesh(required));
        }
    }
    for lamp in POLE_LIGHTS {
        if !meshes.iter().any(|m| m.name == lamp) {
            tracing::warn!("pole light {lamp:?} missing from the model, skipping");
        }
    }

    tracing::info!(
        "scene assembled: {} meshes, {} baked",
        meshes.len(),
        meshes.iter().filter(|m| m.role == MeshRole::Baked).count(),
    );

    Ok(SceneMeshes { meshes })
}

fn process_node(
    node: &gltf::Node,
    buffers: &[gltf::buffer::Data],
    parent: Mat4,
    meshes: &mut Vec<MeshData>,
) -> Result<(), SceneError> {
    let transform = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        let name = node
            .name()
            .or_else(|| mesh.name())
            .unwrap_or("unnamed")
            .to_string();
        let role = role_for(&name);

        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .ok_or_else(|| SceneError::MissingPositions(name.clone()))?
                .map(|p| {
                    transform
                        .transform_point3(glam::Vec3::from_array(p))
                        .to_array()
                })
                .collect();

            let uvs: Vec<[f32; 2]> = reader
                .read_tex_coords(0)
                .map(|iter| iter.into_f32().collect())
                .unwrap_or_else(|| vec![[0.0, 0.0]; positions.len()]);

            let indices: Vec<u32> = reader
                .read_indices()
                .map(|iter| iter.into_u32().collect())
                .unwrap_or_else(|| (0..positions.len() as u32).collect());

            meshes.push(MeshData {
                name: name.clone(),
                role,
                positions,
                uvs,
                indices,
            });
        }
    }

    for child in node.children() {
        process_node(&child, buffers, transform, meshes)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_match_by_name() {
        assert_eq!(role_for("portal"), MeshRole::Portal);
        assert_eq!(role_for("bottom"), MeshRole::Bottom);
        assert_eq!(role_for("poleLightA"), MeshRole::PoleLight);
        assert_eq!(role_for("poleLightE"), MeshRole::PoleLight);
        assert_eq!(role_for("terrain"), MeshRole::Baked);
        assert_eq!(role_for("portalFrame"), MeshRole::Baked);
    }
}

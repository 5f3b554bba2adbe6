//! Wavefront OBJ meshes as triangle soups.

use std::path::Path;
use std::sync::Arc;

use lumen_renderer::{Hittable, Material, Triangle, Vec3};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Failed to load OBJ {path}: {source}")]
    Obj {
        path: String,
        #[source]
        source: tobj::LoadError,
    },

    #[error("OBJ {0} contains no triangles")]
    Empty(String),
}

/// Placement applied to every vertex of a loaded mesh.
#[derive(Debug, Clone, Copy)]
pub struct Placement {
    pub scale: f32,
    pub offset: Vec3,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec3::ZERO,
        }
    }
}

impl Placement {
    fn apply(&self, p: Vec3) -> Vec3 {
        p * self.scale + self.offset
    }
}

/// Load every model in an OBJ file as triangles sharing `material`.
pub fn load_obj(
    path: &Path,
    placement: Placement,
    material: Arc<dyn Material>,
) -> Result<Vec<Box<dyn Hittable>>, SceneError> {
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            single_index: true,
            triangulate: true,
            ..Default::default()
        },
    )
    .map_err(|source| SceneError::Obj {
        path: path.display().to_string(),
        source,
    })?;

    let mut triangles: Vec<Box<dyn Hittable>> = Vec::new();
    for model in &models {
        let mesh = &model.mesh;
        let vertex = |index: u32| {
            let i = index as usize * 3;
            placement.apply(Vec3::new(
                mesh.positions[i],
                mesh.positions[i + 1],
                mesh.positions[i + 2],
            ))
        };

        for face in mesh.indices.chunks_exact(3) {
            triangles.push(Box::new(Triangle::new(
                vertex(face[0]),
                vertex(face[1]),
                vertex(face[2]),
                material.clone(),
            )));
        }

        log::debug!(
            "OBJ model '{}': {} vertices, {} triangles",
            model.name,
            mesh.positions.len() / 3,
            mesh.indices.len() / 3
        );
    }

    if triangles.is_empty() {
        return Err(SceneError::Empty(path.display().to_string()));
    }

    log::info!("Loaded {} triangles from {}", triangles.len(), path.display());
    Ok(triangles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_renderer::{Lambertian, Ray};
    use std::path::PathBuf;

    fn write_obj(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("lumen_{}_{name}.obj", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn grey() -> Arc<dyn Material> {
        Arc::new(Lambertian::new(Vec3::splat(0.5)))
    }

    #[test]
    fn test_quad_is_triangulated_and_placed() {
        let path = write_obj(
            "quad",
            "v -1 0 -1\nv 1 0 -1\nv 1 0 1\nv -1 0 1\nf 1 2 3 4\n",
        );
        let placement = Placement {
            scale: 2.0,
            offset: Vec3::new(0.0, 5.0, 0.0),
        };
        let triangles = load_obj(&path, placement, grey()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(triangles.len(), 2);

        let down = Ray::new(Vec3::new(1.5, 10.0, 1.5), -Vec3::Y);
        let hit = triangles.iter().find_map(|t| t.hit(&down)).unwrap();
        assert!((hit.p.y - 5.0).abs() < 1e-4);

        // Outside the scaled footprint.
        let miss = Ray::new(Vec3::new(2.5, 10.0, 0.0), -Vec3::Y);
        assert!(triangles.iter().all(|t| t.hit(&miss).is_none()));
    }

    #[test]
    fn test_file_without_faces_is_rejected() {
        let path = write_obj("points", "v 0 0 0\nv 1 0 0\nv 0 1 0\n");
        let result = load_obj(&path, Placement::default(), grey());
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(SceneError::Empty(_))));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let path = Path::new("/nonexistent/lumen/mesh.obj");
        let err = load_obj(path, Placement::default(), grey()).err().expect("expected load_obj to fail");
        assert!(err.to_string().contains("mesh.obj"));
    }
}

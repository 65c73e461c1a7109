//! Track scene - the meshes currently realized for a track.
//!
//! Switching scenarios rebuilds every mesh. Mesh slots are handed back to a
//! tagged pool on clear and picked up again by the next realization.

use nalgebra::Vector3;
use tracing::debug;

use trackvisu_core::{StripMesh, Track, TrackDesign, TrackMesh};
use trackvisu_env::{Pooled, ResourcePool, ResourceTag, TaggedPool};

pub struct TrackScene {
    design: TrackDesign,
    lane_width: f64,
    scale: Vector3<f64>,
    pool: TaggedPool<TrackMesh>,
    active: Vec<Pooled<TrackMesh>>,
}

impl TrackScene {
    pub fn new(design: TrackDesign, lane_width: f64) -> Self {
        Self {
            design,
            lane_width,
            scale: Vector3::new(1.0, 1.0, 1.0),
            pool: TaggedPool::new(),
            active: Vec::new(),
        }
    }

    pub fn with_scale(mut self, scale: Vector3<f64>) -> Self {
        self.scale = scale;
        self
    }

    /// Replaces the current meshes with those of `track`; returns the mesh
    /// count.
    pub fn realize(&mut self, track: &Track) -> usize {
        self.clear();

        for built in self.design.build_track_meshes(track, self.lane_width, self.scale) {
            let tag = ResourceTag::from(built.kind.name());
            let mut slot = self.pool.acquire(&tag, || TrackMesh {
                kind: built.kind,
                lane_index: built.lane_index,
                mesh: StripMesh::default(),
            });
            *slot = built;
            self.active.push(slot);
        }

        debug!(
            "Realized {} meshes ({} created, {} reused so far)",
            self.active.len(),
            self.pool.created(),
            self.pool.reused()
        );
        self.active.len()
    }

    /// Returns every active mesh slot to the pool.
    pub fn clear(&mut self) {
        for slot in self.active.drain(..) {
            self.pool.release(slot);
        }
    }

    pub fn meshes(&self) -> impl Iterator<Item = &TrackMesh> {
        self.active.iter().map(|slot| &**slot)
    }

    /// Owned copies of the active meshes, e.g. for export.
    pub fn to_meshes(&self) -> Vec<TrackMesh> {
        self.meshes().cloned().collect()
    }

    pub fn mesh_count(&self) -> usize {
        self.active.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes().map(|m| m.mesh.triangle_count()).sum()
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes().map(|m| m.mesh.vertices.len()).sum()
    }

    pub fn pool(&self) -> &TaggedPool<TrackMesh> {
        &self.pool
    }
}

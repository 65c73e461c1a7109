//! Exporters for playback frames (JSON) and track meshes (Wavefront OBJ).

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use trackvisu_core::{Pose, TrackMesh, VehicleRole};

/// A single frame of playback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackFrame {
    /// Playback time in seconds
    pub time_sec: f64,

    /// Vehicles that still have a pose at this time
    pub vehicles: Vec<VehiclePose>,
}

/// Interpolated pose of one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehiclePose {
    pub name: String,
    pub role: VehicleRole,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Orientation quaternion (x, y, z, w)
    pub rotation: [f64; 4],
    pub speed: f64,
}

impl VehiclePose {
    pub fn new(name: &str, role: VehicleRole, pose: &Pose) -> Self {
        let q = pose.orientation.quaternion();
        Self {
            name: name.to_string(),
            role,
            x: pose.position.x,
            y: pose.position.y,
            z: pose.position.z,
            rotation: [q.i, q.j, q.k, q.w],
            speed: pose.velocity.norm(),
        }
    }

    pub fn position(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn orientation(&self) -> UnitQuaternion<f64> {
        let [x, y, z, w] = self.rotation;
        trackvisu_core::easing::unit_quaternion_or_identity(x, y, z, w)
    }
}

/// Complete playback export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackExport {
    /// Scenario file the frames were computed from
    pub source: String,

    pub fps: f64,

    pub speed: f64,

    /// Time of the last frame in seconds
    pub duration_sec: f64,

    pub frames: Vec<PlaybackFrame>,
}

impl PlaybackExport {
    pub fn new(source: &str, fps: f64, speed: f64) -> Self {
        Self {
            source: source.to_string(),
            fps,
            speed,
            duration_sec: 0.0,
            frames: Vec::new(),
        }
    }

    pub fn add_frame(&mut self, frame: PlaybackFrame) {
        self.duration_sec = frame.time_sec;
        self.frames.push(frame);
    }

    pub fn write_to_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

/// Writes meshes as one OBJ object each, with normalized UVs.
pub fn write_obj<W: Write>(meshes: &[TrackMesh], out: &mut W) -> io::Result<()> {
    writeln!(out, "# trackvisu track meshes")?;
    let mut base = 1usize;

    for (index, track_mesh) in meshes.iter().enumerate() {
        let mesh = &track_mesh.mesh;
        writeln!(
            out,
            "o {}_{}_lane{}",
            track_mesh.kind.name().replace(' ', "_"),
            index,
            track_mesh.lane_index
        )?;

        for v in &mesh.vertices {
            writeln!(out, "v {:.4} {:.4} {:.4}", v.x, v.y, v.z)?;
        }
        for [u, v] in mesh.normalized_uvs() {
            writeln!(out, "vt {:.4} {:.4}", u, v)?;
        }
        for tri in mesh.indices.chunks_exact(3) {
            let (a, b, c) = (
                base + tri[0] as usize,
                base + tri[1] as usize,
                base + tri[2] as usize,
            );
            writeln!(out, "f {a}/{a} {b}/{b} {c}/{c}")?;
        }

        base += mesh.vertices.len();
    }

    Ok(())
}

pub fn write_obj_file(meshes: &[TrackMesh], path: impl AsRef<Path>) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_obj(meshes, &mut out)?;
    out.flush()
}

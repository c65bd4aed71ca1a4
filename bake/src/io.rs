use anyhow::{Context, Result, anyhow, bail};
use drape::deform::{Mesh, MorphTarget};
use drape::math::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use wavefront_obj::obj::{self, Primitive};

/// Loads every object of an OBJ file into one indexed triangle mesh.
/// Positions keep the file's vertex order; normals are kept only when every
/// corner of every triangle references the normal of the same index.
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    let path = path.as_ref();
    let obj_string = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let model = obj::parse(obj_string)
        .map_err(|e| anyhow!("{}:{}: {}", path.display(), e.line_number, e.message))?;
    if model.objects.is_empty() {
        bail!("{} contains no objects", path.display());
    }

    let name = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| model.objects[0].name.clone());
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut normals_aligned = true;
    let mut indices = Vec::new();

    for object in &model.objects {
        let base = positions.len();
        positions.extend(object.vertices.iter().map(|v| Vec3::new(v.x, v.y, v.z)));
        normals_aligned &= object.normals.len() == object.vertices.len();
        normals.extend(object.normals.iter().map(|n| Vec3::new(n.x, n.y, n.z)));

        for geometry in &object.geometry {
            for shape in &geometry.shapes {
                if let Primitive::Triangle(v0, v1, v2) = shape.primitive {
                    for (v, _, n) in [v0, v1, v2] {
                        normals_aligned &= n == Some(v);
                        indices.push(u32::try_from(base + v).context("vertex index exceeds u32")?);
                    }
                }
            }
        }
    }

    let mut mesh = Mesh::new(name, positions, indices);
    if normals_aligned {
        mesh.normals = normals;
    } else {
        mesh.recompute_normals();
    }
    Ok(mesh)
}

/// Writes positions, normals and triangles of `mesh` as a single OBJ object.
pub fn write_obj<P: AsRef<Path>>(path: P, mesh: &Mesh) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "o {}", mesh.name)?;
    for p in &mesh.positions {
        writeln!(out, "v {} {} {}", p.x, p.y, p.z)?;
    }
    let with_normals = mesh.normals.len() == mesh.positions.len();
    if with_normals {
        for n in &mesh.normals {
            writeln!(out, "vn {} {} {}", n.x, n.y, n.z)?;
        }
    }
    for tri in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] + 1, tri[1] + 1, tri[2] + 1];
        if with_normals {
            writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}")?;
        } else {
            writeln!(out, "f {a} {b} {c}")?;
        }
    }
    out.flush()?;
    Ok(())
}

pub fn load_morphs<P: AsRef<Path>>(path: P) -> Result<Vec<MorphTarget>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing morph targets in {}", path.display()))
}

pub fn write_morphs<P: AsRef<Path>>(path: P, targets: &[MorphTarget]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, targets)?;
    out.flush()?;
    Ok(())
}

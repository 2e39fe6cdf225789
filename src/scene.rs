//! A loaded glTF scene.
//!
//! The document is kept as a generic JSON tree so that members this crate
//! does not model (extensions, extras) are written back unchanged. The typed
//! `gltf-json` view is only used to check the document against the schema
//! and to find out which nodes carry a mesh.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use gltf_json::Root;
use gltf_json::validation::{self, Validate};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use crate::error::{Error, Result};
use crate::glb::{self, Glb};
use crate::rename::{self, EntityKind, MatchMode, Named, OperationReport, RenameOperation};


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// `.gltf`
    Json,
    /// `.glb`
    Binary,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Format::Json => f.write_str("glTF JSON"),
            Format::Binary => f.write_str("GLB"),
        }
    }
}


pub struct Scene {
    document: Value,
    bin: Option<Vec<u8>>,
    format: Format,
    /// Directory that relative buffer URIs resolve against.
    base_dir: PathBuf,
    /// Indices into `nodes` of the nodes that reference a mesh, ascending.
    mesh_nodes: Vec<usize>,
}

impl Scene {
    pub fn import(path: impl AsRef<Path>) -> Result<Scene> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| Error::Read {
            path: path.to_owned(),
            source,
        })?;
        let base_dir = match path.parent() {
            Some(dir) => dir.to_owned(),
            None => PathBuf::from("."),
        };
        let scene = Scene::open_bytes(&bytes, base_dir)?;
        info!("imported {} as {}", path.display(), scene.format);
        Ok(scene)
    }

    /// Parses a scene held in memory; the format is detected from content.
    pub fn open_bytes(bytes: &[u8], base_dir: impl Into<PathBuf>) -> Result<Scene> {
        let (json, bin, format) = if glb::is_glb(bytes) {
            let Glb { json, bin } = Glb::from_slice(bytes)?;
            (json, bin, Format::Binary)
        } else {
            (bytes.to_vec(), None, Format::Json)
        };

        // Some exporters pad the JSON chunk with NULs instead of spaces.
        let end = json.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        let document: Value = serde_json::from_slice(&json[..end])?;
        let root: Root = serde_json::from_slice(&json[..end])?;
        report_problems(&root);

        let mesh_nodes = root.nodes.iter()
            .enumerate()
            .filter(|(_, n)| n.mesh.is_some())
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        debug!("{} materials, {} of {} nodes carry a mesh",
            root.materials.len(), mesh_nodes.len(), root.nodes.len());

        Ok(Scene {
            document,
            bin,
            format,
            base_dir: base_dir.into(),
            mesh_nodes,
        })
    }

    /// Storage variant the scene was read from.
    pub fn format(&self) -> Format {
        self.format
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn material_names(&self) -> Vec<String> {
        self.names(EntityKind::Material)
    }

    pub fn mesh_node_names(&self) -> Vec<String> {
        self.names(EntityKind::Mesh)
    }

    fn names(&self, kind: EntityKind) -> Vec<String> {
        let items = match self.document.get(array_key(kind)).and_then(Value::as_array) {
            Some(items) => items,
            None => return Vec::new(),
        };
        items.iter()
            .enumerate()
            .filter(|(i, _)| kind == EntityKind::Material || self.mesh_nodes.binary_search(i).is_ok())
            .map(|(_, v)| v.get("name").and_then(Value::as_str).unwrap_or("").to_owned())
            .collect()
    }

    /// Materials, or mesh-carrying nodes, in document order.
    pub fn entities_mut(&mut self, kind: EntityKind) -> Vec<SceneEntity<'_>> {
        let Scene { document, mesh_nodes, .. } = self;
        let items = match document.get_mut(array_key(kind)).and_then(Value::as_array_mut) {
            Some(items) => items,
            None => return Vec::new(),
        };
        items.iter_mut()
            .enumerate()
            .filter(|(i, _)| kind == EntityKind::Material || mesh_nodes.binary_search(i).is_ok())
            .filter_map(|(_, v)| v.as_object_mut())
            .map(|object| SceneEntity { object })
            .collect()
    }

    /// Applies `ops` in order. Each operation sees the names left by the
    /// ones before it.
    pub fn rename(&mut self, ops: &[RenameOperation], mode: MatchMode) -> Vec<OperationReport> {
        let mut reports = Vec::with_capacity(ops.len());
        for op in ops {
            let mut entities = self.entities_mut(op.kind);
            debug!("{} {} -> {} over {} entities", op.kind, op.old, op.new, entities.len());
            reports.push(rename::apply_operation(&mut entities, op, mode));
        }
        reports
    }

    /// Serializes the scene in `format`.
    ///
    /// Converting glTF JSON to GLB moves the first buffer into the `BIN`
    /// chunk. Converting GLB to glTF JSON stores the `BIN` chunk as a base64
    /// data URI on the first buffer, unless that buffer already has a URI.
    pub fn to_bytes(&self, format: Format) -> Result<Vec<u8>> {
        let mut document = self.document.clone();
        match format {
            Format::Json => {
                if let Some(ref bin) = self.bin {
                    store_data_uri(&mut document, bin)?;
                }
                Ok(serde_json::to_vec_pretty(&document)?)
            },
            Format::Binary => {
                let bin = match self.bin {
                    Some(ref bin) => Some(bin.clone()),
                    None => embed_first_buffer(&mut document, &self.base_dir)?,
                };
                let json = serde_json::to_vec(&document)?;
                Ok(Glb { json, bin }.to_vec())
            },
        }
    }

    pub fn export(&self, path: impl AsRef<Path>, format: Format) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes(format)?;
        fs::write(path, &bytes).map_err(|source| Error::Write {
            path: path.to_owned(),
            source,
        })?;
        info!("wrote {} bytes of {} to {}", bytes.len(), format, path.display());
        Ok(())
    }
}

fn array_key(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Material => "materials",
        EntityKind::Mesh => "nodes",
    }
}

fn report_problems(root: &Root) {
    root.validate(root, gltf_json::Path::new, &mut |path: &dyn Fn() -> gltf_json::Path, err: validation::Error| {
        warn!("{}: {}", path().as_str(), err);
    });
}


/// A material or node object inside the scene document.
pub struct SceneEntity<'a> {
    object: &'a mut Map<String, Value>,
}

impl Named for SceneEntity<'_> {
    fn name(&self) -> &str {
        self.object.get("name").and_then(Value::as_str).unwrap_or("")
    }

    fn set_name(&mut self, name: String) {
        self.object.insert("name".to_owned(), Value::String(name));
    }
}


fn first_buffer(document: &mut Value) -> Option<&mut Map<String, Value>> {
    document.get_mut("buffers")
        .and_then(Value::as_array_mut)
        .and_then(|buffers| buffers.first_mut())
        .and_then(Value::as_object_mut)
}

/// Removes the first buffer's URI and returns the bytes it pointed at.
fn embed_first_buffer(document: &mut Value, base_dir: &Path) -> Result<Option<Vec<u8>>> {
    let buffer = match first_buffer(document) {
        Some(buffer) => buffer,
        None => return Ok(None),
    };
    let uri = match buffer.get("uri").and_then(Value::as_str) {
        Some(uri) => uri.to_owned(),
        None => return Ok(None),
    };

    let data = load_uri(&uri, base_dir)?;
    let byte_length = buffer.get("byteLength").and_then(Value::as_u64).unwrap_or(0);
    if (data.len() as u64) < byte_length {
        return Err(Error::Buffer(format!(
            "'{}' holds {} bytes, but byteLength is {}", short_uri(&uri), data.len(), byte_length)));
    }

    buffer.shift_remove("uri");
    debug!("embedded {} bytes from {}", data.len(), short_uri(&uri));
    Ok(Some(data))
}

fn store_data_uri(document: &mut Value, bin: &[u8]) -> Result<()> {
    let buffer = first_buffer(document)
        .ok_or_else(|| Error::Buffer("BIN chunk present but no buffer refers to it".into()))?;
    if let Some(uri) = buffer.get("uri").and_then(Value::as_str) {
        warn!("buffer 0 already points at {}; dropping the unreferenced BIN chunk", short_uri(uri));
        return Ok(());
    }
    let uri = format!("data:application/octet-stream;base64,{}", BASE64.encode(bin));
    buffer.insert("uri".to_owned(), Value::String(uri));
    Ok(())
}

fn load_uri(uri: &str, base_dir: &Path) -> Result<Vec<u8>> {
    if let Some(rest) = uri.strip_prefix("data:") {
        let (meta, payload) = rest.split_once(',')
            .ok_or_else(|| Error::Uri(short_uri(uri).to_owned()))?;
        if !meta.ends_with(";base64") {
            return Err(Error::Buffer("only base64 data URIs are supported".into()));
        }
        return BASE64.decode(payload)
            .map_err(|e| Error::Buffer(format!("bad base64 payload: {}", e)));
    }

    let decoded = urlencoding::decode(uri).map_err(|_| Error::Uri(uri.to_owned()))?;
    let path = base_dir.join(decoded.as_ref());
    fs::read(&path).map_err(|source| Error::Read { path, source })
}

/// Data URIs can be megabytes long; keep messages readable.
fn short_uri(uri: &str) -> &str {
    if uri.starts_with("data:") {
        uri.split(',').next().unwrap_or(uri)
    } else {
        uri
    }
}

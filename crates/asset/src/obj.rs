//! Wavefront OBJ loader producing grouped triangle/quad models.
//!
//! Supported statements: `v`, `vt`, `vn`, `g`, `f`, `mtllib`, `usemtl`.
//! Everything else (comments, `o`, `s`, `vp`, `l`, ...) is skipped.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    error::{Attribute, LoadError, LoadResult},
    lines::lossy_lines,
    material::{Material, MaterialLoader},
    mesh::{Face, FaceGrammar, FaceGroup, GeometryStore, Model, VertexRef},
};

/// Group name that never opens a group of its own.
const DEFAULT_GROUP: &str = "default";

/// Load an OBJ model from a file path. Material libraries are resolved
/// relative to the directory containing `path`.
pub fn load_obj_from_path(path: impl AsRef<Path>, materials: &impl MaterialLoader) -> LoadResult<Model> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| LoadError::io(path, e))?;
    let base_dir = path.parent().unwrap_or(Path::new(""));
    load_obj_from_reader(
        BufReader::new(file),
        &path.to_string_lossy(),
        base_dir,
        materials,
    )
}

/// Load an OBJ model from a [`BufRead`] implementation.
pub fn load_obj_from_reader<R: BufRead>(
    reader: R,
    source: &str,
    base_dir: &Path,
    materials: &impl MaterialLoader,
) -> LoadResult<Model> {
    let mut builder = ModelBuilder::new(source, base_dir);
    for (line_no, line) in lossy_lines(reader).enumerate() {
        let line = line.map_err(|e| LoadError::io(source, e))?;
        builder.line(line_no + 1, &line, materials)?;
    }
    Ok(builder.finish())
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_obj_from_str(contents: &str, materials: &impl MaterialLoader) -> LoadResult<Model> {
    load_obj_from_reader(io::Cursor::new(contents), "<memory>", Path::new(""), materials)
}

/// Accumulates parser state; turned into an immutable [`Model`] only after
/// the whole input was accepted.
struct ModelBuilder {
    source: PathBuf,
    base_dir: PathBuf,
    geometry: GeometryStore,
    groups: Vec<FaceGroup>,
    current_group: Option<usize>,
    has_texcoords: bool,
    has_normals: bool,
    /// Set by the first face; later faces must use the same grammar.
    locked_grammar: Option<FaceGrammar>,
    library: Vec<Arc<Material>>,
}

impl ModelBuilder {
    fn new(source: &str, base_dir: &Path) -> Self {
        Self {
            source: PathBuf::from(source),
            base_dir: base_dir.to_path_buf(),
            geometry: GeometryStore::default(),
            groups: Vec::new(),
            current_group: None,
            has_texcoords: false,
            has_normals: false,
            locked_grammar: None,
            library: Vec::new(),
        }
    }

    fn line(&mut self, line_no: usize, line: &str, materials: &impl MaterialLoader) -> LoadResult<()> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(());
        }

        let (tag, rest) = trimmed
            .split_once(char::is_whitespace)
            .map(|(t, r)| (t, r.trim()))
            .unwrap_or((trimmed, ""));

        match tag {
            "v" => {
                let mut parts = rest.split_whitespace();
                let x = self.parse_f32(parts.next(), line_no, "x coordinate")?;
                let y = self.parse_f32(parts.next(), line_no, "y coordinate")?;
                let z = self.parse_f32(parts.next(), line_no, "z coordinate")?;
                self.geometry.positions.push([x, y, z]);
            }
            "vt" => {
                let mut parts = rest.split_whitespace();
                let u = self.parse_f32(parts.next(), line_no, "u coordinate")?;
                let v = self.parse_f32(parts.next(), line_no, "v coordinate")?;
                self.declare_attribute(Attribute::TexCoord, line_no)?;
                self.geometry.texcoords.push([u, v]);
            }
            "vn" => {
                let mut parts = rest.split_whitespace();
                let nx = self.parse_f32(parts.next(), line_no, "nx coordinate")?;
                let ny = self.parse_f32(parts.next(), line_no, "ny coordinate")?;
                let nz = self.parse_f32(parts.next(), line_no, "nz coordinate")?;
                self.declare_attribute(Attribute::Normal, line_no)?;
                self.geometry.normals.push([nx, ny, nz]);
            }
            "g" => self.group(rest, line_no),
            "f" => self.face(rest, line_no)?,
            "mtllib" => self.material_library(rest, line_no, materials)?,
            "usemtl" => self.use_material(rest, line_no)?,
            _ => log::trace!("{}:{}: skipping '{}'", self.source.display(), line_no, tag),
        }
        Ok(())
    }

    fn finish(self) -> Model {
        let grammar = FaceGrammar::from_flags(self.has_texcoords, self.has_normals);
        Model::from_parts(
            self.source.to_string_lossy().into_owned(),
            self.geometry,
            self.groups,
            grammar,
        )
    }

    fn grammar(&self) -> FaceGrammar {
        FaceGrammar::from_flags(self.has_texcoords, self.has_normals)
    }

    /// First `vt`/`vn` flips the model-wide flag. Doing so after faces were
    /// parsed would give the model two grammars, which is rejected.
    fn declare_attribute(&mut self, attribute: Attribute, line_no: usize) -> LoadResult<()> {
        let flag = match attribute {
            Attribute::TexCoord => &mut self.has_texcoords,
            Attribute::Normal => &mut self.has_normals,
            Attribute::Position => return Ok(()),
        };
        if *flag {
            return Ok(());
        }
        if let Some(locked) = self.locked_grammar {
            return Err(LoadError::format(
                &self.source,
                line_no,
                format!(
                    "first {attribute} declared after faces using '{}' were parsed",
                    locked.pattern()
                ),
            ));
        }
        *flag = true;
        Ok(())
    }

    fn group(&mut self, name: &str, line_no: usize) {
        if name.is_empty() || name == DEFAULT_GROUP {
            log::debug!("{}:{}: ignoring default group", self.source.display(), line_no);
            return;
        }
        self.groups.push(FaceGroup::new(name));
        self.current_group = Some(self.groups.len() - 1);
    }

    fn face(&mut self, rest: &str, line_no: usize) -> LoadResult<()> {
        let grammar = self.grammar();
        self.locked_grammar = Some(grammar);

        let mut corners: Vec<VertexRef> = Vec::with_capacity(4);
        for token in rest.split_whitespace() {
            corners.push(self.parse_face_vertex(token, grammar, line_no)?);
        }

        let face = Face::new(&corners).ok_or_else(|| {
            LoadError::format(
                &self.source,
                line_no,
                format!("face has {} vertices, expected 3 or 4", corners.len()),
            )
        })?;

        let group = self.current_group_mut(line_no)?;
        group.faces.push(face);
        Ok(())
    }

    fn parse_face_vertex(&self, token: &str, grammar: FaceGrammar, line_no: usize) -> LoadResult<VertexRef> {
        let fields: Vec<&str> = token.split('/').collect();
        let malformed = || {
            LoadError::format(
                &self.source,
                line_no,
                format!("face vertex '{}' does not match '{}'", token, grammar.pattern()),
            )
        };

        let (pos, tex, norm) = match (grammar, fields.as_slice()) {
            (FaceGrammar::PositionOnly, [p]) => (*p, None, None),
            (FaceGrammar::PositionTexture, [p, t]) => (*p, Some(*t), None),
            (FaceGrammar::PositionNormal, [p, "", n]) => (*p, None, Some(*n)),
            (FaceGrammar::PositionTextureNormal, [p, t, n]) => (*p, Some(*t), Some(*n)),
            _ => return Err(malformed()),
        };

        let position = self.resolve_index(pos, Attribute::Position, line_no)?;
        let texcoord = tex
            .map(|t| self.resolve_index(t, Attribute::TexCoord, line_no))
            .transpose()?;
        let normal = norm
            .map(|n| self.resolve_index(n, Attribute::Normal, line_no))
            .transpose()?;

        Ok(VertexRef {
            position,
            texcoord,
            normal,
        })
    }

    /// One-based (or negative, end-relative) index to a checked zero-based one.
    fn resolve_index(&self, token: &str, attribute: Attribute, line_no: usize) -> LoadResult<u32> {
        let len = match attribute {
            Attribute::Position => self.geometry.positions.len(),
            Attribute::TexCoord => self.geometry.texcoords.len(),
            Attribute::Normal => self.geometry.normals.len(),
        };

        let raw = token.parse::<i64>().map_err(|_| {
            LoadError::format(
                &self.source,
                line_no,
                format!("invalid {attribute} index '{token}'"),
            )
        })?;
        if raw == 0 {
            return Err(LoadError::format(
                &self.source,
                line_no,
                format!("{attribute} indices are 1-based; found 0"),
            ));
        }

        let index = if raw > 0 { raw - 1 } else { len as i64 + raw };
        if index < 0 || index >= len as i64 {
            return Err(LoadError::IndexOutOfRange {
                path: self.source.clone(),
                line: line_no,
                attribute,
                index,
                len,
            });
        }

        u32::try_from(index).map_err(|_| {
            LoadError::format(
                &self.source,
                line_no,
                format!("{attribute} index {index} exceeds {}", u32::MAX),
            )
        })
    }

    fn material_library(&mut self, rest: &str, line_no: usize, materials: &impl MaterialLoader) -> LoadResult<()> {
        if rest.is_empty() {
            return Err(LoadError::format(&self.source, line_no, "mtllib without a file name"));
        }
        let mut library = Vec::new();
        for name in rest.split_whitespace() {
            let path = self.base_dir.join(name);
            library.extend(materials.load_library(&path)?);
        }
        self.library = library;
        Ok(())
    }

    fn use_material(&mut self, name: &str, line_no: usize) -> LoadResult<()> {
        let Some(material) = self.library.iter().find(|m| m.name == name).cloned() else {
            log::debug!(
                "{}:{}: material '{}' not found, ignoring",
                self.source.display(),
                line_no,
                name
            );
            return Ok(());
        };
        self.current_group_mut(line_no)?.material = Some(material);
        Ok(())
    }

    fn current_group_mut(&mut self, line_no: usize) -> LoadResult<&mut FaceGroup> {
        let source = &self.source;
        self.current_group
            .and_then(|i| self.groups.get_mut(i))
            .ok_or_else(|| LoadError::NoActiveGroup {
                path: source.clone(),
                line: line_no,
            })
    }

    fn parse_f32(&self, value: Option<&str>, line_no: usize, what: &str) -> LoadResult<f32> {
        let token = value
            .ok_or_else(|| LoadError::format(&self.source, line_no, format!("missing {what}")))?;
        token.parse::<f32>().map_err(|_| {
            LoadError::format(
                &self.source,
                line_no,
                format!("failed to parse {what} from '{token}'"),
            )
        })
    }
}

//! Material libraries (`.mtl`) referenced by models through `mtllib`.
//!
//! The loader only needs something that turns a library path into an
//! ordered list of materials; [`MaterialLoader`] is that seam and
//! [`MtlLoader`] the file-backed default.

use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;

use crate::{
    error::{LoadError, LoadResult},
    lines::lossy_lines,
    texture::TextureData,
};

/// Surface description resolved from a material library.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub shininess: f32,
    /// Opacity, 1.0 = opaque.
    pub dissolve: f32,
    /// `map_Kd`, already resolved against the library's directory.
    pub diffuse_map: Option<PathBuf>,
    /// Decoded `diffuse_map`, present only when texture decoding is enabled.
    pub texture: Option<Arc<TextureData>>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ambient: [0.2, 0.2, 0.2],
            diffuse: [0.8, 0.8, 0.8],
            specular: [0.0, 0.0, 0.0],
            shininess: 0.0,
            dissolve: 1.0,
            diffuse_map: None,
            texture: None,
        }
    }

    pub fn is_textured(&self) -> bool {
        self.diffuse_map.is_some()
    }
}

/// Resolves a material library path into its materials, in file order.
pub trait MaterialLoader {
    fn load_library(&self, path: &Path) -> LoadResult<Vec<Arc<Material>>>;
}

impl<F> MaterialLoader for F
where
    F: Fn(&Path) -> LoadResult<Vec<Arc<Material>>>,
{
    fn load_library(&self, path: &Path) -> LoadResult<Vec<Arc<Material>>> {
        self(path)
    }
}

/// Reads `.mtl` files from disk.
#[derive(Debug, Default)]
pub struct MtlLoader {
    decode_textures: bool,
    textures: Mutex<HashMap<PathBuf, Arc<TextureData>>>,
}

impl MtlLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also decode every `map_Kd` image. Each distinct file is decoded once
    /// and shared between the materials that reference it.
    pub fn with_textures(mut self, decode: bool) -> Self {
        self.decode_textures = decode;
        self
    }

    fn texture(&self, path: &Path) -> LoadResult<Arc<TextureData>> {
        let mut textures = self.textures.lock();
        if let Some(tex) = textures.get(path) {
            return Ok(Arc::clone(tex));
        }
        let tex = TextureData::load_png(path).map_err(|e| LoadError::Texture {
            path: path.to_path_buf(),
            message: format!("{e:#}"),
        })?;
        let tex = Arc::new(tex);
        textures.insert(path.to_path_buf(), Arc::clone(&tex));
        Ok(tex)
    }
}

impl MaterialLoader for MtlLoader {
    fn load_library(&self, path: &Path) -> LoadResult<Vec<Arc<Material>>> {
        let file = File::open(path).map_err(|e| LoadError::io(path, e))?;
        let base_dir = path.parent().unwrap_or(Path::new(""));
        let mut materials = parse_mtl(BufReader::new(file), path, base_dir)?;

        if self.decode_textures {
            for material in &mut materials {
                if let Some(map) = &material.diffuse_map {
                    material.texture = Some(self.texture(map)?);
                }
            }
        }

        log::debug!("Loaded {} material(s) from {:?}", materials.len(), path);
        Ok(materials.into_iter().map(Arc::new).collect())
    }
}

/// Parse an MTL document. `source` is used for diagnostics, `base_dir` to
/// resolve texture map paths.
pub fn parse_mtl<R: BufRead>(reader: R, source: &Path, base_dir: &Path) -> LoadResult<Vec<Material>> {
    let mut materials: Vec<Material> = Vec::new();

    for (line_no, line) in lossy_lines(reader).enumerate() {
        let line_no = line_no + 1;
        let line = line.map_err(|e| LoadError::io(source, e))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (keyword, rest) = trimmed
            .split_once(char::is_whitespace)
            .map(|(k, r)| (k, r.trim()))
            .unwrap_or((trimmed, ""));

        if keyword == "newmtl" {
            if rest.is_empty() {
                return Err(LoadError::format(source, line_no, "newmtl without a name"));
            }
            materials.push(Material::new(rest));
            continue;
        }

        let is_property = matches!(keyword, "Ka" | "Kd" | "Ks" | "Ns" | "d" | "Tr" | "map_Kd");
        let current = match materials.last_mut() {
            Some(m) => m,
            None if is_property => {
                return Err(LoadError::format(
                    source,
                    line_no,
                    format!("'{keyword}' before any newmtl"),
                ));
            }
            None => continue,
        };

        let mut parts = rest.split_whitespace();
        match keyword {
            "Ka" => current.ambient = parse_rgb(&mut parts, source, line_no)?,
            "Kd" => current.diffuse = parse_rgb(&mut parts, source, line_no)?,
            "Ks" => current.specular = parse_rgb(&mut parts, source, line_no)?,
            "Ns" => current.shininess = parse_scalar(parts.next(), source, line_no, "Ns")?,
            "d" => current.dissolve = parse_scalar(parts.next(), source, line_no, "d")?,
            "Tr" => current.dissolve = 1.0 - parse_scalar(parts.next(), source, line_no, "Tr")?,
            "map_Kd" => {
                // Options (-s, -o, ...) come first; the file name is last.
                let file = parts.last().ok_or_else(|| {
                    LoadError::format(source, line_no, "map_Kd without a file name")
                })?;
                current.diffuse_map = Some(base_dir.join(file));
            }
            other => log::trace!("{}:{}: ignoring '{}'", source.display(), line_no, other),
        }
    }

    Ok(materials)
}

/// Convenience wrapper for in-memory libraries.
pub fn parse_mtl_str(contents: &str, base_dir: &Path) -> LoadResult<Vec<Material>> {
    parse_mtl(io::Cursor::new(contents), Path::new("<memory>"), base_dir)
}

fn parse_scalar(token: Option<&str>, source: &Path, line: usize, what: &str) -> LoadResult<f32> {
    let token = token.ok_or_else(|| LoadError::format(source, line, format!("missing {what} value")))?;
    token
        .parse::<f32>()
        .map_err(|_| LoadError::format(source, line, format!("invalid {what} value '{token}'")))
}

/// `r [g b]`; a single component applies to all three channels.
fn parse_rgb<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    source: &Path,
    line: usize,
) -> LoadResult<[f32; 3]> {
    let r = parse_scalar(parts.next(), source, line, "red")?;
    match parts.next() {
        None => Ok([r, r, r]),
        Some(g) => {
            let g = parse_scalar(Some(g), source, line, "green")?;
            let b = parse_scalar(parts.next(), source, line, "blue")?;
            Ok([r, g, b])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CRATE_MTL: &str = r#"
        # two materials
        newmtl steel
        Ka 0.1 0.1 0.1
        Kd 0.5 0.55 0.6
        Ks 1.0
        Ns 96.0
        map_Kd -s 1 1 1 textures/steel.png

        newmtl glass
        Kd 0.9 0.9 1.0
        Tr 0.75
        illum 4
    "#;

    #[test]
    fn latin1_comment_is_skipped() {
        let src: &[u8] = b"# r\xe9alis\xe9\nnewmtl paint\nKd 1 0 0\n";
        let mats = parse_mtl(src, Path::new("latin1.mtl"), Path::new("")).unwrap();
        assert_eq!(mats.len(), 1);
        assert_eq!(mats[0].diffuse, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn parses_properties_in_order() {
        let mats = parse_mtl_str(CRATE_MTL, Path::new("assets")).unwrap();
        assert_eq!(mats.len(), 2);

        let steel = &mats[0];
        assert_eq!(steel.name, "steel");
        assert_eq!(steel.diffuse, [0.5, 0.55, 0.6]);
        assert_eq!(steel.specular, [1.0, 1.0, 1.0]);
        assert_eq!(steel.shininess, 96.0);
        assert_eq!(
            steel.diffuse_map.as_deref(),
            Some(Path::new("assets/textures/steel.png"))
        );

        let glass = &mats[1];
        assert!(!glass.is_textured());
        assert!((glass.dissolve - 0.25).abs() < 1e-6);
        assert_eq!(glass.ambient, Material::new("x").ambient);
    }

    #[test]
    fn property_before_newmtl_is_an_error() {
        let err = parse_mtl_str("Kd 1 0 0\nnewmtl red\n", Path::new(".")).unwrap_err();
        assert!(matches!(err, LoadError::Format { line: 1, .. }));
    }

    #[test]
    fn bad_number_reports_line() {
        let err = parse_mtl_str("newmtl a\nNs shiny\n", Path::new(".")).unwrap_err();
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn closure_acts_as_loader() {
        let loader = |path: &Path| -> LoadResult<Vec<Arc<Material>>> {
            Ok(vec![Arc::new(Material::new(path.display().to_string()))])
        };
        let mats = loader.load_library(Path::new("lib.mtl")).unwrap();
        assert_eq!(mats[0].name, "lib.mtl");
    }

    #[test]
    fn missing_library_is_io_error() {
        let err = MtlLoader::new()
            .load_library(Path::new("definitely/not/here.mtl"))
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}

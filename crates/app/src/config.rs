//! Command-line configuration.
//!
//! Accepted flags:
//! `--model=PATH` (repeatable), `--grid=CxR`, `--spacing=F`,
//! `--textures=on|off`, `--decode-textures[=on|off]`.

use renderer::TextureMode;

/// Upper bound on `columns * rows` accepted from `--grid`.
pub const MAX_GRID_CELLS: usize = 65_536;

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub models: Vec<String>,
    pub columns: usize,
    pub rows: usize,
    pub spacing: f32,
    pub textures: TextureMode,
    pub decode_textures: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            columns: 1,
            rows: 1,
            spacing: 2.0,
            textures: TextureMode::Shown,
            decode_textures: false,
        }
    }
}

impl AppConfig {
    /// Parse flags (without the program name). Bad values keep the default.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cfg = Self::default();

        for arg in args {
            let arg = arg.as_ref();
            if let Some(path) = arg.strip_prefix("--model=") {
                if !path.is_empty() {
                    cfg.models.push(path.to_owned());
                }
            } else if let Some(v) = arg.strip_prefix("--grid=") {
                match parse_grid(v) {
                    Some((c, r)) => {
                        cfg.columns = c;
                        cfg.rows = r;
                    }
                    None => log::warn!(
                        "Invalid grid '{}', expected CxR with at most {} cells",
                        v,
                        MAX_GRID_CELLS
                    ),
                }
            } else if let Some(v) = arg.strip_prefix("--spacing=") {
                match v.parse::<f32>() {
                    Ok(s) if s.is_finite() => cfg.spacing = s,
                    _ => log::warn!("Invalid spacing '{}'", v),
                }
            } else if let Some(v) = arg.strip_prefix("--textures=") {
                match parse_switch(v) {
                    Some(on) => cfg.textures = TextureMode::from_visible(on),
                    None => log::warn!("Invalid --textures value '{}'", v),
                }
            } else if arg == "--decode-textures" {
                cfg.decode_textures = true;
            } else if let Some(v) = arg.strip_prefix("--decode-textures=") {
                cfg.decode_textures = parse_switch(v).unwrap_or(false);
            } else {
                log::warn!("Ignoring unknown argument '{}'", arg);
            }
        }
        cfg
    }

    /// Entities spawned per model.
    pub fn copies(&self) -> usize {
        self.columns * self.rows
    }
}

fn parse_grid(v: &str) -> Option<(usize, usize)> {
    let (c, r) = v.split_once('x').or_else(|| v.split_once('X'))?;
    let (c, r) = (c.parse::<usize>().ok()?, r.parse::<usize>().ok()?);
    let cells = c.checked_mul(r)?;
    (c > 0 && r > 0 && cells <= MAX_GRID_CELLS).then_some((c, r))
}

fn parse_switch(v: &str) -> Option<bool> {
    match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = AppConfig::from_args(Vec::<String>::new());
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.copies(), 1);
    }

    #[test]
    fn full_command_line() {
        let cfg = AppConfig::from_args([
            "--model=assets/bot.obj",
            "--model=assets/tile.obj",
            "--grid=4X3",
            "--spacing=1.5",
            "--textures=off",
            "--decode-textures",
        ]);
        assert_eq!(cfg.models, ["assets/bot.obj", "assets/tile.obj"]);
        assert_eq!((cfg.columns, cfg.rows), (4, 3));
        assert_eq!(cfg.copies(), 12);
        assert_eq!(cfg.spacing, 1.5);
        assert_eq!(cfg.textures, TextureMode::Hidden);
        assert!(cfg.decode_textures);
    }

    #[test]
    fn bad_values_keep_defaults() {
        let cfg = AppConfig::from_args(["--grid=0x2", "--spacing=wide", "--textures=maybe", "--model="]);
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let huge = format!("--grid={}x{}", usize::MAX, 2);
        assert_eq!(AppConfig::from_args([huge.as_str()]), AppConfig::default());
        assert_eq!(AppConfig::from_args(["--grid=1000x1000"]), AppConfig::default());

        let cfg = AppConfig::from_args(["--grid=256x256"]);
        assert_eq!(cfg.copies(), MAX_GRID_CELLS);
    }
}

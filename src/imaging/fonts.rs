//! Font lookup and the label font fallback chain.
//!
//! Fonts are requested by name (`"arial.ttf"`, `"DejaVuSans"`) or by path.
//! Names are resolved against a [`FontCatalog`]: an index of every font file
//! under the configured directories plus the platform font directories,
//! built once per run with `walkdir` and shared read-only across threads.
//!
//! [`resolve_font`] walks the chain in order and returns the first font that
//! loads at the requested point size. When every name fails it returns
//! [`LabelFont::Builtin`], a fixed-size bitmap font compiled into the binary.
//! The built-in font does not scale with the image, so marks on large images
//! rendered with it are small; the fallback is logged at `warn` level.

use ab_glyph::{Font, FontVec, PxScale};
use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::mono_font::iso_8859_1::FONT_6X10;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "ttc"];

/// The bitmap font used when no named font loads.
pub fn builtin_font() -> &'static MonoFont<'static> {
    &FONT_6X10
}

/// A font ready to measure and draw a label.
pub enum LabelFont {
    /// Scalable outline font loaded from disk.
    Outline {
        name: String,
        font: FontVec,
        point_size: u32,
    },
    /// Built-in fixed-size bitmap font ([`builtin_font`]).
    Builtin,
}

impl LabelFont {
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin)
    }

    /// Name used in logs: the requested font name, or `builtin`.
    pub fn name(&self) -> &str {
        match self {
            Self::Outline { name, .. } => name,
            Self::Builtin => "builtin",
        }
    }

    /// Pixel scale for outline fonts: one em equals `point_size` pixels.
    pub fn px_scale(&self) -> Option<PxScale> {
        match self {
            Self::Outline {
                font, point_size, ..
            } => Some(em_scale(font, *point_size)),
            Self::Builtin => None,
        }
    }
}

impl fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outline {
                name, point_size, ..
            } => f
                .debug_struct("Outline")
                .field("name", name)
                .field("point_size", point_size)
                .finish(),
            Self::Builtin => f.write_str("Builtin"),
        }
    }
}

/// `ab_glyph` scales by line height; convert an em size into that unit.
fn em_scale(font: &FontVec, point_size: u32) -> PxScale {
    let size = point_size as f32;
    match font.units_per_em() {
        Some(upem) if upem > 0.0 => PxScale::from(size * font.height_unscaled() / upem),
        _ => PxScale::from(size),
    }
}

/// Index of font files by lowercase file name.
#[derive(Debug, Clone, Default)]
pub struct FontCatalog {
    files: HashMap<String, PathBuf>,
}

impl FontCatalog {
    /// A catalog that knows no fonts. Only paths in the chain can load.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Index `extra_dirs` first, then the platform font directories.
    ///
    /// When two directories hold the same file name, the earlier one wins.
    pub fn scan(extra_dirs: &[PathBuf]) -> Self {
        let mut dirs = extra_dirs.to_vec();
        dirs.extend(system_font_dirs());
        Self::from_dirs(&dirs)
    }

    /// Index only the given directories.
    pub fn from_dirs(dirs: &[PathBuf]) -> Self {
        let mut files = HashMap::new();
        for dir in dirs.iter().filter(|d| d.is_dir()) {
            for entry in WalkDir::new(dir)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                let path = entry.path();
                if !has_font_extension(path) {
                    continue;
                }
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    files
                        .entry(name.to_lowercase())
                        .or_insert_with(|| path.to_path_buf());
                }
            }
        }
        debug!(fonts = files.len(), "indexed font directories");
        Self { files }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Find the file behind a font name.
    ///
    /// An existing path is returned as is. Otherwise the name is matched
    /// case-insensitively against indexed file names; a name without an
    /// extension also matches `<name>.ttf`, `<name>.otf` and `<name>.ttc`.
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        let as_path = Path::new(name);
        if as_path.is_file() {
            return Some(as_path.to_path_buf());
        }
        let key = name.to_lowercase();
        if let Some(path) = self.files.get(&key) {
            return Some(path.clone());
        }
        if as_path.extension().is_none() {
            return FONT_EXTENSIONS
                .iter()
                .find_map(|ext| self.files.get(&format!("{key}.{ext}")))
                .cloned();
        }
        None
    }

    /// Names of every indexed font file, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.files.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn has_font_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| FONT_EXTENSIONS.iter().any(|f| e.eq_ignore_ascii_case(f)))
}

/// Platform font directories, in lookup order.
fn system_font_dirs() -> Vec<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut dirs = Vec::new();

    if cfg!(target_os = "windows") {
        if let Some(windir) = std::env::var_os("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        }
        if let Some(local) = std::env::var_os("LOCALAPPDATA") {
            dirs.push(PathBuf::from(local).join("Microsoft/Windows/Fonts"));
        }
    } else if cfg!(target_os = "macos") {
        if let Some(home) = &home {
            dirs.push(home.join("Library/Fonts"));
        }
        dirs.push(PathBuf::from("/Library/Fonts"));
        dirs.push(PathBuf::from("/System/Library/Fonts"));
    } else {
        if let Some(home) = &home {
            dirs.push(home.join(".local/share/fonts"));
            dirs.push(home.join(".fonts"));
        }
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        dirs.push(PathBuf::from("/usr/share/fonts"));
    }
    dirs
}

/// Load one named font at `point_size`.
fn load_named(catalog: &FontCatalog, name: &str, point_size: u32) -> Result<FontVec, String> {
    if point_size == 0 {
        return Err("point size is zero".to_string());
    }
    let path = catalog
        .locate(name)
        .ok_or_else(|| "not found in font directories".to_string())?;
    let bytes = std::fs::read(&path).map_err(|e| format!("{}: {e}", path.display()))?;
    FontVec::try_from_vec_and_index(bytes, 0).map_err(|e| format!("{}: {e}", path.display()))
}

/// Walk `chain` and return the first font that loads; fall back to the built-in.
///
/// Never fails. A zero point size (tiny images) fails every named font and
/// lands on the built-in bitmap font.
pub fn resolve_font(catalog: &FontCatalog, chain: &[String], point_size: u32) -> LabelFont {
    for name in chain {
        match load_named(catalog, name, point_size) {
            Ok(font) => {
                debug!(font = %name, point_size, "label font loaded");
                return LabelFont::Outline {
                    name: name.clone(),
                    font,
                    point_size,
                };
            }
            Err(reason) => debug!(font = %name, %reason, "font unavailable"),
        }
    }
    warn!(
        ?chain,
        point_size, "no named font loaded; using built-in bitmap font at fixed size"
    );
    LabelFont::Builtin
}

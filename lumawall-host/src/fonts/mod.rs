//! Font library
//!
//! Every `*.bdf` file in the font directory is loaded at startup and
//! registered under its file name and its stem, so a DisplayText command may
//! name `6x10.bdf` or just `6x10`. Anything else falls back to the built-in
//! 5x7 font.

pub mod bdf;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{info, warn};

use lumawall_core::font::BuiltinFont;
use lumawall_core::traits::{FontMetrics, Glyph, GlyphSource};

pub use bdf::{BdfError, BdfFont};

/// Loaded fonts keyed by name
#[derive(Debug, Clone, Default)]
pub struct FontLibrary {
    fonts: HashMap<String, usize>,
    loaded: Vec<BdfFont>,
}

impl FontLibrary {
    /// Library with only the built-in font
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Load every BDF font in `dir`
    ///
    /// A missing directory or an unreadable font is logged and skipped.
    pub fn load_dir(dir: &Path) -> Self {
        let mut library = Self::default();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                info!("No fonts loaded from {}: {}", dir.display(), e);
                return library;
            }
        };

        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("bdf"))
            })
            .collect();
        paths.sort();

        for path in paths {
            match BdfFont::load(&path) {
                Ok(font) => {
                    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
                    let stem = path.file_stem().and_then(|n| n.to_str()).unwrap_or_default();
                    info!("Loaded font {} ({} glyphs)", file_name, font.len());
                    library.insert(&[file_name, stem], font);
                }
                Err(e) => warn!("Skipping font {}: {}", path.display(), e),
            }
        }
        library
    }

    /// Register a font under one or more names
    pub fn insert(&mut self, names: &[&str], font: BdfFont) {
        let index = self.loaded.len();
        self.loaded.push(font);
        for name in names.iter().filter(|n| !n.is_empty()) {
            self.fonts.insert(name.to_string(), index);
        }
    }

    pub fn get(&self, name: &str) -> Option<&BdfFont> {
        self.fonts.get(name).and_then(|&index| self.loaded.get(index))
    }

    /// Number of distinct fonts loaded
    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
}

impl GlyphSource for FontLibrary {
    fn glyph(&self, font: &str, ch: char) -> Option<Glyph<'_>> {
        match self.get(font) {
            Some(bdf) => bdf.glyph(ch),
            None => BuiltinFont::lookup(ch),
        }
    }

    fn metrics(&self, font: &str) -> FontMetrics {
        self.get(font).map_or(BuiltinFont::METRICS, BdfFont::metrics)
    }
}

//! Offline camera and decoder implementations plus dataset helpers
//!
//! Used by `scantool` and by the tests; nothing here touches real hardware.

mod directory;
mod scripted;

pub use directory::{DirectoryCamera, LabelDecoder};
pub use scripted::{CameraProbe, ScriptedCamera, ScriptedDecoder, scripted};

use image::GrayImage;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn max_dim_from_env() -> Option<u32> {
    match env::var("SCAN_MAX_DIM") {
        Ok(value) => match value.trim().parse::<u32>() {
            Ok(0) => None,
            Ok(v) => Some(v),
            Err(_) => None,
        },
        Err(_) => None,
    }
}

/// Load an image as 8-bit grayscale, downscaled to `SCAN_MAX_DIM` if set
pub fn load_luma<P: AsRef<Path>>(path: P) -> Result<GrayImage, image::ImageError> {
    let img = image::open(path)?;
    let img = match max_dim_from_env() {
        Some(max_dim) if img.width().max(img.height()) > max_dim => {
            img.resize(max_dim, max_dim, image::imageops::FilterType::Triangle)
        }
        _ => img,
    };
    Ok(img.to_luma8())
}

/// First non-empty, non-`#` line of a label file, trimmed
pub fn read_label<P: AsRef<Path>>(path: P) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
}

/// Parse a replay script: one decode result per line
///
/// An empty line means "nothing decoded on this frame"; lines starting with
/// `#` are comments. Payloads keep their inner whitespace but are trimmed at
/// the ends.
pub fn parse_script(content: &str) -> Vec<Option<String>> {
    content
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .map(|line| {
            let line = line.trim();
            if line.is_empty() { None } else { Some(line.to_string()) }
        })
        .collect()
}

/// Read and parse a replay script file
pub fn read_script<P: AsRef<Path>>(path: P) -> std::io::Result<Vec<Option<String>>> {
    Ok(parse_script(&fs::read_to_string(path)?))
}

/// Iterate image paths under `root` with an optional smoke list and limit
pub fn dataset_iter<P: AsRef<Path>>(
    root: P,
    limit: Option<usize>,
    smoke: bool,
) -> impl Iterator<Item = PathBuf> {
    let root = root.as_ref();
    let mut images = if smoke {
        load_smoke_list(root).unwrap_or_else(|| collect_images(root))
    } else {
        collect_images(root)
    };

    images.sort();
    if let Some(limit) = limit {
        images.truncate(limit);
    }
    images.into_iter()
}

fn load_smoke_list(root: &Path) -> Option<Vec<PathBuf>> {
    let contents = fs::read_to_string(root.join("_smoke.txt")).ok()?;
    let mut paths = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let candidate = Path::new(line);
        let path = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            root.join(candidate)
        };
        if path.exists() {
            paths.push(path);
        }
    }
    if paths.is_empty() { None } else { Some(paths) }
}

fn collect_images(root: &Path) -> Vec<PathBuf> {
    let mut stack = vec![root.to_path_buf()];
    let mut images = Vec::new();

    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if let Some(ext) = path.extension() {
                let ext = ext.to_string_lossy().to_lowercase();
                if matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "gif" | "bmp") {
                    images.push(path);
                }
            }
        }
    }

    images
}

//! Icon descriptors derived from icon file names.
//!
//! Icons are never rasterized or converted. Each configured file is copied
//! as-is into the location its platform expects, so the size must be
//! encoded in the file name:
//!
//! | File name | Format | Bucket |
//! |-----------|--------|--------|
//! | `app.svg` | SVG | `scalable` |
//! | `app.128x128.png` | PNG | `128x128` |
//! | `app.ico` | ICO | (Windows only) |
//! | `app.icns` | ICNS | (macOS only) |
//!
//! PNG icons must be square. A PNG whose real header disagrees with its
//! declared size is reported as a warning and still used.

use crate::bundler::error::{Error, Result};
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// Icon file formats accepted in `IconFiles`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum IconFormat {
    /// Scalable vector icon, Linux only.
    Svg,
    /// Windows icon container.
    Ico,
    /// macOS icon container.
    Icns,
    /// Fixed-size raster icon.
    Png,
}

impl IconFormat {
    fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "svg" => Some(Self::Svg),
            "ico" => Some(Self::Ico),
            "icns" => Some(Self::Icns),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Lowercase file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Ico => "ico",
            Self::Icns => "icns",
            Self::Png => "png",
        }
    }
}

/// A configured icon file together with the size parsed from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconDescriptor {
    /// Absolute path to the icon file.
    pub path: PathBuf,

    /// File format, from the extension.
    pub format: IconFormat,

    /// Declared `(width, height)`; `None` for SVG, ICO and ICNS.
    pub size: Option<(u32, u32)>,
}

impl IconDescriptor {
    /// Builds a descriptor from a file name of the form `name.WxH.ext`.
    ///
    /// Fails if the extension is not svg/ico/icns/png, or if a PNG lacks a
    /// square `WxH` segment.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(IconFormat::from_extension)
            .ok_or_else(|| {
                Error::GenericError(format!(
                    "icon {} must be one of svg, ico, icns or png",
                    path.display()
                ))
            })?;

        let size = match ext {
            IconFormat::Png => {
                let (w, h) = parse_size(&path)?;
                if w != h {
                    return Err(Error::GenericError(format!(
                        "icon {} is not square ({w}x{h})",
                        path.display()
                    )));
                }
                Some((w, h))
            }
            _ => None,
        };

        Ok(Self {
            path,
            format: ext,
            size,
        })
    }

    /// Size bucket under `share/icons/hicolor`: `scalable` or `WxH`.
    pub fn bucket(&self) -> Option<String> {
        match (self.format, self.size) {
            (IconFormat::Svg, _) => Some("scalable".to_string()),
            (IconFormat::Png, Some((w, h))) => Some(format!("{w}x{h}")),
            _ => None,
        }
    }

    /// Width in pixels for PNG icons, zero otherwise.
    pub fn width(&self) -> u32 {
        self.size.map_or(0, |(w, _)| w)
    }

    /// Compares the declared size against the PNG header.
    ///
    /// Advisory only: a mismatch or an unreadable header logs a warning.
    pub fn check_dimensions(&self) {
        let Some((w, h)) = self.size else {
            return;
        };
        match image::image_dimensions(&self.path) {
            Ok((rw, rh)) if rw == w && rh == h => {}
            Ok((rw, rh)) => log::warn!(
                "Icon {} is named {w}x{h} but the image is {rw}x{rh}",
                self.path.display()
            ),
            Err(e) => log::warn!("Could not read icon header {}: {e}", self.path.display()),
        }
    }
}

impl fmt::Display for IconDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bucket() {
            Some(b) => write!(f, "{} ({b})", self.path.display()),
            None => write!(f, "{}", self.path.display()),
        }
    }
}

/// Parses the `WxH` segment that precedes the extension.
fn parse_size(path: &Path) -> Result<(u32, u32)> {
    let invalid = || {
        Error::GenericError(format!(
            "icon {} must be named NAME.WxH.png (e.g. app.128x128.png)",
            path.display()
        ))
    };

    let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(invalid)?;
    let segment = stem.rsplit('.').next().ok_or_else(invalid)?;
    let (w, h) = segment
        .split_once(['x', 'X'])
        .ok_or_else(invalid)?;
    let w = w.trim().parse::<u32>().map_err(|_| invalid())?;
    let h = h.trim().parse::<u32>().map_err(|_| invalid())?;
    if w == 0 || h == 0 {
        return Err(invalid());
    }
    Ok((w, h))
}

/// Returns the widest PNG icon. Ties keep the first configured icon.
pub fn largest_png(icons: &[IconDescriptor]) -> Option<&IconDescriptor> {
    icons
        .iter()
        .filter(|i| i.format == IconFormat::Png)
        .fold(None, |best: Option<&IconDescriptor>, icon| match best {
            Some(b) if b.width() >= icon.width() => Some(b),
            _ => Some(icon),
        })
}

/// Returns the first icon of the given format.
pub fn first_of(icons: &[IconDescriptor], format: IconFormat) -> Option<&IconDescriptor> {
    icons.iter().find(|i| i.format == format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_size_becomes_bucket() {
        let icon = IconDescriptor::from_path("/icons/app.128x128.png").unwrap();
        assert_eq!(icon.bucket().as_deref(), Some("128x128"));
        let icon = IconDescriptor::from_path("/icons/app.1024x1024.png").unwrap();
        assert_eq!(icon.bucket().as_deref(), Some("1024x1024"));
    }

    #[test]
    fn svg_is_scalable() {
        let icon = IconDescriptor::from_path("/icons/app.svg").unwrap();
        assert_eq!(icon.bucket().as_deref(), Some("scalable"));
        assert_eq!(icon.size, None);
    }

    #[test]
    fn unparsable_png_size_is_an_error() {
        assert!(IconDescriptor::from_path("/icons/app.png").is_err());
        assert!(IconDescriptor::from_path("/icons/app.bigxbig.png").is_err());
        assert!(IconDescriptor::from_path("/icons/app.64x32.png").is_err());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(IconDescriptor::from_path("/icons/app.32x32.bmp").is_err());
    }

    #[test]
    fn largest_png_prefers_first_on_tie() {
        let icons = vec![
            IconDescriptor::from_path("/a/app.svg").unwrap(),
            IconDescriptor::from_path("/a/app.64x64.png").unwrap(),
            IconDescriptor::from_path("/a/app.256x256.png").unwrap(),
            IconDescriptor::from_path("/b/app.256x256.png").unwrap(),
        ];
        let best = largest_png(&icons).unwrap();
        assert_eq!(best.path, PathBuf::from("/a/app.256x256.png"));
    }
}

use std::fs;
use std::path::Path;

use hoard_files_derive_parseable::Parse;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::LoadError;
use crate::codec::types::{Bool32, Gid, gid};
use crate::file::source::Deferred;

/// Pixel layouts as stored in the container.
#[derive(TryFromPrimitive, IntoPrimitive, Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u32)]
pub enum ColorMode {
    Rgb = 1,
    Grayscale = 4,
    Alpha = 8,
    Rgba = 9,
    GrayscaleAlpha = 12,
    Bgr = 16,
    Bgra = 24,
}

impl ColorMode {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            ColorMode::Grayscale | ColorMode::Alpha => 1,
            ColorMode::GrayscaleAlpha => 2,
            ColorMode::Rgb | ColorMode::Bgr => 3,
            ColorMode::Rgba | ColorMode::Bgra => 4,
        }
    }

    fn to_rgba(self, px: &[u8]) -> [u8; 4] {
        match self {
            ColorMode::Rgb => [px[0], px[1], px[2], 0xFF],
            ColorMode::Bgr => [px[2], px[1], px[0], 0xFF],
            ColorMode::Rgba => [px[0], px[1], px[2], px[3]],
            ColorMode::Bgra => [px[2], px[1], px[0], px[3]],
            ColorMode::Grayscale => [px[0], px[0], px[0], 0xFF],
            ColorMode::Alpha => [0xFF, 0xFF, 0xFF, px[0]],
            ColorMode::GrayscaleAlpha => [px[0], px[0], px[0], px[1]],
        }
    }
}

#[derive(Debug, Parse)]
pub(crate) struct ImageProps {
    pub width: i32,
    pub height: i32,
    pub mode: u32,
    pub compression: Gid,
    pub lazy: Bool32,
}

/// The usable form of an image: tightly packed RGBA8 rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[derive(Debug)]
pub struct Image {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) mode: ColorMode,
    pub(crate) compression: Gid,
    pub(crate) data: Option<Vec<u8>>,
    pub(crate) prepared: Option<PreparedImage>,
    pub(crate) deferred: Option<Deferred>,
}

impl Default for Image {
    fn default() -> Self {
        Image {
            width: 0,
            height: 0,
            mode: ColorMode::Rgba,
            compression: gid::NONE,
            data: None,
            prepared: None,
            deferred: None,
        }
    }
}

impl Image {
    /// An image over raw pixels, which must match the dimensions.
    pub fn new(width: u32, height: u32, mode: ColorMode, data: Vec<u8>) -> Result<Self, LoadError> {
        check_pixel_count(width, height, mode, data.len())?;
        Ok(Image {
            width,
            height,
            mode,
            data: Some(data),
            ..Image::default()
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn compression(&self) -> Gid {
        self.compression
    }

    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    pub fn prepared(&self) -> Option<&PreparedImage> {
        self.prepared.as_ref()
    }

    pub fn deferred(&self) -> Option<&Deferred> {
        self.deferred.as_ref()
    }

    /// Converts the raw pixels to RGBA. Without raw pixels the previous result is kept.
    pub fn prepare(&mut self) {
        let Some(data) = &self.data else {
            return;
        };

        let rgba = data
            .chunks_exact(self.mode.bytes_per_pixel())
            .flat_map(|px| self.mode.to_rgba(px))
            .collect();
        self.prepared = Some(PreparedImage {
            width: self.width,
            height: self.height,
            rgba,
        });
    }

    /// Drops the raw pixels. A prepared image survives.
    pub fn discard(&mut self) {
        self.data = None;
    }

    /// Replaces the pixels with the raw content of `path`.
    pub fn import_raw(&mut self, path: impl AsRef<Path>, width: u32, height: u32, mode: ColorMode) -> Result<(), LoadError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(LoadError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let data = fs::read(path).map_err(|source| LoadError::FileCannotBeOpened {
            path: path.to_path_buf(),
            source,
        })?;
        check_pixel_count(width, height, mode, data.len())?;

        self.width = width;
        self.height = height;
        self.mode = mode;
        self.compression = gid::NONE;
        self.data = Some(data);
        self.prepared = None;
        Ok(())
    }
}

pub(crate) fn check_pixel_count(width: u32, height: u32, mode: ColorMode, len: usize) -> Result<(), LoadError> {
    let expected = width as usize * height as usize * mode.bytes_per_pixel();
    if expected != len {
        return Err(LoadError::FormatError {
            reason: "image data does not match its dimensions",
        });
    }
    Ok(())
}

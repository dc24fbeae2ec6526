//! Encoded full-canvas snapshots.
//!
//! The raster is premultiplied while PNG stores straight alpha. The
//! conversions below are exact inverses for every premultiplied value, so a
//! restored snapshot is bit-identical to the raster it was captured from.

use std::io::Cursor;
use std::sync::Arc;

use futures::channel::oneshot;
use image::{ImageFormat, RgbaImage};
use thiserror::Error;
use tiny_skia::Pixmap;
use uuid::Uuid;

use crate::raster::Raster;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] image::ImageError),

    #[error("failed to decode snapshot: {0}")]
    Decode(#[source] image::ImageError),

    #[error("snapshot has unusable dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("snapshot decode was cancelled")]
    Cancelled,
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// An immutable PNG-encoded copy of the whole raster.
///
/// Cloning is cheap; the encoded bytes are shared.
#[derive(Clone)]
pub struct Snapshot {
    id: Uuid,
    width: u32,
    height: u32,
    png: Arc<[u8]>,
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.png.len())
            .finish()
    }
}

impl Snapshot {
    /// Encode the current raster contents
    pub fn capture(raster: &Raster) -> SnapshotResult<Self> {
        let png = encode_png(raster.pixmap())?;
        Ok(Self {
            id: Uuid::new_v4(),
            width: raster.width(),
            height: raster.height(),
            png: png.into(),
        })
    }

    /// Blank snapshot of the given size
    pub fn blank(width: u32, height: u32) -> SnapshotResult<Self> {
        let raster = Raster::new(width, height).map_err(|_| SnapshotError::InvalidDimensions { width, height })?;
        Self::capture(&raster)
    }

    /// Wrap externally stored PNG bytes (e.g. a saved drawing).
    ///
    /// Only the header is read here; pixel data is decoded on restore.
    pub fn from_png(bytes: Vec<u8>) -> SnapshotResult<Self> {
        let reader = image::ImageReader::with_format(Cursor::new(&bytes), ImageFormat::Png);
        let (width, height) = reader.into_dimensions().map_err(SnapshotError::Decode)?;
        if width == 0 || height == 0 {
            return Err(SnapshotError::InvalidDimensions { width, height });
        }

        Ok(Self {
            id: Uuid::new_v4(),
            width,
            height,
            png: bytes.into(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    /// Decode back into a premultiplied pixmap on the calling thread.
    pub fn decode(&self) -> SnapshotResult<Pixmap> {
        decode_png(&self.png)
    }

    /// Decode on a background thread.
    ///
    /// The receiver resolves once the pixels are ready. Dropping it discards
    /// the result.
    pub fn spawn_decode(&self) -> oneshot::Receiver<SnapshotResult<Pixmap>> {
        let (tx, rx) = oneshot::channel();
        let png = Arc::clone(&self.png);
        let id = self.id;

        std::thread::spawn(move || {
            let result = decode_png(&png);
            if tx.send(result).is_err() {
                log::debug!("Decode of snapshot {} finished after its receiver was dropped", id);
            }
        });

        rx
    }
}

/// Encode a premultiplied pixmap as straight-alpha PNG.
pub fn encode_png(pixmap: &Pixmap) -> SnapshotResult<Vec<u8>> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let straight: Vec<u8> = pixmap
        .data()
        .chunks_exact(4)
        .flat_map(|px| demultiply([px[0], px[1], px[2], px[3]]))
        .collect();

    let image = RgbaImage::from_raw(width, height, straight).ok_or(SnapshotError::InvalidDimensions { width, height })?;

    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(SnapshotError::Encode)?;
    Ok(buffer.into_inner())
}

fn decode_png(bytes: &[u8]) -> SnapshotResult<Pixmap> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(SnapshotError::Decode)?
        .to_rgba8();
    let (width, height) = image.dimensions();

    let mut pixmap = Pixmap::new(width, height).ok_or(SnapshotError::InvalidDimensions { width, height })?;
    for (dst, src) in pixmap.data_mut().chunks_exact_mut(4).zip(image.as_raw().chunks_exact(4)) {
        dst.copy_from_slice(&premultiply([src[0], src[1], src[2], src[3]]));
    }
    Ok(pixmap)
}

// Rounded division both ways; premultiply(demultiply(p)) == p whenever every
// channel of p is at most its alpha.
fn demultiply([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    if a == 0 {
        return [0, 0, 0, 0];
    }
    let a32 = a as u32;
    let unmul = |c: u8| (((c as u32) * 255 + a32 / 2) / a32).min(255) as u8;
    [unmul(r), unmul(g), unmul(b), a]
}

fn premultiply([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    let a32 = a as u32;
    let mul = |c: u8| (((c as u32) * a32 * 2 + 255) / 510) as u8;
    [mul(r), mul(g), mul(b), a]
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{Color32, pos2};

    #[test]
    fn test_premultiply_roundtrip_is_exact() {
        for a in 0..=255u8 {
            for c in 0..=a {
                let px = [c, c / 2, 0, a];
                assert_eq!(premultiply(demultiply(px)), px, "alpha {a} channel {c}");
            }
        }
    }

    #[test]
    fn test_capture_then_decode_is_bit_identical() {
        let mut raster = Raster::new(64, 48).unwrap();
        raster
            .stroke_segment(pos2(4.0, 4.0), pos2(60.0, 40.0), Color32::from_rgb(200, 40, 90), 7.0)
            .unwrap();
        raster
            .stroke_segment(pos2(4.0, 40.0), pos2(60.0, 4.0), Color32::from_rgba_unmultiplied(10, 120, 250, 77), 3.0)
            .unwrap();

        let snapshot = Snapshot::capture(&raster).unwrap();
        assert_eq!((snapshot.width(), snapshot.height()), (64, 48));

        let decoded = snapshot.decode().unwrap();
        assert_eq!(decoded.data(), raster.data());
    }

    #[test]
    fn test_background_decode_matches() {
        let snapshot = Snapshot::blank(10, 10).unwrap();
        let pixmap = futures::executor::block_on(snapshot.spawn_decode())
            .unwrap()
            .unwrap();
        assert!(pixmap.pixels().iter().all(|p| p.alpha() == 0));
    }

    #[test]
    fn test_from_png_reads_dimensions() {
        let original = Snapshot::blank(30, 20).unwrap();
        let loaded = Snapshot::from_png(original.png_bytes().to_vec()).unwrap();

        assert_eq!((loaded.width(), loaded.height()), (30, 20));
        assert_ne!(loaded.id(), original.id());
    }

    #[test]
    fn test_garbage_fails_to_load() {
        assert!(matches!(
            Snapshot::from_png(b"not a png".to_vec()),
            Err(SnapshotError::Decode(_))
        ));

        let bogus = Snapshot {
            id: Uuid::new_v4(),
            width: 1,
            height: 1,
            png: Arc::from(&b"\x89PNG garbage"[..]),
        };
        assert!(matches!(bogus.decode(), Err(SnapshotError::Decode(_))));
    }
}

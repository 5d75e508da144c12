#[allow(unused_imports)]
use log::{debug, info, warn};

use crate::Error;
use half::f16;
use image::ImageFormat;
use itertools::Itertools;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Largest finite half-precision value.
const F16_MAX: f32 = 65504.0;

/// A decoded equirectangular radiance image in linear RGB.
#[derive(Clone, Debug, PartialEq)]
pub struct RadianceImage {
    pub cols: usize,
    pub rows: usize,
    pub pixels: Vec<f32>,
}

impl RadianceImage {
    pub fn new(cols: usize, rows: usize, pixels: Vec<f32>) -> Self {
        assert_eq!(pixels.len(), 3 * cols * rows, "invalid radiance image layout");

        Self { cols, rows, pixels }
    }

    /// Converts to half-float RGBA texels, clamping to the representable range.
    ///
    /// Rows are emitted bottom row first, so that the top of the image ends
    /// up at `t = 1` as the equirectangular lookup expects.
    pub fn to_rgba16f(&self) -> Vec<u16> {
        let one = f16::from_f32(1.0).to_bits();
        let mut texels = Vec::with_capacity(4 * self.cols * self.rows);

        let rows = self.pixels.chunks(3 * self.cols).rev();

        for (&r, &g, &b) in rows.flatten().tuples() {
            texels.push(Self::to_half(r));
            texels.push(Self::to_half(g));
            texels.push(Self::to_half(b));
            texels.push(one);
        }

        texels
    }

    fn to_half(value: f32) -> u16 {
        f16::from_f32(value.max(0.0).min(F16_MAX)).to_bits()
    }
}

/// Decodes a Radiance RGBE (`.hdr`) file.
pub fn decode_hdr(bytes: &[u8]) -> Result<RadianceImage, Error> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Hdr)?.into_rgb32f();

    let (cols, rows) = (image.width() as usize, image.height() as usize);

    if cols == 0 || rows == 0 {
        return Err(Error::ImageDecode(String::from("image has no pixels")));
    }

    Ok(RadianceImage::new(cols, rows, image.into_raw()))
}

type Slot = Rc<RefCell<Option<Result<RadianceImage, Error>>>>;

/// A radiance image that is still being loaded.
///
/// Clones share the same slot: the loader keeps one to resolve it while
/// the pipeline polls another.
#[derive(Clone, Default)]
pub struct PendingImage {
    slot: Slot,
}

impl PendingImage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ready(image: RadianceImage) -> Self {
        let pending = Self::new();
        pending.resolve(Ok(image));
        pending
    }

    pub fn failed(error: Error) -> Self {
        let pending = Self::new();
        pending.resolve(Err(error));
        pending
    }

    pub fn resolve(&self, result: Result<RadianceImage, Error>) {
        *self.slot.borrow_mut() = Some(result);
    }

    pub fn is_resolved(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Takes the result if loading has finished.
    pub fn poll(&self) -> Option<Result<RadianceImage, Error>> {
        self.slot.borrow_mut().take()
    }
}

impl fmt::Debug for PendingImage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PendingImage")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// Starts loading radiance images by URL or path.
pub trait ImageLoader {
    fn load(&self, url: &str) -> PendingImage;
}

/// Reads and decodes images from the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileLoader;

impl ImageLoader for FileLoader {
    fn load(&self, url: &str) -> PendingImage {
        let result = std::fs::read(url)
            .map_err(|err| Error::ImageLoad {
                url: url.to_owned(),
                reason: err.to_string(),
            })
            .and_then(|bytes| decode_hdr(&bytes));

        match result {
            Ok(image) => {
                info!("loaded radiance image `{}' ({}x{})", url, image.cols, image.rows);
                PendingImage::ready(image)
            }
            Err(error) => PendingImage::failed(error),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A flat-encoded RGBE file where every pixel decodes to 1.0.
    pub fn constant_hdr(cols: usize, rows: usize) -> Vec<u8> {
        let mut bytes = format!(
            "#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y {} +X {}\n",
            rows, cols
        )
        .into_bytes();

        for _ in 0..cols * rows {
            bytes.extend_from_slice(&[128, 128, 128, 129]);
        }

        bytes
    }

    #[test]
    fn decodes_constant_image() {
        let image = decode_hdr(&constant_hdr(2, 1)).unwrap();

        assert_eq!((image.cols, image.rows), (2, 1));
        assert_eq!(image.pixels.len(), 6);

        for &value in &image.pixels {
            assert!((value - 1.0).abs() < 1e-3, "unexpected value {}", value);
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            decode_hdr(b"not a radiance file"),
            Err(Error::ImageDecode(_))
        ));
    }

    #[test]
    fn half_float_conversion_clamps() {
        let image = RadianceImage::new(2, 1, vec![1.0, 0.5, -3.0, 1e9, 0.0, 2.0]);
        let texels = image.to_rgba16f();

        assert_eq!(texels.len(), 8);
        assert_eq!(f16::from_bits(texels[0]).to_f32(), 1.0);
        assert_eq!(f16::from_bits(texels[1]).to_f32(), 0.5);
        assert_eq!(f16::from_bits(texels[2]).to_f32(), 0.0);
        assert_eq!(f16::from_bits(texels[3]).to_f32(), 1.0);
        assert_eq!(f16::from_bits(texels[4]).to_f32(), F16_MAX);
        assert_eq!(f16::from_bits(texels[6]).to_f32(), 2.0);
    }

    #[test]
    fn top_row_is_uploaded_last() {
        let image = RadianceImage::new(1, 2, vec![2.0, 2.0, 2.0, 0.5, 0.5, 0.5]);
        let texels = image.to_rgba16f();

        let rows: Vec<f32> = texels
            .chunks(4)
            .map(|texel| f16::from_bits(texel[0]).to_f32())
            .collect();

        assert_eq!(rows, vec![0.5, 2.0]);
    }

    #[test]
    fn pending_image_resolves_once() {
        let pending = PendingImage::new();
        let handle = pending.clone();

        assert!(pending.poll().is_none());

        handle.resolve(Ok(RadianceImage::new(1, 1, vec![0.0; 3])));
        assert!(pending.is_resolved());

        assert!(matches!(pending.poll(), Some(Ok(_))));
        assert!(pending.poll().is_none());
    }

    #[test]
    fn missing_file_fails_to_load() {
        let pending = FileLoader.load("/nonexistent/radiance.hdr");

        match pending.poll() {
            Some(Err(Error::ImageLoad { url, .. })) => {
                assert_eq!(url, "/nonexistent/radiance.hdr")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}

//! Decoding of image XObject samples into rasters.
//!
//! The backend hands over the stream data already stripped of generic
//! compression filters (Flate, LZW, ...). Only image-specific codecs and
//! the mapping from PDF colour spaces to pixel layouts happen here.

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Image-specific stream filter left on an image XObject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFilter {
    /// Samples are raw, already decompressed
    None,
    /// Baseline JPEG (`DCTDecode`)
    Dct,
    /// JPEG 2000 (`JPXDecode`)
    Jpx,
}

/// An image XObject as stored in the document, before decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedImage {
    /// Width in samples
    pub width: u32,
    /// Height in samples
    pub height: u32,
    /// Bits per colour component
    pub bits_per_component: u8,
    /// Colour space family name (e.g. "DeviceRGB", "ICCBased")
    pub color_space: String,
    /// Image codec still applied to `data`
    pub filter: ImageFilter,
    /// Sample data
    #[serde(skip_serializing, default)]
    pub data: Vec<u8>,
}

impl EncodedImage {
    /// Raw 8-bit-per-component image with no image codec.
    pub fn raw(
        width: u32,
        height: u32,
        color_space: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            width,
            height,
            bits_per_component: 8,
            color_space: color_space.into(),
            filter: ImageFilter::None,
            data: data.into(),
        }
    }

    /// JPEG-compressed image data.
    pub fn jpeg(width: u32, height: u32, data: impl Into<Vec<u8>>) -> Self {
        Self {
            width,
            height,
            bits_per_component: 8,
            color_space: "DeviceRGB".to_string(),
            filter: ImageFilter::Dct,
            data: data.into(),
        }
    }

    /// Set bits per component.
    pub fn with_bits_per_component(mut self, bits: u8) -> Self {
        self.bits_per_component = bits;
        self
    }

    /// Pixel count, or `None` when it does not fit in `usize`.
    fn pixel_count(&self) -> Option<usize> {
        (self.width as usize).checked_mul(self.height as usize)
    }

    /// Byte length of `components` 8-bit samples per pixel.
    fn sample_len(&self, components: usize) -> Result<usize> {
        self.pixel_count()
            .and_then(|pixels| pixels.checked_mul(components))
            .ok_or_else(|| self.too_large())
    }

    fn too_large(&self) -> Error {
        Error::DecodeFailure(format!(
            "image dimensions {}x{} are too large",
            self.width, self.height
        ))
    }
}

/// Decode an image XObject into a raster.
pub fn decode_image(encoded: &EncodedImage) -> Result<DynamicImage> {
    if encoded.width == 0 || encoded.height == 0 {
        return Err(Error::DecodeFailure(format!(
            "image has empty dimensions {}x{}",
            encoded.width, encoded.height
        )));
    }

    match encoded.filter {
        ImageFilter::Dct => Ok(image::load_from_memory_with_format(
            &encoded.data,
            ImageFormat::Jpeg,
        )?),
        ImageFilter::Jpx => Ok(image::load_from_memory(&encoded.data)?),
        ImageFilter::None => decode_samples(encoded),
    }
}

fn decode_samples(encoded: &EncodedImage) -> Result<DynamicImage> {
    let components = match encoded.color_space.as_str() {
        "DeviceGray" | "CalGray" | "G" => 1,
        "DeviceRGB" | "CalRGB" | "RGB" | "Lab" => 3,
        "DeviceCMYK" | "CMYK" => 4,
        // component count is not recorded for these, guess from the buffer size
        "ICCBased" | "Indexed" | "Separation" | "DeviceN" => guess_components(encoded)?,
        other => {
            return Err(Error::DecodeFailure(format!(
                "unsupported color space {}",
                other
            )))
        }
    };

    match (encoded.bits_per_component, components) {
        (1, 1) => Ok(DynamicImage::ImageLuma8(unpack_bilevel(encoded)?)),
        (8, 1) => {
            let data = take_samples(encoded, 1)?;
            GrayImage::from_raw(encoded.width, encoded.height, data)
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(|| Error::DecodeFailure("grayscale buffer mismatch".into()))
        }
        (8, 3) => {
            let data = take_samples(encoded, 3)?;
            RgbImage::from_raw(encoded.width, encoded.height, data)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| Error::DecodeFailure("RGB buffer mismatch".into()))
        }
        (8, 4) => {
            let data = take_samples(encoded, 4)?;
            let rgb = cmyk_to_rgb(&data);
            RgbImage::from_raw(encoded.width, encoded.height, rgb)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| Error::DecodeFailure("CMYK buffer mismatch".into()))
        }
        (bits, n) => Err(Error::DecodeFailure(format!(
            "unsupported sample layout: {} bits x {} components",
            bits, n
        ))),
    }
}

fn guess_components(encoded: &EncodedImage) -> Result<usize> {
    if encoded.bits_per_component != 8 {
        return Err(Error::DecodeFailure(format!(
            "cannot infer layout of {} image with {} bits per component",
            encoded.color_space, encoded.bits_per_component
        )));
    }
    let pixels = encoded.pixel_count().ok_or_else(|| encoded.too_large())?;
    [4, 3, 1]
        .into_iter()
        .find(|&n| pixels.checked_mul(n) == Some(encoded.data.len()))
        .ok_or_else(|| {
            Error::DecodeFailure(format!(
                "cannot infer layout of {} image from {} bytes",
                encoded.color_space,
                encoded.data.len()
            ))
        })
}

fn take_samples(encoded: &EncodedImage, components: usize) -> Result<Vec<u8>> {
    let expected = encoded.sample_len(components)?;
    if encoded.data.len() < expected {
        return Err(Error::DecodeFailure(format!(
            "image data too short: {} bytes, expected {}",
            encoded.data.len(),
            expected
        )));
    }
    Ok(encoded.data[..expected].to_vec())
}

/// Expand 1-bit samples (rows padded to whole bytes) into 8-bit gray.
fn unpack_bilevel(encoded: &EncodedImage) -> Result<GrayImage> {
    let width = encoded.width as usize;
    let row_bytes = width.div_ceil(8);
    let expected = row_bytes
        .checked_mul(encoded.height as usize)
        .ok_or_else(|| encoded.too_large())?;
    if encoded.data.len() < expected {
        return Err(Error::DecodeFailure(format!(
            "bilevel data too short: {} bytes, expected {}",
            encoded.data.len(),
            expected
        )));
    }

    let mut pixels = Vec::with_capacity(encoded.sample_len(1)?);
    for row in encoded.data[..expected].chunks(row_bytes) {
        for x in 0..width {
            let bit = (row[x / 8] >> (7 - (x % 8))) & 1;
            pixels.push(if bit == 1 { 255 } else { 0 });
        }
    }

    GrayImage::from_raw(encoded.width, encoded.height, pixels)
        .ok_or_else(|| Error::DecodeFailure("bilevel buffer mismatch".into()))
}

fn cmyk_to_rgb(data: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(data.len() / 4 * 3);
    for px in data.chunks_exact(4) {
        let k = 255 - u16::from(px[3]);
        for channel in &px[..3] {
            rgb.push(((255 - u16::from(*channel)) * k / 255) as u8);
        }
    }
    rgb
}

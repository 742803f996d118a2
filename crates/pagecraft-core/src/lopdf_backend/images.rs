//! Image XObjects from PNG and JPEG bytes
//!
//! JPEG data is embedded as-is behind DCTDecode. PNG is decoded to 8-bit samples,
//! split into colour and alpha planes and Flate-compressed; alpha becomes an SMask.

use crate::annotation::ImageKind;
use crate::error::{EngineError, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Document, ObjectId, Stream};
use std::io::Write;

/// Pixel size of an embedded image and the id of its XObject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ImageXObject {
    pub id: ObjectId,
    pub width: u32,
    pub height: u32,
}

pub(crate) fn embed(doc: &mut Document, kind: ImageKind, data: &[u8]) -> Result<ImageXObject> {
    match kind {
        ImageKind::Jpeg => embed_jpeg(doc, data),
        ImageKind::Png => embed_png(doc, data),
    }
}

fn embed_jpeg(doc: &mut Document, data: &[u8]) -> Result<ImageXObject> {
    let header = jpeg_header(data)
        .ok_or_else(|| EngineError::InvalidInput("JPEG image has no frame header".into()))?;

    let color_space = match header.components {
        1 => "DeviceGray",
        3 => "DeviceRGB",
        4 => "DeviceCMYK",
        n => {
            return Err(EngineError::InvalidInput(format!(
                "JPEG with {} components is not supported",
                n
            )))
        }
    };

    let mut stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => header.width as i64,
            "Height" => header.height as i64,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        data.to_vec(),
    );
    stream.allows_compression = false;

    let id = doc.add_object(stream);
    Ok(ImageXObject {
        id,
        width: header.width,
        height: header.height,
    })
}

fn embed_png(doc: &mut Document, data: &[u8]) -> Result<ImageXObject> {
    let decoded = decode_png(data)?;

    let smask_id = match &decoded.alpha {
        Some(alpha) => {
            let smask = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => decoded.width as i64,
                    "Height" => decoded.height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                    "Filter" => "FlateDecode",
                },
                deflate(alpha)?,
            );
            Some(doc.add_object(smask))
        }
        None => None,
    };

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => decoded.width as i64,
        "Height" => decoded.height as i64,
        "ColorSpace" => if decoded.gray { "DeviceGray" } else { "DeviceRGB" },
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };
    if let Some(smask_id) = smask_id {
        dict.set("SMask", smask_id);
    }

    let id = doc.add_object(Stream::new(dict, deflate(&decoded.color)?));
    Ok(ImageXObject {
        id,
        width: decoded.width,
        height: decoded.height,
    })
}

#[derive(Debug)]
struct DecodedPng {
    width: u32,
    height: u32,
    gray: bool,
    color: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

fn decode_png(data: &[u8]) -> Result<DecodedPng> {
    let invalid =
        |e: png::DecodingError| EngineError::InvalidInput(format!("PNG decode failed: {}", e));

    let mut decoder = png::Decoder::new(data);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info().map_err(invalid)?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).map_err(invalid)?;
    buf.truncate(info.buffer_size());

    let (channels, gray, has_alpha) = match info.color_type {
        png::ColorType::Grayscale => (1, true, false),
        png::ColorType::GrayscaleAlpha => (2, true, true),
        png::ColorType::Rgb => (3, false, false),
        png::ColorType::Rgba => (4, false, true),
        png::ColorType::Indexed => {
            return Err(EngineError::InvalidInput(
                "PNG palette was not expanded".into(),
            ))
        }
    };

    if !has_alpha {
        return Ok(DecodedPng {
            width: info.width,
            height: info.height,
            gray,
            color: buf,
            alpha: None,
        });
    }

    let color_channels = channels - 1;
    let pixels = buf.len() / channels;
    let mut color = Vec::with_capacity(pixels * color_channels);
    let mut alpha = Vec::with_capacity(pixels);
    for pixel in buf.chunks_exact(channels) {
        color.extend_from_slice(&pixel[..color_channels]);
        alpha.push(pixel[color_channels]);
    }

    Ok(DecodedPng {
        width: info.width,
        height: info.height,
        gray,
        color,
        alpha: Some(alpha),
    })
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let failed =
        |e: std::io::Error| EngineError::RenderFailure(format!("compression failed: {}", e));

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(failed)?;
    encoder.finish().map_err(failed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct JpegHeader {
    width: u32,
    height: u32,
    components: u8,
}

/// Dimensions and component count from the first SOFn segment.
fn jpeg_header(data: &[u8]) -> Option<JpegHeader> {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return None;
    }

    let mut pos = 2;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        pos += 2;

        match marker {
            // Fill bytes and standalone markers carry no length.
            0xFF => {
                pos -= 1;
                continue;
            }
            0x01 | 0xD0..=0xD7 => continue,
            0xD9 | 0xDA => return None,
            _ => {}
        }

        let length = u16::from_be_bytes([*data.get(pos)?, *data.get(pos + 1)?]) as usize;
        let is_frame = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            let segment = data.get(pos..pos + 8)?;
            return Some(JpegHeader {
                height: u16::from_be_bytes([segment[3], segment[4]]) as u32,
                width: u16::from_be_bytes([segment[5], segment[6]]) as u32,
                components: segment[7],
            });
        }
        pos += length;
    }
    None
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Smallest JPEG prefix the header parser accepts: SOI, an APP0 stub and SOF0.
    pub fn jpeg(width: u16, height: u16) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00];
        data.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&[0x03, 1, 0x11, 0, 2, 0x11, 0, 3, 0x11, 0]);
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }

    pub fn png(width: u32, height: u32, color: png::ColorType) -> Vec<u8> {
        let channels = match color {
            png::ColorType::Grayscale => 1,
            png::ColorType::GrayscaleAlpha => 2,
            png::ColorType::Rgb => 3,
            _ => 4,
        };
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, width, height);
            encoder.set_color(color);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            let pixels: Vec<u8> = (0..width * height * channels).map(|i| (i % 251) as u8).collect();
            writer.write_image_data(&pixels).unwrap();
        }
        out
    }
}

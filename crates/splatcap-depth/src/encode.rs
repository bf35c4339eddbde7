use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use png::{BitDepth, ColorType, Encoder};
use serde::{Deserialize, Serialize};

use crate::error::DepthError;
use crate::extract::{DepthExtractionResult, DepthFormat};

/// Magic bytes of a `.npy` file.
pub const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Alignment of the `.npy` header, including magic, version and length field.
const NPY_HEADER_ALIGNMENT: usize = 64;

/// Metadata written next to raw float32 depth maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthMetadata {
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Smallest sample.
    pub min_depth: f32,
    /// Largest sample.
    pub max_depth: f32,
    /// Sample type, always `float32`.
    pub format: String,
    /// Sample units.
    pub units: String,
}

impl DepthMetadata {
    /// Metadata of a depth result.
    pub fn from_result(result: &DepthExtractionResult) -> Self {
        Self {
            width: result.width,
            height: result.height,
            min_depth: result.min_depth,
            max_depth: result.max_depth,
            format: "float32".to_string(),
            units: if result.in_meters {
                "meters"
            } else {
                "centimeters"
            }
            .to_string(),
        }
    }
}

/// Save a depth map in the requested format.
///
/// # Returns
///
/// The path of the depth data actually written. [`DepthFormat::Exr32`] writes
/// `<stem>.depth.raw` and a `<stem>.depth.json` sidecar instead of `path`.
pub fn save_depth(
    result: &DepthExtractionResult,
    path: impl AsRef<Path>,
    format: DepthFormat,
) -> Result<PathBuf, DepthError> {
    if !result.is_valid() {
        return Err(DepthError::InvalidResult);
    }
    let path = path.as_ref();

    let written = match format {
        DepthFormat::Png16 => {
            write_depth_png(result, path)?;
            path.to_path_buf()
        }
        DepthFormat::Exr32 => {
            let raw_path = path.with_extension("depth.raw");
            std::fs::write(&raw_path, encode_raw(&result.data))?;
            let metadata = serde_json::to_string(&DepthMetadata::from_result(result))?;
            std::fs::write(path.with_extension("depth.json"), metadata)?;
            raw_path
        }
        DepthFormat::Npy => {
            std::fs::write(path, encode_npy(result))?;
            path.to_path_buf()
        }
        DepthFormat::RawFloat32 => {
            std::fs::write(path, encode_raw(&result.data))?;
            path.to_path_buf()
        }
    };

    log::debug!("saved {:?} depth to {}", format, written.display());

    Ok(written)
}

/// Depth normalized to the full `u16` range over `[min_depth, max_depth]`.
pub fn normalize_depth_u16(result: &DepthExtractionResult) -> Vec<u16> {
    let mut range = result.max_depth - result.min_depth;
    if range <= 0.0 {
        range = 1.0;
    }
    result
        .data
        .iter()
        .map(|&d| (((d - result.min_depth) / range).clamp(0.0, 1.0) * 65535.0) as u16)
        .collect()
}

// 8 bit grayscale from the high byte of the 16 bit normalization.
fn write_depth_png(result: &DepthExtractionResult, path: &Path) -> Result<(), DepthError> {
    let pixels = normalize_depth_u16(result)
        .into_iter()
        .map(|v| (v >> 8) as u8)
        .collect::<Vec<_>>();

    let file = BufWriter::new(File::create(path)?);
    let mut encoder = Encoder::new(file, result.width as u32, result.height as u32);
    encoder.set_color(ColorType::Grayscale);
    encoder.set_depth(BitDepth::Eight);

    let mut writer = encoder
        .write_header()
        .map_err(|e| DepthError::PngEncodingError(e.to_string()))?;
    writer
        .write_image_data(&pixels)
        .map_err(|e| DepthError::PngEncodingError(e.to_string()))?;
    Ok(())
}

/// Little-endian float32 samples.
pub fn encode_raw(data: &[f32]) -> Vec<u8> {
    data.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// `.npy` version 1.0 header of a `(height, width)` little-endian float32 array.
///
/// The header is padded with spaces and a trailing newline so that its total length is a
/// multiple of 64 bytes.
pub fn npy_header(width: usize, height: usize) -> Vec<u8> {
    let mut dict =
        format!("{{'descr': '<f4', 'fortran_order': False, 'shape': ({height}, {width}), }}");

    // magic (6) + version (2) + header length (2) + dict + '\n'
    let unpadded = NPY_MAGIC.len() + 4 + dict.len() + 1;
    let padding = (NPY_HEADER_ALIGNMENT - unpadded % NPY_HEADER_ALIGNMENT) % NPY_HEADER_ALIGNMENT;
    dict.extend(std::iter::repeat(' ').take(padding));
    dict.push('\n');

    let mut header = Vec::with_capacity(unpadded + padding);
    header.extend_from_slice(NPY_MAGIC);
    header.extend_from_slice(&[1, 0]);
    header.extend_from_slice(&(dict.len() as u16).to_le_bytes());
    header.extend_from_slice(dict.as_bytes());
    header
}

/// A complete `.npy` file of the depth samples.
pub fn encode_npy(result: &DepthExtractionResult) -> Vec<u8> {
    let mut bytes = npy_header(result.width, result.height);
    bytes.extend(encode_raw(&result.data));
    bytes
}

/// Write a depth map to any writer in the `.npy` layout.
pub fn write_npy<W: Write>(writer: &mut W, result: &DepthExtractionResult) -> Result<(), DepthError> {
    writer.write_all(&npy_header(result.width, result.height))?;
    writer.write_all(&encode_raw(&result.data))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{extract_depth, DepthExtractionConfig};

    fn result() -> DepthExtractionResult {
        let config = DepthExtractionConfig::default();
        let raw = [1.0, 0.5, 0.25, 0.1, 0.05, 0.0];
        match extract_depth(&raw, 3, 2, &config) {
            Ok(result) => result,
            Err(e) => panic!("extraction failed: {e}"),
        }
    }

    #[test]
    fn test_npy_header() {
        for (width, height) in [(3, 2), (1920, 1080), (1, 1), (12345, 67890)] {
            let header = npy_header(width, height);
            assert_eq!(header.len() % 64, 0);
            assert_eq!(&header[0..6], NPY_MAGIC);
            assert_eq!(&header[6..8], &[1, 0]);
            let dict_len = u16::from_le_bytes([header[8], header[9]]) as usize;
            assert_eq!(dict_len + 10, header.len());
            assert_eq!(header.last(), Some(&b'\n'));

            let dict = String::from_utf8_lossy(&header[10..]);
            assert!(dict.contains("'descr': '<f4'"));
            assert!(dict.contains(&format!("'shape': ({height}, {width})")));
        }
    }

    #[test]
    fn test_encode_npy() {
        let result = result();
        let bytes = encode_npy(&result);
        let header_len = npy_header(3, 2).len();
        assert_eq!(bytes.len(), header_len + 6 * 4);
        assert_eq!(&bytes[header_len..header_len + 4], &result.data[0].to_le_bytes());

        let mut written = Vec::new();
        assert!(write_npy(&mut written, &result).is_ok());
        assert_eq!(written, bytes);
    }

    #[test]
    fn test_save_exr_sidecar() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let result = result();

        let written = save_depth(&result, dir.path().join("depth_00000.exr"), DepthFormat::Exr32)?;
        assert_eq!(written, dir.path().join("depth_00000.depth.raw"));
        assert_eq!(std::fs::read(&written)?, encode_raw(&result.data));

        let json = std::fs::read_to_string(dir.path().join("depth_00000.depth.json"))?;
        let metadata: DepthMetadata = serde_json::from_str(&json)?;
        assert_eq!(metadata.width, 3);
        assert_eq!(metadata.height, 2);
        assert_eq!(metadata.format, "float32");
        assert_eq!(metadata.units, "meters");
        assert_eq!(metadata.max_depth, result.max_depth);
        assert!(json.starts_with("{\"width\":3,\"height\":2,"));
        Ok(())
    }

    #[test]
    fn test_save_png_and_raw() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let result = result();

        let path = save_depth(&result, dir.path().join("depth.png"), DepthFormat::Png16)?;
        let decoder = png::Decoder::new(File::open(&path)?);
        let mut reader = decoder.read_info()?;
        let mut pixels = vec![0u8; reader.output_buffer_size()];
        let info = reader.next_frame(&mut pixels)?;
        assert_eq!((info.width, info.height), (3, 2));
        assert_eq!(info.color_type, ColorType::Grayscale);
        assert_eq!(pixels[0], 0);
        assert_eq!(pixels[5], 255);

        let path = save_depth(&result, dir.path().join("depth.raw"), DepthFormat::RawFloat32)?;
        assert_eq!(std::fs::metadata(path)?.len(), 24);
        Ok(())
    }

    #[test]
    fn test_save_invalid_result() {
        let result = DepthExtractionResult {
            width: 2,
            height: 2,
            data: vec![1.0],
            min_depth: 1.0,
            max_depth: 1.0,
            near_plane: 0.1,
            far_plane: 10.0,
            is_linear: true,
            in_meters: true,
        };
        assert!(matches!(
            save_depth(&result, "unused.raw", DepthFormat::RawFloat32),
            Err(DepthError::InvalidResult)
        ));
    }

    #[test]
    fn test_normalize_depth_u16() {
        let normalized = normalize_depth_u16(&result());
        assert_eq!(normalized[0], 0);
        assert_eq!(normalized[5], u16::MAX);
        assert!(normalized.windows(2).all(|w| w[0] <= w[1]));
    }
}

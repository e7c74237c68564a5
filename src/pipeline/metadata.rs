/// Binary image metadata extraction
///
/// Recovers width/height straight from the container header bytes - no
/// decoder involved. Only PNG and BMP are parsed; every other image
/// extension, short buffer, or signature mismatch comes back as (0, 0).
/// This stage can never fail an asset.

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Bytes of header needed to cover both supported formats
pub const HEADER_PREFIX_LEN: usize = 64;

/// Extract image dimensions from raw header bytes
///
/// The extension picks the parser; the parsers validate signatures and
/// bounds themselves and fall back to (0, 0) instead of erroring.
pub fn read_image_dimensions(bytes: &[u8], extension: &str) -> (u32, u32) {
    match extension.trim_start_matches('.').to_lowercase().as_str() {
        "png" => png_dimensions(bytes),
        "bmp" => bmp_dimensions(bytes),
        _ => (0, 0),
    }
}

/// Convenience wrapper: read the bounded header prefix from disk
///
/// Any I/O failure is swallowed per the non-critical contract - the
/// caller records no dimensions and the asset still completes.
pub fn read_image_dimensions_from_file(path: &Path, extension: &str) -> Option<(u32, u32)> {
    let mut file = File::open(path).ok()?;
    let mut header = [0u8; HEADER_PREFIX_LEN];
    let bytes_read = file.read(&mut header).ok()?;
    Some(read_image_dimensions(&header[..bytes_read], extension))
}

/// PNG: width/height are big-endian u32s inside the IHDR chunk,
/// at byte offsets 16 and 20
fn png_dimensions(bytes: &[u8]) -> (u32, u32) {
    if bytes.len() <= 24 || bytes[0] != 0x89 || bytes[1] != b'P' {
        return (0, 0);
    }
    let width = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
    let height = u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
    (width, height)
}

/// BMP: width/height are little-endian 32-bit integers at byte offsets
/// 18 and 22; a negative height marks top-down row order, so its
/// absolute value is the real pixel height
fn bmp_dimensions(bytes: &[u8]) -> (u32, u32) {
    if bytes.len() <= 26 || bytes[0] != b'B' || bytes[1] != b'M' {
        return (0, 0);
    }
    let width = u32::from_le_bytes([bytes[18], bytes[19], bytes[20], bytes[21]]);
    let height = i32::from_le_bytes([bytes[22], bytes[23], bytes[24], bytes[25]]);
    (width, height.unsigned_abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a minimal PNG-signed buffer with the given dimensions at
    /// the IHDR offsets
    fn png_header(width: u32, height: u32, len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        bytes[0] = 0x89;
        bytes[1] = b'P';
        if len >= 24 {
            bytes[16..20].copy_from_slice(&width.to_be_bytes());
            bytes[20..24].copy_from_slice(&height.to_be_bytes());
        }
        bytes
    }

    /// Build a minimal BMP-signed buffer with the given dimensions at
    /// the info-header offsets
    fn bmp_header(width: u32, height: i32, len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        bytes[0] = b'B';
        bytes[1] = b'M';
        if len >= 26 {
            bytes[18..22].copy_from_slice(&width.to_le_bytes());
            bytes[22..26].copy_from_slice(&height.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_png_exact_dimensions_from_25_byte_buffer() {
        let bytes = png_header(32, 64, 25);
        assert_eq!(read_image_dimensions(&bytes, "png"), (32, 64));
    }

    #[test]
    fn test_png_buffer_of_24_or_less_yields_zero() {
        assert_eq!(read_image_dimensions(&png_header(32, 64, 24), "png"), (0, 0));
        assert_eq!(read_image_dimensions(&png_header(32, 64, 10), "png"), (0, 0));
        assert_eq!(read_image_dimensions(&[], "png"), (0, 0));
    }

    #[test]
    fn test_png_signature_mismatch_yields_zero() {
        let mut bytes = png_header(32, 64, 32);
        bytes[0] = 0x00;
        assert_eq!(read_image_dimensions(&bytes, "png"), (0, 0));
    }

    #[test]
    fn test_bmp_dimensions() {
        let bytes = bmp_header(640, 480, 32);
        assert_eq!(read_image_dimensions(&bytes, "bmp"), (640, 480));
    }

    #[test]
    fn test_bmp_negative_height_is_absolute() {
        let bytes = bmp_header(640, -480, 32);
        assert_eq!(read_image_dimensions(&bytes, "bmp"), (640, 480));
    }

    #[test]
    fn test_bmp_short_buffer_yields_zero() {
        assert_eq!(read_image_dimensions(&bmp_header(640, 480, 26), "bmp"), (0, 0));
    }

    #[test]
    fn test_unparsed_image_extensions_yield_zero() {
        let bytes = png_header(32, 64, 32);
        assert_eq!(read_image_dimensions(&bytes, "jpg"), (0, 0));
        assert_eq!(read_image_dimensions(&bytes, "tga"), (0, 0));
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let bytes = png_header(32, 64, 25);
        assert_eq!(read_image_dimensions(&bytes, ".PNG"), (32, 64));
    }
}

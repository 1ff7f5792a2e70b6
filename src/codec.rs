use image::codecs::png::PngEncoder;
use image::{ImageBuffer, Rgb, RgbaImage};

/// Encode raw RGB pixel data as PNG.
pub fn encode_png(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, String> {
    let img: ImageBuffer<Rgb<u8>, _> = ImageBuffer::from_raw(width, height, data)
        .ok_or_else(|| format!("buffer of {} bytes is not {width}x{height} RGB", data.len()))?;

    let mut buf = Vec::new();
    let encoder = PngEncoder::new(&mut buf);
    img.write_with_encoder(encoder)
        .map_err(|e| format!("PNG encoding failed: {e}"))?;
    Ok(buf)
}

/// Encode an RGBA image as PNG.
pub fn encode_png_rgba(img: &RgbaImage) -> Result<Vec<u8>, String> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new(&mut buf);
    img.write_with_encoder(encoder)
        .map_err(|e| format!("PNG encoding failed: {e}"))?;
    Ok(buf)
}

/// Decode an encoded raster (PNG or JPEG) into RGBA.
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage, String> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| e.to_string())
}

/// Resize an RGBA image to exactly `width` x `height`, ignoring aspect ratio.
///
/// Uses `fast_image_resize` for SIMD-accelerated resizing.
pub fn stretch_rgba(img: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage, String> {
    use fast_image_resize as fr;
    use fr::images::Image;

    if img.width() == width && img.height() == height {
        return Ok(img.clone());
    }

    let src_image = Image::from_vec_u8(
        img.width(),
        img.height(),
        img.as_raw().clone(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| e.to_string())?;

    let mut dst_image = Image::new(width, height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, None)
        .map_err(|e| e.to_string())?;

    RgbaImage::from_raw(width, height, dst_image.into_vec())
        .ok_or_else(|| "resized buffer has unexpected length".to_string())
}

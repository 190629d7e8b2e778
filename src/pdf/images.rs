use base64::Engine;
use pdf_writer::{Filter, Pdf, Ref};

use crate::error::{Error, Result};

pub(super) enum Pixels {
    /// Baseline RGB JPEG, embedded as-is with DCTDecode.
    Jpeg(Vec<u8>),
    Raster { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

pub(super) struct DecodedImage {
    pub(super) width: u32,
    pub(super) height: u32,
    pub(super) pixels: Pixels,
}

/// Decode a `data:image/...;base64,` URL. Anything unreadable is an export failure.
pub(super) fn decode_data_url(url: &str) -> Result<DecodedImage> {
    let fail = |msg: String| Error::ExportCapture(format!("photo could not be read: {msg}"));

    let rest = url
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| fail("not a data URL".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| fail("missing data URL payload".into()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| fail("data URL is not base64-encoded".into()))?;
    let format = match mime.to_ascii_lowercase().as_str() {
        "image/png" => image::ImageFormat::Png,
        "image/jpeg" | "image/jpg" => image::ImageFormat::Jpeg,
        other => return Err(fail(format!("unsupported image type {other:?}"))),
    };

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| fail(e.to_string()))?;
    let decoded = image::load_from_memory_with_format(&bytes, format).map_err(|e| fail(e.to_string()))?;
    let (width, height) = (decoded.width(), decoded.height());
    if width == 0 || height == 0 {
        return Err(fail("image has no pixels".into()));
    }

    if format == image::ImageFormat::Jpeg && decoded.color() == image::ColorType::Rgb8 {
        return Ok(DecodedImage {
            width,
            height,
            pixels: Pixels::Jpeg(bytes),
        });
    }

    let rgba = decoded.to_rgba8();
    let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);
    let rgb = rgba.pixels().flat_map(|p| [p.0[0], p.0[1], p.0[2]]).collect();
    let alpha = has_alpha.then(|| rgba.pixels().map(|p| p.0[3]).collect());
    Ok(DecodedImage {
        width,
        height,
        pixels: Pixels::Raster { rgb, alpha },
    })
}

/// Write the image XObject (plus a soft mask for alpha) and return its ref.
pub(super) fn embed_image(pdf: &mut Pdf, img: &DecodedImage, alloc: &mut impl FnMut() -> Ref) -> Ref {
    let xobj_ref = alloc();
    let (w, h) = (img.width as i32, img.height as i32);

    match &img.pixels {
        Pixels::Jpeg(data) => {
            let mut xobj = pdf.image_xobject(xobj_ref, data);
            xobj.filter(Filter::DctDecode);
            xobj.width(w);
            xobj.height(h);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
        }
        Pixels::Raster { rgb, alpha } => {
            let smask_ref = alpha.as_ref().map(|alpha| {
                let compressed = miniz_oxide::deflate::compress_to_vec_zlib(alpha, 6);
                let mask_ref = alloc();
                let mut mask = pdf.image_xobject(mask_ref, &compressed);
                mask.filter(Filter::FlateDecode);
                mask.width(w);
                mask.height(h);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                mask_ref
            });

            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(rgb, 6);
            let mut xobj = pdf.image_xobject(xobj_ref, &compressed);
            xobj.filter(Filter::FlateDecode);
            xobj.width(w);
            xobj.height(h);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
        }
    }
    xobj_ref
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_data_url(rgba: [u8; 4]) -> String {
        let img = image::RgbaImage::from_pixel(2, 3, image::Rgba(rgba));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(buf.into_inner())
        )
    }

    #[test]
    fn decodes_png_with_alpha() {
        let img = decode_data_url(&png_data_url([10, 20, 30, 128])).unwrap();
        assert_eq!((img.width, img.height), (2, 3));
        let Pixels::Raster { rgb, alpha } = img.pixels else {
            panic!("expected raster");
        };
        assert_eq!(&rgb[..3], &[10, 20, 30]);
        assert_eq!(alpha.unwrap().len(), 6);
    }

    #[test]
    fn opaque_png_has_no_mask() {
        let img = decode_data_url(&png_data_url([1, 2, 3, 255])).unwrap();
        assert!(matches!(img.pixels, Pixels::Raster { alpha: None, .. }));
    }

    #[test]
    fn rejects_unreadable_photos() {
        for url in [
            "https://example.com/me.png",
            "data:image/png;base64",
            "data:image/png,plain",
            "data:image/gif;base64,R0lGOD",
            "data:image/png;base64,!!!",
            "data:image/png;base64,aGVsbG8=",
        ] {
            assert!(matches!(decode_data_url(url), Err(Error::ExportCapture(_))), "{url}");
        }
    }
}

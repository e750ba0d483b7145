use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pdf_writer::{Filter, Pdf, Ref};

use crate::error::Error;

const DATA_URI_PREFIX: &str = "data:image/";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    fn codec(self) -> image::ImageFormat {
        match self {
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Png => image::ImageFormat::Png,
        }
    }
}

/// An encoded raster image ready to be written as a PDF image XObject.
#[derive(Clone, Debug)]
pub struct EmbeddedImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

/// True for a self-describing embedded-image string (`data:image/...`).
/// Only this prefix is checked; whether the payload decodes is a separate question.
pub fn is_embedded_image(value: &str) -> bool {
    value.starts_with(DATA_URI_PREFIX)
}

impl EmbeddedImage {
    /// Parse `data:image/<png|jpeg>;base64,<payload>`.
    pub fn from_data_uri(uri: &str) -> Result<Self, Error> {
        let rest = uri
            .strip_prefix(DATA_URI_PREFIX)
            .ok_or_else(|| Error::InvalidInput("not an embedded image".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| Error::InvalidInput("data URI has no payload".into()))?;

        let mut params = header.split(';');
        let subtype = params.next().unwrap_or("").to_ascii_lowercase();
        if !params.any(|p| p.eq_ignore_ascii_case("base64")) {
            return Err(Error::InvalidInput("data URI is not base64 encoded".into()));
        }
        let format = match subtype.as_str() {
            "png" => ImageFormat::Png,
            "jpeg" | "jpg" | "pjpeg" => ImageFormat::Jpeg,
            other => {
                return Err(Error::InvalidInput(format!("unsupported image type: image/{other}")));
            }
        };

        let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let data = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| Error::InvalidInput(format!("base64 decode error: {e}")))?;
        Self::with_format(data, format)
    }

    /// Sniff the format from the file signature. Used for logo files.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, Error> {
        let format = match image::guess_format(&data) {
            Ok(image::ImageFormat::Png) => ImageFormat::Png,
            Ok(image::ImageFormat::Jpeg) => ImageFormat::Jpeg,
            Ok(other) => {
                return Err(Error::InvalidInput(format!("unsupported image format: {other:?}")));
            }
            Err(e) => return Err(Error::InvalidInput(e.to_string())),
        };
        Self::with_format(data, format)
    }

    fn with_format(data: Vec<u8>, format: ImageFormat) -> Result<Self, Error> {
        let reader = image::ImageReader::with_format(
            std::io::BufReader::new(std::io::Cursor::new(&data)),
            format.codec(),
        );
        let (pixel_width, pixel_height) = reader
            .into_dimensions()
            .map_err(|e| Error::InvalidInput(format!("undecodable image: {e}")))?;
        if pixel_width == 0 || pixel_height == 0 {
            return Err(Error::InvalidInput("image has zero size".into()));
        }
        let img = EmbeddedImage {
            data,
            format,
            pixel_width,
            pixel_height,
        };
        // Anything re-encoded at write time must decode in full here.
        if img.needs_reencode() {
            img.decode()?;
        }
        Ok(img)
    }

    /// False only for JPEG that can be passed through as DCT.
    fn needs_reencode(&self) -> bool {
        match self.format {
            ImageFormat::Png => true,
            ImageFormat::Jpeg => !matches!(jpeg_components(&self.data), Some(1) | Some(3)),
        }
    }

    fn decode(&self) -> Result<image::DynamicImage, Error> {
        image::load_from_memory_with_format(&self.data, self.format.codec())
            .map_err(|e| Error::InvalidInput(format!("undecodable image: {e}")))
    }

    /// Largest size with the image's aspect ratio that fits in `max_w` x `max_h`.
    pub fn fit_within(&self, max_w: f32, max_h: f32) -> (f32, f32) {
        let scale = (max_w / self.pixel_width as f32).min(max_h / self.pixel_height as f32);
        (self.pixel_width as f32 * scale, self.pixel_height as f32 * scale)
    }
}

/// Number of colour components declared in a JPEG's start-of-frame header.
fn jpeg_components(data: &[u8]) -> Option<u8> {
    let mut i = 2;
    while i + 9 < data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }
        let marker = data[i + 1];
        let len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            return Some(data[i + 9]);
        }
        i += 2 + len;
    }
    None
}

fn write_flate_rgb(
    pdf: &mut Pdf,
    xobj_ref: Ref,
    rgba: &image::RgbaImage,
    alloc: &mut dyn FnMut() -> Ref,
) {
    let (w, h) = (rgba.width(), rgba.height());
    let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);

    let rgb_data: Vec<u8> = rgba
        .pixels()
        .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
        .collect();
    let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6);

    let smask_ref = if has_alpha {
        let alpha_data: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
        let compressed_alpha = miniz_oxide::deflate::compress_to_vec_zlib(&alpha_data, 6);
        let mask_ref = alloc();
        let mut mask = pdf.image_xobject(mask_ref, &compressed_alpha);
        mask.filter(Filter::FlateDecode);
        mask.width(w as i32);
        mask.height(h as i32);
        mask.color_space().device_gray();
        mask.bits_per_component(8);
        Some(mask_ref)
    } else {
        None
    };

    let mut xobj = pdf.image_xobject(xobj_ref, &compressed_rgb);
    xobj.filter(Filter::FlateDecode);
    xobj.width(w as i32);
    xobj.height(h as i32);
    xobj.color_space().device_rgb();
    xobj.bits_per_component(8);
    if let Some(mask_ref) = smask_ref {
        xobj.s_mask(mask_ref);
    }
}

/// Write `img` as an image XObject at `xobj_ref`. JPEG with one or three
/// components is passed through as DCT; everything else is re-encoded as Flate.
pub(crate) fn write_image_xobject(
    pdf: &mut Pdf,
    img: &EmbeddedImage,
    xobj_ref: Ref,
    alloc: &mut dyn FnMut() -> Ref,
) -> Result<(), Error> {
    if !img.needs_reencode() {
        let mut xobj = pdf.image_xobject(xobj_ref, &img.data);
        xobj.filter(Filter::DctDecode);
        xobj.width(img.pixel_width as i32);
        xobj.height(img.pixel_height as i32);
        if jpeg_components(&img.data) == Some(1) {
            xobj.color_space().device_gray();
        } else {
            xobj.color_space().device_rgb();
        }
        xobj.bits_per_component(8);
        return Ok(());
    }
    if img.format == ImageFormat::Jpeg {
        log::debug!(
            "JPEG with {:?} components, re-encoding as RGB",
            jpeg_components(&img.data)
        );
    }

    let decoded = img
        .decode()
        .map_err(|e| Error::Pdf(format!("image decode failed: {e}")))?;
    write_flate_rgb(pdf, xobj_ref, &decoded.to_rgba8(), alloc);
    Ok(())
}

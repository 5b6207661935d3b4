/// Sampled 2D textures with a full mip chain
///
/// A `Texture` owns one image (plus its view and allocation) and one sampler.
/// Pixels come in already decoded as tightly packed RGBA8; the device uploads
/// mip 0 and blits the rest of the chain, leaving the image in
/// `ShaderReadOnly`.

use crate::engine_bail;
use crate::error::{Error, Result};
use crate::graphics_device::{
    AddressMode, Extent2D, Filter, Format, GraphicsDevice, ImageDesc, ImageKey, ImageUsage,
    SampleCount, SamplerDesc, SamplerKey,
};

// ===== RAW IMAGE =====

/// Decoded RGBA8 pixels, row-major, no padding
#[derive(Debug, Clone, PartialEq)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RawImage {
    /// Single-color image, handy as a placeholder
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        Self { width, height, pixels }
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidResource(format!(
                "texture '{}' has zero size ({}x{})",
                name, self.width, self.height
            )));
        }
        let expected = self.width as usize * self.height as usize * 4;
        if self.pixels.len() != expected {
            return Err(Error::InvalidResource(format!(
                "texture '{}' has {} bytes, expected {} for {}x{} RGBA8",
                name,
                self.pixels.len(),
                expected,
                self.width,
                self.height
            )));
        }
        Ok(())
    }
}

// ===== TEXTURE KIND =====

/// Material channel a texture feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Albedo = 0,
    Normal = 1,
    Metallic = 2,
    Roughness = 3,
    Ao = 4,
}

impl TextureKind {
    /// All kinds, in slot order
    pub const ALL: [TextureKind; 5] = [
        TextureKind::Albedo,
        TextureKind::Normal,
        TextureKind::Metallic,
        TextureKind::Roughness,
        TextureKind::Ao,
    ];

    /// Slot index inside a mesh
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Normal maps hold vectors and stay linear; everything else is color data
    pub fn format(&self) -> Format {
        match self {
            TextureKind::Normal => Format::R8G8B8A8_UNORM,
            _ => Format::R8G8B8A8_SRGB,
        }
    }
}

/// Number of mip levels for a full chain: floor(log2(max(w, h))) + 1
pub fn mip_levels(width: u32, height: u32) -> u32 {
    let largest = width.max(height).max(1);
    32 - largest.leading_zeros()
}

// ===== TEXTURE =====

pub struct Texture {
    image: ImageKey,
    sampler: SamplerKey,
    kind: TextureKind,
    extent: Extent2D,
    mip_levels: u32,
}

impl Texture {
    /// Create, upload and mip a texture from decoded pixels
    ///
    /// # Errors
    ///
    /// Fails if the pixel buffer does not match the size, or if the device
    /// cannot create, upload or blit the image. Nothing is leaked on failure.
    pub fn new(
        device: &mut dyn GraphicsDevice,
        name: &str,
        kind: TextureKind,
        raw: &RawImage,
    ) -> Result<Self> {
        raw.validate(name)?;

        let extent = Extent2D::new(raw.width, raw.height);
        let mip_levels = mip_levels(raw.width, raw.height);

        let image = device.create_image(&ImageDesc {
            name: name.to_string(),
            extent,
            format: kind.format(),
            mip_levels,
            samples: SampleCount::S1,
            usage: ImageUsage::TRANSFER_SRC | ImageUsage::TRANSFER_DST | ImageUsage::SAMPLED,
        })?;

        if let Err(e) = device.upload_texture(image, &raw.pixels) {
            device.destroy_image(image);
            engine_bail!("lumen::Texture", "Failed to upload texture '{}': {}", name, e);
        }

        let max_anisotropy = device.max_sampler_anisotropy();
        let sampler = match device.create_sampler(&SamplerDesc {
            filter: Filter::Linear,
            address_mode: AddressMode::Repeat,
            max_anisotropy: Some(max_anisotropy),
            max_lod: mip_levels as f32,
        }) {
            Ok(sampler) => sampler,
            Err(e) => {
                device.destroy_image(image);
                return Err(e);
            }
        };

        Ok(Self { image, sampler, kind, extent, mip_levels })
    }

    pub fn image(&self) -> ImageKey {
        self.image
    }

    pub fn sampler(&self) -> SamplerKey {
        self.sampler
    }

    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    /// Release the sampler, then the image
    pub fn destroy(self, device: &mut dyn GraphicsDevice) {
        device.destroy_sampler(self.sampler);
        device.destroy_image(self.image);
    }
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;

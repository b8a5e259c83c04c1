use std::borrow::Cow;
use std::path::Path;

use anyhow::{ensure, Context};
use image::imageops::{self, FilterType};

/// An RGBA8 picture shown on the card inside the envelope.
#[derive(Debug, Clone)]
pub struct PropImage {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl PropImage {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .with_context(|| format!("Failed to load prop image {}", path.display()))?
            .to_rgba8();

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Prop image".to_string());

        let (width, height) = image.dimensions();
        Self::from_rgba(name, width, height, image.into_raw())
    }

    /// Loads the image if a path is given. Failures are logged and yield `None`.
    pub fn load_optional(path: Option<&Path>) -> Option<Self> {
        let path = path?;
        match Self::load(path) {
            Ok(image) => {
                log::info!(
                    "Loaded prop image {} ({}x{})",
                    image.name,
                    image.width,
                    image.height
                );
                Some(image)
            }
            Err(error) => {
                log::warn!("{:#}, the card stays hidden", error);
                None
            }
        }
    }

    pub fn from_rgba(
        name: impl Into<String>,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> anyhow::Result<Self> {
        ensure!(width > 0 && height > 0, "Prop image has no pixels");
        ensure!(
            pixels.len() == width as usize * height as usize * 4,
            "Prop image is {}x{} but has {} bytes",
            width,
            height,
            pixels.len()
        );

        Ok(Self {
            name: name.into(),
            width,
            height,
            pixels,
        })
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Largest size with the same aspect ratio whose sides are at most
    /// `max_dimension`.
    pub fn fitted_size(&self, max_dimension: u32) -> (u32, u32) {
        let max_dimension = max_dimension.max(1);
        let longest = self.width.max(self.height);
        if longest <= max_dimension {
            return (self.width, self.height);
        }

        let scale = max_dimension as f64 / longest as f64;
        let fit = |side: u32| ((side as f64 * scale).round() as u32).clamp(1, max_dimension);
        (fit(self.width), fit(self.height))
    }

    /// Borrows the image when it already fits, otherwise returns a downscaled copy.
    pub fn fit_within(&self, max_dimension: u32) -> anyhow::Result<Cow<'_, PropImage>> {
        let (width, height) = self.fitted_size(max_dimension);
        if (width, height) == (self.width, self.height) {
            return Ok(Cow::Borrowed(self));
        }

        log::warn!(
            "Prop image {} is {}x{}, scaling down to {}x{}",
            self.name,
            self.width,
            self.height,
            width,
            height
        );

        let source = image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .with_context(|| format!("Prop image {} has inconsistent pixel data", self.name))?;
        let resized = imageops::resize(&source, width, height, FilterType::Triangle);

        Self::from_rgba(self.name.clone(), width, height, resized.into_raw()).map(Cow::Owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_pixel_data() {
        assert!(PropImage::from_rgba("card", 2, 2, vec![0; 16]).is_ok());
        assert!(PropImage::from_rgba("card", 2, 2, vec![0; 12]).is_err());
        assert!(PropImage::from_rgba("card", 0, 2, Vec::new()).is_err());
    }

    #[test]
    fn missing_file_degrades_to_none() {
        let path = Path::new("does/not/exist/bear.png");
        assert!(PropImage::load(path).is_err());
        assert!(PropImage::load_optional(Some(path)).is_none());
        assert!(PropImage::load_optional(None).is_none());
    }

    #[test]
    fn oversized_image_is_scaled_to_the_limit() {
        let image = PropImage::from_rgba("card", 40, 10, vec![200; 40 * 10 * 4]).unwrap();
        assert_eq!(image.fitted_size(16), (16, 4));
        assert_eq!(image.fitted_size(8192), (40, 10));

        let fitted = image.fit_within(16).unwrap();
        assert_eq!((fitted.width, fitted.height), (16, 4));
        assert_eq!(fitted.pixels.len(), 16 * 4 * 4);
        assert_eq!(&fitted.pixels[..4], &[200, 200, 200, 200]);
    }

    #[test]
    fn image_within_the_limit_is_borrowed() {
        let image = PropImage::from_rgba("card", 8, 8, vec![0; 8 * 8 * 4]).unwrap();
        assert!(matches!(image.fit_within(8).unwrap(), Cow::Borrowed(_)));
    }

    #[test]
    fn thin_image_keeps_at_least_one_pixel() {
        let image = PropImage::from_rgba("strip", 9000, 1, vec![0; 9000 * 4]).unwrap();
        assert_eq!(image.fitted_size(8192), (8192, 1));
        assert_eq!(image.fitted_size(0), (1, 1));
    }

    #[test]
    fn aspect_ratio() {
        let image = PropImage::from_rgba("card", 4, 2, vec![255; 32]).unwrap();
        assert_eq!(image.aspect(), 2.0);
    }
}

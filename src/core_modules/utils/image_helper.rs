pub mod image_helper {
    use crate::core_modules::raster::Raster;
    use crate::error::PipelineError;
    use image::ImageEncoder;
    use std::path::Path;

    /// Writes a single-channel raster as an 8-bit grayscale PNG.
    pub fn save_raster(path: &Path, raster: &Raster) -> Result<(), PipelineError> {
        let buffer = raster.to_gray_image()?;

        let output = std::fs::File::create(path)?;
        let encoder = image::codecs::png::PngEncoder::new(std::io::BufWriter::new(output));
        encoder
            .write_image(&buffer, raster.width(), raster.height(), image::ExtendedColorType::L8)
            .map_err(PipelineError::Encode)?;

        Ok(())
    }
}

use std::path::{Path, PathBuf};

use image::imageops::FilterType;

use crate::capture::domain::frame_source::FrameSource;
use crate::shared::frame::Frame;

/// Reads a list of image files as consecutive frames.
///
/// With a target size set, every image is scaled to it on load, the way a
/// camera preview hands the classifier crops already at model resolution.
/// Without one, frames keep their native size.
pub struct ImageFileSource {
    paths: Vec<PathBuf>,
    target_size: Option<(u32, u32)>,
}

impl ImageFileSource {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            target_size: None,
        }
    }

    pub fn with_target_size(mut self, width: u32, height: u32) -> Self {
        self.target_size = Some((width, height));
        self
    }

    fn load(&self, path: &Path, index: usize) -> Result<Frame, Box<dyn std::error::Error>> {
        let mut rgb = image::open(path)
            .map_err(|e| format!("{}: {e}", path.display()))?
            .to_rgb8();
        if let Some((w, h)) = self.target_size {
            if rgb.dimensions() != (w, h) {
                rgb = image::imageops::resize(&rgb, w, h, FilterType::Triangle);
            }
        }
        let (width, height) = rgb.dimensions();
        Ok(Frame::new(rgb.into_raw(), width, height, index)?)
    }
}

impl FrameSource for ImageFileSource {
    fn len_hint(&self) -> Option<usize> {
        Some(self.paths.len())
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        Box::new(
            self.paths
                .iter()
                .enumerate()
                .map(|(index, path)| self.load(path, index)),
        )
    }
}

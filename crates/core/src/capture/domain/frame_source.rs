use crate::shared::frame::Frame;

/// Supplies face crops to classify, one frame at a time.
///
/// Stands in for a camera preview or any other producer of RGB bitmaps.
pub trait FrameSource: Send {
    /// Number of frames the source will yield, if known up front.
    fn len_hint(&self) -> Option<usize>;

    /// Iterator over frames in capture order.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;
}

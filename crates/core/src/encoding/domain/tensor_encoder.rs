//! Pixel-to-tensor conversion for the age/gender network.
//!
//! Every channel value is the raw byte minus the dataset mean for that
//! channel. The encoder owns one scratch tensor that is rewritten on every
//! call, so a pipeline can only have one frame in flight.

use ndarray::{Array4, ArrayView4};

use crate::encoding::domain::layout::Layout;
use crate::shared::constants::CHANNEL_MEANS;
use crate::shared::error::FaceAttributeError;
use crate::shared::frame::{Frame, CHANNELS};

pub struct TensorEncoder {
    width: u32,
    height: u32,
    layout: Layout,
    scratch: Array4<f32>,
}

impl TensorEncoder {
    pub fn new(width: u32, height: u32, layout: Layout) -> Self {
        Self {
            width,
            height,
            layout,
            scratch: Array4::zeros((1, height as usize, width as usize, CHANNELS)),
        }
    }

    /// Encode `frame` into the scratch tensor and return a view of it.
    ///
    /// The frame size is checked before anything is written.
    pub fn encode(&mut self, frame: &Frame) -> Result<ArrayView4<'_, f32>, FaceAttributeError> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(FaceAttributeError::InvalidInputShape {
                expected_width: self.width,
                expected_height: self.height,
                actual_width: frame.width(),
                actual_height: frame.height(),
            });
        }

        match self.layout {
            Layout::Planar => self.fill_planar(frame),
            Layout::FlattenedReversed => self.fill_flattened(frame),
        }
        Ok(self.scratch.view())
    }

    /// Last encoded tensor (zeros before the first successful call).
    pub fn tensor(&self) -> ArrayView4<'_, f32> {
        self.scratch.view()
    }

    // Walks columns outermost; each value still lands at its own pixel's
    // [row][col], so the image is not transposed.
    fn fill_planar(&mut self, frame: &Frame) {
        let src = frame.as_ndarray();
        let (h, w) = (self.height as usize, self.width as usize);
        for col in 0..w {
            for row in 0..h {
                for (c, mean) in CHANNEL_MEANS.iter().enumerate() {
                    self.scratch[[0, row, col, c]] = src[[row, col, c]] as f32 - mean;
                }
            }
        }
    }

    fn fill_flattened(&mut self, frame: &Frame) {
        let layout = self.layout;
        let w = self.width as usize;
        for (i, pixel) in frame.data().chunks_exact(CHANNELS).enumerate() {
            let (row, col) = (i / w, i % w);
            for (c, mean) in CHANNEL_MEANS.iter().enumerate() {
                self.scratch[[0, row, col, layout.channel_slot(c)]] = pixel[c] as f32 - mean;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    fn two_by_two() -> Frame {
        // (row, col): (0,0)=10,20,30 (0,1)=40,50,60 (1,0)=70,80,90 (1,1)=100,110,120
        Frame::new(
            vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100, 110, 120],
            2,
            2,
            0,
        )
        .unwrap()
    }

    #[test]
    fn test_channel_means_are_subtracted() {
        let mut encoder = TensorEncoder::new(4, 4, Layout::Planar);
        let frame = Frame::filled(4, 4, [123, 117, 104], 0);
        let tensor = encoder.encode(&frame).unwrap();

        for row in 0..4 {
            for col in 0..4 {
                assert_abs_diff_eq!(tensor[[0, row, col, 0]], -0.68, epsilon = 1e-4);
                assert_abs_diff_eq!(tensor[[0, row, col, 1]], 0.221, epsilon = 1e-4);
                assert_abs_diff_eq!(tensor[[0, row, col, 2]], 0.061, epsilon = 1e-4);
            }
        }
    }

    #[rstest]
    #[case(Layout::Planar)]
    #[case(Layout::FlattenedReversed)]
    fn test_shape_is_nhwc(#[case] layout: Layout) {
        let mut encoder = TensorEncoder::new(6, 4, layout);
        let tensor = encoder.encode(&Frame::filled(6, 4, [0, 0, 0], 0)).unwrap();
        assert_eq!(tensor.shape(), &[1, 4, 6, 3]);
    }

    #[test]
    fn test_planar_element_order() {
        let mut encoder = TensorEncoder::new(2, 2, Layout::Planar);
        let tensor = encoder.encode(&two_by_two()).unwrap();
        let flat: Vec<f32> = tensor.iter().copied().collect();

        let mut expected = Vec::new();
        for rgb in [[10.0, 20.0, 30.0], [40.0, 50.0, 60.0], [70.0, 80.0, 90.0], [100.0, 110.0, 120.0]] {
            for c in 0..3 {
                expected.push(rgb[c] - CHANNEL_MEANS[c]);
            }
        }
        assert_eq!(flat, expected);
        // Bottom-left pixel stays bottom-left
        assert_abs_diff_eq!(tensor[[0, 1, 0, 0]], 70.0 - 123.68, epsilon = 1e-4);
    }

    #[test]
    fn test_flattened_element_order_is_bgr_row_major() {
        let mut encoder = TensorEncoder::new(2, 2, Layout::FlattenedReversed);
        let tensor = encoder.encode(&two_by_two()).unwrap();
        let flat = tensor.as_slice().unwrap();

        let mut expected = Vec::new();
        for rgb in [[10.0, 20.0, 30.0], [40.0, 50.0, 60.0], [70.0, 80.0, 90.0], [100.0, 110.0, 120.0]] {
            expected.push(rgb[2] - CHANNEL_MEANS[2]);
            expected.push(rgb[1] - CHANNEL_MEANS[1]);
            expected.push(rgb[0] - CHANNEL_MEANS[0]);
        }
        assert_eq!(flat, &expected[..]);
    }

    #[test]
    fn test_flattened_reverses_channels() {
        let mut encoder = TensorEncoder::new(3, 3, Layout::FlattenedReversed);
        let tensor = encoder.encode(&Frame::filled(3, 3, [123, 117, 104], 0)).unwrap();
        assert_abs_diff_eq!(tensor[[0, 2, 2, 0]], 0.061, epsilon = 1e-4);
        assert_abs_diff_eq!(tensor[[0, 2, 2, 1]], 0.221, epsilon = 1e-4);
        assert_abs_diff_eq!(tensor[[0, 2, 2, 2]], -0.68, epsilon = 1e-4);
    }

    #[rstest]
    #[case(3, 4)]
    #[case(4, 3)]
    #[case(8, 8)]
    fn test_wrong_resolution_is_rejected(#[case] width: u32, #[case] height: u32) {
        let mut encoder = TensorEncoder::new(4, 4, Layout::Planar);
        let err = encoder
            .encode(&Frame::filled(width, height, [1, 2, 3], 0))
            .unwrap_err();
        assert!(matches!(
            err,
            FaceAttributeError::InvalidInputShape {
                expected_width: 4,
                expected_height: 4,
                actual_width,
                actual_height,
            } if actual_width == width && actual_height == height
        ));
    }

    #[test]
    fn test_rejected_frame_leaves_previous_tensor_intact() {
        let mut encoder = TensorEncoder::new(2, 2, Layout::Planar);
        encoder.encode(&two_by_two()).unwrap();
        let before = encoder.tensor().to_owned();

        assert!(encoder.encode(&Frame::filled(3, 3, [255, 255, 255], 1)).is_err());

        assert_eq!(encoder.tensor(), before.view());
    }

    #[test]
    fn test_rejected_first_frame_leaves_zeros() {
        let mut encoder = TensorEncoder::new(2, 2, Layout::FlattenedReversed);
        assert!(encoder.encode(&Frame::filled(1, 1, [255, 255, 255], 0)).is_err());
        assert!(encoder.tensor().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_scratch_is_fully_rewritten() {
        let mut encoder = TensorEncoder::new(2, 2, Layout::Planar);
        encoder.encode(&Frame::filled(2, 2, [255, 255, 255], 0)).unwrap();
        let tensor = encoder.encode(&Frame::filled(2, 2, [0, 0, 0], 1)).unwrap();
        assert_abs_diff_eq!(tensor[[0, 1, 1, 2]], -103.939, epsilon = 1e-4);
    }

    #[rstest]
    #[case(Layout::Planar)]
    #[case(Layout::FlattenedReversed)]
    fn test_no_values_carry_over_between_frames(#[case] layout: Layout) {
        let mut encoder = TensorEncoder::new(2, 2, layout);
        encoder.encode(&Frame::filled(2, 2, [0, 0, 0], 0)).unwrap();
        let first: Vec<f32> = encoder.tensor().iter().copied().collect();

        let second: Vec<f32> = encoder
            .encode(&Frame::filled(2, 2, [200, 200, 200], 1))
            .unwrap()
            .iter()
            .copied()
            .collect();

        assert_eq!(second.len(), 12);
        for (a, b) in first.iter().zip(&second) {
            assert_abs_diff_eq!(b - a, 200.0, epsilon = 1e-3);
        }
    }
}

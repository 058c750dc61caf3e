pub const MODEL_NAME: &str = "age_gender_tf2_new-01-0.14-0.92.onnx";

/// Square input resolution of the bundled age/gender network.
pub const INPUT_SIZE: u32 = 224;

/// Per-channel dataset means in R, G, B order.
pub const CHANNEL_MEANS: [f32; 3] = [123.68, 116.779, 103.939];

/// Number of one-year age bins (0..99).
pub const AGE_BINS: usize = 100;
pub const EMBEDDING_DIM: usize = 1024;

/// Bins kept when computing the age expectation.
pub const AGE_TOP_K: usize = 2;

/// Scores at or above this are classified male. Calibrated for the bundled model.
pub const GENDER_THRESHOLD: f32 = 0.6;

pub const AGE_OUTPUT_NAME: &str = "age_pred/Softmax";
pub const GENDER_OUTPUT_NAME: &str = "gender_pred/Sigmoid";
pub const EMBEDDING_OUTPUT_NAME: &str = "global_pooling/Mean";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

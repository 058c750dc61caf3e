mod execution_provider;
pub mod onnx_inference_engine;
pub mod timeout_inference_engine;

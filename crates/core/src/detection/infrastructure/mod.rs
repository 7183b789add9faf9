pub mod inline_dispatcher;
pub mod model_resolver;
pub mod onnx_landmark_detector;
pub mod replay_face_detector;
pub mod threaded_dispatcher;

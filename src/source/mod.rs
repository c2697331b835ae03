pub mod error;
pub mod event_source;
pub mod ocr;
pub mod vision_model;

pub mod analysis_parser;
pub mod gemini_api_analyzer;
pub mod image_source;

pub use crate::gemini_api_analyzer::GeminiPlantAnalyzer;
pub use crate::image_source::{EncodedImage, ImageSource};

pub mod converter;
pub mod extractor;
pub mod preview;
pub mod text_extract;
pub mod window;

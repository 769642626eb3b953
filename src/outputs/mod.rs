//! Output generation: chapter templates and the EPUB container.
//!
//! - [`templates`]: renders weather and article data into XHTML chapters
//! - [`epub`]: writes a finished package as an EPUB 3 zip container

pub mod epub;
pub mod templates;

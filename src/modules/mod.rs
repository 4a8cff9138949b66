pub mod composition;
pub mod narration;
pub mod video;

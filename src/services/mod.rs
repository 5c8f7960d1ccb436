pub mod retrieval;
pub mod upload;

pub use retrieval::RetrievalService;
pub use upload::UploadService;

//! Application services built on top of the domain and ports.

mod posts;

pub use posts::{PostService, PostServiceError, PostServiceResult, PostView};

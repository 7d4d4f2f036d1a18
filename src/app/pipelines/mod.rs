pub mod api_pipeline;
pub mod feed_pipeline;
pub mod placeholder_pipeline;

pub use api_pipeline::ApiPipeline;
pub use feed_pipeline::FeedPipeline;
pub use placeholder_pipeline::PlaceholderPipeline;

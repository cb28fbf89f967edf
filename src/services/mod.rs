pub mod pipeline;
pub mod report;
pub mod sentiment;
pub mod summary;

pub use pipeline::ReviewPipeline;
pub use sentiment::SentimentAggregator;
pub use summary::SummaryRequester;

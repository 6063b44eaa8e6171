pub mod browser;
pub mod clients;
pub mod config;
pub mod dates;
pub mod detail;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod retry;
pub mod sections;
pub mod sitemap;
pub mod utils;
pub mod website;
pub mod writer;

pub use clients::{ApolloClient, ApolloCrawlConfig, HiringCafeClient, HiringCafeCrawlConfig};
pub use config::{load_config, CrawlerConfig};
pub use error::CrawlError;
pub use models::{CompanyInfo, Extracted, JobRecord, JobSections, LocationLink};
pub use pipeline::{CrawlPipeline, RunSummary};

pub type Result<T> = std::result::Result<T, CrawlError>;

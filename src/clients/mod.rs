pub mod apollo;
pub mod hiring_cafe;

pub use apollo::{ApolloClient, ApolloCrawlConfig};
pub use hiring_cafe::{HiringCafeClient, HiringCafeCrawlConfig};

pub mod config;
pub mod error;
pub mod project;
pub mod transport;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use project::{PdfSource, Project, SourceApi};
pub use transport::ApiClient;

pub use reqwest::{Method, StatusCode};

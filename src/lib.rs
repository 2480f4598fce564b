pub mod config;
pub mod dataset;
pub mod error;
pub mod model;
pub mod params;
pub mod server;

pub use config::AppConfig;
pub use dataset::{DatasetStore, StoredDataset};
pub use error::ServiceError;
pub use model::{GeminiClient, TextGenerator};
pub use params::{GenerationParameters, ParameterStore};
pub use server::{AppState, build_router, router};

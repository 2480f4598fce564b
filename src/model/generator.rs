use async_trait::async_trait;

use crate::{error::ServiceError, params::GenerationParameters};

/// External text generation. Implementations make one call per invocation
/// and never retry.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParameters,
    ) -> Result<String, ServiceError>;
}

use async_trait::async_trait;
use ferrous_nftset_domain::DomainError;

/// Delivers an already-built DNS response to the client that asked for it.
#[async_trait]
pub trait ResponseWriter: Send + 'static {
    async fn write_response(&mut self) -> Result<(), DomainError>;
}

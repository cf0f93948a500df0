//! Built-in handlers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::error::RegistryError;
use crate::handlers::{Handler, HandlerContext, HandlerError, HandlerRegistry};

/// Returns the payload unchanged.
#[derive(Debug, Default)]
pub struct EchoHandler;

#[async_trait]
impl Handler for EchoHandler {
    fn name(&self) -> &str {
        "echo"
    }

    async fn execute(&self, payload: &str, _ctx: &HandlerContext) -> Result<String, HandlerError> {
        Ok(payload.to_string())
    }
}

/// Simulates slow I/O-bound work: waits, then answers `"Done"`.
#[derive(Debug)]
pub struct SlowHandler {
    delay: Duration,
}

impl SlowHandler {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Handler for SlowHandler {
    fn name(&self) -> &str {
        "slow"
    }

    async fn execute(&self, payload: &str, ctx: &HandlerContext) -> Result<String, HandlerError> {
        tokio::select! {
            _ = tokio::time::sleep(self.delay) => {}
            _ = ctx.cancelled() => {
                return Err(HandlerError::Cancelled {
                    handler: self.name().to_string(),
                });
            }
        }

        info!(
            task_id = %ctx.task_id,
            handler = self.name(),
            payload = %payload,
            "Handled payload"
        );
        Ok("Done".to_string())
    }
}

/// Always fails.
#[derive(Debug, Default)]
pub struct FailHandler;

#[async_trait]
impl Handler for FailHandler {
    fn name(&self) -> &str {
        "fail"
    }

    async fn execute(&self, _payload: &str, _ctx: &HandlerContext) -> Result<String, HandlerError> {
        Err(HandlerError::Failed {
            handler: self.name().to_string(),
            reason: "oops".to_string(),
        })
    }
}

/// Register every built-in handler.
pub fn register_builtin(
    registry: &mut HandlerRegistry,
    slow_delay: Duration,
) -> Result<(), RegistryError> {
    registry.register(Arc::new(EchoHandler))?;
    registry.register(Arc::new(SlowHandler::new(slow_delay)))?;
    registry.register(Arc::new(FailHandler))?;
    Ok(())
}

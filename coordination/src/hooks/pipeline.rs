//! Hook pipeline — runs every registered handler at a hook point and merges
//! their verdicts.
//!
//! Handlers are isolated: a panic-free handler error is converted into a
//! rejection (fail closed) and the remaining handlers still run, so one bad
//! handler can never silently skip the others.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::types::{HookContext, HookOutcome, HookType};

/// A handler attached to one or more hook points.
#[async_trait]
pub trait HookHandler: Send + Sync {
    /// Name used in logs and rejection reasons.
    fn name(&self) -> &str;

    /// Inspect the context and return a verdict.
    async fn handle(&self, ctx: &HookContext) -> anyhow::Result<HookOutcome>;
}

/// Registry of handlers keyed by hook point.
pub struct HookPipeline {
    handlers: RwLock<HashMap<HookType, Vec<Arc<dyn HookHandler>>>>,
}

impl HookPipeline {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Attach a handler to a hook point. Handlers run in registration order.
    pub fn register(&self, hook: HookType, handler: Arc<dyn HookHandler>) {
        if let Ok(mut handlers) = self.handlers.write() {
            handlers.entry(hook).or_default().push(handler);
        }
    }

    /// Number of handlers attached to a hook point.
    pub fn handler_count(&self, hook: HookType) -> usize {
        self.handlers
            .read()
            .ok()
            .and_then(|h| h.get(&hook).map(Vec::len))
            .unwrap_or(0)
    }

    /// Run every handler for the context's hook point and merge verdicts.
    /// A handler returning `Err` contributes a rejection; the rest still run.
    pub async fn run(&self, ctx: &HookContext) -> HookOutcome {
        let hook = match ctx.hook {
            Some(hook) => hook,
            None => return HookOutcome::proceed(),
        };

        // Snapshot the handler list so the lock is not held across awaits.
        let handlers: Vec<Arc<dyn HookHandler>> = match self.handlers.read() {
            Ok(map) => map.get(&hook).cloned().unwrap_or_default(),
            Err(_) => Vec::new(),
        };

        let mut outcome = HookOutcome::proceed();
        for handler in handlers {
            match handler.handle(ctx).await {
                Ok(verdict) => {
                    if !verdict.proceed {
                        debug!(
                            hook = %hook,
                            handler = handler.name(),
                            reason = verdict.reason.as_deref().unwrap_or(""),
                            "hook handler rejected"
                        );
                    }
                    outcome.merge(verdict);
                }
                Err(e) => {
                    warn!(hook = %hook, handler = handler.name(), error = %e, "hook handler failed");
                    outcome.merge(HookOutcome::reject(format!(
                        "handler {} failed: {}",
                        handler.name(),
                        e
                    )));
                }
            }
        }
        outcome
    }
}

impl Default for HookPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Approve;

    #[async_trait]
    impl HookHandler for Approve {
        fn name(&self) -> &str {
            "approve"
        }
        async fn handle(&self, _ctx: &HookContext) -> anyhow::Result<HookOutcome> {
            Ok(HookOutcome::proceed().with_metadata("approved", json!(true)))
        }
    }

    struct Veto;

    #[async_trait]
    impl HookHandler for Veto {
        fn name(&self) -> &str {
            "veto"
        }
        async fn handle(&self, _ctx: &HookContext) -> anyhow::Result<HookOutcome> {
            Ok(HookOutcome::reject("vetoed"))
        }
    }

    struct Faulty;

    #[async_trait]
    impl HookHandler for Faulty {
        fn name(&self) -> &str {
            "faulty"
        }
        async fn handle(&self, _ctx: &HookContext) -> anyhow::Result<HookOutcome> {
            anyhow::bail!("boom")
        }
    }

    #[tokio::test]
    async fn test_empty_pipeline_proceeds() {
        let pipeline = HookPipeline::new();
        let outcome = pipeline.run(&HookContext::new(HookType::PreTask)).await;
        assert!(outcome.proceed);
    }

    #[tokio::test]
    async fn test_all_handlers_run_despite_veto() {
        let pipeline = HookPipeline::new();
        pipeline.register(HookType::PreTask, Arc::new(Veto));
        pipeline.register(HookType::PreTask, Arc::new(Approve));

        let outcome = pipeline.run(&HookContext::new(HookType::PreTask)).await;
        assert!(!outcome.proceed);
        assert_eq!(outcome.reason.as_deref(), Some("vetoed"));
        // The approving handler still ran and contributed its metadata.
        assert_eq!(outcome.metadata["approved"], json!(true));
    }

    #[tokio::test]
    async fn test_handler_error_fails_closed() {
        let pipeline = HookPipeline::new();
        pipeline.register(HookType::PreTask, Arc::new(Faulty));
        pipeline.register(HookType::PreTask, Arc::new(Approve));

        let outcome = pipeline.run(&HookContext::new(HookType::PreTask)).await;
        assert!(!outcome.proceed);
        assert!(outcome.reason.as_deref().unwrap().contains("faulty"));
        assert_eq!(outcome.metadata["approved"], json!(true));
    }

    #[tokio::test]
    async fn test_handlers_scoped_to_their_hook() {
        let pipeline = HookPipeline::new();
        pipeline.register(HookType::PreWorkflow, Arc::new(Veto));
        assert_eq!(pipeline.handler_count(HookType::PreWorkflow), 1);
        assert_eq!(pipeline.handler_count(HookType::PreTask), 0);

        let outcome = pipeline.run(&HookContext::new(HookType::PreTask)).await;
        assert!(outcome.proceed);
    }
}

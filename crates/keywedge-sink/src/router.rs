use crate::registry::SinkRegistry;
use crate::sink_trait::ScanSink;
use keywedge_core::{ContextTag, RouteMetadata, ScanResult, SinkError};
use std::collections::HashMap;
use tokio::sync::mpsc;

struct Route {
    sink: Box<dyn ScanSink>,
    prefix: String,
}

/// Delivers classified scans to the sinks registered for their context tag.
pub struct ScanRouter {
    registry: SinkRegistry,
    routes: HashMap<ContextTag, Vec<Route>>,
    result_rx: Option<mpsc::UnboundedReceiver<ScanResult>>,
    tap: Option<mpsc::UnboundedSender<ScanResult>>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl ScanRouter {
    pub fn new(result_rx: mpsc::UnboundedReceiver<ScanResult>) -> Self {
        Self::with_registry(result_rx, SinkRegistry::new())
    }

    pub fn with_registry(
        result_rx: mpsc::UnboundedReceiver<ScanResult>,
        registry: SinkRegistry,
    ) -> Self {
        Self {
            registry,
            routes: HashMap::new(),
            result_rx: Some(result_rx),
            tap: None,
            task_handle: None,
        }
    }

    /// Receive a copy of every scan, routed or not.
    pub fn set_tap(&mut self, tap: mpsc::UnboundedSender<ScanResult>) {
        self.tap = Some(tap);
    }

    pub async fn add_route(
        &mut self,
        context: &ContextTag,
        sink_name: &str,
        prefix: &str,
        config: toml::Value,
    ) -> Result<(), SinkError> {
        let mut sink = self.registry.create(sink_name)?;
        sink.initialize(config).await?;

        self.routes.entry(context.clone()).or_default().push(Route {
            sink,
            prefix: prefix.to_string(),
        });
        Ok(())
    }

    pub fn route_count(&self, context: &ContextTag) -> usize {
        self.routes.get(context).map_or(0, Vec::len)
    }

    pub fn start(&mut self) {
        let Some(mut rx) = self.result_rx.take() else {
            tracing::warn!("scan router already started");
            return;
        };
        let routes = std::mem::take(&mut self.routes);
        let tap = self.tap.take();

        let handle = tokio::spawn(async move {
            while let Some(scan) = rx.recv().await {
                if let Some(tap) = tap.as_ref() {
                    let _ = tap.send(scan.clone());
                }

                let Some(context_routes) = routes.get(&scan.context) else {
                    tracing::debug!(context = %scan.context, "no sinks for context, dropping scan");
                    continue;
                };

                for route in context_routes {
                    let metadata = RouteMetadata {
                        context: scan.context.clone(),
                        prefix: route.prefix.clone(),
                    };
                    if let Err(e) = route.sink.deliver(&scan, &metadata).await {
                        tracing::error!(
                            context = %scan.context,
                            sink = %route.sink.name(),
                            "deliver failed: {e}"
                        );
                    }
                }
            }

            for route in routes.values().flatten() {
                if let Err(e) = route.sink.shutdown().await {
                    tracing::warn!(sink = %route.sink.name(), "sink shutdown failed: {e}");
                }
            }
        });

        self.task_handle = Some(handle);
    }

    /// Wait for the delivery task. It ends once every scan sender is dropped.
    pub async fn shutdown(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            let _ = handle.await;
        }
    }
}

//! Shared dispatch state: catalog, cache, and the fallback process config.

use n8n_mcp_catalog::Catalog;
use n8n_mcp_clientcache::ClientCache;
use n8n_mcp_domain::config::{CacheConfig, N8nConfig, WebhookSecurityMode};
use n8n_mcp_domain::instance::InstanceContext;
use n8n_mcp_domain::Error;
use n8n_mcp_restclient::RestClient;
use std::sync::Arc;

pub struct AppState {
    pub cache: ClientCache<Arc<RestClient>>,
    pub catalog: &'static Catalog,
    pub n8n_config: N8nConfig,
    pub webhook_security: WebhookSecurityMode,
}

impl AppState {
    pub fn new(n8n_config: N8nConfig, cache_config: CacheConfig, webhook_security: WebhookSecurityMode) -> Self {
        Self {
            cache: ClientCache::new(cache_config),
            catalog: n8n_mcp_catalog::embedded(),
            n8n_config,
            webhook_security,
        }
    }

    /// Resolves a `RestClient` for `ctx` through the instance-scoped
    /// cache. A request with no instance context (stdio mode) still
    /// routes through the cache under the empty-context key, which is
    /// what makes it behave as a process-wide singleton (§4.6).
    pub async fn resolve_client(&self, ctx: &InstanceContext) -> Result<Arc<RestClient>, Error> {
        ctx.validate().map_err(Error::InputInvalid)?;
        let base_config = self.n8n_config.clone();
        let ctx = ctx.clone();
        self.cache
            .get_or_create(&ctx, || {
                let ctx = ctx.clone();
                async move {
                    let cfg = N8nConfig {
                        api_url: ctx.api_url.clone().or(base_config.api_url.clone()),
                        api_key: ctx.api_key.clone().or(base_config.api_key.clone()),
                        ..base_config
                    };
                    RestClient::new(&cfg).map(Arc::new)
                }
            })
            .await
    }
}

use anyhow::Context;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::config::Config;
use crate::llm::provider::{CompletionProvider, HttpProvider};
use crate::search::ranking::SearchService;
use crate::store::load_study_data;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub provider: Arc<dyn CompletionProvider>,
    /// Built on first use; concurrent first requests share one initialization.
    search: Arc<OnceCell<Arc<SearchService>>>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let provider = HttpProvider::new(config.llm.clone())?;
        Ok(Self::with_provider(config, Arc::new(provider)))
    }

    /// State with an explicit generation provider, e.g. a fake in tests.
    pub fn with_provider(config: Config, provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            config,
            provider,
            search: Arc::new(OnceCell::new()),
        }
    }

    /// State whose search service is already built.
    pub fn with_search(
        config: Config,
        provider: Arc<dyn CompletionProvider>,
        search: SearchService,
    ) -> Self {
        Self {
            config,
            provider,
            search: Arc::new(OnceCell::new_with(Some(Arc::new(search)))),
        }
    }

    /// Load the record store and build the indexes at most once.
    pub async fn search_service(&self) -> anyhow::Result<Arc<SearchService>> {
        let service = self
            .search
            .get_or_try_init(|| async {
                let path = self.config.data_path.clone();
                let service = tokio::task::spawn_blocking(move || {
                    let store = load_study_data(&path);
                    if store.is_empty() {
                        tracing::warn!("No records loaded; every search will come back empty");
                    }
                    SearchService::new(&store)
                })
                .await
                .context("Search index build task failed")?;
                tracing::info!(
                    "Search service ready ({} projects, {} FAQs)",
                    service.project_count(),
                    service.faq_count()
                );
                Ok::<_, anyhow::Error>(Arc::new(service))
            })
            .await?;
        Ok(Arc::clone(service))
    }
}

use crate::error::Result;
use crate::index::{AliasAction, Count, Detail, Indices, RunningTask, SearchPage, SearchQuery, Task, Version};
use async_trait::async_trait;

/// Primitive operations the engines need from a store.
///
/// Every call is a single request; nothing here retries. Alias helpers are built on
/// [`SearchBackend::update_aliases`] so that a swap is always one atomic request.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn ping(&self) -> Result<bool>;
    async fn version(&self) -> Result<Version>;

    async fn list_index(&self) -> Result<Indices>;
    /// Creates `name`, using `body` (settings/mappings JSON) when given.
    async fn create_index(&self, name: &str, body: Option<&str>) -> Result<()>;
    async fn delete_index(&self, name: &str) -> Result<()>;
    /// Starts an asynchronous re-index and returns its task handle without waiting.
    async fn copy_index(&self, src: &str, dst: &str) -> Result<Task>;
    async fn get_task(&self, id: &str) -> Result<Task>;
    /// Tasks running on any node, ordered by id.
    async fn list_task(&self) -> Result<Vec<RunningTask>>;
    async fn count_index(&self, name: &str) -> Result<Count>;
    async fn refresh_index(&self, name: &str) -> Result<()>;
    async fn search_index(&self, name: &str, query: &SearchQuery) -> Result<SearchPage>;
    /// Sends a newline-delimited action/document body.
    async fn bulk_index(&self, body: String) -> Result<()>;
    async fn detail_index(&self, name: &str) -> Result<Detail>;

    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<()>;
    /// Indices currently bound to `alias`; empty when the alias does not exist.
    async fn list_alias(&self, alias: &str) -> Result<Indices>;

    async fn add_alias(&self, alias: &str, indices: &[String]) -> Result<()> {
        let actions: Vec<_> = indices.iter().map(|i| AliasAction::add(alias, i)).collect();
        self.update_aliases(&actions).await
    }

    async fn remove_alias(&self, alias: &str, indices: &[String]) -> Result<()> {
        let actions: Vec<_> = indices.iter().map(|i| AliasAction::remove(alias, i)).collect();
        self.update_aliases(&actions).await
    }

    /// Repoints `alias` from `from` to `to` in one request.
    async fn swap_alias(&self, alias: &str, from: &str, to: &str) -> Result<()> {
        self.update_aliases(&[AliasAction::remove(alias, from), AliasAction::add(alias, to)]).await
    }
}

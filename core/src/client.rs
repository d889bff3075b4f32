use crate::backend::SearchBackend;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::index::{
    alias_actions_body, reindex_body, AliasAction, Count, Detail, Hit, Indices, RunningTask, SearchPage,
    SearchQuery, Task, Version,
};
use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

const NDJSON: &str = "application/x-ndjson";

/// HTTP client for an Elasticsearch-compatible store.
#[derive(Debug, Clone)]
pub struct EsClient {
    http: Client,
    base: Url,
    doc_type: String,
    user: Option<String>,
    pass: Option<String>,
    include_type_name: bool,
}

#[derive(Deserialize)]
struct TaskStarted {
    task: String,
}

#[derive(Deserialize)]
struct TaskStatus {
    completed: bool,
    #[serde(default)]
    response: Option<TaskResponse>,
}

#[derive(Deserialize)]
struct TaskResponse {
    #[serde(default)]
    failures: Vec<Value>,
}

#[derive(Deserialize)]
struct TaskList {
    #[serde(default)]
    nodes: std::collections::BTreeMap<String, NodeTasks>,
}

#[derive(Deserialize)]
struct NodeTasks {
    #[serde(default)]
    tasks: std::collections::BTreeMap<String, TaskEntry>,
}

#[derive(Deserialize)]
struct TaskEntry {
    #[serde(default)]
    action: String,
}

#[derive(Deserialize)]
struct CountResponse {
    count: i64,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Deserialize)]
struct HitsEnvelope {
    hits: Vec<Hit>,
}

#[derive(Deserialize)]
struct RootResponse {
    version: VersionInfo,
}

#[derive(Deserialize)]
struct VersionInfo {
    number: String,
    #[serde(default)]
    distribution: Option<String>,
}

#[derive(Deserialize)]
struct BulkResponse {
    errors: bool,
    #[serde(default)]
    items: Vec<Value>,
}

impl EsClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let host = if config.host.contains("://") { config.host.clone() } else { format!("http://{}", config.host) };
        let base = Url::parse(&host).map_err(|e| Error::Validation(format!("invalid host {}: {e}", config.host)))?;
        if base.cannot_be_a_base() {
            return Err(Error::Validation(format!("invalid host {}", config.host)));
        }

        let mut builder = Client::builder().danger_accept_invalid_certs(config.insecure);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base,
            doc_type: config.doc_type.clone(),
            user: config.user.clone().filter(|u| !u.is_empty()),
            pass: config.pass.clone().filter(|p| !p.is_empty()),
            include_type_name: config.include_type_name,
        })
    }

    pub fn base_url(&self) -> &Url { &self.base }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // cannot_be_a_base was rejected in new()
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        tracing::debug!(%method, %url, "request");
        let req = self.http.request(method, url);
        match &self.user {
            Some(user) => req.basic_auth(user, self.pass.as_ref()),
            None => req,
        }
    }

    fn json_request(&self, method: Method, url: Url, body: String) -> RequestBuilder {
        self.request(method, url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
    }

    /// Sends and decodes the reply without judging it.
    async fn execute(&self, req: RequestBuilder) -> Result<(StatusCode, Value)> {
        read_reply(req.send().await?).await
    }

    async fn send(&self, req: RequestBuilder) -> Result<Value> {
        let (status, value) = self.execute(req).await?;
        check(status, value)
    }

    async fn send_as<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<T> {
        let value = self.send(req).await?;
        serde_json::from_value(value).map_err(|e| Error::decode(what, e))
    }
}

async fn read_reply(resp: reqwest::Response) -> Result<(StatusCode, Value)> {
    let status = resp.status();
    let bytes = resp.bytes().await?;
    if bytes.is_empty() {
        return Ok((status, Value::Null));
    }
    match serde_json::from_slice(&bytes) {
        Ok(value) => Ok((status, value)),
        Err(_) if !status.is_success() => Err(Error::Backend {
            status: status.as_u16(),
            message: String::from_utf8_lossy(&bytes).into_owned(),
        }),
        Err(e) => Err(Error::decode("response body", e)),
    }
}

fn check(status: StatusCode, value: Value) -> Result<Value> {
    if let Some(err) = value.get("error") {
        return Err(backend_error(status, err));
    }
    if !status.is_success() {
        return Err(Error::Backend { status: status.as_u16(), message: value.to_string() });
    }
    Ok(value)
}

fn backend_error(status: StatusCode, err: &Value) -> Error {
    let message = match err {
        Value::String(s) => s.clone(),
        Value::Object(o) => match (o.get("type").and_then(Value::as_str), o.get("reason").and_then(Value::as_str)) {
            (Some(kind), Some(reason)) => format!("{kind}: {reason}"),
            (None, Some(reason)) => reason.to_string(),
            _ => err.to_string(),
        },
        other => other.to_string(),
    };
    Error::Backend { status: status.as_u16(), message }
}

fn sorted_keys(value: &Value) -> Indices {
    let mut names: Vec<&String> = value.as_object().map(|m| m.keys().collect()).unwrap_or_default();
    names.sort();
    Indices::from_names(names.into_iter().cloned())
}

#[async_trait]
impl SearchBackend for EsClient {
    async fn ping(&self) -> Result<bool> {
        let resp = self.request(Method::GET, self.url(&[])).send().await?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let (status, value) = read_reply(resp).await?;
            return Err(match value.get("error") {
                Some(err) => backend_error(status, err),
                None => Error::Backend { status: status.as_u16(), message: "authentication rejected".into() },
            });
        }
        Ok(status.is_success())
    }

    async fn version(&self) -> Result<Version> {
        let root: RootResponse = self.send_as(self.request(Method::GET, self.url(&[])), "version").await?;
        Ok(Version { number: root.version.number, distribution: root.version.distribution })
    }

    async fn list_index(&self) -> Result<Indices> {
        let value = self.send(self.request(Method::GET, self.url(&["_aliases"]))).await?;
        Ok(sorted_keys(&value))
    }

    async fn create_index(&self, name: &str, body: Option<&str>) -> Result<()> {
        let mut url = self.url(&[name]);
        if self.include_type_name {
            url.query_pairs_mut().append_pair("include_type_name", "true");
        }
        let mut req = self.request(Method::PUT, url);
        if let Some(body) = body.filter(|b| !b.trim().is_empty()) {
            req = req.header(header::CONTENT_TYPE, "application/json").body(body.to_string());
        }
        self.send(req).await?;
        Ok(())
    }

    async fn delete_index(&self, name: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, self.url(&[name]))).await?;
        Ok(())
    }

    async fn copy_index(&self, src: &str, dst: &str) -> Result<Task> {
        let mut url = self.url(&["_reindex"]);
        url.query_pairs_mut().append_pair("wait_for_completion", "false");
        let started: TaskStarted = self
            .send_as(self.json_request(Method::POST, url, reindex_body(src, dst)?), "reindex task")
            .await?;
        Ok(Task { id: started.task, complete: false })
    }

    async fn get_task(&self, id: &str) -> Result<Task> {
        let status: TaskStatus = self.send_as(self.request(Method::GET, self.url(&["_tasks", id])), "task").await?;
        if let Some(failure) = status.response.as_ref().and_then(|r| r.failures.first()) {
            return Err(Error::Backend { status: 200, message: format!("task {id} reported failure: {failure}") });
        }
        Ok(Task { id: id.to_string(), complete: status.completed })
    }

    async fn list_task(&self) -> Result<Vec<RunningTask>> {
        let list: TaskList = self.send_as(self.request(Method::GET, self.url(&["_tasks"])), "task list").await?;
        let mut tasks: Vec<RunningTask> = list
            .nodes
            .into_values()
            .flat_map(|node| node.tasks)
            .map(|(id, entry)| RunningTask { id, action: entry.action })
            .collect();
        tasks.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(tasks)
    }

    async fn count_index(&self, name: &str) -> Result<Count> {
        let count: CountResponse = self.send_as(self.request(Method::GET, self.url(&[name, "_count"])), "count").await?;
        Ok(Count { num: count.count })
    }

    async fn refresh_index(&self, name: &str) -> Result<()> {
        self.send(self.request(Method::POST, self.url(&[name, "_refresh"]))).await?;
        Ok(())
    }

    async fn search_index(&self, name: &str, query: &SearchQuery) -> Result<SearchPage> {
        let req = self.json_request(Method::POST, self.url(&[name, "_search"]), query.to_body().to_string());
        let mut resp: SearchResponse = self.send_as(req, "search").await?;
        for hit in &mut resp.hits.hits {
            hit.doc_type.get_or_insert_with(|| self.doc_type.clone());
        }
        Ok(SearchPage { hits: resp.hits.hits })
    }

    async fn bulk_index(&self, body: String) -> Result<()> {
        let req = self.request(Method::POST, self.url(&["_bulk"])).header(header::CONTENT_TYPE, NDJSON).body(body);
        let resp: BulkResponse = self.send_as(req, "bulk").await?;
        if !resp.errors {
            return Ok(());
        }
        let failed = resp
            .items
            .iter()
            .filter_map(|item| item.as_object().and_then(|o| o.values().next()))
            .find_map(|op| op.get("error").map(|e| (op.get("status").and_then(Value::as_u64), e)));
        Err(match failed {
            Some((status, err)) => {
                let status = status.and_then(|s| StatusCode::from_u16(s as u16).ok()).unwrap_or(StatusCode::OK);
                backend_error(status, err)
            }
            None => Error::Backend { status: 200, message: "bulk request reported errors".into() },
        })
    }

    async fn detail_index(&self, name: &str) -> Result<Detail> {
        let value = self.send(self.request(Method::GET, self.url(&[name]))).await?;
        Ok(Detail(value))
    }

    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<()> {
        let req = self.json_request(Method::POST, self.url(&["_aliases"]), alias_actions_body(actions)?);
        self.send(req).await?;
        Ok(())
    }

    async fn list_alias(&self, alias: &str) -> Result<Indices> {
        let (status, value) = self.execute(self.request(Method::GET, self.url(&["_alias", alias]))).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(Indices::default());
        }
        Ok(sorted_keys(&check(status, value)?))
    }
}

#![allow(dead_code)]

use async_trait::async_trait;
use escli_core::{
    AliasAction, Count, Detail, Error, Hit, Indices, Result, RunningTask, SearchBackend, SearchPage, SearchQuery, Task,
    Version,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Ping,
    Version,
    ListIndex,
    CreateIndex(String, Option<String>),
    DeleteIndex(String),
    CopyIndex(String, String),
    GetTask(String),
    ListTask,
    CountIndex(String),
    Refresh(String),
    Search(String, SearchQuery),
    Bulk { documents: usize },
    Detail(String),
    UpdateAliases(Vec<AliasAction>),
    ListAlias(String),
}

#[derive(Default)]
struct State {
    indices: BTreeMap<String, BTreeMap<String, Value>>,
    bodies: HashMap<String, Option<String>>,
    aliases: BTreeMap<String, BTreeSet<String>>,
    calls: Vec<Call>,
    tasks: HashMap<String, u32>,
    next_task: u32,
    polls_to_complete: u32,
    count_override: HashMap<String, i64>,
    cancel_on_poll: Option<(u32, CancellationToken)>,
    fail_task: bool,
    fail_search_at: Option<usize>,
    fail_bulk_at: Option<usize>,
    searches: usize,
    bulks: usize,
}

/// In-memory store that records every call made against it.
pub struct FakeStore {
    state: Mutex<State>,
}

pub fn doc_id(i: usize) -> String { format!("doc-{i:05}") }

/// Fast schedule so tests do not sleep for real seconds.
pub fn fast_policy() -> escli_core::PollPolicy {
    escli_core::PollPolicy { unit: Duration::from_millis(1), max_attempts: Some(20) }
}

impl FakeStore {
    pub fn new() -> Self {
        let store = Self { state: Mutex::new(State::default()) };
        store.state.lock().polls_to_complete = 1;
        store
    }

    pub fn with_index(self, name: &str, documents: usize) -> Self {
        {
            let mut s = self.state.lock();
            let docs = (0..documents).map(|i| (doc_id(i), json!({ "n": i }))).collect();
            s.indices.insert(name.to_string(), docs);
        }
        self
    }

    pub fn with_alias(self, alias: &str, index: &str) -> Self {
        self.state.lock().aliases.entry(alias.to_string()).or_default().insert(index.to_string());
        self
    }

    pub fn polls_to_complete(self, polls: u32) -> Self {
        self.state.lock().polls_to_complete = polls;
        self
    }

    pub fn report_count(self, index: &str, num: i64) -> Self {
        self.state.lock().count_override.insert(index.to_string(), num);
        self
    }

    pub fn cancel_on_poll(self, poll: u32, token: CancellationToken) -> Self {
        self.state.lock().cancel_on_poll = Some((poll, token));
        self
    }

    pub fn fail_task(self) -> Self {
        self.state.lock().fail_task = true;
        self
    }

    pub fn fail_search_at(self, call: usize) -> Self {
        self.state.lock().fail_search_at = Some(call);
        self
    }

    pub fn fail_bulk_at(self, call: usize) -> Self {
        self.state.lock().fail_bulk_at = Some(call);
        self
    }

    pub fn calls(&self) -> Vec<Call> { self.state.lock().calls.clone() }

    pub fn count_calls(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn exists(&self, index: &str) -> bool { self.state.lock().indices.contains_key(index) }

    pub fn doc_count(&self, index: &str) -> usize {
        self.state.lock().indices.get(index).map(|d| d.len()).unwrap_or(0)
    }

    pub fn doc(&self, index: &str, id: &str) -> Option<Value> {
        self.state.lock().indices.get(index).and_then(|d| d.get(id).cloned())
    }

    pub fn alias_targets(&self, alias: &str) -> Vec<String> {
        self.state.lock().aliases.get(alias).map(|s| s.iter().cloned().collect()).unwrap_or_default()
    }

    pub fn index_names(&self) -> Vec<String> { self.state.lock().indices.keys().cloned().collect() }

    pub fn created_body(&self, index: &str) -> Option<String> {
        self.state.lock().bodies.get(index).cloned().flatten()
    }

    fn record(&self, call: Call) { self.state.lock().calls.push(call); }
}

fn missing(index: &str) -> Error {
    Error::Backend { status: 404, message: format!("index_not_found_exception: no such index [{index}]") }
}

#[async_trait]
impl SearchBackend for FakeStore {
    async fn ping(&self) -> Result<bool> {
        self.record(Call::Ping);
        Ok(true)
    }

    async fn version(&self) -> Result<Version> {
        self.record(Call::Version);
        Ok(Version { number: "7.10.2".into(), distribution: None })
    }

    async fn list_index(&self) -> Result<Indices> {
        self.record(Call::ListIndex);
        Ok(Indices::from_names(self.state.lock().indices.keys().cloned()))
    }

    async fn create_index(&self, name: &str, body: Option<&str>) -> Result<()> {
        self.record(Call::CreateIndex(name.to_string(), body.map(str::to_string)));
        let mut s = self.state.lock();
        if s.indices.contains_key(name) {
            return Err(Error::Backend { status: 400, message: format!("index [{name}] already exists") });
        }
        s.indices.insert(name.to_string(), BTreeMap::new());
        s.bodies.insert(name.to_string(), body.map(str::to_string));
        Ok(())
    }

    async fn delete_index(&self, name: &str) -> Result<()> {
        self.record(Call::DeleteIndex(name.to_string()));
        let mut s = self.state.lock();
        if s.indices.remove(name).is_none() {
            return Err(missing(name));
        }
        for bound in s.aliases.values_mut() {
            bound.remove(name);
        }
        Ok(())
    }

    async fn copy_index(&self, src: &str, dst: &str) -> Result<Task> {
        self.record(Call::CopyIndex(src.to_string(), dst.to_string()));
        let mut s = self.state.lock();
        let docs = s.indices.get(src).cloned().ok_or_else(|| missing(src))?;
        s.indices.get_mut(dst).ok_or_else(|| missing(dst))?.extend(docs);
        s.next_task += 1;
        let id = format!("node-1:{}", s.next_task);
        s.tasks.insert(id.clone(), 0);
        Ok(Task { id, complete: false })
    }

    async fn get_task(&self, id: &str) -> Result<Task> {
        self.record(Call::GetTask(id.to_string()));
        let mut s = self.state.lock();
        if s.fail_task {
            return Err(Error::Backend { status: 500, message: "task lookup failed".into() });
        }
        let target = s.polls_to_complete;
        let polls = s.tasks.get_mut(id).ok_or_else(|| Error::Backend { status: 404, message: format!("task {id}") })?;
        *polls += 1;
        let polls = *polls;
        if let Some((at, token)) = &s.cancel_on_poll {
            if *at == polls {
                token.cancel();
            }
        }
        Ok(Task { id: id.to_string(), complete: polls >= target })
    }

    async fn list_task(&self) -> Result<Vec<RunningTask>> {
        self.record(Call::ListTask);
        let s = self.state.lock();
        let mut running: Vec<RunningTask> = s
            .tasks
            .iter()
            .filter(|(_, polls)| **polls < s.polls_to_complete)
            .map(|(id, _)| RunningTask { id: id.clone(), action: "indices:data/write/reindex".into() })
            .collect();
        running.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(running)
    }

    async fn count_index(&self, name: &str) -> Result<Count> {
        self.record(Call::CountIndex(name.to_string()));
        let s = self.state.lock();
        if let Some(num) = s.count_override.get(name) {
            return Ok(Count { num: *num });
        }
        let docs = s.indices.get(name).ok_or_else(|| missing(name))?;
        Ok(Count { num: docs.len() as i64 })
    }

    async fn refresh_index(&self, name: &str) -> Result<()> {
        self.record(Call::Refresh(name.to_string()));
        Ok(())
    }

    async fn search_index(&self, name: &str, query: &SearchQuery) -> Result<SearchPage> {
        self.record(Call::Search(name.to_string(), query.clone()));
        let mut s = self.state.lock();
        s.searches += 1;
        if s.fail_search_at == Some(s.searches) {
            return Err(Error::Backend { status: 500, message: "search_phase_execution_exception".into() });
        }
        let docs = s.indices.get(name).ok_or_else(|| missing(name))?;
        let hits = docs
            .iter()
            .rev()
            .filter(|(id, _)| query.search_after.as_deref().map_or(true, |after| id.as_str() < after))
            .take(query.size)
            .map(|(id, source)| Hit {
                index: name.to_string(),
                doc_type: Some("_doc".into()),
                id: id.clone(),
                source: source.clone(),
            })
            .collect();
        Ok(SearchPage { hits })
    }

    async fn bulk_index(&self, body: String) -> Result<()> {
        let lines: Vec<&str> = body.lines().collect();
        self.record(Call::Bulk { documents: lines.len() / 2 });
        let mut s = self.state.lock();
        s.bulks += 1;
        if s.fail_bulk_at == Some(s.bulks) {
            return Err(Error::Backend { status: 429, message: "es_rejected_execution_exception".into() });
        }
        for pair in lines.chunks(2) {
            let action: Value = serde_json::from_str(pair[0])?;
            let source: Value = serde_json::from_str(pair.get(1).copied().unwrap_or("null"))?;
            let meta = &action["index"];
            let index = meta["_index"].as_str().unwrap_or_default().to_string();
            let id = meta["_id"].as_str().unwrap_or_default().to_string();
            s.indices.entry(index).or_default().insert(id, source);
        }
        Ok(())
    }

    async fn detail_index(&self, name: &str) -> Result<Detail> {
        self.record(Call::Detail(name.to_string()));
        let s = self.state.lock();
        if !s.indices.contains_key(name) {
            return Err(missing(name));
        }
        let aliases: serde_json::Map<String, Value> = s
            .aliases
            .iter()
            .filter(|(_, bound)| bound.contains(name))
            .map(|(alias, _)| (alias.clone(), json!({})))
            .collect();
        Ok(Detail(json!({
            name: {
                "aliases": aliases,
                "mappings": { "properties": { "n": { "type": "long" } } },
                "settings": { "index": { "number_of_shards": "1", "uuid": "fake-uuid", "provided_name": name } }
            }
        })))
    }

    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<()> {
        self.record(Call::UpdateAliases(actions.to_vec()));
        let mut s = self.state.lock();
        for action in actions {
            match action {
                AliasAction::Add { index, alias } => {
                    s.aliases.entry(alias.clone()).or_default().insert(index.clone());
                }
                AliasAction::Remove { index, alias } => {
                    if let Some(bound) = s.aliases.get_mut(alias) {
                        bound.remove(index);
                    }
                }
            }
        }
        Ok(())
    }

    async fn list_alias(&self, alias: &str) -> Result<Indices> {
        self.record(Call::ListAlias(alias.to_string()));
        Ok(Indices::from_names(self.alias_targets(alias)))
    }
}

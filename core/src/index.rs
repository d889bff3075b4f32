use serde::{Deserialize, Serialize};
use std::fmt;

/// Document type written into interchange metadata when the store omits `_type`.
pub const DEFAULT_DOC_TYPE: &str = "_doc";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
}

impl Index {
    pub fn new(name: impl Into<String>) -> Self { Self { name: name.into() } }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.name) }
}

/// Ordered list of indices. Order is only meaningful for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Indices(pub Vec<Index>);

impl Indices {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Index::new).collect())
    }

    pub fn contains(&self, name: &str) -> bool { self.0.iter().any(|i| i.name == name) }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = &Index> { self.0.iter() }
}

impl fmt::Display for Indices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 { f.write_str("\n")?; }
            f.write_str(&index.name)?;
        }
        Ok(())
    }
}

/// Handle to an asynchronous store-side operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub complete: bool,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} complete={}", self.id, self.complete)
    }
}

/// A task the store is currently running, as listed by `GET _tasks`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningTask {
    pub id: String,
    pub action: String,
}

impl fmt::Display for RunningTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{} {}", self.id, self.action) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Count {
    pub num: i64,
}

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.num) }
}

/// Full description of an index as the store reports it: settings, mappings and aliases,
/// keyed by index name.
#[derive(Debug, Clone, PartialEq)]
pub struct Detail(pub serde_json::Value);

impl Detail {
    /// Body suitable for creating a copy of `index` elsewhere: mappings plus the settings the
    /// store accepts on creation. Aliases are left out so the copy does not steal them.
    pub fn creation_body(&self, index: &str) -> serde_json::Value {
        let entry = self.0.get(index).or_else(|| self.0.as_object().and_then(|m| m.values().next()));
        let mut body = serde_json::Map::new();
        if let Some(entry) = entry {
            if let Some(mappings) = entry.get("mappings") {
                body.insert("mappings".into(), mappings.clone());
            }
            if let Some(settings) = entry.get("settings") {
                body.insert("settings".into(), creatable_settings(settings));
            }
        }
        serde_json::Value::Object(body)
    }
}

// Settings the store generates itself and rejects on index creation.
const GENERATED_SETTINGS: &[&str] = &["uuid", "creation_date", "provided_name", "version"];

fn creatable_settings(settings: &serde_json::Value) -> serde_json::Value {
    let mut settings = settings.clone();
    if let Some(index) = settings.get_mut("index").and_then(|v| v.as_object_mut()) {
        for key in GENERATED_SETTINGS {
            index.remove(*key);
        }
    }
    settings
}

impl fmt::Display for Detail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string_pretty(&self.0) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{}", self.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub number: String,
    pub distribution: Option<String>,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.distribution {
            Some(d) => write!(f, "{} ({d})", self.number),
            None => f.write_str(&self.number),
        }
    }
}

/// One search hit as returned inside `hits.hits`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_type", default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_source", default)]
    pub source: serde_json::Value,
}

impl Hit {
    pub fn doc_type(&self) -> &str { self.doc_type.as_deref().unwrap_or(DEFAULT_DOC_TYPE) }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub hits: Vec<Hit>,
}

impl SearchPage {
    pub fn is_empty(&self) -> bool { self.hits.is_empty() }
    pub fn last_id(&self) -> Option<&str> { self.hits.last().map(|h| h.id.as_str()) }
}

/// The fixed pagination query: match-all, sorted by `_id` descending, optional cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub size: usize,
    pub search_after: Option<String>,
}

impl SearchQuery {
    pub fn first_page(size: usize) -> Self { Self { size, search_after: None } }

    pub fn after(size: usize, last_id: impl Into<String>) -> Self {
        Self { size, search_after: Some(last_id.into()) }
    }

    pub fn to_body(&self) -> serde_json::Value {
        let mut body = serde_json::json!({
            "query": { "match_all": {} },
            "size": self.size,
            "sort": [{ "_id": "desc" }],
        });
        if let Some(cursor) = &self.search_after {
            body["search_after"] = serde_json::json!([cursor]);
        }
        body
    }
}

/// A single alias mutation. Several actions sent together are applied atomically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasAction {
    Add { index: String, alias: String },
    Remove { index: String, alias: String },
}

impl AliasAction {
    pub fn add(alias: &str, index: &str) -> Self {
        AliasAction::Add { index: index.to_string(), alias: alias.to_string() }
    }

    pub fn remove(alias: &str, index: &str) -> Self {
        AliasAction::Remove { index: index.to_string(), alias: alias.to_string() }
    }
}

#[derive(Serialize)]
struct AliasActions<'a> {
    actions: &'a [AliasAction],
}

#[derive(Serialize)]
struct IndexRef<'a> {
    index: &'a str,
}

#[derive(Serialize)]
struct ReindexBody<'a> {
    source: IndexRef<'a>,
    dest: IndexRef<'a>,
}

/// `{"actions":[...]}` with each action's keys in wire order.
pub fn alias_actions_body(actions: &[AliasAction]) -> serde_json::Result<String> {
    serde_json::to_string(&AliasActions { actions })
}

pub fn reindex_body(src: &str, dst: &str) -> serde_json::Result<String> {
    serde_json::to_string(&ReindexBody { source: IndexRef { index: src }, dest: IndexRef { index: dst } })
}

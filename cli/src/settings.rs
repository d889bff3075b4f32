//! Connection profiles read from `~/.escli.json` and `./.escli.json`.
//!
//! Each file is a JSON object keyed by namespace:
//!
//! ```json
//! { "localhost": { "host": "http://localhost:9200" }, "prod": { "host": "https://es.prod", "user": "ops" } }
//! ```

use escli_core::config::DEFAULT_HOST;
use escli_core::index::DEFAULT_DOC_TYPE;
use escli_core::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const DEFAULT_NAMESPACE: &str = "localhost";
const FILE_NAME: &str = ".escli.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub host: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub user: String,
    pub pass: String,
    pub insecure: bool,
    pub verbose: bool,
    pub debug: bool,
}

impl Profile {
    pub fn defaults() -> Self {
        Self { host: DEFAULT_HOST.to_string(), doc_type: DEFAULT_DOC_TYPE.to_string(), ..Default::default() }
    }

    /// Non-empty values of `other` win. Flags can only be switched on.
    pub fn overwrite(mut self, other: Profile) -> Self {
        if !other.host.is_empty() { self.host = other.host; }
        if !other.doc_type.is_empty() { self.doc_type = other.doc_type; }
        if !other.user.is_empty() { self.user = other.user; }
        if !other.pass.is_empty() { self.pass = other.pass; }
        self.insecure |= other.insecure;
        self.verbose |= other.verbose;
        self.debug |= other.debug;
        self
    }
}

/// Home file first, then the working directory, so the closer file wins.
pub fn default_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = std::env::var_os("HOME") {
        paths.push(PathBuf::from(home).join(FILE_NAME));
    }
    paths.push(PathBuf::from(FILE_NAME));
    paths
}

/// Reads `namespace` from one file. A missing file is not an error.
pub fn load_namespace(path: &Path, namespace: &str) -> Result<Option<Profile>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut profiles: HashMap<String, Profile> = serde_json::from_str(&raw)
        .map_err(|e| Error::Validation(format!("cannot parse {}: {e}", path.display())))?;
    Ok(profiles.remove(namespace))
}

/// Folds every file's entry for the namespace over the built-in defaults, returning the
/// files that contributed. Runs before logging is set up, so the caller logs them.
///
/// Asking for a namespace explicitly and finding it nowhere is a validation error; the
/// implicit default namespace may be absent.
pub fn resolve(paths: &[PathBuf], namespace: Option<&str>) -> Result<(Profile, Vec<PathBuf>)> {
    let name = namespace.unwrap_or(DEFAULT_NAMESPACE);
    let mut profile = Profile::defaults();
    let mut loaded = Vec::new();
    for path in paths {
        if let Some(p) = load_namespace(path, name)? {
            profile = profile.overwrite(p);
            loaded.push(path.clone());
        }
    }
    if namespace.is_some() && loaded.is_empty() {
        return Err(Error::Validation(format!("namespace {name} is not defined in any config file")));
    }
    Ok((profile, loaded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn later_files_overwrite_non_empty_values() {
        let dir = tempdir().unwrap();
        let home = dir.path().join("home.json");
        let local = dir.path().join("local.json");
        fs::write(&home, r#"{"localhost":{"host":"http://es:9200","user":"ops","pass":"secret"}}"#).unwrap();
        fs::write(&local, r#"{"localhost":{"host":"http://127.0.0.1:9201","user":""}}"#).unwrap();

        let (profile, loaded) = resolve(&[home.clone(), local.clone()], None).unwrap();
        assert_eq!(loaded, vec![home, local]);
        assert_eq!(profile.host, "http://127.0.0.1:9201");
        assert_eq!(profile.user, "ops");
        assert_eq!(profile.pass, "secret");
        assert_eq!(profile.doc_type, "_doc");
    }

    #[test]
    fn missing_files_fall_back_to_defaults() {
        let dir = tempdir().unwrap();
        let (profile, loaded) = resolve(&[dir.path().join("nope.json")], None).unwrap();
        assert_eq!(profile, Profile::defaults());
        assert!(loaded.is_empty());
    }

    #[test]
    fn unknown_explicit_namespace_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("escli.json");
        fs::write(&path, r#"{"localhost":{}}"#).unwrap();

        let err = resolve(&[path.clone()], Some("prod")).unwrap_err();
        assert_eq!(err.kind(), escli_core::ErrorKind::Validation);
        assert!(resolve(&[path], Some("localhost")).is_ok());
    }

    #[test]
    fn only_files_defining_the_namespace_are_reported() {
        let dir = tempdir().unwrap();
        let home = dir.path().join("home.json");
        let local = dir.path().join("local.json");
        fs::write(&home, r#"{"prod":{"host":"https://es.prod"}}"#).unwrap();
        fs::write(&local, r#"{"localhost":{}}"#).unwrap();

        let (profile, loaded) = resolve(&[home.clone(), local], Some("prod")).unwrap();
        assert_eq!(loaded, vec![home]);
        assert_eq!(profile.host, "https://es.prod");
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("escli.json");
        fs::write(&path, "not json").unwrap();
        assert!(resolve(&[path], None).unwrap_err().to_string().contains("cannot parse"));
    }

    #[test]
    fn flags_only_switch_on() {
        let base = Profile { insecure: true, ..Profile::defaults() };
        assert!(base.overwrite(Profile::default()).insecure);
    }
}

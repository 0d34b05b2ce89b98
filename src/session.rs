//! State owned by the control thread: the configuration snapshot, the index
//! and the two inputs (search query, folder path) every view is derived from.

use tracing::info;

use crate::command::{self, HostEnv, Invocation};
use crate::config::{BackendConfig, Diagnostic};
use crate::error::Result;
use crate::search;
use crate::store::{self, Entry, FolderListing, Index};

#[derive(Debug)]
pub struct Session {
    config: BackendConfig,
    host: HostEnv,
    index: Index,
    query: String,
    path: Vec<String>,
    generation: u64,
}

impl Session {
    /// A session with an empty index; call [`Session::refresh`] to load it.
    pub fn new(config: BackendConfig, host: HostEnv) -> Self {
        Session {
            index: Index::empty(&config.store_path),
            config,
            host,
            query: String::new(),
            path: Vec::new(),
            generation: 0,
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Bumped every time the index is replaced.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Rescans the store and returns to its root folder. On failure the index
    /// is left empty and the error returned, so an uninitialized store is just
    /// an empty session.
    pub fn refresh(&mut self) -> Result<usize> {
        self.generation += 1;
        self.path.clear();

        match store::scan(&self.config.store_path) {
            Ok(index) => {
                info!(entries = index.len(), "index refreshed");
                self.index = index;
                Ok(self.index.len())
            }
            Err(err) => {
                self.index = Index::empty(&self.config.store_path);
                Err(err)
            }
        }
    }

    /// Swaps in a new configuration snapshot and rescans.
    pub fn set_config(&mut self, config: BackendConfig) -> Result<usize> {
        self.config = config;
        self.refresh()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.config.diagnostics()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query<S>(&mut self, query: S)
    where
        S: Into<String>,
    {
        self.query = query.into();
    }

    /// The flat list under the current search query.
    pub fn visible_entries(&self) -> Vec<&Entry> {
        search::filter(&self.index, &self.query)
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn folder(&self) -> FolderListing {
        self.index.list_folder(&self.path[..])
    }

    /// Descends into `dir` if it is a child folder of the current one.
    pub fn enter<S>(&mut self, dir: S) -> bool
    where
        S: AsRef<str>,
    {
        let dir = dir.as_ref();
        if self.folder().directories.contains(dir) {
            self.path.push(dir.to_owned());
            true
        } else {
            false
        }
    }

    pub fn up(&mut self) -> bool {
        self.path.pop().is_some()
    }

    /// Jumps to the breadcrumb at `depth` (0 is the store root).
    pub fn nav_to(&mut self, depth: usize) {
        self.path.truncate(depth);
    }

    /// Canonical name of `file` in the current folder.
    pub fn entry_name<S>(&self, file: S) -> String
    where
        S: AsRef<str>,
    {
        self.path
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(file.as_ref()))
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn reveal_invocation<S>(&self, name: S) -> Result<Invocation>
    where
        S: AsRef<str>,
    {
        command::build(&self.config, &self.host, &["show", name.as_ref()])
    }

    /// Clones into the configured store path.
    pub fn clone_invocation<S>(&self, url: S) -> Invocation
    where
        S: AsRef<str>,
    {
        command::clone_invocation(url, &self.config.store_path)
    }
}

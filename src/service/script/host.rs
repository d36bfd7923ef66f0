//! The program host: open documents seen as versioned script files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tower_lsp::lsp_types::Url;

use super::{document_uri, script_file_name, ScriptHost, LIBRARY_FILE_VERSION};
use crate::document::{DocumentEvent, DocumentObserver, DocumentStore, LanguageId};
use crate::settings::CompilerOptions;

/// One managed file: the script region of an open document.
#[derive(Debug, Clone)]
pub struct ScriptFile {
    pub uri: Url,
    /// Version of the owning document.
    pub version: u32,
    /// Script region text, empty when the document has no script region.
    pub snapshot: Arc<str>,
}

/// Mirrors the open documents into a file table for the script service.
///
/// The table is kept in open order and updated from document store events.
pub struct ScriptProgramHost {
    files: RwLock<IndexMap<String, ScriptFile>>,
    options: CompilerOptions,
    root: PathBuf,
}

impl ScriptProgramHost {
    pub fn new(options: CompilerOptions, root: PathBuf) -> Self {
        Self {
            files: RwLock::new(IndexMap::new()),
            options,
            root,
        }
    }

    pub fn file(&self, uri: &Url) -> Option<ScriptFile> {
        self.files.read().get(&script_file_name(uri)).cloned()
    }

    pub fn is_managed(&self, file_name: &str) -> bool {
        self.files.read().contains_key(file_name)
    }

    fn library_path(&self, file_name: &str) -> PathBuf {
        let path = Path::new(file_name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl DocumentObserver for ScriptProgramHost {
    fn on_document_event(&self, event: &DocumentEvent, store: &DocumentStore) {
        let uri = event.uri();
        let file_name = script_file_name(uri);

        match event {
            DocumentEvent::Added(_) | DocumentEvent::Changed(_) => {
                let Some(document) = store.get(uri) else {
                    return;
                };
                let snapshot = store
                    .virtual_document(uri, LanguageId::Script)
                    .map(|doc| doc.line_index.shared_text())
                    .unwrap_or_else(|| Arc::from(""));
                let file = ScriptFile {
                    uri: uri.clone(),
                    version: document.version,
                    snapshot,
                };
                tracing::debug!(file = %file_name, version = file.version, "script file updated");
                // Existing keys keep their position.
                self.files.write().insert(file_name, file);
            }
            DocumentEvent::Removed(_) => {
                if self.files.write().shift_remove(&file_name).is_some() {
                    tracing::debug!(file = %file_name, "script file removed");
                }
            }
        }
    }
}

impl ScriptHost for ScriptProgramHost {
    fn compilation_settings(&self) -> &CompilerOptions {
        &self.options
    }

    fn current_directory(&self) -> &Path {
        &self.root
    }

    fn script_file_names(&self) -> Vec<String> {
        self.files.read().keys().cloned().collect()
    }

    fn script_version(&self, file_name: &str) -> String {
        match self.files.read().get(file_name) {
            Some(file) => file.version.to_string(),
            None => LIBRARY_FILE_VERSION.to_string(),
        }
    }

    fn script_snapshot(&self, file_name: &str) -> Option<Arc<str>> {
        if let Some(file) = self.files.read().get(file_name) {
            return Some(Arc::clone(&file.snapshot));
        }
        // A synthetic name whose document is gone reads as empty.
        if document_uri(file_name).is_some() {
            return Some(Arc::from(""));
        }
        self.read_file(&self.library_path(file_name)).map(Arc::from)
    }

    fn file_exists(&self, file_name: &str) -> bool {
        self.is_managed(file_name)
    }

    fn read_file(&self, path: &Path) -> Option<String> {
        match std::fs::read_to_string(path) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "library file unreadable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (DocumentStore, Arc<ScriptProgramHost>) {
        let store = DocumentStore::new();
        let host = Arc::new(ScriptProgramHost::new(
            CompilerOptions::default(),
            std::env::temp_dir(),
        ));
        store.subscribe(host.clone());
        (store, host)
    }

    fn uri(name: &str) -> Url {
        Url::parse(&format!("file:///project/{name}.mahal")).unwrap()
    }

    #[test]
    fn versions_follow_documents() {
        let (store, host) = setup();
        let a = uri("a");
        let name = script_file_name(&a);

        store.open(a.clone(), "<script>let x = 1;</script>".into(), 0);
        assert_eq!(host.script_version(&name), "1");
        assert_eq!(host.script_snapshot(&name).as_deref(), Some("let x = 1;"));

        store.update(a.clone(), "<script>let x = 2;</script>".into(), 1);
        store.update(a.clone(), "<script>let x = 3;</script>".into(), 2);
        assert_eq!(host.script_version(&name), "3");
        assert_eq!(host.script_snapshot(&name).as_deref(), Some("let x = 3;"));
    }

    #[test]
    fn file_names_keep_open_order() {
        let (store, host) = setup();
        for name in ["a", "b", "c"] {
            store.open(uri(name), String::new(), 0);
        }
        store.update(uri("a"), "<div></div>".into(), 1);
        store.close(&uri("b"));

        assert_eq!(
            host.script_file_names(),
            vec![script_file_name(&uri("a")), script_file_name(&uri("c"))]
        );
    }

    #[test]
    fn document_without_script_is_empty_file() {
        let (store, host) = setup();
        store.open(uri("a"), "<style>.a{}</style>".into(), 0);
        let name = script_file_name(&uri("a"));
        assert!(host.file_exists(&name));
        assert_eq!(host.script_snapshot(&name).as_deref(), Some(""));
    }

    #[test]
    fn unmanaged_files() {
        let (store, host) = setup();
        let a = uri("a");
        store.open(a.clone(), "<script>1</script>".into(), 0);
        store.close(&a);

        let name = script_file_name(&a);
        assert!(!host.file_exists(&name));
        assert_eq!(host.script_version(&name), LIBRARY_FILE_VERSION);
        assert_eq!(host.script_snapshot(&name).as_deref(), Some(""));
        assert!(host.script_snapshot("/definitely/not/here/lib.d.ts").is_none());
    }

    #[test]
    fn library_files_are_read_from_disk() {
        let (_store, host) = setup();
        let path = std::env::temp_dir().join(format!("mahalsp-lib-{}.d.ts", std::process::id()));
        std::fs::write(&path, "declare const lib: number;").unwrap();

        let name = path.to_string_lossy().into_owned();
        assert_eq!(host.script_version(&name), "0");
        assert_eq!(
            host.script_snapshot(&name).as_deref(),
            Some("declare const lib: number;")
        );

        let _ = std::fs::remove_file(&path);
    }
}

//! linestore — Flat Text Files as Line Collections
//!
//! This crate re-exports the line-store engine for the `linestore` CLI and, with the
//! `extension-module` feature, exposes it to Python.

#[cfg(feature = "pyo3")]
mod python;

pub use linestore_core::{
    split_lines, EventLog, Identity, LineInput, LineStore, PolicyFlag, Result, StoreError,
    StoreOptions,
};

#[cfg(test)]
mod tests {
    use crate::*;

    fn quiet() -> StoreOptions {
        StoreOptions::default()
            .logging(false)
            .identity(Identity::new("h", "t[0]"))
    }

    #[test]
    fn hosts_file_workflow() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts");
        std::fs::write(
            &path,
            "10.0.0.1 host01\n# comment\n10.0.0.2 host02\n",
        )
        .unwrap();

        let mut store = LineStore::with_options(quiet().path(path.to_str().unwrap())).unwrap();
        assert_eq!(store.search("host"), ["10.0.0.1 host01", "10.0.0.2 host02"]);

        let comments: Vec<String> = store.search("#").into_iter().map(String::from).collect();
        assert!(store.subtract(comments));
        assert!(store.replace("10.0.0.2 host02", "10.0.0.3 host02"));
        assert!(store.is_dirty());
        store.save().unwrap();
        assert!(!store.is_dirty());

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "10.0.0.1 host01\n10.0.0.3 host02\n"
        );
    }

    #[test]
    fn empty_store_renders_empty() {
        let store = LineStore::with_options(quiet()).unwrap();
        assert_eq!(store.to_string(), "");
        assert_eq!(store.render_log(), "");
    }
}

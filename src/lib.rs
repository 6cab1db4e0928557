//! Workspace root package. It only carries the shared pre-commit hook
//! configuration; the library and CLI live under `crates/`.

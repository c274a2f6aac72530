//! Workspace root package. Hosts shared tooling such as the pre-commit hooks;
//! the application lives in `crates/`.

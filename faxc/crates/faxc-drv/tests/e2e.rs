//! Entry point that pulls the `tests/e2e/` submodules into a single
//! integration test binary.

#[path = "e2e/mod.rs"]
mod e2e;

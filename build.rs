//! Emits rerun directives for the embedded migration files.
//!
//! `embed_migrations!` reads the SQL at compile time, but Cargo does not know
//! about that dependency on its own, so changed migrations would otherwise be
//! missed by incremental builds.

fn main() {
    println!("cargo:rerun-if-changed=migrations");
}

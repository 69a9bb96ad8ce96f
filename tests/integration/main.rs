//! Integration tests
//!
//! `api_tests` talk to a running server on localhost:8080 seeded with the
//! default librarian. `repository_tests` need a Postgres database reachable
//! through `DATABASE_URL` and migrate a
//! fresh schema per test. Both are ignored by default:
//! `cargo test --test integration -- --ignored`

mod api_tests;
mod repository_tests;

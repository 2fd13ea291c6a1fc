//! Crate-level tests exercising the full normalize-and-merge pipeline over
//! recorded feed payloads in `fixtures/`.

mod pipeline_tests;

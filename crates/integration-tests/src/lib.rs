//! End-to-end tests for the image relay; see `tests/`

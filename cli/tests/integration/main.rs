//! Integration tests for the battinfo binary.

mod util;

mod config_tests;
mod daemon_tests;
mod query_tests;

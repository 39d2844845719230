//! Startup wiring tests against the fake Redis server

mod session_tests;
mod startup_tests;

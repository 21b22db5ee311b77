//! Store test suite

mod glob_tests;
mod table_tests;

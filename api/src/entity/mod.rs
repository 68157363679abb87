//! SeaORM entities
//!
//! Only the tables this service writes through the ORM are modeled; reads
//! against the medical schema go through raw statements.

pub mod get_status_table;

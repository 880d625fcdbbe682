//! Outbound adapters implementing the driven domain ports.
//!
//! - **persistence**: PostgreSQL repositories using Diesel
//! - **memory**: process-local repositories for runs without a database
//! - **security**: bcrypt password hashing and JWT bearer tokens
//! - **storage**: capability-scoped image files
//!
//! Adapters only translate between domain types and their infrastructure;
//! they contain no business rules.

pub mod memory;
pub mod persistence;
pub mod security;
pub mod storage;

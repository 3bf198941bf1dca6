//! Request dispatch
//!
//! Sequences validation, authorization, lookup, mutation and rollback for
//! the three supported operations.

pub mod dispatcher;
pub mod state;

pub use dispatcher::Dispatcher;
pub use state::Stage;

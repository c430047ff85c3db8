pub mod account;
pub mod acl;
pub mod config;
pub mod error;
pub mod materialize;
pub mod ownership;
pub mod reconcile;
pub mod session;

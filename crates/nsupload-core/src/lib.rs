//! Client for the file cabinet RESTlet: request signing, the version gate,
//! the four REST operations and the file/directory sync built on them.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod paths;
pub mod protocol;
pub mod sync;
pub mod transport;
pub mod version;

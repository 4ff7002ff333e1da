// Library for tests to access modules

pub mod calc;
pub mod config;
pub mod engine;
pub mod forwarder;
pub mod models;
pub mod relay;
pub mod routes;
pub mod series;
pub mod source;
pub mod store;
pub mod version;

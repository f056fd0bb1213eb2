pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod ledger;
pub mod model;
pub mod routes;
pub mod seed;
pub mod state;
pub mod store;

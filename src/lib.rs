pub mod api;
pub mod config;
pub mod controller;
pub mod domain;
pub mod session_store;
pub mod terminal;

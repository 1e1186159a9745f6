pub mod query;
pub mod repository;
pub mod service;

pub mod config;
pub mod lookup;
pub mod models;
pub mod storage;
pub mod web;

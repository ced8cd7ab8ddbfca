pub mod config;
pub mod corrector;
pub mod db;
pub mod error;
pub mod models;
pub mod report;

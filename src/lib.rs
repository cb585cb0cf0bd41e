pub mod config;
pub mod db;
pub mod error;
pub mod extraction;
pub mod gateway;
pub mod handlers;
pub mod lifecycle;
pub mod migrations;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod version;
pub mod views;

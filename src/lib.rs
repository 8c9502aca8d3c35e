pub mod common;
pub mod config;
pub mod detect;
pub mod reconcile;
pub mod runtime;
pub mod web;

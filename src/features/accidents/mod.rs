//! Accident reporting: catalog lookups, reporter assignment, photo binding
//! and the review workflow.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use services::AccidentService;

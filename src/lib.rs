// src/lib.rs — Library root for studylab

pub mod analytics;
pub mod auth;
pub mod cli;
pub mod infra;
pub mod learning_log;
pub mod session;
pub mod survey;
pub mod timer;
pub mod upload;

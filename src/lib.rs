// src/lib.rs

//! Hunter: marketplace offer monitor library

pub mod error;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod services;
pub mod utils;

#[cfg(test)]
mod testing;

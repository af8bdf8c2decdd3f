// src/lib.rs

//! takedown: GitHub copyright-violation scanner and notifier

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

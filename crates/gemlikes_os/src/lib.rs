#![forbid(unsafe_code)]

pub mod app_ingress;
pub mod config;
pub mod links;

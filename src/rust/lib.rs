#![allow(clippy::module_inception)]

pub mod engine;
pub mod platform;
pub mod services;
pub mod shared;
pub mod tools;

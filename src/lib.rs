pub mod actuator;
pub mod config;
pub mod controller;
pub mod position;
pub mod retry;
pub mod switchbot;
pub mod tide;

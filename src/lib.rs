pub mod app;
pub mod braille;
pub mod config;
pub mod controller;
pub mod data;
pub mod geo;
pub mod hash;
pub mod loader;
pub mod map;
pub mod presentation;
pub mod state;
pub mod submit;
pub mod ui;

pub mod animation;
pub mod assets;
pub mod collision;
pub mod components;
pub mod config;
pub mod entity;
pub mod error;
pub mod events;
pub mod input;
pub mod loading;
pub mod render;
pub mod simulation;
pub mod sprite;
pub mod text;
pub mod tile_map;

pub mod challenge;
pub mod commands;
pub mod constants;
pub mod error;
pub mod host;
pub mod layout;
pub mod persistence;
pub mod player;
pub mod property_file;
pub mod team;
pub mod track;
pub mod types;

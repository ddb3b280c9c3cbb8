pub mod action_executor;
pub mod bundle;
pub mod config;
pub mod contract;
pub mod core_service;
pub mod discovery;
pub mod events;
pub mod folder_store;
pub mod logging;
pub mod model;
pub mod runtime;
pub mod scanner;
pub mod settings_store;
pub mod transport;
pub mod view;

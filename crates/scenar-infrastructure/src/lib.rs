//! File-backed infrastructure: paths, atomic TOML storage, configuration,
//! secrets, and the TOML heuristic and session repositories.

pub mod config_service;
pub mod dto;
pub mod paths;
pub mod storage;
pub mod toml_heuristic_repository;
pub mod toml_session_repository;

pub use crate::config_service::ConfigService;
pub use crate::paths::ScenarPaths;
pub use crate::toml_heuristic_repository::TomlHeuristicRepository;
pub use crate::toml_session_repository::TomlSessionRepository;

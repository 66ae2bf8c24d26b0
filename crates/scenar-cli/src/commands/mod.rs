pub mod heuristics;
pub mod route;
pub mod sessions;

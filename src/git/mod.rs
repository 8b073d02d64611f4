pub mod diff;
#[cfg(test)]
pub mod fixture;
pub mod graph;
pub mod log;
pub mod repository;
pub mod revspec;
pub mod service;

pub use repository::GitRepository;
pub use service::GitQueryService;

//! Analysis output types

pub mod schema;

pub use schema::{
    ArtifactSource, GenerationResult, ServiceArtifact, Warning, CI_FILE_PATH, COMPOSE_FILE_NAME,
};

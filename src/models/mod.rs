mod project;

pub use project::{Project, ProjectInput, ProjectRow};

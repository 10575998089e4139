pub mod workspace;

pub use workspace::WorkspaceApi;

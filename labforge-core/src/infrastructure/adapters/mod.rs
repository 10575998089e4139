pub mod databricks;
pub mod memory;

pub use databricks::DatabricksClient;
pub use memory::InMemoryWorkspace;

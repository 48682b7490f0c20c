//! ephemeral-cluster - Provisioning of throwaway search cluster nodes

pub mod artifacts;
pub mod cli;
pub mod cluster;
pub mod error;
pub mod tasks;
pub mod version;

// Re-export commonly used types
pub use artifacts::{ArtifactDescriptor, ArtifactResolver, ArtifactsApi, Platform, PluginSpec, Product, ServerType};
pub use cluster::{ClusterConfig, ClusterConfiguration, EphemeralCluster, NodeFileSystem};
pub use error::ClusterError;
pub use tasks::{ClusterComposer, ClusterTask, PipelineEvent, TaskOutcome, TaskPipeline};
pub use version::{Provenance, StructuredVersion};

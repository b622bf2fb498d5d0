//! Resource and secret stores — Kubernetes-backed and in-memory.

pub mod kube_backend;
pub mod memory;
pub mod traits;

pub use kube_backend::KubeStore;
pub use memory::MemoryStore;
pub use traits::{ResourceStore, SecretStore};

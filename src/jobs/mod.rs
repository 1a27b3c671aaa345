//! Bulk task engine.
//!
//! A panel request turns into a [`JobSpec`], gets a [`JobHandle`] from the
//! [`TaskRegistry`] and is executed by the [`BulkJobRunner`]. The [`SpamLoop`]
//! runs detached under the same registry. Cancellation is cooperative: loops
//! re-check their handle at every pacing boundary.

mod handle;
mod registry;
mod runner;
mod spam;
mod spec;

pub use handle::JobHandle;
pub use registry::{RegistryStatus, SpamTask, Stopped, TaskRegistry};
pub use runner::BulkJobRunner;
pub use spam::{SpamLoop, SpamStats};
pub use spec::{JobKind, JobResult, JobSpec, RoleColor};

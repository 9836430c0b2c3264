//! The caller-supplied resource factory trait
//!
//! A [`Factory`] knows how to create, validate, and destroy the resources a
//! pool manages. The pool owns every resource between loans; the factory owns
//! nothing once `create` resolves.

use std::future::Future;

use crate::error::Result;

/// Produces and disposes of the resources a pool lends out.
///
/// `validate` has a default implementation that always succeeds; supply a
/// real one when the pool is configured with `test_on_borrow` or
/// `test_on_return`.
pub trait Factory: Send + Sync + 'static {
    /// The resource type produced by this factory.
    type Resource: Send + 'static;

    /// Create a new resource. Must produce a usable resource or fail.
    fn create(&self) -> impl Future<Output = Result<Self::Resource>> + Send;

    /// Release a resource permanently. Idempotency is not required; the
    /// pool calls this exactly once per resource.
    fn destroy(&self, resource: Self::Resource) -> impl Future<Output = Result<()>> + Send;

    /// Check whether an existing resource is still usable.
    fn validate(&self, _resource: &Self::Resource) -> impl Future<Output = Result<bool>> + Send {
        async { Ok(true) }
    }
}

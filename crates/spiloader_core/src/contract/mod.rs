//! Contract declarations and provider constructor registration.
//!
//! A contract is a trait-object type (`dyn Trait`) with a stable dotted
//! identifier. Providers are registered as zero-argument constructors, either
//! by hand (manual path) or at link time through `inventory` (automatic path).

pub mod id;
mod macros;
pub mod registry;

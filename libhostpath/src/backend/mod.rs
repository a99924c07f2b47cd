//! Storage backend implementations.
//!
//! Each backend module provides a concrete type that implements
//! [`Provisioner`](crate::Provisioner) and [`Identity`](crate::Identity).

pub mod hostpath;

//! Distributed reduction tasks

pub mod column_min;
pub mod quadrature;

//! Custom and airgap clusters, whose nodes register themselves.

pub mod cluster;
pub mod locals;

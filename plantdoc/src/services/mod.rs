//! Higher-level services built on the diagnosis and generation clients.

pub mod guide;

// Local workspace I/O used by the sync commands

pub mod filesystem;
pub mod local;

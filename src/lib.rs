pub mod read_from;

pub mod cli;
pub mod error;
pub mod glb;
pub mod rename;
pub mod scene;

pub use error::{Error, Result};
pub use rename::{resolve, EntityKind, MatchMode, RenameOperation, Resolution};
pub use scene::{Format, Scene};

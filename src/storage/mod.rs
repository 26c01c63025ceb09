//! Grid point storage: packed coordinates, points, the hash storage, the
//! navigation cursor and removal renumbering.

pub mod cursor;
pub mod hash_storage;
pub mod level_index;
pub mod point;
pub mod renumber;

pub use cursor::GridCursor;
pub use hash_storage::{GridStorage, STORAGE_FORMAT_VERSION, StorageRepr};
pub use level_index::{Index, Level, LevelIndex, MAX_LEVEL};
pub use point::GridPoint;
pub use renumber::Renumbering;

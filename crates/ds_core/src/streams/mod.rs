//! Streams and archives (spec.md §4.3).

mod archive;
mod endian;
mod file_stream;
mod resource_path;
mod stream;

pub use archive::{DirectoryEntry, DirectoryIterator, FileArchive, LocalFileArchive, PathStatus};
pub use endian::{Endian, Swap};
pub use file_stream::{FileMode, FileStream};
pub use resource_path::{
    resolve, resource_roots, set_resource_roots, status, PathQueryStatus, ResourceRoot,
    ResourceRoots,
};
pub use stream::{read_exact, read_until_end, SeekOrigin, Stream};

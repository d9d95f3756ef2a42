mod descriptor;
mod folder;
mod id;
mod library;

pub(crate) use self::descriptor::{DESCRIPTOR_FILE, Descriptor};
pub use self::folder::{ScriptFolder, ScriptFragment};
pub use self::id::LibraryId;
pub use self::library::Library;

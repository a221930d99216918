mod version;

pub use version::{VERSION_HEADER, add_version_headers};

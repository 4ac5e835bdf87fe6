//! Where finished downloads are placed

use std::ops::BitOr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::response::ResponseMeta;

/// Maps the temporary file of a finished download and its response metadata to
/// the final location and placement options.
pub type Destination =
    Arc<dyn Fn(&Path, &ResponseMeta) -> (PathBuf, DestinationOptions) + Send + Sync + 'static>;

/// How a downloaded file is moved into place
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DestinationOptions {
    /// Create missing parent directories of the final path
    pub create_intermediate_directories: bool,
    /// Remove a file already present at the final path
    pub remove_previous_file: bool,
}

impl DestinationOptions {
    /// No options
    pub const NONE: Self = Self {
        create_intermediate_directories: false,
        remove_previous_file: false,
    };

    /// Create missing parent directories
    pub const CREATE_INTERMEDIATE_DIRECTORIES: Self = Self {
        create_intermediate_directories: true,
        remove_previous_file: false,
    };

    /// Replace an existing file
    pub const REMOVE_PREVIOUS_FILE: Self = Self {
        create_intermediate_directories: false,
        remove_previous_file: true,
    };
}

impl BitOr for DestinationOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            create_intermediate_directories: self.create_intermediate_directories
                || rhs.create_intermediate_directories,
            remove_previous_file: self.remove_previous_file || rhs.remove_previous_file,
        }
    }
}

/// Build a [`Destination`] from a closure
pub fn destination<F>(f: F) -> Destination
where
    F: Fn(&Path, &ResponseMeta) -> (PathBuf, DestinationOptions) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Always place the download at `path`
pub fn to_file(path: impl Into<PathBuf>, options: DestinationOptions) -> Destination {
    let path = path.into();
    destination(move |_, _| (path.clone(), options))
}

/// Place the download in `directory`, named after the response's suggested
/// file name or, failing that, the temporary file's name.
pub fn suggested_download_destination(
    directory: impl Into<PathBuf>,
    options: DestinationOptions,
) -> Destination {
    let directory = directory.into();
    destination(move |temporary, meta| {
        let name = meta
            .suggested_filename()
            .map(PathBuf::from)
            .and_then(|name| name.file_name().map(PathBuf::from))
            .or_else(|| temporary.file_name().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("download"));
        (directory.join(name), options)
    })
}

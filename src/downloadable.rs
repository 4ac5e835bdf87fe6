//! Requestables whose response is saved to disk

use bytes::Bytes;

use crate::destination::Destination;
use crate::operation::download::DownloadOperation;
use crate::requestable::Requestable;
use crate::validation::Validator;
use crate::Result;

/// A requestable that produces a download operation.
///
/// All members have defaults: no resume data, no destination (the file stays
/// at its temporary path) and the download validation derived from
/// [`Requestable::validation`].
///
/// # Examples
///
/// ```no_run
/// use requestable::{
///     Destination, DestinationOptions, Downloadable, Requestable, Session,
///     suggested_download_destination,
/// };
///
/// struct Archive {
///     session: Session,
/// }
///
/// impl Requestable for Archive {
///     fn session(&self) -> &Session {
///         &self.session
///     }
///
///     fn path(&self) -> Option<String> {
///         Some("archive.zip".into())
///     }
/// }
///
/// impl Downloadable for Archive {
///     fn destination(&self) -> Option<Destination> {
///         Some(suggested_download_destination(
///             "downloads",
///             DestinationOptions::CREATE_INTERMEDIATE_DIRECTORIES,
///         ))
///     }
/// }
///
/// # async fn example() -> requestable::Result<()> {
/// let archive = Archive {
///     session: Session::builder().base_url("https://example.com").build()?,
/// };
/// let download = archive.as_request()?;
/// download.on_progress(|written, total| println!("{} / {:?}", written, total));
/// let response = download.response().await?;
/// println!("saved to {}", response.file_path.display());
/// # Ok(())
/// # }
/// ```
pub trait Downloadable: Requestable {
    /// Data from [`DownloadOperation::resume_data`] to continue an earlier download
    fn resume_data(&self) -> Option<Bytes> {
        None
    }

    /// Where the finished file is moved
    fn destination(&self) -> Option<Destination> {
        None
    }

    /// Validator applied to the response; `None` accepts any response
    fn validation_block(&self) -> Option<Validator> {
        Some(self.validation().download_validation())
    }

    /// Build a download operation, resumed if [`starts_immediately`](Requestable::starts_immediately)
    fn as_request(&self) -> Result<DownloadOperation> {
        let request = self.as_url_request()?;
        let operation = DownloadOperation::new(
            self.session(),
            request,
            self.resume_data(),
            self.destination(),
            self.validation_block(),
        );
        if self.starts_immediately() {
            operation.resume();
        }
        Ok(operation)
    }
}

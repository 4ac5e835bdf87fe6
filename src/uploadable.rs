//! Requestables that send a body

use crate::operation::upload::{UploadOperation, UploadSource};
use crate::requestable::Requestable;
use crate::validation::Validator;
use crate::Result;

/// A requestable that uploads [`upload_source`](Self::upload_source)
pub trait Uploadable: Requestable {
    /// What to send
    fn upload_source(&self) -> UploadSource;

    /// Validator applied to the response; `None` accepts any response
    fn validation_block(&self) -> Option<Validator> {
        Some(self.validation().data_validation())
    }

    /// Build an upload operation, resumed if [`starts_immediately`](Requestable::starts_immediately)
    fn as_request(&self) -> Result<UploadOperation> {
        let request = self.as_url_request()?;
        let operation = UploadOperation::new(
            self.session(),
            request,
            self.upload_source(),
            self.validation_block(),
        );
        if self.starts_immediately() {
            operation.resume();
        }
        Ok(operation)
    }
}

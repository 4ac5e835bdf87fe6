//! Declarative REST requests, downloads and uploads over reqwest
//!
//! Endpoints are described by implementing [`Requestable`] and one of the
//! capability traits ([`DataRequestable`], [`Downloadable`], [`Uploadable`]).
//! Each capability turns the description into an operation that runs on the
//! tokio runtime and can be resumed, cancelled and awaited.
//!
//! [`Args`] models the `{"args": ...}` JSON envelope echoed by services such
//! as httpbin.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

pub use args::Args;
pub use auth::Auth;
pub use backend::types::ProgressCallback;
pub use body::{Body, MultipartPart};
pub use destination::{
    Destination, DestinationOptions, destination, suggested_download_destination, to_file,
};
pub use downloadable::Downloadable;
pub use encoding::{ParameterEncoding, Parameters};
pub use error::{Error, Result};
pub use operation::OperationState;
pub use operation::data::DataOperation;
pub use operation::download::{DownloadOperation, DownloadResponse, ResumeData};
pub use operation::upload::{UploadOperation, UploadSource};
pub use request::UrlRequest;
pub use requestable::{DataRequestable, Requestable};
pub use response::{Response, ResponseMeta};
pub use session::{Session, SessionBuilder};
pub use uploadable::Uploadable;
pub use validation::{Validation, ValidationFn, Validator};

mod args;
mod auth;
pub mod backend;
mod body;
mod destination;
mod downloadable;
mod encoding;
mod error;
mod operation;
mod request;
mod requestable;
mod response;
mod session;
mod uploadable;
mod validation;

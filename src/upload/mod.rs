pub mod credential;
pub mod pipeline;

pub use credential::{Credential, CredentialCache};
pub use pipeline::{
    BatchReport, UploadOutcome, UploadPhase, UploadPipeline, UploadSource, UploadState, UploadTask,
};

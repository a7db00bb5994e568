pub mod backend;
pub mod query;
pub mod s3;

pub use backend::{AccessControl, Progress, QueryBackend, TransferBackend, TransferRequest};
pub use query::{Field, Frame, FrameMeta, Operation, QueryRequest};
pub use s3::{OpenDalDatasource, OpenDalTransfer};

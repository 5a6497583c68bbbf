//! Infrastructure layer - external I/O adapters
//!
//! - AWS Amplify via the aws CLI
//! - Archive upload over HTTP
//! - Zip packaging of the build output

pub mod amplify;
pub mod archive;
pub mod upload;

pub use amplify::{AmplifyCli, App, Branch, HostingApi};
pub use archive::{package_directory, ArchiveArtifact};
pub use upload::{ArtifactUploader, HttpUploader};

use async_trait::async_trait;
use tonic::{Request, Status};

use crate::proto;

/// One round trip per method to the file service.
///
/// Implemented over tonic by the crate; tests and custom stacks plug in
/// their own through [`crate::ResourceClient::with_transport`].
#[async_trait]
pub trait FileTransport: Send + Sync {
    async fn batch_get_file_urls(
        &self,
        request: Request<proto::BatchGetFileUrlsRequest>,
    ) -> Result<proto::BatchGetFileUrlsResponse, Status>;

    async fn get_file(
        &self,
        request: Request<proto::GetFileRequest>,
    ) -> Result<proto::FileObject, Status>;

    async fn get_download_url(
        &self,
        request: Request<proto::GetDownloadUrlRequest>,
    ) -> Result<proto::GetDownloadUrlResponse, Status>;

    async fn list_files(
        &self,
        request: Request<proto::ListFilesRequest>,
    ) -> Result<proto::ListFilesResponse, Status>;
}

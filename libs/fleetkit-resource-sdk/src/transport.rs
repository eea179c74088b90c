use async_trait::async_trait;
use tonic::transport::Channel;
use tonic::{Request, Status};

use crate::api::FileTransport;
use crate::proto;
use crate::proto::file_service_client::FileServiceClient;

/// tonic-backed [`FileTransport`].
#[derive(Clone)]
pub(crate) struct GrpcFileTransport {
    inner: FileServiceClient<Channel>,
}

impl From<Channel> for GrpcFileTransport {
    fn from(channel: Channel) -> Self {
        Self {
            inner: FileServiceClient::new(channel),
        }
    }
}

#[async_trait]
impl FileTransport for GrpcFileTransport {
    async fn batch_get_file_urls(
        &self,
        request: Request<proto::BatchGetFileUrlsRequest>,
    ) -> Result<proto::BatchGetFileUrlsResponse, Status> {
        let mut client = self.inner.clone();
        client
            .batch_get_file_urls(request)
            .await
            .map(tonic::Response::into_inner)
    }

    async fn get_file(
        &self,
        request: Request<proto::GetFileRequest>,
    ) -> Result<proto::FileObject, Status> {
        let mut client = self.inner.clone();
        client.get_file(request).await.map(tonic::Response::into_inner)
    }

    async fn get_download_url(
        &self,
        request: Request<proto::GetDownloadUrlRequest>,
    ) -> Result<proto::GetDownloadUrlResponse, Status> {
        let mut client = self.inner.clone();
        client
            .get_download_url(request)
            .await
            .map(tonic::Response::into_inner)
    }

    async fn list_files(
        &self,
        request: Request<proto::ListFilesRequest>,
    ) -> Result<proto::ListFilesResponse, Status> {
        let mut client = self.inner.clone();
        client
            .list_files(request)
            .await
            .map(tonic::Response::into_inner)
    }
}

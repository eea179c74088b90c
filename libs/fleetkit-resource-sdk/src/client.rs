use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use fleetkit_auth::{Claims, attach_claims};
use fleetkit_registry::Discovery;
use fleetkit_transport_grpc::{GrpcClientConfig, connect_lazy};
use tonic::{Request, Status};
use tracing::Instrument;

use crate::api::FileTransport;
use crate::transport::GrpcFileTransport;
use crate::{
    BatchGetFileUrlsRequest, DEFAULT_EXPIRES_IN, DISCOVERY_SCHEME, FileObject, FileUrlInfo,
    ResourceClientConfig, ResourceError, SERVICE_NAME, aggregate, proto,
};

/// Batch size above which a lookup is logged as oversized.
pub const MAX_BATCH_SIZE: usize = 100;

const DEFAULT_PAGE_SIZE: i32 = 20;
const MAX_PAGE_SIZE: i32 = 100;
const CONTEXT_IDS: usize = 10;

/// Client for the resource service.
///
/// Cheap to clone; every operation makes exactly one remote call bounded by
/// [`ResourceClientConfig::timeout`]. Claims, when given, travel as request
/// metadata.
#[derive(Clone)]
pub struct ResourceClient {
    config: ResourceClientConfig,
    transport: Arc<dyn FileTransport>,
}

impl fmt::Debug for ResourceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ResourceClient {
    /// Builds a client for a direct address. The channel dials on first use,
    /// so this must run inside a Tokio runtime.
    ///
    /// # Errors
    /// Returns [`ResourceError::Config`] for an invalid configuration or a
    /// `discovery:///` address, and [`ResourceError::Connect`] for an
    /// unusable URI.
    pub fn connect(mut config: ResourceClientConfig) -> Result<Self, ResourceError> {
        config.validate()?;
        if config.address.starts_with(DISCOVERY_SCHEME) {
            return Err(ResourceError::Config(format!(
                "'{}' needs a discovery resolver, use connect_with_discovery",
                config.address
            )));
        }
        let target = config.address.clone();
        Self::dial(config, &target)
    }

    /// Resolves `discovery:///<name>` to the first passing gRPC endpoint and
    /// builds a client for it. Direct addresses skip the lookup.
    ///
    /// # Errors
    /// Fails on invalid configuration, a failed lookup, or when no instance
    /// exposes a `grpc` endpoint.
    pub async fn connect_with_discovery(
        mut config: ResourceClientConfig,
        discovery: &dyn Discovery,
    ) -> Result<Self, ResourceError> {
        config.validate()?;
        let Some(name) = config.discovery_name().map(ToOwned::to_owned) else {
            let target = config.address.clone();
            return Self::dial(config, &target);
        };

        let instances = discovery.get_service(&name).await?;
        let Some(endpoint) = instances
            .iter()
            .find_map(|instance| instance.endpoint_for("grpc"))
            .map(ToOwned::to_owned)
        else {
            return Err(ResourceError::Connect {
                address: config.address,
                reason: format!("no passing grpc endpoint for '{name}'"),
            });
        };

        tracing::debug!(service = %name, endpoint = %endpoint, "resolved resource service");
        Self::dial(config, &endpoint)
    }

    /// Builds a client over a caller-supplied transport.
    ///
    /// # Errors
    /// Returns [`ResourceError::Config`] for an invalid configuration.
    pub fn with_transport(
        mut config: ResourceClientConfig,
        transport: Arc<dyn FileTransport>,
    ) -> Result<Self, ResourceError> {
        config.validate()?;
        Ok(Self { config, transport })
    }

    #[must_use]
    pub fn config(&self) -> &ResourceClientConfig {
        &self.config
    }

    fn dial(config: ResourceClientConfig, target: &str) -> Result<Self, ResourceError> {
        let uri = if target.contains("://") {
            target.to_owned()
        } else {
            format!("http://{target}")
        };

        let mut grpc = GrpcClientConfig::new(SERVICE_NAME).with_rpc_timeout(config.timeout);
        if !config.enable_trace {
            grpc = grpc.without_tracing();
        }

        let transport: GrpcFileTransport =
            connect_lazy(uri.as_str(), &grpc).map_err(|e| ResourceError::Connect {
                address: uri.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!(service = SERVICE_NAME, uri = %uri, "resource client wired");
        Ok(Self {
            config,
            transport: Arc::new(transport),
        })
    }

    /// Access URLs for a batch of files with default options.
    ///
    /// # Errors
    /// See [`Self::batch_get_file_urls_with_options`].
    pub async fn batch_get_file_urls(
        &self,
        claims: Option<&Claims>,
        file_ids: &[String],
    ) -> Result<HashMap<String, FileUrlInfo>, ResourceError> {
        self.batch_get_file_urls_with_options(claims, BatchGetFileUrlsRequest::new(file_ids.to_vec()))
            .await
    }

    /// Access URLs for a batch of files.
    ///
    /// An empty id list returns an empty map without a remote call. The
    /// result is keyed by the ids the service answered for; per-file
    /// failures are reported inside [`FileUrlInfo`].
    ///
    /// # Errors
    /// Returns [`ResourceError::Remote`] or [`ResourceError::Timeout`] when
    /// the call itself fails.
    pub async fn batch_get_file_urls_with_options(
        &self,
        claims: Option<&Claims>,
        request: BatchGetFileUrlsRequest,
    ) -> Result<HashMap<String, FileUrlInfo>, ResourceError> {
        if request.file_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let count = request.file_ids.len();
        if count > MAX_BATCH_SIZE {
            tracing::warn!(
                count,
                max = MAX_BATCH_SIZE,
                "batch file url request exceeds recommended size"
            );
        }

        let wire = request.into_wire();
        let requested = wire.file_ids.clone();
        let context = format!("file_ids={}", summarize_ids(&requested));
        let request = self.request(wire, claims)?;

        let response = self
            .call(
                "batch_get_file_urls",
                context,
                self.transport.batch_get_file_urls(request),
            )
            .await?;

        let results = aggregate(&requested, response.results);
        if self.config.enable_log {
            tracing::info!(count, returned = results.len(), "batch file urls fetched");
        }
        Ok(results)
    }

    /// Metadata for one file.
    ///
    /// # Errors
    /// Returns [`ResourceError::Validation`] for an empty id, otherwise a
    /// remote or timeout error.
    pub async fn get_file(
        &self,
        claims: Option<&Claims>,
        file_id: &str,
    ) -> Result<FileObject, ResourceError> {
        require_id(file_id)?;
        let request = self.request(
            proto::GetFileRequest {
                file_id: file_id.to_owned(),
            },
            claims,
        )?;

        let file = self
            .call(
                "get_file",
                format!("file_id={file_id}"),
                self.transport.get_file(request),
            )
            .await?;
        Ok(file.into())
    }

    /// Download URL and variant URLs for one file, valid for an hour.
    ///
    /// # Errors
    /// Returns [`ResourceError::Validation`] for an empty id, otherwise a
    /// remote or timeout error.
    pub async fn get_download_url(
        &self,
        claims: Option<&Claims>,
        file_id: &str,
    ) -> Result<(String, HashMap<String, String>), ResourceError> {
        require_id(file_id)?;
        let request = self.request(
            proto::GetDownloadUrlRequest {
                file_id: file_id.to_owned(),
                expires_in: DEFAULT_EXPIRES_IN,
            },
            claims,
        )?;

        let response = self
            .call(
                "get_download_url",
                format!("file_id={file_id}"),
                self.transport.get_download_url(request),
            )
            .await?;
        Ok((response.download_url, response.variant_urls))
    }

    /// One page of files and the total count.
    ///
    /// `page <= 0` becomes 1 and `page_size <= 0` becomes 20. Larger pages
    /// than 100 are passed through with a warning.
    ///
    /// # Errors
    /// Returns a remote or timeout error.
    pub async fn list_files(
        &self,
        claims: Option<&Claims>,
        page: i32,
        page_size: i32,
    ) -> Result<(Vec<FileObject>, i32), ResourceError> {
        let page = if page <= 0 { 1 } else { page };
        let page_size = if page_size <= 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        };
        if page_size > MAX_PAGE_SIZE {
            tracing::warn!(page_size, max = MAX_PAGE_SIZE, "list files page size is large");
        }

        let request = self.request(proto::ListFilesRequest { page, page_size }, claims)?;
        let response = self
            .call(
                "list_files",
                format!("page={page} page_size={page_size}"),
                self.transport.list_files(request),
            )
            .await?;

        let files = response.files.into_iter().map(FileObject::from).collect();
        Ok((files, response.total))
    }

    fn request<T>(&self, message: T, claims: Option<&Claims>) -> Result<Request<T>, ResourceError> {
        let mut request = Request::new(message);
        request.set_timeout(self.config.timeout);
        if let Some(claims) = claims {
            attach_claims(request.metadata_mut(), claims).map_err(|status| {
                ResourceError::Validation(format!(
                    "claims cannot be sent as metadata: {}",
                    status.message()
                ))
            })?;
        }
        Ok(request)
    }

    async fn call<T>(
        &self,
        op: &'static str,
        context: String,
        fut: impl Future<Output = Result<T, Status>>,
    ) -> Result<T, ResourceError> {
        let span = if self.config.enable_trace {
            tracing::info_span!("resource_call", op, context = %context)
        } else {
            tracing::Span::none()
        };

        let started = Instant::now();
        let outcome = tokio::time::timeout(self.config.timeout, fut)
            .instrument(span)
            .await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok(Ok(response)) => {
                if self.config.enable_log {
                    tracing::debug!(op, elapsed_ms, "resource call completed");
                }
                Ok(response)
            }
            Ok(Err(status)) => {
                tracing::error!(
                    op,
                    context = %context,
                    code = ?status.code(),
                    error = %status.message(),
                    elapsed_ms,
                    "resource call failed"
                );
                Err(ResourceError::Remote {
                    op,
                    context,
                    status: Box::new(status),
                })
            }
            Err(_) => {
                tracing::error!(op, context = %context, elapsed_ms, "resource call timed out");
                Err(ResourceError::Timeout {
                    op,
                    after: self.config.timeout,
                })
            }
        }
    }
}

fn require_id(file_id: &str) -> Result<(), ResourceError> {
    if file_id.is_empty() {
        return Err(ResourceError::Validation("file_id is required".to_owned()));
    }
    Ok(())
}

fn summarize_ids(ids: &[String]) -> String {
    if ids.len() <= CONTEXT_IDS {
        return ids.join(",");
    }
    format!(
        "{},...(+{} more)",
        ids[..CONTEXT_IDS].join(","),
        ids.len() - CONTEXT_IDS
    )
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tracing_test::traced_test;

    struct EchoTransport;

    #[async_trait]
    impl FileTransport for EchoTransport {
        async fn batch_get_file_urls(
            &self,
            _request: Request<proto::BatchGetFileUrlsRequest>,
        ) -> Result<proto::BatchGetFileUrlsResponse, Status> {
            Ok(proto::BatchGetFileUrlsResponse::default())
        }

        async fn get_file(
            &self,
            _request: Request<proto::GetFileRequest>,
        ) -> Result<proto::FileObject, Status> {
            Err(Status::not_found("no such file"))
        }

        async fn get_download_url(
            &self,
            _request: Request<proto::GetDownloadUrlRequest>,
        ) -> Result<proto::GetDownloadUrlResponse, Status> {
            Ok(proto::GetDownloadUrlResponse::default())
        }

        async fn list_files(
            &self,
            _request: Request<proto::ListFilesRequest>,
        ) -> Result<proto::ListFilesResponse, Status> {
            Ok(proto::ListFilesResponse::default())
        }
    }

    fn echo_client() -> ResourceClient {
        ResourceClient::with_transport(ResourceClientConfig::default(), Arc::new(EchoTransport))
            .unwrap()
    }

    #[tokio::test]
    #[traced_test]
    async fn oversized_batch_warns() {
        let many: Vec<String> = (0..=MAX_BATCH_SIZE).map(|i| format!("f{i}")).collect();
        echo_client().batch_get_file_urls(None, &many).await.unwrap();
        assert!(logs_contain("exceeds recommended size"));
        assert!(logs_contain("batch response omitted requested files"));
    }

    #[tokio::test]
    #[traced_test]
    async fn large_page_warns() {
        echo_client().list_files(None, 1, 101).await.unwrap();
        assert!(logs_contain("page size is large"));
    }

    #[tokio::test]
    #[traced_test]
    async fn remote_failure_is_logged_with_context() {
        let err = echo_client().get_file(None, "f7").await.unwrap_err();
        assert_eq!(err.code(), Some(tonic::Code::NotFound));
        assert!(logs_contain("resource call failed"));
        assert!(logs_contain("file_id=f7"));
    }

    #[test]
    fn summarize_short_list() {
        let ids = vec!["a".to_owned(), "b".to_owned()];
        assert_eq!(summarize_ids(&ids), "a,b");
    }

    #[test]
    fn summarize_long_list() {
        let ids: Vec<String> = (0..12).map(|i| format!("f{i}")).collect();
        assert_eq!(
            summarize_ids(&ids),
            "f0,f1,f2,f3,f4,f5,f6,f7,f8,f9,...(+2 more)"
        );
    }

    #[test]
    fn discovery_address_needs_resolver() {
        let err = ResourceClient::connect(ResourceClientConfig::default()).unwrap_err();
        assert!(matches!(err, ResourceError::Config(_)));
    }

    #[tokio::test]
    async fn direct_address_builds_lazily() {
        let client =
            ResourceClient::connect(ResourceClientConfig::default().with_address("127.0.0.1:1"))
                .unwrap();
        assert_eq!(client.config().address, "127.0.0.1:1");
    }
}

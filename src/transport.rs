//! The seam between the row reader and the network.
//!
//! [`ReadRowsTransport`] opens one server-streaming `ReadRows` call. [`GrpcTransport`] is the real
//! implementation on top of a tonic channel; tests substitute a scripted one.

use crate::internal_macros::future_send;
use crate::proto::{BigtableClient, ReadRowsRequest, ReadRowsResponse};
use crate::DynStream;
use std::sync::Arc;
use tonic::metadata::MetadataValue;
use tonic::transport::{Channel, Endpoint};
use tonic::Status;

/// Routing header the service uses to locate the table.
pub const REQUEST_PARAMS_HEADER: &str = "x-goog-request-params";

/// The responses of a single `ReadRows` call.
pub type ResponseStream = DynStream<Result<ReadRowsResponse, Status>>;

/// Something that can issue a `ReadRows` call.
///
/// Every call is independent. A failure opening the stream is reported by the returned future; a
/// failure part way through is reported as an item of the stream.
pub trait ReadRowsTransport: Send + Sync {
    /// Start streaming the responses to `request`.
    fn read_rows(&self, request: ReadRowsRequest) -> future_send!(Result<ResponseStream, Status>);
}

impl<T: ReadRowsTransport> ReadRowsTransport for Arc<T> {
    #[inline]
    fn read_rows(&self, request: ReadRowsRequest) -> future_send!(Result<ResponseStream, Status>) {
        (**self).read_rows(request)
    }
}

/// A [`ReadRowsTransport`] that talks gRPC over a tonic [`Channel`].
#[derive(Debug, Clone)]
pub struct GrpcTransport {
    /// Generated `Bigtable` service client.
    client: BigtableClient<Channel>,
}

impl GrpcTransport {
    /// Wrap an existing channel.
    #[inline]
    pub fn new(channel: Channel) -> Self {
        Self {
            client: BigtableClient::new(channel),
        }
    }

    /// Connect to `endpoint`, for example `http://localhost:8086`.
    ///
    /// The channel is established eagerly so that an unreachable endpoint is reported here rather
    /// than on the first read.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug"))]
    pub async fn connect(endpoint: String) -> Result<Self, tonic::transport::Error> {
        let channel = Endpoint::from_shared(endpoint)?.connect().await?;
        Ok(Self::new(channel))
    }
}

impl ReadRowsTransport for GrpcTransport {
    fn read_rows(&self, request: ReadRowsRequest) -> future_send!(Result<ResponseStream, Status>) {
        let mut client = self.client.clone();
        async move {
            let params = routing_params(&request);
            let mut request = tonic::Request::new(request);
            if let Ok(value) = MetadataValue::try_from(params) {
                let _previous = request.metadata_mut().insert(REQUEST_PARAMS_HEADER, value);
            }

            let response = client.read_rows(request).await?;
            Ok(Box::pin(response.into_inner()) as ResponseStream)
        }
    }
}

/// The value of the routing header for `request`: its table and, if set, its app profile, each
/// percent-encoded.
pub fn routing_params(request: &ReadRowsRequest) -> String {
    let mut params = format!("table_name={}", urlencoding::encode(&request.table_name));
    if !request.app_profile_id.is_empty() {
        params.push_str("&app_profile_id=");
        params.push_str(&urlencoding::encode(&request.app_profile_id));
    }
    params
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn routing_params_are_encoded() {
        let request = ReadRowsRequest {
            table_name: "projects/my-project/instances/my-instance/tables/my-table".to_owned(),
            ..ReadRowsRequest::default()
        };
        assert_eq!(
            routing_params(&request),
            "table_name=projects%2Fmy-project%2Finstances%2Fmy-instance%2Ftables%2Fmy-table"
        );

        let request = ReadRowsRequest {
            table_name: "t".to_owned(),
            app_profile_id: "a b".to_owned(),
            ..ReadRowsRequest::default()
        };
        assert_eq!(routing_params(&request), "table_name=t&app_profile_id=a%20b");
    }
}

//! Line-delimited JSON lifecycle protocol spoken with the plugin host.
//!
//! Each request line names a resource type, an operation and the current
//! resource data; the reply line carries the updated data or an error.
//! Requests are handled strictly one after another.

use std::collections::BTreeMap;

use facet::Facet;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::backend::Hypervisor;
use crate::error::ProviderError;
use crate::provider::{LifecycleOp, Provider, ResourceData};

#[derive(Debug, Default, Facet)]
#[facet(default)]
pub struct LifecycleRequest {
    #[facet(default)]
    pub op: String,
    #[facet(default)]
    pub resource_type: String,
    #[facet(default)]
    pub id: String,
    #[facet(default)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Default, Facet)]
pub struct LifecycleResponse {
    pub id: String,
    pub attributes: BTreeMap<String, String>,
    pub error: Option<String>,
}

impl LifecycleResponse {
    fn from_result(data: ResourceData, result: Result<(), ProviderError>) -> Self {
        Self {
            id: data.id,
            attributes: data.attributes,
            error: result.err().map(|e| e.to_string()),
        }
    }
}

/// Handle a single request line.
pub async fn handle_line<H: Hypervisor>(provider: &Provider<H>, line: &str) -> LifecycleResponse {
    let request: LifecycleRequest = match facet_json::from_str(line) {
        Ok(r) => r,
        Err(e) => {
            let err = ProviderError::Protocol {
                message: e.to_string(),
            };
            return LifecycleResponse::from_result(ResourceData::default(), Err(err));
        }
    };

    let mut data = ResourceData {
        id: request.id,
        attributes: request.attributes,
    };
    let result = match request.op.parse::<LifecycleOp>() {
        Ok(op) => provider.call(&request.resource_type, op, &mut data).await,
        Err(e) => Err(e),
    };
    if let Err(ref e) = result {
        tracing::error!(op = %request.op, resource_type = %request.resource_type, error = %e, "lifecycle call failed");
    }
    LifecycleResponse::from_result(data, result)
}

/// Serve requests until the reader hits EOF. Every non-blank line gets a
/// reply, including lines that aren't UTF-8.
pub async fn serve<H, R, W>(
    provider: &Provider<H>,
    mut reader: R,
    mut writer: W,
) -> Result<(), ProviderError>
where
    H: Hypervisor,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let io_err = |context: &str| {
        let context = context.to_string();
        move |source: std::io::Error| ProviderError::Io { context, source }
    };

    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(io_err("reading request"))?;
        if n == 0 {
            break;
        }

        let response = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => handle_line(provider, line.trim_end()).await,
            Err(e) => {
                tracing::error!(error = %e, "request is not valid UTF-8");
                let err = ProviderError::Protocol {
                    message: format!("request is not valid UTF-8: {e}"),
                };
                LifecycleResponse::from_result(ResourceData::default(), Err(err))
            }
        };
        let mut json = facet_json::to_string(&response).map_err(|e| ProviderError::Protocol {
            message: format!("serializing response: {e}"),
        })?;
        json.push('\n');
        writer
            .write_all(json.as_bytes())
            .await
            .map_err(io_err("writing response"))?;
        writer.flush().await.map_err(io_err("flushing response"))?;
    }

    tracing::info!("plugin host closed the connection");
    Ok(())
}

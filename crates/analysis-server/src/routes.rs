//! Request dispatch shared by every listener

use std::sync::Arc;
use std::time::Duration;

use analysis_engine::analysis::DEFAULT_LIMIT;
use analysis_engine::{AnalysisRequest, AnalysisResult, ExecutionBridge};
use serde_json::Value;

use crate::error::ServerError;
use crate::http::{HttpRequest, Response};
use crate::log_sink::LogSink;
use crate::static_files::{StaticAssets, ANALYSIS_PAGE, FALLBACK_ANALYSIS_PAGE};

const BANNER: &str = "<html><body><h3>MartinDuck analysis service</h3></body></html>";

/// Routes requests to the engine bridge, the log, or static assets.
///
/// Holds no per-request state; both listeners share one instance.
pub struct Handler {
    bridge: ExecutionBridge,
    assets: StaticAssets,
    log: Arc<LogSink>,
    selftest_timeout: Duration,
    analyze_timeout: Duration,
}

impl Handler {
    pub fn new(
        bridge: ExecutionBridge,
        assets: StaticAssets,
        log: Arc<LogSink>,
        selftest_timeout: Duration,
        analyze_timeout: Duration,
    ) -> Self {
        Self {
            bridge,
            assets,
            log,
            selftest_timeout,
            analyze_timeout,
        }
    }

    pub async fn dispatch(&self, req: &HttpRequest) -> Result<Response, ServerError> {
        let path = req.path.as_str();

        if req.is("OPTIONS") {
            return Ok(Response::no_content());
        }

        let response = match path {
            "/" | "/ping" if req.is("GET") => Response::html(BANNER),
            "/log" if req.is("GET") => Response::text(200, self.log.dump().await),
            "/selftest" if req.is("GET") => {
                let result = self
                    .bridge
                    .run_with_timeout(AnalysisRequest::selftest(), self.selftest_timeout)
                    .await;
                json_result(&result)?
            }
            "/analyze" | "/api/analyze" if req.is("POST") => {
                let request = parse_analyze_body(&req.body)?;
                let result = self
                    .bridge
                    .run_with_timeout(request, self.analyze_timeout)
                    .await;
                json_result(&result)?
            }
            "/start-analysis" if req.is("POST") => Response::ack(),
            "/app/analysis" if req.is("GET") => match self.assets.load(ANALYSIS_PAGE).await {
                Some(asset) => Response::new(200, asset.content_type, asset.body),
                None => Response::html(FALLBACK_ANALYSIS_PAGE),
            },
            _ if path.starts_with("/client-log") => Response::ack(),
            _ => match self.assets.resolve(path).await {
                Some(asset) => Response::new(200, asset.content_type, asset.body),
                None => Response::not_found(),
            },
        };
        Ok(response)
    }
}

fn json_result(result: &AnalysisResult) -> Result<Response, ServerError> {
    Ok(Response::json(200, serde_json::to_vec(result)?))
}

/// Parse `{fen, multipv | limit}`; `multipv` wins when present.
pub fn parse_analyze_body(body: &[u8]) -> Result<AnalysisRequest, ServerError> {
    let value: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(body)?
    };

    let fen = value.get("fen").and_then(Value::as_str).unwrap_or("");
    let limit_key = if value.get("multipv").is_some() { "multipv" } else { "limit" };
    let limit = opt_int(&value, limit_key).unwrap_or(DEFAULT_LIMIT as i64);

    Ok(AnalysisRequest::new(fen, limit))
}

/// Lenient integer lookup: numbers (truncated) or numeric strings.
fn opt_int(value: &Value, key: &str) -> Option<i64> {
    match value.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    }
}

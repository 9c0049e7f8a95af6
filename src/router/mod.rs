//! Upload API Router
//!
//! Parses incoming requests into upload operations. Parameter values are
//! passed through raw; shape validation belongs to the orchestrator.

use std::collections::HashMap;
use thiserror::Error;

/// Router errors
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),
}

/// Upload API operations
///
/// Missing query parameters surface as empty strings so the orchestrator
/// reports them uniformly as invalid requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadRoute {
    /// POST /upload/start?key=K
    Start { key: String },
    /// POST /upload/presign?key=K&uploadId=U&partNumber=N
    Presign {
        key: String,
        upload_id: String,
        part_number: String,
    },
    /// POST /upload/complete (JSON body)
    Complete,
    /// POST /upload/abort (JSON body)
    Abort,
    /// GET /health
    Health,
}

/// Upload request parser
pub struct UploadRequestParser;

impl UploadRequestParser {
    /// Parse an HTTP request line into an upload operation
    pub fn parse(method: &str, path: &str, query: Option<&str>) -> Result<UploadRoute, RouterError> {
        match (method, path) {
            ("GET", "/health") => Ok(UploadRoute::Health),
            ("POST", "/upload/start") => {
                let params = Self::parse_query(query);
                Ok(UploadRoute::Start {
                    key: param(&params, "key"),
                })
            }
            ("POST", "/upload/presign") => {
                let params = Self::parse_query(query);
                Ok(UploadRoute::Presign {
                    key: param(&params, "key"),
                    upload_id: param(&params, "uploadId"),
                    part_number: param(&params, "partNumber"),
                })
            }
            ("POST", "/upload/complete") => Ok(UploadRoute::Complete),
            ("POST", "/upload/abort") => Ok(UploadRoute::Abort),
            (_, "/health")
            | (_, "/upload/start")
            | (_, "/upload/presign")
            | (_, "/upload/complete")
            | (_, "/upload/abort") => Err(RouterError::MethodNotAllowed(format!(
                "Method {} not allowed for {}",
                method, path
            ))),
            _ => Err(RouterError::NotFound(path.to_string())),
        }
    }

    fn parse_query(query: Option<&str>) -> HashMap<String, String> {
        let mut params = HashMap::new();
        if let Some(q) = query {
            for pair in q.split('&') {
                let mut kv = pair.splitn(2, '=');
                if let Some(key) = kv.next() {
                    let value = kv.next().unwrap_or("");
                    params.insert(key.to_string(), value.to_string());
                }
            }
        }
        params
    }
}

fn param(params: &HashMap<String, String>, name: &str) -> String {
    params.get(name).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start() {
        let route =
            UploadRequestParser::parse("POST", "/upload/start", Some("key=movie.mp4")).unwrap();
        assert_eq!(
            route,
            UploadRoute::Start {
                key: "movie.mp4".into()
            }
        );
    }

    #[test]
    fn test_parse_start_missing_key() {
        let route = UploadRequestParser::parse("POST", "/upload/start", None).unwrap();
        assert_eq!(route, UploadRoute::Start { key: String::new() });
    }

    #[test]
    fn test_parse_presign() {
        let route = UploadRequestParser::parse(
            "POST",
            "/upload/presign",
            Some("key=movie.mp4&uploadId=U1&partNumber=3"),
        )
        .unwrap();
        assert_eq!(
            route,
            UploadRoute::Presign {
                key: "movie.mp4".into(),
                upload_id: "U1".into(),
                part_number: "3".into(),
            }
        );
    }

    #[test]
    fn test_parse_body_routes() {
        assert_eq!(
            UploadRequestParser::parse("POST", "/upload/complete", None).unwrap(),
            UploadRoute::Complete
        );
        assert_eq!(
            UploadRequestParser::parse("POST", "/upload/abort", None).unwrap(),
            UploadRoute::Abort
        );
    }

    #[test]
    fn test_parse_health() {
        assert_eq!(
            UploadRequestParser::parse("GET", "/health", None).unwrap(),
            UploadRoute::Health
        );
    }

    #[test]
    fn test_wrong_method_on_known_path() {
        let result = UploadRequestParser::parse("GET", "/upload/start", Some("key=x"));
        assert!(matches!(result, Err(RouterError::MethodNotAllowed(_))));
    }

    #[test]
    fn test_unknown_path() {
        let result = UploadRequestParser::parse("POST", "/upload/list", None);
        assert!(matches!(result, Err(RouterError::NotFound(_))));
    }
}

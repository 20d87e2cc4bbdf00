//! services/api/src/web/params.rs
//!
//! Some endpoints take scalar parameters as query parameters, while the web
//! client sends the same values as a JSON body. This merges the two.

use axum::body::Bytes;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::HttpError;

/// Deserializes `T` from the query parameters overlaid on a JSON object body.
/// Query parameters win on conflicts. An empty body is allowed.
pub fn from_query_or_body<T: DeserializeOwned>(
    query: HashMap<String, String>,
    body: &Bytes,
) -> Result<T, HttpError> {
    let mut fields = if body.iter().all(u8::is_ascii_whitespace) {
        Map::new()
    } else {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(HttpError::BadRequest(
                    "Request body must be a JSON object".to_string(),
                ))
            }
            Err(e) => return Err(HttpError::BadRequest(format!("Invalid JSON body: {}", e))),
        }
    };
    for (key, value) in query {
        fields.insert(key, Value::String(value));
    }
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| HttpError::BadRequest(format!("Invalid parameters: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Params {
        username: String,
    }

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn reads_query_without_body() {
        let p: Params = from_query_or_body(query(&[("username", "ann")]), &Bytes::new()).unwrap();
        assert_eq!(p.username, "ann");
    }

    #[test]
    fn reads_body_without_query() {
        let body = Bytes::from_static(br#"{"username":"bob"}"#);
        let p: Params = from_query_or_body(HashMap::new(), &body).unwrap();
        assert_eq!(p.username, "bob");
    }

    #[test]
    fn query_overrides_body() {
        let body = Bytes::from_static(br#"{"username":"bob"}"#);
        let p: Params = from_query_or_body(query(&[("username", "ann")]), &body).unwrap();
        assert_eq!(p.username, "ann");
    }

    #[test]
    fn missing_or_malformed_is_bad_request() {
        let missing = from_query_or_body::<Params>(HashMap::new(), &Bytes::new());
        assert!(matches!(missing, Err(HttpError::BadRequest(_))));

        let broken = from_query_or_body::<Params>(HashMap::new(), &Bytes::from_static(b"{"));
        assert!(matches!(broken, Err(HttpError::BadRequest(_))));

        let array = from_query_or_body::<Params>(HashMap::new(), &Bytes::from_static(b"[]"));
        assert!(matches!(array, Err(HttpError::BadRequest(_))));
    }
}

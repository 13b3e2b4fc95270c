//! Header map round-tripping for queued operations.
//!
//! Queue records persist headers as a JSON object so a replay can
//! reconstruct the original call after a restart.

use std::collections::BTreeMap;

use holdfast_client::header::{HeaderMap, HeaderName, HeaderValue};

/// Serialize a header map to a JSON object, or None when there is
/// nothing worth persisting. Non-UTF-8 values are skipped.
pub(crate) fn headers_to_json(headers: &HeaderMap) -> Option<String> {
    let map: BTreeMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
        .collect();

    if map.is_empty() { None } else { serde_json::to_string(&map).ok() }
}

/// Rebuild a header map from its persisted JSON object.
pub(crate) fn headers_from_json(json: &str) -> Result<HeaderMap, serde_json::Error> {
    let map: BTreeMap<String, String> = serde_json::from_str(json)?;

    let mut headers = HeaderMap::new();
    for (name, value) in &map {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(name.as_str()), HeaderValue::from_str(value)) {
            headers.insert(name, value);
        }
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdfast_client::header;

    #[test]
    fn test_round_trip() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));

        let json = headers_to_json(&headers).unwrap();
        let rebuilt = headers_from_json(&json).unwrap();

        assert_eq!(rebuilt.get(header::CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(rebuilt.get(header::ACCEPT).unwrap(), "*/*");
    }

    #[test]
    fn test_empty_map_persists_as_none() {
        assert!(headers_to_json(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(headers_from_json("not json").is_err());
    }
}

fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use bleft_protocol::{
        DIGEST_LEN, Direction, TRUNCATED_DIGEST_LEN, Target, TransferRequest, TransferResponse,
        TransferStatus,
    };

    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Maps every number to f64 so `0` and `0.0` compare equal.
    fn normalize_value(v: &serde_json::Value) -> serde_json::Value {
        match v {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => serde_json::json!(f),
                None => v.clone(),
            },
            serde_json::Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), normalize_value(v)))
                    .collect(),
            ),
            serde_json::Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(normalize_value).collect())
            }
            _ => v.clone(),
        }
    }

    /// Deserializes a fixture, re-serializes it and compares the JSON.
    fn roundtrip<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            normalize_value(&fixture),
            normalize_value(&reserialized),
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  rust:    {reserialized}"
        );
        parsed
    }

    #[test]
    fn fixture_download_request() {
        let req: TransferRequest = roundtrip("download_request.json");
        assert_eq!(req.filename, "firmware.bin");
        assert_eq!(req.total_super_chunks, 3);
        assert_eq!(req.file_hash.len(), DIGEST_LEN);
        assert_eq!(req.direction, Direction::ControllerToDevice);
        assert_eq!(req.target, Target::Firmware);
    }

    #[test]
    fn fixture_upload_request() {
        let req: TransferRequest = roundtrip("upload_request.json");
        assert!(req.file_hash.is_empty());
        assert_eq!(req, TransferRequest::upload("events.log"));
    }

    #[test]
    fn fixture_upload_ack_request() {
        let req: TransferRequest = roundtrip("upload_ack_request.json");
        assert_eq!(req.file_hash.len(), TRUNCATED_DIGEST_LEN);
        assert_eq!(req.direction, Direction::DeviceToController);
    }

    #[test]
    fn fixture_download_response() {
        let resp: TransferResponse = roundtrip("download_response.json");
        assert_eq!(resp.status, TransferStatus::InProgress);
        assert_eq!(resp.next_super_chunk_index, 2);
        assert_eq!(resp.last_chunk_hash.len(), DIGEST_LEN);
        assert_eq!(resp.bytes_transferred, 200 * 1024);
    }

    #[test]
    fn fixture_upload_response_finished() {
        let resp: TransferResponse = roundtrip("upload_response_finished.json");
        assert_eq!(resp.status, TransferStatus::Finished);
        assert!(resp.last_chunk_hash.is_empty());
        assert_eq!(resp.percentage(), 100.0);
    }

    #[test]
    fn fixture_upload_response_not_found() {
        let resp: TransferResponse = roundtrip("upload_response_not_found.json");
        assert_eq!(resp.status, TransferStatus::FileNotFound);
        assert_eq!(resp.total_super_chunks, 0);
    }

    #[test]
    fn minimal_request_uses_defaults() {
        let req: TransferRequest = serde_json::from_str(r#"{"filename":"a.bin"}"#).unwrap();
        assert_eq!(req.total_super_chunks, 0);
        assert!(req.file_hash.is_empty());
        assert_eq!(req.direction, Direction::ControllerToDevice);
        assert_eq!(req.target, Target::Unknown);
    }
}

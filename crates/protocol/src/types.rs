use serde::{Deserialize, Serialize};

/// Which way the file travels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// The controller sends a file; the device downloads it.
    #[default]
    #[serde(rename = "controller_to_device")]
    ControllerToDevice,
    /// The device uploads a file to the controller.
    #[serde(rename = "device_to_controller")]
    DeviceToController,
}

/// Consumer of a finished download on the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(rename = "firmware")]
    Firmware,
    #[serde(rename = "configuration")]
    Configuration,
    #[serde(rename = "user_data")]
    UserData,
}

/// State of a transfer as reported to the peer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferStatus {
    /// No transfer has been accepted.
    #[default]
    #[serde(rename = "idle")]
    Idle,
    /// Chunks may be exchanged.
    #[serde(rename = "in_progress")]
    InProgress,
    #[serde(rename = "finished")]
    Finished,
    #[serde(rename = "error")]
    Error,
    /// Upload only: the requested file is not in the upload root.
    #[serde(rename = "file_not_found")]
    FileNotFound,
}

impl TransferStatus {
    /// Returns `true` if further chunk exchange may occur.
    pub fn is_active(self) -> bool {
        self == TransferStatus::InProgress
    }
}

/// Announces a transfer, or (for uploads) acknowledges a super-chunk.
///
/// A transfer is identified by `(filename, file_hash)`. Byte fields are
/// base64-encoded in JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub filename: String,
    #[serde(default)]
    pub total_super_chunks: u32,
    /// Whole-file MD5 for downloads. For uploads, empty starts a new
    /// transfer and non-empty echoes the last super-chunk hash.
    #[serde(default, with = "base64_bytes")]
    pub file_hash: Vec<u8>,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub target: Target,
}

impl TransferRequest {
    /// Builds a download announcement for a file the controller will send.
    pub fn download(
        filename: impl Into<String>,
        total_super_chunks: u32,
        file_hash: impl Into<Vec<u8>>,
        target: Target,
    ) -> Self {
        Self {
            filename: filename.into(),
            total_super_chunks,
            file_hash: file_hash.into(),
            direction: Direction::ControllerToDevice,
            target,
        }
    }

    /// Builds the request that starts uploading `filename` from the device.
    pub fn upload(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            direction: Direction::DeviceToController,
            ..Default::default()
        }
    }

    /// Builds the acknowledgement of an uploaded super-chunk.
    pub fn upload_ack(filename: impl Into<String>, chunk_hash: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            file_hash: chunk_hash.into(),
            direction: Direction::DeviceToController,
            ..Default::default()
        }
    }
}

/// Progress snapshot returned to the peer after every request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub filename: String,
    pub total_super_chunks: u32,
    pub next_super_chunk_index: u32,
    /// Full digest of the last received super-chunk (download) or
    /// truncated digest of the last delivered one (upload).
    #[serde(default, with = "base64_bytes")]
    pub last_chunk_hash: Vec<u8>,
    pub bytes_transferred: u64,
    pub elapsed_seconds: f64,
    pub status: TransferStatus,
}

impl TransferResponse {
    /// Returns transfer progress as a percentage (0-100) of super-chunks.
    pub fn percentage(&self) -> f64 {
        if self.total_super_chunks == 0 {
            return 0.0;
        }
        f64::from(self.next_super_chunk_index) / f64::from(self.total_super_chunks) * 100.0
    }
}

/// Base64 serde module matching the protobuf JSON rendering of `bytes`.
mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        STANDARD.encode(data).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_json_roundtrip() {
        let req = TransferRequest::download("fw.bin", 3, vec![0xAB; 16], Target::Firmware);
        let json = serde_json::to_string(&req).unwrap();
        let parsed: TransferRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(req, parsed);
    }

    #[test]
    fn request_field_names() {
        let json = r#"{"filename":"a.txt","totalSuperChunks":2,"fileHash":"SGVsbG8=","direction":"device_to_controller","target":"user_data"}"#;
        let req: TransferRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.filename, "a.txt");
        assert_eq!(req.total_super_chunks, 2);
        assert_eq!(req.file_hash, b"Hello");
        assert_eq!(req.direction, Direction::DeviceToController);
        assert_eq!(req.target, Target::UserData);
    }

    #[test]
    fn request_missing_fields_default() {
        let req: TransferRequest = serde_json::from_str(r#"{"filename":"x"}"#).unwrap();
        assert!(req.file_hash.is_empty());
        assert_eq!(req.total_super_chunks, 0);
        assert_eq!(req.direction, Direction::ControllerToDevice);
        assert_eq!(req.target, Target::Unknown);
    }

    #[test]
    fn invalid_base64_rejected() {
        let json = r#"{"filename":"x","fileHash":"***"}"#;
        assert!(serde_json::from_str::<TransferRequest>(json).is_err());
    }

    #[test]
    fn upload_helpers_set_direction() {
        let start = TransferRequest::upload("log.txt");
        assert_eq!(start.direction, Direction::DeviceToController);
        assert!(start.file_hash.is_empty());

        let ack = TransferRequest::upload_ack("log.txt", vec![1, 2]);
        assert_eq!(ack.file_hash, vec![1, 2]);
    }

    #[test]
    fn status_serialization() {
        assert_eq!(
            serde_json::to_string(&TransferStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(
            serde_json::to_string(&TransferStatus::FileNotFound).unwrap(),
            "\"file_not_found\""
        );
        assert!(TransferStatus::InProgress.is_active());
        assert!(!TransferStatus::Finished.is_active());
    }

    #[test]
    fn response_percentage() {
        let r = TransferResponse {
            total_super_chunks: 4,
            next_super_chunk_index: 1,
            ..Default::default()
        };
        assert!((r.percentage() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn response_percentage_zero_total() {
        assert_eq!(TransferResponse::default().percentage(), 0.0);
    }
}

/// One unit of data to publish: a single upload line or a single batch
/// element re-encoded as JSON.
///
/// The bytes are opaque. Neither the engine nor the publisher interpret them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    bytes: Vec<u8>,
}

impl Record {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Canonical JSON encoding of a parsed value.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, crate::IngestError> {
        let bytes = serde_json::to_vec(value)?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<Vec<u8>> for Record {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for Record {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }
}

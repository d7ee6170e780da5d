use std::fmt;

/// An image picked by the operator, held in memory until submitted.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Image payloads can be megabytes; keep them out of debug output.
impl fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A validated submission: an image plus a non-empty declared part number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    pub image: ImageUpload,
    pub part_number: String,
}

impl PendingSubmission {
    /// Returns `None` when no image is selected or the part number is empty.
    pub fn from_form(
        image: Option<&ImageUpload>,
        part_number: &str,
    ) -> Option<Self> {
        let image = image?;
        if part_number.is_empty() {
            return None;
        }
        Some(Self {
            image: image.clone(),
            part_number: part_number.to_string(),
        })
    }
}

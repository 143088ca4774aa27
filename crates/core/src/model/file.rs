use thiserror::Error;

/// Largest accepted attachment payload, in bytes.
pub const MAX_FILE_BYTES: usize = 500_000;

// Browsers render TIFF inconsistently, so it is refused even though it is an image.
const TIFF_SUBTYPES: [&str; 2] = ["tiff", "tiff-fx"];

//
// ─── ERRORS (domain validation) ────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MediaValidationError {
    #[error("file is empty")]
    EmptyPayload,

    #[error("file is {size} bytes, the maximum is {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("`{0}` is not a valid mime type")]
    MalformedMimeType(String),

    #[error("files of type `{0}` are not supported, only images and audio are accepted")]
    UnsupportedFamily(String),

    #[error("TIFF images are not supported")]
    Tiff,

    #[error("the file must be marked as part of the prompt or the response")]
    MissingAssociation,
}

//
// ─── MIME TYPE ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFamily {
    Image,
    Audio,
}

/// A mime type that passed the attachment policy.
///
/// Parameters (`; charset=...`) are dropped and the essence is lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeType {
    essence: String,
    family: MediaFamily,
}

impl MimeType {
    /// Parse and police a raw mime type.
    ///
    /// # Errors
    ///
    /// - `MalformedMimeType` if the value is not `type/subtype`
    /// - `UnsupportedFamily` for anything outside `image/*` and `audio/*`
    /// - `Tiff` for `image/tiff` and `image/tiff-fx`
    pub fn parse(raw: &str) -> Result<Self, MediaValidationError> {
        let essence = raw
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        let Some((top, sub)) = essence.split_once('/') else {
            return Err(MediaValidationError::MalformedMimeType(raw.to_owned()));
        };
        if top.is_empty() || sub.is_empty() || sub.contains('/') {
            return Err(MediaValidationError::MalformedMimeType(raw.to_owned()));
        }

        let family = match top {
            "image" => MediaFamily::Image,
            "audio" => MediaFamily::Audio,
            _ => return Err(MediaValidationError::UnsupportedFamily(essence.clone())),
        };
        if family == MediaFamily::Image && TIFF_SUBTYPES.contains(&sub) {
            return Err(MediaValidationError::Tiff);
        }

        Ok(Self { essence, family })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.essence
    }

    #[must_use]
    pub fn family(&self) -> MediaFamily {
        self.family
    }
}

//
// ─── VALIDATED FILE ────────────────────────────────────────────────────────────
//

/// Media attached to a flashcard, shown with either the prompt or the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardFile {
    mime: MimeType,
    data: Vec<u8>,
    part_of_prompt: bool,
}

impl CardFile {
    /// Rehydrate a stored attachment, re-applying the upload policy.
    ///
    /// # Errors
    ///
    /// Returns `MediaValidationError` if the stored bytes or type no longer pass.
    pub fn from_persisted(
        mime_type: &str,
        data: Vec<u8>,
        part_of_prompt: bool,
    ) -> Result<Self, MediaValidationError> {
        FileDraft {
            mime_type: mime_type.to_owned(),
            data,
            part_of_prompt: Some(part_of_prompt),
        }
        .validate()
    }

    #[must_use]
    pub fn mime(&self) -> &MimeType {
        &self.mime
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn part_of_prompt(&self) -> bool {
        self.part_of_prompt
    }
}

//
// ─── DRAFT (unvalidated upload) ────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDraft {
    pub mime_type: String,
    pub data: Vec<u8>,
    pub part_of_prompt: Option<bool>,
}

impl FileDraft {
    /// Apply the upload policy: association flag set, non-empty, at most
    /// `MAX_FILE_BYTES`, image or audio (TIFF excluded).
    ///
    /// # Errors
    ///
    /// Returns the first `MediaValidationError` the draft violates.
    pub fn validate(self) -> Result<CardFile, MediaValidationError> {
        let part_of_prompt = self
            .part_of_prompt
            .ok_or(MediaValidationError::MissingAssociation)?;

        if self.data.is_empty() {
            return Err(MediaValidationError::EmptyPayload);
        }
        if self.data.len() > MAX_FILE_BYTES {
            return Err(MediaValidationError::TooLarge {
                size: self.data.len(),
                max: MAX_FILE_BYTES,
            });
        }

        let mime = MimeType::parse(&self.mime_type)?;

        Ok(CardFile {
            mime,
            data: self.data,
            part_of_prompt,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(mime: &str, len: usize) -> FileDraft {
        FileDraft {
            mime_type: mime.to_owned(),
            data: vec![7; len],
            part_of_prompt: Some(true),
        }
    }

    #[test]
    fn rejects_oversized_image() {
        let err = draft("image/png", 600_000).validate().unwrap_err();
        assert_eq!(
            err,
            MediaValidationError::TooLarge {
                size: 600_000,
                max: MAX_FILE_BYTES
            }
        );
    }

    #[test]
    fn accepts_payload_at_the_limit() {
        assert!(draft("image/png", MAX_FILE_BYTES).validate().is_ok());
    }

    #[test]
    fn rejects_pdf_as_wrong_family() {
        let err = draft("application/pdf", 100).validate().unwrap_err();
        assert!(matches!(err, MediaValidationError::UnsupportedFamily(ref m) if m == "application/pdf"));
    }

    #[test]
    fn rejects_tiff() {
        assert_eq!(
            draft("image/tiff", 100).validate().unwrap_err(),
            MediaValidationError::Tiff
        );
        assert_eq!(
            draft("IMAGE/TIFF-FX", 100).validate().unwrap_err(),
            MediaValidationError::Tiff
        );
    }

    #[test]
    fn accepts_small_png() {
        let file = draft("image/png", 100).validate().unwrap();
        assert_eq!(file.mime().as_str(), "image/png");
        assert_eq!(file.mime().family(), MediaFamily::Image);
        assert_eq!(file.data().len(), 100);
        assert!(file.part_of_prompt());
    }

    #[test]
    fn accepts_audio_and_drops_parameters() {
        let file = draft("Audio/WebM; codecs=opus", 10).validate().unwrap();
        assert_eq!(file.mime().as_str(), "audio/webm");
        assert_eq!(file.mime().family(), MediaFamily::Audio);
    }

    #[test]
    fn requires_association_flag() {
        let mut d = draft("image/png", 10);
        d.part_of_prompt = None;
        assert_eq!(
            d.validate().unwrap_err(),
            MediaValidationError::MissingAssociation
        );
    }

    #[test]
    fn rejects_empty_payload_and_malformed_mime() {
        assert_eq!(
            draft("image/png", 0).validate().unwrap_err(),
            MediaValidationError::EmptyPayload
        );
        assert!(matches!(
            draft("png", 10).validate().unwrap_err(),
            MediaValidationError::MalformedMimeType(_)
        ));
    }
}

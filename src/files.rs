//! Binary attachments: CVs and internship documents.
//!
//! Uploads arrive as multipart parts, are checked against a MIME allow-list and
//! a size ceiling, and are stored as BLOBs next to their MIME type. Reads come
//! back out as a [`StoredFile`] that knows how to render itself as a response.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use axum::extract::multipart::Field;
use axum::extract::Multipart;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};

use crate::errors::{AppError, AppResult};

pub const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

pub const PDF_MIME: &str = "application/pdf";
pub const DOC_MIME: &str = "application/msword";
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub const ALLOWED_MIME_TYPES: [&str; 3] = [PDF_MIME, DOC_MIME, DOCX_MIME];

const FALLBACK_MIME: &str = "application/octet-stream";

/// One uploaded file part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: Option<String>,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub fn is_allowed_mime(mime_type: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&mime_type)
}

pub fn validate_upload(upload: &Upload) -> AppResult<()> {
    if !is_allowed_mime(&upload.mime_type) {
        return Err(AppError::validation("Invalid file type. Only PDF and Word documents are allowed"));
    }
    if upload.bytes.len() > MAX_ATTACHMENT_BYTES {
        return Err(AppError::validation("File too large. Maximum size is 5 MB"));
    }
    Ok(())
}

/// The four attachment slots of an internship record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InternshipFileKind {
    Evidences,
    Survey1,
    Survey2,
    Survey3,
}

impl InternshipFileKind {
    pub const ALL: [InternshipFileKind; 4] = [
        InternshipFileKind::Evidences,
        InternshipFileKind::Survey1,
        InternshipFileKind::Survey2,
        InternshipFileKind::Survey3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InternshipFileKind::Evidences => "evidences",
            InternshipFileKind::Survey1 => "survey1",
            InternshipFileKind::Survey2 => "survey2",
            InternshipFileKind::Survey3 => "survey3",
        }
    }

    /// BLOB column; identical to the multipart field name.
    pub fn column(&self) -> &'static str {
        self.as_str()
    }

    pub fn mime_column(&self) -> &'static str {
        match self {
            InternshipFileKind::Evidences => "evidences_mime_type",
            InternshipFileKind::Survey1 => "survey1_mime_type",
            InternshipFileKind::Survey2 => "survey2_mime_type",
            InternshipFileKind::Survey3 => "survey3_mime_type",
        }
    }

    pub fn field_names() -> [&'static str; 4] {
        Self::ALL.map(|kind| kind.as_str())
    }
}

impl fmt::Display for InternshipFileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InternshipFileKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| AppError::validation("Invalid file type"))
    }
}

/// A multipart body split into text fields and file parts.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub text: HashMap<String, String>,
    pub files: HashMap<String, Upload>,
}

impl MultipartForm {
    /// Drain `multipart`, accepting only the named fields.
    ///
    /// File parts are streamed chunk by chunk and abandoned as soon as they
    /// pass [`MAX_ATTACHMENT_BYTES`]. A file part with no filename and no bytes
    /// is what a browser sends for an untouched file input and counts as absent.
    pub async fn read(mut multipart: Multipart, text_fields: &[&str], file_fields: &[&str]) -> AppResult<Self> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            if file_fields.contains(&name.as_str()) {
                if form.files.contains_key(&name) {
                    return Err(AppError::validation(format!("Only one file is allowed for {name}")));
                }
                if let Some(upload) = read_upload(field).await? {
                    validate_upload(&upload)?;
                    form.files.insert(name, upload);
                }
            } else if text_fields.contains(&name.as_str()) {
                if form.text.contains_key(&name) {
                    return Err(AppError::validation(format!("Field {name} was sent more than once")));
                }
                let value = field.text().await?;
                form.text.insert(name, value);
            } else {
                return Err(AppError::validation(format!("Unexpected field: {name}")));
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.text.get(name).cloned()
    }

    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name)
    }
}

async fn read_upload(mut field: Field<'_>) -> AppResult<Option<Upload>> {
    let file_name = field.file_name().map(str::to_string);
    let mime_type = field.content_type().unwrap_or_default().to_string();

    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        if bytes.len() + chunk.len() > MAX_ATTACHMENT_BYTES {
            return Err(AppError::validation("File too large. Maximum size is 5 MB"));
        }
        bytes.extend_from_slice(&chunk);
    }

    let unnamed = file_name.as_deref().map_or(true, |name| name.trim().is_empty());
    if unnamed && bytes.is_empty() {
        return Ok(None);
    }

    Ok(Some(Upload {
        file_name,
        mime_type,
        bytes,
    }))
}

/// How the browser should treat a served file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Inline,
    Attachment,
}

impl Disposition {
    /// PDFs open in the browser; everything else downloads.
    pub fn for_mime(mime_type: &str) -> Self {
        if mime_type == PDF_MIME {
            Disposition::Inline
        } else {
            Disposition::Attachment
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Inline => "inline",
            Disposition::Attachment => "attachment",
        }
    }
}

/// Stored bytes plus what is needed to serve them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

impl StoredFile {
    pub fn new(bytes: Vec<u8>, mime_type: Option<String>, file_name: String) -> Self {
        Self {
            bytes,
            mime_type: mime_type.unwrap_or_else(|| FALLBACK_MIME.to_string()),
            file_name,
        }
    }

    pub fn content_disposition(&self, disposition: Disposition) -> String {
        format!(
            "{}; filename=\"{}\"",
            disposition.as_str(),
            sanitize_filename(&self.file_name)
        )
    }

    pub fn into_response_with(self, disposition: Disposition) -> Response {
        let content_disposition = self.content_disposition(disposition);
        (
            [(CONTENT_TYPE, self.mime_type), (CONTENT_DISPOSITION, content_disposition)],
            self.bytes,
        )
            .into_response()
    }
}

/// Extension matching an allowed MIME type.
pub fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        PDF_MIME => "pdf",
        DOC_MIME => "doc",
        DOCX_MIME => "docx",
        _ => "bin",
    }
}

/// Header-safe filename: printable ASCII only, no quotes, separators or control bytes.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();

    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(mime: &str, len: usize) -> Upload {
        Upload {
            file_name: Some("cv.pdf".to_string()),
            mime_type: mime.to_string(),
            bytes: vec![0u8; len],
        }
    }

    #[test]
    fn only_documents_are_accepted() {
        assert!(validate_upload(&upload(PDF_MIME, 10)).is_ok());
        assert!(validate_upload(&upload(DOC_MIME, 10)).is_ok());
        assert!(validate_upload(&upload(DOCX_MIME, 10)).is_ok());

        let err = validate_upload(&upload("text/plain", 10)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(validate_upload(&upload("", 10)).is_err());
    }

    #[test]
    fn size_ceiling_is_inclusive() {
        assert!(validate_upload(&upload(PDF_MIME, MAX_ATTACHMENT_BYTES)).is_ok());
        assert!(validate_upload(&upload(PDF_MIME, MAX_ATTACHMENT_BYTES + 1)).is_err());
    }

    #[test]
    fn file_kind_parses_from_path_segment() {
        assert_eq!("survey2".parse::<InternshipFileKind>().unwrap(), InternshipFileKind::Survey2);
        assert_eq!(InternshipFileKind::Evidences.mime_column(), "evidences_mime_type");
        assert!("cv".parse::<InternshipFileKind>().is_err());
        assert!("Survey1".parse::<InternshipFileKind>().is_err());
    }

    #[test]
    fn pdf_opens_inline() {
        assert_eq!(Disposition::for_mime(PDF_MIME), Disposition::Inline);
        assert_eq!(Disposition::for_mime(DOCX_MIME), Disposition::Attachment);
    }

    #[test]
    fn filenames_are_header_safe() {
        assert_eq!(sanitize_filename("Nimal Silva_CV.pdf"), "Nimal_Silva_CV.pdf");
        assert_eq!(sanitize_filename("a\"b\r\n.pdf"), "a_b__.pdf");
        assert_eq!(sanitize_filename("résumé.docx"), "r_sum_.docx");
        assert_eq!(sanitize_filename("../"), "file");
    }

    #[test]
    fn content_disposition_quotes_the_name() {
        let file = StoredFile::new(b"%PDF".to_vec(), Some(PDF_MIME.to_string()), "my cv.pdf".to_string());
        assert_eq!(file.content_disposition(Disposition::Inline), "inline; filename=\"my_cv.pdf\"");

        let file = StoredFile::new(Vec::new(), None, "x".to_string());
        assert_eq!(file.mime_type, FALLBACK_MIME);
    }
}

//! `multipart/form-data` encoding for create requests.
//!
//! The body always opens with a single `data` field carrying the JSON
//! payload, followed by the caller's attachments in order. Files are opened
//! right before they are copied and closed as soon as the copy ends, on
//! success and on error alike. Any failure discards the whole body.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

use crate::error::{ApiError, Result};

/// Name of the form field that carries the JSON payload.
pub const DATA_FIELD: &str = "data";

/// A named part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    /// Sent as a file part; the filename is the path's base name.
    File { name: String, path: PathBuf },
    /// Sent as a plain form field.
    Field { name: String, data: Vec<u8> },
}

impl Attachment {
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Attachment::File {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn field(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Attachment::Field {
            name: name.into(),
            data: data.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Attachment::File { name, .. } | Attachment::Field { name, .. } => name,
        }
    }
}

/// An encoded body and the content type that names its boundary.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    pub boundary: String,
    pub body: Vec<u8>,
}

impl MultipartBody {
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }
}

pub fn encode_multipart<P: Serialize + ?Sized>(
    payload: &P,
    attachments: &[Attachment],
) -> Result<MultipartBody> {
    let boundary = format!("rinth-{}", Uuid::new_v4().simple());
    encode_with_boundary(payload, attachments, boundary)
}

fn encode_with_boundary<P: Serialize + ?Sized>(
    payload: &P,
    attachments: &[Attachment],
    boundary: String,
) -> Result<MultipartBody> {
    let json =
        serde_json::to_vec(payload).map_err(|e| ApiError::SerializationError(e.to_string()))?;

    let mut body = Vec::new();
    write_part_header(&mut body, &boundary, DATA_FIELD, None, Some("application/json"));
    body.extend_from_slice(&json);
    body.extend_from_slice(b"\r\n");

    for attachment in attachments {
        match attachment {
            Attachment::File { name, path } => {
                let filename = base_name(path);
                write_part_header(
                    &mut body,
                    &boundary,
                    name,
                    Some(&filename),
                    Some("application/octet-stream"),
                );
                copy_file(path, &mut body).map_err(|source| ApiError::Attachment {
                    name: name.clone(),
                    source,
                })?;
            }
            Attachment::Field { name, data } => {
                write_part_header(&mut body, &boundary, name, None, None);
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    Ok(MultipartBody { boundary, body })
}

/// The handle lives only inside this function, so it is closed on every
/// return path.
fn copy_file(path: &Path, out: &mut Vec<u8>) -> io::Result<()> {
    let mut file = File::open(path)?;
    file.read_to_end(out)?;
    Ok(())
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn write_part_header(
    out: &mut Vec<u8>,
    boundary: &str,
    name: &str,
    filename: Option<&str>,
    content_type: Option<&str>,
) {
    out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", escape(name));
    if let Some(filename) = filename {
        disposition.push_str(&format!("; filename=\"{}\"", escape(filename)));
    }
    out.extend_from_slice(disposition.as_bytes());
    out.extend_from_slice(b"\r\n");
    if let Some(content_type) = content_type {
        out.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
    }
    out.extend_from_slice(b"\r\n");
}

fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

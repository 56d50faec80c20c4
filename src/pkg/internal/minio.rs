use std::{future::Future, path::Path};

use aws_sdk_s3::{
    Client,
    config::{BehaviorVersion, Credentials, Region},
    primitives::ByteStream,
};
use standard_error::{Interpolate, StandardError};
use uuid::Uuid;

use crate::{conf::settings, prelude::Result};

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn s3_client() -> Client {
    let creds = Credentials::new(&settings.s3_access_key, &settings.s3_secret_key, None, None, "static");
    let config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .endpoint_url(&settings.s3_endpoint)
        .region(Region::new(settings.s3_region.clone()))
        .credentials_provider(creds)
        .force_path_style(true)
        .build();
    Client::from_conf(config)
}

pub trait S3Ops {
    fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

impl S3Ops for Client {
    async fn upload_object(&self, bucket: &str, key: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        self.put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StandardError::new("ERR-S3-001").interpolate_err(e.to_string()))?;
        tracing::debug!("uploaded {} to {}", key, bucket);
        Ok(())
    }
}

pub async fn create_bucket(
    client: &Client,
    bucket_name: &str,
) -> Result<Option<aws_sdk_s3::operation::create_bucket::CreateBucketOutput>> {
    let constraint = aws_sdk_s3::types::BucketLocationConstraint::from(settings.s3_region.as_str());
    let cfg = aws_sdk_s3::types::CreateBucketConfiguration::builder()
        .location_constraint(constraint)
        .build();
    let create = client
        .create_bucket()
        .create_bucket_configuration(cfg)
        .bucket(bucket_name)
        .send()
        .await;
    create.map(Some).or_else(|err| {
        if err
            .as_service_error()
            .map(|se| se.is_bucket_already_exists() || se.is_bucket_already_owned_by_you())
            == Some(true)
        {
            Ok(None)
        } else {
            Err(StandardError::new("ERR-S3-002").interpolate_err(err.to_string()))
        }
    })
}

/// public objects are served from `<public base>/<bucket>/<path>`
pub fn public_url(public_base: &str, bucket: &str, path: &str) -> String {
    format!(
        "{}/{}/{}",
        public_base.trim_end_matches('/'),
        bucket.trim_matches('/'),
        path.trim_start_matches('/')
    )
}

/// content type for an accepted document, or an error for anything else
pub fn document_mime_type(file_name: &str, size: usize) -> Result<&'static str> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();
    let mime_type = match extension.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => return Err(StandardError::new("ERR-APPLY-002")),
    };
    if size > MAX_UPLOAD_BYTES {
        return Err(StandardError::new("ERR-APPLY-003"));
    }
    Ok(mime_type)
}

pub fn application_object_key(job_id: &Uuid, file_name: &str) -> String {
    let safe: String = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("applications/{}/{}-{}", job_id, Uuid::new_v4(), safe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url_convention() {
        assert_eq!(
            public_url("https://store.example.org/storage/v1/object/public/", "job-applications", "/applications/a/b.pdf"),
            "https://store.example.org/storage/v1/object/public/job-applications/applications/a/b.pdf"
        );
    }

    #[test]
    fn test_document_checks() {
        assert_eq!(document_mime_type("Resume.PDF", 1024).unwrap(), "application/pdf");
        assert!(document_mime_type("resume.docx", 2048).is_ok());
        assert!(document_mime_type("resume.exe", 10).is_err());
        assert!(document_mime_type("resume", 10).is_err());
        assert!(document_mime_type("resume.pdf", MAX_UPLOAD_BYTES + 1).is_err());
    }

    #[test]
    fn test_object_key_is_scoped_and_sanitized() {
        let job_id = Uuid::new_v4();
        let key = application_object_key(&job_id, "../My Resume (final).pdf");
        assert!(key.starts_with(&format!("applications/{}/", job_id)));
        assert!(key.ends_with("-My_Resume__final_.pdf"));
        assert!(!key.contains(".."));
    }
}

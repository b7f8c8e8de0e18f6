use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::{presigning::PresigningConfig, primitives::ByteStream};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// 1. StorageService Contract
/// StorageService
///
/// The artifact storage collaborator. Generated roster exports are written here and
/// handed off; from then on the storage service owns them.
///
/// Implementations: `S3StorageClient` (MinIO locally, Supabase in production) and the
/// in-memory `MockStorageService` used by tests.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Ensures the configured bucket exists. Only called in `Env::Local`.
    async fn ensure_bucket_exists(&self);

    /// Writes `bytes` under `key`, replacing any previous object, and returns a URL
    /// from which the artifact can be retrieved.
    async fn put_artifact(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, String>;
}

// 2. The Real Implementation (S3/MinIO/Supabase)
/// S3StorageClient
///
/// `force_path_style(true)` is required for MinIO and the Supabase storage gateway.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
    url_ttl: Duration,
}

impl S3StorageClient {
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
        url_ttl: Duration,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        let client = s3::Client::from_conf(config);

        Self {
            client,
            bucket_name: bucket.to_string(),
            url_ttl,
        }
    }

    /// Presigned GET for an existing object.
    pub async fn presigned_download_url(&self, key: &str) -> Result<String, String> {
        let presigning = PresigningConfig::expires_in(self.url_ttl).map_err(|e| e.to_string())?;
        let presigned_req = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| e.to_string())?;

        Ok(presigned_req.uri().to_string())
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn ensure_bucket_exists(&self) {
        // CreateBucket on an existing bucket is harmless.
        let _ = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await;
    }

    async fn put_artifact(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, String> {
        let key = sanitize_key(key);

        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        self.presigned_download_url(&key).await
    }
}

/// sanitize_key
///
/// Strips empty, `.` and `..` segments so a key can never escape its prefix.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

// 3. The Mock Implementation (For Tests)
/// MockStorageService
///
/// Keeps artifacts in memory so tests can inspect exactly what was written.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Returns the bytes last written under `key`, if any.
    pub fn artifact(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .ok()
            .and_then(|objects| objects.get(&sanitize_key(key)).cloned())
    }

    pub fn artifact_count(&self) -> usize {
        self.objects.lock().map(|objects| objects.len()).unwrap_or(0)
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn put_artifact(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, String> {
        if self.should_fail {
            return Err("Mock Storage Error: Simulation requested".to_string());
        }

        let key = sanitize_key(key);
        self.objects
            .lock()
            .map_err(|e| e.to_string())?
            .insert(key.clone(), bytes);

        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            key
        ))
    }
}

/// StorageState
///
/// The shared storage handle held by the application state.
pub type StorageState = Arc<dyn StorageService>;

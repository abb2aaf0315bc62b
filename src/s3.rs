use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    Client, config::Region, primitives::ByteStream, types::ObjectCannedAcl,
};
use grid_wars_domain::{ServiceError, ServiceResult, upload::ImageStorage};
use log::{error, info};

use crate::config::S3Config;

pub struct S3ImageStorage {
    client: Client,
    bucket: String,
    region: String,
    endpoint_url: Option<String>,
}

impl S3ImageStorage {
    pub async fn new(config: &S3Config) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint.clone()).force_path_style(true);
        }
        let client = Client::from_conf(builder.build());

        Self {
            client,
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            endpoint_url: config.endpoint_url.clone(),
        }
    }

    fn public_url(&self, key: &str) -> String {
        match &self.endpoint_url {
            Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key),
            None => format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket, self.region, key),
        }
    }
}

#[async_trait::async_trait]
impl ImageStorage for S3ImageStorage {
    async fn upload(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> ServiceResult<String> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| {
                error!("S3 upload failed for key {key}: {e}");
                ServiceError::Internal("Failed to upload profile image".to_string())
            })?;
        info!("Uploaded {size} bytes to s3://{}/{key}", self.bucket);
        Ok(self.public_url(key))
    }
}

/// Stand-in storage used when no bucket is configured.
pub struct DisabledImageStorage;

#[async_trait::async_trait]
impl ImageStorage for DisabledImageStorage {
    async fn upload(&self, _key: &str, _content_type: &str, _bytes: Vec<u8>) -> ServiceResult<String> {
        ServiceError::internal("Image storage is not configured")
    }
}

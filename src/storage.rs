use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    presigning::PresigningConfig,
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;

use crate::config::StorageConfig;

/// A stored blob together with the content type it was uploaded with.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: String,
}

#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    async fn get_object(&self, key: &str) -> anyhow::Result<StoredObject>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String>;
}

#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
}

impl Storage {
    pub async fn new(cfg: &StorageConfig) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(Credentials::new(
                &cfg.access_key,
                &cfg.secret_key,
                None,
                None,
                "static",
            ))
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
        })
    }
}

#[async_trait]
impl StorageClient for Storage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;
        Ok(())
    }

    async fn get_object(&self, key: &str) -> anyhow::Result<StoredObject> {
        let out = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .context("s3 get_object")?;
        let content_type = out
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = out
            .body
            .collect()
            .await
            .context("s3 get_object body")?
            .into_bytes();
        Ok(StoredObject { body, content_type })
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .context("s3 delete_object")?;
        Ok(())
    }

    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String> {
        let req = self.client.get_object().bucket(&self.bucket).key(key);
        let presigned = req
            .presigned(PresigningConfig::expires_in(
                std::time::Duration::from_secs(seconds),
            )?)
            .await
            .context("s3 presign_get")?;
        Ok(presigned.uri().to_string())
    }
}

#[cfg(test)]
pub mod memory {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bytes::Bytes;

    use super::{StorageClient, StoredObject};

    /// Bucket kept in a map. Keys registered through `fail_on` make every
    /// call touching them fail; `fail_puts_after(n)` lets only `n` more
    /// uploads through.
    #[derive(Default)]
    pub struct MemoryStorage {
        objects: Mutex<HashMap<String, StoredObject>>,
        failing: Mutex<HashSet<String>>,
        put_budget: Mutex<Option<usize>>,
    }

    impl MemoryStorage {
        pub fn with_objects<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
            let storage = Self::default();
            {
                let mut objects = storage.objects.lock().unwrap();
                for k in keys {
                    objects.insert(
                        k.to_string(),
                        StoredObject {
                            body: Bytes::from(format!("bytes of {k}")),
                            content_type: "image/jpeg".into(),
                        },
                    );
                }
            }
            storage
        }

        pub fn fail_on(&self, key: &str) {
            self.failing.lock().unwrap().insert(key.to_string());
        }

        pub fn fail_puts_after(&self, n: usize) {
            *self.put_budget.lock().unwrap() = Some(n);
        }

        pub fn contains(&self, key: &str) -> bool {
            self.objects.lock().unwrap().contains_key(key)
        }

        pub fn keys(&self) -> Vec<String> {
            let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
            keys.sort();
            keys
        }

        pub fn body(&self, key: &str) -> Option<Bytes> {
            self.objects.lock().unwrap().get(key).map(|o| o.body.clone())
        }

        fn check(&self, key: &str) -> anyhow::Result<()> {
            let failing = self.failing.lock().unwrap();
            if failing.contains(key) || failing.iter().any(|f| f.ends_with('/') && key.starts_with(f.as_str())) {
                anyhow::bail!("injected failure for {key}");
            }
            Ok(())
        }
    }

    #[async_trait]
    impl StorageClient for MemoryStorage {
        async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
            self.check(key)?;
            if let Some(left) = self.put_budget.lock().unwrap().as_mut() {
                if *left == 0 {
                    anyhow::bail!("injected upload failure for {key}");
                }
                *left -= 1;
            }
            self.objects.lock().unwrap().insert(
                key.to_string(),
                StoredObject {
                    body,
                    content_type: content_type.to_string(),
                },
            );
            Ok(())
        }

        async fn get_object(&self, key: &str) -> anyhow::Result<StoredObject> {
            self.check(key)?;
            self.objects
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no such key: {key}"))
        }

        async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
            self.check(key)?;
            self.objects.lock().unwrap().remove(key);
            Ok(())
        }

        async fn presign_get(&self, key: &str, _seconds: u64) -> anyhow::Result<String> {
            Ok(format!("https://fake.local/{}", key))
        }
    }
}

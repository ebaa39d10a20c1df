//! Async image loading orchestrator.
//!
//! Resolves a reference to a concrete URL for the current device, serves
//! it from the cache when possible, otherwise fetches it and records the
//! timing. Every load is independent: no admission control, no retries and
//! no cancellation once started.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::application::services::image_card::ResolvedImage;
use crate::application::services::image_size_policy::SizePolicy;
use crate::application::services::lazy_load::ElementId;
use crate::application::services::performance_monitor::PerformanceMonitor;
use crate::domain::entities::{CacheEntry, DeviceCapabilities, ImageReference};
use crate::domain::errors::{ImageError, ImageResult};
use crate::domain::ports::{ImageCachePort, ImageFetchPort};

use super::responsive_urls::optimized_image_url;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where a loaded image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// Served from the in-memory cache.
    MemoryCache,
    /// Downloaded.
    Network,
}

/// Result of a successful load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    /// Dimensions and resolved URL.
    pub entry: CacheEntry,
    /// Where it came from.
    pub source: ImageSource,
}

/// Message sent when a background load finishes.
#[derive(Debug, Clone)]
pub struct ImageLoadedEvent {
    /// Element that requested the image.
    pub element: ElementId,
    /// Resolved URL.
    pub url: String,
    /// The loaded image, or the error.
    pub result: ImageResult<LoadedImage>,
}

/// Where a resolved URL is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchTarget {
    /// Absolute URL fetched over HTTP.
    Remote(reqwest::Url),
    /// File under the local image root.
    Local(PathBuf),
}

/// [`ImageFetchPort`] adapter for absolute URLs and site-relative paths.
///
/// Relative paths such as `/images/a.jpg?w=400&q=85` are joined onto the
/// base URL when one is set, otherwise read from the local root with the
/// query string dropped.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    http_client: reqwest::Client,
    base_url: Option<reqwest::Url>,
    local_root: PathBuf,
}

impl HttpImageFetcher {
    /// Creates a fetcher with an optional request timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(timeout: Option<Duration>) -> ImageResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| ImageError::network(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            base_url: None,
            local_root: PathBuf::from("."),
        })
    }

    /// Resolves relative paths against `base_url` instead of the disk.
    ///
    /// # Errors
    /// Returns error if `base_url` is not an absolute URL.
    pub fn with_base_url(mut self, base_url: &str) -> ImageResult<Self> {
        let base = reqwest::Url::parse(base_url)
            .map_err(|e| ImageError::network(format!("Invalid base URL {base_url}: {e}")))?;
        self.base_url = Some(base);
        Ok(self)
    }

    /// Directory relative paths are read from when no base URL is set.
    #[must_use]
    pub fn with_local_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.local_root = root.into();
        self
    }

    /// Decides where `url` is read from.
    ///
    /// # Errors
    /// Returns error if a relative path cannot be joined onto the base URL.
    pub fn target(&self, url: &str) -> ImageResult<FetchTarget> {
        if let Ok(absolute) = reqwest::Url::parse(url) {
            return Ok(FetchTarget::Remote(absolute));
        }
        if let Some(base) = &self.base_url {
            return base
                .join(url)
                .map(FetchTarget::Remote)
                .map_err(|e| ImageError::network(format!("Invalid URL {url}: {e}")));
        }
        let path = url.split(['?', '#']).next().unwrap_or(url);
        Ok(FetchTarget::Local(
            self.local_root.join(path.trim_start_matches('/')),
        ))
    }

    async fn fetch_remote(&self, url: &str, remote: reqwest::Url) -> ImageResult<Bytes> {
        let response = self.http_client.get(remote).send().await.map_err(|e| {
            if e.is_timeout() {
                ImageError::Timeout {
                    url: url.to_string(),
                }
            } else {
                ImageError::network(format!("Request failed: {e}"))
            }
        })?;

        if !response.status().is_success() {
            return Err(ImageError::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| ImageError::network(format!("Failed to read body: {e}")))
    }
}

#[async_trait::async_trait]
impl ImageFetchPort for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> ImageResult<Bytes> {
        match self.target(url)? {
            FetchTarget::Remote(remote) => self.fetch_remote(url, remote).await,
            FetchTarget::Local(path) => {
                debug!(path = %path.display(), "Reading image from disk");
                tokio::fs::read(&path)
                    .await
                    .map(Bytes::from)
                    .map_err(|e| ImageError::Io {
                        path: path.display().to_string(),
                        message: e.to_string(),
                    })
            }
        }
    }
}

/// Orchestrates image loading through cache and network.
pub struct ImageLoader {
    fetcher: Arc<dyn ImageFetchPort>,
    cache: Arc<dyn ImageCachePort>,
    monitor: Arc<Mutex<PerformanceMonitor>>,
    policy: SizePolicy,
    cloud_name: Option<String>,
}

impl std::fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoader")
            .field("policy", &self.policy)
            .field("cloud_name", &self.cloud_name)
            .finish_non_exhaustive()
    }
}

impl ImageLoader {
    /// Creates a loader over the given fetcher, cache and monitor.
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn ImageFetchPort>,
        cache: Arc<dyn ImageCachePort>,
        monitor: Arc<Mutex<PerformanceMonitor>>,
    ) -> Self {
        Self {
            fetcher,
            cache,
            monitor,
            policy: SizePolicy::default(),
            cloud_name: None,
        }
    }

    /// Sets the size policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: SizePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the CDN cloud name used for hosted images.
    #[must_use]
    pub fn with_cloud_name(mut self, cloud_name: Option<String>) -> Self {
        self.cloud_name = cloud_name;
        self
    }

    /// Picks the size and URL for a reference in a container.
    #[must_use]
    pub fn resolve(
        &self,
        reference: &ImageReference,
        container_width: u32,
        caps: &DeviceCapabilities,
    ) -> ResolvedImage {
        let decision = self.policy.optimal_image_size(container_width, caps);
        let url = optimized_image_url(reference, decision, self.cloud_name.as_deref());
        ResolvedImage { decision, url }
    }

    /// Resolves and loads a reference for a container.
    ///
    /// # Errors
    /// Returns error if the image cannot be fetched or decoded.
    pub async fn load(
        &self,
        reference: &ImageReference,
        container_width: u32,
        caps: &DeviceCapabilities,
    ) -> ImageResult<LoadedImage> {
        let resolved = self.resolve(reference, container_width, caps);
        self.load_url(&resolved.url).await
    }

    /// Loads an already-resolved URL, consulting the cache first.
    ///
    /// # Errors
    /// Returns error if the image cannot be fetched or decoded.
    pub async fn load_url(&self, url: &str) -> ImageResult<LoadedImage> {
        if let Some(entry) = self.cache.get(url) {
            return Ok(LoadedImage {
                entry,
                source: ImageSource::MemoryCache,
            });
        }

        debug!(url, "Downloading image from network");
        let start = Instant::now();
        let bytes = self.fetcher.fetch(url).await?;
        let (width, height) = decode_dimensions(bytes).await?;
        let end = Instant::now();

        self.monitor
            .lock()
            .record_image_load_time(start, end, u64::from(width) * u64::from(height));

        let entry = CacheEntry {
            src: url.to_string(),
            width,
            height,
        };
        self.cache.set(url.to_string(), entry.clone());
        debug!(url, width, height, "Image loaded successfully");

        Ok(LoadedImage {
            entry,
            source: ImageSource::Network,
        })
    }

    /// Loads every URL concurrently, preserving order in the result.
    pub async fn load_many(&self, urls: &[String]) -> Vec<ImageResult<LoadedImage>> {
        futures_util::future::join_all(urls.iter().map(|url| self.load_url(url))).await
    }

    /// Starts loading in the background; the outcome is sent on `event_tx`.
    ///
    /// The load is not cancelled if the receiver goes away.
    pub fn load_async(
        self: &Arc<Self>,
        element: ElementId,
        url: String,
        event_tx: mpsc::UnboundedSender<ImageLoadedEvent>,
    ) {
        let loader = Arc::clone(self);
        tokio::spawn(async move {
            let result = loader.load_url(&url).await;
            if let Err(e) = &result {
                warn!(element = %element, url = %url, error = %e, "Image failed to load");
            }
            if event_tx
                .send(ImageLoadedEvent {
                    element,
                    url,
                    result,
                })
                .is_err()
            {
                error!(element = %element, "Image event receiver dropped");
            }
        });
    }

    /// Returns the shared performance monitor.
    #[must_use]
    pub fn monitor(&self) -> &Arc<Mutex<PerformanceMonitor>> {
        &self.monitor
    }
}

/// Reads image dimensions without a full decode.
async fn decode_dimensions(bytes: Bytes) -> ImageResult<(u32, u32)> {
    tokio::task::spawn_blocking(move || {
        image::ImageReader::new(Cursor::new(bytes.as_ref()))
            .with_guessed_format()
            .map_err(|e| ImageError::decode(format!("Failed to read image: {e}")))?
            .into_dimensions()
            .map_err(|e| ImageError::decode(format!("Failed to decode image: {e}")))
    })
    .await
    .map_err(|e| ImageError::decode(format!("Decode task panicked: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockImageFetchPort;
    use crate::infrastructure::image::memory_cache::MemoryImageCache;

    fn png(width: u32, height: u32) -> Bytes {
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::new_rgb8(width, height)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        Bytes::from(buf.into_inner())
    }

    fn loader(fetcher: MockImageFetchPort) -> (ImageLoader, Arc<MemoryImageCache>) {
        let cache = Arc::new(MemoryImageCache::default());
        let loader = ImageLoader::new(
            Arc::new(fetcher),
            cache.clone(),
            Arc::new(Mutex::new(PerformanceMonitor::default())),
        );
        (loader, cache)
    }

    #[tokio::test]
    async fn test_network_then_cache() {
        let mut fetcher = MockImageFetchPort::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(png(4, 3)));
        let (loader, cache) = loader(fetcher);

        let first = loader.load_url("https://x/a.png").await.unwrap();
        assert_eq!(first.source, ImageSource::Network);
        assert_eq!((first.entry.width, first.entry.height), (4, 3));
        assert!(cache.has("https://x/a.png"));

        let second = loader.load_url("https://x/a.png").await.unwrap();
        assert_eq!(second.source, ImageSource::MemoryCache);

        let metrics = loader.monitor().lock().metrics();
        assert_eq!(metrics.total_images_loaded, 1);
        assert_eq!(metrics.image_load_times[0].image_size_px, 12);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached_or_retried() {
        let mut fetcher = MockImageFetchPort::new();
        fetcher.expect_fetch().times(1).returning(|url| {
            Err(ImageError::HttpStatus {
                status: 404,
                url: url.to_string(),
            })
        });
        let (loader, cache) = loader(fetcher);

        let err = loader.load_url("https://x/missing.png").await.unwrap_err();
        assert!(err.is_network_error());
        assert!(cache.is_empty());
        assert_eq!(loader.monitor().lock().metrics().total_images_loaded, 0);
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let mut fetcher = MockImageFetchPort::new();
        fetcher
            .expect_fetch()
            .returning(|_| Ok(Bytes::from_static(b"not an image")));
        let (loader, _) = loader(fetcher);

        let err = loader.load_url("https://x/a.png").await.unwrap_err();
        assert!(matches!(err, ImageError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_load_resolves_for_device() {
        let mut fetcher = MockImageFetchPort::new();
        fetcher
            .expect_fetch()
            .withf(|url| url == "/images/a.jpg?w=800&q=65")
            .returning(|_| Ok(png(8, 6)));
        let (loader, _) = loader(fetcher);

        let caps = DeviceCapabilities {
            is_slow_connection: true,
            ..DeviceCapabilities::server_default()
        };
        let loaded = loader
            .load(&ImageReference::new("/images/a.jpg"), 1200, &caps)
            .await
            .unwrap();

        assert_eq!(loaded.entry.src, "/images/a.jpg?w=800&q=65");
    }

    #[tokio::test]
    async fn test_load_async_sends_event() {
        let mut fetcher = MockImageFetchPort::new();
        fetcher.expect_fetch().returning(|_| Ok(png(2, 2)));
        let (loader, _) = loader(fetcher);
        let loader = Arc::new(loader);
        let (tx, mut rx) = mpsc::unbounded_channel();

        loader.load_async(ElementId(9), "https://x/b.png".to_string(), tx);
        let event = rx.recv().await.unwrap();

        assert_eq!(event.element, ElementId(9));
        assert!(event.result.is_ok());
    }

    #[tokio::test]
    async fn test_load_many_preserves_order() {
        let mut fetcher = MockImageFetchPort::new();
        fetcher.expect_fetch().returning(|url| {
            if url.ends_with("bad") {
                Err(ImageError::network("boom"))
            } else {
                Ok(png(1, 1))
            }
        });
        let (loader, _) = loader(fetcher);

        let results = loader
            .load_many(&["https://x/ok".to_string(), "https://x/bad".to_string()])
            .await;
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn test_target_for_absolute_and_relative_urls() {
        let fetcher = HttpImageFetcher::new(None)
            .unwrap()
            .with_local_root("/srv/gallery");

        assert_eq!(
            fetcher.target("https://x/a.png?w=400").unwrap(),
            FetchTarget::Remote(reqwest::Url::parse("https://x/a.png?w=400").unwrap())
        );
        assert_eq!(
            fetcher.target("/images/a.jpg?w=400&q=85").unwrap(),
            FetchTarget::Local(PathBuf::from("/srv/gallery/images/a.jpg"))
        );
    }

    #[test]
    fn test_target_joins_base_url() {
        let fetcher = HttpImageFetcher::new(None)
            .unwrap()
            .with_base_url("https://memories.example.edu/app/")
            .unwrap();

        assert_eq!(
            fetcher.target("/images/a.jpg?w=400&q=85").unwrap(),
            FetchTarget::Remote(
                reqwest::Url::parse("https://memories.example.edu/images/a.jpg?w=400&q=85")
                    .unwrap()
            )
        );
        assert!(HttpImageFetcher::new(None).unwrap().with_base_url("not a url").is_err());
    }

    #[tokio::test]
    async fn test_relative_path_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("images")).unwrap();
        let body = png(5, 4);
        std::fs::write(dir.path().join("images/a.png"), &body).unwrap();

        let fetcher = HttpImageFetcher::new(None)
            .unwrap()
            .with_local_root(dir.path());
        let bytes = fetcher.fetch("/images/a.png?w=400&q=85").await.unwrap();
        assert_eq!(bytes, body);

        let err = fetcher.fetch("/images/missing.png").await.unwrap_err();
        assert!(matches!(err, ImageError::Io { .. }));
        assert!(!err.is_network_error());
    }

    #[tokio::test]
    async fn test_local_image_loads_through_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("images")).unwrap();
        std::fs::write(dir.path().join("images/b.png"), png(6, 2)).unwrap();

        let fetcher = HttpImageFetcher::new(None)
            .unwrap()
            .with_local_root(dir.path());
        let loader = ImageLoader::new(
            Arc::new(fetcher),
            Arc::new(MemoryImageCache::default()),
            Arc::new(Mutex::new(PerformanceMonitor::default())),
        );

        let loaded = loader.load_url("/images/b.png?w=400&q=85").await.unwrap();
        assert_eq!((loaded.entry.width, loaded.entry.height), (6, 2));
        assert_eq!(loaded.source, ImageSource::Network);
    }
}

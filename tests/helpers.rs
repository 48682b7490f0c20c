//! Test utilities for ephemeral-cluster
#![allow(dead_code)]

use ephemeral_cluster::artifacts::{
    Arch, ArtifactDescriptor, ArtifactResolver, Os, Platform, PluginSpec, Product,
    ProvenanceStrategy, ServerType,
};
use ephemeral_cluster::cluster::{
    ClusterConfiguration, EphemeralCluster, HttpClient, HttpResponse, NodeFileSystem,
    ProcessInvocation, ProcessRunner,
};
use ephemeral_cluster::error::ClusterError;
use ephemeral_cluster::tasks::PipelineEvent;
use ephemeral_cluster::version::{Provenance, StructuredVersion, VersionIndex};

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub fn linux() -> Platform {
    Platform::new(Os::Linux, Arch::X64)
}

pub fn released(version: &str) -> StructuredVersion {
    StructuredVersion::new(version, Provenance::Released, None).unwrap()
}

pub fn snapshot(version: &str) -> StructuredVersion {
    StructuredVersion::new(version, Provenance::Snapshot, None).unwrap()
}

/// Process runner that records invocations instead of spawning anything.
///
/// Plugin installs create `plugins/<name>` (and optionally `config/<name>`)
/// under the node home, like the real installer would.
pub struct RecordingProcessRunner {
    home: PathBuf,
    invocations: Mutex<Vec<ProcessInvocation>>,
    fail_purpose: Mutex<Option<String>>,
    plugin_config: bool,
}

impl RecordingProcessRunner {
    pub fn new(home: &Path) -> Self {
        Self {
            home: home.to_path_buf(),
            invocations: Mutex::new(Vec::new()),
            fail_purpose: Mutex::new(None),
            plugin_config: false,
        }
    }

    /// Installs also write a `config/<plugin>` directory
    pub fn with_plugin_config(mut self) -> Self {
        self.plugin_config = true;
        self
    }

    /// Fail every invocation whose purpose contains `purpose`
    pub fn fail_on(&self, purpose: &str) {
        *self.fail_purpose.lock().unwrap() = Some(purpose.to_string());
    }

    pub fn clear_failure(&self) {
        *self.fail_purpose.lock().unwrap() = None;
    }

    pub fn invocations(&self) -> Vec<ProcessInvocation> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }

    /// Plugin names passed to the installer, in order
    pub fn installed_plugins(&self) -> Vec<String> {
        self.invocations()
            .iter()
            .filter_map(|i| plugin_name(&i.purpose))
            .collect()
    }
}

fn plugin_name(purpose: &str) -> Option<String> {
    purpose
        .strip_prefix("install ")
        .and_then(|rest| rest.strip_suffix(" plugin"))
        .map(str::to_string)
}

#[async_trait]
impl ProcessRunner for RecordingProcessRunner {
    async fn execute(&self, invocation: &ProcessInvocation) -> Result<(), ClusterError> {
        self.invocations.lock().unwrap().push(invocation.clone());

        if let Some(purpose) = self.fail_purpose.lock().unwrap().as_deref() {
            if invocation.purpose.contains(purpose) {
                return Err(ClusterError::ProcessFailed {
                    purpose: invocation.purpose.clone(),
                    binary: invocation.binary.display().to_string(),
                    code: 1,
                });
            }
        }

        if let Some(name) = plugin_name(&invocation.purpose) {
            std::fs::create_dir_all(self.home.join("plugins").join(&name))?;
            if self.plugin_config {
                let config = self.home.join("config").join(&name);
                std::fs::create_dir_all(&config)?;
                std::fs::write(config.join("plugin.yml"), format!("name: {}\n", name))?;
            }
        }
        Ok(())
    }
}

/// HTTP collaborator that writes fake archives and answers `_cat/nodes`
pub struct MockHttp {
    downloads: Mutex<Vec<String>>,
    fail_downloads: bool,
    nodes: Mutex<HttpResponse>,
    polls: AtomicUsize,
}

impl MockHttp {
    pub fn new() -> Self {
        Self {
            downloads: Mutex::new(Vec::new()),
            fail_downloads: false,
            nodes: Mutex::new(HttpResponse {
                status: 200,
                body: String::new(),
            }),
            polls: AtomicUsize::new(0),
        }
    }

    pub fn failing_downloads() -> Self {
        Self {
            fail_downloads: true,
            ..Self::new()
        }
    }

    /// Answer `_cat/nodes` with one line per node
    pub fn report_nodes(&self, versions: &[&str]) {
        let body = versions.iter().map(|v| format!("{}\n", v)).collect();
        *self.nodes.lock().unwrap() = HttpResponse { status: 200, body };
    }

    pub fn respond(&self, status: u16, body: &str) {
        *self.nodes.lock().unwrap() = HttpResponse {
            status,
            body: body.to_string(),
        };
    }

    pub fn download_count(&self) -> usize {
        self.downloads.lock().unwrap().len()
    }

    pub fn downloaded_urls(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpClient for MockHttp {
    async fn download(&self, url: &str, destination: &Path) -> Result<(), ClusterError> {
        self.downloads.lock().unwrap().push(url.to_string());
        if self.fail_downloads {
            return Err(ClusterError::DownloadFailed {
                url: url.to_string(),
                reason: "HTTP 404 Not Found".to_string(),
            });
        }
        std::fs::write(destination, b"PK")?;
        Ok(())
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<HttpResponse, ClusterError> {
        assert_eq!(path, "_cat/nodes");
        assert_eq!(query, &[("h", "version")]);
        self.polls.fetch_add(1, Ordering::SeqCst);
        Ok(self.nodes.lock().unwrap().clone())
    }
}

/// Strategy that answers every lookup with a templated URL and counts calls
pub struct CountingStrategy {
    base: String,
    calls: AtomicUsize,
}

impl CountingStrategy {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProvenanceStrategy for CountingStrategy {
    async fn resolve(
        &self,
        product: &Product,
        version: &StructuredVersion,
        platform: Platform,
    ) -> Result<ArtifactDescriptor, ClusterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let url = format!("{}/{}-{}.zip", self.base, product.id(), version);
        Ok(ArtifactDescriptor::for_product(product, version, platform, url))
    }
}

/// One counting strategy per provenance
pub struct CountingResolver {
    pub released: Arc<CountingStrategy>,
    pub snapshot: Arc<CountingStrategy>,
    pub staging: Arc<CountingStrategy>,
}

impl CountingResolver {
    pub fn new() -> Self {
        Self {
            released: Arc::new(CountingStrategy::new("https://releases.test")),
            snapshot: Arc::new(CountingStrategy::new("https://snapshots.test")),
            staging: Arc::new(CountingStrategy::new("https://staging.test")),
        }
    }

    pub fn resolver(&self) -> ArtifactResolver {
        ArtifactResolver::new(
            self.released.clone(),
            self.snapshot.clone(),
            self.staging.clone(),
            linux(),
        )
    }
}

/// Version index with fixed answers
pub struct StubIndex {
    pub released: Vec<String>,
    pub latest: String,
    pub latest_major: String,
    pub build_hash: String,
}

impl StubIndex {
    pub fn new(released: &[&str]) -> Self {
        Self {
            released: released.iter().map(|s| s.to_string()).collect(),
            latest: "3.0.0-SNAPSHOT".to_string(),
            latest_major: "2.4.5".to_string(),
            build_hash: "f00ba4".to_string(),
        }
    }

    pub fn with_latest_for_major(mut self, version: &str) -> Self {
        self.latest_major = version.to_string();
        self
    }
}

#[async_trait]
impl VersionIndex for StubIndex {
    async fn is_released(&self, version: &str) -> Result<bool, ClusterError> {
        Ok(self.released.iter().any(|r| r == version))
    }

    async fn latest_release_or_snapshot(&self) -> Result<String, ClusterError> {
        Ok(self.latest.clone())
    }

    async fn latest_for_major(&self, _major: u64) -> Result<String, ClusterError> {
        Ok(self.latest_major.clone())
    }

    async fn latest_build_hash(&self, _version: &str) -> Result<String, ClusterError> {
        Ok(self.build_hash.clone())
    }
}

/// A node home and local folder in a temp dir, with recording collaborators
pub struct TestNode {
    pub dir: TempDir,
    pub process: Arc<RecordingProcessRunner>,
    pub http: Arc<MockHttp>,
    pub strategies: CountingResolver,
}

impl TestNode {
    pub fn new() -> Self {
        Self::with_collaborators(RecordingProcessRunner::new, MockHttp::new())
    }

    pub fn with_collaborators(
        process: impl FnOnce(&Path) -> RecordingProcessRunner,
        http: MockHttp,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("home");
        for sub in ["config", "plugins", "bin"] {
            std::fs::create_dir_all(home.join(sub)).unwrap();
        }
        std::fs::create_dir_all(dir.path().join("local")).unwrap();

        Self {
            process: Arc::new(process(&home)),
            http: Arc::new(http),
            strategies: CountingResolver::new(),
            dir,
        }
    }

    pub fn home(&self) -> PathBuf {
        self.dir.path().join("home")
    }

    pub fn local_folder(&self) -> PathBuf {
        self.dir.path().join("local")
    }

    pub fn cluster(&self, configuration: ClusterConfiguration) -> EphemeralCluster {
        self.cluster_at(self.home(), configuration)
    }

    /// A cluster on another home that shares this node's local folder
    pub fn cluster_at(&self, home: PathBuf, configuration: ClusterConfiguration) -> EphemeralCluster {
        let file_system = NodeFileSystem::new(configuration.server_type, home, self.local_folder());
        EphemeralCluster::new(
            configuration,
            file_system,
            self.strategies.resolver(),
            self.process.clone(),
            self.http.clone(),
        )
    }
}

/// Configuration for `version` with the given plugins
pub fn configuration(
    server_type: ServerType,
    version: StructuredVersion,
    plugins: Vec<PluginSpec>,
) -> ClusterConfiguration {
    let mut configuration = ClusterConfiguration::new(version);
    configuration.server_type = server_type;
    configuration.plugins = plugins;
    configuration
}

/// Collects pipeline events for later assertions
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<PipelineEvent>>>,
}

impl EventLog {
    pub fn handler(&self) -> impl Fn(PipelineEvent) + Send + Sync + 'static {
        let events = Arc::clone(&self.events);
        move |event| events.lock().unwrap().push(event)
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Names of tasks that were started, in order
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PipelineEvent::TaskStarted { task } => Some(task),
                _ => None,
            })
            .collect()
    }
}

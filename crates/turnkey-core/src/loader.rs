//! The unpack-and-link sequence and its one-shot state machine.
//!
//! Loading is performed by the first caller of [`NativeLoader::ensure_loaded`]:
//!
//! 1. Identify the platform the process runs on.
//! 2. Check that both bundled libraries are present.
//! 3. Unpack them into a fresh temporary directory, scheduling the directory
//!    and each file for removal at exit.
//! 4. Link the engine, then the shim.
//!
//! The outcome is recorded permanently. Concurrent callers wait for it, and
//! later callers receive it without any work being repeated.

use crate::cleanup::{CleanupRegistrar, ExitCleanup};
use crate::config::{LibrarySet, LoaderConfig};
use crate::error::{LoaderError, Result};
use crate::extract::extract;
use crate::linker::{Linker, NativeLibrary, SystemLinker};
use crate::platform::{HostInfo, Platform};
use crate::resources::{EmbeddedResources, LibraryDescriptor, LibraryRole, ResourceProvider};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// One on-disk copy of a bundled library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArtifact {
    pub role: LibraryRole,
    /// Absolute path of the extracted file.
    pub path: PathBuf,
    /// The temporary directory that owns the file.
    pub directory: PathBuf,
    /// Position in the link sequence, starting at 0.
    pub load_order: usize,
    /// Bytes written.
    pub size: u64,
}

/// The libraries linked into the process, in link order.
#[derive(Debug)]
pub struct LoadedLibraries {
    platform: Platform,
    artifacts: Vec<ExtractedArtifact>,
    libraries: Vec<Box<dyn NativeLibrary>>,
}

impl LoadedLibraries {
    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn artifacts(&self) -> &[ExtractedArtifact] {
        &self.artifacts
    }

    /// The linked library playing `role`.
    ///
    /// Both libraries are linked before this value exists, in load order.
    pub fn library(&self, role: LibraryRole) -> &dyn NativeLibrary {
        self.libraries[role.load_index()].as_ref()
    }

    pub fn engine(&self) -> &dyn NativeLibrary {
        self.library(LibraryRole::Engine)
    }

    pub fn shim(&self) -> &dyn NativeLibrary {
        self.library(LibraryRole::Shim)
    }
}

/// Observable state of a [`NativeLoader`].
#[derive(Debug, Clone)]
pub enum LoaderState {
    NotStarted,
    InProgress,
    Loaded,
    Failed(LoaderError),
}

impl LoaderState {
    /// `Loaded` and `Failed` never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoaderState::Loaded | LoaderState::Failed(_))
    }
}

enum State {
    NotStarted,
    InProgress,
    Loaded(Arc<LoadedLibraries>),
    Failed(LoaderError),
}

/// Unpacks and links the bundled engine and shim exactly once.
pub struct NativeLoader {
    host: HostInfo,
    libraries: LibrarySet,
    resources: Box<dyn ResourceProvider>,
    linker: Box<dyn Linker>,
    cleanup: Arc<dyn CleanupRegistrar>,
    temp_prefix: String,
    temp_root: Option<PathBuf>,
    state: Mutex<State>,
    finished: Condvar,
}

impl NativeLoader {
    /// A loader for the running process and the embedded libraries.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> NativeLoaderBuilder {
        NativeLoaderBuilder::new()
    }

    /// Make sure both libraries are linked into the process.
    ///
    /// Only the first call does any work. Every call, including concurrent
    /// ones, observes the same outcome.
    pub fn ensure_loaded(&self) -> Result<()> {
        self.libraries().map(|_| ())
    }

    /// The linked libraries, loading them first if necessary.
    pub fn libraries(&self) -> Result<Arc<LoadedLibraries>> {
        let mut state = self.lock_state();
        loop {
            match &*state {
                State::Loaded(libraries) => return Ok(libraries.clone()),
                State::Failed(err) => return Err(err.clone()),
                State::InProgress => {
                    state = self
                        .finished
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                State::NotStarted => break,
            }
        }
        *state = State::InProgress;
        drop(state);

        let completion = Completion {
            loader: self,
            armed: true,
        };
        completion.finish(self.load())
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> LoaderState {
        match &*self.lock_state() {
            State::NotStarted => LoaderState::NotStarted,
            State::InProgress => LoaderState::InProgress,
            State::Loaded(_) => LoaderState::Loaded,
            State::Failed(err) => LoaderState::Failed(err.clone()),
        }
    }

    /// The extracted artifacts, once loaded.
    pub fn artifacts(&self) -> Option<Vec<ExtractedArtifact>> {
        match &*self.lock_state() {
            State::Loaded(libraries) => Some(libraries.artifacts().to_vec()),
            _ => None,
        }
    }

    pub fn host(&self) -> &HostInfo {
        &self.host
    }

    pub fn library_set(&self) -> &LibrarySet {
        &self.libraries
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load(&self) -> Result<LoadedLibraries> {
        let platform = self.host.identify()?;
        debug!(
            "Identified platform {} (os: {:?}, arch: {:?})",
            platform, self.host.os_name, self.host.arch
        );

        let descriptors = LibraryRole::LOAD_ORDER
            .map(|role| LibraryDescriptor::new(platform, role, self.libraries.name(role)));

        let engine = self.resources.open(&descriptors[0].resource_path())?;
        let shim = self.resources.open(&descriptors[1].resource_path())?;
        let streams = match (engine, shim) {
            (Some(engine), Some(shim)) => [engine, shim],
            (None, None) => return Err(LoaderError::NoLibrariesForPlatform { platform }),
            (None, Some(_)) => {
                return Err(LoaderError::IncompleteDistribution {
                    platform,
                    missing: descriptors[0].name.clone(),
                })
            }
            (Some(_), None) => {
                return Err(LoaderError::IncompleteDistribution {
                    platform,
                    missing: descriptors[1].name.clone(),
                })
            }
        };

        // Registration is LIFO at exit: the directory goes first so it is
        // removed last, after the files inside it.
        let directory = self.create_library_dir()?;
        self.cleanup.register_for_cleanup_on_exit(&directory);

        let mut artifacts = Vec::with_capacity(descriptors.len());
        for (load_order, (descriptor, stream)) in descriptors.iter().zip(streams).enumerate() {
            let path = directory.join(descriptor.target_file_name());
            // Registered before writing so a partial file is still removed.
            self.cleanup.register_for_cleanup_on_exit(&path);
            let size = extract(stream, &path)?;
            artifacts.push(ExtractedArtifact {
                role: descriptor.role,
                path,
                directory: directory.clone(),
                load_order,
                size,
            });
        }

        // The shim binds to engine exports, so the engine must be linked first.
        let mut libraries = Vec::with_capacity(artifacts.len());
        for artifact in &artifacts {
            libraries.push(self.linker.link(&artifact.path)?);
        }

        info!(
            "Loaded native libraries for {} from {}",
            platform,
            directory.display()
        );
        Ok(LoadedLibraries {
            platform,
            artifacts,
            libraries,
        })
    }

    fn create_library_dir(&self) -> Result<PathBuf> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(&self.temp_prefix);

        let created = match &self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        let dir = created.map_err(|e| {
            let parent = self.temp_root.clone().unwrap_or_else(std::env::temp_dir);
            LoaderError::extraction(e, parent)
        })?;

        // Removal belongs to the exit cleanup, not to this guard.
        Ok(dir.keep())
    }
}

impl Default for NativeLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NativeLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeLoader")
            .field("host", &self.host)
            .field("libraries", &self.libraries)
            .field("temp_prefix", &self.temp_prefix)
            .field("temp_root", &self.temp_root)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Publishes the terminal state, even if loading unwinds.
struct Completion<'a> {
    loader: &'a NativeLoader,
    armed: bool,
}

impl Completion<'_> {
    fn finish(mut self, outcome: Result<LoadedLibraries>) -> Result<Arc<LoadedLibraries>> {
        self.armed = false;
        match outcome {
            Ok(libraries) => {
                let libraries = Arc::new(libraries);
                self.publish(State::Loaded(libraries.clone()));
                Ok(libraries)
            }
            Err(err) => {
                warn!("Native library loading failed: {}", err);
                self.publish(State::Failed(err.clone()));
                Err(err)
            }
        }
    }

    fn publish(&self, next: State) {
        *self.loader.lock_state() = next;
        self.loader.finished.notify_all();
    }
}

impl Drop for Completion<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.publish(State::Failed(LoaderError::LoaderPanicked));
        }
    }
}

/// Builder for a [`NativeLoader`].
///
/// # Example
///
/// ```rust,ignore
/// use solver_turnkey::{DirectoryResources, NativeLoader};
///
/// let loader = NativeLoader::builder()
///     .resources(DirectoryResources::new("./bundle"))
///     .build();
/// loader.ensure_loaded()?;
/// ```
pub struct NativeLoaderBuilder {
    host: Option<HostInfo>,
    libraries: LibrarySet,
    resources: Option<Box<dyn ResourceProvider>>,
    linker: Option<Box<dyn Linker>>,
    cleanup: Option<Arc<dyn CleanupRegistrar>>,
    temp_prefix: String,
    temp_root: Option<PathBuf>,
}

impl NativeLoaderBuilder {
    pub fn new() -> Self {
        Self {
            host: None,
            libraries: LibrarySet::default(),
            resources: None,
            linker: None,
            cleanup: None,
            temp_prefix: LoaderConfig::TEMP_DIR_PREFIX.to_string(),
            temp_root: None,
        }
    }

    /// Override the raw host strings.
    ///
    /// Default: [`HostInfo::detect`]
    pub fn host(mut self, host: HostInfo) -> Self {
        self.host = Some(host);
        self
    }

    /// Override the logical names of the engine and shim.
    ///
    /// Default: `z3` and `z3java`
    pub fn libraries(mut self, libraries: LibrarySet) -> Self {
        self.libraries = libraries;
        self
    }

    /// Where the bundled libraries are read from.
    ///
    /// Default: [`EmbeddedResources`]
    pub fn resources(mut self, resources: impl ResourceProvider + 'static) -> Self {
        self.resources = Some(Box::new(resources));
        self
    }

    /// How extracted libraries are linked.
    ///
    /// Default: [`SystemLinker`]
    pub fn linker(mut self, linker: impl Linker + 'static) -> Self {
        self.linker = Some(Box::new(linker));
        self
    }

    /// Who removes the extracted files.
    ///
    /// Default: [`ExitCleanup`]
    pub fn cleanup(mut self, cleanup: Arc<dyn CleanupRegistrar>) -> Self {
        self.cleanup = Some(cleanup);
        self
    }

    /// Prefix of the extraction directory name.
    pub fn temp_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.temp_prefix = prefix.into();
        self
    }

    /// Parent of the extraction directory.
    ///
    /// Default: the system temporary directory
    pub fn temp_root(mut self, root: impl AsRef<Path>) -> Self {
        self.temp_root = Some(root.as_ref().to_path_buf());
        self
    }

    pub fn build(self) -> NativeLoader {
        NativeLoader {
            host: self.host.unwrap_or_else(HostInfo::detect),
            libraries: self.libraries,
            resources: self
                .resources
                .unwrap_or_else(|| Box::new(EmbeddedResources::new())),
            linker: self.linker.unwrap_or_else(|| Box::new(SystemLinker)),
            cleanup: self.cleanup.unwrap_or_else(|| Arc::new(ExitCleanup)),
            temp_prefix: self.temp_prefix,
            temp_root: self.temp_root,
            state: Mutex::new(State::NotStarted),
            finished: Condvar::new(),
        }
    }
}

impl Default for NativeLoaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Host side of the dashboard bridge.
//!
//! [`Host`] answers each [`Request`] against the workspace: it reads and
//! writes `frontdesk.toml`, runs aggregation passes, and creates or deletes
//! content files. Editor integration (opening files, running user scripts,
//! turning asset paths into URIs) goes through the [`Workbench`] trait so the
//! dispatcher can be driven without a real editor.
//!
//! Every push leaves the host stamped with the next revision and the id of
//! the request it answers. A failed request becomes a single error
//! notification push; it never tears down the session.
//!
//! | Request | Pushes |
//! |---------|--------|
//! | `getData`, `reload` | settings, pages, file errors |
//! | `updateSetting` | settings, pages, file errors |
//! | `initializeProject` | settings |
//! | `createContent`, `deleteFile` | pages, file errors |
//! | `runCustomScript` | script output notification |
//! | `openFile` | nothing |

use crate::config::{self, ConfigError, DashboardConfig};
use crate::frontmatter::FsReader;
use crate::message::{MessageError, Notification, Push, PushEnvelope, Request, RequestEnvelope};
use crate::scan::{self, AssetResolver, FileUriResolver, ScanError};
use crate::types::CustomScript;
use crate::version::version_info;
use chrono::{SecondsFormat, Utc};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("No content folders are configured")]
    NoFolders,
    #[error("Refusing to delete {0}: not inside a content folder")]
    OutsideContent(PathBuf),
    #[error("Unknown script '{0}'")]
    UnknownScript(String),
    #[error("Script '{title}' failed: {source}")]
    Script { title: String, source: io::Error },
}

/// Editor-side operations the host delegates.
pub trait Workbench: AssetResolver {
    fn open_file(&mut self, path: &Path) -> io::Result<()>;

    /// Run `script` against `path` with the workspace root as working
    /// directory, returning its trimmed standard output.
    fn run_script(&mut self, script: &CustomScript, path: &Path, root: &Path)
    -> io::Result<String>;
}

/// Workbench backed by `$VISUAL`/`$EDITOR` and child processes.
///
/// The editor gets neither stdin nor stdout: in `serve` mode those carry the
/// bridge's request and push streams.
#[derive(Debug, Clone, Default)]
pub struct ProcessWorkbench {
    editor: Option<String>,
}

impl ProcessWorkbench {
    pub fn from_env() -> Self {
        let editor = std::env::var("VISUAL")
            .or_else(|_| std::env::var("EDITOR"))
            .ok()
            .filter(|e| !e.trim().is_empty());
        Self { editor }
    }

    pub fn with_editor(editor: impl Into<String>) -> Self {
        Self {
            editor: Some(editor.into()),
        }
    }
}

impl AssetResolver for ProcessWorkbench {
    fn asset_uri(&self, path: &Path) -> Option<String> {
        FileUriResolver.asset_uri(path)
    }
}

impl Workbench for ProcessWorkbench {
    fn open_file(&mut self, path: &Path) -> io::Result<()> {
        match &self.editor {
            Some(editor) => {
                let mut child = Command::new(editor)
                    .arg(path)
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .spawn()?;
                let pid = child.id();
                std::thread::spawn(move || match child.wait() {
                    Ok(status) => tracing::debug!(pid, %status, "editor exited"),
                    Err(e) => tracing::warn!(pid, error = %e, "waiting for editor failed"),
                });
            }
            None => tracing::info!(path = %path.display(), "no $VISUAL or $EDITOR set, not opening"),
        }
        Ok(())
    }

    fn run_script(
        &mut self,
        script: &CustomScript,
        path: &Path,
        root: &Path,
    ) -> io::Result<String> {
        let script_path = root.join(&script.script);
        let mut command = match &script.command {
            Some(interpreter) => {
                let mut c = Command::new(interpreter);
                c.arg(&script_path);
                c
            }
            None => Command::new(&script_path),
        };
        let output = command.arg(path).current_dir(root).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(io::Error::other(format!(
                "exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Request dispatcher for one workspace.
pub struct Host<W> {
    root: PathBuf,
    workbench: W,
    revision: u64,
}

impl<W: Workbench> Host<W> {
    pub fn new(root: impl Into<PathBuf>, workbench: W) -> Self {
        Self {
            root: root.into(),
            workbench,
            revision: 0,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn workbench(&self) -> &W {
        &self.workbench
    }

    /// Answer one request. Failures are reported as an error notification.
    pub fn handle(&mut self, envelope: RequestEnvelope) -> Vec<PushEnvelope> {
        let id = envelope.id;
        let command = envelope.message.command();
        tracing::debug!(id, command, "handling request");

        let pushes = match self.try_handle(envelope.message) {
            Ok(pushes) => pushes,
            Err(e) => {
                tracing::warn!(id, command, error = %e, "request failed");
                vec![Push::Notification(Notification::error(e.to_string()))]
            }
        };
        pushes
            .into_iter()
            .map(|message| self.stamp(Some(id), message))
            .collect()
    }

    /// Answer a line that could not be decoded.
    pub fn reject(&mut self, error: &MessageError) -> PushEnvelope {
        let note = Notification::error(format!("Rejected message: {error}"));
        self.stamp(None, Push::Notification(note))
    }

    /// Answer one request, returning unstamped pushes.
    pub fn try_handle(&mut self, request: Request) -> Result<Vec<Push>, HostError> {
        match request {
            Request::GetData | Request::Reload => self.snapshot(),
            Request::OpenFile(path) => {
                let path = self.resolve(&path);
                self.workbench.open_file(&path)?;
                Ok(Vec::new())
            }
            Request::CreateContent => {
                let path = self.create_content()?;
                self.workbench.open_file(&path)?;
                self.pages()
            }
            Request::UpdateSetting { name, value } => {
                config::update_setting(&self.root, &name, &value)?;
                tracing::info!(setting = %name, "setting updated");
                self.snapshot()
            }
            Request::DeleteFile(path) => {
                self.delete_file(&path)?;
                self.pages()
            }
            Request::RunCustomScript { script, path } => self.run_script(&script, &path),
            Request::InitializeProject => {
                if config::initialize(&self.root)? {
                    tracing::info!(root = %self.root.display(), "wrote {}", config::CONFIG_FILE);
                }
                Ok(vec![self.settings()?])
            }
        }
    }

    fn stamp(&mut self, request: Option<u64>, message: Push) -> PushEnvelope {
        self.revision += 1;
        PushEnvelope {
            revision: self.revision,
            request,
            message,
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    fn snapshot(&self) -> Result<Vec<Push>, HostError> {
        let mut pushes = vec![self.settings()?];
        pushes.extend(self.pages()?);
        Ok(pushes)
    }

    fn settings(&self) -> Result<Push, HostError> {
        let config = config::load_config(&self.root)?;
        let settings = config.to_settings(config::is_initialized(&self.root), version_info());
        Ok(Push::Settings(Box::new(settings)))
    }

    /// A pages push followed by one notification per unreadable file.
    fn pages(&self) -> Result<Vec<Push>, HostError> {
        let config = config::load_config(&self.root)?;
        let mut notes = Vec::new();
        let pages = scan::scan_workspace(&self.root, &config, &FsReader, &self.workbench, &mut notes)?;
        tracing::debug!(pages = pages.len(), errors = notes.len(), "aggregated workspace");

        let mut pushes = vec![Push::Pages(pages)];
        pushes.extend(notes.into_iter().map(Push::Notification));
        Ok(pushes)
    }

    // ------------------------------------------------------------------
    // File operations
    // ------------------------------------------------------------------

    /// Create `untitled[-N].md` in the first content folder.
    fn create_content(&self) -> Result<PathBuf, HostError> {
        let config = config::load_config(&self.root)?;
        let folder = config.folders.first().ok_or(HostError::NoFolders)?;
        let dir = config.folder_path(&self.root, folder);
        fs::create_dir_all(&dir)?;

        let skeleton = content_skeleton(&config);
        let mut n = 0;
        loop {
            let path = dir.join(untitled_name(n));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(skeleton.as_bytes())?;
                    tracing::info!(path = %path.display(), "created content file");
                    return Ok(path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => n += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn delete_file(&self, path: &Path) -> Result<(), HostError> {
        let config = config::load_config(&self.root)?;
        let target = fs::canonicalize(self.resolve(path))?;
        let inside = config
            .folders
            .iter()
            .filter_map(|f| fs::canonicalize(config.folder_path(&self.root, f)).ok())
            .any(|dir| target != dir && target.starts_with(&dir));
        if !inside {
            return Err(HostError::OutsideContent(path.to_path_buf()));
        }
        fs::remove_file(&target)?;
        tracing::info!(path = %target.display(), "deleted content file");
        Ok(())
    }

    fn run_script(&mut self, script: &CustomScript, path: &Path) -> Result<Vec<Push>, HostError> {
        // Only scripts declared in the workspace config may run.
        let config = config::load_config(&self.root)?;
        if !config.scripts.iter().any(|s| s == script) {
            return Err(HostError::UnknownScript(script.title.clone()));
        }
        let path = self.resolve(path);
        let output = self
            .workbench
            .run_script(script, &path, &self.root)
            .map_err(|source| HostError::Script {
                title: script.title.clone(),
                source,
            })?;
        let message = if output.is_empty() {
            format!("{} completed", script.title)
        } else {
            output
        };
        Ok(vec![Push::Notification(Notification::info(message))])
    }
}

fn untitled_name(n: u32) -> String {
    match n {
        0 => "untitled.md".to_string(),
        n => format!("untitled-{n}.md"),
    }
}

fn content_skeleton(config: &DashboardConfig) -> String {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    format!(
        "---\ntitle: \"Untitled\"\n{}: \"{now}\"\ndraft: true\n---\n\n",
        config.date_field()
    )
}

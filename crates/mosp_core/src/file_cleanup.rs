//! Work directory lifetime: created for a run, removed afterwards and on Ctrl-C.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, OnceLock},
};

use crate::Result;

static PENDING_WORKDIRS: OnceLock<Mutex<HashSet<PathBuf>>> = OnceLock::new();
static INTERRUPT_HOOK: OnceLock<()> = OnceLock::new();

/// A work directory for one run. With `cleanup` set it is removed on drop and on
/// Ctrl-C, but only when `prepare` created it; an existing directory is never removed.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    owned: bool,
    cleanup: bool,
}

impl WorkDir {
    pub fn prepare(path: impl Into<PathBuf>, cleanup: bool) -> Result<Self> {
        let path = path.into();
        let owned = !path.exists();
        fs::create_dir_all(&path)?;
        if cleanup && owned {
            remove_on_interrupt(&path);
        }
        log::debug!(
            "cleanup.workdir: prepared path={} owned={owned} cleanup={cleanup}",
            path.display()
        );
        Ok(Self {
            path,
            owned,
            cleanup,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `prepare` created the directory.
    pub fn owned(&self) -> bool {
        self.owned
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if self.cleanup && self.owned {
            remove_workdir(&self.path);
        }
    }
}

fn pending_workdirs() -> &'static Mutex<HashSet<PathBuf>> {
    PENDING_WORKDIRS.get_or_init(|| Mutex::new(HashSet::new()))
}

fn install_interrupt_hook() {
    INTERRUPT_HOOK.get_or_init(|| {
        let installed = ctrlc::set_handler(|| {
            let pending: Vec<PathBuf> = match pending_workdirs().lock() {
                Ok(guard) => guard.iter().cloned().collect(),
                Err(_) => Vec::new(),
            };
            for path in pending {
                remove_workdir(&path);
            }
            std::process::exit(130);
        });
        if let Err(err) = installed {
            log::warn!("cleanup.hook: install failed err={err}");
        }
    });
}

pub fn remove_on_interrupt(path: &Path) {
    install_interrupt_hook();
    if let Ok(mut guard) = pending_workdirs().lock() {
        guard.insert(path.to_path_buf());
    }
}

fn forget(path: &Path) {
    if let Some(set) = PENDING_WORKDIRS.get()
        && let Ok(mut guard) = set.lock()
    {
        guard.remove(path);
    }
}

pub fn remove_workdir(path: &Path) {
    if !path.exists() {
        forget(path);
        return;
    }

    match fs::remove_dir_all(path) {
        Ok(()) => {
            forget(path);
            log::debug!("cleanup.workdir: removed path={}", path.display());
        }
        Err(err) => log::warn!(
            "cleanup.workdir: remove failed path={} err={err}",
            path.display()
        ),
    }
}

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::auth::Session;

/// Данные, которые переживают перезапуск приложения.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct State {
    /// Сессия, с которой пользователь вышел из приложения в прошлый раз.
    pub session: Option<Session>,
}

/// Читает состояние из файла. Файла нет значит пользователь не входил.
pub fn load(path: &Path) -> LoadResult {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No state file at {:?}, start signed out", path);
            return Ok(State::default());
        }
        Err(source) => {
            return Err(LoadError::ReadFile {
                path: path.to_owned(),
                source,
            })
        }
    };

    Ok(serde_json::from_str(&content)?)
}

pub type LoadResult = std::result::Result<State, LoadError>;

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("read session file {path:?}")]
    ReadFile { path: PathBuf, source: io::Error },

    #[error("session file is broken")]
    Deserialize(#[from] serde_json::Error),
}

/// Пишет состояние во временный файл рядом и переименовывает его,
/// так что на диске всегда лежит целый файл.
pub fn save(state: &State, path: &Path) -> SaveResult {
    let content = serde_json::to_string_pretty(state)?;

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|source| write_error(dir, source))?;
    }

    let tmp = path.with_extension("tmp");

    fs::write(&tmp, content).map_err(|source| write_error(&tmp, source))?;
    fs::rename(&tmp, path).map_err(|source| write_error(path, source))?;

    Ok(())
}

fn write_error(path: &Path, source: io::Error) -> SaveError {
    SaveError::WriteFile {
        path: path.to_owned(),
        source,
    }
}

pub type SaveResult = std::result::Result<(), SaveError>;

#[derive(thiserror::Error, Debug)]
pub enum SaveError {
    #[error("write session file {path:?}")]
    WriteFile { path: PathBuf, source: io::Error },

    #[error("serialize")]
    Serialize(#[from] serde_json::Error),
}

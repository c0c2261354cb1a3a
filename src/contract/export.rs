use std::{fs, io, path::PathBuf};

use chrono::{DateTime, FixedOffset};
use lazy_static::lazy_static;
use regex::Regex;

use super::form::ContractFormData;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

pub const CONTRACT_MIME: &str = "text/plain";

/// Готовый к сохранению файл договора.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractFile {
    pub name: String,
    pub mime: &'static str,
    pub contents: String,
}

impl ContractFile {
    pub fn new(form: &ContractFormData, now: &DateTime<FixedOffset>, contents: String) -> Self {
        Self {
            name: file_name(form, now),
            mime: CONTRACT_MIME,
            contents,
        }
    }
}

/// Способ отдать файл пользователю.
pub trait FileExporter {
    fn export(&self, file: &ContractFile) -> ExportResult;
}

/// Сохраняет файлы в указанную директорию.
#[derive(Debug, Clone)]
pub struct FsExporter {
    dir: PathBuf,
}

impl FsExporter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Путь, по которому будет сохранён файл.
    pub fn path_for(&self, file: &ContractFile) -> PathBuf {
        self.dir.join(&file.name)
    }
}

impl FileExporter for FsExporter {
    fn export(&self, file: &ContractFile) -> ExportResult {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(file);

        fs::write(&path, &file.contents)?;

        Ok(())
    }
}

pub type ExportResult = std::result::Result<(), ExportError>;

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("write contract file")]
    WriteFile(#[from] io::Error),
}

/// Имя файла вида `flat-swap-contract-<a>-<b>-<YYYY-MM-DD>.txt`.
/// Дата берётся в UTC.
pub fn file_name(form: &ContractFormData, now: &DateTime<FixedOffset>) -> String {
    format!(
        "flat-swap-contract-{}-{}-{}.txt",
        slug(&form.tenant1_name),
        slug(&form.tenant2_name),
        now.naive_utc().date().format("%Y-%m-%d"),
    )
}

fn slug(name: &str) -> String {
    WHITESPACE.replace_all(name, "-").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_from_both_tenants_and_utc_date() {
        let form = ContractFormData {
            tenant1_name: "Alex  Johnson".to_owned(),
            tenant2_name: "Carlos Gomez".to_owned(),
            ..Default::default()
        };

        // Локально уже 16 июня, а в UTC ещё 15.
        let now = DateTime::parse_from_rfc3339("2024-06-16T01:30:00+03:00").unwrap();

        assert_eq!(
            "flat-swap-contract-alex-johnson-carlos-gomez-2024-06-15.txt",
            file_name(&form, &now)
        );
    }

    #[test]
    fn empty_names_are_kept_as_is() {
        let now = DateTime::parse_from_rfc3339("2024-06-15T10:00:00Z").unwrap();

        assert_eq!(
            "flat-swap-contract---2024-06-15.txt",
            file_name(&ContractFormData::default(), &now)
        );
    }

    #[test]
    fn fs_exporter_writes_file() {
        let dir = std::env::temp_dir().join("flatswap-fs-exporter-test");
        let exporter = FsExporter::new(dir.clone());

        let file = ContractFile {
            name: "contract.txt".to_owned(),
            mime: CONTRACT_MIME,
            contents: "FLAT SWAP AGREEMENT".to_owned(),
        };

        exporter.export(&file).unwrap();

        assert_eq!(
            "FLAT SWAP AGREEMENT",
            fs::read_to_string(dir.join("contract.txt")).unwrap()
        );
    }
}

//! Discovery and loading of delimited CEAPS files.
//!
//! Reads one file or every `*.csv` directly inside a directory, resolves the
//! character encoding (fixed label or per-file sniff), skips the banner line
//! the Senate exports carry before the real header, and maps each data row
//! to an untyped [`RawRecord`]. All errors here are fail-fast: a load either
//! returns the complete record set or nothing.

use std::path::{Path, PathBuf};

use csv::StringRecord;
use tracing::{debug, info};

use ceaps_core::error::{PipelineError, Result};
use ceaps_core::models::RawRecord;
use ceaps_core::schema;
use ceaps_core::settings::EncodingChoice;

use crate::encoding::{decode, resolve_label, sniff_encoding};

// ── Public API ────────────────────────────────────────────────────────────────

/// List the `*.csv` files directly inside `dir`, sorted by path.
///
/// The listing is intentionally non-recursive: the raw drop directory is
/// flat, one file per year.
pub fn find_csv_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Load every CSV file in `dir` into one record set, file-then-row order.
///
/// Fails with [`PipelineError::InputPathNotFound`] when `dir` does not exist
/// and [`PipelineError::NoCsvFiles`] when it holds no CSV files. Decode and
/// structural failures abort the whole load; there is no partial result.
pub fn load_directory(
    dir: &Path,
    encoding: &EncodingChoice,
    separator: u8,
) -> Result<Vec<RawRecord>> {
    if !dir.exists() {
        return Err(PipelineError::InputPathNotFound(dir.to_path_buf()));
    }

    let files = find_csv_files(dir);
    if files.is_empty() {
        return Err(PipelineError::NoCsvFiles(dir.to_path_buf()));
    }

    let mut records: Vec<RawRecord> = Vec::new();
    for file in &files {
        records.extend(read_records(file, encoding, separator)?);
    }

    debug!("Loaded {} rows from {} files", records.len(), files.len());
    Ok(records)
}

/// Load a single delimited file into a record set.
///
/// Identical constraints and failure modes as [`load_directory`], except the
/// existence check applies to the file itself.
pub fn load_file(path: &Path, encoding: &EncodingChoice, separator: u8) -> Result<Vec<RawRecord>> {
    if !path.exists() {
        return Err(PipelineError::InputPathNotFound(path.to_path_buf()));
    }
    read_records(path, encoding, separator)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Read one file: decode, skip the banner line, parse the remainder.
fn read_records(path: &Path, encoding: &EncodingChoice, separator: u8) -> Result<Vec<RawRecord>> {
    let bytes = std::fs::read(path).map_err(|source| PipelineError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let resolved = match encoding {
        EncodingChoice::Auto => {
            let sniffed = sniff_encoding(&bytes);
            info!(
                "Reading file {} with encoding {}",
                path.display(),
                sniffed.name()
            );
            sniffed
        }
        EncodingChoice::Label(label) => resolve_label(label)?,
    };

    let text = decode(&bytes, resolved, path)?;

    // The first line of every export is a banner preceding the real header.
    let body = match text.split_once('\n') {
        Some((_banner, rest)) => rest,
        None => "",
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(separator)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::Parse {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?
        .clone();
    let map = ColumnMap::from_headers(&headers, path)?;

    let mut records: Vec<RawRecord> = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| PipelineError::Parse {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        records.push(map.extract(&record));
    }

    debug!("File {}: {} rows", path.display(), records.len());
    Ok(records)
}

/// Position of each CEAPS column inside one file's header.
///
/// Files are not trusted to share an exact column order, so every column is
/// located by name. A header in which none of the expected names appears
/// means the separator did not split the line at all.
struct ColumnMap {
    ano: Option<usize>,
    mes: Option<usize>,
    senador: Option<usize>,
    tipo_despesa: Option<usize>,
    cnpj_cpf: Option<usize>,
    fornecedor: Option<usize>,
    documento: Option<usize>,
    data: Option<usize>,
    detalhamento: Option<usize>,
    valor_reembolsado: Option<usize>,
    cod_documento: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord, path: &Path) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        let map = ColumnMap {
            ano: find(schema::COL_ANO),
            mes: find(schema::COL_MES),
            senador: find(schema::COL_SENADOR),
            tipo_despesa: find(schema::COL_TIPO_DESPESA),
            cnpj_cpf: find(schema::COL_CNPJ_CPF),
            fornecedor: find(schema::COL_FORNECEDOR),
            documento: find(schema::COL_DOCUMENTO),
            data: find(schema::COL_DATA),
            detalhamento: find(schema::COL_DETALHAMENTO),
            valor_reembolsado: find(schema::COL_VALOR_REEMBOLSADO),
            cod_documento: find(schema::COL_COD_DOCUMENTO),
        };

        if map.is_empty() {
            return Err(PipelineError::Parse {
                path: path.to_path_buf(),
                detail: "no expected CEAPS column found in header".to_string(),
            });
        }
        Ok(map)
    }

    fn is_empty(&self) -> bool {
        [
            self.ano,
            self.mes,
            self.senador,
            self.tipo_despesa,
            self.cnpj_cpf,
            self.fornecedor,
            self.documento,
            self.data,
            self.detalhamento,
            self.valor_reembolsado,
            self.cod_documento,
        ]
        .iter()
        .all(Option::is_none)
    }

    fn extract(&self, record: &StringRecord) -> RawRecord {
        let get = |idx: Option<usize>| idx.and_then(|i| record.get(i)).map(|s| s.to_string());

        RawRecord {
            ano: get(self.ano),
            mes: get(self.mes),
            senador: get(self.senador),
            tipo_despesa: get(self.tipo_despesa),
            cnpj_cpf: get(self.cnpj_cpf),
            fornecedor: get(self.fornecedor),
            documento: get(self.documento),
            data: get(self.data),
            detalhamento: get(self.detalhamento),
            valor_reembolsado: get(self.valor_reembolsado),
            cod_documento: get(self.cod_documento),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

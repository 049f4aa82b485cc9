//! # Genesis Exporter
//!
//! Streams every contract account of the registry into framed part files.
//!
//! ## Part Lifecycle
//!
//! 1. Parts left in the directory by an earlier export are removed, then
//!    part 0 is created with its header (params record, zero count).
//! 2. Each managed account is appended as one record.
//! 3. Once a part exceeds the rollover threshold it is closed. The next
//!    record opens the following part with a fresh header, so a record is
//!    never split and no empty trailing part is created.
//! 4. After the full pass every part's count field is patched with the
//!    number of records it holds. A cancelled or failed export patches
//!    nothing; its parts keep count 0.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use crate::adapters::BincodePayloadCodec;
use crate::codec::framing;
use crate::domain::{
    Account, ExportSummary, ExportedPart, GenesisAccount, GenesisConfig, GenesisError,
    GenesisFormat, GenesisState,
};
use crate::ports::{ExecutionContext, GenesisStateStore, PayloadCodec};

/// Writer for one part, owned by the export for as long as the part is open.
struct PartWriter {
    path: PathBuf,
    file: BufWriter<File>,
    count_offset: u64,
    bytes: u64,
    records: u64,
}

impl PartWriter {
    fn create(path: PathBuf, params_payload: &[u8]) -> Result<Self, GenesisError> {
        let file = File::create(&path).map_err(|e| GenesisError::io(&path, e))?;
        let mut file = BufWriter::new(file);
        let header =
            framing::write_header(&mut file, params_payload).map_err(|e| GenesisError::io(&path, e))?;

        tracing::debug!("[qc-04] Opened genesis part {}", path.display());

        Ok(Self {
            path,
            file,
            count_offset: header.count_offset,
            bytes: header.len,
            records: 0,
        })
    }

    fn append(&mut self, payload: &[u8]) -> Result<(), GenesisError> {
        let written =
            framing::write_record(&mut self.file, payload).map_err(|e| GenesisError::io(&self.path, e))?;
        self.bytes += written as u64;
        self.records += 1;
        Ok(())
    }

    fn close(self) -> Result<ClosedPart, GenesisError> {
        let PartWriter {
            path,
            file,
            count_offset,
            bytes,
            records,
        } = self;

        let file = file
            .into_inner()
            .map_err(|e| GenesisError::io(&path, e.into_error()))?;
        file.sync_all().map_err(|e| GenesisError::io(&path, e))?;

        tracing::debug!(
            "[qc-04] Closed genesis part {} ({} records, {} bytes)",
            path.display(),
            records,
            bytes
        );

        Ok(ClosedPart {
            path,
            count_offset,
            bytes,
            records,
        })
    }
}

struct ClosedPart {
    path: PathBuf,
    count_offset: u64,
    bytes: u64,
    records: u64,
}

impl ClosedPart {
    /// Overwrite the placeholder count with this part's record count.
    fn finalize(self) -> Result<ExportedPart, GenesisError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|e| GenesisError::io(&self.path, e))?;
        framing::patch_count(&mut file, self.count_offset, self.records)
            .map_err(|e| GenesisError::io(&self.path, e))?;
        file.sync_all().map_err(|e| GenesisError::io(&self.path, e))?;

        Ok(ExportedPart {
            path: self.path,
            records: self.records,
            bytes: self.bytes,
        })
    }
}

/// State of one chunked export run.
struct ChunkedRun<'a, P> {
    dir: &'a Path,
    config: &'a GenesisConfig,
    codec: &'a P,
    params_payload: Vec<u8>,
    current: Option<PartWriter>,
    closed: Vec<ClosedPart>,
    next_index: usize,
}

impl<'a, P: PayloadCodec> ChunkedRun<'a, P> {
    fn open_next_part(&mut self) -> Result<PartWriter, GenesisError> {
        let path = self.dir.join(self.config.part_file_name(self.next_index));
        self.next_index += 1;
        PartWriter::create(path, &self.params_payload)
    }

    fn write_account(&mut self, account: &GenesisAccount) -> Result<(), GenesisError> {
        let mut part = match self.current.take() {
            Some(part) => part,
            None => self.open_next_part()?,
        };

        let payload = self
            .codec
            .encode_account(account)
            .map_err(|e| GenesisError::encoding(&part.path, part.bytes, e))?;
        part.append(&payload)?;

        if part.bytes > self.config.rollover_threshold {
            tracing::debug!(
                "[qc-04] Genesis part {} reached {} bytes, rolling over",
                part.path.display(),
                part.bytes
            );
            self.closed.push(part.close()?);
        } else {
            self.current = Some(part);
        }
        Ok(())
    }

    fn finish(mut self) -> Result<ExportSummary, GenesisError> {
        if let Some(part) = self.current.take() {
            self.closed.push(part.close()?);
        }

        let mut summary = ExportSummary::default();
        for part in self.closed {
            let part = part.finalize()?;
            summary.accounts += part.records;
            summary.parts.push(part);
        }
        Ok(summary)
    }
}

/// Exports contract-state genesis to disk.
pub struct GenesisExporter<P = BincodePayloadCodec> {
    config: GenesisConfig,
    codec: P,
}

impl GenesisExporter<BincodePayloadCodec> {
    pub fn new(config: GenesisConfig) -> Self {
        Self {
            config,
            codec: BincodePayloadCodec,
        }
    }
}

impl<P: PayloadCodec> GenesisExporter<P> {
    pub fn with_codec(config: GenesisConfig, codec: P) -> Self {
        Self { config, codec }
    }

    pub fn config(&self) -> &GenesisConfig {
        &self.config
    }

    /// Export into `dir`, creating it if needed.
    ///
    /// `ctx` is polled once per registry account; a signaled context ends the
    /// export with `GenesisError::Terminated`.
    pub fn export_to<S, C>(
        &self,
        state: &S,
        dir: &Path,
        ctx: &C,
    ) -> Result<ExportSummary, GenesisError>
    where
        S: GenesisStateStore + ?Sized,
        C: ExecutionContext + ?Sized,
    {
        self.config.validate()?;
        fs::create_dir_all(dir).map_err(|e| GenesisError::io(dir, e))?;

        match self.config.format {
            GenesisFormat::Chunked => self.export_chunked(state, dir, ctx),
            GenesisFormat::WholeBuffer => self.export_whole_buffer(state, dir, ctx),
        }
    }

    fn export_chunked<S, C>(
        &self,
        state: &S,
        dir: &Path,
        ctx: &C,
    ) -> Result<ExportSummary, GenesisError>
    where
        S: GenesisStateStore + ?Sized,
        C: ExecutionContext + ?Sized,
    {
        let params = state.get_params()?;
        let first_path = dir.join(self.config.part_file_name(0));
        let params_payload = self
            .codec
            .encode_params(&params)
            .map_err(|e| GenesisError::encoding(&first_path, 0, e))?;

        self.remove_stale_parts(dir)?;

        let mut run = ChunkedRun {
            dir,
            config: &self.config,
            codec: &self.codec,
            params_payload,
            current: None,
            closed: Vec::new(),
            next_index: 0,
        };
        run.current = Some(run.open_next_part()?);

        state.iterate_accounts(&mut |account| {
            let step = if ctx.is_cancelled() {
                Err(GenesisError::Terminated)
            } else {
                match collect_account(state, account) {
                    Ok(Some(record)) => run.write_account(&record),
                    Ok(None) => Ok(()),
                    Err(e) => Err(e),
                }
            };

            match step {
                Ok(()) => ControlFlow::Continue(()),
                Err(e) => ControlFlow::Break(e),
            }
        })?;

        run.finish()
    }

    /// Delete parts `<base>1`, `<base>2`, ... left by an earlier export so
    /// an import of `dir` only sees parts of this run. Part 0 is truncated
    /// when it is recreated.
    fn remove_stale_parts(&self, dir: &Path) -> Result<(), GenesisError> {
        for index in 1.. {
            let path = dir.join(self.config.part_file_name(index));
            match fs::remove_file(&path) {
                Ok(()) => tracing::debug!("[qc-04] Removed stale genesis part {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => break,
                Err(e) => return Err(GenesisError::io(&path, e)),
            }
        }
        Ok(())
    }

    fn export_whole_buffer<S, C>(
        &self,
        state: &S,
        dir: &Path,
        ctx: &C,
    ) -> Result<ExportSummary, GenesisError>
    where
        S: GenesisStateStore + ?Sized,
        C: ExecutionContext + ?Sized,
    {
        let path = dir.join(self.config.whole_buffer_file_name());
        let mut genesis = GenesisState::new(state.get_params()?);

        state.iterate_accounts(&mut |account| {
            if ctx.is_cancelled() {
                return ControlFlow::Break(GenesisError::Terminated);
            }
            match collect_account(state, account) {
                Ok(Some(record)) => {
                    genesis.accounts.push(record);
                    ControlFlow::Continue(())
                }
                Ok(None) => ControlFlow::Continue(()),
                Err(e) => ControlFlow::Break(e),
            }
        })?;

        let bytes = serde_json::to_vec(&genesis).map_err(|e| GenesisError::encoding(&path, 0, e))?;
        write_whole_file(&path, &bytes)?;

        Ok(ExportSummary {
            parts: vec![ExportedPart {
                path,
                records: genesis.accounts.len() as u64,
                bytes: bytes.len() as u64,
            }],
            accounts: genesis.accounts.len() as u64,
        })
    }
}

/// Read code and storage of a managed account. Other kinds yield `None`.
fn collect_account<S>(state: &S, account: &Account) -> Result<Option<GenesisAccount>, GenesisError>
where
    S: GenesisStateStore + ?Sized,
{
    if !account.is_managed() {
        return Ok(None);
    }

    let code = match account.code_hash() {
        Some(code_hash) => state.get_code(&code_hash)?,
        None => return Ok(None),
    };
    let storage = state.get_storage(&account.address)?;
    Ok(Some(GenesisAccount::new(&account.address, &code, &storage)))
}

/// Create `path` and write `bytes` in one shot.
pub(crate) fn write_whole_file(path: &Path, bytes: &[u8]) -> Result<(), GenesisError> {
    let mut file = File::create(path).map_err(|e| GenesisError::io(path, e))?;
    file.write_all(bytes).map_err(|e| GenesisError::io(path, e))?;
    file.sync_all().map_err(|e| GenesisError::io(path, e))
}

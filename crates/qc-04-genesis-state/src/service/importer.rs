//! # Genesis Importer
//!
//! Reads genesis files back and replays them into a live store.
//!
//! Every file is read and decoded in full before its first account is
//! applied. There is no rollback: a failure part-way through leaves earlier
//! accounts applied. Callers needing all-or-nothing semantics wrap the
//! import in their own transaction.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::adapters::BincodePayloadCodec;
use crate::codec::{framing, FrameReader};
use crate::domain::{
    replay, Address, GenesisAccount, GenesisConfig, GenesisError, GenesisFormat, GenesisState,
    ImportSummary, IntegrityError, Params, ReplayOutcome,
};
use crate::ports::{GenesisStateStore, PayloadCodec};

/// Read a whole file, tolerating partial reads.
pub(crate) fn read_whole_file(path: &Path) -> Result<Vec<u8>, GenesisError> {
    let mut file = File::open(path).map_err(|e| GenesisError::io(path, e))?;
    let len = file.metadata().map_err(|e| GenesisError::io(path, e))?.len();
    let len = usize::try_from(len).map_err(|_| {
        GenesisError::encoding(path, 0, format!("file of {} bytes does not fit in memory", len))
    })?;

    framing::read_full(&mut file, len).map_err(|e| e.at(path))
}

/// An account record together with where it came from.
struct SourcedAccount {
    path: PathBuf,
    offset: u64,
    account: GenesisAccount,
}

/// Fully decoded content of one genesis file.
struct DecodedFile {
    params: Params,
    accounts: Vec<SourcedAccount>,
}

/// Imports contract-state genesis into a store.
pub struct GenesisImporter<P = BincodePayloadCodec> {
    config: GenesisConfig,
    codec: P,
}

impl GenesisImporter<BincodePayloadCodec> {
    pub fn new(config: GenesisConfig) -> Self {
        Self {
            config,
            codec: BincodePayloadCodec,
        }
    }
}

impl<P: PayloadCodec> GenesisImporter<P> {
    pub fn with_codec(config: GenesisConfig, codec: P) -> Self {
        Self { config, codec }
    }

    pub fn config(&self) -> &GenesisConfig {
        &self.config
    }

    /// Import from a genesis directory or a single genesis file.
    ///
    /// For a chunked directory, parts `<base>0`, `<base>1`, ... are imported
    /// in order until the next index is missing. Every part must carry the
    /// params record of part 0.
    pub fn import_from<S>(&self, state: &mut S, source: &Path) -> Result<ImportSummary, GenesisError>
    where
        S: GenesisStateStore + ?Sized,
    {
        self.config.validate()?;

        if state.module_account(&self.config.module_name)?.is_none() {
            return Err(GenesisError::ModuleAccountMissing {
                module: self.config.module_name.clone(),
            });
        }

        let files = self.resolve_files(source)?;
        let mut summary = ImportSummary::default();
        let mut seen = HashSet::new();
        let mut index = 0u64;
        let mut first_params: Option<Params> = None;

        for path in files {
            let bytes = read_whole_file(&path)?;
            let decoded = match self.config.format {
                GenesisFormat::Chunked => self.decode_chunked(&path, &bytes)?,
                GenesisFormat::WholeBuffer => decode_whole_buffer(&path, &bytes)?,
            };
            drop(bytes);

            match &first_params {
                None => {
                    state.set_params(decoded.params.clone())?;
                    first_params = Some(decoded.params);
                }
                Some(params) if *params != decoded.params => {
                    return Err(IntegrityError::ParamsMismatch { path }.into());
                }
                Some(_) => {}
            }

            for record in &decoded.accounts {
                self.apply_account(state, record, index, &mut seen, &mut summary)?;
                index += 1;
            }

            tracing::debug!(
                "[qc-04] Imported {} genesis records from {}",
                decoded.accounts.len(),
                path.display()
            );
            summary.files.push(path);
        }

        Ok(summary)
    }

    fn resolve_files(&self, source: &Path) -> Result<Vec<PathBuf>, GenesisError> {
        if !source.is_dir() {
            return Ok(vec![source.to_path_buf()]);
        }

        match self.config.format {
            GenesisFormat::WholeBuffer => {
                Ok(vec![source.join(self.config.whole_buffer_file_name())])
            }
            GenesisFormat::Chunked => {
                let first = source.join(self.config.part_file_name(0));
                if !first.is_file() {
                    return Err(IntegrityError::MissingPart { path: first }.into());
                }

                let mut files = vec![first];
                loop {
                    let next = source.join(self.config.part_file_name(files.len()));
                    if !next.is_file() {
                        break;
                    }
                    files.push(next);
                }
                Ok(files)
            }
        }
    }

    fn decode_chunked(&self, path: &Path, bytes: &[u8]) -> Result<DecodedFile, GenesisError> {
        let mut reader = FrameReader::new(bytes);

        let params_offset = reader.position();
        let params_payload = reader.read_record().map_err(|e| e.at(path))?;
        let params = self
            .codec
            .decode_params(params_payload)
            .map_err(|e| GenesisError::encoding(path, params_offset, e))?;

        // Zero is the placeholder written before the count is patched. An
        // export of an empty registry cannot be told apart and is refused.
        let count = reader.read_count().map_err(|e| e.at(path))?;
        if count == 0 {
            return Err(IntegrityError::IncompleteExport {
                path: path.to_path_buf(),
            }
            .into());
        }

        let mut accounts = Vec::new();
        for _ in 0..count {
            let offset = reader.position();
            let payload = reader.read_record().map_err(|e| e.at(path))?;
            let account = self
                .codec
                .decode_account(payload)
                .map_err(|e| GenesisError::encoding(path, offset, e))?;
            accounts.push(SourcedAccount {
                path: path.to_path_buf(),
                offset,
                account,
            });
        }

        if !reader.is_empty() {
            return Err(IntegrityError::TrailingBytes {
                path: path.to_path_buf(),
                offset: reader.position(),
            }
            .into());
        }

        Ok(DecodedFile { params, accounts })
    }

    fn apply_account<S>(
        &self,
        state: &mut S,
        record: &SourcedAccount,
        index: u64,
        seen: &mut HashSet<Address>,
        summary: &mut ImportSummary,
    ) -> Result<(), GenesisError>
    where
        S: GenesisStateStore + ?Sized,
    {
        let decoded = record
            .account
            .decode()
            .map_err(|e| GenesisError::encoding(&record.path, record.offset, e))?;
        let address = decoded.address;

        if !seen.insert(address) {
            return Err(IntegrityError::DuplicateAccount { address, index }.into());
        }

        let live = state
            .resolve_account(&address)?
            .ok_or(IntegrityError::AccountNotFound { address, index })?;
        let expected = live
            .code_hash()
            .ok_or(IntegrityError::NotContractAccount { address, index })?;

        match replay::replay_account(state, &decoded, expected, index, self.config.mismatch_policy)? {
            ReplayOutcome::Applied { storage_slots } => {
                summary.accounts_applied += 1;
                summary.storage_slots += storage_slots as u64;
            }
            ReplayOutcome::Skipped(skipped) => {
                tracing::warn!(
                    "[qc-04] Skipping genesis account {} (record {}): code hash mismatch",
                    replay::encode_address(&skipped.address),
                    skipped.index
                );
                summary.skipped.push(skipped);
            }
        }
        Ok(())
    }
}

fn decode_whole_buffer(path: &Path, bytes: &[u8]) -> Result<DecodedFile, GenesisError> {
    let genesis: GenesisState =
        serde_json::from_slice(bytes).map_err(|e| GenesisError::encoding(path, 0, e))?;

    Ok(DecodedFile {
        params: genesis.params,
        accounts: genesis
            .accounts
            .into_iter()
            .map(|account| SourcedAccount {
                path: path.to_path_buf(),
                offset: 0,
                account,
            })
            .collect(),
    })
}

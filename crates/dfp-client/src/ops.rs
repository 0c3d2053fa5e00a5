//! The four client operations: LIST, GET, PUT, MKDIR.
//!
//! Each opens fresh connections to the fleet, sends the command envelope,
//! and aggregates per-server replies. Per-server failures surface as
//! [`ServerFault`] entries; the operation completes with whatever
//! succeeded, except PUT which requires every live server to acknowledge.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use dfp_core::{ClientConfig, CommandFlag, RemotePath, PIECE_COUNT, SERVER_COUNT};
use dfp_protocol::{Envelope, Signal, MAX_FOLDER_LISTING_LEN, STATUS_OK};
use dfp_stripe::{
    combine_pieces, content_mod, infer_mod, mask_pieces, name_mod, pieces_for_server,
    split_pieces, Collation, CompletenessRule, ModInference, Piece, StripeError,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::session::{Fleet, ServerFault, SessionError};

/// Operation-level failures (as opposed to per-server faults).
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Unable to Connect to any server")]
    NoServers,

    #[error("placement requires exactly {expected} servers, config has {found}")]
    ServerCount { expected: usize, found: usize },

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Stripe(#[from] StripeError),

    #[error("local io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("piece {id} never arrived from any server")]
    PieceNeverArrived { id: u8 },
}

/// One file from a LIST aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedFile {
    pub name: String,
    pub complete: bool,
}

/// Outcome of a LIST command.
#[derive(Debug, Clone)]
pub struct ListOutput {
    pub files: Vec<ListedFile>,
    pub folders: Vec<String>,
    pub faults: Vec<ServerFault>,
}

/// Outcome of a GET command.
#[derive(Debug, Clone)]
pub struct GetOutput {
    pub outcome: GetOutcome,
    pub faults: Vec<ServerFault>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetOutcome {
    /// The file was rebuilt and written locally.
    Written { path: PathBuf, bytes: usize },
    /// No server reported any piece of the file.
    NotFound,
    /// Too few distinct pieces across the fleet to rebuild.
    Incomplete,
}

/// Outcome of a PUT command.
#[derive(Debug, Clone)]
pub struct PutOutput {
    /// Every live server acknowledged both pieces.
    pub delivered: bool,
    pub faults: Vec<ServerFault>,
}

/// Outcome of a MKDIR command.
#[derive(Debug, Clone)]
pub struct MkdirOutput {
    /// Servers that created the folder.
    pub created: usize,
    pub faults: Vec<ServerFault>,
}

/// List files and sub-folders of a remote folder across the fleet.
///
/// # Errors
/// Returns `ClientError::NoServers` when no connection succeeds.
pub async fn list(
    config: &ClientConfig,
    folder: &str,
    rule: CompletenessRule,
) -> Result<ListOutput, ClientError> {
    let envelope = Envelope::new(CommandFlag::List, &config.user, folder, "");
    let mut fleet = Fleet::connect(config).await;
    if fleet.connected() == 0 {
        return Err(ClientError::NoServers);
    }
    fleet.broadcast_envelope(&envelope).await;
    let mut faults = fleet.collect_statuses().await;

    let mut collation = Collation::default();
    for slot in fleet.slots_mut() {
        let Some(link) = slot.as_mut() else { continue };
        let outcome: Result<(), SessionError> = async {
            let has_data = link.read_int().await?;
            let report = link.read_report().await?;
            if has_data > 0 {
                for entry in &report.entries {
                    collation.record(&entry.name, &wire_ids(&entry.ids));
                }
            }
            Ok(())
        }
        .await;
        if let Err(err) = outcome {
            faults.push(ServerFault {
                server: link.name.clone(),
                message: err.to_string(),
            });
            *slot = None;
        }
    }

    let mut folders = BTreeSet::new();
    for slot in fleet.slots_mut() {
        let Some(link) = slot.as_mut() else { continue };
        match link.read_frame(MAX_FOLDER_LISTING_LEN).await {
            Ok(payload) => {
                let listing = String::from_utf8_lossy(&payload);
                for line in listing.lines().filter(|line| !line.is_empty()) {
                    folders.insert(line.to_string());
                }
            }
            Err(err) => {
                faults.push(ServerFault {
                    server: link.name.clone(),
                    message: err.to_string(),
                });
                *slot = None;
            }
        }
    }

    // Let the servers close without racing our reads.
    fleet.broadcast_signal(Signal::Reset).await;

    let files = collation
        .entries()
        .iter()
        .map(|entry| ListedFile {
            name: entry.name.clone(),
            complete: entry.is_complete(rule),
        })
        .collect();

    Ok(ListOutput {
        files,
        folders: folders.into_iter().collect(),
        faults,
    })
}

/// Download one file: aggregate reports, pick the placement residue, pull
/// every piece, unmask, reassemble and write `local`.
///
/// # Errors
/// Returns `ClientError` when no server is reachable, reassembly fails, or
/// the local file cannot be written.
pub async fn get(
    config: &ClientConfig,
    remote: &RemotePath,
    local: &Path,
    rule: CompletenessRule,
) -> Result<GetOutput, ClientError> {
    ensure_server_count(config)?;
    let envelope = Envelope::new(
        CommandFlag::Get,
        &config.user,
        remote.folder_or_root(),
        &remote.name,
    );
    let mut fleet = Fleet::connect(config).await;
    if fleet.connected() == 0 {
        return Err(ClientError::NoServers);
    }
    fleet.broadcast_envelope(&envelope).await;
    let mut faults = fleet.collect_statuses().await;

    let mut collation = Collation::default();
    let mut observations = Vec::new();
    for slot in fleet.slots_mut() {
        let Some(link) = slot.as_mut() else { continue };
        match link.read_report().await {
            Ok(report) => {
                for entry in &report.entries {
                    let ids = wire_ids(&entry.ids);
                    collation.record(&entry.name, &ids);
                    if let [a, b] = ids[..] {
                        observations.push((link.index, [a, b]));
                    }
                }
            }
            Err(err) => {
                faults.push(ServerFault {
                    server: link.name.clone(),
                    message: err.to_string(),
                });
                *slot = None;
            }
        }
    }

    let Some(entry) = collation.get(&remote.name) else {
        fleet.broadcast_signal(Signal::Reset).await;
        return Ok(GetOutput {
            outcome: GetOutcome::NotFound,
            faults,
        });
    };
    if !entry.is_complete(rule) {
        fleet.broadcast_signal(Signal::Reset).await;
        return Ok(GetOutput {
            outcome: GetOutcome::Incomplete,
            faults,
        });
    }

    let residue = match infer_mod(&observations) {
        ModInference::Unique(residue) => residue,
        inference => {
            // Best effort only: a name hash rarely matches the residue the
            // upload used.
            let fallback = name_mod(&remote.name);
            warn!(
                ?inference,
                fallback, "no usable piece-pair reports; deriving residue from the file name"
            );
            fallback
        }
    };
    debug!(residue, file = %remote.name, "fetching pieces");

    fleet.broadcast_signal(Signal::Proceed).await;

    let mut arrived: Vec<Option<Vec<u8>>> = vec![None; PIECE_COUNT];
    for slot in fleet.slots_mut() {
        let Some(link) = slot.as_mut() else { continue };
        let owed = pieces_for_server(residue, link.index);
        let outcome: Result<(), SessionError> = async {
            for (nth, &piece_id) in owed.iter().enumerate() {
                link.write_int(i32::from(piece_id)).await?;
                let frame = link.read_piece().await?;
                if let Ok(id) = u8::try_from(frame.id) {
                    if (1..=PIECE_COUNT as u8).contains(&id) {
                        arrived[(id - 1) as usize] = Some(frame.payload);
                    }
                }
                let signal = if nth + 1 == owed.len() {
                    Signal::EndGet
                } else {
                    Signal::Reset
                };
                link.write_signal(signal).await?;
            }
            Ok(())
        }
        .await;
        if let Err(err) = outcome {
            faults.push(ServerFault {
                server: link.name.clone(),
                message: err.to_string(),
            });
            *slot = None;
        }
    }

    let mut pieces = Vec::with_capacity(PIECE_COUNT);
    for (index, payload) in arrived.into_iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let id = (index + 1) as u8;
        let data = payload.ok_or(ClientError::PieceNeverArrived { id })?;
        pieces.push(Piece { id, data });
    }
    mask_pieces(&mut pieces, config.user.password.as_bytes())?;
    let content = combine_pieces(&pieces)?;

    if let Some(parent) = local.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ClientError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
    }
    tokio::fs::write(local, &content)
        .await
        .map_err(|source| ClientError::Io {
            path: local.to_path_buf(),
            source,
        })?;
    info!(path = %local.display(), bytes = content.len(), "file rebuilt");

    Ok(GetOutput {
        outcome: GetOutcome::Written {
            path: local.to_path_buf(),
            bytes: content.len(),
        },
        faults,
    })
}

/// Upload one file: hash, split, mask, disperse two pieces to each server
/// concurrently, and collect the acknowledgments.
///
/// # Errors
/// Returns `ClientError` when the local file cannot be read or no server
/// is reachable.
pub async fn put(
    config: &ClientConfig,
    local: &Path,
    remote: &RemotePath,
) -> Result<PutOutput, ClientError> {
    ensure_server_count(config)?;
    let content = tokio::fs::read(local)
        .await
        .map_err(|source| ClientError::Io {
            path: local.to_path_buf(),
            source,
        })?;
    let residue = content_mod(&content);
    let mut pieces = split_pieces(&content);
    mask_pieces(&mut pieces, config.user.password.as_bytes())?;
    debug!(residue, bytes = content.len(), file = %remote.name, "dispersing");

    let envelope = Envelope::new(
        CommandFlag::Put,
        &config.user,
        remote.folder_or_root(),
        &remote.name,
    );
    let mut fleet = Fleet::connect(config).await;
    if fleet.connected() == 0 {
        return Err(ClientError::NoServers);
    }
    fleet.broadcast_envelope(&envelope).await;
    let mut faults = fleet.collect_statuses().await;
    if !faults.is_empty() {
        // A server that refused the command cannot acknowledge; abort
        // before writing a partial upload.
        return Ok(PutOutput {
            delivered: false,
            faults,
        });
    }

    let uploads = fleet
        .slots_mut()
        .iter_mut()
        .filter_map(Option::as_mut)
        .map(|link| {
            let owed = pieces_for_server(residue, link.index);
            let payloads: Vec<(i32, &[u8])> = owed
                .iter()
                .map(|&piece_id| {
                    (
                        i32::from(piece_id),
                        pieces[(piece_id - 1) as usize].data.as_slice(),
                    )
                })
                .collect();
            async move {
                let name = link.name.clone();
                let outcome: Result<i32, SessionError> = async {
                    for (id, payload) in payloads {
                        link.send_piece(id, payload).await?;
                    }
                    link.read_int().await
                }
                .await;
                (name, outcome)
            }
        })
        .collect::<Vec<_>>();

    let mut delivered = true;
    for (server, outcome) in futures::future::join_all(uploads).await {
        match outcome {
            Ok(STATUS_OK) => {}
            Ok(status) => {
                delivered = false;
                faults.push(ServerFault {
                    server,
                    message: format!("upload rejected (status {status})"),
                });
            }
            Err(err) => {
                delivered = false;
                faults.push(ServerFault {
                    server,
                    message: err.to_string(),
                });
            }
        }
    }

    Ok(PutOutput { delivered, faults })
}

/// Create a folder on every reachable server.
///
/// # Errors
/// Returns `ClientError::NoServers` when no connection succeeds.
pub async fn mkdir(config: &ClientConfig, folder: &str) -> Result<MkdirOutput, ClientError> {
    let envelope = Envelope::new(CommandFlag::Mkdir, &config.user, folder, "");
    let mut fleet = Fleet::connect(config).await;
    if fleet.connected() == 0 {
        return Err(ClientError::NoServers);
    }
    fleet.broadcast_envelope(&envelope).await;
    let faults = fleet.collect_statuses().await;
    Ok(MkdirOutput {
        created: fleet.connected(),
        faults,
    })
}

fn ensure_server_count(config: &ClientConfig) -> Result<(), ClientError> {
    if config.servers.len() == SERVER_COUNT {
        Ok(())
    } else {
        Err(ClientError::ServerCount {
            expected: SERVER_COUNT,
            found: config.servers.len(),
        })
    }
}

/// Keep the in-range piece ids of a wire report entry.
fn wire_ids(ids: &[i32]) -> Vec<u8> {
    ids.iter()
        .filter_map(|&id| u8::try_from(id).ok())
        .filter(|&id| (1..=PIECE_COUNT as u8).contains(&id))
        .collect()
}

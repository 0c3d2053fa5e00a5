//! Per-connection command state machine.

use std::sync::Arc;

use dfp_core::{CommandFlag, OpError, PIECES_PER_SERVER, PIECE_COUNT};
use dfp_protocol::{
    read_int, read_signal, read_signal_byte, write_error_frame, write_frame, write_int, Envelope,
    PieceEntry, PieceFrame, PieceReport, Signal, STATUS_ACCEPT, STATUS_ERR, STATUS_OK,
};
use dfp_store::ScanEntry;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::{ConnectionError, ServerState};

/// Run one full command cycle on an accepted connection.
pub(crate) async fn handle(
    mut stream: TcpStream,
    state: Arc<ServerState>,
) -> Result<(), ConnectionError> {
    let envelope = Envelope::receive(&mut stream).await?;
    info!(
        command = envelope.flag.name(),
        user = %envelope.username,
        folder = %envelope.folder,
        file = %envelope.filename,
        "command received"
    );

    if !state.config.authenticate(&envelope.user()) {
        warn!(user = %envelope.username, "authentication failed");
        return refuse(&mut stream, OpError::AuthFailed).await;
    }

    match envelope.flag {
        CommandFlag::List => list(&mut stream, &state, &envelope).await,
        CommandFlag::Get => get(&mut stream, &state, &envelope).await,
        CommandFlag::Put => put(&mut stream, &state, &envelope).await,
        CommandFlag::Mkdir => mkdir(&mut stream, &state, &envelope).await,
        CommandFlag::Auth => {
            write_int(&mut stream, STATUS_OK).await?;
            Ok(())
        }
    }
}

/// Send `-1` and the error frame for a command-level failure.
async fn refuse(stream: &mut TcpStream, error: OpError) -> Result<(), ConnectionError> {
    write_int(stream, STATUS_ERR).await?;
    write_error_frame(stream, &error.to_string()).await?;
    Ok(())
}

fn report_from_scan(scan: &[ScanEntry]) -> PieceReport {
    PieceReport {
        entries: scan
            .iter()
            .map(|entry| {
                let pair = entry.report_pair();
                PieceEntry {
                    name: entry.name.clone(),
                    ids: [i32::from(pair[0]), i32::from(pair[1])],
                }
            })
            .collect(),
    }
}

async fn list(
    stream: &mut TcpStream,
    state: &ServerState,
    envelope: &Envelope,
) -> Result<(), ConnectionError> {
    if !state
        .store
        .folder_exists(&envelope.username, &envelope.folder)
        .await?
    {
        return refuse(stream, OpError::FolderNotFound).await;
    }

    let scan = state
        .store
        .scan_folder(&envelope.username, &envelope.folder, None)
        .await?;
    write_int(stream, STATUS_ACCEPT).await?;
    write_int(stream, i32::from(!scan.is_empty())).await?;
    report_from_scan(&scan).send(stream).await?;

    let listing: String = state
        .store
        .subfolders(&envelope.username, &envelope.folder)
        .await?
        .iter()
        .map(|name| format!("{name}\n"))
        .collect();
    write_frame(stream, listing.as_bytes()).await?;

    // Wait for the client's closing signal (any byte) so our close does not
    // race its reads with a TCP reset.
    let _ = read_signal_byte(stream).await;
    Ok(())
}

async fn get(
    stream: &mut TcpStream,
    state: &ServerState,
    envelope: &Envelope,
) -> Result<(), ConnectionError> {
    if !state
        .store
        .folder_exists(&envelope.username, &envelope.folder)
        .await?
    {
        return refuse(stream, OpError::FolderNotFound).await;
    }

    // Status is success even when the file is absent here: the client
    // aggregates reports from the whole fleet before deciding anything.
    let scan = state
        .store
        .scan_folder(&envelope.username, &envelope.folder, Some(&envelope.filename))
        .await?;
    write_int(stream, STATUS_OK).await?;
    report_from_scan(&scan).send(stream).await?;

    if read_signal(stream).await? != Signal::Proceed {
        debug!("client declined piece transfer");
        return Ok(());
    }

    loop {
        let id = read_int(stream).await?;
        let payload = read_requested_piece(state, envelope, id).await;
        PieceFrame::send(stream, id, &payload).await?;
        if read_signal(stream).await? != Signal::Reset {
            break;
        }
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
async fn read_requested_piece(state: &ServerState, envelope: &Envelope, id: i32) -> Vec<u8> {
    let Some(piece_id) = u8::try_from(id)
        .ok()
        .filter(|pid| (1..=PIECE_COUNT as u8).contains(pid))
    else {
        warn!(piece = id, "requested piece id out of range");
        return Vec::new();
    };
    match state
        .store
        .read_piece(&envelope.username, &envelope.folder, &envelope.filename, piece_id)
        .await
    {
        Ok(payload) => payload,
        Err(err) => {
            warn!(%err, piece = id, "serving empty payload for unreadable piece");
            Vec::new()
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
async fn put(
    stream: &mut TcpStream,
    state: &ServerState,
    envelope: &Envelope,
) -> Result<(), ConnectionError> {
    write_int(stream, STATUS_ACCEPT).await?;

    for _ in 0..PIECES_PER_SERVER {
        let frame = match PieceFrame::receive(stream).await {
            Ok(frame) => frame,
            Err(err) => {
                // Best effort: the peer may already be gone.
                let _ = refuse(stream, OpError::FileNotFound).await;
                return Err(err.into());
            }
        };

        let Some(piece_id) = u8::try_from(frame.id)
            .ok()
            .filter(|pid| (1..=PIECE_COUNT as u8).contains(pid))
        else {
            warn!(piece = frame.id, "uploaded piece id out of range");
            return refuse(stream, OpError::FileNotFound).await;
        };

        if let Err(err) = state
            .store
            .write_piece(
                &envelope.username,
                &envelope.folder,
                &envelope.filename,
                piece_id,
                &frame.payload,
            )
            .await
        {
            let _ = refuse(stream, OpError::FileNotFound).await;
            return Err(err.into());
        }
    }

    write_int(stream, STATUS_OK).await?;
    info!(file = %envelope.filename, "put complete");
    Ok(())
}

async fn mkdir(
    stream: &mut TcpStream,
    state: &ServerState,
    envelope: &Envelope,
) -> Result<(), ConnectionError> {
    match state
        .store
        .make_folder(&envelope.username, &envelope.folder)
        .await
    {
        Ok(()) => {
            info!(folder = %envelope.folder, "folder created");
            write_int(stream, STATUS_OK).await?;
            Ok(())
        }
        Err(dfp_store::StoreError::FolderExists { .. }) => {
            refuse(stream, OpError::FolderExists).await
        }
        Err(err) => Err(err.into()),
    }
}

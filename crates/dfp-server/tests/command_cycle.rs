//! Drives the server's per-connection state machine over real sockets,
//! speaking the wire protocol directly.

use std::sync::Arc;

use dfp_core::{CommandFlag, ServerConfig, User};
use dfp_protocol::{
    read_error_frame, read_int, write_int, write_signal, Envelope, PieceFrame, PieceReport,
    Signal, WireError, STATUS_ACCEPT, STATUS_ERR, STATUS_OK,
};
use dfp_server::ServerState;
use dfp_store::PieceStore;
use tokio::net::{TcpListener, TcpStream};

fn test_user() -> User {
    User::new("alice", "hunter2")
}

struct Harness {
    addr: std::net::SocketAddr,
    dir: tempfile::TempDir,
    _task: tokio::task::JoinHandle<()>,
}

impl Harness {
    fn store(&self) -> PieceStore {
        PieceStore::new(self.dir.path())
    }

    async fn connect(&self) -> TcpStream {
        TcpStream::connect(self.addr).await.unwrap()
    }
}

async fn start_server() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = PieceStore::new(dir.path());
    store.ensure_user_dirs(&[test_user()]).await.unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(ServerState {
        store,
        config: ServerConfig {
            users: vec![test_user()],
        },
    });
    let task = tokio::spawn(async move {
        let _ = dfp_server::serve(listener, state).await;
    });

    Harness {
        addr,
        dir,
        _task: task,
    }
}

fn envelope(flag: CommandFlag, folder: &str, filename: &str) -> Envelope {
    Envelope::new(flag, &test_user(), folder, filename)
}

#[tokio::test]
async fn list_groups_pieces_and_reports_folders() {
    let server = start_server().await;
    let store = server.store();
    // "a" has two pieces locally, "b" only one: only "a" is present here.
    store.write_piece("alice", "/", "a", 1, b"1").await.unwrap();
    store.write_piece("alice", "/", "a", 2, b"2").await.unwrap();
    store.write_piece("alice", "/", "b", 3, b"3").await.unwrap();
    store.make_folder("alice", "docs/").await.unwrap();

    let mut conn = server.connect().await;
    envelope(CommandFlag::List, "/", "").send(&mut conn).await.unwrap();

    assert_eq!(read_int(&mut conn).await.unwrap(), STATUS_ACCEPT);
    assert_eq!(read_int(&mut conn).await.unwrap(), 1); // hasData

    let report = PieceReport::receive(&mut conn).await.unwrap();
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].name, "a");
    assert_eq!(report.entries[0].ids, [1, 2]);

    let listing = dfp_protocol::read_frame(&mut conn, 4096).await.unwrap();
    assert_eq!(String::from_utf8_lossy(&listing), "docs/\n");

    write_signal(&mut conn, Signal::Reset).await.unwrap();
}

#[tokio::test]
async fn get_serves_pieces_until_terminal_signal() {
    let server = start_server().await;
    let store = server.store();
    store.write_piece("alice", "/", "f", 2, b"two").await.unwrap();
    store.write_piece("alice", "/", "f", 3, b"three").await.unwrap();

    let mut conn = server.connect().await;
    envelope(CommandFlag::Get, "/", "f").send(&mut conn).await.unwrap();

    assert_eq!(read_int(&mut conn).await.unwrap(), STATUS_OK);
    let report = PieceReport::receive(&mut conn).await.unwrap();
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].ids, [2, 3]);

    write_signal(&mut conn, Signal::Proceed).await.unwrap();

    write_int(&mut conn, 2).await.unwrap();
    let piece = PieceFrame::receive(&mut conn).await.unwrap();
    assert_eq!(piece.id, 2);
    assert_eq!(piece.payload, b"two");
    write_signal(&mut conn, Signal::Reset).await.unwrap();

    write_int(&mut conn, 3).await.unwrap();
    let piece = PieceFrame::receive(&mut conn).await.unwrap();
    assert_eq!(piece.id, 3);
    assert_eq!(piece.payload, b"three");
    write_signal(&mut conn, Signal::EndGet).await.unwrap();

    // The worker leaves the piece loop and closes the connection.
    let err = read_int(&mut conn).await.unwrap_err();
    assert!(matches!(err, WireError::ShortRead));
}

#[tokio::test]
async fn get_reports_nothing_for_an_absent_file() {
    let server = start_server().await;

    let mut conn = server.connect().await;
    envelope(CommandFlag::Get, "/", "ghost").send(&mut conn).await.unwrap();

    // Still a success status so the client can aggregate fleet-wide.
    assert_eq!(read_int(&mut conn).await.unwrap(), STATUS_OK);
    let report = PieceReport::receive(&mut conn).await.unwrap();
    assert!(report.entries.is_empty());
    write_signal(&mut conn, Signal::Reset).await.unwrap();
}

#[tokio::test]
async fn put_stores_exactly_two_pieces() {
    let server = start_server().await;

    let mut conn = server.connect().await;
    envelope(CommandFlag::Put, "/", "notes").send(&mut conn).await.unwrap();
    assert_eq!(read_int(&mut conn).await.unwrap(), STATUS_ACCEPT);

    PieceFrame::send(&mut conn, 4, b"tail").await.unwrap();
    PieceFrame::send(&mut conn, 1, b"head").await.unwrap();
    assert_eq!(read_int(&mut conn).await.unwrap(), STATUS_OK);

    let store = server.store();
    assert_eq!(store.read_piece("alice", "/", "notes", 4).await.unwrap(), b"tail");
    assert_eq!(store.read_piece("alice", "/", "notes", 1).await.unwrap(), b"head");
}

#[tokio::test]
async fn wrong_credentials_are_refused() {
    let server = start_server().await;

    let mut conn = server.connect().await;
    Envelope::new(CommandFlag::List, &User::new("alice", "nope"), "/", "")
        .send(&mut conn)
        .await
        .unwrap();

    assert_eq!(read_int(&mut conn).await.unwrap(), STATUS_ERR);
    assert_eq!(
        read_error_frame(&mut conn).await.unwrap(),
        "Invalid Username/Password. Please try again"
    );
}

#[tokio::test]
async fn list_of_missing_folder_is_an_error() {
    let server = start_server().await;

    let mut conn = server.connect().await;
    envelope(CommandFlag::List, "nowhere/", "").send(&mut conn).await.unwrap();

    assert_eq!(read_int(&mut conn).await.unwrap(), STATUS_ERR);
    assert_eq!(
        read_error_frame(&mut conn).await.unwrap(),
        "Requested folder does not exists on server"
    );
}

#[tokio::test]
async fn mkdir_twice_reports_folder_exists() {
    let server = start_server().await;

    let mut conn = server.connect().await;
    envelope(CommandFlag::Mkdir, "docs/", "").send(&mut conn).await.unwrap();
    assert_eq!(read_int(&mut conn).await.unwrap(), STATUS_OK);

    let mut conn = server.connect().await;
    envelope(CommandFlag::Mkdir, "docs/", "").send(&mut conn).await.unwrap();
    assert_eq!(read_int(&mut conn).await.unwrap(), STATUS_ERR);
    assert_eq!(
        read_error_frame(&mut conn).await.unwrap(),
        "Requested folder already exists on server"
    );
}

#[tokio::test]
async fn auth_flag_answers_success_and_closes() {
    let server = start_server().await;

    let mut conn = server.connect().await;
    envelope(CommandFlag::Auth, "", "").send(&mut conn).await.unwrap();
    assert_eq!(read_int(&mut conn).await.unwrap(), STATUS_OK);
    let err = read_int(&mut conn).await.unwrap_err();
    assert!(matches!(err, WireError::ShortRead));
}

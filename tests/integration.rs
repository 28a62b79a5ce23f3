use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::io::BufReader;
use tokio::net::TcpStream;

use rax_file_share::Server;
use rax_file_share::auth::User;
use rax_file_share::config::ServerConfig;
use rax_file_share::protocol::responses::{
    CREATED, LIST_OK, MODE_CHANGED, READ_OK, TOO_MANY_CONNECTIONS, WRITE_OK, WRITE_READY,
};
use rax_file_share::protocol::{Request, Response, read_message, write_message};
use rax_file_share::remote::RemoteSession;
use rax_file_share::server::ServerContext;

struct TestServer {
    addr: SocketAddr,
    context: Arc<ServerContext>,
    dir: TempDir,
}

impl TestServer {
    async fn start(configure: impl FnOnce(&mut ServerConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServerConfig {
            port: 0,
            storage_root: dir.path().join("root").to_string_lossy().into_owned(),
            audit_log_path: dir.path().join("audit.log").to_string_lossy().into_owned(),
            ..ServerConfig::default()
        };
        configure(&mut config);

        let server = Server::new(config).await.unwrap();
        let addr = server.local_addr().unwrap();
        let context = server.context();
        tokio::spawn(async move { server.start().await });

        Self { addr, context, dir }
    }

    async fn session(&self, name: &str, group: &str) -> RemoteSession {
        RemoteSession::connect(self.addr, User::new(name, group))
            .await
            .unwrap()
    }

    fn audit_log(&self) -> String {
        std::fs::read_to_string(self.dir.path().join("audit.log")).unwrap_or_default()
    }
}

#[tokio::test]
async fn group_member_without_read_bit_is_denied_and_owner_writes() {
    let server = TestServer::start(|_| {}).await;
    let mut alice = server.session("alice", "eng").await;
    let mut bob = server.session("bob", "eng").await;

    let response = alice.request("create notes.txt rw----").await.unwrap();
    assert_eq!(response.status, CREATED);

    let response = bob.request("read notes.txt").await.unwrap();
    assert_eq!(response.status, "Permission denied");

    let response = alice.write("notes.txt", "o", b"meeting at 10").await.unwrap();
    assert_eq!(response.status, WRITE_OK);
    assert!(response.content.starts_with("size=13 "));
    assert_eq!(server.context.registry.lookup("notes.txt").unwrap().size, 13);

    let stored = std::fs::read(server.dir.path().join("root").join("notes.txt")).unwrap();
    assert_eq!(stored, b"meeting at 10");

    let audit = server.audit_log();
    assert!(audit.contains("user=alice action=create file=notes.txt status=created"));
    assert!(audit.contains("user=bob action=read file=notes.txt status=Permission denied"));
    assert!(audit.contains("user=alice action=write file=notes.txt status=write ok"));
}

#[tokio::test]
async fn malformed_permission_string_leaves_registry_unchanged() {
    let server = TestServer::start(|_| {}).await;
    let mut alice = server.session("alice", "eng").await;

    let response = alice.request("create report.txt rwrw rw").await.unwrap();
    assert_eq!(response.status, "Invalid permission format");
    assert!(server.context.registry.is_empty());
    assert!(!server.audit_log().contains("status=created"));
}

#[tokio::test]
async fn create_beyond_capacity_fails() {
    let server = TestServer::start(|c| c.max_files = 2).await;
    let mut alice = server.session("alice", "eng").await;

    for name in ["a.txt", "b.txt"] {
        let response = alice.request(&format!("create {name} rw----")).await.unwrap();
        assert_eq!(response.status, CREATED);
    }
    let response = alice.request("create c.txt rw----").await.unwrap();
    assert_eq!(response.status, "File capacity exceeded");
    assert_eq!(server.context.registry.len(), 2);

    let response = alice.request("create a.txt rwrwrw").await.unwrap();
    assert_eq!(response.status, "File already exists");
}

#[tokio::test]
async fn reading_a_missing_file_is_not_found() {
    let server = TestServer::start(|_| {}).await;
    let mut bob = server.session("bob", "eng").await;
    let response = bob.request("read missing.txt").await.unwrap();
    assert_eq!(response, Response::status("File not found"));
}

#[tokio::test]
async fn chmod_changes_what_others_list() {
    let server = TestServer::start(|_| {}).await;
    let mut alice = server.session("alice", "eng").await;
    let mut bob = server.session("bob", "eng").await;
    let mut carol = server.session("carol", "ops").await;

    alice.request("create plan.txt rw----").await.unwrap();
    let (response, entries) = bob.list().await.unwrap();
    assert_eq!(response.status, LIST_OK);
    assert!(entries.is_empty());

    let response = bob.request("mode plan.txt rwrwrw").await.unwrap();
    assert_eq!(response.status, "Permission denied");

    let response = alice.request("mode plan.txt rwr---").await.unwrap();
    assert_eq!(response.status, MODE_CHANGED);
    let (_, entries) = bob.list().await.unwrap();
    assert_eq!(entries, vec![("plan.txt".to_string(), "rwr---".to_string())]);
    let (_, entries) = carol.list().await.unwrap();
    assert!(entries.is_empty());

    // Writable by others but not readable: listed, yet unreadable.
    alice.request("mode plan.txt rw---w").await.unwrap();
    let (_, entries) = carol.list().await.unwrap();
    assert_eq!(entries, vec![("plan.txt".to_string(), "rw---w".to_string())]);
    let response = carol.request("read plan.txt").await.unwrap();
    assert_eq!(response.status, "Permission denied");
}

#[tokio::test]
async fn repeated_reads_return_identical_content() {
    let server = TestServer::start(|_| {}).await;
    let mut alice = server.session("alice", "eng").await;
    let mut bob = server.session("bob", "ops").await;

    alice.request("create shared.txt rwr-r-").await.unwrap();
    alice.write("shared.txt", "o", b"line one\nline two").await.unwrap();

    let first = bob.request("read shared.txt").await.unwrap();
    assert_eq!(first.status, READ_OK);
    assert_eq!(first.content, "line one\nline two");
    for _ in 0..3 {
        assert_eq!(bob.request("read shared.txt").await.unwrap(), first);
    }
}

#[tokio::test]
async fn second_writer_and_readers_see_busy_until_commit() {
    let server = TestServer::start(|_| {}).await;
    let mut alice = server.session("alice", "eng").await;
    let mut bob = server.session("bob", "eng").await;

    alice.request("create log.txt rwrwrw").await.unwrap();
    alice.write("log.txt", "o", b"first").await.unwrap();

    let ready = alice.begin_write("log.txt", "a").await.unwrap();
    assert_eq!(ready.status, WRITE_READY);
    assert_eq!(ready.content, "first");

    let response = bob.write("log.txt", "o", b"intruder").await.unwrap();
    assert_eq!(response.status, "File is modifying");
    let response = bob.request("read log.txt").await.unwrap();
    assert_eq!(response.status, "File is modifying");

    let response = alice.send_content(b" second").await.unwrap();
    assert_eq!(response.status, WRITE_OK);

    let response = bob.request("read log.txt").await.unwrap();
    assert_eq!(response.content, "first second");
}

#[tokio::test]
async fn concurrent_writes_commit_exactly_once_each_or_busy() {
    let server = TestServer::start(|_| {}).await;
    let mut owner = server.session("owner", "eng").await;
    owner.request("create race.txt rwrwrw").await.unwrap();

    let mut writers = Vec::new();
    for i in 0..4 {
        let mut session = server.session(&format!("w{i}"), "eng").await;
        writers.push(tokio::spawn(async move {
            let payload = format!("payload-{i}");
            let response = session.write("race.txt", "o", payload.as_bytes()).await.unwrap();
            (response.status, payload)
        }));
    }

    let mut committed = Vec::new();
    for writer in writers {
        let (status, payload) = writer.await.unwrap();
        match status.as_str() {
            WRITE_OK => committed.push(payload),
            "File is modifying" => {}
            other => panic!("unexpected status {other}"),
        }
    }
    assert!(!committed.is_empty());

    let content = owner.request("read race.txt").await.unwrap().content;
    assert!(committed.contains(&content), "{content:?} is not one whole payload");
    assert!(!server.context.registry.lookup("race.txt").unwrap().is_modifying());
}

#[tokio::test]
async fn disconnect_mid_write_releases_the_file() {
    let server = TestServer::start(|_| {}).await;
    let mut alice = server.session("alice", "eng").await;
    alice.request("create draft.txt rwrw--").await.unwrap();

    let mut quitter = server.session("bob", "eng").await;
    let ready = quitter.begin_write("draft.txt", "o").await.unwrap();
    assert_eq!(ready.status, WRITE_READY);
    drop(quitter);

    let mut status = String::new();
    for _ in 0..100 {
        status = alice.write("draft.txt", "o", b"kept").await.unwrap().status;
        if status != "File is modifying" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(status, WRITE_OK);

    // The abandoned write is audited once its task notices the disconnect.
    let expected = "user=bob action=write file=draft.txt status=Transfer incomplete";
    let mut audited = false;
    for _ in 0..100 {
        if server.audit_log().contains(expected) {
            audited = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(audited);
}

#[tokio::test]
async fn malformed_requests_and_identity_changes_are_rejected() {
    let server = TestServer::start(|_| {}).await;
    let stream = TcpStream::connect(server.addr).await.unwrap();
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    use tokio::io::AsyncWriteExt;
    write_half.write_all(b"this is not json\n").await.unwrap();
    let response: Response = read_message(&mut reader, 4096).await.unwrap().unwrap();
    assert_eq!(response.status, "Invalid command");

    write_half.write_all(b"\xff\xfe garbage\n").await.unwrap();
    let response: Response = read_message(&mut reader, 4096).await.unwrap().unwrap();
    assert_eq!(response.status, "Invalid command");

    let alice = User::new("alice", "eng");
    write_message(&mut write_half, &Request::new(alice.clone(), "rm everything"))
        .await
        .unwrap();
    let response: Response = read_message(&mut reader, 4096).await.unwrap().unwrap();
    assert_eq!(response.status, "Invalid command");

    let mallory = User::new("alice", "admins");
    write_message(&mut write_half, &Request::new(mallory, "ls"))
        .await
        .unwrap();
    let response: Response = read_message(&mut reader, 4096).await.unwrap().unwrap();
    assert_eq!(response.status, "Identity mismatch");

    write_message(&mut write_half, &Request::new(alice, "ls")).await.unwrap();
    let response: Response = read_message(&mut reader, 4096).await.unwrap().unwrap();
    assert_eq!(response.status, LIST_OK);
}

#[tokio::test]
async fn extra_clients_are_refused() {
    let server = TestServer::start(|c| c.max_clients = 1).await;
    let mut first = server.session("alice", "eng").await;
    first.list().await.unwrap();

    let mut second = server.session("bob", "eng").await;
    let response = second.receive_unsolicited().await.unwrap();
    assert_eq!(response.status, TOO_MANY_CONNECTIONS);
}

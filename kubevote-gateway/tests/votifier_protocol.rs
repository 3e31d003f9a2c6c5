//! End-to-end Votifier protocol scenarios spanning the crypto codec, the
//! dedup/pending-reward stores, and the RC client together (spec §8,
//! scenarios 1-4).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use kubevote_crypto::KeyPair;
use kubevote_gateway::connection;
use kubevote_rc::packet::{self, PACKET_RESPONSE};
use kubevote_rc::RcClient;
use kubevote_store::{PendingRewardsStore, VoteDeduplicator};
use rand::rngs::OsRng;
use rsa::Pkcs1v15Encrypt;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// Spawns a fake RC server that authenticates any password and replies to
/// every `exec` with `response`, forwarding each received command payload
/// on `commands`.
async fn spawn_fake_rc(response: &'static str) -> (SocketAddr, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read_half, write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        let mut writer = BufWriter::new(write_half);

        let auth = packet::read_packet(&mut reader).await.unwrap();
        packet::write_packet(&mut writer, auth.id, PACKET_RESPONSE, "").await.unwrap();

        while let Ok(request) = packet::read_packet(&mut reader).await {
            tx.send(request.payload).ok();
            if packet::write_packet(&mut writer, request.id, PACKET_RESPONSE, response)
                .await
                .is_err()
            {
                break;
            }
        }
    });

    (addr, rx)
}

fn temp_dir(name: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let unique: u64 = rand::random();
    dir.push(format!("kubevote-gateway-test-{}-{unique}-{name}", std::process::id()));
    dir
}

fn encrypt_vote(keys: &KeyPair, payload: &str) -> [u8; 256] {
    let mut rng = OsRng;
    let ciphertext = keys
        .public_key
        .encrypt(&mut rng, Pkcs1v15Encrypt, payload.as_bytes())
        .unwrap();
    ciphertext.try_into().unwrap()
}

/// Connects to `addr`, reads the greeting, sends `block`, then confirms
/// the server closed the connection.
async fn send_vote(addr: SocketAddr, block: &[u8; 256]) {
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let mut greeting = [0u8; kubevote_crypto::GREETING.len()];
    stream.read_exact(&mut greeting).await.unwrap();
    assert_eq!(&greeting, kubevote_crypto::GREETING);

    stream.write_all(block).await.unwrap();
    stream.flush().await.unwrap();

    let mut trailing = [0u8; 1];
    let n = stream.read(&mut trailing).await.unwrap();
    assert_eq!(n, 0, "server must close the socket after processing a vote");
}

struct Harness {
    votifier_addr: SocketAddr,
    commands: mpsc::UnboundedReceiver<String>,
    pending: Arc<PendingRewardsStore>,
    keys_dir: PathBuf,
    pending_path: PathBuf,
}

async fn build_harness(rc_response: &'static str) -> Harness {
    let keys_dir = temp_dir("keys");
    let keys = Arc::new(KeyPair::load_or_generate(&keys_dir).unwrap());

    let pending_path = temp_dir("pending.json");
    let pending = Arc::new(PendingRewardsStore::load(&pending_path));
    let dedup = Arc::new(VoteDeduplicator::new());

    let (rc_addr, commands) = spawn_fake_rc(rc_response).await;
    let rc = Arc::new(RcClient::new(rc_addr, "password".to_string()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let votifier_addr = listener.local_addr().unwrap();

    let handler_pending = pending.clone();
    tokio::spawn(async move {
        loop {
            let Ok((socket, peer)) = listener.accept().await else { break };
            tokio::spawn(connection::handle(
                socket,
                peer,
                keys.clone(),
                dedup.clone(),
                handler_pending.clone(),
                rc.clone(),
            ));
        }
    });

    Harness {
        votifier_addr,
        commands,
        pending,
        keys_dir,
        pending_path,
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.keys_dir).ok();
        std::fs::remove_file(&self.pending_path).ok();
    }
}

#[tokio::test]
async fn happy_vote_reaches_the_game_and_leaves_no_pending_reward() {
    let mut harness = build_harness("ok").await;
    let keys = KeyPair::load_or_generate(&harness.keys_dir).unwrap();
    let block = encrypt_vote(&keys, "VOTE\nPMC\nSteve\n1.2.3.4\n1700000000\n");

    send_vote(harness.votifier_addr, &block).await;

    let command = harness.commands.recv().await.unwrap();
    assert_eq!(command, "kubevote process Steve PMC");
    assert_eq!(harness.pending.pending_count("Steve"), 0);
}

#[tokio::test]
async fn service_names_with_spaces_are_sanitised_to_underscores() {
    let mut harness = build_harness("ok").await;
    let keys = KeyPair::load_or_generate(&harness.keys_dir).unwrap();
    let block = encrypt_vote(&keys, "VOTE\nminecraft server list\nSteve\n1.2.3.4\n1700000000\n");

    send_vote(harness.votifier_addr, &block).await;

    let command = harness.commands.recv().await.unwrap();
    assert_eq!(command, "kubevote process Steve minecraft_server_list");
}

#[tokio::test]
async fn offline_player_is_queued_as_a_pending_reward() {
    let mut harness = build_harness("Error: No player was found").await;
    let keys = KeyPair::load_or_generate(&harness.keys_dir).unwrap();
    let block = encrypt_vote(&keys, "VOTE\nPMC\nSteve\n1.2.3.4\n1700000000\n");

    send_vote(harness.votifier_addr, &block).await;
    let _ = harness.commands.recv().await.unwrap();

    // pending.add() persists synchronously, but the handler task races with
    // this assertion; give it a moment to land after the socket closes.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let reloaded = PendingRewardsStore::load(&harness.pending_path);
    assert_eq!(reloaded.pending_count("Steve"), 1);
}

#[tokio::test]
async fn duplicate_votes_within_the_window_reach_the_game_only_once() {
    let mut harness = build_harness("ok").await;
    let keys = KeyPair::load_or_generate(&harness.keys_dir).unwrap();
    let block = encrypt_vote(&keys, "VOTE\nPMC\nSteve\n1.2.3.4\n1700000000\n");

    send_vote(harness.votifier_addr, &block).await;
    let command = harness.commands.recv().await.unwrap();
    assert_eq!(command, "kubevote process Steve PMC");

    let second_block = encrypt_vote(&keys, "VOTE\nPMC\nSteve\n1.2.3.4\n1700000001\n");
    send_vote(harness.votifier_addr, &second_block).await;

    // The duplicate is dropped silently before any RC call, so nothing
    // further ever arrives on the channel.
    let second = tokio::time::timeout(Duration::from_millis(200), harness.commands.recv()).await;
    assert!(second.is_err(), "duplicate vote must not reach the game a second time");
}

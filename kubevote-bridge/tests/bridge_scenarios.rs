//! End-to-end bridge scenarios spanning the status FSM, the stats poller
//! and the topic updater together (spec §8, scenarios 5-6).

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kubevote_bridge::adapter::{ChatPlatform, EmbedSpec, WebhookHandle};
use kubevote_bridge::bridge::{self, BridgeState};
use kubevote_bridge::config::BridgeConfig;
use kubevote_bridge::error::BridgeError;
use kubevote_rc::RcClient;
use kubevote_rc::packet::{self, PACKET_RESPONSE};
use tokio::io::{BufReader, BufWriter};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Spawns a fake RC server that authenticates any password and answers
/// every subsequent `exec` call with whatever `next_response` returns.
async fn spawn_fake_rc<F>(mut next_response: F) -> SocketAddr
where
    F: FnMut() -> String + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read_half, write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        let mut writer = BufWriter::new(write_half);

        let auth = packet::read_packet(&mut reader).await.unwrap();
        packet::write_packet(&mut writer, auth.id, PACKET_RESPONSE, "").await.unwrap();

        while let Ok(request) = packet::read_packet(&mut reader).await {
            let response = next_response();
            if packet::write_packet(&mut writer, request.id, PACKET_RESPONSE, &response)
                .await
                .is_err()
            {
                break;
            }
        }
    });

    addr
}

#[derive(Default)]
struct RecordingAdapter {
    online_embeds: AtomicUsize,
    restarting_embeds: AtomicUsize,
    topic_edits: AtomicUsize,
}

#[async_trait]
impl ChatPlatform for RecordingAdapter {
    async fn send_message(&self, _channel_id: u64, _content: &str) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn send_embed(&self, _channel_id: u64, embed: EmbedSpec) -> Result<(), BridgeError> {
        match embed.title.as_str() {
            "Server Online" => {
                self.online_embeds.fetch_add(1, Ordering::SeqCst);
            }
            "Server Restarting" => {
                self.restarting_embeds.fetch_add(1, Ordering::SeqCst);
            }
            _ => {}
        }
        Ok(())
    }

    async fn edit_topic(&self, _channel_id: u64, _topic: &str) -> Result<(), BridgeError> {
        self.topic_edits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_or_create_webhook(&self, _channel_id: u64, _name: &str) -> Result<WebhookHandle, BridgeError> {
        Ok(WebhookHandle { id: 1, token: "t".to_string() })
    }

    async fn send_via_webhook(
        &self,
        _webhook: &WebhookHandle,
        _content: &str,
        _username: &str,
        _avatar_url: &str,
    ) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn post_webhook_url(
        &self,
        _url: &str,
        _content: &str,
        _username: &str,
        _avatar_url: &str,
    ) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn http_get_bytes(&self, _url: &str) -> Result<Vec<u8>, BridgeError> {
        Ok(vec![])
    }

    async fn set_presence(&self, _text: &str) {}
}

fn test_config() -> BridgeConfig {
    BridgeConfig {
        rcon_addr: "127.0.0.1:1".parse().unwrap(),
        rcon_password: "pw".to_string(),
        discord_token: "token".to_string(),
        discord_channel_id: 42,
        discord_guild_id: None,
        discord_webhook_url: None,
        server_name: "Test Server".to_string(),
        topic_update_interval_secs: 1,
        stats_check_interval_secs: 1,
        max_message_length: 256,
        debug: false,
    }
}

const VALID_STATS: &str = r#"{"tps": 19.85, "playerCount": 42, "uptime": "21h 1m"}"#;

#[tokio::test]
async fn status_oscillation_notifies_once_per_direction_within_the_cooldown() {
    // Sequence: one success (Offline -> Online), three failures (Online ->
    // Offline after 3 consecutive), then one more success. All ticks land
    // well within the 30s notification cooldown, so each direction fires
    // at most once (spec §8 scenario 5).
    let mut responses = vec![
        VALID_STATS.to_string(),
        "not json".to_string(),
        "not json".to_string(),
        "not json".to_string(),
        VALID_STATS.to_string(),
    ]
    .into_iter();

    let rc_addr = spawn_fake_rc(move || responses.next().unwrap_or_else(|| "not json".to_string())).await;
    let rc = Arc::new(RcClient::new(rc_addr, "pw".to_string()));
    let adapter: Arc<RecordingAdapter> = Arc::new(RecordingAdapter::default());
    let chat_platform: Arc<dyn ChatPlatform> = adapter.clone();

    let mut config = test_config();
    config.stats_check_interval_secs = 1;
    let state = BridgeState::new(config, rc, chat_platform);

    let cancel = CancellationToken::new();
    let poller = tokio::spawn(bridge::run_stats_poller(state.clone(), cancel.clone()));

    // Five ticks at a ~1s interval; give it a generous window to complete.
    tokio::time::sleep(Duration::from_millis(5200)).await;
    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(2), poller).await;

    assert_eq!(adapter.online_embeds.load(Ordering::SeqCst), 1);
    assert_eq!(adapter.restarting_embeds.load(Ordering::SeqCst), 1);
    assert!(state.is_online());
}

#[tokio::test]
async fn identical_stats_ticks_issue_at_most_one_topic_edit() {
    let rc_addr = spawn_fake_rc(|| VALID_STATS.to_string()).await;
    let rc = Arc::new(RcClient::new(rc_addr, "pw".to_string()));
    let adapter: Arc<RecordingAdapter> = Arc::new(RecordingAdapter::default());
    let chat_platform: Arc<dyn ChatPlatform> = adapter.clone();

    let mut config = test_config();
    config.stats_check_interval_secs = 1;
    config.topic_update_interval_secs = 1;
    let state = BridgeState::new(config, rc, chat_platform);

    let cancel = CancellationToken::new();
    let stats_task = tokio::spawn(bridge::run_stats_poller(state.clone(), cancel.clone()));
    let topic_task = tokio::spawn(bridge::run_topic_updater(state.clone(), cancel.clone()));

    tokio::time::sleep(Duration::from_millis(4200)).await;
    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(2), stats_task).await;
    let _ = tokio::time::timeout(Duration::from_secs(2), topic_task).await;

    assert_eq!(adapter.topic_edits.load(Ordering::SeqCst), 1);
}

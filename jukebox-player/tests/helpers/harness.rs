//! Wiring fakes into rooms and coordinators

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use jukebox_common::events::{EventBus, JukeboxEvent};
use jukebox_common::{MessageId, RoomId, TextChannelId, UserId, VoiceChannelId};
use jukebox_player::config::Settings;
use jukebox_player::control::Origin;
use jukebox_player::room::{Room, RoomDeps, RoomMailbox};
use jukebox_player::{Coordinator, CoordinatorHandle};

use super::fakes::{FakeChat, FakeGateway, FakeResolver};

pub const ROOM: RoomId = RoomId(1);
pub const TEXT: TextChannelId = TextChannelId(10);
pub const VOICE: VoiceChannelId = VoiceChannelId(20);
pub const USER: UserId = UserId(30);

/// Command origin from USER in TEXT, connected to VOICE
pub fn command() -> Origin {
    Origin::command(TEXT, USER, Some(VOICE), Some(MessageId(1)))
}

/// Button origin from USER in TEXT, connected to VOICE
pub fn button() -> Origin {
    Origin::button(TEXT, USER, Some(VOICE), Some(MessageId(2)))
}

pub struct Harness {
    pub gateway: Arc<FakeGateway>,
    pub chat: Arc<FakeChat>,
    pub resolver: Arc<FakeResolver>,
    pub events: EventBus,
    pub settings: Settings,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            gateway: FakeGateway::new(),
            chat: FakeChat::new(),
            resolver: FakeResolver::new(),
            events: EventBus::new(64),
            settings: Settings::default(),
        }
    }

    pub fn deps(&self) -> RoomDeps {
        RoomDeps {
            gateway: self.gateway.clone(),
            chat: self.chat.clone(),
            resolver: self.resolver.clone(),
            events: self.events.clone(),
            settings: Arc::new(self.settings.clone()),
        }
    }

    /// A room driven by hand; its text channel is already known
    pub fn room(&self) -> (Room, RoomMailbox) {
        let (mut room, mailbox) = Room::new(ROOM, self.deps());
        room.session_mut().last_text_channel = Some(TEXT);
        (room, mailbox)
    }

    /// A running coordinator
    pub fn coordinator(&self) -> CoordinatorHandle {
        self.spawn_coordinator().0
    }

    /// A running coordinator and its task, for observing shutdown
    pub fn spawn_coordinator(&self) -> (CoordinatorHandle, JoinHandle<()>) {
        let (coordinator, handle) = Coordinator::new(self.deps());
        let task = tokio::spawn(coordinator.run());
        (handle, task)
    }
}

/// Handle the next inbox message (typically a completion from a transport thread)
pub async fn pump(room: &mut Room, mailbox: &mut RoomMailbox) {
    let message = tokio::time::timeout(Duration::from_secs(5), mailbox.recv())
        .await
        .expect("timed out waiting for a room message")
        .expect("room inbox closed");
    room.handle_message(message).await;
}

/// Wait for the first event matching `pred`
pub async fn wait_for_event<F>(rx: &mut broadcast::Receiver<JukeboxEvent>, pred: F) -> JukeboxEvent
where
    F: Fn(&JukeboxEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = rx.recv().await.expect("event bus closed");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// Assert no event matching `pred` arrives within `window`
pub async fn expect_no_event<F>(rx: &mut broadcast::Receiver<JukeboxEvent>, window: Duration, pred: F)
where
    F: Fn(&JukeboxEvent) -> bool,
{
    let result = tokio::time::timeout(window, async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) => continue,
                Err(_) => std::future::pending::<()>().await,
            }
        }
    })
    .await;
    if let Ok(event) = result {
        panic!("unexpected event: {:?}", event);
    }
}

//! Control surface tests: commands, buttons, voice presence and search selection

mod helpers;

use std::time::Duration;

use helpers::{button, command, pump, track, ConnectMode, FakeTransport, Harness, TEXT, USER, VOICE};
use jukebox_common::{MessageId, UserId, VoiceChannelId};
use jukebox_player::control::search::parse_button_id;
use jukebox_player::control::{Action, Origin, SearchSetId};
use jukebox_player::transport::VoiceTransport;

fn play(query: &str) -> Action {
    Action::Play {
        query: query.to_string(),
    }
}

/// The set id carried by the buttons of the most recent results message
fn last_search_set(h: &Harness) -> SearchSetId {
    let results = h.chat.embeds_titled("Search Results");
    let message = &results.last().expect("no results posted").message;
    parse_button_id(&message.rows[0][0].custom_id)
        .expect("not a search button")
        .0
}

#[tokio::test]
async fn test_play_connects_queues_and_starts() {
    let h = Harness::new();
    h.resolver.add("song a", track("A"));
    let (mut room, _mailbox) = h.room();

    room.dispatch(&command(), play("song a")).await;

    assert_eq!(h.gateway.connect_count(), 1);
    let transport = h.gateway.last_transport().unwrap();
    assert_eq!(transport.play_count(), 1);
    assert!(h.chat.has_text("➕ Queued: **A**"));
    assert_eq!(h.chat.embeds_titled("Now Playing").len(), 1);

    // Second play queues behind the current track on the same connection
    h.resolver.add("song b", track("B"));
    room.dispatch(&command(), play("song b")).await;
    assert_eq!(h.gateway.connect_count(), 1);
    assert_eq!(transport.play_count(), 1);
    assert_eq!(room.session().queue_len(), 1);
}

#[tokio::test]
async fn test_play_requires_voice() {
    let h = Harness::new();
    h.resolver.add("song a", track("A"));
    let (mut room, _mailbox) = h.room();
    let origin = Origin::command(TEXT, USER, None, Some(MessageId(1)));

    room.dispatch(&origin, play("song a")).await;

    assert!(h.chat.has_text("❌ You must be connected to a voice channel."));
    assert_eq!(h.gateway.connect_count(), 0);
    assert!(room.session().has_nothing_to_play());
}

#[tokio::test]
async fn test_play_resolution_failure_is_reported() {
    let h = Harness::new();
    let (mut room, _mailbox) = h.room();

    room.dispatch(&command(), play("nothing matches")).await;

    assert!(h.chat.has_text("❌ Failed to fetch audio: `No results`"));
    assert!(room.session().has_nothing_to_play());
    // Voice joined before resolving; the session itself is untouched
    assert_eq!(h.gateway.last_transport().unwrap().play_count(), 0);
}

#[tokio::test]
async fn test_connect_failure_aborts_action() {
    let h = Harness::new();
    h.resolver.add("song a", track("A"));
    h.gateway.set_mode(ConnectMode::Fail("region unavailable".to_string()));
    let (mut room, _mailbox) = h.room();

    room.dispatch(&command(), play("song a")).await;

    assert!(h
        .chat
        .has_text("❌ Failed to connect to voice channel: `region unavailable`"));
    assert!(room.transport().is_none());
    assert!(room.session().has_nothing_to_play());
}

#[tokio::test(start_paused = true)]
async fn test_connect_timeout_aborts_action() {
    let mut h = Harness::new();
    h.settings.connect_timeout = Duration::from_secs(15);
    h.resolver.add("song a", track("A"));
    h.gateway.set_mode(ConnectMode::Hang);
    let (mut room, _mailbox) = h.room();

    room.dispatch(&command(), play("song a")).await;

    assert!(h.chat.has_text(
        "❌ Timed out connecting to voice. Please try again or check your network/region settings."
    ));
    assert!(room.transport().is_none());
    assert!(room.session().has_nothing_to_play());
}

#[tokio::test]
async fn test_join_moves_existing_connection() {
    let h = Harness::new();
    let (mut room, _mailbox) = h.room();
    let transport = FakeTransport::new(VOICE);
    room.attach_transport(transport.clone());

    let elsewhere = Origin::command(TEXT, USER, Some(VoiceChannelId(99)), Some(MessageId(5)));
    room.dispatch(&elsewhere, Action::Join).await;

    assert_eq!(transport.moves(), vec![VoiceChannelId(99)]);
    assert_eq!(h.gateway.connect_count(), 0);
    assert_eq!(h.chat.reactions(), vec!["✅"]);
}

#[tokio::test]
async fn test_join_then_leave() {
    let h = Harness::new();
    let (mut room, _mailbox) = h.room();

    room.dispatch(&command(), Action::Join).await;
    assert!(room.transport().is_some());

    room.session_mut().enqueue(track("B"));
    room.session_mut().current = Some(track("A"));
    room.dispatch(&command(), Action::Leave).await;

    let transport = h.gateway.last_transport().unwrap();
    assert_eq!(transport.disconnect_count(), 1);
    assert!(room.transport().is_none());
    assert!(room.session().current.is_none());
    assert_eq!(room.session().queue_len(), 1);
    assert_eq!(h.chat.reactions(), vec!["✅", "👋"]);
}

#[tokio::test]
async fn test_volume_command_clamps_percent() {
    let h = Harness::new();
    let (mut room, _mailbox) = h.room();
    assert_eq!(room.session().volume(), 0.5);

    room.dispatch(&command(), Action::SetVolume { percent: 250 }).await;
    assert_eq!(room.session().volume(), 2.0);
    assert!(h.chat.has_text("🔈 Volume set to **200%**"));

    room.dispatch(&command(), Action::SetVolume { percent: -10 }).await;
    assert_eq!(room.session().volume(), 0.0);
    assert!(h.chat.has_text("🔈 Volume set to **0%**"));
}

#[tokio::test]
async fn test_volume_buttons_step_and_apply_live() {
    let h = Harness::new();
    let (mut room, _mailbox) = h.room();
    let transport = FakeTransport::new(VOICE);
    room.attach_transport(transport.clone());

    room.dispatch(&button(), Action::VolumeUp).await;
    room.dispatch(&button(), Action::VolumeUp).await;
    room.dispatch(&button(), Action::VolumeDown).await;

    assert_eq!(room.session().volume(), 0.6);
    assert_eq!(transport.live_volumes(), vec![0.6, 0.7, 0.6]);
    assert!(h.chat.sent().is_empty());
}

#[tokio::test]
async fn test_loop_replies_by_origin() {
    let h = Harness::new();
    let (mut room, _mailbox) = h.room();

    room.dispatch(&command(), Action::ToggleLoop).await;
    assert!(room.session().looping);
    assert!(h.chat.has_text("🔁 Loop is now **ON**"));

    room.dispatch(&button(), Action::ToggleLoop).await;
    assert!(!room.session().looping);
    let sent = h.chat.sent();
    let reply = sent.last().unwrap();
    assert_eq!(reply.text(), Some("Loop is now **OFF**"));
    assert_eq!(reply.message.ephemeral_to, Some(USER));
}

#[tokio::test]
async fn test_queue_listing() {
    let h = Harness::new();
    let (mut room, _mailbox) = h.room();

    room.dispatch(&command(), Action::ShowQueue).await;
    let empty = h.chat.embeds_titled("Up Next");
    assert_eq!(empty[0].message.embed.as_ref().unwrap().description, "Queue is empty.");

    for i in 0..20 {
        room.session_mut().enqueue(track(&format!("T{}", i)));
    }
    room.dispatch(&command(), Action::ShowQueue).await;

    let listing = h.chat.embeds_titled("Up Next");
    let embed = listing[1].message.embed.as_ref().unwrap();
    let lines: Vec<&str> = embed.description.lines().collect();
    assert_eq!(lines.len(), 15);
    assert_eq!(lines[0], "`01` • T0");
    assert_eq!(lines[14], "`15` • T14");
    assert_eq!(embed.footer.as_deref(), Some("Idle • Loop off • Volume 50%"));
}

#[tokio::test]
async fn test_pause_toggle() {
    let h = Harness::new();
    let (mut room, _mailbox) = h.room();
    let transport = FakeTransport::new(VOICE);
    room.attach_transport(transport.clone());
    transport.set_playing(true);

    room.dispatch(&button(), Action::TogglePause).await;
    assert!(transport.is_paused());

    room.dispatch(&button(), Action::TogglePause).await;
    assert!(transport.is_playing());
}

#[tokio::test]
async fn test_shuffle_keeps_entries() {
    let h = Harness::new();
    let (mut room, _mailbox) = h.room();
    for i in 0..30 {
        room.session_mut().enqueue(track(&format!("T{}", i)));
    }

    room.dispatch(&button(), Action::Shuffle).await;

    let mut titles: Vec<String> = room.session().queue().map(|t| t.title.clone()).collect();
    titles.sort();
    let mut expected: Vec<String> = (0..30).map(|i| format!("T{}", i)).collect();
    expected.sort();
    assert_eq!(titles, expected);
}

#[tokio::test]
async fn test_search_select_queues_and_closes_set() {
    let h = Harness::new();
    h.resolver
        .set_search_results(vec![track("A"), track("B"), track("C")]);
    let (mut room, _mailbox) = h.room();

    room.dispatch(&command(), Action::Search { query: "abc".into() }).await;

    let results = h.chat.embeds_titled("Search Results");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].message.rows[0].len(), 3);
    let set = last_search_set(&h);

    room.dispatch(&button(), Action::SearchSelect { set, index: 1 }).await;

    assert!(h.chat.has_text("➕ Queued: **B**"));
    let transport = h.gateway.last_transport().unwrap();
    assert_eq!(transport.played_urls(), vec!["https://cdn.example/B".to_string()]);

    // Buttons removed from the results message
    let edits = h.chat.edits();
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].0, results[0].target);
    assert!(edits[0].1.rows.is_empty());

    // Second pick from the same set is rejected
    room.dispatch(&button(), Action::SearchSelect { set, index: 2 }).await;
    let sent = h.chat.sent();
    let rejection = sent.last().unwrap();
    assert_eq!(rejection.text(), Some("This search has already been used."));
    assert_eq!(rejection.message.ephemeral_to, Some(USER));
    assert_eq!(transport.play_count(), 1);
    assert_eq!(room.session().queue_len(), 0);
}

#[tokio::test]
async fn test_search_select_by_other_user_rejected() {
    let h = Harness::new();
    h.resolver.set_search_results(vec![track("A")]);
    let (mut room, _mailbox) = h.room();

    room.dispatch(&command(), Action::Search { query: "a".into() }).await;
    let set = last_search_set(&h);

    let stranger = Origin::button(TEXT, UserId(77), Some(VOICE), None);
    room.dispatch(&stranger, Action::SearchSelect { set, index: 0 }).await;
    assert!(h
        .chat
        .has_text("Only the requester can choose from these results."));
    assert!(room.session().has_nothing_to_play());

    // Out-of-range pick by the owner keeps the set open
    room.dispatch(&button(), Action::SearchSelect { set, index: 5 }).await;
    assert!(h.chat.has_text("No such result."));
    room.dispatch(&button(), Action::SearchSelect { set, index: 0 }).await;
    assert!(h.chat.has_text("➕ Queued: **A**"));
}

#[tokio::test]
async fn test_search_without_results() {
    let h = Harness::new();
    let (mut room, _mailbox) = h.room();

    room.dispatch(&command(), Action::Search { query: "zzz".into() }).await;

    assert!(h.chat.has_text("❌ No results found or network error."));
    assert!(h.chat.embeds_titled("Search Results").is_empty());
    assert!(room.is_idle());
}

#[tokio::test]
async fn test_search_results_are_limited() {
    let mut h = Harness::new();
    h.settings.search_limit = 7;
    h.resolver
        .set_search_results((0..12).map(|i| track(&format!("T{}", i))).collect());
    let (mut room, _mailbox) = h.room();

    room.dispatch(&command(), Action::Search { query: "t".into() }).await;

    let results = h.chat.embeds_titled("Search Results");
    let message = &results[0].message;
    assert_eq!(message.embed.as_ref().unwrap().description.lines().count(), 7);
    assert_eq!(message.rows.len(), 2);
    assert_eq!(message.rows[1].len(), 2);
    assert!(!room.is_idle());
}

#[tokio::test]
async fn test_unknown_search_set_reports_expired() {
    let h = Harness::new();
    let (mut room, _mailbox) = h.room();
    let set = SearchSetId::new();

    room.dispatch(&button(), Action::SearchSelect { set, index: 0 }).await;

    assert!(h.chat.has_text("This search has expired."));
}

#[tokio::test]
async fn test_skip_button_while_paused_advances() {
    let h = Harness::new();
    h.resolver.add("a", track("A"));
    h.resolver.add("b", track("B"));
    let (mut room, mut mailbox) = h.room();
    room.dispatch(&command(), play("a")).await;
    room.dispatch(&command(), play("b")).await;
    let transport = h.gateway.last_transport().unwrap();

    room.dispatch(&button(), Action::TogglePause).await;
    room.dispatch(&button(), Action::Skip).await;
    pump(&mut room, &mut mailbox).await;

    assert_eq!(
        room.session().current.as_ref().map(|t| t.title.as_str()),
        Some("B")
    );
    assert!(transport.is_playing());
}

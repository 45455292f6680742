//! Local process voice transport
//!
//! "Voice" here is the host's audio output: each stream is a player process
//! (ffplay by default). A named wait thread polls the child and, once it exits
//! for any reason, reports completion through the blocking bridge. The
//! player's stderr is drained on its own thread while it runs, keeping the
//! last line for error reports. Pause and resume send SIGSTOP/SIGCONT on Unix.

use std::io::{BufRead, BufReader, Read};
use std::process::{Child, ChildStderr, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use jukebox_common::{RoomId, VoiceChannelId};

use crate::error::{Error, Result};
use crate::playback::{AudioSource, CompletionHandle};
use crate::transport::{VoiceGateway, VoiceTransport};

/// How often the wait thread polls the player process
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Opens a [`ProcessTransport`] per room
#[derive(Debug, Clone)]
pub struct LocalVoiceGateway {
    player_command: String,
}

impl LocalVoiceGateway {
    pub fn new(player_command: impl Into<String>) -> Self {
        Self {
            player_command: player_command.into(),
        }
    }
}

#[async_trait]
impl VoiceGateway for LocalVoiceGateway {
    async fn connect(&self, room: RoomId, channel: VoiceChannelId) -> Result<Arc<dyn VoiceTransport>> {
        info!("Room {} opening local output for voice channel {}", room, channel);
        Ok(Arc::new(ProcessTransport::new(room, channel, self.player_command.clone())))
    }
}

/// One running player process
struct PlayerSlot {
    child: Mutex<Child>,
    pid: u32,
    stopped: AtomicBool,
    paused: AtomicBool,
    finished: AtomicBool,
}

impl PlayerSlot {
    fn is_live(&self) -> bool {
        !self.finished.load(Ordering::Acquire) && !self.stopped.load(Ordering::Acquire)
    }

    fn kill(&self) {
        self.stopped.store(true, Ordering::Release);
        let mut child = self.child.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = child.kill() {
            debug!("Player {} already gone: {}", self.pid, e);
        }
    }

    /// Poll until the child exits; the error text for an abnormal exit
    fn wait(&self, command: &str, stderr: Option<thread::JoinHandle<String>>) -> Option<String> {
        loop {
            {
                let mut child = self.child.lock().unwrap_or_else(PoisonError::into_inner);
                match child.try_wait() {
                    Ok(Some(status)) => {
                        if status.success() || self.stopped.load(Ordering::Acquire) {
                            return None;
                        }
                        let detail = stderr.and_then(|h| h.join().ok()).unwrap_or_default();
                        return Some(if detail.is_empty() {
                            format!("{} exited with {}", command, status)
                        } else {
                            format!("{} exited with {}: {}", command, status, detail)
                        });
                    }
                    Ok(None) => {}
                    Err(e) => return Some(format!("waiting for {} failed: {}", command, e)),
                }
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Job-control signal for a running player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayerSignal {
    Suspend,
    Resume,
}

impl PlayerSignal {
    /// Deliver to `pid`; false when the signal was not sent
    #[cfg(unix)]
    fn send(self, pid: u32) -> bool {
        let signo = match self {
            PlayerSignal::Suspend => libc::SIGSTOP,
            PlayerSignal::Resume => libc::SIGCONT,
        };
        let Ok(target) = libc::pid_t::try_from(pid) else {
            warn!("Player pid {} out of range for {:?}", pid, self);
            return false;
        };

        // SAFETY: kill(2) takes plain integers and reads no memory of ours
        if unsafe { libc::kill(target, signo) } == 0 {
            true
        } else {
            warn!(
                "Could not send {:?} to player {}: {}",
                self,
                pid,
                std::io::Error::last_os_error()
            );
            false
        }
    }

    #[cfg(not(unix))]
    fn send(self, pid: u32) -> bool {
        warn!("Cannot send {:?} to player {} on this platform", self, pid);
        false
    }
}

/// Read `reader` to its end, keeping the last non-empty line
fn last_line<R: Read>(reader: R) -> String {
    let mut last = String::new();
    for chunk in BufReader::new(reader).split(b'\n') {
        let Ok(chunk) = chunk else { break };
        let line = String::from_utf8_lossy(&chunk);
        let line = line.trim();
        if !line.is_empty() {
            last = line.to_string();
        }
    }
    last
}

fn spawn_stderr_drain(room: RoomId, pipe: ChildStderr) -> std::io::Result<thread::JoinHandle<String>> {
    thread::Builder::new()
        .name(format!("player-{}-stderr", room))
        .spawn(move || last_line(pipe))
}

/// Plays one source at a time through a local player process
pub struct ProcessTransport {
    room: RoomId,
    channel: Mutex<VoiceChannelId>,
    player_command: String,
    active: Mutex<Option<Arc<PlayerSlot>>>,
}

impl ProcessTransport {
    pub fn new(room: RoomId, channel: VoiceChannelId, player_command: String) -> Self {
        Self {
            room,
            channel: Mutex::new(channel),
            player_command,
            active: Mutex::new(None),
        }
    }

    fn slot(&self) -> Option<Arc<PlayerSlot>> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Arguments for the player; volume maps 0.0-1.0 onto 0-100
    fn player_args(source: &AudioSource) -> Vec<String> {
        let volume = (source.volume * 100.0).round().clamp(0.0, 100.0) as u32;
        let mut args: Vec<String> = ["-nodisp", "-autoexit", "-loglevel", "error", "-volume"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        args.push(volume.to_string());
        // ffplay has no -nostdin; the reconnect flags apply to its input as-is
        args.extend(
            source
                .before_options
                .split_whitespace()
                .filter(|opt| *opt != "-nostdin")
                .map(str::to_string),
        );
        args.push(source.url.clone());
        args
    }
}

#[async_trait]
impl VoiceTransport for ProcessTransport {
    fn channel(&self) -> VoiceChannelId {
        *self.channel.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn move_to(&self, channel: VoiceChannelId) -> Result<()> {
        *self.channel.lock().unwrap_or_else(PoisonError::into_inner) = channel;
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let slot = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(slot) = slot {
            slot.kill();
        }
        debug!("Room {} local output closed", self.room);
        Ok(())
    }

    fn play(&self, source: AudioSource, on_complete: CompletionHandle) -> Result<()> {
        if self.slot().map(|s| s.is_live()).unwrap_or(false) {
            return Err(Error::Source("player is already streaming".to_string()));
        }

        let mut child = Command::new(&self.player_command)
            .args(Self::player_args(&source))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Source(format!("could not start {}: {}", self.player_command, e)))?;

        let stderr = match child
            .stderr
            .take()
            .map(|pipe| spawn_stderr_drain(self.room, pipe))
            .transpose()
        {
            Ok(stderr) => stderr,
            Err(e) => {
                if let Err(kill_err) = child.kill() {
                    debug!("Player {} already gone: {}", child.id(), kill_err);
                }
                let _ = child.wait();
                return Err(Error::Source(format!("could not start stderr reader: {}", e)));
            }
        };

        let slot = Arc::new(PlayerSlot {
            pid: child.id(),
            child: Mutex::new(child),
            stopped: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            finished: AtomicBool::new(false),
        });

        let waiter = Arc::clone(&slot);
        let command = self.player_command.clone();
        let spawned = thread::Builder::new()
            .name(format!("player-{}", self.room))
            .spawn(move || {
                let error = waiter.wait(&command, stderr);
                waiter.finished.store(true, Ordering::Release);
                on_complete.notify_blocking(error);
            });

        if let Err(e) = spawned {
            slot.kill();
            return Err(Error::Source(format!("could not start wait thread: {}", e)));
        }

        debug!("Room {} player started (pid {})", self.room, slot.pid);
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = Some(slot);
        Ok(())
    }

    fn pause(&self) {
        if let Some(slot) = self.slot().filter(|s| s.is_live()) {
            if PlayerSignal::Suspend.send(slot.pid) {
                slot.paused.store(true, Ordering::Release);
            }
        }
    }

    fn resume(&self) {
        if let Some(slot) = self.slot().filter(|s| s.is_live()) {
            if PlayerSignal::Resume.send(slot.pid) {
                slot.paused.store(false, Ordering::Release);
            }
        }
    }

    fn stop(&self) {
        if let Some(slot) = self.slot() {
            slot.kill();
        }
    }

    fn is_playing(&self) -> bool {
        self.slot()
            .map(|s| s.is_live() && !s.paused.load(Ordering::Acquire))
            .unwrap_or(false)
    }

    fn is_paused(&self) -> bool {
        self.slot()
            .map(|s| s.is_live() && s.paused.load(Ordering::Acquire))
            .unwrap_or(false)
    }

    fn set_volume(&self, _volume: f32) -> bool {
        // The player takes its volume at start only
        false
    }
}

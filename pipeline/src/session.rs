//! Client-side capture state, handed to the pipeline as data.

use std::fmt;
use std::path::{Path, PathBuf};

use melodeez_audio::decode::decode_file;
use melodeez_audio::{AudioClip, AudioError, ClipBounds};

use crate::error::SessionError;

/// Where a client session currently is.
///
/// ```text
/// Idle -> Recording -> Stopped --\
///   \                             +-> Ready
///    \-> Uploaded ---------------/
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
    Stopped,
    Uploaded,
    Ready,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::Idle => "idle",
            SessionState::Recording => "recording",
            SessionState::Stopped => "stopped",
            SessionState::Uploaded => "uploaded",
            SessionState::Ready => "ready",
        })
    }
}

/// The audio a session will submit.
#[derive(Debug, Clone)]
pub enum QueryAudio {
    /// A finished recording, already trimmed to the maximum length.
    Recording(AudioClip),
    /// An uploaded file whose duration was checked.
    Upload(PathBuf),
}

/// Recording/upload flow of one client.
///
/// Recordings shorter than the minimum are rejected; longer ones are
/// trimmed to the maximum. Uploads outside the bounds are rejected.
#[derive(Debug)]
pub struct ClientSession {
    bounds: ClipBounds,
    state: SessionState,
    query: Option<QueryAudio>,
}

impl ClientSession {
    pub fn new(bounds: ClipBounds) -> Self {
        Self {
            bounds,
            state: SessionState::Idle,
            query: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn bounds(&self) -> ClipBounds {
        self.bounds
    }

    /// The captured query, once recording stopped or an upload was accepted.
    pub fn query(&self) -> Option<&QueryAudio> {
        self.query.as_ref()
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidAction {
            action,
            state: self.state,
        }
    }

    /// Starts a new recording, discarding any earlier capture.
    pub fn start_recording(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Recording {
            return Err(self.invalid("start recording"));
        }
        self.query = None;
        self.state = SessionState::Recording;
        Ok(())
    }

    /// Finishes the recording with the captured audio.
    ///
    /// Too-short audio returns the session to `Idle` with
    /// [`AudioError::DurationOutOfBounds`].
    pub fn stop_recording(&mut self, clip: AudioClip) -> Result<(), SessionError> {
        if self.state != SessionState::Recording {
            return Err(self.invalid("stop recording"));
        }
        let duration = clip.duration();
        if duration < self.bounds.min {
            self.state = SessionState::Idle;
            return Err(AudioError::DurationOutOfBounds {
                got: duration,
                min: self.bounds.min,
                max: self.bounds.max,
            }
            .into());
        }
        let clip = if duration > self.bounds.max {
            clip.truncated(self.bounds.max)
        } else {
            clip
        };
        self.query = Some(QueryAudio::Recording(clip));
        self.state = SessionState::Stopped;
        Ok(())
    }

    /// Accepts an uploaded file after checking its duration.
    pub fn upload(&mut self, path: &Path) -> Result<(), SessionError> {
        if self.state == SessionState::Recording {
            return Err(self.invalid("upload"));
        }
        let clip = decode_file(path)?;
        self.bounds.check(clip.duration())?;
        self.query = Some(QueryAudio::Upload(path.to_path_buf()));
        self.state = SessionState::Uploaded;
        Ok(())
    }

    /// Marks the captured query as ready to submit.
    pub fn confirm(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Stopped | SessionState::Uploaded => {
                self.state = SessionState::Ready;
                Ok(())
            }
            _ => Err(self.invalid("confirm")),
        }
    }

    /// Returns to `Idle`, dropping any capture.
    pub fn reset(&mut self) {
        self.query = None;
        self.state = SessionState::Idle;
    }
}

//! Asynchronous per-body texture loading.
//!
//! Each request runs on its own worker thread: fetch the bytes from a
//! [TextureSource], decode them all the way to RGBA pixels, then post the
//! outcome to a channel. The scene drains that channel once per
//! tick, so completions behave like interrupts that land between frames.
//!
//! Completions that arrive after the scene has been torn down are dropped on
//! the floor. The [Liveness] flag is checked before anything is posted, and
//! again by the scene before it touches a material.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use thiserror::Error;
use tracing::debug;

use crate::model::BodyID;
use crate::render::TextureImage;

pub mod source;

pub use source::{DirectorySource, MemorySource, TextureSource};

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("no texture for {name} at {path}")]
    NotFound { name: String, path: String },
    #[error("could not read texture for {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("could not decode texture for {name}: {reason}")]
    Decode { name: String, reason: String },
    #[error("no loader worker available for {0}")]
    Unavailable(String),
}

/// Where a body's texture is in its lifecycle. Moves out of `Pending`
/// exactly once and never goes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureState {
    Pending,
    Loaded,
    Failed,
}

/// Shared "is the scene still around" flag.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn new() -> Self {
        Liveness(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn kill(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct TextureEvent {
    pub body: BodyID,
    pub result: Result<TextureImage, TextureError>,
}

/// The sending half of the loader: where completions go. Cloneable, and
/// safe to use from any thread.
#[derive(Debug, Clone)]
pub struct TextureSink {
    sender: Sender<TextureEvent>,
    liveness: Liveness,
}

impl TextureSink {
    /// Posts a completion. Returns whether it was accepted; it isn't once
    /// the scene is gone.
    pub fn complete(&self, event: TextureEvent) -> bool {
        if !self.liveness.is_alive() {
            debug!("dropping texture completion for {}: scene is gone", event.body);
            return false;
        }
        self.sender.send(event).is_ok()
    }
}

pub struct TextureLoader {
    source: Arc<dyn TextureSource>,
    sink: TextureSink,
    receiver: Receiver<TextureEvent>,
}

impl TextureLoader {
    pub fn new(source: Arc<dyn TextureSource>, liveness: Liveness) -> Self {
        let (sender, receiver) = mpsc::channel();
        TextureLoader {
            source,
            sink: TextureSink { sender, liveness },
            receiver,
        }
    }

    pub fn sink(&self) -> TextureSink {
        self.sink.clone()
    }

    /// Starts loading the texture called `name` for `body`. Returns
    /// immediately; the outcome shows up in [TextureLoader::drain] later.
    pub fn request(&self, body: BodyID, name: &str) {
        let source = Arc::clone(&self.source);
        let sink = self.sink.clone();
        let owned_name = name.to_owned();

        let spawned = thread::Builder::new()
            .name(format!("texture-{}", name))
            .spawn(move || {
                let result = fetch_and_decode(source.as_ref(), &owned_name);
                sink.complete(TextureEvent { body, result });
            });

        if let Err(err) = spawned {
            debug!("could not spawn texture worker for {}: {}", name, err);
            self.sink.complete(TextureEvent {
                body,
                result: Err(TextureError::Unavailable(name.to_owned())),
            });
        }
    }

    /// Every completion that has arrived since the last call.
    pub fn drain(&self) -> Vec<TextureEvent> {
        self.receiver.try_iter().collect()
    }
}

pub fn fetch_and_decode(source: &dyn TextureSource, name: &str) -> Result<TextureImage, TextureError> {
    let encoded = source.fetch(name)?;
    let decoded = image::load_from_memory(&encoded).map_err(|err| TextureError::Decode {
        name: name.to_owned(),
        reason: err.to_string(),
    })?;

    Ok(TextureImage::from_rgba(name, decoded.into_rgba8()))
}

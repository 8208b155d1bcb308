use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Instant,
};

use crate::{
    config::SyncSettings,
    error::Result,
    message_queue::MessageQueue,
    scene::SceneTree,
    session_id::SessionId,
    sync::{synchronize, SyncOptions, SyncOutput},
};

/// What one [`LiveSession::poll`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Polled {
    /// The tree had not been rendered yet, so this is the complete document.
    Full(Arc<String>),

    /// An update document was queued at `cursor`.
    Update { cursor: u32, markup: Arc<String> },

    Unchanged,
}

/// Contains all of the state for serving one live scene to a viewer.
///
/// Nothing here is specific to a transport. A server would call `poll`
/// whenever the viewer's network link refreshes and hand back the markup,
/// while a file-based transport would do the same on a timer.
pub struct LiveSession {
    /// When the session was started. Used only for user-facing diagnostics.
    start_time: Instant,

    /// A randomly generated ID for this session. A transport uses it to
    /// notice that it is talking to a new session whose viewer state starts
    /// from scratch.
    session_id: SessionId,

    settings: SyncSettings,

    /// The scene being served. Client code mutates it between polls through
    /// `tree` or `tree_handle`.
    tree: Arc<Mutex<SceneTree>>,

    /// Rendered update documents, in the order they were produced.
    ///
    /// Documents stay in the queue until acknowledged, so a transport that
    /// failed to deliver one can replay it instead of forcing a reload.
    message_queue: Arc<MessageQueue<Arc<String>>>,
}

impl LiveSession {
    /// Starts serving `tree`. The tree options from `settings` replace the
    /// ones the tree was built with.
    pub fn new(mut tree: SceneTree, settings: SyncSettings) -> Self {
        tree.set_options(settings.tree);

        let session_id = SessionId::new();
        log::trace!("Starting live session {}", session_id);

        LiveSession {
            start_time: Instant::now(),
            session_id,
            settings,
            tree: Arc::new(Mutex::new(tree)),
            message_queue: Arc::new(MessageQueue::new()),
        }
    }

    pub fn tree_handle(&self) -> Arc<Mutex<SceneTree>> {
        Arc::clone(&self.tree)
    }

    pub fn tree(&self) -> MutexGuard<'_, SceneTree> {
        self.tree.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn message_queue(&self) -> &MessageQueue<Arc<String>> {
        &self.message_queue
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Runs one synchronization cycle. The tree stays locked from the start
    /// of the walk until its dirty state has been reset.
    pub fn poll(&self) -> Result<Polled> {
        let output = {
            let mut tree = self.tree();
            synchronize(&mut tree, &SyncOptions::from(&self.settings))?
        };

        match output {
            SyncOutput::Full(document) => {
                let markup = document.to_markup(&self.settings)?;
                self.message_queue.acknowledge(self.message_queue.cursor());

                Ok(Polled::Full(Arc::new(markup)))
            }
            SyncOutput::Update(document) if document.is_empty() => Ok(Polled::Unchanged),
            SyncOutput::Update(document) => {
                let markup = Arc::new(document.to_markup(&self.settings)?);
                self.message_queue.push_messages(&[Arc::clone(&markup)]);

                let cursor = self.message_queue.cursor();
                log::debug!(
                    "Queued update {} with {} instructions",
                    cursor,
                    document.instructions.len()
                );

                Ok(Polled::Update { cursor, markup })
            }
        }
    }

    /// Renders the complete document and makes it the new baseline. Queued
    /// updates are dropped, since a viewer that reloads has no use for them.
    pub fn full_document(&self) -> Result<Arc<String>> {
        let output = {
            let mut tree = self.tree();
            tree.force_full_resync();
            synchronize(&mut tree, &SyncOptions::from(&self.settings))?
        };

        self.message_queue.acknowledge(self.message_queue.cursor());

        Ok(Arc::new(output.to_markup(&self.settings)?))
    }
}

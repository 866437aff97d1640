//! Application lifecycle: upload screen, editing, completion.
//!
//! The app is either waiting for an upload or editing one image. Two steps
//! are asynchronous in the browser (decoding the picked file and encoding
//! plus downloading the export), so both are guarded:
//!
//! - every load gets a [`LoadTicket`] with a generation number, and a
//!   completion for anything but the newest generation is discarded
//! - only one export may be in flight; a second request gets `None`
//!
//! The image's backing resource (an object URL in the browser) is released
//! exactly once: on cancel, after the export completes, or when a newer load
//! supersedes it. [`ImageResource::release`] takes `self`, so a resource
//! cannot be released twice.

use crate::config::EditorConfig;
use crate::decode::DecodedImage;
use crate::editor::{EditorSession, ImageId};

/// Something that must be freed when the image is no longer shown.
pub trait ImageResource {
    fn release(self);
}

/// Proof that a load was started; hand it back to finish or fail the load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Rebuild a ticket from a generation handed across an FFI boundary.
    pub fn from_generation(generation: u64) -> Self {
        Self { generation }
    }
}

/// Proof that an export was started for a particular session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportTicket {
    generation: u64,
}

impl ExportTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn from_generation(generation: u64) -> Self {
        Self { generation }
    }
}

/// Which screen the app shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Upload,
    Editing,
}

struct Session<R> {
    generation: u64,
    resource: R,
    editor: EditorSession,
}

/// Upload/edit state machine, generic over the image resource type.
pub struct App<R: ImageResource> {
    config: EditorConfig,
    generation: u64,
    pending: Option<(u64, R)>,
    session: Option<Session<R>>,
    export_in_flight: bool,
}

impl<R: ImageResource> Default for App<R> {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl<R: ImageResource> App<R> {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            generation: 0,
            pending: None,
            session: None,
            export_in_flight: false,
        }
    }

    pub fn screen(&self) -> Screen {
        if self.session.is_some() {
            Screen::Editing
        } else {
            Screen::Upload
        }
    }

    pub fn editor(&self) -> Option<&EditorSession> {
        self.session.as_ref().map(|s| &s.editor)
    }

    pub fn editor_mut(&mut self) -> Option<&mut EditorSession> {
        self.session.as_mut().map(|s| &mut s.editor)
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_exporting(&self) -> bool {
        self.export_in_flight
    }

    /// Start loading an image backed by `resource`.
    ///
    /// A load that is still pending is superseded and its resource released.
    pub fn begin_load(&mut self, resource: R) -> LoadTicket {
        self.generation += 1;
        if let Some((stale, old)) = self.pending.replace((self.generation, resource)) {
            log::warn!("load {} superseded by load {}", stale, self.generation);
            old.release();
        }
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Finish a load with the decoded image.
    ///
    /// Returns false (and drops `image`) if the ticket is stale. Otherwise the
    /// image is shown: a fresh editor is created for the container size, or
    /// the running editor switches images and re-initializes its framing.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        image: DecodedImage,
        container_width: f64,
        container_height: f64,
    ) -> bool {
        let Some(resource) = self.take_pending(ticket) else {
            log::warn!("discarding stale load {}", ticket.generation);
            return false;
        };
        let id = ImageId(ticket.generation);

        match self.session.as_mut() {
            Some(session) => {
                let old = std::mem::replace(&mut session.resource, resource);
                old.release();
                session.generation = ticket.generation;
                session.editor.attach_image(image, id);
                self.export_in_flight = false;
            }
            None => {
                let mut editor =
                    EditorSession::new(self.config.clone(), container_width, container_height);
                editor.attach_image(image, id);
                self.session = Some(Session {
                    generation: ticket.generation,
                    resource,
                    editor,
                });
            }
        }
        log::info!("image {} ready for editing", ticket.generation);
        true
    }

    /// Abandon a load whose decode failed; releases its resource.
    ///
    /// Returns false if the ticket is stale.
    pub fn fail_load(&mut self, ticket: LoadTicket) -> bool {
        match self.take_pending(ticket) {
            Some(resource) => {
                log::warn!("load {} failed", ticket.generation);
                resource.release();
                true
            }
            None => false,
        }
    }

    fn take_pending(&mut self, ticket: LoadTicket) -> Option<R> {
        match &self.pending {
            Some((generation, _)) if *generation == ticket.generation => {
                self.pending.take().map(|(_, resource)| resource)
            }
            _ => None,
        }
    }

    /// Reserve the export slot. `None` when not editing or already exporting.
    pub fn begin_export(&mut self) -> Option<ExportTicket> {
        let session = self.session.as_ref()?;
        if self.export_in_flight {
            log::warn!("export already in flight");
            return None;
        }
        self.export_in_flight = true;
        Some(ExportTicket {
            generation: session.generation,
        })
    }

    /// Mark an export as downloaded and end the session.
    ///
    /// Returns false if the session the ticket belongs to is already gone.
    pub fn finish_export(&mut self, ticket: ExportTicket) -> bool {
        match &self.session {
            Some(session) if session.generation == ticket.generation && self.export_in_flight => {
                self.complete();
                true
            }
            _ => {
                log::warn!("discarding stale export {}", ticket.generation);
                false
            }
        }
    }

    /// Give the export slot back without ending the session (encode failed).
    pub fn abort_export(&mut self, ticket: ExportTicket) {
        if let Some(session) = &self.session {
            if session.generation == ticket.generation {
                self.export_in_flight = false;
            }
        }
    }

    /// Leave the editor and return to the upload screen.
    ///
    /// Used for both cancel and post-download completion. Any pending load is
    /// cancelled too, and its completion will be discarded.
    pub fn complete(&mut self) {
        self.generation += 1;
        if let Some((_, resource)) = self.pending.take() {
            resource.release();
        }
        if let Some(session) = self.session.take() {
            log::info!("session {} complete", session.generation);
            session.resource.release();
        }
        self.export_in_flight = false;
    }
}

impl<R: ImageResource> Drop for App<R> {
    fn drop(&mut self) {
        if let Some((_, resource)) = self.pending.take() {
            resource.release();
        }
        if let Some(session) = self.session.take() {
            session.resource.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every release into a shared log.
    struct Tracked {
        name: &'static str,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl ImageResource for Tracked {
        fn release(self) {
            self.log.borrow_mut().push(self.name);
        }
    }

    fn tracked(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> Tracked {
        Tracked {
            name,
            log: Rc::clone(log),
        }
    }

    fn image() -> DecodedImage {
        DecodedImage::solid(80, 60, [10, 10, 10, 255])
    }

    #[test]
    fn test_starts_on_upload_screen() {
        let app: App<Tracked> = App::default();
        assert_eq!(app.screen(), Screen::Upload);
        assert!(app.editor().is_none());
    }

    #[test]
    fn test_load_then_edit() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut app = App::default();
        let ticket = app.begin_load(tracked(&log, "a"));
        assert!(app.is_loading());
        assert!(app.finish_load(ticket, image(), 70.0, 40.0));
        assert_eq!(app.screen(), Screen::Editing);
        assert!(!app.is_loading());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_superseded_load_is_discarded_and_released() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut app = App::default();
        let first = app.begin_load(tracked(&log, "a"));
        let second = app.begin_load(tracked(&log, "b"));
        assert_eq!(*log.borrow(), vec!["a"]);

        assert!(!app.finish_load(first, image(), 70.0, 40.0));
        assert_eq!(app.screen(), Screen::Upload);
        assert!(app.finish_load(second, image(), 70.0, 40.0));
        assert_eq!(app.screen(), Screen::Editing);
        assert_eq!(*log.borrow(), vec!["a"]);
    }

    #[test]
    fn test_failed_load_releases() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut app = App::default();
        let ticket = app.begin_load(tracked(&log, "a"));
        assert!(app.fail_load(ticket));
        assert!(!app.fail_load(ticket));
        assert_eq!(*log.borrow(), vec!["a"]);
        assert_eq!(app.screen(), Screen::Upload);
    }

    #[test]
    fn test_cancel_releases_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut app = App::default();
        let ticket = app.begin_load(tracked(&log, "a"));
        app.finish_load(ticket, image(), 70.0, 40.0);
        app.complete();
        app.complete();
        assert_eq!(*log.borrow(), vec!["a"]);
        assert_eq!(app.screen(), Screen::Upload);
    }

    #[test]
    fn test_export_is_single_flight() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut app = App::default();
        let ticket = app.begin_load(tracked(&log, "a"));
        app.finish_load(ticket, image(), 70.0, 40.0);

        let export = app.begin_export().unwrap();
        assert!(app.begin_export().is_none());
        assert!(app.finish_export(export));
        assert!(!app.finish_export(export));
        assert_eq!(*log.borrow(), vec!["a"]);
        assert_eq!(app.screen(), Screen::Upload);
    }

    #[test]
    fn test_aborted_export_frees_slot() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut app = App::default();
        let ticket = app.begin_load(tracked(&log, "a"));
        app.finish_load(ticket, image(), 70.0, 40.0);

        let export = app.begin_export().unwrap();
        app.abort_export(export);
        assert!(!app.is_exporting());
        assert!(app.begin_export().is_some());
        assert_eq!(app.screen(), Screen::Editing);
    }

    #[test]
    fn test_export_without_session() {
        let mut app: App<Tracked> = App::default();
        assert!(app.begin_export().is_none());
    }

    #[test]
    fn test_cancel_during_load_discards_completion() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut app = App::default();
        let ticket = app.begin_load(tracked(&log, "a"));
        app.complete();
        assert_eq!(*log.borrow(), vec!["a"]);
        assert!(!app.finish_load(ticket, image(), 70.0, 40.0));
        assert_eq!(app.screen(), Screen::Upload);
    }

    #[test]
    fn test_second_image_in_live_session() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut app = App::default();
        let first = app.begin_load(tracked(&log, "a"));
        app.finish_load(first, image(), 700.0, 400.0);
        app.editor_mut()
            .unwrap()
            .handle(crate::editor::EditorEvent::Wheel { delta_y: -500.0 });

        let second = app.begin_load(tracked(&log, "b"));
        assert!(app.finish_load(second, DecodedImage::solid(400, 400, [0, 0, 0, 255]), 700.0, 400.0));
        assert_eq!(*log.borrow(), vec!["a"]);
        // Framing re-initialized for the new image: max(630/400, 270/400)
        let scale = app.editor().unwrap().transform().scale;
        assert!((scale - 1.575).abs() < 1e-9);
    }

    #[test]
    fn test_drop_releases_everything() {
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let mut app = App::default();
            let ticket = app.begin_load(tracked(&log, "a"));
            app.finish_load(ticket, image(), 70.0, 40.0);
            app.begin_load(tracked(&log, "b"));
        }
        let mut released = log.borrow().clone();
        released.sort_unstable();
        assert_eq!(released, vec!["a", "b"]);
    }
}

//! Cropper session state machine.
//!
//! ```text
//! Idle ──select──▶ Previewing ──adjust──▶ Cropping
//! Previewing | Cropping | Error ──confirm──▶ Processing
//! Processing ──ok──▶ Idle (cropped image set)
//! Processing ──err──▶ Error
//! Previewing | Cropping | Error ──cancel──▶ Idle
//! any ──reset──▶ Idle
//! ```
//!
//! [`transition`] is a pure function over [`SessionSnapshot`]. The
//! [`CropperSession`] owner drives it, validates files before they are read
//! and hands out at most one [`CropJob`] at a time.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compress::{compress_image, CompressedFile, CompressionOptions};
use crate::config::{ConfigError, CropperConfig};
use crate::dataurl::{decode_data_url, encode_data_url, ReadError};
use crate::decode::decode_image;
use crate::error::CropperError;
use crate::render::{render_decoded, CropRegion, RenderRequest};
use crate::validate::{validate_file, FileHandle};

/// Smallest zoom the cropper allows.
pub const MIN_ZOOM: f64 = 1.0;
/// Largest zoom the cropper allows.
pub const MAX_ZOOM: f64 = 3.0;

/// Mode of the upload/crop control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CropperSessionState {
    #[default]
    Idle,
    Previewing,
    Cropping,
    Processing,
    Error,
}

impl CropperSessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CropperSessionState::Idle => "idle",
            CropperSessionState::Previewing => "previewing",
            CropperSessionState::Cropping => "cropping",
            CropperSessionState::Processing => "processing",
            CropperSessionState::Error => "error",
        }
    }

    /// Whether the crop modal is open in this state.
    pub fn shows_cropper(&self) -> bool {
        !matches!(self, CropperSessionState::Idle)
    }
}

impl fmt::Display for CropperSessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The file the user picked, as bytes and as a data URL.
///
/// Bytes are shared so a [`CropJob`] can hold the source without copying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub name: String,
    pub mime_type: String,
    bytes: Arc<[u8]>,
    data_url: String,
}

impl SourceImage {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        let mime_type = mime_type.into();
        let data_url = encode_data_url(&mime_type, &bytes);
        Self {
            name: name.into(),
            mime_type,
            bytes: bytes.into(),
            data_url,
        }
    }

    /// Rebuild a source from a data URL produced by a file read.
    pub fn from_data_url(name: impl Into<String>, url: &str) -> Result<Self, ReadError> {
        let parsed = decode_data_url(url)?;
        Ok(Self {
            name: name.into(),
            mime_type: parsed.mime_type,
            bytes: parsed.bytes.into(),
            data_url: url.trim().to_string(),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }
}

/// Pan/zoom/rotate state reported by the crop modal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropAdjustment {
    /// Selected area in source pixels.
    pub region: CropRegion,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    #[serde(default)]
    pub rotation_degrees: f64,
}

fn default_zoom() -> f64 {
    MIN_ZOOM
}

impl CropAdjustment {
    pub fn new(region: CropRegion, zoom: f64, rotation_degrees: f64) -> Self {
        Self {
            region,
            zoom,
            rotation_degrees,
        }
        .clamped()
    }

    /// Zoom limited to `[1, 3]`, rotation to `[0, 360]`.
    pub fn clamped(self) -> Self {
        let zoom = if self.zoom.is_finite() {
            self.zoom.clamp(MIN_ZOOM, MAX_ZOOM)
        } else {
            MIN_ZOOM
        };
        let rotation_degrees = if self.rotation_degrees.is_finite() {
            self.rotation_degrees.clamp(0.0, 360.0)
        } else {
            0.0
        };
        Self {
            region: self.region,
            zoom,
            rotation_degrees,
        }
    }
}

/// Result of a successful crop: preview data URL plus the file to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropOutput {
    pub data_url: String,
    pub file: CompressedFile,
}

/// Everything the upload control shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    pub state: CropperSessionState,
    pub original_image: Option<SourceImage>,
    pub adjustment: Option<CropAdjustment>,
    pub cropped_image: Option<String>,
    pub image_file: Option<CompressedFile>,
    pub error: Option<String>,
}

impl SessionSnapshot {
    pub fn show_cropper(&self) -> bool {
        self.state.shows_cropper()
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    FileLoaded(SourceImage),
    ReadFailed(String),
    Adjust(CropAdjustment),
    Confirm,
    ProcessingSucceeded(CropOutput),
    ProcessingFailed(String),
    Cancel,
    Reset,
    ClearCroppedImage,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::FileLoaded(_) => "load a file",
            SessionEvent::ReadFailed(_) => "report a read failure",
            SessionEvent::Adjust(_) => "adjust the crop",
            SessionEvent::Confirm => "confirm the crop",
            SessionEvent::ProcessingSucceeded(_) => "complete processing",
            SessionEvent::ProcessingFailed(_) => "fail processing",
            SessionEvent::Cancel => "cancel",
            SessionEvent::Reset => "reset",
            SessionEvent::ClearCroppedImage => "clear the cropped image",
        }
    }
}

/// Rejected session input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("A crop is already being processed")]
    Busy,

    #[error("Cannot {event} while {state}")]
    InvalidTransition {
        state: CropperSessionState,
        event: &'static str,
    },

    #[error("Crop job {0} is no longer current")]
    StaleJob(u64),

    #[error("File read {0} is no longer current")]
    StaleRead(u64),
}

/// Apply one event to a snapshot.
///
/// While `Processing`, only completion, reset and clearing the cropped
/// image are accepted; everything else is `Busy`.
pub fn transition(
    snapshot: &SessionSnapshot,
    event: SessionEvent,
) -> Result<SessionSnapshot, SessionError> {
    use CropperSessionState::{Cropping, Idle, Previewing, Processing};

    let state = snapshot.state;
    let invalid = SessionError::InvalidTransition {
        state,
        event: event.name(),
    };
    let has_original = snapshot.original_image.is_some();

    match event {
        SessionEvent::Reset => Ok(SessionSnapshot::default()),

        SessionEvent::ClearCroppedImage => Ok(SessionSnapshot {
            cropped_image: None,
            image_file: None,
            ..snapshot.clone()
        }),

        SessionEvent::ProcessingSucceeded(output) if state == Processing => Ok(SessionSnapshot {
            state: Idle,
            original_image: None,
            adjustment: None,
            cropped_image: Some(output.data_url),
            image_file: Some(output.file),
            error: None,
        }),

        SessionEvent::ProcessingFailed(message) if state == Processing => Ok(SessionSnapshot {
            state: CropperSessionState::Error,
            error: Some(message),
            ..snapshot.clone()
        }),

        SessionEvent::ProcessingSucceeded(_) | SessionEvent::ProcessingFailed(_) => Err(invalid),

        _ if state == Processing => Err(SessionError::Busy),

        SessionEvent::FileLoaded(source) => Ok(SessionSnapshot {
            state: Previewing,
            original_image: Some(source),
            adjustment: None,
            error: None,
            ..snapshot.clone()
        }),

        SessionEvent::ReadFailed(message) => Ok(SessionSnapshot {
            state: CropperSessionState::Error,
            error: Some(message),
            ..snapshot.clone()
        }),

        SessionEvent::Adjust(adjustment) if has_original && state != Idle => Ok(SessionSnapshot {
            state: Cropping,
            adjustment: Some(adjustment.clamped()),
            error: None,
            ..snapshot.clone()
        }),

        SessionEvent::Confirm if has_original && state != Idle => Ok(SessionSnapshot {
            state: Processing,
            error: None,
            ..snapshot.clone()
        }),

        SessionEvent::Adjust(_) | SessionEvent::Confirm => Err(invalid),

        SessionEvent::Cancel if state == Idle => Ok(snapshot.clone()),

        SessionEvent::Cancel => Ok(SessionSnapshot {
            state: Idle,
            original_image: None,
            adjustment: None,
            error: None,
            ..snapshot.clone()
        }),
    }
}

/// Work captured when processing starts.
///
/// Owns everything it needs, so it can run on another thread or worker
/// while the session keeps rejecting competing input.
#[derive(Debug, Clone)]
pub struct CropJob {
    id: u64,
    source: SourceImage,
    adjustment: Option<CropAdjustment>,
    config: CropperConfig,
}

impl CropJob {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Render, compress and encode the crop.
    ///
    /// Without an adjustment the centred region for the configured aspect
    /// ratio is used, as the modal shows before the user pans.
    pub fn run(&self) -> Result<CropOutput, CropperError> {
        let decoded = decode_image(self.source.bytes())?;

        let (region, rotation_degrees) = match self.adjustment {
            Some(adjustment) => (adjustment.region, adjustment.rotation_degrees),
            None => (
                CropRegion::centered(
                    decoded.width,
                    decoded.height,
                    self.config.aspect_ratio,
                    MIN_ZOOM,
                ),
                0.0,
            ),
        };

        let request = RenderRequest {
            region,
            rotation_degrees,
            output_width: self.config.output_width,
            output_height: self.config.output_height,
        };
        let rendered = render_decoded(&decoded, &request)?;
        let file = compress_image(&rendered.jpeg, &CompressionOptions::from_config(&self.config))?;
        let data_url = encode_data_url(&file.mime_type, &file.bytes);

        log::debug!(
            "crop job {} produced {}x{} {} ({} bytes)",
            self.id,
            file.width,
            file.height,
            file.mime_type,
            file.size()
        );

        Ok(CropOutput { data_url, file })
    }
}

/// Session owner for one upload control.
#[derive(Debug)]
pub struct CropperSession {
    config: CropperConfig,
    snapshot: SessionSnapshot,
    next_job_id: u64,
    active_job: Option<u64>,
    next_read_id: u64,
    active_read: Option<u64>,
}

impl CropperSession {
    pub fn new(config: CropperConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            snapshot: SessionSnapshot::default(),
            next_job_id: 1,
            active_job: None,
            next_read_id: 1,
            active_read: None,
        })
    }

    pub fn config(&self) -> &CropperConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.snapshot
    }

    pub fn state(&self) -> CropperSessionState {
        self.snapshot.state
    }

    pub fn show_cropper(&self) -> bool {
        self.snapshot.show_cropper()
    }

    pub fn is_processing(&self) -> bool {
        self.snapshot.state == CropperSessionState::Processing
    }

    pub fn original_image(&self) -> Option<&SourceImage> {
        self.snapshot.original_image.as_ref()
    }

    pub fn cropped_image(&self) -> Option<&str> {
        self.snapshot.cropped_image.as_deref()
    }

    pub fn image_file(&self) -> Option<&CompressedFile> {
        self.snapshot.image_file.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.snapshot.error.as_deref()
    }

    fn apply(&mut self, event: SessionEvent) -> Result<(), SessionError> {
        let from = self.snapshot.state;
        let name = event.name();

        let next = transition(&self.snapshot, event).map_err(|e| {
            log::warn!("cropper session rejected input: {}", e);
            e
        })?;

        if next.state != from {
            log::info!("cropper session {} -> {} ({})", from, next.state, name);
        }
        self.snapshot = next;
        Ok(())
    }

    /// Check a picked file before reading it. Never mutates the session.
    pub fn check_file(&self, file: &FileHandle) -> Result<(), CropperError> {
        if self.is_processing() {
            return Err(SessionError::Busy.into());
        }
        validate_file(file)?;
        Ok(())
    }

    /// Validate and load a file whose bytes are already in memory.
    pub fn select_file(&mut self, file: &FileHandle, bytes: Vec<u8>) -> Result<(), CropperError> {
        let read_id = self.begin_read(file)?;
        self.load_file(read_id, file, Ok(bytes))
    }

    /// Validate a picked file and open a read ticket for it.
    ///
    /// Only the newest ticket can be loaded. `cancel` and `reset` void the
    /// outstanding one.
    pub fn begin_read(&mut self, file: &FileHandle) -> Result<u64, CropperError> {
        self.check_file(file)?;
        let id = self.next_read_id;
        self.next_read_id += 1;
        if let Some(previous) = self.active_read.replace(id) {
            log::debug!("file read {} superseded by {}", previous, id);
        }
        Ok(id)
    }

    /// Apply the outcome of the read opened by [`begin_read`].
    ///
    /// A read failure moves the session to `Error` and is returned. Results
    /// for a superseded or voided ticket are rejected as stale and leave the
    /// session alone.
    ///
    /// [`begin_read`]: CropperSession::begin_read
    pub fn load_file(
        &mut self,
        read_id: u64,
        file: &FileHandle,
        contents: Result<Vec<u8>, ReadError>,
    ) -> Result<(), CropperError> {
        if self.active_read != Some(read_id) {
            log::warn!("ignoring result of stale file read {}", read_id);
            return Err(SessionError::StaleRead(read_id).into());
        }
        self.check_file(file)?;
        self.active_read = None;

        match contents {
            Ok(bytes) => {
                let source = SourceImage::new(file.name.clone(), file.mime_type.clone(), bytes);
                self.apply(SessionEvent::FileLoaded(source))?;
                Ok(())
            }
            Err(err) => {
                let err = CropperError::from(err);
                self.apply(SessionEvent::ReadFailed(err.user_message()))?;
                Err(err)
            }
        }
    }

    pub fn adjust_crop(&mut self, adjustment: CropAdjustment) -> Result<(), CropperError> {
        self.apply(SessionEvent::Adjust(adjustment))?;
        Ok(())
    }

    /// Enter `Processing` and capture the work to run.
    pub fn begin_processing(&mut self) -> Result<CropJob, CropperError> {
        if self.is_processing() {
            return Err(SessionError::Busy.into());
        }
        let source = self
            .snapshot
            .original_image
            .clone()
            .ok_or(SessionError::InvalidTransition {
                state: self.state(),
                event: SessionEvent::Confirm.name(),
            })?;

        self.apply(SessionEvent::Confirm)?;

        let id = self.next_job_id;
        self.next_job_id += 1;
        self.active_job = Some(id);

        Ok(CropJob {
            id,
            source,
            adjustment: self.snapshot.adjustment,
            config: self.config.clone(),
        })
    }

    /// Record the outcome of a job started by [`begin_processing`].
    ///
    /// Results of jobs abandoned by `reset` are rejected as stale and leave
    /// the session alone.
    ///
    /// [`begin_processing`]: CropperSession::begin_processing
    pub fn finish_processing(
        &mut self,
        job_id: u64,
        result: Result<CropOutput, CropperError>,
    ) -> Result<CropOutput, CropperError> {
        if self.active_job != Some(job_id) {
            log::warn!("ignoring result of stale crop job {}", job_id);
            return Err(SessionError::StaleJob(job_id).into());
        }
        self.active_job = None;

        match result {
            Ok(output) => {
                self.apply(SessionEvent::ProcessingSucceeded(output.clone()))?;
                Ok(output)
            }
            Err(err) => {
                log::warn!("crop job {} failed: {}", job_id, err);
                self.apply(SessionEvent::ProcessingFailed(err.user_message()))?;
                Err(err)
            }
        }
    }

    /// Process the current crop synchronously.
    pub fn confirm_crop(&mut self) -> Result<CropOutput, CropperError> {
        let job = self.begin_processing()?;
        let result = job.run();
        self.finish_processing(job.id(), result)
    }

    pub fn cancel(&mut self) -> Result<(), CropperError> {
        self.apply(SessionEvent::Cancel)?;
        self.active_read = None;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.active_job = None;
        self.active_read = None;
        self.snapshot = SessionSnapshot::default();
        log::info!("cropper session reset");
    }

    pub fn clear_cropped_image(&mut self) {
        self.snapshot.cropped_image = None;
        self.snapshot.image_file = None;
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn event_strategy() -> impl Strategy<Value = SessionEvent> {
        prop_oneof![
            Just(SessionEvent::FileLoaded(SourceImage::new(
                "a.png",
                "image/png",
                vec![1, 2, 3]
            ))),
            Just(SessionEvent::ReadFailed("read".into())),
            (0.0f64..=5.0, -90.0f64..=450.0).prop_map(|(zoom, rotation)| {
                SessionEvent::Adjust(CropAdjustment {
                    region: CropRegion::new(0.0, 0.0, 1.0, 1.0),
                    zoom,
                    rotation_degrees: rotation,
                })
            }),
            Just(SessionEvent::Confirm),
            Just(SessionEvent::ProcessingSucceeded(CropOutput {
                data_url: "data:image/jpeg;base64,AA==".into(),
                file: CompressedFile {
                    bytes: vec![0],
                    mime_type: "image/jpeg".into(),
                    width: 1,
                    height: 1,
                },
            })),
            Just(SessionEvent::ProcessingFailed("fail".into())),
            Just(SessionEvent::Cancel),
            Just(SessionEvent::Reset),
            Just(SessionEvent::ClearCroppedImage),
        ]
    }

    proptest! {
        /// Property: Invariants hold along any event sequence.
        #[test]
        fn prop_invariants_hold(events in prop::collection::vec(event_strategy(), 0..40)) {
            let mut snapshot = SessionSnapshot::default();

            for event in events {
                let was_processing = snapshot.state == CropperSessionState::Processing;
                let is_completion = matches!(
                    event,
                    SessionEvent::ProcessingSucceeded(_) | SessionEvent::ProcessingFailed(_)
                );
                let had_crop = snapshot.cropped_image.clone();
                let had_file = snapshot.image_file.clone();
                let is_failure = matches!(event, SessionEvent::ProcessingFailed(_));

                if let Ok(next) = transition(&snapshot, event) {
                    // A new cropped image only comes from a successful completion
                    if next.cropped_image.is_some() && next.cropped_image != had_crop {
                        prop_assert!(was_processing && is_completion);
                    }
                    // Failures never discard the last good crop
                    if is_failure {
                        prop_assert_eq!(&next.cropped_image, &had_crop);
                        prop_assert_eq!(&next.image_file, &had_file);
                    }
                    if next.state == CropperSessionState::Idle {
                        prop_assert!(next.original_image.is_none());
                    }
                    if let Some(adjustment) = next.adjustment {
                        prop_assert!((MIN_ZOOM..=MAX_ZOOM).contains(&adjustment.zoom));
                        prop_assert!((0.0..=360.0).contains(&adjustment.rotation_degrees));
                    }
                    snapshot = next;
                }
            }
        }
    }
}

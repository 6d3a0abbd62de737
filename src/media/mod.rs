// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Functionality to upload images, GIFs, and videos that can be attached to tweets.
//!
//! Tweet media is uploaded separately from the act of posting the tweet itself. In order to attach
//! an image to a new tweet, you need to upload it first, then take the Media ID that Twitter
//! generates and reference that when posting the tweet. Files of any size go through a
//! [`ChunkedUpload`], which walks through Twitter's three-step protocol:
//!
//! 1. `INIT` announces the file's size and type, and gets a media ID back.
//! 2. `APPEND` sends the file a segment at a time, each segment base64-encoded.
//! 3. `FINALIZE` tells Twitter the file is complete.
//!
//! Each step waits for the previous one to finish. If any step before `FINALIZE` fails, the upload
//! stops right there with a `MediaUpload` error; the response to `FINALIZE` is handed back
//! whatever its status.
//!
//! [`ChunkedUpload`]: struct.ChunkedUpload.html
//!
//! ```rust,no_run
//! # async fn doc(twitter: &fledgling::Twitter) -> fledgling::error::Result<()> {
//! use fledgling::Options;
//! use fledgling::media::{media_types, ChunkedUpload};
//!
//! let mut upload = ChunkedUpload::new("cat.png", media_types::image_png().to_string());
//! let finalized = twitter.media().upload(&mut upload).await?;
//!
//! let media_id = upload.media_id().unwrap_or_default().to_string();
//! let opts = Options::new().set("media_ids", media_id);
//! twitter.statuses().update("Hey, check out this cute cat!", Some(&opts)).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Videos and GIFs keep processing after `FINALIZE`. When the finalized response carries
//! `processing_info`, poll `Media::status` until the [`ProcessingInfo`] says it has succeeded
//! before attaching the media to a tweet.
//!
//! [`ProcessingInfo`]: enum.ProcessingInfo.html

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::json;
use tokio::io::AsyncReadExt;

use crate::client::Twitter;
use crate::common::*;
use crate::error::{Error, Result, TwitterErrors};
use crate::links;

/// The longest alt text Twitter accepts, in characters.
pub const MAX_ALT_TEXT_LENGTH: usize = 1000;

/// A collection of convenience functions that return media types accepted by Twitter.
///
/// These are convenience types that can be handed to [`ChunkedUpload::new`] to set the right
/// media type of a piece of media. The functions in the module correspond to media types that
/// Twitter is known to accept.
///
/// Note that using `image_gif` and `video_mp4` will automatically set the upload's
/// `media_category` to `tweet_gif` and `tweet_video` respectively, allowing larger file sizes and
/// extra processing time.
///
/// [`ChunkedUpload::new`]: ../struct.ChunkedUpload.html#method.new
pub mod media_types {
    use mime::{self, Mime};

    /// PNG images.
    pub fn image_png() -> Mime {
        mime::IMAGE_PNG
    }

    /// JPG images.
    pub fn image_jpg() -> Mime {
        mime::IMAGE_JPEG
    }

    /// WEBP images.
    pub fn image_webp() -> Mime {
        "image/webp".parse().unwrap()
    }

    /// Animated GIF images.
    pub fn image_gif() -> Mime {
        mime::IMAGE_GIF
    }

    /// MP4 videos.
    pub fn video_mp4() -> Mime {
        "video/mp4".parse().unwrap()
    }
}

/// Represents the kinds of media that Twitter will accept. `.to_string()` gives the value of the
/// `media_category` parameter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, derive_more::Display)]
pub enum MediaCategory {
    /// Static image. Four can be attached to a single tweet.
    #[display(fmt = "tweet_image")]
    Image,
    /// Animated GIF.
    #[display(fmt = "tweet_gif")]
    Gif,
    /// Video.
    #[display(fmt = "tweet_video")]
    Video,
    /// Static image sent in a direct message.
    #[display(fmt = "dm_image")]
    DmImage,
    /// Animated GIF sent in a direct message.
    #[display(fmt = "dm_gif")]
    DmGif,
    /// Video sent in a direct message.
    #[display(fmt = "dm_video")]
    DmVideo,
}

impl MediaCategory {
    /// Picks the category for the given media type: `image/gif` is a GIF, any `video/` type is a
    /// video, and everything else is an image.
    pub fn for_media_type(media_type: &str, for_dm: bool) -> MediaCategory {
        let media_type = media_type.to_ascii_lowercase();
        let is_gif = media_type == "image/gif";
        let is_video = media_type.starts_with("video/");

        match (for_dm, is_gif, is_video) {
            (false, true, _) => MediaCategory::Gif,
            (false, _, true) => MediaCategory::Video,
            (false, _, _) => MediaCategory::Image,
            (true, true, _) => MediaCategory::DmGif,
            (true, _, true) => MediaCategory::DmVideo,
            (true, _, _) => MediaCategory::DmImage,
        }
    }
}

/// Checks that the given media type is shaped like `type/subtype`, optionally with a `+suffix`.
fn validate_media_type(media_type: &str) -> Result<()> {
    lazy_static::lazy_static! {
        static ref MEDIA_TYPE: Regex = Regex::new(
            r"^[A-Za-z0-9][A-Za-z0-9!#$&^_.-]*/[A-Za-z0-9][A-Za-z0-9!#$&^_.-]*(\+[A-Za-z0-9][A-Za-z0-9!#$&^_.-]*)?$"
        ).unwrap();
    }

    if MEDIA_TYPE.is_match(media_type) {
        Ok(())
    } else {
        Err(Error::InvalidMedia(format!(
            "{:?} is not a media type of the form type/subtype",
            media_type
        )))
    }
}

/// An error Twitter reports when it couldn't process uploaded media.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaError {
    /// A numeric error code assigned to the error.
    pub code: i32,
    /// A short name given to the error.
    pub name: String,
    /// The full text of the error message.
    pub message: String,
}

/// How far along Twitter is in processing an uploaded video or GIF.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessingInfo {
    /// Processing hasn't started. Check again after the given number of seconds.
    Pending { check_after: u64 },
    /// Processing is under way. Check again after the given number of seconds.
    InProgress { check_after: u64, percent: Option<f64> },
    /// Processing failed, and the media can't be used.
    Failed(MediaError),
    /// Processing is finished, and the media can be attached.
    Succeeded,
}

impl ProcessingInfo {
    /// Returns whether Twitter is done with the media, one way or the other.
    pub fn is_done(&self) -> bool {
        matches!(self, ProcessingInfo::Failed(_) | ProcessingInfo::Succeeded)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RawProcessingState {
    Pending,
    InProgress,
    Failed,
    Succeeded,
}

#[derive(Debug, Deserialize)]
struct RawProcessingInfo {
    state: RawProcessingState,
    progress_percent: Option<f64>,
    check_after_secs: Option<u64>,
    error: Option<MediaError>,
}

impl<'de> Deserialize<'de> for ProcessingInfo {
    fn deserialize<D>(deser: D) -> std::result::Result<ProcessingInfo, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawProcessingInfo::deserialize(deser)?;
        let check_after = raw
            .check_after_secs
            .ok_or_else(|| D::Error::custom("Missing field: check_after_secs"));
        Ok(match raw.state {
            RawProcessingState::Pending => ProcessingInfo::Pending {
                check_after: check_after?,
            },
            RawProcessingState::InProgress => ProcessingInfo::InProgress {
                check_after: check_after?,
                percent: raw.progress_percent,
            },
            RawProcessingState::Succeeded => ProcessingInfo::Succeeded,
            RawProcessingState::Failed => {
                let err = raw
                    .error
                    .ok_or_else(|| D::Error::custom("Missing field: error"))?;
                ProcessingInfo::Failed(err)
            }
        })
    }
}

/// The media described by an upload response. Decode one from the response to `FINALIZE`,
/// `STATUS` or `Media::upload_bytes`.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaHandle {
    /// ID that can be used in API calls (e.g. attach to tweet).
    #[serde(rename = "media_id_string")]
    pub id: String,
    /// Number of seconds the media can be used in other API calls.
    //We can miss this field on failed upload in which case 0 is pretty reasonable value.
    #[serde(default, rename = "expires_after_secs")]
    pub expires_after: u64,
    /// Processing state, for media that needs it.
    #[serde(default, rename = "processing_info")]
    pub processing: Option<ProcessingInfo>,
}

/// Where a `ChunkedUpload` is in the protocol.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UploadState {
    /// Nothing has been sent yet.
    Created,
    /// `INIT` succeeded and a media ID was assigned.
    Initialized,
    /// Segments are being sent.
    Appending,
    /// `FINALIZE` was sent. The upload can't be used again.
    Finalized,
    /// A step failed. The upload can't be used again.
    Failed,
}

/// A file to be sent to Twitter in segments.
///
/// Set it up with the builder methods, then hand it to `Media::upload`. The upload records its
/// progress as it goes, so after a failure `state`, `media_id` and `segment_index` show how far it
/// got.
#[derive(Debug, Clone)]
pub struct ChunkedUpload {
    path: PathBuf,
    media_type: String,
    for_dm: bool,
    shared: bool,
    chunk_size: Option<usize>,
    media_id: Option<String>,
    segment_index: u64,
    state: UploadState,
}

impl ChunkedUpload {
    /// Prepares an upload of the file at `path`, declared as the given media type.
    pub fn new(path: impl Into<PathBuf>, media_type: impl Into<String>) -> ChunkedUpload {
        ChunkedUpload {
            path: path.into(),
            media_type: media_type.into(),
            for_dm: false,
            shared: false,
            chunk_size: None,
            media_id: None,
            segment_index: 0,
            state: UploadState::Created,
        }
    }

    /// Marks the media as meant for a direct message rather than a tweet.
    pub fn for_dm(self, for_dm: bool) -> Self {
        ChunkedUpload { for_dm, ..self }
    }

    /// Lets DM media be used in more than one message. Only takes effect with `for_dm`.
    pub fn shared(self, shared: bool) -> Self {
        ChunkedUpload { shared, ..self }
    }

    /// Sets the size of each segment, in bytes. By default the client's `Config::chunk_size` is
    /// used.
    pub fn chunk_size(self, chunk_size: usize) -> Self {
        ChunkedUpload {
            chunk_size: Some(chunk_size),
            ..self
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// The `media_category` this upload is sent with.
    pub fn category(&self) -> MediaCategory {
        MediaCategory::for_media_type(&self.media_type, self.for_dm)
    }

    /// The media ID Twitter assigned in `INIT`, if it got that far.
    pub fn media_id(&self) -> Option<&str> {
        self.media_id.as_deref()
    }

    /// The index the next segment would be sent with; after a completed upload, the number of
    /// segments sent.
    pub fn segment_index(&self) -> u64 {
        self.segment_index
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    /// Checks the file and media type, returning the file's size.
    async fn check(&self) -> Result<u64> {
        validate_media_type(&self.media_type)?;

        let unreadable =
            |e: std::io::Error| Error::InvalidMedia(format!("can't read {}: {}", self.path.display(), e));
        let meta = tokio::fs::metadata(&self.path).await.map_err(unreadable)?;
        if !meta.is_file() {
            return Err(Error::InvalidMedia(format!(
                "{} is not a file",
                self.path.display()
            )));
        }
        tokio::fs::File::open(&self.path).await.map_err(unreadable)?;

        Ok(meta.len())
    }
}

/// The longest stretch of a non-JSON error body quoted in an upload error.
const MAX_QUOTED_BODY: usize = 200;

fn step_failure(step: &str, reply: &RawReply, segment_index: Option<u64>) -> Error {
    let detail = match serde_json::from_slice::<TwitterErrors>(&reply.body) {
        Ok(errors) if !errors.errors.is_empty() => errors.to_string().replace(",\n", ", "),
        _ => {
            let text = reply.text();
            let text = text.trim();
            if text.is_empty() {
                "no response body".to_string()
            } else {
                text.chars().take(MAX_QUOTED_BODY).collect()
            }
        }
    };

    Error::MediaUpload {
        message: format!("{} rejected: {}", step, detail),
        status: Some(reply.status),
        reason: reply.reason.clone(),
        segment_index,
    }
}

/// Calls for uploading media.
pub struct Media<'a> {
    client: &'a Twitter,
}

impl<'a> Media<'a> {
    pub(crate) fn new(client: &'a Twitter) -> Self {
        Media { client }
    }

    /// Runs the given upload through `INIT`, `APPEND` and `FINALIZE`, returning the response to
    /// `FINALIZE`.
    ///
    /// The file is checked before anything is sent: a file that can't be read or a malformed media
    /// type is an `InvalidMedia` error. A rejected `INIT` or `APPEND`, or a file that can't be
    /// reopened for reading, is a `MediaUpload` error; for `APPEND`, the error names the segment
    /// that failed. Either way the upload ends up `Failed`.
    pub async fn upload(&self, upload: &mut ChunkedUpload) -> Result<Response> {
        if upload.state != UploadState::Created {
            return Err(Error::InvalidArgument(format!(
                "upload of {} has already run ({:?})",
                upload.path.display(),
                upload.state
            )));
        }

        let result = self.run(upload).await;
        if result.is_err() {
            upload.state = UploadState::Failed;
        }
        result
    }

    async fn run(&self, upload: &mut ChunkedUpload) -> Result<Response> {
        self.client.require_user_context("media/upload")?;
        let total_bytes = upload.check().await?;
        let chunk_size = upload.chunk_size.unwrap_or(self.client.config().chunk_size);
        if chunk_size == 0 {
            return Err(Error::InvalidArgument("chunk size must be at least one byte".to_string()));
        }

        // INIT
        let category = upload.category();
        log::debug!(
            "INIT {} ({}, {} bytes, {})",
            upload.path.display(),
            upload.media_type,
            total_bytes,
            category
        );
        let params = ParamList::new()
            .add_param("command", "INIT")
            .add_param("media_type", upload.media_type.clone())
            .add_param("total_bytes", total_bytes.to_string())
            .add_param("media_category", category.to_string())
            .add_opt_param("shared", (upload.for_dm && upload.shared).then(|| "true"));
        let reply = self.client.upload_step(params).await?;
        if !reply.status.is_success() {
            return Err(step_failure("INIT", &reply, None));
        }
        let resp = reply.into_response()?;

        let media_id = resp
            .get("media_id_string")
            .and_then(|id| id.as_str().map(|s| s.to_string()))
            .or_else(|| resp.get("media_id").and_then(|id| id.as_u64()).map(|id| id.to_string()))
            .ok_or_else(|| Error::media_upload("INIT response has no media_id"))?;
        upload.media_id = Some(media_id.clone());
        upload.state = UploadState::Initialized;

        // APPEND
        let mut file = tokio::fs::File::open(&upload.path).await.map_err(|e| {
            Error::media_upload(format!("can't reopen {}: {}", upload.path.display(), e))
        })?;
        upload.state = UploadState::Appending;

        loop {
            let mut chunk = Vec::with_capacity(chunk_size);
            (&mut file)
                .take(chunk_size as u64)
                .read_to_end(&mut chunk)
                .await
                .map_err(|e| Error::MediaUpload {
                    message: format!("can't read {}: {}", upload.path.display(), e),
                    status: None,
                    reason: None,
                    segment_index: Some(upload.segment_index),
                })?;
            if chunk.is_empty() {
                break;
            }

            log::debug!(
                "APPEND {} segment {} ({} bytes)",
                media_id,
                upload.segment_index,
                chunk.len()
            );
            let params = ParamList::new()
                .add_param("command", "APPEND")
                .add_param("media_id", media_id.clone())
                .add_param("media_data", base64::encode(&chunk))
                .add_param("segment_index", upload.segment_index.to_string());
            let reply = self.client.upload_step(params).await?;
            if !reply.status.is_success() {
                return Err(step_failure("APPEND", &reply, Some(upload.segment_index)));
            }

            upload.segment_index += 1;
        }

        // FINALIZE
        log::debug!("FINALIZE {} after {} segments", media_id, upload.segment_index);
        let params = ParamList::new()
            .add_param("command", "FINALIZE")
            .add_param("media_id", media_id);
        let resp = self.client.upload_post(params).await?;
        upload.state = UploadState::Finalized;

        Ok(resp)
    }

    /// Asks Twitter how processing of the given media is going. Decode the response as a
    /// [`MediaHandle`] to read its [`ProcessingInfo`].
    ///
    /// [`MediaHandle`]: struct.MediaHandle.html
    /// [`ProcessingInfo`]: enum.ProcessingInfo.html
    pub async fn status(&self, media_id: &str) -> Result<Response> {
        let params = ParamList::new()
            .add_param("command", "STATUS")
            .add_param("media_id", media_id.to_string());
        self.client.upload_get(params).await
    }

    /// Uploads a small image in one call, without the chunked protocol.
    ///
    /// Only images up to 5 MB can be sent this way; GIFs and videos need a `ChunkedUpload`.
    pub async fn upload_bytes(&self, data: &[u8], media_type: &str) -> Result<Response> {
        self.client.require_user_context("media/upload")?;
        validate_media_type(media_type)?;
        if data.is_empty() {
            return Err(Error::InvalidMedia("no media data given".to_string()));
        }

        log::debug!("uploading {} bytes of {}", data.len(), media_type);
        let params = ParamList::new()
            .add_param("media_data", base64::encode(data))
            .add_param(
                "media_category",
                MediaCategory::for_media_type(media_type, false).to_string(),
            );
        self.client.upload_post(params).await
    }

    /// Sets the alt text shown for the given media. At most 1000 characters.
    pub async fn set_alt_text(&self, media_id: &str, text: &str) -> Result<Response> {
        self.client.require_user_context("media/metadata/create")?;
        let len = text.chars().count();
        if len > MAX_ALT_TEXT_LENGTH {
            return Err(Error::InvalidArgument(format!(
                "alt text is {} characters long, the limit is {}",
                len, MAX_ALT_TEXT_LENGTH
            )));
        }

        let body = json!({
            "media_id": media_id,
            "alt_text": { "text": text },
        });
        self.client.upload_json(links::media::METADATA, body).await
    }
}

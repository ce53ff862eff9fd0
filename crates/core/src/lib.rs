mod apply;
mod config;
mod datetime;
mod engine;
mod error;
mod exif_reader;
mod metadata;
mod names;
mod planner;
mod report;
mod review;
mod scan;
mod thumbnail;

pub use apply::{copy_preserving_times, rename_in_place, set_file_times};
pub use config::{load_config, Config, DEFAULT_MOVIE_EXTENSIONS, DEFAULT_STILL_EXTENSIONS};
pub use datetime::{
    format_token, from_change_time, parse_exif_datetime, parse_token, read_change_time,
};
pub use engine::{run_batch, run_directory, RunOptions};
pub use error::OrganizeError;
pub use exif_reader::read_embedded_capture;
pub use metadata::{CaptureProbe, CaptureSource, CapturedAt, FsProbe};
pub use names::{classify, is_img_prefixed, is_marked, strip_img_prefix, strip_marker, Tier};
pub use planner::{plan_rename, ItemFailure, RenameAction};
pub use report::{BatchReport, Failure, FailureKind};
pub use review::{MarkOutcome, ReviewSession, THUMBNAIL_STRIP};
pub use scan::{ensure_directory, list_work_items, WorkItem};
pub use thumbnail::{fit_to_box, ThumbnailCache, CANVAS_DIM, THUMBNAIL_DIM};

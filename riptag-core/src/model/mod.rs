//! Values exchanged between the controller, the dispatcher and the
//! collaborators. Everything here is treated as an immutable snapshot once
//! it has been handed across a task boundary.
//!
//! Plain data: field names are the documentation.
#![allow(missing_docs)]

mod candidate;
mod download;
mod tags;

pub use candidate::{
    ArtistCredit, Candidate, CandidateKind, CandidatePayload, ReleaseInfo,
    TrackInfo, join_artist_credits,
};
pub use download::{
    AssetError, AssetKind, DownloadMode, DownloadPlan, DownloadReport,
    FetchOutcome, MergeRequest, ToolPaths,
};
pub use tags::TagSet;

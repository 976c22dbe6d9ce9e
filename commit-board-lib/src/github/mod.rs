//! Typed GitHub REST API access.

mod client;
mod models;

pub use client::{Client, DEFAULT_API_URL, RateLimitInfo};
pub use models::{
    CommitDetail, CommitInfo, CommitSignature, CommitStats, CommitSummary, Participation, RateLimitResources, RateLimitStatus,
    RateLimitWindow, Repository, RepositoryOwner, SearchCount, User,
};

//! Typed ids for the engine's entities.

pub use super::id::Id;

/// Marker type for campaigns (owned by the upstream campaign collaborator).
pub struct Campaign;

/// Marker type for monitored-post jobs.
pub struct ScrapeJob;

/// Marker type for leads captured from comments.
pub struct Lead;

/// Marker type for outstanding connection invitations.
pub struct PendingConnection;

pub type CampaignId = Id<Campaign>;

pub type ScrapeJobId = Id<ScrapeJob>;

pub type LeadId = Id<Lead>;

pub type PendingConnectionId = Id<PendingConnection>;

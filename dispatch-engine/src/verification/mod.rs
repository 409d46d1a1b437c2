//! Serial number verification
//!
//! ```text
//! image ─► VisionClient::recognize ─► extract_candidates ─► compare(target, c)
//!                                                              │
//!                                      VerificationService::evaluate ◄┘
//! ```

pub mod candidates;
pub mod matcher;
pub mod service;
pub mod vision;

pub use candidates::{EXTRACTION_PROMPT, extract_candidates};
pub use matcher::{MatchOutcome, MatchResult, compare, normalize};
pub use service::{VerificationError, VerificationReport, VerificationService};
pub use vision::{HttpVisionClient, VisionClient, VisionError};

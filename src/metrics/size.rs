//! Hardware fit from total repository size
//!
//! | device       | fits when |
//! |--------------|-----------|
//! | raspberry_pi | < 1 GiB   |
//! | jetson_nano  | < 4 GiB   |
//! | desktop_pc   | < 16 GiB  |
//! | aws_server   | always    |

use super::timed;
use crate::collaborators::Collaborators;
use crate::models::SizeScore;
use tracing::warn;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

pub fn size_score(bytes: u64) -> SizeScore {
    let gib = bytes as f64 / GIB;
    let fits = |limit: f64| if gib < limit { 1.0 } else { 0.0 };
    SizeScore {
        raspberry_pi: fits(1.0),
        jetson_nano: fits(4.0),
        desktop_pc: fits(16.0),
        aws_server: 1.0,
    }
}

/// Computes the size score; all zeros without a repository or on failure
pub struct SizeAnalyzer;

impl SizeAnalyzer {
    pub async fn compute(&self, collaborators: &Collaborators) -> (SizeScore, u64) {
        let Some(repo) = collaborators.repository.clone() else {
            return (SizeScore::default(), 0);
        };
        let (bytes, latency_ms) = timed(repo.repository_size_bytes()).await;
        match bytes {
            Ok(bytes) => (size_score(bytes), latency_ms),
            Err(e) => {
                warn!("size_score failed for {}: {}", repo.location(), e);
                (SizeScore::default(), latency_ms)
            }
        }
    }
}

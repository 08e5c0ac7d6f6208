// src/indicators.rs
//! Daily-refreshed in-memory snapshot of macro indicators.
//!
//! Single writer (the indicator job), many concurrent readers (request
//! handlers building LLM prompts). Readers clone an `Arc` to the current
//! snapshot; the writer swaps the whole `Arc` in one step, so a partially
//! updated snapshot is never observable. Not persisted — rebuilt by the next
//! scheduled run after a restart.

use serde::Serialize;
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

/// One complete snapshot of the macro context fed to the insight pipeline.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct IndicatorSnapshot {
    /// Effective US policy rate, formatted (e.g. "5.33%").
    pub interest_rate: Option<String>,
    /// Latest quarter-over-quarter real GDP growth, formatted.
    pub gdp_growth: Option<String>,
    /// Most recent trade-policy headline.
    pub trade_headline: Option<String>,
    /// Unix seconds of the refresh that produced this snapshot.
    pub refreshed_at: u64,
}

impl IndicatorSnapshot {
    /// Render the snapshot as prompt context lines. Missing values are
    /// spelled out so the model does not hallucinate a number for them.
    pub fn prompt_block(&self) -> String {
        let unknown = "알 수 없음";
        format!(
            "- 미국 기준 금리: {}\n- 미국 GDP 성장률: {}\n- 최근 통상 정책 헤드라인: {}",
            self.interest_rate.as_deref().unwrap_or(unknown),
            self.gdp_growth.as_deref().unwrap_or(unknown),
            self.trade_headline.as_deref().unwrap_or(unknown),
        )
    }
}

/// Clonable handle shared between the scheduler's writer and the request
/// handlers' readers.
#[derive(Clone)]
pub struct IndicatorHandle {
    inner: Arc<RwLock<Arc<IndicatorSnapshot>>>,
}

impl Default for IndicatorHandle {
    fn default() -> Self {
        Self::new(IndicatorSnapshot::default())
    }
}

impl IndicatorHandle {
    pub fn new(initial: IndicatorSnapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(initial))),
        }
    }

    /// Current snapshot. The lock is held only for the `Arc` clone.
    pub fn snapshot(&self) -> Arc<IndicatorSnapshot> {
        self.inner
            .read()
            .expect("indicator lock poisoned")
            .clone()
    }

    /// Publish a complete successor snapshot, stamping `refreshed_at`.
    pub fn replace(&self, mut next: IndicatorSnapshot) {
        next.refreshed_at = now_unix();
        let next = Arc::new(next);
        let mut guard = self.inner.write().expect("indicator lock poisoned");
        *guard = next;
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

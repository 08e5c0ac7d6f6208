// src/insight/mod.rs
//! Two-stage insight pipeline: fast categorical opinion, expanded report,
//! report persistence, and grounded follow-up answering.
//!
//! Every stage degrades to a fixed human-readable placeholder instead of
//! propagating a provider error: the consumer is a chat-like flow where an
//! apologetic canned string beats no answer. Internally each stage returns
//! [`Generated`] so callers and tests can tell a real answer from a
//! degraded one without string matching; the collapse to the placeholder
//! happens only at the HTTP boundary.

pub mod llm;
pub mod reports;

use anyhow::{Context, Result};
use metrics::counter;
use serde::Serialize;
use std::sync::Arc;

use crate::indicators::IndicatorHandle;
use llm::ChatModel;
use reports::ReportStore;

/// Reason used when the quick model's output carries no `근거:` delimiter.
pub const REASON_FALLBACK: &str = "근거를 찾을 수 없습니다";
/// Reason used when the quick-opinion call itself fails.
pub const REASON_FAILURE: &str = "분석 중 오류가 발생했습니다";
/// Report-stage placeholder on generation failure.
pub const REPORT_FAILURE: &str = "보고서 생성 중 오류가 발생했습니다.";
/// Follow-up placeholder on generation failure.
pub const ANSWER_FAILURE: &str = "답변 생성 중 오류가 발생했습니다.";
/// Follow-up response for an unknown report identifier. A normal
/// conversational reply, not an error.
pub const REPORT_NOT_FOUND: &str = "죄송합니다. 해당 보고서를 찾을 수 없습니다.";

/// Categorical stance of the quick-opinion stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Buy,
    Sell,
    Hold,
    AnalysisError,
}

impl Stance {
    pub fn label_ko(self) -> &'static str {
        match self {
            Stance::Buy => "매수",
            Stance::Sell => "매도",
            Stance::Hold => "중립",
            Stance::AnalysisError => "분석 오류",
        }
    }

    fn from_label(s: &str) -> Option<Self> {
        match s {
            "매수" => Some(Stance::Buy),
            "매도" => Some(Stance::Sell),
            "중립" => Some(Stance::Hold),
            _ => None,
        }
    }
}

/// A stage result that remembers whether it degraded and why. Collapsed to
/// plain strings only when shaping the HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated<T> {
    pub value: T,
    pub degraded: bool,
    pub reason: Option<String>,
}

impl<T> Generated<T> {
    pub fn ok(value: T) -> Self {
        Self {
            value,
            degraded: false,
            reason: None,
        }
    }

    pub fn degraded(value: T, reason: impl Into<String>) -> Self {
        Self {
            value,
            degraded: true,
            reason: Some(reason.into()),
        }
    }
}

/// Parsed quick-opinion output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickOpinion {
    pub stance: Stance,
    pub reason: String,
}

/// Result of the full two-stage run, report already persisted.
#[derive(Debug)]
pub struct InsightOutcome {
    pub stock_name: String,
    pub opinion: Generated<QuickOpinion>,
    pub report: Generated<String>,
    pub report_id: String,
}

pub struct InsightPipeline {
    quick_model: Arc<dyn ChatModel>,
    report_model: Arc<dyn ChatModel>,
    reports: ReportStore,
    indicators: IndicatorHandle,
}

impl InsightPipeline {
    pub fn new(
        quick_model: Arc<dyn ChatModel>,
        report_model: Arc<dyn ChatModel>,
        reports: ReportStore,
        indicators: IndicatorHandle,
    ) -> Self {
        Self {
            quick_model,
            report_model,
            reports,
            indicators,
        }
    }

    /// Stage 1: fast categorical conclusion + one-sentence rationale,
    /// conditioned on the current indicator snapshot. Never propagates a
    /// transport error.
    pub async fn quick_opinion(&self, stock_name: &str) -> Generated<QuickOpinion> {
        let snapshot = self.indicators.snapshot();
        let prompt = format!(
            "당신은 퀀트 분석가입니다. 아래 경제 지표가 '{stock_name}' 종목에 미칠 영향을 \
             분석하여 투자 의견을 내려주세요.\n\
             [경제 지표]\n{}\n\
             반드시 다음 형식 한 줄로만 답하세요.\n\
             결론: <매수|매도|중립>, 근거: <한 문장>",
            snapshot.prompt_block()
        );

        match self.quick_model.complete(&prompt).await {
            Ok(raw) => {
                let (opinion, parse_degraded) = parse_opinion(&raw);
                if parse_degraded {
                    Generated::degraded(opinion, "unparseable quick-opinion output")
                } else {
                    Generated::ok(opinion)
                }
            }
            Err(e) => {
                tracing::warn!(error = ?e, stock_name, "quick opinion generation failed");
                counter!("insight_generation_failures_total", "stage" => "quick").increment(1);
                Generated::degraded(
                    QuickOpinion {
                        stance: Stance::AnalysisError,
                        reason: REASON_FAILURE.to_string(),
                    },
                    "quick model call failed",
                )
            }
        }
    }

    /// Stage 2: expanded comparative narrative built on the stage-1 result.
    /// Failure yields the fixed placeholder text, never an error.
    pub async fn build_report(
        &self,
        stock_name: &str,
        opinion: &QuickOpinion,
    ) -> Generated<String> {
        let snapshot = self.indicators.snapshot();
        let prompt = format!(
            "당신은 30년 경력의 애널리스트입니다. '{stock_name}' 종목에 대한 1차 분석 결과는 \
             '{}'(근거: {})입니다.\n\
             [경제 지표]\n{}\n\
             [작성 지침]\n\
             1. 위 결론을 뒷받침하거나 반박하는 현재 거시 지표를 분석하세요.\n\
             2. 과거 유사한 경제 국면에서 '{stock_name}'의 주가 흐름과 현재의 차이를 비교하세요.\n\
             3. 전문적이지만 이해하기 쉬운 최종 투자 보고서를 500자 내외로 작성하세요.",
            opinion.stance.label_ko(),
            opinion.reason,
            snapshot.prompt_block()
        );

        match self.report_model.complete(&prompt).await {
            Ok(text) => Generated::ok(text),
            Err(e) => {
                tracing::warn!(error = ?e, stock_name, "report generation failed");
                counter!("insight_generation_failures_total", "stage" => "report").increment(1);
                Generated::degraded(REPORT_FAILURE.to_string(), "report model call failed")
            }
        }
    }

    /// Run both stages and persist the report text (placeholder included —
    /// the follow-up must load exactly what this call produced). The
    /// returned identifier is the caller's only handle to the report.
    pub async fn create_insight(&self, stock_name: &str) -> Result<InsightOutcome> {
        let opinion = self.quick_opinion(stock_name).await;
        let report = self.build_report(stock_name, &opinion.value).await;
        let report_id = self
            .reports
            .create(&report.value)
            .context("persisting report artifact")?;
        tracing::info!(stock_name, %report_id, degraded = report.degraded, "insight generated");
        Ok(InsightOutcome {
            stock_name: stock_name.to_string(),
            opinion,
            report,
            report_id,
        })
    }

    /// Grounded follow-up: answer strictly from a previously persisted
    /// report. Unknown identifiers get a fixed conversational reply.
    pub async fn answer_question(&self, report_id: &str, question: &str) -> Generated<String> {
        let Some(document) = self.reports.load(report_id) else {
            return Generated::degraded(REPORT_NOT_FOUND.to_string(), "report not found");
        };

        let prompt = format!(
            "당신은 아래 [문서]의 내용을 완벽하게 이해한 비서입니다. [질문]에 대해 [문서]의 \
             내용만을 근거로 답변하세요. 문서에 없는 내용은 모른다고 답하세요.\n\
             [문서]\n{document}\n\
             [질문]\n{question}"
        );

        match self.quick_model.complete(&prompt).await {
            Ok(answer) => Generated::ok(answer),
            Err(e) => {
                tracing::warn!(error = ?e, report_id, "follow-up generation failed");
                counter!("insight_generation_failures_total", "stage" => "chatbot").increment(1);
                Generated::degraded(ANSWER_FAILURE.to_string(), "follow-up model call failed")
            }
        }
    }
}

/// Parse the fixed `결론: X, 근거: Y` contract. A missing `근거:` delimiter
/// yields the fallback reason; an unrecognized stance label maps to 중립.
/// The bool flags whether anything fell back.
fn parse_opinion(raw: &str) -> (QuickOpinion, bool) {
    let text = raw.trim();

    let (head, reason, reason_missing) = match text.split_once("근거:") {
        Some((head, rest)) => (head, rest.trim().to_string(), false),
        None => (text, REASON_FALLBACK.to_string(), true),
    };

    let label = head
        .trim()
        .trim_start_matches("결론:")
        .trim()
        .trim_end_matches(',')
        .trim();

    match Stance::from_label(label) {
        Some(stance) => (QuickOpinion { stance, reason }, reason_missing),
        None => (
            QuickOpinion {
                stance: Stance::Hold,
                reason,
            },
            true,
        ),
    }
}

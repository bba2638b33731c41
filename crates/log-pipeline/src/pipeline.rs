//! 집계 루프 -- 추적/매칭/집계/리포트의 전체 흐름을 관리합니다.
//!
//! [`TallyPipeline`]은 core의 [`Runnable`](logtally_core::pipeline::Runnable) trait을 구현하여
//! `logtally-daemon`이 분리(detach)를 마친 뒤 제어를 넘겨받습니다.
//!
//! # 내부 흐름
//! ```text
//! FileTailer -> LogCursor -> LineMatcher -> Aggregator -> Report -> output
//! ```
//!
//! 한 바퀴([`TallyPipeline::step`])는 새 라인 읽기, 매칭 및 집계, 플러시 검사 순서로
//! 진행됩니다. 추적 실패와 매칭 실패는 루프 밖으로 전파되지 않으며, 리포트 출력 실패만
//! 치명적 에러로 반환됩니다.

use std::io::{Stdout, Write};
use std::time::Instant;

use logtally_core::error::LogtallyError;
use logtally_core::metrics as m;
use logtally_core::pipeline::Runnable;

use crate::aggregate::Aggregator;
use crate::collector::{FileTailer, LogCursor};
use crate::config::TallyConfig;
use crate::error::LogPipelineError;
use crate::matcher::LineMatcher;
use crate::report::Render;

/// 한 바퀴 처리 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepSummary {
    /// 새로 읽은 라인 수
    pub lines_read: usize,
    /// 패턴에 매칭된 라인 수
    pub lines_matched: usize,
    /// 로테이션 감지 여부
    pub rotated: bool,
    /// 리포트 출력 여부
    pub flushed: bool,
}

/// 집계 파이프라인
///
/// # 사용 예시
/// ```ignore
/// use logtally_core::pipeline::Runnable;
/// use logtally_log_pipeline::TallyPipelineBuilder;
///
/// let mut pipeline = TallyPipelineBuilder::new().config(config).build()?;
/// pipeline.run()?; // 정상 동작 중에는 반환하지 않음
/// ```
pub struct TallyPipeline<W: Write = Stdout> {
    config: TallyConfig,
    tailer: FileTailer,
    cursor: LogCursor,
    matcher: LineMatcher,
    aggregator: Aggregator,
    output: W,
}

impl<W: Write> TallyPipeline<W> {
    /// 파이프라인 설정
    pub fn config(&self) -> &TallyConfig {
        &self.config
    }

    /// 현재 추적 커서
    pub fn cursor(&self) -> &LogCursor {
        &self.cursor
    }

    /// 현재 집계 상태
    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// 리포트 출력 대상
    pub fn output(&self) -> &W {
        &self.output
    }

    /// 루프 한 바퀴를 실행합니다.
    ///
    /// 감시 파일이 아직 없거나 열 수 없으면 열릴 때까지 이 호출 안에서 대기합니다.
    pub fn step(&mut self) -> Result<StepSummary, LogPipelineError> {
        self.step_with_clock(Instant::now)
    }

    /// [`step`](Self::step)과 같지만 플러시 판단에 쓸 시각을 `clock`에서 얻습니다.
    ///
    /// `clock`은 폴링과 배치 처리가 끝난 뒤 한 번 호출됩니다.
    pub fn step_with_clock<C>(&mut self, clock: C) -> Result<StepSummary, LogPipelineError>
    where
        C: FnOnce() -> Instant,
    {
        let batch = self.tailer.poll(&self.cursor);
        let rotated = self.cursor.commit(&batch);

        let mut summary = StepSummary {
            lines_read: batch.lines.len(),
            rotated,
            ..Default::default()
        };

        for line in &batch.lines {
            match self.matcher.parse(line) {
                Some(entry) => {
                    self.aggregator.record(entry.key());
                    summary.lines_matched += 1;
                }
                None => {
                    tracing::warn!(line = %line, "line does not match pattern, skipping");
                }
            }
        }

        let unmatched = summary.lines_read - summary.lines_matched;
        if summary.lines_matched > 0 {
            metrics::counter!(m::MATCHER_LINES_MATCHED_TOTAL)
                .increment(summary.lines_matched as u64);
        }
        if unmatched > 0 {
            metrics::counter!(m::MATCHER_LINES_UNMATCHED_TOTAL).increment(unmatched as u64);
        }

        if let Some(report) = self.aggregator.maybe_flush(clock()) {
            report
                .render_text(&mut self.output)
                .map_err(LogPipelineError::Output)?;
            self.output.flush().map_err(LogPipelineError::Output)?;
            tracing::debug!(
                keys = report.counts.len(),
                total = report.total(),
                "report flushed"
            );
            metrics::counter!(m::REPORT_FLUSHES_TOTAL).increment(1);
            summary.flushed = true;
        }

        metrics::gauge!(m::REPORT_WINDOW_KEYS).set(self.aggregator.distinct_keys() as f64);

        Ok(summary)
    }
}

impl<W: Write> Runnable for TallyPipeline<W> {
    /// 프로세스가 종료될 때까지 루프를 돕니다.
    ///
    /// 리포트 출력에 실패한 경우에만 반환합니다.
    fn run(&mut self) -> Result<(), LogtallyError> {
        tracing::info!(
            log_file = %self.config.log_file.display(),
            interval_secs = self.config.report_interval_secs,
            "tally loop started"
        );

        let poll_interval = self.config.poll_interval();
        loop {
            self.step()?;
            if !poll_interval.is_zero() {
                std::thread::sleep(poll_interval);
            }
        }
    }
}

/// 집계 파이프라인 빌더
pub struct TallyPipelineBuilder<W: Write = Stdout> {
    config: TallyConfig,
    output: W,
}

impl TallyPipelineBuilder<Stdout> {
    /// 표준 출력으로 리포트를 쓰는 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: TallyConfig::default(),
            output: std::io::stdout(),
        }
    }
}

impl Default for TallyPipelineBuilder<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> TallyPipelineBuilder<W> {
    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: TallyConfig) -> Self {
        self.config = config;
        self
    }

    /// 리포트 출력 대상을 바꿉니다.
    pub fn output<W2: Write>(self, output: W2) -> TallyPipelineBuilder<W2> {
        TallyPipelineBuilder {
            config: self.config,
            output,
        }
    }

    /// 설정을 검증하고 파이프라인을 빌드합니다.
    ///
    /// 리포트 윈도우는 빌드 시점부터 시작합니다.
    pub fn build(self) -> Result<TallyPipeline<W>, LogPipelineError> {
        self.config.validate()?;

        let tailer = FileTailer::new(
            self.config.log_file.clone(),
            std::time::Duration::from_millis(self.config.retry_initial_ms),
            std::time::Duration::from_millis(self.config.retry_max_ms),
        );
        let aggregator = Aggregator::new(self.config.report_interval(), Instant::now());

        Ok(TallyPipeline {
            tailer,
            cursor: LogCursor::new(),
            matcher: LineMatcher::new()?,
            aggregator,
            output: self.output,
            config: self.config,
        })
    }
}

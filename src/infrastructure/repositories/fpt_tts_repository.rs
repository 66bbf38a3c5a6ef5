use super::tts_repository::{ProviderError, SpeechRequest, TtsRepository};
use crate::domain::voice::Provider;
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Bounded exponential backoff between poll attempts.
///
/// `delay(n) = min(base_delay * growth_factor^n, max_delay)`, which is
/// non-decreasing in `n` as long as `growth_factor >= 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollBackoff {
    pub base_delay: Duration,
    pub growth_factor: f64,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl PollBackoff {
    /// Delay to wait after the `retry`-th failed attempt (zero-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.growth_factor.powi(exponent);
        let cap = self.max_delay.as_secs_f64();
        if !secs.is_finite() || secs >= cap {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs.max(0.0))
        }
    }

    /// Upper bound on total time spent sleeping between attempts
    pub fn ceiling(&self) -> Duration {
        self.max_delay * self.max_attempts
    }
}

impl Default for PollBackoff {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            growth_factor: 1.5,
            max_delay: Duration::from_secs(5),
            max_attempts: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollFailure {
    Timeout,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Submitted,
    Polling,
    Ready(Vec<u8>),
    Failed(PollFailure),
}

/// Result of a single GET against the async url
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Ready(Vec<u8>),
    NotReady(String),
}

/// One in-flight FPT synthesis. Lives only for the duration of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisJob {
    pub async_url: String,
    pub state: JobState,
    pub attempts: u32,
}

impl SynthesisJob {
    pub fn new(async_url: String) -> Self {
        Self {
            async_url,
            state: JobState::Submitted,
            attempts: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, JobState::Ready(_) | JobState::Failed(_))
    }

    pub fn begin_polling(&mut self) {
        if self.state == JobState::Submitted {
            self.state = JobState::Polling;
        }
    }

    /// Apply one poll outcome.
    ///
    /// Returns how long to wait before the next attempt, or `None` once the
    /// job reached a terminal state.
    pub fn record(&mut self, outcome: PollOutcome, backoff: &PollBackoff) -> Option<Duration> {
        if self.state != JobState::Polling {
            return None;
        }

        self.attempts += 1;
        match outcome {
            PollOutcome::Ready(audio) => {
                self.state = JobState::Ready(audio);
                None
            }
            PollOutcome::NotReady(_) if self.attempts >= backoff.max_attempts => {
                self.state = JobState::Failed(PollFailure::Timeout);
                None
            }
            PollOutcome::NotReady(_) => Some(backoff.delay_for(self.attempts - 1)),
        }
    }

    pub fn cancel(&mut self) {
        if !self.is_terminal() {
            self.state = JobState::Failed(PollFailure::Cancelled);
        }
    }
}

/// Sleep used between poll attempts. Injected so tests never wait on the wall clock.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone)]
pub struct FptSettings {
    pub api_key: String,
    pub submit_url: String,
    /// Applies to the submit call and to each individual poll
    pub request_timeout: Duration,
    pub backoff: PollBackoff,
    /// Payloads smaller than this are placeholders, not audio
    pub min_audio_bytes: usize,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(rename = "async")]
    async_url: Option<String>,
    #[serde(default)]
    error: Option<JsonValue>,
    #[serde(default)]
    message: Option<String>,
}

/// FPT reports success as `"error": 0`; anything else truthy is a failure.
fn is_error_value(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64() != Some(0.0),
        JsonValue::String(s) => !s.is_empty() && s != "0",
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}

/// Map a speed multiplier onto FPT's integer scale -3..=3
pub fn fpt_speed(speed: f32) -> i8 {
    ((speed - 1.0) * 3.0).round().clamp(-3.0, 3.0) as i8
}

/// Decide whether a poll response carries the finished audio
pub fn classify_poll_response(
    status: StatusCode,
    content_type: Option<&str>,
    body: Vec<u8>,
    min_audio_bytes: usize,
) -> PollOutcome {
    if !status.is_success() {
        return PollOutcome::NotReady(format!("status {}", status.as_u16()));
    }

    let is_audio = content_type
        .map(|ct| ct.trim().to_ascii_lowercase().starts_with("audio/"))
        .unwrap_or(false);
    if !is_audio {
        return PollOutcome::NotReady(format!(
            "content-type {}",
            content_type.unwrap_or("missing")
        ));
    }

    if body.len() < min_audio_bytes {
        return PollOutcome::NotReady(format!("payload {} bytes", body.len()));
    }

    PollOutcome::Ready(body)
}

/// FPT.AI TTS implementation of TTS repository.
///
/// Two phases: the text is submitted and FPT answers with an async url, then
/// that url is polled with bounded backoff until real audio shows up.
pub struct FptTtsRepository {
    client: Client,
    settings: FptSettings,
    sleeper: Arc<dyn Sleeper>,
    shutdown: CancellationToken,
}

impl FptTtsRepository {
    pub fn new(settings: FptSettings, shutdown: CancellationToken) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(settings.request_timeout).build()?;

        Ok(Self {
            client,
            settings,
            sleeper: Arc::new(TokioSleeper),
            shutdown,
        })
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Phase 1: hand the text to FPT and obtain the async url
    pub async fn submit(&self, request: &SpeechRequest) -> Result<SynthesisJob, ProviderError> {
        let speed = fpt_speed(request.speed);

        tracing::info!(
            provider = "fpt",
            voice = %request.voice,
            speed = speed,
            text_length = request.text.len(),
            "Submitting FPT TTS job"
        );

        let response = self
            .client
            .post(&self.settings.submit_url)
            .header("api-key", &self.settings.api_key)
            .header("voice", &request.voice)
            .header("speed", speed.to_string())
            .header("format", request.format.as_str())
            .body(request.text.clone())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, provider = "fpt", "FPT submit request failed");
                ProviderError::from_reqwest(Provider::Fpt, e)
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::from_reqwest(Provider::Fpt, e))?;

        if !status.is_success() {
            tracing::error!(
                provider = "fpt",
                status = status.as_u16(),
                body = %body,
                "FPT submit returned an error status"
            );
            return Err(ProviderError::Upstream {
                provider: Provider::Fpt,
                status: Some(status.as_u16()),
                body,
            });
        }

        let parsed: SubmitResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, body = %body, "FPT submit response is not valid JSON");
            ProviderError::Upstream {
                provider: Provider::Fpt,
                status: Some(status.as_u16()),
                body: body.clone(),
            }
        })?;

        if parsed.error.as_ref().map(is_error_value).unwrap_or(false) {
            tracing::error!(
                provider = "fpt",
                error = ?parsed.error,
                message = ?parsed.message,
                "FPT rejected the job"
            );
            return Err(ProviderError::Upstream {
                provider: Provider::Fpt,
                status: Some(status.as_u16()),
                body,
            });
        }

        match parsed.async_url {
            Some(url) if !url.is_empty() => Ok(SynthesisJob::new(url)),
            _ => {
                tracing::error!(body = %body, "FPT response carries no async url");
                Err(ProviderError::Upstream {
                    provider: Provider::Fpt,
                    status: Some(status.as_u16()),
                    body,
                })
            }
        }
    }

    /// Phase 2: poll until the job is ready, times out, or is cancelled
    pub async fn poll(&self, mut job: SynthesisJob, cancel: &CancellationToken) -> SynthesisJob {
        job.begin_polling();

        while !job.is_terminal() {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    job.cancel();
                    break;
                }
                outcome = self.poll_once(&job.async_url) => outcome,
            };

            if let PollOutcome::NotReady(reason) = &outcome {
                tracing::debug!(
                    provider = "fpt",
                    attempt = job.attempts + 1,
                    reason = %reason,
                    "FPT audio not ready"
                );
            }

            let Some(delay) = job.record(outcome, &self.settings.backoff) else {
                break;
            };

            tracing::debug!(
                provider = "fpt",
                attempt = job.attempts,
                delay_ms = delay.as_millis() as u64,
                "Backing off before next FPT poll"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => job.cancel(),
                _ = self.sleeper.sleep(delay) => {}
            }
        }

        job
    }

    async fn poll_once(&self, url: &str) -> PollOutcome {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return PollOutcome::NotReady(format!("transport error: {}", e)),
        };

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        match response.bytes().await {
            Ok(body) => classify_poll_response(
                status,
                content_type.as_deref(),
                body.to_vec(),
                self.settings.min_audio_bytes,
            ),
            Err(e) => PollOutcome::NotReady(format!("body read error: {}", e)),
        }
    }
}

#[async_trait]
impl TtsRepository for FptTtsRepository {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>, ProviderError> {
        let start_time = std::time::Instant::now();

        let job = self.submit(request).await?;
        let cancel = self.shutdown.child_token();
        let job = self.poll(job, &cancel).await;

        match job.state {
            JobState::Ready(audio) => {
                tracing::info!(
                    provider = "fpt",
                    voice = %request.voice,
                    attempts = job.attempts,
                    latency_ms = start_time.elapsed().as_millis(),
                    audio_size_bytes = audio.len(),
                    "TTS synthesis completed"
                );
                Ok(audio)
            }
            JobState::Failed(PollFailure::Cancelled) => {
                tracing::warn!(provider = "fpt", attempts = job.attempts, "FPT polling cancelled");
                Err(ProviderError::Cancelled {
                    provider: Provider::Fpt,
                })
            }
            JobState::Failed(PollFailure::Timeout) | JobState::Submitted | JobState::Polling => {
                tracing::error!(
                    provider = "fpt",
                    attempts = job.attempts,
                    async_url = %job.async_url,
                    poll_ceiling_ms = self.settings.backoff.ceiling().as_millis() as u64,
                    "FPT audio never became ready"
                );
                Err(ProviderError::Timeout {
                    provider: Provider::Fpt,
                })
            }
        }
    }
}

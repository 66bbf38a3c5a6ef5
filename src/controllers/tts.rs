use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    Extension, Json,
};
use std::sync::Arc;

use crate::{
    domain::{
        tts::{Locale, SynthesisRequest, TtsService, TtsServiceApi, VoiceResponse},
        user::Caller,
    },
    error::AppResult,
};

pub const X_CACHE: &str = "x-cache";
pub const X_VOICE_USED: &str = "x-voice-used";
pub const X_PROVIDER: &str = "x-provider";
pub const X_CHARACTER_COUNT: &str = "x-character-count";

pub struct TtsController {
    tts_service: Arc<TtsService>,
}

fn locale_of(headers: &HeaderMap) -> Locale {
    Locale::from_accept_language(
        headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok()),
    )
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(HeaderName::from_static(name), value);
    }
}

impl TtsController {
    pub fn new(tts_service: Arc<TtsService>) -> Self {
        Self { tts_service }
    }

    /// POST /api/tts/synthesize - Convert text to speech
    pub async fn synthesize(
        State(controller): State<Arc<TtsController>>,
        Extension(caller): Extension<Caller>,
        request_headers: HeaderMap,
        Json(request): Json<SynthesisRequest>,
    ) -> AppResult<(StatusCode, HeaderMap, Body)> {
        let locale = locale_of(&request_headers);

        let result = controller
            .tts_service
            .synthesize(&caller, request)
            .await
            .map_err(|e| e.into_app_error(locale))?;

        // Build headers
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(result.content_type),
        );
        insert_header(
            &mut headers,
            X_CACHE,
            if result.cache_hit { "HIT" } else { "MISS" },
        );
        insert_header(&mut headers, X_VOICE_USED, &result.voice);
        if let Some(provider) = result.provider {
            insert_header(&mut headers, X_PROVIDER, provider.as_str());
        }
        headers.insert(
            HeaderName::from_static(X_CHARACTER_COUNT),
            HeaderValue::from(result.char_count),
        );

        Ok((StatusCode::OK, headers, Body::from(result.audio_data)))
    }

    /// GET /api/tts/voices - Voice catalogue for the caller
    pub async fn list_voices(
        State(controller): State<Arc<TtsController>>,
        Extension(caller): Extension<Caller>,
    ) -> Json<Vec<VoiceResponse>> {
        Json(controller.tts_service.list_voices(&caller))
    }
}

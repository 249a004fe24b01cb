//! Result shaping for provider responses.
//!
//! Turns raw provider text into the result payloads returned to callers.
//! Everything here is deterministic and free of I/O.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Number, Value};
use vyral_models::JobRequest;

use crate::error::{ProviderError, ProviderResult};

/// Shapes a chat completion into a result payload.
///
/// Receives the job, the model that answered and the completion text. An
/// error makes the attempt count as failed, so the next model is tried.
pub type ResultShaper = fn(&JobRequest, &str, &str) -> ProviderResult<Value>;

/// Platforms used when a request names none.
pub const DEFAULT_PLATFORMS: [&str; 3] = ["tiktok", "instagram", "youtube"];

/// Maximum number of supplied highlights turned into clips.
pub const MAX_SUPPLIED_HIGHLIGHTS: usize = 5;

const WORDS_PER_MINUTE: usize = 150;

fn hashtag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#\w+").expect("valid hashtag pattern"))
}

/// Hashtags in order of first appearance, without duplicates.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    hashtag_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

/// Suggested posting time for the first preferred platform.
pub fn optimal_posting_time(platforms: &[String]) -> &'static str {
    match platforms.first().map(String::as_str) {
        Some("tiktok") => "18:00",
        Some("instagram") => "11:00",
        Some("youtube") => "15:00",
        _ => "12:00",
    }
}

/// One tip per platform; all default platforms when none are given.
pub fn platform_tips(platforms: &[String]) -> Map<String, Value> {
    let platforms: Vec<String> = if platforms.is_empty() {
        DEFAULT_PLATFORMS.iter().map(|p| p.to_string()).collect()
    } else {
        platforms.to_vec()
    };

    platforms
        .into_iter()
        .map(|platform| {
            let tip = match platform.as_str() {
                "tiktok" => {
                    "Keep videos under 60 seconds for maximum engagement. Use trending sounds."
                        .to_string()
                }
                "instagram" => "Use carousel posts for longer content. Include relevant hashtags in the first comment.".to_string(),
                "youtube" => {
                    "Create compelling thumbnails. Use detailed descriptions with timestamps."
                        .to_string()
                }
                other => format!("Optimize content for {other} based on current best practices."),
            };
            (platform, Value::String(tip))
        })
        .collect()
}

/// Speaking time at 150 words per minute, e.g. `"2 minutes"`.
pub fn estimate_duration(script: &str) -> String {
    let words = script.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    if minutes == 1 {
        "1 minute".to_string()
    } else {
        format!("{minutes} minutes")
    }
}

/// Platform best suited to a clip of the given length in seconds.
pub fn suggest_platform(duration: f64) -> &'static str {
    if duration <= 15.0 {
        "tiktok"
    } else if duration <= 30.0 {
        "instagram"
    } else {
        "youtube"
    }
}

/// Platforms requested, or the defaults.
pub fn target_platforms(request: &JobRequest) -> Vec<String> {
    let platforms = request.str_list_param("platforms");
    if platforms.is_empty() {
        DEFAULT_PLATFORMS.iter().map(|p| p.to_string()).collect()
    } else {
        platforms
    }
}

pub fn vision(_request: &JobRequest, model: &str, text: &str) -> ProviderResult<Value> {
    Ok(json!({
        "analysis": text,
        "model": model,
    }))
}

pub fn strategy(request: &JobRequest, _model: &str, text: &str) -> ProviderResult<Value> {
    let preferences = request.str_list_param("platform_preferences");
    Ok(json!({
        "strategy_text": text,
        "hashtags": extract_hashtags(text),
        "optimal_posting_time": optimal_posting_time(&preferences),
        "platform_specific_tips": platform_tips(&preferences),
    }))
}

pub fn script(_request: &JobRequest, _model: &str, text: &str) -> ProviderResult<Value> {
    Ok(json!({
        "script_text": text,
        "estimated_duration": estimate_duration(text),
    }))
}

/// Bare caption text, used per platform inside a caption pack.
pub fn caption_text(_request: &JobRequest, _model: &str, text: &str) -> ProviderResult<Value> {
    Ok(Value::String(text.to_string()))
}

pub fn platform_captions(request: &JobRequest, _model: &str, text: &str) -> ProviderResult<Value> {
    Ok(json!({
        "platform": request.str_param("platform").unwrap_or_default(),
        "captions": text,
        "character_count": text.chars().count(),
        "hashtags": extract_hashtags(text),
    }))
}

/// A moment worth cutting into a clip. Times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMoment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub start: f64,
    pub end: f64,
    #[serde(default, alias = "description")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Parse the key moments a model returned, tolerating a Markdown fence.
pub fn key_moments(_request: &JobRequest, _model: &str, text: &str) -> ProviderResult<Value> {
    let body = strip_code_fence(text);
    let moments: Vec<KeyMoment> = serde_json::from_str(body)
        .map_err(|e| ProviderError::invalid_response(format!("Failed to parse key moments: {e}")))?;
    if moments.is_empty() {
        return Err(ProviderError::invalid_response("Model returned no key moments"));
    }
    serde_json::to_value(moments)
        .map_err(|e| ProviderError::invalid_response(format!("Failed to encode key moments: {e}")))
}

/// Key moments taken from caller-supplied highlights (at most five).
///
/// Highlights without numeric `start` and `end` are skipped.
pub fn moments_from_highlights(highlights: &[Value]) -> Vec<KeyMoment> {
    highlights
        .iter()
        .take(MAX_SUPPLIED_HIGHLIGHTS)
        .enumerate()
        .filter_map(|(index, highlight)| {
            Some(KeyMoment {
                id: Some(Value::from(index + 1)),
                start: highlight.get("start")?.as_f64()?,
                end: highlight.get("end")?.as_f64()?,
                text: highlight
                    .get("text")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                confidence: highlight.get("confidence").and_then(Value::as_f64),
            })
        })
        .collect()
}

/// Clip list addressed by media fragment on the source file.
pub fn micro_clips(file_url: &str, moments: &[KeyMoment]) -> Value {
    let clips: Vec<Value> = moments
        .iter()
        .enumerate()
        .map(|(index, moment)| {
            let duration = moment.end - moment.start;
            json!({
                "id": moment.id.clone().unwrap_or_else(|| Value::from(index + 1)),
                "url": format!("{}#t={},{}", file_url, moment.start, moment.end),
                "duration": seconds(duration),
                "text": moment.text,
                "platform": suggest_platform(duration),
            })
        })
        .collect();

    json!({
        "total_clips": clips.len(),
        "clips": clips,
    })
}

/// Whole seconds are rendered as integers.
fn seconds(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

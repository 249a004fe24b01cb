//! Chat prompts for each text operation.

use serde_json::Value;
use vyral_models::JobRequest;

use crate::openrouter::ChatMessage;

/// Builds the chat messages for one job.
pub type PromptBuilder = fn(&JobRequest) -> Vec<ChatMessage>;

const NO_STRATEGY: &str = "No specific strategy provided";

fn transcript(request: &JobRequest) -> &str {
    request.str_param("transcript").unwrap_or_default()
}

fn platform(request: &JobRequest) -> &str {
    request.str_param("platform").unwrap_or_default()
}

/// `strategy` may be free text or a structured strategy result.
fn strategy_context(request: &JobRequest) -> String {
    match request.param("strategy") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::String(_)) | None => NO_STRATEGY.to_string(),
        Some(other) => other.to_string(),
    }
}

pub fn vision(request: &JobRequest) -> Vec<ChatMessage> {
    vec![ChatMessage::user_with_image(
        "Analyze this video frame and provide insights about the content, objects, people, \
         text, and overall scene. Include information about labels, text detection, faces, \
         objects, explicit content, duration, and scenes.",
        request.str_param("file_url").unwrap_or_default(),
    )]
}

pub fn strategy(request: &JobRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(
            "You are a viral content strategist. Based on the provided transcript, create a \
             content strategy that will perform well on social media platforms. Consider \
             timing, hashtags, and platform-specific optimizations.",
        ),
        ChatMessage::user(format!(
            "Create a content strategy for this transcript: {}",
            transcript(request)
        )),
    ]
}

pub fn script(request: &JobRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(
            "You are a professional scriptwriter. Based on the provided transcript and \
             strategy, create engaging scripts for social media content. Include hooks, \
             transitions, and calls-to-action.",
        ),
        ChatMessage::user(format!(
            "Create scripts based on this transcript: {} and strategy: {}",
            transcript(request),
            strategy_context(request)
        )),
    ]
}

/// Caption for the single platform named in the `platform` param.
pub fn platform_caption(request: &JobRequest) -> Vec<ChatMessage> {
    let platform = platform(request);
    vec![
        ChatMessage::system(format!(
            "You are a social media caption specialist. Create engaging captions optimized \
             for {platform}. Follow platform-specific best practices for length, hashtags, \
             and engagement."
        )),
        ChatMessage::user(format!(
            "Create a {platform} caption for this transcript: {}",
            transcript(request)
        )),
    ]
}

/// Caption guided by per-platform instructions and an optional strategy.
pub fn platform_caption_with_strategy(request: &JobRequest) -> Vec<ChatMessage> {
    let platform = platform(request);
    let instructions = match platform {
        "tiktok" => {
            "Create a short, engaging caption for TikTok with trending hashtags. Max 150 characters."
        }
        "instagram" => {
            "Create an engaging Instagram caption with emojis and relevant hashtags. Max 2200 characters."
        }
        "youtube" => {
            "Create a detailed YouTube description with timestamps and keywords. Can be longer format."
        }
        _ => "Create an engaging caption.",
    };

    vec![
        ChatMessage::system(format!(
            "You are a social media caption specialist. {instructions} Strategy context: {}",
            strategy_context(request)
        )),
        ChatMessage::user(format!(
            "Create a {platform} caption for this transcript: {}",
            transcript(request)
        )),
    ]
}

pub fn key_moments(request: &JobRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(
            "You are a video content analyst. Identify 5 key moments in the transcript that \
             would make engaging micro-clips. For each moment, provide a start time, end time, \
             and brief description. Return ONLY a JSON array of objects with numeric \
             \"start\" and \"end\" fields (seconds) and a \"text\" field.",
        ),
        ChatMessage::user(format!(
            "Identify key moments for micro-clips in this transcript: {}",
            transcript(request)
        )),
    ]
}

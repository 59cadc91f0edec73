pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const GEMINI_LIVE_MODEL: &str = "GEMINI_LIVE_MODEL";
pub const GEMINI_LIVE_FLUSH_POLICY: &str = "GEMINI_LIVE_FLUSH_POLICY";
pub const GEMINI_LIVE_TRANSCRIPTION: &str = "GEMINI_LIVE_TRANSCRIPTION";

pub const BASE_URL: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";
pub const API_KEY_QUERY_PARAM: &str = "key";

pub const BUNDLE_IDENTIFIER_HEADER: &str = "X-Ios-Bundle-Identifier";

pub const DEFAULT_CAPACITY: usize = 1024;

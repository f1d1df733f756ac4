// Adapters layer: concrete clients for the hosted model and speech APIs.

pub mod anthropic;
pub mod elevenlabs;

pub use anthropic::AnthropicClient;
pub use elevenlabs::ElevenLabsClient;

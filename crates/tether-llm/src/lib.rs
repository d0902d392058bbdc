pub mod config;
pub mod history;
pub mod mock;
pub mod openai;
pub mod registry;
pub mod streaming;
pub mod traits;

pub use config::{ProviderConfig, ProviderFactory, RemoteConfig};
pub use history::{to_provider_messages, ProviderMessage};
pub use mock::MockProvider;
pub use openai::{chunk_words, CompletionProvider, OpenAICompatibleConfig, OpenAICompatibleProvider};
pub use registry::ProviderRegistry;
pub use streaming::{parse_chat_sse_stream, LineBuffer, ProviderEvent};
pub use traits::{Provider, ProviderRequest, ProviderStream};

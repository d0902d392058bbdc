pub mod attachment;
pub mod message;
pub mod stream_state;
pub mod thread;

pub use attachment::MongoAttachmentRepository;
pub use message::MongoMessageRepository;
pub use stream_state::MongoStreamStateRepository;
pub use thread::MongoThreadRepository;
